// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Restaurant directory entry (owned by the menu management side).

use serde::{Deserialize, Serialize};

/// Minimal restaurant record used to label the prize restaurant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub restaurant_id: String,
    pub name: String,
}
