// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Point ledger entries and deterministic event ids.

use crate::models::diner::diner_key;
use crate::time_utils::rfc3339_secs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum EarnedFrom {
    Visit,
    Review,
}

/// Points awarded to a diner for one action within a competition period.
///
/// Stored at `point_ledger/{diner_key}_{source_id}`; the document id makes
/// a repeated write of the same `(diner, source_id)` a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointLedgerEntry {
    pub diner_email: String,
    /// Display name at the time the points were earned
    #[serde(default)]
    pub diner_display_name: Option<String>,
    pub leaderboard_period_id: String,
    pub points: u32,
    pub earned_from: EarnedFrom,
    #[serde(default)]
    pub restaurant_id: Option<String>,
    /// Deduplication key, e.g. `visit:{visit_id}`
    pub source_id: String,
    #[serde(with = "rfc3339_secs")]
    pub created_at: DateTime<Utc>,
}

impl PointLedgerEntry {
    pub fn doc_id(&self) -> String {
        ledger_doc_id(&self.diner_email, &self.source_id)
    }
}

pub fn ledger_doc_id(diner_email: &str, source_id: &str) -> String {
    format!("{}_{}", diner_key(diner_email), urlencoding::encode(source_id))
}

pub fn visit_source_id(visit_id: &str) -> String {
    format!("visit:{}", visit_id)
}

pub fn review_source_id(review_id: &str) -> String {
    format!("review:{}", review_id)
}

/// Derive a stable record id for a diner action.
///
/// `discriminator` is the id of the diner's previous record of the same kind
/// at this restaurant (`"first"` when there is none). Chaining on it means a
/// given record can have only one successor, however many requests race.
pub fn derive_event_id(
    kind: &str,
    diner_email: &str,
    restaurant_id: &str,
    discriminator: &str,
) -> String {
    let email = diner_email.trim().to_lowercase();
    let mut hasher = Sha256::new();
    for part in [kind, email.as_str(), restaurant_id, discriminator] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(&hasher.finalize()[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_is_deterministic() {
        let a = derive_event_id("visit", "ana@example.com", "r1", "first");
        let b = derive_event_id("visit", "ANA@example.com", "r1", "first");
        assert_eq!(a, b);
        assert_eq!(a.len(), 24);
    }

    #[test]
    fn test_event_id_changes_with_inputs() {
        let base = derive_event_id("visit", "ana@example.com", "r1", "first");
        assert_ne!(base, derive_event_id("review", "ana@example.com", "r1", "first"));
        assert_ne!(base, derive_event_id("visit", "ana@example.com", "r2", "first"));
        assert_ne!(base, derive_event_id("visit", "ana@example.com", "r1", "prev-abc"));
        // Field boundaries are delimited
        assert_ne!(
            derive_event_id("visit", "ana@example.com", "r1", "1"),
            derive_event_id("visit", "ana@example.com", "r", "11")
        );
    }

    #[test]
    fn test_ledger_doc_id_same_for_same_source() {
        let one = ledger_doc_id("ana@example.com", &visit_source_id("abc"));
        let two = ledger_doc_id("Ana@Example.com", &visit_source_id("abc"));
        assert_eq!(one, two);
        assert_ne!(one, ledger_doc_id("ana@example.com", &review_source_id("abc")));
    }
}
