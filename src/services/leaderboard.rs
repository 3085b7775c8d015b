// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weekly leaderboard aggregation.
//!
//! Turns the point ledger of the active competition period into ranked
//! standings, the requesting diner's position and the prize restaurant.

use crate::models::diner::display_name_or_local_part;
use crate::models::{CompetitionPeriod, EarnedFrom, PointLedgerEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Number of ranked diners returned to identified requesters.
pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeaderboardError {
    #[error("No active competition period")]
    NoActivePeriod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub display_name: String,
    pub total_points: u32,
    pub is_winner: bool,
    pub is_current_user: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PrizeRestaurant {
    pub restaurant_id: String,
    /// Filled in from the restaurant directory when available
    pub name: Option<String>,
    pub review_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardResult {
    pub current_period: CompetitionPeriod,
    /// Empty for anonymous requests
    pub top_entries: Vec<LeaderboardEntry>,
    /// Present only when the requester ranks outside `top_entries`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_user_entry: Option<LeaderboardEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize_restaurant: Option<PrizeRestaurant>,
    pub total_participants: u32,
}

/// Running totals for one diner.
struct Standing {
    email: String,
    display_name: Option<String>,
    display_name_at: Option<DateTime<Utc>>,
    total_points: u32,
    last_earned_at: DateTime<Utc>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Group ledger points by diner and sort them into ranking order.
///
/// Ties on points go to the diner who reached the total first (earlier
/// most recent award), then to the lexicographically smaller email.
fn standings(period_id: &str, entries: &[PointLedgerEntry]) -> Vec<Standing> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut standings: Vec<Standing> = Vec::new();

    for entry in entries.iter().filter(|e| e.leaderboard_period_id == period_id) {
        let email = normalize_email(&entry.diner_email);
        let slot = *index.entry(email.clone()).or_insert_with(|| {
            standings.push(Standing {
                email,
                display_name: None,
                display_name_at: None,
                total_points: 0,
                last_earned_at: entry.created_at,
            });
            standings.len() - 1
        });

        let standing = &mut standings[slot];
        standing.total_points = standing.total_points.saturating_add(entry.points);
        standing.last_earned_at = standing.last_earned_at.max(entry.created_at);

        // Latest non-empty display name wins
        if let Some(name) = entry
            .diner_display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
        {
            if standing
                .display_name_at
                .map_or(true, |at| entry.created_at >= at)
            {
                standing.display_name = Some(name.to_string());
                standing.display_name_at = Some(entry.created_at);
            }
        }
    }

    standings.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.last_earned_at.cmp(&b.last_earned_at))
            .then_with(|| a.email.cmp(&b.email))
    });
    standings
}

/// Restaurant with the most reviews in the period; the first one seen
/// keeps the title on a tie.
pub fn prize_restaurant(period_id: &str, entries: &[PointLedgerEntry]) -> Option<PrizeRestaurant> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, u32)> = Vec::new();

    for entry in entries
        .iter()
        .filter(|e| e.leaderboard_period_id == period_id && e.earned_from == EarnedFrom::Review)
    {
        let Some(restaurant_id) = entry.restaurant_id.as_deref() else {
            continue;
        };
        let slot = *index.entry(restaurant_id).or_insert_with(|| {
            counts.push((restaurant_id, 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
    }

    let mut best: Option<(&str, u32)> = None;
    for (restaurant_id, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((restaurant_id, count));
        }
    }

    best.map(|(restaurant_id, review_count)| PrizeRestaurant {
        restaurant_id: restaurant_id.to_string(),
        name: None,
        review_count,
    })
}

/// Build the leaderboard for the active period.
///
/// Anonymous requests (`requesting_email == None`) receive no ranked
/// entries; the period and prize restaurant are still reported.
pub fn compute_leaderboard(
    period: Option<&CompetitionPeriod>,
    entries: &[PointLedgerEntry],
    requesting_email: Option<&str>,
) -> Result<LeaderboardResult, LeaderboardError> {
    let period = period
        .filter(|p| p.is_active())
        .ok_or(LeaderboardError::NoActivePeriod)?;

    let requester = requesting_email.map(normalize_email);
    let ranked: Vec<LeaderboardEntry> = standings(&period.id, entries)
        .into_iter()
        .enumerate()
        .map(|(i, standing)| LeaderboardEntry {
            rank: i as u32 + 1,
            display_name: display_name_or_local_part(
                standing.display_name.as_deref(),
                &standing.email,
            ),
            total_points: standing.total_points,
            is_winner: i == 0,
            is_current_user: requester.as_deref() == Some(standing.email.as_str()),
        })
        .collect();

    let total_participants = ranked.len() as u32;
    let (top_entries, current_user_entry) = if requester.is_some() {
        let current_user_entry = ranked
            .iter()
            .skip(LEADERBOARD_SIZE)
            .find(|e| e.is_current_user)
            .cloned();
        let mut top = ranked;
        top.truncate(LEADERBOARD_SIZE);
        (top, current_user_entry)
    } else {
        (Vec::new(), None)
    };

    Ok(LeaderboardResult {
        current_period: period.clone(),
        top_entries,
        current_user_entry,
        prize_restaurant: prize_restaurant(&period.id, entries),
        total_participants,
    })
}
