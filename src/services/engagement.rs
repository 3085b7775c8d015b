// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Diner engagement workflow.
//!
//! Every submission runs the same pipeline, and no step starts unless the
//! previous one passed:
//! 1. Validate the input
//! 2. Check the anti-spam rules against the diner's history
//! 3. Calculate points (plus streak bonus for visits)
//! 4. Claim the visit/review document and commit the award atomically

use crate::db::{AwardCommit, Claim, CommitOutcome, FirestoreDb};
use crate::error::{AppError, Result};
use crate::models::ledger::{review_source_id, visit_source_id};
use crate::models::{
    derive_event_id, CompetitionPeriod, DinerProfile, DinerRestaurantActivity, EarnedFrom,
    PointLedgerEntry, ReviewRecord, VisitRecord,
};
use crate::services::cache::TtlCache;
use crate::services::leaderboard::{compute_leaderboard, LeaderboardResult};
use crate::services::points::{
    calculate_review_points, calculate_visit_points, profile_completion,
    profile_completion_bonus, PointsCalculation, ProfileCompletion,
};
use crate::services::rate_limit::{check_review_rate_limit, check_visit_rate_limit};
use crate::services::streak::{apply_streak, update_streak, StreakUpdate};
use crate::time_utils::DayBoundary;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A claimed visit/review older than this whose award never landed is
/// assumed abandoned (instance crash) and is completed by the next request.
const ABANDONED_CLAIM_SECS: i64 = 60;

const LEADERBOARD_CACHE_KEY: &str = "active";

/// Per-diner locks serializing submissions within this instance.
pub type DinerLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Active period plus its ledger, as read from Firestore.
#[derive(Debug, Clone)]
pub struct LeaderboardSnapshot {
    pub period: Option<CompetitionPeriod>,
    pub entries: Arc<Vec<PointLedgerEntry>>,
}

pub type LeaderboardCache = Arc<TtlCache<&'static str, LeaderboardSnapshot>>;

// ─── Requests ────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct VisitRequest {
    #[validate(length(min = 1, max = 128, message = "must be 1 to 128 characters"))]
    pub restaurant_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(length(min = 1, max = 128, message = "must be 1 to 128 characters"))]
    pub restaurant_id: String,
    #[serde(default)]
    pub menu_item_id: Option<String>,
    /// Wide integer so out-of-range values reach validation instead of
    /// failing to parse
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub rating: i64,
    #[serde(default)]
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub review_text: Option<String>,
    #[serde(default)]
    #[validate(length(max = 10, message = "must list at most 10 photos"))]
    pub photo_urls: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewUpdateRequest {
    #[serde(default)]
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub rating: Option<i64>,
    #[serde(default)]
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub review_text: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    #[validate(length(max = 50, message = "must be at most 50 characters"))]
    pub display_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2048, message = "must be at most 2048 characters"))]
    pub photo_url: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub bio: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20, message = "must list at most 20 preferences"))]
    pub dietary_preferences: Option<Vec<String>>,
    #[serde(default)]
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub location: Option<String>,
}

impl ProfileUpdateRequest {
    /// Overwrite the fields present in the request; blank strings clear them.
    fn apply_to(&self, profile: &mut DinerProfile) {
        if let Some(name) = &self.display_name {
            profile.display_name = non_empty(Some(name.clone()));
        }
        if let Some(photo_url) = &self.photo_url {
            profile.photo_url = non_empty(Some(photo_url.clone()));
        }
        if let Some(bio) = &self.bio {
            profile.bio = non_empty(Some(bio.clone()));
        }
        if let Some(preferences) = &self.dietary_preferences {
            profile.dietary_preferences = preferences
                .iter()
                .filter_map(|p| non_empty(Some(p.clone())))
                .collect();
        }
        if let Some(location) = &self.location {
            profile.location = non_empty(Some(location.clone()));
        }
    }
}

// ─── Responses ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VisitResponse {
    pub visit_id: String,
    pub points: PointsCalculation,
    pub streak: StreakUpdate,
    pub total_points: u32,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReviewResponse {
    pub review_id: String,
    pub points: PointsCalculation,
    pub total_points: u32,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub email: String,
    pub display_name: Option<String>,
    pub total_points: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub dietary_preferences: Vec<String>,
    pub location: Option<String>,
    pub completion: ProfileCompletion,
    /// Points paid by this request for completing the profile
    pub bonus_awarded: u32,
}

impl ProfileResponse {
    fn new(profile: DinerProfile, bonus_awarded: u32) -> Self {
        let completion = profile_completion(&profile);
        Self {
            email: profile.email,
            display_name: profile.display_name,
            total_points: profile.total_points,
            current_streak: profile.current_streak,
            longest_streak: profile.longest_streak,
            photo_url: profile.photo_url,
            bio: profile.bio,
            dietary_preferences: profile.dietary_preferences,
            location: profile.location,
            completion,
            bonus_awarded,
        }
    }
}

/// Narrow a validated 1-5 rating.
fn star_rating(rating: i64) -> Result<u8> {
    u8::try_from(rating)
        .ok()
        .filter(|r| (1..=5).contains(r))
        .ok_or_else(|| AppError::Validation {
            field: "rating".to_string(),
            message: "must be between 1 and 5".to_string(),
        })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Orchestrates visits, reviews, profiles and the leaderboard.
#[derive(Clone)]
pub struct EngagementService {
    db: FirestoreDb,
    day_boundary: DayBoundary,
    diner_locks: DinerLocks,
    leaderboard_cache: LeaderboardCache,
}

impl EngagementService {
    pub fn new(db: FirestoreDb, day_boundary: DayBoundary, cache_ttl: Duration) -> Self {
        Self {
            db,
            day_boundary,
            diner_locks: Arc::new(DashMap::new()),
            leaderboard_cache: Arc::new(TtlCache::new(cache_ttl)),
        }
    }

    fn diner_lock(&self, email: &str) -> Arc<Mutex<()>> {
        self.diner_locks
            .entry(email.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn invalidate_leaderboard(&self) {
        self.leaderboard_cache.invalidate(&LEADERBOARD_CACHE_KEY);
    }

    async fn load_profile(
        &self,
        email: &str,
        display_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DinerProfile> {
        let mut profile = match self.db.get_diner(email).await? {
            Some(profile) => profile,
            None => {
                tracing::info!(diner = %email, "Creating diner profile");
                DinerProfile::new(email, None, now)
            }
        };
        if profile.display_name.is_none() {
            profile.display_name = non_empty(display_name.map(str::to_string));
        }
        Ok(profile)
    }

    async fn restaurant_activity(
        &self,
        email: &str,
        restaurant_id: &str,
    ) -> Result<DinerRestaurantActivity> {
        Ok(self
            .db
            .get_restaurant_activity(email, restaurant_id)
            .await?
            .unwrap_or_else(|| DinerRestaurantActivity::empty(email, restaurant_id)))
    }

    /// Build the ledger entry for an award, or `None` if there is no active
    /// period. Duplicates are caught when the award is committed.
    async fn ledger_entry_for(
        &self,
        profile: &DinerProfile,
        source_id: String,
        points: u32,
        earned_from: EarnedFrom,
        restaurant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PointLedgerEntry>> {
        let Some(period) = self.db.get_active_period().await? else {
            tracing::warn!(
                diner = %profile.email,
                source_id = %source_id,
                "No active competition period; points not counted toward a leaderboard"
            );
            return Ok(None);
        };

        Ok(Some(PointLedgerEntry {
            diner_email: profile.email.clone(),
            diner_display_name: profile.display_name.clone(),
            leaderboard_period_id: period.id,
            points,
            earned_from,
            restaurant_id: Some(restaurant_id.to_string()),
            source_id,
            created_at: now,
        }))
    }

    // ─── Visits ──────────────────────────────────────────────────

    /// Log a visit and award visit points plus any streak bonus.
    pub async fn log_visit(
        &self,
        email: &str,
        display_name: Option<&str>,
        request: VisitRequest,
        now: DateTime<Utc>,
    ) -> Result<VisitResponse> {
        request.validate()?;
        let email = normalize_email(email);
        let restaurant_id = request.restaurant_id.trim().to_string();

        let lock = self.diner_lock(&email);
        let _guard = lock.lock().await;

        let mut activity = self.restaurant_activity(&email, &restaurant_id).await?;
        let limit = check_visit_rate_limit(activity.last_visit_date, now);
        if !limit.allowed {
            tracing::info!(diner = %email, restaurant_id = %restaurant_id, reason = ?limit.reason, "Visit rate limited");
            return Err(AppError::RateLimited(limit));
        }

        let mut profile = self.load_profile(&email, display_name, now).await?;
        let previous = activity.last_visit_id.as_deref().unwrap_or("first");
        let mut visit = VisitRecord {
            visit_id: derive_event_id("visit", &email, &restaurant_id, previous),
            diner_email: email.clone(),
            restaurant_id: restaurant_id.clone(),
            visit_date: now,
            points_earned: 0,
        };

        let today = self.day_boundary.local_date(now);
        let streak = update_streak(profile.last_visit_date, profile.current_streak, today);
        let points = calculate_visit_points().with_bonus(
            streak.bonus_points,
            format!("+{} for a {}-day streak", streak.bonus_points, streak.new_streak),
        );
        visit.points_earned = points.total_points;

        if let Claim::Exists(existing) = self.db.claim_visit(&visit).await? {
            if now.signed_duration_since(existing.visit_date).num_seconds() < ABANDONED_CLAIM_SECS {
                let limit = check_visit_rate_limit(Some(existing.visit_date), now);
                tracing::info!(diner = %email, visit_id = %existing.visit_id, "Concurrent visit submission rejected");
                return Err(AppError::RateLimited(limit));
            }
            tracing::warn!(diner = %email, visit_id = %existing.visit_id, "Completing abandoned visit claim");
            visit = existing;
        }

        let ledger_entry = self
            .ledger_entry_for(
                &profile,
                visit_source_id(&visit.visit_id),
                visit.points_earned,
                EarnedFrom::Visit,
                &restaurant_id,
                now,
            )
            .await?;

        apply_streak(&mut profile, &streak, today);
        profile.total_points = profile.total_points.saturating_add(visit.points_earned);
        profile.updated_at = now;
        activity.last_visit_date = Some(visit.visit_date);
        activity.last_visit_id = Some(visit.visit_id.clone());

        let outcome = self
            .db
            .commit_award(&AwardCommit {
                activity,
                profile: profile.clone(),
                ledger_entry,
            })
            .await?;
        if outcome == CommitOutcome::AlreadyRecorded {
            tracing::info!(diner = %email, visit_id = %visit.visit_id, "Visit award already recorded");
            return Err(AppError::RateLimited(check_visit_rate_limit(
                Some(visit.visit_date),
                now,
            )));
        }
        self.invalidate_leaderboard();

        tracing::info!(
            diner = %email,
            restaurant_id = %restaurant_id,
            points = visit.points_earned,
            streak = streak.new_streak,
            "Visit logged"
        );

        Ok(VisitResponse {
            visit_id: visit.visit_id,
            points,
            streak,
            total_points: profile.total_points,
        })
    }

    // ─── Reviews ─────────────────────────────────────────────────

    /// Submit a review and award review points.
    pub async fn submit_review(
        &self,
        email: &str,
        display_name: Option<&str>,
        request: ReviewRequest,
        now: DateTime<Utc>,
    ) -> Result<ReviewResponse> {
        request.validate()?;
        let email = normalize_email(email);
        let restaurant_id = request.restaurant_id.trim().to_string();

        let lock = self.diner_lock(&email);
        let _guard = lock.lock().await;

        let mut activity = self.restaurant_activity(&email, &restaurant_id).await?;
        let (day_start, day_end) = self.day_boundary.day_range(self.day_boundary.local_date(now));
        let today_count = self
            .db
            .count_reviews_between(&email, day_start, day_end)
            .await?;

        let limit = check_review_rate_limit(
            activity.last_review_date,
            today_count,
            activity.last_visit_date,
            now,
        );
        if !limit.allowed {
            tracing::info!(diner = %email, restaurant_id = %restaurant_id, reason = ?limit.reason, "Review rate limited");
            return Err(AppError::RateLimited(limit));
        }

        let review_text = non_empty(request.review_text);
        let points = calculate_review_points(review_text.as_deref(), &request.photo_urls);

        let previous = activity.last_review_id.as_deref().unwrap_or("first");
        let mut review = ReviewRecord {
            review_id: derive_event_id("review", &email, &restaurant_id, previous),
            diner_email: email.clone(),
            restaurant_id: restaurant_id.clone(),
            menu_item_id: non_empty(request.menu_item_id),
            rating: star_rating(request.rating)?,
            review_text,
            photo_urls: request.photo_urls,
            created_at: now,
            updated_at: None,
            points_earned: points.total_points,
        };

        if let Claim::Exists(existing) = self.db.claim_review(&review).await? {
            if now.signed_duration_since(existing.created_at).num_seconds() < ABANDONED_CLAIM_SECS {
                let limit = check_review_rate_limit(
                    Some(existing.created_at),
                    today_count,
                    activity.last_visit_date,
                    now,
                );
                tracing::info!(diner = %email, review_id = %existing.review_id, "Concurrent review submission rejected");
                return Err(AppError::RateLimited(limit));
            }
            tracing::warn!(diner = %email, review_id = %existing.review_id, "Completing abandoned review claim");
            review = existing;
        }

        let mut profile = self.load_profile(&email, display_name, now).await?;
        let ledger_entry = self
            .ledger_entry_for(
                &profile,
                review_source_id(&review.review_id),
                review.points_earned,
                EarnedFrom::Review,
                &restaurant_id,
                now,
            )
            .await?;

        profile.total_points = profile.total_points.saturating_add(review.points_earned);
        profile.updated_at = now;
        activity.last_review_date = Some(review.created_at);
        activity.last_review_id = Some(review.review_id.clone());

        let last_visit = activity.last_visit_date;
        let outcome = self
            .db
            .commit_award(&AwardCommit {
                activity,
                profile: profile.clone(),
                ledger_entry,
            })
            .await?;
        if outcome == CommitOutcome::AlreadyRecorded {
            tracing::info!(diner = %email, review_id = %review.review_id, "Review award already recorded");
            return Err(AppError::RateLimited(check_review_rate_limit(
                Some(review.created_at),
                today_count,
                last_visit,
                now,
            )));
        }
        self.invalidate_leaderboard();

        tracing::info!(
            diner = %email,
            restaurant_id = %restaurant_id,
            points = review.points_earned,
            "Review submitted"
        );

        Ok(ReviewResponse {
            review_id: review.review_id,
            points,
            total_points: profile.total_points,
        })
    }

    async fn owned_review(&self, email: &str, review_id: &str) -> Result<ReviewRecord> {
        let review = self
            .db
            .get_review(review_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review {} not found", review_id)))?;

        if normalize_email(&review.diner_email) != normalize_email(email) {
            return Err(AppError::Forbidden(
                "Reviews can only be changed by their author".to_string(),
            ));
        }
        Ok(review)
    }

    /// Edit a review's rating or text. Points are never re-awarded.
    pub async fn update_review(
        &self,
        email: &str,
        review_id: &str,
        request: ReviewUpdateRequest,
        now: DateTime<Utc>,
    ) -> Result<ReviewRecord> {
        request.validate()?;
        let mut review = self.owned_review(email, review_id).await?;

        if let Some(rating) = request.rating {
            review.rating = star_rating(rating)?;
        }
        if let Some(text) = request.review_text {
            review.review_text = non_empty(Some(text));
        }
        review.updated_at = Some(now);

        self.db.update_review(&review).await?;
        tracing::info!(diner = %review.diner_email, review_id, "Review updated");
        Ok(review)
    }

    /// Delete a review. Earned points and the review cooldown stay in place.
    pub async fn delete_review(&self, email: &str, review_id: &str) -> Result<()> {
        let review = self.owned_review(email, review_id).await?;
        self.db.delete_review(&review.review_id).await?;
        tracing::info!(diner = %review.diner_email, review_id, "Review deleted");
        Ok(())
    }

    // ─── Profile ─────────────────────────────────────────────────

    pub async fn get_profile(
        &self,
        email: &str,
        display_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ProfileResponse> {
        let profile = self
            .load_profile(&normalize_email(email), display_name, now)
            .await?;
        Ok(ProfileResponse::new(profile, 0))
    }

    /// Update tracked profile fields, paying the completion bonus once.
    pub async fn update_profile(
        &self,
        email: &str,
        request: ProfileUpdateRequest,
        now: DateTime<Utc>,
    ) -> Result<ProfileResponse> {
        request.validate()?;
        let email = normalize_email(email);

        let lock = self.diner_lock(&email);
        let _guard = lock.lock().await;

        let mut profile = self.load_profile(&email, None, now).await?;
        request.apply_to(&mut profile);
        profile.updated_at = now;

        let bonus = profile_completion_bonus(
            &profile_completion(&profile),
            profile.profile_bonus_awarded,
        );
        if bonus > 0 {
            let mut with_bonus = profile.clone();
            with_bonus.total_points = with_bonus.total_points.saturating_add(bonus);
            with_bonus.profile_bonus_awarded = true;

            match self.db.commit_profile_bonus(&with_bonus, bonus, now).await? {
                CommitOutcome::Committed => {
                    tracing::info!(diner = %email, points = bonus, "Profile completion bonus awarded");
                    return Ok(ProfileResponse::new(with_bonus, bonus));
                }
                CommitOutcome::AlreadyRecorded => {
                    // Paid elsewhere; keep the stored total that includes it.
                    profile = self.load_profile(&email, None, now).await?;
                    request.apply_to(&mut profile);
                    profile.profile_bonus_awarded = true;
                    profile.updated_at = now;
                }
            }
        }

        self.db.upsert_diner(&profile).await?;
        Ok(ProfileResponse::new(profile, 0))
    }

    // ─── Leaderboard ─────────────────────────────────────────────

    async fn leaderboard_snapshot(&self, now: DateTime<Utc>) -> Result<LeaderboardSnapshot> {
        if let Some(snapshot) = self.leaderboard_cache.get(&LEADERBOARD_CACHE_KEY, now) {
            return Ok(snapshot);
        }

        let period = self.db.get_active_period().await?;
        let entries = match &period {
            Some(period) => self.db.get_period_ledger(&period.id).await?,
            None => Vec::new(),
        };
        tracing::debug!(
            period = ?period.as_ref().map(|p| &p.id),
            entries = entries.len(),
            "Loaded leaderboard snapshot"
        );

        let snapshot = LeaderboardSnapshot {
            period,
            entries: Arc::new(entries),
        };
        self.leaderboard_cache
            .insert(LEADERBOARD_CACHE_KEY, snapshot.clone(), now);
        Ok(snapshot)
    }

    /// Leaderboard for the active period as seen by `requesting_email`.
    pub async fn leaderboard(
        &self,
        requesting_email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<LeaderboardResult> {
        let snapshot = self.leaderboard_snapshot(now).await?;
        let mut result =
            compute_leaderboard(snapshot.period.as_ref(), &snapshot.entries, requesting_email)?;

        if let Some(prize) = result.prize_restaurant.as_mut() {
            match self.db.get_restaurant(&prize.restaurant_id).await {
                Ok(restaurant) => prize.name = restaurant.map(|r| r.name),
                Err(e) => {
                    tracing::warn!(error = %e, restaurant_id = %prize.restaurant_id, "Failed to look up prize restaurant name");
                }
            }
        }
        Ok(result)
    }

    // ─── Periods & Accounts ──────────────────────────────────────

    /// Close the expired period and open the current week's. Idempotent.
    pub async fn rollover_period(&self, now: DateTime<Utc>) -> Result<CompetitionPeriod> {
        let today = self.day_boundary.local_date(now);
        let current = self.db.get_active_period().await?;
        let rollover = crate::models::period::rollover(current.as_ref(), today);

        if rollover.closed.is_some() || rollover.opened {
            self.db.apply_rollover(&rollover).await?;
            self.invalidate_leaderboard();
        } else {
            tracing::debug!(period = %rollover.active.id, "Active period still current");
        }
        Ok(rollover.active)
    }

    /// Erase every record belonging to a diner.
    pub async fn delete_account(&self, email: &str) -> Result<usize> {
        let email = normalize_email(email);
        let lock = self.diner_lock(&email);
        let _guard = lock.lock().await;

        let deleted = self.db.delete_diner_data(&email).await?;
        self.invalidate_leaderboard();
        self.diner_locks.remove(&email);
        Ok(deleted)
    }
}
