// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Diners (profiles, points, streaks)
//! - Visits and reviews
//! - Per-restaurant activity history (rate-limit inputs)
//! - Competition periods and the point ledger

use crate::db::collections;
use crate::error::AppError;
use crate::models::ledger::ledger_doc_id;
use crate::models::period::Rollover;
use crate::models::{
    diner_key, CompetitionPeriod, DinerProfile, DinerRestaurantActivity, PointLedgerEntry,
    Restaurant, ReviewRecord, VisitRecord,
};
use crate::time_utils::{format_utc_rfc3339, rfc3339_secs};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Result of a create-only write.
#[derive(Debug)]
pub enum Claim<T> {
    /// The document did not exist and now holds our object.
    Created,
    /// The document already existed; its stored contents are returned.
    Exists(T),
}

/// Outcome of a transactional create-only write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Every write landed.
    Committed,
    /// The guarded document already existed; nothing was written.
    AlreadyRecorded,
}

/// Writes that make a point award visible, committed in one transaction.
#[derive(Debug, Clone)]
pub struct AwardCommit {
    pub activity: DinerRestaurantActivity,
    pub profile: DinerProfile,
    /// Absent when there is no active period
    pub ledger_entry: Option<PointLedgerEntry>,
}

/// Marker proving the one-time profile bonus was paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProfileBonusMarker {
    diner_email: String,
    points: u32,
    #[serde(with = "rfc3339_secs")]
    awarded_at: DateTime<Utc>,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Generic Helpers ─────────────────────────────────────────

    async fn get_by_id<T>(&self, collection: &str, doc_id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn upsert<T>(&self, collection: &str, doc_id: &str, object: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(doc_id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Create a document only if its id is unused.
    ///
    /// Firestore rejects the create when the document exists, so two
    /// concurrent writers of the same id cannot both succeed. The loser
    /// gets the winner's stored object back.
    async fn create_once<T>(
        &self,
        collection: &str,
        doc_id: &str,
        object: &T,
    ) -> Result<Claim<T>, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let inserted: Result<T, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .document_id(doc_id)
            .object(object)
            .execute()
            .await;

        match inserted {
            Ok(_) => Ok(Claim::Created),
            Err(insert_err) => match self.get_by_id::<T>(collection, doc_id).await? {
                Some(existing) => {
                    tracing::debug!(collection, doc_id, "Document already exists");
                    Ok(Claim::Exists(existing))
                }
                None => Err(AppError::Database(insert_err.to_string())),
            },
        }
    }

    async fn delete_by_id(&self, collection: &str, doc_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(doc_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All documents in `collection` whose `field` equals `value`.
    async fn query_eq<T>(&self, collection: &str, field: &str, value: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let value = value.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(|q| q.for_all([q.field(field).eq(value.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Diner Operations ────────────────────────────────────────

    pub async fn get_diner(&self, email: &str) -> Result<Option<DinerProfile>, AppError> {
        self.get_by_id(collections::DINERS, &diner_key(email)).await
    }

    pub async fn upsert_diner(&self, profile: &DinerProfile) -> Result<(), AppError> {
        self.upsert(collections::DINERS, &profile.key(), profile).await
    }

    /// Save a profile that includes the one-time completion bonus.
    ///
    /// The `profile_bonuses` marker is created in the same transaction as
    /// the profile write, so the points land exactly when the marker does.
    /// Returns `AlreadyRecorded` (and writes nothing) when the bonus was
    /// already paid, possibly by another instance racing on the same diner.
    pub async fn commit_profile_bonus(
        &self,
        profile: &DinerProfile,
        points: u32,
        now: DateTime<Utc>,
    ) -> Result<CommitOutcome, AppError> {
        let client = self.get_client()?;
        let marker = ProfileBonusMarker {
            diner_email: profile.email.clone(),
            points,
            awarded_at: now,
        };
        let marker_id = profile.key();

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::DINERS)
            .document_id(profile.key())
            .object(profile)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add profile to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::PROFILE_BONUSES)
            .precondition(firestore::FirestoreWritePrecondition::Exists(false))
            .document_id(&marker_id)
            .object(&marker)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add bonus marker to transaction: {}", e))
            })?;

        if let Err(commit_err) = transaction.commit().await {
            return match self
                .get_by_id::<ProfileBonusMarker>(collections::PROFILE_BONUSES, &marker_id)
                .await?
            {
                Some(_) => {
                    tracing::debug!(diner = %profile.email, "Profile bonus already paid");
                    Ok(CommitOutcome::AlreadyRecorded)
                }
                None => Err(AppError::Database(format!(
                    "Transaction commit failed: {}",
                    commit_err
                ))),
            };
        }
        Ok(CommitOutcome::Committed)
    }

    // ─── Visit / Review Operations ───────────────────────────────

    pub async fn get_restaurant_activity(
        &self,
        email: &str,
        restaurant_id: &str,
    ) -> Result<Option<DinerRestaurantActivity>, AppError> {
        self.get_by_id(
            collections::RESTAURANT_ACTIVITY,
            &DinerRestaurantActivity::doc_id(email, restaurant_id),
        )
        .await
    }

    /// Create the visit document; its id encodes the previous visit, so only
    /// one successor per previous visit can ever be written.
    pub async fn claim_visit(&self, visit: &VisitRecord) -> Result<Claim<VisitRecord>, AppError> {
        self.create_once(collections::VISITS, &visit.visit_id, visit)
            .await
    }

    pub async fn claim_review(
        &self,
        review: &ReviewRecord,
    ) -> Result<Claim<ReviewRecord>, AppError> {
        self.create_once(collections::REVIEWS, &review.review_id, review)
            .await
    }

    pub async fn get_review(&self, review_id: &str) -> Result<Option<ReviewRecord>, AppError> {
        self.get_by_id(collections::REVIEWS, review_id).await
    }

    pub async fn update_review(&self, review: &ReviewRecord) -> Result<(), AppError> {
        self.upsert(collections::REVIEWS, &review.review_id, review)
            .await
    }

    pub async fn delete_review(&self, review_id: &str) -> Result<(), AppError> {
        self.delete_by_id(collections::REVIEWS, review_id).await
    }

    /// Count a diner's reviews created in `[start, end)`.
    pub async fn count_reviews_between(
        &self,
        email: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32, AppError> {
        let email = email.to_string();
        let start = format_utc_rfc3339(start);
        let end = format_utc_rfc3339(end);

        let reviews: Vec<ReviewRecord> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::REVIEWS)
            .filter(move |q| {
                q.for_all([
                    q.field("diner_email").eq(email.clone()),
                    q.field("created_at").greater_than_or_equal(start.clone()),
                    q.field("created_at").less_than(end.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(reviews.len() as u32)
    }

    // ─── Point Ledger Operations ─────────────────────────────────

    pub async fn get_ledger_entry(
        &self,
        email: &str,
        source_id: &str,
    ) -> Result<Option<PointLedgerEntry>, AppError> {
        self.get_by_id(collections::POINT_LEDGER, &ledger_doc_id(email, source_id))
            .await
    }

    /// All ledger entries for a competition period, oldest first.
    pub async fn get_period_ledger(
        &self,
        period_id: &str,
    ) -> Result<Vec<PointLedgerEntry>, AppError> {
        let period_id = period_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::POINT_LEDGER)
            .filter(move |q| q.for_all([q.field("leaderboard_period_id").eq(period_id.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Competition Periods ─────────────────────────────────────

    /// The active competition period, if any.
    pub async fn get_active_period(&self) -> Result<Option<CompetitionPeriod>, AppError> {
        let mut periods: Vec<CompetitionPeriod> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::PERIODS)
            .filter(|q| q.for_all([q.field("status").eq("active")]))
            .order_by([("start_date", firestore::FirestoreQueryDirection::Descending)])
            .limit(2)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if periods.len() > 1 {
            tracing::warn!(
                newest = %periods[0].id,
                other = %periods[1].id,
                "More than one active competition period; using the newest"
            );
        }

        Ok(if periods.is_empty() {
            None
        } else {
            Some(periods.swap_remove(0))
        })
    }

    /// Persist a rollover: close the expired period and open the new one together.
    pub async fn apply_rollover(&self, rollover: &Rollover) -> Result<(), AppError> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let mut writes = Vec::new();
        if let Some(closed) = &rollover.closed {
            writes.push(closed);
        }
        if rollover.opened {
            writes.push(&rollover.active);
        }

        for period in writes {
            client
                .fluent()
                .update()
                .in_col(collections::PERIODS)
                .document_id(&period.id)
                .object(period)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add period to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            closed = ?rollover.closed.as_ref().map(|p| &p.id),
            active = %rollover.active.id,
            "Competition period rollover applied"
        );
        Ok(())
    }

    // ─── Restaurants ─────────────────────────────────────────────

    pub async fn get_restaurant(&self, restaurant_id: &str) -> Result<Option<Restaurant>, AppError> {
        self.get_by_id(collections::RESTAURANTS, restaurant_id)
            .await
    }

    // ─── Atomic Award ────────────────────────────────────────────

    /// Atomically update the rate-limit history, the diner profile and the
    /// ledger after a visit or review document has been claimed.
    ///
    /// The ledger entry is create-only: if `(diner, source_id)` is already
    /// recorded the whole transaction aborts, so the profile is never paid
    /// twice for one award.
    pub async fn commit_award(&self, award: &AwardCommit) -> Result<CommitOutcome, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::RESTAURANT_ACTIVITY)
            .document_id(award.activity.key())
            .object(&award.activity)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add activity to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::DINERS)
            .document_id(award.profile.key())
            .object(&award.profile)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add profile to transaction: {}", e))
            })?;

        if let Some(entry) = &award.ledger_entry {
            client
                .fluent()
                .update()
                .in_col(collections::POINT_LEDGER)
                .precondition(firestore::FirestoreWritePrecondition::Exists(false))
                .document_id(entry.doc_id())
                .object(entry)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add ledger entry to transaction: {}", e))
                })?;
        }

        if let Err(commit_err) = transaction.commit().await {
            if let Some(entry) = &award.ledger_entry {
                if self
                    .get_ledger_entry(&entry.diner_email, &entry.source_id)
                    .await?
                    .is_some()
                {
                    tracing::debug!(
                        diner = %entry.diner_email,
                        source_id = %entry.source_id,
                        "Ledger entry already recorded; award skipped"
                    );
                    return Ok(CommitOutcome::AlreadyRecorded);
                }
            }
            return Err(AppError::Database(format!(
                "Transaction commit failed: {}",
                commit_err
            )));
        }

        tracing::debug!(
            diner = %award.profile.email,
            restaurant_id = %award.activity.restaurant_id,
            ledger = award.ledger_entry.is_some(),
            "Award committed atomically"
        );
        Ok(CommitOutcome::Committed)
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    // ─── Diner Data Erasure ──────────────────────────────────────

    /// Delete ALL data for a diner (account erasure).
    ///
    /// Removes ledger entries, reviews, visits, per-restaurant history, the
    /// profile-bonus marker and the profile. Returns the number of documents
    /// deleted.
    pub async fn delete_diner_data(&self, email: &str) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        let ledger: Vec<PointLedgerEntry> = self
            .query_eq(collections::POINT_LEDGER, "diner_email", email)
            .await?;
        self.batch_delete(&ledger, collections::POINT_LEDGER, |e: &PointLedgerEntry| {
            e.doc_id()
        })
        .await?;
        deleted_count += ledger.len();
        tracing::debug!(diner = %email, count = ledger.len(), "Deleted ledger entries");

        let reviews: Vec<ReviewRecord> = self
            .query_eq(collections::REVIEWS, "diner_email", email)
            .await?;
        self.batch_delete(&reviews, collections::REVIEWS, |r: &ReviewRecord| {
            r.review_id.clone()
        })
        .await?;
        deleted_count += reviews.len();
        tracing::debug!(diner = %email, count = reviews.len(), "Deleted reviews");

        let visits: Vec<VisitRecord> = self
            .query_eq(collections::VISITS, "diner_email", email)
            .await?;
        self.batch_delete(&visits, collections::VISITS, |v: &VisitRecord| {
            v.visit_id.clone()
        })
        .await?;
        deleted_count += visits.len();
        tracing::debug!(diner = %email, count = visits.len(), "Deleted visits");

        let activity: Vec<DinerRestaurantActivity> = self
            .query_eq(collections::RESTAURANT_ACTIVITY, "diner_email", email)
            .await?;
        self.batch_delete(
            &activity,
            collections::RESTAURANT_ACTIVITY,
            |a: &DinerRestaurantActivity| a.key(),
        )
        .await?;
        deleted_count += activity.len();

        self.delete_by_id(collections::PROFILE_BONUSES, &diner_key(email))
            .await?;
        self.delete_by_id(collections::DINERS, &diner_key(email))
            .await?;
        deleted_count += 2;

        tracing::info!(diner = %email, deleted_count, "Diner data deletion complete");
        Ok(deleted_count)
    }
}
