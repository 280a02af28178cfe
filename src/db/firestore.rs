// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users, gyms, groups and membership requests
//! - Scheduled workouts and class signups
//! - Workout logs, lift results, skill logs and leaderboard entries
//! - Shared AI suggestions

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    AiSuggestion, AppUser, ApplicationStatus, Gym, GymApplication, GymMembershipRequest,
    LeaderboardEntry, LiftResult, MembershipRequestStatus, ScheduledWorkout, SkillLog, UserRole,
    WorkoutGroup, WorkoutLog,
};
use dashmap::DashMap;
use firestore::errors::{BackoffError, FirestoreError};
use futures_util::{stream, FutureExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;
/// Upper bound for per-user history queries.
pub const HISTORY_LIMIT: u32 = 1000;

/// Map a failed `run_transaction` back onto the error the closure raised.
fn transaction_error(err: FirestoreError) -> AppError {
    match err {
        FirestoreError::ErrorInTransaction(e) => match e.source.downcast::<AppError>() {
            Ok(app) => *app,
            Err(other) => AppError::Database(other.to_string()),
        },
        other => AppError::Database(format!("Transaction failed: {}", other)),
    }
}

/// Held per-document lock. Dropping it evicts the map slot once no other
/// task holds or waits on the same document.
struct DocLockGuard {
    key: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for DocLockGuard {
    fn drop(&mut self) {
        drop(self.held.take());
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    /// Serializes read-modify-write cycles on one document within this instance
    doc_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self::with_client(Some(client)))
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

        Ok(Self::with_client(Some(client)))
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self::with_client(None)
    }

    fn with_client(client: Option<firestore::FirestoreDb>) -> Self {
        Self {
            client,
            doc_locks: Arc::new(DashMap::new()),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Wait for this instance's lock on one document.
    ///
    /// Transactions already make cross-instance writes safe; the local lock
    /// keeps same-instance writers from burning through commit retries.
    async fn lock_doc(&self, collection: &str, id: &str) -> DocLockGuard {
        let mut guard = DocLockGuard {
            key: format!("{collection}/{id}"),
            locks: Arc::clone(&self.doc_locks),
            held: None,
        };
        let lock = self.doc_locks.entry(guard.key.clone()).or_default().clone();
        guard.held = Some(lock.lock_owned().await);
        guard
    }

    // ─── Generic Document Helpers ────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + Sync + Send + DeserializeOwned,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Documents whose `field` equals `value`, optionally newest first by `order_field`.
    async fn query_eq<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        order_field: Option<&str>,
        limit: u32,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(|q| q.for_all([q.field(field).eq(value)]));

        let query = match order_field {
            Some(order) => {
                query.order_by([(order, firestore::FirestoreQueryDirection::Descending)])
            }
            None => query,
        };

        query
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Documents whose array `field` contains `value`.
    async fn query_array_contains<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(|q| q.for_all([q.field(field).array_contains(value)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn add_set_to_transaction<T>(
        client: &firestore::FirestoreDb,
        transaction: &mut firestore::FirestoreTransaction<'_>,
        collection: &str,
        id: &str,
        doc: &T,
    ) -> Result<(), AppError>
    where
        T: Serialize + Sync + Send + DeserializeOwned,
    {
        client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .add_to_transaction(transaction)
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to add {} write to transaction: {}",
                    collection, e
                ))
            })?;
        Ok(())
    }

    fn add_delete_to_transaction(
        client: &firestore::FirestoreDb,
        transaction: &mut firestore::FirestoreTransaction<'_>,
        collection: &str,
        id: &str,
    ) -> Result<(), AppError> {
        client
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .add_to_transaction(transaction)
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to add {} deletion to transaction: {}",
                    collection, e
                ))
            })?;
        Ok(())
    }

    /// Read-modify-write one document inside a Firestore transaction.
    ///
    /// `f` may run more than once when the commit conflicts with another
    /// writer, so it must only mutate the document it is handed.
    async fn modify_doc<T, R, F>(&self, collection: &'static str, id: &str, f: F) -> Result<(T, R), AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        R: Send + 'static,
        F: Fn(&mut T) -> Result<R, AppError> + Send + Sync + 'static,
    {
        let client = self.get_client()?;
        let _guard = self.lock_doc(collection, id).await;

        let f = Arc::new(f);
        let id = id.to_string();
        client
            .run_transaction(move |db, transaction| {
                let f = Arc::clone(&f);
                let id = id.clone();
                async move {
                    let mut doc: T = Self::read_in_transaction(&db, collection, &id).await?;
                    let result = f(&mut doc).map_err(BackoffError::permanent)?;
                    Self::add_set_to_transaction(&db, transaction, collection, &id, &doc)
                        .map_err(BackoffError::permanent)?;
                    Ok::<_, BackoffError<AppError>>((doc, result))
                }
                .boxed()
            })
            .await
            .map_err(transaction_error)
    }

    /// Read a required document through a transaction-bound client.
    async fn read_in_transaction<T>(
        db: &firestore::FirestoreDb,
        collection: &str,
        id: &str,
    ) -> Result<T, BackoffError<AppError>>
    where
        T: DeserializeOwned + Send,
    {
        db.fluent()
            .select()
            .by_id_in(collection)
            .obj::<T>()
            .one(id)
            .await
            .map_err(|e| BackoffError::permanent(AppError::Database(e.to_string())))?
            .ok_or_else(|| BackoffError::permanent(AppError::NotFound(format!("{collection}/{id}"))))
    }

    /// All groups of a gym, read through a transaction-bound client.
    async fn gym_groups_in_transaction(
        db: &firestore::FirestoreDb,
        gym_id: &str,
    ) -> Result<Vec<WorkoutGroup>, BackoffError<AppError>> {
        db.fluent()
            .select()
            .from(collections::GROUPS)
            .filter(|q| q.for_all([q.field("gymId").eq(gym_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| BackoffError::permanent(AppError::Database(e.to_string())))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by Firebase uid.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<AppUser>, AppError> {
        self.get_doc(collections::USERS, user_id).await
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &AppUser) -> Result<(), AppError> {
        self.set_doc(collections::USERS, &user.id, user).await
    }

    /// Transactionally read-modify-write a user profile.
    pub async fn modify_user<R, F>(&self, user_id: &str, f: F) -> Result<(AppUser, R), AppError>
    where
        R: Send + 'static,
        F: Fn(&mut AppUser) -> Result<R, AppError> + Send + Sync + 'static,
    {
        self.modify_doc(collections::USERS, user_id, f).await
    }

    /// Fetch several users concurrently. Missing users are omitted.
    pub async fn get_users(&self, user_ids: &[String]) -> Result<HashMap<String, AppUser>, AppError> {
        let results = stream::iter(user_ids.iter().cloned())
            .map(|id| async move { self.get_user(&id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<AppUser>, AppError>>>()
            .await;

        let mut users = HashMap::with_capacity(results.len());
        for user in results {
            if let Some(user) = user? {
                users.insert(user.id.clone(), user);
            }
        }
        Ok(users)
    }

    // ─── Gym Operations ──────────────────────────────────────────

    pub async fn get_gym(&self, gym_id: &str) -> Result<Option<Gym>, AppError> {
        self.get_doc(collections::GYMS, gym_id).await
    }

    pub async fn upsert_gym(&self, gym: &Gym) -> Result<(), AppError> {
        self.set_doc(collections::GYMS, &gym.id, gym).await
    }

    /// All gyms, for browsing and join requests.
    pub async fn list_gyms(&self, limit: u32) -> Result<Vec<Gym>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::GYMS)
            .order_by([("name", firestore::FirestoreQueryDirection::Ascending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Gyms where the user is owner, coach or member.
    pub async fn list_gyms_for_user(&self, user_id: &str) -> Result<Vec<Gym>, AppError> {
        let (owned, coached, joined) = tokio::try_join!(
            self.query_eq::<Gym>(collections::GYMS, "ownerId", user_id, None, HISTORY_LIMIT),
            self.query_array_contains::<Gym>(collections::GYMS, "coachIds", user_id),
            self.query_array_contains::<Gym>(collections::GYMS, "memberIds", user_id),
        )?;

        let mut by_id: HashMap<String, Gym> = HashMap::new();
        for gym in owned.into_iter().chain(coached).chain(joined) {
            by_id.entry(gym.id.clone()).or_insert(gym);
        }

        let mut gyms: Vec<Gym> = by_id.into_values().collect();
        gyms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(gyms)
    }

    /// Atomically create a gym together with its default group.
    pub async fn create_gym(&self, gym: &Gym, default_group: &WorkoutGroup) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        Self::add_set_to_transaction(client, &mut transaction, collections::GYMS, &gym.id, gym)?;
        Self::add_set_to_transaction(
            client,
            &mut transaction,
            collections::GROUPS,
            &default_group.id,
            default_group,
        )?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(gym_id = %gym.id, owner_id = %gym.owner_id, "Gym created");
        Ok(())
    }

    /// Transactionally read-modify-write a gym.
    pub async fn modify_gym<R, F>(&self, gym_id: &str, f: F) -> Result<(Gym, R), AppError>
    where
        R: Send + 'static,
        F: Fn(&mut Gym) -> Result<R, AppError> + Send + Sync + 'static,
    {
        self.modify_doc(collections::GYMS, gym_id, f).await
    }

    /// Remove a user from a gym and from the member and coach lists of every
    /// group in it, in one transaction. The owner cannot be removed.
    pub async fn remove_gym_member(&self, gym_id: &str, member_id: &str) -> Result<Gym, AppError> {
        let client = self.get_client()?;
        let _guard = self.lock_doc(collections::GYMS, gym_id).await;

        let gym_id = gym_id.to_string();
        let member_id = member_id.to_string();
        let (gym, groups) = client
            .run_transaction(move |db, transaction| {
                let gym_id = gym_id.clone();
                let member_id = member_id.clone();
                async move {
                    let mut gym: Gym =
                        Self::read_in_transaction(&db, collections::GYMS, &gym_id).await?;
                    if gym.is_owner(&member_id) {
                        return Err(BackoffError::permanent(AppError::BadRequest(
                            "the gym owner cannot be removed".to_string(),
                        )));
                    }
                    if !gym.remove_member(&member_id) {
                        return Err(BackoffError::permanent(AppError::NotFound(format!(
                            "member {member_id}"
                        ))));
                    }

                    let groups: Vec<WorkoutGroup> = Self::gym_groups_in_transaction(&db, &gym_id)
                        .await?
                        .into_iter()
                        .filter_map(|mut g| g.remove_user(&member_id).then_some(g))
                        .collect();

                    Self::add_set_to_transaction(&db, transaction, collections::GYMS, &gym.id, &gym)
                        .map_err(BackoffError::permanent)?;
                    for group in &groups {
                        Self::add_set_to_transaction(
                            &db,
                            transaction,
                            collections::GROUPS,
                            &group.id,
                            group,
                        )
                        .map_err(BackoffError::permanent)?;
                    }
                    Ok::<_, BackoffError<AppError>>((gym, groups.len()))
                }
                .boxed()
            })
            .await
            .map_err(transaction_error)?;

        tracing::info!(gym_id = %gym.id, groups, "Member removed from gym and groups");
        Ok(gym)
    }

    // ─── Membership Request Operations ───────────────────────────

    pub async fn get_membership_request(
        &self,
        request_id: &str,
    ) -> Result<Option<GymMembershipRequest>, AppError> {
        self.get_doc(collections::MEMBERSHIP_REQUESTS, request_id)
            .await
    }

    pub async fn upsert_membership_request(
        &self,
        request: &GymMembershipRequest,
    ) -> Result<(), AppError> {
        self.set_doc(collections::MEMBERSHIP_REQUESTS, &request.id, request)
            .await
    }

    /// Requests for a gym, oldest first, optionally narrowed by status.
    pub async fn list_membership_requests(
        &self,
        gym_id: &str,
        status: Option<MembershipRequestStatus>,
    ) -> Result<Vec<GymMembershipRequest>, AppError> {
        let mut requests: Vec<GymMembershipRequest> = self
            .query_eq(
                collections::MEMBERSHIP_REQUESTS,
                "gymId",
                gym_id,
                None,
                HISTORY_LIMIT,
            )
            .await?;

        if let Some(status) = status {
            requests.retain(|r| r.status == status);
        }
        requests.sort_by_key(|r| r.requested_at);
        Ok(requests)
    }

    /// The user's open request for a gym, if any.
    pub async fn find_pending_request(
        &self,
        gym_id: &str,
        user_id: &str,
    ) -> Result<Option<GymMembershipRequest>, AppError> {
        let requests: Vec<GymMembershipRequest> = self
            .query_eq(
                collections::MEMBERSHIP_REQUESTS,
                "userId",
                user_id,
                None,
                HISTORY_LIMIT,
            )
            .await?;

        Ok(requests
            .into_iter()
            .find(|r| r.gym_id == gym_id && r.status == MembershipRequestStatus::Pending))
    }

    /// Approve a membership request: add the user to the gym and to every
    /// auto-assign group of the gym, and store the resolved request, in one
    /// transaction. The request must already be marked approved.
    pub async fn approve_membership(&self, request: &GymMembershipRequest) -> Result<Gym, AppError> {
        let client = self.get_client()?;
        let _guard = self.lock_doc(collections::GYMS, &request.gym_id).await;

        let request = request.clone();
        let user_id = request.user_id.clone();
        let (gym, groups) = client
            .run_transaction(move |db, transaction| {
                let request = request.clone();
                async move {
                    let mut gym: Gym =
                        Self::read_in_transaction(&db, collections::GYMS, &request.gym_id).await?;
                    gym.add_member(&request.user_id);

                    let groups: Vec<WorkoutGroup> = Self::gym_groups_in_transaction(&db, &gym.id)
                        .await?
                        .into_iter()
                        .filter(|g| g.is_auto_assign())
                        .filter_map(|mut g| g.add_member(&request.user_id).then_some(g))
                        .collect();

                    Self::add_set_to_transaction(&db, transaction, collections::GYMS, &gym.id, &gym)
                        .map_err(BackoffError::permanent)?;
                    for group in &groups {
                        Self::add_set_to_transaction(
                            &db,
                            transaction,
                            collections::GROUPS,
                            &group.id,
                            group,
                        )
                        .map_err(BackoffError::permanent)?;
                    }
                    Self::add_set_to_transaction(
                        &db,
                        transaction,
                        collections::MEMBERSHIP_REQUESTS,
                        &request.id,
                        &request,
                    )
                    .map_err(BackoffError::permanent)?;
                    Ok::<_, BackoffError<AppError>>((gym, groups.len()))
                }
                .boxed()
            })
            .await
            .map_err(transaction_error)?;

        tracing::info!(gym_id = %gym.id, user_id = %user_id, groups, "Membership approved");
        Ok(gym)
    }

    // ─── Gym Application Operations ──────────────────────────────

    pub async fn get_gym_application(
        &self,
        application_id: &str,
    ) -> Result<Option<GymApplication>, AppError> {
        self.get_doc(collections::GYM_APPLICATIONS, application_id)
            .await
    }

    pub async fn upsert_gym_application(&self, application: &GymApplication) -> Result<(), AppError> {
        self.set_doc(collections::GYM_APPLICATIONS, &application.id, application)
            .await
    }

    /// Applications, newest first, optionally narrowed by status.
    pub async fn list_gym_applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<GymApplication>, AppError> {
        let mut applications: Vec<GymApplication> = match status {
            Some(status) => {
                self.query_eq(
                    collections::GYM_APPLICATIONS,
                    "status",
                    status.as_str(),
                    None,
                    HISTORY_LIMIT,
                )
                .await?
            }
            None => self
                .get_client()?
                .fluent()
                .select()
                .from(collections::GYM_APPLICATIONS)
                .limit(HISTORY_LIMIT)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        };
        applications.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(applications)
    }

    /// A user's own applications, newest first.
    pub async fn list_gym_applications_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<GymApplication>, AppError> {
        let mut applications: Vec<GymApplication> = self
            .query_eq(
                collections::GYM_APPLICATIONS,
                "userId",
                user_id,
                None,
                HISTORY_LIMIT,
            )
            .await?;
        applications.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(applications)
    }

    /// Transactionally read-modify-write a gym application.
    pub async fn modify_gym_application<R, F>(
        &self,
        application_id: &str,
        f: F,
    ) -> Result<(GymApplication, R), AppError>
    where
        R: Send + 'static,
        F: Fn(&mut GymApplication) -> Result<R, AppError> + Send + Sync + 'static,
    {
        self.modify_doc(collections::GYM_APPLICATIONS, application_id, f)
            .await
    }

    /// Approve a pending application in one transaction: create the gym and
    /// its default group, make the applicant an owner if their role is
    /// lower, and record the review.
    pub async fn approve_gym_application(
        &self,
        application_id: &str,
        reviewer_id: &str,
    ) -> Result<(GymApplication, Gym), AppError> {
        let client = self.get_client()?;
        let _guard = self
            .lock_doc(collections::GYM_APPLICATIONS, application_id)
            .await;

        let application_id = application_id.to_string();
        let reviewer_id = reviewer_id.to_string();
        let (application, gym, promoted) = client
            .run_transaction(move |db, transaction| {
                let application_id = application_id.clone();
                let reviewer_id = reviewer_id.clone();
                async move {
                    let mut application: GymApplication = Self::read_in_transaction(
                        &db,
                        collections::GYM_APPLICATIONS,
                        &application_id,
                    )
                    .await?;
                    if application.status != ApplicationStatus::Pending {
                        return Err(BackoffError::permanent(AppError::Conflict(
                            "application was already reviewed".to_string(),
                        )));
                    }
                    let mut applicant: AppUser =
                        Self::read_in_transaction(&db, collections::USERS, &application.user_id)
                            .await?;

                    let gym = application.to_gym();
                    let default_group = WorkoutGroup::default_for_gym(&gym.id, &gym.owner_id);
                    application.approve(&reviewer_id, &gym.id);

                    let promoted = !applicant.role.can_manage_gyms();
                    if promoted {
                        applicant.role = UserRole::Owner;
                        Self::add_set_to_transaction(
                            &db,
                            transaction,
                            collections::USERS,
                            &applicant.id,
                            &applicant,
                        )
                        .map_err(BackoffError::permanent)?;
                    }
                    Self::add_set_to_transaction(&db, transaction, collections::GYMS, &gym.id, &gym)
                        .map_err(BackoffError::permanent)?;
                    Self::add_set_to_transaction(
                        &db,
                        transaction,
                        collections::GROUPS,
                        &default_group.id,
                        &default_group,
                    )
                    .map_err(BackoffError::permanent)?;
                    Self::add_set_to_transaction(
                        &db,
                        transaction,
                        collections::GYM_APPLICATIONS,
                        &application.id,
                        &application,
                    )
                    .map_err(BackoffError::permanent)?;
                    Ok::<_, BackoffError<AppError>>((application, gym, promoted))
                }
                .boxed()
            })
            .await
            .map_err(transaction_error)?;

        tracing::info!(
            application_id = %application.id,
            gym_id = %gym.id,
            owner_id = %gym.owner_id,
            promoted,
            "Gym application approved"
        );
        Ok((application, gym))
    }

    // ─── Group Operations ────────────────────────────────────────

    pub async fn get_group(&self, group_id: &str) -> Result<Option<WorkoutGroup>, AppError> {
        self.get_doc(collections::GROUPS, group_id).await
    }

    pub async fn upsert_group(&self, group: &WorkoutGroup) -> Result<(), AppError> {
        self.set_doc(collections::GROUPS, &group.id, group).await
    }

    /// Transactionally read-modify-write a group.
    pub async fn modify_group<R, F>(&self, group_id: &str, f: F) -> Result<(WorkoutGroup, R), AppError>
    where
        R: Send + 'static,
        F: Fn(&mut WorkoutGroup) -> Result<R, AppError> + Send + Sync + 'static,
    {
        self.modify_doc(collections::GROUPS, group_id, f).await
    }

    pub async fn delete_group(&self, group_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::GROUPS, group_id).await
    }

    pub async fn list_groups_for_gym(&self, gym_id: &str) -> Result<Vec<WorkoutGroup>, AppError> {
        let mut groups: Vec<WorkoutGroup> = self
            .query_eq(collections::GROUPS, "gymId", gym_id, None, HISTORY_LIMIT)
            .await?;
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    /// Groups the user belongs to as member or coach.
    pub async fn list_groups_for_user(&self, user_id: &str) -> Result<Vec<WorkoutGroup>, AppError> {
        let (members, coaches) = tokio::try_join!(
            self.query_array_contains::<WorkoutGroup>(collections::GROUPS, "memberIds", user_id),
            self.query_array_contains::<WorkoutGroup>(collections::GROUPS, "coachIds", user_id),
        )?;

        let mut by_id: HashMap<String, WorkoutGroup> = HashMap::new();
        for group in members.into_iter().chain(coaches) {
            by_id.entry(group.id.clone()).or_insert(group);
        }
        Ok(by_id.into_values().collect())
    }

    /// Fetch groups by ID concurrently. Missing groups are omitted.
    pub async fn get_groups(&self, group_ids: &[String]) -> Result<Vec<WorkoutGroup>, AppError> {
        let results = stream::iter(group_ids.iter().cloned())
            .map(|id| async move { self.get_group(&id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<WorkoutGroup>, AppError>>>()
            .await;

        let mut groups = Vec::with_capacity(results.len());
        for group in results {
            groups.extend(group?);
        }
        Ok(groups)
    }

    // ─── Scheduled Workout Operations ────────────────────────────

    pub async fn get_scheduled_workout(
        &self,
        workout_id: &str,
    ) -> Result<Option<ScheduledWorkout>, AppError> {
        self.get_doc(collections::SCHEDULED_WORKOUTS, workout_id)
            .await
    }

    pub async fn upsert_scheduled_workout(&self, workout: &ScheduledWorkout) -> Result<(), AppError> {
        self.set_doc(collections::SCHEDULED_WORKOUTS, &workout.id, workout)
            .await
    }

    pub async fn delete_scheduled_workout(&self, workout_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::SCHEDULED_WORKOUTS, workout_id)
            .await
    }

    pub async fn list_scheduled_workouts_for_gym(
        &self,
        gym_id: &str,
    ) -> Result<Vec<ScheduledWorkout>, AppError> {
        self.query_eq(
            collections::SCHEDULED_WORKOUTS,
            "gymId",
            gym_id,
            None,
            HISTORY_LIMIT,
        )
        .await
    }

    /// Workouts a user created, including personal ones with no gym.
    pub async fn list_scheduled_workouts_by_creator(
        &self,
        user_id: &str,
    ) -> Result<Vec<ScheduledWorkout>, AppError> {
        self.query_eq(
            collections::SCHEDULED_WORKOUTS,
            "createdBy",
            user_id,
            None,
            HISTORY_LIMIT,
        )
        .await
    }

    /// Transactionally read-modify-write a scheduled workout.
    ///
    /// Slot signups go through here so concurrent signups, on this instance
    /// or another, cannot overwrite each other.
    pub async fn modify_scheduled_workout<R, F>(
        &self,
        workout_id: &str,
        f: F,
    ) -> Result<(ScheduledWorkout, R), AppError>
    where
        R: Send + 'static,
        F: Fn(&mut ScheduledWorkout) -> Result<R, AppError> + Send + Sync + 'static,
    {
        self.modify_doc(collections::SCHEDULED_WORKOUTS, workout_id, f)
            .await
    }

    // ─── Workout Log Operations ──────────────────────────────────

    pub async fn get_workout_log(&self, log_id: &str) -> Result<Option<WorkoutLog>, AppError> {
        self.get_doc(collections::WORKOUT_LOGS, log_id).await
    }

    /// A user's WOD logs, most recent first.
    pub async fn list_workout_logs(&self, user_id: &str) -> Result<Vec<WorkoutLog>, AppError> {
        self.query_eq(
            collections::WORKOUT_LOGS,
            "userId",
            user_id,
            Some("completedDate"),
            HISTORY_LIMIT,
        )
        .await
    }

    /// Atomically store a WOD log and keep its leaderboard entry in step:
    /// written when given, removed otherwise.
    pub async fn save_workout_log(
        &self,
        log: &WorkoutLog,
        entry: Option<&LeaderboardEntry>,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        Self::add_set_to_transaction(
            client,
            &mut transaction,
            collections::WORKOUT_LOGS,
            &log.id,
            log,
        )?;
        match entry {
            Some(entry) => Self::add_set_to_transaction(
                client,
                &mut transaction,
                collections::LEADERBOARD_ENTRIES,
                &entry.id,
                entry,
            )?,
            None => Self::add_delete_to_transaction(
                client,
                &mut transaction,
                collections::LEADERBOARD_ENTRIES,
                &log.id,
            )?,
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id = %log.user_id,
            log_id = %log.id,
            leaderboard = entry.is_some(),
            personal_record = log.is_personal_record,
            "Workout log saved"
        );
        Ok(())
    }

    /// Atomically delete a WOD log and its leaderboard entry.
    pub async fn delete_workout_log(&self, log_id: &str) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        Self::add_delete_to_transaction(client, &mut transaction, collections::WORKOUT_LOGS, log_id)?;
        Self::add_delete_to_transaction(
            client,
            &mut transaction,
            collections::LEADERBOARD_ENTRIES,
            log_id,
        )?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(log_id, "Workout log deleted");
        Ok(())
    }

    // ─── Lift & Skill Operations ─────────────────────────────────

    pub async fn list_lift_results(&self, user_id: &str) -> Result<Vec<LiftResult>, AppError> {
        self.query_eq(
            collections::LIFT_RESULTS,
            "userId",
            user_id,
            Some("date"),
            HISTORY_LIMIT,
        )
        .await
    }

    pub async fn save_lift_result(&self, lift: &LiftResult) -> Result<(), AppError> {
        self.set_doc(collections::LIFT_RESULTS, &lift.id, lift).await
    }

    pub async fn get_lift_result(&self, lift_id: &str) -> Result<Option<LiftResult>, AppError> {
        self.get_doc(collections::LIFT_RESULTS, lift_id).await
    }

    pub async fn delete_lift_result(&self, lift_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::LIFT_RESULTS, lift_id).await
    }

    pub async fn list_skill_logs(&self, user_id: &str) -> Result<Vec<SkillLog>, AppError> {
        self.query_eq(
            collections::SKILL_LOGS,
            "userId",
            user_id,
            Some("date"),
            HISTORY_LIMIT,
        )
        .await
    }

    pub async fn save_skill_log(&self, skill: &SkillLog) -> Result<(), AppError> {
        self.set_doc(collections::SKILL_LOGS, &skill.id, skill).await
    }

    // ─── Leaderboard Operations ──────────────────────────────────

    /// Leaderboard entries, optionally for one normalized workout name.
    pub async fn list_leaderboard_entries(
        &self,
        normalized_name: Option<&str>,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, AppError> {
        match normalized_name {
            Some(name) => {
                self.query_eq(
                    collections::LEADERBOARD_ENTRIES,
                    "normalizedWorkoutName",
                    name,
                    None,
                    limit,
                )
                .await
            }
            None => self
                .get_client()?
                .fluent()
                .select()
                .from(collections::LEADERBOARD_ENTRIES)
                .order_by([("completedDate", firestore::FirestoreQueryDirection::Descending)])
                .limit(limit)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
        }
    }

    /// Remove every leaderboard entry for a user. Returns the count removed.
    pub async fn delete_leaderboard_entries_for_user(&self, user_id: &str) -> Result<usize, AppError> {
        let mut count = 0;
        loop {
            let entries: Vec<LeaderboardEntry> = self
                .query_eq(
                    collections::LEADERBOARD_ENTRIES,
                    "userId",
                    user_id,
                    None,
                    HISTORY_LIMIT,
                )
                .await?;
            if entries.is_empty() {
                break;
            }

            count += entries.len();
            self.batch_delete(&entries, collections::LEADERBOARD_ENTRIES, |entry| {
                entry.id.clone()
            })
            .await?;
        }

        tracing::info!(user_id, count, "Removed leaderboard entries");
        Ok(count)
    }

    // ─── AI Suggestion Operations ────────────────────────────────

    pub async fn get_suggestion(&self, suggestion_id: &str) -> Result<Option<AiSuggestion>, AppError> {
        self.get_doc(collections::AI_SUGGESTIONS, suggestion_id)
            .await
    }

    pub async fn upsert_suggestion(&self, suggestion: &AiSuggestion) -> Result<(), AppError> {
        self.set_doc(collections::AI_SUGGESTIONS, &suggestion.id, suggestion)
            .await
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
                Self::add_delete_to_transaction(
                    client,
                    &mut transaction,
                    collection,
                    &id_extractor(item),
                )?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}
