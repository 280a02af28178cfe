//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const GYMS: &str = "gyms";
    pub const GROUPS: &str = "groups";
    pub const MEMBERSHIP_REQUESTS: &str = "membershipRequests";
    pub const GYM_APPLICATIONS: &str = "gymApplications";
    pub const SCHEDULED_WORKOUTS: &str = "scheduledWorkouts";
    pub const WORKOUT_LOGS: &str = "workoutLogs";
    pub const LIFT_RESULTS: &str = "liftResults";
    pub const SKILL_LOGS: &str = "skillLogs";
    /// One entry per workout log, keyed by the log's ID
    pub const LEADERBOARD_ENTRIES: &str = "leaderboardEntries";
    pub const AI_SUGGESTIONS: &str = "aiSuggestions";
}
