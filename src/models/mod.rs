// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod group;
pub mod gym;
pub mod leaderboard;
pub mod log;
pub mod role;
pub mod schedule;
pub mod suggestion;
pub mod user;

pub use group::{DefaultTimeSlot, GroupType, MembershipType, WorkoutGroup};
pub use gym::{
    ApplicationStatus, Gym, GymApplication, GymContact, GymMembershipRequest,
    MembershipRequestStatus,
};
pub use leaderboard::LeaderboardEntry;
pub use log::{Category, LiftResult, Performance, ResultType, SkillLog, WodScore, WorkoutLog};
pub use role::UserRole;
pub use schedule::{
    MonthlyOption, Recurrence, ScheduledWorkout, SignupError, TimeSlot, Weekday, WorkoutComponent,
};
pub use suggestion::{AiSuggestion, SuggestionBatch, SuggestionKind};
pub use user::{AiCoachPreferences, AppUser, Gender};
