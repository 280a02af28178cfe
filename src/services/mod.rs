// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod coach;
pub mod firebase_auth;
pub mod gemini;
pub mod grok;
pub mod leaderboard;
pub mod matching;
pub mod progress;

pub use coach::{AiCoach, AiTask, ScanError, ScannedWorkout};
pub use firebase_auth::{FirebaseIdentity, FirebaseTokenVerifier, TokenError};
pub use gemini::GeminiClient;
pub use grok::GrokClient;
pub use leaderboard::{build_leaderboards, LeaderboardFilter, WorkoutLeaderboard};
pub use matching::{find_similar_names, normalize_workout_name, similarity_score};
pub use progress::{compute_progress, ProgressReport};
