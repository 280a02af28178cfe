// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! WOD Tracker: gym management and workout tracking for CrossFit boxes
//!
//! This crate provides the backend API for gyms, class scheduling,
//! workout logging, leaderboards, progress analytics and AI coaching.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{AiCoach, FirebaseTokenVerifier};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub token_verifier: Arc<FirebaseTokenVerifier>,
    pub coach: AiCoach,
}
