// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User roles and the permission hierarchy.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Role of a user. Roles are strictly ordered: each level inherits the
/// permissions of every level below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum UserRole {
    #[default]
    Athlete,
    Coach,
    Owner,
    SuperAdmin,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Athlete,
        UserRole::Coach,
        UserRole::Owner,
        UserRole::SuperAdmin,
    ];

    pub fn level(self) -> u8 {
        match self {
            UserRole::Athlete => 0,
            UserRole::Coach => 1,
            UserRole::Owner => 2,
            UserRole::SuperAdmin => 3,
        }
    }

    /// True when this role is at least as privileged as `minimum`.
    pub fn has_permission(self, minimum: UserRole) -> bool {
        self.level() >= minimum.level()
    }

    pub fn can_program_workouts(self) -> bool {
        self.has_permission(UserRole::Coach)
    }

    pub fn can_manage_gyms(self) -> bool {
        self.has_permission(UserRole::Owner)
    }

    pub fn can_view_member_progress(self) -> bool {
        self.has_permission(UserRole::Coach)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            UserRole::Athlete => "Athlete",
            UserRole::Coach => "Coach",
            UserRole::Owner => "Owner",
            UserRole::SuperAdmin => "Super Admin",
        }
    }
}
