// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gyms and membership requests.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Public address and contact details of a gym.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GymContact {
    #[validate(length(max = 200))]
    #[serde(default)]
    pub address: Option<String>,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub state: Option<String>,
    #[validate(length(max = 20))]
    #[serde(default)]
    pub zip: Option<String>,
    #[validate(length(max = 40))]
    #[serde(default)]
    pub phone: Option<String>,
    #[validate(url)]
    #[serde(default)]
    pub website: Option<String>,
}

/// A gym (box). Staff are the owner plus listed coaches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gym {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub coach_ids: Vec<String>,
    #[serde(default)]
    pub member_ids: Vec<String>,
    /// Local time offset used to place class times on the UTC timeline
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub contact: GymContact,
    pub created_at: DateTime<Utc>,
}

impl Gym {
    /// A new gym with no staff besides its owner.
    pub fn new(name: impl Into<String>, owner_id: impl Into<String>, utc_offset_minutes: i32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            owner_id: owner_id.into(),
            coach_ids: Vec::new(),
            member_ids: Vec::new(),
            utc_offset_minutes,
            contact: GymContact::default(),
            created_at: Utc::now(),
        }
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    pub fn is_staff(&self, user_id: &str) -> bool {
        self.is_owner(user_id) || self.coach_ids.iter().any(|id| id == user_id)
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.is_staff(user_id) || self.member_ids.iter().any(|id| id == user_id)
    }

    /// Add a member if not already present. Returns whether the list changed.
    pub fn add_member(&mut self, user_id: &str) -> bool {
        push_unique(&mut self.member_ids, user_id)
    }

    pub fn add_coach(&mut self, user_id: &str) -> bool {
        push_unique(&mut self.coach_ids, user_id)
    }

    /// Remove a user from both coach and member lists.
    pub fn remove_member(&mut self, user_id: &str) -> bool {
        let before = self.member_ids.len() + self.coach_ids.len();
        self.member_ids.retain(|id| id != user_id);
        self.coach_ids.retain(|id| id != user_id);
        before != self.member_ids.len() + self.coach_ids.len()
    }

    /// Fixed offset for the gym's local time. Out-of-range values fall back to UTC.
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).unwrap_or(Utc.fix())
    }
}

pub(crate) fn push_unique(list: &mut Vec<String>, value: &str) -> bool {
    if list.iter().any(|v| v == value) {
        false
    } else {
        list.push(value.to_string());
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MembershipRequestStatus {
    #[default]
    Pending,
    Approved,
    Denied,
}

/// A user's request to join a gym, processed by gym staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GymMembershipRequest {
    pub id: String,
    pub gym_id: String,
    pub gym_name: String,
    pub user_id: String,
    pub user_email: String,
    #[serde(default)]
    pub user_display_name: Option<String>,
    #[serde(default)]
    pub status: MembershipRequestStatus,
    pub requested_at: DateTime<Utc>,
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processed_by: Option<String>,
}

impl GymMembershipRequest {
    /// Mark as approved or denied by `staff_id`.
    pub fn resolve(&mut self, status: MembershipRequestStatus, staff_id: &str) {
        self.status = status;
        self.processed_at = Some(Utc::now());
        self.processed_by = Some(staff_id.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// A user's application to register a new gym, reviewed by a super admin.
/// Approval creates the gym and makes the applicant its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GymApplication {
    pub id: String,
    pub user_id: String,
    pub user_email: String,
    #[serde(default)]
    pub user_display_name: Option<String>,
    pub gym_name: String,
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub contact: GymContact,
    #[serde(default)]
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub approved_gym_id: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

impl GymApplication {
    /// The gym this application asks for, owned by the applicant.
    pub fn to_gym(&self) -> Gym {
        let mut gym = Gym::new(self.gym_name.trim(), &self.user_id, self.utc_offset_minutes);
        gym.contact = self.contact.clone();
        gym
    }

    pub fn approve(&mut self, reviewer_id: &str, gym_id: &str) {
        self.status = ApplicationStatus::Approved;
        self.reviewed_at = Some(Utc::now());
        self.reviewed_by = Some(reviewer_id.to_string());
        self.approved_gym_id = Some(gym_id.to_string());
    }

    pub fn reject(&mut self, reviewer_id: &str, reason: &str) {
        self.status = ApplicationStatus::Rejected;
        self.reviewed_at = Some(Utc::now());
        self.reviewed_by = Some(reviewer_id.to_string());
        self.rejection_reason = Some(reason.to_string());
    }
}
