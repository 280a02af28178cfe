// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout groups: programming audiences within a gym.

use super::gym::push_unique;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the group every gym gets on creation.
pub const DEFAULT_GROUP_NAME: &str = "Members";

/// Capacity used when a slot template does not specify one.
pub const DEFAULT_SLOT_CAPACITY: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupType {
    Default,
    #[default]
    Custom,
    Personal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MembershipType {
    AutoAssignAll,
    #[default]
    InviteOnly,
}

/// Class time template applied to workouts programmed for a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultTimeSlot {
    pub id: String,
    pub hour: u8,
    pub minute: u8,
    /// 0 means unlimited
    #[serde(default = "default_capacity")]
    pub capacity: u32,
}

fn default_capacity() -> u32 {
    DEFAULT_SLOT_CAPACITY
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutGroup {
    pub id: String,
    /// None for personal groups
    #[serde(default)]
    pub gym_id: Option<String>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub group_type: GroupType,
    #[serde(default)]
    pub membership_type: MembershipType,
    #[serde(default)]
    pub member_ids: Vec<String>,
    /// Who can program for this group
    #[serde(default)]
    pub coach_ids: Vec<String>,
    pub owner_id: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default = "default_true")]
    pub is_deletable: bool,
    #[serde(default)]
    pub hide_details_by_default: bool,
    /// Minutes before class start when signups close; 0 disables the cutoff
    #[serde(default)]
    pub signup_cutoff_minutes: u32,
    #[serde(default)]
    pub default_time_slots: Vec<DefaultTimeSlot>,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl WorkoutGroup {
    /// The non-deletable "Members" group created alongside a gym.
    pub fn default_for_gym(gym_id: &str, owner_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            gym_id: Some(gym_id.to_string()),
            name: DEFAULT_GROUP_NAME.to_string(),
            group_type: GroupType::Default,
            membership_type: MembershipType::AutoAssignAll,
            member_ids: vec![owner_id.to_string()],
            coach_ids: vec![owner_id.to_string()],
            owner_id: owner_id.to_string(),
            is_public: false,
            is_deletable: false,
            hide_details_by_default: false,
            signup_cutoff_minutes: 0,
            default_time_slots: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_auto_assign(&self) -> bool {
        self.membership_type == MembershipType::AutoAssignAll
    }

    pub fn add_member(&mut self, user_id: &str) -> bool {
        push_unique(&mut self.member_ids, user_id)
    }

    pub fn remove_member(&mut self, user_id: &str) -> bool {
        let before = self.member_ids.len();
        self.member_ids.retain(|id| id != user_id);
        before != self.member_ids.len()
    }

    /// Drop a user from both member and coach lists.
    pub fn remove_user(&mut self, user_id: &str) -> bool {
        let coaches_before = self.coach_ids.len();
        self.coach_ids.retain(|id| id != user_id);
        self.remove_member(user_id) || coaches_before != self.coach_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_group_is_protected() {
        let group = WorkoutGroup::default_for_gym("g1", "owner");
        assert_eq!(group.name, DEFAULT_GROUP_NAME);
        assert!(!group.is_deletable);
        assert!(group.is_auto_assign());
        assert_eq!(group.member_ids, vec!["owner".to_string()]);
    }

    #[test]
    fn test_wire_names() {
        let group = WorkoutGroup::default_for_gym("g1", "owner");
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["type"], "default");
        assert_eq!(json["membershipType"], "auto-assign-all");
        assert_eq!(json["signupCutoffMinutes"], 0);
    }

    #[test]
    fn test_remove_user_clears_coach_role() {
        let mut group = WorkoutGroup::default_for_gym("g1", "owner");
        group.coach_ids.push("c1".to_string());
        assert!(group.remove_user("c1"));
        assert!(!group.coach_ids.contains(&"c1".to_string()));
        assert!(group.remove_user("owner"));
        assert!(group.member_ids.is_empty());
        assert!(!group.remove_user("nobody"));
    }

    #[test]
    fn test_slot_capacity_defaults_to_twenty() {
        let slot: DefaultTimeSlot =
            serde_json::from_str(r#"{"id":"s","hour":6,"minute":0}"#).unwrap();
        assert_eq!(slot.capacity, DEFAULT_SLOT_CAPACITY);
    }

    #[test]
    fn test_missing_flags_decode_to_defaults() {
        let json = r#"{
            "id": "grp",
            "name": "Competitors",
            "ownerId": "o",
            "createdAt": "2025-01-01T00:00:00Z"
        }"#;
        let group: WorkoutGroup = serde_json::from_str(json).unwrap();
        assert!(group.is_deletable);
        assert_eq!(group.membership_type, MembershipType::InviteOnly);
        assert!(group.default_time_slots.is_empty());
    }
}
