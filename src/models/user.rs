//! User model for storage and API.

use super::role::UserRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Gender, used only to split leaderboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// Free-text context handed to the AI coach.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiCoachPreferences {
    #[serde(default)]
    pub goals: Option<String>,
    #[serde(default)]
    pub injuries: Option<String>,
}

/// User profile stored in Firestore (document ID = Firebase uid).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    pub created_at: DateTime<Utc>,
    /// Older documents predate this field
    #[serde(default)]
    pub hide_from_leaderboards: bool,
    #[serde(default)]
    pub ai_coach_enabled: bool,
    #[serde(default)]
    pub ai_coach_preferences: Option<AiCoachPreferences>,
}

impl AppUser {
    /// New athlete profile for a first sign-in.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            username: None,
            role: UserRole::Athlete,
            first_name: None,
            last_name: None,
            display_name: None,
            gender: None,
            created_at: Utc::now(),
            hide_from_leaderboards: false,
            ai_coach_enabled: false,
            ai_coach_preferences: None,
        }
    }

    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// Best human-readable label: display name, full name, username, email.
    pub fn display_label(&self) -> String {
        self.display_name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.full_name())
            .or_else(|| self.username.clone().filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| self.email.clone())
    }

    pub fn has_ai_coach_access(&self) -> bool {
        self.ai_coach_enabled || self.role.has_permission(UserRole::Owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_optional_fields_decode_to_defaults() {
        let json = r#"{
            "id": "u1",
            "email": "a@b.com",
            "createdAt": "2025-01-01T00:00:00Z"
        }"#;
        let user: AppUser = serde_json::from_str(json).unwrap();

        assert_eq!(user.role, UserRole::Athlete);
        assert!(!user.hide_from_leaderboards);
        assert!(!user.ai_coach_enabled);
        assert!(user.ai_coach_preferences.is_none());
    }

    #[test]
    fn test_display_label_fallbacks() {
        let mut user = AppUser::new("u1", "jane@example.com");
        assert_eq!(user.display_label(), "jane@example.com");

        user.username = Some("jdoe".to_string());
        assert_eq!(user.display_label(), "jdoe");

        user.first_name = Some("Jane".to_string());
        user.last_name = Some("Doe".to_string());
        assert_eq!(user.display_label(), "Jane Doe");

        user.display_name = Some("JD".to_string());
        assert_eq!(user.display_label(), "JD");
    }

    #[test]
    fn test_ai_coach_access() {
        let mut user = AppUser::new("u1", "a@b.com");
        assert!(!user.has_ai_coach_access());

        user.ai_coach_enabled = true;
        assert!(user.has_ai_coach_access());

        user.ai_coach_enabled = false;
        user.role = UserRole::Owner;
        assert!(user.has_ai_coach_access());
    }
}
