//! Application configuration loaded from environment variables.
//!
//! AI provider keys are optional: when absent, the matching endpoints
//! answer 503 instead of failing at startup.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL (CORS origin, cookie domain)
    pub frontend_url: String,
    /// GCP project ID; doubles as the Firebase project for ID token audience
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// xAI (Grok) API key
    pub xai_api_key: Option<String>,
    /// Google Generative AI (Gemini) API key
    pub gemini_api_key: Option<String>,
    /// Shared secret presented by the scheduler that triggers suggestion generation
    pub cron_secret: Option<String>,
    /// Lowercased emails promoted to super admin on sign-in (SUPER_ADMIN_EMAILS, comma-separated)
    pub super_admin_emails: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            xai_api_key: optional_secret("XAI_API_KEY"),
            gemini_api_key: optional_secret("GEMINI_API_KEY"),
            cron_secret: optional_secret("CRON_SECRET"),
            super_admin_emails: email_list(&env::var("SUPER_ADMIN_EMAILS").unwrap_or_default()),
        })
    }

    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            xai_api_key: None,
            gemini_api_key: None,
            cron_secret: Some("test_cron_secret".to_string()),
            super_admin_emails: Vec::new(),
        }
    }

    pub fn is_super_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.super_admin_emails.iter().any(|e| *e == email)
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Read an env var, treating empty/whitespace values as unset.
fn optional_secret(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
