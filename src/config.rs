//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup. A `.env` file is honoured for local
//! development.

use std::env;

/// Which implementation of the remote data service to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBackend {
    /// Hosted Supabase project (PostgREST + GoTrue).
    Supabase,
    /// In-process tables, for tests and offline development.
    Memory,
}

impl std::str::FromStr for DataBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(DataBackend::Supabase),
            "memory" => Ok(DataBackend::Memory),
            _ => Err(ConfigError::Invalid("DATA_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Remote backend implementation
    pub data_backend: DataBackend,
    /// Supabase project URL, e.g. `https://xyz.supabase.co`
    pub supabase_url: String,
    /// Public URL the app is served from (CORS origin, cookie `Secure` flag)
    pub public_url: String,
    /// Server port
    pub port: u16,
    /// Lifetime of a signed-in session
    pub session_ttl_hours: i64,

    // --- Secrets ---
    /// Supabase anon key, used for the auth endpoints
    pub supabase_anon_key: String,
    /// Supabase service-role key, used for table queries
    pub supabase_service_key: String,
    /// HS256 key for session cookies (raw bytes)
    pub session_signing_key: Vec<u8>,
    /// Optional administrator account seeded into the memory backend
    pub demo_admin: Option<(String, String)>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let data_backend: DataBackend = env::var("DATA_BACKEND")
            .unwrap_or_else(|_| "supabase".to_string())
            .parse()?;

        // Supabase settings are only mandatory when we actually talk to Supabase.
        let supabase_var = |name: &'static str| -> Result<String, ConfigError> {
            match (env::var(name), data_backend) {
                (Ok(v), _) => Ok(v.trim().to_string()),
                (Err(_), DataBackend::Memory) => Ok(String::new()),
                (Err(_), DataBackend::Supabase) => Err(ConfigError::Missing(name)),
            }
        };

        let demo_admin = match (
            env::var("DEMO_ADMIN_EMAIL"),
            env::var("DEMO_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            data_backend,
            supabase_url: supabase_var("SUPABASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|hours| *hours > 0)
                .unwrap_or(12),

            supabase_anon_key: supabase_var("SUPABASE_ANON_KEY")?,
            supabase_service_key: supabase_var("SUPABASE_SERVICE_KEY")?,
            session_signing_key: env::var("SESSION_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
                .into_bytes(),
            demo_admin,
        })
    }

    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            data_backend: DataBackend::Memory,
            supabase_url: "http://localhost:54321".to_string(),
            public_url: "http://localhost:8080".to_string(),
            port: 8080,
            session_ttl_hours: 12,
            supabase_anon_key: "test_anon_key".to_string(),
            supabase_service_key: "test_service_key".to_string(),
            session_signing_key: b"test_session_key_32_bytes_long!!".to_vec(),
            demo_admin: None,
        }
    }

    /// Session cookies are `Secure` unless we are served over plain HTTP.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
