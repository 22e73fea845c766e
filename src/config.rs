// Service Configuration
// All environment-derived settings are collected once at startup into an
// explicit config object and handed to the components that need them; the
// shaping core never reads the environment.

/// Runtime configuration for the API process
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Port the HTTP listener binds to
    pub port: u16,
    /// Path prefix the API routes are mounted under, e.g. "/v1"
    pub base_path: String,
    /// Public base URL used when synthesizing media links
    pub public_url: String,
    /// PostgreSQL connection string
    pub database_url: String,
    /// Maximum connections held by the sqlx pool
    pub max_connections: u32,
}

impl ApiConfig {
    /// Join the public URL with a path segment, avoiding double slashes
    pub fn media_url(&self, path: &str) -> String {
        let base = self.public_url.trim_end_matches('/');
        format!("{base}{path}")
    }

    /// The prefix routes are nested under; an empty or "/" prefix mounts at root
    pub fn mount_path(&self) -> Option<&str> {
        let trimmed = self.base_path.trim();
        if trimmed.is_empty() || trimmed == "/" {
            None
        } else {
            Some(trimmed)
        }
    }
}
