//! Client configuration.

use std::time::Duration;

/// Connection settings for [`crate::CollinsClient`].
///
/// Immutable once the client is constructed.
#[derive(Debug, Clone)]
pub struct CollinsConfig {
    /// Base URL of the Collins server (e.g. <http://localhost:9000>).
    /// A trailing slash is tolerated and stripped.
    pub base_url: String,
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Request timeout applied to every call.
    pub timeout: Duration,
}

impl Default for CollinsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            username: "blake".to_string(),
            password: "admin:first".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl CollinsConfig {
    /// Build a config from explicit values.
    #[must_use]
    pub fn new(base_url: &str, username: &str, password: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset.
    ///
    /// # Environment Variables
    ///
    /// - `COLLINS_HOST`: base URL of the Collins server
    /// - `COLLINS_USERNAME`: Basic-auth username
    /// - `COLLINS_PASSWORD`: Basic-auth password
    /// - `COLLINS_TIMEOUT_SECS`: request timeout in seconds
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("COLLINS_HOST") {
            config.base_url = host;
        }
        if let Ok(username) = std::env::var("COLLINS_USERNAME") {
            config.username = username;
        }
        if let Ok(password) = std::env::var("COLLINS_PASSWORD") {
            config.password = password;
        }
        if let Ok(timeout) = std::env::var("COLLINS_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                config.timeout = Duration::from_secs(secs);
            }
        }

        config
    }
}
