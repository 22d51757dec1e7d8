use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub policy_path: Option<PathBuf>,
    pub backends_path: PathBuf,
    pub max_concurrent_variations: usize,
    pub variation_timeout_secs: u64,
    pub render_request_timeout_secs: u64,
    pub render_max_retries: u32,
    pub render_retry_backoff_base_ms: u64,
    pub user_agent: String,
    pub render_api_key: Option<String>,
}

impl AppConfig {
    /// Production logs go to collectors that do not render ANSI colour codes.
    #[must_use]
    pub fn ansi_logs(&self) -> bool {
        self.env != Environment::Production
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("policy_path", &self.policy_path)
            .field("backends_path", &self.backends_path)
            .field("max_concurrent_variations", &self.max_concurrent_variations)
            .field("variation_timeout_secs", &self.variation_timeout_secs)
            .field(
                "render_request_timeout_secs",
                &self.render_request_timeout_secs,
            )
            .field("render_max_retries", &self.render_max_retries)
            .field(
                "render_retry_backoff_base_ms",
                &self.render_retry_backoff_base_ms,
            )
            .field("user_agent", &self.user_agent)
            .field(
                "render_api_key",
                &self.render_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
