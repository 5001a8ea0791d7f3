use std::time::Duration;

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
    /// Base URL of the map data provider, e.g. `https://api.example.org`.
    pub provider_base_url: String,
    pub provider_request_timeout_secs: u64,
    pub provider_user_agent: String,
    /// Primary (edge) recompute trigger URL. Absent means the primary path
    /// is unconfigured and the secondary is used directly.
    pub recompute_primary_url: Option<String>,
    /// Bearer credential for the primary trigger.
    pub recompute_token: Option<String>,
    pub recompute_secondary_timeout_secs: u64,
    /// How long to wait after a successful trigger before refetching.
    pub recompute_refetch_delay_secs: u64,
}

impl AppConfig {
    #[must_use]
    pub fn refetch_delay(&self) -> Duration {
        Duration::from_secs(self.recompute_refetch_delay_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("provider_base_url", &self.provider_base_url)
            .field(
                "provider_request_timeout_secs",
                &self.provider_request_timeout_secs,
            )
            .field("provider_user_agent", &self.provider_user_agent)
            .field("recompute_primary_url", &self.recompute_primary_url)
            .field(
                "recompute_token",
                &self.recompute_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "recompute_secondary_timeout_secs",
                &self.recompute_secondary_timeout_secs,
            )
            .field(
                "recompute_refetch_delay_secs",
                &self.recompute_refetch_delay_secs,
            )
            .finish()
    }
}
