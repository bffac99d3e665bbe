use std::time::Duration;

/// Default number of concurrent request workers.
pub const DEFAULT_WORKERS: usize = 8;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://vercel.com/api";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors raised while loading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but its value cannot be parsed.
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Settings for the request dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Space that runs are recorded into. Empty means "not configured",
    /// which fails every request with a precondition error.
    pub space_id: String,
    /// Size of the worker pool. Values below 1 are treated as 1.
    pub workers: usize,
}

impl DispatcherConfig {
    pub fn new(space_id: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

/// Settings for [`HttpTransport`](crate::transport::HttpTransport).
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URL the endpoint paths are appended to.
    pub api_url: String,
    /// Bearer token. The transport is unlinked without it.
    pub token: Option<String>,
    /// Team the space belongs to, sent as the `teamId` query parameter.
    pub team_id: Option<String>,
    pub request_timeout: Duration,
}

/// Complete client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct SpacesConfig {
    pub dispatcher: DispatcherConfig,
    pub transport: HttpTransportConfig,
}

impl SpacesConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                  |
    /// |-------------------------------|--------------------------|
    /// | `SPACES_API_URL`              | `https://vercel.com/api` |
    /// | `SPACES_TOKEN`                | unset                    |
    /// | `SPACES_TEAM_ID`              | unset                    |
    /// | `SPACES_SPACE_ID`             | empty                    |
    /// | `SPACES_WORKERS`              | `8`                      |
    /// | `SPACES_REQUEST_TIMEOUT_SECS` | `30`                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_url = non_empty("SPACES_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        let token = non_empty("SPACES_TOKEN");
        let team_id = non_empty("SPACES_TEAM_ID");
        let space_id = non_empty("SPACES_SPACE_ID").unwrap_or_default();

        let workers = match non_empty("SPACES_WORKERS") {
            Some(raw) => parse_number::<usize>("SPACES_WORKERS", "a positive integer", &raw)?,
            None => DEFAULT_WORKERS,
        };
        if workers == 0 {
            return Err(ConfigError::Invalid {
                name: "SPACES_WORKERS",
                expected: "a positive integer",
                value: "0".to_string(),
            });
        }

        let timeout_secs = match non_empty("SPACES_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_number::<u64>("SPACES_REQUEST_TIMEOUT_SECS", "a number of seconds", &raw)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            dispatcher: DispatcherConfig { space_id, workers },
            transport: HttpTransportConfig {
                api_url,
                token,
                team_id,
                request_timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    expected: &'static str,
    raw: &str,
) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        expected,
        value: raw.to_string(),
    })
}
