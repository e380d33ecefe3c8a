/// Default Last.fm web service endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://ws.audioscrobbler.com/2.0/";

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("lastfm-scrobble/", env!("CARGO_PKG_VERSION"));

/// Configuration for the submission client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Endpoint that submissions and authentication requests are posted to
    pub endpoint: String,
    /// Maximum number of session refreshes per submission (0 disables re-authentication)
    pub max_session_refreshes: u32,
    /// Value of the `User-Agent` header
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_session_refreshes: 1,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config that never re-authenticates
    pub fn with_refresh_disabled() -> Self {
        Self {
            max_session_refreshes: 0,
            ..Self::default()
        }
    }

    /// Set a custom endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the per-submission refresh budget
    pub fn with_max_session_refreshes(mut self, max_session_refreshes: u32) -> Self {
        self.max_session_refreshes = max_session_refreshes;
        self
    }

    /// Set a custom user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
