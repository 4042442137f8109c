use serde::{Deserialize, Serialize};

/// Connection settings for a GraphDB server, loadable from a JSON file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Base URL of the server, e.g. `http://localhost:7200`
    #[serde(default = "default_url")]
    pub url: String,

    // Basic auth takes precedence over the token when both are set
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,

    /// GDB token as returned by the login endpoint
    #[serde(default)]
    pub token: String,

    /// Whole-request timeout in seconds, 0 disables it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default)]
    pub insecure_skip_verify: bool,
    #[serde(default)]
    pub ca_cert_path: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_url() -> String {
    "http://localhost:7200".to_string()
}

fn default_timeout_secs() -> u64 {
    0 // Backups and restores can run for a long time
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("graphdb-rs/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn has_basic_auth(&self) -> bool {
        !self.username.is_empty()
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: String::new(),
            password: String::new(),
            token: String::new(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            insecure_skip_verify: false,
            ca_cert_path: String::new(),
            user_agent: default_user_agent(),
        }
    }
}
