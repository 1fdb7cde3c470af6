use matchmaker::ChatNightConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;
use store::BackendConfig;

/// Server configuration
///
/// Sources, later ones winning: a `.env` file (via `dotenvy`), an optional
/// `chatnight.{toml,yaml,json}` file, then `CHATNIGHT__*` environment
/// variables with `__` as the nesting separator, e.g.
/// `CHATNIGHT__CHAT_NIGHT__PASSES__TEST_PASSES=100`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// `POST /chat-night/enter` calls allowed per caller per minute
    #[serde(default = "default_enter_rate_limit")]
    pub enter_rate_limit_per_minute: u32,

    /// `POST /chat-night/engage` calls allowed per caller per minute
    #[serde(default = "default_engage_rate_limit")]
    pub engage_rate_limit_per_minute: u32,

    /// Keys accepted on the `/admin` routes. Empty disables them.
    #[serde(default)]
    pub api_keys: HashSet<String>,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// `EnvFilter` directive for the JSON logger
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Expose Prometheus metrics on `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Where rooms, passes, queues and matches live
    #[serde(default)]
    pub storage: StorageConfig,

    /// JSON array of profiles loaded into the profile directory at startup
    #[serde(default)]
    pub seed_profiles_path: Option<String>,

    /// Engine settings
    #[serde(default)]
    pub chat_night: ChatNightConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            enter_rate_limit_per_minute: default_enter_rate_limit(),
            engage_rate_limit_per_minute: default_engage_rate_limit(),
            api_keys: HashSet::new(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            storage: StorageConfig::default(),
            seed_profiles_path: None,
            chat_night: ChatNightConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, the optional config file and the
    /// environment.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }

        let builder = config::Config::builder()
            .add_source(config::File::with_name("chatnight").required(false))
            .add_source(environment());

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.chat_night.validate()?;

        if config.api_keys.is_empty() {
            tracing::warn!("No API keys configured, admin routes will reject every request");
        }

        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Lost on restart.
    #[default]
    Memory,
    /// Single-file ACID store at [`StorageConfig::path`].
    Redb,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

impl StorageConfig {
    pub fn backend_config(&self) -> BackendConfig {
        match self.backend {
            StorageBackend::Memory => BackendConfig::in_memory(),
            StorageBackend::Redb => BackendConfig::redb(&self.path),
        }
    }
}

/// `CHATNIGHT__*` variables. `CHATNIGHT__API_KEYS` takes a comma separated
/// list.
fn environment() -> config::Environment {
    config::Environment::with_prefix("CHATNIGHT")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("api_keys")
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_enter_rate_limit() -> u32 {
    5
}

fn default_engage_rate_limit() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_storage_path() -> String {
    "chatnight.redb".to_string()
}
