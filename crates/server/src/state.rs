use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use dashmap::DashMap;
use matchmaker::{ChatNight, MatchmakerError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::{Duration, Instant};
use store::{ChatNightStore, UserProfile};

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Rate limit tracking: `route:user` -> (count, window_start)
    pub rate_limiter: Arc<DashMap<String, (u32, Instant)>>,

    /// Matchmaking engine (shared across requests)
    pub engine: Arc<ChatNight>,

    /// Prometheus renderer, when metrics are enabled and installed
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Open the configured store, load seed profiles and build the engine.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = Arc::new(ChatNightStore::new(&config.storage.backend_config())?);
        if let Some(path) = &config.seed_profiles_path {
            let loaded = seed_profiles(&store, path)?;
            tracing::info!(path = %path, profiles = loaded, "seed profiles loaded");
        }
        let engine = ChatNight::new(store, config.chat_night.clone())?;
        Ok(Self::with_engine(config, Arc::new(engine)))
    }

    /// Wrap an already assembled engine.
    pub fn with_engine(config: ServerConfig, engine: Arc<ChatNight>) -> Self {
        Self {
            config: Arc::new(config),
            rate_limiter: Arc::new(DashMap::new()),
            engine,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Check if API key is valid
    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }

    /// Fixed one-minute window per (route, user). Returns false once `limit`
    /// calls were made in the current window.
    pub fn check_rate_limit(&self, route: &str, user_id: &str, limit: u32) -> bool {
        let now = Instant::now();
        let window = Duration::from_secs(60);

        let mut entry = self
            .rate_limiter
            .entry(format!("{route}:{user_id}"))
            .or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.duration_since(*window_start) > window {
            *count = 0;
            *window_start = now;
        }

        if *count >= limit {
            return false;
        }

        *count += 1;
        true
    }

    pub fn enforce_rate_limit(&self, route: &str, user_id: &str, limit: u32) -> ServerResult<()> {
        if self.check_rate_limit(route, user_id, limit) {
            Ok(())
        } else {
            tracing::warn!(route, user_id, limit, "rate limit exceeded");
            Err(ServerError::RateLimitExceeded)
        }
    }

    /// Run an engine call on the blocking pool. Storage access is
    /// synchronous and `enter` holds a mutex.
    pub async fn run<T, F>(&self, f: F) -> ServerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&ChatNight) -> Result<T, MatchmakerError> + Send + 'static,
    {
        let engine = self.engine.clone();
        let result = tokio::task::spawn_blocking(move || f(&engine)).await?;
        Ok(result?)
    }
}

fn seed_profiles(store: &ChatNightStore, path: &str) -> ServerResult<usize> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| ServerError::Config(format!("cannot read {path}: {err}")))?;
    let profiles: Vec<UserProfile> = serde_json::from_str(&raw)
        .map_err(|err| ServerError::Config(format!("invalid profiles in {path}: {err}")))?;
    for profile in &profiles {
        store.put_profile(profile)?;
    }
    Ok(profiles.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn state() -> ServerState {
        ServerState::new(ServerConfig::default()).unwrap()
    }

    #[test]
    fn rate_limit_is_per_route_and_user() {
        let state = state();
        for _ in 0..2 {
            assert!(state.check_rate_limit("enter", "u1", 2));
        }
        assert!(!state.check_rate_limit("enter", "u1", 2));
        assert!(state.check_rate_limit("enter", "u2", 2));
        assert!(state.check_rate_limit("engage", "u1", 2));
    }

    #[test]
    fn seed_profiles_are_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "u1", "first_name": "Meera", "gender": "Woman"}}, {{"id": "u2"}}]"#
        )
        .unwrap();

        let config = ServerConfig {
            seed_profiles_path: Some(file.path().display().to_string()),
            ..ServerConfig::default()
        };
        let state = ServerState::new(config).unwrap();
        let profile = state.engine.store().profile("u1").unwrap().unwrap();
        assert_eq!(profile.first_name.as_deref(), Some("Meera"));
        assert!(state.engine.store().profile("u2").unwrap().is_some());
    }

    #[test]
    fn bad_seed_file_is_a_config_error() {
        let config = ServerConfig {
            seed_profiles_path: Some("/nonexistent/profiles.json".into()),
            ..ServerConfig::default()
        };
        assert!(matches!(
            ServerState::new(config),
            Err(ServerError::Config(_))
        ));
    }
}
