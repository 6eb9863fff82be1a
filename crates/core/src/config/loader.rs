//! Configuration file loader for the `.storyplay/` directory.
//!
//! The only file read today is `.storyplay/config.toml`. A missing directory
//! or file is not an error: the defaults are used instead. The backend URL
//! can be overridden with the `STORYPLAY_API_URL` environment variable.

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use sp_protocol::config_models::{ClientConfig, UnitRange};
use std::path::Path;
use tracing::debug;

/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "STORYPLAY_API_URL";

/// Loads the client configuration rooted at `root`.
///
/// # Arguments
///
/// * `root` - Directory containing the `.storyplay/` folder
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read, is not
/// valid TOML, or holds values the client cannot run with.
///
/// # Example
///
/// ```rust,no_run
/// use sp_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Polling every {} ms", config.poll.interval_ms);
/// # Ok(())
/// # }
/// ```
pub async fn load_config(root: &Path) -> ConfigResult<ClientConfig> {
    let config = load_config_file(root)?;
    Ok(apply_env_override(config, std::env::var(API_URL_ENV).ok()))
}

/// Reads and validates `.storyplay/config.toml` without consulting the environment.
pub fn load_config_file(root: &Path) -> ConfigResult<ClientConfig> {
    let config_path = root.join(".storyplay").join("config.toml");

    if !config_path.exists() {
        debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(ClientConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let config: ClientConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    validate(&config).map_err(|reason| ConfigError::InvalidConfig {
        path: config_path,
        reason,
    })?;

    Ok(config)
}

/// Replaces the API base URL when an override is set and non-blank.
pub fn apply_env_override(mut config: ClientConfig, api_url: Option<String>) -> ClientConfig {
    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
        debug!(%url, "api base url overridden from environment");
        config.api_base_url = url;
    }
    config
}

fn validate(config: &ClientConfig) -> Result<(), String> {
    if config.api_base_url.trim().is_empty() {
        return Err("api_base_url must not be empty".to_string());
    }
    if config.poll.interval_ms == 0 {
        return Err("poll.interval_ms must be greater than zero".to_string());
    }
    if config.poll.max_attempts == 0 {
        return Err("poll.max_attempts must be greater than zero".to_string());
    }
    if config.poll.server_error_threshold == 0 {
        return Err("poll.server_error_threshold must be greater than zero".to_string());
    }
    if config.poll.request_timeout_ms == 0 {
        return Err("poll.request_timeout_ms must be greater than zero".to_string());
    }

    let sim = &config.simulator;
    if sim.step_count == 0 {
        return Err("simulator.step_count must be greater than zero".to_string());
    }
    if sim.time_unit_ms == 0 || sim.tick_ms == 0 {
        return Err("simulator.time_unit_ms and simulator.tick_ms must be greater than zero".to_string());
    }
    check_range("simulator.step_units", &sim.step_units)?;
    check_range("simulator.final_step_units", &sim.final_step_units)?;
    check_range("simulator.pause_units", &sim.pause_units)?;

    Ok(())
}

fn check_range(name: &str, range: &UnitRange) -> Result<(), String> {
    if range.is_valid() {
        Ok(())
    } else {
        Err(format!(
            "{name} must satisfy 0 <= min <= max, got min={} max={}",
            range.min, range.max
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_config(root: &Path, content: &str) {
        let dir = root.join(".storyplay");
        fs::create_dir_all(&dir).expect("Failed to create .storyplay");
        fs::write(dir.join("config.toml"), content).expect("Failed to write config.toml");
    }

    #[tokio::test]
    async fn test_load_config_acceptance() {
        let dir = tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        write_config(
            root,
            r#"
api_base_url = "https://api.storyplay.dev"

[poll]
interval_ms = 1500
max_attempts = 120
server_error_threshold = 2

[game]
feedback_delay_ms = 3000

[simulator]
step_count = 4
seed = 7
final_step_units = { min = 1.0, max = 2.0 }
"#,
        );

        let config = load_config_file(root).expect("Failed to load config");

        assert_eq!(config.api_base_url, "https://api.storyplay.dev");
        assert_eq!(config.poll.interval_ms, 1500);
        assert_eq!(config.poll.max_attempts, 120);
        assert_eq!(config.poll.server_error_threshold, 2);
        assert_eq!(config.game.feedback_delay_ms, 3000);
        assert_eq!(config.simulator.step_count, 4);
        assert_eq!(config.simulator.seed, Some(7));
        assert_eq!(config.simulator.final_step_units, UnitRange::new(1.0, 2.0));
        assert_eq!(config.simulator.step_units, UnitRange::new(10.0, 12.0));
    }

    #[tokio::test]
    async fn test_load_config_empty_directory() {
        let dir = tempdir().expect("Failed to create temp dir");

        let config = load_config_file(dir.path()).expect("Should handle missing .storyplay");

        assert_eq!(config, ClientConfig::default());
    }

    #[tokio::test]
    async fn test_load_config_invalid_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_config(dir.path(), "api_base_url = [invalid toml");

        let result = load_config_file(dir.path());

        if let Err(ConfigError::TomlParse { path, .. }) = result {
            assert!(path.ends_with("config.toml"));
        } else {
            panic!("Expected TomlParse error");
        }
    }

    #[tokio::test]
    async fn test_load_config_rejects_zero_interval() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_config(dir.path(), "[poll]\ninterval_ms = 0\n");

        let result = load_config_file(dir.path());

        if let Err(ConfigError::InvalidConfig { reason, .. }) = result {
            assert!(reason.contains("poll.interval_ms"));
        } else {
            panic!("Expected InvalidConfig error");
        }
    }

    #[test]
    fn test_load_config_rejects_zero_request_timeout() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_config(dir.path(), "[poll]\nrequest_timeout_ms = 0\n");

        let result = load_config_file(dir.path());

        if let Err(ConfigError::InvalidConfig { reason, .. }) = result {
            assert!(reason.contains("poll.request_timeout_ms"));
        } else {
            panic!("Expected InvalidConfig error");
        }
    }

    #[tokio::test]
    async fn test_load_config_rejects_inverted_range() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_config(
            dir.path(),
            "[simulator]\npause_units = { min = 2.0, max = 1.0 }\n",
        );

        let result = load_config_file(dir.path());

        if let Err(ConfigError::InvalidConfig { reason, .. }) = result {
            assert!(reason.contains("simulator.pause_units"));
        } else {
            panic!("Expected InvalidConfig error");
        }
    }

    #[test]
    fn test_env_override() {
        let config = apply_env_override(
            ClientConfig::default(),
            Some("http://backend:9000".to_string()),
        );
        assert_eq!(config.api_base_url, "http://backend:9000");

        let config = apply_env_override(ClientConfig::default(), Some("   ".to_string()));
        assert_eq!(config.api_base_url, "http://localhost:8000");

        let config = apply_env_override(ClientConfig::default(), None);
        assert_eq!(config.api_base_url, "http://localhost:8000");
    }
}
