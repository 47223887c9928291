use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_player_name")]
    pub player_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_server_url() -> String {
    "ws://127.0.0.1:8080".to_string()
}
fn default_heartbeat_interval_ms() -> u64 {
    3000
}
fn default_player_name() -> String {
    "player".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_url: default_server_url(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            player_name: default_player_name(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl ClientConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    /// Like `from_file`, but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: ClientConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if !(self.server_url.starts_with("ws://") || self.server_url.starts_with("wss://")) {
            errors.push(format!(
                "server_url must start with ws:// or wss://, got '{}'. Example: server_url = \"ws://127.0.0.1:8080\"",
                self.server_url
            ));
        }

        if self.heartbeat_interval_ms == 0 {
            errors.push(format!(
                "heartbeat_interval_ms must be > 0, got {}. Example: heartbeat_interval_ms = 3000",
                self.heartbeat_interval_ms
            ));
        }

        if self.player_name.trim().is_empty() {
            errors.push(
                "player_name must not be empty. Example: player_name = \"ann\"".to_string(),
            );
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            errors.push(format!(
                "log_format must be one of {:?}, got '{}'. Example: log_format = \"json\"",
                valid_formats, self.log_format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
