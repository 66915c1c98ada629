use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `base_url`
pub const ENV_BASE_URL: &str = "CHAT_API_BASE_URL";

/// Environment variable overriding `timeout_ms`
pub const ENV_TIMEOUT_MS: &str = "CHAT_API_TIMEOUT_MS";

/// Room created by the scenario
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoomFixture {
    pub name: String,
    pub description: String,
    pub room_code: String,
}

impl Default for RoomFixture {
    fn default() -> Self {
        Self {
            name: "Test Chat Room".to_string(),
            description: "A test room for API testing".to_string(),
            room_code: "TEST123".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Server root the API lives under
    pub base_url: String,

    /// Path segment between the server root and the endpoints
    pub api_prefix: String,

    /// Per-request timeout (ms)
    pub timeout_ms: u64,

    /// Registered usernames are `<prefix>_<HHMMSS>`
    pub username_prefix: String,

    pub password: String,

    pub room: RoomFixture,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://echochat-dev.preview.emergentagent.com".to_string(),
            api_prefix: "api".to_string(),
            timeout_ms: 10000, // Default 10s
            username_prefix: "testuser".to_string(),
            password: "TestPass123!".to_string(),
            room: RoomFixture::default(),
        }
    }
}

impl Config {
    /// Defaults, overlaid by the YAML file when given, then by the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment-style overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = timeout
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of milliseconds", ENV_TIMEOUT_MS))?;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_prefix, "api");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.password, "TestPass123!");
        assert_eq!(config.room.room_code, "TEST123");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
base_url: "http://localhost:8001"
room:
  room_code: "ROOM42"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.base_url, "http://localhost:8001");
        assert_eq!(config.room.room_code, "ROOM42");
        assert_eq!(config.room.name, "Test Chat Room");
        assert_eq!(config.timeout_ms, 10000);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, "http://staging.test "),
            (ENV_TIMEOUT_MS, "2500"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.base_url, "http://staging.test");
        assert_eq!(config.timeout_ms, 2500);
    }

    #[test]
    fn test_bad_timeout_override() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|k| (k == ENV_TIMEOUT_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_MS));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_ms: 3000\nusername_prefix: qa").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.timeout_ms, 3000);
        assert_eq!(config.username_prefix, "qa");
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = Config::from_file(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
