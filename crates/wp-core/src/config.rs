//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! server, auth, extractor and playlist sections. Every section defaults
//! sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "WATCHPARTY_";

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub extractor: ExtractorConfig,
    pub playlist: PlaylistConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path.
    ///
    /// With no path the defaults are used. An explicit path must exist and
    /// parse; anything else is an error rather than a silent fallback.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply `WATCHPARTY_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        let vars = std::env::vars().filter(|(k, _)| k.starts_with(ENV_PREFIX));
        self.apply_env_overrides(vars);
    }

    /// Apply overrides from arbitrary `(key, value)` pairs.
    ///
    /// Unknown keys are ignored; values that fail to parse are logged and
    /// skipped so the previous value stays in effect.
    pub fn apply_env_overrides<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let key = key.as_ref();
            let value = value.as_ref();
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            match name {
                "HOST" => self.server.host = value.to_string(),
                "PORT" => match value.parse() {
                    Ok(port) => self.server.port = port,
                    Err(_) => tracing::warn!("Ignoring invalid {key}={value}"),
                },
                "DB_PATH" => self.server.db_path = PathBuf::from(value),
                "AUTH_ENABLED" => match parse_bool(value) {
                    Some(b) => self.auth.enabled = b,
                    None => tracing::warn!("Ignoring invalid {key}={value}"),
                },
                "TOKEN_SECRET" => self.auth.token_secret = Some(value.to_string()),
                "YTDLP_PATH" => self.extractor.ytdlp_path = Some(PathBuf::from(value)),
                "FORCE_IPV4" => match parse_bool(value) {
                    Some(b) => self.extractor.force_ipv4 = b,
                    None => tracing::warn!("Ignoring invalid {key}={value}"),
                },
                "EXTRACT_TIMEOUT_SECS" => match value.parse() {
                    Ok(secs) => self.extractor.timeout_secs = secs,
                    Err(_) => tracing::warn!("Ignoring invalid {key}={value}"),
                },
                _ => {}
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.auth.enabled {
            match self.auth.token_secret.as_deref() {
                None | Some("") => warnings.push(
                    "auth is enabled but token_secret is not set; every add request will be rejected"
                        .into(),
                ),
                Some(s) if s.len() < 32 => {
                    warnings.push("auth.token_secret is shorter than 32 bytes".into())
                }
                _ => {}
            }
        }

        if self.extractor.timeout_secs == 0 {
            warnings.push("extractor.timeout_secs is 0; every extraction will time out".into());
        }

        if let Some(ref path) = self.extractor.ytdlp_path {
            if !path.exists() {
                warnings.push(format!(
                    "extractor.ytdlp_path {} does not exist",
                    path.display()
                ));
            }
        }

        if self.playlist.default_room.trim().is_empty() {
            warnings.push("playlist.default_room is empty".into());
        } else if self.playlist.default_room.chars().count() > self.playlist.max_room_len {
            warnings.push(format!(
                "playlist.default_room is longer than max_room_len ({})",
                self.playlist.max_room_len
            ));
        }

        warnings
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            db_path: PathBuf::from("watchparty.db"),
        }
    }
}

/// Identity verification settings.
///
/// Tokens are issued elsewhere; this side only checks them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    /// Shared HS256 secret used to verify tokens.
    pub token_secret: Option<String>,
    /// Cookie consulted when no `Authorization` header is present.
    pub cookie_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            token_secret: None,
            cookie_name: "watchparty-auth".into(),
        }
    }
}

/// Settings for the yt-dlp metadata extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Explicit path to `yt-dlp`; looked up on `PATH` when unset.
    pub ytdlp_path: Option<PathBuf>,
    pub user_agent: String,
    pub force_ipv4: bool,
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            user_agent: DEFAULT_USER_AGENT.into(),
            force_ipv4: true,
            timeout_secs: 60,
        }
    }
}

/// Browser user-agent presented to video hosts.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Playlist behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    pub default_room: String,
    pub max_room_len: usize,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            default_room: crate::DEFAULT_ROOM.into(),
            max_room_len: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(!config.auth.enabled);
        assert_eq!(config.auth.cookie_name, "watchparty-auth");
        assert!(config.extractor.force_ipv4);
        assert_eq!(config.extractor.timeout_secs, 60);
        assert_eq!(config.playlist.default_room, "general");
        assert_eq!(config.playlist.max_room_len, 50);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = Config::from_json(r#"{"server": {"port": 9000}}"#).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.extractor.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn invalid_json_is_validation_error() {
        let err = Config::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn load_without_path_gives_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(!config.auth.enabled);
    }

    #[test]
    fn load_missing_file_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/watchparty.json"))).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"playlist": {"default_room": "lobby"}}"#).unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.playlist.default_room, "lobby");
    }

    #[test]
    fn mistyped_field_does_not_drop_auth() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"auth": {"enabled": true, "token_secret": "0123456789abcdef0123456789abcdef"},
                "server": {"port": "8080"}}"#,
        )
        .unwrap();

        let err = Config::load(Some(path.as_path())).unwrap_err();
        assert!(err.to_string().contains("config parse error"), "{err}");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config.apply_env_overrides([
            ("WATCHPARTY_HOST", "127.0.0.1"),
            ("WATCHPARTY_PORT", "3000"),
            ("WATCHPARTY_AUTH_ENABLED", "true"),
            ("WATCHPARTY_TOKEN_SECRET", "s3cret"),
            ("WATCHPARTY_FORCE_IPV4", "0"),
            ("WATCHPARTY_EXTRACT_TIMEOUT_SECS", "5"),
            ("WATCHPARTY_YTDLP_PATH", "/opt/bin/yt-dlp"),
            ("WATCHPARTY_DB_PATH", "/tmp/wp.db"),
        ]);

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(config.auth.enabled);
        assert_eq!(config.auth.token_secret.as_deref(), Some("s3cret"));
        assert!(!config.extractor.force_ipv4);
        assert_eq!(config.extractor.timeout_secs, 5);
        assert_eq!(
            config.extractor.ytdlp_path.as_deref(),
            Some(Path::new("/opt/bin/yt-dlp"))
        );
        assert_eq!(config.server.db_path, PathBuf::from("/tmp/wp.db"));
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env_overrides([
            ("WATCHPARTY_PORT", "not-a-port"),
            ("WATCHPARTY_AUTH_ENABLED", "maybe"),
            ("OTHER_PORT", "1"),
        ]);
        assert_eq!(config.server.port, 8080);
        assert!(!config.auth.enabled);
    }

    #[test]
    fn validate_default_is_clean() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_auth_without_secret() {
        let mut config = Config::default();
        config.auth.enabled = true;
        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("token_secret"));
    }

    #[test]
    fn validate_flags_zero_timeout_and_port() {
        let mut config = Config::default();
        config.server.port = 0;
        config.extractor.timeout_secs = 0;
        assert_eq!(config.validate().len(), 2);
    }

    #[test]
    fn validate_flags_long_default_room() {
        let mut config = Config::default();
        config.playlist.default_room = "x".repeat(51);
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("max_room_len")));
    }
}
