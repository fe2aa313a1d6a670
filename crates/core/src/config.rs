//! Configuration management for cloudbridge
//!
//! Client settings resolve in three tiers: explicit option, then environment
//! variable, then built-in default. The CLI additionally keeps a TOML profile
//! under `~/.config/cloudbridge/`.

use crate::error::{Error, Result};
use crate::signer::Credentials;
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Production API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.cloudbridge.nugitech.com";

/// Path of the upload endpoint, relative to the base URL
pub const UPLOAD_PATH: &str = "/api/v1/public/upload";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variable holding the access key
pub const ENV_ACCESS_KEY: &str = "CLOUDBRIDGE_ACCESS_KEY";

/// Environment variable holding the secret key
pub const ENV_SECRET_KEY: &str = "CLOUDBRIDGE_SECRET_KEY";

/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "CLOUDBRIDGE_BASE_URL";

/// Environment variable overriding the timeout, in seconds
pub const ENV_TIMEOUT: &str = "CLOUDBRIDGE_TIMEOUT";

/// Configuration directory name
const CONFIG_DIR: &str = "cloudbridge";

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Source of environment variables.
///
/// Lets the fallback chain be resolved against something other than the
/// process environment.
pub trait Env: Debug + Send + Sync {
    /// Get an environment variable.
    ///
    /// Returns `None` if the variable is unset, empty, or not valid utf-8.
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Copy, Clone, Default)]
pub struct OsEnv;

impl Env for OsEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var_os(key)?
            .into_string()
            .ok()
            .filter(|v| !v.is_empty())
    }
}

/// A fixed set of variables, mostly useful in tests
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    pub envs: HashMap<String, String>,
}

impl StaticEnv {
    /// Add a variable
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.insert(key.into(), value.into());
        self
    }
}

impl Env for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.envs.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

/// Explicit client settings. Anything left `None` falls back to the
/// environment, then to the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ClientOptions {
    pub fn access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    pub fn secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Whether every field is set, leaving nothing for a fallback to fill
    pub fn is_complete(&self) -> bool {
        self.access_key.is_some()
            && self.secret_key.is_some()
            && self.base_url.is_some()
            && self.timeout_secs.is_some()
    }

    /// Fill every unset field from `fallback`.
    pub fn or(self, fallback: ClientOptions) -> Self {
        Self {
            access_key: self.access_key.or(fallback.access_key),
            secret_key: self.secret_key.or(fallback.secret_key),
            base_url: self.base_url.or(fallback.base_url),
            timeout_secs: self.timeout_secs.or(fallback.timeout_secs),
        }
    }
}

/// Resolved, non-secret client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Resolve credentials and settings: explicit option, then `env`, then default.
    ///
    /// Reads `env` once; nothing is cached globally.
    pub fn resolve(options: ClientOptions, env: &dyn Env) -> Result<(Credentials, ClientConfig)> {
        let access_key = options
            .access_key
            .or_else(|| env.var(ENV_ACCESS_KEY))
            .unwrap_or_default();
        let secret_key = options
            .secret_key
            .or_else(|| env.var(ENV_SECRET_KEY))
            .unwrap_or_default();
        let base_url = options
            .base_url
            .or_else(|| env.var(ENV_BASE_URL))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = match options.timeout_secs {
            Some(secs) => secs,
            None => match env.var(ENV_TIMEOUT) {
                Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                    Error::Config(format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT, raw))
                })?,
                None => DEFAULT_TIMEOUT_SECS,
            },
        };

        let config = ClientConfig {
            base_url: trim_base_url(&base_url),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok((Credentials::new(access_key, secret_key), config))
    }

    /// Full URL of the upload endpoint
    pub fn upload_url(&self) -> String {
        format!("{}{}", self.base_url, UPLOAD_PATH)
    }
}

/// Strip trailing slashes from a base URL
pub fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// CLI profile file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// `[credentials]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

/// `[api]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl From<ConfigFile> for ClientOptions {
    fn from(file: ConfigFile) -> Self {
        ClientOptions {
            access_key: file.credentials.access_key,
            secret_key: file.credentials.secret_key,
            base_url: file.api.base_url,
            timeout_secs: file.api.timeout,
        }
    }
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let home = home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR))
}

/// Get the configuration file path
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

/// Check if configuration exists
pub fn config_exists() -> bool {
    get_config_path().map(|p| p.exists()).unwrap_or(false)
}

/// Load the profile from its default location
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&get_config_path()?)
}

/// Load the profile if there is one, otherwise an empty profile
pub fn load_config_or_default() -> Result<ConfigFile> {
    let path = get_config_path()?;
    if path.exists() {
        load_config_from(&path)
    } else {
        Ok(ConfigFile::default())
    }
}

/// Load a profile from `path`
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        Error::InvalidConfig(format!("Failed to read config file: {}", e))
    })?;

    let config: ConfigFile = toml::from_str(&content).map_err(|e| {
        Error::InvalidConfig(format!("Failed to parse config file: {}", e))
    })?;

    Ok(config)
}

/// Save the profile to its default location, returning the path written
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = get_config_path()?;
    save_config_to(&path, config)?;
    Ok(path)
}

/// Save a profile to `path`, creating parent directories
pub fn save_config_to(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
    }

    let content = toml::to_string_pretty(config)?;

    fs::write(path, content).map_err(|e| {
        Error::Config(format!("Failed to write config file: {}", e))
    })?;

    // The profile may hold a secret key: owner read/write only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_defaults() {
        let (creds, config) = ClientConfig::resolve(ClientOptions::default(), &StaticEnv::default()).unwrap();

        assert!(creds.is_empty());
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_resolve_env_fallback() {
        let env = StaticEnv::default()
            .with(ENV_ACCESS_KEY, "env-ak")
            .with(ENV_SECRET_KEY, "env-sk")
            .with(ENV_BASE_URL, "https://staging.example.com//")
            .with(ENV_TIMEOUT, "15");

        let (creds, config) = ClientConfig::resolve(ClientOptions::default(), &env).unwrap();

        assert_eq!(creds, Credentials::new("env-ak", "env-sk"));
        assert_eq!(config.base_url, "https://staging.example.com");
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_resolve_explicit_wins() {
        let env = StaticEnv::default()
            .with(ENV_ACCESS_KEY, "env-ak")
            .with(ENV_BASE_URL, "https://staging.example.com");
        let options = ClientOptions::default()
            .access_key("ak")
            .base_url("https://api.example.com/")
            .timeout_secs(5);

        let (creds, config) = ClientConfig::resolve(options, &env).unwrap();

        assert_eq!(creds.access_key(), "ak");
        // Secret was not given explicitly nor in env
        assert_eq!(creds.secret_key(), "");
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_resolve_empty_env_is_unset() {
        let env = StaticEnv::default().with(ENV_BASE_URL, "");
        let (_, config) = ClientConfig::resolve(ClientOptions::default(), &env).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_resolve_bad_timeout() {
        let env = StaticEnv::default().with(ENV_TIMEOUT, "soon");
        let err = ClientConfig::resolve(ClientOptions::default(), &env).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_upload_url() {
        let config = ClientConfig {
            base_url: "https://api.example.com".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(config.upload_url(), "https://api.example.com/api/v1/public/upload");
    }

    #[test]
    fn test_trim_base_url() {
        assert_eq!(trim_base_url("https://a.b///"), "https://a.b");
        assert_eq!(trim_base_url("https://a.b"), "https://a.b");
    }

    #[test]
    fn test_options_or() {
        let merged = ClientOptions::default()
            .access_key("flag")
            .or(ClientOptions::default().access_key("file").secret_key("file-sk").timeout_secs(9));

        assert_eq!(merged.access_key.as_deref(), Some("flag"));
        assert_eq!(merged.secret_key.as_deref(), Some("file-sk"));
        assert_eq!(merged.base_url, None);
        assert_eq!(merged.timeout_secs, Some(9));
    }

    #[test]
    fn test_options_is_complete() {
        let partial = ClientOptions::default().access_key("ak").secret_key("sk");
        assert!(!partial.is_complete());
        assert!(!ClientOptions::default().is_complete());

        let full = partial.base_url("https://api.example.com").timeout_secs(5);
        assert!(full.is_complete());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = ConfigFile {
            credentials: CredentialsConfig {
                access_key: Some("ak".to_string()),
                secret_key: Some("sk".to_string()),
            },
            api: ApiConfig {
                base_url: Some("https://api.example.com".to_string()),
                timeout: Some(30),
            },
        };

        save_config_to(&path, &config).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, config);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_config_file_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api]\ntimeout = 10\n").unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.api.timeout, Some(10));
        assert_eq!(loaded.credentials, CredentialsConfig::default());

        let options: ClientOptions = loaded.into();
        assert_eq!(options.timeout_secs, Some(10));
        assert_eq!(options.access_key, None);
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn test_load_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is = = not toml").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
