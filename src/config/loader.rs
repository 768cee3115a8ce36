//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "PMAP";

/// Config file name
const CONFIG_FILE_NAME: &str = "pmap.toml";

/// Application directory under the platform config directory
const APP_DIR_NAME: &str = "pmap";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "PMAP_CONFIG";

/// Largest receive timeout the protocol layer can express (16-bit milliseconds).
const MAX_RX_TIMEOUT_MS: u64 = u16::MAX as u64;

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `PMAP_CONFIG` environment variable (explicit path)
    /// 2. `./pmap.toml` (current directory)
    /// 3. `~/.config/pmap/pmap.toml` (XDG on Linux/macOS)
    /// 4. `%APPDATA%\pmap\pmap.toml` (Windows)
    /// 5. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        validate(&config)?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        validate(&config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        if apply_env_overrides(&mut config).is_err() || validate(&config).is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. XDG config directory (Linux/macOS) or APPDATA (Windows)
    if let Some(config_dir) = get_config_dir() {
        let app_config = config_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
        if app_config.exists() {
            return Some(app_config);
        }
    }

    // 4. No config file found - will use defaults
    None
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Save configuration to a file.
fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn env_key(key: &str) -> String {
    format!("{ENV_PREFIX}_{key}")
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `PMAP_<SECTION>_<KEY>`
/// For example:
/// - `PMAP_SERIAL_DEVICE=/dev/ttyUSB0`
/// - `PMAP_SERIAL_RX_TIMEOUT_MS=2000`
/// - `PMAP_LOGGING_DEBUG_TRANSCRIPT=1`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Serial overrides
    if let Ok(val) = std::env::var(env_key("SERIAL_DEVICE")) {
        config.serial.device = Some(val);
    }
    if let Ok(val) = std::env::var(env_key("SERIAL_RX_TIMEOUT_MS")) {
        config.serial.rx_timeout_ms = val
            .parse()
            .map_err(|_| ConfigError::env_parse(env_key("SERIAL_RX_TIMEOUT_MS"), "Invalid timeout"))?;
    }

    // Logging overrides
    if let Ok(val) = std::env::var(env_key("LOGGING_LEVEL")) {
        config.logging.level = val;
    }
    if let Ok(val) = std::env::var(env_key("LOGGING_DEBUG_TRANSCRIPT")) {
        config.logging.debug_transcript = val.eq_ignore_ascii_case("true") || val == "1";
    }

    Ok(())
}

/// Reject values the transport cannot honour.
fn validate(config: &Config) -> ConfigResult<()> {
    let timeout = config.serial.rx_timeout_ms;
    if timeout == 0 || timeout > MAX_RX_TIMEOUT_MS {
        return Err(ConfigError::validation(
            "serial.rx_timeout_ms",
            format!("must be between 1 and {MAX_RX_TIMEOUT_MS}, got {timeout}"),
        ));
    }
    Ok(())
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}
