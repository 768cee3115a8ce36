//! Configuration module for pmap-serial.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `PMAP_CONFIG` environment variable (explicit path)
//! 2. `./pmap.toml` (current directory)
//! 3. `~/.config/pmap/pmap.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\pmap\pmap.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is: `PMAP_<SECTION>_<KEY>`
//!
//! - `PMAP_SERIAL_DEVICE=/dev/ttyUSB0`
//! - `PMAP_SERIAL_RX_TIMEOUT_MS=2000`
//! - `PMAP_LOGGING_LEVEL=debug`
//! - `PMAP_LOGGING_DEBUG_TRANSCRIPT=1`
//!
//! # Example
//!
//! ```rust,no_run
//! use pmap_serial::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//! println!("Receive timeout: {:?}", config.serial.rx_timeout());
//! # Ok::<(), pmap_serial::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig};
