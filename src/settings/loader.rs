//! Settings Loader
//!
//! Assembles override layers and produces the validated [`Settings`] record.
//! Layer order, lowest to highest precedence:
//!
//! 1. Compiled-in defaults
//! 2. System config (`/etc/centia/centia.toml`, when present)
//! 3. Project config (`./centia.toml`), or the file named by `CENTIA_CONFIG`
//! 4. Environment variables (`CENTIA_*` prefix, `__` separates nested keys)
//!
//! The environment always has the last word. Any violation aborts the load;
//! no partial or degraded record is ever returned.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use tracing::{debug, info, warn};

use crate::constants::source;
use crate::error::{ConfigError, Result};
use crate::settings::overlay::SettingsOverlay;
use crate::settings::types::Settings;
use crate::settings::validate;

/// Configuration loader
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings with the full resolution chain:
    /// defaults → system file → project file → environment.
    pub fn load() -> Result<Settings> {
        let mut layers = vec![SettingsOverlay::builtin()];

        let system = Self::system_config_path();
        if system.exists() {
            debug!("loading system config from: {}", system.display());
            layers.push(Self::file_overlay(&system)?);
        }

        match env::var(source::CONFIG_PATH_ENV) {
            Ok(path) => {
                let path = PathBuf::from(path);
                debug!(
                    "loading config named by {}: {}",
                    source::CONFIG_PATH_ENV,
                    path.display()
                );
                layers.push(Self::file_overlay(&path)?);
            }
            Err(_) => {
                let project = Self::project_config_path();
                if project.exists() {
                    debug!("loading project config from: {}", project.display());
                    layers.push(Self::file_overlay(&project)?);
                }
            }
        }

        layers.push(Self::env_overlay()?);
        Self::finish(layers)
    }

    /// Load settings from a specific file: defaults → file → environment.
    ///
    /// The named file must be readable.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Settings> {
        let path = path.as_ref();
        let layers = vec![
            SettingsOverlay::builtin(),
            Self::file_overlay(path)?,
            Self::env_overlay()?,
        ];
        Self::finish(layers)
    }

    /// The compiled-in defaults as a validated record.
    pub fn defaults() -> Settings {
        validate::build(SettingsOverlay::builtin()).expect("compiled default settings are valid")
    }

    /// Path of the system-wide config file
    pub fn system_config_path() -> PathBuf {
        PathBuf::from(source::SYSTEM_CONFIG_FILE)
    }

    /// Path of the project-local config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(source::PROJECT_CONFIG_FILE)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn finish(layers: Vec<SettingsOverlay>) -> Result<Settings> {
        let settings = validate::build(SettingsOverlay::merge(layers))?;

        info!(
            "configuration loaded: host={} session={} cache={} rate_limit={}",
            settings.host, settings.session.kind, settings.cache.kind, settings.rate_limit.mode
        );
        if settings.master_password.is_development_default() {
            warn!(
                "master password is the built-in development default; \
                 set master_password.hash before deploying"
            );
        }

        Ok(settings)
    }

    fn file_overlay(path: &Path) -> Result<SettingsOverlay> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::unreadable(path, e))?;
        Figment::new()
            .merge(Toml::string(&raw))
            .extract()
            .map_err(|e| ConfigError::from_figment(e, Some(path)))
    }

    fn env_overlay() -> Result<SettingsOverlay> {
        Figment::new()
            .merge(
                Env::prefixed(source::ENV_PREFIX)
                    .split(source::ENV_NESTED_SEPARATOR)
                    .lowercase(true),
            )
            .extract()
            .map_err(|e| ConfigError::from_figment(e, None))
    }
}

// =============================================================================
// Tests
// =============================================================================
