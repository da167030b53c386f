//! centia-config - Typed Deployment Configuration
//!
//! Builds one validated, immutable [`Settings`] record for the Centia API
//! platform from layered override sources and exposes it through typed
//! fields. A record only exists after a successful load, so consumers can
//! never observe partial or unvalidated configuration.
//!
//! ## Precedence
//!
//! Compiled-in defaults → system config file → project config file (or the
//! file named by `CENTIA_CONFIG`) → `CENTIA_*` environment variables.
//! Later sources win per top-level key; nested records (session backend,
//! cache backend, OAuth credentials, ...) are replaced whole, never merged
//! field by field.
//!
//! ## Quick Start
//!
//! ```ignore
//! use centia_config::SettingsLoader;
//!
//! let settings = SettingsLoader::load()?;
//! println!("serving {}", settings.host);
//! println!("sessions in {} db {}", settings.session.addr, settings.session.db);
//! ```
//!
//! ## Failure semantics
//!
//! Every validation failure is fatal to startup: [`SettingsLoader::load`]
//! returns a [`ConfigError`] that the process entry point reports before
//! exiting. Nothing is retried or silently defaulted.
//!
//! ## Secrets
//!
//! The master password hash and the OAuth client secret are held as
//! [`secrecy`] values: redacted `Debug`, no `Serialize`, never echoed in
//! error messages.
//!
//! ## Modules
//!
//! - [`settings`]: the record, its loader, and the swappable handle
//! - [`error`]: the error taxonomy
//! - [`constants`]: compiled-in defaults and source locations

pub mod constants;
pub mod error;
pub mod settings;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use error::{ConfigError, Result};
pub use settings::{
    BackendKind, ByteSize, CacheSettings, HashScheme, HostPort, MasterPassword, OauthSettings,
    RateLimitMode, RateLimitSettings, SessionSettings, Settings, SettingsLoader, SharedSettings,
    SqlApiSettings,
};
