//! Deployment Settings
//!
//! One validated, immutable settings record built from layered override
//! sources, in increasing precedence:
//! 1. Compiled-in defaults
//! 2. System config (/etc/centia/centia.toml)
//! 3. Project config (./centia.toml) or the file named by `CENTIA_CONFIG`
//! 4. Environment variables (`CENTIA_*`)

mod loader;
mod overlay;
mod shared;
mod types;
mod validate;

pub use loader::SettingsLoader;
pub use shared::SharedSettings;
pub use types::{
    BackendKind, ByteSize, CacheSettings, HashScheme, HostPort, MasterPassword, OauthSettings,
    RateLimitMode, RateLimitSettings, SessionSettings, Settings, SqlApiSettings,
};
