//! Global Constants
//!
//! Centralized constants for override sources and compiled-in defaults.
//! The defaults mirror the reference deployment of the Centia API platform
//! and are the lowest-precedence layer of every load.

/// Override source locations and naming
pub mod source {
    /// Prefix for environment variable overrides (e.g. `CENTIA_HOST`)
    pub const ENV_PREFIX: &str = "CENTIA_";

    /// Separator for nested keys in environment variables
    /// (`CENTIA_SESSION__HOST` maps to `session.host`)
    pub const ENV_NESTED_SEPARATOR: &str = "__";

    /// Environment variable naming an explicit config file to load
    pub const CONFIG_PATH_ENV: &str = "CENTIA_CONFIG";

    /// System-wide config file, consulted when present
    pub const SYSTEM_CONFIG_FILE: &str = "/etc/centia/centia.toml";

    /// Project-local config file, consulted when present and no
    /// explicit file was named via `CENTIA_CONFIG`
    pub const PROJECT_CONFIG_FILE: &str = "centia.toml";
}

/// Compiled-in default values
pub mod defaults {
    /// Rate limit window length (seconds), used by the sliding mode
    pub const RATE_LIMIT_WINDOW_SECONDS: u32 = 10;

    /// Requests allowed per minute
    pub const RATE_LIMIT_PER_MINUTE: u32 = 120;

    /// Public base URL of the API
    pub const HOST: &str = "https://api.centia.io";

    /// Per-process memory ceiling, as a size string
    pub const MEMORY_LIMIT: &str = "1024M";

    /// SQL statement timeout (milliseconds); 0 disables the timeout
    pub const STATEMENT_TIMEOUT_MS: u64 = 20_000;

    /// Address of the default session and cache backend, `host:port`
    pub const BACKEND_HOST: &str = "redis:6379";

    /// Redis database index holding sessions
    pub const SESSION_DB: u32 = 1;

    /// Redis database index holding the application cache
    pub const CACHE_DB: u32 = 0;

    /// Cache entry lifetime (seconds)
    pub const CACHE_TTL_SECONDS: u64 = 3_600;

    /// Installation root of the platform
    pub const INSTALL_PATH: &str = "/app";

    /// Template database cloned when creating new databases
    pub const DATABASE_TEMPLATE: &str = "template_geocloud";

    /// Default encoding for uploaded data files
    pub const ENCODING: &str = "UTF8";

    /// Development-only master password hash (argon2id).
    ///
    /// Loading a configuration that still carries this value emits a
    /// warning; production deployments must override `master_password.hash`.
    pub const DEV_MASTER_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY";
}

/// Size-string suffix table (`"1024M"` style values)
pub mod size {
    /// Bytes per `K`
    pub const KIB: u64 = 1024;

    /// Bytes per `M`
    pub const MIB: u64 = 1024 * 1024;

    /// Bytes per `G`
    pub const GIB: u64 = 1024 * 1024 * 1024;
}
