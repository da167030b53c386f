//! Settings Types
//!
//! The validated [`Settings`] record, its nested sub-records, and the value
//! types they are built from. A `Settings` value only exists after a
//! successful load: every field is populated and validated, and nothing is
//! mutable afterwards, so the record is safe to share across threads.
//!
//! Secret fields are held as [`SecretString`]; their `Debug` output is
//! redacted and the record deliberately does not implement `Serialize`, so
//! it cannot be dumped wholesale into diagnostics.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{defaults, size};

// =============================================================================
// Root Record
// =============================================================================

/// Validated deployment settings, constructed once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// API rate limiting parameters
    pub rate_limit: RateLimitSettings,

    /// Public base URL of the API
    pub host: Url,

    /// Record statement cost accounting on insert operations
    pub insert_cost: bool,

    /// Per-process memory ceiling
    pub memory_limit: ByteSize,

    /// SQL execution layer parameters
    pub sql_api: SqlApiSettings,

    /// Session storage backend
    pub session: SessionSettings,

    /// Application cache backend
    pub cache: CacheSettings,

    /// Installation root of the platform (absolute)
    pub install_path: PathBuf,

    /// Template database cloned when creating new databases
    pub database_template: String,

    /// Admin master password hash
    pub master_password: MasterPassword,

    /// Default encoding for uploaded data files
    pub default_encoding: String,

    /// Origins trusted for cross-origin requests; the literal `"*"` is
    /// passed through uninterpreted
    pub allowed_origins: BTreeSet<String>,

    /// GitHub OAuth application credentials
    pub oauth: OauthSettings,
}

// =============================================================================
// Rate Limiting
// =============================================================================

/// Rate limit accounting mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitMode {
    /// Sliding window over the configured window length
    Sliding,
    /// Fixed per-minute buckets
    Fixed,
}

impl fmt::Display for RateLimitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitMode::Sliding => write!(f, "sliding"),
            RateLimitMode::Fixed => write!(f, "fixed"),
        }
    }
}

impl FromStr for RateLimitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sliding" => Ok(RateLimitMode::Sliding),
            "fixed" => Ok(RateLimitMode::Fixed),
            _ => Err(format!(
                "unknown rate limit mode: {}. Valid values: sliding, fixed",
                s
            )),
        }
    }
}

/// API rate limiting parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub mode: RateLimitMode,

    /// Window length in seconds; populated whenever mode is `sliding`
    pub window_seconds: Option<u32>,

    /// Requests allowed per minute
    pub per_minute: u32,
}

// =============================================================================
// SQL Execution
// =============================================================================

/// SQL execution layer parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlApiSettings {
    /// Statement timeout in milliseconds; 0 disables the timeout
    pub statement_timeout_ms: u64,
}

// =============================================================================
// Storage Backends
// =============================================================================

/// Storage backend flavor for sessions and the application cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Redis,
    Memory,
    File,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Redis => write!(f, "redis"),
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::File => write!(f, "file"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(BackendKind::Redis),
            "memory" => Ok(BackendKind::Memory),
            "file" => Ok(BackendKind::File),
            _ => Err(format!(
                "unknown backend type: {}. Valid values: redis, memory, file",
                s
            )),
        }
    }
}

/// Session storage backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub kind: BackendKind,
    pub addr: HostPort,
    /// Backend database index
    pub db: u32,
    /// Session lifetime in seconds, when the backend expires entries
    pub ttl_secs: Option<u64>,
}

/// Application cache backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub kind: BackendKind,
    pub addr: HostPort,
    /// Backend database index
    pub db: u32,
    /// Cache entry lifetime in seconds
    pub ttl_secs: u64,
}

// =============================================================================
// Master Password
// =============================================================================

/// Hash scheme of the stored master password
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashScheme {
    /// PHC-formatted argon2id string (the default)
    Argon2id,
    /// 64 hexadecimal characters
    Sha256,
    /// 32 hexadecimal characters; accepted for migration only and reported
    /// as deprecated at load time
    Md5,
}

impl fmt::Display for HashScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashScheme::Argon2id => write!(f, "argon2id"),
            HashScheme::Sha256 => write!(f, "sha256"),
            HashScheme::Md5 => write!(f, "md5"),
        }
    }
}

impl FromStr for HashScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "argon2id" => Ok(HashScheme::Argon2id),
            "sha256" => Ok(HashScheme::Sha256),
            "md5" => Ok(HashScheme::Md5),
            _ => Err(format!(
                "unknown hash scheme: {}. Valid values: argon2id, sha256, md5",
                s
            )),
        }
    }
}

/// Admin master password hash with its scheme.
///
/// The hash itself is secret material: `Debug` output is redacted and no
/// error message ever echoes it.
#[derive(Debug, Clone)]
pub struct MasterPassword {
    pub scheme: HashScheme,
    pub hash: SecretString,
}

impl MasterPassword {
    /// Whether this is still the compiled-in development hash
    pub fn is_development_default(&self) -> bool {
        self.hash.expose_secret() == defaults::DEV_MASTER_PASSWORD_HASH
    }
}

impl PartialEq for MasterPassword {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme && self.hash.expose_secret() == other.hash.expose_secret()
    }
}

impl Eq for MasterPassword {}

// =============================================================================
// OAuth
// =============================================================================

/// GitHub OAuth application credentials.
///
/// Both fields default to empty, leaving the integration disabled until a
/// deployment configures it.
#[derive(Debug, Clone)]
pub struct OauthSettings {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl OauthSettings {
    /// Whether credentials have been configured
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.expose_secret().is_empty()
    }
}

impl PartialEq for OauthSettings {
    fn eq(&self, other: &Self) -> bool {
        self.client_id == other.client_id
            && self.client_secret.expose_secret() == other.client_secret.expose_secret()
    }
}

impl Eq for OauthSettings {}

// =============================================================================
// Value Types
// =============================================================================

/// Byte quantity parsed from a size string such as `"1024M"`.
///
/// Suffix table: K = 1024, M = 1024², G = 1024³ (case-insensitive). A bare
/// number is taken as bytes. Anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSize(u64);

impl ByteSize {
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl FromStr for ByteSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let Some(last) = trimmed.chars().last() else {
            return Err("empty size string".to_string());
        };

        let (digits, factor) = if last.is_ascii_digit() {
            (trimmed, 1u64)
        } else {
            let factor = match last.to_ascii_uppercase() {
                'K' => size::KIB,
                'M' => size::MIB,
                'G' => size::GIB,
                other => {
                    return Err(format!(
                        "unrecognized size suffix `{other}` (expected K, M, or G)"
                    ));
                }
            };
            (&trimmed[..trimmed.len() - last.len_utf8()], factor)
        };

        if digits.is_empty() {
            return Err("size string has no numeric part".to_string());
        }

        let value: u64 = digits
            .parse()
            .map_err(|_| format!("invalid numeric size `{digits}`"))?;

        value
            .checked_mul(factor)
            .map(ByteSize)
            .ok_or_else(|| format!("size `{trimmed}` overflows the byte range"))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= size::GIB && self.0 % size::GIB == 0 {
            write!(f, "{}G", self.0 / size::GIB)
        } else if self.0 >= size::MIB && self.0 % size::MIB == 0 {
            write!(f, "{}M", self.0 / size::MIB)
        } else if self.0 >= size::KIB && self.0 % size::KIB == 0 {
            write!(f, "{}K", self.0 / size::KIB)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Backend address of the form `host:port`, without a scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostPort {
    host: String,
    port: u16,
}

impl HostPort {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for HostPort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains("://") {
            return Err(format!("`{s}` must not include a scheme"));
        }

        let Some((host, port)) = s.rsplit_once(':') else {
            return Err(format!("`{s}` is not of the form host:port"));
        };

        if host.is_empty() {
            return Err(format!("`{s}` has an empty host part"));
        }

        let port: u16 = port
            .parse()
            .map_err(|_| format!("`{port}` is not a valid port number"))?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
