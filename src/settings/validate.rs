//! Settings Validation
//!
//! Turns a merged [`SettingsOverlay`] into a validated [`Settings`] record.
//! Validation is fail-fast: the first violation is returned. A record that
//! reaches the caller is fully populated, so no configuration error can
//! occur later in the process lifetime.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;

use argon2::password_hash::PasswordHash;
use secrecy::SecretString;
use tracing::warn;
use url::Url;

use crate::error::{ConfigError, Result};
use crate::settings::overlay::{
    BackendOverlay, MasterPasswordOverlay, OauthOverlay, RateLimitOverlay, SettingsOverlay,
    SqlApiOverlay,
};
use crate::settings::types::{
    BackendKind, ByteSize, CacheSettings, HashScheme, HostPort, MasterPassword, OauthSettings,
    RateLimitMode, RateLimitSettings, SessionSettings, Settings, SqlApiSettings,
};

pub(crate) fn build(overlay: SettingsOverlay) -> Result<Settings> {
    let rate_limit = rate_limit(require("rate_limit", overlay.rate_limit)?)?;
    let host = absolute_url("host", &require("host", overlay.host)?)?;
    let insert_cost = overlay.insert_cost.unwrap_or(true);
    let memory_limit: ByteSize =
        parse_field("memory_limit", &require("memory_limit", overlay.memory_limit)?)?;
    let sql_api = sql_api(require("sql_api", overlay.sql_api)?)?;
    let session = session(require("session", overlay.session)?)?;
    let cache = cache(require("cache", overlay.cache)?)?;
    let install_path = absolute_path("install_path", &require("install_path", overlay.install_path)?)?;
    let database_template = non_empty(
        "database_template",
        require("database_template", overlay.database_template)?,
    )?;
    let master_password = master_password(require("master_password", overlay.master_password)?)?;
    let default_encoding = match overlay.default_encoding {
        Some(encoding) => non_empty("default_encoding", encoding)?,
        None => crate::constants::defaults::ENCODING.to_string(),
    };
    let allowed_origins = allowed_origins(require("allowed_origins", overlay.allowed_origins)?)?;
    let oauth = oauth(require("oauth", overlay.oauth)?)?;

    Ok(Settings {
        rate_limit,
        host,
        insert_cost,
        memory_limit,
        sql_api,
        session,
        cache,
        install_path,
        database_template,
        master_password,
        default_encoding,
        allowed_origins,
        oauth,
    })
}

// =============================================================================
// Sub-records
// =============================================================================

fn rate_limit(overlay: RateLimitOverlay) -> Result<RateLimitSettings> {
    let mode: RateLimitMode =
        parse_field("rate_limit.mode", &require("rate_limit.mode", overlay.mode)?)?;

    let per_minute = positive_u32(
        "rate_limit.per_minute",
        require("rate_limit.per_minute", overlay.per_minute)?,
    )?;

    let window_seconds = match mode {
        RateLimitMode::Sliding => Some(positive_u32(
            "rate_limit.window_seconds",
            require("rate_limit.window_seconds", overlay.window_seconds)?,
        )?),
        RateLimitMode::Fixed => overlay
            .window_seconds
            .map(|v| positive_u32("rate_limit.window_seconds", v))
            .transpose()?,
    };

    Ok(RateLimitSettings {
        mode,
        window_seconds,
        per_minute,
    })
}

fn sql_api(overlay: SqlApiOverlay) -> Result<SqlApiSettings> {
    let statement_timeout_ms = non_negative_u64(
        "sql_api.statement_timeout_ms",
        require(
            "sql_api.statement_timeout_ms",
            overlay.statement_timeout_ms,
        )?,
    )?;

    Ok(SqlApiSettings {
        statement_timeout_ms,
    })
}

fn session(overlay: BackendOverlay) -> Result<SessionSettings> {
    let (kind, addr, db, ttl_secs) = backend_parts("session", overlay)?;
    Ok(SessionSettings {
        kind,
        addr,
        db,
        ttl_secs,
    })
}

fn cache(overlay: BackendOverlay) -> Result<CacheSettings> {
    let (kind, addr, db, ttl_secs) = backend_parts("cache", overlay)?;
    let ttl_secs = ttl_secs.ok_or_else(|| ConfigError::missing("cache.ttl"))?;
    Ok(CacheSettings {
        kind,
        addr,
        db,
        ttl_secs,
    })
}

/// Shared shape of the session and cache backend records. `db` defaults to
/// 0 within a record; the ttl requirement differs per caller.
fn backend_parts(prefix: &str, overlay: BackendOverlay) -> Result<(BackendKind, HostPort, u32, Option<u64>)> {
    let kind: BackendKind = parse_field(
        format!("{prefix}.type"),
        &require(format!("{prefix}.type"), overlay.kind)?,
    )?;

    let addr: HostPort = parse_field(
        format!("{prefix}.host"),
        &require(format!("{prefix}.host"), overlay.host)?,
    )?;

    let db = match overlay.db {
        Some(db) => non_negative_u32(format!("{prefix}.db"), db)?,
        None => 0,
    };

    let ttl_secs = overlay
        .ttl
        .map(|v| positive_u64(format!("{prefix}.ttl"), v))
        .transpose()?;

    Ok((kind, addr, db, ttl_secs))
}

fn master_password(overlay: MasterPasswordOverlay) -> Result<MasterPassword> {
    let scheme: HashScheme = match overlay.scheme {
        Some(raw) => parse_field("master_password.scheme", &raw)?,
        None => HashScheme::Argon2id,
    };

    let hash = require("master_password.hash", overlay.hash)?;

    match scheme {
        HashScheme::Argon2id => {
            let parsed = PasswordHash::new(&hash).map_err(|_| {
                ConfigError::invalid_value(
                    "master_password.hash",
                    "not a valid PHC string for argon2id",
                )
            })?;
            if parsed.algorithm.as_str() != "argon2id" {
                return Err(ConfigError::invalid_value(
                    "master_password.hash",
                    format!(
                        "PHC algorithm is `{}`, expected `argon2id`",
                        parsed.algorithm
                    ),
                ));
            }
        }
        HashScheme::Sha256 => hex_digest("master_password.hash", &hash, 64)?,
        HashScheme::Md5 => {
            hex_digest("master_password.hash", &hash, 32)?;
            warn!("md5 master password hashes are deprecated; migrate to argon2id");
        }
    }

    Ok(MasterPassword {
        scheme,
        hash: SecretString::from(hash),
    })
}

fn allowed_origins(origins: Vec<String>) -> Result<BTreeSet<String>> {
    let mut set = BTreeSet::new();
    for origin in origins {
        if origin.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "allowed_origins",
                "origin entries must not be empty",
            ));
        }
        set.insert(origin);
    }
    Ok(set)
}

fn oauth(overlay: OauthOverlay) -> Result<OauthSettings> {
    let client_id = require("oauth.client_id", overlay.client_id)?;
    let client_secret = require("oauth.client_secret", overlay.client_secret)?;
    Ok(OauthSettings {
        client_id,
        client_secret: SecretString::from(client_secret),
    })
}

// =============================================================================
// Field Helpers
// =============================================================================

fn require<T>(field: impl Into<String>, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| ConfigError::missing(field))
}

fn parse_field<T: FromStr<Err = String>>(field: impl Into<String>, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|detail: String| ConfigError::invalid_value(field, detail))
}

fn positive_u32(field: impl Into<String>, value: i64) -> Result<u32> {
    if value <= 0 {
        return Err(ConfigError::invalid_value(
            field,
            format!("must be a positive integer, got {value}"),
        ));
    }
    u32::try_from(value)
        .map_err(|_| ConfigError::invalid_value(field, format!("{value} is out of range")))
}

fn non_negative_u32(field: impl Into<String>, value: i64) -> Result<u32> {
    if value < 0 {
        return Err(ConfigError::invalid_value(
            field,
            format!("must be a non-negative integer, got {value}"),
        ));
    }
    u32::try_from(value)
        .map_err(|_| ConfigError::invalid_value(field, format!("{value} is out of range")))
}

fn positive_u64(field: impl Into<String>, value: i64) -> Result<u64> {
    if value <= 0 {
        return Err(ConfigError::invalid_value(
            field,
            format!("must be a positive integer, got {value}"),
        ));
    }
    Ok(value as u64)
}

fn non_negative_u64(field: impl Into<String>, value: i64) -> Result<u64> {
    if value < 0 {
        return Err(ConfigError::invalid_value(
            field,
            format!("must be a non-negative integer, got {value}"),
        ));
    }
    Ok(value as u64)
}

fn non_empty(field: impl Into<String>, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(ConfigError::invalid_value(field, "must not be empty"));
    }
    Ok(value)
}

fn absolute_url(field: impl Into<String> + Clone, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| {
        ConfigError::invalid_value(field.clone(), format!("`{raw}` is not an absolute URL: {e}"))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::invalid_value(
            field,
            format!("unsupported scheme `{other}` (expected http or https)"),
        )),
    }
}

fn absolute_path(field: impl Into<String>, raw: &str) -> Result<PathBuf> {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        Ok(path)
    } else {
        Err(ConfigError::invalid_value(
            field,
            format!("`{raw}` is not an absolute path"),
        ))
    }
}

fn hex_digest(field: impl Into<String>, value: &str, expected_len: usize) -> Result<()> {
    if value.len() != expected_len {
        return Err(ConfigError::invalid_value(
            field,
            format!(
                "expected {expected_len} hexadecimal characters, found {}",
                value.len()
            ),
        ));
    }
    if !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::invalid_value(
            field,
            "contains non-hexadecimal characters",
        ));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;
    use crate::constants::{defaults, size};

    fn builtin() -> SettingsOverlay {
        SettingsOverlay::builtin()
    }

    #[test]
    fn test_builtin_defaults_validate() {
        let settings = build(builtin()).unwrap();

        assert_eq!(settings.rate_limit.mode, RateLimitMode::Sliding);
        assert_eq!(settings.rate_limit.window_seconds, Some(10));
        assert_eq!(settings.rate_limit.per_minute, 120);
        assert_eq!(settings.host.as_str(), "https://api.centia.io/");
        assert!(settings.insert_cost);
        assert_eq!(settings.memory_limit.bytes(), size::GIB);
        assert_eq!(settings.sql_api.statement_timeout_ms, 20_000);
        assert_eq!(settings.session.kind, BackendKind::Redis);
        assert_eq!(settings.session.db, 1);
        assert_eq!(settings.session.ttl_secs, None);
        assert_eq!(settings.cache.db, 0);
        assert_eq!(settings.cache.ttl_secs, 3_600);
        assert_eq!(settings.install_path, PathBuf::from("/app"));
        assert_eq!(settings.database_template, defaults::DATABASE_TEMPLATE);
        assert_eq!(settings.default_encoding, "UTF8");
        assert!(settings.allowed_origins.contains("*"));
        assert!(settings.master_password.is_development_default());
        assert!(!settings.oauth.is_configured());
    }

    #[test]
    fn test_missing_host_fails() {
        let mut overlay = builtin();
        overlay.host = None;

        let err = build(overlay).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
        assert_eq!(err.field(), Some("host"));
    }

    #[test]
    fn test_negative_statement_timeout_fails() {
        let mut overlay = builtin();
        overlay.sql_api = Some(SqlApiOverlay {
            statement_timeout_ms: Some(-1),
        });

        let err = build(overlay).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(err.field(), Some("sql_api.statement_timeout_ms"));
    }

    #[test]
    fn test_zero_statement_timeout_disables_it() {
        let mut overlay = builtin();
        overlay.sql_api = Some(SqlApiOverlay {
            statement_timeout_ms: Some(0),
        });

        let settings = build(overlay).unwrap();
        assert_eq!(settings.sql_api.statement_timeout_ms, 0);
    }

    #[test]
    fn test_malformed_memory_limit_fails() {
        let mut overlay = builtin();
        overlay.memory_limit = Some("1024X".to_string());

        let err = build(overlay).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(err.field(), Some("memory_limit"));
    }

    #[test]
    fn test_relative_install_path_fails() {
        let mut overlay = builtin();
        overlay.install_path = Some("app/data".to_string());

        let err = build(overlay).unwrap_err();
        assert_eq!(err.field(), Some("install_path"));
    }

    #[test]
    fn test_host_must_be_absolute_http_url() {
        let mut overlay = builtin();
        overlay.host = Some("not a url".to_string());
        assert_eq!(build(overlay).unwrap_err().field(), Some("host"));

        let mut overlay = builtin();
        overlay.host = Some("ftp://api.centia.io".to_string());
        assert_eq!(build(overlay).unwrap_err().field(), Some("host"));
    }

    #[test]
    fn test_sliding_mode_requires_window() {
        let mut overlay = builtin();
        overlay.rate_limit = Some(RateLimitOverlay {
            mode: Some("sliding".to_string()),
            window_seconds: None,
            per_minute: Some(120),
        });

        let err = build(overlay).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
        assert_eq!(err.field(), Some("rate_limit.window_seconds"));
    }

    #[test]
    fn test_fixed_mode_without_window_is_valid() {
        let mut overlay = builtin();
        overlay.rate_limit = Some(RateLimitOverlay {
            mode: Some("fixed".to_string()),
            window_seconds: None,
            per_minute: Some(60),
        });

        let settings = build(overlay).unwrap();
        assert_eq!(settings.rate_limit.mode, RateLimitMode::Fixed);
        assert_eq!(settings.rate_limit.window_seconds, None);
    }

    #[test]
    fn test_zero_per_minute_fails() {
        let mut overlay = builtin();
        overlay.rate_limit = Some(RateLimitOverlay {
            mode: Some("fixed".to_string()),
            window_seconds: None,
            per_minute: Some(0),
        });

        let err = build(overlay).unwrap_err();
        assert_eq!(err.field(), Some("rate_limit.per_minute"));
    }

    #[test]
    fn test_unknown_rate_limit_mode_fails() {
        let mut overlay = builtin();
        overlay.rate_limit = Some(RateLimitOverlay {
            mode: Some("leaky".to_string()),
            window_seconds: Some(10),
            per_minute: Some(120),
        });

        let err = build(overlay).unwrap_err();
        assert_eq!(err.field(), Some("rate_limit.mode"));
        assert!(err.to_string().contains("sliding"));
    }

    #[test]
    fn test_backend_host_rejects_scheme() {
        let mut overlay = builtin();
        overlay.session = Some(BackendOverlay {
            kind: Some("redis".to_string()),
            host: Some("tcp://redis:6379".to_string()),
            db: Some(1),
            ttl: None,
        });

        let err = build(overlay).unwrap_err();
        assert_eq!(err.field(), Some("session.host"));
    }

    #[test]
    fn test_unknown_backend_kind_fails() {
        let mut overlay = builtin();
        overlay.cache = Some(BackendOverlay {
            kind: Some("memcached".to_string()),
            host: Some("memcached:11211".to_string()),
            db: Some(0),
            ttl: Some(3600),
        });

        let err = build(overlay).unwrap_err();
        assert_eq!(err.field(), Some("cache.type"));
        assert!(err.to_string().contains("redis"));
    }

    #[test]
    fn test_cache_requires_ttl() {
        let mut overlay = builtin();
        overlay.cache = Some(BackendOverlay {
            kind: Some("redis".to_string()),
            host: Some("redis:6379".to_string()),
            db: Some(0),
            ttl: None,
        });

        let err = build(overlay).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
        assert_eq!(err.field(), Some("cache.ttl"));
    }

    #[test]
    fn test_backend_db_defaults_to_zero() {
        let mut overlay = builtin();
        overlay.session = Some(BackendOverlay {
            kind: Some("redis".to_string()),
            host: Some("redis:6379".to_string()),
            db: None,
            ttl: None,
        });

        let settings = build(overlay).unwrap();
        assert_eq!(settings.session.db, 0);
    }

    #[test]
    fn test_md5_hash_validates_and_round_trips() {
        let hash = "8ace28d206750aa2dcee00a3312e7345";
        let mut overlay = builtin();
        overlay.master_password = Some(MasterPasswordOverlay {
            scheme: Some("md5".to_string()),
            hash: Some(hash.to_string()),
        });

        let settings = build(overlay).unwrap();
        assert_eq!(settings.master_password.scheme, HashScheme::Md5);
        assert_eq!(settings.master_password.hash.expose_secret(), hash);
    }

    #[test]
    fn test_wrong_length_hash_fails_without_echoing_it() {
        let hash = "8ace28d206750aa2dcee00a3312e734"; // 31 chars
        let mut overlay = builtin();
        overlay.master_password = Some(MasterPasswordOverlay {
            scheme: Some("md5".to_string()),
            hash: Some(hash.to_string()),
        });

        let err = build(overlay).unwrap_err();
        assert_eq!(err.field(), Some("master_password.hash"));
        assert!(!err.to_string().contains(hash));
    }

    #[test]
    fn test_sha256_hash_validates() {
        let hash = "a".repeat(64);
        let mut overlay = builtin();
        overlay.master_password = Some(MasterPasswordOverlay {
            scheme: Some("sha256".to_string()),
            hash: Some(hash.clone()),
        });

        let settings = build(overlay).unwrap();
        assert_eq!(settings.master_password.hash.expose_secret(), hash);
    }

    #[test]
    fn test_argon2id_rejects_non_phc_hash() {
        let mut overlay = builtin();
        overlay.master_password = Some(MasterPasswordOverlay {
            scheme: Some("argon2id".to_string()),
            hash: Some("nonsense".to_string()),
        });

        let err = build(overlay).unwrap_err();
        assert_eq!(err.field(), Some("master_password.hash"));
        assert!(!err.to_string().contains("nonsense"));
    }

    #[test]
    fn test_scheme_defaults_to_argon2id() {
        let mut overlay = builtin();
        overlay.master_password = Some(MasterPasswordOverlay {
            scheme: None,
            hash: Some(defaults::DEV_MASTER_PASSWORD_HASH.to_string()),
        });

        let settings = build(overlay).unwrap();
        assert_eq!(settings.master_password.scheme, HashScheme::Argon2id);
    }

    #[test]
    fn test_empty_origin_entry_fails() {
        let mut overlay = builtin();
        overlay.allowed_origins = Some(vec!["https://a.test".to_string(), "  ".to_string()]);

        let err = build(overlay).unwrap_err();
        assert_eq!(err.field(), Some("allowed_origins"));
    }

    #[test]
    fn test_oauth_secret_round_trips() {
        let mut overlay = builtin();
        overlay.oauth = Some(OauthOverlay {
            client_id: Some("app-id".to_string()),
            client_secret: Some("app-secret".to_string()),
        });

        let settings = build(overlay).unwrap();
        assert!(settings.oauth.is_configured());
        assert_eq!(settings.oauth.client_secret.expose_secret(), "app-secret");
    }

    #[test]
    fn test_identical_overlays_build_equal_records() {
        let a = build(builtin()).unwrap();
        let b = build(builtin()).unwrap();
        assert_eq!(a, b);
    }
}
