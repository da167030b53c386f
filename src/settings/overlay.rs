//! Override Layers
//!
//! Each override source (compiled defaults, a TOML file, the environment)
//! deserializes into a [`SettingsOverlay`]: every top-level key optional,
//! numeric fields widened to `i64` so range problems surface as validation
//! errors rather than deserialization failures.
//!
//! Layers merge last-writer-wins over the flat top-level key space. Nested
//! sub-records (`rate_limit`, `sql_api`, `session`, `cache`,
//! `master_password`, `oauth`) replace as whole records, never field by
//! field: a layer that overrides `session` supplies the complete session
//! record, so backend types cannot be silently mixed across layers.

use serde::Deserialize;

use crate::constants::defaults;

/// One override layer: the raw, unvalidated shape of the settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SettingsOverlay {
    pub(crate) rate_limit: Option<RateLimitOverlay>,
    pub(crate) host: Option<String>,
    pub(crate) insert_cost: Option<bool>,
    pub(crate) memory_limit: Option<String>,
    pub(crate) sql_api: Option<SqlApiOverlay>,
    pub(crate) session: Option<BackendOverlay>,
    pub(crate) cache: Option<BackendOverlay>,
    pub(crate) install_path: Option<String>,
    pub(crate) database_template: Option<String>,
    pub(crate) master_password: Option<MasterPasswordOverlay>,
    pub(crate) default_encoding: Option<String>,
    pub(crate) allowed_origins: Option<Vec<String>>,
    pub(crate) oauth: Option<OauthOverlay>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RateLimitOverlay {
    pub(crate) mode: Option<String>,
    pub(crate) window_seconds: Option<i64>,
    pub(crate) per_minute: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SqlApiOverlay {
    pub(crate) statement_timeout_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct BackendOverlay {
    #[serde(rename = "type")]
    pub(crate) kind: Option<String>,
    pub(crate) host: Option<String>,
    pub(crate) db: Option<i64>,
    pub(crate) ttl: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MasterPasswordOverlay {
    pub(crate) scheme: Option<String>,
    pub(crate) hash: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OauthOverlay {
    pub(crate) client_id: Option<String>,
    pub(crate) client_secret: Option<String>,
}

impl SettingsOverlay {
    /// Compiled-in defaults, the lowest-precedence layer of every load.
    ///
    /// These pass through the same validation as any other layer.
    pub(crate) fn builtin() -> Self {
        Self {
            rate_limit: Some(RateLimitOverlay {
                mode: Some("sliding".to_string()),
                window_seconds: Some(i64::from(defaults::RATE_LIMIT_WINDOW_SECONDS)),
                per_minute: Some(i64::from(defaults::RATE_LIMIT_PER_MINUTE)),
            }),
            host: Some(defaults::HOST.to_string()),
            insert_cost: Some(true),
            memory_limit: Some(defaults::MEMORY_LIMIT.to_string()),
            sql_api: Some(SqlApiOverlay {
                statement_timeout_ms: Some(defaults::STATEMENT_TIMEOUT_MS as i64),
            }),
            session: Some(BackendOverlay {
                kind: Some("redis".to_string()),
                host: Some(defaults::BACKEND_HOST.to_string()),
                db: Some(i64::from(defaults::SESSION_DB)),
                ttl: None,
            }),
            cache: Some(BackendOverlay {
                kind: Some("redis".to_string()),
                host: Some(defaults::BACKEND_HOST.to_string()),
                db: Some(i64::from(defaults::CACHE_DB)),
                ttl: Some(defaults::CACHE_TTL_SECONDS as i64),
            }),
            install_path: Some(defaults::INSTALL_PATH.to_string()),
            database_template: Some(defaults::DATABASE_TEMPLATE.to_string()),
            master_password: Some(MasterPasswordOverlay {
                scheme: Some("argon2id".to_string()),
                hash: Some(defaults::DEV_MASTER_PASSWORD_HASH.to_string()),
            }),
            default_encoding: Some(defaults::ENCODING.to_string()),
            allowed_origins: Some(vec!["*".to_string()]),
            oauth: Some(OauthOverlay {
                client_id: Some(String::new()),
                client_secret: Some(String::new()),
            }),
        }
    }

    /// Merge `self` (higher precedence) over `base`, last-writer-wins per
    /// top-level key.
    pub(crate) fn merged_over(self, base: Self) -> Self {
        Self {
            rate_limit: self.rate_limit.or(base.rate_limit),
            host: self.host.or(base.host),
            insert_cost: self.insert_cost.or(base.insert_cost),
            memory_limit: self.memory_limit.or(base.memory_limit),
            sql_api: self.sql_api.or(base.sql_api),
            session: self.session.or(base.session),
            cache: self.cache.or(base.cache),
            install_path: self.install_path.or(base.install_path),
            database_template: self.database_template.or(base.database_template),
            master_password: self.master_password.or(base.master_password),
            default_encoding: self.default_encoding.or(base.default_encoding),
            allowed_origins: self.allowed_origins.or(base.allowed_origins),
            oauth: self.oauth.or(base.oauth),
        }
    }

    /// Collapse layers ordered lowest to highest precedence into one overlay.
    pub(crate) fn merge(layers: Vec<Self>) -> Self {
        layers
            .into_iter()
            .fold(Self::default(), |acc, layer| layer.merged_over(acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_higher_layer_wins_per_field() {
        let base = SettingsOverlay::builtin();
        let layer = SettingsOverlay {
            host: Some("https://x.test".to_string()),
            ..Default::default()
        };

        let merged = layer.merged_over(base);
        assert_eq!(merged.host.as_deref(), Some("https://x.test"));
        // untouched keys fall through to the lower layer
        assert_eq!(
            merged.database_template.as_deref(),
            Some(defaults::DATABASE_TEMPLATE)
        );
    }

    #[test]
    fn test_nested_records_replace_wholesale() {
        let base = SettingsOverlay::builtin();
        let layer = SettingsOverlay {
            session: Some(BackendOverlay {
                host: Some("other:6380".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = layer.merged_over(base);
        let session = merged.session.unwrap();
        assert_eq!(session.host.as_deref(), Some("other:6380"));
        // the lower layer's backend type does not leak into the new record
        assert_eq!(session.kind, None);
        assert_eq!(session.db, None);
    }

    #[test]
    fn test_merge_order_is_lowest_to_highest() {
        let low = SettingsOverlay {
            host: Some("https://low.test".to_string()),
            database_template: Some("low_template".to_string()),
            ..Default::default()
        };
        let mid = SettingsOverlay {
            host: Some("https://mid.test".to_string()),
            ..Default::default()
        };
        let high = SettingsOverlay {
            host: Some("https://high.test".to_string()),
            ..Default::default()
        };

        let merged = SettingsOverlay::merge(vec![low, mid, high]);
        assert_eq!(merged.host.as_deref(), Some("https://high.test"));
        assert_eq!(merged.database_template.as_deref(), Some("low_template"));
    }
}
