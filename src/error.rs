//! Configuration Error Types
//!
//! Every violation found while loading is fatal: errors propagate unchanged
//! to the process entry point, which reports and exits. Validation is
//! fail-fast: the first violation found is returned, never a collection.
//!
//! Secret material (master password hash, OAuth client secret) never appears
//! in error text; hash validation reports expected format and observed
//! length only.

use std::fmt;
use std::path::Path;

use figment::error::Kind;
use thiserror::Error;

/// Error produced while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field was absent from every override layer
    #[error("missing required field `{field}`")]
    MissingField {
        /// Dotted path of the field, e.g. `session.type`
        field: String,
    },

    /// A field was present but had the wrong shape
    #[error("invalid type for `{field}`: {detail}")]
    InvalidType { field: String, detail: String },

    /// A field had the right shape but a semantically invalid value
    #[error("invalid value for `{field}`: {detail}")]
    InvalidValue { field: String, detail: String },

    /// An override file could not be read or parsed
    #[error("unreadable config source `{path}`: {detail}")]
    UnreadableSource { path: String, detail: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn unreadable(path: &Path, detail: impl fmt::Display) -> Self {
        Self::UnreadableSource {
            path: path.display().to_string(),
            detail: detail.to_string(),
        }
    }

    /// Map a figment extraction error onto the taxonomy.
    ///
    /// `source` names the file being extracted, if any; parse-level failures
    /// (malformed TOML) are reported against it as `UnreadableSource`.
    pub(crate) fn from_figment(err: figment::Error, source: Option<&Path>) -> Self {
        let field = if err.path.is_empty() {
            String::from("configuration")
        } else {
            err.path.join(".")
        };

        match &err.kind {
            Kind::MissingField(name) => Self::MissingField {
                field: name.to_string(),
            },
            Kind::InvalidType(actual, expected) => Self::InvalidType {
                field,
                detail: format!("expected {expected}, found {actual}"),
            },
            Kind::InvalidValue(actual, expected) => Self::InvalidValue {
                field,
                detail: format!("expected {expected}, found {actual}"),
            },
            Kind::UnknownVariant(variant, expected) => Self::InvalidValue {
                field,
                detail: format!(
                    "unknown variant `{variant}`, expected one of: {}",
                    expected.join(", ")
                ),
            },
            Kind::Message(message) => match source {
                Some(path) => Self::UnreadableSource {
                    path: path.display().to_string(),
                    detail: message.clone(),
                },
                None => Self::InvalidValue {
                    field,
                    detail: message.clone(),
                },
            },
            _ => Self::InvalidValue {
                field,
                detail: err.to_string(),
            },
        }
    }

    /// Dotted path of the offending field, when the variant carries one
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field }
            | Self::InvalidType { field, .. }
            | Self::InvalidValue { field, .. } => Some(field),
            Self::UnreadableSource { .. } => None,
        }
    }
}
