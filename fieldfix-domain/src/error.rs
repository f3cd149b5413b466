//! Error types for fieldfix-domain.
//!
//! Every variant here is a pre-flight abort: no issue is read once one occurs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    /// A validation rule was supplied without a pattern.
    #[error("test for field `{field_name}` has no pattern")]
    MissingPattern { field_name: String },

    /// A validation rule's pattern is not valid regex syntax.
    #[error("test for field `{field_name}` has invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        field_name: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A replacement rule has an empty `old` string.
    #[error("replacement for field `{field_name}` has an empty search string")]
    EmptyOld { field_name: String },
}

impl RuleError {
    pub fn field_name(&self) -> &str {
        match self {
            RuleError::MissingPattern { field_name }
            | RuleError::InvalidPattern { field_name, .. }
            | RuleError::EmptyOld { field_name } => field_name,
        }
    }
}
