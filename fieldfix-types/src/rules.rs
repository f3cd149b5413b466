use serde::{Deserialize, Serialize};

/// A per-field pattern that must match before any replacement touches an issue.
///
/// `pattern` is optional so that a rule written without one still parses and
/// can be rejected up front instead of silently passing every issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub field_name: String,

    #[serde(default, alias = "regex", skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl ValidationRule {
    pub fn new(field_name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            pattern: Some(pattern.into()),
        }
    }
}

/// A literal old/new substring pair applied to one named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementRule {
    pub field_name: String,
    pub old: String,
    pub new: String,
}

impl ReplacementRule {
    pub fn new(
        field_name: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Replacement and validation rules as written in a rules file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub replacements: Vec<ReplacementRule>,
    pub tests: Vec<ValidationRule>,
}

impl RuleSet {
    /// Append `other` after the rules already held. Order is preserved because
    /// tests short-circuit in the order supplied.
    pub fn extend(&mut self, other: RuleSet) {
        self.replacements.extend(other.replacements);
        self.tests.extend(other.tests);
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty() && self.tests.is_empty()
    }
}
