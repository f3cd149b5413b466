use crate::error::RuleError;
use fieldfix_types::ValidationRule;
use regex::Regex;
use tracing::debug;

/// A validation rule whose pattern has been compiled.
#[derive(Debug, Clone)]
pub struct CompiledTest {
    pub field_name: String,
    pub matcher: Regex,
}

impl CompiledTest {
    /// Unanchored search: the pattern may match anywhere in the value.
    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

/// Compile every rule in order, stopping at the first malformed one.
pub fn compile_tests(rules: &[ValidationRule]) -> Result<Vec<CompiledTest>, RuleError> {
    let mut out = Vec::with_capacity(rules.len());
    for rule in rules {
        let Some(pattern) = rule.pattern.as_deref() else {
            return Err(RuleError::MissingPattern {
                field_name: rule.field_name.clone(),
            });
        };
        let matcher = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            field_name: rule.field_name.clone(),
            pattern: pattern.to_string(),
            source,
        })?;
        debug!(field = %rule.field_name, pattern, "compiled test");
        out.push(CompiledTest {
            field_name: rule.field_name.clone(),
            matcher,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_in_order() {
        let rules = vec![
            ValidationRule::new("status", "^Open$"),
            ValidationRule::new("summary", r"v\d+\.\d+"),
        ];
        let compiled = compile_tests(&rules).expect("compile");
        assert_eq!(compiled.len(), 2);
        assert_eq!(compiled[0].field_name, "status");
        assert!(compiled[1].matches("Build v1.2 failed"));
        assert!(!compiled[0].matches("Reopened"));
    }

    #[test]
    fn search_is_unanchored() {
        let compiled = compile_tests(&[ValidationRule::new("status", "Open")]).expect("compile");
        assert!(compiled[0].matches("Reopened"));
    }

    #[test]
    fn missing_pattern_aborts() {
        let rules = vec![
            ValidationRule::new("status", "Open"),
            ValidationRule {
                field_name: "labels".to_string(),
                pattern: None,
            },
        ];
        let err = compile_tests(&rules).expect_err("missing pattern");
        assert!(matches!(err, RuleError::MissingPattern { ref field_name } if field_name == "labels"));
    }

    #[test]
    fn invalid_pattern_aborts_even_after_valid_ones() {
        let rules = vec![
            ValidationRule::new("status", "Open"),
            ValidationRule::new("summary", "[unclosed"),
            ValidationRule {
                field_name: "never-reached".to_string(),
                pattern: None,
            },
        ];
        let err = compile_tests(&rules).expect_err("invalid pattern");
        assert_eq!(err.field_name(), "summary");
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
    }

    #[test]
    fn empty_rules_compile_to_nothing() {
        assert!(compile_tests(&[]).expect("compile").is_empty());
    }
}
