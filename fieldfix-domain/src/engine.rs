use crate::compiler::{CompiledTest, compile_tests};
use crate::error::RuleError;
use fieldfix_types::{ChangeSet, FieldValue, Issue, ReplacementRule, ValidationRule};
use std::collections::BTreeSet;

/// What should happen to one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueVerdict {
    /// A tested field is absent from the issue.
    TestFieldMissing { field: String },
    /// A tested field is present but its pattern did not match.
    TestFailed { field: String },
    /// Replacement rules name fields the issue does not have (sorted).
    ReplacementFieldsMissing { fields: Vec<String> },
    /// Tests passed and replacements were computed.
    Evaluated(Evaluation),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Fields whose text differs from the fetched value.
    pub changes: ChangeSet,
    /// Replacement fields skipped because their value is not text.
    pub skipped_non_text: Vec<String>,
}

impl Evaluation {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Compiled tests plus replacement rules, evaluated against one issue at a time.
#[derive(Debug, Clone)]
pub struct Engine {
    tests: Vec<CompiledTest>,
    replacements: Vec<ReplacementRule>,
}

impl Engine {
    /// Compile `tests` up front. Fails without evaluating anything if any rule
    /// is malformed.
    pub fn new(
        tests: &[ValidationRule],
        replacements: Vec<ReplacementRule>,
    ) -> Result<Self, RuleError> {
        let tests = compile_tests(tests)?;
        check_replacements(&replacements)?;
        Ok(Self {
            tests,
            replacements,
        })
    }

    pub fn tests(&self) -> &[CompiledTest] {
        &self.tests
    }

    pub fn replacements(&self) -> &[ReplacementRule] {
        &self.replacements
    }

    pub fn evaluate(&self, issue: &Issue) -> IssueVerdict {
        for test in &self.tests {
            let Some(value) = issue.field(&test.field_name) else {
                return IssueVerdict::TestFieldMissing {
                    field: test.field_name.clone(),
                };
            };
            let passed = value.as_text().is_some_and(|text| test.matches(text));
            if !passed {
                return IssueVerdict::TestFailed {
                    field: test.field_name.clone(),
                };
            }
        }

        let missing: BTreeSet<&str> = self
            .replacements
            .iter()
            .map(|r| r.field_name.as_str())
            .filter(|name| !issue.has_field(name))
            .collect();
        if !missing.is_empty() {
            return IssueVerdict::ReplacementFieldsMissing {
                fields: missing.into_iter().map(str::to_string).collect(),
            };
        }

        IssueVerdict::Evaluated(self.compute_changes(issue))
    }

    fn compute_changes(&self, issue: &Issue) -> Evaluation {
        let mut eval = Evaluation::default();
        for rule in &self.replacements {
            let original = match issue.field(&rule.field_name) {
                Some(FieldValue::Text(text)) => text.as_str(),
                Some(FieldValue::Other(_)) => {
                    if !eval.skipped_non_text.contains(&rule.field_name) {
                        eval.skipped_non_text.push(rule.field_name.clone());
                    }
                    continue;
                }
                None => continue,
            };

            // Every rule reads the fetched value; the last rule that changes a field wins.
            let replaced = replace_literal(original, &rule.old, &rule.new);
            if replaced != original {
                eval.changes.insert(rule.field_name.clone(), replaced);
            }
        }
        eval
    }
}

/// Fail on the first replacement rule whose `old` is empty.
pub fn check_replacements(rules: &[ReplacementRule]) -> Result<(), RuleError> {
    match rules.iter().find(|r| r.old.is_empty()) {
        Some(rule) => Err(RuleError::EmptyOld {
            field_name: rule.field_name.clone(),
        }),
        None => Ok(()),
    }
}

/// Replace every occurrence of `old` with `new`, verbatim. An empty `old`
/// matches nothing.
pub fn replace_literal(value: &str, old: &str, new: &str) -> String {
    if old.is_empty() {
        return value.to_string();
    }
    value.replace(old, new)
}
