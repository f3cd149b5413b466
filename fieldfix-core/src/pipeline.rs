//! The find-and-replace pipeline.
//!
//! Compile tests, select issues, evaluate and apply each one, summarize.
//! All tracker access goes through the port traits.

use crate::jira::JiraStore;
use crate::ports::{Reporter, StoreError, TicketStore};
use crate::settings::{RunSettings, StoreSettings};
use fieldfix_domain::{Engine, IssueVerdict, RuleError};
use fieldfix_types::event::field_changes;
use fieldfix_types::{FieldValue, Issue, RunEvent, RunSummary};
use tracing::debug;

/// Error type for a run. Exit code 2 = aborted before start, 1 = tool error.
///
/// Per-issue problems never surface here; they are reported and tallied.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// A validation rule is malformed; no issue was read.
    #[error("aborting find and replace: {0}")]
    Rules(#[from] RuleError),

    /// The tracker could not be reached or configured.
    #[error("cannot connect to ticket store: {0}")]
    Connect(#[source] StoreError),

    /// Issue selection failed; no issue was processed.
    #[error("issue search failed: {0}")]
    Search(#[source] StoreError),
}

impl RunError {
    /// True when the run stopped before selecting any issue because of a bad rule.
    pub fn is_abort(&self) -> bool {
        matches!(self, RunError::Rules(_))
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Rules(_) => 2,
            RunError::Connect(_) | RunError::Search(_) => 1,
        }
    }
}

/// Run against any ticket store.
pub fn run(
    settings: &RunSettings,
    store: &dyn TicketStore,
    reporter: &dyn Reporter,
) -> Result<RunSummary, RunError> {
    let engine = Engine::new(&settings.tests, settings.replacements.clone())?;
    execute(&engine, settings, store, reporter)
}

/// Compile tests, then connect to the configured Jira server and run.
///
/// The connection is only built once every test has compiled.
pub fn run_remote(
    settings: &RunSettings,
    store_settings: &StoreSettings,
    reporter: &dyn Reporter,
) -> Result<RunSummary, RunError> {
    let engine = Engine::new(&settings.tests, settings.replacements.clone())?;
    let store = JiraStore::from_settings(store_settings).map_err(RunError::Connect)?;
    execute(&engine, settings, &store, reporter)
}

fn execute(
    engine: &Engine,
    settings: &RunSettings,
    store: &dyn TicketStore,
    reporter: &dyn Reporter,
) -> Result<RunSummary, RunError> {
    reporter.report(&RunEvent::Started {
        query: settings.query.clone(),
        dry_run: settings.dry_run,
    });

    let issues = store.search(&settings.query).map_err(RunError::Search)?;

    let mut summary = RunSummary {
        selected: issues.len() as u64,
        ..Default::default()
    };
    reporter.report(&RunEvent::Selected {
        count: summary.selected,
    });

    for issue in &issues {
        process_issue(engine, issue, settings.dry_run, store, reporter, &mut summary);
    }

    debug_assert_eq!(summary.accounted(), summary.selected);
    reporter.report(&RunEvent::Finished(summary));
    Ok(summary)
}

fn process_issue(
    engine: &Engine,
    issue: &Issue,
    dry_run: bool,
    store: &dyn TicketStore,
    reporter: &dyn Reporter,
    summary: &mut RunSummary,
) {
    let key = issue.key.clone();
    reporter.report(&RunEvent::Evaluating { key: key.clone() });

    let eval = match engine.evaluate(issue) {
        IssueVerdict::TestFieldMissing { field } => {
            reporter.report(&RunEvent::TestFieldMissing { key, field });
            summary.failed_tests += 1;
            return;
        }
        IssueVerdict::TestFailed { field } => {
            reporter.report(&RunEvent::TestFailed { key, field });
            summary.failed_tests += 1;
            return;
        }
        IssueVerdict::ReplacementFieldsMissing { fields } => {
            reporter.report(&RunEvent::ReplacementFieldsMissing { key, fields });
            summary.failed += 1;
            return;
        }
        IssueVerdict::Evaluated(eval) => eval,
    };

    for field in &eval.skipped_non_text {
        reporter.report(&RunEvent::NonTextFieldSkipped {
            key: key.clone(),
            field: field.clone(),
        });
    }

    if !eval.has_changes() {
        reporter.report(&RunEvent::Unchanged { key });
        summary.unchanged += 1;
        return;
    }

    if dry_run {
        let changes = field_changes(&eval.changes, |f| {
            issue.field(f).and_then(FieldValue::as_text)
        });
        reporter.report(&RunEvent::DryRunChanges { key, changes });
        summary.would_change += 1;
        return;
    }

    match store.update(&key, &eval.changes) {
        Ok(()) => {
            summary.changed += 1;
            reporter.report(&RunEvent::Updated {
                key,
                fields: eval.changes.keys().cloned().collect(),
            });
        }
        Err(err) => {
            debug!(issue = %key, error = ?err, "update rejected");
            summary.failed += 1;
            reporter.report(&RunEvent::UpdateFailed {
                key,
                error: err.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryTicketStore, RecordingReporter};
    use fieldfix_types::{ChangeSet, ReplacementRule, ValidationRule};
    use pretty_assertions::assert_eq;

    fn build_issue() -> Issue {
        Issue::new("OPS-1")
            .with_field("summary", "Build v1.2 failed")
            .with_field("status", "Closed")
    }

    fn settings(replacements: Vec<ReplacementRule>, tests: Vec<ValidationRule>) -> RunSettings {
        RunSettings {
            query: "project = OPS".to_string(),
            replacements,
            tests,
            dry_run: false,
        }
    }

    fn bump() -> Vec<ReplacementRule> {
        vec![ReplacementRule::new("summary", "v1.2", "v1.3")]
    }

    #[test]
    fn changes_issue_and_submits_update() {
        let store = InMemoryTicketStore::new(vec![build_issue()]);
        let reporter = RecordingReporter::new();

        let summary = run(&settings(bump(), vec![]), &store, &reporter).expect("run");

        assert_eq!(summary.changed, 1);
        assert_eq!(summary.selected, 1);
        assert_eq!(
            store.updates(),
            vec![(
                "OPS-1".to_string(),
                ChangeSet::from([("summary".to_string(), "Build v1.3 failed".to_string())])
            )]
        );
        assert!(reporter.events().contains(&RunEvent::Updated {
            key: "OPS-1".to_string(),
            fields: vec!["summary".to_string()],
        }));
    }

    #[test]
    fn absent_substring_is_unchanged() {
        let store = InMemoryTicketStore::new(vec![build_issue()]);
        let reporter = RecordingReporter::new();
        let rules = vec![ReplacementRule::new("summary", "v9.9", "v1.3")];

        let summary = run(&settings(rules, vec![]), &store, &reporter).expect("run");

        assert_eq!(summary.unchanged, 1);
        assert!(store.updates().is_empty());
    }

    #[test]
    fn failing_test_skips_update() {
        let store = InMemoryTicketStore::new(vec![build_issue()]);
        let reporter = RecordingReporter::new();
        let tests = vec![ValidationRule::new("status", "Open")];

        let summary = run(&settings(bump(), tests), &store, &reporter).expect("run");

        assert_eq!(summary.failed_tests, 1);
        assert_eq!(summary.changed, 0);
        assert!(store.updates().is_empty());
    }

    #[test]
    fn events_follow_run_order() {
        let store = InMemoryTicketStore::new(vec![build_issue()]);
        let reporter = RecordingReporter::new();

        let summary = run(&settings(bump(), vec![]), &store, &reporter).expect("run");

        let events = reporter.events();
        assert_eq!(
            events.first(),
            Some(&RunEvent::Started {
                query: "project = OPS".to_string(),
                dry_run: false,
            })
        );
        assert_eq!(events.get(1), Some(&RunEvent::Selected { count: 1 }));
        assert_eq!(events.last(), Some(&RunEvent::Finished(summary)));
    }

    #[test]
    fn rules_error_exit_code_is_2() {
        let err = RunError::from(RuleError::MissingPattern {
            field_name: "status".to_string(),
        });
        assert!(err.is_abort());
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("aborting"));

        let err = RunError::Search(StoreError::Transport {
            message: "down".to_string(),
        });
        assert!(!err.is_abort());
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn run_remote_rejects_bad_rules_before_connecting() {
        let reporter = RecordingReporter::new();
        let tests = vec![ValidationRule::new("status", "(")];
        // An empty server would fail to connect; the rule error must win.
        let err = run_remote(
            &settings(bump(), tests),
            &StoreSettings::default(),
            &reporter,
        )
        .expect_err("abort");
        assert!(err.is_abort());
        assert!(reporter.events().is_empty());
    }

    #[test]
    fn run_remote_without_server_is_connect_error() {
        let reporter = RecordingReporter::new();
        let err = run_remote(&settings(bump(), vec![]), &StoreSettings::default(), &reporter)
            .expect_err("no server");
        assert!(matches!(err, RunError::Connect(_)));
        assert_eq!(err.exit_code(), 1);
    }
}
