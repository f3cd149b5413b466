//! Default in-process port implementations.

use crate::ports::{Reporter, StoreError, TicketStore};
use fieldfix_render::{render_dry_run_changes, render_event};
use fieldfix_types::{ChangeSet, FieldValue, Issue, RunEvent};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// In-memory ticket store for embedding and testing.
///
/// Search ignores the query and returns every held issue. Successful updates
/// are written back into the held snapshots, so a second run sees them.
#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    issues: Mutex<Vec<Issue>>,
    search_error: Option<StoreError>,
    update_errors: BTreeMap<String, StoreError>,
    searches: Mutex<Vec<String>>,
    updates: Mutex<Vec<(String, ChangeSet)>>,
}

impl InMemoryTicketStore {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self {
            issues: Mutex::new(issues),
            ..Default::default()
        }
    }

    /// Make every search fail with `err`.
    pub fn with_search_error(mut self, err: StoreError) -> Self {
        self.search_error = Some(err);
        self
    }

    /// Make updates to `key` fail with `err`.
    pub fn with_update_error(mut self, key: impl Into<String>, err: StoreError) -> Self {
        self.update_errors.insert(key.into(), err);
        self
    }

    /// Queries seen so far.
    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Update calls seen so far, including rejected ones.
    pub fn updates(&self) -> Vec<(String, ChangeSet)> {
        self.updates.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Current snapshot of one held issue.
    pub fn issue(&self, key: &str) -> Option<Issue> {
        self.issues
            .lock()
            .ok()
            .and_then(|issues| issues.iter().find(|i| i.key == key).cloned())
    }
}

impl TicketStore for InMemoryTicketStore {
    fn search(&self, query: &str) -> Result<Vec<Issue>, StoreError> {
        if let Ok(mut searches) = self.searches.lock() {
            searches.push(query.to_string());
        }
        if let Some(err) = &self.search_error {
            return Err(err.clone());
        }
        self.issues
            .lock()
            .map(|issues| issues.clone())
            .map_err(|_| StoreError::Rejected {
                message: "issue store lock poisoned".to_string(),
            })
    }

    fn update(&self, key: &str, changes: &ChangeSet) -> Result<(), StoreError> {
        if let Ok(mut updates) = self.updates.lock() {
            updates.push((key.to_string(), changes.clone()));
        }
        if let Some(err) = self.update_errors.get(key) {
            return Err(err.clone());
        }
        let mut issues = self.issues.lock().map_err(|_| StoreError::Rejected {
            message: "issue store lock poisoned".to_string(),
        })?;
        let Some(issue) = issues.iter_mut().find(|i| i.key == key) else {
            return Err(StoreError::Api {
                status: 404,
                body: format!("issue {} does not exist", key),
            });
        };
        for (field, value) in changes {
            issue
                .fields
                .insert(field.clone(), FieldValue::Text(value.clone()));
        }
        Ok(())
    }
}

/// Bridges run events onto `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &RunEvent) {
        let message = render_event(event);
        match event {
            RunEvent::Evaluating { key } | RunEvent::Unchanged { key } => {
                debug!(issue = %key, "{}", message);
            }
            RunEvent::TestFailed { key, field } => {
                debug!(issue = %key, field = %field, "{}", message);
            }
            RunEvent::DryRunChanges { key, changes } => {
                info!(issue = %key, "{}", message);
                info!("\n{}", render_dry_run_changes(key, changes));
            }
            RunEvent::Finished(summary) => {
                info!(
                    selected = summary.selected,
                    failed_tests = summary.failed_tests,
                    changed = summary.changed,
                    unchanged = summary.unchanged,
                    failed = summary.failed,
                    would_change = summary.would_change,
                    "{}",
                    message
                );
            }
            ev if ev.is_warning() => match ev.issue_key() {
                Some(key) => warn!(issue = %key, "{}", message),
                None => warn!("{}", message),
            },
            ev => match ev.issue_key() {
                Some(key) => info!(issue = %key, "{}", message),
                None => info!("{}", message),
            },
        }
    }
}

/// Captures events in memory for tests and embedders.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &RunEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn issue(key: &str, summary: &str) -> Issue {
        Issue::new(key).with_field("summary", summary)
    }

    #[test]
    fn in_memory_search_records_query_and_returns_all() {
        let store = InMemoryTicketStore::new(vec![issue("A-1", "x"), issue("A-2", "y")]);
        let found = store.search("project = A").expect("search");
        assert_eq!(found.len(), 2);
        assert_eq!(store.searches(), vec!["project = A".to_string()]);
    }

    #[test]
    fn in_memory_update_writes_back() {
        let store = InMemoryTicketStore::new(vec![issue("A-1", "old")]);
        let changes = ChangeSet::from([("summary".to_string(), "new".to_string())]);
        store.update("A-1", &changes).expect("update");

        let updated = store.issue("A-1").expect("issue");
        assert_eq!(
            updated.field("summary").and_then(FieldValue::as_text),
            Some("new")
        );
        assert_eq!(store.updates(), vec![("A-1".to_string(), changes)]);
    }

    #[test]
    fn in_memory_update_of_unknown_issue_is_404() {
        let store = InMemoryTicketStore::new(vec![]);
        let err = store
            .update("NOPE-1", &ChangeSet::new())
            .expect_err("missing issue");
        assert!(matches!(err, StoreError::Api { status: 404, .. }));
    }

    #[test]
    fn in_memory_injected_errors() {
        let store = InMemoryTicketStore::new(vec![issue("A-1", "x")])
            .with_search_error(StoreError::Transport {
                message: "down".to_string(),
            })
            .with_update_error(
                "A-1",
                StoreError::Api {
                    status: 403,
                    body: "forbidden".to_string(),
                },
            );
        assert!(store.search("q").is_err());
        assert!(store.update("A-1", &ChangeSet::new()).is_err());
        assert_eq!(store.updates().len(), 1);
        assert_eq!(
            store.issue("A-1").and_then(|i| i.field("summary").cloned()),
            Some(FieldValue::from("x"))
        );
    }
}
