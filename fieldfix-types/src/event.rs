use crate::issue::ChangeSet;
use crate::summary::RunSummary;
use serde::{Deserialize, Serialize};

/// A staged field change, kept with its fetched value so reporters can show both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old: String,
    pub new: String,
}

/// Everything a run reports, in the order it happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Started {
        query: String,
        dry_run: bool,
    },
    Selected {
        count: u64,
    },
    Evaluating {
        key: String,
    },
    TestFieldMissing {
        key: String,
        field: String,
    },
    TestFailed {
        key: String,
        field: String,
    },
    ReplacementFieldsMissing {
        key: String,
        fields: Vec<String>,
    },
    NonTextFieldSkipped {
        key: String,
        field: String,
    },
    DryRunChanges {
        key: String,
        changes: Vec<FieldChange>,
    },
    Updated {
        key: String,
        fields: Vec<String>,
    },
    UpdateFailed {
        key: String,
        error: String,
    },
    Unchanged {
        key: String,
    },
    Finished(RunSummary),
}

impl RunEvent {
    /// Issue key the event is about, if any.
    pub fn issue_key(&self) -> Option<&str> {
        match self {
            RunEvent::Evaluating { key }
            | RunEvent::TestFieldMissing { key, .. }
            | RunEvent::TestFailed { key, .. }
            | RunEvent::ReplacementFieldsMissing { key, .. }
            | RunEvent::NonTextFieldSkipped { key, .. }
            | RunEvent::DryRunChanges { key, .. }
            | RunEvent::Updated { key, .. }
            | RunEvent::UpdateFailed { key, .. }
            | RunEvent::Unchanged { key } => Some(key),
            RunEvent::Started { .. } | RunEvent::Selected { .. } | RunEvent::Finished(_) => None,
        }
    }

    /// Warnings are per-issue problems; everything else is progress.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            RunEvent::TestFieldMissing { .. }
                | RunEvent::ReplacementFieldsMissing { .. }
                | RunEvent::NonTextFieldSkipped { .. }
                | RunEvent::UpdateFailed { .. }
        )
    }
}

/// Pair a change-set with the fetched values it replaces.
pub fn field_changes<'a>(
    changes: &ChangeSet,
    original: impl Fn(&str) -> Option<&'a str>,
) -> Vec<FieldChange> {
    changes
        .iter()
        .map(|(field, new)| FieldChange {
            field: field.clone(),
            old: original(field).unwrap_or_default().to_string(),
            new: new.clone(),
        })
        .collect()
}
