//! Rendering helpers (plain text) for run progress and summaries.

use diffy::PatchFormatter;
use fieldfix_types::{FieldChange, RunEvent, RunSummary};

/// One line per event, in the wording operators see on the console.
pub fn render_event(event: &RunEvent) -> String {
    match event {
        RunEvent::Started { query, dry_run } => {
            let mode = if *dry_run { " (dry run)" } else { "" };
            format!("find and replace over `{}`{}", query, mode)
        }
        RunEvent::Selected { count } => format!("evaluating {} issues", count),
        RunEvent::Evaluating { key } => format!("evaluating {}", key),
        RunEvent::TestFieldMissing { key, field } => format!(
            "issue {} does not have field {}; treating the test as failed and skipping",
            key, field
        ),
        RunEvent::TestFailed { key, field } => {
            format!("issue {} failed test on field {}", key, field)
        }
        RunEvent::ReplacementFieldsMissing { key, fields } => format!(
            "issue {} is missing replacement fields {}; skipping",
            key,
            fields.join(",")
        ),
        RunEvent::NonTextFieldSkipped { key, field } => format!(
            "skipping field {} on issue {}: value is null or not text",
            field, key
        ),
        RunEvent::DryRunChanges { key, changes } => {
            let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
            format!("dry run: issue {} has changes to {}", key, fields.join(","))
        }
        RunEvent::Updated { key, fields } => {
            format!("{} fields {} have been updated", key, fields.join(","))
        }
        RunEvent::UpdateFailed { key, error } => {
            format!("failed to update issue {}: {}", key, error)
        }
        RunEvent::Unchanged { key } => format!("{} unchanged", key),
        RunEvent::Finished(summary) => render_summary_line(summary),
    }
}

/// The single summary line printed when a run finishes.
pub fn render_summary_line(summary: &RunSummary) -> String {
    let mut line = format!(
        "Summary - issues selected: {}, issues which failed tests: {}, changed issues: {}, unchanged issues: {}, failed issues: {}",
        summary.selected, summary.failed_tests, summary.changed, summary.unchanged, summary.failed
    );
    if summary.would_change > 0 {
        line.push_str(&format!(
            ", issues with dry-run changes: {}",
            summary.would_change
        ));
    }
    line
}

/// Unified diff of one staged field change, headed by `key/field`.
pub fn render_field_diff(key: &str, change: &FieldChange) -> String {
    let mut out = String::new();
    out.push_str(&format!("--- a/{0}/{1}\n+++ b/{0}/{1}\n", key, change.field));

    let old = with_trailing_newline(&change.old);
    let new = with_trailing_newline(&change.new);
    let patch = diffy::create_patch(&old, &new);
    let formatted = PatchFormatter::new().fmt_patch(&patch).to_string();
    // Drop diffy's own original/modified header.
    for line in formatted.lines().skip(2) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

// Single-line fields carry no newline; diffy would flag both sides.
fn with_trailing_newline(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{}\n", text)
    }
}

/// All staged changes of a dry-run issue as one block of diffs.
pub fn render_dry_run_changes(key: &str, changes: &[FieldChange]) -> String {
    let mut out = String::new();
    for change in changes {
        out.push_str(&render_field_diff(key, change));
    }
    out
}
