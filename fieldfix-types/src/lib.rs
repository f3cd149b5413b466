//! Shared DTOs for the fieldfix workspace.
//!
//! # Design constraints
//! - Rules are deserialized from user-written TOML; keep field names stable.
//! - Issues are read-only snapshots; nothing here talks to a tracker.

pub mod event;
pub mod issue;
pub mod rules;
pub mod summary;

pub use event::{FieldChange, RunEvent};
pub use issue::{ChangeSet, FieldValue, Issue};
pub use rules::{ReplacementRule, RuleSet, ValidationRule};
pub use summary::RunSummary;
