//! Domain logic: decide what should happen to one issue.
//!
//! This crate owns *whether* an issue passes its tests and *what* its fields
//! would become. It never talks to a tracker; submitting changes is the job of
//! `fieldfix-core`.

mod compiler;
mod engine;
mod error;

pub use compiler::{CompiledTest, compile_tests};
pub use engine::{Engine, Evaluation, IssueVerdict, check_replacements, replace_literal};
pub use error::RuleError;
