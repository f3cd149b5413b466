//! Embeddable core library for fieldfix.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking into
//! other tools or scripts.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`TicketStore`](ports::TicketStore): search issues and submit partial updates
//! - [`Reporter`](ports::Reporter): receive progress, warnings and the summary
//!
//! The [`adapters`] and [`jira`] modules provide default implementations.
//!
//! # Entry points
//!
//! - [`run`](pipeline::run): run against any ticket store
//! - [`run_remote`](pipeline::run_remote): connect to a Jira server, then run

pub mod adapters;
pub mod jira;
pub mod pipeline;
pub mod ports;
pub mod settings;

pub use fieldfix_domain::RuleError;
pub use fieldfix_types::{Issue, ReplacementRule, RunEvent, RunSummary, ValidationRule};
pub use pipeline::{RunError, run, run_remote};
