//! Clap-free settings for a find-and-replace run.

use fieldfix_types::{ReplacementRule, ValidationRule};
use std::fmt;

/// What to select, what to require, what to replace.
#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    pub query: String,
    pub replacements: Vec<ReplacementRule>,
    pub tests: Vec<ValidationRule>,
    pub dry_run: bool,
}

/// How to reach the tracker.
#[derive(Clone)]
pub struct StoreSettings {
    pub server: String,
    pub username: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub page_size: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            server: String::new(),
            username: None,
            token: None,
            timeout_secs: 30,
            page_size: 100,
        }
    }
}

// Keep the token out of debug logs.
impl fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSettings")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("page_size", &self.page_size)
            .finish()
    }
}
