//! Blocking REST client for Jira-compatible trackers.
//!
//! Wraps the v2 REST API (issue search and issue edit) using
//! [`reqwest::blocking`]. Search pages through every result; there is no cap.

use crate::ports::{StoreError, TicketStore};
use crate::settings::StoreSettings;
use fieldfix_types::{ChangeSet, FieldValue, Issue};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// One page of `GET /rest/api/2/search`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub issues: Vec<RawIssue>,
}

#[derive(Debug, Deserialize)]
pub struct RawIssue {
    pub key: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl From<RawIssue> for Issue {
    fn from(raw: RawIssue) -> Self {
        Issue {
            key: raw.key,
            fields: raw
                .fields
                .into_iter()
                .map(|(name, value)| (name, FieldValue::from(value)))
                .collect(),
        }
    }
}

/// Walk pages from offset 0 until `total` issues or an empty page are seen.
pub fn collect_pages<F>(mut fetch: F) -> Result<Vec<Issue>, StoreError>
where
    F: FnMut(u64) -> Result<SearchPage, StoreError>,
{
    let mut out: Vec<Issue> = Vec::new();
    let mut start_at = 0u64;
    loop {
        let page = fetch(start_at)?;
        let received = page.issues.len() as u64;
        debug!(start_at, received, total = page.total, "search page");
        out.extend(page.issues.into_iter().map(Issue::from));
        start_at += received;
        if received == 0 || start_at >= page.total {
            break;
        }
    }
    Ok(out)
}

/// HTTP client for a single tracker instance.
#[derive(Debug, Clone)]
pub struct JiraStore {
    client: reqwest::blocking::Client,
    base_url: String,
    username: Option<String>,
    token: Option<String>,
    page_size: u32,
}

impl JiraStore {
    pub fn from_settings(settings: &StoreSettings) -> Result<Self, StoreError> {
        let base_url = settings.server.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StoreError::Rejected {
                message: "no server url configured".to_string(),
            });
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| StoreError::Transport {
                message: e.to_string(),
            })?;
        Ok(Self::with_client(client, base_url, settings))
    }

    /// Reuse an existing client (connection pool, custom TLS roots).
    pub fn with_client(
        client: reqwest::blocking::Client,
        base_url: String,
        settings: &StoreSettings,
    ) -> Self {
        Self {
            client,
            base_url,
            username: settings.username.clone(),
            token: settings.token.clone(),
            page_size: settings.page_size.max(1),
        }
    }

    pub fn search_url(&self) -> String {
        format!("{}/rest/api/2/search", self.base_url)
    }

    pub fn issue_url(&self, key: &str) -> String {
        format!("{}/rest/api/2/issue/{}", self.base_url, key)
    }

    fn authorize(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match (&self.username, &self.token) {
            (Some(user), token) => request.basic_auth(user, token.as_ref()),
            (None, Some(token)) => request.bearer_auth(token),
            (None, None) => request,
        }
    }

    /// One authorized search page request, not yet sent.
    pub fn search_request(
        &self,
        query: &str,
        start_at: u64,
    ) -> reqwest::blocking::RequestBuilder {
        let params = [
            ("jql", query.to_string()),
            ("startAt", start_at.to_string()),
            ("maxResults", self.page_size.to_string()),
            ("fields", "*all".to_string()),
        ];
        self.authorize(self.client.get(self.search_url()).query(&params))
    }

    /// Authorized partial update `{"fields": {name: text}}`, not yet sent.
    pub fn update_request(
        &self,
        key: &str,
        changes: &ChangeSet,
    ) -> reqwest::blocking::RequestBuilder {
        let body = serde_json::json!({ "fields": changes });
        self.authorize(self.client.put(self.issue_url(key)).json(&body))
    }

    fn fetch_page(&self, query: &str, start_at: u64) -> Result<SearchPage, StoreError> {
        let response = self
            .search_request(query, start_at)
            .send()
            .map_err(transport)?;
        let response = ensure_success(response)?;
        response.json::<SearchPage>().map_err(|e| StoreError::Decode {
            message: e.to_string(),
        })
    }
}

impl TicketStore for JiraStore {
    fn search(&self, query: &str) -> Result<Vec<Issue>, StoreError> {
        collect_pages(|start_at| self.fetch_page(query, start_at))
    }

    fn update(&self, key: &str, changes: &ChangeSet) -> Result<(), StoreError> {
        let response = self
            .update_request(key, changes)
            .send()
            .map_err(transport)?;
        ensure_success(response)?;
        Ok(())
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport {
        message: err.to_string(),
    }
}

/// Return the response unchanged on success, or an `Api` error carrying the
/// status and body text.
fn ensure_success(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(StoreError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}
