//! Source adapter: the lead store.
//!
//! The source exposes a paginated list endpoint (opaque `offset`
//! continuation token), a partial-update endpoint per record, and a
//! free-text notes field the adapter can append to. Records decode
//! defensively; one malformed record never fails a fetch.

use crate::config::SourceConfig;
use crate::error::{SyncError, SyncResult};
use crate::http::{ApiRequest, ApiResponse, HttpClient};
use crate::retry::{call_with_retry, RetryPolicy};
use leadsync_model::{Lead, LeadStatus};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, warn};
use url::Url;

/// The engine's view of the lead store.
pub trait LeadSource: Send + Sync {
    /// Fetches every lead, following pagination until exhausted.
    fn list_leads(&self) -> SyncResult<Vec<Lead>>;

    /// Idempotent partial update of exactly the status field.
    fn update_lead_status(&self, lead_id: &str, status: LeadStatus) -> SyncResult<()>;

    /// Best-effort append to the lead's free-text notes.
    ///
    /// Callers log a warning and swallow failures; an append must never
    /// abort a reconciliation pass.
    fn append_note(&self, lead_id: &str, text: &str) -> SyncResult<()>;
}

/// Decodes the source's three-value status select.
///
/// Anything unrecognized or missing defaults to `New`.
fn decode_wire_status(raw: Option<&str>) -> LeadStatus {
    match raw {
        Some("Todo") => LeadStatus::New,
        Some("In progress") => LeadStatus::Contacted,
        Some("Done") => LeadStatus::Qualified,
        _ => LeadStatus::New,
    }
}

/// Encodes a lead status into the source's select vocabulary.
///
/// `Lost` collapses to `Done`; the source has no terminal value of its own.
fn encode_wire_status(status: LeadStatus) -> &'static str {
    match status {
        LeadStatus::New => "Todo",
        LeadStatus::Contacted => "In progress",
        LeadStatus::Qualified | LeadStatus::Lost => "Done",
    }
}

/// REST implementation of [`LeadSource`].
pub struct RestLeadSource<C: HttpClient> {
    config: SourceConfig,
    retry: RetryPolicy,
    client: C,
}

impl<C: HttpClient> RestLeadSource<C> {
    /// Creates an adapter over the given client.
    pub fn new(config: SourceConfig, retry: RetryPolicy, client: C) -> Self {
        Self {
            config,
            retry,
            client,
        }
    }

    /// Builds `{api_url}/{base_id}/{table}[/{record_id}]` with proper
    /// path-segment encoding.
    fn record_url(&self, lead_id: Option<&str>) -> Result<String, String> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| format!("invalid source api url: {e}"))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| "source api url cannot be a base".to_string())?;
            segments.pop_if_empty();
            segments.push(&self.config.base_id);
            segments.push(&self.config.table);
            if let Some(id) = lead_id {
                segments.push(id);
            }
        }
        Ok(url.to_string())
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.config.api_token)
    }

    fn check(&self, operation: &str, response: ApiResponse) -> Result<ApiResponse, String> {
        if response.is_success() {
            Ok(response)
        } else {
            error!(
                operation,
                status = response.status,
                body = %response.body,
                "source request failed"
            );
            Err(format!("status {}: {}", response.status, response.body))
        }
    }

    fn fetch_page(&self, offset: Option<&str>) -> SyncResult<Value> {
        call_with_retry(&self.retry, "source list page", || {
            let url = self.record_url(None)?;
            let mut request = ApiRequest::get(url)
                .header("Authorization", self.bearer())
                .header("Content-Type", "application/json");
            if let Some(token) = offset {
                request = request.query("offset", token);
            }
            let response = self.client.send(&request)?;
            self.check("source list page", response)?.json()
        })
    }

    fn decode_record(&self, record: &Value) -> Option<Lead> {
        let Some(id) = record.get("id").and_then(Value::as_str) else {
            warn!(?record, "skipping source record without id");
            return None;
        };

        let fields = record.get("fields").cloned().unwrap_or_else(|| json!({}));
        let text = |key: &str| -> Option<String> {
            fields
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        // The source reuses its notes column for contacts entered before
        // the email field existed.
        let email = text("Email").or_else(|| text("Notes")).unwrap_or_default();
        let status = decode_wire_status(fields.get("Status").and_then(Value::as_str));

        Some(Lead {
            id: id.to_string(),
            name: text("Name").unwrap_or_default(),
            email,
            status,
            source: text("Source"),
        })
    }
}

impl<C: HttpClient> LeadSource for RestLeadSource<C> {
    fn list_leads(&self) -> SyncResult<Vec<Lead>> {
        let mut leads = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let page = self.fetch_page(offset.as_deref())?;

            if let Some(records) = page.get("records").and_then(Value::as_array) {
                leads.extend(records.iter().filter_map(|r| self.decode_record(r)));
            }

            offset = page
                .get("offset")
                .and_then(Value::as_str)
                .map(str::to_string);
            if offset.is_none() {
                break;
            }
        }

        Ok(leads)
    }

    fn update_lead_status(&self, lead_id: &str, status: LeadStatus) -> SyncResult<()> {
        call_with_retry(&self.retry, "source status update", || {
            let url = self.record_url(Some(lead_id))?;
            let payload = json!({"fields": {"Status": encode_wire_status(status)}});
            let request = ApiRequest::patch(url)
                .header("Authorization", self.bearer())
                .header("Content-Type", "application/json")
                .json(payload);
            let response = self.client.send(&request)?;
            self.check("source status update", response)?;
            Ok(())
        })
    }

    fn append_note(&self, lead_id: &str, text: &str) -> SyncResult<()> {
        call_with_retry(&self.retry, "source note append", || {
            let url = self.record_url(Some(lead_id))?;

            // Read-modify-write; the source has no append primitive.
            let read = ApiRequest::get(url.clone())
                .header("Authorization", self.bearer())
                .header("Content-Type", "application/json");
            let response = self.client.send(&read)?;
            let record = self.check("source note append", response)?.json()?;
            let existing = record
                .pointer("/fields/Notes")
                .and_then(Value::as_str)
                .unwrap_or("");
            let combined = if existing.is_empty() {
                text.to_string()
            } else {
                format!("{existing}\n{text}")
            };

            let write = ApiRequest::patch(url)
                .header("Authorization", self.bearer())
                .header("Content-Type", "application/json")
                .json(json!({"fields": {"Notes": combined}}));
            let response = self.client.send(&write)?;
            self.check("source note append", response)?;
            Ok(())
        })
    }
}

/// An in-memory lead source for testing.
#[derive(Default)]
pub struct MemoryLeadSource {
    leads: Mutex<Vec<Lead>>,
    appended_notes: Mutex<Vec<(String, String)>>,
    fail_list: AtomicBool,
    fail_appends: AtomicBool,
    fail_updates_for: Mutex<HashSet<String>>,
}

impl MemoryLeadSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source seeded with leads.
    pub fn with_leads(leads: Vec<Lead>) -> Self {
        let source = Self::new();
        *source.leads.lock() = leads;
        source
    }

    /// Adds a lead.
    pub fn insert(&self, lead: Lead) {
        self.leads.lock().push(lead);
    }

    /// Returns a lead by id.
    pub fn lead(&self, lead_id: &str) -> Option<Lead> {
        self.leads.lock().iter().find(|l| l.id == lead_id).cloned()
    }

    /// All audit notes appended so far, as `(lead_id, text)` pairs.
    pub fn appended_notes(&self) -> Vec<(String, String)> {
        self.appended_notes.lock().clone()
    }

    /// Makes `list_leads` fail.
    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Makes `append_note` fail.
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Makes `update_lead_status` fail for one lead id.
    pub fn fail_updates_for(&self, lead_id: &str) {
        self.fail_updates_for.lock().insert(lead_id.to_string());
    }
}

impl LeadSource for MemoryLeadSource {
    fn list_leads(&self) -> SyncResult<Vec<Lead>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(SyncError::upstream(
                "source list page",
                3,
                "injected list failure",
            ));
        }
        Ok(self.leads.lock().clone())
    }

    fn update_lead_status(&self, lead_id: &str, status: LeadStatus) -> SyncResult<()> {
        if self.fail_updates_for.lock().contains(lead_id) {
            return Err(SyncError::upstream(
                "source status update",
                3,
                "injected update failure",
            ));
        }
        let mut leads = self.leads.lock();
        match leads.iter_mut().find(|l| l.id == lead_id) {
            Some(lead) => {
                lead.status = status;
                Ok(())
            }
            None => Err(SyncError::upstream(
                "source status update",
                1,
                format!("record {lead_id} not found"),
            )),
        }
    }

    fn append_note(&self, lead_id: &str, text: &str) -> SyncResult<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(SyncError::upstream(
                "source note append",
                3,
                "injected append failure",
            ));
        }
        self.appended_notes
            .lock()
            .push((lead_id.to_string(), text.to_string()));
        Ok(())
    }
}
