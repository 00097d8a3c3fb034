//! Backend access for queue submissions and the user profile.
//!
//! [`SubmissionApi`] is the seam between the queue state machine and the
//! Kinetic Core REST API. [`kinetic::KineticClient`] is the real
//! implementation; tests substitute an in-memory one.

pub mod error;
pub mod kinetic;

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::Search;
use crate::types::Status;

pub use error::ApiError;
pub use kinetic::KineticClient;

pub const FIELD_STATUS: &str = "Status";
pub const FIELD_ASSIGNED_TEAM: &str = "Assigned Team";
pub const FIELD_ASSIGNED_INDIVIDUAL: &str = "Assigned Individual";
pub const FIELD_DUE_DATE: &str = "Due Date";
pub const FIELD_SUMMARY: &str = "Summary";

/// Relations loaded when showing a single submission
pub const ITEM_INCLUDES: &[&str] = &["details", "values", "form", "form.attributes"];

/// A named, multi-valued attribute on a form or profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

fn find_attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a [String]> {
    attributes
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.values.as_slice())
}

/// The form a submission belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRef {
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl FormRef {
    pub fn attribute_values(&self, name: &str) -> Option<&[String]> {
        find_attribute(&self.attributes, name)
    }

    /// First value of an attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attribute_values(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// A queue item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<FormRef>,
    #[serde(default)]
    pub values: BTreeMap<String, serde_json::Value>,
}

impl Submission {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            handle: None,
            core_state: None,
            created_at: None,
            created_by: None,
            updated_at: None,
            closed_at: None,
            form: None,
            values: BTreeMap::new(),
        }
    }

    /// A field value, when it is a non-empty string
    pub fn value(&self, field: &str) -> Option<&str> {
        self.values
            .get(field)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn status(&self) -> Option<Status> {
        self.value(FIELD_STATUS).and_then(|s| s.parse().ok())
    }

    pub fn assigned_team(&self) -> Option<&str> {
        self.value(FIELD_ASSIGNED_TEAM)
    }

    pub fn assigned_individual(&self) -> Option<&str> {
        self.value(FIELD_ASSIGNED_INDIVIDUAL)
    }

    pub fn due_date(&self) -> Option<&str> {
        self.value(FIELD_DUE_DATE)
    }

    pub fn form_slug(&self) -> Option<&str> {
        self.form.as_ref().map(|f| f.slug.as_str())
    }

    /// Short human-readable title
    pub fn title(&self) -> &str {
        self.value(FIELD_SUMMARY)
            .or(self.label.as_deref())
            .unwrap_or(&self.id)
    }
}

/// The signed-in user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Names of the teams the user belongs to
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub profile_attributes: Vec<Attribute>,
}

impl Profile {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    pub fn attribute_values(&self, name: &str) -> Option<&[String]> {
        find_attribute(&self.profile_attributes, name)
    }

    pub fn set_attribute(&mut self, name: &str, values: Vec<String>) {
        match self.profile_attributes.iter_mut().find(|a| a.name == name) {
            Some(attribute) => attribute.values = values,
            None => self.profile_attributes.push(Attribute {
                name: name.to_string(),
                values,
            }),
        }
    }
}

/// One page request against a kapp's submissions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub kapp: String,
    pub search: Search,
    pub limit: u32,
    pub page_token: Option<String>,
    /// Also ask for the total number of matches
    pub count: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResponse {
    pub submissions: Vec<Submission>,
    pub next_page_token: Option<String>,
    pub count: Option<u64>,
    /// Present when the backend stopped counting early
    pub count_page_token: Option<String>,
}

/// Common interface for the submission backend
pub trait SubmissionApi: Send + Sync {
    fn search_submissions(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<SearchResponse>> + Send;

    fn fetch_submission(
        &self,
        id: &str,
        include: &[&str],
    ) -> impl Future<Output = Result<Submission>> + Send;

    /// Merge `values` into a submission and return the updated item
    fn update_submission(
        &self,
        id: &str,
        values: &BTreeMap<String, serde_json::Value>,
        include: &[&str],
    ) -> impl Future<Output = Result<Submission>> + Send;

    fn fetch_profile(&self) -> impl Future<Output = Result<Profile>> + Send;

    /// Replace all values of one profile attribute
    fn update_profile_attribute(
        &self,
        name: &str,
        values: Vec<String>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// HTTP classification for errors that may be retried
pub trait AsHttpError {
    fn as_http_error(&self) -> Option<(reqwest::StatusCode, Option<u64>)>;

    fn is_transient(&self) -> bool;

    fn is_rate_limited(&self) -> bool;

    fn get_retry_after(&self) -> Option<Duration> {
        match self.as_http_error() {
            Some((status, Some(seconds))) if status.as_u16() == 429 => {
                Some(Duration::from_secs(seconds))
            }
            _ if self.is_rate_limited() => Some(Duration::from_secs(60)),
            _ => None,
        }
    }
}

/// Maximum attempts for a request that keeps failing transiently
pub const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds)
pub const BASE_DELAY_MS: u64 = 250;

/// Run `operation`, retrying transient and rate-limited failures with backoff
pub async fn execute_with_retry<T, E, F, Fut>(base_delay: Duration, mut operation: F) -> std::result::Result<T, E>
where
    E: AsHttpError + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < MAX_RETRIES && (e.is_transient() || e.is_rate_limited()) => {
                let delay = e
                    .get_retry_after()
                    .unwrap_or(base_delay * (1 << attempt));
                tracing::debug!(
                    "Attempt {} failed ({e}), retrying in {}ms",
                    attempt + 1,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
