//! Classification of Kinetic Core HTTP failures.
//!
//! Responses are first captured as an [`ApiError`] so the retry loop can
//! inspect the status, then mapped onto [`QueueError`] once retries are
//! exhausted.

use std::fmt;

use serde::Deserialize;

use crate::error::QueueError;

use super::AsHttpError;

/// Error body returned by the REST API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// A failed API call, with the HTTP status when one was received
#[derive(Debug)]
pub struct ApiError {
    pub status: Option<reqwest::StatusCode>,
    pub retry_after: Option<u64>,
    pub message: String,
    /// Submission the request was about, for not-found reporting
    pub submission_id: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            retry_after: None,
            message: message.into(),
            submission_id: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: reqwest::StatusCode) -> Self {
        Self {
            status: Some(status),
            ..Self::new(message)
        }
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    pub fn for_submission(mut self, id: &str) -> Self {
        self.submission_id = Some(id.to_string());
        self
    }

    /// Build from a non-success response body, preferring the server's message
    pub fn from_body(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error.or(b.message))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });
        Self::with_status(message, status)
    }

    pub fn to_queue_error(&self) -> QueueError {
        let Some(status) = self.status else {
            return QueueError::Other(self.message.clone());
        };
        match status.as_u16() {
            401 | 403 => QueueError::Auth(self.message.clone()),
            404 => match &self.submission_id {
                Some(id) => QueueError::SubmissionNotFound(id.clone()),
                None => QueueError::Api {
                    status: 404,
                    message: self.message.clone(),
                },
            },
            code => QueueError::Api {
                status: code,
                message: self.message.clone(),
            },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl AsHttpError for ApiError {
    fn as_http_error(&self) -> Option<(reqwest::StatusCode, Option<u64>)> {
        self.status.map(|s| (s, self.retry_after))
    }

    fn is_transient(&self) -> bool {
        self.status.is_some_and(|s| s.is_server_error())
    }

    fn is_rate_limited(&self) -> bool {
        self.status.is_some_and(|s| s.as_u16() == 429)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let mut api = ApiError::new(err.to_string());
        api.status = err.status();
        // Timeouts and dropped connections are worth another attempt
        if api.status.is_none() && (err.is_timeout() || err.is_connect()) {
            api.status = Some(reqwest::StatusCode::SERVICE_UNAVAILABLE);
        }
        api
    }
}

impl From<ApiError> for QueueError {
    fn from(error: ApiError) -> Self {
        error.to_queue_error()
    }
}
