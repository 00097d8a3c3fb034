//! In-memory submission backend.
//!
//! Search ignores the query string and pages over the stored submissions in
//! order, using the offset as the page token. Every request is recorded.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use kinetic_queue::error::{QueueError, Result};
use kinetic_queue::remote::{Profile, SearchRequest, SearchResponse, Submission, SubmissionApi};

#[derive(Default)]
pub struct MockApi {
    pub submissions: Mutex<Vec<Submission>>,
    pub profile: Mutex<Profile>,
    pub searches: Mutex<Vec<SearchRequest>>,
    pub fetches: Mutex<Vec<String>>,
    pub updates: Mutex<Vec<(String, BTreeMap<String, Value>)>>,
    pub profile_writes: Mutex<Vec<(String, Vec<String>)>>,
    /// Error message returned by every search while set
    pub search_error: Mutex<Option<String>>,
    /// Ids whose updates fail
    pub failing_updates: Mutex<HashSet<String>>,
    /// Counts above this report a continuation token
    pub count_cap: Option<u64>,
    /// Delay applied before each search responds
    pub search_delay: Option<Duration>,
}

impl MockApi {
    pub fn new(submissions: Vec<Submission>, profile: Profile) -> Self {
        Self {
            submissions: Mutex::new(submissions),
            profile: Mutex::new(profile),
            ..Default::default()
        }
    }

    pub fn with_count_cap(mut self, cap: u64) -> Self {
        self.count_cap = Some(cap);
        self
    }

    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = Some(delay);
        self
    }

    pub fn fail_searches(&self, message: &str) {
        *self.search_error.lock() = Some(message.to_string());
    }

    pub fn fail_update(&self, id: &str) {
        self.failing_updates.lock().insert(id.to_string());
    }

    pub fn set_submissions(&self, submissions: Vec<Submission>) {
        *self.submissions.lock() = submissions;
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().len()
    }

    pub fn last_search(&self) -> Option<SearchRequest> {
        self.searches.lock().last().cloned()
    }
}

impl SubmissionApi for MockApi {
    async fn search_submissions(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.searches.lock().push(request.clone());
        if let Some(delay) = self.search_delay {
            tokio::time::sleep(delay).await;
        }
        let error = self.search_error.lock().clone();
        if let Some(message) = error {
            return Err(QueueError::Api {
                status: 500,
                message,
            });
        }

        let all = self.submissions.lock().clone();
        let offset: usize = request
            .page_token
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);
        let limit = request.limit as usize;
        let page: Vec<Submission> = all.iter().skip(offset).take(limit).cloned().collect();
        let next_page_token = (offset + limit < all.len()).then(|| (offset + limit).to_string());

        let (count, count_page_token) = if request.count {
            let total = all.len() as u64;
            match self.count_cap {
                Some(cap) if total > cap => (Some(cap), Some("more".to_string())),
                _ => (Some(total), None),
            }
        } else {
            (None, None)
        };

        Ok(SearchResponse {
            submissions: page,
            next_page_token,
            count,
            count_page_token,
        })
    }

    async fn fetch_submission(&self, id: &str, _include: &[&str]) -> Result<Submission> {
        self.fetches.lock().push(id.to_string());
        self.submissions
            .lock()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| QueueError::SubmissionNotFound(id.to_string()))
    }

    async fn update_submission(
        &self,
        id: &str,
        values: &BTreeMap<String, Value>,
        _include: &[&str],
    ) -> Result<Submission> {
        self.updates.lock().push((id.to_string(), values.clone()));
        if self.failing_updates.lock().contains(id) {
            return Err(QueueError::Api {
                status: 500,
                message: format!("could not update {id}"),
            });
        }

        let mut submissions = self.submissions.lock();
        let item = submissions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| QueueError::SubmissionNotFound(id.to_string()))?;
        for (field, value) in values {
            item.values.insert(field.clone(), value.clone());
        }
        Ok(item.clone())
    }

    async fn fetch_profile(&self) -> Result<Profile> {
        Ok(self.profile.lock().clone())
    }

    async fn update_profile_attribute(&self, name: &str, values: Vec<String>) -> Result<()> {
        self.profile_writes
            .lock()
            .push((name.to_string(), values.clone()));
        self.profile.lock().set_attribute(name, values);
        Ok(())
    }
}
