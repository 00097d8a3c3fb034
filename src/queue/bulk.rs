//! Bulk actions over the selected submissions.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::remote::{FIELD_ASSIGNED_INDIVIDUAL, FIELD_ASSIGNED_TEAM, Submission};

/// Relations returned by each bulk update
pub const BULK_INCLUDES: &[&str] = &["details", "values"];

#[derive(Debug, Clone, PartialEq)]
pub enum BulkAction {
    /// Hand items to a team, and optionally a member of it
    Assign {
        team: String,
        individual: Option<String>,
    },
    /// Set arbitrary field values on every item
    Work { values: BTreeMap<String, Value> },
}

impl BulkAction {
    /// Field values written to each submission
    pub fn values(&self) -> BTreeMap<String, Value> {
        match self {
            BulkAction::Assign { team, individual } => BTreeMap::from([
                (FIELD_ASSIGNED_TEAM.to_string(), Value::from(team.as_str())),
                (
                    FIELD_ASSIGNED_INDIVIDUAL.to_string(),
                    Value::from(individual.as_deref().unwrap_or_default()),
                ),
            ]),
            BulkAction::Work { values } => values.clone(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BulkAction::Assign { .. } => "assign",
            BulkAction::Work { .. } => "work",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub id: String,
    pub message: String,
}

/// Per-item outcome of a bulk action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkResults {
    pub success: Vec<Submission>,
    pub error: Vec<BulkFailure>,
}

impl BulkResults {
    /// Collect outcomes, keeping their original order
    pub fn collect<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (String, Result<Submission>)>,
    {
        let mut results = BulkResults::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(submission) => results.success.push(submission),
                Err(e) => {
                    tracing::warn!("Bulk update of {id} failed: {e}");
                    results.error.push(BulkFailure {
                        id,
                        message: e.to_string(),
                    });
                }
            }
        }
        results
    }

    pub fn total(&self) -> usize {
        self.success.len() + self.error.len()
    }

    pub fn success_ids(&self) -> Vec<String> {
        self.success.iter().map(|s| s.id.clone()).collect()
    }

    pub fn error_ids(&self) -> Vec<String> {
        self.error.iter().map(|f| f.id.clone()).collect()
    }
}

/// Which items stay selected once a bulk action has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowUp {
    All,
    Successes,
    #[default]
    Failures,
}

crate::enum_display_fromstr!(
    FollowUp,
    crate::error::QueueError::invalid_follow_up,
    {
        All => "all",
        Successes => "successes",
        Failures => "failures",
    }
);

/// Selection for a follow-up action
pub fn follow_up(results: &BulkResults, keep: FollowUp) -> Vec<String> {
    match keep {
        FollowUp::All => {
            let mut ids = results.success_ids();
            ids.extend(results.error_ids());
            ids
        }
        FollowUp::Successes => results.success_ids(),
        FollowUp::Failures => results.error_ids(),
    }
}
