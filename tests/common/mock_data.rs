//! Builders for submissions and profiles used across tests.

use serde_json::json;

use kinetic_queue::remote::{Attribute, FormRef, Profile, Submission};

/// Builder for test submissions
pub struct SubmissionBuilder {
    submission: Submission,
}

impl SubmissionBuilder {
    pub fn new(id: &str) -> Self {
        let mut submission = Submission::new(id);
        submission.created_at = Some(
            "2024-01-01T00:00:00Z"
                .parse()
                .expect("test timestamp should be valid"),
        );
        submission.values.insert("Status".into(), json!("Open"));
        Self { submission }
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.submission.values.insert("Summary".into(), json!(summary));
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.submission.values.insert("Status".into(), json!(status));
        self
    }

    pub fn team(mut self, team: &str) -> Self {
        self.submission
            .values
            .insert("Assigned Team".into(), json!(team));
        self
    }

    pub fn individual(mut self, username: &str) -> Self {
        self.submission
            .values
            .insert("Assigned Individual".into(), json!(username));
        self
    }

    pub fn form(mut self, slug: &str) -> Self {
        self.submission.form = Some(FormRef {
            slug: slug.into(),
            name: slug.into(),
            attributes: Vec::new(),
        });
        self
    }

    /// Add a form attribute; the form must be set first
    pub fn form_attribute(mut self, name: &str, values: &[&str]) -> Self {
        if let Some(form) = self.submission.form.as_mut() {
            form.attributes.push(Attribute {
                name: name.into(),
                values: values.iter().map(|v| v.to_string()).collect(),
            });
        }
        self
    }

    pub fn build(self) -> Submission {
        self.submission
    }
}

/// A profile with the given team memberships
pub fn profile(username: &str, teams: &[&str]) -> Profile {
    let mut profile = Profile::new(username);
    profile.teams = teams.iter().map(|t| t.to_string()).collect();
    profile
}

/// `count` open submissions with ids `s1..sN`, assigned to `team`
pub fn open_items(count: usize, team: &str) -> Vec<Submission> {
    (1..=count)
        .map(|i| {
            SubmissionBuilder::new(&format!("s{i}"))
                .summary(&format!("Request {i}"))
                .team(team)
                .build()
        })
        .collect()
}
