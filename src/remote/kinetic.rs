//! Kinetic Core REST API client.
//!
//! # Security Note - Logging
//!
//! The password is held as a [`SecretString`] and only exposed while building
//! the basic auth header. Request logging is limited to the method and path,
//! never headers or query strings.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, Method, Response, header};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::error::{QueueError, Result};

use super::{
    ApiError, Attribute, BASE_DELAY_MS, Profile, SearchRequest, SearchResponse, Submission,
    SubmissionApi, execute_with_retry,
};

const API_PATH: &[&str] = &["app", "api", "v1"];

/// Relations needed to build a [`Profile`]
pub const PROFILE_INCLUDES: &[&str] = &["memberships.team", "profileAttributes"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionsPage {
    #[serde(default)]
    submissions: Vec<Submission>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountResponse {
    count: u64,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmissionEnvelope {
    submission: Submission,
}

#[derive(Debug, Deserialize)]
struct TeamRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Membership {
    team: TeamRef,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    username: String,
    display_name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    memberships: Vec<Membership>,
    #[serde(default)]
    profile_attributes: Vec<Attribute>,
}

impl From<MeResponse> for Profile {
    fn from(me: MeResponse) -> Self {
        Profile {
            username: me.username,
            display_name: me.display_name.filter(|n| !n.is_empty()),
            email: me.email.filter(|e| !e.is_empty()),
            teams: me.memberships.into_iter().map(|m| m.team.name).collect(),
            profile_attributes: me.profile_attributes,
        }
    }
}

/// Kinetic Core client authenticated as one user
pub struct KineticClient {
    client: Client,
    base: Url,
    username: String,
    password: SecretString,
    retry_delay: Duration,
}

impl KineticClient {
    /// Create a client from configuration and environment
    pub fn from_config(config: &Config) -> Result<Self> {
        let server = config.server_url()?;
        let username = config.username().ok_or_else(|| {
            QueueError::Auth(
                "username not configured. Set KQ_USERNAME or run: kq config set username <name>"
                    .to_string(),
            )
        })?;
        let password = config.password().ok_or_else(|| {
            QueueError::Auth(
                "password not configured. Set KQ_PASSWORD or run: kq config set password <secret>"
                    .to_string(),
            )
        })?;
        Self::new(server, username, password, config.timeout())
    }

    pub fn new(
        server: Url,
        username: impl Into<String>,
        password: SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()?;

        if server.cannot_be_a_base() {
            return Err(QueueError::Config(format!(
                "'{server}' cannot be used as a server URL"
            )));
        }
        let mut base = server;
        if let Ok(mut path) = base.path_segments_mut() {
            path.pop_if_empty().extend(API_PATH);
        }

        Ok(Self {
            client,
            base,
            username: username.into(),
            password,
            retry_delay: Duration::from_millis(BASE_DELAY_MS),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    /// URL for one page of a submission search
    pub fn search_url(&self, request: &SearchRequest) -> Url {
        let mut url = self.endpoint(&["kapps", &request.kapp, "submissions"]);
        {
            let mut query = url.query_pairs_mut();
            if !request.search.q.is_empty() {
                query.append_pair("q", &request.search.q);
            }
            query
                .append_pair("limit", &request.limit.to_string())
                .append_pair("include", &request.search.include.join(","))
                .append_pair("orderBy", &request.search.order_by.to_string())
                .append_pair("direction", &request.search.direction.to_string());
            if let Some(token) = &request.page_token {
                query.append_pair("pageToken", token);
            }
        }
        url
    }

    /// URL counting all matches of a search
    pub fn count_url(&self, request: &SearchRequest) -> Url {
        let mut url = self.endpoint(&["kapps", &request.kapp, "submissions-count"]);
        if !request.search.q.is_empty() {
            url.query_pairs_mut().append_pair("q", &request.search.q);
        }
        url
    }

    fn with_include(mut url: Url, include: &[&str]) -> Url {
        if !include.is_empty() {
            url.query_pairs_mut()
                .append_pair("include", &include.join(","));
        }
        url
    }

    fn submission_url(&self, id: &str, include: &[&str]) -> Url {
        Self::with_include(self.endpoint(&["submissions", id]), include)
    }

    fn me_url(&self) -> Url {
        Self::with_include(self.endpoint(&["me"]), PROFILE_INCLUDES)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        submission_id: Option<&str>,
    ) -> Result<T> {
        tracing::debug!("{method} {}", url.path());
        let body = body.as_ref();
        let response = execute_with_retry(self.retry_delay, || {
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .basic_auth(&self.username, Some(self.password.expose_secret()))
                .header(header::ACCEPT, "application/json");
            if let Some(body) = body {
                request = request.json(body);
            }
            async move {
                let response = request.send().await?;
                check_status(response, submission_id).await
            }
        })
        .await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(
    response: Response,
    submission_id: Option<&str>,
) -> std::result::Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    let mut error = ApiError::from_body(status, &body);
    if let Some(seconds) = retry_after {
        error = error.with_retry_after(seconds);
    }
    if let Some(id) = submission_id {
        error = error.for_submission(id);
    }
    Err(error)
}

impl SubmissionApi for KineticClient {
    async fn search_submissions(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let page = self.send::<SubmissionsPage>(Method::GET, self.search_url(request), None, None);
        let count = async {
            if !request.count {
                return Ok(None);
            }
            self.send::<CountResponse>(Method::GET, self.count_url(request), None, None)
                .await
                .map(Some)
        };
        let (page, count) = tokio::try_join!(page, count)?;

        Ok(SearchResponse {
            submissions: page.submissions,
            next_page_token: page.next_page_token,
            count: count.as_ref().map(|c| c.count),
            count_page_token: count.and_then(|c| c.next_page_token),
        })
    }

    async fn fetch_submission(&self, id: &str, include: &[&str]) -> Result<Submission> {
        let envelope: SubmissionEnvelope = self
            .send(Method::GET, self.submission_url(id, include), None, Some(id))
            .await?;
        Ok(envelope.submission)
    }

    async fn update_submission(
        &self,
        id: &str,
        values: &BTreeMap<String, serde_json::Value>,
        include: &[&str],
    ) -> Result<Submission> {
        let body = serde_json::json!({ "values": values });
        let envelope: SubmissionEnvelope = self
            .send(
                Method::PUT,
                self.submission_url(id, include),
                Some(body),
                Some(id),
            )
            .await?;
        Ok(envelope.submission)
    }

    async fn fetch_profile(&self) -> Result<Profile> {
        let me: MeResponse = self.send(Method::GET, self.me_url(), None, None).await?;
        Ok(me.into())
    }

    async fn update_profile_attribute(&self, name: &str, values: Vec<String>) -> Result<()> {
        // The API replaces the whole attribute list, so merge into the current one
        let mut profile = self.fetch_profile().await?;
        profile.set_attribute(name, values);
        let body = serde_json::json!({ "profileAttributes": profile.profile_attributes });
        let _: MeResponse = self
            .send(Method::PUT, self.me_url(), Some(body), None)
            .await?;
        Ok(())
    }
}
