//! Asana REST client
//!
//! Uses a personal access token as bearer credential. Only the endpoints the
//! engine needs are wrapped: task stories (comments) and workspace typeahead
//! search.

use super::{TaskTracker, TrackerTask};
use crate::error::{GittaskError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Default Asana API base URL
pub const DEFAULT_API_BASE: &str = "https://app.asana.com/api/1.0";

const SEARCH_RESULT_LIMIT: u32 = 20;

/// Asana API client
#[derive(Clone, Debug)]
pub struct AsanaClient {
    client: Client,
    api_base: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Serialize)]
struct StoryRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
}

#[derive(Deserialize)]
struct AsanaTask {
    gid: String,
    name: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl AsanaClient {
    /// Create a client; `token` may be absent for read-only probing
    pub fn new(api_base: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GittaskError::Tracker(format!("Failed to create HTTP client: {}", e)))?;

        let api_base = api_base.into().trim_end_matches('/').to_string();
        let token = token.filter(|t| !t.trim().is_empty());

        Ok(Self {
            client,
            api_base,
            token,
        })
    }

    fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| GittaskError::AuthMissing("no Asana token configured".to_string()))
    }

    /// Turn a non-success response into an error carrying Asana's message
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|e| e.errors.into_iter().next())
            .map(|e| e.message)
            .unwrap_or(body);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GittaskError::Tracker(format!(
                "Asana rejected the credential ({}): {}",
                status, detail
            ))),
            _ => Err(GittaskError::Tracker(format!(
                "Asana request failed ({}): {}",
                status, detail
            ))),
        }
    }
}

#[async_trait]
impl TaskTracker for AsanaClient {
    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    async fn post_comment(&self, task_id: &str, text: &str) -> Result<()> {
        let token = self.token()?;
        let url = format!("{}/tasks/{}/stories", self.api_base, task_id);
        debug!(task = %task_id, "Posting comment to Asana");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&DataEnvelope {
                data: StoryRequest { text },
            })
            .send()
            .await?;
        Self::check(response).await?;

        info!(task = %task_id, "Posted comment to Asana");
        Ok(())
    }

    async fn search_tasks(&self, workspace_id: &str, query: &str) -> Result<Vec<TrackerTask>> {
        let token = self.token()?;
        let url = format!("{}/workspaces/{}/typeahead", self.api_base, workspace_id);
        let count = SEARCH_RESULT_LIMIT.to_string();

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("resource_type", "task"),
                ("query", query),
                ("count", count.as_str()),
                ("opt_fields", "name"),
            ])
            .send()
            .await?;
        let response = Self::check(response).await?;

        let tasks: ListResponse<AsanaTask> = response.json().await?;
        debug!(workspace = %workspace_id, results = tasks.data.len(), "Asana search");

        Ok(tasks
            .data
            .into_iter()
            .map(|task| TrackerTask {
                id: task.gid,
                name: task.name,
            })
            .collect())
    }
}
