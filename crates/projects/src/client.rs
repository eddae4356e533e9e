//! The REST client for the project-management API.
//!
//! Resource methods are thin compositions of `request` plus envelope
//! unwrapping. List endpoints wrap their arrays under named keys
//! (`projects`, `tasks`, `tasklists`, `timelogs`); a missing key decodes
//! to an empty result rather than an error.

use crate::token::{AccessCredential, TokenGrant};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use taskpilot_core::error::ProjectsError;
use taskpilot_core::event::{DomainEvent, EventBus};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Per-request timeout for both resource and token-endpoint calls.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for the downstream project-management REST API.
///
/// Safe to share behind an `Arc`: the credential cache is serialized by a
/// mutex so concurrent callers single-flight the refresh exchange.
pub struct ProjectsClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    portal_id: String,
    api_base: String,
    auth_base: String,
    credential: Mutex<Option<AccessCredential>>,
    events: Option<Arc<EventBus>>,
}

impl ProjectsClient {
    pub fn new(config: &taskpilot_config::ProjectsConfig) -> Result<Self, ProjectsError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProjectsError::Auth(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_token: config.refresh_token.clone(),
            portal_id: config.portal_id.clone(),
            api_base: config.api_base_url.trim_end_matches('/').to_string(),
            auth_base: config.auth_base_url.trim_end_matches('/').to_string(),
            credential: Mutex::new(None),
            events: None,
        })
    }

    /// Attach an event bus for credential-refresh notifications.
    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Return a token valid past the safety margin, refreshing if needed.
    ///
    /// The mutex is held across the refresh exchange so two concurrent
    /// callers with an expiring token perform exactly one network call.
    pub async fn ensure_access_token(&self) -> Result<String, ProjectsError> {
        let mut guard = self.credential.lock().await;
        let now = Utc::now();

        if let Some(cred) = guard.as_ref() {
            if cred.is_valid(now) {
                return Ok(cred.token.clone());
            }
        }

        // Expiring or absent: drop it before attempting the exchange so a
        // failed refresh never leaves a stale token behind.
        *guard = None;

        let url = format!("{}/oauth/v2/token", self.auth_base);
        let form = [
            ("refresh_token", self.refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ProjectsError::Auth(format!("Token refresh failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Token refresh rejected");
            return Err(ProjectsError::Auth(format!(
                "Token refresh failed with status {status}: {body}"
            )));
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| ProjectsError::Auth(format!("Malformed token response: {e}")))?;

        let cred = AccessCredential::from_grant(grant.access_token, grant.expires_in, now);
        info!(expires_at = %cred.expires_at, "Refreshed access token");
        if let Some(events) = &self.events {
            events.publish(DomainEvent::CredentialRefreshed {
                expires_at: cred.expires_at,
                timestamp: now,
            });
        }

        let token = cred.token.clone();
        *guard = Some(cred);
        Ok(token)
    }

    /// Make an authenticated request and decode the JSON body.
    ///
    /// An empty success body decodes to an empty object. Failures carry the
    /// method and path so tool-layer error texts stay actionable.
    pub async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, ProjectsError> {
        let token = self.ensure_access_token().await?;
        let url = format!("{}{path}", self.api_base);

        let mut req = self
            .http
            .request(method.clone(), &url)
            .header("Authorization", format!("Zoho-oauthtoken {token}"))
            .header("Content-Type", "application/json");

        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        debug!(%method, path, "Projects API request");

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                ProjectsError::Timeout {
                    method: method.to_string(),
                    path: path.to_string(),
                }
            } else {
                ProjectsError::Api {
                    method: method.to_string(),
                    path: path.to_string(),
                    status: None,
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(%method, path, status = status.as_u16(), "Projects API request failed");
            return Err(ProjectsError::Api {
                method: method.to_string(),
                path: path.to_string(),
                status: Some(status.as_u16()),
                message,
            });
        }

        let bytes = response.bytes().await.map_err(|e| ProjectsError::Api {
            method: method.to_string(),
            path: path.to_string(),
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

        if bytes.is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }

        serde_json::from_slice(&bytes).map_err(|e| ProjectsError::Api {
            method: method.to_string(),
            path: path.to_string(),
            status: Some(status.as_u16()),
            message: format!("Malformed response body: {e}"),
        })
    }

    fn portal_path(&self, suffix: &str) -> String {
        format!("/restapi/portal/{}{suffix}", self.portal_id)
    }

    // --- Projects ---

    /// All projects in the portal, filtered by status ("active" by default).
    pub async fn get_all_projects(&self, status: &str) -> Result<Vec<Value>, ProjectsError> {
        let path = self.portal_path("/projects/");
        let response = self
            .request(reqwest::Method::GET, &path, &[("status", status)], None)
            .await?;
        Ok(unwrap_array(&response, "projects"))
    }

    pub async fn get_project_details(
        &self,
        project_id: &str,
    ) -> Result<Option<Value>, ProjectsError> {
        let path = self.portal_path(&format!("/projects/{project_id}/"));
        let response = self.request(reqwest::Method::GET, &path, &[], None).await?;
        Ok(unwrap_first(&response, "projects"))
    }

    pub async fn create_project(&self, data: &Value) -> Result<Option<Value>, ProjectsError> {
        let path = self.portal_path("/projects/");
        let response = self
            .request(reqwest::Method::POST, &path, &[], Some(data))
            .await?;
        Ok(unwrap_first(&response, "projects"))
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        data: &Value,
    ) -> Result<Option<Value>, ProjectsError> {
        let path = self.portal_path(&format!("/projects/{project_id}/"));
        let response = self
            .request(reqwest::Method::POST, &path, &[], Some(data))
            .await?;
        Ok(unwrap_first(&response, "projects"))
    }

    /// Client-side name search: fetches the full collection and filters
    /// case-insensitively by substring. O(n) per call: fine at the tens to
    /// low hundreds of projects this API serves.
    pub async fn search_projects(&self, query: &str) -> Result<Vec<Value>, ProjectsError> {
        let projects = self.get_all_projects("active").await?;
        Ok(filter_by_name(projects, query))
    }

    // --- Tasks ---

    pub async fn get_all_tasks(&self, project_id: &str) -> Result<Vec<Value>, ProjectsError> {
        let path = self.portal_path(&format!("/projects/{project_id}/tasks/"));
        let response = self.request(reqwest::Method::GET, &path, &[], None).await?;
        Ok(unwrap_array(&response, "tasks"))
    }

    pub async fn get_task_details(
        &self,
        project_id: &str,
        task_id: &str,
    ) -> Result<Option<Value>, ProjectsError> {
        let path = self.portal_path(&format!("/projects/{project_id}/tasks/{task_id}/"));
        let response = self.request(reqwest::Method::GET, &path, &[], None).await?;
        Ok(unwrap_first(&response, "tasks"))
    }

    pub async fn create_task(
        &self,
        project_id: &str,
        data: &Value,
    ) -> Result<Option<Value>, ProjectsError> {
        let path = self.portal_path(&format!("/projects/{project_id}/tasks/"));
        let response = self
            .request(reqwest::Method::POST, &path, &[], Some(data))
            .await?;
        Ok(unwrap_first(&response, "tasks"))
    }

    /// Partial update: `data` carries only the fields being changed.
    pub async fn update_task(
        &self,
        project_id: &str,
        task_id: &str,
        data: &Value,
    ) -> Result<Option<Value>, ProjectsError> {
        let path = self.portal_path(&format!("/projects/{project_id}/tasks/{task_id}/"));
        let response = self
            .request(reqwest::Method::POST, &path, &[], Some(data))
            .await?;
        Ok(unwrap_first(&response, "tasks"))
    }

    /// Client-side name search within a project. Same O(n) scan as
    /// `search_projects`.
    pub async fn search_tasks(
        &self,
        project_id: &str,
        query: &str,
    ) -> Result<Vec<Value>, ProjectsError> {
        let tasks = self.get_all_tasks(project_id).await?;
        Ok(filter_by_name(tasks, query))
    }

    // --- Task lists ---

    pub async fn get_all_tasklists(&self, project_id: &str) -> Result<Vec<Value>, ProjectsError> {
        let path = self.portal_path(&format!("/projects/{project_id}/tasklists/"));
        let response = self.request(reqwest::Method::GET, &path, &[], None).await?;
        Ok(unwrap_array(&response, "tasklists"))
    }

    pub async fn create_tasklist(
        &self,
        project_id: &str,
        data: &Value,
    ) -> Result<Option<Value>, ProjectsError> {
        let path = self.portal_path(&format!("/projects/{project_id}/tasklists/"));
        let response = self
            .request(reqwest::Method::POST, &path, &[], Some(data))
            .await?;
        Ok(unwrap_first(&response, "tasklists"))
    }

    // --- Time logs ---

    /// Time logs for one task. Returns the `timelogs` envelope object
    /// (total hours plus a `tasklogs` array).
    pub async fn get_task_time_logs(
        &self,
        project_id: &str,
        task_id: &str,
    ) -> Result<Value, ProjectsError> {
        let path = self.portal_path(&format!("/projects/{project_id}/tasks/{task_id}/logs/"));
        let response = self.request(reqwest::Method::GET, &path, &[], None).await?;
        Ok(response
            .get("timelogs")
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new())))
    }

    /// Time logs across a whole project, with caller-supplied query
    /// filters (`users_list`, `view_type`, `date`, `bill_status`).
    pub async fn get_project_time_logs(
        &self,
        project_id: &str,
        filters: &[(&str, &str)],
    ) -> Result<Value, ProjectsError> {
        let path = self.portal_path(&format!("/projects/{project_id}/logs/"));
        let response = self
            .request(reqwest::Method::GET, &path, filters, None)
            .await?;
        Ok(response
            .get("timelogs")
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new())))
    }

    /// Cross-project time logs scoped to one user. The portal-level `/logs/`
    /// endpoint requires a user list, a date, and a view type.
    pub async fn get_all_time_logs(
        &self,
        owner_id: &str,
        date: &str,
    ) -> Result<Value, ProjectsError> {
        let path = self.portal_path("/logs/");
        let response = self
            .request(
                reqwest::Method::GET,
                &path,
                &[
                    ("users_list", owner_id),
                    ("date", date),
                    ("view_type", "week"),
                    ("bill_status", "All"),
                    ("component_type", "task"),
                ],
                None,
            )
            .await?;
        Ok(response
            .get("timelogs")
            .cloned()
            .unwrap_or(Value::Object(serde_json::Map::new())))
    }

    pub async fn add_time_log(
        &self,
        project_id: &str,
        task_id: &str,
        data: &Value,
    ) -> Result<Option<Value>, ProjectsError> {
        let path = self.portal_path(&format!("/projects/{project_id}/tasks/{task_id}/logs/"));
        let response = self
            .request(reqwest::Method::POST, &path, &[], Some(data))
            .await?;
        // Time log envelope nests one level deeper: timelogs.tasklogs[0]
        Ok(response
            .get("timelogs")
            .map(|t| unwrap_first(t, "tasklogs"))
            .unwrap_or(None))
    }
}

/// Pull the array under `key`, defaulting to empty when absent.
fn unwrap_array(response: &Value, key: &str) -> Vec<Value> {
    response
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Pull the first element of the array under `key`.
fn unwrap_first(response: &Value, key: &str) -> Option<Value> {
    response
        .get(key)
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .cloned()
}

/// Case-insensitive substring filter on each item's `name` field.
fn filter_by_name(items: Vec<Value>, query: &str) -> Vec<Value> {
    let needle = query.to_lowercase();
    items
        .into_iter()
        .filter(|item| {
            item.get("name")
                .and_then(Value::as_str)
                .map(|name| name.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwrap_array_missing_key_is_empty() {
        let response = json!({"error": "nope"});
        assert!(unwrap_array(&response, "projects").is_empty());
    }

    #[test]
    fn unwrap_first_takes_head() {
        let response = json!({"tasks": [{"id": "1"}, {"id": "2"}]});
        let first = unwrap_first(&response, "tasks").unwrap();
        assert_eq!(first["id"], "1");
    }

    #[test]
    fn name_filter_is_case_insensitive() {
        let items = vec![
            json!({"name": "Design Sprint"}),
            json!({"name": "DESIGN-2"}),
            json!({"name": "Marketing"}),
            json!({"id": "no-name"}),
        ];
        let hits = filter_by_name(items, "design");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0]["name"], "Design Sprint");
        assert_eq!(hits[1]["name"], "DESIGN-2");
    }

    #[test]
    fn name_filter_empty_query_matches_all_named() {
        let items = vec![json!({"name": "A"}), json!({"name": "B"})];
        assert_eq!(filter_by_name(items, "").len(), 2);
    }
}
