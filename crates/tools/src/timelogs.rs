//! Time tracking tools: per-task logs, the caller's cross-project logs,
//! and log creation.

use crate::format::{capped_list, time_log_line, TIME_LOG_CAP};
use crate::{optional_str, required_str};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::{Tool, ToolContext, ToolResult};
use taskpilot_projects::ProjectsClient;
use tracing::warn;

pub struct GetTimeLogsTool {
    client: Arc<ProjectsClient>,
}

impl GetTimeLogsTool {
    pub fn new(client: Arc<ProjectsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetTimeLogsTool {
    fn name(&self) -> &str {
        "get_time_logs"
    }

    fn description(&self) -> &str {
        "Get the time logs recorded against a specific task."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": { "type": "string", "description": "ID of the project" },
                "task_id": { "type": "string", "description": "ID of the task" }
            },
            "required": ["project_id", "task_id"]
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        let project_id = required_str(&args, "project_id")?;
        let task_id = required_str(&args, "task_id")?;
        match self.client.get_task_time_logs(project_id, task_id).await {
            Ok(timelogs) => {
                let tasklogs = timelogs
                    .get("tasklogs")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                if tasklogs.is_empty() {
                    return Ok(ToolResult::ok(format!(
                        "No time logs found for task {task_id}."
                    )));
                }
                let total = timelogs
                    .get("total_log_hours")
                    .and_then(Value::as_str)
                    .unwrap_or("0:00");
                let lines = tasklogs.iter().map(time_log_line).collect::<Vec<_>>();
                let header = format!("Found {} time logs (total {total}):", lines.len());
                Ok(ToolResult::ok(capped_list(&header, lines, TIME_LOG_CAP)))
            }
            Err(e) => {
                warn!(error = %e, project_id, task_id, "get_time_logs failed");
                Ok(ToolResult::failure(format!("Error getting time logs: {e}")))
            }
        }
    }
}

pub struct GetAllTimeLogsTool {
    client: Arc<ProjectsClient>,
}

impl GetAllTimeLogsTool {
    pub fn new(client: Arc<ProjectsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetAllTimeLogsTool {
    fn name(&self) -> &str {
        "get_all_time_logs"
    }

    fn description(&self) -> &str {
        "Get the requesting user's time logs across all projects for a given week. Only available when the user's identity is known."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "date": {
                    "type": "string",
                    "description": "A date in the week of interest, MM-DD-YYYY. Defaults to today."
                }
            }
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        // Scoped strictly to the caller. Without a known identity this
        // could expose other users' entries, so it refuses instead of
        // widening the query.
        let Some(caller_id) = ctx.caller_id.as_deref() else {
            return Ok(ToolResult::failure(
                "Error: cannot look up personal time logs because the requesting \
                 user's identity is not known on this channel."
                    .to_string(),
            ));
        };

        let date = optional_str(&args, "date")
            .map(str::to_string)
            .unwrap_or_else(|| Utc::now().format("%m-%d-%Y").to_string());

        match self.client.get_all_time_logs(caller_id, &date).await {
            Ok(timelogs) => {
                let lines = collect_day_logs(&timelogs);
                if lines.is_empty() {
                    return Ok(ToolResult::ok(format!(
                        "No time logs found for the week of {date}."
                    )));
                }
                let total = timelogs
                    .get("grandtotal")
                    .and_then(Value::as_str)
                    .unwrap_or("0:00");
                let header = format!("Your time logs for the week of {date} (total {total}):");
                Ok(ToolResult::ok(capped_list(&header, lines, TIME_LOG_CAP)))
            }
            Err(e) => {
                warn!(error = %e, caller_id, "get_all_time_logs failed");
                Ok(ToolResult::failure(format!("Error getting time logs: {e}")))
            }
        }
    }
}

/// The cross-project response groups entries by day: each element of
/// `date` carries its own `tasklogs` array.
fn collect_day_logs(timelogs: &Value) -> Vec<String> {
    timelogs
        .get("date")
        .and_then(Value::as_array)
        .map(|days| {
            days.iter()
                .filter_map(|day| day.get("tasklogs").and_then(Value::as_array))
                .flatten()
                .map(time_log_line)
                .collect()
        })
        .unwrap_or_default()
}

pub struct AddTimeLogTool {
    client: Arc<ProjectsClient>,
}

impl AddTimeLogTool {
    pub fn new(client: Arc<ProjectsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for AddTimeLogTool {
    fn name(&self) -> &str {
        "add_time_log"
    }

    fn description(&self) -> &str {
        "Add a time log entry to a task. Date is MM-DD-YYYY, hours are HH:MM, bill status is Billable or Non Billable."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": { "type": "string", "description": "ID of the project" },
                "task_id": { "type": "string", "description": "ID of the task" },
                "date": { "type": "string", "description": "Date in MM-DD-YYYY format" },
                "hours": { "type": "string", "description": "Time in HH:MM format" },
                "bill_status": { "type": "string", "enum": ["Billable", "Non Billable"], "description": "Billing status" },
                "notes": { "type": "string", "description": "Notes for the time log" }
            },
            "required": ["project_id", "task_id", "date", "hours", "bill_status"]
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        let project_id = required_str(&args, "project_id")?;
        let task_id = required_str(&args, "task_id")?;
        let date = required_str(&args, "date")?;
        let hours = required_str(&args, "hours")?;
        let bill_status = required_str(&args, "bill_status")?;

        validate_hours(hours)?;
        if bill_status != "Billable" && bill_status != "Non Billable" {
            return Err(ToolError::InvalidArguments(format!(
                "Invalid bill_status '{bill_status}': must be 'Billable' or 'Non Billable'"
            )));
        }

        let data = json!({
            "date": date,
            "hours": hours,
            "bill_status": bill_status,
            "notes": optional_str(&args, "notes").unwrap_or(""),
        });

        match self.client.add_time_log(project_id, task_id, &data).await {
            Ok(Some(log)) => Ok(ToolResult::ok(format!(
                "Time log added successfully.\nDate: {}\nHours: {}\nBilling status: {}",
                log.get("log_date").and_then(Value::as_str).unwrap_or(date),
                log.get("hours_display")
                    .and_then(Value::as_str)
                    .unwrap_or(hours),
                log.get("bill_status")
                    .and_then(Value::as_str)
                    .unwrap_or(bill_status),
            ))),
            Ok(None) => Ok(ToolResult::failure(
                "Failed to add time log: no data returned.".to_string(),
            )),
            Err(e) => {
                warn!(error = %e, project_id, task_id, "add_time_log failed");
                Ok(ToolResult::failure(format!("Error adding time log: {e}")))
            }
        }
    }
}

/// Hours must look like H:MM or HH:MM with minutes under 60.
fn validate_hours(hours: &str) -> Result<(), ToolError> {
    let valid = match hours.split_once(':') {
        Some((h, m)) => {
            h.parse::<u32>().is_ok()
                && m.len() == 2
                && m.parse::<u32>().map(|m| m < 60).unwrap_or(false)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ToolError::InvalidArguments(format!(
            "Invalid hours '{hours}': expected HH:MM"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hours_format_validated() {
        assert!(validate_hours("2:00").is_ok());
        assert!(validate_hours("10:30").is_ok());
        assert!(validate_hours("0:05").is_ok());
        assert!(validate_hours("2:60").is_err());
        assert!(validate_hours("2").is_err());
        assert!(validate_hours("two:30").is_err());
        assert!(validate_hours("2:5").is_err());
    }

    #[test]
    fn day_logs_flattened_across_days() {
        let timelogs = json!({
            "grandtotal": "6:00",
            "date": [
                {"tasklogs": [{"hours_display": "2:00", "owner_name": "Priya"}]},
                {"tasklogs": [
                    {"hours_display": "3:00", "owner_name": "Priya"},
                    {"hours_display": "1:00", "owner_name": "Priya"}
                ]}
            ]
        });
        assert_eq!(collect_day_logs(&timelogs).len(), 3);
    }

    #[test]
    fn day_logs_empty_when_absent() {
        assert!(collect_day_logs(&json!({})).is_empty());
    }

    #[tokio::test]
    async fn personal_logs_refused_without_identity() {
        // Client construction needs no network; the identity check fires
        // before any request.
        let config = taskpilot_config::ProjectsConfig {
            client_id: "cid".into(),
            client_secret: "cs".into(),
            refresh_token: "rt".into(),
            portal_id: "700".into(),
            ..Default::default()
        };
        let client = Arc::new(ProjectsClient::new(&config).unwrap());
        let tool = GetAllTimeLogsTool::new(client);

        let result = tool
            .execute(&ToolContext::default(), json!({}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("identity is not known"));
    }
}
