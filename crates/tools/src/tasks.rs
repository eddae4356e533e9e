//! Task tools: search, inspect, create, update.

use crate::format::{capped_list, field, preview, task_line, PREVIEW_CHARS, SEARCH_RESULT_CAP};
use crate::{optional_str, required_str};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::{Tool, ToolContext, ToolResult};
use taskpilot_projects::ProjectsClient;
use tracing::warn;

const PRIORITIES: [&str; 4] = ["None", "Low", "Medium", "High"];

pub struct SearchTasksTool {
    client: Arc<ProjectsClient>,
}

impl SearchTasksTool {
    pub fn new(client: Arc<ProjectsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SearchTasksTool {
    fn name(&self) -> &str {
        "search_tasks"
    }

    fn description(&self) -> &str {
        "Search for tasks by name within a project. Matching is case-insensitive substring."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": { "type": "string", "description": "ID of the project to search in" },
                "query": { "type": "string", "description": "Name or part of a name to search for" }
            },
            "required": ["project_id", "query"]
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        let project_id = required_str(&args, "project_id")?;
        let query = required_str(&args, "query")?;
        match self.client.search_tasks(project_id, query).await {
            Ok(hits) if hits.is_empty() => Ok(ToolResult::ok(format!(
                "No tasks found matching '{query}' in project {project_id}."
            ))),
            Ok(hits) => {
                let lines = hits.iter().map(task_line).collect::<Vec<_>>();
                let header = format!("Found {} tasks matching '{query}':", lines.len());
                Ok(ToolResult::ok(capped_list(&header, lines, SEARCH_RESULT_CAP)))
            }
            Err(e) => {
                warn!(error = %e, project_id, query, "search_tasks failed");
                Ok(ToolResult::failure(format!("Error searching tasks: {e}")))
            }
        }
    }
}

pub struct GetTaskDetailsTool {
    client: Arc<ProjectsClient>,
}

impl GetTaskDetailsTool {
    pub fn new(client: Arc<ProjectsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetTaskDetailsTool {
    fn name(&self) -> &str {
        "get_task_details"
    }

    fn description(&self) -> &str {
        "Get detailed information about a specific task by project and task ID."
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
        match self.client.get_task_details(project_id, task_id).await {
            Ok(Some(task)) => Ok(ToolResult::ok(task_details(&task))),
            Ok(None) => Ok(ToolResult::ok(format!(
                "No task found with ID {task_id} in project {project_id}."
            ))),
            Err(e) => {
                warn!(error = %e, project_id, task_id, "get_task_details failed");
                Ok(ToolResult::failure(format!(
                    "Error getting task details: {e}"
                )))
            }
        }
    }
}

fn task_details(task: &Value) -> String {
    let mut out = format!(
        "Task: {}\nID: {}\nStatus: {}\nPriority: {}",
        field(task, "name", "Unknown"),
        field(task, "id_string", field(task, "id", "N/A")),
        task.get("status")
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .unwrap_or(field(task, "status", "unknown")),
        field(task, "priority", "None"),
    );
    if let Some(pct) = task.get("percent_complete") {
        let pct = match pct {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out.push_str(&format!("\nProgress: {pct}%"));
    }
    let description = field(task, "description", "");
    if !description.is_empty() {
        out.push_str(&format!(
            "\nDescription: {}",
            preview(description, PREVIEW_CHARS)
        ));
    }
    if let Some(owners) = task
        .get("details")
        .and_then(|d| d.get("owners"))
        .and_then(Value::as_array)
    {
        let names: Vec<&str> = owners
            .iter()
            .filter_map(|o| o.get("name").and_then(Value::as_str))
            .collect();
        if !names.is_empty() {
            out.push_str(&format!("\nOwners: {}", names.join(", ")));
        }
    }
    if let Some(end) = task.get("end_date").and_then(Value::as_str) {
        out.push_str(&format!("\nDue date: {end}"));
    }
    out
}

pub struct CreateTaskTool {
    client: Arc<ProjectsClient>,
}

impl CreateTaskTool {
    pub fn new(client: Arc<ProjectsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateTaskTool {
    fn name(&self) -> &str {
        "create_task"
    }

    fn description(&self) -> &str {
        "Create a new task in a project with a name and optional description, dates, priority (None, Low, Medium, High), and assignee."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": { "type": "string", "description": "ID of the project" },
                "name": { "type": "string", "description": "Name of the task" },
                "description": { "type": "string", "description": "Description of the task" },
                "start_date": { "type": "string", "description": "Start date in MM-DD-YYYY format" },
                "end_date": { "type": "string", "description": "End date in MM-DD-YYYY format" },
                "priority": { "type": "string", "enum": PRIORITIES, "description": "Task priority" },
                "person_responsible": { "type": "string", "description": "User ID of the assignee" }
            },
            "required": ["project_id", "name"]
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        let project_id = required_str(&args, "project_id")?;
        let name = required_str(&args, "name")?;
        let data = build_create_body(name, &args)?;

        match self.client.create_task(project_id, &data).await {
            Ok(Some(task)) => Ok(ToolResult::ok(format!(
                "Task created successfully.\nName: {}\nID: {}",
                field(&task, "name", name),
                field(&task, "id_string", field(&task, "id", "N/A")),
            ))),
            Ok(None) => Ok(ToolResult::failure(
                "Failed to create task: no data returned.".to_string(),
            )),
            Err(e) => {
                warn!(error = %e, project_id, name, "create_task failed");
                Ok(ToolResult::failure(format!("Error creating task: {e}")))
            }
        }
    }
}

pub struct UpdateTaskTool {
    client: Arc<ProjectsClient>,
}

impl UpdateTaskTool {
    pub fn new(client: Arc<ProjectsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for UpdateTaskTool {
    fn name(&self) -> &str {
        "update_task"
    }

    fn description(&self) -> &str {
        "Update an existing task. Only the supplied fields are changed; percent_complete is an integer from 0 to 100."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": { "type": "string", "description": "ID of the project" },
                "task_id": { "type": "string", "description": "ID of the task" },
                "name": { "type": "string", "description": "New task name" },
                "description": { "type": "string", "description": "New description" },
                "priority": { "type": "string", "enum": PRIORITIES, "description": "New priority" },
                "percent_complete": { "type": "integer", "minimum": 0, "maximum": 100, "description": "Completion percentage" }
            },
            "required": ["project_id", "task_id"]
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        let project_id = required_str(&args, "project_id")?;
        let task_id = required_str(&args, "task_id")?;

        let data = build_update_body(&args)?;
        if data.as_object().map(|o| o.is_empty()).unwrap_or(true) {
            return Err(ToolError::InvalidArguments(
                "No fields to update were provided".to_string(),
            ));
        }

        match self.client.update_task(project_id, task_id, &data).await {
            Ok(Some(task)) => {
                let mut out = format!(
                    "Task updated successfully.\nName: {}\nID: {}",
                    field(&task, "name", "Unknown"),
                    field(&task, "id_string", field(&task, "id", task_id)),
                );
                if let Some(pct) = task.get("percent_complete") {
                    let pct = match pct {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    out.push_str(&format!("\nProgress: {pct}%"));
                }
                Ok(ToolResult::ok(out))
            }
            Ok(None) => Ok(ToolResult::failure(
                "Failed to update task: no data returned.".to_string(),
            )),
            Err(e) => {
                warn!(error = %e, project_id, task_id, "update_task failed");
                Ok(ToolResult::failure(format!("Error updating task: {e}")))
            }
        }
    }
}

/// Assemble the creation body: name plus whichever optional fields were
/// supplied.
fn build_create_body(name: &str, args: &Value) -> Result<Value, ToolError> {
    let mut data = json!({ "name": name });
    if let Some(description) = optional_str(args, "description") {
        data["description"] = json!(description);
    }
    if let Some(start) = optional_str(args, "start_date") {
        data["start_date"] = json!(start);
    }
    if let Some(end) = optional_str(args, "end_date") {
        data["end_date"] = json!(end);
    }
    if let Some(priority) = optional_str(args, "priority") {
        validate_priority(priority)?;
        data["priority"] = json!(priority);
    }
    if let Some(person) = optional_str(args, "person_responsible") {
        data["person_responsible"] = json!(person);
    }
    Ok(data)
}

/// Assemble the partial update body from whichever fields were supplied.
fn build_update_body(args: &Value) -> Result<Value, ToolError> {
    let mut data = serde_json::Map::new();
    if let Some(name) = optional_str(args, "name") {
        data.insert("name".into(), json!(name));
    }
    if let Some(description) = optional_str(args, "description") {
        data.insert("description".into(), json!(description));
    }
    if let Some(priority) = optional_str(args, "priority") {
        validate_priority(priority)?;
        data.insert("priority".into(), json!(priority));
    }
    if let Some(pct) = args.get("percent_complete") {
        if !pct.is_null() {
            let pct = parse_percent(pct)?;
            data.insert("percent_complete".into(), json!(pct));
        }
    }
    Ok(Value::Object(data))
}

fn validate_priority(priority: &str) -> Result<(), ToolError> {
    if PRIORITIES.contains(&priority) {
        Ok(())
    } else {
        Err(ToolError::InvalidArguments(format!(
            "Invalid priority '{priority}': must be one of None, Low, Medium, High"
        )))
    }
}

/// Percent complete must be an integer 0..=100. Numeric strings are
/// accepted since models sometimes quote numbers.
fn parse_percent(value: &Value) -> Result<u64, ToolError> {
    let pct = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match pct {
        Some(p) if p <= 100 => Ok(p),
        _ => Err(ToolError::InvalidArguments(
            "percent_complete must be an integer between 0 and 100".to_string(),
        )),
    }
}
