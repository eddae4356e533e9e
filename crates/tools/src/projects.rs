//! Project tools: list, search, inspect, create.

use crate::format::{capped_list, field, preview, project_line, PREVIEW_CHARS, SEARCH_RESULT_CAP};
use crate::{optional_str, required_str};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::{Tool, ToolContext, ToolResult};
use taskpilot_projects::ProjectsClient;
use tracing::warn;

pub struct ListAllProjectsTool {
    client: Arc<ProjectsClient>,
}

impl ListAllProjectsTool {
    pub fn new(client: Arc<ProjectsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListAllProjectsTool {
    fn name(&self) -> &str {
        "list_all_projects"
    }

    fn description(&self) -> &str {
        "List all projects in the portal. Optionally filter by status (active, archived, template)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "description": "Project status filter: active, archived, or template. Defaults to active."
                }
            }
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        let status = optional_str(&args, "status").unwrap_or("active");
        match self.client.get_all_projects(status).await {
            Ok(projects) if projects.is_empty() => {
                Ok(ToolResult::ok(format!("No {status} projects found.")))
            }
            Ok(projects) => {
                let lines = projects.iter().map(project_line).collect::<Vec<_>>();
                let header = format!("Found {} {status} projects:", lines.len());
                Ok(ToolResult::ok(capped_list(&header, lines, usize::MAX)))
            }
            Err(e) => {
                warn!(error = %e, "list_all_projects failed");
                Ok(ToolResult::failure(format!("Error listing projects: {e}")))
            }
        }
    }
}

pub struct SearchProjectsTool {
    client: Arc<ProjectsClient>,
}

impl SearchProjectsTool {
    pub fn new(client: Arc<ProjectsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for SearchProjectsTool {
    fn name(&self) -> &str {
        "search_projects"
    }

    fn description(&self) -> &str {
        "Search for projects by name. Matching is case-insensitive substring on the project name."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Name or part of a name to search for" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        let query = required_str(&args, "query")?;
        match self.client.search_projects(query).await {
            Ok(hits) if hits.is_empty() => Ok(ToolResult::ok(format!(
                "No projects found matching '{query}'."
            ))),
            Ok(hits) => {
                let lines = hits.iter().map(project_line).collect::<Vec<_>>();
                let header = format!("Found {} projects matching '{query}':", lines.len());
                Ok(ToolResult::ok(capped_list(&header, lines, SEARCH_RESULT_CAP)))
            }
            Err(e) => {
                warn!(error = %e, query, "search_projects failed");
                Ok(ToolResult::failure(format!("Error searching projects: {e}")))
            }
        }
    }
}

pub struct GetProjectDetailsTool {
    client: Arc<ProjectsClient>,
}

impl GetProjectDetailsTool {
    pub fn new(client: Arc<ProjectsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetProjectDetailsTool {
    fn name(&self) -> &str {
        "get_project_details"
    }

    fn description(&self) -> &str {
        "Get detailed information about a specific project by its ID."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": { "type": "string", "description": "ID of the project" }
            },
            "required": ["project_id"]
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        let project_id = required_str(&args, "project_id")?;
        match self.client.get_project_details(project_id).await {
            Ok(Some(project)) => Ok(ToolResult::ok(project_details(&project))),
            Ok(None) => Ok(ToolResult::ok(format!(
                "No project found with ID {project_id}."
            ))),
            Err(e) => {
                warn!(error = %e, project_id, "get_project_details failed");
                Ok(ToolResult::failure(format!(
                    "Error getting project details: {e}"
                )))
            }
        }
    }
}

fn project_details(project: &Value) -> String {
    let mut out = format!(
        "Project: {}\nID: {}\nStatus: {}",
        field(project, "name", "Unknown"),
        field(project, "id_string", field(project, "id", "N/A")),
        field(project, "status", "unknown"),
    );
    let description = field(project, "description", "");
    if !description.is_empty() {
        out.push_str(&format!(
            "\nDescription: {}",
            preview(description, PREVIEW_CHARS)
        ));
    }
    if let Some(owner) = project.get("owner_name").and_then(Value::as_str) {
        out.push_str(&format!("\nOwner: {owner}"));
    }
    if let Some(counts) = project.get("task_count") {
        let open = counts.get("open").and_then(Value::as_u64).unwrap_or(0);
        let closed = counts.get("closed").and_then(Value::as_u64).unwrap_or(0);
        out.push_str(&format!("\nTasks: {open} open, {closed} closed"));
    }
    if let Some(start) = project.get("start_date").and_then(Value::as_str) {
        out.push_str(&format!("\nStart date: {start}"));
    }
    if let Some(end) = project.get("end_date").and_then(Value::as_str) {
        out.push_str(&format!("\nEnd date: {end}"));
    }
    out
}

pub struct CreateProjectTool {
    client: Arc<ProjectsClient>,
}

impl CreateProjectTool {
    pub fn new(client: Arc<ProjectsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateProjectTool {
    fn name(&self) -> &str {
        "create_project"
    }

    fn description(&self) -> &str {
        "Create a new project with a name and optional description and start/end dates."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Name of the project" },
                "description": { "type": "string", "description": "Description of the project" },
                "start_date": { "type": "string", "description": "Start date in MM-DD-YYYY format" },
                "end_date": { "type": "string", "description": "End date in MM-DD-YYYY format" }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        let name = required_str(&args, "name")?;
        let data = build_create_body(name, &args);

        match self.client.create_project(&data).await {
            Ok(Some(project)) => Ok(ToolResult::ok(format!(
                "Project created successfully.\nName: {}\nID: {}",
                field(&project, "name", name),
                field(&project, "id_string", field(&project, "id", "N/A")),
            ))),
            Ok(None) => Ok(ToolResult::failure(
                "Failed to create project: no data returned.".to_string(),
            )),
            Err(e) => {
                warn!(error = %e, name, "create_project failed");
                Ok(ToolResult::failure(format!("Error creating project: {e}")))
            }
        }
    }
}

fn build_create_body(name: &str, args: &Value) -> Value {
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
    data
}
