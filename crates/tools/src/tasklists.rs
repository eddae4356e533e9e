//! Task list tools: list and create.

use crate::format::field;
use crate::{optional_str, required_str};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::{Tool, ToolContext, ToolResult};
use taskpilot_projects::ProjectsClient;
use tracing::warn;

pub struct GetTasklistsTool {
    client: Arc<ProjectsClient>,
}

impl GetTasklistsTool {
    pub fn new(client: Arc<ProjectsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetTasklistsTool {
    fn name(&self) -> &str {
        "get_tasklists"
    }

    fn description(&self) -> &str {
        "List the task lists in a project."
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
        match self.client.get_all_tasklists(project_id).await {
            Ok(tasklists) if tasklists.is_empty() => Ok(ToolResult::ok(format!(
                "No task lists found in project {project_id}."
            ))),
            Ok(tasklists) => {
                let mut out = format!("Found {} task lists:\n", tasklists.len());
                for tasklist in &tasklists {
                    let completed = tasklist
                        .get("completed")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    out.push_str(&format!(
                        "\n- {} (ID: {}) [{}]",
                        field(tasklist, "name", "Unknown"),
                        field(tasklist, "id_string", field(tasklist, "id", "N/A")),
                        if completed { "Completed" } else { "Active" },
                    ));
                }
                Ok(ToolResult::ok(out))
            }
            Err(e) => {
                warn!(error = %e, project_id, "get_tasklists failed");
                Ok(ToolResult::failure(format!("Error getting task lists: {e}")))
            }
        }
    }
}

pub struct CreateTasklistTool {
    client: Arc<ProjectsClient>,
}

impl CreateTasklistTool {
    pub fn new(client: Arc<ProjectsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateTasklistTool {
    fn name(&self) -> &str {
        "create_tasklist"
    }

    fn description(&self) -> &str {
        "Create a new task list in a project. The flag is 'internal' or 'external' (default internal)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": { "type": "string", "description": "ID of the project" },
                "name": { "type": "string", "description": "Name of the task list" },
                "flag": { "type": "string", "enum": ["internal", "external"], "description": "Visibility flag" }
            },
            "required": ["project_id", "name"]
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<ToolResult, ToolError> {
        let project_id = required_str(&args, "project_id")?;
        let name = required_str(&args, "name")?;
        let flag = optional_str(&args, "flag").unwrap_or("internal");
        if flag != "internal" && flag != "external" {
            return Err(ToolError::InvalidArguments(format!(
                "Invalid flag '{flag}': must be 'internal' or 'external'"
            )));
        }

        let data = json!({ "name": name, "flag": flag });
        match self.client.create_tasklist(project_id, &data).await {
            Ok(Some(tasklist)) => Ok(ToolResult::ok(format!(
                "Task list created successfully.\nName: {}\nID: {}",
                field(&tasklist, "name", name),
                field(&tasklist, "id_string", field(&tasklist, "id", "N/A")),
            ))),
            Ok(None) => Ok(ToolResult::failure(
                "Failed to create task list: no data returned.".to_string(),
            )),
            Err(e) => {
                warn!(error = %e, project_id, name, "create_tasklist failed");
                Ok(ToolResult::failure(format!(
                    "Error creating task list: {e}"
                )))
            }
        }
    }
}
