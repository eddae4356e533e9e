//! Built-in tools for the project-management assistant.
//!
//! Every tool validates its arguments before touching the network, and
//! reports downstream API failures as unsuccessful results rather than
//! errors, so one bad call never aborts the agent loop.

pub mod format;
pub mod projects;
pub mod tasklists;
pub mod tasks;
pub mod timelogs;

use std::sync::Arc;
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::ToolRegistry;
use taskpilot_projects::ProjectsClient;

/// Build the full registry of project-management tools, all sharing one
/// client.
pub fn default_registry(client: Arc<ProjectsClient>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Box::new(projects::ListAllProjectsTool::new(client.clone())));
    registry.register(Box::new(projects::SearchProjectsTool::new(client.clone())));
    registry.register(Box::new(projects::GetProjectDetailsTool::new(
        client.clone(),
    )));
    registry.register(Box::new(projects::CreateProjectTool::new(client.clone())));

    registry.register(Box::new(tasks::SearchTasksTool::new(client.clone())));
    registry.register(Box::new(tasks::GetTaskDetailsTool::new(client.clone())));
    registry.register(Box::new(tasks::CreateTaskTool::new(client.clone())));
    registry.register(Box::new(tasks::UpdateTaskTool::new(client.clone())));

    registry.register(Box::new(tasklists::GetTasklistsTool::new(client.clone())));
    registry.register(Box::new(tasklists::CreateTasklistTool::new(client.clone())));

    registry.register(Box::new(timelogs::GetTimeLogsTool::new(client.clone())));
    registry.register(Box::new(timelogs::GetAllTimeLogsTool::new(client.clone())));
    registry.register(Box::new(timelogs::AddTimeLogTool::new(client)));

    registry
}

/// A required string argument, rejecting absent or empty values.
pub(crate) fn required_str<'a>(
    args: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, ToolError> {
    match args.get(key).and_then(serde_json::Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ToolError::InvalidArguments(format!(
            "Missing required argument '{key}'"
        ))),
    }
}

/// An optional string argument; absent and empty are both `None`.
pub(crate) fn optional_str<'a>(args: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_str_rejects_blank() {
        let args = json!({"name": "  ", "other": "ok"});
        assert!(required_str(&args, "name").is_err());
        assert!(required_str(&args, "missing").is_err());
        assert_eq!(required_str(&args, "other").unwrap(), "ok");
    }

    #[test]
    fn optional_str_filters_blank() {
        let args = json!({"notes": "", "detail": "x"});
        assert_eq!(optional_str(&args, "notes"), None);
        assert_eq!(optional_str(&args, "detail"), Some("x"));
        assert_eq!(optional_str(&args, "absent"), None);
    }
}
