//! Fixed system instructions for the assistant.

/// Build the system prompt. The tool list is rendered from the live
/// registry so the prompt never drifts from what is actually registered.
pub fn system_prompt(tool_summaries: &[(String, String)]) -> String {
    let mut tools = String::new();
    for (name, description) in tool_summaries {
        tools.push_str(&format!("- {name}: {description}\n"));
    }

    format!(
        "You are an intelligent assistant for a project-management platform. \
You help users manage their projects, tasks, task lists, and time tracking \
through natural conversation.

Available tools:
{tools}
Guidelines:
1. Be conversational and helpful; ask clarifying questions when needed.
2. Use tools to answer; when users mention projects or tasks by name, search for them first.
3. Include project and task IDs in results so users can refer to them later.
4. Summarize actions taken and their results.
5. Keep responses under 2500 characters. Be direct and focused.
6. If something fails, explain what happened and suggest alternatives.

Data formats:
- Dates: MM-DD-YYYY (e.g., \"12-25-2026\")
- Time: HH:MM (e.g., \"02:30\" for 2 hours 30 minutes)
- Priorities: None, Low, Medium, High
- Bill status: Billable, Non Billable

If you are unsure about something, ask for clarification rather than making \
assumptions."
    )
}

/// Reply used when the round ceiling is reached without a final answer.
pub const ROUND_CEILING_REPLY: &str =
    "I wasn't able to complete that request within the allowed number of steps. \
Please try rephrasing it or breaking it into smaller parts.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_registered_tools() {
        let tools = vec![
            ("search_projects".to_string(), "Find projects".to_string()),
            ("create_task".to_string(), "Create a task".to_string()),
        ];
        let prompt = system_prompt(&tools);
        assert!(prompt.contains("- search_projects: Find projects"));
        assert!(prompt.contains("- create_task: Create a task"));
        assert!(prompt.contains("MM-DD-YYYY"));
        assert!(prompt.contains("Billable, Non Billable"));
    }
}
