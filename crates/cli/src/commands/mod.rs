pub mod chat;
pub mod gateway;
pub mod status;
pub mod tools;

use std::sync::Arc;
use taskpilot_agent::{Agent, AgentOptions};
use taskpilot_config::AppConfig;
use taskpilot_core::event::{DomainEvent, EventBus};
use taskpilot_projects::ProjectsClient;
use taskpilot_providers::OpenAiCompatProvider;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// Everything a command needs, built once from the loaded config.
pub struct Runtime {
    pub config: AppConfig,
    pub client: Arc<ProjectsClient>,
    pub agent: Arc<Agent>,
}

/// Load config and assemble the provider, client, tools, and agent.
pub fn build_runtime() -> Result<Runtime, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // validate() guarantees the key is present.
    let api_key = config.model.api_key.clone().unwrap_or_default();
    let provider = Arc::new(OpenAiCompatProvider::new(
        "openai",
        config.model.base_url.clone(),
        api_key,
    )?);

    let events = Arc::new(EventBus::default());
    spawn_event_logger(&events);
    let client = Arc::new(ProjectsClient::new(&config.projects)?.with_event_bus(events.clone()));
    let registry = Arc::new(taskpilot_tools::default_registry(client.clone()));

    let agent = Agent::new(provider, registry, AgentOptions::from_config(&config))
        .with_event_bus(events);

    Ok(Runtime {
        config,
        client,
        agent: Arc::new(agent),
    })
}

/// Forward domain events to the log output. The task runs until the bus is
/// dropped; lagged receivers skip ahead rather than exiting.
fn spawn_event_logger(events: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            };
            match event.as_ref() {
                DomainEvent::ResponseGenerated {
                    model,
                    rounds,
                    tokens_used,
                    ..
                } => debug!(model = %model, rounds, tokens_used, "response generated"),
                DomainEvent::ToolExecuted {
                    tool_name,
                    success,
                    duration_ms,
                    ..
                } => debug!(tool = %tool_name, success, duration_ms, "tool executed"),
                DomainEvent::CredentialRefreshed { expires_at, .. } => {
                    debug!(expires_at = %expires_at, "access credential refreshed")
                }
                DomainEvent::ErrorOccurred {
                    context,
                    error_message,
                    ..
                } => warn!(context = %context, error = %error_message, "error reported"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn event_logger_drains_bus_and_exits_on_close() {
        let bus = EventBus::default();
        let handle = spawn_event_logger(&bus);

        bus.publish(DomainEvent::ToolExecuted {
            tool_name: "search_projects".into(),
            success: true,
            duration_ms: 12,
            timestamp: Utc::now(),
        });
        bus.publish(DomainEvent::ErrorOccurred {
            context: "chat".into(),
            error_message: "provider unreachable".into(),
            timestamp: Utc::now(),
        });

        drop(bus);
        handle.await.unwrap();
    }
}
