//! The agent loop: bounded rounds of "ask the model; run requested tools;
//! feed results back" until the model produces plain text.

use crate::instructions::{system_prompt, ROUND_CEILING_REPLY};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use taskpilot_core::error::Error;
use taskpilot_core::event::{DomainEvent, EventBus};
use taskpilot_core::memory::ConversationWindow;
use taskpilot_core::message::Message;
use taskpilot_core::provider::{Provider, ProviderRequest, ToolDefinition};
use taskpilot_core::tool::{ToolCall, ToolContext, ToolRegistry};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Tunables for the loop; defaults mirror the configuration defaults.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub max_rounds: u32,
    pub window_exchanges: usize,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            max_tokens: Some(2700),
            max_rounds: 10,
            window_exchanges: 10,
        }
    }
}

impl AgentOptions {
    pub fn from_config(config: &taskpilot_config::AppConfig) -> Self {
        Self {
            model: config.model.name.clone(),
            temperature: config.model.temperature,
            max_tokens: Some(config.model.max_tokens),
            max_rounds: config.agent.max_rounds,
            window_exchanges: config.agent.window_exchanges,
        }
    }
}

/// One agent instance per logical conversation. `chat` is total: whatever
/// goes wrong inside, the caller gets a string back.
pub struct Agent {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    memory: Mutex<ConversationWindow>,
    options: AgentOptions,
    events: Option<Arc<EventBus>>,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn Provider>,
        registry: Arc<ToolRegistry>,
        options: AgentOptions,
    ) -> Self {
        let memory = Mutex::new(ConversationWindow::new(options.window_exchanges));
        Self {
            provider,
            registry,
            memory,
            options,
            events: None,
        }
    }

    /// Attach an event bus for response and tool-execution events.
    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Process one user utterance and return the reply.
    ///
    /// `caller` is the identity of the requesting user when the channel
    /// knows it (webhook channels do; anonymous HTTP chat passes `None`).
    /// Never fails: errors surface as an apologetic reply string.
    pub async fn chat(&self, utterance: &str, caller: Option<&str>) -> String {
        info!(caller = caller.unwrap_or("<anonymous>"), "User message");
        match self.run_exchange(utterance, caller).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Exchange failed");
                if let Some(events) = &self.events {
                    events.publish(DomainEvent::ErrorOccurred {
                        context: "chat".to_string(),
                        error_message: e.to_string(),
                        timestamp: Utc::now(),
                    });
                }
                format!("An error occurred: {e}")
            }
        }
    }

    async fn run_exchange(&self, utterance: &str, caller: Option<&str>) -> Result<String, Error> {
        let tool_context = match caller {
            Some(id) => ToolContext::for_caller(id),
            None => ToolContext::default(),
        };

        let summaries: Vec<(String, String)> = self
            .registry
            .definitions()
            .into_iter()
            .map(|d| (d.name, d.description))
            .collect();

        // Scratch context for this exchange: instructions, window snapshot,
        // then the new utterance. Tool traffic accumulates here but only the
        // final (user, assistant) pair is committed to memory.
        let mut context = vec![Message::system(system_prompt(&summaries))];
        context.extend(self.memory.lock().await.snapshot());
        context.push(Message::user(utterance));

        let definitions = self.registry.definitions();
        let mut tokens_used = 0u32;

        for round in 1..=self.options.max_rounds {
            let response = self
                .provider
                .complete(self.build_request(context.clone(), definitions.clone()))
                .await?;

            if let Some(usage) = &response.usage {
                tokens_used += usage.total_tokens;
            }

            if response.message.tool_calls.is_empty() {
                let reply = response.message.content.clone();
                self.commit_exchange(utterance, &reply).await;
                if let Some(events) = &self.events {
                    events.publish(DomainEvent::ResponseGenerated {
                        model: response.model,
                        rounds: round,
                        tokens_used,
                        timestamp: Utc::now(),
                    });
                }
                return Ok(reply);
            }

            let requested = response.message.tool_calls.clone();
            context.push(response.message);

            // Every requested tool runs and reports back before the next
            // model call, failures included.
            for call in requested {
                let output = self.run_tool(&tool_context, &call.id, &call.name, &call.arguments).await;
                context.push(Message::tool_result(call.id, output));
            }
        }

        warn!(
            max_rounds = self.options.max_rounds,
            "Round ceiling reached without a final answer"
        );
        self.commit_exchange(utterance, ROUND_CEILING_REPLY).await;
        Ok(ROUND_CEILING_REPLY.to_string())
    }

    /// Execute one tool call, folding every failure into readable text.
    async fn run_tool(
        &self,
        tool_context: &ToolContext,
        call_id: &str,
        name: &str,
        raw_arguments: &str,
    ) -> String {
        let arguments: serde_json::Value = match serde_json::from_str(raw_arguments) {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = name, error = %e, "Malformed tool arguments");
                return format!("Error: tool arguments were not valid JSON: {e}");
            }
        };

        let call = ToolCall {
            id: call_id.to_string(),
            name: name.to_string(),
            arguments,
        };

        let started = Instant::now();
        let (success, output) = match self.registry.execute(tool_context, &call).await {
            Ok(result) => (result.success, result.output),
            Err(e) => (false, format!("Error: {e}")),
        };

        if let Some(events) = &self.events {
            events.publish(DomainEvent::ToolExecuted {
                tool_name: name.to_string(),
                success,
                duration_ms: started.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
            });
        }
        info!(tool = name, success, "Tool executed");
        output
    }

    fn build_request(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
    ) -> ProviderRequest {
        ProviderRequest {
            model: self.options.model.clone(),
            messages,
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
            tools,
        }
    }

    async fn commit_exchange(&self, utterance: &str, reply: &str) {
        self.memory
            .lock()
            .await
            .push_exchange(Message::user(utterance), Message::assistant(reply));
    }

    /// Ordered snapshot of remembered turns.
    pub async fn history(&self) -> Vec<Message> {
        self.memory.lock().await.snapshot()
    }

    /// Forget the conversation so far.
    pub async fn clear(&self) {
        self.memory.lock().await.clear();
        info!("Conversation memory cleared");
    }

    /// Name and description of every registered tool.
    pub fn list_tools(&self) -> Vec<(String, String)> {
        self.registry
            .definitions()
            .into_iter()
            .map(|d| (d.name, d.description))
            .collect()
    }

    pub fn model(&self) -> &str {
        &self.options.model
    }
}
