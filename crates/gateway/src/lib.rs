//! HTTP gateway for the project-management assistant.
//!
//! Exposes the chat API (`/chat`, `/history`, `/clear`, `/tools`,
//! `/status`, `/health`) and the Cliq webhook (`/cliq/webhook`,
//! `/cliq/status`). Built on axum.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use taskpilot_agent::Agent;
use taskpilot_channels::cliq::{self, CliqMessage, CliqResponse};
use taskpilot_projects::ProjectsClient;
use tracing::{info, warn};

/// Header carrying the webhook signature, when validation is configured.
const SIGNATURE_HEADER: &str = "x-cliq-signature";

/// Shared state for all gateway routes.
pub struct GatewayState {
    pub agent: Arc<Agent>,
    pub client: Arc<ProjectsClient>,
    pub portal_id: String,
    pub cliq_shared_secret: Option<String>,
}

type SharedState = Arc<GatewayState>;

/// Build the axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/history", get(history_handler))
        .route("/clear", post(clear_handler))
        .route("/tools", get(tools_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .route("/cliq/webhook", post(cliq_webhook_handler))
        .route("/cliq/status", get(cliq_status_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn start(
    state: SharedState,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr, "Gateway listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Anonymous HTTP chat: no caller identity, so identity-scoped tools
/// refuse on their own.
async fn chat_handler(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    if request.message.trim().is_empty() {
        return Json(ChatResponse {
            response: String::new(),
            success: false,
            error: Some("Message must not be empty".to_string()),
        });
    }

    let response = state.agent.chat(&request.message, None).await;
    Json(ChatResponse {
        response,
        success: true,
        error: None,
    })
}

async fn history_handler(State(state): State<SharedState>) -> Json<Value> {
    let history: Vec<Value> = state
        .agent
        .history()
        .await
        .into_iter()
        .map(|m| {
            let kind = match m.role {
                taskpilot_core::message::Role::User => "human",
                taskpilot_core::message::Role::Assistant => "ai",
                _ => "other",
            };
            json!({"type": kind, "content": m.content})
        })
        .collect();
    Json(json!({"history": history, "success": true}))
}

async fn clear_handler(State(state): State<SharedState>) -> Json<Value> {
    state.agent.clear().await;
    Json(json!({"success": true, "message": "History cleared"}))
}

async fn tools_handler(State(state): State<SharedState>) -> Json<Value> {
    let tools: Vec<Value> = state
        .agent
        .list_tools()
        .into_iter()
        .map(|(name, description)| json!({"name": name, "description": description}))
        .collect();
    Json(json!({"tools": tools, "success": true}))
}

/// Connectivity probe: listing projects exercises the whole credential and
/// request path.
async fn status_handler(State(state): State<SharedState>) -> Json<Value> {
    match state.client.get_all_projects("active").await {
        Ok(projects) => Json(json!({
            "success": true,
            "status": {
                "model": state.agent.model(),
                "portal": state.portal_id,
                "projects_count": projects.len(),
                "agent_initialized": true,
            }
        })),
        Err(e) => {
            warn!(error = %e, "Status probe failed");
            Json(json!({"success": false, "error": e.to_string()}))
        }
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({"status": "healthy", "agent_ready": true}))
}

async fn cliq_status_handler() -> Json<Value> {
    Json(json!({
        "status": "active",
        "agent_ready": true,
        "integration": "cliq",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Webhook entry: validate the signature against the raw payload, decide
/// whether the message is addressed to the bot, and reply through the
/// long-output policy.
async fn cliq_webhook_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<CliqResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !cliq::validate_signature(state.cliq_shared_secret.as_deref(), &body, signature) {
        warn!("Rejected webhook with invalid signature");
        return Json(CliqResponse::silent());
    }

    let message: CliqMessage = match serde_json::from_slice(&body) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "Malformed webhook payload");
            return Json(CliqResponse::silent());
        }
    };

    if !message.should_respond() {
        return Json(CliqResponse::silent());
    }

    let utterance = message.clean_text();
    if utterance.is_empty() {
        return Json(cliq::help_response());
    }

    let caller = message.user.id.as_deref();
    let user_name = message.user.name.as_deref().unwrap_or("there");
    let reply = state.agent.chat(&utterance, caller).await;
    Json(cliq::format_response(&reply, user_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use taskpilot_core::error::ProviderError;
    use taskpilot_core::message::Message;
    use taskpilot_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use taskpilot_core::tool::ToolRegistry;
    use tower::ServiceExt;

    /// Always answers with the same text; echoes caller-free behavior.
    struct StaticProvider;

    #[async_trait]
    impl Provider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }
        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: Message::assistant("You have 3 active projects."),
                usage: None,
                model: "static".to_string(),
            })
        }
    }

    fn test_state(secret: Option<&str>) -> SharedState {
        let agent = Agent::new(
            Arc::new(StaticProvider),
            Arc::new(ToolRegistry::new()),
            taskpilot_agent::AgentOptions::default(),
        );
        let config = taskpilot_config::ProjectsConfig {
            client_id: "cid".into(),
            client_secret: "cs".into(),
            refresh_token: "rt".into(),
            portal_id: "700".into(),
            ..Default::default()
        };
        Arc::new(GatewayState {
            agent: Arc::new(agent),
            client: Arc::new(ProjectsClient::new(&config).unwrap()),
            portal_id: "700".into(),
            cliq_shared_secret: secret.map(str::to_string),
        })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state(None));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn chat_round_trip() {
        let app = build_router(test_state(None));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"message": "how many projects?"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["response"], "You have 3 active projects.");
    }

    #[tokio::test]
    async fn empty_chat_message_rejected() {
        let app = build_router(test_state(None));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"message": "   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn history_reflects_exchanges() {
        let state = test_state(None);
        state.agent.chat("hello", None).await;
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        let history = body["history"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["type"], "human");
        assert_eq!(history[1]["type"], "ai");
    }

    #[tokio::test]
    async fn clear_resets_history() {
        let state = test_state(None);
        state.agent.chat("hello", None).await;
        let app = build_router(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/clear")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.agent.history().await.is_empty());
    }

    #[tokio::test]
    async fn tools_endpoint_lists_registry() {
        let app = build_router(test_state(None));
        let response = app
            .oneshot(Request::builder().uri("/tools").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert!(body["tools"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn webhook_ignores_bot_senders() {
        let app = build_router(test_state(None));
        let payload = r#"{"text": "hi", "user": {"id": "b1", "is_bot": true}, "chat": {"type": "direct"}}"#;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/cliq/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["text"], "");
    }

    #[tokio::test]
    async fn webhook_direct_message_gets_reply() {
        let app = build_router(test_state(None));
        let payload =
            r#"{"text": "how many projects?", "user": {"id": "u1", "name": "Priya"}, "chat": {"type": "direct"}}"#;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/cliq/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["text"], "You have 3 active projects.");
    }

    #[tokio::test]
    async fn webhook_rejects_bad_signature() {
        let app = build_router(test_state(Some("secret")));
        let payload = r#"{"text": "hi", "user": {"id": "u1"}, "chat": {"type": "direct"}}"#;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/cliq/webhook")
                    .header("content-type", "application/json")
                    .header(SIGNATURE_HEADER, "deadbeef")
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["text"], "");
    }

    #[tokio::test]
    async fn webhook_accepts_valid_signature() {
        use hmac::{Hmac, Mac};
        let payload = r#"{"text": "how many projects?", "user": {"id": "u1"}, "chat": {"type": "direct"}}"#;
        let mut mac = Hmac::<sha2::Sha256>::new_from_slice(b"secret").unwrap();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let app = build_router(test_state(Some("secret")));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/cliq/webhook")
                    .header("content-type", "application/json")
                    .header(SIGNATURE_HEADER, signature)
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["text"], "You have 3 active projects.");
    }

    #[tokio::test]
    async fn cliq_status_endpoint() {
        let app = build_router(test_state(None));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/cliq/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["status"], "active");
        assert_eq!(body["integration"], "cliq");
    }
}
