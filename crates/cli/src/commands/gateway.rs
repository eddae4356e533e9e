//! `taskpilot gateway`: start the HTTP server.

use super::build_runtime;
use std::sync::Arc;
use taskpilot_gateway::GatewayState;
use tracing::info;

pub async fn run(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = build_runtime()?;
    let host = runtime.config.gateway.host.clone();
    let port = port.unwrap_or(runtime.config.gateway.port);

    let state = Arc::new(GatewayState {
        agent: runtime.agent,
        client: runtime.client,
        portal_id: runtime.config.projects.portal_id.clone(),
        cliq_shared_secret: runtime.config.cliq.shared_secret.clone(),
    });

    info!(host, port, "Starting gateway");
    taskpilot_gateway::start(state, &host, port).await
}
