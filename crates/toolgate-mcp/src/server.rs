//! Serving entry points: one session on stdio, or many over TCP.

use crate::session::run_session;
use crate::state::GatewayState;
use crate::McpResult;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Serve a single session over stdin/stdout.
pub async fn serve_stdio(state: Arc<GatewayState>) -> McpResult<()> {
    info!(tools = state.registry.len(), "starting gateway (stdio)");
    run_session(state, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Accept connections on `addr`, one concurrent session per client.
pub async fn serve_tcp(state: Arc<GatewayState>, addr: &str) -> McpResult<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr, tools = state.registry.len(), "starting gateway (tcp)");

    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "session opened");
        let state = state.clone();
        tokio::spawn(async move {
            let (reader, writer) = stream.into_split();
            if let Err(e) = run_session(state, reader, writer).await {
                warn!(%peer, error = %e, "session ended with error");
            } else {
                info!(%peer, "session closed");
            }
        });
    }
}
