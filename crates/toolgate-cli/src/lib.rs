//! Startup wiring: construct adapters from the environment, register
//! their tools, and hand the frozen registry to the transport.

pub mod cli;
pub mod error;

pub use error::{CliError, CliResult};

use cli::Backend;
use std::sync::Arc;
use std::time::Duration;
use toolgate_connectors::fs::{self, FsConfig};
use toolgate_connectors::postgres::{self, PostgresConfig};
use toolgate_connectors::search::{SearchConfig, SearchTool};
use toolgate_core::{Limits, ProcessEnv, ToolRegistry};
use toolgate_mcp::{serve_stdio, serve_tcp, GatewayState};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr: stdout is the wire in stdio mode.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Build the registry for the requested backends and serve.
///
/// Configuration is read once, here; a missing required variable fails
/// startup before any session is accepted.
pub async fn serve(
    backends: &[Backend],
    listen: Option<&str>,
    max_concurrency: usize,
    timeout_secs: u64,
) -> CliResult<()> {
    let env = ProcessEnv;
    let mut registry = ToolRegistry::new();

    let mut seen = Vec::new();
    for backend in backends {
        if seen.contains(backend) {
            continue;
        }
        seen.push(*backend);
        match backend {
            Backend::Search => {
                let config = SearchConfig::from_env(&env)?;
                SearchTool::register(&mut registry, &config)?;
                info!("registered search backend");
            }
            Backend::Files => {
                let config = FsConfig::from_env(&env)?;
                fs::register(&mut registry, &config)?;
                info!(base = %config.base_path.display(), "registered filesystem backend");
            }
            Backend::Postgres => {
                let config = PostgresConfig::from_env(&env)?;
                postgres::register(&mut registry, &config).await?;
                info!("registered postgres backend");
            }
        }
    }

    let limits = Limits::new(max_concurrency, Duration::from_secs(timeout_secs));
    info!(
        tools = registry.len(),
        max_concurrency = limits.max_concurrency,
        timeout = ?limits.call_timeout,
        "gateway ready"
    );
    let state = Arc::new(GatewayState::new(registry, limits));

    match listen {
        Some(addr) => serve_tcp(state, addr).await?,
        None => serve_stdio(state).await?,
    }
    Ok(())
}
