//! Shared gateway state handed to every session

use std::sync::Arc;
use toolgate_core::{Dispatcher, Limits, ToolRegistry};

#[derive(Clone)]
pub struct GatewayState {
    pub registry: Arc<ToolRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub server_name: String,
    pub server_version: String,
}

impl GatewayState {
    /// Freeze a populated registry and build the dispatcher over it.
    pub fn new(registry: ToolRegistry, limits: Limits) -> Self {
        let registry = Arc::new(registry);
        let dispatcher = Arc::new(Dispatcher::new(registry.clone(), limits));
        Self {
            registry,
            dispatcher,
            server_name: "toolgate".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
