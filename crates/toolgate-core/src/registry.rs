//! In-memory tool registry.
//!
//! Registration happens once at startup; afterwards the registry is shared
//! behind an `Arc` and is read-only, so concurrent lookups need no locking.

use crate::error::RegistryError;
use crate::handler::ToolHandler;
use crate::types::ToolDescriptor;
use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: IndexMap::new() }
    }

    /// Register a handler under its descriptor's name.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> Result<(), RegistryError> {
        let name = handler.descriptor().name;
        if self.tools.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.tools.insert(name, handler);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ToolHandler>, RegistryError> {
        self.tools.get(name).cloned().ok_or_else(|| RegistryError::Unknown(name.to_string()))
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|h| h.descriptor()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
