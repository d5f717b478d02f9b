//! Toolgate core: the tool-invocation data model, registry and dispatcher.
//!
//! Backend adapters implement [`ToolHandler`] and are registered into a
//! [`ToolRegistry`] at startup; the [`Dispatcher`] validates and executes
//! calls, and the transport crate frames them on and off the wire.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod progress;
pub mod registry;
pub mod types;
pub mod validate;

pub use config::{ConfigError, ConfigResult, EnvSource, Limits, ProcessEnv};
pub use dispatch::Dispatcher;
pub use error::{RegistryError, ToolError};
pub use handler::{InvokeContext, ToolHandler};
pub use progress::{null_progress, NullProgress, ProgressSink};
pub use registry::ToolRegistry;
pub use types::{
    ParamKind, ParamSpec, ToolCallRequest, ToolDescriptor, ToolOutcome, ValidatedArgs,
};
pub use validate::validate_arguments;
