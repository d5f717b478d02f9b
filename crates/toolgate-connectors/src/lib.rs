//! Backend adapters for the toolgate gateway.
//!
//! Each adapter owns one long-lived backend connection (HTTP client,
//! confined filesystem root, database pool) and exposes its operations as
//! [`toolgate_core::ToolHandler`] implementations.

pub mod error;

#[cfg(feature = "search")]
pub mod search;

#[cfg(feature = "filesystem")]
pub mod fs;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use error::{ConnectorError, ConnectorResult};

#[cfg(feature = "search")]
pub use search::{SearchClient, SearchConfig, SearchTool};

#[cfg(feature = "filesystem")]
pub use fs::{FsConfig, PathGuard};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresConfig, PostgresExecutor};
