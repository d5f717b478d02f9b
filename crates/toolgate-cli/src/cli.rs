//! CLI argument definitions using clap

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "toolgate",
    about = "Toolgate - tool-invocation gateway for search, filesystem and PostgreSQL backends",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway and serve tool-call sessions
    Serve {
        /// Backends to construct and register at startup
        #[arg(long = "backend", value_enum, required = true)]
        backends: Vec<Backend>,

        /// Host and port for TCP sessions; stdio is used when absent
        #[arg(long)]
        listen: Option<String>,

        /// Maximum concurrently executing tool calls
        #[arg(long, env = "TOOLGATE_MAX_CONCURRENCY", default_value = "10")]
        max_concurrency: usize,

        /// Per-call execution timeout in seconds
        #[arg(long, env = "TOOLGATE_TIMEOUT_SECS", default_value = "30")]
        timeout_secs: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Web search over the configured search API
    Search,
    /// File tools confined to ALLOWED_BASE_PATH
    Files,
    /// Parameterized queries against DATABASE_URL
    Postgres,
}
