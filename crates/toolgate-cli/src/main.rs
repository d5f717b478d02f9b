//! Toolgate CLI main entry point

use clap::Parser;
use toolgate_cli::cli::{Cli, Commands};
use toolgate_cli::{init_tracing, serve};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match cli.command {
        Commands::Serve { backends, listen, max_concurrency, timeout_secs } => {
            match serve(&backends, listen.as_deref(), max_concurrency, timeout_secs).await {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("Error: {e}");
                    e.exit_code()
                }
            }
        }
    };

    std::process::exit(exit_code);
}
