use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use recollect_mcp_runtime::{Dispatcher, MemoryStore, serve_stdio};

#[derive(Parser)]
#[command(
    name = "recollect-mcp",
    version,
    about = "recollect tool server: newline-delimited JSON-RPC over stdio"
)]
struct Cli {
    /// Log filter (stderr only; stdout carries protocol traffic)
    #[arg(long, env = "RECOLLECT_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer one envelope per input line until stdin closes
    Serve,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let code = match cli.command {
        Command::Serve => {
            let dispatcher = Dispatcher::new(MemoryStore::new());
            match serve_stdio(&dispatcher).await {
                Ok(()) => 0,
                Err(err) => {
                    tracing::error!(error = %err, "stdio tool server failed");
                    1
                }
            }
        }
    };
    std::process::exit(code);
}
