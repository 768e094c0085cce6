use clap::Parser;
use tracing_subscriber::EnvFilter;

use trichat::cli::Args;

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr so they never interleave with the chat UI.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = trichat::cli::run(args).await {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}
