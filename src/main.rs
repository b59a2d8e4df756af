use clap::Parser;
use tracing::error;

use post_burst::client::build_client;
use post_burst::config::{Args, Config};
use post_burst::errors::BurstError;
use post_burst::payload;
use post_burst::runner::dispatch;
use post_burst::telemetry::init_tracing;

#[tokio::main]
async fn main() {
    // Bad or missing arguments exit here with clap's usage error.
    let args = Args::parse();

    let config = match Config::from_env(args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.log_format);

    if let Err(e) = run(config).await {
        error!(error = %e, "Burst aborted");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), BurstError> {
    let payload = payload::load()?;
    let client = build_client(config.num_workers)?;

    config.log_summary();

    let report = dispatch(client, &config, payload).await;
    println!("{}", report.elapsed_line());

    Ok(())
}
