//! Entry point for the Refund Engine binary.
//!
//! Running this binary starts an HTTP server exposing season refund
//! reports.  Season data is read from a directory of JSON files; see
//! [`refund_engine::config::Arguments`] for the available flags and
//! their environment variables.

use clap::Parser;
use refund_engine::config::Arguments;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Arguments::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_filter))
        .init();
    tracing::info!("running refund_engine with arguments:\n{}", args);
    if let Err(err) = refund_engine::api::serve(&args).await {
        tracing::error!(?err, "server terminated");
        std::process::exit(1);
    }
}
