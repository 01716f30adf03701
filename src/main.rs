use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paylink::application::orchestrator::PaymentOrchestrator;
use paylink::config::AppConfig;
use paylink::domain::ports::PaymentStoreBox;
use paylink::error::ErrorResponse;
use paylink::infrastructure::build_selector;
use paylink::infrastructure::in_memory::InMemoryPaymentStore;
use paylink::interfaces::cli::{self, Cli};
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the JSON result only.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().into_diagnostic()?;
    let store = open_store(cli.db_path.as_deref())?;
    let selector = build_selector(&config).into_diagnostic()?;
    let orchestrator = PaymentOrchestrator::new(store, selector, config.currency);

    match cli::execute(cli.command, &orchestrator).await {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body).into_diagnostic()?);
            Ok(())
        }
        Err(e) => {
            let body = ErrorResponse::from(&e);
            println!("{}", serde_json::to_string_pretty(&body).into_diagnostic()?);
            std::process::exit(cli::exit_code(&e));
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(db_path: Option<&Path>) -> Result<PaymentStoreBox> {
    use paylink::infrastructure::rocksdb::RocksDBPaymentStore;

    Ok(match db_path {
        Some(path) => Box::new(RocksDBPaymentStore::open(path).into_diagnostic()?),
        None => Box::new(InMemoryPaymentStore::new()),
    })
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(db_path: Option<&Path>) -> Result<PaymentStoreBox> {
    if db_path.is_some() {
        tracing::warn!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Box::new(InMemoryPaymentStore::new()))
}
