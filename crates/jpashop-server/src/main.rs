//! jpashop server - runs order query endpoints and prints their JSON bodies.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jpashop_server::{Args, Database, RequestHandler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jpashop_server=info,jpashop_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting jpashop server");

    // Parse command-line arguments
    let config = Args::parse().into_config()?;

    tracing::info!(
        data_path = %config.data_path.display(),
        temporary = config.temporary,
        max_results = config.budget.max_results,
        max_batch_size = config.budget.max_batch_size,
        collection_paging = ?config.budget.collection_paging,
        "configuration loaded"
    );

    let database = Arc::new(Database::open(&config)?);
    let handler = Arc::new(RequestHandler::new(database.clone(), config.budget.clone()));

    // One blocking task per request, each with its own session
    let mut requests = Vec::with_capacity(config.endpoints.len());
    for endpoint in config.endpoints.iter().copied() {
        let handler = handler.clone();
        let search = config.search.clone();
        let pagination = config.pagination;
        requests.push((
            endpoint,
            tokio::task::spawn_blocking(move || handler.handle_or_error(endpoint, &search, pagination)),
        ));
    }

    for (endpoint, request) in requests {
        let body = request.await?;
        println!("{endpoint}: {}", serde_json::to_string_pretty(&body)?);
    }

    tracing::info!(
        queries = database.store().queries_issued(),
        "all endpoints served"
    );
    database.store().flush()?;

    Ok(())
}
