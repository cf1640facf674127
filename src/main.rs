use anyhow::{Context, Result};
use std::sync::Arc;

mod config;
mod error;
mod logging;
mod routes;
mod services;
pub mod models;

use error::AppError;
use services::page::PageOptions;
use services::pipeline::{build_dashboard, PipelineOptions};
use services::sheets::SheetSource;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::load_config()?;

    // Fetch the responses tab once; any failure stops startup
    let source = SheetSource::from_config(&config)?;
    let table = tokio::time::timeout(config.fetch_timeout, source.fetch_records())
        .await
        .map_err(|_| {
            AppError::Fetch(format!(
                "Fetching sheet {} timed out after {:?}",
                config.sheet_name, config.fetch_timeout
            ))
        })??;

    // Normalize, aggregate and bind the charts
    let dashboard = build_dashboard(
        &table,
        PipelineOptions {
            header_policy: config.header_policy,
            flag_policy: config.flag_policy,
        },
    )
    .context("Failed to build dashboard")?;

    let summaries = &dashboard.summaries;
    tracing::info!(
        "Dashboard covers {} visitors from {} countries over {} months, {} visit reasons",
        summaries.party_size_by_country.total(),
        summaries.party_size_by_country.len(),
        summaries.responses_by_month.len(),
        summaries.visit_reasons.len()
    );

    let page = dashboard.render(&PageOptions {
        contact: config.contact.clone(),
        show_avatar: config.avatar_path.is_some(),
    });

    // Build our application state
    let state = Arc::new(AppState::new(page));
    let app = routes::router(state, config.avatar_path.as_deref());

    // Run it
    let addr = config.socket_addr();
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// Application state
#[derive(Clone)]
pub struct AppState {
    page: String,
}

impl AppState {
    fn new(page: String) -> Self {
        Self { page }
    }
}
