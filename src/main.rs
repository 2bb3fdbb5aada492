//! This file defines the sales-analytics binary entry point.

use sales_analytics::app;
use sales_analytics::app_state::AppState;
use sales_analytics::cli;
use sales_analytics::metrics;
use sales_analytics::scheduler::Scheduler;
use sales_analytics::server;
use sales_analytics::tracing;

use std::sync::Arc;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing(&args);
    metrics::register_metrics().expect("failed to register metrics");
    let state = Arc::new(AppState::new(&args));
    let scheduler = Scheduler::from_state(&state).map(Scheduler::spawn);
    let service = app::service(state);
    server::serve(&args, service).await;
    if let Some(scheduler) = scheduler {
        scheduler.abort();
    }
    tracing::shutdown_tracing();
}
