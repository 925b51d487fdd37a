//! A waitlist signup service: one public endpoint that records email signups and a
//! secret-gated listing of the most recent ones.

pub mod app;
pub mod config;
pub mod database;
mod error;
pub mod store;
pub mod web;

pub use app::{serve, App, AppState};
pub use error::{Error, Result};

use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "waitlist=info,tower_http=info";

/// Human readable logging for debug builds.
pub fn init_dbg_tracing() {
    tracing_subscriber::fmt()
        .without_time()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(env_filter())
        .compact()
        .init();
}

/// Plain, ANSI-free logging for release builds.
pub fn init_production_tracing() {
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_target(true)
        .with_env_filter(env_filter())
        .init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}
