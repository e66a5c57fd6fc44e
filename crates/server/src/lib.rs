//! # DeskPilot Server
//!
//! HTTP surface of the prompt-to-action engine.
//!
//! ## Endpoints
//!
//! - `POST /execute`: resolve a prompt and return the execution script
//! - `GET /monitor`: the most recent resolved executions
//! - `POST /register_function`: add an action to the live catalog
//!
//! The server resolves and renders; it never runs actions itself. The
//! returned script invokes the `deskpilot` binary so execution stays in
//! the caller's hands.

mod routes;
mod state;

pub use routes::app;
pub use state::{AppState, ExecutionLog};

use anyhow::Result;

/// Binds `bind` and serves the API until the process is stopped.
pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    let local_addr = listener.local_addr()?;
    log::info!("Serving DeskPilot API on http://{local_addr}");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
