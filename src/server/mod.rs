//! HTTP surface of the scribe.
//!
//! The chat gateway posts inbound events here, and operators read room stats
//! or force a summary. Handlers only talk to the runtime through its
//! [`ScribeHandle`](crate::scribe::runtime::ScribeHandle).

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::scribe::core::errors::ScribeResult;

/// Router with the permissive CORS and request tracing layers applied.
#[must_use]
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve the API on all interfaces until `shutdown_signal` completes.
///
/// # Errors
/// Returns an error if the port cannot be bound or the accept loop fails.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    port: u16,
    shutdown_signal: F,
) -> ScribeResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Meeting scribe accepting gateway events");

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
