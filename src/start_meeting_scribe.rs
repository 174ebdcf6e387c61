//! Startup for the meeting scribe service.
//!
//! Wires configuration, the summarization backend, delivery, the runtime loop,
//! the ticker and the HTTP server, then waits for Ctrl-C or SIGTERM.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::scribe::core::config::ScribeConfig;
use crate::scribe::core::errors::ScribeResult;
use crate::scribe::delivery::sink::build_delivery;
use crate::scribe::runtime::{ScribeRuntime, TriggerTicker};
use crate::scribe::summarization::generator::SummaryGenerator;
use crate::scribe::summarization::summarizer::build_summarizer;
use crate::server::{self, AppState};

/// Run the service (used by the `meeting-scribe` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting Meeting Scribe v{}", env!("CARGO_PKG_VERSION"));

    let config = match ScribeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {e}");
            return ExitCode::from(1);
        }
    };
    config.log_summary();

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(serve(config)) {
        error!("Scribe error: {e}");
        return ExitCode::from(1);
    }

    info!("Meeting Scribe stopped");
    ExitCode::SUCCESS
}

/// Build every component and serve until a shutdown signal arrives.
///
/// # Errors
/// Returns an error if a backend cannot be built or the server fails.
pub async fn serve(config: ScribeConfig) -> ScribeResult<()> {
    let summarizer = build_summarizer(&config.llm)?;
    let generator = Arc::new(SummaryGenerator::new(
        summarizer,
        Duration::from_secs(config.llm.timeout_secs),
        config.report_language,
    ));
    let delivery = build_delivery(&config.delivery)?;

    let (runtime, handle) = ScribeRuntime::new(&config, generator, delivery);
    let runtime_shutdown = runtime.shutdown_notifier();
    let runtime_task = runtime.spawn();

    let ticker = TriggerTicker::new(handle.clone(), config.summary_trigger.interval_minutes)
        .map(|ticker| (ticker.shutdown_notifier(), ticker.spawn()));
    if ticker.is_none() {
        info!("Time-based trigger disabled");
    }

    let result = server::run_server_with_shutdown(
        AppState::new(handle),
        config.server.port,
        shutdown_signal(),
    )
    .await;

    if let Some((ticker_shutdown, ticker_task)) = ticker {
        ticker_shutdown.notify_one();
        if let Err(err) = ticker_task.await {
            warn!(%err, "Ticker task ended abnormally");
        }
    }
    runtime_shutdown.notify_one();
    if let Err(err) = runtime_task.await {
        warn!(%err, "Runtime task ended abnormally");
    }

    result
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(%err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("Shutdown signal received");
}
