//! `resonance-monitor` -- terminal monitor for the resonance feeds.
//!
//! Polls the feed service on a fixed interval, logs the gauge level and
//! trend after every refresh and optionally keeps a PNG of the heatmap
//! up to date.
//!
//! # Environment variables
//!
//! | Variable                | Required | Default | Description                          |
//! |-------------------------|----------|---------|--------------------------------------|
//! | `FEED_BASE_URL`         | yes      | --      | Feed service base URL                |
//! | `SERIES_LIMIT`          | no       | `96`    | Rows requested from the series feed  |
//! | `REFRESH_INTERVAL_SECS` | no       | `900`   | Seconds between refreshes            |
//! | `ATTEMPT_TIMEOUT_SECS`  | no       | `20`    | Timeout of each fetch attempt        |
//! | `MAX_RETRIES`           | no       | `2`     | Retries after a failed attempt       |
//! | `HEATMAP_PNG_PATH`      | no       | --      | Heatmap export target                |
//! | `HIGH_CONTRAST`         | no       | `false` | Render with the high-contrast palette |

use std::sync::Arc;

use resonance_feed::cache::FeedCache;
use resonance_feed::poller::RefreshPoller;
use resonance_feed::transport::{FeedTransport, HttpTransport};
use resonance_feed::{FeedOrchestrator, TelemetryFeed};
use resonance_monitor::config::MonitorConfig;
use resonance_monitor::report::{self, ExportTarget};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resonance_monitor=info,resonance_feed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MonitorConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        base_url = %config.feed.base_url,
        series_limit = config.feed.series_limit,
        interval_secs = config.feed.refresh_interval.as_secs(),
        max_retries = config.feed.retry.max_retries,
        export = ?config.heatmap_png_path,
        "Starting resonance-monitor",
    );

    // --- Feed ---
    let cache = Arc::new(FeedCache::new());
    let transport: Arc<dyn FeedTransport> =
        Arc::new(HttpTransport::new(config.feed.base_url.clone(), config.feed.series_limit));
    let orchestrator = FeedOrchestrator::new(cache, transport, config.feed.retry.clone());
    let feed = Arc::new(TelemetryFeed::new(orchestrator));

    // --- Background tasks ---
    let cancel = CancellationToken::new();
    let poller = Arc::new(RefreshPoller::new(Arc::clone(&feed), config.feed.refresh_interval));
    let reports = poller.subscribe();

    let export = config.heatmap_png_path.clone().map(|path| ExportTarget {
        path,
        contrast: config.contrast,
    });
    let watcher = tokio::spawn(report::watch(
        Arc::clone(&feed),
        reports,
        export,
        cancel.clone(),
    ));

    let poller_cancel = cancel.clone();
    let poller_task = tokio::spawn(async move { poller.run(poller_cancel).await });

    shutdown_signal().await;
    cancel.cancel();

    if let Err(e) = poller_task.await {
        tracing::error!(error = %e, "Refresh poller task failed");
    }
    if let Err(e) = watcher.await {
        tracing::error!(error = %e, "Report watcher task failed");
    }
    tracing::info!("resonance-monitor stopped");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
