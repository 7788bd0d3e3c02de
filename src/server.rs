//! HTTP server lifecycle: bind, serve, shut down.

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::api::{create_router, ApiState, RestApiConfig};
use crate::config::ServerConfig;
use crate::context::OpContext;
use crate::error::Result;

/// Bind `host:port` and serve the calendar API until SIGINT or SIGTERM.
pub async fn run_http(config: &ServerConfig, state: Arc<ApiState>) -> Result<()> {
    let app = create_router(state.clone(), &RestApiConfig::from(config));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Calendar server listening on http://{}", listener.local_addr()?);

    serve(
        listener,
        app,
        state.root_context().clone(),
        config.shutdown_timeout(),
        shutdown_signal(),
    )
    .await
}

/// Serve `app` on `listener` until `signal` resolves.
///
/// After the signal, in-flight requests get `drain` to finish. The root
/// context is cancelled on return, whether or not draining completed.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    root: OpContext,
    drain: Duration,
    signal: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let stopping = CancellationToken::new();
    let trigger = stopping.clone();

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            trigger.cancel();
        })
        .into_future();
    let mut server = std::pin::pin!(server);

    tokio::select! {
        result = &mut server => {
            root.cancel();
            return Ok(result?);
        }
        _ = stopping.cancelled() => {}
    }

    info!(drain_secs = drain.as_secs_f64(), "Shutting down, draining in-flight requests");
    let outcome = tokio::time::timeout(drain, &mut server).await;
    root.cancel();

    match outcome {
        Ok(result) => {
            result?;
            info!("Calendar server stopped");
        }
        Err(_) => warn!("Drain window elapsed, abandoning in-flight requests"),
    }
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
