use std::future::Future;

use axum::{extract::Request, ServiceExt};
use tokio::net::TcpListener;
use tracing::info;

use crate::{api::router::App, error::AppError};

/// Serves `app` on `listener` until `shutdown` resolves, then drains
/// in-flight requests.
pub async fn serve<F>(listener: TcpListener, app: App, shutdown: F) -> Result<(), AppError>
where
  F: Future<Output = ()> + Send + 'static,
{
  axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
      .with_graceful_shutdown(shutdown)
      .await?;

  Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
  let ctrl_c = async {
      if let Err(e) = tokio::signal::ctrl_c().await {
          tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
              tracing::error!(error = %e, "Failed to listen for SIGTERM");
              std::future::pending::<()>().await;
          }
      }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
      _ = ctrl_c => {},
      _ = terminate => {},
  }

  info!("Shutdown signal received");
}
