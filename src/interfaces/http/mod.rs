//! HTTP listeners: status API, Prometheus scrape and debug.

pub mod api;
pub mod debug;
pub mod scrape;

use crate::domain::errors::AgentError;
use axum::Router;
use std::future::{Future, IntoFuture};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info};

pub async fn bind(listener: &'static str, addr: &str) -> Result<TcpListener, AgentError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| AgentError::Bind {
            listener,
            addr: addr.to_string(),
            source,
        })
}

/// Serves `router` until `shutdown` resolves, then waits at most `grace` for
/// in-flight requests. Past the deadline the listener is closed and the
/// shutdown is reported as failed. Connection tasks still running at that
/// point are only torn down when the runtime exits.
pub async fn serve_with_grace<F>(
    name: &'static str,
    listener: TcpListener,
    router: Router,
    shutdown: F,
    grace: Duration,
) -> Result<(), AgentError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, mut signalled_rx) = oneshot::channel::<()>();

    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = signalled_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            return result.map_err(|source| AgentError::Serve { listener: name, source });
        }
        _ = &mut signalled_rx => {
            info!("{} listener: Draining in-flight requests (grace: {:?})", name, grace);
        }
    }

    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => result.map_err(|source| AgentError::Serve {
            listener: name,
            source,
        }),
        Err(_) => Err(AgentError::ShutdownTimeout { grace }),
    }
}

/// Serves a best-effort listener in the background. Failures are logged,
/// never escalated.
pub fn spawn_background(
    name: &'static str,
    listener: TcpListener,
    router: Router,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("{} listener closed: {}", name, e);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_bind_failure_names_listener() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap().to_string();

        let err = bind("API", &addr).await.unwrap_err();
        assert!(matches!(err, AgentError::Bind { listener: "API", .. }));
        assert!(err.to_string().contains(&addr));
    }

    #[tokio::test]
    async fn test_idle_server_stops_within_grace() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let router = Router::new().route("/", get(|| async { "ok" }));

        let result = serve_with_grace(
            "API",
            listener,
            router,
            async {},
            Duration::from_secs(1),
        )
        .await;

        assert!(result.is_ok());
    }
}
