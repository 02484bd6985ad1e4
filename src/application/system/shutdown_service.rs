use crate::domain::errors::AgentError;
use tracing::info;

/// OS termination signals (SIGINT, and SIGTERM on unix).
///
/// Handlers are installed up front so a failure to install them is reported
/// at startup rather than when the first signal arrives.
pub struct ShutdownSignal {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    pub fn install() -> Result<Self, AgentError> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let terminate = signal(SignalKind::terminate()).map_err(AgentError::Signal)?;
            Ok(Self { terminate })
        }
        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Resolves on the first signal received.
    pub async fn recv(mut self) {
        let name = self.wait().await;
        info!("main: {} : Start shutdown", name);
    }

    #[cfg(unix)]
    async fn wait(&mut self) -> &'static str {
        let interrupted = tokio::select! {
            result = tokio::signal::ctrl_c() => result.is_ok(),
            _ = self.terminate.recv() => return "SIGTERM",
        };

        if interrupted {
            "SIGINT"
        } else {
            // ctrl_c could not listen; SIGTERM still can
            self.terminate.recv().await;
            "SIGTERM"
        }
    }

    #[cfg(not(unix))]
    async fn wait(&mut self) -> &'static str {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        "SIGINT"
    }
}
