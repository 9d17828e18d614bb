//! Cooperative cancellation
//!
//! A [`CancelSource`] flips a shared flag once; every [`CancelToken`] cloned
//! from it observes the flip at its next await point. Dropping a source
//! without cancelling never cancels its tokens.

use tokio::sync::watch;

/// Owner side of a cancellation signal
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

/// Observer side of a cancellation signal
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelSource {
    pub fn new() -> (CancelSource, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (CancelSource { tx }, CancelToken { rx })
    }

    /// Another token for this source
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the source cancels; pends forever if the source is
    /// dropped without cancelling
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Resolves when either token is cancelled
pub async fn either_cancelled(internal: &mut CancelToken, external: Option<&mut CancelToken>) {
    match external {
        Some(external) => {
            tokio::select! {
                _ = internal.cancelled() => {}
                _ = external.cancelled() => {}
            }
        }
        None => internal.cancelled().await,
    }
}
