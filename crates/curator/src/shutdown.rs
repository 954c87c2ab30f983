//! Cooperative shutdown signalling between the main task and the job loops.

use tokio::sync::watch;

/// Create a linked shutdown handle/token pair.
pub fn channel() -> (ShutdownHandle, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownToken { rx })
}

/// Held by the main task; flips every token when the daemon should stop.
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }

    /// A fresh token for another job.
    pub fn token(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// Held by job loops. Polled between work items, awaited between cycles.
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Non-blocking check, used between per-file iterations.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when shutdown is requested. Resolves immediately if it
    /// already was.
    pub async fn cancelled(&mut self) {
        // wait_for only errs when the sender is gone, which also means stop.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}
