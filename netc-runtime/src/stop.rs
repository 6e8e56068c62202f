//! Operator-triggered cancellation.
//!
//! A [`StopSignal`] is handed to every probe. Scheduled stops (the end of a probe's duration) are
//! handled by the probe runner itself; this signal only carries the operator's request to abandon
//! whatever is running.
use tokio::sync::watch;
#[allow(unused)]
use tracing::{debug, error, info, warn};

#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn stop(&self) {
        // No receivers left means nothing is running to stop.
        let _ = self.tx.send(true);
    }
}

#[derive(Clone, Debug)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    pub fn channel() -> (StopHandle, StopSignal) {
        let (tx, rx) = watch::channel(false);
        (StopHandle { tx }, StopSignal { rx })
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, signal) = Self::channel();
        signal
    }

    /// Fires on Ctrl+C.
    pub fn on_ctrl_c() -> Self {
        let (handle, signal) = Self::channel();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("Interrupt received, stopping.");
                    handle.stop();
                }
                Err(err) => error!("Unable to listen for Ctrl+C: {err}"),
            }
        });
        signal
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop is requested. Pending forever if the handle is dropped without one.
    pub async fn stopped(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
