//! Background cache sweeper.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use crate::CacheError;

/// Runs `sweep` every `interval` on a named thread until dropped.
pub(crate) struct Sweeper {
    stop: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    pub fn spawn<F>(interval: Duration, mut sweep: F) -> Result<Self, CacheError>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop, signal) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("fpath-sweeper".to_owned())
            .spawn(move || loop {
                match signal.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => sweep(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(CacheError::Spawn)?;
        debug!(?interval, "started cache sweeper");
        Ok(Sweeper { stop: Some(stop), handle: Some(handle) })
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        // Disconnecting the channel wakes the thread immediately.
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
