//! Cancellable handle for the repeating countdown task

use std::{future::Future, sync::Mutex};

use tokio::task::JoinHandle;
use tracing::debug;

/// Owns at most one spawned tick task. Dropping the source cancels the task.
#[derive(Debug, Default)]
pub struct TickSource {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending task, then spawn `task` in its place
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut handle = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = handle.take() {
            previous.abort();
        }
        *handle = Some(tokio::spawn(task));
        debug!("Tick task scheduled");
    }

    /// Cancel the pending task. Returns true if one was still live.
    pub fn cancel(&self) -> bool {
        let mut handle = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        match handle.take() {
            Some(task) => {
                let live = !task.is_finished();
                task.abort();
                if live {
                    debug!("Tick task cancelled");
                }
                live
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.handle
            .lock()
            .map(|handle| handle.as_ref().is_some_and(|task| !task.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        self.cancel();
    }
}
