//! Handle to one running discovery task.

use crate::error::AppError;
use crate::model::Group;
use crate::types::SessionId;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Requests a cooperative stop. Clones share the same flag, so a Ctrl-C
/// handler can hold one while the session itself is being awaited.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<watch::Sender<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        // send_replace never fails, even with the loop already gone.
        self.0.send_replace(true);
    }
}

/// A group being discovered on a background task.
pub struct DiscoverySession {
    id: SessionId,
    stop: StopHandle,
    updates: mpsc::UnboundedReceiver<Group>,
    handle: JoinHandle<Group>,
}

impl DiscoverySession {
    pub(crate) fn new(
        id: SessionId,
        stop: watch::Sender<bool>,
        updates: mpsc::UnboundedReceiver<Group>,
        handle: JoinHandle<Group>,
    ) -> Self {
        Self {
            id,
            stop: StopHandle(Arc::new(stop)),
            updates,
            handle,
        }
    }

    pub fn stopper(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Next whole-group snapshot, in change order, or `None` once the loop
    /// has exited and every snapshot has been read.
    pub async fn next_update(&mut self) -> Option<Group> {
        self.updates.recv().await
    }

    /// Waits for the loop to exit and returns the final group.
    pub async fn finish(self) -> Result<Group, AppError> {
        self.handle.await.map_err(|e| AppError::InternalError {
            message: format!("discovery session {} failed", self.id.short()),
            source: Some(Box::new(e)),
        })
    }
}
