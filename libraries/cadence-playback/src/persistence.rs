//! Background writer for session snapshots
//!
//! Mutating operations hand a snapshot to the writer and move on. The writer
//! task saves snapshots in the order they were produced, collapsing a burst
//! into its newest snapshot, and logs failures instead of reporting them.

use cadence_core::{PersistenceGateway, SessionSnapshot};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

enum WriterMessage {
    Save(SessionSnapshot),
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget front end for a [`PersistenceGateway`]
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    sender: mpsc::UnboundedSender<WriterMessage>,
}

impl std::fmt::Debug for WriterMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Save(_) => f.write_str("Save"),
            Self::Flush(_) => f.write_str("Flush"),
        }
    }
}

impl SnapshotWriter {
    /// Start the writer task on the current tokio runtime
    pub fn spawn(gateway: Arc<dyn PersistenceGateway>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(gateway, receiver));
        Self { sender }
    }

    /// Queue a snapshot for saving
    pub fn save(&self, snapshot: SessionSnapshot) {
        if self.sender.send(WriterMessage::Save(snapshot)).is_err() {
            warn!("Session writer stopped, snapshot dropped");
        }
    }

    /// Wait until every snapshot queued so far has been handed to the gateway
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(WriterMessage::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

async fn run_writer(
    gateway: Arc<dyn PersistenceGateway>,
    mut receiver: mpsc::UnboundedReceiver<WriterMessage>,
) {
    while let Some(first) = receiver.recv().await {
        let mut latest = None;
        let mut waiters = Vec::new();

        let mut take = |msg: WriterMessage| match msg {
            WriterMessage::Save(snapshot) => latest = Some(snapshot),
            WriterMessage::Flush(done) => waiters.push(done),
        };

        take(first);
        while let Ok(msg) = receiver.try_recv() {
            take(msg);
        }

        if let Some(snapshot) = latest {
            match gateway.save(&snapshot).await {
                Ok(()) => debug!(queue_len = snapshot.queue.len(), "Session saved"),
                Err(e) => warn!(error = %e, "Failed to save session"),
            }
        }

        for done in waiters {
            let _ = done.send(());
        }
    }

    debug!("Session writer shut down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cadence_core::{CoreError, Result};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<f32>>,
        fail: bool,
    }

    #[async_trait]
    impl PersistenceGateway for RecordingStore {
        async fn load(&self) -> Result<Option<SessionSnapshot>> {
            Ok(None)
        }

        async fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
            if self.fail {
                return Err(CoreError::gateway("disk full"));
            }
            self.saved.lock().unwrap().push(snapshot.volume);
            Ok(())
        }
    }

    fn with_volume(volume: f32) -> SessionSnapshot {
        SessionSnapshot {
            volume,
            ..SessionSnapshot::default()
        }
    }

    #[tokio::test]
    async fn flush_waits_for_pending_saves() {
        let store = Arc::new(RecordingStore::default());
        let writer = SnapshotWriter::spawn(store.clone());

        writer.save(with_volume(0.1));
        writer.save(with_volume(0.2));
        writer.save(with_volume(0.3));
        writer.flush().await;

        let saved = store.saved.lock().unwrap().clone();
        assert!(!saved.is_empty());
        assert_eq!(saved.last(), Some(&0.3));
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..RecordingStore::default()
        });
        let writer = SnapshotWriter::spawn(store.clone());

        writer.save(with_volume(0.5));
        writer.flush().await;

        // Writer is still alive after a failed save
        writer.save(with_volume(0.6));
        writer.flush().await;
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn flush_without_saves_returns() {
        let store = Arc::new(RecordingStore::default());
        let writer = SnapshotWriter::spawn(store.clone());
        writer.flush().await;
        assert!(store.saved.lock().unwrap().is_empty());
    }
}
