use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use analytix_core::{AnalysisController, FileStore, KeyValueStore, RunHandle};

use crate::tui_event::BackendEvent;

/// Forward every published controller snapshot to the UI until cancelled.
pub fn forward_snapshots(
    controller: &AnalysisController,
    tx: mpsc::UnboundedSender<BackendEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let mut rx = controller.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = rx.borrow_and_update().clone();
                    if tx.send(BackendEvent::Snapshot(snapshot)).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

/// Wait for `handle` in the background and report how the run ended.
pub fn watch_run(handle: RunHandle, tx: mpsc::UnboundedSender<BackendEvent>) {
    let generation = handle.generation();
    tokio::spawn(async move {
        let outcome = handle.wait().await;
        let _ = tx.send(BackendEvent::RunFinished {
            generation,
            outcome,
        });
    });
}

/// Open the JSON key-value store behind the session.
pub fn open_store(path: &Path) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let store = FileStore::open(path)
        .with_context(|| format!("cannot open store at {}", path.display()))?;
    Ok(Arc::new(store))
}
