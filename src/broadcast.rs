
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, error, info};
use tokio::sync::mpsc;

use crate::payload::Snapshot;

/// Per-subscriber queue depth. A subscriber that falls this many snapshots
/// behind the sampler (at ~1 Hz, several seconds of stall) is dropped rather
/// than buffered further.
pub const SUBSCRIBER_QUEUE_DEPTH: usize = 8;

/// A serialized snapshot, shared across all deliveries of one tick.
pub type Frame = Arc<str>;

/// Fans each snapshot out to every live subscriber. The registry is a set
/// keyed by an id the subscriber keeps for deregistration; there is no
/// ordering between subscribers and a failure of one never touches the rest.
#[derive(Debug, Default)]
pub struct Broadcaster {
    subscribers: Mutex<HashMap<u64, mpsc::Sender<Frame>>>,
    next_id: AtomicU64,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, tx: mpsc::Sender<Frame>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().unwrap().insert(id, tx);
        info!("subscriber {id} registered");
        id
    }

    /// Idempotent removal; unknown ids are ignored.
    pub fn unregister(&self, id: u64) {
        if self.subscribers.lock().unwrap().remove(&id).is_some() {
            info!("subscriber {id} unregistered");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    /// Serializes the snapshot exactly once and attempts a non-blocking send
    /// to every currently registered subscriber. A full or closed queue
    /// deregisters that subscriber immediately; nothing propagates back to
    /// the sampler.
    ///
    /// Dispatch iterates a copy of the subscriber set taken up front, so
    /// connections arriving mid-publish are untouched and removals happen
    /// after the pass completes.
    pub fn publish(&self, snapshot: &Snapshot) {
        let targets: Vec<(u64, mpsc::Sender<Frame>)> = self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();
        if targets.is_empty() {
            return;
        }

        let frame: Frame = match snapshot.to_json() {
            Ok(json) => Arc::from(json),
            Err(e) => {
                error!("snapshot serialization failed: {e}");
                return;
            }
        };

        let mut dead = Vec::new();
        for (id, tx) in targets {
            if let Err(e) = tx.try_send(frame.clone()) {
                debug!("delivery to subscriber {id} failed: {e}");
                dead.push(id);
            }
        }
        for id in dead {
            self.unregister(id);
        }
    }
}
