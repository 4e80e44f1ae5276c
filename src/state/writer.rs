//! Background writer for persisted flags.
//!
//! The writer thread owns the backing [`KeyValueStore`] and applies puts in
//! submission order. Callers get a [`PendingWrite`] back immediately and never
//! wait on disk I/O unless they ask to. Logs emitted on the worker go to the
//! subscriber that was active when the writer was spawned.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;

use super::store::KeyValueStore;
use super::{StateKey, WriteAck};

enum Job {
    Put {
        key: StateKey,
        value: bool,
        ack: Sender<WriteAck>,
    },
    Drain {
        ack: Sender<WriterStats>,
    },
    Shutdown,
}

/// Counts of completed store writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriterStats {
    pub persisted: u64,
    pub failed: u64,
}

/// Acknowledgement of a queued write, delivered once the store has answered.
#[derive(Debug)]
pub struct PendingWrite {
    key: StateKey,
    ack: Receiver<WriteAck>,
}

impl PendingWrite {
    fn settled(key: StateKey, result: WriteAck) -> Self {
        let (tx, ack) = bounded(1);
        let _ = tx.send(result);
        Self { key, ack }
    }

    #[must_use]
    pub const fn key(&self) -> StateKey {
        self.key
    }

    /// The acknowledgement, if the store has answered yet.
    #[must_use]
    pub fn try_ack(&self) -> Option<WriteAck> {
        self.ack.try_recv().ok()
    }

    /// Block until the store answers. A writer that went away counts as a
    /// cache-only write.
    #[must_use]
    pub fn wait(self) -> WriteAck {
        self.ack.recv().unwrap_or(WriteAck::CacheOnly)
    }
}

pub struct StoreWriter {
    jobs: Sender<Job>,
    worker: Option<JoinHandle<()>>,
}

impl StoreWriter {
    /// Move `store` onto a dedicated writer thread.
    pub fn spawn(store: Box<dyn KeyValueStore>) -> Result<Self> {
        let (jobs, rx) = unbounded();
        let dispatch = tracing::dispatcher::get_default(tracing::Dispatch::clone);
        let worker = thread::Builder::new()
            .name("recgate-state-writer".into())
            .spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || run(store, &rx));
            })?;
        Ok(Self {
            jobs,
            worker: Some(worker),
        })
    }

    /// Queue a put. Returns without waiting for the store.
    pub fn submit(&self, key: StateKey, value: bool) -> PendingWrite {
        let (tx, ack) = bounded(1);
        if self.jobs.send(Job::Put { key, value, ack: tx }).is_err() {
            debug!(target: "recgate::state", key = %key, "state writer stopped; write kept in cache only");
            return PendingWrite::settled(key, WriteAck::CacheOnly);
        }
        PendingWrite { key, ack }
    }

    /// Wait for every queued write to reach the store.
    pub fn drain(&self) -> WriterStats {
        let (tx, ack) = bounded(1);
        if self.jobs.send(Job::Drain { ack: tx }).is_err() {
            return WriterStats::default();
        }
        ack.recv().unwrap_or_default()
    }
}

impl Drop for StoreWriter {
    fn drop(&mut self) {
        let _ = self.jobs.send(Job::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for StoreWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreWriter")
            .field("queued", &self.jobs.len())
            .finish_non_exhaustive()
    }
}

fn run(mut store: Box<dyn KeyValueStore>, jobs: &Receiver<Job>) {
    let mut stats = WriterStats::default();
    while let Ok(job) = jobs.recv() {
        match job {
            Job::Put { key, value, ack } => {
                let result = match store.put(key.as_str(), value) {
                    Ok(()) => {
                        stats.persisted += 1;
                        WriteAck::Persisted
                    }
                    Err(err) => {
                        stats.failed += 1;
                        debug!(target: "recgate::state", key = %key, value, error = %err, "persisted write failed");
                        WriteAck::CacheOnly
                    }
                };
                let _ = ack.send(result);
            }
            Job::Drain { ack } => {
                let _ = ack.send(stats);
            }
            Job::Shutdown => break,
        }
    }
    debug!(target: "recgate::state", persisted = stats.persisted, failed = stats.failed, "state writer stopped");
}
