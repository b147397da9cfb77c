//! Background indexing on top of the synchronous core.
//!
//! The synchronizer itself always runs on the caller's thread. Hosts that
//! want to keep index latency out of their commit path put a
//! [`BackgroundIndexer`] in front of it: jobs go over a channel to one
//! worker thread, and failures come back on a second channel.
//!
//! ```rust,ignore
//! let indexer = BackgroundIndexer::spawn(Arc::clone(&sync));
//!
//! // inside the commit, before the new state becomes visible
//! indexer.enqueue_update(&record)?;
//! store.put(record);
//!
//! for failure in indexer.drain_failures() {
//!     eprintln!("{}: {}", failure.job, failure.error);
//! }
//! let stats = indexer.shutdown();
//! ```
//!
//! The change set of an update is computed when the job is enqueued, not
//! when it runs; by then the store already holds the new state and a diff
//! would come out empty.

use crate::changes::{changed_attributes, ChangeSet};
use crate::error::{SyncError, SyncResult};
use crate::record::Record;
use crate::sync::Synchronizer;
use crate::types::TypeName;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::warn;

/// A unit of indexing work.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexJob {
    /// Create/update hook with a change set computed at enqueue time.
    Update {
        /// The mutated record.
        record: Record,
        /// Attributes that changed.
        changes: ChangeSet,
    },
    /// Destroy hook.
    Destroy(Record),
    /// Full rebuild of a type.
    Rebuild(TypeName),
}

impl fmt::Display for IndexJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexJob::Update { record, changes } => {
                write!(f, "update {} {} {}", record.type_name(), record.key(), changes)
            }
            IndexJob::Destroy(record) => write!(f, "destroy {} {}", record.type_name(), record.key()),
            IndexJob::Rebuild(type_name) => write!(f, "rebuild {type_name}"),
        }
    }
}

/// A job that failed in the background.
#[derive(Debug)]
pub struct JobFailure {
    /// The failed job.
    pub job: IndexJob,
    /// Why it failed.
    pub error: SyncError,
}

/// Counters reported when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Jobs taken off the queue.
    pub processed: usize,
    /// Jobs that returned an error.
    pub failed: usize,
}

/// Runs indexing jobs on a dedicated worker thread.
///
/// Jobs run in submission order. Nothing is retried.
///
/// The failure channel is unbounded. Every failed job stays queued until
/// it is read through [`failures`](Self::failures) or
/// [`drain_failures`](Self::drain_failures), so a long-running owner whose
/// engine keeps failing must drain it periodically or memory grows with
/// each failure.
pub struct BackgroundIndexer {
    sync: Arc<Synchronizer>,
    sender: Option<Sender<IndexJob>>,
    failures: Receiver<JobFailure>,
    worker: Option<JoinHandle<DispatchStats>>,
}

impl BackgroundIndexer {
    /// Starts the worker thread.
    pub fn spawn(sync: Arc<Synchronizer>) -> Self {
        let (sender, jobs) = mpsc::channel::<IndexJob>();
        let (failure_tx, failures) = mpsc::channel();
        let worker_sync = Arc::clone(&sync);

        let worker = thread::spawn(move || {
            let mut stats = DispatchStats::default();
            for job in jobs {
                stats.processed += 1;
                if let Err(error) = run_job(&worker_sync, &job) {
                    warn!(%job, %error, "background indexing job failed");
                    stats.failed += 1;
                    // The owner may have stopped listening.
                    let _ = failure_tx.send(JobFailure { job, error });
                }
            }
            stats
        });

        Self {
            sync,
            sender: Some(sender),
            failures,
            worker: Some(worker),
        }
    }

    /// Queues a job.
    ///
    /// # Errors
    ///
    /// Returns `QueueClosed` if the worker has stopped.
    pub fn submit(&self, job: IndexJob) -> SyncResult<()> {
        self.sender
            .as_ref()
            .ok_or(SyncError::QueueClosed)?
            .send(job)
            .map_err(|_| SyncError::QueueClosed)
    }

    /// Diffs `record` against its persisted snapshot and queues an update.
    ///
    /// Must be called before the store persists the new state. Returns
    /// `false` without queueing anything when the type has no hooks wired
    /// or nothing changed.
    ///
    /// # Errors
    ///
    /// Returns store errors from the snapshot read, or `QueueClosed`.
    pub fn enqueue_update(&self, record: &Record) -> SyncResult<bool> {
        if !self.sync.is_wired(record.type_name()) {
            return Ok(false);
        }
        let prior = self.sync.store.snapshot_of(record)?;
        let changes = changed_attributes(prior.as_ref(), record.attributes());
        if changes.is_empty() {
            return Ok(false);
        }
        self.submit(IndexJob::Update {
            record: record.clone(),
            changes,
        })?;
        Ok(true)
    }

    /// Queues a destroy. Returns `false` when the type has no hooks wired.
    ///
    /// # Errors
    ///
    /// Returns `QueueClosed` if the worker has stopped.
    pub fn enqueue_destroy(&self, record: &Record) -> SyncResult<bool> {
        if !self.sync.is_wired(record.type_name()) {
            return Ok(false);
        }
        self.submit(IndexJob::Destroy(record.clone()))?;
        Ok(true)
    }

    /// Returns the failure channel.
    pub fn failures(&self) -> &Receiver<JobFailure> {
        &self.failures
    }

    /// Collects failures reported so far without blocking.
    pub fn drain_failures(&self) -> Vec<JobFailure> {
        self.failures.try_iter().collect()
    }

    /// Closes the queue, waits for pending jobs, and returns the counters.
    pub fn shutdown(mut self) -> DispatchStats {
        self.stop()
    }

    fn stop(&mut self) -> DispatchStats {
        self.sender.take();
        match self.worker.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                warn!("background indexer worker panicked");
                DispatchStats::default()
            }),
            None => DispatchStats::default(),
        }
    }
}

impl Drop for BackgroundIndexer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for BackgroundIndexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundIndexer")
            .field("running", &self.worker.is_some())
            .finish_non_exhaustive()
    }
}

fn run_job(sync: &Synchronizer, job: &IndexJob) -> SyncResult<()> {
    match job {
        IndexJob::Update { record, changes } => {
            if let Some(hooks) = sync.hooks_for(record.type_name()) {
                hooks.on_create_or_update_with_changes(record, changes)?;
            }
        }
        IndexJob::Destroy(record) => {
            sync.on_destroy(record)?;
        }
        IndexJob::Rebuild(type_name) => {
            sync.rebuild(type_name)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{Blueprint, BlueprintRegistry};
    use crate::config::SyncConfig;
    use crate::store::MemoryRecordStore;
    use crate::test_support::{Call, RecordingEngine};
    use std::time::Duration;

    fn setup() -> (Arc<Synchronizer>, Arc<MemoryRecordStore>, Arc<RecordingEngine>) {
        let store = Arc::new(MemoryRecordStore::new());
        let engine = Arc::new(RecordingEngine::new());
        let registry = BlueprintRegistry::new()
            .with("Person", Blueprint::new())
            .with("Draft", Blueprint::new().autoindex(false));
        let sync = Synchronizer::new(SyncConfig::default(), registry, store.clone(), engine.clone());
        (Arc::new(sync), store, engine)
    }

    #[test]
    fn jobs_run_in_order_on_worker() {
        let (sync, store, engine) = setup();
        let indexer = BackgroundIndexer::spawn(sync);
        let person = Record::new("Person", 1i64).with("name", "Kogler");

        assert!(indexer.enqueue_update(&person).unwrap());
        store.put(person.clone());
        assert!(indexer.enqueue_destroy(&person).unwrap());

        let stats = indexer.shutdown();
        assert_eq!(stats, DispatchStats { processed: 2, failed: 0 });
        assert_eq!(
            engine.calls(),
            vec![Call::upsert("Person-1", &person, ["name"]), Call::remove("Person-1")]
        );
    }

    #[test]
    fn unchanged_and_unwired_records_are_not_queued() {
        let (sync, store, engine) = setup();
        let indexer = BackgroundIndexer::spawn(sync);
        let person = Record::new("Person", 1i64).with("name", "Kogler");
        store.put(person.clone());

        assert!(!indexer.enqueue_update(&person).unwrap());
        assert!(!indexer.enqueue_update(&Record::new("Draft", 1i64).with("x", 1)).unwrap());
        assert!(!indexer.enqueue_destroy(&Record::new("Draft", 1i64)).unwrap());

        assert_eq!(indexer.shutdown().processed, 0);
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn failures_are_reported_not_retried() {
        let (sync, _, engine) = setup();
        engine.fail_with(|| SyncError::engine_unavailable("offline"));
        let indexer = BackgroundIndexer::spawn(sync);

        indexer
            .submit(IndexJob::Rebuild(TypeName::new("Ghost")))
            .unwrap();
        indexer
            .submit(IndexJob::Destroy(Record::new("Person", 1i64)))
            .unwrap();

        let first = indexer.failures().recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first.error, SyncError::UnknownType { .. }));
        let second = indexer.failures().recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(second.error.is_engine_error());
        assert_eq!(second.job, IndexJob::Destroy(Record::new("Person", 1i64)));

        let stats = indexer.shutdown();
        assert_eq!(stats, DispatchStats { processed: 2, failed: 2 });
    }

    #[test]
    fn unread_failures_are_kept_until_drained() {
        let (sync, _, _) = setup();
        let indexer = BackgroundIndexer::spawn(sync);
        for _ in 0..64 {
            indexer
                .submit(IndexJob::Rebuild(TypeName::new("Ghost")))
                .unwrap();
        }

        let mut received = 0;
        while received < 64 {
            indexer.failures().recv_timeout(Duration::from_secs(5)).unwrap();
            received += 1;
        }
        assert!(indexer.drain_failures().is_empty());
        assert_eq!(indexer.shutdown().failed, 64);
    }

    #[test]
    fn job_display() {
        let job = IndexJob::Update {
            record: Record::new("Person", 1i64),
            changes: ChangeSet::from_iter(["name"]),
        };
        assert_eq!(job.to_string(), "update Person 1 {name}");
        assert_eq!(IndexJob::Rebuild(TypeName::new("Person")).to_string(), "rebuild Person");
    }
}
