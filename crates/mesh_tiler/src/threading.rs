//! Bounded worker pool with a completion barrier.
//!
//! A fixed set of OS threads pulls jobs from one bounded queue. Submitting
//! into a full queue blocks the caller, which keeps the orchestrator from
//! piling up thousands of tile jobs ahead of the workers.
//!
//! # Usage
//!
//! ```ignore
//! let pool = WorkerPool::new(4)?;
//!
//! for layer in layers {
//!     pool.submit(format!("layer {}", layer.index), move || build_layer(&layer));
//! }
//!
//! // Blocks until every job above has finished, successfully or not.
//! let report = pool.barrier();
//! ```
//!
//! A job that returns `Err` or panics is logged and reported through the
//! barrier's [`StageReport`]; the worker keeps running and the barrier is
//! still reached. Jobs are never retried.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{self as channel, Receiver, Sender};

use crate::error::{Result, TilerError};

/// Unit of work accepted by the pool.
pub type Job = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

struct QueuedJob {
  label: String,
  job: Job,
}

struct JobOutcome {
  label: String,
  result: std::result::Result<(), String>,
}

/// A job that returned an error or panicked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobFailure {
  /// Label given at submission.
  pub label: String,
  /// Rendered error or panic message.
  pub message: String,
}

/// Outcome of every job completed between two barriers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageReport {
  /// Jobs that returned `Ok`.
  pub succeeded: usize,
  /// Jobs that returned `Err` or panicked.
  pub failures: Vec<JobFailure>,
}

impl StageReport {
  /// Total jobs accounted for.
  pub fn total(&self) -> usize {
    self.succeeded + self.failures.len()
  }

  pub fn is_clean(&self) -> bool {
    self.failures.is_empty()
  }
}

/// Count of submitted jobs that have not finished yet.
struct InFlight {
  count: Mutex<usize>,
  idle: Condvar,
}

impl InFlight {
  fn new() -> Self {
    Self {
      count: Mutex::new(0),
      idle: Condvar::new(),
    }
  }

  fn increment(&self) {
    *self.count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
  }

  fn decrement(&self) {
    let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
    *count -= 1;
    if *count == 0 {
      self.idle.notify_all();
    }
  }

  fn get(&self) -> usize {
    *self.count.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn wait_idle(&self) {
    let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
    while *count > 0 {
      count = self.idle.wait(count).unwrap_or_else(PoisonError::into_inner);
    }
  }
}

/// Fixed-size pool of worker threads sharing one bounded job queue.
pub struct WorkerPool {
  /// Dropped on shutdown so workers drain the queue and exit.
  jobs: Option<Sender<QueuedJob>>,
  outcome_tx: Sender<JobOutcome>,
  outcomes: Receiver<JobOutcome>,
  in_flight: Arc<InFlight>,
  workers: Vec<JoinHandle<()>>,
  queue_capacity: usize,
}

impl WorkerPool {
  /// Create a pool of `num_threads` workers with a queue bounded to the same
  /// size.
  pub fn new(num_threads: usize) -> Result<Self> {
    Self::with_capacity(num_threads, num_threads)
  }

  /// Create a pool with an explicit queue capacity.
  ///
  /// `queue_capacity` may be zero, in which case every submission hands its
  /// job directly to an idle worker.
  pub fn with_capacity(num_threads: usize, queue_capacity: usize) -> Result<Self> {
    if num_threads == 0 {
      return Err(crate::config::ConfigError::Invalid("worker pool needs at least one thread".into()).into());
    }

    let (job_tx, job_rx) = channel::bounded::<QueuedJob>(queue_capacity);
    let (outcome_tx, outcome_rx) = channel::unbounded::<JobOutcome>();
    let in_flight = Arc::new(InFlight::new());

    let mut workers = Vec::with_capacity(num_threads);
    for n in 0..num_threads {
      let jobs = job_rx.clone();
      let outcomes = outcome_tx.clone();
      let in_flight = Arc::clone(&in_flight);
      let handle = thread::Builder::new()
        .name(format!("tiler-worker-{n}"))
        .spawn(move || worker_loop(jobs, outcomes, in_flight))
        .map_err(TilerError::WorkerSpawn)?;
      workers.push(handle);
    }

    tracing::debug!(num_threads, queue_capacity, "worker pool started");

    Ok(Self {
      jobs: Some(job_tx),
      outcome_tx,
      outcomes: outcome_rx,
      in_flight,
      workers,
      queue_capacity,
    })
  }

  /// Enqueue a job, blocking while the queue is full.
  ///
  /// The closure must own everything it needs; no state is looked up after
  /// submission.
  pub fn submit<F>(&self, label: impl Into<String>, job: F)
  where
    F: FnOnce() -> Result<()> + Send + 'static,
  {
    let label = label.into();
    self.in_flight.increment();

    let queued = QueuedJob {
      label,
      job: Box::new(job),
    };
    let Some(jobs) = self.jobs.as_ref() else {
      self.reject(queued.label);
      return;
    };
    if let Err(channel::SendError(queued)) = jobs.send(queued) {
      self.reject(queued.label);
    }
  }

  /// Record a job that could not be queued as failed so barriers stay
  /// balanced.
  fn reject(&self, label: String) {
    tracing::error!(job = %label, "worker pool is shut down, job dropped");
    let _ = self.outcome_tx.send(JobOutcome {
      label,
      result: Err("worker pool is shut down".into()),
    });
    self.in_flight.decrement();
  }

  /// Block until every job submitted so far has completed, then return
  /// their outcomes.
  pub fn barrier(&self) -> StageReport {
    self.in_flight.wait_idle();

    let mut report = StageReport::default();
    for outcome in self.outcomes.try_iter() {
      match outcome.result {
        Ok(()) => report.succeeded += 1,
        Err(message) => report.failures.push(JobFailure {
          label: outcome.label,
          message,
        }),
      }
    }
    report
  }

  /// Number of worker threads.
  pub fn num_threads(&self) -> usize {
    self.workers.len()
  }

  /// Maximum number of queued (not yet running) jobs.
  pub fn queue_capacity(&self) -> usize {
    self.queue_capacity
  }

  /// Jobs submitted but not yet finished.
  pub fn pending_count(&self) -> usize {
    self.in_flight.get()
  }
}

impl Drop for WorkerPool {
  fn drop(&mut self) {
    self.jobs.take();
    for handle in self.workers.drain(..) {
      let _ = handle.join();
    }
  }
}

fn worker_loop(jobs: Receiver<QueuedJob>, outcomes: Sender<JobOutcome>, in_flight: Arc<InFlight>) {
  for QueuedJob { label, job } in jobs.iter() {
    let result = match panic::catch_unwind(AssertUnwindSafe(job)) {
      Ok(Ok(())) => Ok(()),
      Ok(Err(err)) => Err(err.to_string()),
      Err(payload) => Err(TilerError::JobPanicked(panic_message(payload.as_ref())).to_string()),
    };

    match &result {
      Ok(()) => tracing::debug!(job = %label, "job finished"),
      Err(message) => tracing::error!(job = %label, "job failed: {message}"),
    }

    // Outcome goes out before the count drops so a barrier never misses it.
    let _ = outcomes.send(JobOutcome { label, result });
    in_flight.decrement();
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic payload".to_string()
  }
}

// =============================================================================
// Tests
// =============================================================================
