//! Deferred job queue
//!
//! Change listeners do not react inline; they enqueue a job keyed by a
//! [`JobId`]. A job already waiting in the queue is not queued twice, so a
//! burst of changes collapses into one run at the next [`Scheduler::flush`].

use crate::error::{Error, Result};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::trace;

/// Upper bound on jobs run by a single flush before it is considered a
/// feedback loop
pub const MAX_FLUSH_JOBS: usize = 10_000;

/// Deferred unit of work
pub type Job = Rc<dyn Fn() -> Result<()>>;

/// Identifies a job for coalescing and cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

#[derive(Default)]
struct SchedulerInner {
    next_id: Cell<u64>,
    queue: RefCell<VecDeque<(JobId, Job)>>,
}

/// Single-threaded FIFO job queue
///
/// Clones share the same queue.
///
/// # Example
/// ```
/// use reactive_firestore::reactive::{Job, Scheduler};
/// use std::{cell::Cell, rc::Rc};
///
/// let scheduler = Scheduler::new();
/// let runs = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&runs);
/// let id = scheduler.next_job_id();
/// let job: Job = Rc::new(move || -> reactive_firestore::Result<()> {
///     counter.set(counter.get() + 1);
///     Ok(())
/// });
///
/// scheduler.schedule(id, job.clone());
/// scheduler.schedule(id, job);
/// assert_eq!(scheduler.flush().unwrap(), 1);
/// assert_eq!(runs.get(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh job id
    pub fn next_job_id(&self) -> JobId {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        JobId(id)
    }

    /// Queue `job` under `id`
    ///
    /// Returns `false` when a job with the same id is already waiting; the
    /// waiting job keeps its position and the new one is discarded.
    pub fn schedule(&self, id: JobId, job: Job) -> bool {
        let mut queue = self.inner.queue.borrow_mut();
        if queue.iter().any(|(queued, _)| *queued == id) {
            trace!(?id, "job already queued");
            return false;
        }
        queue.push_back((id, job));
        true
    }

    /// Drop a waiting job, if any
    pub fn cancel(&self, id: JobId) {
        self.inner.queue.borrow_mut().retain(|(queued, _)| *queued != id);
    }

    /// Whether `id` is waiting to run
    pub fn is_scheduled(&self, id: JobId) -> bool {
        self.inner.queue.borrow().iter().any(|(queued, _)| *queued == id)
    }

    /// Number of waiting jobs
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Run queued jobs until the queue is empty
    ///
    /// Jobs queued while flushing run in the same flush. Returns the number
    /// of jobs run.
    ///
    /// # Errors
    /// The first job error is returned immediately; jobs still queued stay
    /// queued for the next flush. [`Error::Internal`] if more than
    /// [`MAX_FLUSH_JOBS`] jobs run in one flush.
    pub fn flush(&self) -> Result<usize> {
        let mut ran = 0;
        loop {
            let next = self.inner.queue.borrow_mut().pop_front();
            let Some((id, job)) = next else {
                break;
            };
            if ran == MAX_FLUSH_JOBS {
                self.inner.queue.borrow_mut().push_front((id, job));
                return Err(Error::internal(format!(
                    "flush ran {MAX_FLUSH_JOBS} jobs; reactive updates are feeding back into themselves"
                )));
            }
            ran += 1;
            trace!(?id, "running job");
            job()?;
        }
        Ok(ran)
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_job(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Job {
        let log = Rc::clone(log);
        Rc::new(move || -> Result<()> {
            log.borrow_mut().push(name);
            Ok(())
        })
    }

    #[test]
    fn test_fifo_and_coalescing() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (scheduler.next_job_id(), scheduler.next_job_id());

        assert!(scheduler.schedule(a, recording_job(&log, "a")));
        assert!(scheduler.schedule(b, recording_job(&log, "b")));
        assert!(!scheduler.schedule(a, recording_job(&log, "a2")));
        assert_eq!(scheduler.pending(), 2);

        assert_eq!(scheduler.flush().unwrap(), 2);
        assert_eq!(*log.borrow(), ["a", "b"]);
        assert_eq!(scheduler.flush().unwrap(), 0);
    }

    #[test]
    fn test_jobs_scheduled_during_flush_run_in_same_flush() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (first, second) = (scheduler.next_job_id(), scheduler.next_job_id());
        let (inner_scheduler, inner_job) = (scheduler.clone(), recording_job(&log, "second"));
        let outer_log = Rc::clone(&log);
        scheduler.schedule(
            first,
            Rc::new(move || -> Result<()> {
                outer_log.borrow_mut().push("first");
                inner_scheduler.schedule(second, inner_job.clone());
                Ok(())
            }),
        );

        assert_eq!(scheduler.flush().unwrap(), 2);
        assert_eq!(*log.borrow(), ["first", "second"]);
    }

    #[test]
    fn test_error_stops_flush_and_keeps_rest_queued() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (failing, after) = (scheduler.next_job_id(), scheduler.next_job_id());
        scheduler.schedule(failing, Rc::new(|| -> Result<()> { Err(Error::internal("boom")) }));
        scheduler.schedule(after, recording_job(&log, "after"));

        assert!(scheduler.flush().is_err());
        assert!(scheduler.is_scheduled(after));
        assert_eq!(scheduler.flush().unwrap(), 1);
        assert_eq!(*log.borrow(), ["after"]);
    }

    #[test]
    fn test_cancel() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = scheduler.next_job_id();
        scheduler.schedule(id, recording_job(&log, "never"));
        scheduler.cancel(id);
        assert_eq!(scheduler.flush().unwrap(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_feedback_loop_is_reported() {
        let scheduler = Scheduler::new();
        let id = scheduler.next_job_id();
        let again = scheduler.clone();
        let job: Rc<RefCell<Option<Job>>> = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&job);
        let looping: Job = Rc::new(move || -> Result<()> {
            if let Some(next) = slot.borrow().clone() {
                again.schedule(id, next);
            }
            Ok(())
        });
        *job.borrow_mut() = Some(Rc::clone(&looping));
        scheduler.schedule(id, looping);

        let err = scheduler.flush().unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        // break the Rc cycle
        job.borrow_mut().take();
    }
}
