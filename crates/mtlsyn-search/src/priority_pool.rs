//! A thread pool that processes jobs in priority order
//!
//! Jobs are parameterless closures, enqueued with a priority; lower values
//! are dequeued first and jobs of equal priority run in insertion order.
//! Workers are started explicitly, [`PriorityThreadPool::wait`] blocks until
//! the queue is drained and every worker is idle, and
//! [`PriorityThreadPool::queue_access`] grants synchronous access to the
//! queue for the deterministic single-threaded stepping mode.

use std::collections::BinaryHeap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;

/// A job processed by the pool
pub type Job = Box<dyn FnOnce() + Send + 'static>;

struct PrioritizedJob<P> {
    priority: P,
    sequence: u64,
    job: Job,
}

// The heap is a max-heap, so the ordering is reversed: the job with the
// lowest priority value (and lowest sequence number among equals) is the
// greatest element.
impl<P: Ord> Ord for PrioritizedJob<P> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then(other.sequence.cmp(&self.sequence))
    }
}

impl<P: Ord> PartialOrd for PrioritizedJob<P> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: Ord> PartialEq for PrioritizedJob<P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl<P: Ord> Eq for PrioritizedJob<P> {}

struct Queue<P> {
    heap: BinaryHeap<PrioritizedJob<P>>,
    next_sequence: u64,
    busy_workers: usize,
    stopped: bool,
}

struct PoolInner<P> {
    queue: Mutex<Queue<P>>,
    job_available: Condvar,
    idle: Condvar,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

/// A priority-ordered thread pool
///
/// The pool handle is cheap to clone; all clones share the same queue and
/// workers.
pub struct PriorityThreadPool<P> {
    inner: Arc<PoolInner<P>>,
}

impl<P> Clone for PriorityThreadPool<P> {
    fn clone(&self) -> Self {
        PriorityThreadPool {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Ord + Send + 'static> Default for PriorityThreadPool<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Ord + Send + 'static> PriorityThreadPool<P> {
    /// Create a new pool without starting any workers
    pub fn new() -> Self {
        PriorityThreadPool {
            inner: Arc::new(PoolInner {
                queue: Mutex::new(Queue {
                    heap: BinaryHeap::new(),
                    next_sequence: 0,
                    busy_workers: 0,
                    stopped: false,
                }),
                job_available: Condvar::new(),
                idle: Condvar::new(),
                workers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Enqueue a job with the given priority; lower values run first
    pub fn add_job<F: FnOnce() + Send + 'static>(&self, job: F, priority: P) {
        let mut queue = self.inner.queue.lock().unwrap();
        let sequence = queue.next_sequence;
        queue.next_sequence += 1;
        queue.heap.push(PrioritizedJob {
            priority,
            sequence,
            job: Box::new(job),
        });
        drop(queue);
        self.inner.job_available.notify_one();
    }

    /// Start one worker per available hardware thread
    pub fn start(&self) {
        self.inner.queue.lock().unwrap().stopped = false;
        let worker_count = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let mut workers = self.inner.workers.lock().unwrap();
        for _ in 0..worker_count {
            let inner = Arc::clone(&self.inner);
            workers.push(thread::spawn(move || Self::work(&inner)));
        }
    }

    fn work(inner: &Arc<PoolInner<P>>) {
        loop {
            let job = {
                let mut queue = inner.queue.lock().unwrap();
                loop {
                    if queue.stopped {
                        return;
                    }
                    if let Some(entry) = queue.heap.pop() {
                        queue.busy_workers += 1;
                        break entry.job;
                    }
                    inner.idle.notify_all();
                    queue = inner.job_available.wait(queue).unwrap();
                }
            };
            job();
            let mut queue = inner.queue.lock().unwrap();
            queue.busy_workers -= 1;
            if queue.busy_workers == 0 && queue.heap.is_empty() {
                inner.idle.notify_all();
            }
        }
    }

    /// Block until the queue is empty and no worker is running a job
    pub fn wait(&self) {
        let mut queue = self.inner.queue.lock().unwrap();
        while !(queue.heap.is_empty() && queue.busy_workers == 0) {
            queue = self.inner.idle.wait(queue).unwrap();
        }
    }

    /// Stop all workers and join them
    ///
    /// Jobs still in the queue are kept and will be processed if the pool
    /// is started again.
    pub fn stop(&self) {
        self.inner.queue.lock().unwrap().stopped = true;
        self.inner.job_available.notify_all();
        let workers = std::mem::take(&mut *self.inner.workers.lock().unwrap());
        for worker in workers {
            let _ = worker.join();
        }
    }

    /// Lock the queue for synchronous inspection
    ///
    /// While the returned guard is alive no worker can dequeue jobs, so
    /// this must not be held while running a popped job.
    pub fn queue_access(&self) -> QueueAccess<'_, P> {
        QueueAccess {
            guard: self.inner.queue.lock().unwrap(),
        }
    }
}

/// Synchronous access to the job queue for single-threaded stepping
pub struct QueueAccess<'a, P> {
    guard: MutexGuard<'a, Queue<P>>,
}

impl<P: Ord> QueueAccess<'_, P> {
    /// Check whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.guard.heap.is_empty()
    }

    /// The priority of the job that would be dequeued next
    pub fn top_priority(&self) -> Option<&P> {
        self.guard.heap.peek().map(|entry| &entry.priority)
    }

    /// Remove and return the highest-priority job
    pub fn pop(&mut self) -> Option<(P, Job)> {
        self.guard.heap.pop().map(|entry| (entry.priority, entry.job))
    }
}
