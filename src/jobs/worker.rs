//! # Workers de Hashing
//! src/jobs/worker.rs
//!
//! Cada worker es un thread del sistema operativo que repite:
//!
//! ```text
//! dequeue ──► Closed ──► termina
//!    │
//!    ▼
//!  Job ──► dormir hasta submitted_at + piso ──► digest ──► store.add ──► stats.record
//!    ▲                                                                       │
//!    └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Un job que ya se desencoló siempre se procesa completo antes de volver
//! a mirar la cola.

use crate::digest;
use crate::jobs::job::Job;
use crate::jobs::queue::{Dequeued, JobQueue};
use crate::jobs::store::JobStore;
use crate::metrics::StatsAggregator;
use log::{debug, info};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Un worker del pool
pub(crate) struct Worker {
    name: String,
    queue: JobQueue,
    store: Arc<JobStore>,
    stats: Arc<StatsAggregator>,
    service_floor: Duration,
}

impl Worker {
    pub(crate) fn new(
        index: usize,
        queue: JobQueue,
        store: Arc<JobStore>,
        stats: Arc<StatsAggregator>,
        service_floor: Duration,
    ) -> Self {
        Self {
            name: format!("hash-worker-{}", index),
            queue,
            store,
            stats,
            service_floor,
        }
    }

    /// Lanza el worker en su propio thread
    pub(crate) fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || self.run())
    }

    /// Loop principal del worker
    fn run(self) {
        debug!("Worker {} started", self.name);

        loop {
            match self.queue.dequeue() {
                Dequeued::Job(job) => self.process(job),
                Dequeued::Closed => break,
            }
        }

        info!("Worker {} terminating", self.name);
    }

    /// Procesa un job de principio a fin
    fn process(&self, job: Job) {
        debug!("Worker {} picked up job {}", self.name, job.id());

        // Respetar el piso de latencia de servicio
        let wait = job.remaining_floor(self.service_floor, Instant::now());
        if !wait.is_zero() {
            thread::sleep(wait);
        }

        // Solo se mide el cómputo del digest, no la espera
        let begin = Instant::now();
        let encoded = digest::encode_secret(job.secret());
        let elapsed = begin.elapsed();

        self.store.add(job.id(), encoded);
        self.stats.record(elapsed.as_micros() as u64);

        debug!(
            "Worker {} completed job {} ({} us)",
            self.name,
            job.id(),
            elapsed.as_micros()
        );

        self.store.dump();
        self.stats.dump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(queue: &JobQueue, store: &Arc<JobStore>, stats: &Arc<StatsAggregator>, floor: Duration) -> Worker {
        Worker::new(0, queue.clone(), Arc::clone(store), Arc::clone(stats), floor)
    }

    #[test]
    fn test_worker_processes_and_exits_on_close() {
        let queue = JobQueue::new(8);
        let store = Arc::new(JobStore::new());
        let stats = Arc::new(StatsAggregator::new());

        for id in 1..=3 {
            store.add(id, String::new());
            queue.enqueue(Job::new(id, format!("pwd-{}", id))).unwrap();
        }
        queue.close();

        let handle = worker(&queue, &store, &stats, Duration::ZERO).spawn().unwrap();
        handle.join().unwrap();

        for id in 1..=3 {
            assert_eq!(store.get(id), Some(digest::encode_secret(&format!("pwd-{}", id))));
        }
        assert_eq!(stats.snapshot().total, 3);
    }

    #[test]
    fn test_worker_waits_for_floor() {
        let queue = JobQueue::new(1);
        let store = Arc::new(JobStore::new());
        let stats = Arc::new(StatsAggregator::new());
        let floor = Duration::from_millis(300);

        let submitted = Instant::now();
        store.add(1, String::new());
        queue.enqueue(Job::with_submitted_at(1, "pwd", submitted)).unwrap();
        queue.close();

        worker(&queue, &store, &stats, floor).spawn().unwrap().join().unwrap();

        assert!(submitted.elapsed() >= floor);
        assert!(store.get(1).map(|d| !d.is_empty()).unwrap_or(false));
    }

    #[test]
    fn test_worker_skips_wait_when_floor_elapsed() {
        let queue = JobQueue::new(1);
        let store = Arc::new(JobStore::new());
        let stats = Arc::new(StatsAggregator::new());

        let floor = Duration::from_secs(1);

        // El piso ya pasó mientras el job esperaba en la cola: no debe dormir
        queue.enqueue(Job::with_submitted_at(1, "pwd", Instant::now())).unwrap();
        queue.close();
        thread::sleep(floor + Duration::from_millis(100));

        let start = Instant::now();
        worker(&queue, &store, &stats, floor).spawn().unwrap().join().unwrap();

        assert!(start.elapsed() < Duration::from_millis(500));
        assert!(store.get(1).is_some());
    }

    #[test]
    fn test_worker_thread_name() {
        let queue = JobQueue::new(1);
        queue.close();
        let store = Arc::new(JobStore::new());
        let stats = Arc::new(StatsAggregator::new());

        let handle = Worker::new(7, queue, store, stats, Duration::ZERO).spawn().unwrap();
        assert_eq!(handle.thread().name(), Some("hash-worker-7"));
        handle.join().unwrap();
    }
}
