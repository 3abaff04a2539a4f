//! # Cola de Entrada para Jobs
//! src/jobs/queue.rs
//!
//! Cola FIFO acotada y thread-safe entre los que envían jobs y los workers.
//!
//! - Si la cola está llena, `enqueue` bloquea al productor (backpressure)
//!   en vez de descartar o fallar.
//! - `close` impide nuevos envíos. Los jobs ya encolados se siguen
//!   entregando; cuando la cola queda vacía cada consumidor recibe
//!   `Dequeued::Closed` una sola vez.

use crate::jobs::job::Job;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

/// Resultado de `dequeue`
#[derive(Debug)]
pub enum Dequeued {
    /// Un job listo para procesar
    Job(Job),

    /// La cola fue cerrada y ya no tiene elementos
    Closed,
}

/// La cola está cerrada; se devuelve el job al llamador
#[derive(Debug, thiserror::Error)]
#[error("intake queue is closed")]
pub struct QueueClosed(pub Job);

/// Estado protegido por el mutex
struct QueueState {
    jobs: VecDeque<Job>,
    closed: bool,
}

struct QueueInner {
    state: Mutex<QueueState>,

    /// Notifica a los workers que hay jobs (o que se cerró la cola)
    not_empty: Condvar,

    /// Notifica a los productores que se liberó espacio (o que se cerró la cola)
    not_full: Condvar,

    capacity: usize,
}

/// Cola acotada. Clonarla comparte la misma cola.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<QueueInner>,
}

impl JobQueue {
    /// Crea una nueva cola con capacidad máxima (mínimo 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState {
                    jobs: VecDeque::with_capacity(capacity),
                    closed: false,
                }),
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
                capacity,
            }),
        }
    }

    /// Encola un job, bloqueando mientras la cola esté llena
    ///
    /// Retorna `Err(QueueClosed)` si la cola está cerrada (o se cierra
    /// mientras se espera espacio).
    pub fn enqueue(&self, job: Job) -> Result<(), QueueClosed> {
        let mut state = self.inner.state.lock();

        loop {
            if state.closed {
                return Err(QueueClosed(job));
            }
            if state.jobs.len() < self.inner.capacity {
                break;
            }
            self.inner.not_full.wait(&mut state);
        }

        state.jobs.push_back(job);
        self.inner.not_empty.notify_one();

        Ok(())
    }

    /// Desencola el job más antiguo
    ///
    /// Bloquea hasta que haya un job disponible o la cola esté cerrada y vacía.
    pub fn dequeue(&self) -> Dequeued {
        let mut state = self.inner.state.lock();

        loop {
            if let Some(job) = state.jobs.pop_front() {
                self.inner.not_full.notify_one();
                return Dequeued::Job(job);
            }

            if state.closed {
                return Dequeued::Closed;
            }

            self.inner.not_empty.wait(&mut state);
        }
    }

    /// Cierra la cola. Idempotente.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        state.closed = true;
        drop(state);

        // Despertar a todos: productores bloqueados y workers esperando
        self.inner.not_empty.notify_all();
        self.inner.not_full.notify_all();
    }

    /// Verifica si la cola fue cerrada
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Retorna el tamaño actual de la cola
    pub fn len(&self) -> usize {
        self.inner.state.lock().jobs.len()
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retorna la capacidad máxima
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Obtiene estadísticas de la cola
    pub fn stats(&self) -> QueueStats {
        let state = self.inner.state.lock();
        QueueStats {
            len: state.jobs.len(),
            capacity: self.inner.capacity,
            closed: state.closed,
        }
    }
}

/// Estadísticas de la cola
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub len: usize,
    pub capacity: usize,
    pub closed: bool,
}
