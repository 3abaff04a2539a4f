//! # Dispatcher de Jobs
//! src/jobs/dispatcher.rs
//!
//! Coordina el ciclo de vida del sistema de jobs: crea la cola, el almacén
//! y las estadísticas, lanza los workers, acepta envíos y consultas, y
//! ejecuta el apagado ordenado.
//!
//! ## Estados
//!
//! ```text
//! Starting ──► Running ──► Draining ──► Stopped
//! ```
//!
//! `shutdown` cierra la cola, espera a que cada worker termine los jobs
//! pendientes y recién entonces pasa a `Stopped`. Solo la primera llamada
//! hace el trabajo; las siguientes retornan `false` de inmediato.

use crate::config::Config;
use crate::jobs::error::DispatchError;
use crate::jobs::job::{Job, JobId};
use crate::jobs::queue::{JobQueue, QueueStats};
use crate::jobs::store::JobStore;
use crate::jobs::worker::Worker;
use crate::metrics::{Stats, StatsAggregator};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Piso de latencia de servicio: ningún job se procesa antes de este tiempo
pub const SERVICE_FLOOR: Duration = Duration::from_secs(5);

/// Estado del ciclo de vida
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Running,
    Draining,
    Stopped,
}

/// Configuración del Dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Capacidad de la cola de entrada
    pub queue_capacity: usize,

    /// Número de workers
    pub workers: usize,

    /// Latencia mínima entre la aceptación y el procesamiento
    pub service_floor: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: crate::config::DEFAULT_CHANNEL_SIZE,
            workers: crate::config::DEFAULT_NUM_OF_WORKERS,
            service_floor: SERVICE_FLOOR,
        }
    }
}

impl DispatcherConfig {
    /// Crea una configuración desde el Config principal
    pub fn from_config(config: &Config) -> Self {
        Self {
            queue_capacity: config.channel_size,
            workers: config.workers,
            service_floor: SERVICE_FLOOR,
        }
    }
}

/// Coordinador del sistema de jobs
pub struct Dispatcher {
    config: DispatcherConfig,
    queue: JobQueue,
    store: Arc<JobStore>,
    stats: Arc<StatsAggregator>,
    next_id: AtomicI64,
    state: Mutex<LifecycleState>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Crea el dispatcher y lanza exactamente `config.workers` workers
    pub fn start(config: DispatcherConfig) -> Result<Self, DispatchError> {
        let dispatcher = Self {
            queue: JobQueue::new(config.queue_capacity),
            store: Arc::new(JobStore::new()),
            stats: Arc::new(StatsAggregator::new()),
            next_id: AtomicI64::new(0),
            state: Mutex::new(LifecycleState::Starting),
            workers: Mutex::new(Vec::with_capacity(config.workers)),
            config,
        };

        for index in 0..dispatcher.config.workers {
            let worker = Worker::new(
                index,
                dispatcher.queue.clone(),
                Arc::clone(&dispatcher.store),
                Arc::clone(&dispatcher.stats),
                dispatcher.config.service_floor,
            );

            match worker.spawn() {
                Ok(handle) => dispatcher.workers.lock().push(handle),
                Err(e) => {
                    error!("Failed to spawn worker {}: {}", index, e);
                    // Cerrar la cola y unir los workers ya lanzados
                    *dispatcher.state.lock() = LifecycleState::Running;
                    dispatcher.shutdown();
                    return Err(DispatchError::WorkerSpawn(e));
                }
            }
        }

        *dispatcher.state.lock() = LifecycleState::Running;

        info!(
            "Dispatcher running: {} workers, queue capacity {}, service floor {:?}",
            dispatcher.config.workers,
            dispatcher.queue.capacity(),
            dispatcher.config.service_floor
        );

        Ok(dispatcher)
    }

    /// Envía un secreto para hashear y retorna el ID asignado
    ///
    /// Bloquea si la cola está llena.
    pub fn submit(&self, secret: &str) -> Result<JobId, DispatchError> {
        if secret.is_empty() {
            return Err(DispatchError::InvalidInput);
        }
        if self.queue.is_closed() {
            return Err(DispatchError::ShuttingDown);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;

        // La entrada existe antes de que el job sea visible en la cola
        self.store.add(id, String::new());

        if let Err(rejected) = self.queue.enqueue(Job::new(id, secret)) {
            // Perdimos la carrera contra shutdown: no dejar la entrada pendiente para siempre
            self.store.remove(rejected.0.id());
            warn!("Job {} rejected: queue closed during submission", id);
            return Err(DispatchError::ShuttingDown);
        }

        debug!("Job {} accepted", id);
        Ok(id)
    }

    /// Consulta el digest de un job
    pub fn fetch(&self, id: JobId) -> Result<String, DispatchError> {
        if id <= 0 {
            return Err(DispatchError::InvalidId(id));
        }

        match self.store.get(id) {
            None => Err(DispatchError::NotFound(id)),
            Some(digest) if digest.is_empty() => Err(DispatchError::NotReady(id)),
            Some(digest) => Ok(digest),
        }
    }

    /// Snapshot de las estadísticas
    pub fn stats(&self) -> Stats {
        self.stats.snapshot()
    }

    /// Estadísticas serializadas como JSON (`total`, `average`)
    pub fn stats_json(&self) -> Result<String, DispatchError> {
        Ok(self.stats.to_json()?)
    }

    /// Apagado ordenado: cerrar la cola, drenar y unir todos los workers
    ///
    /// Retorna `true` solo para la llamada que efectivamente apagó.
    pub fn shutdown(&self) -> bool {
        {
            let mut state = self.state.lock();
            if *state != LifecycleState::Running {
                debug!("Shutdown ignored: dispatcher is {:?}", *state);
                return false;
            }
            *state = LifecycleState::Draining;
        }

        info!(
            "Draining: {} queued, {} pending",
            self.queue.len(),
            self.store.pending_count()
        );

        self.queue.close();

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!("Worker {} panicked", name);
            }
        }

        *self.state.lock() = LifecycleState::Stopped;

        let stats = self.stats.snapshot();
        info!(
            "Dispatcher stopped: {} jobs processed, average {} us",
            stats.total, stats.average
        );

        true
    }

    /// Estado actual del ciclo de vida
    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    /// Acceso de solo lectura al almacén de resultados
    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Estadísticas de la cola de entrada
    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
