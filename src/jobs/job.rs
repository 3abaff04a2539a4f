//! # Estructura de Job
//! src/jobs/job.rs
//!
//! Representa un trabajo de hashing: un identificador, el instante en que
//! fue aceptado y el secreto a procesar. Es inmutable una vez creado.

use std::fmt;
use std::time::{Duration, Instant};

/// Identificador de job (entero positivo, creciente durante la vida del proceso)
pub type JobId = i64;

/// Un trabajo de hashing pendiente
#[derive(Clone)]
pub struct Job {
    /// ID único del job
    id: JobId,

    /// Momento en que se aceptó la petición
    submitted_at: Instant,

    /// Secreto en claro
    secret: String,
}

impl Job {
    /// Crea un job con timestamp actual
    pub fn new(id: JobId, secret: impl Into<String>) -> Self {
        Self::with_submitted_at(id, secret, Instant::now())
    }

    /// Crea un job con un instante de aceptación explícito
    pub fn with_submitted_at(id: JobId, secret: impl Into<String>, submitted_at: Instant) -> Self {
        Self {
            id,
            submitted_at,
            secret: secret.into(),
        }
    }

    /// ID del job
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Instante de aceptación
    pub fn submitted_at(&self) -> Instant {
        self.submitted_at
    }

    /// Secreto a hashear
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Instante a partir del cual el job puede procesarse
    pub fn ready_at(&self, service_floor: Duration) -> Instant {
        self.submitted_at + service_floor
    }

    /// Tiempo que falta para alcanzar el piso de servicio (cero si ya pasó)
    pub fn remaining_floor(&self, service_floor: Duration, now: Instant) -> Duration {
        self.ready_at(service_floor).saturating_duration_since(now)
    }
}

// El secreto nunca aparece en logs
impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("submitted_at", &self.submitted_at)
            .field("secret", &"<redacted>")
            .finish()
    }
}
