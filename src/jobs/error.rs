//! # Errores del Sistema de Jobs
//! src/jobs/error.rs

use crate::jobs::job::JobId;

/// Errores que el dispatcher reporta a quien lo llama
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Secreto vacío; se rechaza antes de tocar cualquier estado
    #[error("secret must not be empty")]
    InvalidInput,

    /// ID no positivo; se rechaza antes de buscarlo
    #[error("invalid job id: {0}")]
    InvalidId(JobId),

    /// El ID nunca fue emitido
    #[error("job {0} not found")]
    NotFound(JobId),

    /// El ID existe pero el digest aún no está calculado
    #[error("job {0} is not ready")]
    NotReady(JobId),

    /// La cola de entrada ya fue cerrada
    #[error("dispatcher is shutting down")]
    ShuttingDown,

    /// Falló la serialización de las estadísticas
    #[error("failed to serialize stats: {0}")]
    Serialization(#[from] serde_json::Error),

    /// El sistema operativo no pudo crear un worker
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}
