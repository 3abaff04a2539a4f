//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones (un thread por conexión)
//! 3. Lee y parsea requests HTTP
//! 4. Genera y envía responses HTTP
//! 5. Al recibir `/shutdown`, deja de aceptar y drena los jobs

pub mod context;
pub mod tcp;

pub use context::{ServerContext, ShutdownSignal};
pub use tcp::{Server, ServerError};
