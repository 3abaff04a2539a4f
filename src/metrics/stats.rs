//! # Agregador de Estadísticas
//! src/metrics/stats.rs
//!
//! Lleva el contador de jobs procesados y un promedio incremental del
//! tiempo de cómputo del digest (en microsegundos).
//!
//! ## Regla de actualización
//!
//! El promedio NO es una media aritmética real:
//!
//! ```text
//! primera muestra:  total = 1,      average = muestra
//! siguientes:       total += 1,     average = (average + muestra) / 2
//! ```
//!
//! La división es entera.

use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Snapshot de las estadísticas (lo que se serializa en `/stats`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Número de jobs procesados
    pub total: u64,

    /// Promedio incremental en microsegundos
    pub average: u64,
}

impl Stats {
    fn apply(&mut self, micros: u64) {
        if self.total == 0 {
            self.total = 1;
            self.average = micros;
        } else {
            self.total += 1;
            self.average = (self.average + micros) / 2;
        }
    }
}

/// Agregador thread-safe compartido por todos los workers
#[derive(Debug, Default)]
pub struct StatsAggregator {
    inner: Mutex<Stats>,
}

impl StatsAggregator {
    /// Crea un agregador vacío
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una muestra de latencia (microsegundos)
    pub fn record(&self, micros: u64) {
        self.inner.lock().apply(micros);
    }

    /// Obtiene una copia consistente de las estadísticas
    pub fn snapshot(&self) -> Stats {
        *self.inner.lock()
    }

    /// Serializa las estadísticas como `{"total":N,"average":M}`
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.snapshot())
    }

    /// Escribe las estadísticas actuales al log
    pub fn dump(&self) {
        let stats = self.snapshot();
        debug!(
            "Total requests = {}, average time = {} microseconds",
            stats.total, stats.average
        );
    }
}
