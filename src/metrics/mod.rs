//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Estadísticas agregadas de latencia de los jobs procesados:
//! - Contador total de jobs
//! - Promedio incremental del tiempo de cómputo (microsegundos)

pub mod stats;

pub use stats::{Stats, StatsAggregator};
