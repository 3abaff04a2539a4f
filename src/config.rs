//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor de hashing con soporte para argumentos CLI y
//! variables de entorno.
//!
//! Los valores de tamaño de cola y número de workers nunca hacen fallar el
//! arranque: un valor no numérico usa el valor por defecto y uno fuera de
//! rango se ajusta al límite más cercano. Ambos casos quedan en el log.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./hash_server --port 8080 --channel-size 1024 --workers 20
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 CHANNEL_SIZE=1024 NUM_OF_WORKERS=20 ./hash_server
//! ```

use clap::Parser;
use log::{info, warn};

/// Capacidad por defecto de la cola de entrada
pub const DEFAULT_CHANNEL_SIZE: usize = 256;
pub const MIN_CHANNEL_SIZE: usize = 256;
pub const MAX_CHANNEL_SIZE: usize = 16384;

/// Número de workers por defecto
pub const DEFAULT_NUM_OF_WORKERS: usize = 10;
pub const MIN_NUM_OF_WORKERS: usize = 10;
pub const MAX_NUM_OF_WORKERS: usize = 100;

/// Configuración del servidor de hashing
#[derive(Debug, Clone, Parser)]
#[command(name = "hash_server")]
#[command(about = "Servidor HTTP/1.0 de hashing de contraseñas con jobs asíncronos")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Capacidad de la cola de entrada (256-16384)
    #[arg(
        long = "channel-size",
        default_value = "256",
        env = "CHANNEL_SIZE",
        allow_hyphen_values = true,
        value_parser = parse_channel_size
    )]
    pub channel_size: usize,

    /// Número de workers de hashing (10-100)
    #[arg(
        long = "workers",
        default_value = "10",
        env = "NUM_OF_WORKERS",
        allow_hyphen_values = true,
        value_parser = parse_num_of_workers
    )]
    pub workers: usize,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI y entorno
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use hash_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Escribe la configuración efectiva al log
    pub fn log_summary(&self) {
        info!("Configuration:");
        info!("  Address:      {}", self.address());
        info!("  Channel size: {}", self.channel_size);
        info!("  Workers:      {}", self.workers);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            channel_size: DEFAULT_CHANNEL_SIZE,
            workers: DEFAULT_NUM_OF_WORKERS,
        }
    }
}

fn parse_channel_size(value: &str) -> Result<usize, String> {
    Ok(parse_clamped(
        "CHANNEL_SIZE",
        value,
        MIN_CHANNEL_SIZE,
        MAX_CHANNEL_SIZE,
        DEFAULT_CHANNEL_SIZE,
    ))
}

fn parse_num_of_workers(value: &str) -> Result<usize, String> {
    Ok(parse_clamped(
        "NUM_OF_WORKERS",
        value,
        MIN_NUM_OF_WORKERS,
        MAX_NUM_OF_WORKERS,
        DEFAULT_NUM_OF_WORKERS,
    ))
}

/// Parsea un entero y lo ajusta a `[min, max]`; si no es numérico usa `default`
fn parse_clamped(name: &str, value: &str, min: usize, max: usize, default: usize) -> usize {
    match value.trim().parse::<i64>() {
        Ok(n) if n < min as i64 => {
            warn!("{} = {} is below the minimum, using {}", name, n, min);
            min
        }
        Ok(n) if n > max as i64 => {
            warn!("{} = {} is above the maximum, using {}", name, n, max);
            max
        }
        Ok(n) => n as usize,
        Err(_) => {
            warn!("Invalid value of {} {:?}, using default {}", name, value, default);
            default
        }
    }
}
