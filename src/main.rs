//! # Hash Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor de hashing.
//!
//! El nivel de log se controla con `RUST_LOG` (por defecto `info`).

use hash_server::config::Config;
use hash_server::server::Server;
use log::info;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // El logger va antes del parsing para registrar los ajustes de configuración
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("hash_server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::new();
    config.log_summary();

    let server = Server::bind(&config)?;
    server.run()?;

    info!("Bye");
    Ok(())
}
