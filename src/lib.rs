//! # Hash Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 que acepta contraseñas, las hashea de forma asíncrona
//! en un pool fijo de workers y permite consultar el resultado por ID.
//!
//! ## Arquitectura
//!
//! - `http`: Parsing y construcción de mensajes HTTP/1.0
//! - `server`: Servidor TCP, contexto compartido y señal de apagado
//! - `router`: Enrutamiento de peticiones a handlers
//! - `jobs`: Cola acotada, workers, almacén de resultados y dispatcher
//! - `metrics`: Estadísticas de latencia de los jobs
//! - `digest`: SHA-512 codificado en base64 URL-safe
//! - `config`: Configuración por CLI y variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use hash_server::config::Config;
//! use hash_server::server::Server;
//!
//! let config = Config::default();
//! let server = Server::bind(&config).expect("Error al iniciar servidor");
//! server.run().expect("Error en el servidor");
//! ```

pub mod config;
pub mod digest;
pub mod http;
pub mod jobs;
pub mod metrics;
pub mod router;
pub mod server;
