//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Implementación mínima de HTTP/1.0 sin librerías de alto nivel:
//!
//! - Parsing de requests (request line, headers, body de formulario)
//! - Construcción de responses
//! - Status codes
//!
//! HTTP/1.0 (RFC 1945) no requiere `Host`, no tiene chunked transfer
//! encoding y cierra la conexión después de cada respuesta.

pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
