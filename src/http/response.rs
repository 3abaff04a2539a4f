//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! API para construir respuestas HTTP/1.0 y convertirlas a bytes para
//! enviarlas al cliente.
//!
//! ## Formato de una respuesta HTTP/1.0
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: text/plain; charset=utf-8\r\n
//! Content-Length: 2\r\n
//! \r\n
//! 1\n
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use hash_server::http::{Response, StatusCode};
//!
//! let response = Response::text(StatusCode::Ok, "42\n");
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.0 200 OK\r\n"));
//! ```

use super::StatusCode;
use std::collections::HashMap;

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP (200, 404, etc.)
    status: StatusCode,

    /// Headers HTTP; un HashMap evita duplicados
    headers: HashMap<String, String>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,
}

impl Response {
    /// Crea una nueva respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header a la respuesta (sobrescribe si ya existe)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega un header a una respuesta existente (versión mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Establece el cuerpo de la respuesta y su `Content-Length`
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self.headers
            .insert("Content-Length".to_string(), self.body.len().to_string());
        self
    }

    /// Respuesta de texto plano
    ///
    /// # Ejemplo
    /// ```
    /// use hash_server::http::{Response, StatusCode};
    ///
    /// let response = Response::text(StatusCode::Ok, "7\n");
    /// assert_eq!(response.body(), b"7\n");
    /// ```
    pub fn text(status: StatusCode, body: &str) -> Self {
        Self::new(status)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(body)
    }

    /// Crea una respuesta JSON exitosa (200 OK)
    pub fn json(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Crea una respuesta de error con mensaje JSON
    ///
    /// Formato del JSON: `{"error": "mensaje"}`
    ///
    /// # Ejemplo
    /// ```
    /// use hash_server::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::BadRequest, "Invalid request ID");
    /// assert_eq!(response.body(), br#"{"error":"Invalid request ID"}"#);
    /// ```
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(&body)
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// - Status line: `HTTP/1.0 200 OK\r\n`
    /// - Headers: `Header-Name: Value\r\n`
    /// - Línea vacía: `\r\n`
    /// - Body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(128 + self.body.len());

        result.extend_from_slice(format!("HTTP/1.0 {}\r\n", self.status).as_bytes());

        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        result.extend_from_slice(b"\r\n");
        result.extend_from_slice(&self.body);

        result
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Obtiene un header específico
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    /// Obtiene una referencia al body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_response() {
        let response = Response::new(StatusCode::Ok);
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.header("Content-Length"), None);
        assert!(response.body().is_empty());
        assert_eq!(response.to_bytes(), b"HTTP/1.0 200 OK\r\n\r\n".to_vec());
    }

    #[test]
    fn test_with_header_overwrites() {
        let response = Response::new(StatusCode::Ok)
            .with_header("X-Custom", "a")
            .with_header("X-Custom", "b");

        assert_eq!(response.header("X-Custom"), Some("b"));
        let text = String::from_utf8(response.to_bytes()).unwrap();
        assert_eq!(text.matches("X-Custom").count(), 1);
    }

    #[test]
    fn test_text_response() {
        let response = Response::text(StatusCode::Ok, "12\n");

        assert_eq!(response.body(), b"12\n");
        assert_eq!(response.header("Content-Length"), Some("3"));
        assert_eq!(
            response.header("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
    }

    #[test]
    fn test_json_response() {
        let response = Response::json(r#"{"total":0,"average":0}"#);

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_error_response_escapes_message() {
        let response = Response::error(StatusCode::BadRequest, r#"bad "quote""#);

        let value: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(value["error"], r#"bad "quote""#);
        assert_eq!(response.status(), StatusCode::BadRequest);
    }

    #[test]
    fn test_to_bytes() {
        let response = Response::text(StatusCode::NotFound, "Test");

        let text = String::from_utf8(response.to_bytes()).unwrap();

        assert!(text.starts_with("HTTP/1.0 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 4\r\n"));
        assert!(text.ends_with("\r\n\r\nTest"));
    }

    #[test]
    fn test_empty_body_response() {
        let text = String::from_utf8(Response::new(StatusCode::Ok).to_bytes()).unwrap();
        assert!(text.ends_with("\r\n\r\n"));
    }
}
