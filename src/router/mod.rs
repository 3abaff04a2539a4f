//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea paths HTTP a handlers.
//!
//! ```text
//! Request → Router → Handler(Request, ServerContext) → Response
//! ```
//!
//! Las rutas exactas se evalúan primero y luego las de prefijo, en orden de
//! registro. Si ninguna coincide se responde 404 Not Found.

use crate::http::{Request, Response, StatusCode};
use crate::server::ServerContext;

/// Valor del header `Server`
pub const SERVER_NAME: &str = concat!("hash_server/", env!("CARGO_PKG_VERSION"));

/// Un handler recibe el request y el contexto compartido
pub type Handler = fn(&Request, &ServerContext) -> Response;

/// Router que mapea paths a handlers
pub struct Router {
    /// Rutas que deben coincidir completas (ej: "/stats")
    exact: Vec<(String, Handler)>,

    /// Rutas por prefijo (ej: "/hash/")
    prefixes: Vec<(String, Handler)>,
}

impl Router {
    /// Crea un nuevo router vacío
    pub fn new() -> Self {
        Self {
            exact: Vec::new(),
            prefixes: Vec::new(),
        }
    }

    /// Registra una ruta exacta
    pub fn register(&mut self, path: &str, handler: Handler) {
        self.exact.push((path.to_string(), handler));
    }

    /// Registra una ruta por prefijo
    pub fn register_prefix(&mut self, prefix: &str, handler: Handler) {
        self.prefixes.push((prefix.to_string(), handler));
    }

    /// Busca el handler para un path
    fn find(&self, path: &str) -> Option<Handler> {
        self.exact
            .iter()
            .find(|(route, _)| route == path)
            .or_else(|| self.prefixes.iter().find(|(prefix, _)| path.starts_with(prefix.as_str())))
            .map(|(_, handler)| *handler)
    }

    /// Ejecuta el handler apropiado para un request
    pub fn route(&self, request: &Request, context: &ServerContext) -> Response {
        let mut response = match self.find(request.path()) {
            Some(handler) => handler(request, context),
            None => Response::error(StatusCode::NotFound, "404 page not found"),
        };

        add_common_headers(&mut response);
        response
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Agrega los headers comunes a todas las respuestas
pub fn add_common_headers(response: &mut Response) {
    response.add_header("Server", SERVER_NAME);
    response.add_header("Connection", "close");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{Dispatcher, DispatcherConfig};
    use crate::server::ShutdownSignal;
    use std::sync::Arc;
    use std::time::Duration;

    fn context() -> ServerContext {
        let dispatcher = Dispatcher::start(DispatcherConfig {
            queue_capacity: 4,
            workers: 1,
            service_floor: Duration::ZERO,
        })
        .unwrap();
        ServerContext::new(Arc::new(dispatcher), ShutdownSignal::new())
    }

    fn request(raw: &[u8]) -> Request {
        Request::parse(raw).unwrap()
    }

    fn exact_handler(_req: &Request, _ctx: &ServerContext) -> Response {
        Response::text(StatusCode::Ok, "exact")
    }

    fn prefix_handler(req: &Request, _ctx: &ServerContext) -> Response {
        Response::text(StatusCode::Ok, req.path())
    }

    #[test]
    fn test_exact_route_found() {
        let mut router = Router::new();
        router.register("/hash", exact_handler);

        let response = router.route(&request(b"POST /hash HTTP/1.0\r\n\r\n"), &context());

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body(), b"exact");
    }

    #[test]
    fn test_exact_wins_over_prefix() {
        let mut router = Router::new();
        router.register_prefix("/hash", prefix_handler);
        router.register("/hash", exact_handler);

        let response = router.route(&request(b"GET /hash HTTP/1.0\r\n\r\n"), &context());
        assert_eq!(response.body(), b"exact");
    }

    #[test]
    fn test_prefix_route_found() {
        let mut router = Router::new();
        router.register("/hash", exact_handler);
        router.register_prefix("/hash/", prefix_handler);

        let response = router.route(&request(b"GET /hash/12 HTTP/1.0\r\n\r\n"), &context());
        assert_eq!(response.body(), b"/hash/12");
    }

    #[test]
    fn test_route_not_found() {
        let router = Router::new();

        let response = router.route(&request(b"GET /nonexistent HTTP/1.0\r\n\r\n"), &context());
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[test]
    fn test_common_headers_always_present() {
        let mut router = Router::new();
        router.register("/hash", exact_handler);
        let ctx = context();

        for raw in [&b"POST /hash HTTP/1.0\r\n\r\n"[..], &b"GET /missing HTTP/1.0\r\n\r\n"[..]] {
            let response = router.route(&request(raw), &ctx);
            assert_eq!(response.header("Connection"), Some("close"));
            assert_eq!(response.header("Server"), Some(SERVER_NAME));
        }
    }
}
