//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Servidor TCP que maneja múltiples conexiones simultáneas usando threads.
//! Cada conexión se procesa en su propio thread y se cierra después de la
//! respuesta (HTTP/1.0).
//!
//! ## Apagado
//!
//! ```text
//! /shutdown ──► ShutdownSignal ──► accept loop termina
//!                                      │
//!                                      ▼
//!                     Dispatcher::shutdown (drena y une workers)
//!                                      │
//!                                      ▼
//!                     cierra la lectura de las conexiones abiertas
//!                                      │
//!                                      ▼
//!                     une threads de conexión ──► libera listener
//! ```
//!
//! Un cliente inactivo recibe EOF en vez de retener el apagado hasta
//! `READ_TIMEOUT`.

use crate::config::Config;
use crate::http::request::find_subsequence;
use crate::http::{ParseError, Request, Response, StatusCode};
use crate::jobs::{handlers, DispatchError, Dispatcher, DispatcherConfig};
use crate::router::{add_common_headers, Router};
use crate::server::context::{ServerContext, ShutdownSignal};
use log::{debug, error, info, warn};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Tamaño máximo de un request (head + body)
pub const MAX_REQUEST_SIZE: usize = 64 * 1024;

/// Tiempo máximo de espera por datos del cliente
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Errores del servidor
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Resultado de leer un request del socket
enum ReadOutcome {
    /// El cliente cerró sin enviar nada
    Closed,
    Request(Vec<u8>),
    /// El cliente cerró antes de enviar los `Content-Length` bytes del body
    Incomplete,
    TooLarge,
}

/// Thread de una conexión y un clon del socket para cortar su lectura
struct Connection {
    handle: JoinHandle<()>,
    stream: TcpStream,
}

/// Servidor HTTP/1.0 concurrente
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Arc<Router>,
    context: ServerContext,
}

impl Server {
    /// Arranca el dispatcher según `config` y abre el listener
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        let dispatcher = Dispatcher::start(DispatcherConfig::from_config(config))?;
        Self::bind_with(&config.address(), dispatcher)
    }

    /// Abre el listener en `address` usando un dispatcher ya arrancado
    ///
    /// Si el bind falla, el dispatcher se apaga al descartarse.
    pub fn bind_with(address: &str, dispatcher: Dispatcher) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(address).map_err(|source| ServerError::Bind {
            address: address.to_string(),
            source,
        })?;
        let local_addr = listener.local_addr()?;

        let shutdown = ShutdownSignal::new();
        shutdown.arm(local_addr);

        Ok(Self {
            listener,
            local_addr,
            router: Arc::new(Self::routes()),
            context: ServerContext::new(Arc::new(dispatcher), shutdown),
        })
    }

    /// Tabla de rutas del servidor de hashing
    fn routes() -> Router {
        let mut router = Router::new();
        router.register("/hash", handlers::submit_handler);
        router.register_prefix("/hash/", handlers::hash_handler);
        router.register("/stats", handlers::stats_handler);
        router.register("/shutdown", handlers::shutdown_handler);
        router
    }

    /// Dirección real del listener (útil con puerto 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Señal para apagar el servidor desde fuera
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.context.shutdown.clone()
    }

    /// Acepta conexiones hasta que se solicita el apagado
    pub fn run(self) -> Result<(), ServerError> {
        info!("Listening on {}", self.local_addr);

        let mut connections: Vec<Connection> = Vec::new();

        for stream in self.listener.incoming() {
            if self.context.shutdown.is_requested() {
                break;
            }

            match stream {
                Ok(stream) => {
                    let reader = match stream.try_clone() {
                        Ok(reader) => reader,
                        Err(e) => {
                            warn!("Failed to clone connection socket: {}", e);
                            continue;
                        }
                    };
                    let router = Arc::clone(&self.router);
                    let context = self.context.clone();

                    let spawned = thread::Builder::new()
                        .name("http-conn".to_string())
                        .spawn(move || {
                            if let Err(e) = handle_connection(stream, &router, &context) {
                                warn!("Connection error: {}", e);
                            }
                        });

                    match spawned {
                        Ok(handle) => connections.push(Connection {
                            handle,
                            stream: reader,
                        }),
                        Err(e) => error!("Failed to spawn connection thread: {}", e),
                    }

                    connections.retain(|conn| !conn.handle.is_finished());
                }
                Err(e) => warn!("Failed to accept connection: {}", e),
            }
        }

        let dispatcher = &self.context.dispatcher;
        let queue = dispatcher.queue_stats();
        info!(
            "Listener stopped accepting connections: {}/{} queued, {} pending",
            queue.len,
            queue.capacity,
            dispatcher.store().pending_count()
        );

        // Primero drenar los jobs; las conexiones bloqueadas en la cola reciben 503
        dispatcher.shutdown();
        debug!("Dispatcher is {:?}", dispatcher.state());

        for conn in &connections {
            if let Err(e) = conn.stream.shutdown(Shutdown::Read) {
                debug!("Connection already closed: {}", e);
            }
        }

        for conn in connections {
            if conn.handle.join().is_err() {
                error!("Connection thread panicked");
            }
        }

        info!("HTTP server shut down gracefully");
        Ok(())
    }
}

/// Atiende una conexión: lee, parsea, enruta y responde
fn handle_connection(
    mut stream: TcpStream,
    router: &Router,
    context: &ServerContext,
) -> io::Result<()> {
    let start = Instant::now();
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let (response, label) = match read_request(&mut stream)? {
        ReadOutcome::Closed => {
            debug!("Connection from {} closed without data", peer);
            return Ok(());
        }
        ReadOutcome::Incomplete => {
            warn!("Connection from {} closed before the full body arrived", peer);
            let message = ParseError::IncompleteRequest.to_string();
            let mut response = Response::error(StatusCode::BadRequest, &message);
            add_common_headers(&mut response);
            (response, "-".to_string())
        }
        ReadOutcome::TooLarge => {
            warn!("Request from {} exceeds {} bytes", peer, MAX_REQUEST_SIZE);
            let mut response = Response::error(StatusCode::PayloadTooLarge, "Request too large");
            add_common_headers(&mut response);
            (response, "-".to_string())
        }
        ReadOutcome::Request(buffer) => match Request::parse(&buffer) {
            Ok(request) => {
                let label = format!("{} {}", request.method(), request.path());
                (router.route(&request, context), label)
            }
            Err(e) => {
                warn!("Parse error from {}: {}", peer, e);
                let mut response = Response::error(StatusCode::BadRequest, &e.to_string());
                add_common_headers(&mut response);
                (response, "-".to_string())
            }
        },
    };

    stream.write_all(&response.to_bytes())?;
    stream.flush()?;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    if response.status().is_server_error() {
        warn!("{} {} -> {} ({:.2} ms)", peer, label, response.status(), elapsed_ms);
    } else {
        debug!("{} {} -> {} ({:.2} ms)", peer, label, response.status(), elapsed_ms);
    }

    Ok(())
}

/// Lee del socket hasta completar headers + `Content-Length` bytes de body
fn read_request(stream: &mut impl Read) -> io::Result<ReadOutcome> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);

        if buffer.len() > MAX_REQUEST_SIZE {
            return Ok(ReadOutcome::TooLarge);
        }

        if let Some(head_end) = find_subsequence(&buffer, b"\r\n\r\n") {
            let expected = head_end + 4 + content_length(&buffer[..head_end]);
            if expected > MAX_REQUEST_SIZE {
                return Ok(ReadOutcome::TooLarge);
            }
            if buffer.len() >= expected {
                buffer.truncate(expected);
                break;
            }
        }
    }

    if buffer.is_empty() {
        return Ok(ReadOutcome::Closed);
    }

    // EOF antes de completar el body declarado
    if let Some(head_end) = find_subsequence(&buffer, b"\r\n\r\n") {
        if buffer.len() < head_end + 4 + content_length(&buffer[..head_end]) {
            return Ok(ReadOutcome::Incomplete);
        }
    }

    Ok(ReadOutcome::Request(buffer))
}

/// Extrae `Content-Length` de los headers crudos (0 si falta o es inválido)
fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .split("\r\n")
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn test_server() -> Server {
        let dispatcher = Dispatcher::start(DispatcherConfig {
            queue_capacity: 8,
            workers: 2,
            service_floor: Duration::ZERO,
        })
        .unwrap();
        Server::bind_with("127.0.0.1:0", dispatcher).unwrap()
    }

    fn send(addr: SocketAddr, raw: &[u8]) -> String {
        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(raw).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    // ==================== read_request ====================

    #[test]
    fn test_read_request_with_body() {
        let raw = b"POST /hash HTTP/1.0\r\nContent-Length: 10\r\n\r\npassword=x";
        match read_request(&mut Cursor::new(&raw[..])).unwrap() {
            ReadOutcome::Request(buf) => assert_eq!(buf, raw.to_vec()),
            _ => panic!("expected a request"),
        }
    }

    #[test]
    fn test_read_request_ignores_trailing_bytes() {
        let raw = b"POST /hash HTTP/1.0\r\nContent-Length: 3\r\n\r\nabcdef";
        match read_request(&mut Cursor::new(&raw[..])).unwrap() {
            ReadOutcome::Request(buf) => assert!(buf.ends_with(b"\r\n\r\nabc")),
            _ => panic!("expected a request"),
        }
    }

    #[test]
    fn test_read_request_empty_stream() {
        assert!(matches!(
            read_request(&mut Cursor::new(&b""[..])).unwrap(),
            ReadOutcome::Closed
        ));
    }

    #[test]
    fn test_read_request_truncated_body() {
        let raw = b"POST /hash HTTP/1.0\r\nContent-Length: 30\r\n\r\npassword=angry";
        assert!(matches!(
            read_request(&mut Cursor::new(&raw[..])).unwrap(),
            ReadOutcome::Incomplete
        ));
    }

    #[test]
    fn test_read_request_without_blank_line() {
        // Sin separador de headers no hay body esperado: el parser decide
        let raw = b"GET /stats HTTP/1.0\r\n";
        assert!(matches!(
            read_request(&mut Cursor::new(&raw[..])).unwrap(),
            ReadOutcome::Request(_)
        ));
    }

    #[test]
    fn test_read_request_too_large() {
        let raw = format!(
            "POST /hash HTTP/1.0\r\nContent-Length: {}\r\n\r\n",
            MAX_REQUEST_SIZE * 2
        );
        assert!(matches!(
            read_request(&mut Cursor::new(raw.into_bytes())).unwrap(),
            ReadOutcome::TooLarge
        ));
    }

    #[test]
    fn test_content_length_case_insensitive() {
        assert_eq!(content_length(b"POST / HTTP/1.0\r\ncontent-LENGTH: 42"), 42);
        assert_eq!(content_length(b"POST / HTTP/1.0\r\nHost: x"), 0);
        assert_eq!(content_length(b"POST / HTTP/1.0\r\nContent-Length: nope"), 0);
    }

    // ==================== Server ====================

    #[test]
    fn test_bind_error_reports_address() {
        let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = occupied.local_addr().unwrap().to_string();

        let dispatcher = Dispatcher::start(DispatcherConfig {
            queue_capacity: 1,
            workers: 1,
            service_floor: Duration::ZERO,
        })
        .unwrap();

        match Server::bind_with(&address, dispatcher) {
            Err(ServerError::Bind { address: reported, .. }) => assert_eq!(reported, address),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("bind should fail on an occupied port"),
        }
    }

    #[test]
    fn test_server_handles_requests_and_stops() {
        let server = test_server();
        let addr = server.local_addr();
        let signal = server.shutdown_signal();
        let handle = thread::spawn(move || server.run());

        let text = send(addr, b"GET /stats HTTP/1.0\r\n\r\n");
        assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("{\"total\":0,\"average\":0}\n"));

        let text = send(addr, b"GET /nope HTTP/1.0\r\n\r\n");
        assert!(text.starts_with("HTTP/1.0 404 Not Found\r\n"));

        assert!(signal.request());
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn test_server_parse_error_is_400() {
        let server = test_server();
        let addr = server.local_addr();
        let signal = server.shutdown_signal();
        let handle = thread::spawn(move || server.run());

        let text = send(addr, b"\x00\x01\x02\x03garbage\r\n\r\n");
        assert!(text.starts_with("HTTP/1.0 400 Bad Request\r\n"));
        assert!(text.contains("Server: "));

        signal.request();
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn test_server_truncated_body_is_400() {
        let server = test_server();
        let addr = server.local_addr();
        let signal = server.shutdown_signal();
        let handle = thread::spawn(move || server.run());

        let mut client = TcpStream::connect(addr).unwrap();
        client
            .write_all(b"POST /hash HTTP/1.0\r\nContent-Length: 30\r\n\r\npassword=angry")
            .unwrap();
        client.shutdown(Shutdown::Write).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        let text = String::from_utf8_lossy(&buf);
        assert!(text.starts_with("HTTP/1.0 400 Bad Request\r\n"));
        assert!(text.contains("Incomplete HTTP request"));

        signal.request();
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn test_idle_client_does_not_hold_shutdown() {
        let server = test_server();
        let addr = server.local_addr();
        let signal = server.shutdown_signal();
        let handle = thread::spawn(move || server.run());

        // Conexión abierta que nunca envía nada
        let mut idle = TcpStream::connect(addr).unwrap();
        idle.set_read_timeout(Some(Duration::from_secs(10))).unwrap();

        // Una petición completa después garantiza que la conexión inactiva ya fue aceptada
        let text = send(addr, b"GET /stats HTTP/1.0\r\n\r\n");
        assert!(text.contains("200 OK"));

        let start = Instant::now();
        assert!(signal.request());
        handle.join().unwrap().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));

        // El servidor cerró la conexión sin responder
        let mut buf = Vec::new();
        idle.read_to_end(&mut buf).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_server_peer_closed_immediately() {
        let server = test_server();
        let addr = server.local_addr();
        let signal = server.shutdown_signal();
        let handle = thread::spawn(move || server.run());

        drop(TcpStream::connect(addr).unwrap());

        // El servidor sigue atendiendo
        let text = send(addr, b"GET /stats HTTP/1.0\r\n\r\n");
        assert!(text.contains("200 OK"));

        signal.request();
        handle.join().unwrap().unwrap();
    }
}
