//! # Contexto compartido de los handlers
//! src/server/context.rs
//!
//! `ServerContext` es lo que cada handler recibe junto con el request: el
//! dispatcher de jobs y la señal de apagado del servidor.

use crate::jobs::Dispatcher;
use log::{debug, warn};
use parking_lot::Mutex;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Tiempo máximo para la conexión que despierta al listener
const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Estado compartido por todas las conexiones
#[derive(Clone)]
pub struct ServerContext {
    pub dispatcher: Arc<Dispatcher>,
    pub shutdown: ShutdownSignal,
}

impl ServerContext {
    pub fn new(dispatcher: Arc<Dispatcher>, shutdown: ShutdownSignal) -> Self {
        Self {
            dispatcher,
            shutdown,
        }
    }
}

struct SignalInner {
    requested: AtomicBool,

    /// Dirección del listener a despertar
    wake_addr: Mutex<Option<SocketAddr>>,
}

/// Señal de apagado del servidor
///
/// `request` marca el apagado y abre una conexión local contra el listener
/// para sacar al loop de `accept` de su bloqueo. Clonarla comparte la
/// misma señal.
#[derive(Clone)]
pub struct ShutdownSignal {
    inner: Arc<SignalInner>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                requested: AtomicBool::new(false),
                wake_addr: Mutex::new(None),
            }),
        }
    }

    /// Registra la dirección del listener que debe despertarse
    pub fn arm(&self, addr: SocketAddr) {
        *self.inner.wake_addr.lock() = Some(addr);
    }

    /// Solicita el apagado. Retorna `true` solo la primera vez.
    pub fn request(&self) -> bool {
        if self.inner.requested.swap(true, Ordering::SeqCst) {
            debug!("Shutdown already requested");
            return false;
        }

        let addr = *self.inner.wake_addr.lock();
        if let Some(addr) = addr {
            wake_listener(addr);
        }

        true
    }

    /// Verifica si ya se solicitó el apagado
    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Conecta al listener para desbloquear `accept`
fn wake_listener(mut addr: SocketAddr) {
    // 0.0.0.0 / :: no son destinos válidos; usar loopback
    if addr.ip().is_unspecified() {
        let loopback = match addr.ip() {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
        };
        addr.set_ip(loopback);
    }

    if let Err(e) = TcpStream::connect_timeout(&addr, WAKE_TIMEOUT) {
        warn!("Failed to wake listener at {}: {}", addr, e);
    }
}
