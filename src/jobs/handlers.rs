//! # Handlers HTTP para Jobs
//! src/jobs/handlers.rs
//!
//! Endpoints del servidor de hashing:
//! - `POST /hash` (form `password=...`) → ID del job
//! - `GET /hash/<id>` → digest codificado
//! - `GET /stats` → `{"total": N, "average": M}`
//! - `/shutdown` → apagado ordenado

use crate::http::{Method, Request, Response, StatusCode};
use crate::jobs::error::DispatchError;
use crate::server::ServerContext;
use log::{error, info, warn};

/// Nombre del campo del formulario con el secreto
pub const PASSWORD_FIELD: &str = "password";

/// Segundos sugeridos en `Retry-After` cuando el servidor se apaga
const RETRY_AFTER_SECS: &str = "5";

/// Convierte un error del dispatcher en la respuesta HTTP correspondiente
pub fn error_response(err: &DispatchError) -> Response {
    match err {
        DispatchError::InvalidInput => {
            Response::error(StatusCode::BadRequest, "Required form field not found")
        }
        DispatchError::InvalidId(_) => Response::error(StatusCode::BadRequest, "Invalid request ID"),
        DispatchError::NotFound(_) => Response::error(StatusCode::NotFound, "Request not found"),
        DispatchError::NotReady(_) => Response::error(StatusCode::NotFound, "Request not ready"),
        DispatchError::ShuttingDown => {
            Response::error(StatusCode::ServiceUnavailable, "Server is shutting down")
                .with_header("Retry-After", RETRY_AFTER_SECS)
        }
        DispatchError::Serialization(_) => {
            Response::error(StatusCode::InternalServerError, "JSON marshalling failed")
        }
        DispatchError::WorkerSpawn(_) => {
            Response::error(StatusCode::InternalServerError, "Internal server error")
        }
    }
}

/// Handler para `POST /hash`
///
/// Acepta el secreto y retorna el ID asignado seguido de un salto de línea.
/// Puede bloquear mientras la cola de entrada esté llena.
pub fn submit_handler(req: &Request, ctx: &ServerContext) -> Response {
    if req.method() != &Method::POST {
        return Response::error(StatusCode::MethodNotAllowed, "Only POST requests are allowed!")
            .with_header("Allow", "POST");
    }

    let secret = match req.form_param(PASSWORD_FIELD) {
        Ok(Some(secret)) if !secret.is_empty() => secret,
        Ok(_) => {
            return Response::error(StatusCode::BadRequest, "Required form field not found");
        }
        Err(e) => {
            warn!("Rejected /hash body: {}", e);
            return Response::error(StatusCode::BadRequest, "Invalid request body");
        }
    };

    match ctx.dispatcher.submit(&secret) {
        Ok(id) => Response::text(StatusCode::Ok, &format!("{}\n", id)),
        Err(e) => error_response(&e),
    }
}

/// Handler para `GET /hash/<id>`
///
/// - ID no numérico o `<= 0` → 400
/// - ID nunca emitido → 404 "Request not found"
/// - Job pendiente → 404 "Request not ready"
pub fn hash_handler(req: &Request, ctx: &ServerContext) -> Response {
    let raw_id = match req.path().strip_prefix("/hash/") {
        Some(rest) if !rest.contains('/') => rest,
        _ => return Response::error(StatusCode::NotFound, "404 page not found"),
    };

    let id = match raw_id.parse::<i64>() {
        Ok(id) => id,
        Err(_) => return Response::error(StatusCode::BadRequest, "Invalid request ID"),
    };

    match ctx.dispatcher.fetch(id) {
        Ok(digest) => Response::text(StatusCode::Ok, &format!("{}\n", digest)),
        Err(e) => error_response(&e),
    }
}

/// Handler para `GET /stats`
pub fn stats_handler(req: &Request, ctx: &ServerContext) -> Response {
    if req.method() != &Method::GET {
        return Response::error(StatusCode::MethodNotAllowed, "Only GET requests are allowed!")
            .with_header("Allow", "GET");
    }

    match ctx.dispatcher.stats_json() {
        Ok(json) => Response::json(&format!("{}\n", json)),
        Err(e) => {
            error!("Failed to encode stats: {}", e);
            error_response(&e)
        }
    }
}

/// Handler para `/shutdown` (cualquier método)
///
/// Solo marca el apagado; el loop del servidor deja de aceptar conexiones y
/// drena los jobs pendientes antes de terminar.
pub fn shutdown_handler(_req: &Request, ctx: &ServerContext) -> Response {
    if ctx.shutdown.request() {
        info!("Shutdown requested");
        Response::text(StatusCode::Ok, "Shutting down\n")
    } else {
        Response::text(StatusCode::Ok, "Shutdown already in progress\n")
    }
}
