//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser HTTP/1.0 escrito desde cero.
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! POST /hash HTTP/1.0\r\n
//! Content-Type: application/x-www-form-urlencoded\r\n
//! Content-Length: 20\r\n
//! \r\n
//! password=angryMonkey
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path HTTP/1.0` (el path se decodifica con `%XX`;
//!    la query string se descarta)
//! 2. **Headers**: Pares `Name: Value` (uno por línea)
//! 3. **Empty Line**: `\r\n` que separa headers del body
//! 4. **Body**: bytes crudos; los formularios se decodifican bajo demanda

use std::collections::HashMap;

/// Content-Type de los formularios HTML
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Métodos HTTP
///
/// Los endpoints solo distinguen `GET` y `POST`; cualquier otro token válido
/// queda en `Other` para que el handler responda 405 (o lo acepte, como
/// `/shutdown`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    GET,
    POST,
    Other(String),
}

impl Method {
    /// Parsea un método HTTP desde un string
    ///
    /// El token debe ser letras ASCII en mayúsculas.
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            _ if !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase()) => {
                Ok(Method::Other(s.to_string()))
            }
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::Other(token) => token.as_str(),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Representa un request HTTP/1.0 parseado
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP
    method: Method,

    /// Path de la petición (ej: "/hash/1")
    path: String,

    /// Headers HTTP, con el nombre en minúsculas
    headers: HashMap<String, String>,

    /// Body crudo del request
    body: Vec<u8>,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Request incompleto o truncado
    #[error("Incomplete HTTP request")]
    IncompleteRequest,

    /// Formato inválido de la request line
    #[error("Invalid request line format")]
    InvalidRequestLine,

    /// Token de método inválido
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Versión HTTP incorrecta
    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    /// Path con escapes `%` inválidos o que no decodifica a UTF-8
    #[error("Invalid request path: {0}")]
    InvalidPath(String),

    /// Header malformado
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Body que no se puede decodificar como formulario
    #[error("Invalid request body")]
    InvalidBody,

    /// Request vacío
    #[error("Empty request")]
    EmptyRequest,
}

impl Request {
    /// Parsea un request HTTP/1.0 desde bytes
    ///
    /// El head (request line + headers) debe ser UTF-8 válido; el body se
    /// conserva como bytes crudos.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use hash_server::http::Request;
    ///
    /// let raw = b"GET /hash/%34%32?verbose=1 HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/hash/42");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ParseError::EmptyRequest);
        }

        // Separar head y body en el primer \r\n\r\n
        let (head, body) = match find_subsequence(buffer, b"\r\n\r\n") {
            Some(pos) => (&buffer[..pos], &buffer[pos + 4..]),
            None => (buffer, &[][..]),
        };

        let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidRequestLine)?;

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ParseError::IncompleteRequest)?;

        // 1. Request line
        let (method, path) = Self::parse_request_line(request_line)?;

        // 2. Headers
        let headers = Self::parse_headers(lines)?;

        Ok(Request {
            method,
            path,
            headers,
            body: body.to_vec(),
        })
    }

    /// Parsea la request line: `GET /path?query HTTP/1.0`
    fn parse_request_line(line: &str) -> Result<(Method, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        // Debe tener exactamente 3 partes: METHOD PATH VERSION
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_str(parts[0])?;

        let version = parts[2];
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version.to_string()));
        }

        // `+` es literal en el path; solo `%XX` se decodifica
        let raw_path = parts[1].split('?').next().unwrap_or("");
        let path = percent_decode(raw_path, false)
            .ok_or_else(|| ParseError::InvalidPath(raw_path.to_string()))?;

        Ok((method, path))
    }

    /// Parsea los headers HTTP hasta la línea vacía
    fn parse_headers<'a>(
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.trim().is_empty() {
                break;
            }

            match line.split_once(':') {
                Some((name, value)) => {
                    headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                }
                None => return Err(ParseError::InvalidHeader(line.to_string())),
            }
        }

        Ok(headers)
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Obtiene el path del request
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene un header sin distinguir mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// Obtiene el body del request
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decodifica el body como formulario `application/x-www-form-urlencoded`
    ///
    /// Sin `Content-Type` el body también se trata como formulario. Con otro
    /// Content-Type el resultado es un mapa vacío.
    ///
    /// # Errores
    ///
    /// `ParseError::InvalidBody` si el body no es UTF-8 o contiene escapes
    /// `%` inválidos.
    ///
    /// # Ejemplo
    /// ```
    /// use hash_server::http::Request;
    ///
    /// let raw = b"POST /hash HTTP/1.0\r\nContent-Length: 21\r\n\r\npassword=angry+Monkey";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.form_param("password").unwrap().as_deref(), Some("angry Monkey"));
    /// ```
    pub fn form_params(&self) -> Result<HashMap<String, String>, ParseError> {
        if let Some(content_type) = self.header("Content-Type") {
            let media_type = content_type.split(';').next().unwrap_or("").trim();
            if !media_type.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
                return Ok(HashMap::new());
            }
        }

        let body = std::str::from_utf8(&self.body).map_err(|_| ParseError::InvalidBody)?;
        parse_urlencoded(body)
    }

    /// Obtiene un campo del formulario del body
    pub fn form_param(&self, name: &str) -> Result<Option<String>, ParseError> {
        Ok(self.form_params()?.remove(name))
    }
}

/// Busca `needle` dentro de `haystack`
pub(crate) fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Parsea `k1=v1&k2=v2`, decodificando claves y valores
///
/// Si una clave se repite gana la primera aparición.
fn parse_urlencoded(input: &str) -> Result<HashMap<String, String>, ParseError> {
    let mut params = HashMap::new();

    for pair in input.split('&') {
        if pair.is_empty() {
            continue;
        }

        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = percent_decode(key, true).ok_or(ParseError::InvalidBody)?;
        let value = percent_decode(value, true).ok_or(ParseError::InvalidBody)?;

        params.entry(key).or_insert(value);
    }

    Ok(params)
}

/// Decodifica las secuencias `%XX` (y `+` como espacio si `plus_as_space`)
///
/// Retorna `None` ante un escape inválido o si el resultado no es UTF-8.
fn percent_decode(s: &str, plus_as_space: bool) -> Option<String> {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' if plus_as_space => {
                decoded.push(b' ');
                i += 1;
            }
            b'%' => {
                let hi = bytes.get(i + 1).and_then(|b| hex_value(*b));
                let lo = bytes.get(i + 2).and_then(|b| hex_value(*b));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => decoded.push(hi << 4 | lo),
                    _ => return None,
                }
                i += 3;
            }
            b => {
                decoded.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(decoded).ok()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
