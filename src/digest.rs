//! # Digest de Contraseñas
//! src/digest.rs
//!
//! Función pura que transforma un secreto en su hash codificado:
//! SHA-512 sobre los bytes UTF-8 y luego base64 con el alfabeto URL-safe
//! (con padding). El resultado siempre mide 88 caracteres.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use sha2::{Digest, Sha512};

/// Longitud del digest codificado (64 bytes en base64 con padding)
pub const ENCODED_DIGEST_LEN: usize = 88;

/// Calcula el digest codificado de un secreto
///
/// # Ejemplo
/// ```
/// use hash_server::digest::encode_secret;
///
/// let digest = encode_secret("angryMonkey");
/// assert_eq!(digest.len(), 88);
/// ```
pub fn encode_secret(secret: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(secret.as_bytes());
    URL_SAFE.encode(hasher.finalize())
}
