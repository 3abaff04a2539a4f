//! # Almacén de Resultados de Jobs
//! src/jobs/store.rs
//!
//! Mapa thread-safe `id -> digest codificado`.
//!
//! Cuando una petición se acepta, se agrega al mapa con un digest vacío:
//! eso indica que el ID es válido aunque todavía no se haya procesado.
//! Más tarde el worker que procesa el job sobrescribe la entrada con el
//! digest. Las entradas nunca se eliminan durante la vida del proceso.

use crate::jobs::job::JobId;
use log::{debug, log_enabled, trace, Level};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Una entrada del almacén
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub id: JobId,

    /// Digest codificado; vacío mientras el job está pendiente
    pub encoded_digest: String,
}

impl JobResult {
    /// Verifica si el digest ya fue calculado
    pub fn is_ready(&self) -> bool {
        !self.encoded_digest.is_empty()
    }
}

/// Almacén de resultados (muchos lectores, escritores en claves distintas)
#[derive(Debug, Default)]
pub struct JobStore {
    entries: RwLock<HashMap<JobId, String>>,
}

impl JobStore {
    /// Crea un almacén vacío
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserta o sobrescribe la entrada de `id`
    pub fn add(&self, id: JobId, encoded_digest: String) {
        self.entries.write().insert(id, encoded_digest);
    }

    /// Obtiene el valor de `id`
    ///
    /// - `None`: el ID nunca fue emitido
    /// - `Some("")`: aceptado pero pendiente
    /// - `Some(digest)`: listo
    pub fn get(&self, id: JobId) -> Option<String> {
        self.entries.read().get(&id).cloned()
    }

    /// Elimina una entrada (solo para deshacer un envío rechazado)
    pub(crate) fn remove(&self, id: JobId) -> Option<String> {
        self.entries.write().remove(&id)
    }

    /// Número de entradas
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Verifica si el almacén está vacío
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Número de jobs aceptados que aún no tienen digest
    pub fn pending_count(&self) -> usize {
        self.entries.read().values().filter(|d| d.is_empty()).count()
    }

    /// Copia consistente de todas las entradas, ordenadas por ID
    pub fn snapshot(&self) -> Vec<JobResult> {
        let mut results: Vec<JobResult> = self
            .entries
            .read()
            .iter()
            .map(|(id, digest)| JobResult {
                id: *id,
                encoded_digest: digest.clone(),
            })
            .collect();
        results.sort_unstable_by_key(|r| r.id);
        results
    }

    /// Escribe el contenido del almacén al log (diagnóstico)
    pub fn dump(&self) {
        debug!("Number of requests in store = {}", self.len());

        if log_enabled!(Level::Trace) {
            for result in self.snapshot() {
                if result.is_ready() {
                    trace!("{} => {}", result.id, result.encoded_digest);
                } else {
                    trace!("{} => (pending)", result.id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    // ==================== Basic Operations ====================

    #[test]
    fn test_store_add_and_get() {
        let store = JobStore::new();
        store.add(1, "digest".to_string());

        assert_eq!(store.get(1), Some("digest".to_string()));
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store = JobStore::new();
        assert_eq!(store.get(42), None);
    }

    #[test]
    fn test_pending_and_ready_are_distinct() {
        let store = JobStore::new();
        store.add(1, String::new());

        // Encontrado pero vacío = pendiente, distinto de no encontrado
        assert_eq!(store.get(1), Some(String::new()));
        assert_eq!(store.get(2), None);
    }

    #[test]
    fn test_store_overwrite_pending_with_digest() {
        let store = JobStore::new();
        store.add(1, String::new());
        assert_eq!(store.pending_count(), 1);

        store.add(1, "abc".to_string());
        assert_eq!(store.get(1), Some("abc".to_string()));
        assert_eq!(store.pending_count(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_remove() {
        let store = JobStore::new();
        store.add(5, String::new());

        assert_eq!(store.remove(5), Some(String::new()));
        assert!(store.is_empty());
        assert_eq!(store.remove(5), None);
    }

    // ==================== Snapshot ====================

    #[test]
    fn test_snapshot_sorted() {
        let store = JobStore::new();
        store.add(3, "c".to_string());
        store.add(1, "a".to_string());
        store.add(2, String::new());

        let snapshot = store.snapshot();
        let ids: Vec<_> = snapshot.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(snapshot[0].is_ready());
        assert!(!snapshot[1].is_ready());
    }

    #[test]
    fn test_dump_does_not_panic() {
        let store = JobStore::new();
        store.add(1, "x".to_string());
        store.dump();
    }

    // ==================== Concurrency ====================

    #[test]
    fn test_concurrent_writers_distinct_keys() {
        let store = Arc::new(JobStore::new());
        let mut handles = Vec::new();

        for t in 0..8i64 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for i in 0..500i64 {
                    let id = t * 1000 + i + 1;
                    store.add(id, String::new());
                    store.add(id, format!("digest-{}", id));
                    assert!(store.get(id).is_some());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 4000);
        assert_eq!(store.pending_count(), 0);
        assert_eq!(store.get(1001), Some("digest-1001".to_string()));
    }
}
