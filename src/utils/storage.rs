// ============================================================================
// ALMACENAMIENTO DURABLE - clave/valor que sobrevive recargas de página
// ============================================================================

use serde::{de::DeserializeOwned, Serialize};

use crate::error::StorageError;

/// Almacén clave/valor durable (localStorage en el navegador)
///
/// Las operaciones son síncronas: localStorage no suspende.
pub trait DurableStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

pub fn save_to_storage<S, T>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    S: DurableStore + ?Sized,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value)
        .map_err(|e| StorageError::Serialize(e.to_string()))?;
    store.set_item(key, &json)
}

/// Carga y deserializa; `Ok(None)` si la clave no existe.
/// Un JSON inválido es `StorageError::Corrupt`, no se descarta en silencio.
pub fn load_from_storage<S, T>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    S: DurableStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get_item(key)? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::LocalStorageStore;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{window, Storage};

    use super::DurableStore;
    use crate::error::StorageError;

    pub fn get_local_storage() -> Result<Storage, StorageError> {
        window()
            .ok_or_else(|| StorageError::Unavailable("sin window".to_string()))?
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage bloqueado".to_string()))
    }

    /// localStorage del navegador
    #[derive(Clone, Copy, Debug, Default)]
    pub struct LocalStorageStore;

    impl DurableStore for LocalStorageStore {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            get_local_storage()?
                .get_item(key)
                .map_err(|e| StorageError::Read {
                    key: key.to_string(),
                    reason: format!("{:?}", e),
                })
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            // QuotaExceededError también cae aquí
            get_local_storage()?
                .set_item(key, value)
                .map_err(|e| StorageError::Write {
                    key: key.to_string(),
                    reason: format!("{:?}", e),
                })
        }

        fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            get_local_storage()?
                .remove_item(key)
                .map_err(|e| StorageError::Write {
                    key: key.to_string(),
                    reason: format!("{:?}", e),
                })
        }
    }
}
