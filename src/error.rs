// ============================================================================
// ERRORES - Taxonomía de fallos del núcleo offline
// ============================================================================
// Storage: fatal para la operación local, nunca se reintenta
// Remote: recuperable, se convierte en cola/offline en el borde del servicio
// Cache: fatal para install/activate, la versión anterior sigue activa
// ============================================================================

use thiserror::Error;

use crate::models::cache::CacheLifecycle;

/// Fallo del almacenamiento local durable (localStorage o equivalente)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("almacenamiento local no disponible: {0}")]
    Unavailable(String),

    #[error("error leyendo '{key}': {reason}")]
    Read { key: String, reason: String },

    #[error("error guardando '{key}': {reason}")]
    Write { key: String, reason: String },

    #[error("datos corruptos en '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("error serializando: {0}")]
    Serialize(String),
}

/// Fallo al hablar con el servicio remoto de inventario
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("error de red: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("respuesta inválida: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("no se pudo descargar '{url}': {reason}")]
    Fetch { url: String, reason: String },

    #[error("no se pudo guardar '{url}' en '{cache}': {reason}")]
    Store { cache: String, url: String, reason: String },

    #[error("cache storage: {0}")]
    Backend(String),

    #[error("transición inválida desde {from:?} hacia {to}")]
    InvalidTransition { from: CacheLifecycle, to: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("la cantidad debe ser al menos 1")]
    InvalidQuantity,

    #[error("stock insuficiente: se piden {requested}, hay {available}")]
    InsufficientStock { requested: u32, available: i64 },

    #[error("la acción {0} no se puede agregar a la lista")]
    UnsupportedAction(&'static str),

    #[error("no existe el ítem {0} en la lista")]
    IndexOutOfRange(usize),
}

/// Error agregado para el borde JS
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Cart(#[from] CartError),
}
