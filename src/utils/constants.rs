/// Clave del arreglo serializado de transacciones pendientes
pub const PENDING_TXS_KEY: &str = "pending_txs";

/// Clave de la URL del API guardada por el usuario
pub const API_URL_STORAGE_KEY: &str = "cermaq_inventory_url";

/// Endpoint de Apps Script compilado por defecto
/// Se puede sobreescribir en tiempo de compilación con BODEGA_API_URL
pub const DEFAULT_API_URL: &str = match option_env!("BODEGA_API_URL") {
    Some(url) => url,
    None => "https://script.google.com/macros/s/AKfycbzpgUkMhdDmLSaejzg_Faql7j-fpojIx0mx98w1sQzl9Wdbfjx1YRdVZij9VLnF5sCK/exec",
};

pub const DEFAULT_CACHE_VERSION: &str = "cermaq-bodega-v2";

pub const DEFAULT_SYNC_INTERVAL_SECS: u32 = 30;

/// Usuario de movimientos IN/OUT
pub const WEB_USER: &str = "WebUser";
/// Usuario de creación de productos
pub const WEB_ADMIN: &str = "WebAdmin";
/// Id que pide al servidor asignar uno automático
pub const AUTO_ID: &str = "AUTO";

/// Status que el servidor devuelve cuando aplicó la transacción
pub const REMOTE_STATUS_SUCCESS: &str = "success";

pub const SEARCH_MIN_CHARS: usize = 2;
pub const SEARCH_MAX_RESULTS: usize = 5;

/// Evento DOM con el estado de sincronización
pub const SYNC_STATUS_EVENT: &str = "bodega:sync-status";
