// ============================================================================
// BODEGA OFFLINE - cola de transacciones + sync + caché del shell
// ============================================================================
// - models: estructuras compartidas con el servicio (hoja de cálculo)
// - services: cola persistente, cliente HTTP, sync loop, caché de recursos
// - state: estado observable con Rc<RefCell>
// - viewmodels: lista de movimientos
// - app / bindings / sw: solo en wasm32, cableado con el navegador
// ============================================================================

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
pub mod viewmodels;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
pub mod bindings;
#[cfg(target_arch = "wasm32")]
pub mod sw;

#[cfg(test)]
mod testing;

pub use config::{AppConfig, BackoffPolicy, RetryPolicy};
pub use error::{AppError, CacheError, CartError, RemoteError, StorageError};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    if config::CONFIG.is_logging_enabled() {
        wasm_logger::init(wasm_logger::Config::default());
    }

    // En el service worker no hay window: solo se usan las funciones sw_*
    if web_sys::window().is_none() {
        log::info!("🧰 Bodega offline cargado en el service worker");
        return Ok(());
    }

    log::info!(
        "🚀 Bodega offline ({}) - {}",
        config::CONFIG.environment,
        config::CONFIG.default_api_url
    );
    app::install(app::App::start()?);
    Ok(())
}
