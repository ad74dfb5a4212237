// ============================================================================
// SERVICE WORKER - shell offline
// ============================================================================
// El sw.js delega aquí:
//   install  -> event.waitUntil(sw_install())
//   activate -> event.waitUntil(sw_activate())
//   fetch    -> sw_match(url, method) y si resuelve undefined, fetch(request)
// Cada evento arma su propio manager: el navegador puede matar el worker
// entre eventos y no queda estado en memoria.
// ============================================================================

use wasm_bindgen::prelude::*;

use crate::config::CONFIG;
use crate::error::{AppError, CacheError};
use crate::models::{AssetRequest, CacheLifecycle, CacheManifest};
use crate::services::{AssetCacheManager, FetchAssetFetcher, WebCacheBackend};
use crate::services::web_cache::to_web_response;

type WorkerCache = AssetCacheManager<WebCacheBackend, FetchAssetFetcher>;

fn manifest() -> CacheManifest {
    CacheManifest::shell(CONFIG.cache_version.as_str())
}

fn manager(lifecycle: CacheLifecycle) -> Result<WorkerCache, JsValue> {
    let cache = || -> Result<WorkerCache, CacheError> {
        Ok(AssetCacheManager::new(WebCacheBackend::new()?, FetchAssetFetcher::new()?, manifest()))
    };
    Ok(cache().map_err(AppError::from)?.with_lifecycle(lifecycle))
}

#[wasm_bindgen]
pub async fn sw_install() -> Result<(), JsValue> {
    let cache = manager(CacheLifecycle::Installing)?;
    cache.install().await.map_err(AppError::from)?;
    Ok(())
}

/// Devuelve los nombres de caché eliminados
#[wasm_bindgen]
pub async fn sw_activate() -> Result<JsValue, JsValue> {
    let cache = manager(CacheLifecycle::Installed)?;
    let report = cache.activate().await.map_err(AppError::from)?;
    Ok(serde_wasm_bindgen::to_value(&report.purged)?)
}

/// Response guardada para la petición, o `undefined` para que JS vaya a la red.
/// Solo GET se sirve desde la caché.
#[wasm_bindgen]
pub async fn sw_match(url: String, method: String) -> Result<JsValue, JsValue> {
    let request = AssetRequest { method, url };
    if !request.is_get() {
        return Ok(JsValue::UNDEFINED);
    }
    let cache = manager(CacheLifecycle::Active)?;
    match cache.lookup(&request.url).await {
        Some(hit) => Ok(to_web_response(&hit)?.into()),
        None => Ok(JsValue::UNDEFINED),
    }
}

#[wasm_bindgen]
pub fn sw_cache_version() -> String {
    CONFIG.cache_version.clone()
}
