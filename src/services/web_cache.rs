// Adaptadores de CacheStorage y fetch para el service worker

use async_trait::async_trait;
use js_sys::{Array, ArrayBuffer, Object, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Cache, CacheStorage, Headers, Response, ResponseInit, ServiceWorkerGlobalScope};

use crate::error::CacheError;
use crate::models::CachedResponse;
use crate::services::cache_service::{AssetFetcher, CacheBackend};

fn js_error(e: JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}

fn backend_error(e: JsValue) -> CacheError {
    CacheError::Backend(js_error(e))
}

fn scope() -> Result<ServiceWorkerGlobalScope, CacheError> {
    js_sys::global()
        .dyn_into::<ServiceWorkerGlobalScope>()
        .map_err(|_| CacheError::Backend("no es un ServiceWorkerGlobalScope".to_string()))
}

/// Lee una Response del navegador completa a memoria
async fn read_response(response: Response) -> Result<CachedResponse, JsValue> {
    let content_type = response.headers().get("content-type")?;
    let buffer: ArrayBuffer = JsFuture::from(response.array_buffer()?).await?.dyn_into()?;
    let body = Uint8Array::new(&buffer).to_vec();
    Ok(CachedResponse {
        status: response.status(),
        content_type,
        body,
    })
}

pub fn to_web_response(cached: &CachedResponse) -> Result<Response, JsValue> {
    let init = ResponseInit::new();
    init.set_status(cached.status);
    let headers = Headers::new()?;
    if let Some(ct) = &cached.content_type {
        headers.set("content-type", ct)?;
    }
    init.set_headers(&headers);

    let bytes = Uint8Array::from(cached.body.as_slice());
    let body: &Object = &bytes;
    Response::new_with_opt_buffer_source_and_init(Some(body), &init)
}

pub struct WebCacheBackend {
    scope: ServiceWorkerGlobalScope,
}

impl WebCacheBackend {
    pub fn new() -> Result<Self, CacheError> {
        Ok(Self { scope: scope()? })
    }

    fn storage(&self) -> Result<CacheStorage, CacheError> {
        self.scope.caches().map_err(backend_error)
    }

    async fn open(&self, name: &str) -> Result<Cache, CacheError> {
        let cache = JsFuture::from(self.storage()?.open(name))
            .await
            .map_err(backend_error)?;
        cache.dyn_into::<Cache>().map_err(backend_error)
    }
}

#[async_trait(?Send)]
impl CacheBackend for WebCacheBackend {
    async fn cache_names(&self) -> Result<Vec<String>, CacheError> {
        let keys = JsFuture::from(self.storage()?.keys())
            .await
            .map_err(backend_error)?;
        Ok(Array::from(&keys)
            .iter()
            .filter_map(|k| k.as_string())
            .collect())
    }

    async fn put(&self, cache: &str, url: &str, response: &CachedResponse) -> Result<(), CacheError> {
        let store_error = |e: JsValue| CacheError::Store {
            cache: cache.to_string(),
            url: url.to_string(),
            reason: js_error(e),
        };
        let web_response = to_web_response(response).map_err(store_error)?;
        let opened = self.open(cache).await?;
        JsFuture::from(opened.put_with_str(url, &web_response))
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn lookup(&self, cache: &str, url: &str) -> Result<Option<CachedResponse>, CacheError> {
        let opened = self.open(cache).await?;
        let hit = JsFuture::from(opened.match_with_str(url))
            .await
            .map_err(backend_error)?;
        if hit.is_undefined() || hit.is_null() {
            return Ok(None);
        }
        let response = hit.dyn_into::<Response>().map_err(backend_error)?;
        read_response(response).await.map(Some).map_err(backend_error)
    }

    async fn delete_cache(&self, cache: &str) -> Result<bool, CacheError> {
        let deleted = JsFuture::from(self.storage()?.delete(cache))
            .await
            .map_err(backend_error)?;
        Ok(deleted.as_bool().unwrap_or(false))
    }

    async fn claim_clients(&self) -> Result<(), CacheError> {
        JsFuture::from(self.scope.clients().claim())
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}

/// fetch() del worker
pub struct FetchAssetFetcher {
    scope: ServiceWorkerGlobalScope,
}

impl FetchAssetFetcher {
    pub fn new() -> Result<Self, CacheError> {
        Ok(Self { scope: scope()? })
    }
}

#[async_trait(?Send)]
impl AssetFetcher for FetchAssetFetcher {
    async fn fetch(&self, url: &str) -> Result<CachedResponse, CacheError> {
        let fetch_error = |e: JsValue| CacheError::Fetch {
            url: url.to_string(),
            reason: js_error(e),
        };
        let response = JsFuture::from(self.scope.fetch_with_str(url))
            .await
            .map_err(fetch_error)?
            .dyn_into::<Response>()
            .map_err(fetch_error)?;
        read_response(response).await.map_err(fetch_error)
    }
}
