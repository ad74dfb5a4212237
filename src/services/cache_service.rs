// ============================================================================
// CACHÉ DE RECURSOS DEL SHELL (service worker)
// ============================================================================
// install: descarga todo el manifiesto, todo o nada
// activate: borra toda versión distinta de la actual y toma los clientes
// fetch: cache-first sobre la versión actual, si no red sin guardar
// Los datos (productos, transacciones) nunca pasan por esta caché.
// ============================================================================

use std::cell::Cell;

use async_trait::async_trait;

use crate::error::CacheError;
use crate::models::{ActivationReport, AssetRequest, CacheLifecycle, CacheManifest, CachedResponse, ServedResponse};

/// Almacén de cachés versionadas (CacheStorage en el navegador)
#[async_trait(?Send)]
pub trait CacheBackend {
    async fn cache_names(&self) -> Result<Vec<String>, CacheError>;
    async fn put(&self, cache: &str, url: &str, response: &CachedResponse) -> Result<(), CacheError>;
    async fn lookup(&self, cache: &str, url: &str) -> Result<Option<CachedResponse>, CacheError>;
    async fn delete_cache(&self, cache: &str) -> Result<bool, CacheError>;
    /// Tomar control de los clientes abiertos sin esperar navegación
    async fn claim_clients(&self) -> Result<(), CacheError>;
}

#[async_trait(?Send)]
pub trait AssetFetcher {
    async fn fetch(&self, url: &str) -> Result<CachedResponse, CacheError>;
}

const STAGING_SUFFIX: &str = ":staging";

pub struct AssetCacheManager<B, F> {
    backend: B,
    fetcher: F,
    manifest: CacheManifest,
    lifecycle: Cell<CacheLifecycle>,
}

impl<B: CacheBackend, F: AssetFetcher> AssetCacheManager<B, F> {
    pub fn new(backend: B, fetcher: F, manifest: CacheManifest) -> Self {
        Self {
            backend,
            fetcher,
            manifest,
            lifecycle: Cell::new(CacheLifecycle::Installing),
        }
    }

    /// Retoma una versión en un estado conocido (el worker puede reiniciarse entre eventos)
    pub fn with_lifecycle(self, lifecycle: CacheLifecycle) -> Self {
        self.lifecycle.set(lifecycle);
        self
    }

    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    pub fn manifest(&self) -> &CacheManifest {
        &self.manifest
    }

    pub fn lifecycle(&self) -> CacheLifecycle {
        self.lifecycle.get()
    }

    /// Marca la versión como reemplazada (la activó un worker más nuevo)
    pub fn supersede(&self) {
        self.lifecycle.set(CacheLifecycle::Superseded);
    }

    /// Descarga y guarda cada recurso. Si uno falla la instalación entera falla
    /// y la versión nueva no queda en el almacén. Si la versión ya existe
    /// (reinstalación sin cambio de versión) se escribe primero en una caché
    /// temporal y la existente solo se toca cuando la temporal quedó completa.
    pub async fn install(&self) -> Result<(), CacheError> {
        self.lifecycle.set(CacheLifecycle::Installing);
        let version = self.manifest.version.clone();
        log::info!("📦 Instalando caché {} ({} recursos)", version, self.manifest.assets.len());

        // Primero todo a memoria: nada se escribe si falta un recurso
        let mut fetched = Vec::with_capacity(self.manifest.assets.len());
        for url in &self.manifest.assets {
            match self.fetch_ok(url).await {
                Ok(response) => fetched.push((url.as_str(), response)),
                Err(e) => return self.fail_install(e, None).await,
            }
        }

        let existing = match self.backend.cache_names().await {
            Ok(names) => names.contains(&version),
            Err(e) => return self.fail_install(e, None).await,
        };
        let target = if existing {
            format!("{}{}", version, STAGING_SUFFIX)
        } else {
            version.clone()
        };

        for (url, response) in &fetched {
            if let Err(e) = self.backend.put(&target, url, response).await {
                return self.fail_install(e, Some(&target)).await;
            }
        }

        if existing {
            // Cada put reemplaza una entrada: la versión en uso nunca queda sin recursos
            for (url, response) in &fetched {
                if let Err(e) = self.backend.put(&version, url, response).await {
                    return self.fail_install(e, Some(&target)).await;
                }
            }
            if let Err(e) = self.backend.delete_cache(&target).await {
                log::warn!("⚠️ No se pudo borrar la caché temporal {}: {}", target, e);
            }
        }

        self.lifecycle.set(CacheLifecycle::Installed);
        log::info!("✅ Caché {} instalada", version);
        Ok(())
    }

    async fn fetch_ok(&self, url: &str) -> Result<CachedResponse, CacheError> {
        let response = self.fetcher.fetch(url).await?;
        if !response.is_ok() {
            return Err(CacheError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status),
            });
        }
        Ok(response)
    }

    /// `partial`: caché a medio escribir que hay que borrar (nunca la versión en uso)
    async fn fail_install(&self, error: CacheError, partial: Option<&str>) -> Result<(), CacheError> {
        log::error!("❌ Instalación de {} abortada: {}", self.manifest.version, error);
        if let Some(partial) = partial {
            if let Err(e) = self.backend.delete_cache(partial).await {
                log::error!("❌ No se pudo limpiar la caché a medio escribir: {}", e);
            }
        }
        self.lifecycle.set(CacheLifecycle::Failed);
        Err(error)
    }

    /// Borra toda versión distinta de la actual y reclama los clientes
    pub async fn activate(&self) -> Result<ActivationReport, CacheError> {
        match self.lifecycle.get() {
            CacheLifecycle::Installed | CacheLifecycle::Active => {}
            from => return Err(CacheError::InvalidTransition { from, to: "active" }),
        }

        let mut report = ActivationReport::default();
        for name in self.backend.cache_names().await? {
            if name != self.manifest.version {
                if self.backend.delete_cache(&name).await? {
                    log::info!("🗑️ Caché antigua eliminada: {}", name);
                }
                report.purged.push(name);
            }
        }

        self.backend.claim_clients().await?;
        self.lifecycle.set(CacheLifecycle::Active);
        log::info!("🚀 Caché {} activa", self.manifest.version);
        Ok(report)
    }

    /// Respuesta guardada bajo la versión actual, si existe
    pub async fn lookup(&self, url: &str) -> Option<CachedResponse> {
        match self.backend.lookup(&self.manifest.version, url).await {
            Ok(hit) => hit,
            Err(e) => {
                log::warn!("⚠️ Error leyendo caché para {}: {}", url, e);
                None
            }
        }
    }

    /// Cache-first. Lo que no está se pide a la red y no se guarda.
    pub async fn respond(&self, request: &AssetRequest) -> Result<ServedResponse, CacheError> {
        if request.is_get() {
            if let Some(hit) = self.lookup(&request.url).await {
                return Ok(ServedResponse::Cache(hit));
            }
        }
        let response = self.fetcher.fetch(&request.url).await?;
        Ok(ServedResponse::Network(response))
    }
}
