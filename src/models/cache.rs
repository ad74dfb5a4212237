use serde::{Deserialize, Serialize};

use crate::utils::constants::DEFAULT_CACHE_VERSION;

/// Ciclo de vida de una versión de caché
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheLifecycle {
    Installing,
    /// Instalada, esperando activación
    Installed,
    Active,
    /// Reemplazada por una versión más nueva
    Superseded,
    /// Instalación abortada; nunca se promueve
    Failed,
}

/// Lista fija de recursos del shell + versión que la etiqueta.
/// Cambiar la lista implica subir la versión.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheManifest {
    pub version: String,
    pub assets: Vec<String>,
}

impl CacheManifest {
    pub fn new(version: impl Into<String>, assets: Vec<String>) -> Self {
        Self {
            version: version.into(),
            assets,
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.assets.iter().any(|a| a == url)
    }

    /// Recursos del shell de la app bajo `version` (ver `AppConfig::cache_version`)
    pub fn shell(version: impl Into<String>) -> Self {
        let assets = [
            "./",
            "./index.html",
            "./style.css",
            "./app.js",
            "./Q.png",
            "https://unpkg.com/html5-qrcode",
            "https://cdnjs.cloudflare.com/ajax/libs/qrcodejs/1.0.0/qrcode.min.js",
            "https://fonts.googleapis.com/css2?family=Outfit:wght@400;500;600;700&display=swap",
        ];
        Self::new(version, assets.iter().map(|a| a.to_string()).collect())
    }
}

impl Default for CacheManifest {
    fn default() -> Self {
        Self::shell(DEFAULT_CACHE_VERSION)
    }
}

/// Respuesta guardada byte a byte
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Petición interceptada
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetRequest {
    pub method: String,
    pub url: String,
}

impl AssetRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
        }
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// De dónde salió la respuesta servida
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServedResponse {
    Cache(CachedResponse),
    Network(CachedResponse),
}

impl ServedResponse {
    pub fn response(&self) -> &CachedResponse {
        match self {
            ServedResponse::Cache(r) | ServedResponse::Network(r) => r,
        }
    }

    pub fn from_cache(&self) -> bool {
        matches!(self, ServedResponse::Cache(_))
    }
}

/// Resultado de activar una versión
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivationReport {
    pub purged: Vec<String>,
}
