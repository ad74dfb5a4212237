// ============================================================================
// API CLIENT - SOLO COMUNICACIÓN HTTP con el servicio de inventario
// ============================================================================
// Un solo endpoint: GET lista productos, POST aplica una transacción.
// No tiene lógica de cola: los errores se devuelven tal cual (RemoteError).
// ============================================================================

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::{Payload, Product, RemoteReply};
use crate::services::endpoint_service::EndpointSettings;
use crate::utils::storage::DurableStore;

/// Respuesta HTTP cruda
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transporte HTTP. Sin timeout propio: se usa el del runtime.
/// `?Send`: en wasm los futures viven en un solo hilo.
#[async_trait(?Send)]
pub trait HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpReply, RemoteError>;
    async fn post(&self, url: &str, body: String) -> Result<HttpReply, RemoteError>;
}

/// Respuesta de un POST con HTTP exitoso.
/// `reply` es `None` si el cuerpo no era el JSON esperado.
#[derive(Clone, Debug, PartialEq)]
pub struct PostReply {
    pub reply: Option<RemoteReply>,
}

pub struct ApiClient<T, S> {
    transport: T,
    settings: EndpointSettings<S>,
}

impl<T: HttpTransport, S: DurableStore> ApiClient<T, S> {
    pub fn new(transport: T, settings: EndpointSettings<S>) -> Self {
        Self { transport, settings }
    }

    pub fn settings(&self) -> &EndpointSettings<S> {
        &self.settings
    }

    /// Endpoint efectivo, se resuelve en cada request
    pub fn endpoint(&self) -> String {
        self.settings.api_url()
    }

    /// GET: lista completa de productos
    pub async fn list_products(&self) -> Result<Vec<Product>, RemoteError> {
        let url = self.endpoint();
        let response = self.transport.get(&url).await?;

        if !response.ok() {
            return Err(RemoteError::Status {
                status: response.status,
                body: response.body,
            });
        }

        serde_json::from_str::<Vec<Product>>(&response.body)
            .map_err(|e| RemoteError::Malformed(e.to_string()))
    }

    /// POST de una transacción. HTTP no exitoso es error; el cuerpo se lee tolerante.
    pub async fn send_transaction(&self, payload: &Payload) -> Result<PostReply, RemoteError> {
        let url = self.endpoint();
        let body = serde_json::to_string(payload)
            .map_err(|e| RemoteError::Malformed(format!("payload: {}", e)))?;

        let response = self.transport.post(&url, body).await?;

        if !response.ok() {
            return Err(RemoteError::Status {
                status: response.status,
                body: response.body,
            });
        }

        let reply = match serde_json::from_str::<RemoteReply>(&response.body) {
            Ok(reply) => Some(reply),
            Err(e) => {
                log::warn!("⚠️ Respuesta del POST sin JSON válido: {}", e);
                None
            }
        };

        Ok(PostReply { reply })
    }

    /// Busca un producto por id (comparado como string)
    pub async fn fetch_product(&self, id: &str) -> Result<Option<Product>, RemoteError> {
        let id = id.trim();
        let products = self.list_products().await?;
        Ok(products.into_iter().find(|p| p.id == id))
    }
}

// ============================================================================
// TRANSPORTE DEL NAVEGADOR (gloo-net)
// ============================================================================

#[cfg(target_arch = "wasm32")]
pub use web::GlooTransport;

#[cfg(target_arch = "wasm32")]
mod web {
    use async_trait::async_trait;
    use gloo_net::http::Request;

    use super::{HttpReply, HttpTransport};
    use crate::error::RemoteError;

    #[derive(Clone, Copy, Debug, Default)]
    pub struct GlooTransport;

    async fn into_reply(response: gloo_net::http::Response) -> Result<HttpReply, RemoteError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Malformed(format!("cuerpo ilegible: {}", e)))?;
        Ok(HttpReply { status, body })
    }

    #[async_trait(?Send)]
    impl HttpTransport for GlooTransport {
        async fn get(&self, url: &str) -> Result<HttpReply, RemoteError> {
            let response = Request::get(url)
                .send()
                .await
                .map_err(|e| RemoteError::Network(e.to_string()))?;
            into_reply(response).await
        }

        async fn post(&self, url: &str, body: String) -> Result<HttpReply, RemoteError> {
            // Sin Content-Type JSON: Apps Script no responde al preflight CORS
            let response = Request::post(url)
                .body(body)
                .map_err(|e| RemoteError::Network(format!("Request build error: {}", e)))?
                .send()
                .await
                .map_err(|e| RemoteError::Network(e.to_string()))?;
            into_reply(response).await
        }
    }
}
