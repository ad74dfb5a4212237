use std::rc::Rc;

use crate::error::StorageError;
use crate::utils::constants::API_URL_STORAGE_KEY;
use crate::utils::storage::DurableStore;

/// URL del API: override guardado por el usuario, si no el valor compilado
pub struct EndpointSettings<S> {
    store: Rc<S>,
    default_url: String,
}

impl<S> Clone for EndpointSettings<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            default_url: self.default_url.clone(),
        }
    }
}

impl<S: DurableStore> EndpointSettings<S> {
    pub fn new(store: Rc<S>, default_url: impl Into<String>) -> Self {
        Self {
            store,
            default_url: default_url.into(),
        }
    }

    pub fn default_url(&self) -> &str {
        &self.default_url
    }

    /// Override guardado, si existe y no está vacío
    pub fn saved_override(&self) -> Option<String> {
        match self.store.get_item(API_URL_STORAGE_KEY) {
            Ok(value) => value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            Err(e) => {
                log::warn!("⚠️ No se pudo leer la URL guardada, usando la por defecto: {}", e);
                None
            }
        }
    }

    pub fn api_url(&self) -> String {
        self.saved_override()
            .unwrap_or_else(|| self.default_url.clone())
    }

    /// Guarda un override; un valor vacío lo elimina
    pub fn set_api_url(&self, url: &str) -> Result<(), StorageError> {
        let url = url.trim();
        if url.is_empty() {
            return self.clear_api_url();
        }
        self.store.set_item(API_URL_STORAGE_KEY, url)?;
        log::info!("🔧 URL del API actualizada: {}", url);
        Ok(())
    }

    pub fn clear_api_url(&self) -> Result<(), StorageError> {
        self.store.remove_item(API_URL_STORAGE_KEY)?;
        log::info!("🔧 URL del API restablecida a la por defecto");
        Ok(())
    }
}
