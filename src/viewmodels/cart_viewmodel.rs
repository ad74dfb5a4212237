// ============================================================================
// CART VIEWMODEL - LISTA DE MOVIMIENTOS
// ============================================================================
// El usuario arma varias entradas/salidas y las procesa de una vez.
// Cada línea pasa por SyncService::submit en orden.
// Confirmadas y guardadas offline salen de la lista; las rechazadas quedan
// con su mensaje para reintentar o borrar.
// ============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CartError;
use crate::models::{Product, SubmitOutcome, TransactionAction, TransactionPayload};
use crate::services::api_client::HttpTransport;
use crate::services::sync_service::SyncService;
use crate::utils::storage::DurableStore;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub action: TransactionAction,
    pub quantity: u32,
    pub comment: Option<String>,
    pub price: Option<String>,
    pub added_at: DateTime<Utc>,
    /// Último error al procesar esta línea
    pub last_error: Option<String>,
}

impl CartItem {
    fn to_payload(&self) -> TransactionPayload {
        TransactionPayload::movement(self.action, self.id.clone(), self.quantity)
            .with_comment(self.comment.clone())
            .with_price(self.price.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartFailure {
    pub name: String,
    pub message: String,
}

/// Resumen de un procesamiento
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CartReport {
    pub confirmed: usize,
    pub queued: usize,
    pub failures: Vec<CartFailure>,
}

impl CartReport {
    pub fn all_done(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct CartViewModel {
    items: Vec<CartItem>,
}

impl CartViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega una línea; devuelve el nuevo largo de la lista
    pub fn add(
        &mut self,
        product: &Product,
        action: TransactionAction,
        quantity: u32,
        comment: Option<String>,
        price: Option<String>,
    ) -> Result<usize, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if action == TransactionAction::Add {
            return Err(CartError::UnsupportedAction(action.as_str()));
        }
        // El stock mostrado es orientativo pero una salida mayor no tiene sentido
        if action == TransactionAction::Out && i64::from(quantity) > product.stock {
            return Err(CartError::InsufficientStock {
                requested: quantity,
                available: product.stock,
            });
        }

        self.items.push(CartItem {
            id: product.id.clone(),
            name: product.nombre.clone(),
            action,
            quantity,
            comment: comment.filter(|c| !c.trim().is_empty()),
            price: price.filter(|p| !p.trim().is_empty()),
            added_at: Utc::now(),
            last_error: None,
        });
        log::info!(
            "🛒 {} x{} {} agregado ({} en lista)",
            action.as_str(),
            quantity,
            product.nombre,
            self.items.len()
        );
        Ok(self.items.len())
    }

    pub fn remove(&mut self, index: usize) -> Result<CartItem, CartError> {
        if index >= self.items.len() {
            return Err(CartError::IndexOutOfRange(index));
        }
        Ok(self.items.remove(index))
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Saca todas las líneas dejando la lista vacía
    pub fn take(&mut self) -> CartViewModel {
        CartViewModel {
            items: std::mem::take(&mut self.items),
        }
    }

    /// Vuelve a poner líneas delante de las actuales
    pub fn restore(&mut self, earlier: CartViewModel) {
        let later = std::mem::replace(&mut self.items, earlier.items);
        self.items.extend(later);
    }

    /// Envía cada línea en orden. Un error de almacenamiento no corta el lote.
    pub async fn process<T, S>(&mut self, service: &SyncService<T, S>) -> CartReport
    where
        T: HttpTransport,
        S: DurableStore,
    {
        let mut report = CartReport::default();
        let mut kept = Vec::new();

        for mut item in std::mem::take(&mut self.items) {
            match service.submit(item.to_payload()).await {
                Ok(SubmitOutcome::Confirmed { .. }) => report.confirmed += 1,
                Ok(SubmitOutcome::SavedOffline { .. }) => report.queued += 1,
                Ok(SubmitOutcome::Rejected { message }) => {
                    report.failures.push(CartFailure {
                        name: item.name.clone(),
                        message: message.clone(),
                    });
                    item.last_error = Some(message);
                    kept.push(item);
                }
                Err(e) => {
                    log::error!("❌ No se pudo guardar {}: {}", item.name, e);
                    report.failures.push(CartFailure {
                        name: item.name.clone(),
                        message: e.to_string(),
                    });
                    item.last_error = Some(e.to_string());
                    kept.push(item);
                }
            }
        }

        self.items = kept;
        log::info!(
            "🛒 Lista procesada: {} confirmados, {} en cola, {} con error",
            report.confirmed,
            report.queued,
            report.failures.len()
        );
        report
    }
}
