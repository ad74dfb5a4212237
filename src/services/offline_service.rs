// ============================================================================
// COLA OFFLINE DE TRANSACCIONES
// ============================================================================
// Transacciones que no llegaron al servidor se guardan en `pending_txs`
// y se reenvían en orden FIFO, una por una, en cada drain.
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;

use crate::error::StorageError;
use crate::models::{DrainOutcome, Payload, PendingTransaction, QueueState};
use crate::services::api_client::{ApiClient, HttpTransport};
use crate::utils::constants::PENDING_TXS_KEY;
use crate::utils::storage::{load_from_storage, save_to_storage, DurableStore};

/// Marca de drain en vuelo; se libera al salir del scope
struct DrainGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> DrainGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self { flag })
        }
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

pub struct TransactionQueue<S> {
    store: Rc<S>,
    key: String,
    draining: Cell<bool>,
}

impl<S: DurableStore> TransactionQueue<S> {
    pub fn new(store: Rc<S>) -> Self {
        Self::with_key(store, PENDING_TXS_KEY)
    }

    pub fn with_key(store: Rc<S>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            draining: Cell::new(false),
        }
    }

    /// Estado persistido; vacío si nunca se escribió
    pub fn load(&self) -> Result<QueueState, StorageError> {
        Ok(load_from_storage::<_, QueueState>(&*self.store, &self.key)?.unwrap_or_default())
    }

    fn save(&self, state: &QueueState) -> Result<(), StorageError> {
        save_to_storage(&*self.store, &self.key, state)
    }

    /// Agrega al final de la cola y devuelve el nuevo total.
    /// Si el almacenamiento falla el error sube al llamador, sin reintento.
    pub fn enqueue(&self, payload: Payload) -> Result<usize, StorageError> {
        let mut state = self.load()?;
        state.push(PendingTransaction::new(payload));
        self.save(&state)?;

        log::info!("💾 Transacción guardada offline ({} en cola)", state.len());
        Ok(state.len())
    }

    /// Largo de la cola persistida, sin efectos
    pub fn pending_count(&self) -> Result<usize, StorageError> {
        Ok(self.load()?.len())
    }

    pub fn is_draining(&self) -> bool {
        self.draining.get()
    }

    /// Reenvía cada transacción en orden, de a una. Las exitosas se quitan,
    /// las fallidas quedan en su orden relativo para el próximo drain.
    pub async fn drain<T: HttpTransport>(
        &self,
        api: &ApiClient<T, S>,
    ) -> Result<DrainOutcome, StorageError> {
        let _guard = match DrainGuard::acquire(&self.draining) {
            Some(guard) => guard,
            None => {
                log::info!("🔄 Drain ya en curso, se omite");
                return Ok(DrainOutcome::AlreadyRunning);
            }
        };

        let snapshot = self.load()?;
        if snapshot.is_empty() {
            return Ok(DrainOutcome::Idle);
        }

        log::info!("🔄 Sincronizando {} transacciones pendientes", snapshot.len());

        // Secuencial: el servidor no aísla escrituras concurrentes
        let mut sent = Vec::new();
        for tx in snapshot.iter() {
            match api.send_transaction(&tx.payload).await {
                Ok(_) => sent.push(tx.clone()),
                Err(e) => {
                    log::warn!(
                        "⚠️ Transacción {} {} sigue en cola: {}",
                        tx.action().unwrap_or("?"),
                        tx.item_id().unwrap_or_default(),
                        e
                    );
                }
            }
        }

        if sent.is_empty() {
            return Ok(DrainOutcome::Completed {
                sent: 0,
                retained: snapshot.len(),
            });
        }

        // Releer justo antes de escribir: lo encolado durante el drain se conserva
        let latest = self.load()?;
        let remaining = latest.without(&sent);
        self.save(&remaining)?;

        log::info!(
            "✅ Sincronizados {} movimientos, {} siguen en cola",
            sent.len(),
            remaining.len()
        );

        Ok(DrainOutcome::Completed {
            sent: sent.len(),
            retained: remaining.len(),
        })
    }
}
