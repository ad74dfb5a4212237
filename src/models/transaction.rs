use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::utils::constants::{AUTO_ID, WEB_ADMIN, WEB_USER};

/// Campos de la transacción tal como los espera el servidor.
/// La cola no los interpreta.
pub type Payload = Map<String, Value>;

/// Transacción guardada localmente, pendiente de confirmación remota
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub payload: Payload,
    /// Milisegundos desde epoch
    pub timestamp: i64,
}

impl PendingTransaction {
    pub fn new(payload: Payload) -> Self {
        Self::with_timestamp(payload, chrono::Utc::now().timestamp_millis())
    }

    pub fn with_timestamp(payload: Payload, timestamp: i64) -> Self {
        Self { payload, timestamp }
    }

    pub fn action(&self) -> Option<&str> {
        self.payload.get("action").and_then(Value::as_str)
    }

    /// Id del ítem; el servidor acepta string o número
    pub fn item_id(&self) -> Option<String> {
        match self.payload.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

// ============================================================================
// QUEUE STATE - lista FIFO persistida bajo una sola clave
// ============================================================================

/// Se serializa como arreglo plano: `[{payload, timestamp}, ...]`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueState {
    items: Vec<PendingTransaction>,
}

impl QueueState {
    pub fn new(items: Vec<PendingTransaction>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, tx: PendingTransaction) {
        self.items.push(tx);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingTransaction> {
        self.items.iter()
    }

    pub fn items(&self) -> &[PendingTransaction] {
        &self.items
    }

    /// Copia sin las entradas enviadas; cada enviada elimina una sola
    /// coincidencia (la primera), el resto conserva su orden relativo.
    pub fn without(&self, sent: &[PendingTransaction]) -> QueueState {
        let mut consumed = vec![false; sent.len()];
        let items = self
            .items
            .iter()
            .filter(|tx| {
                let hit = sent
                    .iter()
                    .enumerate()
                    .position(|(i, s)| !consumed[i] && *s == **tx);
                match hit {
                    Some(i) => {
                        consumed[i] = true;
                        false
                    }
                    None => true,
                }
            })
            .cloned()
            .collect();
        QueueState { items }
    }
}

// ============================================================================
// PAYLOADS TIPADOS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionAction {
    In,
    Out,
    Add,
}

impl TransactionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionAction::In => "IN",
            TransactionAction::Out => "OUT",
            TransactionAction::Add => "ADD",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "IN" => Some(TransactionAction::In),
            "OUT" => Some(TransactionAction::Out),
            "ADD" => Some(TransactionAction::Add),
            _ => None,
        }
    }
}

/// Cuerpo del POST al servicio remoto
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub action: TransactionAction,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

impl TransactionPayload {
    /// Movimiento IN/OUT de un producto existente
    pub fn movement(action: TransactionAction, id: impl Into<String>, quantity: u32) -> Self {
        Self {
            action,
            id: id.into(),
            quantity: Some(quantity),
            nombre: None,
            stock: None,
            user: WEB_USER.to_string(),
            comment: None,
            price: None,
        }
    }

    /// Alta de producto; sin id el servidor asigna uno (AUTO)
    pub fn create_product(id: Option<&str>, nombre: impl Into<String>, stock: i64) -> Self {
        let id = id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(AUTO_ID);
        Self {
            action: TransactionAction::Add,
            id: id.to_string(),
            quantity: None,
            nombre: Some(nombre.into()),
            stock: Some(stock),
            user: WEB_ADMIN.to_string(),
            comment: None,
            price: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_price(mut self, price: Option<String>) -> Self {
        self.price = price.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn into_payload(self) -> Result<Payload, StorageError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(StorageError::Serialize(format!(
                "payload no es un objeto: {}",
                other
            ))),
            Err(e) => Err(StorageError::Serialize(e.to_string())),
        }
    }
}
