use serde::{Deserialize, Serialize};

use crate::utils::constants::REMOTE_STATUS_SUCCESS;

/// Estado de conectividad con el servicio remoto
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Señales que consume la UI. `queued` se superpone a la conectividad.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SyncStatus {
    pub connection: ConnectionState,
    pub pending_count: usize,
    pub queued: bool,
    /// Enviadas con éxito en el último drain
    pub last_drain_sent: usize,
    pub product_count: usize,
    pub last_error: Option<String>,
    pub last_sync_attempt: Option<i64>,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            pending_count: 0,
            queued: false,
            last_drain_sent: 0,
            product_count: 0,
            last_error: None,
            last_sync_attempt: None,
        }
    }
}

/// Respuesta JSON del POST: `{status: "success"|..., message?}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteReply {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl RemoteReply {
    pub fn is_success(&self) -> bool {
        self.status == REMOTE_STATUS_SUCCESS
    }
}

/// Resultado de enviar una transacción directamente
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// El servidor aplicó la transacción
    Confirmed { message: Option<String> },
    /// El servidor respondió pero la rechazó; no se encola
    Rejected { message: String },
    /// Sin conexión: quedó en la cola local
    SavedOffline { pending: usize, reason: String },
}

/// Resultado de un drain de la cola
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrainOutcome {
    /// Cola vacía: ni red ni escritura
    Idle,
    Completed { sent: usize, retained: usize },
    /// Otro drain en curso
    AlreadyRunning,
}

impl DrainOutcome {
    pub fn sent(&self) -> usize {
        match self {
            DrainOutcome::Completed { sent, .. } => *sent,
            _ => 0,
        }
    }

    /// Hubo entradas y ninguna salió
    pub fn is_failure(&self) -> bool {
        matches!(self, DrainOutcome::Completed { sent: 0, retained } if *retained > 0)
    }
}

/// Resultado de un ciclo del sync loop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TickOutcome {
    /// Ya hay un ciclo en vuelo; este se descarta
    AlreadyRunning,
    Completed {
        /// `None` si el drain se saltó (backoff) o falló el almacenamiento
        drain: Option<DrainOutcome>,
        connection: ConnectionState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_reply_without_message() {
        let reply: RemoteReply = serde_json::from_value(json!({"status": "success"})).unwrap();
        assert!(reply.is_success());
        assert_eq!(reply.message, None);
    }

    #[test]
    fn test_remote_reply_error_status() {
        let reply: RemoteReply =
            serde_json::from_value(json!({"status": "error", "message": "Stock insuficiente"}))
                .unwrap();
        assert!(!reply.is_success());
    }

    #[test]
    fn test_drain_failure_detection() {
        assert!(DrainOutcome::Completed { sent: 0, retained: 2 }.is_failure());
        assert!(!DrainOutcome::Completed { sent: 1, retained: 1 }.is_failure());
        assert!(!DrainOutcome::Idle.is_failure());
        assert_eq!(DrainOutcome::AlreadyRunning.sent(), 0);
    }

    #[test]
    fn test_status_serializes_for_ui() {
        let status = SyncStatus {
            connection: ConnectionState::Connected,
            pending_count: 2,
            queued: true,
            ..SyncStatus::default()
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["connection"], json!("connected"));
        assert_eq!(json["queued"], json!(true));
    }
}
