// ============================================================================
// SERVICIO DE SINCRONIZACIÓN - drain + sondeo de conexión
// ============================================================================
// Cada tick (inicio, timer, evento "online"): drain de la cola y luego
// GET al servicio para saber si hay conexión y refrescar productos.
// Un tick nunca falla: todo error se convierte en estado.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::{AppConfig, RetryPolicy};
use crate::error::StorageError;
use crate::models::{
    ConnectionState, DrainOutcome, Payload, Product, SubmitOutcome, SyncStatus, TickOutcome,
    TransactionPayload,
};
use crate::services::api_client::{ApiClient, HttpTransport};
use crate::services::endpoint_service::EndpointSettings;
use crate::services::offline_service::TransactionQueue;
use crate::state::SyncStateWrapper;
use crate::utils::constants::{SEARCH_MAX_RESULTS, SEARCH_MIN_CHARS};
use crate::utils::storage::DurableStore;

/// Drains fallidos seguidos, para el backoff opcional
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct BackoffState {
    failures: u32,
    last_failure_ms: Option<i64>,
}

impl BackoffState {
    fn ready(&self, policy: &RetryPolicy, now_ms: i64) -> bool {
        let (backoff, last) = match (policy.backoff, self.last_failure_ms) {
            (Some(backoff), Some(last)) if self.failures > 0 => (backoff, last),
            _ => return true,
        };
        let wait_ms = i64::from(backoff.delay_secs(self.failures)) * 1000;
        now_ms - last >= wait_ms
    }

    fn record(&mut self, outcome: &DrainOutcome, now_ms: i64) {
        match outcome {
            DrainOutcome::Completed { sent, .. } if *sent > 0 => *self = Self::default(),
            DrainOutcome::Idle => *self = Self::default(),
            o if o.is_failure() => {
                self.failures = self.failures.saturating_add(1);
                self.last_failure_ms = Some(now_ms);
            }
            _ => {}
        }
    }
}

/// Marca de tick en vuelo
struct TickGuard<'a>(&'a Cell<bool>);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct SyncService<T, S> {
    api: ApiClient<T, S>,
    queue: TransactionQueue<S>,
    state: SyncStateWrapper,
    catalog: RefCell<Vec<Product>>,
    policy: RetryPolicy,
    backoff: Cell<BackoffState>,
    ticking: Cell<bool>,
}

impl<T: HttpTransport, S: DurableStore> SyncService<T, S> {
    pub fn new(transport: T, store: Rc<S>, config: &AppConfig) -> Self {
        let settings = EndpointSettings::new(store.clone(), config.default_api_url.clone());
        let service = Self {
            api: ApiClient::new(transport, settings),
            queue: TransactionQueue::new(store),
            state: SyncStateWrapper::new(),
            catalog: RefCell::new(Vec::new()),
            policy: config.retry,
            backoff: Cell::new(BackoffState::default()),
            ticking: Cell::new(false),
        };
        service.refresh_pending();
        service
    }

    pub fn api(&self) -> &ApiClient<T, S> {
        &self.api
    }

    pub fn queue(&self) -> &TransactionQueue<S> {
        &self.queue
    }

    pub fn state(&self) -> &SyncStateWrapper {
        &self.state
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn status(&self) -> SyncStatus {
        self.state.snapshot()
    }

    /// Relee el largo de la cola y actualiza la señal
    pub fn refresh_pending(&self) -> usize {
        match self.queue.pending_count() {
            Ok(count) => {
                self.state.set_pending_count(count);
                count
            }
            Err(e) => {
                log::error!("❌ No se pudo leer la cola: {}", e);
                self.state.set_last_error(Some(e.to_string()));
                self.state.snapshot().pending_count
            }
        }
    }

    pub async fn tick(&self) -> TickOutcome {
        self.tick_at(chrono::Utc::now().timestamp_millis()).await
    }

    /// Un ciclo completo: drain (si el backoff lo permite) y sondeo
    pub async fn tick_at(&self, now_ms: i64) -> TickOutcome {
        if self.ticking.replace(true) {
            log::info!("🔄 Sincronización ya en progreso, saltando...");
            return TickOutcome::AlreadyRunning;
        }
        let _guard = TickGuard(&self.ticking);

        self.state.set_last_sync_attempt(now_ms);
        let drain = self.drain_at(now_ms).await;
        let connection = self.check_connection().await;

        TickOutcome::Completed { drain, connection }
    }

    /// Drain respetando el backoff; `None` si se saltó o falló el almacenamiento
    pub async fn drain_at(&self, now_ms: i64) -> Option<DrainOutcome> {
        let mut backoff = self.backoff.get();
        if !backoff.ready(&self.policy, now_ms) {
            log::info!(
                "⏳ Esperando backoff: {} drains fallidos seguidos",
                backoff.failures
            );
            return None;
        }

        self.state.set_connection(ConnectionState::Connecting);
        let result = self.queue.drain(&self.api).await;
        self.refresh_pending();

        match result {
            Ok(outcome) => {
                backoff.record(&outcome, now_ms);
                self.backoff.set(backoff);
                if !matches!(outcome, DrainOutcome::AlreadyRunning) {
                    self.state.set_last_drain_sent(outcome.sent());
                }
                Some(outcome)
            }
            Err(e) => {
                log::error!("❌ Error de almacenamiento durante el drain: {}", e);
                self.state.set_last_error(Some(e.to_string()));
                None
            }
        }
    }

    /// Sondeo: GET al servicio. Éxito refresca el catálogo local.
    pub async fn check_connection(&self) -> ConnectionState {
        self.state.set_connection(ConnectionState::Connecting);

        let connection = match self.api.list_products().await {
            Ok(products) => {
                log::info!("🌐 Conectado ({} productos)", products.len());
                self.state.set_product_count(products.len());
                *self.catalog.borrow_mut() = products;
                self.state.set_last_error(None);
                ConnectionState::Connected
            }
            Err(e) => {
                log::warn!("📴 Modo offline: {}", e);
                self.state.set_last_error(Some(e.to_string()));
                ConnectionState::Disconnected
            }
        };

        self.refresh_pending();
        self.state.set_connection(connection);
        connection
    }

    /// El navegador avisó que no hay red
    pub fn mark_offline(&self) {
        self.state.set_connection(ConnectionState::Disconnected);
    }

    pub async fn submit(&self, payload: TransactionPayload) -> Result<SubmitOutcome, StorageError> {
        self.submit_raw(payload.into_payload()?).await
    }

    /// Envía directo; si el servicio no está disponible la transacción queda en cola.
    /// Solo un fallo del almacenamiento local sube como error.
    pub async fn submit_raw(&self, payload: Payload) -> Result<SubmitOutcome, StorageError> {
        match self.api.send_transaction(&payload).await {
            Ok(post) => match post.reply {
                Some(reply) if reply.is_success() => Ok(SubmitOutcome::Confirmed {
                    message: reply.message,
                }),
                Some(reply) => {
                    let message = reply.message.unwrap_or(reply.status);
                    log::warn!("⚠️ Transacción rechazada por el servidor: {}", message);
                    Ok(SubmitOutcome::Rejected { message })
                }
                // HTTP exitoso sin JSON: el servidor la aplicó (mismo criterio que el drain)
                None => Ok(SubmitOutcome::Confirmed { message: None }),
            },
            Err(e) => {
                log::error!("❌ Transacción sin conexión: {}", e);
                let pending = self.queue.enqueue(payload)?;
                self.state.set_pending_count(pending);
                Ok(SubmitOutcome::SavedOffline {
                    pending,
                    reason: e.to_string(),
                })
            }
        }
    }

    pub fn set_api_url(&self, url: &str) -> Result<(), StorageError> {
        self.api.settings().set_api_url(url)
    }

    pub fn products(&self) -> Vec<Product> {
        self.catalog.borrow().clone()
    }

    pub fn cached_product(&self, id: &str) -> Option<Product> {
        let id = id.trim();
        self.catalog.borrow().iter().find(|p| p.id == id).cloned()
    }

    /// Producto desde la red; sin conexión se usa el catálogo en memoria
    pub async fn fetch_product(&self, id: &str) -> Option<Product> {
        match self.api.fetch_product(id).await {
            Ok(product) => product,
            Err(e) => {
                log::warn!("⚠️ Error de conexión buscando {}: {}", id, e);
                self.cached_product(id)
            }
        }
    }

    /// Búsqueda local: mínimo 2 caracteres, máximo 5 resultados
    pub fn search(&self, query: &str) -> Vec<Product> {
        let query = query.trim().to_lowercase();
        if query.chars().count() < SEARCH_MIN_CHARS {
            return Vec::new();
        }
        self.catalog
            .borrow()
            .iter()
            .filter(|p| p.matches(&query))
            .take(SEARCH_MAX_RESULTS)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde_json::json;

    use super::*;
    use crate::config::BackoffPolicy;
    use crate::error::RemoteError;
    use crate::models::TransactionAction;
    use crate::services::api_client::HttpReply;
    use crate::testing::{payload, MemoryStore, ScriptedTransport};

    fn service_with(
        config: AppConfig,
    ) -> (Rc<MemoryStore>, ScriptedTransport, SyncService<ScriptedTransport, MemoryStore>) {
        let store = Rc::new(MemoryStore::new());
        let transport = ScriptedTransport::new();
        let service = SyncService::new(transport.clone(), store.clone(), &config);
        (store, transport, service)
    }

    fn service() -> (Rc<MemoryStore>, ScriptedTransport, SyncService<ScriptedTransport, MemoryStore>) {
        service_with(AppConfig::default())
    }

    fn catalog_reply() -> HttpReply {
        HttpReply::new(
            200,
            json!([
                {"id": 7, "nombre": "Guantes Nitrilo", "stock": 10},
                {"id": 8, "nombre": "Casco", "stock": 2},
                {"id": 70, "nombre": "Guantes Cuero", "stock": 0}
            ])
            .to_string(),
        )
    }

    #[test]
    fn test_probe_success_connects_and_fills_catalog() {
        let (_, transport, service) = service();
        transport.push_get(Ok(catalog_reply()));

        let state = block_on(service.check_connection());
        assert_eq!(state, ConnectionState::Connected);
        assert_eq!(service.status().product_count, 3);
        assert_eq!(service.status().connection, ConnectionState::Connected);
    }

    #[test]
    fn test_probe_http_error_disconnects() {
        let (_, transport, service) = service();
        transport.push_get(Ok(HttpReply::new(503, "down")));

        assert_eq!(block_on(service.check_connection()), ConnectionState::Disconnected);
        assert!(service.status().last_error.is_some());
    }

    #[test]
    fn test_probe_malformed_body_is_connectivity_failure() {
        let (_, transport, service) = service();
        transport.push_get(Ok(HttpReply::new(200, "<html>")));

        assert_eq!(block_on(service.check_connection()), ConnectionState::Disconnected);
    }

    #[test]
    fn test_probe_reports_connecting_while_in_flight() {
        let (_, transport, service) = service();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_cb = seen.clone();
        service.state().subscribe(move |s| seen_cb.borrow_mut().push(s.connection));
        transport.push_get(Ok(catalog_reply()));

        block_on(service.check_connection());
        // Otras señales también notifican; solo interesa la secuencia de estados
        seen.borrow_mut().dedup();
        assert_eq!(
            *seen.borrow(),
            vec![ConnectionState::Connecting, ConnectionState::Connected]
        );
    }

    #[test]
    fn test_submit_confirmed() {
        let (_, transport, service) = service();
        transport.push_post(Ok(HttpReply::new(200, r#"{"status":"success","message":"OK"}"#)));

        let outcome = block_on(service.submit(TransactionPayload::movement(
            TransactionAction::In,
            "7",
            1,
        )))
        .unwrap();
        assert_eq!(outcome, SubmitOutcome::Confirmed { message: Some("OK".to_string()) });
        assert_eq!(service.queue().pending_count().unwrap(), 0);
    }

    #[test]
    fn test_submit_rejected_is_not_queued() {
        let (_, transport, service) = service();
        transport.push_post(Ok(HttpReply::new(
            200,
            r#"{"status":"error","message":"Stock insuficiente"}"#,
        )));

        let outcome = block_on(service.submit_raw(payload("OUT", "7", 99))).unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Rejected { message: "Stock insuficiente".to_string() }
        );
        assert_eq!(service.queue().pending_count().unwrap(), 0);
    }

    #[test]
    fn test_submit_offline_saves_to_queue() {
        let (_, transport, service) = service();
        transport.set_offline(true);

        let outcome = block_on(service.submit_raw(payload("OUT", "7", 2))).unwrap();
        assert!(matches!(outcome, SubmitOutcome::SavedOffline { pending: 1, .. }));
        assert_eq!(service.status().pending_count, 1);
        assert!(service.status().queued);
    }

    #[test]
    fn test_submit_http_error_saves_to_queue() {
        let (_, transport, service) = service();
        transport.push_post(Ok(HttpReply::new(502, "bad gateway")));

        let outcome = block_on(service.submit_raw(payload("IN", "7", 2))).unwrap();
        assert!(matches!(outcome, SubmitOutcome::SavedOffline { pending: 1, .. }));
    }

    #[test]
    fn test_submit_offline_with_broken_storage_is_fatal() {
        let (store, transport, service) = service();
        transport.set_offline(true);
        store.set_available(false);

        let result = block_on(service.submit_raw(payload("IN", "7", 2)));
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
    }

    #[test]
    fn test_tick_drains_then_probes() {
        let (_, transport, service) = service();
        transport.set_offline(true);
        block_on(service.submit_raw(payload("OUT", "7", 2))).unwrap();
        block_on(service.submit_raw(payload("IN", "8", 1))).unwrap();

        transport.set_offline(false);
        transport.push_get(Ok(catalog_reply()));
        let outcome = block_on(service.tick_at(1_000));

        assert_eq!(
            outcome,
            TickOutcome::Completed {
                drain: Some(DrainOutcome::Completed { sent: 2, retained: 0 }),
                connection: ConnectionState::Connected,
            }
        );
        let status = service.status();
        assert_eq!(status.pending_count, 0);
        assert!(!status.queued);
        assert_eq!(status.last_drain_sent, 2);
        assert_eq!(status.last_sync_attempt, Some(1_000));

        let methods: Vec<&str> = transport.requests().iter().map(|r| r.method).collect();
        assert_eq!(methods, vec!["POST", "POST", "POST", "POST", "GET"]);
    }

    #[test]
    fn test_tick_while_offline_keeps_queue_and_disconnects() {
        let (_, transport, service) = service();
        transport.set_offline(true);
        block_on(service.submit_raw(payload("OUT", "7", 2))).unwrap();

        let outcome = block_on(service.tick_at(1_000));
        assert_eq!(
            outcome,
            TickOutcome::Completed {
                drain: Some(DrainOutcome::Completed { sent: 0, retained: 1 }),
                connection: ConnectionState::Disconnected,
            }
        );
        assert!(service.status().queued);
    }

    #[test]
    fn test_overlapping_tick_is_skipped() {
        let (_, transport, service) = service();
        service.ticking.set(true);

        assert_eq!(block_on(service.tick_at(0)), TickOutcome::AlreadyRunning);
        assert!(transport.requests().is_empty());

        service.ticking.set(false);
        transport.push_get(Ok(catalog_reply()));
        assert!(matches!(
            block_on(service.tick_at(0)),
            TickOutcome::Completed { .. }
        ));
        assert!(!service.ticking.get());
    }

    #[test]
    fn test_tick_with_broken_storage_still_probes() {
        let (store, transport, service) = service();
        store.set_available(false);
        transport.push_get(Ok(catalog_reply()));

        let outcome = block_on(service.tick_at(0));
        assert_eq!(
            outcome,
            TickOutcome::Completed {
                drain: None,
                connection: ConnectionState::Connected,
            }
        );
    }

    #[test]
    fn test_backoff_skips_drain_until_delay_elapsed() {
        let mut config = AppConfig::default();
        config.retry.backoff = Some(BackoffPolicy { base_secs: 30, max_secs: 300 });
        let (_, transport, service) = service_with(config);
        transport.set_offline(true);
        block_on(service.submit_raw(payload("OUT", "7", 2))).unwrap();

        // Primer fallo en t=0
        let first = block_on(service.drain_at(0));
        assert!(first.unwrap().is_failure());

        // t=10s: dentro de los 30s de espera
        assert_eq!(block_on(service.drain_at(10_000)), None);

        // t=30s: se reintenta y vuelve a fallar, la espera sube a 60s
        assert!(block_on(service.drain_at(30_000)).is_some());
        assert_eq!(block_on(service.drain_at(60_000)), None);

        transport.set_offline(false);
        let ok = block_on(service.drain_at(90_000)).unwrap();
        assert_eq!(ok.sent(), 1);

        // El éxito reinicia el backoff
        block_on(service.submit_raw(payload("OUT", "8", 1))).unwrap();
        assert!(block_on(service.drain_at(90_001)).is_some());
    }

    #[test]
    fn test_without_backoff_every_tick_retries() {
        let (_, transport, service) = service();
        transport.set_offline(true);
        block_on(service.submit_raw(payload("OUT", "7", 2))).unwrap();

        for t in 0..3 {
            assert!(block_on(service.drain_at(t)).is_some());
        }
    }

    #[test]
    fn test_search_rules() {
        let (_, transport, service) = service();
        transport.push_get(Ok(catalog_reply()));
        block_on(service.check_connection());

        assert!(service.search("g").is_empty());
        let names: Vec<String> = service.search("GUANTES").into_iter().map(|p| p.nombre).collect();
        assert_eq!(names, vec!["Guantes Nitrilo", "Guantes Cuero"]);
        assert_eq!(service.search("70").len(), 1);
    }

    #[test]
    fn test_fetch_product_falls_back_to_catalog_offline() {
        let (_, transport, service) = service();
        transport.push_get(Ok(catalog_reply()));
        block_on(service.check_connection());

        transport.set_offline(true);
        let product = block_on(service.fetch_product("8")).unwrap();
        assert_eq!(product.nombre, "Casco");
        assert_eq!(block_on(service.fetch_product("999")), None);
    }

    #[test]
    fn test_set_api_url_changes_target() {
        let (_, transport, service) = service();
        service.set_api_url("https://otra/exec").unwrap();
        transport.push_get(Err(RemoteError::Network("x".to_string())));
        block_on(service.check_connection());
        assert_eq!(transport.requests()[0].url, "https://otra/exec");
    }

    #[test]
    fn test_end_to_end_out_seven() {
        let (_, transport, service) = service();
        transport.set_offline(true);
        let outcome = block_on(service.submit(TransactionPayload::movement(
            TransactionAction::Out,
            "7",
            2,
        )))
        .unwrap();
        assert!(matches!(outcome, SubmitOutcome::SavedOffline { pending: 1, .. }));

        transport.set_offline(false);
        transport.push_post(Ok(HttpReply::new(200, r#"{"status":"success"}"#)));
        let drained = block_on(service.queue().drain(service.api())).unwrap();
        assert_eq!(drained.sent(), 1);
        assert_eq!(service.queue().pending_count().unwrap(), 0);
    }
}
