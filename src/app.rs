// ============================================================================
// APP - Cableado en el navegador
// ============================================================================
// Crea el SyncService sobre localStorage + gloo-net, arranca el timer,
// escucha online/offline y publica cada cambio de estado como
// CustomEvent en window para que la UI se actualice.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Interval;
use wasm_bindgen::prelude::*;
use web_sys::{window, CustomEvent, CustomEventInit};

use crate::config::CONFIG;
use crate::models::{SyncStatus, TickOutcome};
use crate::services::{GlooTransport, NetworkMonitor, NetworkStatus, SyncService};
use crate::utils::constants::SYNC_STATUS_EVENT;
use crate::utils::storage::LocalStorageStore;
use crate::viewmodels::CartViewModel;

pub type BrowserSync = SyncService<GlooTransport, LocalStorageStore>;

thread_local! {
    static APP: RefCell<Option<App>> = RefCell::new(None);
}

pub struct App {
    sync: Rc<BrowserSync>,
    cart: Rc<RefCell<CartViewModel>>,
    network: NetworkMonitor,
    _timer: Interval,
}

impl App {
    pub fn start() -> Result<Self, JsValue> {
        let config = &*CONFIG;
        let sync = Rc::new(SyncService::new(
            GlooTransport,
            Rc::new(LocalStorageStore),
            config,
        ));

        sync.state().subscribe(|status| {
            if let Err(e) = dispatch_status(status) {
                log::warn!("⚠️ No se pudo publicar el estado: {:?}", e);
            }
        });
        dispatch_status(&sync.status())?;

        // Primer ciclo al abrir la página
        spawn_tick(&sync, "inicio");

        let timer = {
            let sync = sync.clone();
            Interval::new(config.retry.interval_ms(), move || spawn_tick(&sync, "timer"))
        };

        let network = NetworkMonitor::new();
        {
            let sync = sync.clone();
            network.start_monitoring(move |status| match status {
                NetworkStatus::Online => spawn_tick(&sync, "online"),
                NetworkStatus::Offline => sync.mark_offline(),
                NetworkStatus::Unknown => {}
            })?;
        }

        log::info!(
            "⏰ Sync cada {}s ({} pendientes, red: {:?})",
            config.retry.interval_secs,
            sync.status().pending_count,
            network.current_status()
        );

        Ok(Self {
            sync,
            cart: Rc::new(RefCell::new(CartViewModel::new())),
            network,
            _timer: timer,
        })
    }

    pub fn is_online(&self) -> bool {
        self.network.is_online()
    }
}

/// Guarda la instancia global
pub fn install(app: App) {
    APP.with(|cell| *cell.borrow_mut() = Some(app));
}

pub fn with_app<R>(reader: impl FnOnce(&App) -> R) -> Result<R, JsValue> {
    APP.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(reader)
            .ok_or_else(|| JsValue::from_str("App no está inicializada"))
    })
}

pub fn sync_service() -> Result<Rc<BrowserSync>, JsValue> {
    with_app(|app| app.sync.clone())
}

pub fn cart() -> Result<Rc<RefCell<CartViewModel>>, JsValue> {
    with_app(|app| app.cart.clone())
}

pub fn spawn_tick(sync: &Rc<BrowserSync>, origin: &'static str) {
    let sync = sync.clone();
    wasm_bindgen_futures::spawn_local(async move {
        match sync.tick().await {
            TickOutcome::AlreadyRunning => {}
            TickOutcome::Completed { drain, connection } => {
                log::info!("🔄 Tick ({}): drain {:?}, conexión {:?}", origin, drain, connection);
            }
        }
    });
}

fn dispatch_status(status: &SyncStatus) -> Result<(), JsValue> {
    let window = window().ok_or_else(|| JsValue::from_str("sin window"))?;
    let init = CustomEventInit::new();
    init.set_detail(&serde_wasm_bindgen::to_value(status)?);
    let event = CustomEvent::new_with_event_init_dict(SYNC_STATUS_EVENT, &init)?;
    window.dispatch_event(&event)?;
    Ok(())
}
