// ============================================================================
// MONITOR DE ESTADO DE RED
// ============================================================================
// Escucha "online"/"offline" del navegador. "online" dispara un tick
// inmediato; "offline" solo marca desconectado (la cola no se toca).
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Event};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
    Unknown,
}

impl NetworkStatus {
    fn from_navigator() -> Self {
        match window().map(|w| w.navigator().on_line()) {
            Some(true) => NetworkStatus::Online,
            Some(false) => NetworkStatus::Offline,
            None => NetworkStatus::Unknown,
        }
    }
}

pub struct NetworkMonitor {
    status: Rc<Cell<NetworkStatus>>,
    // Los listeners de window se registran una sola vez
    monitoring_started: Cell<bool>,
}

impl NetworkMonitor {
    pub fn new() -> Self {
        Self {
            status: Rc::new(Cell::new(NetworkStatus::from_navigator())),
            monitoring_started: Cell::new(false),
        }
    }

    /// Registra los listeners; llamadas repetidas se ignoran
    pub fn start_monitoring<F>(&self, callback: F) -> Result<(), JsValue>
    where
        F: Fn(NetworkStatus) + 'static,
    {
        if self.monitoring_started.replace(true) {
            log::warn!("⚠️ NetworkMonitor: start_monitoring ya fue llamado, ignorando");
            return Ok(());
        }

        let window = window().ok_or_else(|| JsValue::from_str("sin window"))?;
        let callback = Rc::new(callback);

        for (event_name, next) in [("online", NetworkStatus::Online), ("offline", NetworkStatus::Offline)] {
            let status = self.status.clone();
            let callback = callback.clone();
            let closure = Closure::wrap(Box::new(move |_event: Event| {
                match next {
                    NetworkStatus::Online => log::info!("🌐 Network: ONLINE"),
                    _ => log::warn!("📴 Network: OFFLINE"),
                }
                status.set(next);
                callback(next);
            }) as Box<dyn FnMut(Event)>);

            window.add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref())?;
            // Listener global: vive lo mismo que la página
            closure.forget();
        }

        log::info!("✅ NetworkMonitor: listeners registrados");
        Ok(())
    }

    pub fn current_status(&self) -> NetworkStatus {
        self.status.get()
    }

    pub fn is_online(&self) -> bool {
        self.current_status() == NetworkStatus::Online
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}
