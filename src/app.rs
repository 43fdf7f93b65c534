// ============================================================================
// APP - Cableado web del sincronizador
// ============================================================================
// Instancia global + timers + listener de unload + exports hacia JavaScript.
// El ciclo de vida sigue al original: hidratar primero, sync inicial corto,
// barrido periódico después, beacon al descargar la página.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::{Interval, Timeout};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use crate::config::CONFIG;
use crate::models::sync::{PushOutcome, ScheduleDecision};
use crate::services::api_client::SettingsApiClient;
use crate::services::local_store::LocalSettingsStore;
use crate::services::sync_service::{BrowserClock, SyncConfig, Synchronizer};

type WebSynchronizer = Synchronizer<LocalSettingsStore, SettingsApiClient, BrowserClock>;

// Instancia global del sincronizador (una por página)
thread_local! {
    static SYNCHRONIZER: RefCell<Option<Rc<WebSynchronizer>>> = RefCell::new(None);
    static SWEEP: RefCell<Option<Interval>> = RefCell::new(None);
}

pub fn start() -> Result<(), JsValue> {
    let sync = Rc::new(Synchronizer::new(
        LocalSettingsStore,
        SettingsApiClient::new(),
        BrowserClock,
        SyncConfig::default(),
    ));

    SYNCHRONIZER.with(|cell| {
        *cell.borrow_mut() = Some(sync.clone());
    });

    // Hidratar desde la database y disparar el sync inicial
    {
        let sync = sync.clone();
        spawn_local(async move {
            sync.hydrate().await;
            Timeout::new(CONFIG.sync_config.initial_sync_delay_ms, || trigger_sync(false))
                .forget();
        });
    }

    // Barrido periódico, independiente del Change Observer
    let sweep = Interval::new(CONFIG.sync_config.sweep_interval_seconds * 1000, || {
        trigger_sync(false);
    });
    SWEEP.with(|cell| {
        *cell.borrow_mut() = Some(sweep);
    });
    log::info!(
        "⏰ Barrido de sincronización configurado cada {} segundos",
        CONFIG.sync_config.sweep_interval_seconds
    );

    // Flush con beacon antes de descargar la página
    if let Some(window) = web_sys::window() {
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            SYNCHRONIZER.with(|cell| {
                if let Some(sync) = cell.borrow().as_ref() {
                    let sent = sync.flush_beacon();
                    if sent > 0 {
                        log::info!("💾 Flush de unload: {} beacons", sent);
                    }
                }
            });
        }) as Box<dyn FnMut(web_sys::Event)>);

        window.add_event_listener_with_callback(
            "beforeunload",
            closure.as_ref().unchecked_ref(),
        )?;
        // Listener global registrado una sola vez en init; forget() lo
        // mantiene vivo durante toda la página
        closure.forget();
    }

    log::info!("✅ Sincronización automática configurada");
    Ok(())
}

fn with_synchronizer() -> Option<Rc<WebSynchronizer>> {
    SYNCHRONIZER.with(|cell| cell.borrow().as_ref().cloned())
}

fn trigger_sync(force: bool) {
    let Some(sync) = with_synchronizer() else {
        log::warn!("⚠️ Synchronizer no inicializado");
        return;
    };

    spawn_local(async move {
        match sync.sync(force).await {
            PushOutcome::Saved { resources_ok, resources_failed } => {
                if resources_failed > 0 {
                    log::warn!(
                        "⚠️ Sync parcial: {} recursos ok, {} fallidos (se reintenta en el próximo barrido)",
                        resources_ok,
                        resources_failed
                    );
                }
            }
            PushOutcome::NoChanges | PushOutcome::Empty | PushOutcome::Busy => {}
        }
    });
}

// ==========================================
// EXPORTS HACIA JAVASCRIPT
// ==========================================

/// Escritura observada: el código de la página que quiera valores
/// sincronizables debe pasar por aquí en lugar de tocar localStorage
#[wasm_bindgen]
pub fn set_monitored_value(key: &str, value: &str) -> Result<(), JsValue> {
    let sync = with_synchronizer()
        .ok_or_else(|| JsValue::from_str("Synchronizer no inicializado"))?;

    let decision = sync
        .set_monitored_value(key, value)
        .map_err(|e| JsValue::from_str(&e))?;

    if decision == ScheduleDecision::Schedule {
        Timeout::new(CONFIG.sync_config.debounce_delay_ms, || trigger_sync(false)).forget();
    }
    Ok(())
}

/// Sync manual inmediato (ignora el snapshot)
#[wasm_bindgen]
pub fn sync_now() {
    trigger_sync(true);
}

/// Registra un ajuste de AI en la database
#[wasm_bindgen]
pub fn record_ai_adjustment(adjustment_json: &str) -> Result<(), JsValue> {
    let adjustment: serde_json::Value = serde_json::from_str(adjustment_json)
        .map_err(|e| JsValue::from_str(&format!("Adjustment inválido: {}", e)))?;

    let sync = with_synchronizer()
        .ok_or_else(|| JsValue::from_str("Synchronizer no inicializado"))?;

    spawn_local(async move {
        if let Err(e) = sync.record_ai_adjustment(adjustment).await {
            log::error!("❌ Error guardando AI adjustment: {}", e);
        }
    });
    Ok(())
}

/// Timestamp del último sync exitoso (RFC 3339), si lo hay
#[wasm_bindgen]
pub fn last_synced_at() -> Option<String> {
    with_synchronizer()?.last_synced_at().map(|t| t.to_rfc3339())
}
