// ============================================================================
// RENTAL BACKOFFICE SYNC - Sincronización localStorage ↔ database
// ============================================================================
// Módulo WASM del back-office de rent-a-car. Mantiene los settings locales
// (branding, automatización de precios, reglas, datos de AI) replicados en
// la database del backend:
// - Hidratación al cargar la página (la database solo rellena huecos)
// - Push por cambios con debounce + barrido periódico de seguridad
// - Beacon fire-and-forget al descargar la página
// El núcleo es independiente de plataforma; los bindings de navegador viven
// tras cfg(target_arch = "wasm32").
// ============================================================================

pub mod config;
pub mod models;
pub mod services;

#[cfg(target_arch = "wasm32")]
pub mod app;
#[cfg(target_arch = "wasm32")]
mod utils;

pub use models::settings::{MonitoredKey, SyncResource};
pub use models::sync::{PushOutcome, ScheduleDecision, SyncPhase};
pub use services::local_store::SettingsStore;
pub use services::sync_service::{Clock, SyncConfig, Synchronizer};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    // Panic hook para mejor debugging en consola
    console_error_panic_hook::set_once();

    if config::CONFIG.is_logging_enabled() {
        wasm_logger::init(wasm_logger::Config::default());
    }
    log::info!("🔄 Auto-Sync inicializado (backend: {})", config::CONFIG.backend_url());

    app::start()
}
