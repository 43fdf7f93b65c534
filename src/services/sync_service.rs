// ============================================================================
// SYNC SERVICE - Sincronización localStorage ↔ database
// ============================================================================
// Reconcilia el almacén local con la database del backend en ambos sentidos:
// - Hidratación al arrancar (pull, "local gana si existe")
// - Push dirigido por cambios, con snapshot del último envío confirmado
// - Barrido periódico como red de seguridad
// - Beacon fire-and-forget al descargar la página
// Todo el estado vive en esta instancia; no hay estado ambiente de módulo.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::CONFIG;
use crate::models::settings::{is_empty_sentinel, MonitoredKey, SyncResource};
use crate::models::sync::{PushOutcome, ScheduleDecision, SyncPhase};
use crate::services::api_client::{raw_to_value, value_to_raw, SyncApi};
use crate::services::local_store::SettingsStore;

/// Reloj inyectable: los tests avanzan el tiempo sin esperas reales
pub trait Clock {
    fn now_ms(&self) -> i64;
}

#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Default)]
pub struct BrowserClock;

#[cfg(target_arch = "wasm32")]
impl Clock for BrowserClock {
    fn now_ms(&self) -> i64 {
        js_sys::Date::now() as i64
    }
}

/// Parámetros del sincronizador, fijados al inicializar
#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub user_key: String,
    /// Ventana mínima entre un sync exitoso y el siguiente disparo por escritura
    pub debounce_window_ms: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            user_key: CONFIG.user_key.clone(),
            debounce_window_ms: CONFIG.sync_config.debounce_window_seconds as i64 * 1000,
        }
    }
}

/// Flag de transacción en vuelo con liberación garantizada en todos los
/// caminos de salida, incluidos los de error
struct InFlightGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Sincronizador de settings. Single-flight: como máximo una transacción
/// en curso; los disparos concurrentes se saltan, no se encolan.
///
/// Estado inicial: `dirty=false`, `in_flight=false`, snapshot vacío.
pub struct Synchronizer<S, A, C> {
    store: S,
    api: A,
    clock: C,
    config: SyncConfig,
    /// Último payload confirmado por el backend, por clave. Nunca se persiste.
    snapshot: RefCell<HashMap<MonitoredKey, String>>,
    dirty: Cell<bool>,
    in_flight: Cell<bool>,
    debounce_pending: Cell<bool>,
    last_sync_ms: Cell<Option<i64>>,
}

impl<S, A, C> Synchronizer<S, A, C>
where
    S: SettingsStore,
    A: SyncApi,
    C: Clock,
{
    pub fn new(store: S, api: A, clock: C, config: SyncConfig) -> Self {
        Self {
            store,
            api,
            clock,
            config,
            snapshot: RefCell::new(HashMap::new()),
            dirty: Cell::new(false),
            in_flight: Cell::new(false),
            debounce_pending: Cell::new(false),
            last_sync_ms: Cell::new(None),
        }
    }

    // ==========================================
    // CHANGE OBSERVER (API write-through)
    // ==========================================

    /// Escribe un valor en el almacén local y, si es una clave monitorizada
    /// cuyo valor cambió, marca el estado como dirty y decide si conviene
    /// programar un sync debounced.
    ///
    /// La escritura procede siempre, sea la clave monitorizada o no.
    pub fn set_monitored_value(&self, key: &str, value: &str) -> Result<ScheduleDecision, String> {
        let previous = self.store.get(key);
        self.store.set(key, value)?;

        if MonitoredKey::from_name(key).is_none() {
            return Ok(ScheduleDecision::Skip);
        }

        // Escribir el mismo valor no es un cambio
        if previous.as_deref() == Some(value) {
            return Ok(ScheduleDecision::Skip);
        }

        self.dirty.set(true);

        // Debounce: dentro de la ventana tras el último sync exitoso no se
        // programa nada, el barrido periódico lo recogerá
        if self.within_debounce_window() {
            return Ok(ScheduleDecision::Skip);
        }

        self.debounce_pending.set(true);
        Ok(ScheduleDecision::Schedule)
    }

    fn within_debounce_window(&self) -> bool {
        self.last_sync_ms
            .get()
            .map(|last| self.clock.now_ms() - last < self.config.debounce_window_ms)
            .unwrap_or(false)
    }

    // ==========================================
    // PUSH (transacción de sincronización)
    // ==========================================

    /// Recolecta los valores actuales, los compara con el snapshot y envía
    /// cada sub-recurso modificado. El fallo de un sub-recurso no bloquea
    /// ni revierte a los demás.
    pub async fn sync(&self, force: bool) -> PushOutcome {
        if self.in_flight.get() {
            log::info!("🔄 Sincronización ya en progreso, saltando...");
            return PushOutcome::Busy;
        }
        let _guard = InFlightGuard::acquire(&self.in_flight);
        self.debounce_pending.set(false);

        let payload = self.collect_payload();
        if payload.is_empty() {
            log::info!("📭 No hay datos que sincronizar");
            return PushOutcome::Empty;
        }

        if !force && *self.snapshot.borrow() == payload {
            log::info!("✨ Sin cambios desde el último sync, saltando...");
            return PushOutcome::NoChanges;
        }

        let mut resources_ok = 0;
        let mut resources_failed = 0;

        for resource in SyncResource::ALL {
            let entries = Self::resource_entries(&payload, resource);
            if entries.is_empty() {
                continue;
            }

            let unchanged = {
                let snapshot = self.snapshot.borrow();
                entries.iter().all(|(key, value)| snapshot.get(key) == Some(value))
            };
            if !force && unchanged {
                continue;
            }

            match self.push_resource(resource, &entries).await {
                Ok(()) => {
                    resources_ok += 1;
                    // El snapshot avanza solo para las claves confirmadas
                    let mut snapshot = self.snapshot.borrow_mut();
                    for (key, value) in &entries {
                        snapshot.insert(*key, value.clone());
                    }
                    log::info!("✅ {} sincronizado ({} claves)", resource.label(), entries.len());
                }
                Err(e) => {
                    // Las claves del recurso fallido siguen dirty; el próximo
                    // barrido reintenta con el valor vigente
                    resources_failed += 1;
                    log::error!("❌ Error sincronizando {}: {}", resource.label(), e);
                }
            }
        }

        if resources_ok == 0 && resources_failed == 0 {
            // Cada recurso con datos ya estaba al día
            return PushOutcome::NoChanges;
        }

        if resources_ok > 0 {
            self.last_sync_ms.set(Some(self.clock.now_ms()));
        }
        self.dirty.set(resources_failed > 0);

        PushOutcome::Saved { resources_ok, resources_failed }
    }

    /// Valores actuales de todas las claves monitorizadas; las ausentes o
    /// vacías se omiten (nunca se sincroniza una clave sin valor)
    fn collect_payload(&self) -> HashMap<MonitoredKey, String> {
        let mut payload = HashMap::new();
        for key in MonitoredKey::ALL {
            if let Some(value) = self.store.get(key.as_str()) {
                if !value.is_empty() {
                    payload.insert(key, value);
                }
            }
        }
        payload
    }

    fn resource_entries(
        payload: &HashMap<MonitoredKey, String>,
        resource: SyncResource,
    ) -> Vec<(MonitoredKey, String)> {
        resource
            .keys()
            .iter()
            .filter_map(|key| payload.get(key).map(|value| (*key, value.clone())))
            .collect()
    }

    async fn push_resource(
        &self,
        resource: SyncResource,
        entries: &[(MonitoredKey, String)],
    ) -> Result<(), String> {
        match resource {
            SyncResource::General => {
                let settings: HashMap<String, String> = entries
                    .iter()
                    .map(|(key, value)| (key.as_str().to_string(), value.clone()))
                    .collect();
                self.api.push_general(&settings).await
            }
            SyncResource::Rules => self.api.push_rules(&entries[0].1).await,
            SyncResource::AutomationSettings => {
                self.api.push_automation_settings(&entries[0].1).await
            }
            SyncResource::UserSettings => {
                let settings: HashMap<String, Value> = entries
                    .iter()
                    .map(|(key, value)| (key.as_str().to_string(), raw_to_value(value)))
                    .collect();
                self.api.push_user_settings(&self.config.user_key, &settings).await
            }
        }
    }

    // ==========================================
    // HIDRATACIÓN (pull al arrancar)
    // ==========================================

    /// Rellena el almacén local desde la database para las claves sin valor.
    /// Nunca sobreescribe un valor local no vacío: durante la sesión el
    /// almacén local es la copia más activa, la database solo cubre la
    /// pérdida total (datos de navegador borrados, equipo nuevo).
    ///
    /// Best-effort: cada fallo se loguea y se continúa con el siguiente grupo.
    pub async fn hydrate(&self) {
        log::info!("📥 Cargando settings de la database...");

        match self.api.pull_general().await {
            Ok(settings) => {
                for (name, raw) in settings {
                    if let Some(key) = MonitoredKey::from_name(&name) {
                        self.fill_if_empty(key, &raw);
                    }
                }
            }
            Err(e) => log::warn!("⚠️ No se pudieron cargar los settings generales: {}", e),
        }

        match self.api.pull_rules().await {
            Ok(Some(raw)) => self.fill_if_empty(MonitoredKey::AutomatedPriceRules, &raw),
            Ok(None) => {}
            Err(e) => log::warn!("⚠️ No se pudieron cargar las reglas de precios: {}", e),
        }

        match self.api.pull_automation_settings().await {
            Ok(Some(raw)) => self.fill_if_empty(MonitoredKey::PriceAutomationSettings, &raw),
            Ok(None) => {}
            Err(e) => log::warn!("⚠️ No se pudieron cargar los settings de automatización: {}", e),
        }

        match self.api.pull_user_settings(&self.config.user_key).await {
            Ok(settings) => {
                for (name, value) in settings {
                    if let Some(key) = MonitoredKey::from_name(&name) {
                        self.fill_if_empty(key, &value_to_raw(&value));
                    }
                }
            }
            Err(e) => log::warn!("⚠️ No se pudieron cargar los settings de usuario: {}", e),
        }

        // priceAIData puede reconstruirse desde el histórico de ajustes de AI
        if self.local_is_empty(MonitoredKey::PriceAiData) {
            match self.api.load_ai_adjustments().await {
                Ok(adjustments) if !adjustments.is_empty() => {
                    let count = adjustments.len();
                    let data = serde_json::json!({
                        "adjustments": adjustments,
                        "patterns": {},
                        "suggestions": [],
                    });
                    self.fill_if_empty(MonitoredKey::PriceAiData, &data.to_string());
                    log::info!("✓ {} AI adjustments cargados desde la database", count);
                }
                Ok(_) => {}
                Err(e) => log::warn!("⚠️ No se pudieron cargar los AI adjustments: {}", e),
            }
        }

        log::info!("✅ Hidratación completada");
    }

    fn local_is_empty(&self, key: MonitoredKey) -> bool {
        match self.store.get(key.as_str()) {
            Some(value) => is_empty_sentinel(&value),
            None => true,
        }
    }

    /// Escritura silenciosa de hidratación: no pasa por el Change Observer
    /// y por tanto nunca marca dirty. El valor acaba de llegar del backend,
    /// así que el snapshot también avanza (re-enviarlo sería redundante).
    fn fill_if_empty(&self, key: MonitoredKey, raw: &str) {
        if raw.is_empty() || !self.local_is_empty(key) {
            return;
        }
        if let Err(e) = self.store.set(key.as_str(), raw) {
            log::error!("❌ Error guardando {} hidratado: {}", key.as_str(), e);
            return;
        }
        self.snapshot.borrow_mut().insert(key, raw.to_string());
        log::info!("✓ {} cargado desde la database", key.as_str());
    }

    // ==========================================
    // FLUSH DE UNLOAD (beacon)
    // ==========================================

    /// Intento final de persistir cambios al descargar la página, vía beacon
    /// fire-and-forget. Si no hay cambios sin sincronizar no envía nada.
    /// Devuelve el número de beacons emitidos.
    pub fn flush_beacon(&self) -> usize {
        if !self.dirty.get() {
            return 0;
        }

        let payload = self.collect_payload();
        if payload.is_empty() {
            return 0;
        }

        let mut sent = 0;
        for resource in SyncResource::ALL {
            let entries = Self::resource_entries(&payload, resource);
            if entries.is_empty() {
                continue;
            }
            if let Some(body) = self.resource_body(resource, &entries) {
                if self.api.send_beacon(resource, &body) {
                    sent += 1;
                }
            }
        }

        // La entrega no es observable: snapshot y dirty quedan como están
        log::info!("📤 Beacon de unload enviado: {} recursos", sent);
        sent
    }

    fn resource_body(
        &self,
        resource: SyncResource,
        entries: &[(MonitoredKey, String)],
    ) -> Option<String> {
        match resource {
            SyncResource::General => {
                let settings: HashMap<&str, &str> = entries
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str()))
                    .collect();
                serde_json::to_string(&settings).ok()
            }
            SyncResource::Rules | SyncResource::AutomationSettings => {
                entries.first().map(|(_, value)| value.clone())
            }
            SyncResource::UserSettings => {
                let settings: HashMap<String, Value> = entries
                    .iter()
                    .map(|(key, value)| (key.as_str().to_string(), raw_to_value(value)))
                    .collect();
                serde_json::to_string(&serde_json::json!({
                    "user_key": self.config.user_key,
                    "settings": settings,
                }))
                .ok()
            }
        }
    }

    // ==========================================
    // AI LEARNING
    // ==========================================

    /// Registra un ajuste de AI en la database (operación puntual, fuera del
    /// ciclo de snapshot)
    pub async fn record_ai_adjustment(&self, adjustment: Value) -> Result<(), String> {
        self.api.record_ai_adjustment(&adjustment).await?;
        log::info!("✓ AI adjustment guardado en la database");
        Ok(())
    }

    // ==========================================
    // ESTADO OBSERVABLE
    // ==========================================

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn phase(&self) -> SyncPhase {
        if self.in_flight.get() {
            return SyncPhase::InFlight;
        }
        if self.debounce_pending.get() {
            return SyncPhase::DebouncePending;
        }
        if self.within_debounce_window() {
            SyncPhase::Cooldown
        } else {
            SyncPhase::Idle
        }
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_sync_ms.get().and_then(DateTime::from_timestamp_millis)
    }

    /// Vuelve al estado inicial (snapshot vacío, sin dirty, sin timestamps).
    /// Pensado para teardown en tests y re-login.
    pub fn reset(&self) {
        self.snapshot.borrow_mut().clear();
        self.dirty.set(false);
        self.in_flight.set(false);
        self.debounce_pending.set(false);
        self.last_sync_ms.set(None);
    }

    #[cfg(test)]
    fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    fn api(&self) -> &A {
        &self.api
    }

    #[cfg(test)]
    fn clock(&self) -> &C {
        &self.clock
    }
}
