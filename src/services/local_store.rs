// ============================================================================
// LOCAL STORE - Acceso al almacén local de settings
// ============================================================================
// El almacén local es un recurso global compartido: cualquier código de la
// página puede escribirlo. El sincronizador solo lo observa vía la API
// write-through (set_monitored_value) y lo lee para transmitir.
// ============================================================================

/// Almacén local síncrono de pares (clave, valor serializado)
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), String>;
    fn remove(&self, key: &str) -> Result<(), String>;
}

/// Implementación sobre window.localStorage
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Default)]
pub struct LocalSettingsStore;

#[cfg(target_arch = "wasm32")]
impl SettingsStore for LocalSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        crate::utils::storage::read_item(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        crate::utils::storage::write_item(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        crate::utils::storage::remove_item(key)
    }
}

/// Almacén en memoria para tests nativos
#[cfg(test)]
pub struct MemoryStore {
    items: std::cell::RefCell<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self { items: std::cell::RefCell::new(std::collections::HashMap::new()) }
    }

    pub fn with_items(items: &[(&str, &str)]) -> Self {
        let store = Self::new();
        for (key, value) in items {
            store.items.borrow_mut().insert((*key).to_string(), (*value).to_string());
        }
        store
    }
}

#[cfg(test)]
impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}
