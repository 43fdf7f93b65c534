use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend_url_development: String,
    pub backend_url_production: String,
    pub environment: String,
    pub enable_logging: bool,
    pub sync_config: SyncIntervals,
    pub user_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url_development: "http://localhost:8000".to_string(),
            // Cadena vacía = mismo origen (la app se sirve desde el backend)
            backend_url_production: String::new(),
            environment: "development".to_string(),
            enable_logging: true,
            sync_config: SyncIntervals::default(),
            user_key: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncIntervals {
    /// Barrido periódico de sincronización (segundos)
    pub sweep_interval_seconds: u32,
    /// Ventana mínima entre syncs disparados por escrituras (segundos)
    pub debounce_window_seconds: u32,
    /// Retraso del sync debounced tras detectar un cambio (ms)
    pub debounce_delay_ms: u32,
    /// Retraso del sync inicial tras la hidratación (ms)
    pub initial_sync_delay_ms: u32,
}

impl Default for SyncIntervals {
    fn default() -> Self {
        Self {
            sweep_interval_seconds: 30,
            debounce_window_seconds: 5,
            debounce_delay_ms: 1000,
            initial_sync_delay_ms: 2000,
        }
    }
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno en tiempo de compilación
    pub fn from_env() -> Self {
        let defaults = SyncIntervals::default();
        Self {
            backend_url_development: option_env!("BACKEND_URL_DEVELOPMENT")
                .unwrap_or("http://localhost:8000").to_string(),
            backend_url_production: option_env!("BACKEND_URL_PRODUCTION")
                .unwrap_or("").to_string(),
            environment: option_env!("ENVIRONMENT")
                .unwrap_or("development").to_string(),
            enable_logging: option_env!("ENABLE_LOGGING")
                .unwrap_or("true").parse().unwrap_or(true),
            sync_config: SyncIntervals {
                sweep_interval_seconds: option_env!("SYNC_SWEEP_INTERVAL_SECONDS")
                    .unwrap_or("30").parse().unwrap_or(defaults.sweep_interval_seconds),
                debounce_window_seconds: option_env!("SYNC_DEBOUNCE_WINDOW_SECONDS")
                    .unwrap_or("5").parse().unwrap_or(defaults.debounce_window_seconds),
                debounce_delay_ms: option_env!("SYNC_DEBOUNCE_DELAY_MS")
                    .unwrap_or("1000").parse().unwrap_or(defaults.debounce_delay_ms),
                initial_sync_delay_ms: option_env!("SYNC_INITIAL_DELAY_MS")
                    .unwrap_or("2000").parse().unwrap_or(defaults.initial_sync_delay_ms),
            },
            user_key: option_env!("SYNC_USER_KEY")
                .unwrap_or("default").to_string(),
        }
    }

    /// Obtiene la URL del backend según el entorno actual
    pub fn backend_url(&self) -> &str {
        match self.environment.as_str() {
            "production" => &self.backend_url_production,
            _ => &self.backend_url_development,
        }
    }

    /// Verifica si el modo de logging está habilitado
    pub fn is_logging_enabled(&self) -> bool {
        self.enable_logging
    }
}

// Configuración global estática
lazy_static::lazy_static! {
    pub static ref CONFIG: AppConfig = AppConfig::from_env();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_to_development() {
        let config = AppConfig::default();
        assert_eq!(config.backend_url(), "http://localhost:8000");
        assert_eq!(config.sync_config.sweep_interval_seconds, 30);
    }

    #[test]
    fn production_backend_is_same_origin() {
        let mut config = AppConfig::default();
        config.environment = "production".to_string();
        assert_eq!(config.backend_url(), "");
    }
}
