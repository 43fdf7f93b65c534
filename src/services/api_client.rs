// ============================================================================
// API CLIENT - SOLO COMUNICACIÓN HTTP (Stateless)
// ============================================================================
// NO tiene lógica de negocio, solo hace requests HTTP contra los endpoints
// de settings del backend. El sincronizador decide qué y cuándo enviar.
// ============================================================================

use std::collections::HashMap;

use serde_json::Value;

use crate::models::settings::SyncResource;

/// Transporte hacia el Remote Store, un método por grupo de endpoints.
/// `send_beacon` es el transporte fire-and-forget de unload: síncrono,
/// sin respuesta observable.
#[allow(async_fn_in_trait)]
pub trait SyncApi {
    async fn push_general(&self, settings: &HashMap<String, String>) -> Result<(), String>;
    async fn pull_general(&self) -> Result<HashMap<String, String>, String>;

    async fn push_rules(&self, raw_rules: &str) -> Result<(), String>;
    async fn pull_rules(&self) -> Result<Option<String>, String>;

    async fn push_automation_settings(&self, raw_settings: &str) -> Result<(), String>;
    async fn pull_automation_settings(&self) -> Result<Option<String>, String>;

    async fn push_user_settings(
        &self,
        user_key: &str,
        settings: &HashMap<String, Value>,
    ) -> Result<(), String>;
    async fn pull_user_settings(&self, user_key: &str) -> Result<HashMap<String, Value>, String>;

    async fn record_ai_adjustment(&self, adjustment: &Value) -> Result<(), String>;
    async fn load_ai_adjustments(&self) -> Result<Vec<Value>, String>;

    fn send_beacon(&self, resource: SyncResource, body: &str) -> bool;
}

/// Un valor remoto puede llegar como string ya serializado o como JSON
/// estructurado; en localStorage siempre vive como string.
pub fn value_to_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Inversa de `value_to_raw`: los endpoints por-usuario esperan JSON
/// estructurado cuando el valor lo es.
pub fn raw_to_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

// ============================================================================
// Implementación web (gloo-net + sendBeacon)
// ============================================================================

#[cfg(target_arch = "wasm32")]
mod web {
    use std::collections::HashMap;

    use gloo_net::http::Request;
    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use wasm_bindgen::JsValue;

    use crate::config::CONFIG;
    use crate::models::settings::SyncResource;

    use super::{value_to_raw, SyncApi};

    #[derive(Debug, Deserialize)]
    struct LoadAllResponse {
        #[serde(default)]
        settings: HashMap<String, Value>,
    }

    #[derive(Debug, Deserialize)]
    struct RulesLoadResponse {
        #[serde(default)]
        ok: bool,
        #[serde(default)]
        rules: Value,
    }

    #[derive(Debug, Deserialize)]
    struct AutomationSettingsLoadResponse {
        #[serde(default)]
        ok: bool,
        #[serde(default)]
        settings: Value,
    }

    #[derive(Debug, Deserialize)]
    struct UserSettingsLoadResponse {
        #[serde(default)]
        ok: bool,
        #[serde(default)]
        settings: HashMap<String, Value>,
    }

    #[derive(Debug, Deserialize)]
    struct AiLearningLoadResponse {
        #[serde(default)]
        ok: bool,
        #[serde(default)]
        adjustments: Vec<Value>,
    }

    #[derive(Debug, Serialize)]
    struct UserSettingsSaveRequest<'a> {
        user_key: &'a str,
        settings: &'a HashMap<String, Value>,
    }

    #[derive(Debug, Serialize)]
    struct AiAdjustmentSaveRequest<'a> {
        adjustment: &'a Value,
    }

    /// Cliente API - SOLO comunicación HTTP (stateless)
    #[derive(Clone)]
    pub struct SettingsApiClient {
        base_url: String,
    }

    impl SettingsApiClient {
        pub fn new() -> Self {
            Self { base_url: CONFIG.backend_url().to_string() }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base_url, path)
        }

        async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<(), String> {
            let response = Request::post(&self.url(path))
                .json(body)
                .map_err(|e| format!("Request build error: {}", e))?
                .send()
                .await
                .map_err(|e| format!("Network error: {}", e))?;

            if !response.ok() {
                return Err(format!("HTTP {}: {}", response.status(), response.status_text()));
            }
            Ok(())
        }

        /// POST con body ya serializado por el caller (reglas y settings de
        /// automatización viajan tal cual están en localStorage)
        async fn post_raw(&self, path: &str, raw: &str) -> Result<(), String> {
            let response = Request::post(&self.url(path))
                .header("Content-Type", "application/json")
                .body(raw.to_string())
                .map_err(|e| format!("Request build error: {}", e))?
                .send()
                .await
                .map_err(|e| format!("Network error: {}", e))?;

            if !response.ok() {
                return Err(format!("HTTP {}: {}", response.status(), response.status_text()));
            }
            Ok(())
        }
    }

    impl Default for SettingsApiClient {
        fn default() -> Self {
            Self::new()
        }
    }

    impl SyncApi for SettingsApiClient {
        async fn push_general(&self, settings: &HashMap<String, String>) -> Result<(), String> {
            self.post_json("/api/settings/sync", settings).await
        }

        async fn pull_general(&self) -> Result<HashMap<String, String>, String> {
            let response = Request::get(&self.url("/api/settings/load-all"))
                .send()
                .await
                .map_err(|e| format!("Network error: {}", e))?;

            if !response.ok() {
                return Err(format!("HTTP {}: {}", response.status(), response.status_text()));
            }

            let data = response
                .json::<LoadAllResponse>()
                .await
                .map_err(|e| format!("Parse error: {}", e))?;

            Ok(data.settings.iter().map(|(k, v)| (k.clone(), value_to_raw(v))).collect())
        }

        async fn push_rules(&self, raw_rules: &str) -> Result<(), String> {
            self.post_raw("/api/price-automation/rules/save", raw_rules).await
        }

        async fn pull_rules(&self) -> Result<Option<String>, String> {
            let response = Request::get(&self.url("/api/price-automation/rules/load"))
                .send()
                .await
                .map_err(|e| format!("Network error: {}", e))?;

            if !response.ok() {
                return Err(format!("HTTP {}: {}", response.status(), response.status_text()));
            }

            let data = response
                .json::<RulesLoadResponse>()
                .await
                .map_err(|e| format!("Parse error: {}", e))?;

            if data.ok && !data.rules.is_null() {
                Ok(Some(data.rules.to_string()))
            } else {
                Ok(None)
            }
        }

        async fn push_automation_settings(&self, raw_settings: &str) -> Result<(), String> {
            self.post_raw("/api/price-automation/settings/save", raw_settings).await
        }

        async fn pull_automation_settings(&self) -> Result<Option<String>, String> {
            let response = Request::get(&self.url("/api/price-automation/settings/load"))
                .send()
                .await
                .map_err(|e| format!("Network error: {}", e))?;

            if !response.ok() {
                return Err(format!("HTTP {}: {}", response.status(), response.status_text()));
            }

            let data = response
                .json::<AutomationSettingsLoadResponse>()
                .await
                .map_err(|e| format!("Parse error: {}", e))?;

            if data.ok && !data.settings.is_null() {
                Ok(Some(data.settings.to_string()))
            } else {
                Ok(None)
            }
        }

        async fn push_user_settings(
            &self,
            user_key: &str,
            settings: &HashMap<String, Value>,
        ) -> Result<(), String> {
            let request = UserSettingsSaveRequest { user_key, settings };
            self.post_json("/api/user-settings/save", &request).await
        }

        async fn pull_user_settings(
            &self,
            user_key: &str,
        ) -> Result<HashMap<String, Value>, String> {
            let path = format!("/api/user-settings/load?user_key={}", user_key);
            let response = Request::get(&self.url(&path))
                .send()
                .await
                .map_err(|e| format!("Network error: {}", e))?;

            if !response.ok() {
                return Err(format!("HTTP {}: {}", response.status(), response.status_text()));
            }

            let data = response
                .json::<UserSettingsLoadResponse>()
                .await
                .map_err(|e| format!("Parse error: {}", e))?;

            if data.ok {
                Ok(data.settings)
            } else {
                Ok(HashMap::new())
            }
        }

        async fn record_ai_adjustment(&self, adjustment: &Value) -> Result<(), String> {
            let request = AiAdjustmentSaveRequest { adjustment };
            self.post_json("/api/ai/learning/save", &request).await
        }

        async fn load_ai_adjustments(&self) -> Result<Vec<Value>, String> {
            let response = Request::get(&self.url("/api/ai/learning/load"))
                .send()
                .await
                .map_err(|e| format!("Network error: {}", e))?;

            if !response.ok() {
                return Err(format!("HTTP {}: {}", response.status(), response.status_text()));
            }

            let data = response
                .json::<AiLearningLoadResponse>()
                .await
                .map_err(|e| format!("Parse error: {}", e))?;

            if data.ok {
                Ok(data.adjustments)
            } else {
                Ok(Vec::new())
            }
        }

        fn send_beacon(&self, resource: SyncResource, body: &str) -> bool {
            let window = match web_sys::window() {
                Some(w) => w,
                None => return false,
            };

            // Blob con content-type JSON, igual que el payload de fetch
            let parts = js_sys::Array::new();
            parts.push(&JsValue::from_str(body));
            let props = web_sys::BlobPropertyBag::new();
            props.set_type("application/json");

            let blob = match web_sys::Blob::new_with_str_sequence_and_options(&parts, &props) {
                Ok(b) => b,
                Err(_) => return false,
            };

            window
                .navigator()
                .send_beacon_with_opt_blob(&self.url(resource.push_path()), Some(&blob))
                .unwrap_or(false)
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::SettingsApiClient;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_values_pass_through_unchanged() {
        assert_eq!(value_to_raw(&json!("{\"margin\":5}")), "{\"margin\":5}");
        assert_eq!(value_to_raw(&json!([1, 2, 3])), "[1,2,3]");
    }

    #[test]
    fn raw_to_value_parses_json_and_keeps_plain_strings() {
        assert_eq!(raw_to_value("[1,2,3]"), json!([1, 2, 3]));
        assert_eq!(raw_to_value("no es json"), json!("no es json"));
    }
}
