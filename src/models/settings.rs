// ============================================================================
// SETTINGS MODEL - Claves monitorizadas y sub-recursos de sincronización
// ============================================================================
// El conjunto de claves es fijo: se decide al compilar y no cambia durante
// la vida de la página. Los valores son strings opacos (normalmente JSON),
// el sincronizador nunca los interpreta para transportarlos.
// ============================================================================

use serde::{Deserialize, Serialize};

/// Claves de localStorage elegibles para sincronización con la database
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonitoredKey {
    BrandingSettings,
    CompanyInfo,
    PricingStrategies,
    PriceAutomationSettings,
    AutomatedPriceRules,
    CustomDias,
    PriceAiData,
}

impl MonitoredKey {
    pub const ALL: [MonitoredKey; 7] = [
        MonitoredKey::BrandingSettings,
        MonitoredKey::CompanyInfo,
        MonitoredKey::PricingStrategies,
        MonitoredKey::PriceAutomationSettings,
        MonitoredKey::AutomatedPriceRules,
        MonitoredKey::CustomDias,
        MonitoredKey::PriceAiData,
    ];

    /// Nombre de la clave tal y como vive en localStorage
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitoredKey::BrandingSettings => "brandingSettings",
            MonitoredKey::CompanyInfo => "companyInfo",
            MonitoredKey::PricingStrategies => "pricingStrategies",
            MonitoredKey::PriceAutomationSettings => "priceAutomationSettings",
            MonitoredKey::AutomatedPriceRules => "automatedPriceRules",
            MonitoredKey::CustomDias => "customDias",
            MonitoredKey::PriceAiData => "priceAIData",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }

    /// Sub-recurso del backend que transporta esta clave
    pub fn resource(&self) -> SyncResource {
        match self {
            MonitoredKey::BrandingSettings
            | MonitoredKey::CompanyInfo
            | MonitoredKey::PricingStrategies => SyncResource::General,
            MonitoredKey::AutomatedPriceRules => SyncResource::Rules,
            MonitoredKey::PriceAutomationSettings => SyncResource::AutomationSettings,
            MonitoredKey::CustomDias | MonitoredKey::PriceAiData => SyncResource::UserSettings,
        }
    }
}

/// Sub-recursos del backend. Cada uno se envía en un request independiente:
/// el fallo de uno no bloquea ni revierte a los demás.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncResource {
    /// Settings generales (branding, empresa, estrategias de precios)
    General,
    /// Reglas de precios automatizados
    Rules,
    /// Settings de automatización de precios
    AutomationSettings,
    /// Settings por usuario (días custom, datos de AI)
    UserSettings,
}

impl SyncResource {
    pub const ALL: [SyncResource; 4] = [
        SyncResource::General,
        SyncResource::Rules,
        SyncResource::AutomationSettings,
        SyncResource::UserSettings,
    ];

    /// Claves que viajan en este sub-recurso
    pub fn keys(&self) -> &'static [MonitoredKey] {
        match self {
            SyncResource::General => &[
                MonitoredKey::BrandingSettings,
                MonitoredKey::CompanyInfo,
                MonitoredKey::PricingStrategies,
            ],
            SyncResource::Rules => &[MonitoredKey::AutomatedPriceRules],
            SyncResource::AutomationSettings => &[MonitoredKey::PriceAutomationSettings],
            SyncResource::UserSettings => &[MonitoredKey::CustomDias, MonitoredKey::PriceAiData],
        }
    }

    /// Path del endpoint de push (también usado por el beacon de unload)
    pub fn push_path(&self) -> &'static str {
        match self {
            SyncResource::General => "/api/settings/sync",
            SyncResource::Rules => "/api/price-automation/rules/save",
            SyncResource::AutomationSettings => "/api/price-automation/settings/save",
            SyncResource::UserSettings => "/api/user-settings/save",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncResource::General => "general settings",
            SyncResource::Rules => "automated price rules",
            SyncResource::AutomationSettings => "price automation settings",
            SyncResource::UserSettings => "user settings",
        }
    }
}

/// Un valor ausente, vacío o con serialización de objeto/array vacío se
/// considera "sin datos": la hidratación puede rellenarlo y el push lo omite.
pub fn is_empty_sentinel(value: &str) -> bool {
    matches!(value.trim(), "" | "{}" | "[]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_roundtrip() {
        for key in MonitoredKey::ALL {
            assert_eq!(MonitoredKey::from_name(key.as_str()), Some(key));
        }
        assert_eq!(MonitoredKey::from_name("loginData"), None);
    }

    #[test]
    fn every_key_belongs_to_exactly_one_resource() {
        for key in MonitoredKey::ALL {
            let owners = SyncResource::ALL
                .iter()
                .filter(|r| r.keys().contains(&key))
                .count();
            assert_eq!(owners, 1, "{} debe pertenecer a un único recurso", key.as_str());
            assert!(key.resource().keys().contains(&key));
        }
    }

    #[test]
    fn empty_sentinels_detected() {
        assert!(is_empty_sentinel(""));
        assert!(is_empty_sentinel("{}"));
        assert!(is_empty_sentinel("[]"));
        assert!(!is_empty_sentinel("{\"a\":1}"));
        assert!(!is_empty_sentinel("null"));
    }
}
