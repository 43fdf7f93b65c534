// ============================================================================
// SYNC MODEL - Estados y resultados de la sincronización
// ============================================================================

use serde::{Deserialize, Serialize};

/// Fase observable del sincronizador
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncPhase {
    /// Sin actividad pendiente
    Idle,
    /// Hay un sync debounced programado tras una escritura
    DebouncePending,
    /// Transacción de sincronización en curso (single-flight)
    InFlight,
    /// Último sync exitoso reciente: las escrituras no re-programan
    Cooldown,
}

/// Decisión del Change Observer tras una escritura monitorizada
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// Programar un sync debounced
    Schedule,
    /// No programar: sin cambios, clave no monitorizada, o el barrido
    /// periódico lo recogerá
    Skip,
}

/// Resultado de una transacción de push
#[derive(Clone, Debug, PartialEq)]
pub enum PushOutcome {
    /// Al menos un sub-recurso fue enviado
    Saved {
        resources_ok: usize,
        resources_failed: usize,
    },
    /// Payload idéntico al último snapshot enviado: cero requests
    NoChanges,
    /// Ninguna clave monitorizada tiene valor: nada que enviar
    Empty,
    /// Otra transacción en curso: se salta (no se encola)
    Busy,
}

impl PushOutcome {
    /// True si todo lo que había que enviar fue confirmado por el backend
    pub fn is_full_success(&self) -> bool {
        matches!(
            self,
            PushOutcome::Saved { resources_failed: 0, .. } | PushOutcome::NoChanges
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_is_not_full_success() {
        let outcome = PushOutcome::Saved { resources_ok: 1, resources_failed: 1 };
        assert!(!outcome.is_full_success());
        assert!(PushOutcome::Saved { resources_ok: 2, resources_failed: 0 }.is_full_success());
        assert!(PushOutcome::NoChanges.is_full_success());
        assert!(!PushOutcome::Busy.is_full_success());
    }
}
