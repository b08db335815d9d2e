// [libs/domain/models/src/audit.rs]
// =================================================================
// APARATO: AUDIT TRAIL CONTRACTS (V8.0)
// RESPONSABILIDAD: RASTRO DE AUDITORÍA APPEND-ONLY
// =================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Evento inmutable del rastro de auditoría.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: i64,
    /// Clase de evento ("PUBLISH_INTENT", "POOL_SPLIT", ...).
    pub event_type: String,
    /// Llave pública del actor, o "SYSTEM" para daemons internos.
    pub actor_public_key: String,
    pub resource_type: String,
    pub resource_id: String,
    /// Acción puntual ("submit", "sent", "failed", "split", ...).
    pub action: String,
    pub details: Value,
    pub created_at: String,
}

/// Material de inserción de un evento (el Ledger asigna id y timestamp).
#[derive(Debug, Clone)]
pub struct AuditEventDraft {
    pub event_type: String,
    pub actor_public_key: String,
    pub resource_type: String,
    pub resource_id: String,
    pub action: String,
    pub details: Value,
}
