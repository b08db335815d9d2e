// [libs/infra/db/src/repositories/audit.rs]
/*!
 * =================================================================
 * APARATO: AUDIT TRAIL REPOSITORY (V9.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: RASTRO APPEND-ONLY DE EVENTOS DEL SERVICIO
 *
 * Invariante: los eventos jamás se mutan ni se eliminan.
 * =================================================================
 */

use crate::errors::DbError;
use crate::TursoClient;
use libsql::{params, Row};
use serde_json::Value;
use soundledger_domain_models::audit::{AuditEvent, AuditEventDraft};
use tracing::instrument;

pub struct AuditRepository {
    database_client: TursoClient,
}

impl AuditRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    /// Anexa un evento al rastro.
    #[instrument(skip(self, draft), fields(event = %draft.event_type, action = %draft.action))]
    pub async fn append(&self, draft: AuditEventDraft) -> Result<(), DbError> {
        let database_connection = self.database_client.get_connection()?;

        let details_serialized = serde_json::to_string(&draft.details)
            .map_err(|fault| DbError::MappingError(format!("audit details: {}", fault)))?;

        database_connection
            .execute(
                r#"
                INSERT INTO audit_events (
                    event_type, actor_public_key, resource_type, resource_id, action, details_json
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    draft.event_type,
                    draft.actor_public_key,
                    draft.resource_type,
                    draft.resource_id,
                    draft.action,
                    details_serialized
                ],
            )
            .await?;
        Ok(())
    }

    /// Rastro de un recurso, del evento más reciente al más antiguo.
    pub async fn trail_for_resource(
        &self,
        resource_id: &str,
        limit: i64,
    ) -> Result<Vec<AuditEvent>, DbError> {
        let database_connection = self.database_client.get_connection()?;

        let mut query_results = database_connection
            .query(
                r#"
                SELECT id, event_type, actor_public_key, resource_type, resource_id,
                       action, details_json, created_at
                FROM audit_events
                WHERE resource_id = ?1
                ORDER BY created_at DESC, id DESC
                LIMIT ?2
                "#,
                params![resource_id, limit],
            )
            .await?;

        let mut trail = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            trail.push(map_row_to_audit_event(data_row)?);
        }
        Ok(trail)
    }
}

fn map_row_to_audit_event(data_row: Row) -> Result<AuditEvent, DbError> {
    let details_raw: Option<String> = data_row.get::<String>(6).ok();
    let details: Value = match details_raw {
        Some(serialized) => serde_json::from_str(&serialized)
            .map_err(|fault| DbError::MappingError(format!("audit details: {}", fault)))?,
        None => Value::Null,
    };

    Ok(AuditEvent {
        id: data_row.get::<i64>(0)?,
        event_type: data_row.get::<String>(1)?,
        actor_public_key: data_row.get::<String>(2)?,
        resource_type: data_row.get::<String>(3)?,
        resource_id: data_row.get::<String>(4)?,
        action: data_row.get::<String>(5)?,
        details,
        created_at: data_row.get::<String>(7)?,
    })
}
