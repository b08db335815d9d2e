// [libs/infra/db/src/repositories/signer.rs]
/*!
 * =================================================================
 * APARATO: SIGNER REGISTRY REPOSITORY (V9.1)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: REGISTRO PLANO DE FIRMANTES AUTORIZADOS
 *
 * Invariantes: la llave pública es única; las filas jamás se eliminan;
 * la transición de estado es monotónica (active -> revoked). Por ello
 * el alta usa ON CONFLICT DO NOTHING: un firmante revocado no puede
 * ser re-activado por una re-inserción.
 * =================================================================
 */

use crate::errors::DbError;
use crate::TursoClient;
use libsql::params;
use serde_json::Value;
use tracing::{info, instrument, warn};

pub struct SignerRepository {
    database_client: TursoClient,
}

impl SignerRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    /// Alta de un firmante. Retorna `false` si la llave ya estaba registrada
    /// (en cualquier estado; la fila existente no se altera).
    #[instrument(skip(self, policy))]
    pub async fn register_signer(
        &self,
        public_key_hex: &str,
        policy: Option<Value>,
    ) -> Result<bool, DbError> {
        let database_connection = self.database_client.get_connection()?;

        let policy_serialized = match policy {
            Some(blob) => Some(
                serde_json::to_string(&blob)
                    .map_err(|fault| DbError::MappingError(format!("policy blob: {}", fault)))?,
            ),
            None => None,
        };

        let inserted_rows = database_connection
            .execute(
                r#"
                INSERT INTO registered_signers (public_key_hex, status, policy_json)
                VALUES (?1, 'active', ?2)
                ON CONFLICT(public_key_hex) DO NOTHING
                "#,
                params![public_key_hex.to_lowercase(), policy_serialized],
            )
            .await?;

        if inserted_rows == 1 {
            info!("🔐 [REGISTRY]: Signer [{}…] admitted to the flat registry.", &public_key_hex[..8.min(public_key_hex.len())]);
        }
        Ok(inserted_rows == 1)
    }

    /// Revocación monotónica. Retorna `false` si no había fila activa.
    #[instrument(skip(self))]
    pub async fn revoke_signer(&self, public_key_hex: &str) -> Result<bool, DbError> {
        let database_connection = self.database_client.get_connection()?;

        let updated_rows = database_connection
            .execute(
                r#"
                UPDATE registered_signers
                SET status = 'revoked', updated_at = CURRENT_TIMESTAMP
                WHERE public_key_hex = ?1 AND status = 'active'
                "#,
                params![public_key_hex.to_lowercase()],
            )
            .await?;

        if updated_rows == 1 {
            warn!("🚫 [REGISTRY]: Signer [{}…] revoked.", &public_key_hex[..8.min(public_key_hex.len())]);
        }
        Ok(updated_rows == 1)
    }

    /// Paso 6 del contrato de admisión: el firmante existe y está activo.
    pub async fn is_active_signer(&self, public_key_hex: &str) -> Result<bool, DbError> {
        let database_connection = self.database_client.get_connection()?;

        let mut query_results = database_connection
            .query(
                "SELECT 1 FROM registered_signers WHERE public_key_hex = ?1 AND status = 'active'",
                params![public_key_hex.to_lowercase()],
            )
            .await?;

        Ok(query_results.next().await?.is_some())
    }
}
