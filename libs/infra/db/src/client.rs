// [libs/infra/db/src/client.rs]
/*!
 * =================================================================
 * APARATO: DATABASE CONNECTION CLIENT (V9.1)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES Y BOOTSTRAP DE ESQUEMA
 *
 * En modo RAM (tests) el cliente detecta URLs de memoria y sostiene un
 * ancla de conexión ANTES del bootstrap, de modo que el esquema resida
 * en un segmento de memoria compartido visible entre hilos.
 * =================================================================
 */

use crate::errors::DbError;
use crate::schema::apply_full_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Clone)]
pub struct TursoClient {
    internal_database_driver: Arc<Database>,
    /// Mantiene viva la base en modo memoria evitando que SQLite la purgue.
    _memory_persistence_anchor: Option<Arc<Connection>>,
}

impl TursoClient {
    #[instrument(skip(database_access_token))]
    pub async fn connect(
        database_connection_url: &str,
        database_access_token: Option<String>,
    ) -> Result<Self, DbError> {
        if database_connection_url.is_empty() {
            return Err(DbError::ConfigurationError("DATABASE_URL_UNDEFINED".into()));
        }

        info!("🔌 [DATABASE]: Initiating tactical link to [{}]", database_connection_url);

        let is_remote = database_connection_url.starts_with("libsql://")
            || database_connection_url.starts_with("https://");

        let is_memory = database_connection_url.contains(":memory:")
            || database_connection_url.contains("mode=memory");

        let database_driver = if is_remote {
            let token = database_access_token.ok_or_else(|| {
                DbError::ConfigurationError("Remote access denied (auth token missing)".into())
            })?;
            Builder::new_remote(database_connection_url.to_string(), token)
                .build()
                .await
        } else {
            Builder::new_local(database_connection_url).build().await
        }
        .map_err(|fault| DbError::ConnectionError(format!("DRIVER_IGNITION_FAILURE: {}", fault)))?;

        let shared_driver = Arc::new(database_driver);
        let mut anchor = None;

        if is_memory {
            // El ancla debe abrirse antes de cualquier otra operación.
            let anchor_connection = shared_driver
                .connect()
                .map_err(|fault| DbError::ConnectionError(format!("ANCHOR_FAULT: {}", fault)))?;

            apply_full_schema(&anchor_connection)
                .await
                .map_err(|fault| DbError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {}", fault)))?;

            anchor = Some(Arc::new(anchor_connection));
            info!("⚓ [DATABASE]: Memory strata solidified and anchored.");
        } else {
            let bootstrap_connection = shared_driver
                .connect()
                .map_err(|fault| DbError::ConnectionError(format!("BOOTSTRAP_LINK_FAULT: {}", fault)))?;
            apply_full_schema(&bootstrap_connection)
                .await
                .map_err(|fault| DbError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {}", fault)))?;
        }

        Ok(Self {
            internal_database_driver: shared_driver,
            _memory_persistence_anchor: anchor,
        })
    }

    pub fn get_connection(&self) -> Result<Connection, DbError> {
        self.internal_database_driver.connect().map_err(|fault| {
            error!("⚠️ [POOL_FAULT]: Connection allocation failed: {}", fault);
            DbError::ConnectionError(fault.to_string())
        })
    }

    /// Sonda de vida: el almacén responde una consulta trivial.
    pub async fn ping(&self) -> Result<(), DbError> {
        let connection = self.get_connection()?;
        connection.query("SELECT 1", ()).await?;
        Ok(())
    }
}
