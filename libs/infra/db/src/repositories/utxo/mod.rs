// [libs/infra/db/src/repositories/utxo/mod.rs]
/*!
 * =================================================================
 * APARATO: UTXO POOL REPOSITORY (V9.4)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: MOTOR DE RESERVA ATÓMICA DEL INVENTARIO DE ENTRADAS
 *
 * Invariante de reserva: cada llamador concurrente de reserve() obtiene
 * un identificador distinto o ninguno; ninguna fila es observada por dos
 * llamadores en la ventana available -> reserved.
 * =================================================================
 */

pub mod queries;

use crate::errors::DbError;
use crate::TursoClient;
use libsql::{params, Row};
use soundledger_domain_models::utxo::{PoolDepthSnapshot, ReservedUtxo, UtxoPurpose};
use tracing::{debug, info, instrument, warn};

use self::queries as sql_registry;

/// Repositorio de autoridad única sobre el pool de entradas de uso único.
pub struct UtxoRepository {
    database_client: TursoClient,
}

impl UtxoRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    // --- ESTRATO DE RESERVA ---

    /**
     * Reserva atómica de una entrada publish: barrido de arrendamientos
     * vencidos más reclamo smallest-first, en una única transacción.
     *
     * Retorna `None` si el pool está agotado (NoCapacity aguas arriba).
     */
    #[instrument(skip(self))]
    pub async fn reserve(&self, lease_duration_seconds: i64) -> Result<Option<ReservedUtxo>, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let database_transaction = database_connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        // 1. BARRIDO: arrendamientos vencidos regresan al pool.
        let swept_rows = database_transaction
            .execute(sql_registry::SWEEP_EXPIRED_LEASES, ())
            .await?;
        if swept_rows > 0 {
            debug!("🧹 [POOL_SWEEP]: Reclaimed {} expired lease(s).", swept_rows);
        }

        // 2. RECLAMO ATÓMICO: la fila retorna ya actualizada.
        let mut claimed_rows = database_transaction
            .query(sql_registry::RESERVE_PUBLISH_INPUT, params![lease_duration_seconds])
            .await?;

        let reserved_input = match claimed_rows.next().await? {
            Some(data_row) => Some(map_row_to_reserved_utxo(data_row)?),
            None => None,
        };
        drop(claimed_rows);

        database_transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;

        if reserved_input.is_none() {
            warn!("⚠️ [POOL_EXHAUSTED]: No publish inputs available for reservation.");
        }
        Ok(reserved_input)
    }

    /// Reserva la entrada funding/change más grande por encima del umbral
    /// (ruta del reponedor). Mismo semáforo atómico que `reserve`.
    #[instrument(skip(self))]
    pub async fn reserve_largest_funding(
        &self,
        lease_duration_seconds: i64,
        minimum_satoshis: i64,
    ) -> Result<Option<ReservedUtxo>, DbError> {
        let database_connection = self.database_client.get_connection()?;

        let mut claimed_rows = database_connection
            .query(
                sql_registry::RESERVE_LARGEST_FUNDING_INPUT,
                params![lease_duration_seconds, minimum_satoshis],
            )
            .await?;

        match claimed_rows.next().await? {
            Some(data_row) => Ok(Some(map_row_to_reserved_utxo(data_row)?)),
            None => Ok(None),
        }
    }

    // --- ESTRATO DE SELLADO ---

    /**
     * Sellado irreversible de gasto. Si la fila ya no estaba reservada
     * (arrendamiento expirado y tomado por otro worker) la inconsistencia
     * se detecta, se registra y se reporta.
     */
    #[instrument(skip(self))]
    pub async fn mark_spent(&self, utxo_id: i64, ledger_transaction_id: &str) -> Result<bool, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let updated_rows = database_connection
            .execute(sql_registry::MARK_SPENT, params![utxo_id, ledger_transaction_id])
            .await?;

        if updated_rows != 1 {
            warn!(
                "🛑 [POOL_DRIFT]: mark_spent on utxo [{}] had no effect; lease was likely reclaimed.",
                utxo_id
            );
        }
        Ok(updated_rows == 1)
    }

    /// Liberación por fallo transitorio (no aplicable al conflicto de mempool).
    pub async fn release(&self, utxo_id: i64) -> Result<(), DbError> {
        let database_connection = self.database_client.get_connection()?;
        database_connection
            .execute(sql_registry::RELEASE_INPUT, params![utxo_id])
            .await?;
        Ok(())
    }

    /// Marca la entrada como sucia tras un conflicto de mempool: queda
    /// fuera de selección hasta la reconciliación externa.
    pub async fn mark_dirty(&self, utxo_id: i64) -> Result<(), DbError> {
        let database_connection = self.database_client.get_connection()?;
        database_connection
            .execute(sql_registry::MARK_DIRTY, params![utxo_id])
            .await?;
        info!("🧪 [POOL_QUARANTINE]: Utxo [{}] flagged dirty pending reconciliation.", utxo_id);
        Ok(())
    }

    // --- ESTRATO DE INGESTA ---

    /// Ingesta idempotente de una salida externa. Retorna si insertó.
    pub async fn insert_external_output(
        &self,
        txid: &str,
        vout: u32,
        satoshis: i64,
        locking_script_hex: &str,
        address: &str,
        purpose: UtxoPurpose,
    ) -> Result<bool, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let inserted_rows = database_connection
            .execute(
                sql_registry::INSERT_EXTERNAL_OUTPUT,
                params![
                    txid.to_lowercase(),
                    i64::from(vout),
                    satoshis,
                    locking_script_hex,
                    address,
                    purpose.as_str()
                ],
            )
            .await?;
        Ok(inserted_rows == 1)
    }

    /**
     * Registra el resultado de una fragmentación en una única transacción:
     * sella la entrada fuente como gastada e inserta las K salidas
     * unitarias más la salida de cambio.
     */
    #[instrument(skip(self, unit_locking_script_hex, change_locking_script_hex))]
    #[allow(clippy::too_many_arguments)]
    pub async fn register_split_outputs(
        &self,
        source_utxo_id: i64,
        split_transaction_id: &str,
        unit_output_count: u32,
        unit_value_satoshis: i64,
        unit_locking_script_hex: &str,
        pool_address: &str,
        change_vout: u32,
        change_satoshis: i64,
        change_locking_script_hex: &str,
        change_address: &str,
    ) -> Result<(), DbError> {
        let database_connection = self.database_client.get_connection()?;
        let database_transaction = database_connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        let sealed_rows = database_transaction
            .execute(
                sql_registry::MARK_SPENT,
                params![source_utxo_id, split_transaction_id],
            )
            .await?;
        if sealed_rows != 1 {
            return Err(DbError::InvalidState(format!(
                "split source utxo [{}] was not reserved",
                source_utxo_id
            )));
        }

        for unit_vout in 0..unit_output_count {
            database_transaction
                .execute(
                    sql_registry::INSERT_EXTERNAL_OUTPUT,
                    params![
                        split_transaction_id.to_lowercase(),
                        i64::from(unit_vout),
                        unit_value_satoshis,
                        unit_locking_script_hex,
                        pool_address,
                        UtxoPurpose::Publish.as_str()
                    ],
                )
                .await?;
        }

        database_transaction
            .execute(
                sql_registry::INSERT_EXTERNAL_OUTPUT,
                params![
                    split_transaction_id.to_lowercase(),
                    i64::from(change_vout),
                    change_satoshis,
                    change_locking_script_hex,
                    change_address,
                    UtxoPurpose::Change.as_str()
                ],
            )
            .await?;

        database_transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;

        info!(
            "🌱 [POOL_REPLENISH]: Split [{}] registered {} unit outputs plus change.",
            split_transaction_id, unit_output_count
        );
        Ok(())
    }

    // --- ESTRATO DE DIAGNÓSTICO ---

    /// Instantánea de profundidad del pool.
    pub async fn depth_snapshot(&self, unit_value_satoshis: i64) -> Result<PoolDepthSnapshot, DbError> {
        let database_connection = self.database_client.get_connection()?;

        let mut unit_rows = database_connection
            .query(
                sql_registry::COUNT_AVAILABLE_PUBLISH_UNITS,
                params![unit_value_satoshis],
            )
            .await?;
        let available_publish_count = unit_rows
            .next()
            .await?
            .map(|data_row| data_row.get::<i64>(0))
            .transpose()?
            .unwrap_or(0);

        let mut depth_rows = database_connection
            .query(sql_registry::DEPTH_BY_STATUS, ())
            .await?;
        let (reserved_count, spent_count, dirty_count) = match depth_rows.next().await? {
            Some(data_row) => (
                data_row.get::<i64>(0).unwrap_or(0),
                data_row.get::<i64>(1).unwrap_or(0),
                data_row.get::<i64>(2).unwrap_or(0),
            ),
            None => (0, 0, 0),
        };

        Ok(PoolDepthSnapshot {
            available_publish_count,
            reserved_count,
            dirty_count,
            spent_count,
        })
    }

    /// Filas selladas por un identificador de transacción del ledger (P8).
    pub async fn find_by_spending_transaction(
        &self,
        ledger_transaction_id: &str,
    ) -> Result<Vec<ReservedUtxo>, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let mut query_results = database_connection
            .query(
                sql_registry::FIND_BY_SPENDING_TRANSACTION,
                params![ledger_transaction_id],
            )
            .await?;

        let mut spent_rows = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            spent_rows.push(map_row_to_reserved_utxo(data_row)?);
        }
        Ok(spent_rows)
    }
}

fn map_row_to_reserved_utxo(data_row: Row) -> Result<ReservedUtxo, DbError> {
    Ok(ReservedUtxo {
        id: data_row.get::<i64>(0)?,
        txid: data_row.get::<String>(1)?,
        vout: data_row.get::<i64>(2)? as u32,
        satoshis: data_row.get::<i64>(3)?,
        locking_script_hex: data_row.get::<String>(4)?,
    })
}
