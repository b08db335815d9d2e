// [libs/infra/db/src/repositories/job/mod.rs]
/*!
 * =================================================================
 * APARATO: JOB STORE REPOSITORY (V9.4)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN TRANSACCIONAL DEL CICLO DE VIDA DE TRABAJOS
 *
 * La admisión (nonce + trabajo + auditoría) ejecuta en una única
 * transacción; todas las escrituras de estado pasan por guardias
 * condicionadas que materializan la máquina de estados del contrato.
 * =================================================================
 */

pub mod queries;

use crate::errors::DbError;
use crate::TursoClient;
use libsql::{params, Row};
use soundledger_domain_models::batch::ClaimedBatchJob;
use soundledger_domain_models::errors::ErrorCode;
use soundledger_domain_models::job::{AdmissionOutcome, JobStatus, PublishJob};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use self::queries as sql_registry;

/// Material de entrada de una admisión certificada.
#[derive(Debug, Clone)]
pub struct AdmissionDraft {
    pub record_id: String,
    pub canonical_body: String,
    pub record_hash: String,
    pub signer_public_key: String,
    pub nonce: String,
}

/// Repositorio de autoridad única sobre los trabajos de publicación.
pub struct JobRepository {
    database_client: TursoClient,
}

impl JobRepository {
    pub fn new(client: TursoClient) -> Self {
        Self {
            database_client: client,
        }
    }

    // --- ESTRATO DE ADMISIÓN ---

    /// Chequeo sin efectos del paso 3: ¿el par (firmante, nonce) ya fue visto?
    pub async fn nonce_seen(&self, signer_public_key: &str, nonce: &str) -> Result<bool, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let mut query_results = database_connection
            .query(sql_registry::NONCE_SEEN, params![signer_public_key, nonce])
            .await?;
        Ok(query_results.next().await?.is_some())
    }

    /**
     * Admisión transaccional: sella el nonce, crea el trabajo y anexa el
     * evento de auditoría en una única frontera atómica.
     *
     * # Errors:
     * - `DbError::NonceReplay`: el par (firmante, nonce) ya existe.
     * - `DbError::TransactionError`: colapso de la secuencia atómica.
     */
    #[instrument(skip(self, draft), fields(record = %draft.record_id))]
    pub async fn admit(&self, draft: AdmissionDraft) -> Result<AdmissionOutcome, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let database_transaction = database_connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        // 1. SELLADO DEL NONCE: la violación de unicidad es la repetición.
        if let Err(insert_fault) = database_transaction
            .execute(
                sql_registry::INSERT_NONCE,
                params![draft.signer_public_key.clone(), draft.nonce.clone()],
            )
            .await
        {
            if DbError::is_unique_violation(&insert_fault) {
                return Err(DbError::NonceReplay);
            }
            return Err(DbError::QueryError(insert_fault));
        }

        // 2. CREACIÓN DEL TRABAJO: la colisión de huella colapsa en el
        //    trabajo preexistente (idempotencia del contrato).
        let fresh_job_id = Uuid::new_v4().to_string();
        let inserted_rows = database_transaction
            .execute(
                sql_registry::INSERT_JOB,
                params![
                    fresh_job_id.clone(),
                    draft.record_id.clone(),
                    draft.canonical_body.clone(),
                    draft.record_hash.clone(),
                    draft.signer_public_key.clone()
                ],
            )
            .await?;

        let (admitted_job_id, duplicate_record) = if inserted_rows == 1 {
            (fresh_job_id, false)
        } else {
            let mut existing_rows = database_transaction
                .query(
                    sql_registry::FIND_JOB_ID_BY_RECORD_HASH,
                    params![draft.record_hash.clone()],
                )
                .await?;
            let existing_row = existing_rows
                .next()
                .await?
                .ok_or_else(|| DbError::MappingError("record hash collision without row".into()))?;
            (existing_row.get::<String>(0)?, true)
        };

        // 3. RASTRO DE AUDITORÍA DE LA ADMISIÓN.
        let audit_details = serde_json::json!({
            "recordHash": draft.record_hash,
            "duplicateRecord": duplicate_record,
        })
        .to_string();
        database_transaction
            .execute(
                r#"
                INSERT INTO audit_events (
                    event_type, actor_public_key, resource_type, resource_id, action, details_json
                ) VALUES ('PUBLISH_INTENT', ?1, 'publish_job', ?2, 'submit', ?3)
                "#,
                params![draft.signer_public_key.clone(), admitted_job_id.clone(), audit_details],
            )
            .await?;

        database_transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;

        info!(
            "📥 [ADMISSION]: Record [{}] anchored as job [{}] (duplicate: {}).",
            draft.record_id, admitted_job_id, duplicate_record
        );

        Ok(AdmissionOutcome {
            job_id: admitted_job_id,
            duplicate_record,
        })
    }

    // --- ESTRATO DE CONSULTA ---

    pub async fn find_by_job_id(&self, job_id: &str) -> Result<Option<PublishJob>, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let mut query_results = database_connection
            .query(sql_registry::FIND_JOB_BY_JOB_ID, params![job_id])
            .await?;

        match query_results.next().await? {
            Some(data_row) => Ok(Some(map_row_to_publish_job(data_row)?)),
            None => Ok(None),
        }
    }

    pub async fn find_latest_by_record_id(
        &self,
        record_id: &str,
    ) -> Result<Option<PublishJob>, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let mut query_results = database_connection
            .query(sql_registry::FIND_LATEST_JOB_BY_RECORD_ID, params![record_id])
            .await?;

        match query_results.next().await? {
            Some(data_row) => Ok(Some(map_row_to_publish_job(data_row)?)),
            None => Ok(None),
        }
    }

    // --- ESTRATO DE TRANSICIONES GUARDADAS ---

    /// Transición condicionada `from -> to`. Retorna si tuvo efecto.
    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        job_id: &str,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<bool, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let updated_rows = database_connection
            .execute(
                sql_registry::TRANSITION_STATUS,
                params![job_id, from.as_str(), to.as_str()],
            )
            .await?;
        Ok(updated_rows == 1)
    }

    /// Sellado terminal de éxito desde el estado declarado.
    pub async fn mark_sent(
        &self,
        job_id: &str,
        from: JobStatus,
        ledger_transaction_id: &str,
    ) -> Result<bool, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let updated_rows = database_connection
            .execute(
                sql_registry::MARK_SENT_FROM,
                params![job_id, ledger_transaction_id, from.as_str()],
            )
            .await?;
        if updated_rows != 1 {
            warn!(
                "⚠️ [JOB_STORE]: mark_sent on [{}] from '{}' had no effect (state drift).",
                job_id,
                from.as_str()
            );
        }
        Ok(updated_rows == 1)
    }

    /// Sellado terminal de fallo con el código taxonómico verbatim.
    pub async fn mark_failed(
        &self,
        job_id: &str,
        from: JobStatus,
        error_code: ErrorCode,
        error_detail: &str,
    ) -> Result<bool, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let updated_rows = database_connection
            .execute(
                sql_registry::MARK_FAILED_FROM,
                params![job_id, error_code.as_str(), error_detail, from.as_str()],
            )
            .await?;
        if updated_rows != 1 {
            warn!(
                "⚠️ [JOB_STORE]: mark_failed on [{}] from '{}' had no effect (state drift).",
                job_id,
                from.as_str()
            );
        }
        Ok(updated_rows == 1)
    }

    // --- ESTRATO DE RECLAMO (WORKER SINGLE) ---

    /// Reclama el trabajo 'queued' más antiguo hacia 'processing'.
    pub async fn claim_next_queued(&self) -> Result<Option<PublishJob>, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let mut updated_rows = database_connection
            .query(sql_registry::CLAIM_NEXT_QUEUED, ())
            .await?;

        match updated_rows.next().await? {
            Some(data_row) => Ok(Some(map_row_to_publish_job(data_row)?)),
            None => Ok(None),
        }
    }

    // --- ESTRATO DE LOTES ---

    /**
     * Reclama hasta `max_batch_size` trabajos 'queued' hacia un lote
     * fresco con posiciones densas 1..k por antigüedad de creación.
     *
     * La guardia de estado por fila permite recolectores concurrentes
     * sin doble reclamo; la densidad se preserva asignando la posición
     * solo a los reclamos con efecto.
     */
    #[instrument(skip(self))]
    pub async fn claim_queued_batch(
        &self,
        max_batch_size: i64,
    ) -> Result<Option<(String, Vec<ClaimedBatchJob>)>, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let database_transaction = database_connection
            .transaction()
            .await
            .map_err(|_| DbError::TransactionError)?;

        let mut candidate_rows = database_transaction
            .query(sql_registry::SELECT_QUEUED_FOR_BATCH, params![max_batch_size])
            .await?;

        let mut candidates: Vec<(i64, String)> = Vec::new();
        while let Some(data_row) = candidate_rows.next().await? {
            candidates.push((data_row.get::<i64>(0)?, data_row.get::<String>(1)?));
        }
        drop(candidate_rows);

        if candidates.is_empty() {
            return Ok(None);
        }

        let batch_id = Uuid::new_v4().to_string();
        let mut claimed_jobs: Vec<ClaimedBatchJob> = Vec::with_capacity(candidates.len());
        let mut next_sequence: i64 = 1;

        for (surrogate_id, job_id) in candidates {
            let claimed_rows = database_transaction
                .execute(
                    sql_registry::ASSIGN_JOB_TO_BATCH,
                    params![surrogate_id, batch_id.clone(), next_sequence],
                )
                .await?;

            if claimed_rows == 1 {
                claimed_jobs.push(ClaimedBatchJob {
                    id: surrogate_id,
                    job_id,
                    batch_seq: next_sequence,
                });
                next_sequence += 1;
            }
        }

        if claimed_jobs.is_empty() {
            // Otro recolector ganó todas las filas candidatas.
            return Ok(None);
        }

        database_transaction
            .execute(sql_registry::INSERT_BATCH, params![batch_id.clone()])
            .await?;

        database_transaction
            .commit()
            .await
            .map_err(|_| DbError::TransactionError)?;

        info!(
            "📦 [COLLECTOR]: Batch [{}] formed with {} jobs (seq 1..{}).",
            batch_id,
            claimed_jobs.len(),
            claimed_jobs.len()
        );
        Ok(Some((batch_id, claimed_jobs)))
    }

    /// Reclama el trabajo de menor posición del lote hacia 'sending'.
    pub async fn claim_next_in_batch(&self, batch_id: &str) -> Result<Option<PublishJob>, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let mut updated_rows = database_connection
            .query(sql_registry::CLAIM_NEXT_IN_BATCH, params![batch_id])
            .await?;

        match updated_rows.next().await? {
            Some(data_row) => Ok(Some(map_row_to_publish_job(data_row)?)),
            None => Ok(None),
        }
    }

    /// Lote activo más antiguo (menor instante de creación entre sus trabajos).
    pub async fn oldest_active_batch(&self) -> Result<Option<String>, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let mut query_results = database_connection
            .query(sql_registry::OLDEST_ACTIVE_BATCH, ())
            .await?;

        Ok(match query_results.next().await? {
            Some(data_row) => Some(data_row.get::<String>(0)?),
            None => None,
        })
    }

    /// Sella el lote como completado si ya no tiene trabajos activos.
    pub async fn complete_batch_if_drained(&self, batch_id: &str) -> Result<bool, DbError> {
        let database_connection = self.database_client.get_connection()?;

        let mut count_rows = database_connection
            .query(sql_registry::COUNT_ACTIVE_IN_BATCH, params![batch_id])
            .await?;
        let active_count = count_rows
            .next()
            .await?
            .map(|data_row| data_row.get::<i64>(0))
            .transpose()?
            .unwrap_or(0);

        if active_count > 0 {
            return Ok(false);
        }

        let updated_rows = database_connection
            .execute(sql_registry::COMPLETE_BATCH, params![batch_id])
            .await?;
        if updated_rows == 1 {
            debug!("🏁 [BROADCASTER]: Batch [{}] drained and sealed.", batch_id);
        }
        Ok(updated_rows == 1)
    }

    // --- ESTRATO DE RECUPERACIÓN ---

    /// Revierte los 'sending' estancados más allá del TTL. Retorna cuántos.
    #[instrument(skip(self))]
    pub async fn unstick_stalled_sending(&self, sending_ttl_seconds: i64) -> Result<u64, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let reverted_rows = database_connection
            .execute(sql_registry::UNSTICK_STALLED_SENDING, params![sending_ttl_seconds])
            .await?;

        if reverted_rows > 0 {
            warn!(
                "♻️  [UNSTICK]: Reverted {} stalled sending job(s) to processing_batch.",
                reverted_rows
            );
        }
        Ok(reverted_rows)
    }

    // --- ESTRATO DE DIAGNÓSTICO ---

    /// Profundidad de cola por estado, para el panel de diagnóstico.
    pub async fn queue_depth_by_status(&self) -> Result<Vec<(String, i64)>, DbError> {
        let database_connection = self.database_client.get_connection()?;
        let mut query_results = database_connection
            .query(sql_registry::QUEUE_DEPTH_BY_STATUS, ())
            .await?;

        let mut depth = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            depth.push((data_row.get::<String>(0)?, data_row.get::<i64>(1)?));
        }
        Ok(depth)
    }
}

/// Mapeo nominal fila -> contrato de dominio.
fn map_row_to_publish_job(data_row: Row) -> Result<PublishJob, DbError> {
    let status_label: String = data_row.get::<String>(6)?;
    let status = JobStatus::parse(&status_label)
        .ok_or_else(|| DbError::MappingError(format!("unknown job status '{}'", status_label)))?;

    Ok(PublishJob {
        id: data_row.get::<i64>(0)?,
        job_id: data_row.get::<String>(1)?,
        record_id: data_row.get::<String>(2)?,
        canonical_body: data_row.get::<String>(3)?,
        record_hash: data_row.get::<String>(4)?,
        signer_public_key: data_row.get::<String>(5)?,
        status,
        ledger_transaction_id: data_row.get::<String>(7).ok(),
        error_code: data_row.get::<String>(8).ok(),
        error_detail: data_row.get::<String>(9).ok(),
        batch_id: data_row.get::<String>(10).ok(),
        batch_seq: data_row.get::<i64>(11).ok(),
        sending_started_at: data_row.get::<String>(12).ok(),
        created_at: data_row.get::<String>(13)?,
        sent_at: data_row.get::<String>(14).ok(),
        updated_at: data_row.get::<String>(15)?,
    })
}
