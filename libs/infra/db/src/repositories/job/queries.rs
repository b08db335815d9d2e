// [libs/infra/db/src/repositories/job/queries.rs]
/*!
 * =================================================================
 * APARATO: JOB STORE SQL REGISTRY (V9.3)
 * CLASIFICACIÓN: INFRASTRUCTURE SQL (ESTRATO L3)
 * RESPONSABILIDAD: SENTENCIAS ATÓMICAS DEL CICLO DE VIDA DE TRABAJOS
 *
 * Las transiciones usan guardias de estado (WHERE status = ?from) para
 * que a lo sumo una transición concurrente tenga efecto. Los reclamos
 * encapsulan el SELECT dentro del WHERE del UPDATE, convirtiendo la
 * fila en un semáforo de exclusión mutua.
 * =================================================================
 */

// --- ESTRATO DE ADMISIÓN ---

/// Sella el par (firmante, nonce); la violación de unicidad es la
/// detección de repetición del contrato.
pub const INSERT_NONCE: &str = r#"
    INSERT INTO intent_nonces (signer_public_key, nonce)
    VALUES (?1, ?2)
"#;

/// Chequeo sin efectos del paso 3 de validación.
pub const NONCE_SEEN: &str = r#"
    SELECT 1 FROM intent_nonces
    WHERE signer_public_key = ?1 AND nonce = ?2
"#;

/// Crea el trabajo en 'queued'. La colisión de huella se absorbe con
/// DO NOTHING y el llamador resuelve el trabajo preexistente (idempotencia).
pub const INSERT_JOB: &str = r#"
    INSERT INTO publish_jobs (
        job_id, record_id, canonical_body, record_hash, signer_public_key, status
    ) VALUES (?1, ?2, ?3, ?4, ?5, 'queued')
    ON CONFLICT(record_hash) DO NOTHING
"#;

pub const FIND_JOB_ID_BY_RECORD_HASH: &str = r#"
    SELECT job_id FROM publish_jobs
    WHERE record_hash = ?1
"#;

// --- ESTRATO DE CONSULTA ---

/// Recupera un trabajo por su identificador global opaco.
pub const FIND_JOB_BY_JOB_ID: &str = r#"
    SELECT
    id, job_id, record_id, canonical_body, record_hash, signer_public_key,
    status, ledger_transaction_id, error_code, error_detail,
    batch_id, batch_seq, sending_started_at, created_at, sent_at, updated_at
    FROM publish_jobs
    WHERE job_id = ?1
"#;

/// Último trabajo declarado para un registro de derechos.
pub const FIND_LATEST_JOB_BY_RECORD_ID: &str = r#"
    SELECT
    id, job_id, record_id, canonical_body, record_hash, signer_public_key,
    status, ledger_transaction_id, error_code, error_detail,
    batch_id, batch_seq, sending_started_at, created_at, sent_at, updated_at
    FROM publish_jobs
    WHERE record_id = ?1
    ORDER BY created_at DESC, id DESC
    LIMIT 1
"#;

// --- ESTRATO DE TRANSICIONES GUARDADAS ---

/// Transición genérica condicionada por el estado de origen.
pub const TRANSITION_STATUS: &str = r#"
    UPDATE publish_jobs
    SET status = ?3, updated_at = CURRENT_TIMESTAMP
    WHERE job_id = ?1 AND status = ?2
"#;

/// Sellado terminal de éxito con el identificador del ledger.
pub const MARK_SENT_FROM: &str = r#"
    UPDATE publish_jobs
    SET status = 'sent',
        ledger_transaction_id = ?2,
        sent_at = CURRENT_TIMESTAMP,
        sending_started_at = NULL,
        updated_at = CURRENT_TIMESTAMP
    WHERE job_id = ?1 AND status = ?3
"#;

/// Sellado terminal de fallo con el código taxonómico verbatim.
pub const MARK_FAILED_FROM: &str = r#"
    UPDATE publish_jobs
    SET status = 'failed',
        error_code = ?2,
        error_detail = ?3,
        sending_started_at = NULL,
        updated_at = CURRENT_TIMESTAMP
    WHERE job_id = ?1 AND status = ?4
"#;

// --- ESTRATO DE RECLAMO (WORKER SINGLE) ---

/// Reclama atómicamente el trabajo 'queued' más antiguo hacia 'processing'.
pub const CLAIM_NEXT_QUEUED: &str = r#"
    UPDATE publish_jobs
    SET status = 'processing', updated_at = CURRENT_TIMESTAMP
    WHERE id = (
        SELECT id FROM publish_jobs
        WHERE status = 'queued'
        ORDER BY created_at ASC, id ASC
        LIMIT 1
    )
    RETURNING
    id, job_id, record_id, canonical_body, record_hash, signer_public_key,
    status, ledger_transaction_id, error_code, error_detail,
    batch_id, batch_seq, sending_started_at, created_at, sent_at, updated_at
"#;

// --- ESTRATO DE LOTES (RECOLECTOR + DIFUSOR) ---

/// Candidatos al lote, por antigüedad de creación (el empate en el
/// segundo lo resuelve la llave surrogate monotónica).
pub const SELECT_QUEUED_FOR_BATCH: &str = r#"
    SELECT id, job_id FROM publish_jobs
    WHERE status = 'queued'
    ORDER BY created_at ASC, id ASC
    LIMIT ?1
"#;

/// Asigna lote y posición densa; la guardia de estado impide el doble
/// reclamo frente a recolectores concurrentes.
pub const ASSIGN_JOB_TO_BATCH: &str = r#"
    UPDATE publish_jobs
    SET status = 'processing_batch',
        batch_id = ?2,
        batch_seq = ?3,
        updated_at = CURRENT_TIMESTAMP
    WHERE id = ?1 AND status = 'queued'
"#;

pub const INSERT_BATCH: &str = r#"
    INSERT INTO anchor_batches (batch_id) VALUES (?1)
"#;

/// Reclama atómicamente el trabajo de menor posición del lote hacia
/// 'sending', sellando el instante de inicio para el TTL de recuperación.
pub const CLAIM_NEXT_IN_BATCH: &str = r#"
    UPDATE publish_jobs
    SET status = 'sending',
        sending_started_at = CURRENT_TIMESTAMP,
        updated_at = CURRENT_TIMESTAMP
    WHERE id = (
        SELECT id FROM publish_jobs
        WHERE batch_id = ?1 AND status = 'processing_batch'
        ORDER BY batch_seq ASC
        LIMIT 1
    )
    RETURNING
    id, job_id, record_id, canonical_body, record_hash, signer_public_key,
    status, ledger_transaction_id, error_code, error_detail,
    batch_id, batch_seq, sending_started_at, created_at, sent_at, updated_at
"#;

/// Lote activo más antiguo: menor instante de creación entre sus trabajos.
pub const OLDEST_ACTIVE_BATCH: &str = r#"
    SELECT batch_id FROM publish_jobs
    WHERE status IN ('processing_batch', 'sending') AND batch_id IS NOT NULL
    GROUP BY batch_id
    ORDER BY MIN(created_at) ASC, MIN(id) ASC
    LIMIT 1
"#;

pub const COUNT_ACTIVE_IN_BATCH: &str = r#"
    SELECT COUNT(*) FROM publish_jobs
    WHERE batch_id = ?1 AND status IN ('processing_batch', 'sending')
"#;

pub const COMPLETE_BATCH: &str = r#"
    UPDATE anchor_batches
    SET completed_at = CURRENT_TIMESTAMP
    WHERE batch_id = ?1 AND completed_at IS NULL
"#;

// --- ESTRATO DE RECUPERACIÓN (UNSTICK) ---

/// Única arista de retroceso de la máquina de estados: 'sending'
/// estancado más allá del TTL revierte a 'processing_batch'.
pub const UNSTICK_STALLED_SENDING: &str = r#"
    UPDATE publish_jobs
    SET status = 'processing_batch',
        sending_started_at = NULL,
        updated_at = CURRENT_TIMESTAMP
    WHERE status = 'sending'
      AND sending_started_at < datetime(CURRENT_TIMESTAMP, '-' || CAST(?1 AS TEXT) || ' seconds')
"#;

// --- ESTRATO DE DIAGNÓSTICO ---

pub const QUEUE_DEPTH_BY_STATUS: &str = r#"
    SELECT status, COUNT(*) FROM publish_jobs
    GROUP BY status
"#;
