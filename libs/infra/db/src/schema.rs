// [libs/infra/db/src/schema.rs]
/**
 * =================================================================
 * APARATO: ANCHOR DATABASE SCHEMA (V9.2)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * Tres estratos idempotentes: génesis de tablas, mutaciones de columna
 * (migraciones en caliente) e índices de aceleración, incluidos los
 * índices parciales del barrido de arrendamientos y del drenado de lotes.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

/**
 * ESTRATO 1: SOLIDIFICACIÓN (Génesis de Tablas)
 */
const TACTICAL_TABLES: &[(&str, &str)] = &[
    ("TABLE_REGISTERED_SIGNERS", r#"
        CREATE TABLE IF NOT EXISTS registered_signers (
            public_key_hex TEXT PRIMARY KEY,
            status TEXT NOT NULL DEFAULT 'active',
            registered_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_INTENT_NONCES", r#"
        CREATE TABLE IF NOT EXISTS intent_nonces (
            signer_public_key TEXT NOT NULL,
            nonce TEXT NOT NULL,
            seen_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (signer_public_key, nonce)
        );
    "#),
    ("TABLE_PUBLISH_JOBS", r#"
        CREATE TABLE IF NOT EXISTS publish_jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id TEXT NOT NULL UNIQUE,
            record_id TEXT NOT NULL,
            canonical_body TEXT NOT NULL,
            record_hash TEXT NOT NULL UNIQUE,
            signer_public_key TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'queued',
            ledger_transaction_id TEXT,
            error_code TEXT,
            error_detail TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            sent_at DATETIME,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_UTXO_POOL", r#"
        CREATE TABLE IF NOT EXISTS utxo_pool (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            txid TEXT NOT NULL,
            vout INTEGER NOT NULL,
            satoshis INTEGER NOT NULL,
            locking_script_hex TEXT NOT NULL,
            address TEXT NOT NULL,
            purpose TEXT NOT NULL DEFAULT 'publish',
            status TEXT NOT NULL DEFAULT 'available',
            reserved_at DATETIME,
            reserved_until DATETIME,
            spent_at DATETIME,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (txid, vout)
        );
    "#),
    ("TABLE_ANCHOR_BATCHES", r#"
        CREATE TABLE IF NOT EXISTS anchor_batches (
            batch_id TEXT PRIMARY KEY,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            completed_at DATETIME
        );
    "#),
    ("TABLE_AUDIT_EVENTS", r#"
        CREATE TABLE IF NOT EXISTS audit_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_type TEXT NOT NULL,
            actor_public_key TEXT NOT NULL,
            resource_type TEXT NOT NULL,
            resource_id TEXT NOT NULL,
            action TEXT NOT NULL,
            details_json TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
];

/**
 * ESTRATO 2: EVOLUCIÓN (Mutaciones de Columna)
 * Columnas incorporadas después del génesis original.
 */
const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[
    // --- MODO LOTE (Recolector + Difusor) ---
    ("JOB_BATCH_ID", "ALTER TABLE publish_jobs ADD COLUMN batch_id TEXT"),
    ("JOB_BATCH_SEQ", "ALTER TABLE publish_jobs ADD COLUMN batch_seq INTEGER"),
    ("JOB_SENDING_STARTED", "ALTER TABLE publish_jobs ADD COLUMN sending_started_at DATETIME"),

    // --- RECONCILIACIÓN DE POOL ---
    ("UTXO_DIRTY", "ALTER TABLE utxo_pool ADD COLUMN dirty INTEGER NOT NULL DEFAULT 0"),
    ("UTXO_SPENT_BY", "ALTER TABLE utxo_pool ADD COLUMN spent_by_transaction_id TEXT"),

    // --- GOBERNANZA DE FIRMANTES ---
    ("SIGNER_POLICY", "ALTER TABLE registered_signers ADD COLUMN policy_json TEXT"),
];

/**
 * ESTRATO 3: ENDURECIMIENTO (Índices de Aceleración)
 */
const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    // Reclamo de trabajos por estado y antigüedad.
    ("IDX_JOBS_CLAIM", r#"
        CREATE INDEX IF NOT EXISTS idx_jobs_claim
        ON publish_jobs(status, created_at);
    "#),
    // Drenado ordenado de lotes (parcial: solo filas con lote asignado).
    ("IDX_JOBS_BATCH_DRAIN", r#"
        CREATE INDEX IF NOT EXISTS idx_jobs_batch_drain
        ON publish_jobs(batch_id, batch_seq)
        WHERE batch_id IS NOT NULL;
    "#),
    ("IDX_JOBS_RECORD", r#"
        CREATE INDEX IF NOT EXISTS idx_jobs_record
        ON publish_jobs(record_id, created_at);
    "#),
    // Barrido de arrendamientos vencidos (parcial: solo reservados).
    ("IDX_UTXO_SWEEP", r#"
        CREATE INDEX IF NOT EXISTS idx_utxo_sweep
        ON utxo_pool(reserved_until)
        WHERE status = 'reserved';
    "#),
    // Selección smallest-first del pool.
    ("IDX_UTXO_SELECTION", r#"
        CREATE INDEX IF NOT EXISTS idx_utxo_selection
        ON utxo_pool(purpose, status, satoshis, created_at);
    "#),
    ("IDX_AUDIT_RESOURCE", r#"
        CREATE INDEX IF NOT EXISTS idx_audit_resource
        ON audit_events(resource_id, created_at);
    "#),
];

/**
 * Ejecuta la secuencia maestra de sincronización del esquema.
 *
 * # Errors:
 * Retorna error si alguna tabla base falla en solidificarse.
 */
#[instrument(skip(database_connection))]
pub async fn apply_full_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization V9.2...");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Anchor ledger schema level and certified.");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in TACTICAL_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ())
            .await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(*sql, ()).await {
            Ok(_) => debug!("  🟢 [REPAIR_OK]: Applied evolutionary stratum {}", identifier),
            Err(fault) => {
                let message = fault.to_string();
                if message.contains("duplicate column name") {
                    debug!("  ⚪ [REPAIR_SKIP]: {} already level.", identifier);
                } else {
                    warn!("  ⚠️ [REPAIR_BYPASS]: {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(*sql, ())
            .await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}
