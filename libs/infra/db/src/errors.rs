// [libs/infra/db/src/errors.rs]
/*!
 * =================================================================
 * APARATO: DATABASE ERROR CATALOG (V9.0)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Error de enlace físico o de red con el motor libSQL.
    #[error("[L3_DB_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo de configuración del entorno (variables vacías o malformadas).
    #[error("[L3_DB_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el dominio.
    #[error("[L3_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    /// Error al comprometer una secuencia transaccional multi-tabla.
    #[error("[L3_DB_FAULT]: TRANSACTION_COLLAPSE")]
    TransactionError,

    // --- ESTRATO DE ADMISIÓN ---
    /// El par (firmante, nonce) ya fue visto: repetición detectada.
    #[error("[L3_ADMISSION_FAULT]: NONCE_REPLAY_DETECTED")]
    NonceReplay,

    // --- ESTRATO DE CICLO DE VIDA ---
    /// El trabajo solicitado no existe en el Ledger.
    #[error("[L3_JOB_FAULT]: IDENTIFIER_NOT_FOUND")]
    JobNotFound,

    /// La fila no se encuentra en un estado apto para la operación.
    #[error("[L3_STATE_FAULT]: INVALID_STATE_TRANSITION -> {0}")]
    InvalidState(String),
}

impl DbError {
    /// Detección de violaciones de unicidad del motor SQLite.
    #[must_use]
    pub fn is_unique_violation(fault: &libsql::Error) -> bool {
        fault.to_string().contains("UNIQUE constraint failed")
    }
}
