// [libs/domain/txforge/src/errors.rs]
// =================================================================
// APARATO: FORGE ERROR CATALOG (V7.0)
// RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE FORJA
// =================================================================

use soundledger_core_crypto::CryptoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForgeError {
    /// El valor de la entrada no cubre comisión más salidas.
    #[error("[L2_FORGE_FAULT]: INSUFFICIENT_VALUE -> required {required} sats, available {available}")]
    InsufficientValue { required: i64, available: i64 },

    /// Material criptográfico rechazado (dirección o llave).
    #[error("[L2_FORGE_FAULT]: KEY_MATERIAL_REJECTED -> {0}")]
    KeyMaterial(#[from] CryptoError),

    /// Huella de registro malformada (se exigen 64 hex minúsculas).
    #[error("[L2_FORGE_FAULT]: RECORD_HASH_REJECTED -> {0}")]
    RecordHashRejected(String),

    /// Identificador de transacción previo malformado.
    #[error("[L2_FORGE_FAULT]: OUTPOINT_REJECTED -> {0}")]
    OutpointRejected(String),

    /// Parámetros de fragmentación fuera de contrato.
    #[error("[L2_FORGE_FAULT]: SPLIT_PARAMETERS_REJECTED -> {0}")]
    SplitParametersRejected(String),
}
