// [libs/domain/models/src/errors.rs]
/*!
 * =================================================================
 * APARATO: ANCHOR ERROR TAXONOMY (V8.2)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: TAXONOMÍA DE FALLOS COMO CONTRATO DE DATOS
 *
 * Los códigos se persisten verbatim en job.error_code y se exponen
 * al cliente; son parte del contrato, no detalle de implementación.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Código de error del contrato, persistido verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidSchema,
    StaleTimestamp,
    ReplayDetected,
    InvalidSignature,
    UnknownSigner,
    NoCapacity,
    MempoolConflict,
    TransientNetwork,
    PermanentReject,
    BuildError,
}

impl ErrorCode {
    /// Forma persistida y expuesta del código.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidSchema => "InvalidSchema",
            ErrorCode::StaleTimestamp => "StaleTimestamp",
            ErrorCode::ReplayDetected => "ReplayDetected",
            ErrorCode::InvalidSignature => "InvalidSignature",
            ErrorCode::UnknownSigner => "UnknownSigner",
            ErrorCode::NoCapacity => "NoCapacity",
            ErrorCode::MempoolConflict => "MempoolConflict",
            ErrorCode::TransientNetwork => "TransientNetwork",
            ErrorCode::PermanentReject => "PermanentReject",
            ErrorCode::BuildError => "BuildError",
        }
    }

    /// Código HTTP para los fallos de admisión (los de worker no viajan
    /// como respuesta síncrona).
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::InvalidSchema => 400,
            ErrorCode::StaleTimestamp => 400,
            ErrorCode::InvalidSignature => 400,
            ErrorCode::ReplayDetected => 409,
            ErrorCode::UnknownSigner => 403,
            _ => 500,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Rechazo de admisión: código del contrato más detalle humano.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[L2_ADMISSION_REJECTED]: {code} -> {detail}")]
pub struct AdmissionRejection {
    pub code: ErrorCode,
    pub detail: String,
}

impl AdmissionRejection {
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }

    pub fn invalid_schema(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSchema, detail)
    }
}
