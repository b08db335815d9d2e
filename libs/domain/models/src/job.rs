// [libs/domain/models/src/job.rs]
/*!
 * =================================================================
 * APARATO: PUBLISH JOB CONTRACTS (V8.1)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CICLO DE VIDA DE TRABAJOS DE PUBLICACIÓN
 *
 * Máquina de estados:
 *   queued -> processing        -> (sent | failed)          [worker single]
 *   queued -> processing_batch  -> sending -> (sent|failed) [worker batch]
 * Única arista de retroceso: sending -> processing_batch (unstick por TTL).
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Estados persistidos de un trabajo de publicación.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    ProcessingBatch,
    Sending,
    Sent,
    Failed,
}

impl JobStatus {
    /// Etiqueta persistida en el Ledger Táctico.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::ProcessingBatch => "processing_batch",
            JobStatus::Sending => "sending",
            JobStatus::Sent => "sent",
            JobStatus::Failed => "failed",
        }
    }

    /// Reconstruye desde la etiqueta persistida.
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "queued" => Some(JobStatus::Queued),
            "processing" => Some(JobStatus::Processing),
            "processing_batch" => Some(JobStatus::ProcessingBatch),
            "sending" => Some(JobStatus::Sending),
            "sent" => Some(JobStatus::Sent),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Estados terminales: no admiten transición alguna.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Sent | JobStatus::Failed)
    }
}

/// Fila completa de un trabajo de publicación.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishJob {
    /// Llave surrogate del Ledger.
    pub id: i64,
    /// Identificador global opaco (UUID v4).
    pub job_id: String,
    /// Identificador del registro de derechos declarado.
    pub record_id: String,
    /// Cuerpo canónico almacenado (bytes canónicos como texto UTF-8).
    pub canonical_body: String,
    /// Huella SHA-256 del cuerpo canónico; única globalmente.
    pub record_hash: String,
    /// Llave pública comprimida del firmante admitido.
    pub signer_public_key: String,
    pub status: JobStatus,
    /// Identificador de transacción en el ledger tras la difusión.
    pub ledger_transaction_id: Option<String>,
    pub error_code: Option<String>,
    pub error_detail: Option<String>,
    /// Lote asignado por el recolector (nulo en la ruta single-job).
    pub batch_id: Option<String>,
    /// Posición densa 1..N dentro del lote.
    pub batch_seq: Option<i64>,
    pub sending_started_at: Option<String>,
    pub created_at: String,
    pub sent_at: Option<String>,
    pub updated_at: String,
}

/// Resultado de una admisión: el trabajo recién creado o el preexistente
/// cuando la huella del registro colisiona (idempotencia).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionOutcome {
    pub job_id: String,
    /// `true` cuando la huella ya estaba anclada y se retorna el trabajo previo.
    pub duplicate_record: bool,
}
