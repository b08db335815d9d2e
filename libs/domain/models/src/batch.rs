// [libs/domain/models/src/batch.rs]
// =================================================================
// APARATO: BATCH CONTRACTS (V8.0)
// RESPONSABILIDAD: LOTES DE DIFUSIÓN CON ORDEN TOTAL INMUTABLE
// =================================================================

/// Trabajo reclamado dentro de un lote, con su posición asignada.
///
/// Invariante: batch_seq es una asignación densa 1..N fijada en la
/// creación del lote, ordenada por el instante de creación de cada
/// trabajo; ese orden gobierna la difusión aguas abajo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedBatchJob {
    pub id: i64,
    pub job_id: String,
    pub batch_seq: i64,
}
