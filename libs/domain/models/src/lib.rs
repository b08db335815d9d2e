// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: ANCHOR DOMAIN MODELS (V8.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: DEFINICIÓN DE CONTRATOS SOBERANOS DE ANCLAJE
 * =================================================================
 */

pub mod audit;
pub mod batch;
pub mod errors;
pub mod intent;
pub mod job;
pub mod utxo;

mod tests_serialization;
