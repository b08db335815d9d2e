// [libs/infra/db/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY REGISTRY (V9.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: MATRIZ DE ACCESO A LOS REPOSITORIOS TÁCTICOS
 * =================================================================
 */

pub mod audit;
pub mod job;
pub mod signer;
pub mod utxo;

pub use audit::AuditRepository;
pub use job::JobRepository;
pub use signer::SignerRepository;
pub use utxo::UtxoRepository;
