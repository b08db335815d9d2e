// [libs/domain/txforge/src/lib.rs]
/*!
 * =================================================================
 * APARATO: TRANSACTION FORGE (V7.0)
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L2)
 * RESPONSABILIDAD: CONSTRUCCIÓN Y FIRMA DE TRANSACCIONES DE ANCLAJE
 *
 * Determinismo contractual: la firma ECDSA es RFC 6979, por lo que
 * reintentar la forja con el mismo UTXO produce bytes idénticos y el
 * mismo identificador de transacción. De ello depende que la detección
 * de conflicto de mempool sea significativa.
 * =================================================================
 */

pub mod errors;
pub mod forge;
pub mod script;
pub mod transaction;

pub use errors::ForgeError;
pub use forge::{anchor_payload_bytes, ForgedSplit, ForgedTransaction, TransactionForge};
pub use script::{data_carrier_script, p2pkh_script_for_address, p2pkh_script_for_pubkey};
pub use transaction::{LedgerTransaction, TransactionInput, TransactionOutput, TxOutpoint};
