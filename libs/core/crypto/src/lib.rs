// [libs/core/crypto/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CRYPTO CORE (V5.0)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: MATERIAL DE CLAVES, VERIFICACIÓN ECDSA Y DIRECCIONES
 * =================================================================
 */

pub mod address;
pub mod errors;
pub mod hashing;
pub mod keys;
pub mod signature;

pub use address::{decode_p2pkh_address, pubkey_to_p2pkh_address};
pub use errors::CryptoError;
pub use hashing::{double_sha256, hash160};
pub use keys::{ServerSigningKey, SignerPublicKey};
pub use signature::verify_record_signature;
