// [libs/core/crypto/src/hashing.rs]
// =================================================================
// APARATO: PROTOCOL HASHING (V5.0)
// RESPONSABILIDAD: RESÚMENES CRIPTOGRÁFICOS DEL PROTOCOLO LEDGER
// =================================================================

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// HASH160 estándar del protocolo: RIPEMD160(SHA256(data)).
///
/// Genera el identificador de llave pública que forma parte de las
/// direcciones P2PKH y de los scripts de bloqueo.
#[inline(always)]
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let mut sha_hasher = Sha256::new();
    sha_hasher.update(data);
    let sha_result = sha_hasher.finalize();

    let mut ripe_hasher = Ripemd160::new();
    ripe_hasher.update(sha_result);

    let mut output = [0u8; 20];
    output.copy_from_slice(&ripe_hasher.finalize());
    output
}

/// Doble SHA-256: el resumen de identificadores de transacción y sighash.
#[inline(always)]
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let mut first_pass = Sha256::new();
    first_pass.update(data);
    let intermediate = first_pass.finalize();

    let mut second_pass = Sha256::new();
    second_pass.update(intermediate);

    let mut output = [0u8; 32];
    output.copy_from_slice(&second_pass.finalize());
    output
}
