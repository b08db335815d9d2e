// [libs/core/crypto/src/signature.rs]
/*!
 * =================================================================
 * APARATO: ECDSA SIGNATURE VERIFIER (V5.1)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: VEREDICTO VÁLIDO/INVÁLIDO SOBRE FIRMAS DER
 *
 * Contrato: entradas malformadas producen veredicto inválido, nunca
 * un pánico. Se aceptan firmas DER del ecosistema (incluyendo high-S,
 * normalizado antes de verificar).
 * =================================================================
 */

use crate::keys::SignerPublicKey;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, SECP256K1};

/// Verifica una firma ECDSA DER contra el resumen de 32 bytes del registro.
///
/// Retorna `true` únicamente si la firma es estructuralmente válida y
/// verifica contra la llave pública del firmante.
#[must_use]
pub fn verify_record_signature(
    signer_public_key: &SignerPublicKey,
    record_digest: &[u8; 32],
    der_signature: &[u8],
) -> bool {
    let message = match Message::from_digest_slice(record_digest) {
        Ok(message) => message,
        Err(_) => return false,
    };

    // DER estricto primero; tolerancia lax para codificadores legados.
    let mut parsed_signature = match Signature::from_der(der_signature)
        .or_else(|_| Signature::from_der_lax(der_signature))
    {
        Ok(signature) => signature,
        Err(_) => return false,
    };

    // High-S se normaliza en lugar de rechazarse.
    parsed_signature.normalize_s();

    SECP256K1
        .verify_ecdsa(&message, &parsed_signature, signer_public_key.as_inner())
        .is_ok()
}
