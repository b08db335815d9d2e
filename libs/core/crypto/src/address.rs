// [libs/core/crypto/src/address.rs]
/*!
 * =================================================================
 * APARATO: LEGACY ADDRESS CODEC (V5.0)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: TRANSFORMACIÓN PUBKEY <-> BASE58CHECK (P2PKH)
 * =================================================================
 */

use crate::errors::CryptoError;
use crate::hashing::hash160;
use secp256k1::PublicKey;

/// Prefijo de red para Mainnet (0x00 -> '1').
const MAINNET_VERSION_BYTE: u8 = 0x00;

/// 1 byte de versión + 20 bytes de hash160.
const ADDRESS_PAYLOAD_SIZE: usize = 21;

/// Transforma una llave pública en una dirección P2PKH (forma comprimida).
#[must_use]
pub fn pubkey_to_p2pkh_address(public_key: &PublicKey) -> String {
    let serialized = public_key.serialize();
    let pubkey_hash = hash160(&serialized);

    let mut address_payload = [0u8; ADDRESS_PAYLOAD_SIZE];
    address_payload[0] = MAINNET_VERSION_BYTE;
    address_payload[1..21].copy_from_slice(&pubkey_hash);

    bs58::encode(address_payload).with_check().into_string()
}

/// Decodifica una dirección P2PKH y retorna su hash160 de 20 bytes.
///
/// Rechaza checksums inválidos y bytes de versión ajenos a P2PKH.
pub fn decode_p2pkh_address(address: &str) -> Result<[u8; 20], CryptoError> {
    let decoded_payload = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|fault| CryptoError::AddressError(format!("BASE58_CHECK_REJECTED: {}", fault)))?;

    if decoded_payload.len() != ADDRESS_PAYLOAD_SIZE {
        return Err(CryptoError::AddressError(format!(
            "PAYLOAD_LENGTH_REJECTED: expected {}, got {}",
            ADDRESS_PAYLOAD_SIZE,
            decoded_payload.len()
        )));
    }
    if decoded_payload[0] != MAINNET_VERSION_BYTE {
        return Err(CryptoError::AddressError(format!(
            "VERSION_BYTE_REJECTED: 0x{:02x}",
            decoded_payload[0]
        )));
    }

    let mut pubkey_hash = [0u8; 20];
    pubkey_hash.copy_from_slice(&decoded_payload[1..21]);
    Ok(pubkey_hash)
}
