// [libs/core/crypto/src/errors.rs]
// =================================================================
// APARATO: CRYPTO ERROR CATALOG (V5.0)
// RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS CRIPTOGRÁFICOS
// =================================================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    /// Longitud de material incorrecta para el contrato solicitado.
    #[error("[L1_CRYPTO_FAULT]: INVALID_LENGTH -> expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// Material hexadecimal malformado.
    #[error("[L1_CRYPTO_FAULT]: HEX_DECODING_REJECTED -> {0}")]
    HexError(#[from] hex::FromHexError),

    /// Material rechazado por la curva secp256k1.
    #[error("[L1_CRYPTO_FAULT]: CURVE_REJECTION -> {0}")]
    EllipticCurveError(#[from] secp256k1::Error),

    /// Dirección Base58Check malformada o de versión ajena.
    #[error("[L1_CRYPTO_FAULT]: ADDRESS_REJECTED -> {0}")]
    AddressError(String),
}
