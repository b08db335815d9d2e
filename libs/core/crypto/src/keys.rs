// [libs/core/crypto/src/keys.rs]
// =================================================================
// APARATO: KEY MATERIAL MANAGER (V5.1)
// RESPONSABILIDAD: GESTIÓN SEGURA DE CLAVES DEL SERVIDOR Y FIRMANTES
// =================================================================

use crate::address::pubkey_to_p2pkh_address;
use crate::errors::CryptoError;
use secp256k1::ecdsa::Signature;
use secp256k1::rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};

/// Longitud canónica de una llave pública comprimida.
pub const COMPRESSED_PUBKEY_SIZE: usize = 33;

/// Llave pública comprimida de un firmante registrado (33 bytes).
///
/// Es la identidad del firmante en todo el sistema: registro, nonces
/// y rastro de auditoría usan su forma hexadecimal en minúsculas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerPublicKey {
    inner: PublicKey,
    hex_form: String,
}

impl SignerPublicKey {
    /// Construye desde hexadecimal comprimido (66 caracteres).
    pub fn from_hex(public_key_hex: &str) -> Result<Self, CryptoError> {
        let raw_bytes = hex::decode(public_key_hex)?;
        if raw_bytes.len() != COMPRESSED_PUBKEY_SIZE {
            return Err(CryptoError::InvalidLength {
                expected: COMPRESSED_PUBKEY_SIZE,
                got: raw_bytes.len(),
            });
        }
        let inner = PublicKey::from_slice(&raw_bytes)?;
        Ok(Self {
            inner,
            hex_form: public_key_hex.to_lowercase(),
        })
    }

    /// Forma hexadecimal en minúsculas (identidad persistida).
    #[inline]
    pub fn as_hex(&self) -> &str {
        &self.hex_form
    }

    /// Referencia al objeto interno (Zero-Copy).
    #[inline(always)]
    pub fn as_inner(&self) -> &PublicKey {
        &self.inner
    }
}

/// Llave de firma del servidor, cargada desde configuración al arranque.
///
/// Recurso inmutable de proceso: firma las transacciones de anclaje y
/// de fragmentación del pool. Garantiza 0 < k < n.
#[derive(Clone)]
pub struct ServerSigningKey {
    secret: SecretKey,
    public: PublicKey,
}

impl ServerSigningKey {
    /// Construye desde el escalar de 32 bytes en hexadecimal.
    pub fn from_hex(secret_hex: &str) -> Result<Self, CryptoError> {
        let raw_bytes = hex::decode(secret_hex)?;
        if raw_bytes.len() != 32 {
            return Err(CryptoError::InvalidLength {
                expected: 32,
                got: raw_bytes.len(),
            });
        }
        let secret = SecretKey::from_slice(&raw_bytes)?;
        let public = PublicKey::from_secret_key(SECP256K1, &secret);
        Ok(Self { secret, public })
    }

    /// Genera una llave efímera con el CSPRNG del sistema (pruebas y bootstrap).
    pub fn new_random() -> Self {
        let (secret, public) = SECP256K1.generate_keypair(&mut OsRng);
        Self { secret, public }
    }

    /// Llave pública comprimida serializada (33 bytes).
    #[inline]
    pub fn public_key_bytes(&self) -> [u8; COMPRESSED_PUBKEY_SIZE] {
        self.public.serialize()
    }

    /// Referencia a la llave pública interna (Zero-Copy).
    #[inline(always)]
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Forma hexadecimal de la llave pública comprimida.
    #[inline]
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public.serialize())
    }

    /// Dirección P2PKH derivada (destino de cambio por defecto).
    #[inline]
    pub fn p2pkh_address(&self) -> String {
        pubkey_to_p2pkh_address(&self.public)
    }

    /// Firma ECDSA determinista (RFC 6979) sobre un resumen de 32 bytes.
    ///
    /// El determinismo es contractual: reintentar con el mismo UTXO debe
    /// producir el mismo identificador de transacción.
    pub fn sign_digest_der(&self, digest: &[u8; 32]) -> Vec<u8> {
        let message = Message::from_digest_slice(digest).expect("digest is exactly 32 bytes");
        let signature: Signature = SECP256K1.sign_ecdsa(&message, &self.secret);
        signature.serialize_der().to_vec()
    }

    /// Referencia al escalar interno (uso exclusivo del forjador de transacciones).
    #[inline(always)]
    pub fn as_secret(&self) -> &SecretKey {
        &self.secret
    }
}

impl std::fmt::Debug for ServerSigningKey {
    // El escalar secreto jamás se imprime.
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ServerSigningKey")
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}
