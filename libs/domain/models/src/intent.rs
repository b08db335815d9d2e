// [libs/domain/models/src/intent.rs]
/*!
 * =================================================================
 * APARATO: PUBLISHING INTENT CONTRACTS (V8.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: SOBRE FIRMADO Y REGISTRO DE DERECHOS
 *
 * Invariante: la forma canónica y la huella SHA-256 se calculan sobre
 * el subárbol 'record' CRUDO del sobre (con el miembro 'nonce'
 * removido), nunca sobre una reserialización de estas estructuras
 * tipadas. El nonce es metadato anti-repetición y no altera la huella.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Etiqueta de protocolo aceptada en el sobre y en el payload on-ledger.
pub const PROTOCOL_TAG: &str = "sl-drm";

/// Versión de protocolo soportada.
pub const PROTOCOL_VERSION: u32 = 1;

/// Algoritmo de firma aceptado.
pub const SIGNATURE_ALGORITHM: &str = "ecdsa-secp256k1";

/// Función de resumen aceptada.
pub const SIGNATURE_HASH: &str = "sha256";

/// Sobre de intención de publicación (forma estructurada, la única admitida).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishIntentEnvelope {
    /// Etiqueta de protocolo; debe ser exactamente "sl-drm".
    pub protocol: String,
    /// Versión de protocolo; debe ser 1.
    pub version: u32,
    /// Subárbol del registro de derechos, preservado crudo para canonicalizar.
    pub record: Value,
    /// Identidad del firmante externo.
    pub signer: SignerDescriptor,
    /// Material de firma sobre la huella del registro.
    pub signature: SignatureDescriptor,
}

/// Identidad del firmante: llave pública comprimida en hexadecimal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerDescriptor {
    pub pubkey: String,
}

/// Material de firma DER con sus enumeraciones de algoritmo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureDescriptor {
    /// Debe ser "ecdsa-secp256k1".
    pub alg: String,
    /// Debe ser "sha256".
    pub hash: String,
    /// Firma DER en hexadecimal.
    pub sig: String,
}

/// Clase de evento declarado por el registro de derechos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RightsEventKind {
    #[serde(rename = "REGISTER")]
    Register,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "ASSIGN")]
    Assign,
    #[serde(rename = "SPLIT_CHANGE")]
    SplitChange,
}

/// Participación de una parte en el registro, en puntos básicos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipShare {
    pub party_id: String,
    pub role: String,
    /// Puntos básicos; el conjunto no vacío debe sumar 10000.
    pub share_bps: u32,
}

/// Pista de distribución externa opcional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionHint {
    pub uri: String,
    pub content_hash: String,
}

/// Términos de explotación declarados.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RightsTerms {
    pub territory: String,
    pub rights: Vec<String>,
}

/// Vista tipada del subárbol 'record' para la validación estructural.
///
/// Campos desconocidos se toleran en el sobre crudo; esta vista valida
/// presencia y tipos de los campos exigidos por el protocolo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RightsRecord {
    pub record_id: String,
    pub event_kind: RightsEventKind,
    pub asset_type: String,
    #[serde(default)]
    pub owners: Vec<OwnershipShare>,
    #[serde(default)]
    pub distribution: Option<DistributionHint>,
    #[serde(default)]
    pub terms: Option<RightsTerms>,
    /// Epoch en milisegundos (granularidad del contrato de frescura).
    pub timestamp: i64,
    pub nonce: String,
}
