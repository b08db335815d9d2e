// [libs/domain/validation/src/lib.rs]
/*!
 * =================================================================
 * APARATO: INTENT VALIDATOR (V6.3)
 * CLASIFICACIÓN: DOMAIN SERVICE (ESTRATO L2)
 * RESPONSABILIDAD: CADENA ORDENADA DE CHEQUEOS DE ADMISIÓN
 *
 * La cadena completa del contrato es:
 *   1. esquema estructural     -> InvalidSchema      (aquí)
 *   2. frescura de timestamp   -> StaleTimestamp     (aquí)
 *   3. unicidad de nonce       -> ReplayDetected     (Ledger, en el handler)
 *   4. canonicalización + hash                        (aquí)
 *   5. verificación de firma   -> InvalidSignature   (aquí)
 *   6. registro de firmantes   -> UnknownSigner      (Ledger, en el handler)
 * Los pasos 1-5 son libres de efectos; la inserción de nonce y la
 * creación del trabajo ocurren solo dentro de la transacción de admisión.
 * =================================================================
 */

use serde_json::Value;
use soundledger_core_canonical::{canonical_string, record_hash_digest};
use soundledger_core_crypto::{verify_record_signature, SignerPublicKey};
use soundledger_domain_models::errors::{AdmissionRejection, ErrorCode};
use soundledger_domain_models::intent::{
    PublishIntentEnvelope, RightsRecord, PROTOCOL_TAG, PROTOCOL_VERSION, SIGNATURE_ALGORITHM,
    SIGNATURE_HASH,
};
use tracing::debug;

/// Suma contractual de participaciones cuando 'owners' no es vacío.
const TOTAL_SHARE_BASIS_POINTS: u64 = 10_000;

/// Intención superada por los pasos 1 y 2 (esquema + frescura).
#[derive(Debug, Clone)]
pub struct ScreenedIntent {
    pub envelope: PublishIntentEnvelope,
    pub record: RightsRecord,
    pub signer_public_key: SignerPublicKey,
}

/// Intención certificada: pasos 4 y 5 superados.
#[derive(Debug, Clone)]
pub struct CertifiedIntent {
    pub envelope: PublishIntentEnvelope,
    pub record: RightsRecord,
    pub signer_public_key: SignerPublicKey,
    /// Bytes canónicos del subárbol 'record' como texto UTF-8.
    pub canonical_body: String,
    /// Huella SHA-256 en hex minúsculas (llave de idempotencia global).
    pub record_hash: String,
}

/// Pasos 1 y 2: esquema estructural, enumeraciones y frescura del timestamp.
pub fn screen_envelope(
    raw_envelope: &Value,
    now_epoch_milliseconds: i64,
    timestamp_skew_seconds: i64,
) -> Result<ScreenedIntent, AdmissionRejection> {
    let envelope = parse_structured_envelope(raw_envelope)?;
    let record = parse_rights_record(&envelope.record)?;

    // El material del firmante es parte del chequeo estructural (paso 1).
    let signer_public_key = SignerPublicKey::from_hex(&envelope.signer.pubkey)
        .map_err(|fault| AdmissionRejection::invalid_schema(format!("signer.pubkey: {}", fault)))?;

    // Paso 2: |now - timestamp| <= ventana. La frontera exacta se acepta.
    let skew_window_milliseconds = timestamp_skew_seconds.saturating_mul(1000);
    let observed_skew = (now_epoch_milliseconds - record.timestamp).abs();
    if observed_skew > skew_window_milliseconds {
        return Err(AdmissionRejection::new(
            ErrorCode::StaleTimestamp,
            format!(
                "record timestamp outside the {}s freshness window (skew {}ms)",
                timestamp_skew_seconds, observed_skew
            ),
        ));
    }

    Ok(ScreenedIntent {
        envelope,
        record,
        signer_public_key,
    })
}

/// Cuerpo de registro sujeto a huella: el subárbol 'record' crudo con
/// el miembro 'nonce' removido.
///
/// El nonce es metadato anti-repetición, no contenido del registro: dos
/// declaraciones idénticas con nonces distintos deben colapsar en la
/// misma huella (idempotencia por huella del contrato).
#[must_use]
pub fn record_body_for_hashing(raw_record: &Value) -> Value {
    let mut body = raw_record.clone();
    if let Some(members) = body.as_object_mut() {
        members.remove("nonce");
    }
    body
}

/// Pasos 4 y 5: canonicaliza el cuerpo del registro (sin nonce),
/// computa la huella y verifica la firma ECDSA contra ella.
pub fn certify_signature(screened: ScreenedIntent) -> Result<CertifiedIntent, AdmissionRejection> {
    let hashed_body = record_body_for_hashing(&screened.envelope.record);
    let canonical_body = canonical_string(&hashed_body);
    let digest = record_hash_digest(&hashed_body);
    let record_hash = hex::encode(digest);

    let der_signature = hex::decode(&screened.envelope.signature.sig).map_err(|_| {
        AdmissionRejection::new(ErrorCode::InvalidSignature, "signature.sig is not valid hex")
    })?;

    if !verify_record_signature(&screened.signer_public_key, &digest, &der_signature) {
        return Err(AdmissionRejection::new(
            ErrorCode::InvalidSignature,
            "ECDSA verification failed against the record hash",
        ));
    }

    debug!(record_hash = %record_hash, "🔏 [VALIDATOR]: Signature certified against record hash.");

    Ok(CertifiedIntent {
        envelope: screened.envelope,
        record: screened.record,
        signer_public_key: screened.signer_public_key,
        canonical_body,
        record_hash,
    })
}

fn parse_structured_envelope(raw_envelope: &Value) -> Result<PublishIntentEnvelope, AdmissionRejection> {
    let members = raw_envelope
        .as_object()
        .ok_or_else(|| AdmissionRejection::invalid_schema("envelope must be a JSON object"))?;

    // La forma plana legada {publickey, signature, nonce, record} se
    // rechaza de manera explícita: solo se admite la forma estructurada.
    if members.contains_key("publickey") {
        return Err(AdmissionRejection::invalid_schema(
            "legacy flat envelope form is not accepted; use {protocol, version, record, signer, signature}",
        ));
    }

    let envelope: PublishIntentEnvelope = serde_json::from_value(raw_envelope.clone())
        .map_err(|fault| AdmissionRejection::invalid_schema(format!("envelope: {}", fault)))?;

    if envelope.protocol != PROTOCOL_TAG {
        return Err(AdmissionRejection::invalid_schema(format!(
            "protocol must be \"{}\"",
            PROTOCOL_TAG
        )));
    }
    if envelope.version != PROTOCOL_VERSION {
        return Err(AdmissionRejection::invalid_schema(format!(
            "version must be {}",
            PROTOCOL_VERSION
        )));
    }
    if envelope.signature.alg != SIGNATURE_ALGORITHM {
        return Err(AdmissionRejection::invalid_schema(format!(
            "signature.alg must be \"{}\"",
            SIGNATURE_ALGORITHM
        )));
    }
    if envelope.signature.hash != SIGNATURE_HASH {
        return Err(AdmissionRejection::invalid_schema(format!(
            "signature.hash must be \"{}\"",
            SIGNATURE_HASH
        )));
    }

    Ok(envelope)
}

fn parse_rights_record(raw_record: &Value) -> Result<RightsRecord, AdmissionRejection> {
    if !raw_record.is_object() {
        return Err(AdmissionRejection::invalid_schema("record must be a JSON object"));
    }

    let record: RightsRecord = serde_json::from_value(raw_record.clone())
        .map_err(|fault| AdmissionRejection::invalid_schema(format!("record: {}", fault)))?;

    if record.record_id.trim().is_empty() {
        return Err(AdmissionRejection::invalid_schema("record.recordId must be non-empty"));
    }
    if record.nonce.trim().is_empty() {
        return Err(AdmissionRejection::invalid_schema("record.nonce must be non-empty"));
    }

    // Participaciones: un conjunto no vacío debe sumar exactamente 10000 bps.
    if !record.owners.is_empty() {
        let share_total: u64 = record.owners.iter().map(|owner| u64::from(owner.share_bps)).sum();
        if share_total != TOTAL_SHARE_BASIS_POINTS {
            return Err(AdmissionRejection::invalid_schema(format!(
                "owners shares must sum to {} basis points, got {}",
                TOTAL_SHARE_BASIS_POINTS, share_total
            )));
        }
    }

    Ok(record)
}
