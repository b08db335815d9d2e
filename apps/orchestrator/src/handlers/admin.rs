// [apps/orchestrator/src/handlers/admin.rs]
/*!
 * =================================================================
 * APARATO: ADMIN GOVERNANCE HANDLER (V5.3)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: INGESTA ADMINISTRATIVA Y DIAGNÓSTICO DEL SISTEMA
 *
 * Ruta administrativa externa del contrato: alta y revocación de
 * firmantes (monotónica), ingesta de salidas al pool, rastro de
 * auditoría y panel de diagnóstico.
 * =================================================================
 */

use crate::state::AppState;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::{json, Value};
use soundledger_core_crypto::SignerPublicKey;
use soundledger_domain_models::audit::AuditEventDraft;
use soundledger_domain_models::utxo::UtxoPurpose;
use soundledger_domain_txforge::p2pkh_script_for_address;
use tracing::{info, instrument};

/// Payload de alta / revocación de firmantes.
#[derive(Deserialize)]
pub struct SignerGovernancePayload {
    /// Llave pública comprimida en hexadecimal (66 caracteres).
    pub pubkey: String,
    /// Blob de política opcional, preservado opaco.
    #[serde(default)]
    pub policy: Option<Value>,
}

/// Payload de ingesta de salidas externas al pool.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoIngestionPayload {
    pub txid: String,
    pub vout: u32,
    pub satoshis: i64,
    /// Script de bloqueo explícito; si falta se deriva de la dirección.
    #[serde(default)]
    pub locking_script_hex: Option<String>,
    pub address: String,
    /// "publish" | "funding" | "change".
    pub purpose: String,
}

pub struct AdminGovernanceHandler;

impl AdminGovernanceHandler {
    /// Endpoint: POST /api/v1/admin/signers
    #[instrument(skip(application_state, payload))]
    pub async fn handle_signer_registration(
        State(application_state): State<AppState>,
        Json(payload): Json<SignerGovernancePayload>,
    ) -> impl IntoResponse {
        // El material se valida contra la curva antes de tocar el registro.
        let parsed_key = match SignerPublicKey::from_hex(&payload.pubkey) {
            Ok(key) => key,
            Err(material_fault) => {
                return rejection(StatusCode::BAD_REQUEST, material_fault.to_string())
            }
        };

        match application_state
            .signer_repository
            .register_signer(parsed_key.as_hex(), payload.policy)
            .await
        {
            Ok(inserted) => {
                info!("🔐 [ADMIN]: Signer registration processed (inserted: {}).", inserted);
                (
                    StatusCode::OK,
                    Json(json!({ "ok": true, "pubkey": parsed_key.as_hex(), "inserted": inserted })),
                )
            }
            Err(registry_fault) => {
                rejection(StatusCode::INTERNAL_SERVER_ERROR, registry_fault.to_string())
            }
        }
    }

    /// Endpoint: POST /api/v1/admin/signers/revoke (transición monotónica)
    #[instrument(skip(application_state, payload))]
    pub async fn handle_signer_revocation(
        State(application_state): State<AppState>,
        Json(payload): Json<SignerGovernancePayload>,
    ) -> impl IntoResponse {
        match application_state
            .signer_repository
            .revoke_signer(&payload.pubkey)
            .await
        {
            Ok(revoked) => (
                StatusCode::OK,
                Json(json!({ "ok": true, "revoked": revoked })),
            ),
            Err(registry_fault) => {
                rejection(StatusCode::INTERNAL_SERVER_ERROR, registry_fault.to_string())
            }
        }
    }

    /// Endpoint: POST /api/v1/admin/utxos — bootstrap del pool.
    #[instrument(skip(application_state, payload))]
    pub async fn handle_utxo_ingestion(
        State(application_state): State<AppState>,
        Json(payload): Json<UtxoIngestionPayload>,
    ) -> impl IntoResponse {
        let Some(purpose) = UtxoPurpose::parse(&payload.purpose) else {
            return rejection(
                StatusCode::BAD_REQUEST,
                format!("purpose must be publish|funding|change, got '{}'", payload.purpose),
            );
        };

        let locking_script_hex = match payload.locking_script_hex {
            Some(explicit_script) => explicit_script,
            None => match p2pkh_script_for_address(&payload.address) {
                Ok(derived_script) => hex::encode(derived_script),
                Err(address_fault) => {
                    return rejection(StatusCode::BAD_REQUEST, address_fault.to_string())
                }
            },
        };

        match application_state
            .utxo_repository
            .insert_external_output(
                &payload.txid,
                payload.vout,
                payload.satoshis,
                &locking_script_hex,
                &payload.address,
                purpose,
            )
            .await
        {
            Ok(inserted) => {
                let audit_draft = AuditEventDraft {
                    event_type: "POOL_INGESTION".to_string(),
                    actor_public_key: "ADMIN".to_string(),
                    resource_type: "utxo_pool".to_string(),
                    resource_id: format!("{}:{}", payload.txid, payload.vout),
                    action: "ingest".to_string(),
                    details: json!({ "satoshis": payload.satoshis, "purpose": payload.purpose }),
                };
                let _ = application_state.audit_repository.append(audit_draft).await;

                (
                    StatusCode::OK,
                    Json(json!({ "ok": true, "inserted": inserted })),
                )
            }
            Err(pool_fault) => rejection(StatusCode::INTERNAL_SERVER_ERROR, pool_fault.to_string()),
        }
    }

    /// Endpoint: GET /api/v1/admin/diagnostics
    #[instrument(skip(application_state))]
    pub async fn handle_system_diagnostics(
        State(application_state): State<AppState>,
    ) -> impl IntoResponse {
        let config = &application_state.config;

        let pool_depth = application_state
            .utxo_repository
            .depth_snapshot(config.pool_unit_satoshis)
            .await;
        let queue_depth = application_state.job_repository.queue_depth_by_status().await;
        let oldest_batch = application_state.job_repository.oldest_active_batch().await;

        match (pool_depth, queue_depth, oldest_batch) {
            (Ok(pool), Ok(queue), Ok(batch)) => {
                let queue_map: serde_json::Map<String, Value> = queue
                    .into_iter()
                    .map(|(status, count)| (status, json!(count)))
                    .collect();
                (
                    StatusCode::OK,
                    Json(json!({
                        "ok": true,
                        "pool": pool,
                        "queue": queue_map,
                        "oldestActiveBatch": batch,
                        "throttleAvailable": application_state.broadcast_throttle.available().await,
                    })),
                )
            }
            (Err(fault), _, _) | (_, Err(fault), _) | (_, _, Err(fault)) => {
                rejection(StatusCode::INTERNAL_SERVER_ERROR, fault.to_string())
            }
        }
    }

    /// Endpoint: GET /api/v1/admin/audit/:resource_id
    #[instrument(skip(application_state))]
    pub async fn handle_audit_trail(
        State(application_state): State<AppState>,
        Path(resource_id): Path<String>,
    ) -> impl IntoResponse {
        match application_state
            .audit_repository
            .trail_for_resource(&resource_id, 100)
            .await
        {
            Ok(trail) => (StatusCode::OK, Json(json!({ "ok": true, "events": trail }))),
            Err(trail_fault) => rejection(StatusCode::INTERNAL_SERVER_ERROR, trail_fault.to_string()),
        }
    }
}

fn rejection(status: StatusCode, detail: String) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "ok": false, "error": detail })))
}
