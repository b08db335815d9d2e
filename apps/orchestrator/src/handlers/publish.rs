// [apps/orchestrator/src/handlers/publish.rs]
/*!
 * =================================================================
 * APARATO: PUBLISH ADMISSION HANDLER (V5.4)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CADENA COMPLETA DE ADMISIÓN DE INTENCIONES
 *
 * Orden contractual de chequeos: esquema, frescura, nonce, huella
 * canónica, firma, registro de firmantes. Los pasos 1-5 son libres de
 * efectos; el sellado del nonce y la creación del trabajo ocurren en
 * la transacción de admisión del Ledger.
 * =================================================================
 */

use crate::state::AppState;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{json, Value};
use soundledger_domain_models::errors::{AdmissionRejection, ErrorCode};
use soundledger_domain_validation::{certify_signature, screen_envelope};
use soundledger_infra_db::repositories::job::AdmissionDraft;
use soundledger_infra_db::DbError;
use tracing::{info, instrument, warn};

pub struct PublishAdmissionHandler;

impl PublishAdmissionHandler {
    /**
     * Endpoint: POST /api/v1/publish
     *
     * Admite una intención de publicación firmada y la encola para su
     * anclaje. La re-admisión de un cuerpo idéntico retorna el trabajo
     * preexistente (idempotencia por huella de registro).
     */
    #[instrument(skip(application_state, raw_envelope))]
    pub async fn handle_intent_submission(
        State(application_state): State<AppState>,
        Json(raw_envelope): Json<Value>,
    ) -> impl IntoResponse {
        match Self::run_admission_chain(&application_state, &raw_envelope).await {
            Ok(acceptance) => (StatusCode::OK, Json(acceptance)),
            Err(rejection) => {
                warn!("🚫 [ADMISSION]: Intent rejected as {} -> {}", rejection.code, rejection.detail);
                (
                    StatusCode::from_u16(rejection.code.http_status())
                        .unwrap_or(StatusCode::BAD_REQUEST),
                    Json(json!({
                        "ok": false,
                        "error": format!("{}: {}", rejection.code, rejection.detail),
                    })),
                )
            }
        }
    }

    async fn run_admission_chain(
        application_state: &AppState,
        raw_envelope: &Value,
    ) -> Result<Value, AdmissionRejection> {
        let config = &application_state.config;
        let now_epoch_milliseconds = chrono::Utc::now().timestamp_millis();

        // Pasos 1-2: esquema estructural y frescura.
        let screened = screen_envelope(
            raw_envelope,
            now_epoch_milliseconds,
            config.timestamp_skew_seconds,
        )?;

        // Paso 3: unicidad del nonce (chequeo sin efectos).
        let signer_hex = screened.signer_public_key.as_hex().to_string();
        let nonce = screened.record.nonce.clone();
        let nonce_already_seen = application_state
            .job_repository
            .nonce_seen(&signer_hex, &nonce)
            .await
            .map_err(admission_infrastructure_fault)?;
        if nonce_already_seen {
            return Err(AdmissionRejection::new(
                ErrorCode::ReplayDetected,
                format!("nonce '{}' was already consumed by this signer", nonce),
            ));
        }

        // Pasos 4-5: canonicalización, huella y certificación de firma.
        let certified = certify_signature(screened)?;

        // Paso 6: el firmante existe y está activo en el registro plano.
        let signer_is_active = application_state
            .signer_repository
            .is_active_signer(&signer_hex)
            .await
            .map_err(admission_infrastructure_fault)?;
        if !signer_is_active {
            return Err(AdmissionRejection::new(
                ErrorCode::UnknownSigner,
                "signer public key is not registered or was revoked",
            ));
        }

        // Frontera transaccional: nonce + trabajo + auditoría.
        let admission = application_state
            .job_repository
            .admit(AdmissionDraft {
                record_id: certified.record.record_id.clone(),
                canonical_body: certified.canonical_body.clone(),
                record_hash: certified.record_hash.clone(),
                signer_public_key: signer_hex,
                nonce,
            })
            .await
            .map_err(|admission_fault| match admission_fault {
                // Carrera perdida contra una admisión concurrente idéntica.
                DbError::NonceReplay => AdmissionRejection::new(
                    ErrorCode::ReplayDetected,
                    "nonce was consumed by a concurrent admission",
                ),
                other => admission_infrastructure_fault(other),
            })?;

        // El trabajo preexistente reporta su estado vigente.
        let reported_status = if admission.duplicate_record {
            application_state
                .job_repository
                .find_by_job_id(&admission.job_id)
                .await
                .ok()
                .flatten()
                .map(|job| job.status.as_str().to_string())
                .unwrap_or_else(|| "queued".to_string())
        } else {
            "queued".to_string()
        };

        info!(
            "✅ [ADMISSION]: Record [{}] accepted as job [{}].",
            certified.record.record_id, admission.job_id
        );

        Ok(json!({
            "ok": true,
            "recordId": certified.record.record_id,
            "hash": certified.record_hash,
            "jobId": admission.job_id,
            "status": reported_status,
        }))
    }
}

/// Colapsos de infraestructura durante la admisión responden 500 sin
/// filtrar detalle interno al cliente.
fn admission_infrastructure_fault(fault: DbError) -> AdmissionRejection {
    warn!("💥 [ADMISSION_INFRA]: {}", fault);
    AdmissionRejection::new(ErrorCode::TransientNetwork, "admission pipeline unavailable")
}
