// [apps/orchestrator/src/handlers/jobs.rs]
/*!
 * =================================================================
 * APARATO: JOB QUERY HANDLER (V5.2)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CONSULTA DE TRABAJOS, REGISTROS Y SONDA DE VIDA
 *
 * El cliente sondea estos endpoints: el servidor no reintenta fallos;
 * la re-emisión es una re-admisión con nonce fresco del lado cliente.
 * =================================================================
 */

use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use soundledger_domain_models::job::PublishJob;
use tracing::instrument;

pub struct JobQueryHandler;

impl JobQueryHandler {
    /// Endpoint: GET /api/v1/jobs/:job_id
    #[instrument(skip(application_state))]
    pub async fn handle_job_query(
        State(application_state): State<AppState>,
        Path(job_id): Path<String>,
    ) -> impl IntoResponse {
        match application_state.job_repository.find_by_job_id(&job_id).await {
            Ok(Some(job)) => (StatusCode::OK, Json(job_summary(&job))),
            Ok(None) => job_not_found(),
            Err(query_fault) => infrastructure_fault(query_fault.to_string()),
        }
    }

    /// Endpoint: GET /api/v1/records/:record_id
    ///
    /// Último trabajo declarado para el registro más su cuerpo canónico.
    #[instrument(skip(application_state))]
    pub async fn handle_record_query(
        State(application_state): State<AppState>,
        Path(record_id): Path<String>,
    ) -> impl IntoResponse {
        match application_state
            .job_repository
            .find_latest_by_record_id(&record_id)
            .await
        {
            Ok(Some(job)) => {
                // El cuerpo almacenado es la forma canónica exacta; se
                // reexpone parseado para el consumidor JSON.
                let canonical_record: Value =
                    serde_json::from_str(&job.canonical_body).unwrap_or(Value::Null);
                let mut summary = job_summary(&job);
                summary["record"] = canonical_record;
                (StatusCode::OK, Json(summary))
            }
            Ok(None) => job_not_found(),
            Err(query_fault) => infrastructure_fault(query_fault.to_string()),
        }
    }

    /// Endpoint: GET /health — sonda de vida del almacén de trabajos.
    pub async fn handle_health_probe(
        State(application_state): State<AppState>,
    ) -> impl IntoResponse {
        match application_state.database_client.ping().await {
            Ok(()) => (StatusCode::OK, Json(json!({ "ok": true, "status": "operational" }))),
            Err(probe_fault) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "ok": false, "error": probe_fault.to_string() })),
            ),
        }
    }
}

fn job_summary(job: &PublishJob) -> Value {
    json!({
        "ok": true,
        "jobId": job.job_id,
        "recordId": job.record_id,
        "status": job.status.as_str(),
        "txid": job.ledger_transaction_id,
        "errorCode": job.error_code,
        "errorDetail": job.error_detail,
        "batchId": job.batch_id,
        "batchSeq": job.batch_seq,
        "timestamps": {
            "createdAt": job.created_at,
            "sentAt": job.sent_at,
            "updatedAt": job.updated_at,
        },
    })
}

fn job_not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "ok": false, "error": "JOB_NOT_FOUND" })),
    )
}

fn infrastructure_fault(detail: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "ok": false, "error": detail })),
    )
}
