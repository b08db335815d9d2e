// [apps/orchestrator/src/services/outcome.rs]
/*!
 * =================================================================
 * APARATO: BROADCAST OUTCOME APPLICATOR (V5.1)
 * CLASIFICACIÓN: WORKER CORE (ESTRATO L4)
 * RESPONSABILIDAD: APLICACIÓN UNIFORME DE VEREDICTOS DE DIFUSIÓN
 *
 * Ramas del contrato (idénticas para worker single y difusor de lotes,
 * cambiando solo el estado de origen):
 * - Accepted          -> utxo spent,  job sent
 * - MempoolConflict   -> utxo dirty,  job failed (MempoolConflict)
 * - TransientNetwork  -> utxo release, job failed (TransientNetwork)
 * - PermanentReject   -> utxo release, job failed (PermanentReject)
 * =================================================================
 */

use crate::state::AppState;
use anyhow::Result;
use serde_json::json;
use soundledger_domain_models::audit::AuditEventDraft;
use soundledger_domain_models::errors::ErrorCode;
use soundledger_domain_models::job::{JobStatus, PublishJob};
use soundledger_infra_broadcast::BroadcastOutcome;
use tracing::{error, info};

/// Aplica el veredicto de difusión sobre el trabajo y su entrada
/// reservada, y anexa el evento de auditoría correspondiente.
pub async fn apply_broadcast_outcome(
    application_state: &AppState,
    job: &PublishJob,
    reserved_utxo_id: i64,
    from_status: JobStatus,
    outcome: BroadcastOutcome,
) -> Result<JobStatus> {
    let final_status = match outcome {
        BroadcastOutcome::Accepted { txid } => {
            application_state
                .utxo_repository
                .mark_spent(reserved_utxo_id, &txid)
                .await?;
            application_state
                .job_repository
                .mark_sent(&job.job_id, from_status, &txid)
                .await?;

            info!("📡 [BROADCAST]: Job [{}] anchored with txid [{}].", job.job_id, txid);
            append_terminal_audit(application_state, job, "sent", json!({ "txid": txid })).await;
            JobStatus::Sent
        }
        BroadcastOutcome::MempoolConflict { detail } => {
            application_state
                .utxo_repository
                .mark_dirty(reserved_utxo_id)
                .await?;
            application_state
                .job_repository
                .mark_failed(&job.job_id, from_status, ErrorCode::MempoolConflict, &detail)
                .await?;

            error!("🛑 [BROADCAST]: Job [{}] hit a mempool conflict: {}", job.job_id, detail);
            append_terminal_audit(
                application_state,
                job,
                "failed",
                json!({ "errorCode": ErrorCode::MempoolConflict.as_str(), "detail": detail }),
            )
            .await;
            JobStatus::Failed
        }
        BroadcastOutcome::TransientNetwork { detail } => {
            fail_with_release(application_state, job, reserved_utxo_id, from_status, ErrorCode::TransientNetwork, detail).await?
        }
        BroadcastOutcome::PermanentReject { detail } => {
            fail_with_release(application_state, job, reserved_utxo_id, from_status, ErrorCode::PermanentReject, detail).await?
        }
    };

    Ok(final_status)
}

async fn fail_with_release(
    application_state: &AppState,
    job: &PublishJob,
    reserved_utxo_id: i64,
    from_status: JobStatus,
    error_code: ErrorCode,
    detail: String,
) -> Result<JobStatus> {
    application_state
        .utxo_repository
        .release(reserved_utxo_id)
        .await?;
    application_state
        .job_repository
        .mark_failed(&job.job_id, from_status, error_code, &detail)
        .await?;

    error!(
        "❌ [BROADCAST]: Job [{}] terminally failed as {}: {}",
        job.job_id,
        error_code.as_str(),
        detail
    );
    append_terminal_audit(
        application_state,
        job,
        "failed",
        json!({ "errorCode": error_code.as_str(), "detail": detail }),
    )
    .await;
    Ok(JobStatus::Failed)
}

/// La auditoría terminal jamás aborta al worker: un fallo al anexar se
/// registra y la vida del trabajo continúa gobernada por el Ledger.
pub(crate) async fn append_terminal_audit(
    application_state: &AppState,
    job: &PublishJob,
    action: &str,
    details: serde_json::Value,
) {
    let draft = AuditEventDraft {
        event_type: "PUBLISH_JOB".to_string(),
        actor_public_key: job.signer_public_key.clone(),
        resource_type: "publish_job".to_string(),
        resource_id: job.job_id.clone(),
        action: action.to_string(),
        details,
    };
    if let Err(audit_fault) = application_state.audit_repository.append(draft).await {
        error!("⚠️ [AUDIT_FAULT]: Trail append failed for job [{}]: {}", job.job_id, audit_fault);
    }
}
