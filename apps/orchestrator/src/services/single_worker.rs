// [apps/orchestrator/src/services/single_worker.rs]
/*!
 * =================================================================
 * APARATO: SINGLE-JOB WORKER (V5.2)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: RUTA DE BAJO VOLUMEN, UN TRABAJO A LA VEZ
 *
 * Secuencia por trabajo: reclamo (queued -> processing), reserva de
 * entrada, forja, difusión y sellado terminal. La concurrencia interna
 * es 1; el escalado horizontal corre procesos adicionales y la
 * corrección deriva de los reclamos atómicos del Ledger.
 * =================================================================
 */

use crate::services::outcome::{append_terminal_audit, apply_broadcast_outcome};
use crate::state::AppState;
use anyhow::Result;
use serde_json::json;
use soundledger_domain_models::errors::ErrorCode;
use soundledger_domain_models::job::{JobStatus, PublishJob};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, instrument};

/// Pausa del bucle cuando la cola está vacía.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Lanza el bucle perpetuo del worker single en el reactor de Tokio.
pub fn spawn_single_worker(application_state: AppState, shutdown_signal: watch::Receiver<bool>) {
    tokio::spawn(async move {
        info!("⚙️  [SINGLE_WORKER]: Low-volume anchoring loop initiated.");

        loop {
            if *shutdown_signal.borrow() {
                info!("⚙️  [SINGLE_WORKER]: Cancel observed; loop retired.");
                break;
            }

            match process_next_job(&application_state).await {
                Ok(Some(final_status)) => {
                    info!("⚙️  [SINGLE_WORKER]: Job cycle sealed as '{}'.", final_status.as_str());
                }
                Ok(None) => sleep(IDLE_POLL_INTERVAL).await,
                Err(worker_fault) => {
                    error!("❌ [SINGLE_WORKER]: Cycle collapsed: {}", worker_fault);
                    sleep(IDLE_POLL_INTERVAL).await;
                }
            }
        }
    });
}

/**
 * Procesa a lo sumo un trabajo encolado. Retorna el estado terminal
 * alcanzado, o `None` si la cola estaba vacía.
 */
#[instrument(skip(application_state))]
pub async fn process_next_job(application_state: &AppState) -> Result<Option<JobStatus>> {
    // 1. RECLAMO ATÓMICO: queued -> processing.
    let Some(claimed_job) = application_state.job_repository.claim_next_queued().await? else {
        return Ok(None);
    };

    let final_status =
        execute_anchor_cycle(application_state, &claimed_job, JobStatus::Processing, None).await?;
    Ok(Some(final_status))
}

/**
 * Ciclo de anclaje compartido: reserva, forja, (estrangulamiento),
 * difusión y sellado. `from_status` es el estado de origen de las
 * transiciones terminales ('processing' en la ruta single, 'sending'
 * en la ruta de lotes). Solo el difusor de lotes inyecta el balde de
 * fichas: es el único punto de estrangulamiento del contrato.
 */
pub async fn execute_anchor_cycle(
    application_state: &AppState,
    job: &PublishJob,
    from_status: JobStatus,
    broadcast_throttle: Option<&crate::services::throttle::TokenBucket>,
) -> Result<JobStatus> {
    // 2. RESERVA DE ENTRADA: la ausencia es fallo duro, nada que liberar.
    let Some(reserved_input) = application_state
        .utxo_repository
        .reserve(application_state.config.utxo_lease_seconds)
        .await?
    else {
        application_state
            .job_repository
            .mark_failed(&job.job_id, from_status, ErrorCode::NoCapacity, "utxo pool exhausted")
            .await?;
        append_terminal_audit(
            application_state,
            job,
            "failed",
            json!({ "errorCode": ErrorCode::NoCapacity.as_str() }),
        )
        .await;
        return Ok(JobStatus::Failed);
    };

    // 3. FORJA: el fallo local libera la entrada y sella BuildError.
    let forged = match application_state.transaction_forge.forge_anchor_transaction(
        &reserved_input,
        &job.record_hash,
        &application_state.change_address,
    ) {
        Ok(forged) => forged,
        Err(forge_fault) => {
            application_state.utxo_repository.release(reserved_input.id).await?;
            let detail = forge_fault.to_string();
            application_state
                .job_repository
                .mark_failed(&job.job_id, from_status, ErrorCode::BuildError, &detail)
                .await?;
            append_terminal_audit(
                application_state,
                job,
                "failed",
                json!({ "errorCode": ErrorCode::BuildError.as_str(), "detail": detail }),
            )
            .await;
            return Ok(JobStatus::Failed);
        }
    };

    // 4. ESTRANGULAMIENTO (solo ruta de lotes): una ficha por difusión,
    //    adquirida tras la forja y antes de tocar la red.
    if let Some(throttle) = broadcast_throttle {
        throttle.take(1).await;
    }

    // 5. DIFUSIÓN Y SELLADO TERMINAL.
    let outcome = application_state
        .ledger_uplink
        .transmit_raw_transaction(&forged.raw_hex)
        .await;

    apply_broadcast_outcome(application_state, job, reserved_input.id, from_status, outcome).await
}
