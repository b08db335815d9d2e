// [apps/orchestrator/src/services/batch_broadcaster.rs]
/*!
 * =================================================================
 * APARATO: BATCH BROADCASTER (V5.3)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: DRENADO ORDENADO Y MEDIDO DE LOTES
 *
 * Garantías de orden:
 * - Dentro de un lote, las difusiones se intentan en batch_seq ascendente
 *   (el reclamo atómico entrega siempre la menor posición pendiente).
 * - Entre lotes, un lote nuevo no comienza hasta drenar el anterior
 *   (la selección toma siempre el lote activo más antiguo).
 * El balde de fichas se adquiere tras la forja y antes de difundir;
 * es el único punto de estrangulamiento del proceso.
 * =================================================================
 */

use crate::services::single_worker::execute_anchor_cycle;
use crate::state::AppState;
use anyhow::Result;
use soundledger_domain_models::job::JobStatus;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, instrument};

/// Pausa del consumidor cuando no hay lotes activos.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Lanza el consumidor lógico único de lotes.
pub fn spawn_batch_broadcaster(application_state: AppState, shutdown_signal: watch::Receiver<bool>) {
    tokio::spawn(async move {
        info!("📡 [BROADCASTER]: Ordered batch drain loop initiated.");

        loop {
            if *shutdown_signal.borrow() {
                info!("📡 [BROADCASTER]: Cancel observed; loop retired.");
                break;
            }

            match drain_oldest_batch_once(&application_state).await {
                Ok(Some(batch_id)) => {
                    info!("🏁 [BROADCASTER]: Batch [{}] fully drained.", batch_id);
                }
                Ok(None) => sleep(IDLE_POLL_INTERVAL).await,
                Err(drain_fault) => {
                    error!("❌ [BROADCASTER]: Drain cycle collapsed: {}", drain_fault);
                    sleep(IDLE_POLL_INTERVAL).await;
                }
            }
        }
    });
}

/**
 * Selecciona el lote activo más antiguo y lo drena por completo.
 * Retorna el identificador del lote drenado, o `None` si no había.
 */
#[instrument(skip(application_state))]
pub async fn drain_oldest_batch_once(application_state: &AppState) -> Result<Option<String>> {
    let Some(batch_id) = application_state.job_repository.oldest_active_batch().await? else {
        return Ok(None);
    };

    loop {
        // 1. RECLAMO ORDENADO: menor batch_seq pendiente -> 'sending'.
        let Some(claimed_job) = application_state
            .job_repository
            .claim_next_in_batch(&batch_id)
            .await?
        else {
            // Lote drenado (todos en estado terminal o en vuelo ajeno).
            application_state
                .job_repository
                .complete_batch_if_drained(&batch_id)
                .await?;
            break;
        };

        // 2-5. CICLO DE ANCLAJE con estrangulamiento por ficha.
        execute_anchor_cycle(
            application_state,
            &claimed_job,
            JobStatus::Sending,
            Some(application_state.broadcast_throttle.as_ref()),
        )
        .await?;
    }

    Ok(Some(batch_id))
}
