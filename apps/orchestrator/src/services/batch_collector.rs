// [apps/orchestrator/src/services/batch_collector.rs]
/*!
 * =================================================================
 * APARATO: BATCH COLLECTOR (V5.1)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: FORMACIÓN PERIÓDICA DE LOTES DE DIFUSIÓN
 *
 * Cada ventana W reclama hasta MAX_BATCH_SIZE trabajos 'queued' hacia
 * un lote fresco con posiciones densas 1..k por antigüedad. Ese orden
 * de lote es inmutable y gobierna la difusión aguas abajo.
 * =================================================================
 */

use crate::state::AppState;
use anyhow::Result;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{error, info};

/// Lanza el bucle perpetuo del recolector.
pub fn spawn_batch_collector(application_state: AppState, shutdown_signal: watch::Receiver<bool>) {
    let window = Duration::from_millis(application_state.config.batch_window_ms);

    tokio::spawn(async move {
        info!(
            "📦 [COLLECTOR]: Batch formation loop initiated (window {}ms, max {}).",
            application_state.config.batch_window_ms, application_state.config.max_batch_size
        );

        let mut collection_ticker = interval(window);
        loop {
            collection_ticker.tick().await;
            if *shutdown_signal.borrow() {
                info!("📦 [COLLECTOR]: Cancel observed; loop retired.");
                break;
            }

            match collect_once(&application_state).await {
                Ok(Some((batch_id, claimed_count))) => {
                    info!("📦 [COLLECTOR]: Batch [{}] formed with {} job(s).", batch_id, claimed_count);
                }
                Ok(None) => {} // Cola vacía: el recolector no forma lotes.
                Err(collection_fault) => {
                    error!("❌ [COLLECTOR]: Batch formation collapsed: {}", collection_fault);
                }
            }
        }
    });
}

/// Una pasada de recolección. Retorna el lote formado y su cardinalidad.
pub async fn collect_once(application_state: &AppState) -> Result<Option<(String, usize)>> {
    let claimed = application_state
        .job_repository
        .claim_queued_batch(application_state.config.max_batch_size)
        .await?;

    Ok(claimed.map(|(batch_id, jobs)| (batch_id, jobs.len())))
}
