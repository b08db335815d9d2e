// [apps/orchestrator/src/services/unstick.rs]
/*!
 * =================================================================
 * APARATO: UNSTICK GUARD (V5.0)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: RECUPERACIÓN DE TRABAJOS 'SENDING' ESTANCADOS
 *
 * Corre una pasada inmediata en el arranque (recuperación post-crash)
 * y luego periódicamente. La única arista de retroceso de la máquina
 * de estados pasa por aquí, acotada por el TTL del contrato.
 * =================================================================
 */

use crate::state::AppState;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{error, info};

/// Lanza el guardia de recuperación en el reactor de Tokio.
pub fn spawn_unstick_guard(application_state: AppState, shutdown_signal: watch::Receiver<bool>) {
    let sweep_interval = Duration::from_millis(application_state.config.unstick_interval_ms);
    let sending_ttl = application_state.config.sending_ttl_seconds;

    tokio::spawn(async move {
        info!(
            "♻️  [UNSTICK]: Recovery guard initiated (TTL {}s, sweep every {}ms).",
            sending_ttl, application_state.config.unstick_interval_ms
        );

        let mut sweep_ticker = interval(sweep_interval);
        loop {
            // El primer tick es inmediato: la pasada de arranque del contrato.
            sweep_ticker.tick().await;
            if *shutdown_signal.borrow() {
                info!("♻️  [UNSTICK]: Cancel observed; guard retired.");
                break;
            }

            if let Err(sweep_fault) = application_state
                .job_repository
                .unstick_stalled_sending(sending_ttl)
                .await
            {
                error!("❌ [UNSTICK]: Recovery sweep collapsed: {}", sweep_fault);
            }
        }
    });
}
