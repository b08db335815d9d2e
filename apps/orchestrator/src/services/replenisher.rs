// [apps/orchestrator/src/services/replenisher.rs]
/*!
 * =================================================================
 * APARATO: POOL REPLENISHER (V5.3)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: MANTENIMIENTO DE PROFUNDIDAD DEL POOL PUBLISH
 *
 * Cadencia lenta: si la profundidad publish cae bajo el umbral y el
 * enfriamiento venció, fragmenta la entrada de financiamiento más
 * grande en K salidas unitarias más cambio. El enfriamiento evita el
 * thrash cuando la profundidad baja momentáneamente por reservas.
 * =================================================================
 */

use crate::state::AppState;
use anyhow::Result;
use serde_json::json;
use soundledger_domain_models::audit::AuditEventDraft;
use soundledger_infra_broadcast::BroadcastOutcome;
use soundledger_domain_txforge::p2pkh_script_for_address;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Veredicto de una pasada del reponedor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplenishVerdict {
    /// La profundidad supera el umbral; nada que hacer.
    PoolHealthy,
    /// El enfriamiento posterior a la última fragmentación sigue activo.
    CoolingDown,
    /// Alarma de capacidad: no existe entrada de financiamiento suficiente.
    NoFundingInput,
    /// Fragmentación difundida y registrada.
    SplitBroadcast { txid: String, unit_count: u32 },
    /// La difusión de la fragmentación falló.
    SplitFailed { detail: String },
}

/// Lanza el monitor perpetuo de profundidad del pool.
pub fn spawn_replenisher(application_state: AppState, shutdown_signal: watch::Receiver<bool>) {
    let check_interval = Duration::from_millis(application_state.config.pool_check_interval_ms);

    tokio::spawn(async move {
        info!(
            "🌱 [REPLENISHER]: Pool depth monitor initiated (min {}, target split {}).",
            application_state.config.pool_min_size, application_state.config.pool_split_target
        );

        let mut last_split_instant: Option<Instant> = None;

        loop {
            sleep(check_interval).await;
            if *shutdown_signal.borrow() {
                info!("🌱 [REPLENISHER]: Cancel observed; monitor retired.");
                break;
            }

            match replenish_once(&application_state, &mut last_split_instant).await {
                Ok(ReplenishVerdict::SplitBroadcast { txid, unit_count }) => {
                    info!("🌱 [REPLENISHER]: Split [{}] minted {} unit inputs.", txid, unit_count);
                }
                Ok(ReplenishVerdict::NoFundingInput) => {
                    // La alarma ya quedó registrada dentro de la pasada.
                }
                Ok(_) => {}
                Err(replenish_fault) => {
                    error!("❌ [REPLENISHER]: Depth cycle collapsed: {}", replenish_fault);
                }
            }
        }
    });
}

/**
 * Una pasada del monitor. El instante de la última fragmentación vive
 * en memoria de proceso: tras un reinicio puede fragmentarse una vez
 * antes de tiempo, pero la verificación de profundidad sigue gobernando.
 */
#[instrument(skip(application_state, last_split_instant))]
pub async fn replenish_once(
    application_state: &AppState,
    last_split_instant: &mut Option<Instant>,
) -> Result<ReplenishVerdict> {
    let config = &application_state.config;

    // 1. PROFUNDIDAD ACTUAL del estrato publish al valor unitario.
    let depth = application_state
        .utxo_repository
        .depth_snapshot(config.pool_unit_satoshis)
        .await?;
    if depth.available_publish_count >= config.pool_min_size {
        return Ok(ReplenishVerdict::PoolHealthy);
    }

    // 2. ENFRIAMIENTO posterior a la última fragmentación.
    let cooldown = Duration::from_millis(config.pool_split_cooldown_ms);
    if let Some(previous_split) = last_split_instant {
        if previous_split.elapsed() < cooldown {
            return Ok(ReplenishVerdict::CoolingDown);
        }
    }

    // 3. RESERVA de la entrada de financiamiento más grande utilizable.
    let minimum_useful_satoshis = config.pool_unit_satoshis * 2;
    let Some(funding_input) = application_state
        .utxo_repository
        .reserve_largest_funding(config.utxo_lease_seconds, minimum_useful_satoshis)
        .await?
    else {
        warn!(
            "🚨 [CAPACITY_ALARM]: Publish depth {} below minimum {} and no funding input available.",
            depth.available_publish_count, config.pool_min_size
        );
        return Ok(ReplenishVerdict::NoFundingInput);
    };

    // 4. FAN-OUT ASEQUIBLE, acotado por el objetivo del contrato.
    let affordable_units = affordable_unit_count(
        funding_input.satoshis,
        config.pool_unit_satoshis,
        config.fee_rate_sats_per_kb,
        config.pool_split_target,
    );
    if affordable_units == 0 {
        application_state.utxo_repository.release(funding_input.id).await?;
        warn!(
            "🚨 [CAPACITY_ALARM]: Largest funding input ({} sats) cannot mint a single unit.",
            funding_input.satoshis
        );
        return Ok(ReplenishVerdict::NoFundingInput);
    }

    // 5. FORJA de la transacción de fragmentación.
    let forged_split = match application_state.transaction_forge.forge_split_transaction(
        &funding_input,
        affordable_units,
        config.pool_unit_satoshis,
        &application_state.pool_address,
        &application_state.change_address,
    ) {
        Ok(forged) => forged,
        Err(forge_fault) => {
            application_state.utxo_repository.release(funding_input.id).await?;
            return Ok(ReplenishVerdict::SplitFailed {
                detail: forge_fault.to_string(),
            });
        }
    };

    // 6. DIFUSIÓN Y REGISTRO.
    let outcome = application_state
        .ledger_uplink
        .transmit_raw_transaction(&forged_split.raw_hex)
        .await;

    match outcome {
        BroadcastOutcome::Accepted { txid } => {
            let unit_script_hex =
                hex::encode(p2pkh_script_for_address(&application_state.pool_address)?);
            let change_script_hex =
                hex::encode(p2pkh_script_for_address(&application_state.change_address)?);

            application_state
                .utxo_repository
                .register_split_outputs(
                    funding_input.id,
                    &txid,
                    forged_split.unit_output_count,
                    config.pool_unit_satoshis,
                    &unit_script_hex,
                    &application_state.pool_address,
                    forged_split.change_vout,
                    forged_split.change_satoshis,
                    &change_script_hex,
                    &application_state.change_address,
                )
                .await?;

            let audit_draft = AuditEventDraft {
                event_type: "POOL_SPLIT".to_string(),
                actor_public_key: "SYSTEM".to_string(),
                resource_type: "utxo_pool".to_string(),
                resource_id: txid.clone(),
                action: "split".to_string(),
                details: json!({
                    "unitCount": forged_split.unit_output_count,
                    "unitSatoshis": config.pool_unit_satoshis,
                    "changeSatoshis": forged_split.change_satoshis,
                    "feeSatoshis": forged_split.fee_satoshis,
                }),
            };
            if let Err(audit_fault) = application_state.audit_repository.append(audit_draft).await {
                error!("⚠️ [AUDIT_FAULT]: Split trail append failed: {}", audit_fault);
            }

            *last_split_instant = Some(Instant::now());
            Ok(ReplenishVerdict::SplitBroadcast {
                txid,
                unit_count: forged_split.unit_output_count,
            })
        }
        BroadcastOutcome::MempoolConflict { detail } => {
            application_state.utxo_repository.mark_dirty(funding_input.id).await?;
            error!("🛑 [REPLENISHER]: Split hit a mempool conflict: {}", detail);
            Ok(ReplenishVerdict::SplitFailed { detail })
        }
        BroadcastOutcome::TransientNetwork { detail }
        | BroadcastOutcome::PermanentReject { detail } => {
            application_state.utxo_repository.release(funding_input.id).await?;
            error!("❌ [REPLENISHER]: Split broadcast failed: {}", detail);
            Ok(ReplenishVerdict::SplitFailed { detail })
        }
    }
}

/**
 * Máximo K <= objetivo tal que K salidas unitarias, la comisión y un
 * cambio mínimo de 1 sat caben en el valor de la entrada.
 *
 * Aproximación de tamaño: ~160 bytes fijos más ~34 por salida.
 */
fn affordable_unit_count(
    available_satoshis: i64,
    unit_value_satoshis: i64,
    fee_rate_sats_per_kb: i64,
    split_target: u32,
) -> u32 {
    const FIXED_OVERHEAD_BYTES: f64 = 200.0;
    const BYTES_PER_OUTPUT: f64 = 34.0;

    let rate_per_byte = fee_rate_sats_per_kb as f64 / 1000.0;
    let spendable = (available_satoshis - 1) as f64 - FIXED_OVERHEAD_BYTES * rate_per_byte;
    if spendable <= 0.0 {
        return 0;
    }

    let per_unit_cost = unit_value_satoshis as f64 + BYTES_PER_OUTPUT * rate_per_byte;
    let affordable = (spendable / per_unit_cost).floor();
    if affordable < 1.0 {
        return 0;
    }
    (affordable as u64).min(u64::from(split_target)) as u32
}
