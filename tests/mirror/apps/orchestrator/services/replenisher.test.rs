// [tests/mirror/apps/orchestrator/services/replenisher.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL REPONEDOR (V2.1)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L4-MIRROR)
 * RESPONSABILIDAD: AUDITORÍA DE FRAGMENTACIÓN Y PROFUNDIDAD DE POOL
 *
 * Certifica: fragmentación cuando la profundidad cae bajo el umbral,
 * registro atómico de las salidas acuñadas, enfriamiento entre
 * fragmentaciones y alarma de capacidad sin financiamiento.
 * =================================================================
 */

use soundledger_domain_models::utxo::UtxoPurpose;
use soundledger_domain_txforge::p2pkh_script_for_address;
use soundledger_infra_broadcast::emulation::ScriptedLedgerUplink;
use soundledger_infra_db::TursoClient;
use soundledger_orchestrator::config::{ServiceConfig, WorkerMode};
use soundledger_orchestrator::services::replenisher::{replenish_once, ReplenishVerdict};
use soundledger_orchestrator::state::AppState;
use std::sync::Arc;

fn config_fixture(database_url: &str) -> ServiceConfig {
    ServiceConfig {
        database_url: database_url.to_string(),
        database_auth_token: None,
        listening_port: 0,
        ledger_broadcast_url: "http://localhost:9/unused".into(),
        server_signing_key_hex: "33".repeat(32),
        change_address: None,
        timestamp_skew_seconds: 600,
        utxo_lease_seconds: 300,
        sending_ttl_seconds: 120,
        unstick_interval_ms: 30_000,
        worker_mode: WorkerMode::Batch,
        batch_window_ms: 5_000,
        max_batch_size: 500,
        rate_limit_capacity: 500,
        rate_limit_window_ms: 3_000,
        fee_rate_sats_per_kb: 100,
        broadcast_timeout_seconds: 30,
        pool_unit_satoshis: 100,
        // Umbral alto a propósito: dos pasadas seguidas siguen "bajo mínimo".
        pool_min_size: 50,
        pool_split_target: 20,
        pool_check_interval_ms: 30_000,
        pool_split_cooldown_ms: 600_000,
    }
}

async fn replenisher_state(database_url: &str) -> AppState {
    let database_client = TursoClient::connect(database_url, None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.");
    AppState::assemble(
        config_fixture(database_url),
        database_client,
        Arc::new(ScriptedLedgerUplink::always_accepting()),
    )
    .expect("state assembly must succeed")
}

async fn seed_funding_input(application_state: &AppState, satoshis: i64) {
    let locking_script = p2pkh_script_for_address(&application_state.pool_address).unwrap();
    application_state
        .utxo_repository
        .insert_external_output(
            &"fa".repeat(32),
            0,
            satoshis,
            &hex::encode(locking_script),
            &application_state.pool_address,
            UtxoPurpose::Funding,
        )
        .await
        .expect("funding seed must succeed");
}

#[tokio::test]
async fn certify_split_mints_units_and_seals_source() {
    println!("\n🌱 [INICIO]: Auditoría de fragmentación del reponedor...");

    let application_state =
        replenisher_state("file:mem_replenish_v2?mode=memory&cache=shared").await;
    seed_funding_input(&application_state, 1_000_000).await;

    let mut last_split_instant = None;

    // 1. PROFUNDIDAD BAJO MÍNIMO -> FRAGMENTACIÓN COMPLETA (K = objetivo).
    let verdict = replenish_once(&application_state, &mut last_split_instant)
        .await
        .unwrap();
    let ReplenishVerdict::SplitBroadcast { txid, unit_count } = verdict else {
        panic!("expected SplitBroadcast, got {:?}", verdict);
    };
    assert_eq!(unit_count, 20);

    // 2. REGISTRO ATÓMICO: 20 unidades disponibles, fuente gastada, cambio acuñado.
    let depth = application_state.utxo_repository.depth_snapshot(100).await.unwrap();
    assert_eq!(depth.available_publish_count, 20);
    assert_eq!(depth.spent_count, 1);

    let spent_rows = application_state
        .utxo_repository
        .find_by_spending_transaction(&txid)
        .await
        .unwrap();
    assert_eq!(spent_rows.len(), 1, "exactly the source input carries the split txid");

    // El cambio es reutilizable como financiamiento futuro.
    let change_input = application_state
        .utxo_repository
        .reserve_largest_funding(300, 1_000)
        .await
        .unwrap()
        .expect("change output must be reusable as funding");
    assert!(change_input.satoshis > 900_000);
    application_state.utxo_repository.release(change_input.id).await.unwrap();

    // 3. ENFRIAMIENTO: la profundidad sigue bajo mínimo pero no se fragmenta.
    let cooled = replenish_once(&application_state, &mut last_split_instant)
        .await
        .unwrap();
    assert_eq!(cooled, ReplenishVerdict::CoolingDown);

    println!("✅ [CERTIFICADO]: Fragmentación, registro y enfriamiento.");
}

#[tokio::test]
async fn certify_capacity_alarm_without_funding() {
    let application_state =
        replenisher_state("file:mem_replenish_dry_v2?mode=memory&cache=shared").await;

    let mut last_split_instant = None;
    let verdict = replenish_once(&application_state, &mut last_split_instant)
        .await
        .unwrap();
    assert_eq!(verdict, ReplenishVerdict::NoFundingInput);

    // Sin efectos colaterales sobre el pool.
    let depth = application_state.utxo_repository.depth_snapshot(100).await.unwrap();
    assert_eq!(depth.available_publish_count, 0);
    assert_eq!(depth.spent_count, 0);
}

#[tokio::test]
async fn certify_healthy_pool_is_left_untouched() {
    let application_state =
        replenisher_state("file:mem_replenish_full_v2?mode=memory&cache=shared").await;

    // Pool por encima del umbral (50): 60 unidades disponibles.
    for index in 0..60u32 {
        application_state
            .utxo_repository
            .insert_external_output(
                &format!("{:064x}", 0xfeed_0000u64 + u64::from(index)),
                0,
                100,
                "76a914000000000000000000000000000000000000000088ac",
                &application_state.pool_address,
                UtxoPurpose::Publish,
            )
            .await
            .unwrap();
    }

    let mut last_split_instant = None;
    let verdict = replenish_once(&application_state, &mut last_split_instant)
        .await
        .unwrap();
    assert_eq!(verdict, ReplenishVerdict::PoolHealthy);
}
