// [tests/mirror/apps/orchestrator/services/single_worker_pipeline.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL WORKER SINGLE (V2.2)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L4-MIRROR)
 * RESPONSABILIDAD: AUDITORÍA DEL CICLO RECLAMO -> FORJA -> DIFUSIÓN -> SELLADO
 *
 * Certifica los escenarios del contrato sobre el enlace emulado:
 * éxito (trabajo sent, entrada spent con rastro), conflicto de mempool
 * (trabajo failed, entrada dirty) y agotamiento del pool (NoCapacity).
 * =================================================================
 */

use soundledger_core_canonical::sha256_hex;
use soundledger_domain_models::job::JobStatus;
use soundledger_domain_models::utxo::UtxoPurpose;
use soundledger_infra_broadcast::emulation::ScriptedLedgerUplink;
use soundledger_infra_broadcast::BroadcastOutcome;
use soundledger_infra_db::repositories::job::AdmissionDraft;
use soundledger_infra_db::TursoClient;
use soundledger_orchestrator::config::{ServiceConfig, WorkerMode};
use soundledger_orchestrator::services::single_worker::process_next_job;
use soundledger_orchestrator::state::AppState;
use std::sync::Arc;

fn config_fixture(database_url: &str) -> ServiceConfig {
    ServiceConfig {
        database_url: database_url.to_string(),
        database_auth_token: None,
        listening_port: 0,
        ledger_broadcast_url: "http://localhost:9/unused".into(),
        server_signing_key_hex: "11".repeat(32),
        change_address: None,
        timestamp_skew_seconds: 600,
        utxo_lease_seconds: 300,
        sending_ttl_seconds: 120,
        unstick_interval_ms: 30_000,
        worker_mode: WorkerMode::Single,
        batch_window_ms: 5_000,
        max_batch_size: 500,
        rate_limit_capacity: 500,
        rate_limit_window_ms: 3_000,
        fee_rate_sats_per_kb: 100,
        broadcast_timeout_seconds: 30,
        pool_unit_satoshis: 100,
        pool_min_size: 50_000,
        pool_split_target: 100_000,
        pool_check_interval_ms: 30_000,
        pool_split_cooldown_ms: 600_000,
    }
}

async fn state_with_uplink(database_url: &str, uplink: Arc<ScriptedLedgerUplink>) -> AppState {
    let database_client = TursoClient::connect(database_url, None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.");
    AppState::assemble(config_fixture(database_url), database_client, uplink)
        .expect("state assembly must succeed")
}

async fn admit_record(application_state: &AppState, tag: &str) -> String {
    let body = format!(r#"{{"recordId":"REC-{}"}}"#, tag);
    application_state
        .job_repository
        .admit(AdmissionDraft {
            record_id: format!("REC-{}", tag),
            canonical_body: body.clone(),
            record_hash: sha256_hex(body.as_bytes()),
            signer_public_key: "02".repeat(33),
            nonce: format!("nonce-{}", tag),
        })
        .await
        .expect("admission must succeed")
        .job_id
}

async fn seed_pool_unit(application_state: &AppState, txid_byte: &str) {
    application_state
        .utxo_repository
        .insert_external_output(
            &txid_byte.repeat(32),
            0,
            100,
            "76a914000000000000000000000000000000000000000088ac",
            &application_state.pool_address,
            UtxoPurpose::Publish,
        )
        .await
        .expect("seed insert must succeed");
}

#[tokio::test]
async fn certify_success_path_seals_job_and_spends_input() {
    println!("\n⚙️  [INICIO]: Auditoría del ciclo single-job (éxito)...");

    let uplink = Arc::new(ScriptedLedgerUplink::new(vec![BroadcastOutcome::Accepted {
        txid: "ledger-tx-T".into(),
    }]));
    let application_state =
        state_with_uplink("file:mem_worker_ok_v2?mode=memory&cache=shared", uplink.clone()).await;

    let job_id = admit_record(&application_state, "S5").await;
    seed_pool_unit(&application_state, "aa").await;

    let final_status = process_next_job(&application_state)
        .await
        .unwrap()
        .expect("one queued job must be processed");
    assert_eq!(final_status, JobStatus::Sent);
    assert_eq!(uplink.transmission_count(), 1);

    // Trabajo sellado con el identificador del ledger.
    let sealed_job = application_state
        .job_repository
        .find_by_job_id(&job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sealed_job.status, JobStatus::Sent);
    assert_eq!(sealed_job.ledger_transaction_id.as_deref(), Some("ledger-tx-T"));
    assert!(sealed_job.sent_at.is_some());

    // Exactamente una fila gastada por ese txid (P8).
    let spent_rows = application_state
        .utxo_repository
        .find_by_spending_transaction("ledger-tx-T")
        .await
        .unwrap();
    assert_eq!(spent_rows.len(), 1);

    // Cola vacía tras el ciclo.
    assert!(process_next_job(&application_state).await.unwrap().is_none());

    println!("✅ [CERTIFICADO]: Ruta de éxito S5.");
}

#[tokio::test]
async fn certify_mempool_conflict_quarantines_input() {
    let uplink = Arc::new(ScriptedLedgerUplink::new(vec![BroadcastOutcome::MempoolConflict {
        detail: "258: txn-mempool-conflict".into(),
    }]));
    let application_state =
        state_with_uplink("file:mem_worker_conflict_v2?mode=memory&cache=shared", uplink).await;

    let job_id = admit_record(&application_state, "S6").await;
    seed_pool_unit(&application_state, "bb").await;

    let final_status = process_next_job(&application_state).await.unwrap().unwrap();
    assert_eq!(final_status, JobStatus::Failed);

    let sealed_job = application_state
        .job_repository
        .find_by_job_id(&job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sealed_job.status, JobStatus::Failed);
    assert_eq!(sealed_job.error_code.as_deref(), Some("MempoolConflict"));

    // La entrada quedó disponible pero sucia: inelegible para reserva.
    assert!(application_state
        .utxo_repository
        .reserve(300)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn certify_pool_exhaustion_fails_job_as_no_capacity() {
    let uplink = Arc::new(ScriptedLedgerUplink::always_accepting());
    let application_state =
        state_with_uplink("file:mem_worker_dry_v2?mode=memory&cache=shared", uplink.clone()).await;

    let job_id = admit_record(&application_state, "DRY").await;

    let final_status = process_next_job(&application_state).await.unwrap().unwrap();
    assert_eq!(final_status, JobStatus::Failed);

    let sealed_job = application_state
        .job_repository
        .find_by_job_id(&job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sealed_job.error_code.as_deref(), Some("NoCapacity"));

    // Nada llegó al ledger.
    assert_eq!(uplink.transmission_count(), 0);
}

#[tokio::test]
async fn certify_transient_network_releases_input() {
    let uplink = Arc::new(ScriptedLedgerUplink::new(vec![BroadcastOutcome::TransientNetwork {
        detail: "timeout after 30s".into(),
    }]));
    let application_state =
        state_with_uplink("file:mem_worker_transient_v2?mode=memory&cache=shared", uplink).await;

    let job_id = admit_record(&application_state, "NET").await;
    seed_pool_unit(&application_state, "cc").await;

    let final_status = process_next_job(&application_state).await.unwrap().unwrap();
    assert_eq!(final_status, JobStatus::Failed);

    let sealed_job = application_state
        .job_repository
        .find_by_job_id(&job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sealed_job.error_code.as_deref(), Some("TransientNetwork"));

    // La entrada fue liberada y vuelve a ser reservable.
    assert!(application_state
        .utxo_repository
        .reserve(300)
        .await
        .unwrap()
        .is_some());
}
