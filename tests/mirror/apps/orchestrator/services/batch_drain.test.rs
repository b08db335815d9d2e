// [tests/mirror/apps/orchestrator/services/batch_drain.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL MODO LOTE (V2.2)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L4-MIRROR)
 * RESPONSABILIDAD: AUDITORÍA DE RECOLECCIÓN, DRENADO ORDENADO Y RECUPERACIÓN
 *
 * El enlace emulado asigna txids sintéticos secuenciales, por lo que
 * la correspondencia txid <-> batch_seq certifica el orden estricto
 * de difusión dentro del lote y entre lotes.
 * =================================================================
 */

use soundledger_core_canonical::sha256_hex;
use soundledger_domain_models::job::JobStatus;
use soundledger_domain_models::utxo::UtxoPurpose;
use soundledger_infra_broadcast::emulation::ScriptedLedgerUplink;
use soundledger_infra_db::repositories::job::AdmissionDraft;
use soundledger_infra_db::TursoClient;
use soundledger_orchestrator::config::{ServiceConfig, WorkerMode};
use soundledger_orchestrator::services::batch_broadcaster::drain_oldest_batch_once;
use soundledger_orchestrator::services::batch_collector::collect_once;
use soundledger_orchestrator::state::AppState;
use std::sync::Arc;

fn config_fixture(database_url: &str) -> ServiceConfig {
    ServiceConfig {
        database_url: database_url.to_string(),
        database_auth_token: None,
        listening_port: 0,
        ledger_broadcast_url: "http://localhost:9/unused".into(),
        server_signing_key_hex: "22".repeat(32),
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
        pool_min_size: 50_000,
        pool_split_target: 100_000,
        pool_check_interval_ms: 30_000,
        pool_split_cooldown_ms: 600_000,
    }
}

async fn batch_state(database_url: &str, uplink: Arc<ScriptedLedgerUplink>) -> AppState {
    let database_client = TursoClient::connect(database_url, None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.");
    AppState::assemble(config_fixture(database_url), database_client, uplink)
        .expect("state assembly must succeed")
}

async fn admit_wave(application_state: &AppState, count: usize, tag: &str) -> Vec<String> {
    let mut job_ids = Vec::new();
    for index in 0..count {
        let body = format!(r#"{{"recordId":"REC-{}-{}"}}"#, tag, index);
        let outcome = application_state
            .job_repository
            .admit(AdmissionDraft {
                record_id: format!("REC-{}-{}", tag, index),
                canonical_body: body.clone(),
                record_hash: sha256_hex(body.as_bytes()),
                signer_public_key: "02".repeat(33),
                nonce: format!("nonce-{}-{}", tag, index),
            })
            .await
            .expect("admission must succeed");
        job_ids.push(outcome.job_id);
    }
    job_ids
}

async fn seed_pool(application_state: &AppState, count: u32) {
    for index in 0..count {
        application_state
            .utxo_repository
            .insert_external_output(
                &format!("{:064x}", 0xeeee_0000u64 + u64::from(index)),
                0,
                100,
                "76a914000000000000000000000000000000000000000088ac",
                &application_state.pool_address,
                UtxoPurpose::Publish,
            )
            .await
            .expect("seed insert must succeed");
    }
}

#[tokio::test]
async fn certify_ordered_batch_drain_across_batches() {
    println!("\n📡 [INICIO]: Auditoría del drenado ordenado de lotes...");

    let uplink = Arc::new(ScriptedLedgerUplink::always_accepting());
    let application_state =
        batch_state("file:mem_drain_v2?mode=memory&cache=shared", uplink.clone()).await;

    let first_wave = admit_wave(&application_state, 4, "b1").await;
    seed_pool(&application_state, 10).await;

    // Primer lote formado con los 4 trabajos.
    let (first_batch_id, first_count) = collect_once(&application_state)
        .await
        .unwrap()
        .expect("first batch must form");
    assert_eq!(first_count, 4);

    // Segunda ola admitida tras el primer lote: lote más joven.
    let second_wave = admit_wave(&application_state, 2, "b2").await;
    let (_second_batch_id, second_count) = collect_once(&application_state)
        .await
        .unwrap()
        .expect("second batch must form");
    assert_eq!(second_count, 2);

    // El drenado ataca primero el lote más antiguo.
    let drained = drain_oldest_batch_once(&application_state).await.unwrap();
    assert_eq!(drained.as_deref(), Some(first_batch_id.as_str()));

    // Los txids sintéticos 1..4 certifican el orden por batch_seq (P6).
    for (index, job_id) in first_wave.iter().enumerate() {
        let job = application_state
            .job_repository
            .find_by_job_id(job_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.status, JobStatus::Sent);
        assert_eq!(job.batch_seq, Some(index as i64 + 1));
        assert_eq!(
            job.ledger_transaction_id.as_deref(),
            Some(format!("{:064x}", index + 1).as_str())
        );
    }

    // El lote joven espera su turno y drena después (5 y 6).
    let drained_second = drain_oldest_batch_once(&application_state).await.unwrap();
    assert!(drained_second.is_some());
    for (index, job_id) in second_wave.iter().enumerate() {
        let job = application_state
            .job_repository
            .find_by_job_id(job_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.status, JobStatus::Sent);
        assert_eq!(
            job.ledger_transaction_id.as_deref(),
            Some(format!("{:064x}", index + 5).as_str())
        );
    }

    // Sin lotes activos restantes.
    assert!(drain_oldest_batch_once(&application_state).await.unwrap().is_none());
    assert_eq!(uplink.transmission_count(), 6);

    println!("✅ [CERTIFICADO]: Orden estricto dentro y entre lotes.");
}

#[tokio::test]
async fn certify_crash_recovery_resumes_at_recovered_seq() {
    let uplink = Arc::new(ScriptedLedgerUplink::always_accepting());
    let application_state =
        batch_state("file:mem_recovery_v2?mode=memory&cache=shared", uplink).await;

    admit_wave(&application_state, 2, "r1").await;
    seed_pool(&application_state, 4).await;

    let (batch_id, _) = collect_once(&application_state).await.unwrap().unwrap();

    // Difusor caído: la posición 1 quedó en 'sending' sin sellado.
    let stalled = application_state
        .job_repository
        .claim_next_in_batch(&batch_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stalled.batch_seq, Some(1));

    // Reinicio tras el TTL: la pasada de unstick revierte la posición 1.
    let raw_connection = application_state.database_client.get_connection().unwrap();
    raw_connection
        .execute(
            "UPDATE publish_jobs SET sending_started_at = datetime('now', '-600 seconds') WHERE job_id = ?1",
            libsql::params![stalled.job_id.clone()],
        )
        .await
        .unwrap();
    assert_eq!(
        application_state
            .job_repository
            .unstick_stalled_sending(120)
            .await
            .unwrap(),
        1
    );

    // El difusor reanuda en la posición recuperada y drena el lote completo.
    let drained = drain_oldest_batch_once(&application_state).await.unwrap();
    assert_eq!(drained.as_deref(), Some(batch_id.as_str()));

    let recovered = application_state
        .job_repository
        .find_by_job_id(&stalled.job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(recovered.status, JobStatus::Sent);
    assert_eq!(recovered.batch_seq, Some(1));
}

#[tokio::test]
async fn certify_pool_exhaustion_mid_batch_fails_jobs_in_order() {
    let uplink = Arc::new(ScriptedLedgerUplink::always_accepting());
    let application_state =
        batch_state("file:mem_drain_dry_v2?mode=memory&cache=shared", uplink).await;

    let wave = admit_wave(&application_state, 3, "d1").await;
    // Solo una entrada: las posiciones 2 y 3 fallan por NoCapacity.
    seed_pool(&application_state, 1).await;

    collect_once(&application_state).await.unwrap().unwrap();
    drain_oldest_batch_once(&application_state).await.unwrap();

    let first = application_state
        .job_repository
        .find_by_job_id(&wave[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.status, JobStatus::Sent);

    for job_id in &wave[1..] {
        let starved = application_state
            .job_repository
            .find_by_job_id(job_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(starved.status, JobStatus::Failed);
        assert_eq!(starved.error_code.as_deref(), Some("NoCapacity"));
    }
}
