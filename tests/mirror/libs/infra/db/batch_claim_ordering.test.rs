// [tests/mirror/libs/infra/db/batch_claim_ordering.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LOTES Y RECUPERACIÓN (V2.1)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L3-MIRROR)
 * RESPONSABILIDAD: AUDITORÍA DE FORMACIÓN DENSA, DRENADO ORDENADO Y UNSTICK
 *
 * Certifica: posiciones densas 1..k por antigüedad, reclamo ordenado
 * hacia 'sending', selección del lote activo más antiguo, sellado de
 * lote drenado y la única arista de retroceso (unstick por TTL).
 * =================================================================
 */

use soundledger_domain_models::job::JobStatus;
use soundledger_infra_db::repositories::job::AdmissionDraft;
use soundledger_infra_db::repositories::JobRepository;
use soundledger_infra_db::TursoClient;

async fn admit_sequence(repository: &JobRepository, count: usize, tag: &str) -> Vec<String> {
    let mut admitted_job_ids = Vec::new();
    for index in 0..count {
        let outcome = repository
            .admit(AdmissionDraft {
                record_id: format!("REC-{}-{}", tag, index),
                canonical_body: format!(r#"{{"recordId":"REC-{}-{}"}}"#, tag, index),
                record_hash: format!("{:064x}", 0x1000 + index + tag.len() * 4096),
                signer_public_key: "02".repeat(33),
                nonce: format!("nonce-{}-{}", tag, index),
            })
            .await
            .expect("admission must succeed");
        admitted_job_ids.push(outcome.job_id);
    }
    admitted_job_ids
}

#[tokio::test]
async fn certify_dense_batch_formation_and_ordered_drain() {
    println!("\n📦 [INICIO]: Auditoría de formación y drenado de lotes...");

    let database_client = TursoClient::connect("file:mem_batch_v2?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.");
    let job_repository = JobRepository::new(database_client.clone());

    let first_wave = admit_sequence(&job_repository, 5, "w1").await;

    // Lote de a lo sumo 3: posiciones densas 1..3 en orden de creación.
    let (first_batch_id, first_claims) = job_repository
        .claim_queued_batch(3)
        .await
        .unwrap()
        .expect("first batch must form");
    assert_eq!(first_claims.len(), 3);
    for (index, claim) in first_claims.iter().enumerate() {
        assert_eq!(claim.batch_seq, index as i64 + 1);
        assert_eq!(claim.job_id, first_wave[index]);
    }

    // El remanente forma un segundo lote denso 1..2.
    let (second_batch_id, second_claims) = job_repository
        .claim_queued_batch(10)
        .await
        .unwrap()
        .expect("second batch must form");
    assert_eq!(second_claims.len(), 2);
    assert_eq!(second_claims[0].batch_seq, 1);
    assert_eq!(second_claims[1].batch_seq, 2);
    assert_ne!(first_batch_id, second_batch_id);

    // Cola vacía: el recolector no forma lotes.
    assert!(job_repository.claim_queued_batch(10).await.unwrap().is_none());

    // El lote activo más antiguo es el primero.
    assert_eq!(
        job_repository.oldest_active_batch().await.unwrap().as_deref(),
        Some(first_batch_id.as_str())
    );

    // Drenado ordenado: el reclamo entrega siempre la menor posición.
    let mut drained_sequence = Vec::new();
    while let Some(claimed) = job_repository.claim_next_in_batch(&first_batch_id).await.unwrap() {
        assert_eq!(claimed.status, JobStatus::Sending);
        assert!(claimed.sending_started_at.is_some());
        drained_sequence.push(claimed.batch_seq.unwrap());
        assert!(job_repository
            .mark_sent(&claimed.job_id, JobStatus::Sending, &format!("tx-{}", claimed.batch_seq.unwrap()))
            .await
            .unwrap());
    }
    assert_eq!(drained_sequence, vec![1, 2, 3]);

    // Lote drenado: sellado y relevo al siguiente más antiguo.
    assert!(job_repository.complete_batch_if_drained(&first_batch_id).await.unwrap());
    assert_eq!(
        job_repository.oldest_active_batch().await.unwrap().as_deref(),
        Some(second_batch_id.as_str())
    );

    println!("✅ [CERTIFICADO]: Densidad, orden y relevo de lotes.");
}

#[tokio::test]
async fn certify_unstick_reverts_stalled_sending_only_past_ttl() {
    let database_client = TursoClient::connect("file:mem_unstick_v2?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.");
    let job_repository = JobRepository::new(database_client.clone());

    admit_sequence(&job_repository, 2, "u1").await;
    let (batch_id, _) = job_repository.claim_queued_batch(10).await.unwrap().unwrap();

    // Difusor caído tras reclamar la posición 1 (quedó en 'sending').
    let stalled = job_repository.claim_next_in_batch(&batch_id).await.unwrap().unwrap();
    assert_eq!(stalled.batch_seq, Some(1));

    // Un 'sending' fresco no se revierte: el TTL aún gobierna.
    assert_eq!(job_repository.unstick_stalled_sending(120).await.unwrap(), 0);

    // Vencimiento forzado del instante de inicio.
    let raw_connection = database_client.get_connection().unwrap();
    raw_connection
        .execute(
            "UPDATE publish_jobs SET sending_started_at = datetime('now', '-600 seconds') WHERE job_id = ?1",
            libsql::params![stalled.job_id.clone()],
        )
        .await
        .unwrap();

    // La única arista de retroceso: sending -> processing_batch.
    assert_eq!(job_repository.unstick_stalled_sending(120).await.unwrap(), 1);

    // El difusor reanuda exactamente en la posición recuperada (S8).
    let resumed = job_repository.claim_next_in_batch(&batch_id).await.unwrap().unwrap();
    assert_eq!(resumed.job_id, stalled.job_id);
    assert_eq!(resumed.batch_seq, Some(1));
}
