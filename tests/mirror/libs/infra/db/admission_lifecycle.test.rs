// [tests/mirror/libs/infra/db/admission_lifecycle.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL CICLO DE ADMISIÓN (V2.0)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L3-MIRROR)
 * RESPONSABILIDAD: AUDITORÍA DE ADMISIÓN TRANSACCIONAL E IDEMPOTENCIA
 *
 * Certifica los escenarios del contrato: admisión fresca, repetición
 * de nonce y colisión de huella (idempotencia), más el rastro de
 * auditoría y las guardias de transición de estado.
 * =================================================================
 */

use soundledger_domain_models::errors::ErrorCode;
use soundledger_domain_models::job::JobStatus;
use soundledger_infra_db::repositories::job::AdmissionDraft;
use soundledger_infra_db::repositories::{AuditRepository, JobRepository};
use soundledger_infra_db::{DbError, TursoClient};

fn draft(record_id: &str, body: &str, hash: &str, signer: &str, nonce: &str) -> AdmissionDraft {
    AdmissionDraft {
        record_id: record_id.to_string(),
        canonical_body: body.to_string(),
        record_hash: hash.to_string(),
        signer_public_key: signer.to_string(),
        nonce: nonce.to_string(),
    }
}

#[tokio::test]
async fn certify_admission_transaction_and_idempotency() {
    println!("\n🗄️  [INICIO]: Auditoría del ciclo de admisión...");

    let database_client = TursoClient::connect("file:mem_admission_v2?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.");

    let job_repository = JobRepository::new(database_client.clone());
    let audit_repository = AuditRepository::new(database_client.clone());

    let signer = "02".repeat(33);
    let hash_one = "a1".repeat(32);

    // --- S1: ADMISIÓN FRESCA ---
    let first_admission = job_repository
        .admit(draft("REC-1", r#"{"recordId":"REC-1"}"#, &hash_one, &signer, "n1"))
        .await
        .expect("fresh admission must succeed");
    assert!(!first_admission.duplicate_record);

    let stored_job = job_repository
        .find_by_job_id(&first_admission.job_id)
        .await
        .unwrap()
        .expect("job row must exist");
    assert_eq!(stored_job.status, JobStatus::Queued);
    assert_eq!(stored_job.record_hash, hash_one);
    assert_eq!(stored_job.record_id, "REC-1");

    // --- S2: REPETICIÓN VERBATIM (mismo nonce) ---
    let replay_fault = job_repository
        .admit(draft("REC-1", r#"{"recordId":"REC-1"}"#, &hash_one, &signer, "n1"))
        .await
        .expect_err("verbatim resubmission must be rejected");
    assert!(matches!(replay_fault, DbError::NonceReplay));

    // Sin segunda fila de trabajo.
    let latest = job_repository.find_latest_by_record_id("REC-1").await.unwrap().unwrap();
    assert_eq!(latest.job_id, first_admission.job_id);

    // --- S3: MISMO CUERPO, NONCE FRESCO (idempotencia por huella) ---
    let duplicate_admission = job_repository
        .admit(draft("REC-1", r#"{"recordId":"REC-1"}"#, &hash_one, &signer, "n2"))
        .await
        .expect("duplicate-record admission must collapse, not fail");
    assert!(duplicate_admission.duplicate_record);
    assert_eq!(duplicate_admission.job_id, first_admission.job_id);

    // El nonce fresco quedó sellado aun en la ruta duplicada.
    assert!(job_repository.nonce_seen(&signer, "n2").await.unwrap());

    // --- CHEQUEO SIN EFECTOS DEL PASO 3 ---
    assert!(job_repository.nonce_seen(&signer, "n1").await.unwrap());
    assert!(!job_repository.nonce_seen(&signer, "n3").await.unwrap());

    // --- RASTRO DE AUDITORÍA DE LA ADMISIÓN ---
    let trail = audit_repository
        .trail_for_resource(&first_admission.job_id, 10)
        .await
        .unwrap();
    assert!(trail.len() >= 2, "both admissions must leave submit events");
    assert!(trail.iter().all(|event| event.action == "submit"));

    println!("✅ [CERTIFICADO]: Admisión transaccional e idempotencia.");
}

#[tokio::test]
async fn certify_guarded_transitions_are_exclusive() {
    let database_client = TursoClient::connect("file:mem_transitions_v2?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.");
    let job_repository = JobRepository::new(database_client.clone());

    let admission = job_repository
        .admit(draft("REC-T", r#"{"recordId":"REC-T"}"#, &"b2".repeat(32), &"03".repeat(33), "nt"))
        .await
        .unwrap();

    // La primera transición condicionada tiene efecto; la repetida no.
    assert!(job_repository
        .transition(&admission.job_id, JobStatus::Queued, JobStatus::Processing)
        .await
        .unwrap());
    assert!(!job_repository
        .transition(&admission.job_id, JobStatus::Queued, JobStatus::Processing)
        .await
        .unwrap());

    // Sellado terminal de fallo desde el estado vigente, con código verbatim.
    assert!(job_repository
        .mark_failed(&admission.job_id, JobStatus::Processing, ErrorCode::NoCapacity, "pool dry")
        .await
        .unwrap());

    let sealed = job_repository.find_by_job_id(&admission.job_id).await.unwrap().unwrap();
    assert_eq!(sealed.status, JobStatus::Failed);
    assert_eq!(sealed.error_code.as_deref(), Some("NoCapacity"));

    // Una transición con estado de origen obsoleto no tiene efecto.
    assert!(!job_repository
        .transition(&admission.job_id, JobStatus::Processing, JobStatus::Sent)
        .await
        .unwrap());
    let still_sealed = job_repository.find_by_job_id(&admission.job_id).await.unwrap().unwrap();
    assert_eq!(still_sealed.status, JobStatus::Failed);
}
