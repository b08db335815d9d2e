// [tests/mirror/integration/publish_admission_api.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LA API DE ADMISIÓN (V2.3)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO INTEGRACIÓN)
 * RESPONSABILIDAD: AUDITORÍA EXTREMO A EXTREMO DE LA SUPERFICIE HTTP
 *
 * Recorre la cadena completa del contrato sobre el router real:
 * admisión fresca, repetición, idempotencia por huella, frescura,
 * firmante desconocido y sondeo de trabajos.
 * =================================================================
 */

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use soundledger_core_canonical::record_hash_digest;
use soundledger_core_crypto::ServerSigningKey;
use soundledger_domain_validation::record_body_for_hashing;
use soundledger_infra_broadcast::emulation::ScriptedLedgerUplink;
use soundledger_infra_db::TursoClient;
use soundledger_orchestrator::config::{ServiceConfig, WorkerMode};
use soundledger_orchestrator::routes::create_router;
use soundledger_orchestrator::state::AppState;
use std::sync::Arc;
use tower::ServiceExt;

fn config_fixture(database_url: &str) -> ServiceConfig {
    ServiceConfig {
        database_url: database_url.to_string(),
        database_auth_token: None,
        listening_port: 0,
        ledger_broadcast_url: "http://localhost:9/unused".into(),
        server_signing_key_hex: "44".repeat(32),
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

async fn admission_router(database_url: &str) -> (Router, AppState) {
    let database_client = TursoClient::connect(database_url, None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.");
    let application_state = AppState::assemble(
        config_fixture(database_url),
        database_client,
        Arc::new(ScriptedLedgerUplink::always_accepting()),
    )
    .expect("state assembly must succeed");
    (create_router(application_state.clone()), application_state)
}

fn record_fixture(nonce: &str, timestamp: i64) -> Value {
    json!({
        "recordId": "REC-1",
        "eventKind": "REGISTER",
        "assetType": "composition",
        "owners": [{"partyId": "P-1", "role": "author", "shareBps": 10000}],
        "terms": {"territory": "WORLD", "rights": ["mechanical"]},
        "timestamp": timestamp,
        "nonce": nonce
    })
}

fn signed_envelope(client_key: &ServerSigningKey, record: Value) -> Value {
    // La firma cubre la huella del cuerpo sin nonce (contrato de huella).
    let digest = record_hash_digest(&record_body_for_hashing(&record));
    json!({
        "protocol": "sl-drm",
        "version": 1,
        "record": record,
        "signer": {"pubkey": client_key.public_key_hex()},
        "signature": {
            "alg": "ecdsa-secp256k1",
            "hash": "sha256",
            "sig": hex::encode(client_key.sign_digest_der(&digest))
        }
    })
}

async fn post_json(router: &Router, uri: &str, payload: &Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let decoded: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    (status, decoded)
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let decoded: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    (status, decoded)
}

#[tokio::test]
async fn certify_admission_surface_end_to_end() {
    println!("\n🌐 [INICIO]: Auditoría extremo a extremo de la API de admisión...");

    let (router, _application_state) =
        admission_router("file:mem_api_v2?mode=memory&cache=shared").await;

    let client_key = ServerSigningKey::new_random();
    let now_milliseconds = chrono::Utc::now().timestamp_millis();

    // --- ALTA DEL FIRMANTE POR LA RUTA ADMINISTRATIVA ---
    let (admin_status, admin_body) = post_json(
        &router,
        "/api/v1/admin/signers",
        &json!({ "pubkey": client_key.public_key_hex() }),
    )
    .await;
    assert_eq!(admin_status, StatusCode::OK);
    assert_eq!(admin_body["inserted"], json!(true));

    // --- S1: ADMISIÓN FRESCA ---
    let envelope = signed_envelope(&client_key, record_fixture("n1", now_milliseconds));
    let (status, body) = post_json(&router, "/api/v1/publish", &envelope).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["recordId"], json!("REC-1"));
    assert_eq!(body["status"], json!("queued"));
    let first_job_id = body["jobId"].as_str().expect("jobId must be present").to_string();
    let record_hash = body["hash"].as_str().unwrap().to_string();
    assert_eq!(record_hash.len(), 64);

    // --- S2: REPETICIÓN VERBATIM -> 409 ---
    let (replay_status, replay_body) = post_json(&router, "/api/v1/publish", &envelope).await;
    assert_eq!(replay_status, StatusCode::CONFLICT);
    assert_eq!(replay_body["ok"], json!(false));
    assert!(replay_body["error"].as_str().unwrap().contains("ReplayDetected"));

    // --- S3: MISMO CUERPO, NONCE FRESCO -> colapsa en el trabajo previo.
    // El nonce no participa de la huella, así que la huella colisiona y
    // la admisión retorna el jobId original (idempotencia por huella).
    let sibling_envelope =
        signed_envelope(&client_key, record_fixture("n2", now_milliseconds));
    let (sibling_status, sibling_body) = post_json(&router, "/api/v1/publish", &sibling_envelope).await;
    assert_eq!(sibling_status, StatusCode::OK);
    assert_eq!(sibling_body["jobId"], json!(first_job_id.clone()));
    assert_eq!(sibling_body["hash"], json!(record_hash.clone()));

    // --- S4: TIMESTAMP FUERA DE VENTANA -> 400 StaleTimestamp ---
    let stale_envelope = signed_envelope(
        &client_key,
        record_fixture("n3", now_milliseconds - 601_000),
    );
    let (stale_status, stale_body) = post_json(&router, "/api/v1/publish", &stale_envelope).await;
    assert_eq!(stale_status, StatusCode::BAD_REQUEST);
    assert!(stale_body["error"].as_str().unwrap().contains("StaleTimestamp"));

    // --- FIRMANTE DESCONOCIDO -> 403 ---
    let impostor_key = ServerSigningKey::new_random();
    let impostor_envelope =
        signed_envelope(&impostor_key, record_fixture("n4", now_milliseconds));
    let (impostor_status, impostor_body) =
        post_json(&router, "/api/v1/publish", &impostor_envelope).await;
    assert_eq!(impostor_status, StatusCode::FORBIDDEN);
    assert!(impostor_body["error"].as_str().unwrap().contains("UnknownSigner"));

    // --- SONDEO DE TRABAJO Y REGISTRO ---
    let (job_status, job_body) =
        get_json(&router, &format!("/api/v1/jobs/{}", first_job_id)).await;
    assert_eq!(job_status, StatusCode::OK);
    assert_eq!(job_body["status"], json!("queued"));
    assert!(job_body["timestamps"]["createdAt"].is_string());

    let (record_status, record_body) = get_json(&router, "/api/v1/records/REC-1").await;
    assert_eq!(record_status, StatusCode::OK);
    assert_eq!(record_body["record"]["recordId"], json!("REC-1"));

    let (missing_status, _) = get_json(&router, "/api/v1/jobs/no-such-job").await;
    assert_eq!(missing_status, StatusCode::NOT_FOUND);

    // --- SONDA DE VIDA ---
    let (health_status, health_body) = get_json(&router, "/health").await;
    assert_eq!(health_status, StatusCode::OK);
    assert_eq!(health_body["ok"], json!(true));

    println!("✅ [CERTIFICADO]: Superficie de admisión completa.");
}

#[tokio::test]
async fn certify_schema_rejections_on_the_wire() {
    let (router, _application_state) =
        admission_router("file:mem_api_schema_v2?mode=memory&cache=shared").await;

    let client_key = ServerSigningKey::new_random();
    let now_milliseconds = chrono::Utc::now().timestamp_millis();

    // Forma plana legada: rechazada explícitamente.
    let flat_form = json!({
        "publickey": client_key.public_key_hex(),
        "signature": "3044",
        "nonce": "n1",
        "record": record_fixture("n1", now_milliseconds)
    });
    let (flat_status, flat_body) = post_json(&router, "/api/v1/publish", &flat_form).await;
    assert_eq!(flat_status, StatusCode::BAD_REQUEST);
    assert!(flat_body["error"].as_str().unwrap().contains("InvalidSchema"));

    // Protocolo ajeno.
    let mut foreign_protocol = signed_envelope(&client_key, record_fixture("n2", now_milliseconds));
    foreign_protocol["protocol"] = json!("acme-drm");
    let (proto_status, _) = post_json(&router, "/api/v1/publish", &foreign_protocol).await;
    assert_eq!(proto_status, StatusCode::BAD_REQUEST);

    // Participaciones que no suman 10000 bps.
    let mut bad_shares_record = record_fixture("n3", now_milliseconds);
    bad_shares_record["owners"][0]["shareBps"] = json!(9000);
    let bad_shares_envelope = signed_envelope(&client_key, bad_shares_record);
    let (shares_status, shares_body) =
        post_json(&router, "/api/v1/publish", &bad_shares_envelope).await;
    assert_eq!(shares_status, StatusCode::BAD_REQUEST);
    assert!(shares_body["error"].as_str().unwrap().contains("basis points"));

    // Firma corrupta sobre registro válido.
    let mut tampered = signed_envelope(&client_key, record_fixture("n4", now_milliseconds));
    tampered["record"]["assetType"] = json!("recording");
    let (sig_status, sig_body) = post_json(&router, "/api/v1/publish", &tampered).await;
    assert_eq!(sig_status, StatusCode::BAD_REQUEST);
    assert!(sig_body["error"].as_str().unwrap().contains("InvalidSignature"));
}
