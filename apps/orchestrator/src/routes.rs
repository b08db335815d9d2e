// [apps/orchestrator/src/routes.rs]
/*!
 * =================================================================
 * APARATO: ROUTING MATRIX (V5.2)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: TOPOLOGÍA HTTP DEL ORQUESTADOR
 *
 * El framing TLS y la autenticación administrativa viven en el
 * perímetro externo (reverse proxy); esta matriz expone la superficie
 * de admisión, consulta y gobernanza interna.
 * =================================================================
 */

use crate::handlers::{admin, jobs, publish};
use crate::state::AppState;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub fn create_router(application_state: AppState) -> Router {
    let network_security_shield = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    // ESTRATO PÚBLICO: admisión y sondeo.
    let public_stratum = Router::new()
        .route("/publish", post(publish::PublishAdmissionHandler::handle_intent_submission))
        .route("/jobs/:job_id", get(jobs::JobQueryHandler::handle_job_query))
        .route("/records/:record_id", get(jobs::JobQueryHandler::handle_record_query));

    // ESTRATO ADMINISTRATIVO: gobernanza de firmantes y pool.
    let admin_stratum = Router::new()
        .route("/signers", post(admin::AdminGovernanceHandler::handle_signer_registration))
        .route("/signers/revoke", post(admin::AdminGovernanceHandler::handle_signer_revocation))
        .route("/utxos", post(admin::AdminGovernanceHandler::handle_utxo_ingestion))
        .route("/diagnostics", get(admin::AdminGovernanceHandler::handle_system_diagnostics))
        .route("/audit/:resource_id", get(admin::AdminGovernanceHandler::handle_audit_trail));

    Router::new()
        .route("/health", get(jobs::JobQueryHandler::handle_health_probe))
        .nest("/api/v1", public_stratum.nest("/admin", admin_stratum))
        .layer(network_security_shield)
        .with_state(application_state)
}
