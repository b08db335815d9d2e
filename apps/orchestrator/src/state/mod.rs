// [apps/orchestrator/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: APPLICATION STATE HUB (V5.3)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L3)
 * RESPONSABILIDAD: ORQUESTACIÓN DE REPOSITORIOS, FORJA Y LIMITADOR
 *
 * Los singletons de proceso (limitador de tasa, forja, enlace al
 * ledger) son valores construidos explícitamente e inyectados, nunca
 * globales ambientales; esto habilita la sustitución en pruebas.
 * =================================================================
 */

use crate::config::ServiceConfig;
use crate::services::throttle::TokenBucket;
use anyhow::{Context, Result};
use soundledger_core_crypto::ServerSigningKey;
use soundledger_domain_txforge::TransactionForge;
use soundledger_infra_broadcast::{BroadcastClient, LedgerUplink};
use soundledger_infra_db::repositories::{
    AuditRepository, JobRepository, SignerRepository, UtxoRepository,
};
use soundledger_infra_db::TursoClient;
use std::sync::Arc;

/// Contenedor de estado compartido (Thread-Safe) del orquestador.
#[derive(Clone)]
pub struct AppState {
    /// Cliente táctico del Ledger (libSQL).
    pub database_client: TursoClient,
    pub job_repository: Arc<JobRepository>,
    pub utxo_repository: Arc<UtxoRepository>,
    pub signer_repository: Arc<SignerRepository>,
    pub audit_repository: Arc<AuditRepository>,
    /// Enlace al nodo del ledger (cliente real o emulación en pruebas).
    pub ledger_uplink: Arc<dyn LedgerUplink>,
    /// Forjador de transacciones con la llave del servidor.
    pub transaction_forge: Arc<TransactionForge>,
    /// Limitador de difusión local al proceso (único punto de estrangulamiento).
    pub broadcast_throttle: Arc<TokenBucket>,
    /// Dirección de cambio efectiva (configurada o derivada de la llave).
    pub change_address: String,
    /// Dirección del pool (derivada de la llave del servidor).
    pub pool_address: String,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    /// Construcción de producción: cliente real de difusión.
    pub async fn ignite(config: ServiceConfig) -> Result<Self> {
        let database_client = TursoClient::connect(
            &config.database_url,
            config.database_auth_token.clone(),
        )
        .await
        .context("FATAL: Database link collapse. Ignition aborted.")?;

        let ledger_uplink: Arc<dyn LedgerUplink> = Arc::new(BroadcastClient::new(
            config.ledger_broadcast_url.clone(),
            config.broadcast_timeout_seconds,
        ));

        Self::assemble(config, database_client, ledger_uplink)
    }

    /// Construcción con enlace sustituible (Proving Grounds).
    pub fn assemble(
        config: ServiceConfig,
        database_client: TursoClient,
        ledger_uplink: Arc<dyn LedgerUplink>,
    ) -> Result<Self> {
        let signing_key = ServerSigningKey::from_hex(&config.server_signing_key_hex)
            .context("FATAL: SERVER_SIGNING_KEY_HEX rejected by the curve")?;

        let pool_address = signing_key.p2pkh_address();
        let change_address = config
            .change_address
            .clone()
            .unwrap_or_else(|| pool_address.clone());

        let transaction_forge = Arc::new(TransactionForge::new(
            signing_key,
            config.fee_rate_sats_per_kb,
        ));

        let broadcast_throttle = Arc::new(TokenBucket::new(
            config.rate_limit_capacity,
            config.rate_limit_window_ms,
        ));

        Ok(Self {
            job_repository: Arc::new(JobRepository::new(database_client.clone())),
            utxo_repository: Arc::new(UtxoRepository::new(database_client.clone())),
            signer_repository: Arc::new(SignerRepository::new(database_client.clone())),
            audit_repository: Arc::new(AuditRepository::new(database_client.clone())),
            database_client,
            ledger_uplink,
            transaction_forge,
            broadcast_throttle,
            change_address,
            pool_address,
            config: Arc::new(config),
        })
    }
}
