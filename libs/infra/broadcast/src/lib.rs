// [libs/infra/broadcast/src/lib.rs]
/*!
 * =================================================================
 * APARATO: LEDGER BROADCAST UPLINK (V6.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: DIFUSIÓN DE TRANSACCIONES Y NORMALIZACIÓN DE VEREDICTOS
 *
 * Contrato: un único intento por llamada; los reintentos son decisión
 * de los workers. Todo resultado se normaliza al veredicto etiquetado
 * 'BroadcastOutcome' y los llamadores conmutan sobre la etiqueta,
 * nunca sobre cadenas de error.
 * =================================================================
 */

pub mod emulation;

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{instrument, warn};

/// Veredicto normalizado de una difusión.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// El ledger aceptó la transacción y retornó su identificador.
    Accepted { txid: String },
    /// La entrada ya forma parte de una transacción en mempool, o el
    /// txid ya es conocido. Bookkeeping benigno para reintentos.
    MempoolConflict { detail: String },
    /// Timeout o fallo 5xx del nodo; la entrada puede liberarse.
    TransientNetwork { detail: String },
    /// Rechazo definitivo (script inválido, política, malformación).
    PermanentReject { detail: String },
}

/// Costura de sustitución del enlace al ledger (cliente real o emulado).
#[async_trait]
pub trait LedgerUplink: Send + Sync {
    /// Transmite una transacción cruda (hex) y normaliza el veredicto.
    async fn transmit_raw_transaction(&self, raw_transaction_hex: &str) -> BroadcastOutcome;
}

/// Cliente de difusión endurecido contra el endpoint real del nodo.
pub struct BroadcastClient {
    network_uplink_client: reqwest::Client,
    broadcast_endpoint_url: String,
}

#[derive(serde::Serialize)]
struct BroadcastRequestSchema<'a> {
    txhex: &'a str,
}

#[derive(Deserialize)]
struct BroadcastResponseSchema {
    txid: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

impl BroadcastClient {
    /// Construye el cliente con el timeout contractual (30 s por defecto).
    pub fn new(broadcast_endpoint_url: String, timeout_seconds: u64) -> Self {
        let network_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent("SoundLedger-Anchor-Uplink/V6.0")
            .build()
            .expect("CRITICAL: Failed to initialize broadcast HTTP session");

        Self {
            network_uplink_client: network_client,
            broadcast_endpoint_url,
        }
    }

    /// Clasifica el mensaje de rechazo del nodo en un veredicto etiquetado.
    fn classify_rejection(rejection_message: &str) -> BroadcastOutcome {
        let lowered = rejection_message.to_lowercase();
        let is_mempool_conflict = lowered.contains("txn-mempool-conflict")
            || lowered.contains("already in the mempool")
            || lowered.contains("already in mempool")
            || lowered.contains("txn-already-known")
            || lowered.contains("already known")
            || lowered.contains("transaction already exists");

        if is_mempool_conflict {
            BroadcastOutcome::MempoolConflict {
                detail: rejection_message.to_string(),
            }
        } else {
            BroadcastOutcome::PermanentReject {
                detail: rejection_message.to_string(),
            }
        }
    }
}

#[async_trait]
impl LedgerUplink for BroadcastClient {
    #[instrument(skip(self, raw_transaction_hex), fields(bytes = raw_transaction_hex.len() / 2))]
    async fn transmit_raw_transaction(&self, raw_transaction_hex: &str) -> BroadcastOutcome {
        let network_response = match self
            .network_uplink_client
            .post(&self.broadcast_endpoint_url)
            .json(&BroadcastRequestSchema {
                txhex: raw_transaction_hex,
            })
            .send()
            .await
        {
            Ok(response) => response,
            Err(network_fault) => {
                warn!("📡 [UPLINK_FAULT]: Broadcast transport failed: {}", network_fault);
                return BroadcastOutcome::TransientNetwork {
                    detail: network_fault.to_string(),
                };
            }
        };

        let status = network_response.status();
        let response_body = network_response.text().await.unwrap_or_default();

        if status.is_server_error() {
            return BroadcastOutcome::TransientNetwork {
                detail: format!("HTTP_{}: {}", status.as_u16(), response_body),
            };
        }

        // Cuerpo JSON {txid} o {error|message}; texto plano como txid de cortesía.
        if let Ok(decoded) = serde_json::from_str::<BroadcastResponseSchema>(&response_body) {
            if let Some(txid) = decoded.txid {
                if status.is_success() {
                    return BroadcastOutcome::Accepted { txid };
                }
            }
            if let Some(rejection) = decoded.error.or(decoded.message) {
                return Self::classify_rejection(&rejection);
            }
        }

        if status.is_success() {
            let candidate_txid = response_body.trim().trim_matches('"');
            if candidate_txid.len() == 64 && candidate_txid.chars().all(|c| c.is_ascii_hexdigit()) {
                return BroadcastOutcome::Accepted {
                    txid: candidate_txid.to_lowercase(),
                };
            }
        }

        Self::classify_rejection(&response_body)
    }
}
