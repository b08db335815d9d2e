// [libs/infra/broadcast/src/emulation.rs]
/*!
 * =================================================================
 * APARATO: LEDGER UPLINK EMULATION (V6.0)
 * CLASIFICACIÓN: PROVING GROUNDS ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ENLACE AL LEDGER GUIONIZADO PARA CERTIFICACIÓN
 *
 * Sustituto de test del cliente real: entrega veredictos en el orden
 * guionizado y registra cada transmisión para su escrutinio.
 * =================================================================
 */

use crate::{BroadcastOutcome, LedgerUplink};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Enlace al ledger guionizado.
///
/// Cuando el guion se agota, responde `Accepted` con un txid sintético
/// derivado del contador de transmisiones.
pub struct ScriptedLedgerUplink {
    scripted_outcomes: Mutex<VecDeque<BroadcastOutcome>>,
    transmitted_transactions: Mutex<Vec<String>>,
}

impl ScriptedLedgerUplink {
    #[must_use]
    pub fn new(scripted_outcomes: Vec<BroadcastOutcome>) -> Self {
        Self {
            scripted_outcomes: Mutex::new(scripted_outcomes.into()),
            transmitted_transactions: Mutex::new(Vec::new()),
        }
    }

    /// Emulador que siempre acepta.
    #[must_use]
    pub fn always_accepting() -> Self {
        Self::new(Vec::new())
    }

    /// Rastro de transmisiones observadas, en orden.
    #[must_use]
    pub fn transmission_log(&self) -> Vec<String> {
        self.transmitted_transactions.lock().expect("log lock poisoned").clone()
    }

    /// Cantidad de transmisiones observadas.
    #[must_use]
    pub fn transmission_count(&self) -> usize {
        self.transmitted_transactions.lock().expect("log lock poisoned").len()
    }
}

#[async_trait]
impl LedgerUplink for ScriptedLedgerUplink {
    async fn transmit_raw_transaction(&self, raw_transaction_hex: &str) -> BroadcastOutcome {
        let transmission_index = {
            let mut log = self.transmitted_transactions.lock().expect("log lock poisoned");
            log.push(raw_transaction_hex.to_string());
            log.len()
        };

        let scripted = self
            .scripted_outcomes
            .lock()
            .expect("script lock poisoned")
            .pop_front();

        scripted.unwrap_or_else(|| BroadcastOutcome::Accepted {
            txid: format!("{:064x}", transmission_index),
        })
    }
}
