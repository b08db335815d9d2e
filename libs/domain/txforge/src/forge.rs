// [libs/domain/txforge/src/forge.rs]
/*!
 * =================================================================
 * APARATO: ANCHOR & SPLIT FORGE (V7.2)
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L2)
 * RESPONSABILIDAD: FORJA DE TRANSACCIONES DE ANCLAJE Y FRAGMENTACIÓN
 *
 * Topología de anclaje: 1 entrada reservada -> 1 salida portadora de
 * datos (valor 0) + 1 salida de cambio. Comisión = tamaño x tarifa
 * (sats/KB), con piso de 1 satoshi.
 * =================================================================
 */

use crate::errors::ForgeError;
use crate::script::{data_carrier_script, p2pkh_script_for_address};
use crate::transaction::{LedgerTransaction, TransactionInput, TransactionOutput, TxOutpoint};
use serde_json::json;
use soundledger_core_canonical::canonical_bytes;
use soundledger_core_crypto::ServerSigningKey;
use soundledger_domain_models::intent::{PROTOCOL_TAG, PROTOCOL_VERSION};
use soundledger_domain_models::utxo::ReservedUtxo;
use tracing::debug;

/// Estimación conservadora del scriptSig P2PKH (push firma + push pubkey
/// + varint de longitud de script).
const UNLOCKING_SCRIPT_SIZE_ESTIMATE: usize = 108;

/// Transacción de anclaje forjada y lista para difusión.
#[derive(Debug, Clone)]
pub struct ForgedTransaction {
    pub raw_hex: String,
    pub txid: String,
    pub size_bytes: usize,
    pub fee_satoshis: i64,
    pub change_satoshis: i64,
}

/// Transacción de fragmentación forjada por el reponedor.
#[derive(Debug, Clone)]
pub struct ForgedSplit {
    pub raw_hex: String,
    pub txid: String,
    pub size_bytes: usize,
    pub fee_satoshis: i64,
    /// Cantidad de salidas de valor unitario (vouts 0..count-1).
    pub unit_output_count: u32,
    /// Índice de la salida de cambio (vout = unit_output_count).
    pub change_vout: u32,
    pub change_satoshis: i64,
}

/// Bytes canónicos del payload on-ledger: {"hash":..., "p":"sl-drm", "v":1}.
pub fn anchor_payload_bytes(record_hash: &str) -> Result<Vec<u8>, ForgeError> {
    if record_hash.len() != 64
        || !record_hash
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    {
        return Err(ForgeError::RecordHashRejected(format!(
            "expected 64 lowercase hex characters, got \"{}\"",
            record_hash
        )));
    }
    let payload = json!({
        "p": PROTOCOL_TAG,
        "v": PROTOCOL_VERSION,
        "hash": record_hash,
    });
    Ok(canonical_bytes(&payload))
}

/// Forjador de transacciones con la llave del servidor y la tarifa vigente.
pub struct TransactionForge {
    signing_key: ServerSigningKey,
    fee_rate_sats_per_kb: i64,
}

impl TransactionForge {
    #[must_use]
    pub fn new(signing_key: ServerSigningKey, fee_rate_sats_per_kb: i64) -> Self {
        Self {
            signing_key,
            fee_rate_sats_per_kb,
        }
    }

    /// Forja la transacción de anclaje de una huella de registro.
    pub fn forge_anchor_transaction(
        &self,
        reserved_input: &ReservedUtxo,
        record_hash: &str,
        change_address: &str,
    ) -> Result<ForgedTransaction, ForgeError> {
        let payload = anchor_payload_bytes(record_hash)?;
        let change_script = p2pkh_script_for_address(change_address)?;
        let previous_locking_script = decode_locking_script(&reserved_input.locking_script_hex)?;

        let mut transaction = LedgerTransaction::new(
            vec![TransactionInput::unsigned(TxOutpoint {
                txid: reserved_input.txid.clone(),
                vout: reserved_input.vout,
            })],
            vec![
                TransactionOutput {
                    satoshis: 0,
                    locking_script: data_carrier_script(&payload),
                },
                TransactionOutput {
                    satoshis: 0, // se fija tras computar la comisión
                    locking_script: change_script,
                },
            ],
        );

        let fee_satoshis = self.fee_for(&transaction)?;
        let change_satoshis = reserved_input.satoshis - fee_satoshis;
        if change_satoshis < 1 {
            return Err(ForgeError::InsufficientValue {
                required: fee_satoshis + 1,
                available: reserved_input.satoshis,
            });
        }
        transaction.outputs[1].satoshis = change_satoshis;

        transaction.sign_input(0, &previous_locking_script, &self.signing_key)?;

        let wire = transaction.serialize()?;
        let txid = transaction.txid_hex()?;
        debug!(txid = %txid, size = wire.len(), fee = fee_satoshis, "⚒️  [FORGE]: Anchor transaction crystallized.");

        Ok(ForgedTransaction {
            raw_hex: hex::encode(&wire),
            txid,
            size_bytes: wire.len(),
            fee_satoshis,
            change_satoshis,
        })
    }

    /// Forja la transacción de fragmentación del reponedor:
    /// 1 entrada grande -> K salidas unitarias + 1 salida de cambio.
    pub fn forge_split_transaction(
        &self,
        source_input: &ReservedUtxo,
        unit_output_count: u32,
        unit_value_satoshis: i64,
        pool_address: &str,
        change_address: &str,
    ) -> Result<ForgedSplit, ForgeError> {
        if unit_output_count == 0 {
            return Err(ForgeError::SplitParametersRejected(
                "unit_output_count must be positive".into(),
            ));
        }
        if unit_value_satoshis < 1 {
            return Err(ForgeError::SplitParametersRejected(
                "unit_value_satoshis must be positive".into(),
            ));
        }

        let pool_script = p2pkh_script_for_address(pool_address)?;
        let change_script = p2pkh_script_for_address(change_address)?;
        let previous_locking_script = decode_locking_script(&source_input.locking_script_hex)?;

        let mut outputs: Vec<TransactionOutput> = (0..unit_output_count)
            .map(|_| TransactionOutput {
                satoshis: unit_value_satoshis,
                locking_script: pool_script.clone(),
            })
            .collect();
        outputs.push(TransactionOutput {
            satoshis: 0, // se fija tras computar la comisión
            locking_script: change_script,
        });

        let mut transaction = LedgerTransaction::new(
            vec![TransactionInput::unsigned(TxOutpoint {
                txid: source_input.txid.clone(),
                vout: source_input.vout,
            })],
            outputs,
        );

        let fee_satoshis = self.fee_for(&transaction)?;
        let units_total = unit_value_satoshis * i64::from(unit_output_count);
        let change_satoshis = source_input.satoshis - units_total - fee_satoshis;
        if change_satoshis < 1 {
            return Err(ForgeError::InsufficientValue {
                required: units_total + fee_satoshis + 1,
                available: source_input.satoshis,
            });
        }
        let change_index = transaction.outputs.len() - 1;
        transaction.outputs[change_index].satoshis = change_satoshis;

        transaction.sign_input(0, &previous_locking_script, &self.signing_key)?;

        let wire = transaction.serialize()?;
        let txid = transaction.txid_hex()?;
        debug!(txid = %txid, outputs = unit_output_count, fee = fee_satoshis, "⚒️  [FORGE]: Split transaction crystallized.");

        Ok(ForgedSplit {
            raw_hex: hex::encode(&wire),
            txid,
            size_bytes: wire.len(),
            fee_satoshis,
            unit_output_count,
            change_vout: unit_output_count,
            change_satoshis,
        })
    }

    /// Comisión por tamaño estimado: ceil(bytes x tarifa / 1000), piso 1 sat.
    fn fee_for(&self, unsigned_transaction: &LedgerTransaction) -> Result<i64, ForgeError> {
        let unsigned_size = unsigned_transaction.serialize()?.len();
        let estimated_size = (unsigned_size + UNLOCKING_SCRIPT_SIZE_ESTIMATE) as i64;
        let fee = (estimated_size * self.fee_rate_sats_per_kb + 999) / 1000;
        Ok(fee.max(1))
    }
}

fn decode_locking_script(locking_script_hex: &str) -> Result<Vec<u8>, ForgeError> {
    hex::decode(locking_script_hex)
        .map_err(|fault| ForgeError::OutpointRejected(format!("locking script hex: {}", fault)))
}
