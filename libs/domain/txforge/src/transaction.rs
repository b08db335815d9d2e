// [libs/domain/txforge/src/transaction.rs]
/*!
 * =================================================================
 * APARATO: LEDGER TRANSACTION CODEC (V7.1)
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L2)
 * RESPONSABILIDAD: SERIALIZACIÓN LEGACY, SIGHASH Y FIRMA DE ENTRADAS
 * =================================================================
 */

use crate::errors::ForgeError;
use crate::script::p2pkh_unlocking_script;
use soundledger_core_crypto::{double_sha256, ServerSigningKey};

/// Versión de transacción emitida por este servicio.
const TRANSACTION_VERSION: i32 = 1;

/// Secuencia final estándar.
const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// SIGHASH_ALL.
const SIGHASH_ALL: u8 = 0x01;

/// Referencia a una salida previa: (txid mostrado big-endian, índice).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutpoint {
    pub txid: String,
    pub vout: u32,
}

impl TxOutpoint {
    /// Bytes del txid en el orden de serialización (little-endian).
    fn txid_wire_bytes(&self) -> Result<[u8; 32], ForgeError> {
        let decoded = hex::decode(&self.txid)
            .map_err(|fault| ForgeError::OutpointRejected(format!("txid hex: {}", fault)))?;
        if decoded.len() != 32 {
            return Err(ForgeError::OutpointRejected(format!(
                "txid must be 32 bytes, got {}",
                decoded.len()
            )));
        }
        let mut wire = [0u8; 32];
        for (index, byte) in decoded.iter().rev().enumerate() {
            wire[index] = *byte;
        }
        Ok(wire)
    }
}

/// Entrada de transacción con su script de desbloqueo.
#[derive(Debug, Clone)]
pub struct TransactionInput {
    pub outpoint: TxOutpoint,
    pub unlocking_script: Vec<u8>,
    pub sequence: u32,
}

impl TransactionInput {
    #[must_use]
    pub fn unsigned(outpoint: TxOutpoint) -> Self {
        Self {
            outpoint,
            unlocking_script: Vec::new(),
            sequence: SEQUENCE_FINAL,
        }
    }
}

/// Salida de transacción: valor en satoshis y script de bloqueo.
#[derive(Debug, Clone)]
pub struct TransactionOutput {
    pub satoshis: i64,
    pub locking_script: Vec<u8>,
}

/// Transacción en representación de dominio, serializable al formato legacy.
#[derive(Debug, Clone)]
pub struct LedgerTransaction {
    pub version: i32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

impl LedgerTransaction {
    #[must_use]
    pub fn new(inputs: Vec<TransactionInput>, outputs: Vec<TransactionOutput>) -> Self {
        Self {
            version: TRANSACTION_VERSION,
            inputs,
            outputs,
            lock_time: 0,
        }
    }

    /// Serializa al formato de rastro legacy.
    pub fn serialize(&self) -> Result<Vec<u8>, ForgeError> {
        let mut wire = Vec::with_capacity(self.estimated_wire_capacity());

        wire.extend_from_slice(&self.version.to_le_bytes());

        write_varint(self.inputs.len() as u64, &mut wire);
        for input in &self.inputs {
            wire.extend_from_slice(&input.outpoint.txid_wire_bytes()?);
            wire.extend_from_slice(&input.outpoint.vout.to_le_bytes());
            write_varint(input.unlocking_script.len() as u64, &mut wire);
            wire.extend_from_slice(&input.unlocking_script);
            wire.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_varint(self.outputs.len() as u64, &mut wire);
        for output in &self.outputs {
            wire.extend_from_slice(&(output.satoshis as u64).to_le_bytes());
            write_varint(output.locking_script.len() as u64, &mut wire);
            wire.extend_from_slice(&output.locking_script);
        }

        wire.extend_from_slice(&self.lock_time.to_le_bytes());
        Ok(wire)
    }

    /// Identificador de transacción: doble SHA-256 invertido, en hex.
    pub fn txid_hex(&self) -> Result<String, ForgeError> {
        let wire = self.serialize()?;
        let mut digest = double_sha256(&wire);
        digest.reverse();
        Ok(hex::encode(digest))
    }

    /// Resumen SIGHASH_ALL legacy para una entrada.
    ///
    /// El script de la entrada firmada se sustituye por el script de
    /// bloqueo previo; el resto de entradas se serializa con script vacío.
    pub fn sighash_all(
        &self,
        input_index: usize,
        previous_locking_script: &[u8],
    ) -> Result<[u8; 32], ForgeError> {
        let mut preimage_view = self.clone();
        for (index, input) in preimage_view.inputs.iter_mut().enumerate() {
            input.unlocking_script = if index == input_index {
                previous_locking_script.to_vec()
            } else {
                Vec::new()
            };
        }

        let mut preimage = preimage_view.serialize()?;
        preimage.extend_from_slice(&u32::from(SIGHASH_ALL).to_le_bytes());
        Ok(double_sha256(&preimage))
    }

    /// Firma una entrada con la llave del servidor (SIGHASH_ALL, RFC 6979).
    pub fn sign_input(
        &mut self,
        input_index: usize,
        previous_locking_script: &[u8],
        signing_key: &ServerSigningKey,
    ) -> Result<(), ForgeError> {
        let digest = self.sighash_all(input_index, previous_locking_script)?;

        let mut der_with_hashtype = signing_key.sign_digest_der(&digest);
        der_with_hashtype.push(SIGHASH_ALL);

        self.inputs[input_index].unlocking_script =
            p2pkh_unlocking_script(&der_with_hashtype, signing_key.public_key());
        Ok(())
    }

    fn estimated_wire_capacity(&self) -> usize {
        let inputs: usize = self
            .inputs
            .iter()
            .map(|input| 41 + input.unlocking_script.len())
            .sum();
        let outputs: usize = self
            .outputs
            .iter()
            .map(|output| 9 + output.locking_script.len())
            .sum();
        8 + 2 + inputs + outputs
    }
}

/// Entero de longitud variable del formato de rastro.
fn write_varint(value: u64, wire: &mut Vec<u8>) {
    match value {
        0..=0xfc => wire.push(value as u8),
        0xfd..=0xffff => {
            wire.push(0xfd);
            wire.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x10000..=0xffff_ffff => {
            wire.push(0xfe);
            wire.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            wire.push(0xff);
            wire.extend_from_slice(&value.to_le_bytes());
        }
    }
}
