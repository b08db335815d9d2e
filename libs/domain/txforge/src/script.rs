// [libs/domain/txforge/src/script.rs]
/*!
 * =================================================================
 * APARATO: LEDGER SCRIPT BUILDER (V7.0)
 * CLASIFICACIÓN: DOMAIN ENGINE (ESTRATO L2)
 * RESPONSABILIDAD: CONSTRUCCIÓN DE SCRIPTS P2PKH Y PORTADORES DE DATOS
 * =================================================================
 */

use crate::errors::ForgeError;
use secp256k1::PublicKey;
use soundledger_core_crypto::{decode_p2pkh_address, hash160};

// Opcodes del protocolo empleados por este servicio.
const OP_FALSE: u8 = 0x00;
const OP_RETURN: u8 = 0x6a;
const OP_DUP: u8 = 0x76;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_HASH160: u8 = 0xa9;
const OP_CHECKSIG: u8 = 0xac;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;

/// Script de bloqueo P2PKH para un hash160 de 20 bytes.
#[must_use]
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.push(OP_DUP);
    script.push(OP_HASH160);
    script.push(20);
    script.extend_from_slice(pubkey_hash);
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

/// Script P2PKH para una dirección Base58Check.
pub fn p2pkh_script_for_address(address: &str) -> Result<Vec<u8>, ForgeError> {
    let pubkey_hash = decode_p2pkh_address(address)?;
    Ok(p2pkh_script(&pubkey_hash))
}

/// Script P2PKH para una llave pública comprimida.
#[must_use]
pub fn p2pkh_script_for_pubkey(public_key: &PublicKey) -> Vec<u8> {
    p2pkh_script(&hash160(&public_key.serialize()))
}

/// Salida portadora de datos: OP_FALSE OP_RETURN <payload>, valor cero,
/// no gastable. El payload viaja como un único push.
#[must_use]
pub fn data_carrier_script(payload: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(payload.len() + 5);
    script.push(OP_FALSE);
    script.push(OP_RETURN);
    push_data(payload, &mut script);
    script
}

/// Emite la instrucción de push mínima para la longitud del material.
fn push_data(data: &[u8], script: &mut Vec<u8>) {
    let length = data.len();
    if length < OP_PUSHDATA1 as usize {
        script.push(length as u8);
    } else if length <= u8::MAX as usize {
        script.push(OP_PUSHDATA1);
        script.push(length as u8);
    } else {
        // El protocolo limita los scripts de este servicio muy por
        // debajo de PUSHDATA4.
        script.push(OP_PUSHDATA2);
        script.extend_from_slice(&(length as u16).to_le_bytes());
    }
    script.extend_from_slice(data);
}

/// Construye el scriptSig de gasto P2PKH: push(firma DER + hashtype) push(pubkey).
#[must_use]
pub fn p2pkh_unlocking_script(der_signature_with_hashtype: &[u8], public_key: &PublicKey) -> Vec<u8> {
    let serialized_pubkey = public_key.serialize();
    let mut script = Vec::with_capacity(der_signature_with_hashtype.len() + serialized_pubkey.len() + 2);
    push_data(der_signature_with_hashtype, &mut script);
    push_data(&serialized_pubkey, &mut script);
    script
}
