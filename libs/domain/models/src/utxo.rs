// [libs/domain/models/src/utxo.rs]
/*!
 * =================================================================
 * APARATO: UTXO POOL CONTRACTS (V8.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: INVENTARIO DE ENTRADAS DE USO ÚNICO
 *
 * Invariantes de fila:
 * - (txid, vout) único; exactamente un estado a la vez.
 * - reserved  => reserved_until fijado.
 * - spent     => spent_by_transaction_id fijado; jamás revierte.
 * - dirty     => inelegible para reserva hasta reconciliación externa.
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Propósito de una entrada del pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtxoPurpose {
    /// Entradas pequeñas de uso único para anclajes (valor unitario).
    Publish,
    /// Entradas grandes que alimentan al reponedor.
    Funding,
    /// Cambio generado por transacciones propias.
    Change,
}

impl UtxoPurpose {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            UtxoPurpose::Publish => "publish",
            UtxoPurpose::Funding => "funding",
            UtxoPurpose::Change => "change",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "publish" => Some(UtxoPurpose::Publish),
            "funding" => Some(UtxoPurpose::Funding),
            "change" => Some(UtxoPurpose::Change),
            _ => None,
        }
    }
}

/// Estado exclusivo de una entrada del pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtxoStatus {
    Available,
    Reserved,
    Spent,
}

impl UtxoStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            UtxoStatus::Available => "available",
            UtxoStatus::Reserved => "reserved",
            UtxoStatus::Spent => "spent",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "available" => Some(UtxoStatus::Available),
            "reserved" => Some(UtxoStatus::Reserved),
            "spent" => Some(UtxoStatus::Spent),
            _ => None,
        }
    }
}

/// Material mínimo que recibe un worker al reservar una entrada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedUtxo {
    pub id: i64,
    pub txid: String,
    pub vout: u32,
    pub satoshis: i64,
    pub locking_script_hex: String,
}

/// Instantánea de profundidad del pool para el reponedor y diagnósticos.
#[derive(Debug, Clone, Serialize)]
pub struct PoolDepthSnapshot {
    /// Entradas publish/available del valor unitario configurado.
    pub available_publish_count: i64,
    pub reserved_count: i64,
    pub dirty_count: i64,
    pub spent_count: i64,
}
