// [apps/orchestrator/src/config.rs]
/*!
 * =================================================================
 * APARATO: SERVICE CONFIGURATION (V5.2)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: CAPTURA Y VALIDACIÓN DEL ENTORNO DE EJECUCIÓN
 *
 * Invariante duro: sending_ttl <= utxo_lease. Si el TTL del difusor
 * superara el arrendamiento, un trabajo podría ser liberado mientras
 * su entrada sigue arrendada en otro worker.
 * =================================================================
 */

use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;

/// Modo de operación de los workers de difusión.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMode {
    /// Ruta de bajo volumen: un trabajo a la vez (C8).
    Single,
    /// Ruta de lotes: recolector + difusor con limitador de tasa (C9).
    Batch,
}

impl FromStr for WorkerMode {
    type Err = anyhow::Error;

    fn from_str(label: &str) -> Result<Self> {
        match label.to_lowercase().as_str() {
            "single" => Ok(WorkerMode::Single),
            "batch" => Ok(WorkerMode::Batch),
            other => bail!("WORKER_MODE must be 'single' or 'batch', got '{}'", other),
        }
    }
}

/// Configuración completa del servicio, capturada una vez en la ignición.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    // --- ENLACES EXTERNOS ---
    pub database_url: String,
    pub database_auth_token: Option<String>,
    pub listening_port: u16,
    pub ledger_broadcast_url: String,

    // --- MATERIAL DE FIRMA ---
    pub server_signing_key_hex: String,
    /// Dirección de cambio; si falta se deriva de la llave del servidor.
    pub change_address: Option<String>,

    // --- CONTRATO DE ADMISIÓN ---
    pub timestamp_skew_seconds: i64,

    // --- POOL Y ARRENDAMIENTOS ---
    pub utxo_lease_seconds: i64,
    pub sending_ttl_seconds: i64,
    pub unstick_interval_ms: u64,

    // --- MODO LOTE Y LIMITADOR ---
    pub worker_mode: WorkerMode,
    pub batch_window_ms: u64,
    pub max_batch_size: i64,
    pub rate_limit_capacity: u32,
    pub rate_limit_window_ms: u64,

    // --- FORJA Y DIFUSIÓN ---
    pub fee_rate_sats_per_kb: i64,
    pub broadcast_timeout_seconds: u64,

    // --- REPONEDOR ---
    pub pool_unit_satoshis: i64,
    pub pool_min_size: i64,
    pub pool_split_target: u32,
    pub pool_check_interval_ms: u64,
    pub pool_split_cooldown_ms: u64,
}

impl ServiceConfig {
    /// Captura el entorno completo. Las variables sin valor adoptan los
    /// defaults del contrato; la ausencia de las obligatorias es fatal.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            database_url: env::var("DATABASE_URL")
                .context("CRITICAL_FAULT: DATABASE_URL not defined in runtime environment")?,
            database_auth_token: env::var("TURSO_AUTH_TOKEN").ok(),
            listening_port: parse_env("PORT", 3000),
            ledger_broadcast_url: env::var("LEDGER_BROADCAST_URL")
                .context("CRITICAL_FAULT: LEDGER_BROADCAST_URL not defined in runtime environment")?,
            server_signing_key_hex: env::var("SERVER_SIGNING_KEY_HEX")
                .context("CRITICAL_FAULT: SERVER_SIGNING_KEY_HEX not defined in runtime environment")?,
            change_address: env::var("CHANGE_ADDRESS").ok(),
            timestamp_skew_seconds: parse_env("TIMESTAMP_SKEW_SECONDS", 600),
            utxo_lease_seconds: parse_env("UTXO_LEASE_SECONDS", 300),
            sending_ttl_seconds: parse_env("SENDING_TTL_SECONDS", 120),
            unstick_interval_ms: parse_env("UNSTICK_INTERVAL_MS", 30_000),
            worker_mode: env::var("WORKER_MODE")
                .unwrap_or_else(|_| "batch".to_string())
                .parse()?,
            batch_window_ms: parse_env("BATCH_WINDOW_MS", 5_000),
            max_batch_size: parse_env("MAX_BATCH_SIZE", 500),
            rate_limit_capacity: parse_env("RATE_LIMIT_CAPACITY", 500),
            rate_limit_window_ms: parse_env("RATE_LIMIT_WINDOW_MS", 3_000),
            fee_rate_sats_per_kb: parse_env("FEE_RATE_SATS_PER_KB", 100),
            broadcast_timeout_seconds: parse_env("BROADCAST_TIMEOUT_SECONDS", 30),
            pool_unit_satoshis: parse_env("POOL_UNIT_SATOSHIS", 100),
            pool_min_size: parse_env("POOL_MIN_SIZE", 50_000),
            pool_split_target: parse_env("POOL_SPLIT_TARGET", 100_000),
            pool_check_interval_ms: parse_env("POOL_CHECK_INTERVAL_MS", 30_000),
            pool_split_cooldown_ms: parse_env("POOL_SPLIT_COOLDOWN_MS", 600_000),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validación de coherencia entre perillas.
    pub fn validate(&self) -> Result<()> {
        if self.sending_ttl_seconds > self.utxo_lease_seconds {
            bail!(
                "SENDING_TTL_SECONDS ({}) must not exceed UTXO_LEASE_SECONDS ({})",
                self.sending_ttl_seconds,
                self.utxo_lease_seconds
            );
        }
        if self.rate_limit_capacity == 0 || self.rate_limit_window_ms == 0 {
            bail!("rate limiter capacity and window must be positive");
        }
        if self.max_batch_size < 1 {
            bail!("MAX_BATCH_SIZE must be at least 1");
        }
        if self.pool_unit_satoshis < 1 || self.pool_split_target == 0 {
            bail!("pool unit value and split target must be positive");
        }
        Ok(())
    }
}

fn parse_env<T: FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<T>().ok())
        .unwrap_or(default)
}
