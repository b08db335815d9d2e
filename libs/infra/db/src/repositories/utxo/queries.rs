// [libs/infra/db/src/repositories/utxo/queries.rs]
/*!
 * =================================================================
 * APARATO: UTXO POOL SQL REGISTRY (V9.3)
 * CLASIFICACIÓN: INFRASTRUCTURE SQL (ESTRATO L3)
 * RESPONSABILIDAD: SENTENCIAS ATÓMICAS DEL INVENTARIO DE ENTRADAS
 *
 * La reserva encapsula el SELECT dentro del WHERE del UPDATE y retorna
 * la fila post-actualización: la base actúa como semáforo de exclusión
 * mutua a nivel de fila, de modo que cada llamador concurrente obtiene
 * una entrada distinta o ninguna.
 * =================================================================
 */

/// Barrido previo: arrendamientos vencidos regresan a 'available'.
/// Ejecutarlo dentro de la transacción de reserva garantiza progreso
/// sin un barredor dedicado.
pub const SWEEP_EXPIRED_LEASES: &str = r#"
    UPDATE utxo_pool
    SET status = 'available',
        reserved_at = NULL,
        reserved_until = NULL
    WHERE status = 'reserved' AND reserved_until < CURRENT_TIMESTAMP
"#;

/// Reserva atómica smallest-first con desempate por antigüedad.
/// Las filas sucias quedan excluidas hasta su reconciliación externa.
pub const RESERVE_PUBLISH_INPUT: &str = r#"
    UPDATE utxo_pool
    SET status = 'reserved',
        reserved_at = CURRENT_TIMESTAMP,
        reserved_until = datetime(CURRENT_TIMESTAMP, '+' || CAST(?1 AS TEXT) || ' seconds')
    WHERE id = (
        SELECT id FROM utxo_pool
        WHERE purpose = 'publish'
          AND status = 'available'
          AND (dirty IS NULL OR dirty = 0)
        ORDER BY satoshis ASC, created_at ASC, id ASC
        LIMIT 1
    )
    RETURNING id, txid, vout, satoshis, locking_script_hex
"#;

/// Reserva atómica de la entrada de financiamiento más grande (reponedor).
pub const RESERVE_LARGEST_FUNDING_INPUT: &str = r#"
    UPDATE utxo_pool
    SET status = 'reserved',
        reserved_at = CURRENT_TIMESTAMP,
        reserved_until = datetime(CURRENT_TIMESTAMP, '+' || CAST(?1 AS TEXT) || ' seconds')
    WHERE id = (
        SELECT id FROM utxo_pool
        WHERE purpose IN ('funding', 'change')
          AND status = 'available'
          AND (dirty IS NULL OR dirty = 0)
          AND satoshis >= ?2
        ORDER BY satoshis DESC, created_at ASC, id ASC
        LIMIT 1
    )
    RETURNING id, txid, vout, satoshis, locking_script_hex
"#;

/// Sellado irreversible de gasto con el rastro del ledger.
pub const MARK_SPENT: &str = r#"
    UPDATE utxo_pool
    SET status = 'spent',
        spent_at = CURRENT_TIMESTAMP,
        spent_by_transaction_id = ?2,
        reserved_at = NULL,
        reserved_until = NULL
    WHERE id = ?1 AND status = 'reserved'
"#;

/// Liberación por fallo transitorio: la entrada vuelve al pool limpia.
pub const RELEASE_INPUT: &str = r#"
    UPDATE utxo_pool
    SET status = 'available',
        reserved_at = NULL,
        reserved_until = NULL
    WHERE id = ?1 AND status = 'reserved'
"#;

/// Marcado de entrada sucia tras conflicto de mempool: disponible pero
/// inelegible hasta reconciliación.
pub const MARK_DIRTY: &str = r#"
    UPDATE utxo_pool
    SET status = 'available',
        dirty = 1,
        reserved_at = NULL,
        reserved_until = NULL
    WHERE id = ?1
"#;

/// Ingesta idempotente de salidas externas (bootstrap / administración).
pub const INSERT_EXTERNAL_OUTPUT: &str = r#"
    INSERT INTO utxo_pool (txid, vout, satoshis, locking_script_hex, address, purpose, status)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'available')
    ON CONFLICT(txid, vout) DO NOTHING
"#;

/// Profundidad del pool publish al valor unitario configurado.
pub const COUNT_AVAILABLE_PUBLISH_UNITS: &str = r#"
    SELECT COUNT(*) FROM utxo_pool
    WHERE purpose = 'publish'
      AND status = 'available'
      AND (dirty IS NULL OR dirty = 0)
      AND satoshis = ?1
"#;

pub const DEPTH_BY_STATUS: &str = r#"
    SELECT
        SUM(CASE WHEN status = 'reserved' THEN 1 ELSE 0 END),
        SUM(CASE WHEN status = 'spent' THEN 1 ELSE 0 END),
        SUM(CASE WHEN dirty = 1 THEN 1 ELSE 0 END)
    FROM utxo_pool
"#;

/// Rastro de gasto por identificador de transacción del ledger.
pub const FIND_BY_SPENDING_TRANSACTION: &str = r#"
    SELECT id, txid, vout, satoshis, locking_script_hex
    FROM utxo_pool
    WHERE spent_by_transaction_id = ?1
"#;
