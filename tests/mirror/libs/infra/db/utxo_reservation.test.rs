// [tests/mirror/libs/infra/db/utxo_reservation.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE RESERVA DE POOL (V2.1)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L3-MIRROR)
 * RESPONSABILIDAD: AUDITORÍA DEL SEMÁFORO ATÓMICO DEL INVENTARIO
 *
 * Certifica: exclusividad de reserva (cada llamador obtiene una fila
 * distinta o ninguna), selección smallest-first, recuperación de
 * arrendamientos vencidos, cuarentena dirty y sellado de gasto.
 * =================================================================
 */

use soundledger_domain_models::utxo::UtxoPurpose;
use soundledger_infra_db::repositories::UtxoRepository;
use soundledger_infra_db::TursoClient;
use std::collections::HashSet;

const LEASE_SECONDS: i64 = 300;

async fn seed_publish_input(
    repository: &UtxoRepository,
    txid_byte: &str,
    satoshis: i64,
) {
    repository
        .insert_external_output(
            &txid_byte.repeat(32),
            0,
            satoshis,
            "76a914000000000000000000000000000000000000000088ac",
            "1TestPoolAddress",
            UtxoPurpose::Publish,
        )
        .await
        .expect("seed insert must succeed");
}

#[tokio::test]
async fn certify_reservation_exclusivity_and_ordering() {
    println!("\n🧰 [INICIO]: Auditoría del semáforo de reserva...");

    let database_client = TursoClient::connect("file:mem_utxo_v2?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.");
    let utxo_repository = UtxoRepository::new(database_client.clone());

    seed_publish_input(&utxo_repository, "aa", 500).await;
    seed_publish_input(&utxo_repository, "bb", 100).await;
    seed_publish_input(&utxo_repository, "cc", 100).await;

    // Smallest-first con desempate por antigüedad: bb antes que cc, 500 al final.
    let first = utxo_repository.reserve(LEASE_SECONDS).await.unwrap().unwrap();
    assert_eq!(first.satoshis, 100);
    assert_eq!(first.txid, "bb".repeat(32));

    let second = utxo_repository.reserve(LEASE_SECONDS).await.unwrap().unwrap();
    assert_eq!(second.satoshis, 100);
    assert_eq!(second.txid, "cc".repeat(32));

    let third = utxo_repository.reserve(LEASE_SECONDS).await.unwrap().unwrap();
    assert_eq!(third.satoshis, 500);

    // Exclusividad: tres reservas, tres identificadores distintos.
    let mut observed_ids = HashSet::new();
    for reserved in [&first, &second, &third] {
        assert!(observed_ids.insert(reserved.id), "duplicate reservation observed");
    }

    // Pool agotado: la cuarta reserva retorna None.
    assert!(utxo_repository.reserve(LEASE_SECONDS).await.unwrap().is_none());

    println!("✅ [CERTIFICADO]: Exclusividad y orden de selección.");
}

#[tokio::test]
async fn certify_expired_lease_is_reclaimed_by_next_reserve() {
    let database_client = TursoClient::connect("file:mem_utxo_lease_v2?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.");
    let utxo_repository = UtxoRepository::new(database_client.clone());

    seed_publish_input(&utxo_repository, "dd", 100).await;

    let reserved = utxo_repository.reserve(LEASE_SECONDS).await.unwrap().unwrap();
    assert!(utxo_repository.reserve(LEASE_SECONDS).await.unwrap().is_none());

    // Vencimiento forzado del arrendamiento.
    let raw_connection = database_client.get_connection().unwrap();
    raw_connection
        .execute(
            "UPDATE utxo_pool SET reserved_until = datetime('now', '-1 seconds') WHERE id = ?1",
            libsql::params![reserved.id],
        )
        .await
        .unwrap();

    // El barrido de la siguiente reserva recupera la fila.
    let reclaimed = utxo_repository.reserve(LEASE_SECONDS).await.unwrap().unwrap();
    assert_eq!(reclaimed.id, reserved.id);
}

#[tokio::test]
async fn certify_dirty_quarantine_and_spend_sealing() {
    let database_client = TursoClient::connect("file:mem_utxo_dirty_v2?mode=memory&cache=shared", None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory ledger.");
    let utxo_repository = UtxoRepository::new(database_client.clone());

    seed_publish_input(&utxo_repository, "ee", 100).await;
    seed_publish_input(&utxo_repository, "ff", 100).await;

    // Conflicto de mempool simulado: la fila queda disponible pero sucia.
    let conflicted = utxo_repository.reserve(LEASE_SECONDS).await.unwrap().unwrap();
    utxo_repository.mark_dirty(conflicted.id).await.unwrap();

    // La selección salta la fila sucia y entrega la restante.
    let clean = utxo_repository.reserve(LEASE_SECONDS).await.unwrap().unwrap();
    assert_ne!(clean.id, conflicted.id);

    // Sellado de gasto: irreversible y con rastro del ledger (P8).
    assert!(utxo_repository.mark_spent(clean.id, "ledger-tx-T").await.unwrap());
    let spent_rows = utxo_repository
        .find_by_spending_transaction("ledger-tx-T")
        .await
        .unwrap();
    assert_eq!(spent_rows.len(), 1);
    assert_eq!(spent_rows[0].id, clean.id);

    // Doble sellado detectado como deriva, sin efecto.
    assert!(!utxo_repository.mark_spent(clean.id, "ledger-tx-T2").await.unwrap());

    // Liberación por fallo transitorio: la fila regresa limpia al pool.
    seed_publish_input(&utxo_repository, "99", 100).await;
    let transient = utxo_repository.reserve(LEASE_SECONDS).await.unwrap().unwrap();
    utxo_repository.release(transient.id).await.unwrap();
    let reacquired = utxo_repository.reserve(LEASE_SECONDS).await.unwrap().unwrap();
    assert_eq!(reacquired.id, transient.id);
}
