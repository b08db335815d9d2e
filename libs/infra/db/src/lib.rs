// [libs/infra/db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: TACTICAL PERSISTENCE ADAPTER (V9.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: FUENTE ÚNICA DE VERDAD MUTABLE DEL SERVICIO
 *
 * La base de datos es el único estado compartido entre procesos; la
 * corrección concurrente deriva de sus garantías (transacciones y
 * actualizaciones condicionadas), no de mutexes en RAM.
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::TursoClient;
pub use errors::DbError;
