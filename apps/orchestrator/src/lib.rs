// [apps/orchestrator/src/lib.rs]
/*!
 * =================================================================
 * APARATO: ORCHESTRATOR LIBRARY ROOT (V5.0)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE LOS ESTRATOS DEL ORQUESTADOR
 * =================================================================
 */

pub mod config;
pub mod handlers;
pub mod kernel;
pub mod routes;
pub mod services;
pub mod state;

pub mod prelude {
    pub use crate::config::{ServiceConfig, WorkerMode};
    pub use crate::kernel::AnchorKernel;
    pub use crate::state::AppState;
}
