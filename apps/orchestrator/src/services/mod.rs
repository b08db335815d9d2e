// [apps/orchestrator/src/services/mod.rs]
/*!
 * =================================================================
 * APARATO: BACKGROUND SERVICES REGISTRY (V5.0)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: MATRIZ DE DAEMONS DEL ORQUESTADOR
 * =================================================================
 */

pub mod batch_broadcaster;
pub mod batch_collector;
pub mod outcome;
pub mod replenisher;
pub mod single_worker;
pub mod throttle;
pub mod unstick;
