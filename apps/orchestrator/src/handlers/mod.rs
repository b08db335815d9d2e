// [apps/orchestrator/src/handlers/mod.rs]
// =================================================================
// APARATO: API HANDLER REGISTRY (V5.0)
// RESPONSABILIDAD: MATRIZ DE ADAPTADORES HTTP DEL ORQUESTADOR
// =================================================================

pub mod admin;
pub mod jobs;
pub mod publish;
