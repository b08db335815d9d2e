// [libs/domain/models/src/tests_serialization.rs]
/**
 * =================================================================
 * APARATO: DOMAIN SERIALIZATION TEST (V8.0)
 * CLASIFICACIÓN: PROVING GROUNDS (ESTRATO L2-MODELS)
 * RESPONSABILIDAD: CERTIFICACIÓN DE PARIDAD JSON DE LOS CONTRATOS
 * =================================================================
 */
