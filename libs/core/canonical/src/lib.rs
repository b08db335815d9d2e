// [libs/core/canonical/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CANONICAL JSON ENGINE (V6.0)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: FORMA CANÓNICA BYTE-EXACTA Y HUELLA SHA-256
 *
 * Contrato: dos valores estructuralmente iguales producen bytes
 * canónicos idénticos. Objetos con claves ordenadas por code-point
 * ascendente, arreglos preservando orden, separadores mínimos,
 * codificación UTF-8.
 * =================================================================
 */

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Produce la forma canónica de un valor JSON como ráfaga de bytes UTF-8.
///
/// - Objetos: claves ordenadas por code-point ascendente, `":"` y `","`
///   sin espacio insignificante.
/// - Arreglos: orden preservado.
/// - Escalares: codificación JSON mínima estándar (serde_json).
#[must_use]
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    let mut output_buffer = String::new();
    write_canonical_value(value, &mut output_buffer);
    output_buffer.into_bytes()
}

/// Variante de conveniencia que retorna la forma canónica como `String`.
#[must_use]
pub fn canonical_string(value: &Value) -> String {
    let mut output_buffer = String::new();
    write_canonical_value(value, &mut output_buffer);
    output_buffer
}

/// SHA-256 de una ráfaga de bytes, reportado como hex en minúsculas.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256_digest(data))
}

/// SHA-256 crudo de una ráfaga de bytes.
#[must_use]
pub fn sha256_digest(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Huella de registro: SHA-256 sobre los bytes canónicos del subárbol
/// `record`, como hex en minúsculas. Es la llave de idempotencia global.
#[must_use]
pub fn record_hash(record: &Value) -> String {
    sha256_hex(&canonical_bytes(record))
}

/// Huella de registro en forma cruda de 32 bytes (entrada del verificador ECDSA).
#[must_use]
pub fn record_hash_digest(record: &Value) -> [u8; 32] {
    sha256_digest(&canonical_bytes(record))
}

fn write_canonical_value(value: &Value, output: &mut String) {
    match value {
        Value::Null => output.push_str("null"),
        Value::Bool(flag) => output.push_str(if *flag { "true" } else { "false" }),
        // serde_json emite la representación mínima estándar para números
        // y el escapado mínimo para cadenas.
        Value::Number(number) => output.push_str(&number.to_string()),
        Value::String(text) => {
            output.push_str(&serde_json::to_string(text).expect("string serialization is infallible"))
        }
        Value::Array(elements) => {
            output.push('[');
            for (index, element) in elements.iter().enumerate() {
                if index > 0 {
                    output.push(',');
                }
                write_canonical_value(element, output);
            }
            output.push(']');
        }
        Value::Object(members) => {
            // Orden por code-point: en UTF-8 el orden de bytes coincide
            // con el orden de code-points Unicode.
            let mut sorted_keys: Vec<&String> = members.keys().collect();
            sorted_keys.sort_unstable();

            output.push('{');
            for (index, key) in sorted_keys.iter().enumerate() {
                if index > 0 {
                    output.push(',');
                }
                output.push_str(&serde_json::to_string(key).expect("string serialization is infallible"));
                output.push(':');
                write_canonical_value(&members[key.as_str()], output);
            }
            output.push('}');
        }
    }
}
