// [libs/shared/vigia/src/lib.rs]
/*!
 * =================================================================
 * APARATO: VIGÍA OBSERVER (V4.2)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L6)
 * RESPONSABILIDAD: GESTIÓN DE TELEMETRÍA, TRAZADO Y CAPTURA DE PÁNICOS
 *
 * Invariante: un único suscriptor global por proceso. Toda salida
 * estructurada (JSON en producción) fluye por stdout para su ingesta
 * por el supervisor de infraestructura.
 * =================================================================
 */

use std::panic;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};

/// Inicializa el sistema de trazas Vigía con captura de pánicos global.
///
/// # Comportamiento:
/// - Desarrollo: logs compactos con color, sin target.
/// - Producción: tramas JSON planas para la ingesta del supervisor.
///
/// # Panics:
/// Si otro suscriptor global ya fue inicializado en el runtime.
pub fn init_tracing(service_nominal_identifier: &str) {
    // Filtro por defecto: nuestro dominio en primer plano, infraestructura silenciada.
    let environmental_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{}={level},tower_http=warn,hyper=warn,libsql=error",
            service_nominal_identifier,
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    let is_production_strata = !cfg!(debug_assertions);

    if is_production_strata {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().json().flatten_event(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().compact().with_target(false))
            .init();
    }

    install_panic_hook(service_nominal_identifier);
}

/// Instala el gancho de pánico global.
///
/// Garantiza que cualquier colapso en hilos secundarios (daemons de
/// recolección, difusión o reposición) quede registrado antes de la
/// defunción del proceso.
fn install_panic_hook(service_nominal_identifier: &str) {
    let service_id_snapshot = service_nominal_identifier.to_string();

    panic::set_hook(Box::new(move |panic_metadata| {
        let panic_location = panic_metadata
            .location()
            .map(|location| format!("{}:{}:{}", location.file(), location.line(), location.column()))
            .unwrap_or_else(|| "UNKNOWN_LOCATION".to_string());

        let panic_payload_message = panic_metadata
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_metadata
                    .payload()
                    .downcast_ref::<String>()
                    .map(|owned| owned.as_str())
            })
            .unwrap_or("UNPRINTABLE_PANIC_PAYLOAD");

        error!(
            service = %service_id_snapshot,
            location = %panic_location,
            "💥 [PANIC_CAPTURED]: {}",
            panic_payload_message
        );
    }));
}
