// [apps/orchestrator/src/main.rs]
/*!
 * =================================================================
 * APARATO: ORCHESTRATOR MAIN ENTRY POINT (V5.1)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * Condiciones fatales (base inaccesible, llave de firma ausente o
 * inválida) terminan el proceso; el supervisor externo reinicia.
 * =================================================================
 */

use dotenvy::dotenv;
use soundledger_orchestrator::prelude::*;
use soundledger_shared_vigia::init_tracing;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. CARGA DE ENTORNO
    dotenv().ok();

    // 2. OBSERVABILIDAD (VIGÍA)
    init_tracing("soundledger_orchestrator");

    // 3. RUNTIME DE TOKIO
    let runtime_orchestrator = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime_orchestrator.block_on(async {
        info!("🛰️  [ANCHOR_SERVICE]: Global ignition sequence starting...");

        // 4. CAPTURA Y VALIDACIÓN DE CONFIGURACIÓN
        let config = match ServiceConfig::from_env() {
            Ok(config) => config,
            Err(config_fault) => {
                error!("❌ [IGNITION_ABORTED]: {}", config_fault);
                std::process::exit(1);
            }
        };

        // 5. IGNICIÓN DEL KERNEL (DB -> estado -> daemons -> API)
        let kernel_instance = match AnchorKernel::ignite(config).await {
            Ok(kernel) => kernel,
            Err(ignition_fault) => {
                error!("❌ [IGNITION_ABORTED]: {}", ignition_fault);
                std::process::exit(1);
            }
        };

        if let Err(operations_fault) = kernel_instance.launch_operations().await {
            error!("❌ [ANCHOR_OFFLINE]: {}", operations_fault);
            std::process::exit(1);
        }

        Ok(())
    })
}
