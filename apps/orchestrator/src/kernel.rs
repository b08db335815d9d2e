// [apps/orchestrator/src/kernel.rs]
/**
 * =================================================================
 * APARATO: ANCHOR KERNEL (V5.2)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * Actúa como la placa base donde se conectan los servicios: guardia de
 * recuperación, workers según el modo configurado, reponedor y el
 * servidor HTTP de admisión.
 * =================================================================
 */

use crate::config::{ServiceConfig, WorkerMode};
use crate::routes::create_router;
use crate::services::{
    batch_broadcaster::spawn_batch_broadcaster, batch_collector::spawn_batch_collector,
    replenisher::spawn_replenisher, single_worker::spawn_single_worker,
    unstick::spawn_unstick_guard,
};
use crate::state::AppState;
use anyhow::{Context, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::sync::watch;
use tracing::{info, warn};

pub struct AnchorKernel {
    pub application_shared_state: AppState,
}

impl AnchorKernel {
    /**
     * Ignición del cliente táctico y el estado compartido. La conexión
     * a la base de datos se establece antes de levantar servicio alguno.
     */
    pub async fn ignite(config: ServiceConfig) -> Result<Self> {
        let application_shared_state = AppState::ignite(config).await?;
        Ok(Self {
            application_shared_state,
        })
    }

    /**
     * Lanza los daemons de fondo y el servidor HTTP. No retorna salvo
     * colapso del socket de escucha.
     */
    pub async fn launch_operations(self) -> Result<()> {
        let application_state = self.application_shared_state;
        let config = application_state.config.clone();

        // Señal de apagado cooperativo: los bucles la observan entre
        // iteraciones; nada en RAM necesita drenarse (la durabilidad
        // vive en el almacén de trabajos).
        let (shutdown_transmitter, shutdown_signal) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("🛑 [SHUTDOWN]: Cancel signal received; daemons will stop between iterations.");
                let _ = shutdown_transmitter.send(true);
            }
        });

        // --- 1. GUARDIA DE RECUPERACIÓN (pasada inmediata + periódica) ---
        spawn_unstick_guard(application_state.clone(), shutdown_signal.clone());

        // --- 2. WORKERS DE DIFUSIÓN SEGÚN MODO ---
        match config.worker_mode {
            WorkerMode::Single => {
                spawn_single_worker(application_state.clone(), shutdown_signal.clone());
            }
            WorkerMode::Batch => {
                spawn_batch_collector(application_state.clone(), shutdown_signal.clone());
                spawn_batch_broadcaster(application_state.clone(), shutdown_signal.clone());
            }
        }

        // --- 3. REPONEDOR DE POOL ---
        spawn_replenisher(application_state.clone(), shutdown_signal.clone());

        // --- 4. SERVIDOR HTTP DE ADMISIÓN ---
        let listening_address =
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.listening_port);
        let tcp_listener = tokio::net::TcpListener::bind(listening_address)
            .await
            .with_context(|| format!("FATAL: Cannot bind admission socket on {}", listening_address))?;

        info!("🚀 [ANCHOR_ONLINE]: Admission API listening on {}.", listening_address);

        let mut server_shutdown_signal = shutdown_signal;
        axum::serve(tcp_listener, create_router(application_state))
            .with_graceful_shutdown(async move {
                let _ = server_shutdown_signal.changed().await;
            })
            .await
            .context("FATAL: Admission server collapsed")?;

        info!("👋 [ANCHOR_OFFLINE]: Graceful shutdown complete.");
        Ok(())
    }
}
