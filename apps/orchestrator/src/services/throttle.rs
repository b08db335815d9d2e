// [apps/orchestrator/src/services/throttle.rs]
/*!
 * =================================================================
 * APARATO: TOKEN BUCKET THROTTLE (V5.2)
 * CLASIFICACIÓN: PROCESS-LOCAL PRIMITIVE (ESTRATO L4)
 * RESPONSABILIDAD: MEDICIÓN DE CAUDAL DE DIFUSIÓN
 *
 * Semántica contractual:
 * - Capacidad C; relleno continuo a razón de C / window_ms por milisegundo.
 * - take(n) suspende cooperativamente hasta que available >= n.
 * - Relleno inicial = C (ráfaga inicial permitida hasta la capacidad).
 * - El balde es local al proceso; el escalado horizontal exigiría un
 *   limitador compartido, fuera del contrato.
 * =================================================================
 */

use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Rebanada máxima de suspensión mientras se acumulan fichas.
const MAX_SLEEP_SLICE: Duration = Duration::from_millis(250);

struct BucketState {
    available_tokens: f64,
    last_refill_instant: Instant,
}

/// Balde de fichas de relleno continuo.
pub struct TokenBucket {
    capacity: f64,
    refill_rate_per_millisecond: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    #[must_use]
    pub fn new(capacity: u32, window_ms: u64) -> Self {
        let capacity_f = f64::from(capacity);
        Self {
            capacity: capacity_f,
            refill_rate_per_millisecond: capacity_f / window_ms as f64,
            state: Mutex::new(BucketState {
                available_tokens: capacity_f,
                last_refill_instant: Instant::now(),
            }),
        }
    }

    /// Adquiere `tokens` fichas, suspendiendo hasta que estén disponibles.
    ///
    /// Es el único punto de estrangulamiento del difusor; ningún otro
    /// bucle compite por fichas.
    pub async fn take(&self, tokens: u32) {
        let requested = f64::from(tokens).min(self.capacity);

        loop {
            let wait_hint = {
                let mut bucket = self.state.lock().await;
                self.refill(&mut bucket);

                if bucket.available_tokens >= requested {
                    bucket.available_tokens -= requested;
                    return;
                }

                let deficit = requested - bucket.available_tokens;
                Duration::from_millis(
                    (deficit / self.refill_rate_per_millisecond).ceil() as u64
                )
            };

            sleep(wait_hint.min(MAX_SLEEP_SLICE)).await;
        }
    }

    /// Fichas disponibles en este instante (diagnóstico y pruebas).
    pub async fn available(&self) -> f64 {
        let mut bucket = self.state.lock().await;
        self.refill(&mut bucket);
        bucket.available_tokens
    }

    fn refill(&self, bucket: &mut BucketState) {
        let now = Instant::now();
        let elapsed_milliseconds =
            now.duration_since(bucket.last_refill_instant).as_secs_f64() * 1000.0;
        bucket.last_refill_instant = now;
        bucket.available_tokens = (bucket.available_tokens
            + elapsed_milliseconds * self.refill_rate_per_millisecond)
            .min(self.capacity);
    }
}
