// Archivo: clock.rs
// Propósito: reloj inyectable. Toda espera del protocolo pasa por aquí para
// poder controlar el tiempo en tests (`tokio::time::pause`).
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Reloj respaldado por `tokio::time`. Con el runtime pausado avanza de forma
/// determinista.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
