// Archivo: config.rs
// Propósito: tiempos del protocolo de continuación, con valores por defecto
// y sobrescritura por variables de entorno `TALE_FORGE_*` (milisegundos).
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_ENDING_DELAY: &str = "TALE_FORGE_ENDING_DELAY_MS";
pub const ENV_REFETCH_INTERVAL: &str = "TALE_FORGE_REFETCH_INTERVAL_MS";
pub const ENV_REFETCH_TIMEOUT: &str = "TALE_FORGE_REFETCH_TIMEOUT_MS";
pub const ENV_BURST_INTERVAL: &str = "TALE_FORGE_RECOVERY_BURST_INTERVAL_MS";
pub const ENV_BURST_WINDOW: &str = "TALE_FORGE_RECOVERY_BURST_WINDOW_MS";
pub const ENV_BACKGROUND_INTERVAL: &str = "TALE_FORGE_RECOVERY_BACKGROUND_INTERVAL_MS";
pub const ENV_PROMPT_CHARS: &str = "TALE_FORGE_ILLUSTRATION_PROMPT_CHARS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuationConfig {
    /// Espera entre mostrar el final y emitir `StoryComplete`.
    pub ending_transition_delay: Duration,
    /// Intervalo entre recargas mientras se confirma un segmento nuevo.
    pub refetch_interval: Duration,
    /// Tiempo máximo para confirmar un segmento recién persistido.
    pub refetch_timeout: Duration,
    pub recovery_burst_interval: Duration,
    pub recovery_burst_window: Duration,
    pub recovery_background_interval: Duration,
    /// Caracteres del contenido que se usan para el prompt de ilustración.
    pub illustration_prompt_chars: usize,
}

impl Default for ContinuationConfig {
    fn default() -> Self {
        Self { ending_transition_delay: Duration::from_secs(2),
               refetch_interval: Duration::from_millis(250),
               refetch_timeout: Duration::from_secs(10),
               recovery_burst_interval: Duration::from_secs(1),
               recovery_burst_window: Duration::from_secs(5),
               recovery_background_interval: Duration::from_secs(3),
               illustration_prompt_chars: 100 }
    }
}

impl ContinuationConfig {
    /// Carga `.env` (si existe) y lee las variables del proceso.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda. Los
    /// valores ausentes o no numéricos conservan el valor por defecto.
    pub fn from_lookup<F>(lookup: F) -> Self
        where F: Fn(&str) -> Option<String>
    {
        let d = Self::default();
        let millis = |key: &str, fallback: Duration| match parse_u64(&lookup, key) {
            Some(ms) => Duration::from_millis(ms),
            None => fallback,
        };
        Self { ending_transition_delay: millis(ENV_ENDING_DELAY, d.ending_transition_delay),
               refetch_interval: millis(ENV_REFETCH_INTERVAL, d.refetch_interval),
               refetch_timeout: millis(ENV_REFETCH_TIMEOUT, d.refetch_timeout),
               recovery_burst_interval: millis(ENV_BURST_INTERVAL, d.recovery_burst_interval),
               recovery_burst_window: millis(ENV_BURST_WINDOW, d.recovery_burst_window),
               recovery_background_interval: millis(ENV_BACKGROUND_INTERVAL, d.recovery_background_interval),
               illustration_prompt_chars: parse_u64(&lookup, ENV_PROMPT_CHARS).map(|n| n as usize)
                                                                                .unwrap_or(d.illustration_prompt_chars) }
    }
}

fn parse_u64<F>(lookup: &F, key: &str) -> Option<u64>
    where F: Fn(&str) -> Option<String>
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("valor inválido para {}='{}': {}; se usa el valor por defecto", key, raw, e);
            None
        }
    }
}
