// Archivo: errors.rs
// Propósito: errores del protocolo de continuación y alias Result<T>.
use thiserror::Error;
use uuid::Uuid;

/// Errores del protocolo de continuación.
///
/// - Los fallos de generación se registran y se devuelven sin tocar los
///   segmentos persistidos.
/// - `Illustration` sólo aparece dentro de la tarea de ilustración, que lo
///   registra y lo descarta.
#[derive(Error, Debug)]
pub enum FlowError {
    /// Entidad no encontrada (historia o segmento).
    #[error("No encontrado: {0}")]
    NotFound(String),
    /// Errores originados por la persistencia.
    #[error("Error de dominio: {0}")]
    Domain(#[from] story_domain::DomainError),
    /// Errores del pipeline de generación (modo sin estrategia, plantilla
    /// incompleta...).
    #[error("Error de generación: {0}")]
    Generation(#[from] story_generation::GenerationError),
    /// La opción elegida no corresponde a ningún índice. No se llama al
    /// backend.
    #[error("No se pudo resolver la opción: {0}")]
    ChoiceResolution(String),
    /// El colaborador de generación falló o devolvió un error.
    #[error("Fallo en la petición de generación: {0}")]
    GenerationRequest(String),
    /// El colaborador devolvió un segmento con forma incorrecta.
    #[error("Segmento generado inválido: {0}")]
    InvalidSegment(String),
    #[error("La historia {0} ya terminó")]
    StoryEnded(Uuid),
    #[error("La historia {0} no tiene segmentos")]
    EmptyStory(Uuid),
    /// La recarga no confirmó el segmento dentro del tiempo configurado.
    #[error("El segmento {0} no apareció tras recargar")]
    RefetchTimeout(Uuid),
    #[error("Error de ilustración: {0}")]
    Illustration(String),
    #[error("Error de almacenamiento: {0}")]
    Storage(String),
    #[error("Otro: {0}")]
    Other(String),
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, FlowError>;
