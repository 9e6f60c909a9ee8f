// Archivo: backend.rs
// Propósito: contrato del colaborador de generación (texto, imagen, audio)
// y las formas de petición/respuesta que consume el protocolo.
use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use story_domain::{SegmentChoice, Story, StorySegment};
use uuid::Uuid;

/// Petición de un segmento nuevo. `choice_index` es `None` para el primer
/// segmento de la historia.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRequest {
    pub story_id: Uuid,
    pub choice_index: Option<usize>,
    /// Texto de la opción elegida, como contexto adicional.
    pub choice_text: Option<String>,
    pub story: Story,
    /// Segmentos ya persistidos, en orden de posición.
    pub previous_segments: Vec<StorySegment>,
}

/// Petición de un segmento final.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndingRequest {
    pub story_id: Uuid,
    pub story: Story,
    pub previous_segments: Vec<StorySegment>,
}

/// Respuesta del generador de texto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSegment {
    pub content: String,
    pub choices: Vec<SegmentChoice>,
    pub image_prompt: Option<String>,
    pub is_end: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub segment_id: Uuid,
    pub image_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioRequest {
    pub story_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioResult {
    pub audio_url: String,
}

/// Colaborador externo de generación.
///
/// El protocolo no conoce el transporte concreto (HTTP, cola, ...); sólo
/// estas formas de llamada y retorno.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Genera el siguiente segmento con tres opciones (o un final si el
    /// generador decide terminar la historia).
    async fn generate_segment(&self, request: SegmentRequest) -> Result<GeneratedSegment>;

    /// Genera un segmento final.
    async fn generate_ending(&self, request: EndingRequest) -> Result<GeneratedSegment>;

    /// Genera una ilustración y devuelve su URL.
    async fn generate_image(&self, request: ImageRequest) -> Result<String>;

    /// Narración en audio de la historia completa.
    async fn generate_audio(&self, request: AudioRequest) -> Result<AudioResult>;
}
