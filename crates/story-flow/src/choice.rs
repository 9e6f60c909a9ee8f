// Archivo: choice.rs
// Propósito: traducir la opción elegida por el lector a un índice 0-based.
use crate::errors::{FlowError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use story_domain::SegmentChoice;

// Ids sintéticos que el frontend genera para opciones sin id propio.
static SYNTHETIC_ID: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^choice-(\d+)$").ok());

fn synthetic_index(choice_id: &str) -> Option<usize> {
    let re = SYNTHETIC_ID.as_ref()?;
    let caps = re.captures(choice_id)?;
    caps.get(1)?.as_str().parse::<usize>().ok()
}

/// Resuelve un id de opción contra las opciones del segmento actual.
///
/// Orden de resolución:
/// 1. lista vacía: error;
/// 2. opción objeto cuyo `id` coincide: su posición;
/// 3. opción texto cuyo contenido coincide exactamente: su posición;
/// 4. id con forma `choice-N`: `N`, sin comprobar límites;
/// 5. en otro caso: error.
pub fn resolve_choice_index(choice_id: &str, choices: &[SegmentChoice]) -> Result<usize> {
    let choice_id = choice_id.trim();
    if choices.is_empty() {
        return Err(FlowError::ChoiceResolution(format!("el segmento no ofrece opciones ('{}')", choice_id)));
    }
    if let Some(index) = choices.iter().position(|c| c.id() == Some(choice_id)) {
        return Ok(index);
    }
    if let Some(index) = choices.iter()
                                .position(|c| matches!(c, SegmentChoice::Text(text) if text.trim() == choice_id))
    {
        return Ok(index);
    }
    synthetic_index(choice_id).ok_or_else(|| FlowError::ChoiceResolution(format!("opción desconocida '{}'", choice_id)))
}

/// Variante que acepta la opción tal como llega del lector: una opción
/// objeto se resuelve por su id, una opción texto por su contenido.
pub fn resolve_selected_choice(selected: &SegmentChoice, choices: &[SegmentChoice]) -> Result<usize> {
    match selected {
        SegmentChoice::Object { id, .. } => resolve_choice_index(id, choices),
        SegmentChoice::Text(text) => resolve_choice_index(text, choices),
    }
}
