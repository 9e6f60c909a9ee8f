use crate::{DomainError, NewSegment, NewStory, SegmentPatch, Story, StorySegment, CHOICES_PER_SEGMENT};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Contrato de persistencia que consume el núcleo de historias.
///
/// CRUD convencional. `list_segments` debe devolver los segmentos ordenados
/// por `position` ascendente.
pub trait StoryRepository: Send + Sync {
    /// Persiste la cabecera de una historia y devuelve el registro completo.
    fn create_story(&self, story: NewStory) -> Result<Story, DomainError>;

    /// Recupera una historia por id.
    fn get_story(&self, id: &Uuid) -> Result<Option<Story>, DomainError>;

    /// Historias de un usuario, de la más antigua a la más reciente.
    fn list_stories(&self, user_id: &str) -> Result<Vec<Story>, DomainError>;

    /// Inserta un segmento. La posición debe ser exactamente la siguiente a
    /// la última existente y no se admiten segmentos tras un final.
    fn create_segment(&self, segment: NewSegment) -> Result<StorySegment, DomainError>;

    /// Segmentos de la historia ordenados por `position`.
    fn list_segments(&self, story_id: &Uuid) -> Result<Vec<StorySegment>, DomainError>;

    /// Aplica un parche (sólo `image_url`) y devuelve el segmento resultante.
    fn update_segment(&self, id: &Uuid, patch: SegmentPatch) -> Result<StorySegment, DomainError>;
}

/// Implementación en memoria para tests y desarrollo.
pub struct InMemoryStoryRepository {
    stories: Arc<Mutex<HashMap<Uuid, Story>>>,
    segments: Arc<Mutex<HashMap<Uuid, Vec<StorySegment>>>>,
}

impl InMemoryStoryRepository {
    pub fn new() -> Self {
        Self { stories: Arc::new(Mutex::new(HashMap::new())),
               segments: Arc::new(Mutex::new(HashMap::new())) }
    }

    // Helper to map poisoned mutex errors into DomainError
    fn lock_map<'a, T>(&'a self, m: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, DomainError> {
        m.lock()
         .map_err(|e| DomainError::Storage(format!("Mutex '{}' poisoned: {}", name, e)))
    }

    /// Inserta una historia ya materializada (usado por los stubs).
    pub fn insert_story(&self, story: Story) -> Result<(), DomainError> {
        self.lock_map(&self.stories, "stories")?.insert(story.id, story);
        Ok(())
    }
}

impl Default for InMemoryStoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryRepository for InMemoryStoryRepository {
    fn create_story(&self, story: NewStory) -> Result<Story, DomainError> {
        let story = story.into_story()?;
        self.insert_story(story.clone())?;
        log::info!("historia creada: {} ({})", story.id, story.creation_mode);
        Ok(story)
    }

    fn get_story(&self, id: &Uuid) -> Result<Option<Story>, DomainError> {
        let stories = self.lock_map(&self.stories, "stories")?;
        Ok(stories.get(id).cloned())
    }

    fn list_stories(&self, user_id: &str) -> Result<Vec<Story>, DomainError> {
        let stories = self.lock_map(&self.stories, "stories")?;
        let mut out: Vec<Story> = stories.values().filter(|s| s.user_id == user_id).cloned().collect();
        out.sort_by_key(|s| s.created_at);
        Ok(out)
    }

    fn create_segment(&self, segment: NewSegment) -> Result<StorySegment, DomainError> {
        if !self.lock_map(&self.stories, "stories")?.contains_key(&segment.story_id) {
            return Err(DomainError::NotFound(format!("story {}", segment.story_id)));
        }
        if !segment.is_end && segment.choices.len() != CHOICES_PER_SEGMENT {
            return Err(DomainError::ValidationError(format!("un segmento intermedio necesita {} opciones, recibidas {}",
                                                            CHOICES_PER_SEGMENT,
                                                            segment.choices.len())));
        }

        let mut segments = self.lock_map(&self.segments, "segments")?;
        let list = segments.entry(segment.story_id).or_default();
        if list.last().is_some_and(|s| s.is_end) {
            return Err(DomainError::Conflict(format!("story {} ya terminó", segment.story_id)));
        }
        // Positions must stay contiguous starting at 1
        let expected = list.len() as u32 + 1;
        if segment.position != expected {
            return Err(DomainError::Conflict(format!("posición {} inválida, se esperaba {}",
                                                     segment.position, expected)));
        }

        let stored = StorySegment { id: Uuid::new_v4(),
                                    story_id: segment.story_id,
                                    content: segment.content,
                                    position: segment.position,
                                    choices: segment.choices,
                                    image_prompt: segment.image_prompt,
                                    image_url: None,
                                    is_end: segment.is_end,
                                    created_at: Utc::now() };
        list.push(stored.clone());
        Ok(stored)
    }

    fn list_segments(&self, story_id: &Uuid) -> Result<Vec<StorySegment>, DomainError> {
        let segments = self.lock_map(&self.segments, "segments")?;
        let mut out = segments.get(story_id).cloned().unwrap_or_default();
        out.sort_by_key(|s| s.position);
        Ok(out)
    }

    fn update_segment(&self, id: &Uuid, patch: SegmentPatch) -> Result<StorySegment, DomainError> {
        let mut segments = self.lock_map(&self.segments, "segments")?;
        let segment = segments.values_mut()
                              .flat_map(|list| list.iter_mut())
                              .find(|s| &s.id == id)
                              .ok_or_else(|| DomainError::NotFound(format!("segment {}", id)))?;
        if patch.image_url.is_some() {
            segment.image_url = patch.image_url;
        }
        Ok(segment.clone())
    }
}
