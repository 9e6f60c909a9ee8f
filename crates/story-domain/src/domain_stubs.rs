use crate::story_repository::{InMemoryStoryRepository, StoryRepository};
use crate::{CreationMode, DomainError, NewSegment, NewStory, SegmentChoice, Story};
use serde_json::json;

pub struct DomainStubs;

impl DomainStubs {
    /// Historia de ejemplo sin persistir (modo fácil, usuario `demo-user`).
    pub fn sample_story() -> NewStory {
        NewStory { user_id: Some("demo-user".into()),
                   title: Some("Mira and the Lost Comet".into()),
                   genre: Some("space".into()),
                   theme: Some("Exploration and Science".into()),
                   setting: Some("Distant Galaxy".into()),
                   difficulty: Some(3),
                   moral_lesson: Some("Curiosity helps us learn".into()),
                   prompt: Some("Write a short space adventure about Mira.".into()),
                   creation_mode: Some(CreationMode::Easy),
                   metadata: Some(json!({ "wordsPerChapter": 80 })),
                   template_id: None }
    }

    /// Crea un repositorio en memoria con una historia terminada de tres
    /// segmentos (dos intermedios con tres opciones y un final).
    pub fn sample_repo() -> Result<(InMemoryStoryRepository, Story), DomainError> {
        let repo = InMemoryStoryRepository::new();
        let story = repo.create_story(Self::sample_story())?;

        let choices = |n: u32| {
            (0..3).map(|i| SegmentChoice::object(format!("choice-{}", i), format!("Option {} at step {}", i + 1, n)))
                  .collect::<Vec<_>>()
        };
        for position in 1..=2 {
            repo.create_segment(NewSegment { story_id: story.id,
                                             content: format!("Mira floats through chapter {}.", position),
                                             position,
                                             choices: choices(position),
                                             image_prompt: None,
                                             is_end: false })?;
        }
        repo.create_segment(NewSegment { story_id: story.id,
                                         content: "Mira lands safely at home. The end.".into(),
                                         position: 3,
                                         choices: Vec::new(),
                                         image_prompt: None,
                                         is_end: true })?;
        Ok((repo, story))
    }
}
