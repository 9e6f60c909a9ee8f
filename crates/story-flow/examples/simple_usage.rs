use serde_json::json;
use std::sync::Arc;
use story_domain::{CreationMode, InMemoryStoryRepository};
use story_flow::{Collaborators, ContinuationConfig, CreationOutcome, FlowError, ReaderEvent, ScriptedBackend,
                 StoryService, TokioClock};
use story_generation::{GenerationContext, StrategyFactory};

#[tokio::main]
async fn main() -> Result<(), FlowError> {
    // Repo en memoria y backend guionizado que termina en el tercer segmento
    let repo = Arc::new(InMemoryStoryRepository::new());
    let backend = Arc::new(ScriptedBackend::new().ending_after(3));
    let collab = Collaborators::new(repo, backend, Arc::new(TokioClock), ContinuationConfig::default());
    let service = StoryService::new(StrategyFactory::default(), collab).with_seed(42);

    // Crear historia en modo fácil
    let ctx = GenerationContext::new(CreationMode::Easy,
                                     "example-user",
                                     json!({"difficulty": "short", "genre": "space", "characterName": "Mira"}));
    let story = match service.create_story(&ctx).await? {
        CreationOutcome::Created { story, first_segment, illustration, .. } => {
            println!("created story '{}' ({})", story.title, story.id);
            println!("[1] {}", first_segment.content);
            println!("illustration: {:?}\n", illustration.wait().await);
            story
        }
        CreationOutcome::Invalid { errors, .. } => {
            println!("invalid input: {:?}", errors);
            return Ok(());
        }
    };

    // Leer eligiendo siempre la primera opción hasta llegar al final
    let mut reader = service.open_reader(story.id).await?;
    let mut events = reader.take_events().ok_or_else(|| FlowError::Other("sin eventos".into()))?;
    while reader.accepts_choice() {
        let outcome = reader.select_choice("choice-0").await?;
        println!("[{}] {}", outcome.segment.position, outcome.segment.content);
    }

    // El evento de fin llega tras la espera configurada
    if let Some(ReaderEvent::StoryComplete { final_segment, .. }) = events.recv().await {
        println!("\nstory complete at position {}", final_segment.position);
    }
    println!("audio: {}", reader.request_audio().await?.audio_url);
    Ok(())
}
