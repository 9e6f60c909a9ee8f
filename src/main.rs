use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use serde_json::{json, Value as JsonValue};
use story_domain::{CreationMode, InMemoryStoryRepository, SegmentChoice};
use story_flow::{Collaborators, ContinuationConfig, CreationOutcome, ScriptedBackend, StoryReader, StoryService,
                 TokioClock};
use story_generation::{GenerationContext, StrategyFactory};
use uuid::Uuid;

const USER_ID: &str = "cli-user";

/// Pequeño menú interactivo para crear y leer historias usando el
/// repositorio en memoria y el backend guionizado.
///
/// Opciones soportadas:
/// 1) Crear historia (modo fácil)
/// 2) Crear historia desde plantilla
/// 3) Crear historia avanzada
/// 4) Listar historias
/// 5) Leer / continuar una historia
/// 6) Salir
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = ContinuationConfig::from_env();
    log::info!("configuración de continuación: {:?}", config);
    let repo = Arc::new(InMemoryStoryRepository::new());
    let backend = Arc::new(ScriptedBackend::new().ending_after(5));
    let collab = Collaborators::new(repo, backend, Arc::new(TokioClock), config);
    let service = StoryService::new(StrategyFactory::default(), collab);

    loop {
        println!("\n== Tale Forge ==");
        println!("1) Crear historia (modo fácil)");
        println!("2) Crear historia desde plantilla");
        println!("3) Crear historia avanzada");
        println!("4) Listar historias");
        println!("5) Leer / continuar una historia");
        println!("6) Salir");
        let choice = prompt("Elige una opción: ")?;
        match choice.trim() {
            "1" => {
                let name = prompt("Nombre del personaje: ")?;
                let genre = prompt("Género (fantasy, space, ocean...): ")?;
                let length = prompt("Longitud (short, medium, long): ")?;
                let raw = json!({ "characterName": name.trim(), "genre": genre.trim(), "difficulty": length.trim() });
                create(&service, CreationMode::Easy, raw).await;
            }
            "2" => {
                let child = prompt("Nombre del niño/a: ")?;
                create(&service, CreationMode::Template, demo_template(child.trim())).await;
            }
            "3" => {
                let child = prompt("Nombre del niño/a: ")?;
                create(&service, CreationMode::Advanced, demo_advanced(child.trim())).await;
            }
            "4" => match service.list_stories(USER_ID) {
                Ok(stories) if stories.is_empty() => println!("No hay historias todavía."),
                Ok(stories) => {
                    println!("\nID                                   | MODO     | TÍTULO");
                    println!("-----------------------------------------------------------------------------------");
                    for s in stories {
                        println!("{} | {:<8} | {}", s.id, s.creation_mode, s.title);
                    }
                }
                Err(e) => eprintln!("Error listando historias: {}", e),
            },
            "5" => {
                let raw = prompt("Id de la historia (UUID): ")?;
                let story_id = match Uuid::parse_str(raw.trim()) {
                    Ok(id) => id,
                    Err(_) => {
                        eprintln!("UUID inválido");
                        continue;
                    }
                };
                match service.open_reader(story_id).await {
                    Ok(reader) => read_story(reader).await.context("sesión de lectura")?,
                    Err(e) => eprintln!("Error abriendo historia: {}", e),
                }
            }
            "6" => break,
            other => println!("Opción no válida: {}", other),
        }
    }
    Ok(())
}

async fn create(service: &StoryService, mode: CreationMode, raw: JsonValue) {
    let ctx = GenerationContext::new(mode, USER_ID, raw);
    match service.create_story(&ctx).await {
        Ok(CreationOutcome::Created { story, first_segment, warnings, .. }) => {
            println!("\nHistoria creada: {} ({})", story.title, story.id);
            for w in warnings {
                println!("  aviso: {}", w);
            }
            println!("\n{}", first_segment.content);
        }
        Ok(CreationOutcome::Invalid { errors, warnings }) => {
            println!("La historia no es válida:");
            for e in errors {
                println!("  - {}", e);
            }
            for w in warnings {
                println!("  aviso: {}", w);
            }
        }
        Err(e) => eprintln!("Error creando historia: {}", e),
    }
}

async fn read_story(mut reader: StoryReader) -> anyhow::Result<()> {
    loop {
        let Some(segment) = reader.current_segment().cloned() else {
            println!("La historia aún no tiene segmentos.");
            return Ok(());
        };
        println!("\n[{}] {}", segment.position, segment.content);
        if let Some(url) = &segment.image_url {
            println!("  (ilustración: {})", url);
        }
        if segment.is_end {
            println!("\n-- Fin --");
            match reader.request_audio().await {
                Ok(audio) => println!("Audio: {}", audio.audio_url),
                Err(e) => eprintln!("Audio no disponible: {}", e),
            }
            return Ok(());
        }
        for (i, c) in segment.choices.iter().enumerate() {
            println!("  {}) {}", i + 1, c.text());
        }
        let input = prompt("Elige (número), 'f' para terminar, 'v' para volver: ")?;
        let result = match input.trim() {
            "v" => return Ok(()),
            "f" => reader.end_story().await,
            n => match n.parse::<usize>().ok().and_then(|n| segment.choices.get(n.wrapping_sub(1))) {
                Some(choice) => reader.select_choice(&choice_key(choice, n)).await,
                None => {
                    println!("Opción no válida");
                    continue;
                }
            },
        };
        if let Err(e) = result {
            eprintln!("Error continuando la historia: {}", e);
        }
    }
}

fn choice_key(choice: &SegmentChoice, fallback: &str) -> String {
    match choice {
        SegmentChoice::Object { id, .. } => id.clone(),
        SegmentChoice::Text(text) if !text.trim().is_empty() => text.clone(),
        SegmentChoice::Text(_) => format!("choice-{}", fallback.parse::<usize>().unwrap_or(1).saturating_sub(1)),
    }
}

fn demo_template(child: &str) -> JsonValue {
    json!({
        "templateId": "tpl-moon-picnic",
        "childName": child,
        "template": {
            "id": "tpl-moon-picnic",
            "name": "Moon Picnic",
            "genre": "space",
            "theme": "Friendship among the stars",
            "characters": [
                {"id": "c1", "name": "Zog", "description": "A small green explorer.", "role": "main", "traits": ["curious"]},
                {"id": "c2", "name": "Blip", "description": "A helpful robot.", "role": "supporting", "traits": ["loyal"]}
            ],
            "settings": {"location": "The Moon", "timePeriod": "the future", "atmosphere": "dreamy", "description": "Silver craters everywhere."},
            "conflict": "The picnic basket floated away",
            "quest": "Bring the basket back before sunrise",
            "moralLesson": "Sharing makes every adventure better",
            "difficulty": 4
        },
        "customizations": {"characterTraits": ["brave"], "settingDetails": "There is a purple lake."}
    })
}

fn demo_advanced(child: &str) -> JsonValue {
    json!({
        "childName": child,
        "difficulty": 6,
        "genre": "ocean",
        "theme": "Courage under the waves",
        "characters": [
            {"id": "c1", "name": child, "role": "main", "traits": ["brave", "curious"]},
            {"id": "c2", "name": "Pearl", "role": "supporting", "description": "A shy octopus."}
        ],
        "location": "Coral City",
        "timePeriod": "a summer morning",
        "atmosphere": "sparkling",
        "conflict": "The coral lights are fading",
        "quest": "Find the old lighthouse fish",
        "moralLesson": "Asking for help is a kind of bravery",
        "length": "medium"
    })
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}
