use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use story_domain::{DomainError, DomainStubs, InMemoryStoryRepository, NewSegment, NewStory, SegmentChoice, SegmentPatch,
                   Story, StoryRepository, StorySegment};
use story_flow::{Collaborators, ContinuationConfig, FlowError, ReaderEvent, ReaderState, ScriptedBackend, StoryReader,
                 TokioClock};
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

fn collaborators(repo: Arc<dyn StoryRepository>, backend: Arc<ScriptedBackend>) -> Collaborators {
  Collaborators::new(repo, backend, Arc::new(TokioClock), ContinuationConfig::default())
}

/// Historia con un único segmento de apertura (tres opciones).
fn opened_story(repo: &InMemoryStoryRepository) -> Story {
  let story = repo.create_story(DomainStubs::sample_story()).expect("create story");
  repo.create_segment(NewSegment { story_id: story.id,
                                   content: "Mira looks up at the sky.".into(),
                                   position: 1,
                                   choices: vec![SegmentChoice::object("a", "Build a rocket"),
                                                 SegmentChoice::object("b", "Ask the owl"),
                                                 SegmentChoice::object("c", "Wait for night")],
                                   image_prompt: None,
                                   is_end: false })
      .expect("first segment");
  story
}

#[tokio::test(start_paused = true)]
async fn choice_persists_next_segment_and_advances_pointer() {
  let repo = Arc::new(InMemoryStoryRepository::new());
  let story = opened_story(&repo);
  let backend = Arc::new(ScriptedBackend::new());
  let mut reader = StoryReader::open(story.id, collaborators(repo.clone(), backend.clone())).await.expect("open");
  assert_eq!(reader.state(), &ReaderState::AwaitingChoice);
  assert!(reader.accepts_choice());
  assert_eq!(reader.current_index(), 0);

  let outcome = reader.select_choice("b").await.expect("continue");
  assert!(reader.accepts_choice());
  assert_eq!(outcome.segment.position, 2);
  assert_eq!(outcome.segment.choices.len(), 3);
  assert_eq!(reader.current_index(), 1);
  assert_eq!(reader.state(), &ReaderState::SegmentReady);
  assert_eq!(backend.requested_choices(), vec![Some(1)]);
  assert!(outcome.segment.content.contains("ask the owl"));
  assert_eq!(repo.list_segments(&story.id).unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn wrong_choice_count_is_rejected_without_persisting() {
  let repo = Arc::new(InMemoryStoryRepository::new());
  let story = opened_story(&repo);
  let backend = Arc::new(ScriptedBackend::new());
  backend.set_choices_per_segment(2);
  let mut reader = StoryReader::open(story.id, collaborators(repo.clone(), backend.clone())).await.expect("open");

  let err = reader.select_choice("a").await.unwrap_err();
  assert!(matches!(err, FlowError::InvalidSegment(_)));
  assert!(matches!(reader.state(), ReaderState::Failed(_)));
  assert_eq!(repo.list_segments(&story.id).unwrap().len(), 1);
  assert_eq!(reader.current_index(), 0);

  // retry allowed after failure
  backend.set_choices_per_segment(3);
  let outcome = assert_ok!(reader.select_choice("a").await);
  assert_eq!(outcome.segment.position, 2);
}

#[tokio::test(start_paused = true)]
async fn backend_failure_leaves_segments_untouched() {
  let repo = Arc::new(InMemoryStoryRepository::new());
  let story = opened_story(&repo);
  let backend = Arc::new(ScriptedBackend::new());
  backend.set_fail_segments(true);
  let mut reader = StoryReader::open(story.id, collaborators(repo.clone(), backend.clone())).await.expect("open");

  assert_err!(reader.select_choice("c").await);
  assert!(matches!(reader.state(), ReaderState::Failed(_)));
  assert_eq!(reader.segments().len(), 1);
  assert_eq!(repo.list_segments(&story.id).unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn ended_story_rejects_choices_before_calling_backend() {
  let (repo, story) = DomainStubs::sample_repo().expect("sample repo");
  let backend = Arc::new(ScriptedBackend::new());
  let mut reader = StoryReader::open(story.id, collaborators(Arc::new(repo), backend.clone())).await.expect("open");
  assert_eq!(reader.state(), &ReaderState::EndingReady);

  let err = reader.select_choice("choice-1").await.unwrap_err();
  assert!(matches!(err, FlowError::ChoiceResolution(_)));
  assert_eq!(backend.segment_calls(), 0);

  let err = reader.end_story().await.unwrap_err();
  assert!(matches!(err, FlowError::StoryEnded(id) if id == story.id));
  assert_eq!(backend.ending_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn synthetic_choice_id_is_passed_through_unchecked() {
  let repo = Arc::new(InMemoryStoryRepository::new());
  let story = opened_story(&repo);
  let backend = Arc::new(ScriptedBackend::new());
  let mut reader = StoryReader::open(story.id, collaborators(repo.clone(), backend.clone())).await.expect("open");

  assert_ok!(reader.select_choice("choice-7").await);
  assert_eq!(backend.requested_choices(), vec![Some(7)]);
}

#[tokio::test(start_paused = true)]
async fn unknown_choice_fails_without_backend_call() {
  let repo = Arc::new(InMemoryStoryRepository::new());
  let story = opened_story(&repo);
  let backend = Arc::new(ScriptedBackend::new());
  let mut reader = StoryReader::open(story.id, collaborators(repo.clone(), backend.clone())).await.expect("open");

  let err = reader.select_choice("dance").await.unwrap_err();
  assert!(matches!(err, FlowError::ChoiceResolution(_)));
  assert!(matches!(reader.state(), ReaderState::Failed(_)));
  assert_eq!(backend.segment_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn illustration_failure_does_not_block_narration() {
  let repo = Arc::new(InMemoryStoryRepository::new());
  let story = opened_story(&repo);
  let backend = Arc::new(ScriptedBackend::new().with_image_delay(Duration::from_secs(5)));
  backend.set_fail_images(true);
  let mut reader = StoryReader::open(story.id, collaborators(repo.clone(), backend.clone())).await.expect("open");

  let started = Instant::now();
  let outcome = reader.select_choice("a").await.expect("continue");
  assert!(started.elapsed() < Duration::from_secs(1));
  assert!(!outcome.illustration.is_finished());
  assert_eq!(reader.current_index(), 1);

  assert_eq!(outcome.illustration.wait().await, None);
  let stored = repo.list_segments(&story.id).unwrap();
  assert_eq!(stored[1].image_url, None);
  assert_eq!(backend.image_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn illustration_url_is_attached_when_ready() {
  let repo = Arc::new(InMemoryStoryRepository::new());
  let story = opened_story(&repo);
  let backend = Arc::new(ScriptedBackend::new().with_image_delay(Duration::from_secs(3)));
  let mut reader = StoryReader::open(story.id, collaborators(repo.clone(), backend.clone())).await.expect("open");

  let outcome = reader.select_choice("a").await.expect("continue");
  assert_eq!(outcome.segment.image_url, None);
  assert!(outcome.segment.image_prompt.as_deref().is_some_and(|p| p.starts_with("Children's book illustration: ")));

  let url = outcome.illustration.wait().await.expect("image url");
  let stored = repo.list_segments(&story.id).unwrap();
  assert_eq!(stored[1].image_url.as_deref(), Some(url.as_str()));
}

#[tokio::test(start_paused = true)]
async fn ending_emits_story_complete_once_after_delay() {
  let repo = Arc::new(InMemoryStoryRepository::new());
  let story = opened_story(&repo);
  let backend = Arc::new(ScriptedBackend::new());
  let mut reader = StoryReader::open(story.id, collaborators(repo.clone(), backend.clone())).await.expect("open");
  let mut events = reader.take_events().expect("events");

  let started = Instant::now();
  let outcome = reader.end_story().await.expect("ending");
  assert!(outcome.segment.is_end);
  assert!(outcome.segment.choices.is_empty());
  assert_eq!(reader.state(), &ReaderState::EndingReady);
  assert!(reader.is_completion_scheduled());

  // refetching again must not schedule a second event
  reader.refresh().expect("refresh");

  match events.recv().await.expect("event") {
    ReaderEvent::StoryComplete { story: done, final_segment } => {
      assert_eq!(done.id, story.id);
      assert_eq!(final_segment.id, outcome.segment.id);
    }
  }
  assert!(started.elapsed() >= Duration::from_secs(2));

  tokio::time::sleep(Duration::from_secs(10)).await;
  assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn closing_reader_cancels_pending_completion() {
  let (repo, story) = DomainStubs::sample_repo().expect("sample repo");
  let collab = collaborators(Arc::new(repo), Arc::new(ScriptedBackend::new()));
  let mut reader = StoryReader::open(story.id, collab).await.expect("open");
  let mut events = reader.take_events().expect("events");
  assert!(reader.is_completion_scheduled());

  reader.close();
  tokio::time::sleep(Duration::from_secs(5)).await;
  assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn audio_failure_is_reported_without_state_change() {
  let repo = Arc::new(InMemoryStoryRepository::new());
  let story = opened_story(&repo);
  let backend = Arc::new(ScriptedBackend::new());
  let reader = StoryReader::open(story.id, collaborators(repo.clone(), backend.clone())).await.expect("open");

  let audio = reader.request_audio().await.expect("audio");
  assert!(audio.audio_url.contains(&story.id.to_string()));

  backend.set_fail_audio(true);
  assert_err!(reader.request_audio().await);
  assert_eq!(reader.state(), &ReaderState::AwaitingChoice);
  assert_eq!(backend.audio_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn choices_only_on_latest_segment() {
  let repo = Arc::new(InMemoryStoryRepository::new());
  let story = opened_story(&repo);
  let collab = collaborators(repo.clone(), Arc::new(ScriptedBackend::new()));
  let mut reader = StoryReader::open(story.id, collab).await.expect("open");
  reader.select_choice("a").await.expect("continue");
  reader.go_to(0).expect("go back");
  assert!(matches!(reader.select_choice("b").await, Err(FlowError::ChoiceResolution(_))));
  assert!(reader.go_to(9).is_err());
}

/// Repositorio que oculta el último segmento durante las primeras
/// `hidden_reads` lecturas, como una réplica con retraso.
struct LaggingRepository {
  inner: InMemoryStoryRepository,
  hidden_reads: AtomicUsize,
  reads: AtomicUsize,
}

impl LaggingRepository {
  fn new(inner: InMemoryStoryRepository, hidden_reads: usize) -> Self {
    Self { inner, hidden_reads: AtomicUsize::new(hidden_reads), reads: AtomicUsize::new(0) }
  }

  /// La réplica se pone al día.
  fn catch_up(&self) {
    self.hidden_reads.store(0, Ordering::SeqCst);
  }
}

impl StoryRepository for LaggingRepository {
  fn create_story(&self, story: NewStory) -> Result<Story, DomainError> {
    self.inner.create_story(story)
  }

  fn get_story(&self, id: &Uuid) -> Result<Option<Story>, DomainError> {
    self.inner.get_story(id)
  }

  fn list_stories(&self, user_id: &str) -> Result<Vec<Story>, DomainError> {
    self.inner.list_stories(user_id)
  }

  fn create_segment(&self, segment: NewSegment) -> Result<StorySegment, DomainError> {
    self.reads.store(0, Ordering::SeqCst);
    self.inner.create_segment(segment)
  }

  fn list_segments(&self, story_id: &Uuid) -> Result<Vec<StorySegment>, DomainError> {
    let mut segments = self.inner.list_segments(story_id)?;
    if self.reads.fetch_add(1, Ordering::SeqCst) < self.hidden_reads.load(Ordering::SeqCst) && segments.len() > 1 {
      segments.pop();
    }
    Ok(segments)
  }

  fn update_segment(&self, id: &Uuid, patch: SegmentPatch) -> Result<StorySegment, DomainError> {
    self.inner.update_segment(id, patch)
  }
}

#[tokio::test(start_paused = true)]
async fn pointer_advances_only_after_refetch_confirms() {
  let inner = InMemoryStoryRepository::new();
  let story = opened_story(&inner);
  let repo = Arc::new(LaggingRepository::new(inner, 3));
  let collab = collaborators(repo.clone(), Arc::new(ScriptedBackend::new()));
  let mut reader = StoryReader::open(story.id, collab).await.expect("open");

  let started = Instant::now();
  let outcome = reader.select_choice("a").await.expect("continue");
  // three hidden reads, polled every 250 ms
  assert!(started.elapsed() >= Duration::from_millis(750));
  assert!(started.elapsed() < Duration::from_secs(1));
  assert_eq!(reader.current_segment().map(|s| s.id), Some(outcome.segment.id));
}

#[tokio::test(start_paused = true)]
async fn refetch_timeout_keeps_pointer_and_fails() {
  let inner = InMemoryStoryRepository::new();
  let story = opened_story(&inner);
  let repo = Arc::new(LaggingRepository::new(inner, usize::MAX));
  let collab = collaborators(repo.clone(), Arc::new(ScriptedBackend::new()));
  let mut reader = StoryReader::open(story.id, collab).await.expect("open");

  let err = reader.select_choice("a").await.unwrap_err();
  assert!(matches!(err, FlowError::RefetchTimeout(_)));
  assert_eq!(reader.current_index(), 0);
  assert_eq!(reader.segments().len(), 1);
  assert!(matches!(reader.state(), ReaderState::Failed(_)));
}

#[tokio::test(start_paused = true)]
async fn retry_after_refetch_timeout_confirms_without_regenerating() {
  let inner = InMemoryStoryRepository::new();
  let story = opened_story(&inner);
  let repo = Arc::new(LaggingRepository::new(inner, usize::MAX));
  let backend = Arc::new(ScriptedBackend::new());
  let collab = collaborators(repo.clone(), backend.clone());
  let mut reader = StoryReader::open(story.id, collab).await.expect("open");

  let err = reader.select_choice("a").await.unwrap_err();
  assert!(matches!(err, FlowError::RefetchTimeout(_)));
  assert!(reader.has_pending_segment());
  assert!(reader.accepts_choice());
  assert_eq!(repo.inner.list_segments(&story.id).unwrap().len(), 2);

  repo.catch_up();
  let outcome = reader.select_choice("a").await.expect("retry");
  assert_eq!(outcome.segment.position, 2);
  assert_eq!(backend.segment_calls(), 1);
  assert_eq!(reader.current_index(), 1);
  assert_eq!(reader.segments().len(), 2);
  assert_eq!(reader.state(), &ReaderState::SegmentReady);
  assert!(!reader.has_pending_segment());

  // the story keeps going from the confirmed segment
  let next = reader.select_choice("choice-0").await.expect("third segment");
  assert_eq!(next.segment.position, 3);
  assert_eq!(backend.segment_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn refresh_adopts_segment_left_pending_by_timeout() {
  let inner = InMemoryStoryRepository::new();
  let story = opened_story(&inner);
  let repo = Arc::new(LaggingRepository::new(inner, usize::MAX));
  let backend = Arc::new(ScriptedBackend::new());
  let collab = collaborators(repo.clone(), backend.clone());
  let mut reader = StoryReader::open(story.id, collab).await.expect("open");

  assert_err!(reader.end_story().await);
  assert!(reader.has_pending_segment());

  repo.catch_up();
  assert_eq!(reader.refresh().expect("refresh"), 2);
  assert!(!reader.has_pending_segment());
  assert_eq!(reader.current_index(), 1);
  assert_eq!(reader.state(), &ReaderState::EndingReady);
  assert!(!reader.accepts_choice());
  assert_eq!(backend.ending_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn closed_reader_never_reschedules_completion() {
  let (repo, story) = DomainStubs::sample_repo().expect("sample repo");
  let collab = collaborators(Arc::new(repo), Arc::new(ScriptedBackend::new()));
  let mut reader = StoryReader::open(story.id, collab).await.expect("open");
  let mut events = reader.take_events().expect("events");

  reader.close();
  reader.refresh().expect("refresh");
  reader.go_to(2).expect("ending segment");
  assert!(!reader.is_completion_scheduled());

  tokio::time::sleep(Duration::from_secs(5)).await;
  assert!(events.try_recv().is_err());
}
