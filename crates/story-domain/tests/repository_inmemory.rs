use serde_json::json;
use story_domain::{DomainError, DomainStubs, InMemoryStoryRepository, NewSegment, SegmentChoice, SegmentPatch,
                   StoryRepository};

fn three_choices() -> Vec<SegmentChoice> {
  vec![SegmentChoice::Text("left".into()), SegmentChoice::Text("right".into()), SegmentChoice::Text("wait".into())]
}

#[test]
fn segments_are_listed_with_contiguous_positions() {
  let (repo, story) = DomainStubs::sample_repo().expect("sample repo");
  let segments = repo.list_segments(&story.id).unwrap();
  let positions: Vec<u32> = segments.iter().map(|s| s.position).collect();
  assert_eq!(positions, vec![1, 2, 3]);
  // exactly one ending and it is the last one
  assert_eq!(segments.iter().filter(|s| s.is_end).count(), 1);
  assert!(segments.last().unwrap().is_end);
  for s in segments.iter().filter(|s| !s.is_end) {
    assert_eq!(s.choices.len(), 3);
  }
}

#[test]
fn create_segment_rejects_gaps_and_writes_after_ending() {
  let repo = InMemoryStoryRepository::new();
  let story = repo.create_story(DomainStubs::sample_story()).unwrap();

  let gap = repo.create_segment(NewSegment { story_id: story.id,
                                             content: "skip".into(),
                                             position: 2,
                                             choices: three_choices(),
                                             image_prompt: None,
                                             is_end: false });
  assert!(matches!(gap, Err(DomainError::Conflict(_))));

  repo.create_segment(NewSegment { story_id: story.id,
                                   content: "The end".into(),
                                   position: 1,
                                   choices: vec![],
                                   image_prompt: None,
                                   is_end: true })
      .unwrap();
  let after_end = repo.create_segment(NewSegment { story_id: story.id,
                                                   content: "more".into(),
                                                   position: 2,
                                                   choices: three_choices(),
                                                   image_prompt: None,
                                                   is_end: false });
  assert!(matches!(after_end, Err(DomainError::Conflict(_))));
}

#[test]
fn create_segment_requires_three_choices_unless_ending() {
  let repo = InMemoryStoryRepository::new();
  let story = repo.create_story(DomainStubs::sample_story()).unwrap();
  let res = repo.create_segment(NewSegment { story_id: story.id,
                                             content: "only two".into(),
                                             position: 1,
                                             choices: three_choices().into_iter().take(2).collect(),
                                             image_prompt: None,
                                             is_end: false });
  assert!(matches!(res, Err(DomainError::ValidationError(_))));
}

#[test]
fn update_segment_attaches_image_url() {
  let (repo, story) = DomainStubs::sample_repo().unwrap();
  let first = repo.list_segments(&story.id).unwrap().remove(0);
  assert!(first.image_url.is_none());
  let updated = repo.update_segment(&first.id, SegmentPatch { image_url: Some("https://img/1.png".into()) })
                    .unwrap();
  assert_eq!(updated.image_url.as_deref(), Some("https://img/1.png"));
  assert_eq!(updated.content, first.content);

  let missing = repo.update_segment(&uuid::Uuid::new_v4(), SegmentPatch::default());
  assert!(matches!(missing, Err(DomainError::NotFound(_))));
}

#[test]
fn list_stories_filters_by_user() {
  let repo = InMemoryStoryRepository::new();
  repo.create_story(DomainStubs::sample_story()).unwrap();
  let mut other = DomainStubs::sample_story();
  other.user_id = Some("someone-else".into());
  repo.create_story(other).unwrap();

  assert_eq!(repo.list_stories("demo-user").unwrap().len(), 1);
  assert!(repo.list_stories("nobody").unwrap().is_empty());
}

#[test]
fn mixed_choice_representations_deserialize() {
  let raw = json!(["go north", {"id": "choice-1", "text": "go south"}]);
  let choices: Vec<SegmentChoice> = serde_json::from_value(raw).unwrap();
  assert_eq!(choices[0], SegmentChoice::Text("go north".into()));
  assert_eq!(choices[1].id(), Some("choice-1"));
  assert_eq!(choices[1].text(), "go south");
}
