//! Request-layer behaviour against the in-memory store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use agora_core::DomainError;
use agora_core::domain::{DomainEvent, EventType};
use agora_core::ports::{EventPublisher, LikeRepository, PublishError, ViewRepository};
use agora_core::service::{CreatePost, ListComments, ListPosts, PostService, UpdatePost};
use agora_infra::InMemoryStore;

/// Keeps every published event for later inspection.
#[derive(Default)]
struct RecordingPublisher {
    events: Mutex<Vec<(String, DomainEvent)>>,
}

impl RecordingPublisher {
    fn published(&self) -> Vec<(String, DomainEvent)> {
        self.events.lock().unwrap().clone()
    }

    fn count(&self, event_type: EventType) -> usize {
        self.published()
            .iter()
            .filter(|(_, e)| e.event_type == event_type)
            .count()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, event: &DomainEvent) -> Result<(), PublishError> {
        self.events
            .lock()
            .unwrap()
            .push((topic.to_string(), event.clone()));
        Ok(())
    }
}

struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _topic: &str, _event: &DomainEvent) -> Result<(), PublishError> {
        Err(PublishError::Publish("bus down".into()))
    }
}

fn service_with(events: Arc<dyn EventPublisher>) -> PostService {
    let store = Arc::new(InMemoryStore::new());
    PostService::new(store.clone(), store.clone(), store.clone(), store, events)
}

fn setup() -> (PostService, Arc<RecordingPublisher>) {
    let events = Arc::new(RecordingPublisher::default());
    (service_with(events.clone()), events)
}

fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

async fn create(service: &PostService, creator: &str, title: &str, private: bool) -> Uuid {
    service
        .create_post(CreatePost {
            title: title.into(),
            creator_id: creator.into(),
            is_private: private,
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}

fn list(requester: &str) -> ListPosts {
    ListPosts {
        page: 1,
        page_size: 10,
        requester_id: requester.into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_post_preserves_fields_and_tags() {
    let (service, _) = setup();

    let post = service
        .create_post(CreatePost {
            title: "Hello".into(),
            description: Some("world".into()),
            creator_id: "alice".into(),
            is_private: false,
            tags: tags(&["rust", "web"]),
        })
        .await
        .unwrap();

    assert!(!post.id.is_nil());
    assert_eq!(post.title, "Hello");
    assert_eq!(post.description.as_deref(), Some("world"));
    assert_eq!(post.creator_id, "alice");
    assert!(!post.is_private());
    assert_eq!(post.tag_names(), vec!["rust", "web"]);

    let fetched = service.get_post(post.id, "bob").await.unwrap();
    assert_eq!(fetched.tag_names(), vec!["rust", "web"]);
}

#[tokio::test]
async fn create_post_normalizes_tag_names() {
    let (service, _) = setup();

    let post = service
        .create_post(CreatePost {
            title: "Tags".into(),
            creator_id: "alice".into(),
            tags: tags(&["rust", "", "web", "rust"]),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(post.tag_names(), vec!["rust", "web"]);
}

#[tokio::test]
async fn posts_sharing_a_tag_share_one_tag_record() {
    let (service, _) = setup();

    let first = service
        .create_post(CreatePost {
            title: "one".into(),
            creator_id: "alice".into(),
            tags: tags(&["shared"]),
            ..Default::default()
        })
        .await
        .unwrap();
    let second = service
        .create_post(CreatePost {
            title: "two".into(),
            creator_id: "bob".into(),
            tags: tags(&["shared"]),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(first.tags[0].id, second.tags[0].id);
}

#[tokio::test]
async fn create_post_validates_title_and_creator() {
    let (service, _) = setup();

    let err = service
        .create_post(CreatePost {
            title: "   ".into(),
            creator_id: "alice".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidArgument(_)));

    let err = service
        .create_post(CreatePost {
            title: "Title".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidArgument(_)));
}

#[tokio::test]
async fn private_post_is_hidden_from_other_callers() {
    let (service, _) = setup();
    let id = create(&service, "alice", "secret", true).await;

    assert!(service.get_post(id, "alice").await.is_ok());
    assert!(matches!(
        service.get_post(id, "bob").await,
        Err(DomainError::PermissionDenied(_))
    ));
    assert!(matches!(
        service.like_post(id, "bob").await,
        Err(DomainError::PermissionDenied(_))
    ));
    assert!(matches!(
        service.view_post(id, "bob").await,
        Err(DomainError::PermissionDenied(_))
    ));
    assert!(matches!(
        service.comment_post(id, "bob", "hi".into()).await,
        Err(DomainError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn missing_post_is_not_found_before_anything_else() {
    let (service, _) = setup();
    let id = Uuid::new_v4();

    assert!(matches!(
        service.get_post(id, "bob").await,
        Err(DomainError::NotFound { .. })
    ));
    // Empty content on a missing post still reports the missing post.
    assert!(matches!(
        service.comment_post(id, "bob", String::new()).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        service.delete_post(id, "bob").await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn permission_is_checked_before_content() {
    let (service, _) = setup();
    let id = create(&service, "alice", "secret", true).await;

    assert!(matches!(
        service.comment_post(id, "bob", "  ".into()).await,
        Err(DomainError::PermissionDenied(_))
    ));
    assert!(matches!(
        service.comment_post(id, "alice", "  ".into()).await,
        Err(DomainError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn update_by_non_creator_is_denied_and_leaves_post_unchanged() {
    let (service, _) = setup();
    let id = create(&service, "alice", "first draft", false).await;

    let err = service
        .update_post(UpdatePost {
            id,
            title: Some("hijacked".into()),
            description: None,
            is_private: true,
            tags: tags(&["x"]),
            updater_id: "bob".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::PermissionDenied(_)));

    let post = service.get_post(id, "alice").await.unwrap();
    assert_eq!(post.title, "first draft");
    assert!(!post.is_private());
    assert!(post.tags.is_empty());
}

#[tokio::test]
async fn update_applies_partial_fields_and_replaces_tags() {
    let (service, _) = setup();
    let created = service
        .create_post(CreatePost {
            title: "Draft".into(),
            description: Some("notes".into()),
            creator_id: "alice".into(),
            tags: tags(&["a", "b"]),
            ..Default::default()
        })
        .await
        .unwrap();

    let updated = service
        .update_post(UpdatePost {
            id: created.id,
            title: Some(" ".into()),
            description: None,
            is_private: true,
            tags: tags(&["c"]),
            updater_id: "alice".into(),
        })
        .await
        .unwrap();
    assert_eq!(updated.title, "Draft");
    assert_eq!(updated.description.as_deref(), Some("notes"));
    assert!(updated.is_private());
    assert_eq!(updated.tag_names(), vec!["c"]);
    assert!(updated.updated_at >= created.updated_at);

    let cleared = service
        .update_post(UpdatePost {
            id: created.id,
            title: Some("Final".into()),
            description: Some(String::new()),
            is_private: false,
            tags: Vec::new(),
            updater_id: "alice".into(),
        })
        .await
        .unwrap();
    assert_eq!(cleared.title, "Final");
    assert!(cleared.description.is_none());
    assert!(cleared.tags.is_empty());
}

#[tokio::test]
async fn delete_requires_ownership_and_removes_the_post() {
    let (service, _) = setup();
    let id = create(&service, "alice", "doomed", false).await;
    service
        .comment_post(id, "bob", "first!".into())
        .await
        .unwrap();

    assert!(matches!(
        service.delete_post(id, "bob").await,
        Err(DomainError::PermissionDenied(_))
    ));

    service.delete_post(id, "alice").await.unwrap();
    assert!(matches!(
        service.get_post(id, "alice").await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn like_toggles_alternate_and_restore_the_count() {
    let (service, events) = setup();
    let id = create(&service, "alice", "likeable", false).await;

    let first = service.like_post(id, "bob").await.unwrap();
    assert!(first.liked);
    assert_eq!(first.total_likes, 1);

    let second = service.like_post(id, "bob").await.unwrap();
    assert!(!second.liked);
    assert_eq!(second.total_likes, 0);

    let third = service.like_post(id, "bob").await.unwrap();
    assert!(third.liked);
    assert_eq!(third.total_likes, 1);

    // Only the add transitions publish.
    assert_eq!(events.count(EventType::PostLiked), 2);
}

#[tokio::test]
async fn repeated_views_store_once_and_notify_every_time() {
    let (service, events) = setup();
    let id = create(&service, "alice", "popular", false).await;

    let mut first_views = Vec::new();
    for _ in 0..3 {
        let result = service.view_post(id, "bob").await.unwrap();
        assert_eq!(result.post.id, id);
        first_views.push(result.first_view);
    }

    assert_eq!(first_views, vec![true, false, false]);
    assert_eq!(events.count(EventType::PostViewed), 3);
    assert!(
        events
            .published()
            .iter()
            .all(|(topic, e)| topic == "post_views" && e.user_id == "bob" && e.entity_id == id)
    );
}

#[tokio::test]
async fn comments_paginate_newest_first() {
    let (service, _) = setup();
    let id = create(&service, "alice", "chatty", false).await;

    for i in 0..15 {
        service
            .comment_post(id, "bob", format!("comment {i}"))
            .await
            .unwrap();
    }

    let page_one = service
        .list_comments(ListComments {
            post_id: id,
            page: 1,
            page_size: 10,
            requester_id: "carol".into(),
        })
        .await
        .unwrap();
    assert_eq!(page_one.items.len(), 10);
    assert_eq!(page_one.total_count, 15);
    assert_eq!(page_one.total_pages, 2);
    assert_eq!(page_one.items[0].content, "comment 14");

    let page_two = service
        .list_comments(ListComments {
            post_id: id,
            page: 2,
            page_size: 10,
            requester_id: "carol".into(),
        })
        .await
        .unwrap();
    assert_eq!(page_two.items.len(), 5);
    assert_eq!(page_two.items[4].content, "comment 0");
}

#[tokio::test]
async fn comment_event_carries_comment_data() {
    let (service, events) = setup();
    let id = create(&service, "alice", "discuss", false).await;

    let comment = service
        .comment_post(id, "bob", "nice post".into())
        .await
        .unwrap();

    let published = events.published();
    let (topic, event) = published.last().unwrap();
    assert_eq!(topic, "post_comments");
    assert_eq!(event.event_type, EventType::PostCommented);
    let data = event.data.as_ref().unwrap();
    assert_eq!(data["comment_id"], comment.id.to_string());
    assert_eq!(data["content"], "nice post");
}

#[tokio::test]
async fn list_comments_on_private_post_is_denied() {
    let (service, _) = setup();
    let id = create(&service, "alice", "secret", true).await;

    let err = service
        .list_comments(ListComments {
            post_id: id,
            page: 1,
            page_size: 10,
            requester_id: "bob".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::PermissionDenied(_)));
}

#[tokio::test]
async fn tag_filter_without_match_returns_empty_page() {
    let (service, _) = setup();
    service
        .create_post(CreatePost {
            title: "tagged".into(),
            creator_id: "alice".into(),
            tags: tags(&["rust"]),
            ..Default::default()
        })
        .await
        .unwrap();

    let page = service
        .list_posts(ListPosts {
            tags: tags(&["tagX"]),
            ..list("bob")
        })
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_count, 0);
    assert_eq!(page.total_pages, 0);
}

#[tokio::test]
async fn tag_filter_matches_any_tag_once() {
    let (service, _) = setup();
    service
        .create_post(CreatePost {
            title: "both".into(),
            creator_id: "alice".into(),
            tags: tags(&["rust", "web"]),
            ..Default::default()
        })
        .await
        .unwrap();
    service
        .create_post(CreatePost {
            title: "web only".into(),
            creator_id: "alice".into(),
            tags: tags(&["web"]),
            ..Default::default()
        })
        .await
        .unwrap();
    create(&service, "alice", "untagged", false).await;

    let page = service
        .list_posts(ListPosts {
            tags: tags(&["rust", "web"]),
            ..list("bob")
        })
        .await
        .unwrap();
    assert_eq!(page.total_count, 2);
    let titles: Vec<_> = page.items.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["web only", "both"]);
}

#[tokio::test]
async fn private_posts_are_listed_only_for_their_creator() {
    let (service, _) = setup();
    let id = create(&service, "alice", "diary", true).await;

    let own = service
        .list_posts(ListPosts {
            creator_id: Some("alice".into()),
            ..list("alice")
        })
        .await
        .unwrap();
    assert!(own.items.iter().any(|p| p.id == id));

    let other = service
        .list_posts(ListPosts {
            creator_id: Some("alice".into()),
            ..list("bob")
        })
        .await
        .unwrap();
    assert!(other.items.iter().all(|p| p.id != id));
    assert_eq!(other.total_count, 0);
}

#[tokio::test]
async fn invalid_pagination_is_rejected() {
    let (service, _) = setup();

    for (page, page_size) in [(-1, 10), (1, -5), (0, 10), (1, 0)] {
        let err = service
            .list_posts(ListPosts {
                page,
                page_size,
                ..list("bob")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    let id = create(&service, "alice", "post", false).await;
    let err = service
        .list_comments(ListComments {
            post_id: id,
            page: -1,
            page_size: 10,
            requester_id: "bob".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidArgument(_)));
}

#[tokio::test]
async fn publish_failures_do_not_fail_the_request() {
    let service = service_with(Arc::new(FailingPublisher));
    let id = create(&service, "alice", "resilient", false).await;

    let liked = service.like_post(id, "bob").await.unwrap();
    assert!(liked.liked);
    let viewed = service.view_post(id, "bob").await.unwrap();
    assert!(viewed.first_view);
    service
        .comment_post(id, "bob", "still works".into())
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_like_toggles_by_one_liker_cancel_out() {
    let store = Arc::new(InMemoryStore::new());
    let service = PostService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(RecordingPublisher::default()),
    );
    let id = create(&service, "alice", "contested", false).await;

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..2 {
        let service = service.clone();
        tasks.spawn(async move { service.like_post(id, "bob").await.unwrap().liked });
    }
    let mut outcomes = tasks.join_all().await;
    outcomes.sort();

    assert_eq!(outcomes, vec![false, true]);
    assert_eq!(store.count_likes(id).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_views_store_one_row() {
    let store = Arc::new(InMemoryStore::new());
    let events = Arc::new(RecordingPublisher::default());
    let service = PostService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        events.clone(),
    );
    let id = create(&service, "alice", "trending", false).await;

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let service = service.clone();
        tasks.spawn(async move { service.view_post(id, "bob").await.unwrap().first_view });
    }
    let firsts = tasks.join_all().await.into_iter().filter(|f| *f).count();

    assert_eq!(firsts, 1);
    assert_eq!(store.count_views(id).await.unwrap(), 1);
    assert_eq!(events.count(EventType::PostViewed), 8);
}
