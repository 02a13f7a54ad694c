use std::sync::Arc;

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseBackend, DbConn, MockDatabase};
use tempfile::TempDir;
use uuid::Uuid;

use agora_core::domain::{Comment, LikeToggle, Pagination, Post, Visibility};
use agora_core::error::RepoError;
use agora_core::ports::{
    CommentRepository, LikeRepository, PostQuery, PostRepository, ViewRepository,
};

use super::entity::{post, post_tag, tag};
use super::{
    PostgresCommentRepository, PostgresLikeRepository, PostgresPostRepository,
    PostgresViewRepository,
};

/// A private in-memory SQLite database with the real schema applied.
/// One connection so every query sees the same database.
async fn sqlite() -> Arc<DbConn> {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await.expect("open sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    Arc::new(db)
}

/// A file-backed SQLite database shared by several pooled connections, so
/// concurrent calls really race on the unique indexes.
async fn sqlite_pool() -> (Arc<DbConn>, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("agora.db").display());
    let mut opts = ConnectOptions::new(url);
    opts.max_connections(4).sqlx_logging(false);
    let db = Database::connect(opts).await.expect("open sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    (Arc::new(db), dir)
}

fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn query(requester: &str) -> PostQuery {
    PostQuery {
        pagination: Pagination::new(1, 10).unwrap(),
        creator_id: None,
        tags: Vec::new(),
        include_private: false,
        requester_id: requester.to_string(),
    }
}

#[tokio::test]
async fn find_post_hydrates_tags_in_position_order() {
    let post_id = Uuid::new_v4();
    let rust = Uuid::new_v4();
    let web = Uuid::new_v4();
    let now = Utc::now();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post::Model {
            id: post_id,
            title: "Test Post".to_owned(),
            description: Some("Content".to_owned()),
            creator_id: "alice".to_owned(),
            is_private: false,
            created_at: now.into(),
            updated_at: now.into(),
        }]])
        .append_query_results([vec![
            post_tag::Model {
                post_id,
                tag_id: web,
                position: 0,
            },
            post_tag::Model {
                post_id,
                tag_id: rust,
                position: 1,
            },
        ]])
        .append_query_results([vec![
            tag::Model {
                id: rust,
                name: "rust".to_owned(),
            },
            tag::Model {
                id: web,
                name: "web".to_owned(),
            },
        ]])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));
    let post = repo.find_post(post_id).await.unwrap().expect("post exists");

    assert_eq!(post.id, post_id);
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.visibility, Visibility::Public);
    assert_eq!(post.tag_names(), vec!["web", "rust"]);
}

#[tokio::test]
async fn find_post_returns_none_when_absent() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));
    assert!(repo.find_post(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn create_then_find_keeps_tag_order() {
    let repo = PostgresPostRepository::new(sqlite().await);

    let post = Post::new(
        "alice".into(),
        "Hello".into(),
        Some("first post".into()),
        Visibility::Public,
    );
    let created = repo
        .create_post(post, &tags(&["rust", "async", "web"]))
        .await
        .unwrap();
    assert_eq!(created.tag_names(), vec!["rust", "async", "web"]);

    let found = repo.find_post(created.id).await.unwrap().unwrap();
    assert_eq!(found.title, "Hello");
    assert_eq!(found.description.as_deref(), Some("first post"));
    assert_eq!(found.tag_names(), vec!["rust", "async", "web"]);
}

#[tokio::test]
async fn tags_are_shared_between_posts() {
    let repo = PostgresPostRepository::new(sqlite().await);

    let a = repo
        .create_post(
            Post::new("alice".into(), "A".into(), None, Visibility::Public),
            &tags(&["rust"]),
        )
        .await
        .unwrap();
    let b = repo
        .create_post(
            Post::new("bob".into(), "B".into(), None, Visibility::Public),
            &tags(&["rust", "db"]),
        )
        .await
        .unwrap();

    assert_eq!(a.tags[0].id, b.tags[0].id);
    assert_ne!(b.tags[0].id, b.tags[1].id);
}

#[tokio::test]
async fn update_replaces_tags_and_reports_missing_posts() {
    let repo = PostgresPostRepository::new(sqlite().await);

    let created = repo
        .create_post(
            Post::new("alice".into(), "Draft".into(), None, Visibility::Public),
            &tags(&["a", "b"]),
        )
        .await
        .unwrap();

    let mut changed = created.clone();
    changed.title = "Final".into();
    changed.visibility = Visibility::Private;
    let updated = repo.update_post(changed, &tags(&["c"])).await.unwrap();
    assert_eq!(updated.tag_names(), vec!["c"]);

    let found = repo.find_post(created.id).await.unwrap().unwrap();
    assert_eq!(found.title, "Final");
    assert!(found.is_private());
    assert_eq!(found.tag_names(), vec!["c"]);

    let ghost = Post::new("alice".into(), "Ghost".into(), None, Visibility::Public);
    let err = repo.update_post(ghost, &[]).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound));
}

#[tokio::test]
async fn list_applies_visibility_creator_and_tag_filters() {
    let repo = PostgresPostRepository::new(sqlite().await);

    repo.create_post(
        Post::new("alice".into(), "public rust".into(), None, Visibility::Public),
        &tags(&["rust", "web"]),
    )
    .await
    .unwrap();
    repo.create_post(
        Post::new("alice".into(), "private".into(), None, Visibility::Private),
        &tags(&["rust"]),
    )
    .await
    .unwrap();
    repo.create_post(
        Post::new("bob".into(), "bob's".into(), None, Visibility::Public),
        &tags(&["go"]),
    )
    .await
    .unwrap();

    let (posts, total) = repo.list_posts(&query("carol")).await.unwrap();
    assert_eq!(total, 2);
    assert!(posts.iter().all(|p| !p.is_private()));

    let (_, total) = repo.list_posts(&query("alice")).await.unwrap();
    assert_eq!(total, 3);

    let by_tag = PostQuery {
        tags: tags(&["rust", "web"]),
        ..query("carol")
    };
    let (posts, total) = repo.list_posts(&by_tag).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(posts[0].title, "public rust");

    let own = PostQuery {
        creator_id: Some("alice".into()),
        include_private: true,
        ..query("alice")
    };
    let (_, total) = repo.list_posts(&own).await.unwrap();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn list_counts_before_paginating() {
    let repo = PostgresPostRepository::new(sqlite().await);
    for i in 0..5 {
        repo.create_post(
            Post::new("alice".into(), format!("post {i}"), None, Visibility::Public),
            &[],
        )
        .await
        .unwrap();
    }

    let page = PostQuery {
        pagination: Pagination::new(3, 2).unwrap(),
        ..query("bob")
    };
    let (posts, total) = repo.list_posts(&page).await.unwrap();
    assert_eq!(total, 5);
    assert_eq!(posts.len(), 1);
}

#[tokio::test]
async fn delete_removes_post_and_interactions() {
    let db = sqlite().await;
    let posts = PostgresPostRepository::new(db.clone());
    let comments = PostgresCommentRepository::new(db.clone());
    let likes = PostgresLikeRepository::new(db.clone());
    let views = PostgresViewRepository::new(db);

    let post = posts
        .create_post(
            Post::new("alice".into(), "Doomed".into(), None, Visibility::Public),
            &tags(&["x"]),
        )
        .await
        .unwrap();
    comments
        .create_comment(Comment::new(post.id, "bob".into(), "hi".into()))
        .await
        .unwrap();
    likes.toggle_like(post.id, "bob").await.unwrap();
    views.record_view(post.id, "bob").await.unwrap();

    posts.delete_post(post.id).await.unwrap();

    assert!(posts.find_post(post.id).await.unwrap().is_none());
    let (_, total) = comments
        .list_comments(post.id, Pagination::new(1, 10).unwrap())
        .await
        .unwrap();
    assert_eq!(total, 0);
    assert_eq!(likes.count_likes(post.id).await.unwrap(), 0);
    assert_eq!(views.count_views(post.id).await.unwrap(), 0);

    let again = posts.delete_post(post.id).await.unwrap_err();
    assert!(matches!(again, RepoError::NotFound));
}

#[tokio::test]
async fn like_toggles_per_liker() {
    let db = sqlite().await;
    let posts = PostgresPostRepository::new(db.clone());
    let likes = PostgresLikeRepository::new(db);

    let post = posts
        .create_post(
            Post::new("alice".into(), "Likeable".into(), None, Visibility::Public),
            &[],
        )
        .await
        .unwrap();

    assert_eq!(
        likes.toggle_like(post.id, "bob").await.unwrap(),
        LikeToggle::Added
    );
    assert_eq!(
        likes.toggle_like(post.id, "carol").await.unwrap(),
        LikeToggle::Added
    );
    assert_eq!(likes.count_likes(post.id).await.unwrap(), 2);

    assert_eq!(
        likes.toggle_like(post.id, "bob").await.unwrap(),
        LikeToggle::Removed
    );
    assert_eq!(likes.count_likes(post.id).await.unwrap(), 1);

    let missing = likes.toggle_like(Uuid::new_v4(), "bob").await.unwrap_err();
    assert!(matches!(missing, RepoError::NotFound));
}

#[tokio::test]
async fn view_is_recorded_once_per_viewer() {
    let db = sqlite().await;
    let posts = PostgresPostRepository::new(db.clone());
    let views = PostgresViewRepository::new(db);

    let post = posts
        .create_post(
            Post::new("alice".into(), "Viewed".into(), None, Visibility::Public),
            &[],
        )
        .await
        .unwrap();

    assert!(views.record_view(post.id, "bob").await.unwrap());
    assert!(!views.record_view(post.id, "bob").await.unwrap());
    assert!(views.record_view(post.id, "carol").await.unwrap());
    assert_eq!(views.count_views(post.id).await.unwrap(), 2);
}

#[tokio::test]
async fn comments_page_with_total() {
    let db = sqlite().await;
    let posts = PostgresPostRepository::new(db.clone());
    let comments = PostgresCommentRepository::new(db);

    let post = posts
        .create_post(
            Post::new("alice".into(), "Chatty".into(), None, Visibility::Public),
            &[],
        )
        .await
        .unwrap();
    for i in 0..3 {
        comments
            .create_comment(Comment::new(post.id, "bob".into(), format!("c{i}")))
            .await
            .unwrap();
    }

    let (page, total) = comments
        .list_comments(post.id, Pagination::new(2, 2).unwrap())
        .await
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(page.len(), 1);
    assert!(page.iter().all(|c| c.post_id == post.id));
}

#[tokio::test]
async fn page_beyond_any_offset_is_empty() {
    let db = sqlite().await;
    let posts = PostgresPostRepository::new(db.clone());
    let comments = PostgresCommentRepository::new(db);

    let post = posts
        .create_post(
            Post::new("alice".into(), "Lonely".into(), None, Visibility::Public),
            &[],
        )
        .await
        .unwrap();
    comments
        .create_comment(Comment::new(post.id, "bob".into(), "hi".into()))
        .await
        .unwrap();

    let far = PostQuery {
        pagination: Pagination::new(i64::MAX, 10).unwrap(),
        ..query("bob")
    };
    let (page, total) = posts.list_posts(&far).await.unwrap();
    assert_eq!(total, 1);
    assert!(page.is_empty());

    let (page, total) = comments
        .list_comments(post.id, Pagination::new(i64::MAX, 10).unwrap())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert!(page.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_views_insert_one_row() {
    let (db, _dir) = sqlite_pool().await;
    let posts = PostgresPostRepository::new(db.clone());
    let views = Arc::new(PostgresViewRepository::new(db));

    let post = posts
        .create_post(
            Post::new("alice".into(), "Raced".into(), None, Visibility::Public),
            &[],
        )
        .await
        .unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..4 {
        let views = views.clone();
        let post_id = post.id;
        tasks.spawn(async move { views.record_view(post_id, "bob").await.unwrap() });
    }
    let firsts = tasks.join_all().await.into_iter().filter(|f| *f).count();

    assert_eq!(firsts, 1);
    assert_eq!(views.count_views(post.id).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_like_toggles_never_duplicate_a_row() {
    let (db, _dir) = sqlite_pool().await;
    let posts = PostgresPostRepository::new(db.clone());
    let likes = Arc::new(PostgresLikeRepository::new(db));

    let post = posts
        .create_post(
            Post::new("alice".into(), "Raced".into(), None, Visibility::Public),
            &[],
        )
        .await
        .unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..2 {
        let likes = likes.clone();
        let post_id = post.id;
        tasks.spawn(async move { likes.toggle_like(post_id, "bob").await });
    }
    // SQLite may refuse a contended writer outright. A refused toggle rolls
    // back and leaves no trace.
    let applied: Vec<LikeToggle> = tasks.join_all().await.into_iter().flatten().collect();
    assert!(!applied.is_empty());

    let added = applied.iter().filter(|t| **t == LikeToggle::Added).count() as u64;
    let removed = applied.len() as u64 - added;
    let count = likes.count_likes(post.id).await.unwrap();
    assert!(count <= 1);
    assert_eq!(count, added - removed);
}
