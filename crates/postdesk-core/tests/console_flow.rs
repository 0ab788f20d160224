//! End-to-end flows through `AdminConsole` against a mock API server.

use std::path::Path;

use httpmock::MockServer;
use postdesk_core::api::ErrorKind;
use postdesk_core::auth::{MOCK_EMAIL, MOCK_PASSWORD};
use postdesk_core::cache::CacheKey;
use postdesk_core::models::{AuthorUpdate, BlogFilter, NewAuthor, NewCategory, ResourceId};
use postdesk_core::{AdminConsole, Config};
use serde_json::json;

const BEARER: &str = "Bearer mock-jwt-token";

fn console(server: &MockServer, dir: &Path) -> AdminConsole {
    let config = Config {
        api_base_url: server.base_url(),
        data_dir: Some(dir.to_path_buf()),
        ..Config::default()
    };
    AdminConsole::new(config).expect("console")
}

#[tokio::test]
async fn login_persists_across_restarts() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().expect("tempdir");

    let first = console(&server, dir.path());
    assert!(!first.login(MOCK_EMAIL, "letmein").await.expect("login call"));
    assert!(!first.is_authenticated());

    assert!(first.login(MOCK_EMAIL, MOCK_PASSWORD).await.expect("login call"));

    let second = console(&server, dir.path());
    assert!(second.is_authenticated());
    assert_eq!(second.current_user().map(|u| u.email), Some(MOCK_EMAIL.to_string()));
}

#[tokio::test]
async fn empty_category_title_never_reaches_the_server() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method("POST").path("/categories");
            then.status(201).json_body(json!({"id": 1, "title": ""}));
        })
        .await;
    let dir = tempfile::tempdir().expect("tempdir");
    let console = console(&server, dir.path());
    console.login(MOCK_EMAIL, MOCK_PASSWORD).await.expect("login");

    let err = console
        .create_category(NewCategory::new(""))
        .await
        .expect_err("blank title");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(mock.calls_async().await, 0);
}

#[tokio::test]
async fn unauthorized_response_clears_session_and_cache() {
    let server = MockServer::start_async().await;
    let authed_categories = server
        .mock_async(|when, then| {
            when.method("GET").path("/categories").header("authorization", BEARER);
            then.status(200).json_body(json!([{"id": 1, "title": "Rust"}]));
        })
        .await;
    let anonymous_categories = server
        .mock_async(|when, then| {
            when.method("GET").path("/categories").header_missing("authorization");
            then.status(200).json_body(json!([]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/authors");
            then.status(401);
        })
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let console = console(&server, dir.path());
    console.login(MOCK_EMAIL, MOCK_PASSWORD).await.expect("login");

    let categories = console.categories().await.expect("categories");
    assert_eq!(categories.len(), 1);
    assert!(console.cache().contains(&CacheKey::categories()));

    let err = console.authors().await.expect_err("401");
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(!console.is_authenticated());
    assert!(console.cache().is_empty());

    // The next read goes back to the server, now without a credential
    let categories = console.categories().await.expect("categories");
    assert!(categories.is_empty());
    authed_categories.assert_async().await;
    anonymous_categories.assert_async().await;
}

#[tokio::test]
async fn author_update_drops_author_and_blog_lists() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/posts");
            then.status(200).json_body(json!([
                {"id": 1, "title": "One", "author": {"id": "a1", "name": "Ada"}}
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/authors");
            then.status(200).json_body(json!([{"id": "a1", "name": "Ada"}]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/categories");
            then.status(200).json_body(json!([]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method("PATCH").path("/authors/a1");
            then.status(200).json_body(json!({"id": "a1", "name": "Ada L."}));
        })
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let console = console(&server, dir.path());
    console.login(MOCK_EMAIL, MOCK_PASSWORD).await.expect("login");

    let all = BlogFilter::default();
    console.blogs(&all).await.expect("blogs");
    console.authors().await.expect("authors");
    console.categories().await.expect("categories");
    assert_eq!(console.cache().len(), 3);

    let updated = console
        .update_author(AuthorUpdate {
            id: ResourceId::from("a1"),
            fields: NewAuthor {
                name: "Ada L.".into(),
                ..Default::default()
            },
        })
        .await
        .expect("update");
    assert_eq!(updated.name, "Ada L.");

    assert!(!console.cache().contains(&CacheKey::blogs(&all)));
    assert!(!console.cache().contains(&CacheKey::authors()));
    assert!(console.cache().contains(&CacheKey::categories()));
}

#[tokio::test]
async fn failed_write_keeps_cached_lists() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method("GET").path("/categories");
            then.status(200).json_body(json!([{"id": 1, "title": "Rust"}]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method("DELETE").path("/categories/1");
            then.status(500).body("database unavailable");
        })
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let console = console(&server, dir.path());
    console.login(MOCK_EMAIL, MOCK_PASSWORD).await.expect("login");

    console.categories().await.expect("categories");
    let err = console
        .delete_category(&ResourceId::from("1"))
        .await
        .expect_err("500");
    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.context(), "Failed to delete category");

    // Served from cache: still exactly one list request
    console.categories().await.expect("categories");
    assert_eq!(list.calls_async().await, 1);
}
