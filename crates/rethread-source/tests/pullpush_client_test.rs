use futures::StreamExt;
use mockito::Matcher;
use rethread_source::{ItemSource, PullPushClient, PullPushConfig, SourceError, SourceScope};
use serde_json::json;
use std::time::Duration;

fn client_for(server: &mockito::ServerGuard, batch_size: u32, max_retries: u32) -> PullPushClient {
    let config = PullPushConfig::new()
        .with_base_url(server.url())
        .with_batch_size(batch_size)
        .with_rate_limit(Duration::ZERO)
        .with_retries(max_retries, Duration::ZERO);
    PullPushClient::new(config).unwrap()
}

fn comment(id: &str, ts: i64, parent: &str) -> serde_json::Value {
    json!({
        "id": id,
        "author": "alice",
        "created_utc": ts,
        "link_id": "t3_abc123",
        "parent_id": parent,
        "body": format!("comment {}", id),
    })
}

#[tokio::test]
async fn test_thread_listing_paginates_and_skips_boundary_duplicates() {
    let mut server = mockito::Server::new_async().await;

    let page1 = server
        .mock("GET", "/comment/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("link_id".into(), "abc123".into()),
            Matcher::UrlEncoded("sort".into(), "asc".into()),
            Matcher::UrlEncoded("after".into(), "99".into()),
        ]))
        .with_status(200)
        .with_body(json!({ "data": [comment("r1", 100, "t3_abc123"), comment("r2", 105, "t1_r1")] }).to_string())
        .expect(1)
        .create_async()
        .await;
    let page2 = server
        .mock("GET", "/comment/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("link_id".into(), "abc123".into()),
            Matcher::UrlEncoded("after".into(), "104".into()),
        ]))
        .with_status(200)
        .with_body(json!({ "data": [comment("r2", 105, "t1_r1"), comment("r3", 110, "t1_r2")] }).to_string())
        .expect(1)
        .create_async()
        .await;
    let page3 = server
        .mock("GET", "/comment/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("link_id".into(), "abc123".into()),
            Matcher::UrlEncoded("after".into(), "109".into()),
        ]))
        .with_status(200)
        .with_body(json!({ "data": [comment("r3", 110, "t1_r2")] }).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, 2, 0);
    let items: Vec<_> = client
        .list_items(SourceScope::ThreadReplies("abc123".into()), Some(100))
        .await
        .unwrap()
        .collect()
        .await;

    let ids: Vec<String> = items.into_iter().map(|item| item.unwrap().id().to_string()).collect();
    assert_eq!(ids, vec!["r1", "r2", "r3"]);

    page1.assert_async().await;
    page2.assert_async().await;
    page3.assert_async().await;
}

#[tokio::test]
async fn test_full_page_stuck_on_one_second_is_an_error() {
    let mut server = mockito::Server::new_async().await;

    // Upstream holds more replies at ts 100 than fit on one page
    let stuck = server
        .mock("GET", "/comment/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({ "data": [comment("r1", 100, "t3_abc123"), comment("r2", 100, "t3_abc123")] }).to_string())
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server, 2, 0);
    let items: Vec<_> = client
        .list_items(SourceScope::ThreadReplies("abc123".into()), None)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].as_ref().unwrap().id(), "r1");
    assert_eq!(items[1].as_ref().unwrap().id(), "r2");
    assert!(matches!(items[2], Err(SourceError::Unavailable(_))));

    stuck.assert_async().await;
}

#[tokio::test]
async fn test_author_posts_use_submission_endpoint() {
    let mut server = mockito::Server::new_async().await;

    let posts = server
        .mock("GET", "/submission/")
        .match_query(Matcher::UrlEncoded("author".into(), "alice".into()))
        .with_status(200)
        .with_body(json!({ "data": [] }).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, 100, 0);
    let items: Vec<_> = client
        .list_items(SourceScope::AuthorPosts("alice".into()), None)
        .await
        .unwrap()
        .collect()
        .await;

    assert!(items.is_empty());
    posts.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_are_retried_then_reported() {
    let mut server = mockito::Server::new_async().await;

    let failing = server
        .mock("GET", "/comment/")
        .match_query(Matcher::Any)
        .with_status(500)
        .expect(3)
        .create_async()
        .await;

    let client = client_for(&server, 100, 2);
    let items: Vec<_> = client
        .list_items(SourceScope::AuthorReplies("alice".into()), None)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(SourceError::Unavailable(_))));
    failing.assert_async().await;
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mut server = mockito::Server::new_async().await;

    let not_found = server
        .mock("GET", "/comment/")
        .match_query(Matcher::Any)
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, 100, 3);
    let mut stream = client
        .list_items(SourceScope::ThreadReplies("gone".into()), None)
        .await
        .unwrap();

    assert!(matches!(stream.next().await, Some(Err(SourceError::Unavailable(_)))));
    assert!(stream.next().await.is_none());
    not_found.assert_async().await;
}

#[tokio::test]
async fn test_fetch_post_by_id() {
    let mut server = mockito::Server::new_async().await;

    let _found = server
        .mock("GET", "/submission/")
        .match_query(Matcher::UrlEncoded("ids".into(), "abc123".into()))
        .with_status(200)
        .with_body(
            json!({ "data": [{
                "id": "abc123",
                "author": "op",
                "created_utc": 1700000000,
                "title": "Original post",
                "selftext": "body text",
            }] })
            .to_string(),
        )
        .create_async()
        .await;
    let _missing = server
        .mock("GET", "/submission/")
        .match_query(Matcher::UrlEncoded("ids".into(), "nope".into()))
        .with_status(200)
        .with_body(json!({ "data": [] }).to_string())
        .create_async()
        .await;

    let client = client_for(&server, 100, 0);

    let post = client.fetch_post("abc123").await.unwrap().unwrap();
    assert_eq!(post.author, "op");
    assert_eq!(post.title(), Some("Original post"));
    assert_eq!(post.body(), Some("body text"));

    assert!(client.fetch_post("nope").await.unwrap().is_none());
}
