use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use eclipse_api::AppStateInner;
use eclipse_db::Database;
use eclipse_media::MediaStore;

const MEDIA_BASE_URL: &str = "https://cdn.example/bucket";

async fn app() -> Router {
    let db = Database::open_in_memory().expect("open db");
    let media_dir: PathBuf =
        std::env::temp_dir().join(format!("eclipse-api-test-{}", Uuid::new_v4()));
    let media = MediaStore::new(media_dir, MEDIA_BASE_URL.to_string())
        .await
        .expect("media store");
    eclipse_api::router(Arc::new(AppStateInner { db, media }))
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn register(app: &Router, name: &str, email: &str, password: &str) -> Value {
    let (status, body) = post(
        app,
        "/auth",
        json!({"action": "register", "name": name, "email": email, "password": password}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["user"].clone()
}

#[tokio::test]
async fn register_issues_handle_and_token() {
    let app = app().await;
    let user = register(&app, "Ada Lovelace", "ada@example.com", "pw123456").await;

    let handle = user["handle"].as_str().unwrap();
    assert!(handle.starts_with("@adalovelace"));
    assert_eq!(user["token"].as_str().unwrap().len(), 64);
    assert!(user["id"].as_str().unwrap().parse::<Uuid>().is_ok());
}

#[tokio::test]
async fn duplicate_email_registration_is_rejected() {
    let app = app().await;
    register(&app, "Ada", "ada@example.com", "pw123456").await;

    let (status, body) = post(
        &app,
        "/auth",
        json!({"action": "register", "name": "Ada Again", "email": "ada@example.com", "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already taken");
}

#[tokio::test]
async fn login_requires_the_exact_password() {
    let app = app().await;
    register(&app, "Ada", "ada@example.com", "pw123456").await;

    let (status, _) = post(
        &app,
        "/auth",
        json!({"action": "login", "email": "ada@example.com", "password": "pw123456"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Wrong case is a different byte string, so a different hash.
    let (status, body) = post(
        &app,
        "/auth",
        json!({"action": "login", "email": "ada@example.com", "password": "PW123456"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unknown_actions_are_bad_requests() {
    let app = app().await;
    for uri in ["/auth", "/profile", "/posts", "/messages"] {
        let (status, body) = post(&app, uri, json!({"action": "explode"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri {uri}");
        assert_eq!(body["error"], "Unknown action");
    }

    let (status, _) = get(&app, "/posts?action=explode").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_fields_are_validation_errors() {
    let app = app().await;
    let (status, body) = post(&app, "/auth", json!({"action": "register", "name": "x"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn repeated_hashtags_in_one_post_count_once() {
    let app = app().await;
    let user = register(&app, "Ada", "ada@example.com", "pw").await;
    let user_id = user["id"].as_str().unwrap();

    let (status, _) = post(
        &app,
        "/posts",
        json!({"action": "create", "user_id": user_id, "text": "hello #Foo #foo #bar"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/posts?action=trending").await;
    assert_eq!(status, StatusCode::OK);
    let tags = body["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 2);
    for tag in tags {
        assert_eq!(tag["count"], 1);
    }

    let (status, body) = get(&app, &format!("/posts?action=hashtag&tag=%23Foo&user_id={user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tag"], "foo");
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn feed_includes_comments_and_like_state() {
    let app = app().await;
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;
    let bob = register(&app, "Bob", "bob@example.com", "pw").await;
    let ada_id = ada["id"].as_str().unwrap();
    let bob_id = bob["id"].as_str().unwrap();

    let (_, created) = post(
        &app,
        "/posts",
        json!({"action": "create", "user_id": ada_id, "text": "hello world"}),
    )
    .await;
    let post_id = created["id"].as_str().unwrap();

    let (status, like) = post(
        &app,
        "/posts",
        json!({"action": "like", "user_id": bob_id, "post_id": post_id}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(like, json!({"liked": true, "likes": 1}));

    let (_, comment) = post(
        &app,
        "/posts",
        json!({"action": "comment", "user_id": bob_id, "post_id": post_id, "text": "nice"}),
    )
    .await;
    assert_eq!(comment["comment"]["text"], "nice");

    let (status, feed) = get(&app, &format!("/posts?action=feed&user_id={bob_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let posts = feed["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["liked"], true);
    assert_eq!(posts[0]["likes"], 1);
    assert_eq!(posts[0]["time"], "just now");
    assert_eq!(posts[0]["initials"], "A");
    assert_eq!(posts[0]["comments"].as_array().unwrap().len(), 1);

    // Ada has not liked her own post.
    let (_, feed) = get(&app, &format!("/posts?action=feed&user_id={ada_id}")).await;
    assert_eq!(feed["posts"][0]["liked"], false);
}

#[tokio::test]
async fn deleting_someone_elses_post_is_forbidden() {
    let app = app().await;
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;
    let bob = register(&app, "Bob", "bob@example.com", "pw").await;
    let ada_id = ada["id"].as_str().unwrap();
    let bob_id = bob["id"].as_str().unwrap();

    let (_, created) = post(
        &app,
        "/posts",
        json!({"action": "create", "user_id": ada_id, "text": "mine"}),
    )
    .await;
    let post_id = created["id"].as_str().unwrap();

    let (status, _) = post(
        &app,
        "/posts",
        json!({"action": "delete", "user_id": bob_id, "post_id": post_id}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, feed) = get(&app, &format!("/posts?action=feed&user_id={ada_id}")).await;
    assert_eq!(feed["posts"][0]["text"], "mine");
}

#[tokio::test]
async fn post_media_is_uploaded_and_linked() {
    let app = app().await;
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;
    let ada_id = ada["id"].as_str().unwrap();

    let (status, created) = post(
        &app,
        "/posts",
        json!({
            "action": "create",
            "user_id": ada_id,
            "text": "look at this",
            "media_data": B64.encode(b"fake-jpeg-bytes"),
            "media_type": "image/jpeg",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let url = created["media_url"].as_str().unwrap();
    assert!(url.starts_with(&format!("{MEDIA_BASE_URL}/posts/{ada_id}/")));
    assert!(url.ends_with(".jpg"));

    let (_, feed) = get(&app, &format!("/posts?action=feed&user_id={ada_id}")).await;
    assert_eq!(feed["posts"][0]["media_type"], "image");
    assert_eq!(feed["posts"][0]["media_url"], url);
}

#[tokio::test]
async fn chat_pair_resolves_to_one_chat_via_api() {
    let app = app().await;
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;
    let bob = register(&app, "Bob", "bob@example.com", "pw").await;
    let ada_id = ada["id"].as_str().unwrap();
    let bob_id = bob["id"].as_str().unwrap();

    let (_, first) = post(
        &app,
        "/messages",
        json!({"action": "get_or_create_chat", "user_id": ada_id, "partner_id": bob_id}),
    )
    .await;
    let (_, second) = post(
        &app,
        "/messages",
        json!({"action": "get_or_create_chat", "user_id": bob_id, "partner_id": ada_id}),
    )
    .await;
    assert_eq!(first["chat_id"], second["chat_id"]);
}

#[tokio::test]
async fn direct_messaging_flow() {
    let app = app().await;
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;
    let bob = register(&app, "Bob", "bob@example.com", "pw").await;
    let ada_id = ada["id"].as_str().unwrap();
    let bob_id = bob["id"].as_str().unwrap();

    let (_, chat) = post(
        &app,
        "/messages",
        json!({"action": "get_or_create_chat", "user_id": ada_id, "partner_id": bob_id}),
    )
    .await;
    let chat_id = chat["chat_id"].as_str().unwrap();

    let (status, sent) = post(
        &app,
        "/messages",
        json!({"action": "send", "chat_id": chat_id, "sender_id": ada_id, "text": "hello bob"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(sent["id"].as_str().is_some());

    // Bob sees one unread chat with a preview.
    let (_, list) = get(&app, &format!("/messages?action=list&user_id={bob_id}")).await;
    let chats = list["chats"].as_array().unwrap();
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0]["last_msg"], "hello bob");
    assert_eq!(chats[0]["unread"], 1);
    assert_eq!(chats[0]["is_mine"], false);

    // Bob gets a message notification and an unread message count.
    let (_, notifs) = get(&app, &format!("/messages?action=notifications&user_id={bob_id}")).await;
    assert_eq!(notifs["unread_msg_count"], 1);
    assert_eq!(notifs["notifications"][0]["type"], "message");
    assert_eq!(notifs["notifications"][0]["message"], "hello bob");

    // Reading history marks the partner's messages read.
    let (_, history) = get(
        &app,
        &format!("/messages?action=history&chat_id={chat_id}&user_id={bob_id}"),
    )
    .await;
    assert_eq!(history["messages"].as_array().unwrap().len(), 1);
    assert_eq!(history["messages"][0]["from_me"], false);

    let (_, list) = get(&app, &format!("/messages?action=list&user_id={bob_id}")).await;
    assert_eq!(list["chats"][0]["unread"], 0);
}

#[tokio::test]
async fn group_messaging_flow() {
    let app = app().await;
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;
    let bob = register(&app, "Bob", "bob@example.com", "pw").await;
    let ada_id = ada["id"].as_str().unwrap();
    let bob_id = bob["id"].as_str().unwrap();

    let (status, group) = post(
        &app,
        "/messages",
        json!({"action": "create_group", "creator_id": ada_id, "name": "team", "member_ids": [bob_id, bob_id]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let group_id = group["group_id"].as_str().unwrap();

    post(
        &app,
        "/messages",
        json!({"action": "send_group", "group_id": group_id, "sender_id": ada_id, "text": "welcome"}),
    )
    .await;

    let (_, list) = get(&app, &format!("/messages?action=list&user_id={bob_id}")).await;
    let groups = list["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["member_count"], 2);
    assert_eq!(groups[0]["last_msg"], "welcome");

    let (_, history) = get(
        &app,
        &format!("/messages?action=group_history&group_id={group_id}&user_id={bob_id}"),
    )
    .await;
    assert_eq!(history["messages"][0]["sender_name"], "Ada");
    assert_eq!(history["messages"][0]["from_me"], false);
}

#[tokio::test]
async fn search_and_profile_flow() {
    let app = app().await;
    let ada = register(&app, "Ann Hathaway", "ann@example.com", "pw").await;
    register(&app, "Bob", "bob@example.com", "pw").await;
    let ada_id = ada["id"].as_str().unwrap();

    let (_, results) = get(&app, "/search?q=ann").await;
    assert_eq!(results["users"].as_array().unwrap().len(), 1);
    let (_, results) = get(&app, "/search").await;
    assert_eq!(results["users"].as_array().unwrap().len(), 2);

    let (status, profile) = post(
        &app,
        "/profile",
        json!({"action": "update", "user_id": ada_id, "bio": "mathematician", "handle": "@annh"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["user"]["bio"], "mathematician");
    assert_eq!(profile["user"]["handle"], "@annh");

    let (status, body) = post(
        &app,
        "/profile",
        json!({"action": "update", "user_id": ada_id}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Nothing to update");

    let (status, _) = post(
        &app,
        "/profile",
        json!({"action": "get", "user_id": Uuid::new_v4()}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post(
        &app,
        "/profile",
        json!({"action": "change_password", "user_id": ada_id, "old_password": "wrong", "new_password": "next"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn follow_toggle_and_wallpapers() {
    let app = app().await;
    let ada = register(&app, "Ada", "ada@example.com", "pw").await;
    let bob = register(&app, "Bob", "bob@example.com", "pw").await;
    let ada_id = ada["id"].as_str().unwrap();
    let bob_id = bob["id"].as_str().unwrap();

    let (_, follow) = post(
        &app,
        "/messages",
        json!({"action": "toggle_follow", "follower_id": ada_id, "following_id": bob_id}),
    )
    .await;
    assert_eq!(follow, json!({"followed": true, "followers_count": 1}));

    let (_, counts) = get(
        &app,
        &format!("/messages?action=counts&user_id={ada_id}&target_id={bob_id}"),
    )
    .await;
    assert_eq!(counts["followers_count"], 1);
    assert_eq!(counts["is_following"], true);

    let (_, follow) = post(
        &app,
        "/messages",
        json!({"action": "toggle_follow", "follower_id": ada_id, "following_id": bob_id}),
    )
    .await;
    assert_eq!(follow, json!({"followed": false, "followers_count": 0}));

    // Wallpapers default to the sentinel and upsert per (user, chat key).
    let (_, wallpaper) = post(
        &app,
        "/messages",
        json!({"action": "get_wallpaper", "user_id": ada_id, "chat_key": "chat-1"}),
    )
    .await;
    assert_eq!(wallpaper["wallpaper"], "none");

    post(
        &app,
        "/messages",
        json!({"action": "save_wallpaper", "user_id": ada_id, "chat_key": "chat-1", "wallpaper": "stars"}),
    )
    .await;
    let (_, wallpaper) = post(
        &app,
        "/messages",
        json!({"action": "get_wallpaper", "user_id": ada_id, "chat_key": "chat-1"}),
    )
    .await;
    assert_eq!(wallpaper["wallpaper"], "stars");
}
