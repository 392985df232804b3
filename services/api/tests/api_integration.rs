//! End-to-end tests against a real PostgreSQL database
//!
//! These tests run the migrations and drive the full router. They are skipped
//! when `DATABASE_URL` is not set.

use api::{AppState, Settings, build_app};
use auth::{
    GoogleConfig, GoogleVerifier, JwtConfig, JwtService,
    models::{NewUser, User},
};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::database::{DatabaseConfig, init_pool, run_migrations};
use serde_json::{Value, json};
use serial_test::serial;
use tower::ServiceExt;
use uuid::Uuid;

struct TestContext {
    state: AppState,
    router: Router,
    uploads: tempfile::TempDir,
}

impl TestContext {
    async fn new() -> Option<Self> {
        if std::env::var("DATABASE_URL").is_err() {
            eprintln!("DATABASE_URL not set; skipping database tests");
            return None;
        }

        let pool = init_pool(&DatabaseConfig::from_env().unwrap()).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let uploads = tempfile::tempdir().unwrap();
        let settings = Settings {
            host: "127.0.0.1".to_string(),
            port: 3000,
            frontend_url: "http://localhost:5173".to_string(),
            public_url: Some("http://localhost:3000".to_string()),
            upload_dir: uploads.path().to_path_buf(),
            ffprobe_path: "ffprobe".into(),
            max_upload_bytes: 8 * 1024 * 1024,
        };
        let jwt_service = JwtService::new(JwtConfig {
            secret: "integration-secret".to_string(),
            token_expiry: 600,
        })
        .unwrap();
        let google = GoogleVerifier::new(GoogleConfig {
            client_id: None,
            tokeninfo_url: "http://127.0.0.1:9/tokeninfo".to_string(),
        });

        let state = AppState::new(pool, &settings, jwt_service, google);
        state.media.ensure_dirs().await.unwrap();
        let router = build_app(state.clone(), &settings.frontend_url).unwrap();

        Some(Self {
            state,
            router,
            uploads,
        })
    }

    async fn user(&self, name: &str) -> (User, String) {
        let user = self
            .state
            .users
            .create(&NewUser {
                email: format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4().simple()),
                name: name.to_string(),
                photo: "default_image.png".to_string(),
                password: Some("secret123".to_string()),
            })
            .await
            .unwrap();
        let token = self.state.jwt_service.generate_token(&user).unwrap();
        (user, token)
    }

    async fn video(&self, uploader: &User, title: &str, category: api::models::video::Category) -> Uuid {
        self.state
            .videos
            .create(&api::models::video::NewVideo {
                title: title.to_string(),
                description: "Integration test upload".to_string(),
                filename: format!("{}.mp4", Uuid::new_v4().simple()),
                thumbnail: None,
                category,
                uploader_id: uploader.id,
            })
            .await
            .unwrap()
            .id
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    request.body(Body::from(body.to_string())).unwrap()
}

fn multipart(uri: &str, token: &str, fields: &[(&str, &str)], video: Option<(&str, &str)>) -> Request<Body> {
    let boundary = "integration-boundary";
    let mut body = String::new();
    for (field, value) in fields {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n"
        ));
    }
    if let Some((file_name, content_type)) = video {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"video\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\nnot really an mp4\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn stored_videos(ctx: &TestContext) -> Vec<String> {
    std::fs::read_dir(ctx.uploads.path().join("videos"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

fn signup(name: &str, email: &str, password: &str) -> Request<Body> {
    let boundary = "integration-boundary";
    let mut body = String::new();
    for (field, value) in [("name", name), ("email", email), ("password", password)] {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/api/signup")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
#[serial]
async fn test_signup_login_and_profile() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let email = format!("grace-{}@example.com", Uuid::new_v4().simple());

    let (status, body) = ctx.send(signup("Grace", &email, "hopper123")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["profilePic"],
        "http://localhost:3000/uploads/profilepics/default_image.png"
    );

    // Same address in another case is the same account
    let (status, body) = ctx
        .send(signup("Grace", &email.to_uppercase(), "hopper123"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");

    let (status, body) = ctx
        .send(post("/api/login", None, json!({ "email": email, "password": "wrong-password" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = ctx
        .send(post("/api/login", None, json!({ "email": email, "password": "hopper123" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = ctx
        .send(
            Request::builder()
                .uri("/api/user")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], email);
    assert_eq!(me["id"], body["userId"]);
    assert!(me.get("passwordHash").is_none());
    assert!(!me.to_string().contains("argon2"));
}

#[tokio::test]
#[serial]
async fn test_reset_password() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let (user, token) = ctx.user("Linus").await;

    let (status, _) = ctx
        .send(post("/api/reset-password", Some(&token), json!({ "newPassword": "brand-new-pw" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .send(post("/api/login", None, json!({ "email": user.email, "password": "secret123" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .send(post("/api/login", None, json!({ "email": user.email, "password": "brand-new-pw" })))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[serial]
async fn test_federated_account_cannot_use_password_login() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let email = format!("fed-{}@gmail.com", Uuid::new_v4().simple());

    let (status, first) = ctx
        .send(post(
            "/api/google-login",
            None,
            json!({ "email": email, "name": "Fed", "photo": "https://lh3.googleusercontent.com/a/x" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, second) = ctx
        .send(post("/api/google-login", None, json!({ "email": email, "name": "Fed" })))
        .await;
    assert_eq!(first["userId"], second["userId"]);

    let (status, _) = ctx
        .send(post("/api/login", None, json!({ "email": email, "password": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = ctx
        .send(post("/api/login", None, json!({ "email": email, "password": "anything" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn test_like_and_dislike_are_exclusive() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let (uploader, _) = ctx.user("Uploader").await;
    let (viewer, token) = ctx.user("Viewer").await;
    let video = ctx.video(&uploader, "Reactions", api::models::video::Category::Music).await;
    let me = json!(viewer.id);

    let (status, body) = ctx
        .send(post(&format!("/api/{video}/dislike"), Some(&token), json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dislikes"], json!([me]));

    let (_, body) = ctx
        .send(post(&format!("/api/{video}/like"), Some(&token), json!({})))
        .await;
    assert_eq!(body["likes"], json!([me]));
    assert_eq!(body["dislikes"], json!([]));

    let (_, body) = ctx
        .send(post(&format!("/api/{video}/like"), Some(&token), json!({})))
        .await;
    assert_eq!(body["likes"], json!([]));

    let (_, detail) = ctx
        .send(get(&format!("/api/{video}?userId={}", viewer.id)))
        .await;
    assert_eq!(detail["likeCount"], 0);
    assert_eq!(detail["isLiked"], false);
    assert_eq!(detail["uploader"]["name"], "Uploader");
}

#[tokio::test]
#[serial]
async fn test_concurrent_likes_are_not_lost() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let (uploader, _) = ctx.user("Popular").await;
    let video = ctx.video(&uploader, "Concurrent", api::models::video::Category::News).await;

    let mut viewers = Vec::new();
    for i in 0..8 {
        viewers.push(ctx.user(&format!("Fan{i}")).await.0);
    }

    let mut tasks = tokio::task::JoinSet::new();
    for viewer in &viewers {
        let videos = ctx.state.videos.clone();
        let viewer = viewer.id;
        tasks.spawn(async move {
            videos
                .toggle_reaction(video, viewer, api::models::video::Reaction::Like)
                .await
                .unwrap()
        });
    }
    while let Some(result) = tasks.join_next().await {
        assert!(result.unwrap().is_some());
    }

    let (_, detail) = ctx.send(get(&format!("/api/{video}"))).await;
    assert_eq!(detail["likeCount"], viewers.len());
}

#[tokio::test]
#[serial]
async fn test_subscribe_twice_restores_state() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let (channel, _) = ctx.user("Channel").await;
    let (fan, token) = ctx.user("Fan").await;

    let (status, body) = ctx
        .send(post(&format!("/api/{}/subscribe", channel.id), Some(&token), json!({})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isSubscribed"], true);
    assert_eq!(body["subscribers"], 1);

    let (_, status_body) = ctx
        .send(get(&format!("/api/{}/isSubscribed/{}", fan.id, channel.id)))
        .await;
    assert_eq!(status_body["isSubscribed"], true);

    let (_, list) = ctx
        .send(get(&format!("/api/users/{}/subscriptions", fan.id)))
        .await;
    assert_eq!(list[0]["id"], json!(channel.id));
    assert_eq!(
        list[0]["photo"],
        "http://localhost:3000/uploads/profilepics/default_image.png"
    );

    let (_, body) = ctx
        .send(post(&format!("/api/{}/subscribe", channel.id), Some(&token), json!({})))
        .await;
    assert_eq!(body["isSubscribed"], false);
    assert_eq!(body["subscribers"], 0);

    let (_, profile) = ctx.send(get(&format!("/api/user/{}", fan.id))).await;
    assert_eq!(profile["subscribedTo"], json!([]));

    let (status, _) = ctx
        .send(post(&format!("/api/{}/subscribe", Uuid::new_v4()), Some(&token), json!({})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn test_comments_only_grow() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let (uploader, token) = ctx.user("Talker").await;
    let video = ctx.video(&uploader, "Comments", api::models::video::Category::Comedy).await;

    let mut previous = 0;
    for text in ["first", "second", "third"] {
        let (status, body) = ctx
            .send(post(&format!("/api/{video}/comment"), Some(&token), json!({ "text": text })))
            .await;
        assert_eq!(status, StatusCode::OK);

        let comments = body["comments"].as_array().unwrap();
        assert_eq!(comments.len(), previous + 1);
        assert_eq!(comments.last().unwrap()["text"], text);
        previous = comments.len();
    }

    let (_, detail) = ctx.send(get(&format!("/api/{video}"))).await;
    assert_eq!(detail["comments"][0]["userName"], "Talker");
}

#[tokio::test]
#[serial]
async fn test_search_matches_category_only() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let (uploader, _) = ctx.user("Scientist").await;
    let title = format!("untitled-{}", Uuid::new_v4().simple());
    let video = ctx.video(&uploader, &title, api::models::video::Category::Science).await;

    let (status, body) = ctx.send(get("/api/search?q=sCiEnCe")).await;
    assert_eq!(status, StatusCode::OK);
    let found = body
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["id"] == json!(video))
        .unwrap();
    // The stored file does not exist, so the duration falls back
    assert_eq!(found["duration"], "0:00");
    assert_eq!(found["uploader"]["name"], "Scientist");

    let (status, _) = ctx
        .send(get(&format!("/api/search?q={}", Uuid::new_v4().simple())))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn test_views_and_missing_videos() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let (uploader, token) = ctx.user("Watcher").await;
    let video = ctx.video(&uploader, "Views", api::models::video::Category::All).await;

    for expected in 1..=3 {
        let (status, body) = ctx
            .send(post(&format!("/api/{video}/view"), None, json!({})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["views"], expected);
    }

    let missing = Uuid::new_v4();
    let (status, _) = ctx.send(get(&format!("/api/{missing}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = ctx
        .send(post(&format!("/api/{missing}/view"), None, json!({})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = ctx
        .send(post(&format!("/api/{missing}/like"), Some(&token), json!({})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, count) = ctx
        .send(get(&format!("/api/user/{}/count", uploader.id)))
        .await;
    assert_eq!(count["totalVideos"], 1);
}

#[tokio::test]
#[serial]
async fn test_recent_videos_are_limited_to_three() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let (uploader, _) = ctx.user("Prolific").await;
    for i in 0..5 {
        ctx.video(&uploader, &format!("Episode {i}"), api::models::video::Category::Education)
            .await;
    }

    let (_, recent) = ctx
        .send(get(&format!("/api/user/{}/recent", uploader.id)))
        .await;
    let recent = recent.as_array().unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0]["title"], "Episode 4");

    let (_, all) = ctx
        .send(get(&format!("/api/user/{}/videos", uploader.id)))
        .await;
    assert_eq!(all.as_array().unwrap().len(), 5);

    let (_, listed) = ctx.send(get("/api/videos?category=Education")).await;
    assert!(
        listed
            .as_array()
            .unwrap()
            .iter()
            .all(|item| item["category"] == "Education")
    );
}

#[tokio::test]
#[serial]
async fn test_upload_stores_file_and_normalises_category() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let (uploader, token) = ctx.user("Creator").await;

    let (status, body) = ctx
        .send(multipart(
            "/api/upload",
            &token,
            &[
                ("title", "My first clip"),
                ("description", "Shot on a phone"),
                ("category", "Underwater Basket Weaving"),
                ("uploaderId", &Uuid::new_v4().to_string()),
            ],
            Some(("clip.mp4", "video/mp4")),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Video uploaded successfully");
    let video = &body["video"];
    assert_eq!(video["category"], "Other");
    assert_eq!(video["uploaderId"], json!(uploader.id));
    assert_eq!(video["views"], 0);

    let filename = video["filename"].as_str().unwrap();
    assert!(filename.ends_with("clip.mp4"));
    assert_eq!(stored_videos(&ctx), vec![filename.to_string()]);

    let (_, detail) = ctx
        .send(get(&format!("/api/{}", video["id"].as_str().unwrap())))
        .await;
    assert_eq!(detail["title"], "My first clip");
}

#[tokio::test]
#[serial]
async fn test_unknown_account_cannot_act() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let (uploader, _) = ctx.user("Owner").await;
    let video = ctx.video(&uploader, "Untouched", api::models::video::Category::Music).await;

    let ghost = User {
        id: Uuid::new_v4(),
        email: "ghost@example.com".to_string(),
        name: "Ghost".to_string(),
        photo: "default_image.png".to_string(),
        password_hash: None,
        subscribers: 0,
        subscribed_to: vec![],
        created_at: chrono::Utc::now(),
    };
    let token = ctx.state.jwt_service.generate_token(&ghost).unwrap();

    for action in ["like", "dislike"] {
        let (status, body) = ctx
            .send(post(&format!("/api/{video}/{action}"), Some(&token), json!({})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "User not found");
    }

    let (status, _) = ctx
        .send(post(&format!("/api/{video}/comment"), Some(&token), json!({ "text": "boo" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(post(&format!("/api/{}/subscribe", uploader.id), Some(&token), json!({})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(multipart(
            "/api/upload",
            &token,
            &[("title", "Haunted"), ("description", "Spooky")],
            Some(("ghost.mp4", "video/mp4")),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(stored_videos(&ctx).is_empty());

    let (_, detail) = ctx.send(get(&format!("/api/{video}"))).await;
    assert_eq!(detail["likeCount"], 0);
    assert_eq!(detail["dislikeCount"], 0);
    assert_eq!(detail["comments"], json!([]));
    assert_eq!(detail["uploader"]["subscribers"], 0);
}

#[tokio::test]
#[serial]
async fn test_full_text_listing_and_popular_sort() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let (uploader, _) = ctx.user("Ranker").await;
    let marker = format!("zq{}", Uuid::new_v4().simple());

    let mut ids = Vec::new();
    for (title, views) in [("Quiet one", 0), ("Hit one", 5), ("Middle one", 2)] {
        let id = ctx
            .state
            .videos
            .create(&api::models::video::NewVideo {
                title: title.to_string(),
                description: format!("Tagged {marker} for ranking"),
                filename: format!("{}.mp4", Uuid::new_v4().simple()),
                thumbnail: None,
                category: api::models::video::Category::Sports,
                uploader_id: uploader.id,
            })
            .await
            .unwrap()
            .id;
        for _ in 0..views {
            ctx.state.videos.increment_views(id).await.unwrap();
        }
        ids.push(id);
    }

    let titles = |body: &Value| -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|item| item["title"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, newest) = ctx.send(get(&format!("/api/videos?search={marker}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&newest), vec!["Middle one", "Hit one", "Quiet one"]);

    let (_, popular) = ctx
        .send(get(&format!("/api/videos?search={marker}&sort=popular")))
        .await;
    assert_eq!(titles(&popular), vec!["Hit one", "Middle one", "Quiet one"]);
    assert_eq!(popular[0]["views"], 5);

    // Full-text search also matches words of the title
    let title_marker = format!("zt{}", Uuid::new_v4().simple());
    let titled = ctx
        .video(&uploader, &format!("Paddling {title_marker}"), api::models::video::Category::Travel)
        .await;
    let (_, found) = ctx
        .send(get(&format!("/api/videos?search={title_marker}&category=Travel")))
        .await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["id"], json!(titled));

    let (_, none) = ctx
        .send(get(&format!("/api/videos?search={marker}&category=Travel")))
        .await;
    assert_eq!(none, json!([]));
    assert_eq!(ids.len(), 3);
}
