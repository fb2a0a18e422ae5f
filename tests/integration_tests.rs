use actix_web::{cookie::Cookie, http::StatusCode, test, web, App};
use diesel_migrations::MigrationHarness;
use homepage::{
    api,
    cache::SwrCache,
    config::AppConfig,
    feeds::ParsedArticle,
    initialize_db_pool,
    models::{
        now_ts,
        oauth_token::{OAuthToken, Provider, TokenUpdate},
        rss::{NewRssFeed, RssArticle},
        user::User,
    },
    security::SecurityHeaders,
    session::SESSION_COOKIE,
    sources::youtube::Video,
    state::{AppState, YOUTUBE_TTL},
    DbPool, MIGRATIONS,
};
use serde_json::{json, Value};
use tempfile::TempDir;

const PASSWORD: &str = "correct horse battery";
const EXTENSION_TOKEN: &str = "extension-secret";

fn create_test_db() -> (TempDir, DbPool) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let pool = initialize_db_pool(&db_path.display().to_string()).expect("Failed to create pool");

    let mut conn = pool.get().expect("Failed to get connection");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");
    User::set_password(&mut conn, "owner", PASSWORD).expect("Failed to create owner");

    (temp_dir, pool)
}

fn build_state(pool: &DbPool, vars: &[(&str, &str)]) -> AppState {
    let config = AppConfig::from_lookup(|name| match name {
        "HOMEPAGE_EXTENSION_TOKEN" => Some(EXTENSION_TOKEN.to_string()),
        _ => vars
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string()),
    })
    .expect("Failed to build config");
    AppState::new(config, pool.clone()).expect("Failed to build state")
}

fn test_state(pool: &DbPool) -> web::Data<AppState> {
    web::Data::new(build_state(pool, &[]))
}

macro_rules! test_app {
    ($pool:expr) => {
        test_app!($pool, test_state(&$pool))
    };
    ($pool:expr, $state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data($state)
                .wrap(SecurityHeaders)
                .service(api::auth::routes())
                .service(api::health::routes())
                .service(api::routes()),
        )
        .await
    };
}

macro_rules! login {
    ($app:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "password": PASSWORD }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .expect("session cookie")
            .into_owned();
        Cookie::new(SESSION_COOKIE, cookie.value().to_string())
    }};
}

#[actix_web::test]
async fn test_health_endpoints() {
    let (_dir, pool) = create_test_db();
    let app = test_app!(pool);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get().uri("/health/ready").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["caches"].as_array().map(Vec::len), Some(3));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health/live").to_request()).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn test_login_flow() {
    let (_dir, pool) = create_test_db();
    let app = test_app!(pool);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "password": "wrong password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get().uri("/api/auth/me").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["authenticated"], false);

    let cookie = login!(app);
    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .cookie(cookie.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["username"], "owner");

    let req = test::TestRequest::post()
        .uri("/api/auth/logout")
        .cookie(cookie.clone())
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::get().uri("/api/todos").cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_api_requires_session() {
    let (_dir, pool) = create_test_db();
    let app = test_app!(pool);

    for uri in ["/api/todos", "/api/memos", "/api/habits", "/api/bookmarks", "/api/rss/feeds"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[actix_web::test]
async fn test_todos_crud_without_google() {
    let (_dir, pool) = create_test_db();
    let app = test_app!(pool);
    let cookie = login!(app);

    let req = test::TestRequest::post()
        .uri("/api/todos")
        .cookie(cookie.clone())
        .set_json(json!({ "title": "  Water plants ", "due_date": "2024-06-01" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["title"], "Water plants");
    assert_eq!(created["google_task_id"], Value::Null);
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/todos")
        .cookie(cookie.clone())
        .set_json(json!({ "title": "Bad date", "due_date": "tomorrow" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/todos/{id}"))
        .cookie(cookie.clone())
        .set_json(json!({ "completed": true }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["completed"], true);

    let req = test::TestRequest::get().uri("/api/todos").cookie(cookie.clone()).to_request();
    let todos: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(todos.as_array().map(Vec::len), Some(1));

    let req = test::TestRequest::post()
        .uri("/api/todos/sync")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/todos/{id}"))
        .cookie(cookie.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/todos/{id}"))
        .cookie(cookie)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_habit_toggle() {
    let (_dir, pool) = create_test_db();
    let app = test_app!(pool);
    let cookie = login!(app);

    let req = test::TestRequest::post()
        .uri("/api/habits")
        .cookie(cookie.clone())
        .set_json(json!({ "name": "Read", "color": "#22c55e" }))
        .to_request();
    let habit: Value = test::call_and_read_body_json(&app, req).await;
    let id = habit["id"].as_i64().unwrap();

    let toggle = |cookie: Cookie<'static>| {
        test::TestRequest::post()
            .uri(&format!("/api/habits/{id}/toggle"))
            .cookie(cookie)
            .set_json(json!({ "date": "2024-02-29" }))
            .to_request()
    };
    let body: Value = test::call_and_read_body_json(&app, toggle(cookie.clone())).await;
    assert_eq!(body["completed"], true);
    let body: Value = test::call_and_read_body_json(&app, toggle(cookie.clone())).await;
    assert_eq!(body["completed"], false);

    let req = test::TestRequest::get().uri("/api/habits").cookie(cookie).to_request();
    let habits: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(habits[0]["name"], "Read");
    assert!(habits[0]["completions"].is_array());
}

#[actix_web::test]
async fn test_extension_bookmarks_use_bearer_token() {
    let (_dir, pool) = create_test_db();
    let app = test_app!(pool);
    let bookmark = json!({ "url": "https://www.rust-lang.org/", "title": "Rust" });

    let req = test::TestRequest::post()
        .uri("/api/extension/bookmarks")
        .set_json(&bookmark)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/extension/bookmarks")
        .insert_header(("Authorization", "Bearer wrong-token"))
        .set_json(&bookmark)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let mut ids = Vec::new();
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/extension/bookmarks")
            .insert_header(("Authorization", format!("Bearer {EXTENSION_TOKEN}")))
            .set_json(&bookmark)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        ids.push(body["id"].as_i64());
    }
    assert_eq!(ids[0], ids[1]);

    let cookie = login!(app);
    let req = test::TestRequest::get().uri("/api/bookmarks").cookie(cookie).to_request();
    let bookmarks: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(bookmarks.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn test_unconnected_widgets_report_disconnected() {
    let (_dir, pool) = create_test_db();
    let app = test_app!(pool);
    let cookie = login!(app);

    let req = test::TestRequest::get().uri("/api/youtube").cookie(cookie.clone()).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["connected"], false);

    let req = test::TestRequest::get().uri("/api/calendar").cookie(cookie.clone()).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["connected"], false);

    let req = test::TestRequest::get()
        .uri("/api/spotify/now-playing")
        .cookie(cookie.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["connected"], false);
    assert_eq!(body["playing"], false);

    let req = test::TestRequest::get().uri("/api/google/status").cookie(cookie).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["configured"], false);
    assert_eq!(body["connected"], false);
}

fn sample_video() -> Video {
    Video {
        id: "abc123".to_string(),
        title: "Cached upload".to_string(),
        link: "https://www.youtube.com/watch?v=abc123".to_string(),
        channel_id: "UC1".to_string(),
        channel_title: "Channel".to_string(),
        thumbnail: "https://i.ytimg.com/vi/abc123/mqdefault.jpg".to_string(),
        published_at: Some(1_704_067_200),
    }
}

#[actix_web::test]
async fn test_youtube_reports_disconnected_after_google_is_removed() {
    let (_dir, pool) = create_test_db();
    {
        let mut conn = pool.get().unwrap();
        let grant = TokenUpdate {
            access_token: "access",
            refresh_token: Some("refresh"),
            expires_at: now_ts() + 3600,
            scope: None,
        };
        OAuthToken::store(&mut conn, Provider::Google, grant).unwrap();
    }
    let mut state = build_state(&pool, &[]);
    state.youtube = SwrCache::new("youtube", YOUTUBE_TTL, || async { Ok(vec![sample_video()]) });
    let state = web::Data::new(state);
    let app = test_app!(pool, state.clone());
    let cookie = login!(app);

    let req = test::TestRequest::get().uri("/api/youtube").cookie(cookie.clone()).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["connected"], true);
    assert_eq!(body["videos"][0]["id"], "abc123");

    let req = test::TestRequest::delete().uri("/api/google").cookie(cookie.clone()).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
    assert!(state.youtube.current().is_none());

    let req = test::TestRequest::get().uri("/api/youtube").cookie(cookie).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["connected"], false);
    assert_eq!(body["videos"], json!([]));
}

#[actix_web::test]
async fn test_rss_cache_routes_without_feeds() {
    let (_dir, pool) = create_test_db();
    let app = test_app!(pool);
    let cookie = login!(app);

    let req = test::TestRequest::get().uri("/api/rss").cookie(cookie.clone()).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!([]));

    let req = test::TestRequest::post()
        .uri("/api/rss/refresh")
        .cookie(cookie.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!([]));

    let req = test::TestRequest::get().uri("/api/cache").cookie(cookie.clone()).to_request();
    let snapshots: Value = test::call_and_read_body_json(&app, req).await;
    let snapshots = snapshots.as_array().expect("snapshot list");
    assert_eq!(snapshots.len(), 3);
    let rss = snapshots
        .iter()
        .find(|snapshot| snapshot["name"] == "rss")
        .expect("rss snapshot");
    assert_eq!(rss["stale"], false);
    assert!(!rss["fetched_at"].is_null());
    let github = snapshots
        .iter()
        .find(|snapshot| snapshot["name"] == "github")
        .expect("github snapshot");
    assert!(github["fetched_at"].is_null());

    let req = test::TestRequest::get().uri("/api/github").cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn test_rss_limit_truncates_stored_articles() {
    let (_dir, pool) = create_test_db();
    {
        let mut conn = pool.get().unwrap();
        // Nothing listens on the discard port; the refresh marks the feed
        // failed and serves what is already stored.
        let feed = NewRssFeed::new("http://127.0.0.1:9/feed.xml", "Local", None)
            .insert(&mut conn)
            .unwrap();
        let articles: Vec<ParsedArticle> = (1..=3)
            .map(|n| ParsedArticle {
                guid: format!("guid-{n}"),
                title: format!("Article {n}"),
                link: format!("https://example.com/{n}"),
                published_at: Some(format!("Mon, 0{n} Jan 2024 00:00:00 GMT")),
                author: None,
            })
            .collect();
        RssArticle::insert_new(&mut conn, feed.id, &articles).unwrap();
    }
    let app = test_app!(pool);
    let cookie = login!(app);

    let req = test::TestRequest::get().uri("/api/rss").cookie(cookie.clone()).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().map(Vec::len), Some(3));

    let req = test::TestRequest::get()
        .uri("/api/rss?limit=2")
        .cookie(cookie.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let req = test::TestRequest::get().uri("/api/rss/feeds").cookie(cookie).to_request();
    let feeds: Value = test::call_and_read_body_json(&app, req).await;
    assert!(!feeds[0]["error_message"].is_null());
}

#[actix_web::test]
async fn test_feed_and_category_deletes() {
    let (_dir, pool) = create_test_db();
    let app = test_app!(pool);
    let cookie = login!(app);

    let req = test::TestRequest::delete()
        .uri("/api/rss/feeds/999")
        .cookie(cookie.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/rss/categories")
        .cookie(cookie.clone())
        .set_json(json!({ "name": "Tech" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let category: Value = test::read_body_json(resp).await;
    let category_id = category["id"].as_i64().unwrap() as i32;

    {
        let mut conn = pool.get().unwrap();
        NewRssFeed::new("https://example.com/feed.xml", "Example", Some(category_id))
            .insert(&mut conn)
            .unwrap();
    }

    let req = test::TestRequest::delete()
        .uri(&format!("/api/rss/categories/{category_id}"))
        .cookie(cookie.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri("/api/rss/feeds").cookie(cookie.clone()).to_request();
    let feeds: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(feeds.as_array().map(Vec::len), Some(1));
    assert!(feeds[0]["category_id"].is_null());

    let req = test::TestRequest::get().uri("/api/rss/categories").cookie(cookie).to_request();
    let categories: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(categories, json!([]));
}

#[actix_web::test]
async fn test_oauth_callback_rejects_bad_state() {
    let (_dir, pool) = create_test_db();
    let app = test_app!(pool);

    let req = test::TestRequest::get()
        .uri("/api/google/callback?code=abc&state=xyz")
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/google/callback?code=abc&state=xyz")
        .cookie(Cookie::new("oauth_state", "something-else"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/spotify/callback?error=access_denied&state=xyz")
        .cookie(Cookie::new("oauth_state", "xyz"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/google/callback?state=xyz")
        .cookie(Cookie::new("oauth_state", "xyz"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_oauth_connect() {
    let (_dir, pool) = create_test_db();
    let app = test_app!(pool);
    let cookie = login!(app);

    let req = test::TestRequest::get()
        .uri("/api/google/connect")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let state = web::Data::new(build_state(
        &pool,
        &[
            ("SPOTIFY_CLIENT_ID", "client"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
            ("SPOTIFY_REDIRECT_URI", "http://localhost:8080/api/spotify/callback"),
        ],
    ));
    let app = test_app!(pool, state);
    let cookie = login!(app);

    let req = test::TestRequest::get()
        .uri("/api/spotify/connect")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let location = resp
        .headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(location.starts_with("https://accounts.spotify.com/authorize"));
    let csrf = resp
        .response()
        .cookies()
        .find(|c| c.name() == "oauth_state")
        .expect("state cookie")
        .value()
        .to_string();
    assert_eq!(csrf.len(), 32);
    assert!(location.contains(&format!("state={csrf}")));
}
