use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with_page_size, Page, Song};
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn song_body(title: &str, artist: &str) -> String {
    format!(
        r#"{{"title":"{title}","artist":"{artist}","album":"Album","year":2020,"stream":10}}"#
    )
}

/// Send one request through a router that keeps its state between calls.
async fn call(app: &mut Router, request: Request<String>) -> axum::response::Response {
    ServiceExt::<Request<String>>::ready(app)
        .await
        .unwrap()
        .call(request)
        .await
        .unwrap()
}

async fn seed(app: &mut Router, songs: &[(&str, &str)]) {
    for (title, artist) in songs {
        let resp = call(app, json_request("POST", "/api/songs/", &song_body(title, artist))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
}

// --- list ---

#[tokio::test]
async fn list_songs_empty() {
    let resp = app().oneshot(get("/api/songs/")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let page: Page = body_json(resp).await;
    assert!(page.results.is_empty());
    assert_eq!(page.count, 0);
    assert!(page.next.is_none());
    assert!(page.previous.is_none());
}

#[tokio::test]
async fn list_songs_paginates() {
    let mut app = app_with_page_size(2);
    seed(&mut app, &[("A", "x"), ("B", "x"), ("C", "x")]).await;

    let resp = call(&mut app, get("/api/songs/?page=1")).await;
    let first: Page = body_json(resp).await;
    assert_eq!(first.count, 3);
    assert_eq!(first.results.len(), 2);
    assert_eq!(first.next.as_deref(), Some("/api/songs/?page=2"));
    assert!(first.previous.is_none());

    let resp = call(&mut app, get("/api/songs/?page=2")).await;
    let second: Page = body_json(resp).await;
    assert_eq!(second.results.len(), 1);
    assert_eq!(second.results[0].title, "C");
    assert!(second.next.is_none());
    assert_eq!(second.previous.as_deref(), Some("/api/songs/?page=1"));
}

#[tokio::test]
async fn list_songs_out_of_range_page_returns_404() {
    let resp = app().oneshot(get("/api/songs/?page=5")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["detail"], "Invalid page.");
}

#[tokio::test]
async fn list_songs_searches_and_orders() {
    let mut app = app();
    seed(
        &mut app,
        &[("Bravo", "Daft Punk"), ("Alpha", "Daft Punk"), ("Charlie", "Other")],
    )
    .await;

    let resp = call(&mut app, get("/api/songs/?search=punk&ordering=-title")).await;
    let page: Page = body_json(resp).await;
    let titles: Vec<&str> = page.results.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(page.count, 2);
    assert_eq!(titles, vec!["Bravo", "Alpha"]);

    let resp = call(&mut app, get("/api/songs/?ordering=title")).await;
    let page: Page = body_json(resp).await;
    let titles: Vec<&str> = page.results.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Bravo", "Charlie"]);
}

#[tokio::test]
async fn list_songs_ignores_unknown_ordering() {
    let mut app = app();
    seed(&mut app, &[("Bravo", "x"), ("Alpha", "x")]).await;

    let resp = call(&mut app, get("/api/songs/?ordering=year")).await;
    let page: Page = body_json(resp).await;
    let titles: Vec<&str> = page.results.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Bravo", "Alpha"]);
}

// --- create ---

#[tokio::test]
async fn create_song_returns_201() {
    let resp = app()
        .oneshot(json_request("POST", "/api/songs/", &song_body("Song One", "Artist One")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let song: Song = body_json(resp).await;
    assert_eq!(song.id, 1);
    assert_eq!(song.title, "Song One");
    assert_eq!(song.stream, 10);
}

#[tokio::test]
async fn create_song_blank_title_returns_400() {
    let resp = app()
        .oneshot(json_request("POST", "/api/songs/", &song_body("", "Artist")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["title"][0], "This field may not be blank.");
}

#[tokio::test]
async fn create_song_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/songs/", r#"{"title":"Only a title"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- update ---

#[tokio::test]
async fn update_song_not_found() {
    let resp = app()
        .oneshot(json_request("PUT", "/api/songs/99/", &song_body("Nope", "Nobody")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_song_bad_id_returns_400() {
    let resp = app()
        .oneshot(json_request("PUT", "/api/songs/abc/", &song_body("Nope", "Nobody")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- delete ---

#[tokio::test]
async fn delete_song_not_found() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/songs/99/")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    let mut app = app();

    // create
    let resp = call(&mut app, json_request("POST", "/api/songs/", &song_body("Walk", "Band"))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Song = body_json(resp).await;
    let id = created.id;

    // list contains it
    let resp = call(&mut app, get("/api/songs/")).await;
    let page: Page = body_json(resp).await;
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0], created);

    // update replaces every field
    let resp = call(
        &mut app,
        json_request(
            "PUT",
            &format!("/api/songs/{id}/"),
            r#"{"title":"Run","artist":"Band","album":"Live","year":2021,"stream":99}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Song = body_json(resp).await;
    assert_eq!(updated.id, id);
    assert_eq!(updated.title, "Run");
    assert_eq!(updated.album, "Live");
    assert_eq!(updated.stream, 99);

    // delete
    let resp = call(
        &mut app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/songs/{id}/"))
            .body(String::new())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // list after delete is empty
    let resp = call(&mut app, get("/api/songs/")).await;
    let page: Page = body_json(resp).await;
    assert!(page.results.is_empty());
}
