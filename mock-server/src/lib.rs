use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

pub const PAGE_SIZE: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: i32,
    pub stream: u64,
}

#[derive(Debug, Deserialize)]
pub struct SongInput {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: i32,
    pub stream: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page {
    pub results: Vec<Song>,
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Default)]
struct Db {
    songs: BTreeMap<u64, Song>,
    next_id: u64,
}

#[derive(Clone)]
struct AppState {
    db: Arc<RwLock<Db>>,
    page_size: usize,
}

pub fn app() -> Router {
    app_with_page_size(PAGE_SIZE)
}

pub fn app_with_page_size(page_size: usize) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Db::default())),
        page_size: page_size.max(1),
    };
    let songs = Router::new()
        .route("/songs/", get(list_songs).post(create_song))
        .route("/songs/{id}/", put(update_song).delete(delete_song))
        .with_state(state);
    Router::new().nest("/api", songs)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

enum Rejection {
    NotFound,
    InvalidPage,
    Invalid(BTreeMap<&'static str, Vec<&'static str>>),
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
            }
            Rejection::InvalidPage => {
                (StatusCode::NOT_FOUND, Json(json!({"detail": "Invalid page."}))).into_response()
            }
            Rejection::Invalid(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
        }
    }
}

fn validate(input: &SongInput) -> Result<(), Rejection> {
    let mut errors = BTreeMap::new();
    for (field, value) in [
        ("title", &input.title),
        ("artist", &input.artist),
        ("album", &input.album),
    ] {
        if value.trim().is_empty() {
            errors.insert(field, vec!["This field may not be blank."]);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Rejection::Invalid(errors))
    }
}

fn matches_search(song: &Song, needle: &str) -> bool {
    needle.is_empty()
        || [&song.title, &song.artist, &song.album]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

#[derive(Serialize)]
struct LinkParams<'a> {
    page: usize,
    #[serde(skip_serializing_if = "is_blank")]
    search: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ordering: Option<&'a str>,
}

fn is_blank(value: &&str) -> bool {
    value.is_empty()
}

fn page_link(path: &str, page: usize, search: &str, ordering: Option<&str>) -> Option<String> {
    let params = LinkParams {
        page,
        search,
        ordering,
    };
    serde_urlencoded::to_string(&params)
        .ok()
        .map(|query| format!("{path}?{query}"))
}

async fn list_songs(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListParams>,
) -> Result<Json<Page>, Rejection> {
    let search = params.search.as_deref().unwrap_or("");
    let needle = search.to_lowercase();
    let ordering = params.ordering.as_deref().filter(|o| !o.is_empty());

    let page = match params.page.as_deref() {
        None | Some("") => 1,
        Some(raw) => match raw.parse::<usize>() {
            Ok(page) if page >= 1 => page,
            _ => return Err(Rejection::InvalidPage),
        },
    };

    let mut matches: Vec<Song> = {
        let db = state.db.read().await;
        db.songs
            .values()
            .filter(|song| matches_search(song, &needle))
            .cloned()
            .collect()
    };
    match ordering {
        Some("title") => matches.sort_by(|a, b| a.title.cmp(&b.title)),
        Some("-title") => matches.sort_by(|a, b| b.title.cmp(&a.title)),
        _ => {}
    }

    let count = matches.len();
    let pages = count.div_ceil(state.page_size).max(1);
    if page > pages {
        return Err(Rejection::InvalidPage);
    }
    let start = (page - 1) * state.page_size;
    let end = (start + state.page_size).min(count);
    let results = matches[start..end].to_vec();

    let path = uri.path();
    let next = if page < pages {
        page_link(path, page + 1, search, ordering)
    } else {
        None
    };
    let previous = if page > 1 {
        page_link(path, page - 1, search, ordering)
    } else {
        None
    };

    debug!(page, count, "listed songs");
    Ok(Json(Page {
        results,
        count,
        next,
        previous,
    }))
}

async fn create_song(
    State(state): State<AppState>,
    Json(input): Json<SongInput>,
) -> Result<(StatusCode, Json<Song>), Rejection> {
    validate(&input)?;
    let mut db = state.db.write().await;
    db.next_id += 1;
    let song = Song {
        id: db.next_id,
        title: input.title,
        artist: input.artist,
        album: input.album,
        year: input.year,
        stream: input.stream,
    };
    db.songs.insert(song.id, song.clone());
    debug!(id = song.id, "created song");
    Ok((StatusCode::CREATED, Json(song)))
}

async fn update_song(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<SongInput>,
) -> Result<Json<Song>, Rejection> {
    validate(&input)?;
    let mut db = state.db.write().await;
    let song = db.songs.get_mut(&id).ok_or(Rejection::NotFound)?;
    song.title = input.title;
    song.artist = input.artist;
    song.album = input.album;
    song.year = input.year;
    song.stream = input.stream;
    Ok(Json(song.clone()))
}

async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, Rejection> {
    let mut db = state.db.write().await;
    db.songs
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(Rejection::NotFound)
}
