//! Stateless HTTP request builder and response parser for the songs API.
//!
//! # Design
//! `SongClient` holds only the collection URL and carries no mutable state
//! between calls. Each CRUD operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. [`SongApi`](crate::api::SongApi) runs the round-trip in
//! between.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Song, SongDraft, SongId, SongPage, SongQuery};

/// Synchronous, stateless client for the songs API.
#[derive(Debug, Clone)]
pub struct SongClient {
    songs_url: String,
}

impl SongClient {
    /// `api_base` is the API root; the collection lives at `{api_base}/songs/`.
    pub fn new(api_base: &str) -> Self {
        Self {
            songs_url: format!("{}/songs/", api_base.trim_end_matches('/')),
        }
    }

    pub fn songs_url(&self) -> &str {
        &self.songs_url
    }

    fn song_url(&self, id: SongId) -> String {
        format!("{}{id}/", self.songs_url)
    }

    pub fn build_list_songs(&self, query: &SongQuery) -> Result<HttpRequest, ApiError> {
        let params = query.to_query_string()?;
        let url = if params.is_empty() {
            self.songs_url.clone()
        } else {
            format!("{}?{params}", self.songs_url)
        };
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: Vec::new(),
            body: None,
        })
    }

    pub fn build_create_song(&self, draft: &SongDraft) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.songs_url.clone(),
            headers: json_headers(),
            body: Some(encode(draft)?),
        })
    }

    pub fn build_update_song(&self, id: SongId, draft: &SongDraft) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            url: self.song_url(id),
            headers: json_headers(),
            body: Some(encode(draft)?),
        })
    }

    pub fn build_delete_song(&self, id: SongId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            url: self.song_url(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list_songs(&self, response: HttpResponse) -> Result<SongPage, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }

    pub fn parse_create_song(&self, response: HttpResponse) -> Result<Song, ApiError> {
        check_status(&response, 201)?;
        decode(&response)
    }

    pub fn parse_update_song(&self, response: HttpResponse) -> Result<Song, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }

    /// A successful delete echoes back the id that was removed.
    pub fn parse_delete_song(&self, id: SongId, response: HttpResponse) -> Result<SongId, ApiError> {
        check_status(&response, 204)?;
        Ok(id)
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn encode(draft: &SongDraft) -> Result<String, ApiError> {
    serde_json::to_string(draft).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map anything but the expected status to the matching `ApiError`.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.is_success() {
        return Err(ApiError::Http {
            status: response.status,
            message: format!(
                "unexpected status {} (expected {expected})",
                response.status
            ),
        });
    }
    Err(ApiError::from_response(response))
}
