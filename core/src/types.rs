//! Domain DTOs for the songs API.
//!
//! # Design
//! These types mirror the server's JSON schema but are defined independently
//! of the mock-server crate; integration tests catch any schema drift between
//! the two.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Server-assigned song identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(pub u64);

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SongId {
    fn from(id: u64) -> Self {
        SongId(id)
    }
}

/// A single song returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: i32,
    pub stream: u64,
}

/// Request payload for creating or replacing a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongDraft {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: i32,
    pub stream: u64,
}

impl SongDraft {
    /// Reject drafts with blank text fields before they reach the server.
    pub fn validate(&self) -> Result<(), ApiError> {
        let blank: Vec<&str> = [
            ("title", &self.title),
            ("artist", &self.artist),
            ("album", &self.album),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if blank.is_empty() {
            Ok(())
        } else {
            Err(ApiError::InvalidDraft(format!(
                "{} must not be blank",
                blank.join(", ")
            )))
        }
    }
}

impl From<&Song> for SongDraft {
    fn from(song: &Song) -> Self {
        Self {
            title: song.title.clone(),
            artist: song.artist.clone(),
            album: song.album.clone(),
            year: song.year,
            stream: song.stream,
        }
    }
}

/// Sort orders understood by the list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "title")]
    TitleAscending,
    #[serde(rename = "-title")]
    TitleDescending,
}

/// Parameters of a list request. Empty values are left off the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongQuery {
    #[serde(skip_serializing_if = "page_is_unset")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub search: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<SortOrder>,
}

fn page_is_unset(page: &Option<u32>) -> bool {
    matches!(page, None | Some(0))
}

impl SongQuery {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    /// Effective 1-based page number.
    pub fn current_page(&self) -> u32 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    /// Same query with a new search term, back on the first page.
    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self {
            page: Some(1),
            search: search.into(),
            ordering: self.ordering,
        }
    }

    /// Same query with a new ordering, back on the first page.
    pub fn with_ordering(&self, ordering: SortOrder) -> Self {
        Self {
            page: Some(1),
            search: self.search.clone(),
            ordering: Some(ordering),
        }
    }

    pub fn next_page(&self) -> Self {
        Self {
            page: Some(self.current_page().saturating_add(1)),
            ..self.clone()
        }
    }

    pub fn previous_page(&self) -> Self {
        Self {
            page: Some(self.current_page().saturating_sub(1).max(1)),
            ..self.clone()
        }
    }

    /// Encode as a query string, without the leading `?`.
    pub fn to_query_string(&self) -> Result<String, ApiError> {
        serde_urlencoded::to_string(self).map_err(|e| ApiError::Serialization(e.to_string()))
    }
}

/// One page of the list endpoint as returned on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongPage {
    pub results: Vec<Song>,
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> SongDraft {
        SongDraft {
            title: "X".to_string(),
            artist: "Y".to_string(),
            album: "Z".to_string(),
            year: 2020,
            stream: 10,
        }
    }

    #[test]
    fn empty_query_encodes_to_nothing() {
        assert_eq!(SongQuery::default().to_query_string().unwrap(), "");
    }

    #[test]
    fn page_zero_is_treated_as_unset() {
        assert_eq!(SongQuery::page(0).to_query_string().unwrap(), "");
        assert_eq!(SongQuery::page(0).current_page(), 1);
    }

    #[test]
    fn full_query_encodes_all_parameters() {
        let query = SongQuery {
            page: Some(2),
            search: "daft punk".to_string(),
            ordering: Some(SortOrder::TitleDescending),
        };
        assert_eq!(
            query.to_query_string().unwrap(),
            "page=2&search=daft+punk&ordering=-title"
        );
    }

    #[test]
    fn search_and_ordering_reset_the_page() {
        let query = SongQuery {
            page: Some(4),
            search: "old".to_string(),
            ordering: Some(SortOrder::TitleAscending),
        };
        let searched = query.with_search("new");
        assert_eq!(searched.page, Some(1));
        assert_eq!(searched.search, "new");
        assert_eq!(searched.ordering, Some(SortOrder::TitleAscending));

        let sorted = query.with_ordering(SortOrder::TitleDescending);
        assert_eq!(sorted.page, Some(1));
        assert_eq!(sorted.search, "old");
        assert_eq!(sorted.ordering, Some(SortOrder::TitleDescending));
    }

    #[test]
    fn page_steps_never_go_below_one() {
        let query = SongQuery::default();
        assert_eq!(query.previous_page().page, Some(1));
        assert_eq!(query.next_page().page, Some(2));
        assert_eq!(SongQuery::page(3).previous_page().page, Some(2));
    }

    #[test]
    fn song_id_is_a_bare_integer_on_the_wire() {
        let song: Song = serde_json::from_str(
            r#"{"id":7,"title":"A","artist":"B","album":"C","year":1999,"stream":5}"#,
        )
        .unwrap();
        assert_eq!(song.id, SongId(7));
        assert_eq!(serde_json::to_value(song.id).unwrap(), 7);
    }

    #[test]
    fn negative_stream_count_is_rejected() {
        let result: Result<Song, _> = serde_json::from_str(
            r#"{"id":7,"title":"A","artist":"B","album":"C","year":1999,"stream":-5}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn blank_fields_are_named() {
        let mut d = draft();
        d.title = "  ".to_string();
        d.album = String::new();
        let err = d.validate().unwrap_err();
        assert_eq!(err, ApiError::InvalidDraft("title, album must not be blank".to_string()));
    }

    #[test]
    fn draft_prefills_from_song() {
        let song = Song {
            id: SongId(3),
            title: "A".to_string(),
            artist: "B".to_string(),
            album: "C".to_string(),
            year: 2001,
            stream: 42,
        };
        let d = SongDraft::from(&song);
        assert_eq!(d.title, "A");
        assert_eq!(d.year, 2001);
        assert_eq!(d.stream, 42);
    }
}
