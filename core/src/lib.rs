//! Async client and synchronization store for the songs REST API.
//!
//! # Overview
//! The API client is split into a deterministic half and an I/O half.
//! `SongClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network; a `Transport` executes the round-trip.
//! `SongApi` drives both and returns a single `ApiError` on any failure.
//!
//! `SongStore` sits on top and owns the client-side view of the collection:
//! the current page, pagination cursors and load status. Views subscribe to
//! snapshots and call intents (`load`, `create`, `update`, `remove`).
//!
//! # Design
//! - Only the latest issued load may change the page; stale responses are
//!   dropped.
//! - Writes patch the page only after the server confirms them.
//! - The store is constructed explicitly around an injected `SongApi`, so
//!   tests can run isolated instances over a scripted `Transport`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod store;
pub mod transport;
pub mod types;

pub use api::SongApi;
pub use client::SongClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use store::{LoadOutcome, LoadStatus, SongStore, StoreState, Subscription};
pub use transport::{ReqwestTransport, Transport};
pub use types::{Song, SongDraft, SongId, SongPage, SongQuery, SortOrder};
