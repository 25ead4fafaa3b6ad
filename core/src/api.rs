//! Async facade over `SongClient` and a `Transport`.
//!
//! Each call builds the request, executes it and parses the response. Any
//! failure along the way comes back as a single `ApiError`; this layer holds
//! no state of its own.

use std::sync::Arc;

use tracing::warn;

use crate::client::SongClient;
use crate::config::{ClientConfig, ConfigError};
use crate::error::ApiError;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{Song, SongDraft, SongId, SongPage, SongQuery};

#[derive(Clone)]
pub struct SongApi {
    client: SongClient,
    transport: Arc<dyn Transport>,
}

impl SongApi {
    pub fn new(client: SongClient, transport: Arc<dyn Transport>) -> Self {
        Self { client, transport }
    }

    /// API backed by reqwest, pointed at `config.api_base`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::new(SongClient::new(&config.api_base), Arc::new(transport)))
    }

    pub fn client(&self) -> &SongClient {
        &self.client
    }

    pub async fn list(&self, query: &SongQuery) -> Result<SongPage, ApiError> {
        let result = async {
            let request = self.client.build_list_songs(query)?;
            let response = self.transport.execute(request).await?;
            self.client.parse_list_songs(response)
        }
        .await;
        log_failure("list", &result);
        result
    }

    pub async fn create(&self, draft: &SongDraft) -> Result<Song, ApiError> {
        let result = async {
            let request = self.client.build_create_song(draft)?;
            let response = self.transport.execute(request).await?;
            self.client.parse_create_song(response)
        }
        .await;
        log_failure("create", &result);
        result
    }

    pub async fn update(&self, id: SongId, draft: &SongDraft) -> Result<Song, ApiError> {
        let result = async {
            let request = self.client.build_update_song(id, draft)?;
            let response = self.transport.execute(request).await?;
            self.client.parse_update_song(response)
        }
        .await;
        log_failure("update", &result);
        result
    }

    pub async fn delete(&self, id: SongId) -> Result<SongId, ApiError> {
        let result = async {
            let request = self.client.build_delete_song(id);
            let response = self.transport.execute(request).await?;
            self.client.parse_delete_song(id, response)
        }
        .await;
        log_failure("delete", &result);
        result
    }
}

fn log_failure<T>(operation: &'static str, result: &Result<T, ApiError>) {
    if let Err(error) = result {
        warn!(operation, status = ?error.status(), %error, "song api call failed");
    }
}
