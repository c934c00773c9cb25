//! HTTP client for the intake backend.
//!
//! Every call is a single attempt. Nothing is retried or de-duplicated, and
//! a failed save leaves the entries in the session store so the operator can
//! simply save again.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use thiserror::Error;

use crate::{
    config::Config,
    export::{BatchSaveRequest, NewCollectionRequest, SamplePayload},
    log_error, log_info,
    models::{CollectionSummary, CreatedCollection, FishEntry, SamplingInfo},
};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("No collection selected. Please start a collection first.")]
    NoActiveCollection,
    #[error("No data to save")]
    NothingToSave,
    #[error("A collection needs a name")]
    MissingCollectionName,
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct RemoteClient {
    http: Client,
    api_base: String,
}

impl RemoteClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base(&config.api_base, config.request_timeout)
    }

    pub fn with_base(api_base: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    pub async fn list_collections(&self) -> Result<Vec<CollectionSummary>, RemoteError> {
        let response = self.http.get(self.url("collections")).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Create a collection from the session metadata and return its id.
    pub async fn create_collection(&self, info: &SamplingInfo) -> Result<i64, RemoteError> {
        let request = NewCollectionRequest::from(info);
        if request.name.is_empty() {
            return Err(RemoteError::MissingCollectionName);
        }

        let result = match self.post_json("collections", &request).await {
            Ok(response) => response
                .json::<CreatedCollection>()
                .await
                .map_err(RemoteError::from),
            Err(err) => Err(err),
        };

        match &result {
            Ok(created) => {
                log_info!(
                    "Created collection {} ({})",
                    request.name,
                    created.collection_id
                );
            }
            Err(err) => {
                log_error!("Failed to create collection {}: {err}", request.name);
            }
        }
        result.map(|created| created.collection_id)
    }

    /// Save one fish against the session's active collection.
    pub async fn submit_entry(
        &self,
        info: &SamplingInfo,
        entry: &FishEntry,
    ) -> Result<(), RemoteError> {
        let Some(collection_id) = info.collection_id else {
            log_error!("No collection ID set - cannot save fish {}", entry.fish_id);
            return Err(RemoteError::NoActiveCollection);
        };

        let result = self
            .post_json(
                &format!("samples/{collection_id}"),
                &SamplePayload::from(entry),
            )
            .await;

        match &result {
            Ok(_) => {
                log_info!("Saved fish {} to collection {collection_id}", entry.fish_id);
            }
            Err(err) => {
                log_error!("Failed to save fish {}: {err}", entry.fish_id);
            }
        }
        result.map(|_| ())
    }

    /// Save the whole entry sequence under the session's collection name.
    /// Returns the number of fish sent.
    pub async fn submit_batch(
        &self,
        info: &SamplingInfo,
        entries: &[FishEntry],
    ) -> Result<usize, RemoteError> {
        if entries.is_empty() {
            return Err(RemoteError::NothingToSave);
        }

        let result = self
            .post_json("save", &BatchSaveRequest::new(info, entries))
            .await;

        match &result {
            Ok(_) => {
                log_info!("Saved {} fish to backend", entries.len());
            }
            Err(err) => {
                log_error!("Failed to save to backend: {err}");
            }
        }
        result.map(|_| entries.len())
    }

    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, RemoteError> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        ensure_success(response).await
    }
}

async fn ensure_success(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}
