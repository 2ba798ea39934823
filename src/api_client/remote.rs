//! Remote music metadata API.
//!
//! [`RemoteApi`] is the seam the rest of the crate depends on; [`InnertubeClient`]
//! talks to the real service by POSTing a client context plus the target id.

use crate::api_client::payload::{BrowseResponse, NextResponse};
use crate::api_client::SyncError;
use crate::configuration::ApiSettings;
use crate::foundation::database::WatchEndpoint;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Artist page for `browse_id`. `None` when the remote has nothing for it.
    async fn artist_browse(&self, browse_id: &str) -> Result<Option<BrowseResponse>, SyncError>;

    /// Album page for `browse_id`. `None` when the remote has nothing for it.
    async fn album_browse(&self, browse_id: &str) -> Result<Option<BrowseResponse>, SyncError>;

    /// Playlist page for `browse_id` (`VL`-prefixed). `None` when the remote has nothing for it.
    async fn playlist_browse(&self, browse_id: &str) -> Result<Option<BrowseResponse>, SyncError>;

    /// Queue seeded by a video and/or playlist.
    async fn watch_next(&self, endpoint: &WatchEndpoint) -> Result<Option<NextResponse>, SyncError>;
}

pub struct InnertubeClient {
    client: Client,
    settings: ApiSettings,
}

impl InnertubeClient {
    pub fn new(settings: ApiSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn context(&self) -> Value {
        json!({
            "client": {
                "clientName": self.settings.client_name,
                "clientVersion": self.settings.client_version,
                "hl": self.settings.language,
            }
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}?key={}&prettyPrint=false",
            self.settings.base_url.trim_end_matches('/'),
            endpoint,
            self.settings.api_key
        )
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        mut body: Map<String, Value>,
    ) -> Result<Option<T>, SyncError> {
        body.insert("context".to_string(), self.context());
        let url = self.url(endpoint);
        debug!(endpoint, "API request started");

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!(endpoint, "API returned not found");
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(endpoint, status = status.as_u16(), "API request failed");
            return Err(SyncError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        let parsed = serde_json::from_str::<T>(&text)?;
        debug!(endpoint, bytes = text.len(), "API request successful");
        Ok(Some(parsed))
    }

    async fn browse(&self, browse_id: &str) -> Result<Option<BrowseResponse>, SyncError> {
        let mut body = Map::new();
        body.insert("browseId".to_string(), Value::from(browse_id));
        let response: Option<BrowseResponse> = self.post("browse", body).await?;
        // A page without header or contents is how the remote says "no such id".
        Ok(response.filter(|page| page.header.is_some() || page.contents.is_some()))
    }
}

#[async_trait]
impl RemoteApi for InnertubeClient {
    async fn artist_browse(&self, browse_id: &str) -> Result<Option<BrowseResponse>, SyncError> {
        self.browse(browse_id).await
    }

    async fn album_browse(&self, browse_id: &str) -> Result<Option<BrowseResponse>, SyncError> {
        self.browse(browse_id).await
    }

    async fn playlist_browse(&self, browse_id: &str) -> Result<Option<BrowseResponse>, SyncError> {
        self.browse(browse_id).await
    }

    async fn watch_next(&self, endpoint: &WatchEndpoint) -> Result<Option<NextResponse>, SyncError> {
        let mut body = Map::new();
        if let Some(video_id) = &endpoint.video_id {
            body.insert("videoId".to_string(), Value::from(video_id.as_str()));
        }
        if let Some(playlist_id) = &endpoint.playlist_id {
            body.insert("playlistId".to_string(), Value::from(playlist_id.as_str()));
        }
        if let Some(params) = &endpoint.params {
            body.insert("params".to_string(), Value::from(params.as_str()));
        }
        body.insert("isAudioOnly".to_string(), Value::from(true));

        let response: Option<NextResponse> = self.post("next", body).await?;
        Ok(response.filter(|next| next.contents.is_some()))
    }
}
