//! Cache reconciliation: serve cached entities while fresh, refetch when not.
//!
//! Freshness is binary. A record with a timestamp is served as-is; a missing
//! record or one without timestamp triggers one fetch whose result overwrites
//! the cached copy. Failed fetches are returned to the caller, never retried
//! here.

use crate::api_client::{parser, RemoteApi, SyncError};
use crate::foundation::database::{
    Album, Artist, ArtistInfo, Cached, Database, DetailedSong, Table,
};
use crate::foundation::utils::now_millis;
use futures::future;
use futures::stream::{Stream, StreamExt};
use std::future::Future;
use std::io;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An artist fetched together with its songs and discography.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistPage {
    pub artist: Artist,
    pub info: ArtistInfo,
}

#[derive(Clone)]
pub struct Reconciler {
    database: Database,
    api: Arc<dyn RemoteApi>,
}

impl Reconciler {
    pub fn new(database: Database, api: Arc<dyn RemoteApi>) -> Self {
        Self { database, api }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn api(&self) -> Arc<dyn RemoteApi> {
        self.api.clone()
    }

    /// The artist for `browse_id`, from cache when fresh, otherwise fetched
    /// and stored.
    pub async fn artist(&self, browse_id: &str) -> Result<Artist, SyncError> {
        match self.database.get_artist(browse_id)? {
            Some(artist) if artist.is_fresh() => {
                debug!(browse_id, "Serving cached artist");
                Ok(artist)
            }
            _ => self.refresh_artist(browse_id).await,
        }
    }

    /// Fetches the artist unconditionally and overwrites the cached copy.
    pub async fn refresh_artist(&self, browse_id: &str) -> Result<Artist, SyncError> {
        Ok(self.artist_page(browse_id).await?.artist)
    }

    /// One fetch yielding both the stored artist and its page listings.
    pub async fn artist_page(&self, browse_id: &str) -> Result<ArtistPage, SyncError> {
        let page = self
            .api
            .artist_browse(browse_id)
            .await
            .map_err(|e| log_fetch_failure(browse_id, e))?
            .ok_or_else(|| SyncError::not_found(browse_id))?;

        let artist = parser::parse_artist(browse_id, &page, now_millis())?;
        self.database.upsert_artist(&artist)?;
        info!(browse_id, name = %artist.name, "Artist refreshed");

        Ok(ArtistPage {
            artist,
            info: parser::parse_artist_info(browse_id, &page),
        })
    }

    /// Songs, albums and "see more" token of an artist. Always fetched; an
    /// unknown artist has an empty listing.
    pub async fn artist_info(&self, browse_id: &str) -> Result<ArtistInfo, SyncError> {
        match self
            .api
            .artist_browse(browse_id)
            .await
            .map_err(|e| log_fetch_failure(browse_id, e))?
        {
            Some(page) => Ok(parser::parse_artist_info(browse_id, &page)),
            None => {
                debug!(browse_id, "No artist listing");
                Ok(ArtistInfo::empty())
            }
        }
    }

    pub async fn album(&self, browse_id: &str) -> Result<Album, SyncError> {
        match self.database.get_album(browse_id)? {
            Some(album) if album.is_fresh() => {
                debug!(browse_id, "Serving cached album");
                Ok(album)
            }
            _ => self.refresh_album(browse_id).await,
        }
    }

    pub async fn refresh_album(&self, browse_id: &str) -> Result<Album, SyncError> {
        let page = self
            .api
            .album_browse(browse_id)
            .await
            .map_err(|e| log_fetch_failure(browse_id, e))?
            .ok_or_else(|| SyncError::not_found(browse_id))?;

        let album = parser::parse_album(browse_id, &page, now_millis())?;
        self.database.upsert_album(&album)?;
        info!(browse_id, "Album refreshed");
        Ok(album)
    }

    /// Tracks of an album in album order.
    pub async fn album_songs(&self, browse_id: &str) -> Result<Vec<DetailedSong>, SyncError> {
        Ok(self
            .api
            .album_browse(browse_id)
            .await
            .map_err(|e| log_fetch_failure(browse_id, e))?
            .map(|page| parser::parse_album_songs(browse_id, &page))
            .unwrap_or_default())
    }

    /// Tracks of a playlist page in playlist order.
    pub async fn playlist_songs(&self, browse_id: &str) -> Result<Vec<DetailedSong>, SyncError> {
        Ok(self
            .api
            .playlist_browse(browse_id)
            .await
            .map_err(|e| log_fetch_failure(browse_id, e))?
            .map(|page| parser::parse_playlist_songs(&page))
            .unwrap_or_default())
    }

    /// Reconciled artist as a stream: the value for the current cache state
    /// first, then again whenever the cached record changes.
    pub fn observe_artist(
        &self,
        browse_id: &str,
    ) -> impl Stream<Item = Result<Artist, SyncError>> + Send {
        let id = browse_id.to_string();
        self.observe(self.database.watch_artist(browse_id), move |this| {
            let id = id.clone();
            async move { this.refresh_artist(&id).await }
        })
    }

    pub fn observe_album(
        &self,
        browse_id: &str,
    ) -> impl Stream<Item = Result<Album, SyncError>> + Send {
        let id = browse_id.to_string();
        self.observe(self.database.watch_album(browse_id), move |this| {
            let id = id.clone();
            async move { this.refresh_album(&id).await }
        })
    }

    /// Makes observers of the artist re-evaluate, refetching if still stale.
    pub fn retry_artist(&self, browse_id: &str) {
        debug!(browse_id, "Retrying artist");
        self.database.notify(Table::Artists, browse_id);
    }

    pub fn retry_album(&self, browse_id: &str) {
        debug!(browse_id, "Retrying album");
        self.database.notify(Table::Albums, browse_id);
    }

    pub fn local_artist_songs(&self, browse_id: &str) -> io::Result<Vec<DetailedSong>> {
        self.database.songs_by_artist(browse_id)
    }

    pub fn observe_local_artist_songs(
        &self,
        browse_id: &str,
    ) -> impl Stream<Item = io::Result<Vec<DetailedSong>>> + Send {
        self.database.watch_songs_by_artist(browse_id)
    }

    /// Maps a stream of cached reads to reconciled values.
    ///
    /// Stale reads are refreshed on a spawned task: the fetch finishes and
    /// its upsert lands even if this stream is dropped meanwhile. The upsert
    /// re-triggers the read, which is then fresh and equal to what was just
    /// emitted, so consecutive equal values are suppressed.
    fn observe<T, S, G, Fut>(
        &self,
        cached: S,
        refresh: G,
    ) -> impl Stream<Item = Result<T, SyncError>> + Send
    where
        T: Cached + Clone + PartialEq + Send + 'static,
        S: Stream<Item = io::Result<Option<T>>> + Send + 'static,
        G: Fn(Reconciler) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, SyncError>> + Send + 'static,
    {
        let this = self.clone();
        let refresh = Arc::new(refresh);
        let mut last: Option<T> = None;

        cached
            .then(move |read| reconcile_read(read, this.clone(), refresh.clone()))
            .filter_map(move |outcome| {
                let emit = match outcome {
                    Ok(entity) => {
                        if last.as_ref() == Some(&entity) {
                            None
                        } else {
                            last = Some(entity.clone());
                            Some(Ok(entity))
                        }
                    }
                    Err(error) => {
                        last = None;
                        Some(Err(error))
                    }
                };
                future::ready(emit)
            })
    }
}

async fn reconcile_read<T, G, Fut>(
    read: io::Result<Option<T>>,
    this: Reconciler,
    refresh: Arc<G>,
) -> Result<T, SyncError>
where
    T: Cached + Send + 'static,
    G: Fn(Reconciler) -> Fut,
    Fut: Future<Output = Result<T, SyncError>> + Send + 'static,
{
    match read? {
        Some(entity) if entity.is_fresh() => {
            debug!(id = entity.id(), "Cached value is fresh");
            Ok(entity)
        }
        _ => tokio::spawn(refresh(this)).await?,
    }
}

fn log_fetch_failure(browse_id: &str, error: SyncError) -> SyncError {
    warn!(browse_id, kind = %error.kind(), error = %error, "Fetch failed");
    error
}
