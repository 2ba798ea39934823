//! Shared music links: what they point at and how they become a queue.

use crate::api_client::{parser, SyncError};
use crate::foundation::database::{DetailedSong, Playlist, Song, SongPlaylistMap, WatchEndpoint};
use crate::process::queue::{QueueBuilder, QueueError};
use crate::process::reconcile::Reconciler;
use crate::process::transport::Transport;
use tracing::{debug, info};
use url::Url;

const ALBUM_QUEUE_PREFIX: &str = "OLAK5uy_";
const SHORT_LINK_HOST: &str = "youtu.be";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentTarget {
    /// Insert one video right after the current item.
    AddNext { video_id: String },
    /// Album queue, played through watch-next.
    Queue { playlist_id: String },
    Playlist { browse_id: String },
    Video { video_id: String },
    Search { query: String },
}

fn query_value(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// Resolves a music share link.
///
/// # Examples
///
/// ```
/// use vimusync::process::{resolve_intent, IntentTarget};
///
/// let target = resolve_intent("https://music.youtube.com/watch?v=abc").unwrap();
/// assert_eq!(target, IntentTarget::Video { video_id: "abc".to_string() });
/// ```
pub fn resolve_intent(uri: &str) -> Result<IntentTarget, SyncError> {
    let url = Url::parse(uri).map_err(|_| SyncError::MissingParameters(uri.to_string()))?;
    let video = query_value(&url, "v");

    if url.path() == "/next" {
        if let Some(video_id) = video {
            return Ok(IntentTarget::AddNext { video_id });
        }
    } else if let Some(list) = query_value(&url, "list") {
        return Ok(if list.starts_with(ALBUM_QUEUE_PREFIX) {
            IntentTarget::Queue { playlist_id: list }
        } else {
            IntentTarget::Playlist {
                browse_id: format!("VL{}", list),
            }
        });
    } else if let Some(video_id) = video {
        return Ok(IntentTarget::Video { video_id });
    } else if url.host_str() == Some(SHORT_LINK_HOST) {
        let video_id = url.path().trim_start_matches('/');
        if !video_id.is_empty() {
            return Ok(IntentTarget::Video {
                video_id: video_id.to_string(),
            });
        }
    } else if url.path() == "/search" {
        if let Some(query) = query_value(&url, "q") {
            return Ok(IntentTarget::Search { query });
        }
    }

    Err(SyncError::MissingParameters(uri.to_string()))
}

/// Turns resolved links into songs, and song lists into local playlists.
pub struct IntentLoader {
    reconciler: Reconciler,
}

impl IntentLoader {
    pub fn new(reconciler: Reconciler) -> Self {
        Self { reconciler }
    }

    /// The songs behind `target`, in play order. Unknown targets and
    /// searches yield no songs.
    pub async fn load(&self, target: &IntentTarget) -> Result<Vec<DetailedSong>, SyncError> {
        match target {
            IntentTarget::AddNext { video_id } | IntentTarget::Video { video_id } => {
                self.single_song(video_id).await
            }
            IntentTarget::Queue { playlist_id } => {
                self.watch_next(None, Some(playlist_id.as_str())).await
            }
            IntentTarget::Playlist { browse_id } => self.reconciler.playlist_songs(browse_id).await,
            IntentTarget::Search { query } => {
                debug!(query, "Search links are not loaded");
                Ok(Vec::new())
            }
        }
    }

    /// Just the linked video, without the related tracks watch-next appends.
    async fn single_song(&self, video_id: &str) -> Result<Vec<DetailedSong>, SyncError> {
        let songs = self.watch_next(Some(video_id), None).await?;
        Ok(songs
            .iter()
            .find(|song| song.id == video_id)
            .or_else(|| songs.first())
            .cloned()
            .into_iter()
            .collect())
    }

    async fn watch_next(
        &self,
        video_id: Option<&str>,
        playlist_id: Option<&str>,
    ) -> Result<Vec<DetailedSong>, SyncError> {
        let endpoint = WatchEndpoint {
            video_id: video_id.map(str::to_string),
            playlist_id: playlist_id.map(str::to_string),
            params: None,
        };
        Ok(self
            .reconciler
            .api()
            .watch_next(&endpoint)
            .await?
            .map(|next| parser::parse_queue(&next))
            .unwrap_or_default())
    }

    /// Stores `songs` as a new local playlist named `name`, in the given order.
    pub fn import_as_playlist(&self, name: &str, songs: &[DetailedSong]) -> Result<Playlist, SyncError> {
        let database = self.reconciler.database();
        let playlist = database.insert_playlist(name)?;

        for (position, song) in songs.iter().enumerate() {
            database.upsert_song(&Song::from_detailed(song))?;
            database.insert_song_playlist_map(&SongPlaylistMap {
                song_id: song.id.clone(),
                playlist_id: playlist.id,
                position,
            })?;
        }

        info!(name, id = playlist.id, count = songs.len(), "Playlist imported");
        Ok(playlist)
    }
}

/// Submits the songs loaded for `target` to the queue: add-next links insert
/// after the current item, everything else replaces the queue.
pub fn apply_intent<T: Transport>(
    queue: &mut QueueBuilder<T>,
    target: &IntentTarget,
    songs: &[DetailedSong],
) -> Result<(), QueueError> {
    match target {
        IntentTarget::AddNext { .. } => {
            let song = songs.first().ok_or(QueueError::Empty)?;
            queue.transport_mut().stop_radio();
            queue.add_next(song);
            Ok(())
        }
        IntentTarget::Search { .. } => Ok(()),
        _ => queue.force_play_from_beginning(songs),
    }
}
