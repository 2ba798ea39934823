use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A watch endpoint seed: the pair the remote uses to start a queue or a radio.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct WatchEndpoint {
    pub video_id: Option<String>,
    pub playlist_id: Option<String>,
    pub params: Option<String>,
}

impl WatchEndpoint {
    pub fn is_empty(&self) -> bool {
        self.video_id.is_none() && self.playlist_id.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub thumbnail_url: Option<String>,
    pub info: Option<String>,
    pub shuffle_video_id: Option<String>,
    pub shuffle_playlist_id: Option<String>,
    pub radio_video_id: Option<String>,
    pub radio_playlist_id: Option<String>,
    /// Milliseconds since the Unix epoch of the last successful fetch.
    pub timestamp: Option<u64>,
}

impl Artist {
    pub fn shuffle_endpoint(&self) -> WatchEndpoint {
        WatchEndpoint {
            video_id: self.shuffle_video_id.clone(),
            playlist_id: self.shuffle_playlist_id.clone(),
            params: None,
        }
    }

    /// The radio seed. Artists without a dedicated radio video start from the
    /// shuffle video instead.
    pub fn radio_endpoint(&self) -> WatchEndpoint {
        WatchEndpoint {
            video_id: self
                .radio_video_id
                .clone()
                .or_else(|| self.shuffle_video_id.clone()),
            playlist_id: self.radio_playlist_id.clone(),
            params: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub year: Option<String>,
    pub authors_text: Option<String>,
    pub share_url: Option<String>,
    pub timestamp: Option<u64>,
    pub item_count: Option<String>,
    pub length: Option<String>,
}

/// A reference to an artist as it appears next to a track.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Info {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct DetailedSong {
    pub id: String,
    pub title: Option<String>,
    pub artists_text: Option<String>,
    /// `None` when the source payload carries no length, as artist pages don't.
    pub duration_text: Option<String>,
    pub thumbnail_url: Option<String>,
    pub album_id: Option<String>,
    pub artists: Vec<Info>,
}

/// A locally known track.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Song {
    pub id: String,
    pub title: Option<String>,
    pub artists_text: Option<String>,
    pub duration_text: Option<String>,
    pub thumbnail_url: Option<String>,
    pub album_id: Option<String>,
    pub artists: Vec<Info>,
    pub total_play_time_ms: u64,
    pub inserted_at: u64,
}

impl Song {
    pub fn from_detailed(song: &DetailedSong) -> Self {
        Self {
            id: song.id.clone(),
            title: song.title.clone(),
            artists_text: song.artists_text.clone(),
            duration_text: song.duration_text.clone(),
            thumbnail_url: song.thumbnail_url.clone(),
            album_id: song.album_id.clone(),
            artists: song.artists.clone(),
            total_play_time_ms: 0,
            inserted_at: 0,
        }
    }

    pub fn is_by(&self, artist_id: &str) -> bool {
        self.artists.iter().any(|artist| artist.id == artist_id)
    }

    pub fn to_detailed(&self) -> DetailedSong {
        DetailedSong {
            id: self.id.clone(),
            title: self.title.clone(),
            artists_text: self.artists_text.clone(),
            duration_text: self.duration_text.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            album_id: self.album_id.clone(),
            artists: self.artists.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SongPlaylistMap {
    pub song_id: String,
    pub playlist_id: u64,
    pub position: usize,
}

/// Opaque token for the next page of a listing. Empty means there is none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Browse id of the playlist behind the token, if any.
    pub fn playlist_browse_id(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(format!("VL{}", self.0))
        }
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Songs and discography of an artist as returned by one fetch.
///
/// Both lists are frozen at construction; clones share the same storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistInfo {
    songs: Arc<[DetailedSong]>,
    albums: Arc<[Album]>,
    see_more_songs: ContinuationToken,
}

impl ArtistInfo {
    pub fn new(
        songs: Vec<DetailedSong>,
        albums: Vec<Album>,
        see_more_songs: ContinuationToken,
    ) -> Self {
        Self {
            songs: songs.into(),
            albums: albums.into(),
            see_more_songs,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), ContinuationToken::empty())
    }

    pub fn songs(&self) -> &[DetailedSong] {
        &self.songs
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn see_more_songs(&self) -> &ContinuationToken {
        &self.see_more_songs
    }
}

/// Records whose cached copy may be stale.
pub trait Cached {
    fn id(&self) -> &str;
    fn timestamp(&self) -> Option<u64>;

    fn is_fresh(&self) -> bool {
        self.timestamp().is_some()
    }
}

impl Cached for Artist {
    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }
}

impl Cached for Album {
    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artist() -> Artist {
        Artist {
            id: "UC1".to_string(),
            name: "Artist".to_string(),
            thumbnail_url: None,
            info: None,
            shuffle_video_id: Some("shuffle-video".to_string()),
            shuffle_playlist_id: Some("shuffle-list".to_string()),
            radio_video_id: None,
            radio_playlist_id: Some("radio-list".to_string()),
            timestamp: None,
        }
    }

    #[test]
    fn test_radio_endpoint_falls_back_to_shuffle_video() {
        let endpoint = artist().radio_endpoint();
        assert_eq!(endpoint.video_id.as_deref(), Some("shuffle-video"));
        assert_eq!(endpoint.playlist_id.as_deref(), Some("radio-list"));
    }

    #[test]
    fn test_freshness_follows_timestamp() {
        let mut artist = artist();
        assert!(!artist.is_fresh());
        artist.timestamp = Some(1);
        assert!(artist.is_fresh());
    }

    #[test]
    fn test_continuation_token_browse_id() {
        assert_eq!(ContinuationToken::empty().playlist_browse_id(), None);
        assert_eq!(
            ContinuationToken::new("PL123").playlist_browse_id(),
            Some("VLPL123".to_string())
        );
    }

    #[test]
    fn test_artist_info_clones_share_lists() {
        let info = ArtistInfo::new(Vec::new(), Vec::new(), ContinuationToken::empty());
        let copy = info.clone();
        assert!(std::ptr::eq(info.songs().as_ptr(), copy.songs().as_ptr()));
    }
}
