//! Builds playback queues from cached records and submits them to a
//! [`Transport`].
//!
//! Input order is kept exactly and nothing is deduplicated. Replacing modes
//! stop the radio before touching the queue so the transport cannot append
//! stale continuation items afterwards.

use crate::api_client::{parser, RemoteApi, SyncError};
use crate::foundation::database::{Artist, DetailedSong, Song, WatchEndpoint};
use crate::process::transport::{MediaItem, Transport};
use rand::seq::SliceRandom;
use std::{error, fmt};
use tracing::{debug, info};

/// Pure mapping from a record to a playable item.
pub trait AsMediaItem {
    fn as_media_item(&self) -> MediaItem;
}

impl AsMediaItem for DetailedSong {
    fn as_media_item(&self) -> MediaItem {
        MediaItem {
            media_id: self.id.clone(),
            title: self.title.clone(),
            artist: self.artists_text.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            duration_text: self.duration_text.clone(),
            album_id: self.album_id.clone(),
        }
    }
}

impl AsMediaItem for Song {
    fn as_media_item(&self) -> MediaItem {
        MediaItem {
            media_id: self.id.clone(),
            title: self.title.clone(),
            artist: self.artists_text.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            duration_text: self.duration_text.clone(),
            album_id: self.album_id.clone(),
        }
    }
}

impl AsMediaItem for MediaItem {
    fn as_media_item(&self) -> MediaItem {
        self.clone()
    }
}

#[derive(Debug)]
pub enum QueueError {
    Empty,
    IndexOutOfRange { index: usize, len: usize },
    Sync(SyncError),
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueueError::Empty => write!(f, "Nothing to play"),
            QueueError::IndexOutOfRange { index, len } => {
                write!(f, "Start index {} is out of range for {} items", index, len)
            }
            QueueError::Sync(e) => write!(f, "Unable to load queue: {}", e),
        }
    }
}

impl error::Error for QueueError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            QueueError::Sync(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SyncError> for QueueError {
    fn from(err: SyncError) -> Self {
        QueueError::Sync(err)
    }
}

pub struct QueueBuilder<T: Transport> {
    transport: T,
}

impl<T: Transport> QueueBuilder<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Replaces the queue with `items` and plays from `start_index`.
    ///
    /// The radio is stopped before the queue is replaced. Empty input or an
    /// out-of-range index is rejected before anything on the transport
    /// changes.
    ///
    /// # Examples
    ///
    /// ```
    /// use vimusync::process::{InMemoryTransport, MediaItem, QueueBuilder, Transport};
    ///
    /// let items: Vec<MediaItem> = ["A", "B", "C"]
    ///     .iter()
    ///     .map(|id| MediaItem { media_id: id.to_string(), ..Default::default() })
    ///     .collect();
    ///
    /// let mut queue = QueueBuilder::new(InMemoryTransport::new());
    /// queue.force_play_at_index(&items, 1).unwrap();
    /// assert_eq!(queue.transport().current_index(), Some(1));
    /// ```
    pub fn force_play_at_index<I: AsMediaItem>(
        &mut self,
        items: &[I],
        start_index: usize,
    ) -> Result<(), QueueError> {
        if items.is_empty() {
            return Err(QueueError::Empty);
        }
        if start_index >= items.len() {
            return Err(QueueError::IndexOutOfRange {
                index: start_index,
                len: items.len(),
            });
        }

        self.transport.stop_radio();
        self.transport
            .set_media_items(items.iter().map(AsMediaItem::as_media_item).collect(), start_index);
        self.transport.play();
        debug!(count = items.len(), start_index, "Queue replaced");
        Ok(())
    }

    pub fn force_play_from_beginning<I: AsMediaItem>(&mut self, items: &[I]) -> Result<(), QueueError> {
        self.force_play_at_index(items, 0)
    }

    /// Appends `items` after the last queued item. The current item is kept.
    pub fn enqueue<I: AsMediaItem>(&mut self, items: &[I]) {
        if items.is_empty() {
            return;
        }
        self.transport
            .add_media_items(items.iter().map(AsMediaItem::as_media_item).collect());
        debug!(count = items.len(), "Items enqueued");
    }

    /// Inserts `item` right after the current item, or at the end of an idle queue.
    pub fn add_next<I: AsMediaItem>(&mut self, item: &I) {
        let index = self
            .transport
            .current_index()
            .map(|current| current + 1)
            .unwrap_or_else(|| self.transport.item_count());
        self.transport.add_media_item_at(index, item.as_media_item());
    }

    /// Plays `songs` in random order from the first one.
    pub fn shuffle_all<I: AsMediaItem>(&mut self, songs: &[I]) -> Result<(), QueueError> {
        let mut items: Vec<MediaItem> = songs.iter().map(AsMediaItem::as_media_item).collect();
        items.shuffle(&mut rand::rng());
        self.force_play_from_beginning(&items)
    }

    /// Loads the watch-next queue for `endpoint`, plays it and leaves the
    /// radio running on that endpoint.
    pub async fn play_radio(
        &mut self,
        api: &dyn RemoteApi,
        endpoint: &WatchEndpoint,
    ) -> Result<usize, QueueError> {
        if endpoint.is_empty() {
            return Err(QueueError::Empty);
        }

        let songs = api
            .watch_next(endpoint)
            .await?
            .map(|next| parser::parse_queue(&next))
            .unwrap_or_default();

        self.force_play_from_beginning(&songs)?;
        self.transport.start_radio(endpoint.clone());
        info!(count = songs.len(), "Radio queue started");
        Ok(songs.len())
    }

    /// Plays the remote shuffle mix of `artist`, seeded by its shuffle button.
    pub async fn shuffle_artist(
        &mut self,
        api: &dyn RemoteApi,
        artist: &Artist,
    ) -> Result<usize, QueueError> {
        self.play_radio(api, &artist.shuffle_endpoint()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::payload::NextResponse;
    use crate::api_client::MockRemoteApi;
    use crate::process::transport::{InMemoryTransport, MockTransport};
    use mockall::Sequence;
    use serde_json::json;

    fn song(id: &str) -> DetailedSong {
        DetailedSong {
            id: id.to_string(),
            title: Some(format!("Title {}", id)),
            ..Default::default()
        }
    }

    fn songs(ids: &[&str]) -> Vec<DetailedSong> {
        ids.iter().map(|id| song(id)).collect()
    }

    fn queued(builder: &QueueBuilder<InMemoryTransport>) -> Vec<String> {
        builder
            .transport()
            .items()
            .iter()
            .map(|i| i.media_id.clone())
            .collect()
    }

    fn radio_endpoint() -> WatchEndpoint {
        WatchEndpoint {
            video_id: Some("seed".to_string()),
            playlist_id: Some("RDAMVMseed".to_string()),
            params: None,
        }
    }

    #[test]
    fn test_play_at_index_replaces_queue_and_stops_radio() {
        let mut builder = QueueBuilder::new(InMemoryTransport::new());
        builder.transport_mut().start_radio(radio_endpoint());
        builder.transport_mut().set_media_items(vec![song("old").as_media_item()], 0);

        builder.force_play_at_index(&songs(&["A", "B", "C"]), 1).unwrap();

        assert_eq!(queued(&builder), vec!["A", "B", "C"]);
        let current = builder.transport().current_item().unwrap();
        assert_eq!(current.media_id, "B");
        assert!(builder.transport().radio().is_none());
        assert!(builder.transport().is_playing());
    }

    #[test]
    fn test_play_from_beginning_starts_at_first() {
        let mut builder = QueueBuilder::new(InMemoryTransport::new());
        builder.force_play_from_beginning(&songs(&["A", "B"])).unwrap();
        assert_eq!(builder.transport().current_index(), Some(0));
    }

    #[test]
    fn test_out_of_range_index_leaves_transport_untouched() {
        let mut builder = QueueBuilder::new(InMemoryTransport::new());
        builder.transport_mut().start_radio(radio_endpoint());

        let result = builder.force_play_at_index(&songs(&["A", "B"]), 2);

        assert!(matches!(
            result,
            Err(QueueError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(builder.transport().radio().is_some());
        assert_eq!(builder.transport().item_count(), 0);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let mut builder = QueueBuilder::new(InMemoryTransport::new());
        let nothing: Vec<DetailedSong> = Vec::new();
        assert!(matches!(
            builder.force_play_from_beginning(&nothing),
            Err(QueueError::Empty)
        ));
    }

    #[test]
    fn test_enqueue_appends_and_keeps_current() {
        let mut builder = QueueBuilder::new(InMemoryTransport::new());
        builder.force_play_at_index(&songs(&["X", "Y"]), 1).unwrap();

        builder.enqueue(&songs(&["Z"]));

        assert_eq!(queued(&builder), vec!["X", "Y", "Z"]);
        assert_eq!(builder.transport().current_item().unwrap().media_id, "Y");
    }

    #[test]
    fn test_duplicates_are_kept_in_order() {
        let mut builder = QueueBuilder::new(InMemoryTransport::new());
        builder.force_play_from_beginning(&songs(&["A", "A", "B"])).unwrap();
        assert_eq!(queued(&builder), vec!["A", "A", "B"]);
    }

    #[test]
    fn test_add_next_inserts_after_current() {
        let mut builder = QueueBuilder::new(InMemoryTransport::new());
        builder.force_play_at_index(&songs(&["A", "B", "C"]), 0).unwrap();

        builder.add_next(&song("N"));

        assert_eq!(queued(&builder), vec!["A", "N", "B", "C"]);
        assert_eq!(builder.transport().current_index(), Some(0));
    }

    #[test]
    fn test_shuffle_all_keeps_every_item() {
        let mut builder = QueueBuilder::new(InMemoryTransport::new());
        builder.shuffle_all(&songs(&["A", "B", "C", "D"])).unwrap();

        let mut ids = queued(&builder);
        ids.sort();
        assert_eq!(ids, vec!["A", "B", "C", "D"]);
        assert_eq!(builder.transport().current_index(), Some(0));
    }

    #[test]
    fn test_song_maps_to_media_item() {
        let stored = Song {
            id: "s1".to_string(),
            title: Some("Stored".to_string()),
            artists_text: Some("Band".to_string()),
            duration_text: Some("2:00".to_string()),
            ..Default::default()
        };
        let item = stored.as_media_item();
        assert_eq!(item.media_id, "s1");
        assert_eq!(item.artist.as_deref(), Some("Band"));
        assert_eq!(item.duration_text.as_deref(), Some("2:00"));
    }

    fn replacing_transport(len: usize, start: usize) -> MockTransport {
        let mut transport = MockTransport::new();
        let mut seq = Sequence::new();
        transport
            .expect_stop_radio()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        transport
            .expect_set_media_items()
            .withf(move |items, start_index| items.len() == len && *start_index == start)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        transport
            .expect_play()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        transport
    }

    #[test]
    fn test_play_at_index_stops_radio_before_replacing() {
        let mut builder = QueueBuilder::new(replacing_transport(3, 1));
        builder.force_play_at_index(&songs(&["A", "B", "C"]), 1).unwrap();
    }

    #[test]
    fn test_play_from_beginning_stops_radio_before_replacing() {
        let mut builder = QueueBuilder::new(replacing_transport(2, 0));
        builder.force_play_from_beginning(&songs(&["A", "B"])).unwrap();
    }

    #[test]
    fn test_enqueue_never_stops_radio() {
        let mut transport = MockTransport::new();
        transport.expect_stop_radio().never();
        transport.expect_set_media_items().never();
        transport
            .expect_add_media_items()
            .withf(|items| items.len() == 1 && items[0].media_id == "Z")
            .times(1)
            .return_const(());

        let mut builder = QueueBuilder::new(transport);
        builder.enqueue(&songs(&["Z"]));
    }

    #[test]
    fn test_rejected_index_touches_nothing() {
        let mut transport = MockTransport::new();
        transport.expect_stop_radio().never();
        transport.expect_set_media_items().never();

        let mut builder = QueueBuilder::new(transport);
        assert!(builder.force_play_at_index(&songs(&["A"]), 1).is_err());
    }

    #[tokio::test]
    async fn test_shuffle_artist_seeds_radio_with_shuffle_button() {
        let artist = Artist {
            id: "UC1".to_string(),
            name: "Band".to_string(),
            thumbnail_url: None,
            info: None,
            shuffle_video_id: Some("shuffle-v".to_string()),
            shuffle_playlist_id: Some("shuffle-p".to_string()),
            radio_video_id: Some("radio-v".to_string()),
            radio_playlist_id: Some("radio-p".to_string()),
            timestamp: Some(1),
        };
        let mut api = MockRemoteApi::new();
        api.expect_watch_next().times(1).returning(|endpoint| {
            assert_eq!(endpoint.video_id.as_deref(), Some("shuffle-v"));
            assert_eq!(endpoint.playlist_id.as_deref(), Some("shuffle-p"));
            Ok(Some(serde_json::from_value(json!({
                "contents": {"singleColumnMusicWatchNextResultsRenderer": {"tabbedRenderer": {
                    "watchNextTabbedResultsRenderer": {"tabs": [{"tabRenderer": {"content": {
                        "musicQueueRenderer": {"content": {"playlistPanelRenderer": {"contents": [
                            {"playlistPanelVideoRenderer": {"videoId": "s1"}}
                        ]}}}
                    }}}]}
                }}}
            }))
            .unwrap()))
        });

        let mut builder = QueueBuilder::new(InMemoryTransport::new());
        builder.shuffle_artist(&api, &artist).await.unwrap();

        assert_eq!(queued(&builder), vec!["s1"]);
        assert_eq!(builder.transport().radio(), Some(&artist.shuffle_endpoint()));
    }

    #[tokio::test]
    async fn test_play_radio_plays_queue_and_starts_radio() {
        let mut api = MockRemoteApi::new();
        api.expect_watch_next().times(1).returning(|_| {
            let next: NextResponse = serde_json::from_value(json!({
                "contents": {"singleColumnMusicWatchNextResultsRenderer": {"tabbedRenderer": {
                    "watchNextTabbedResultsRenderer": {"tabs": [{"tabRenderer": {"content": {
                        "musicQueueRenderer": {"content": {"playlistPanelRenderer": {"contents": [
                            {"playlistPanelVideoRenderer": {"videoId": "r1", "title": {"runs": [{"text": "One"}]}}},
                            {"playlistPanelVideoRenderer": {"videoId": "r2", "title": {"runs": [{"text": "Two"}]}}}
                        ]}}}
                    }}}]}
                }}}
            }))
            .unwrap();
            Ok(Some(next))
        });

        let mut builder = QueueBuilder::new(InMemoryTransport::new());
        let count = builder.play_radio(&api, &radio_endpoint()).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(queued(&builder), vec!["r1", "r2"]);
        assert_eq!(builder.transport().radio(), Some(&radio_endpoint()));
    }

    #[tokio::test]
    async fn test_play_radio_with_nothing_to_play_fails() {
        let mut api = MockRemoteApi::new();
        api.expect_watch_next().returning(|_| Ok(None));

        let mut builder = QueueBuilder::new(InMemoryTransport::new());
        let result = builder.play_radio(&api, &radio_endpoint()).await;
        assert!(matches!(result, Err(QueueError::Empty)));
    }
}
