//! Playback transport seam.
//!
//! The queue builder only ever talks to a [`Transport`]. A real player
//! implements it; [`InMemoryTransport`] keeps the queue in memory and backs
//! the command line tool and the tests.

use crate::foundation::database::WatchEndpoint;
use tracing::debug;

/// One playable entry of the transport queue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaItem {
    pub media_id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_text: Option<String>,
    pub album_id: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Cancels the auto-continuation mode, if any.
    fn stop_radio(&mut self);

    fn start_radio(&mut self, endpoint: WatchEndpoint);

    /// Replaces the whole queue and moves to `start_index`.
    fn set_media_items(&mut self, items: Vec<MediaItem>, start_index: usize);

    fn add_media_items(&mut self, items: Vec<MediaItem>);

    /// Inserts at `index`, clamped to the end of the queue.
    fn add_media_item_at(&mut self, index: usize, item: MediaItem);

    fn play(&mut self);

    fn current_index(&self) -> Option<usize>;

    fn item_at(&self, index: usize) -> Option<MediaItem>;

    fn item_count(&self) -> usize;

    /// Returns false when already at the last item.
    fn seek_to_next(&mut self) -> bool;

    /// Returns false when already at the first item.
    fn seek_to_previous(&mut self) -> bool;

    fn current_item(&self) -> Option<MediaItem> {
        self.current_index().and_then(|index| self.item_at(index))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTransport {
    items: Vec<MediaItem>,
    current: Option<usize>,
    playing: bool,
    radio: Option<WatchEndpoint>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn radio(&self) -> Option<&WatchEndpoint> {
        self.radio.as_ref()
    }
}

impl Transport for InMemoryTransport {
    fn stop_radio(&mut self) {
        if self.radio.take().is_some() {
            debug!("Radio stopped");
        }
    }

    fn start_radio(&mut self, endpoint: WatchEndpoint) {
        debug!(?endpoint, "Radio started");
        self.radio = Some(endpoint);
    }

    fn set_media_items(&mut self, items: Vec<MediaItem>, start_index: usize) {
        self.current = if items.is_empty() {
            None
        } else {
            Some(start_index.min(items.len() - 1))
        };
        self.items = items;
    }

    fn add_media_items(&mut self, items: Vec<MediaItem>) {
        if self.current.is_none() && !items.is_empty() {
            self.current = Some(self.items.len());
        }
        self.items.extend(items);
    }

    fn add_media_item_at(&mut self, index: usize, item: MediaItem) {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
        self.current = match self.current {
            Some(current) if index <= current => Some(current + 1),
            None => Some(index),
            current => current,
        };
    }

    fn play(&mut self) {
        self.playing = self.current.is_some();
    }

    fn current_index(&self) -> Option<usize> {
        self.current
    }

    fn item_at(&self, index: usize) -> Option<MediaItem> {
        self.items.get(index).cloned()
    }

    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn seek_to_next(&mut self) -> bool {
        match self.current {
            Some(current) if current + 1 < self.items.len() => {
                self.current = Some(current + 1);
                true
            }
            _ => false,
        }
    }

    fn seek_to_previous(&mut self) -> bool {
        match self.current {
            Some(current) if current > 0 => {
                self.current = Some(current - 1);
                true
            }
            _ => false,
        }
    }
}
