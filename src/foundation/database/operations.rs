use crate::foundation::database::{
    Album, Artist, DetailedSong, Playlist, Song, SongPlaylistMap,
};
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::{Db, Tree};
use std::io;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const CHANGE_BUS_CAPACITY: usize = 256;

/// Entity tables, one sled tree each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Artists,
    Albums,
    Songs,
    Playlists,
    SongPlaylistMaps,
}

impl Table {
    fn tree_name(self) -> &'static str {
        match self {
            Table::Artists => "artists",
            Table::Albums => "albums",
            Table::Songs => "songs",
            Table::Playlists => "playlists",
            Table::SongPlaylistMaps => "song_playlist_maps",
        }
    }
}

/// A write to `key` in `table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub table: Table,
    pub key: String,
}

/// The local store: a keyed upsert/query layer over sled with a change bus
/// that reactive reads subscribe to.
#[derive(Clone)]
pub struct Database {
    db: Db,
    changes: broadcast::Sender<Change>,
}

fn storage_error(e: impl ToString) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

/// Opens a database at the specified path.
///
/// This function creates a new database or opens an existing one at the given path.
/// Errors are converted to standard IO errors for easier handling.
///
/// # Examples
///
/// ```no_run
/// use vimusync::open_database;
/// let db = open_database("/path/to/my/database")?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn open_database(path: &str) -> io::Result<Database> {
    let db = sled::open(path).map_err(storage_error)?;
    Ok(Database::from_db(db))
}

impl Database {
    pub fn from_db(db: Db) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUS_CAPACITY);
        Self { db, changes }
    }

    /// A throwaway database that disappears when dropped.
    pub fn temporary() -> io::Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(storage_error)?;
        Ok(Self::from_db(db))
    }

    fn tree(&self, table: Table) -> io::Result<Tree> {
        self.db.open_tree(table.tree_name()).map_err(storage_error)
    }

    fn read<T: DeserializeOwned>(&self, table: Table, key: &str) -> io::Result<Option<T>> {
        self.tree(table)?
            .get(key.as_bytes())
            .map_err(storage_error)?
            .map(|ivec| bincode::deserialize(&ivec).map_err(storage_error))
            .transpose()
    }

    fn read_all<T: DeserializeOwned>(&self, table: Table) -> io::Result<Vec<T>> {
        self.tree(table)?
            .iter()
            .values()
            .map(|value| {
                let ivec = value.map_err(storage_error)?;
                bincode::deserialize(&ivec).map_err(storage_error)
            })
            .collect()
    }

    /// Overwrites whatever is stored under `key`. No field merging.
    fn write<T: Serialize>(&self, table: Table, key: &str, value: &T) -> io::Result<()> {
        let serialized = bincode::serialize(value).map_err(storage_error)?;
        self.tree(table)?
            .insert(key.as_bytes(), serialized)
            .map_err(storage_error)?;
        self.notify(table, key);
        Ok(())
    }

    /// Publishes a change for `key` without writing, making observers re-read.
    pub fn notify(&self, table: Table, key: &str) {
        // No receivers is fine: nobody is observing.
        let _ = self.changes.send(Change {
            table,
            key: key.to_string(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }

    pub fn get_artist(&self, id: &str) -> io::Result<Option<Artist>> {
        self.read(Table::Artists, id)
    }

    pub fn upsert_artist(&self, artist: &Artist) -> io::Result<()> {
        debug!(artist_id = %artist.id, "Upserting artist");
        self.write(Table::Artists, &artist.id, artist)
    }

    pub fn watch_artist(&self, id: &str) -> impl Stream<Item = io::Result<Option<Artist>>> + Send {
        let id = id.to_string();
        let key = id.clone();
        self.observe(
            move |db| db.get_artist(&id),
            move |change| change.table == Table::Artists && change.key == key,
        )
    }

    pub fn get_album(&self, id: &str) -> io::Result<Option<Album>> {
        self.read(Table::Albums, id)
    }

    pub fn upsert_album(&self, album: &Album) -> io::Result<()> {
        debug!(album_id = %album.id, "Upserting album");
        self.write(Table::Albums, &album.id, album)
    }

    pub fn watch_album(&self, id: &str) -> impl Stream<Item = io::Result<Option<Album>>> + Send {
        let id = id.to_string();
        let key = id.clone();
        self.observe(
            move |db| db.get_album(&id),
            move |change| change.table == Table::Albums && change.key == key,
        )
    }

    pub fn get_song(&self, id: &str) -> io::Result<Option<Song>> {
        self.read(Table::Songs, id)
    }

    /// Stores a song. A song seen for the first time gets a fresh insertion
    /// sequence number; a known one keeps its number and play time.
    pub fn upsert_song(&self, song: &Song) -> io::Result<()> {
        let mut song = song.clone();
        match self.get_song(&song.id)? {
            Some(existing) => {
                song.inserted_at = existing.inserted_at;
                song.total_play_time_ms = song.total_play_time_ms.max(existing.total_play_time_ms);
            }
            None => song.inserted_at = self.db.generate_id().map_err(storage_error)?,
        }
        self.write(Table::Songs, &song.id.clone(), &song)
    }

    /// Local songs credited to `artist_id`, most recently inserted first.
    pub fn songs_by_artist(&self, artist_id: &str) -> io::Result<Vec<DetailedSong>> {
        let mut songs: Vec<Song> = self
            .read_all::<Song>(Table::Songs)?
            .into_iter()
            .filter(|song| song.is_by(artist_id))
            .collect();
        songs.sort_by(|a, b| b.inserted_at.cmp(&a.inserted_at));
        Ok(songs.iter().map(Song::to_detailed).collect())
    }

    pub fn watch_songs_by_artist(
        &self,
        artist_id: &str,
    ) -> impl Stream<Item = io::Result<Vec<DetailedSong>>> + Send {
        let artist_id = artist_id.to_string();
        self.observe(
            move |db| db.songs_by_artist(&artist_id),
            |change| change.table == Table::Songs,
        )
    }

    pub fn insert_playlist(&self, name: &str) -> io::Result<Playlist> {
        let playlist = Playlist {
            id: self.db.generate_id().map_err(storage_error)?,
            name: name.to_string(),
        };
        self.write(Table::Playlists, &playlist.id.to_string(), &playlist)?;
        Ok(playlist)
    }

    pub fn get_playlist(&self, id: u64) -> io::Result<Option<Playlist>> {
        self.read(Table::Playlists, &id.to_string())
    }

    pub fn insert_song_playlist_map(&self, map: &SongPlaylistMap) -> io::Result<()> {
        // Zero-padded position keeps a playlist's entries in order in the tree.
        let key = format!("{:020}/{:010}", map.playlist_id, map.position);
        self.write(Table::SongPlaylistMaps, &key, map)
    }

    /// Songs of a playlist in position order. Maps to unknown songs are skipped.
    pub fn playlist_songs(&self, playlist_id: u64) -> io::Result<Vec<Song>> {
        let prefix = format!("{:020}/", playlist_id);
        let mut songs = Vec::new();
        for value in self.tree(Table::SongPlaylistMaps)?.scan_prefix(prefix.as_bytes()).values() {
            let ivec = value.map_err(storage_error)?;
            let map: SongPlaylistMap = bincode::deserialize(&ivec).map_err(storage_error)?;
            match self.get_song(&map.song_id)? {
                Some(song) => songs.push(song),
                None => warn!(song_id = %map.song_id, playlist_id, "Playlist entry without song"),
            }
        }
        Ok(songs)
    }

    /// Reactive read: yields `read` for the current state, then again after
    /// each change accepted by `filter`.
    ///
    /// The subscription is taken before the first read so a write racing the
    /// first read is never lost. A lagged receiver re-reads once.
    fn observe<T, R, F>(&self, read: R, filter: F) -> impl Stream<Item = io::Result<T>> + Send
    where
        T: Send + 'static,
        R: Fn(&Database) -> io::Result<T> + Send + 'static,
        F: Fn(&Change) -> bool + Send + 'static,
    {
        let receiver = self.changes.subscribe();
        let state = (self.clone(), receiver, read, filter, true);

        stream::unfold(state, |(db, mut receiver, read, filter, first)| async move {
            if !first {
                loop {
                    match receiver.recv().await {
                        Ok(change) if filter(&change) => break,
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!(skipped, "Change bus lagged, re-reading");
                            break;
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
            let value = read(&db);
            Some((value, (db, receiver, read, filter, false)))
        })
    }
}
