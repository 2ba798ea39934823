/// # The Main Entry Point of the Client
///
/// Wires configuration, logging, the local cache and the remote API together
/// and runs one command against them.
///
/// # Steps:
/// 1. Loads the configuration
/// 2. Initializes logging
/// 3. Opens the local cache database
/// 4. Runs the requested action through the reconciler and queue builder
///
use crate::api_client::InnertubeClient;
use crate::configuration::{self, ConfigFolder};
use crate::foundation::database::{self, Album, Artist, DetailedSong};
use crate::foundation::utils::thumbnail;
use crate::logging;
use crate::process::{
    apply_intent, resolve_intent, InMemoryTransport, IntentLoader, QueueBuilder, Reconciler,
    Transport,
};
use anyhow::{anyhow, Context};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const ARTIST_THUMBNAIL_SIZE: u32 = 544;

pub enum Action {
    Artist {
        browse_id: String,
        shuffle: bool,
        shuffle_library: bool,
        radio: bool,
    },
    Album {
        browse_id: String,
        play_index: Option<usize>,
    },
    Open {
        uri: String,
        play_index: Option<usize>,
        enqueue: bool,
        import: Option<String>,
    },
    Retry {
        browse_id: String,
    },
}

pub async fn run(cfg_folder: ConfigFolder, action: Action) -> anyhow::Result<()> {
    if !cfg_folder.is_initialized() {
        eprintln!(
            "\x1b[1m\x1b[31mConfiguration folder or config.yaml not found. Please run 'vimusync config' first.\x1b[0m"
        );
        return Ok(());
    }

    let reconciler = connect(&cfg_folder)?;

    match action {
        Action::Artist {
            browse_id,
            shuffle,
            shuffle_library,
            radio,
        } => show_artist(&reconciler, &browse_id, shuffle, shuffle_library, radio).await,
        Action::Album {
            browse_id,
            play_index,
        } => show_album(&reconciler, &browse_id, play_index).await,
        Action::Open {
            uri,
            play_index,
            enqueue,
            import,
        } => open(reconciler, &uri, play_index, enqueue, import).await,
        Action::Retry { browse_id } => retry(&reconciler, &browse_id).await,
    }
}

fn connect(cfg_folder: &ConfigFolder) -> anyhow::Result<Reconciler> {
    let config_file = cfg_folder
        .config_file
        .to_str()
        .ok_or_else(|| anyhow!("Failed to convert the configuration path to a string"))?;
    let config = configuration::get_configuration(config_file)
        .context("Unable to parse configuration file")?;

    logging::init_logging(config.log_filter.as_deref());

    let db_path = cfg_folder
        .cache_db
        .to_str()
        .ok_or_else(|| anyhow!("Failed to convert the database path to a string"))?;
    let db = database::open_database(db_path).context("Unable to open the cache database")?;

    let api = InnertubeClient::new(config.api_settings);
    Ok(Reconciler::new(db, Arc::new(api)))
}

async fn with_spinner<F: Future>(message: &str, work: F) -> anyhow::Result<F::Output> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let output = work.await;
    spinner.finish_and_clear();
    Ok(output)
}

async fn show_artist(
    reconciler: &Reconciler,
    browse_id: &str,
    shuffle: bool,
    shuffle_library: bool,
    radio: bool,
) -> anyhow::Result<()> {
    let artist = with_spinner("Loading artist...", reconciler.artist(browse_id)).await??;
    let info = with_spinner("Loading songs and albums...", reconciler.artist_info(browse_id)).await??;
    print_artist(&artist);

    println!("\x1b[1m\x1b[34mSongs\x1b[0m");
    print_songs(info.songs());
    if !info.see_more_songs().is_empty() {
        println!("  \x1b[33m... more under {}\x1b[0m", info.see_more_songs());
    }

    println!("\x1b[1m\x1b[34mAlbums\x1b[0m");
    for album in info.albums() {
        print_album_line(album);
    }

    let local = reconciler.local_artist_songs(browse_id)?;
    if !local.is_empty() {
        println!("\x1b[1m\x1b[34mIn your library\x1b[0m");
        print_songs(&local);
    }

    let mut queue = QueueBuilder::new(InMemoryTransport::new());
    let api = reconciler.api();
    if radio {
        with_spinner("Starting radio...", queue.play_radio(api.as_ref(), &artist.radio_endpoint()))
            .await??;
        print_queue(queue.transport());
    } else if shuffle {
        with_spinner("Starting shuffle...", queue.shuffle_artist(api.as_ref(), &artist)).await??;
        print_queue(queue.transport());
    } else if shuffle_library {
        if local.is_empty() {
            println!("\x1b[33mNo songs by this artist in your library.\x1b[0m");
        } else {
            queue.shuffle_all(&local)?;
            print_queue(queue.transport());
        }
    }

    Ok(())
}

async fn show_album(
    reconciler: &Reconciler,
    browse_id: &str,
    play_index: Option<usize>,
) -> anyhow::Result<()> {
    let album = with_spinner("Loading album...", reconciler.album(browse_id)).await??;
    let songs = with_spinner("Loading tracks...", reconciler.album_songs(browse_id)).await??;

    print_album_line(&album);
    if let Some(share_url) = &album.share_url {
        println!("  {}", share_url);
    }
    print_songs(&songs);

    if let Some(index) = play_index {
        let mut queue = QueueBuilder::new(InMemoryTransport::new());
        queue.force_play_at_index(&songs, index)?;
        print_queue(queue.transport());
    }

    Ok(())
}

async fn open(
    reconciler: Reconciler,
    uri: &str,
    play_index: Option<usize>,
    enqueue: bool,
    import: Option<String>,
) -> anyhow::Result<()> {
    let target = resolve_intent(uri)?;
    let loader = IntentLoader::new(reconciler);
    let songs = with_spinner("Loading link...", loader.load(&target)).await??;

    if songs.is_empty() {
        println!("\x1b[33mNothing to play for this link.\x1b[0m");
        return Ok(());
    }

    if let Some(name) = import {
        let playlist = loader.import_as_playlist(&name, &songs)?;
        println!(
            "\x1b[32mImported {} songs into playlist '{}' (#{}).\x1b[0m",
            songs.len(),
            playlist.name,
            playlist.id
        );
    }

    let mut queue = QueueBuilder::new(InMemoryTransport::new());
    if enqueue {
        queue.enqueue(&songs);
    } else if let Some(index) = play_index {
        queue.force_play_at_index(&songs, index)?;
    } else {
        apply_intent(&mut queue, &target, &songs)?;
    }
    print_queue(queue.transport());

    Ok(())
}

/// Observes the artist and, if the first outcome is a failure, retries once.
async fn retry(reconciler: &Reconciler, browse_id: &str) -> anyhow::Result<()> {
    let mut updates = Box::pin(reconciler.observe_artist(browse_id));

    match updates.next().await {
        Some(Ok(artist)) => {
            print_artist(&artist);
            return Ok(());
        }
        Some(Err(e)) => eprintln!("\x1b[31mFirst attempt failed ({}): {}\x1b[0m", e.kind(), e),
        None => return Ok(()),
    }

    reconciler.retry_artist(browse_id);
    match with_spinner("Retrying...", updates.next()).await? {
        Some(Ok(artist)) => print_artist(&artist),
        Some(Err(e)) => eprintln!("\x1b[31mRetry failed ({}): {}\x1b[0m", e.kind(), e),
        None => {}
    }
    Ok(())
}

fn print_artist(artist: &Artist) {
    println!("\x1b[1m\x1b[32m{}\x1b[0m", artist.name);
    if let Some(url) = &artist.thumbnail_url {
        println!("\x1b[2m{}\x1b[0m", thumbnail(url, ARTIST_THUMBNAIL_SIZE));
    }
    if let Some(info) = &artist.info {
        println!("{}", info);
    }
}

fn print_album_line(album: &Album) {
    println!(
        "  {} \x1b[2m{}\x1b[0m {}",
        album.title.as_deref().unwrap_or("<untitled>"),
        album.year.as_deref().unwrap_or(""),
        album.authors_text.as_deref().unwrap_or("")
    );
}

fn print_songs(songs: &[DetailedSong]) {
    for (index, song) in songs.iter().enumerate() {
        println!(
            "  {:>3}. {} \x1b[2m{} {}\x1b[0m",
            index,
            song.title.as_deref().unwrap_or(&song.id),
            song.artists_text.as_deref().unwrap_or(""),
            song.duration_text.as_deref().unwrap_or("")
        );
    }
}

fn print_queue<T: Transport>(transport: &T) {
    println!("\x1b[1m\x1b[34mQueue\x1b[0m");
    for index in 0..transport.item_count() {
        let Some(item) = transport.item_at(index) else {
            continue;
        };
        let marker = if transport.current_index() == Some(index) { "▶" } else { " " };
        println!(
            "  {} {} \x1b[2m{}\x1b[0m",
            marker,
            item.title.as_deref().unwrap_or(&item.media_id),
            item.artist.as_deref().unwrap_or("")
        );
    }
}
