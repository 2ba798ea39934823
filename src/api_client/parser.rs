//! Maps remote payloads to domain records.
//!
//! Each record type has exactly one function that knows the positional
//! layout of its row (which flex column, which run, which thumbnail size).
//! A missing node yields a missing field; only a missing record id drops the
//! record.

use crate::api_client::payload::{
    BrowseResponse, CarouselItem, MusicCarouselShelf, MusicResponsiveListItemRenderer, MusicShelfItem, NextResponse,
    PlaylistPanelItem, Run, Thumbnails, WatchEndpointPayload,
};
use crate::api_client::SyncError;
use crate::foundation::database::{
    Album, Artist, ArtistInfo, ContinuationToken, DetailedSong, Info, WatchEndpoint,
};
use tracing::{debug, warn};

const ALBUMS_CAROUSEL_TITLE: &str = "Albums";
const ALBUM_BROWSE_PREFIX: &str = "MPRE";
const SEPARATOR: &str = " • ";

/// Index 0 is the smallest rendition; index 1 is the one worth showing.
fn preferred_thumbnail(thumbnails: Option<&Thumbnails>) -> Option<String> {
    let thumbnails = thumbnails?;
    thumbnails
        .get(1)
        .or_else(|| thumbnails.get(0))?
        .url
        .clone()
}

fn largest_thumbnail(thumbnails: Option<&Thumbnails>) -> Option<String> {
    thumbnails?.last()?.url.clone()
}

fn to_endpoint(payload: Option<&WatchEndpointPayload>) -> WatchEndpoint {
    payload
        .map(|watch| WatchEndpoint {
            video_id: watch.video_id.clone(),
            playlist_id: watch.playlist_id.clone(),
            params: watch.params.clone(),
        })
        .unwrap_or_default()
}

fn is_separator(run: &Run) -> bool {
    run.text.as_deref() == Some(SEPARATOR)
}

/// Splits byline runs on the `" • "` separator runs.
fn split_on_separators(runs: &[Run]) -> Vec<&[Run]> {
    runs.split(is_separator).filter(|group| !group.is_empty()).collect()
}

fn is_year(group: &[Run]) -> bool {
    group_text(group).is_some_and(|text| text.chars().all(|c| c.is_ascii_digit()))
}

/// Texts of several byline groups, separated the way the page shows them.
fn join_groups(groups: &[&[Run]]) -> Option<String> {
    let texts: Vec<String> = groups.iter().filter_map(|group| group_text(group)).collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.join(SEPARATOR))
    }
}

fn group_text(group: &[Run]) -> Option<String> {
    let text: String = group.iter().filter_map(|run| run.text.as_deref()).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Artists in a byline group: every run that links to a browse page.
fn artist_refs(group: &[Run]) -> Vec<Info> {
    group
        .iter()
        .filter_map(|run| {
            Some(Info {
                id: run.browse_id()?.to_string(),
                name: run.text.clone(),
            })
        })
        .collect()
}

/// Parses the artist summary from an artist page.
///
/// The name is what identifies the page as an artist; without it the whole
/// lookup fails.
pub fn parse_artist(
    browse_id: &str,
    page: &BrowseResponse,
    timestamp: u64,
) -> Result<Artist, SyncError> {
    let header = page
        .artist_header()
        .ok_or_else(|| SyncError::malformed(browse_id, "artist header"))?;
    let name = header
        .title
        .as_ref()
        .and_then(|title| title.first_text())
        .ok_or_else(|| SyncError::malformed(browse_id, "artist name"))?;

    let shuffle = to_endpoint(header.play_button.as_ref().and_then(|b| b.watch()));
    let radio = to_endpoint(header.start_radio_button.as_ref().and_then(|b| b.watch()));

    Ok(Artist {
        id: browse_id.to_string(),
        name: name.to_string(),
        thumbnail_url: largest_thumbnail(
            header.thumbnail.as_ref().and_then(|t| t.thumbnails()),
        ),
        info: header.description.as_ref().and_then(|d| d.joined()),
        shuffle_video_id: shuffle.video_id,
        shuffle_playlist_id: shuffle.playlist_id,
        radio_video_id: radio.video_id,
        radio_playlist_id: radio.playlist_id,
        timestamp: Some(timestamp),
    })
}

/// Maps one row of an artist's songs shelf.
///
/// Column 0 holds title and video id, column 2 the album link. The payload
/// carries no duration for these rows.
fn artist_song_from_row(row: &MusicShelfItem, artist: &Info) -> Option<DetailedSong> {
    let renderer = row.music_responsive_list_item_renderer.as_ref()?;
    let title_run = renderer.flex_column(0).and_then(|runs| runs.get(0));
    let id = title_run?.watch_endpoint()?.video_id.clone()?;

    Some(DetailedSong {
        id,
        title: title_run.and_then(|run| run.text.clone()),
        artists_text: artist.name.clone(),
        duration_text: None,
        thumbnail_url: preferred_thumbnail(
            renderer.thumbnail.as_ref().and_then(|t| t.thumbnails()),
        ),
        album_id: renderer
            .flex_column(2)
            .and_then(|runs| runs.get(0))
            .and_then(|run| run.browse_id())
            .map(str::to_string),
        artists: vec![artist.clone()],
    })
}

/// Maps one tile of an artist's albums carousel. Tiles without a browse id
/// can't be navigated to and are dropped.
fn artist_album_from_item(item: &CarouselItem, artist_name: Option<&str>) -> Option<Album> {
    let renderer = item.music_two_row_item_renderer.as_ref()?;
    let title_run = renderer.title.as_ref().and_then(|title| title.get(0));
    let id = title_run?.browse_id()?.to_string();

    Some(Album {
        id,
        title: title_run.and_then(|run| run.text.clone()),
        thumbnail_url: preferred_thumbnail(
            renderer
                .thumbnail_renderer
                .as_ref()
                .and_then(|t| t.thumbnails()),
        ),
        year: renderer
            .subtitle
            .as_ref()
            .and_then(|subtitle| subtitle.get(2))
            .and_then(|run| run.text.clone()),
        authors_text: artist_name.map(str::to_string),
        share_url: None,
        timestamp: None,
        item_count: None,
        length: None,
    })
}

fn artist_name(page: &BrowseResponse) -> Option<&str> {
    page.artist_header()?.title.as_ref()?.first_text()
}

/// Songs of an artist page, in page order. An absent shelf yields no songs.
pub fn parse_artist_songs(browse_id: &str, page: &BrowseResponse) -> Vec<DetailedSong> {
    let artist = Info {
        id: browse_id.to_string(),
        name: artist_name(page).map(str::to_string),
    };
    let rows = page
        .music_shelf()
        .and_then(|shelf| shelf.contents.as_deref())
        .unwrap_or(&[]);

    let songs: Vec<DetailedSong> = rows
        .iter()
        .filter_map(|row| artist_song_from_row(row, &artist))
        .collect();
    if songs.len() < rows.len() {
        debug!(
            browse_id,
            skipped = rows.len() - songs.len(),
            "Skipped song rows without a video id"
        );
    }
    songs
}

fn links_to_albums(carousel: &MusicCarouselShelf) -> bool {
    carousel.contents.as_deref().unwrap_or(&[]).iter().any(|item| {
        item.music_two_row_item_renderer
            .as_ref()
            .and_then(|renderer| renderer.title.as_ref())
            .and_then(|title| title.get(0))
            .and_then(Run::browse_id)
            .is_some_and(|id| id.starts_with(ALBUM_BROWSE_PREFIX))
    })
}

/// The carousel titled "Albums". Pages in other languages carry a localized
/// title, so the first carousel linking to album pages stands in for it.
fn albums_carousel(page: &BrowseResponse) -> Option<&MusicCarouselShelf> {
    page.carousel(ALBUMS_CAROUSEL_TITLE)
        .or_else(|| page.carousels().find(|carousel| links_to_albums(carousel)))
}

/// Discography of an artist page, in page order. Never persisted.
pub fn parse_artist_albums(page: &BrowseResponse) -> Vec<Album> {
    let name = artist_name(page);
    albums_carousel(page)
        .and_then(|carousel| carousel.contents.as_deref())
        .unwrap_or(&[])
        .iter()
        .filter_map(|item| artist_album_from_item(item, name))
        .collect()
}

/// Token for "see more songs": the playlist id behind the first song row.
/// Empty when that row, or any node on the way to the id, is missing.
pub fn parse_see_more_songs(page: &BrowseResponse) -> ContinuationToken {
    page.music_shelf()
        .and_then(|shelf| shelf.contents.as_ref())
        .and_then(|rows| rows.first())
        .and_then(|row| row.music_responsive_list_item_renderer.as_ref())
        .and_then(|renderer| renderer.flex_column(0))
        .and_then(|runs| runs.get(0))
        .and_then(Run::watch_endpoint)
        .and_then(|watch| watch.playlist_id.clone())
        .map(ContinuationToken::new)
        .unwrap_or_default()
}

pub fn parse_artist_info(browse_id: &str, page: &BrowseResponse) -> ArtistInfo {
    ArtistInfo::new(
        parse_artist_songs(browse_id, page),
        parse_artist_albums(page),
        parse_see_more_songs(page),
    )
}

/// Parses the album summary from an album page.
///
/// The subtitle reads `Album • Author & Author • 2020`; the second subtitle
/// reads `12 songs • 45 minutes`.
pub fn parse_album(
    browse_id: &str,
    page: &BrowseResponse,
    timestamp: u64,
) -> Result<Album, SyncError> {
    let header = page
        .detail_header()
        .ok_or_else(|| SyncError::malformed(browse_id, "album header"))?;

    let subtitle = header.subtitle.as_ref().map(|s| s.all()).unwrap_or(&[]);
    let subtitle_groups = split_on_separators(subtitle);
    let (authors, year) = match subtitle_groups.split_first() {
        Some((_, rest)) => match rest.split_last() {
            Some((last, authors)) if is_year(last) => (authors, group_text(last)),
            _ => (rest, None),
        },
        None => (&[] as &[&[Run]], None),
    };
    let authors_text = join_groups(authors);

    let second = header
        .second_subtitle
        .as_ref()
        .map(|s| s.all())
        .unwrap_or(&[]);
    let second_groups = split_on_separators(second);

    Ok(Album {
        id: browse_id.to_string(),
        title: header.title.as_ref().and_then(|t| t.first_text()).map(str::to_string),
        thumbnail_url: largest_thumbnail(header.thumbnail.as_ref().and_then(|t| t.thumbnails())),
        year,
        authors_text,
        share_url: page.canonical_url().map(str::to_string),
        timestamp: Some(timestamp),
        item_count: second_groups.first().and_then(|group| group_text(group)),
        length: second_groups.get(1).and_then(|group| group_text(group)),
    })
}

/// Maps one track row of an album or playlist page: column 0 title and id,
/// column 1 the artists, column 2 (playlists only) the album link, fixed
/// column 0 the duration.
fn listing_song_from_row(
    renderer: &MusicResponsiveListItemRenderer,
    album_id: Option<&str>,
    fallback_thumbnail: Option<&String>,
) -> Option<DetailedSong> {
    let title_run = renderer.flex_column(0).and_then(|runs| runs.get(0));
    let id = title_run?.watch_endpoint()?.video_id.clone()?;
    let artist_runs = renderer.flex_column(1).map(|runs| runs.all()).unwrap_or(&[]);
    let album_id = album_id.map(str::to_string).or_else(|| {
        renderer
            .flex_column(2)
            .and_then(|runs| runs.get(0))
            .and_then(|run| run.browse_id())
            .map(str::to_string)
    });

    Some(DetailedSong {
        id,
        title: title_run.and_then(|run| run.text.clone()),
        artists_text: group_text(artist_runs),
        duration_text: renderer
            .fixed_column(0)
            .and_then(|runs| runs.first_text())
            .map(str::to_string),
        thumbnail_url: preferred_thumbnail(renderer.thumbnail.as_ref().and_then(|t| t.thumbnails()))
            .or_else(|| fallback_thumbnail.cloned()),
        album_id,
        artists: artist_refs(artist_runs),
    })
}

fn listing_songs(page: &BrowseResponse, album_id: Option<&str>) -> Vec<DetailedSong> {
    let cover = page
        .detail_header()
        .and_then(|header| largest_thumbnail(header.thumbnail.as_ref().and_then(|t| t.thumbnails())));

    page.music_shelf()
        .and_then(|shelf| shelf.contents.as_deref())
        .unwrap_or(&[])
        .iter()
        .filter_map(|row| row.music_responsive_list_item_renderer.as_ref())
        .filter_map(|renderer| listing_song_from_row(renderer, album_id, cover.as_ref()))
        .collect()
}

/// Tracks of an album page, in page order. Album rows usually have no
/// thumbnail of their own and inherit the cover.
pub fn parse_album_songs(browse_id: &str, page: &BrowseResponse) -> Vec<DetailedSong> {
    listing_songs(page, Some(browse_id))
}

/// Tracks of a playlist page, in playlist order.
pub fn parse_playlist_songs(page: &BrowseResponse) -> Vec<DetailedSong> {
    listing_songs(page, None)
}

/// Maps one watch-next queue entry. The byline reads
/// `Artist & Artist • Album • 2020`.
fn queue_song_from_item(item: &PlaylistPanelItem) -> Option<DetailedSong> {
    let renderer = item.playlist_panel_video_renderer.as_ref()?;
    let id = renderer.video_id.clone().or_else(|| {
        renderer
            .navigation_endpoint
            .as_ref()?
            .watch_endpoint
            .as_ref()?
            .video_id
            .clone()
    })?;

    let byline = renderer
        .long_byline_text
        .as_ref()
        .map(|runs| runs.all())
        .unwrap_or(&[]);
    let groups = split_on_separators(byline);
    let artists = groups.first().copied().unwrap_or(&[]);
    let album_id = groups
        .iter()
        .skip(1)
        .flat_map(|group| group.iter())
        .find_map(|run| run.browse_id().filter(|id| id.starts_with("MPRE")))
        .map(str::to_string);

    Some(DetailedSong {
        id,
        title: renderer.title.as_ref().and_then(|t| t.first_text()).map(str::to_string),
        artists_text: group_text(artists),
        duration_text: renderer
            .length_text
            .as_ref()
            .and_then(|t| t.first_text())
            .map(str::to_string),
        thumbnail_url: largest_thumbnail(renderer.thumbnail.as_ref()),
        album_id,
        artists: artist_refs(artists),
    })
}

/// Songs of a watch-next queue, in queue order.
pub fn parse_queue(response: &NextResponse) -> Vec<DetailedSong> {
    let items = response.queue_items();
    let songs: Vec<DetailedSong> = items.iter().filter_map(queue_song_from_item).collect();
    if songs.len() < items.len() {
        warn!(
            skipped = items.len() - songs.len(),
            "Skipped queue entries without a video id"
        );
    }
    songs
}
