//! Typed view of the remote browse and watch-next responses.
//!
//! Every node is optional: the remote schema is versioned by a third party and
//! routinely omits branches. Positional assumptions (which column, which run)
//! live in the parser, not here.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Runs {
    pub runs: Option<Vec<Run>>,
}

impl Runs {
    pub fn get(&self, index: usize) -> Option<&Run> {
        self.runs.as_ref()?.get(index)
    }

    pub fn first_text(&self) -> Option<&str> {
        self.get(0)?.text.as_deref()
    }

    pub fn all(&self) -> &[Run] {
        self.runs.as_deref().unwrap_or(&[])
    }

    /// All run texts concatenated, or `None` when there are no runs.
    pub fn joined(&self) -> Option<String> {
        let runs = self.runs.as_ref().filter(|runs| !runs.is_empty())?;
        Some(runs.iter().filter_map(|run| run.text.as_deref()).collect())
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub text: Option<String>,
    pub navigation_endpoint: Option<NavigationEndpoint>,
}

impl Run {
    pub fn watch_endpoint(&self) -> Option<&WatchEndpointPayload> {
        self.navigation_endpoint.as_ref()?.watch_endpoint.as_ref()
    }

    pub fn browse_id(&self) -> Option<&str> {
        self.navigation_endpoint
            .as_ref()?
            .browse_endpoint
            .as_ref()?
            .browse_id
            .as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEndpoint {
    pub watch_endpoint: Option<WatchEndpointPayload>,
    pub watch_playlist_endpoint: Option<WatchEndpointPayload>,
    pub browse_endpoint: Option<BrowseEndpoint>,
}

impl NavigationEndpoint {
    /// The watch seed, whichever of the two watch endpoint kinds carries it.
    pub fn watch(&self) -> Option<&WatchEndpointPayload> {
        self.watch_endpoint
            .as_ref()
            .or(self.watch_playlist_endpoint.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchEndpointPayload {
    pub video_id: Option<String>,
    pub playlist_id: Option<String>,
    pub params: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrowseEndpoint {
    pub browse_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnail {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnails {
    pub thumbnails: Option<Vec<Thumbnail>>,
}

impl Thumbnails {
    pub fn get(&self, index: usize) -> Option<&Thumbnail> {
        self.thumbnails.as_ref()?.get(index)
    }

    pub fn last(&self) -> Option<&Thumbnail> {
        self.thumbnails.as_ref()?.last()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MusicThumbnailRenderer {
    pub thumbnail: Option<Thumbnails>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailRenderer {
    pub music_thumbnail_renderer: Option<MusicThumbnailRenderer>,
    pub cropped_square_thumbnail_renderer: Option<MusicThumbnailRenderer>,
}

impl ThumbnailRenderer {
    pub fn thumbnails(&self) -> Option<&Thumbnails> {
        self.music_thumbnail_renderer
            .as_ref()
            .or(self.cropped_square_thumbnail_renderer.as_ref())?
            .thumbnail
            .as_ref()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlexColumnRenderer {
    pub text: Option<Runs>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlexColumn {
    pub music_responsive_list_item_flex_column_renderer: Option<FlexColumnRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FixedColumn {
    pub music_responsive_list_item_fixed_column_renderer: Option<FlexColumnRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MusicResponsiveListItemRenderer {
    pub flex_columns: Option<Vec<FlexColumn>>,
    pub fixed_columns: Option<Vec<FixedColumn>>,
    pub thumbnail: Option<ThumbnailRenderer>,
}

impl MusicResponsiveListItemRenderer {
    pub fn flex_column(&self, index: usize) -> Option<&Runs> {
        self.flex_columns
            .as_ref()?
            .get(index)?
            .music_responsive_list_item_flex_column_renderer
            .as_ref()?
            .text
            .as_ref()
    }

    pub fn fixed_column(&self, index: usize) -> Option<&Runs> {
        self.fixed_columns
            .as_ref()?
            .get(index)?
            .music_responsive_list_item_fixed_column_renderer
            .as_ref()?
            .text
            .as_ref()
    }
}

/// One row of a music shelf.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MusicShelfItem {
    pub music_responsive_list_item_renderer: Option<MusicResponsiveListItemRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MusicTwoRowItemRenderer {
    pub title: Option<Runs>,
    pub subtitle: Option<Runs>,
    pub thumbnail_renderer: Option<ThumbnailRenderer>,
    pub navigation_endpoint: Option<NavigationEndpoint>,
}

/// One tile of a carousel shelf.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarouselItem {
    pub music_two_row_item_renderer: Option<MusicTwoRowItemRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MusicShelf {
    pub title: Option<Runs>,
    pub contents: Option<Vec<MusicShelfItem>>,
    pub bottom_endpoint: Option<NavigationEndpoint>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarouselBasicHeader {
    pub title: Option<Runs>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarouselHeader {
    pub music_carousel_shelf_basic_header_renderer: Option<CarouselBasicHeader>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MusicCarouselShelf {
    pub header: Option<CarouselHeader>,
    pub contents: Option<Vec<CarouselItem>>,
}

impl MusicCarouselShelf {
    pub fn title(&self) -> Option<&str> {
        self.header
            .as_ref()?
            .music_carousel_shelf_basic_header_renderer
            .as_ref()?
            .title
            .as_ref()?
            .first_text()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub music_shelf_renderer: Option<MusicShelf>,
    pub music_carousel_shelf_renderer: Option<MusicCarouselShelf>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionList {
    pub contents: Option<Vec<Section>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SectionListContent {
    pub section_list_renderer: Option<SectionList>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabRenderer<C> {
    pub content: Option<C>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tab<C> {
    pub tab_renderer: Option<TabRenderer<C>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tabs<C> {
    pub tabs: Option<Vec<Tab<C>>>,
}

impl<C> Tabs<C> {
    pub fn first_content(&self) -> Option<&C> {
        self.tabs
            .as_ref()?
            .first()?
            .tab_renderer
            .as_ref()?
            .content
            .as_ref()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrowseContents {
    pub single_column_browse_results_renderer: Option<Tabs<SectionListContent>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ButtonRenderer {
    pub navigation_endpoint: Option<NavigationEndpoint>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Button {
    pub button_renderer: Option<ButtonRenderer>,
}

impl Button {
    pub fn watch(&self) -> Option<&WatchEndpointPayload> {
        self.button_renderer
            .as_ref()?
            .navigation_endpoint
            .as_ref()?
            .watch()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImmersiveHeader {
    pub title: Option<Runs>,
    pub description: Option<Runs>,
    pub thumbnail: Option<ThumbnailRenderer>,
    pub play_button: Option<Button>,
    pub start_radio_button: Option<Button>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetailHeader {
    pub title: Option<Runs>,
    pub subtitle: Option<Runs>,
    pub second_subtitle: Option<Runs>,
    pub thumbnail: Option<ThumbnailRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrowseHeader {
    pub music_immersive_header_renderer: Option<ImmersiveHeader>,
    pub music_visual_header_renderer: Option<ImmersiveHeader>,
    pub music_detail_header_renderer: Option<DetailHeader>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MicroformatData {
    pub url_canonical: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Microformat {
    pub microformat_data_renderer: Option<MicroformatData>,
}

/// Response of the browse endpoint, used for artist and album pages.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrowseResponse {
    pub contents: Option<BrowseContents>,
    pub header: Option<BrowseHeader>,
    pub microformat: Option<Microformat>,
}

impl BrowseResponse {
    pub fn sections(&self) -> &[Section] {
        self.contents
            .as_ref()
            .and_then(|contents| contents.single_column_browse_results_renderer.as_ref())
            .and_then(Tabs::first_content)
            .and_then(|content| content.section_list_renderer.as_ref())
            .and_then(|list| list.contents.as_deref())
            .unwrap_or(&[])
    }

    /// Artist pages use the immersive header; artists without a banner get
    /// the visual one.
    pub fn artist_header(&self) -> Option<&ImmersiveHeader> {
        let header = self.header.as_ref()?;
        header
            .music_immersive_header_renderer
            .as_ref()
            .or(header.music_visual_header_renderer.as_ref())
    }

    pub fn detail_header(&self) -> Option<&DetailHeader> {
        self.header.as_ref()?.music_detail_header_renderer.as_ref()
    }

    /// The first music shelf on the page, if any.
    pub fn music_shelf(&self) -> Option<&MusicShelf> {
        self.sections()
            .iter()
            .find_map(|section| section.music_shelf_renderer.as_ref())
    }

    pub fn carousels(&self) -> impl Iterator<Item = &MusicCarouselShelf> {
        self.sections()
            .iter()
            .filter_map(|section| section.music_carousel_shelf_renderer.as_ref())
    }

    pub fn carousel(&self, title: &str) -> Option<&MusicCarouselShelf> {
        self.carousels().find(|carousel| carousel.title() == Some(title))
    }

    pub fn canonical_url(&self) -> Option<&str> {
        self.microformat
            .as_ref()?
            .microformat_data_renderer
            .as_ref()?
            .url_canonical
            .as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistPanelVideoRenderer {
    pub video_id: Option<String>,
    pub title: Option<Runs>,
    pub long_byline_text: Option<Runs>,
    pub length_text: Option<Runs>,
    pub thumbnail: Option<Thumbnails>,
    pub navigation_endpoint: Option<NavigationEndpoint>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistPanelItem {
    pub playlist_panel_video_renderer: Option<PlaylistPanelVideoRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistPanelRenderer {
    pub contents: Option<Vec<PlaylistPanelItem>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MusicQueueContent {
    pub playlist_panel_renderer: Option<PlaylistPanelRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MusicQueueRenderer {
    pub content: Option<MusicQueueContent>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchNextTabContent {
    pub music_queue_renderer: Option<MusicQueueRenderer>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchNextTabbedResults {
    pub watch_next_tabbed_results_renderer: Option<Tabs<WatchNextTabContent>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchNextResults {
    pub tabbed_renderer: Option<WatchNextTabbedResults>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NextContents {
    pub single_column_music_watch_next_results_renderer: Option<WatchNextResults>,
}

/// Response of the watch-next endpoint: the queue for a video and/or playlist.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NextResponse {
    pub contents: Option<NextContents>,
}

impl NextResponse {
    pub fn queue_items(&self) -> &[PlaylistPanelItem] {
        self.contents
            .as_ref()
            .and_then(|contents| contents.single_column_music_watch_next_results_renderer.as_ref())
            .and_then(|results| results.tabbed_renderer.as_ref())
            .and_then(|tabbed| tabbed.watch_next_tabbed_results_renderer.as_ref())
            .and_then(Tabs::first_content)
            .and_then(|content| content.music_queue_renderer.as_ref())
            .and_then(|queue| queue.content.as_ref())
            .and_then(|content| content.playlist_panel_renderer.as_ref())
            .and_then(|panel| panel.contents.as_deref())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_branches_deserialize_to_none() {
        let response: BrowseResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.sections().is_empty());
        assert!(response.artist_header().is_none());
        assert!(response.music_shelf().is_none());
    }

    #[test]
    fn test_carousel_found_by_title() {
        let response: BrowseResponse = serde_json::from_value(json!({
            "contents": {"singleColumnBrowseResultsRenderer": {"tabs": [{"tabRenderer": {"content": {
                "sectionListRenderer": {"contents": [
                    {"musicCarouselShelfRenderer": {
                        "header": {"musicCarouselShelfBasicHeaderRenderer": {"title": {"runs": [{"text": "Singles"}]}}},
                        "contents": []
                    }},
                    {"musicCarouselShelfRenderer": {
                        "header": {"musicCarouselShelfBasicHeaderRenderer": {"title": {"runs": [{"text": "Albums"}]}}},
                        "contents": [{}]
                    }}
                ]}
            }}}]}}
        }))
        .unwrap();

        let albums = response.carousel("Albums").unwrap();
        assert_eq!(albums.contents.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let run: Run = serde_json::from_value(json!({
            "text": "Song",
            "trackingParams": "abc",
            "navigationEndpoint": {"clickTrackingParams": "x", "watchEndpoint": {"videoId": "v1"}}
        }))
        .unwrap();
        assert_eq!(run.watch_endpoint().and_then(|w| w.video_id.as_deref()), Some("v1"));
    }

    #[test]
    fn test_runs_joined() {
        let runs: Runs = serde_json::from_value(json!({"runs": [{"text": "A"}, {"text": " & "}, {"text": "B"}]})).unwrap();
        assert_eq!(runs.joined().as_deref(), Some("A & B"));
        assert_eq!(Runs::default().joined(), None);
    }
}
