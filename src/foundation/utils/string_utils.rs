use regex::Regex;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

fn width_height_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"=w\d+-h\d+").expect("valid thumbnail size pattern"))
}

fn square_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"=s\d+").expect("valid thumbnail size pattern"))
}

/// Rewrites a thumbnail URL so the image host serves it at `size` pixels.
///
/// Googleusercontent URLs carry their size as `=wN-hN`, ggpht URLs as `=sN`.
/// URLs from other hosts (video stills) have fixed sizes and are returned
/// untouched.
///
/// # Examples
///
/// ```
/// use vimusync::foundation::utils::thumbnail;
///
/// let url = "https://lh3.googleusercontent.com/abc=w60-h60-l90-rj";
/// assert_eq!(thumbnail(url, 226), "https://lh3.googleusercontent.com/abc=w226-h226-l90-rj");
/// ```
pub fn thumbnail(url: &str, size: u32) -> String {
    if url.starts_with("https://lh3.googleusercontent.com") {
        width_height_pattern()
            .replace(url, format!("=w{size}-h{size}").as_str())
            .into_owned()
    } else if url.starts_with("https://yt3.ggpht.com") {
        square_pattern()
            .replace(url, format!("=s{size}").as_str())
            .into_owned()
    } else {
        url.to_string()
    }
}

/// Current time in milliseconds since the Unix epoch, the unit of every
/// freshness timestamp.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_resizes_googleusercontent() {
        let url = "https://lh3.googleusercontent.com/x=w120-h120-l90-rj";
        assert_eq!(
            thumbnail(url, 544),
            "https://lh3.googleusercontent.com/x=w544-h544-l90-rj"
        );
    }

    #[test]
    fn test_thumbnail_resizes_ggpht() {
        let url = "https://yt3.ggpht.com/y=s88-c-k-c0x00ffffff-no-rj";
        assert_eq!(
            thumbnail(url, 300),
            "https://yt3.ggpht.com/y=s300-c-k-c0x00ffffff-no-rj"
        );
    }

    #[test]
    fn test_thumbnail_leaves_other_hosts() {
        let url = "https://i.ytimg.com/vi/abc/hqdefault.jpg";
        assert_eq!(thumbnail(url, 100), url);
    }

    #[test]
    fn test_now_millis_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }
}
