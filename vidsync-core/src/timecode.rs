//! Start offsets embedded in video-sharing links (`?t=42`, `&start=7`).

use url::Url;

const WATCH_HOST: &str = "youtube.com";
const SHORT_HOST: &str = "youtu.be";

/// Seconds to start playback at, parsed from the link's `t` or `start`
/// query parameter. Only the leading run of digits counts (`t=90s` is 90).
///
/// Returns 0 for unknown hosts, missing parameters and unparsable values.
pub fn parse_start_offset(raw: &str) -> u32 {
    Url::parse(raw.trim())
        .map(|url| start_offset(&url))
        .unwrap_or(0)
}

/// [`parse_start_offset`] for an already parsed URL.
pub fn start_offset(url: &Url) -> u32 {
    if !is_video_sharing_link(url) {
        return 0;
    }

    query_value(url, "t")
        .or_else(|| query_value(url, "start"))
        .map(|value| leading_seconds(&value))
        .unwrap_or(0)
}

fn is_video_sharing_link(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };

    if host == SHORT_HOST {
        return true;
    }

    let watch_host = host == WATCH_HOST
        || host
            .strip_suffix(WATCH_HOST)
            .is_some_and(|prefix| prefix.ends_with('.'));
    watch_host && url.path().starts_with("/watch")
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

fn leading_seconds(value: &str) -> u32 {
    let digits: String =
        value.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
