//! Video id extraction from user input (bare id or video page URL).

/// Extracts a positive numeric video id from `input`.
///
/// Accepts a bare id (`"870835569"`) or an absolute URL whose path contains a
/// `video/` or `videos/` segment followed by the id
/// (`https://www.twitch.tv/videos/870835569`). Returns `None` otherwise.
pub fn parse_video_id(input: &str) -> Option<u64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Some(id) = positive_id(input) {
        return Some(id);
    }

    let parsed = url::Url::parse(input).ok()?;
    let mut segments = parsed.path_segments()?;
    while let Some(segment) = segments.next() {
        if segment.eq_ignore_ascii_case("video") || segment.eq_ignore_ascii_case("videos") {
            return segments.next().and_then(positive_id);
        }
    }
    None
}

fn positive_id(s: &str) -> Option<u64> {
    s.trim_matches('/').parse::<u64>().ok().filter(|id| *id > 0)
}
