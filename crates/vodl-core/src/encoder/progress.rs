//! Parsing of ffmpeg's stderr progress lines.

/// `HH:MM:SS.ms` to seconds.
pub fn parse_time(time_str: &str) -> Option<f64> {
    let mut parts = time_str.split(':');
    let (h, m, s) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let hours: f64 = h.trim().parse().ok()?;
    let minutes: f64 = m.trim().parse().ok()?;
    let seconds: f64 = s.trim().parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Extracts the `time=` field of a progress line, in seconds.
pub fn parse_time_field(line: &str) -> Option<f64> {
    let start = line.find("time=")?;
    let rest = line[start + 5..].trim_start();
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    parse_time(&rest[..end])
}
