//! Remote byte sources: the seam between the fetcher and the network.

use std::time::Duration;

use crate::retry::SegmentError;

/// Fetches the full body of a URL. Implementations must be usable from
/// several worker threads at once.
pub trait RemoteSource: Send + Sync {
    fn get(&self, url: &str) -> Result<Vec<u8>, SegmentError>;

    /// Convenience for text resources such as manifests.
    fn get_text(&self, url: &str) -> Result<String, SegmentError> {
        let bytes = self.get(url)?;
        String::from_utf8(bytes)
            .map_err(|e| SegmentError::Transport(format!("response is not UTF-8: {}", e)))
    }
}

/// libcurl-backed source; one easy handle per request.
#[derive(Debug, Clone, Copy)]
pub struct CurlSource {
    pub connect_timeout: Duration,
    /// Abort when throughput stays below `low_speed_limit` bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    /// Hard upper bound for one transfer.
    pub timeout: Duration,
}

impl Default for CurlSource {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            timeout: Duration::from_secs(600),
        }
    }
}

impl RemoteSource for CurlSource {
    fn get(&self, url: &str) -> Result<Vec<u8>, SegmentError> {
        let mut body = Vec::new();
        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(SegmentError::Curl)?;
        easy.follow_location(true).map_err(SegmentError::Curl)?;
        easy.max_redirections(10).map_err(SegmentError::Curl)?;
        easy.connect_timeout(self.connect_timeout)
            .map_err(SegmentError::Curl)?;
        easy.low_speed_limit(self.low_speed_limit)
            .map_err(SegmentError::Curl)?;
        easy.low_speed_time(self.low_speed_time)
            .map_err(SegmentError::Curl)?;
        easy.timeout(self.timeout).map_err(SegmentError::Curl)?;

        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(SegmentError::Curl)?;
            transfer.perform().map_err(SegmentError::Curl)?;
        }

        let code = easy.response_code().map_err(SegmentError::Curl)?;
        if !(200..300).contains(&code) {
            return Err(SegmentError::Http(code));
        }
        Ok(body)
    }
}
