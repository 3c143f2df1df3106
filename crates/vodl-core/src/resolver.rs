//! Collaborator interfaces for turning user input into a job's video
//! descriptor and credentials.
//!
//! The engine never talks to the platform's metadata or token APIs itself;
//! front-ends plug an implementation in here.

use crate::video::{VideoDescriptor, VodAuthInfo};

/// Looks up a recording by id or URL.
pub trait MetadataProvider {
    fn resolve_video(&self, query: &str) -> anyhow::Result<VideoDescriptor>;
}

/// Supplies playback credentials for a recording.
pub trait AuthProvider {
    fn auth_info(&self, video_id: &str) -> anyhow::Result<VodAuthInfo>;
}

/// Provider for a descriptor that is already known, e.g. assembled from
/// command-line arguments. Any query matching its id or page URL resolves.
#[derive(Debug, Clone)]
pub struct KnownVideo(pub VideoDescriptor);

impl MetadataProvider for KnownVideo {
    fn resolve_video(&self, query: &str) -> anyhow::Result<VideoDescriptor> {
        let wanted = crate::video::parse_video_id(query)
            .ok_or_else(|| anyhow::anyhow!("'{}' is not a video id or url", query))?;
        if wanted.to_string() != self.0.id() {
            anyhow::bail!("unknown video {}", wanted);
        }
        Ok(self.0.clone())
    }
}

/// Returns the same credentials for every video.
#[derive(Debug, Clone)]
pub struct StaticAuth(pub VodAuthInfo);

impl AuthProvider for StaticAuth {
    fn auth_info(&self, _video_id: &str) -> anyhow::Result<VodAuthInfo> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::sample_fields;

    fn known() -> KnownVideo {
        KnownVideo(VideoDescriptor::new(sample_fields()).unwrap())
    }

    #[test]
    fn known_video_resolves_id_and_url() {
        let provider = known();
        let id = provider.0.id().to_string();
        assert_eq!(provider.resolve_video(&id).unwrap().id(), id);
        let url = provider.0.page_url();
        assert_eq!(provider.resolve_video(&url).unwrap().id(), id);
    }

    #[test]
    fn known_video_rejects_other_ids() {
        let provider = known();
        assert!(provider.resolve_video("1").is_err());
        assert!(provider.resolve_video("not a video").is_err());
    }

    #[test]
    fn static_auth_passes_through() {
        let auth = StaticAuth(VodAuthInfo::anonymous());
        let info = auth.auth_info("123").unwrap();
        assert_eq!(info, VodAuthInfo::anonymous());
    }
}
