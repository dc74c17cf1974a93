//! Admission Filter Module
//!
//! Decides whether a request is worth routing through the cache at all, and
//! whether a completed response is media worth persisting. Both gates are
//! total: every input maps to a boolean, ambiguous metadata maps to `false`.

use url::Url;

use crate::config::DEFAULT_DRM_LICENSE_DOMAIN;

/// Static assets that are never media.
const STATIC_ASSET_EXTENSIONS: &[&str] = &[
    ".js", ".mjs", ".css", ".html", ".json", ".woff", ".woff2", ".svg", ".png", ".jpg", ".jpeg",
    ".gif", ".ico",
];

/// Source-like extensions that collide with MPEG-TS segments.
const SOURCE_EXTENSIONS: &[&str] = &[".ts", ".tsx"];

/// Playlists must always be fetched fresh.
const MANIFEST_EXTENSIONS: &[&str] = &[".m3u8", ".mpd"];

const MANIFEST_CONTENT_TYPES: &[&str] = &[
    "application/dash+xml",
    "application/vnd.apple.mpegurl",
    "audio/mpegurl",
    "audio/x-mpegurl",
    "application/x-mpegurl",
    "video/x-mpegurl",
    "video/mpegurl",
    "application/mpegurl",
];

const SEGMENT_EXTENSIONS: &[&str] = &[".m4s", ".mp4", ".ts", ".aac", ".dash"];

const MEDIA_PATH_MARKERS: &[&str] = &["media", "segment", "chunk"];

const OCTET_STREAM: &str = "application/octet-stream";

// == Admission Filter ==
/// Two-stage classifier for media segment requests.
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    /// Lower-cased host suffixes of DRM license servers
    drm_license_domains: Vec<String>,
}

impl AdmissionFilter {
    // == Constructor ==
    /// Creates a filter excluding the given DRM license host suffixes.
    pub fn new<I, S>(drm_license_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            drm_license_domains: drm_license_domains
                .into_iter()
                .map(|domain| domain.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    // == URL Stage ==
    /// Returns true if the URL may be served through the cache.
    ///
    /// Runs before any network activity. A `false` result means the request
    /// bypasses the cache entirely: no lookup, no dedup, no storage.
    pub fn admit_by_url(&self, url: &Url) -> bool {
        let path = url.path().to_ascii_lowercase();

        if ends_with_any(&path, STATIC_ASSET_EXTENSIONS) {
            return false;
        }

        if ends_with_any(&path, SOURCE_EXTENSIONS) && !contains_any(&path, MEDIA_PATH_MARKERS) {
            return false;
        }

        if ends_with_any(&path, MANIFEST_EXTENSIONS) {
            return false;
        }

        !self.is_drm_license_host(url)
    }

    // == Content Stage ==
    /// Returns true if a completed response is cacheable media.
    ///
    /// `content_type` is compared by its essence (parameters stripped,
    /// case-insensitive). An empty value is just another non-matching type.
    pub fn admit_by_content(&self, url: &Url, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if MANIFEST_CONTENT_TYPES.contains(&essence.as_str()) {
            return false;
        }

        if essence.starts_with("audio/") || essence.starts_with("video/") {
            return true;
        }

        if essence == OCTET_STREAM {
            let path = url.path().to_ascii_lowercase();
            return ends_with_any(&path, SEGMENT_EXTENSIONS)
                || contains_any(&path, MEDIA_PATH_MARKERS);
        }

        false
    }

    fn is_drm_license_host(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.drm_license_domains
            .iter()
            .any(|domain| host.ends_with(domain.as_str()))
    }
}

impl Default for AdmissionFilter {
    fn default() -> Self {
        Self::new([DEFAULT_DRM_LICENSE_DOMAIN])
    }
}

fn ends_with_any(path: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|suffix| path.ends_with(suffix))
}

fn contains_any(path: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| path.contains(marker))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_static_assets_rejected() {
        let filter = AdmissionFilter::default();
        for raw in [
            "https://cdn.example/app.js",
            "https://cdn.example/styles/site.css",
            "https://cdn.example/logo.PNG",
            "https://cdn.example/fonts/inter.woff2",
            "https://cdn.example/favicon.ico",
        ] {
            assert!(!filter.admit_by_url(&url(raw)), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_ts_requires_media_marker() {
        let filter = AdmissionFilter::default();
        assert!(!filter.admit_by_url(&url("https://cdn.example/src/main.ts")));
        assert!(!filter.admit_by_url(&url("https://cdn.example/App.tsx")));
        assert!(filter.admit_by_url(&url("https://cdn.example/hls/segment_004.ts")));
        assert!(filter.admit_by_url(&url("https://cdn.example/media/0001.ts")));
    }

    #[test]
    fn test_manifests_rejected_by_url() {
        let filter = AdmissionFilter::default();
        assert!(!filter.admit_by_url(&url("https://cdn.example/master.m3u8")));
        assert!(!filter.admit_by_url(&url("https://cdn.example/dash/stream.MPD")));
    }

    #[test]
    fn test_drm_license_host_rejected() {
        let filter = AdmissionFilter::default();
        assert!(!filter.admit_by_url(&url("https://widevine.ezdrm.com/proxy?pX=1")));
        assert!(!filter.admit_by_url(&url("https://fps.EZDRM.com/api/license")));
        assert!(filter.admit_by_url(&url("https://cdn.example/license-free/seg1.m4s")));
    }

    #[test]
    fn test_custom_drm_domains() {
        let filter = AdmissionFilter::new(["License.Example"]);
        assert!(!filter.admit_by_url(&url("https://drm.license.example/wv")));
        assert!(filter.admit_by_url(&url("https://widevine.ezdrm.com/seg.m4s")));
    }

    #[test]
    fn test_segment_urls_admitted() {
        let filter = AdmissionFilter::default();
        assert!(filter.admit_by_url(&url("https://cdn.example/segment1.m4s")));
        assert!(filter.admit_by_url(&url("https://cdn.example/video/init.mp4?token=abc")));
        assert!(filter.admit_by_url(&url("https://cdn.example/no-extension")));
    }

    #[test]
    fn test_content_audio_video_admitted() {
        let filter = AdmissionFilter::default();
        let segment = url("https://cdn.example/segment1.m4s");
        assert!(filter.admit_by_content(&segment, "video/mp4"));
        assert!(filter.admit_by_content(&segment, "audio/mp4; codecs=\"mp4a.40.2\""));
        assert!(filter.admit_by_content(&segment, "Video/MP2T"));
    }

    #[test]
    fn test_content_manifest_types_rejected() {
        let filter = AdmissionFilter::default();
        // Extension spoofing: a segment-looking URL serving a playlist
        let spoofed = url("https://cdn.example/segment1.m4s");
        assert!(!filter.admit_by_content(&spoofed, "application/vnd.apple.mpegurl"));
        assert!(!filter.admit_by_content(&spoofed, "video/x-mpegurl"));
        assert!(!filter.admit_by_content(&spoofed, "audio/mpegurl"));
        assert!(!filter.admit_by_content(&spoofed, "application/dash+xml; charset=utf-8"));
    }

    #[test]
    fn test_content_octet_stream_needs_segment_path() {
        let filter = AdmissionFilter::default();
        assert!(filter.admit_by_content(&url("https://cdn.example/a/b.m4s"), OCTET_STREAM));
        assert!(filter.admit_by_content(&url("https://cdn.example/x.dash"), OCTET_STREAM));
        assert!(filter.admit_by_content(&url("https://cdn.example/chunk-17"), OCTET_STREAM));
        assert!(!filter.admit_by_content(&url("https://cdn.example/blob.bin"), OCTET_STREAM));
    }

    #[test]
    fn test_content_missing_or_other_rejected() {
        let filter = AdmissionFilter::default();
        let segment = url("https://cdn.example/segment1.m4s");
        assert!(!filter.admit_by_content(&segment, ""));
        assert!(!filter.admit_by_content(&segment, "text/html"));
        assert!(!filter.admit_by_content(&segment, "application/json"));
    }
}
