//! Audio sources and their resolution.
//!
//! A source must be fully resolved before it reaches the playback controller:
//! local files are checked against the configured audio directory, remote
//! pages are turned into a direct stream URL with `yt-dlp`.

use std::path::{Component, Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

use super::error::{VoiceError, VoiceResult};

/// Something the transport can play.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    /// A file on the bot's filesystem.
    Local(PathBuf),
    /// A remote page resolved to a direct audio stream.
    Stream(StreamInfo),
}

impl AudioSource {
    /// Short human-readable name for replies and logs.
    pub fn describe(&self) -> String {
        match self {
            AudioSource::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            AudioSource::Stream(info) => info.title.clone(),
        }
    }
}

/// The parts of `yt-dlp --dump-json` output needed for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub title: String,
    /// The page the user asked for.
    pub page_url: String,
    /// Direct media URL handed to the transport.
    pub stream_url: String,
    pub duration: Option<Duration>,
}

impl StreamInfo {
    /// Parse a `yt-dlp -j` document. `requested_url` is kept as the page URL
    /// when the document doesn't carry one.
    pub fn from_json(raw: &str, requested_url: &str) -> VoiceResult<Self> {
        let info: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
            VoiceError::SourceResolutionFailed(format!("Failed to parse video metadata: {}", e))
        })?;

        // With a format selector yt-dlp puts the chosen format's URL at the top
        // level; older output only lists the formats.
        let stream_url = info["url"]
            .as_str()
            .or_else(|| info["formats"][0]["url"].as_str())
            .ok_or_else(|| {
                VoiceError::SourceResolutionFailed("No playable audio format found".to_string())
            })?
            .to_string();

        let title = info["title"]
            .as_str()
            .unwrap_or("Unknown Title")
            .to_string();

        let page_url = info["webpage_url"]
            .as_str()
            .unwrap_or(requested_url)
            .to_string();

        let duration = info["duration"].as_f64().map(Duration::from_secs_f64);

        Ok(Self {
            title,
            page_url,
            stream_url,
            duration,
        })
    }
}

/// Converts a finished `yt-dlp` process into [`StreamInfo`].
impl TryFrom<(Output, &str)> for StreamInfo {
    type Error = VoiceError;

    fn try_from((output, requested_url): (Output, &str)) -> Result<Self, Self::Error> {
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("yt-dlp exited with an error");
            return Err(VoiceError::SourceResolutionFailed(reason.trim().to_string()));
        }

        Self::from_json(&String::from_utf8_lossy(&output.stdout), requested_url)
    }
}

/// Resolves user input into an [`AudioSource`].
#[derive(Debug, Clone)]
pub struct SourceResolver {
    audio_dir: PathBuf,
    ytdlp_path: String,
}

impl SourceResolver {
    pub fn new(audio_dir: impl Into<PathBuf>, ytdlp_path: impl Into<String>) -> Self {
        Self {
            audio_dir: audio_dir.into(),
            ytdlp_path: ytdlp_path.into(),
        }
    }

    /// Resolve `filename` inside the audio directory.
    pub async fn resolve_local(&self, filename: &str) -> VoiceResult<AudioSource> {
        let relative = Path::new(filename.trim());
        let path = self.audio_dir.join(relative);

        if !Self::is_contained(relative) {
            warn!("Rejected local file outside the audio directory: {}", filename);
            return Err(VoiceError::FileNotFound(path));
        }

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {
                debug!("Resolved local file {}", path.display());
                Ok(AudioSource::Local(path))
            }
            _ => Err(VoiceError::FileNotFound(path)),
        }
    }

    /// Resolve a remote page to a direct stream using `yt-dlp`.
    pub async fn resolve_remote(&self, url: &str) -> VoiceResult<AudioSource> {
        let url = url.trim();
        if !Self::is_url(url) {
            return Err(VoiceError::SourceResolutionFailed(format!(
                "Not a valid URL: {}",
                url
            )));
        }

        info!("Resolving audio stream for URL: {}", url);

        let output = Command::new(&self.ytdlp_path)
            .args([
                "-j",            // Output as JSON
                "--no-playlist", // Don't process playlists
                "-f",
                "bestaudio/best",
                url,
            ])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                VoiceError::SourceResolutionFailed(format!("Failed to run {}: {}", self.ytdlp_path, e))
            })?;

        let info = StreamInfo::try_from((output, url))?;
        debug!("Audio URL for {}: {}", url, info.stream_url);
        Ok(AudioSource::Stream(info))
    }

    /// Accepts only http(s) URLs.
    pub fn is_url(input: &str) -> bool {
        Url::parse(input).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
    }

    fn is_contained(relative: &Path) -> bool {
        relative.components().next().is_some()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn top_level_url_wins_over_format_list() {
        let raw = r#"{
            "title": "Song",
            "webpage_url": "https://www.youtube.com/watch?v=abc",
            "url": "https://cdn.example/selected",
            "duration": 215.5,
            "formats": [{ "url": "https://cdn.example/first" }]
        }"#;

        let info = StreamInfo::from_json(raw, "https://youtu.be/abc").unwrap();

        assert_eq!(info.stream_url, "https://cdn.example/selected");
        assert_eq!(info.page_url, "https://www.youtube.com/watch?v=abc");
        assert_eq!(info.title, "Song");
        assert_eq!(info.duration, Some(Duration::from_secs_f64(215.5)));
    }

    #[test]
    fn falls_back_to_first_format() {
        let raw = r#"{ "formats": [{ "url": "https://cdn.example/first" }, { "url": "https://cdn.example/second" }] }"#;

        let info = StreamInfo::from_json(raw, "https://example.com/page").unwrap();

        assert_eq!(info.stream_url, "https://cdn.example/first");
        assert_eq!(info.page_url, "https://example.com/page");
        assert_eq!(info.title, "Unknown Title");
        assert_eq!(info.duration, None);
    }

    #[test]
    fn no_formats_is_a_resolution_failure() {
        let err = StreamInfo::from_json(r#"{ "title": "x" }"#, "https://e.com").unwrap_err();
        assert_matches!(err, VoiceError::SourceResolutionFailed(_));
    }

    #[test]
    fn garbage_output_is_a_resolution_failure() {
        let err = StreamInfo::from_json("ERROR: video unavailable", "https://e.com").unwrap_err();
        assert_matches!(err, VoiceError::SourceResolutionFailed(msg) if msg.contains("parse"));
    }

    #[test_case("https://www.youtube.com/watch?v=abc", true ; "https url")]
    #[test_case("http://example.com/a.mp3", true ; "http url")]
    #[test_case("ftp://example.com/a.mp3", false ; "other scheme")]
    #[test_case("never gonna give you up", false ; "search text")]
    fn url_detection(input: &str, expected: bool) {
        assert_eq!(SourceResolver::is_url(input), expected);
    }

    #[tokio::test]
    async fn resolves_existing_local_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("intro.mp3"), b"ID3").unwrap();
        let resolver = SourceResolver::new(dir.path(), "yt-dlp");

        let source = resolver.resolve_local("intro.mp3").await.unwrap();

        assert_eq!(source, AudioSource::Local(dir.path().join("intro.mp3")));
        assert_eq!(source.describe(), "intro.mp3");
    }

    #[test_case("missing.mp3" ; "missing file")]
    #[test_case("../secret.mp3" ; "parent traversal")]
    #[test_case("/etc/passwd" ; "absolute path")]
    #[test_case("" ; "empty name")]
    #[tokio::test]
    async fn unresolvable_local_files(filename: &str) {
        let dir = tempfile::tempdir().unwrap();
        let resolver = SourceResolver::new(dir.path(), "yt-dlp");

        let err = resolver.resolve_local(filename).await.unwrap_err();

        assert_matches!(err, VoiceError::FileNotFound(_));
    }

    #[tokio::test]
    async fn directories_are_not_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("albums")).unwrap();
        let resolver = SourceResolver::new(dir.path(), "yt-dlp");

        assert_matches!(
            resolver.resolve_local("albums").await,
            Err(VoiceError::FileNotFound(_))
        );
    }

    #[tokio::test]
    async fn remote_rejects_non_urls_without_spawning() {
        let resolver = SourceResolver::new(".", "/nonexistent/yt-dlp");

        let err = resolver.resolve_remote("not a url").await.unwrap_err();

        assert_matches!(err, VoiceError::SourceResolutionFailed(msg) if msg.starts_with("Not a valid URL"));
    }

    #[tokio::test]
    async fn missing_resolver_binary_is_a_resolution_failure() {
        let resolver = SourceResolver::new(".", "/nonexistent/yt-dlp");

        let err = resolver
            .resolve_remote("https://www.youtube.com/watch?v=abc")
            .await
            .unwrap_err();

        assert_matches!(err, VoiceError::SourceResolutionFailed(_));
    }
}
