//! Voice artifact store.
//!
//! Owns the synthesized-audio side of a chat turn: it asks the synthesis
//! backend for MP3 bytes, files them under a content-addressed name, and can
//! later render a self-contained inline player for any stored path.
//!
//! Artifacts are keyed by a digest of (language, rate, text), so repeating a
//! reply reuses the existing file instead of allocating a new one. A cap on
//! the artifact count bounds disk growth; the oldest files are evicted
//! first. Paths recorded in old turns may therefore go stale, which playback
//! treats as "no voiceover available" rather than an error.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use eduvox_core::backend::SpeechSynthesizer;
use eduvox_core::config::{SpeakingRate, VoiceConfig};
use eduvox_core::error::Result;
use eduvox_core::EduvoxError;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::PathBuf;
use std::sync::Arc;

/// Content-addressed store for synthesized voiceover files.
pub struct VoiceArtifactStore {
    dir: PathBuf,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    language: String,
    rate: SpeakingRate,
    cache_limit: usize,
}

impl VoiceArtifactStore {
    /// Creates a store over an artifact directory.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory that holds the `.mp3` artifacts
    /// * `synthesizer` - The text-to-speech backend
    /// * `voice` - Language and speaking rate (part of the artifact identity)
    /// * `cache_limit` - Maximum number of artifacts to keep. Clamped to at
    ///   least one, so the artifact just stored for the current turn is never
    ///   deleted by its own eviction pass.
    pub fn new(
        dir: PathBuf,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        voice: &VoiceConfig,
        cache_limit: usize,
    ) -> Self {
        Self {
            dir,
            synthesizer,
            language: voice.language.clone(),
            rate: voice.rate,
            cache_limit: cache_limit.max(1),
        }
    }

    /// Synthesizes `text` and returns the path of the stored artifact.
    ///
    /// A cache hit returns the existing path without calling the backend.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: path to the `.mp3` file
    /// - `Err(EduvoxError::Synthesis(_))`: the backend failed or the text is empty
    /// - `Err(EduvoxError::Storage { .. })`: the artifact could not be written
    pub async fn store_voiceover(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(EduvoxError::synthesis("no text to synthesize"));
        }

        let path = self.dir.join(self.artifact_name(text));
        if path.exists() {
            tracing::debug!(
                "[VoiceArtifactStore] Reusing artifact {}",
                path.display()
            );
            return Ok(path.to_string_lossy().into_owned());
        }

        let bytes = self.synthesizer.synthesize(text).await?;
        self.write_artifact(&path, &bytes)?;
        tracing::info!(
            "[VoiceArtifactStore] Stored voiceover ({} bytes) at {}",
            bytes.len(),
            path.display()
        );

        if let Err(e) = self.evict_excess() {
            tracing::warn!("[VoiceArtifactStore] Artifact eviction failed: {}", e);
        }

        Ok(path.to_string_lossy().into_owned())
    }

    /// Derives the content-addressed file name for a reply text.
    fn artifact_name(&self, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.language.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.rate.to_string().as_bytes());
        hasher.update(b"\n");
        hasher.update(text.as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("{}.mp3", &digest[..16])
    }

    /// Writes artifact bytes with the tmp-then-rename idiom.
    fn write_artifact(&self, path: &PathBuf, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact.mp3".to_string());
        let tmp_path = self.dir.join(format!(".{}.tmp", file_name));

        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(bytes)?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Removes the oldest artifacts once the cap is exceeded.
    fn evict_excess(&self) -> std::io::Result<usize> {
        let mut artifacts = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|ext| ext == "mp3").unwrap_or(false) {
                let modified = entry.metadata()?.modified()?;
                artifacts.push((modified, path));
            }
        }

        if artifacts.len() <= self.cache_limit {
            return Ok(0);
        }

        artifacts.sort_by_key(|(modified, _)| *modified);
        let excess = artifacts.len() - self.cache_limit;
        let mut removed = 0;
        for (_, path) in artifacts.into_iter().take(excess) {
            fs::remove_file(&path)?;
            tracing::debug!("[VoiceArtifactStore] Evicted artifact {}", path.display());
            removed += 1;
        }
        Ok(removed)
    }
}

/// Renders a replayable inline audio player for a stored artifact.
///
/// Reads the file, embeds its bytes as a base64 data URI, and wraps them in
/// a self-contained `<audio>` element. An empty path, a missing file, or an
/// unreadable file all yield an empty string; this never errors.
pub fn render_player(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return String::new(),
    };

    let encoded = BASE64_STANDARD.encode(bytes);
    format!(
        "<audio controls><source src=\"data:audio/mp3;base64,{}\" type=\"audio/mp3\">Your browser does not support the audio element.</audio>",
        encoded
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct MockSynthesizer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl MockSynthesizer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for MockSynthesizer {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EduvoxError::synthesis("backend unavailable"));
            }
            Ok(format!("mp3:{}", text).into_bytes())
        }
    }

    fn store_in(dir: &TempDir, synthesizer: Arc<MockSynthesizer>, limit: usize) -> VoiceArtifactStore {
        VoiceArtifactStore::new(
            dir.path().join("voiceovers"),
            synthesizer,
            &VoiceConfig::default(),
            limit,
        )
    }

    fn mp3_count(store_dir: &std::path::Path) -> usize {
        std::fs::read_dir(store_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().map(|x| x == "mp3").unwrap_or(false))
                    .count()
            })
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn identical_text_reuses_the_artifact() {
        let dir = TempDir::new().unwrap();
        let synthesizer = Arc::new(MockSynthesizer::new());
        let store = store_in(&dir, synthesizer.clone(), 16);

        let first = store.store_voiceover("The mitochondria is...").await.unwrap();
        let second = store.store_voiceover("The mitochondria is...").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(synthesizer.call_count(), 1);
        assert_eq!(mp3_count(&dir.path().join("voiceovers")), 1);
    }

    #[tokio::test]
    async fn distinct_texts_get_distinct_artifacts() {
        let dir = TempDir::new().unwrap();
        let synthesizer = Arc::new(MockSynthesizer::new());
        let store = store_in(&dir, synthesizer, 16);

        let a = store.store_voiceover("first reply").await.unwrap();
        let b = store.store_voiceover("second reply").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(mp3_count(&dir.path().join("voiceovers")), 2);
    }

    #[tokio::test]
    async fn eviction_keeps_the_artifact_count_at_the_cap() {
        let dir = TempDir::new().unwrap();
        let synthesizer = Arc::new(MockSynthesizer::new());
        let store = store_in(&dir, synthesizer, 2);

        store.store_voiceover("one").await.unwrap();
        store.store_voiceover("two").await.unwrap();
        store.store_voiceover("three").await.unwrap();

        assert_eq!(mp3_count(&dir.path().join("voiceovers")), 2);
    }

    #[tokio::test]
    async fn zero_cache_limit_still_keeps_the_artifact_just_stored() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, Arc::new(MockSynthesizer::new()), 0);

        let path = store.store_voiceover("still audible").await.unwrap();

        assert!(std::path::Path::new(&path).is_file());
        assert!(!render_player(&path).is_empty());
        assert_eq!(mp3_count(&dir.path().join("voiceovers")), 1);
    }

    #[tokio::test]
    async fn empty_text_is_a_synthesis_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, Arc::new(MockSynthesizer::new()), 16);

        let result = store.store_voiceover("   ").await;
        assert!(matches!(result, Err(EduvoxError::Synthesis(_))));
    }

    #[tokio::test]
    async fn backend_failure_propagates_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, Arc::new(MockSynthesizer::failing()), 16);

        let result = store.store_voiceover("hello").await;
        assert!(matches!(result, Err(EduvoxError::Synthesis(_))));
        assert_eq!(mp3_count(&dir.path().join("voiceovers")), 0);
    }

    #[tokio::test]
    async fn stored_artifact_renders_as_an_inline_player() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, Arc::new(MockSynthesizer::new()), 16);

        let path = store.store_voiceover("hello world").await.unwrap();
        let player = render_player(&path);

        let expected_payload = BASE64_STANDARD.encode(b"mp3:hello world");
        assert!(player.starts_with("<audio controls>"));
        assert!(player.contains(&expected_payload));
        assert!(player.ends_with("</audio>"));
    }

    #[test]
    fn render_player_degrades_to_empty() {
        assert_eq!(render_player(""), "");
        assert_eq!(render_player("/nonexistent/voice.mp3"), "");
    }
}
