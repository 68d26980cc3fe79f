//! JSON-file ArchiveRepository implementation.
//!
//! The whole archive lives in one pretty-printed JSON file
//! (`chat_history.json` by default). Loading degrades to an empty archive
//! when the file is missing; a corrupt file (unparseable JSON or non-UTF-8
//! bytes) is quarantined first so the next save cannot silently overwrite
//! it.

use crate::paths::EduvoxPaths;
use crate::storage::{AtomicJsonError, AtomicJsonFile};
use async_trait::async_trait;
use eduvox_core::archive::{ArchiveRepository, ChatArchive};
use eduvox_core::error::Result;
use std::path::PathBuf;

/// File-backed repository for the transcript archive.
pub struct JsonArchiveRepository {
    file: AtomicJsonFile<ChatArchive>,
}

impl JsonArchiveRepository {
    /// Creates a repository over an explicit archive file path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
        }
    }

    /// Creates a repository at the default location in the data directory.
    ///
    /// # Arguments
    ///
    /// * `file_name` - Archive file name from `StorageConfig`
    pub fn default_location(file_name: &str) -> Result<Self> {
        let path = EduvoxPaths::archive_file(file_name)
            .map_err(|e| eduvox_core::EduvoxError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    /// Moves a corrupt archive file aside to `<name>.corrupt`.
    ///
    /// Any previous quarantined file is replaced. The rename keeps the bad
    /// data recoverable by hand while letting the session start empty.
    fn quarantine_corrupt_file(&self) -> std::io::Result<PathBuf> {
        let path = self.file.path();
        let mut corrupt_path = path.clone();
        corrupt_path.set_extension("json.corrupt");
        std::fs::rename(path, &corrupt_path)?;
        Ok(corrupt_path)
    }
}

/// Corrupt means the file's bytes cannot be the archive: JSON that does not
/// parse, or content that is not UTF-8 text at all. OS-level read failures
/// (permissions, hardware) are not corruption and propagate as storage
/// errors, since the archive may be intact but inaccessible.
fn is_corrupt(err: &AtomicJsonError) -> bool {
    match err {
        AtomicJsonError::JsonError(_) => true,
        AtomicJsonError::IoError(e) => e.kind() == std::io::ErrorKind::InvalidData,
    }
}

#[async_trait]
impl ArchiveRepository for JsonArchiveRepository {
    async fn load(&self) -> Result<ChatArchive> {
        match self.file.load() {
            Ok(Some(archive)) => Ok(archive),
            Ok(None) => Ok(ChatArchive::new()),
            Err(err) if is_corrupt(&err) => {
                match self.quarantine_corrupt_file() {
                    Ok(corrupt_path) => {
                        tracing::warn!(
                            "[JsonArchiveRepository] Archive file was corrupt ({}); moved to {} and starting empty",
                            err,
                            corrupt_path.display()
                        );
                    }
                    Err(rename_err) => {
                        tracing::warn!(
                            "[JsonArchiveRepository] Archive file was corrupt ({}) and could not be moved aside: {}",
                            err,
                            rename_err
                        );
                    }
                }
                Ok(ChatArchive::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, archive: &ChatArchive) -> Result<()> {
        self.file.save(archive)?;
        tracing::debug!(
            "[JsonArchiveRepository] Saved archive to {}",
            self.file.path().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eduvox_core::archive::{DateKey, Turn};
    use tempfile::TempDir;

    fn repository_in(dir: &TempDir) -> JsonArchiveRepository {
        JsonArchiveRepository::new(dir.path().join("chat_history.json"))
    }

    #[tokio::test]
    async fn load_missing_file_yields_empty_archive() {
        let dir = TempDir::new().unwrap();
        let repo = repository_in(&dir);

        let archive = repo.load().await.unwrap();
        assert!(archive.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let repo = repository_in(&dir);

        let mut archive = ChatArchive::new();
        archive.append(
            DateKey::new("2024-06-01"),
            Turn::new(
                "What is gravity?",
                "...",
                Some("/tmp/a.mp3".to_string()),
            ),
        );

        repo.save(&archive).await.unwrap();
        let restored = repo.load().await.unwrap();
        assert_eq!(restored, archive);

        let turns = restored.turns(&DateKey::new("2024-06-01"));
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].inputs, "What is gravity?");
        assert_eq!(turns[0].voiceover.as_deref(), Some("/tmp/a.mp3"));
    }

    #[tokio::test]
    async fn save_after_load_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let repo = repository_in(&dir);

        let mut archive = ChatArchive::new();
        archive.append(DateKey::new("2024-06-01"), Turn::new("hi", "hello", None));
        repo.save(&archive).await.unwrap();

        let first_load = repo.load().await.unwrap();
        repo.save(&first_load).await.unwrap();
        let second_load = repo.load().await.unwrap();

        assert_eq!(first_load, second_load);
    }

    #[tokio::test]
    async fn corrupt_file_is_quarantined_and_load_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let archive_path = dir.path().join("chat_history.json");
        std::fs::write(&archive_path, "{ definitely not json").unwrap();
        let repo = JsonArchiveRepository::new(archive_path.clone());

        let archive = repo.load().await.unwrap();
        assert!(archive.is_empty());

        // The bad file moved aside; the slot is free for the next save.
        assert!(!archive_path.exists());
        assert!(dir.path().join("chat_history.json.corrupt").exists());
    }

    #[tokio::test]
    async fn non_utf8_archive_is_quarantined_and_load_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let archive_path = dir.path().join("chat_history.json");
        std::fs::write(&archive_path, [0xFF, 0xFE, 0x00, 0x7B]).unwrap();
        let repo = JsonArchiveRepository::new(archive_path.clone());

        let archive = repo.load().await.unwrap();
        assert!(archive.is_empty());

        assert!(!archive_path.exists());
        assert!(dir.path().join("chat_history.json.corrupt").exists());
    }

    #[tokio::test]
    async fn reads_the_hand_written_on_disk_format() {
        let dir = TempDir::new().unwrap();
        let archive_path = dir.path().join("chat_history.json");
        std::fs::write(
            &archive_path,
            r#"{
    "2024-06-01": [
        {
            "inputs": "What is gravity?",
            "bot_response": "A force.",
            "voiceover": "/tmp/a.mp3"
        },
        {
            "inputs": "Thanks",
            "bot_response": "Anytime."
        }
    ]
}"#,
        )
        .unwrap();

        let repo = JsonArchiveRepository::new(archive_path);
        let archive = repo.load().await.unwrap();

        let turns = archive.turns(&DateKey::new("2024-06-01"));
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].voiceover, None);
    }
}
