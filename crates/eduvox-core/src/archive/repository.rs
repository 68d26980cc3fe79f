//! Archive repository trait.
//!
//! Defines the persistence interface for the transcript archive. The whole
//! archive loads and saves as one unit; there are no partial or incremental
//! writes.

use super::model::ChatArchive;
use crate::error::Result;
use async_trait::async_trait;

/// Persistence port for the transcript archive.
///
/// Implementations own the durable representation. The single-writer
/// assumption holds throughout: one session is the only writer of its
/// archive file, so no cross-process locking is provided.
#[async_trait]
pub trait ArchiveRepository: Send + Sync {
    /// Loads the archive from durable storage.
    ///
    /// # Returns
    ///
    /// - `Ok(ChatArchive)`: the stored archive, or an empty one when no
    ///   usable archive exists yet
    /// - `Err`: the storage itself could not be accessed
    async fn load(&self) -> Result<ChatArchive>;

    /// Persists the full archive, replacing the previous durable state.
    ///
    /// A crash mid-save must leave either the previous or the new state on
    /// disk ("last successful save wins").
    async fn save(&self, archive: &ChatArchive) -> Result<()>;
}
