//! Transcript archive: domain model and persistence port.

pub mod model;
pub mod repository;

pub use model::{ChatArchive, DateKey, Turn};
pub use repository::ArchiveRepository;
