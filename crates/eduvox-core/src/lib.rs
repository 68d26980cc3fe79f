pub mod archive;
pub mod backend;
pub mod config;
pub mod error;
pub mod secret;

// Re-export common error type
pub use error::EduvoxError;
