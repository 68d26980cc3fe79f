pub mod archive_repository;
pub mod config_service;
pub mod paths;
pub mod secret_service;
pub mod storage;
pub mod voice_store;

pub use crate::archive_repository::JsonArchiveRepository;
pub use crate::config_service::ConfigService;
pub use crate::paths::EduvoxPaths;
pub use crate::secret_service::{resolve_gemini_key, SecretServiceImpl};
pub use crate::voice_store::{render_player, VoiceArtifactStore};
