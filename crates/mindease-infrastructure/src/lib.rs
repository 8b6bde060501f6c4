pub mod analysis_repository;
pub mod paths;
pub mod secret_service;
pub mod storage;

pub use crate::analysis_repository::{FileAnalysisRepository, InMemoryAnalysisRepository};
pub use crate::paths::MindEasePaths;
pub use crate::secret_service::SecretServiceImpl;
