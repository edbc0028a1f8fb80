//! Repository traits for metadata operations.

pub mod content;
pub mod domains;
pub mod repositories;
pub mod repository_configs;
pub mod uploads;

pub use content::ContentRepo;
pub use domains::DomainRepo;
pub use repositories::RepositoryRepo;
pub use repository_configs::RepositoryConfigRepo;
pub use uploads::UploadRepo;
