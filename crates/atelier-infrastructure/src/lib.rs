pub mod config_service;
pub mod memory_store;
pub mod paths;
pub mod seed_catalog;

pub use crate::config_service::ConfigService;
pub use crate::memory_store::InMemoryRemoteStore;
pub use crate::paths::AtelierPaths;
pub use crate::seed_catalog::SeedCatalog;
