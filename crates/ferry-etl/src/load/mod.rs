//! Loading: per-entity loaders and the coordinator running them

pub mod coordinator;
pub mod loader;

pub use coordinator::ImportCoordinator;
pub use loader::Loader;
