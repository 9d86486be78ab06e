//! Transform candidates and per-batch selection

pub mod candidate;
pub mod selector;
pub mod steps;

pub use candidate::{ExpectedShape, TransformCandidate};
pub use selector::{SelectedBatch, TransformerSelector};
pub use steps::{Step, ValueKind};
