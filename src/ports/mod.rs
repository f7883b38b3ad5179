//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the risk engine and the systems that feed it.

mod dataset;

pub use dataset::{DatasetError, DatasetSource, LoadedDataset, RawTable};
