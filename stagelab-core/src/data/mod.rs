//! Data layer: provider trait, timestamp normalization, universe config,
//! and the deterministic synthetic source.

pub mod normalize;
pub mod provider;
pub mod synthetic;
pub mod universe;

pub use normalize::Normalizer;
pub use provider::{DataError, DataProvider, TaggedSeries, TimestampKind};
pub use synthetic::SyntheticProvider;
pub use universe::{Universe, UniverseError};
