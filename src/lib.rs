//! Sleep health dashboard core
//!
//! Loads the sleep health and lifestyle table once, then answers filter and
//! aggregate queries over it: load → clean → derive → select → aggregate.
//! Rendering lives in [`report`] and the interactive session in [`explore`].

pub mod aggregate;
pub mod cache;
pub mod cohort;
pub mod error;
pub mod explore;
pub mod loader;
pub mod models;
pub mod report;

pub use cache::DatasetCache;
pub use cohort::{select, FilterSelection, FilteredView};
pub use error::{DatasetError, MalformedInput};
pub use loader::{load, load_from_reader};
pub use models::{AgeGroup, Attribute, CategoricalAttribute, Dataset, NumericAttribute, Record};
