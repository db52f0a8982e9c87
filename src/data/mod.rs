//! Tabular input/output, preprocessing and batching layer.

pub mod batch;
pub mod checkpoint;
pub mod preprocess;
pub mod table;

pub use checkpoint::Checkpoint;
pub use preprocess::{preprocess, Preprocessed, TextRecord};
pub use table::{OutputFormat, Table};
