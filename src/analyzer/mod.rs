// Analyzer module: the clustering pipeline stages and the summary statistics.

pub mod annotate;
pub mod clustering;
pub mod kmeans;
pub mod statistics;
pub mod vectorizer;

// Re-export the pipeline for ease of use.
pub use clustering::{Analyzer, ClusterPipeline, ClusterReport};
