pub mod datasets;
pub mod error;
pub mod graph;
pub mod models;
pub mod sampling;
pub mod training;
