//! Terminal output helpers for the CLI.

pub mod progress;
pub mod tables;

pub use progress::create_progress_bar;
pub use tables::{TableBuilder, create_metrics_table, create_recommendation_table};
