//! State shared by optimization algorithms.

pub mod history;

pub use history::*;
