//! Numerical utilities shared by the descent engine and the line searches.

pub mod differentiation;

pub use differentiation::*;
