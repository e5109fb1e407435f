//! Sources that push samples into a pipeline.

pub mod range;

pub use range::Range;
