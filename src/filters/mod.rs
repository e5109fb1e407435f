//! Intermediate stages that derive one sample stream from another.

pub mod component_pair_splitter;

pub use component_pair_splitter::ComponentPairSplitter;
