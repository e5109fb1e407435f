//! Terminal stages that fold the sample stream into running statistics.
//!
//! Every accumulator guards its state with a single per-instance lock, so
//! `consume` may be called from several producer threads while readers call
//! `get` at any time and always observe a consistent state.

pub mod acceptance_ratio;
pub mod last_sample;
pub mod spurious_autocovariance;

pub use acceptance_ratio::{AcceptanceRatio, AcceptanceSnapshot};
pub use last_sample::LastSample;
pub use spurious_autocovariance::{AutocovarianceSnapshot, SpuriousAutocovariance};
