pub mod config;
pub mod consumers;
pub mod error;
pub mod filters;
pub mod flow;
pub mod logging;
pub mod producers;
pub mod sample;
pub mod window;

pub use config::StatsConfig;
pub use consumers::{
    AcceptanceRatio, AcceptanceSnapshot, AutocovarianceSnapshot, LastSample,
    SpuriousAutocovariance,
};
pub use error::FlowError;
pub use filters::ComponentPairSplitter;
pub use flow::{Connection, Consumer, Filter, FilterStage, SampleChannel};
pub use producers::Range;
pub use sample::{AuxiliaryData, Sample, Scalar};
pub use window::LagWindow;
