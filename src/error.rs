//! Error types for the sample flow pipeline

/// Errors raised while wiring or driving a pipeline
#[derive(Debug)]
pub enum FlowError {
    /// The stage already has an upstream source
    AlreadyAttached { stage: &'static str },
    /// A sample's dimensionality differs from the one established by the first sample
    DimensionMismatch {
        stage: &'static str,
        expected: usize,
        found: usize,
    },
    /// Configuration values failed validation
    InvalidConfig(String),
    /// Configuration text could not be parsed
    ConfigParse(serde_json::Error),
}

impl std::fmt::Display for FlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowError::AlreadyAttached { stage } => {
                write!(f, "Stage '{}' is already attached to an upstream source", stage)
            }
            FlowError::DimensionMismatch {
                stage,
                expected,
                found,
            } => write!(
                f,
                "Stage '{}' expected samples of dimension {}, got {}",
                stage, expected, found
            ),
            FlowError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            FlowError::ConfigParse(err) => write!(f, "Failed to parse configuration: {}", err),
        }
    }
}

impl std::error::Error for FlowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FlowError::ConfigParse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::ConfigParse(err)
    }
}
