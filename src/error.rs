//! Domain errors for metric computation
//!
//! Unparseable judge output, empty scopes and zero denominators are not errors;
//! they are handled inside the pipeline. Only configuration problems surface here.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MetricsError {
    /// Weighting factor outside [0, 1]
    #[error("alpha must be between 0 and 1, got {0}")]
    InvalidAlpha(f64),

    /// Requested model is not present in the suite config
    #[error("model '{0}' is not defined in the config")]
    UnknownModel(String),

    /// A model entry without any result files
    #[error("model '{0}' has no subsets configured")]
    EmptySuite(String),

    /// A step ratio outside [0, 1] under the reject policy
    #[error("step {index} scored {value}, outside [0, 1]")]
    StepOutOfRange { index: usize, value: f64 },
}
