// Scoring module - turns judge annotations into recognition / reasoning / CoT numbers.
// Record handling and report assembly live in eval/.

mod composite;
mod labels;
mod metrics;
pub mod parser;

pub use composite::{parse_alpha, summarize, Alpha, ScopeReport};
pub use labels::LabelNormalizer;
pub use metrics::{reduce, CategoryAccumulator, StepPolicy};
