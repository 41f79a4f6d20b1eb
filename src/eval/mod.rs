mod aggregator;
mod records;
mod results;
mod runner;

pub use aggregator::Pipeline;
pub use results::MetricsReport;
pub use runner::MetricsRunner;
