mod args;
mod config;

pub use args::{Args, Command, InitArgs, OverallArgs, ParseArgs, ScoreArgs};
pub use config::{MetricsConfig, ModelSuite};
#[cfg(test)]
pub use config::SubsetSource;
