mod assets;
mod provider;
#[cfg(test)]
mod test_utils;

pub mod completion;
pub mod config;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod pricing;

pub use crate::assets::get_data_dir;
pub use crate::orchestrator::{
    CompareError, CompareSettings, ComparisonResult, Orchestrator, compare, validate_connections,
};
pub use crate::provider::llm::build_adapter;
