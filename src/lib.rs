pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::toml_config::Settings;
pub use crate::core::{
    engine::DtgenEngine, generator::ExternalToolGenerator, processor::DeviceTreeProcessor,
    validator::ImageValidator,
};
pub use crate::utils::error::{DtgenError, Result};
