pub mod device_info;
pub mod engine;
pub mod generator;
pub mod git;
pub mod processor;
pub mod tree_check;
pub mod validator;

pub use crate::domain::model::{
    DeviceInfo, GenerationOutcome, GenerationRequest, ProcessEvent, TreeType, TreeValidation,
};
pub use crate::domain::ports::{DeviceTreeGenerator, EventSink};
pub use crate::utils::error::Result;
