use crate::domain::model::ImageRejection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DtgenError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid image {path}: {reason}")]
    InvalidImage { path: String, reason: ImageRejection },

    #[error("Tree type '{tree_type}' not yet supported. Use 'twrp' for now.")]
    UnsupportedTreeType { tree_type: String },

    #[error("{program} not installed. Install with: {hint}")]
    ToolNotInstalled { program: String, hint: String },

    #[error("{program} not found. Please install it with: {hint}")]
    ToolNotFound { program: String, hint: String },

    #[error("{program} failed: {message}")]
    ToolFailed { program: String, message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Generation worker stopped unexpectedly: {message}")]
    WorkerError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    ExternalTool,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DtgenError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DtgenError::InvalidImage { .. } | DtgenError::UnsupportedTreeType { .. } => {
                ErrorCategory::Input
            }
            DtgenError::ConfigValidationError { .. }
            | DtgenError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            DtgenError::ToolNotInstalled { .. }
            | DtgenError::ToolNotFound { .. }
            | DtgenError::ToolFailed { .. } => ErrorCategory::ExternalTool,
            DtgenError::IoError(_)
            | DtgenError::SerializationError(_)
            | DtgenError::WorkerError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DtgenError::InvalidImage { .. } | DtgenError::UnsupportedTreeType { .. } => {
                ErrorSeverity::Medium
            }
            DtgenError::IoError(_) | DtgenError::WorkerError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            DtgenError::InvalidImage { .. } => {
                "Pick a boot or recovery image (.img, .tar, .gz, .lz4, .zip) between 1 and 500 MB"
                    .to_string()
            }
            DtgenError::UnsupportedTreeType { .. } => "Re-run with --tree-type twrp".to_string(),
            DtgenError::ToolNotInstalled { hint, .. } | DtgenError::ToolNotFound { hint, .. } => {
                format!("Install the generator ({}) or point [generator] at it in dtgen.toml", hint)
            }
            DtgenError::ToolFailed { .. } => {
                "Check the log above for the generator's output; the image may be unsupported"
                    .to_string()
            }
            DtgenError::ConfigValidationError { .. }
            | DtgenError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and try again".to_string()
            }
            DtgenError::IoError(_) => {
                "Check that the paths exist and that you have permission to write the output directory"
                    .to_string()
            }
            DtgenError::SerializationError(_) | DtgenError::WorkerError { .. } => {
                "Re-run with --verbose and report the log file".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DtgenError::InvalidImage { reason, .. } => format!("Invalid image: {}", reason),
            DtgenError::ToolFailed { program, message } => {
                format!("{} could not generate a device tree:\n{}", program, message)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DtgenError>;
