use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    AndroidBoot,
    Gzip,
    Lz4,
    Tar,
    RawImage,
    Zip,
    Unknown,
}

impl ImageKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ImageKind::AndroidBoot => "Android Boot Image",
            ImageKind::Gzip => "GZip Compressed Image",
            ImageKind::Lz4 => "LZ4 Compressed Image",
            ImageKind::Tar => "TAR Archive",
            ImageKind::RawImage => "Raw Image File",
            ImageKind::Zip => "ZIP Archive",
            ImageKind::Unknown => "Unknown Format",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Why an input file was refused before any tool ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ImageRejection {
    Missing,
    NotAFile,
    TooSmall { size_mb: f64 },
    TooLarge { size_mb: f64 },
    UnsupportedExtension { extension: String },
}

impl fmt::Display for ImageRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use crate::core::validator::{MAX_SIZE_MB, MIN_SIZE_MB, VALID_EXTENSIONS};
        match self {
            ImageRejection::Missing => write!(f, "File does not exist"),
            ImageRejection::NotAFile => write!(f, "Path is not a file"),
            ImageRejection::TooSmall { size_mb } => write!(
                f,
                "File too small ({:.2} MB). Minimum size: {} MB",
                size_mb, MIN_SIZE_MB
            ),
            ImageRejection::TooLarge { size_mb } => write!(
                f,
                "File too large ({:.2} MB). Maximum size: {} MB",
                size_mb, MAX_SIZE_MB
            ),
            ImageRejection::UnsupportedExtension { extension } => write!(
                f,
                "Invalid file extension: {}. Supported: {}",
                extension,
                VALID_EXTENSIONS.join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidatedImage {
    pub path: PathBuf,
    pub kind: ImageKind,
    pub size_bytes: u64,
    pub size_mb: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageInfo {
    pub filename: String,
    pub filepath: PathBuf,
    pub size_bytes: u64,
    pub size_mb: f64,
    pub modified: Option<DateTime<Local>>,
    pub extension: String,
    pub kind: ImageKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum TreeType {
    #[default]
    Twrp,
    #[cfg_attr(feature = "cli", value(name = "lineageos"))]
    LineageOs,
}

impl TreeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreeType::Twrp => "twrp",
            TreeType::LineageOs => "lineageos",
        }
    }
}

impl fmt::Display for TreeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub device: String,
    pub model: String,
    pub architecture: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            manufacturer: UNKNOWN.to_string(),
            device: UNKNOWN.to_string(),
            model: UNKNOWN.to_string(),
            architecture: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeValidation {
    pub valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Default for TreeValidation {
    fn default() -> Self {
        Self {
            valid: true,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    BuildScript,
    Script,
    Data,
    Fstab,
    Properties,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub relative_path: PathBuf,
    pub depth: usize,
    pub is_dir: bool,
    pub category: Option<FileCategory>,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub image: PathBuf,
    pub output_dir: PathBuf,
    pub tree_type: TreeType,
    pub init_git: bool,
    pub validate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum GitStatus {
    Skipped,
    Initialized,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub output_path: PathBuf,
    pub device_name: String,
    pub manufacturer: String,
    pub device_info: DeviceInfo,
    pub validation: Option<TreeValidation>,
    pub git: GitStatus,
}

/// Progress and log notifications posted by the generation worker.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    Progress { fraction: f32, message: String },
    Log { message: String },
}
