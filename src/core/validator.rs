use crate::domain::model::{ImageInfo, ImageKind, ImageRejection, ValidatedImage};
use crate::utils::error::{DtgenError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const VALID_EXTENSIONS: [&str; 5] = [".img", ".tar", ".gz", ".lz4", ".zip"];
pub const MIN_SIZE_MB: u64 = 1;
pub const MAX_SIZE_MB: u64 = 500;

const HEADER_LEN: usize = 512;
const ANDROID_BOOT_MAGIC: &[u8] = b"ANDROID!";
const GZIP_MAGIC: &[u8] = b"\x1f\x8b";
const LZ4_MAGIC: &[u8] = b"\x04\x22\x4d\x18";
const TAR_MAGIC: &[u8] = b"ustar";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Sanity checks for boot/recovery images before they are handed to a generator.
#[derive(Debug, Clone, Default)]
pub struct ImageValidator;

impl ImageValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_image(&self, path: &Path) -> Result<ValidatedImage> {
        let reject = |reason: ImageRejection| DtgenError::InvalidImage {
            path: path.display().to_string(),
            reason,
        };

        if !path.exists() {
            return Err(reject(ImageRejection::Missing));
        }
        if !path.is_file() {
            return Err(reject(ImageRejection::NotAFile));
        }

        let size_bytes = std::fs::metadata(path)?.len();
        let size_mb = size_bytes as f64 / BYTES_PER_MB;

        if size_mb < MIN_SIZE_MB as f64 {
            return Err(reject(ImageRejection::TooSmall { size_mb }));
        }
        if size_mb > MAX_SIZE_MB as f64 {
            return Err(reject(ImageRejection::TooLarge { size_mb }));
        }

        let extension = dotted_extension(path);
        if !VALID_EXTENSIONS.contains(&extension.as_str()) {
            return Err(reject(ImageRejection::UnsupportedExtension { extension }));
        }

        let kind = self.detect_file_type(path);
        tracing::debug!("{} validated as {} ({:.2} MB)", path.display(), kind, size_mb);

        Ok(ValidatedImage {
            path: path.to_path_buf(),
            kind,
            size_bytes,
            size_mb,
        })
    }

    /// Sniffs the first 512 bytes for known signatures, falling back to the
    /// extension when nothing matches.
    pub fn detect_file_type(&self, path: &Path) -> ImageKind {
        match read_header(path) {
            Ok(header) => classify_header(&header, &dotted_extension(path)),
            Err(e) => {
                tracing::debug!("Could not read header of {}: {}", path.display(), e);
                ImageKind::Unknown
            }
        }
    }

    pub fn image_info(&self, path: &Path) -> Result<ImageInfo> {
        if !path.exists() {
            return Err(DtgenError::InvalidImage {
                path: path.display().to_string(),
                reason: ImageRejection::Missing,
            });
        }
        let metadata = std::fs::metadata(path)?;
        let size_bytes = metadata.len();

        Ok(ImageInfo {
            filename: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            filepath: path.to_path_buf(),
            size_bytes,
            size_mb: size_bytes as f64 / BYTES_PER_MB,
            modified: metadata.modified().ok().map(chrono::DateTime::from),
            extension: dotted_extension(path),
            kind: self.detect_file_type(path),
        })
    }
}

fn read_header(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    File::open(path)?
        .take(HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    Ok(header)
}

fn classify_header(header: &[u8], extension: &str) -> ImageKind {
    if contains(header, ANDROID_BOOT_MAGIC) {
        ImageKind::AndroidBoot
    } else if header.starts_with(GZIP_MAGIC) {
        ImageKind::Gzip
    } else if header.starts_with(LZ4_MAGIC) {
        ImageKind::Lz4
    } else if contains(header, TAR_MAGIC) {
        ImageKind::Tar
    } else {
        match extension {
            ".img" => ImageKind::RawImage,
            ".zip" => ImageKind::Zip,
            _ => ImageKind::Unknown,
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Lowercase extension including the leading dot, or an empty string.
fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}
