use crate::domain::model::DeviceInfo;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const KNOWN_ARCHITECTURES: [&str; 4] = ["arm64", "arm", "x86_64", "x86"];

static TARGET_ARCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*TARGET_ARCH\s*:?=\s*(\S+)").expect("TARGET_ARCH pattern is valid")
});

static PRODUCT_MODEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*PRODUCT_MODEL\s*:?=\s*(.+?)\s*$").expect("PRODUCT_MODEL pattern is valid")
});

/// Location of the generated `<manufacturer>/<codename>` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDir {
    pub manufacturer: String,
    pub codename: String,
    pub path: PathBuf,
}

/// Subdirectories of `dir` in name order.
pub(crate) fn sorted_subdirs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Generators lay trees out as `<output>/<manufacturer>/<codename>`; the first
/// match in name order wins.
pub fn locate_device_dir(output_dir: &Path) -> io::Result<Option<DeviceDir>> {
    let Some(manufacturer_dir) = sorted_subdirs(output_dir)?.into_iter().next() else {
        return Ok(None);
    };
    let Some(device_dir) = sorted_subdirs(&manufacturer_dir)?.into_iter().next() else {
        return Ok(None);
    };

    Ok(Some(DeviceDir {
        manufacturer: dir_name(&manufacturer_dir),
        codename: dir_name(&device_dir),
        path: device_dir,
    }))
}

pub fn extract_device_info(output_dir: &Path) -> DeviceInfo {
    let mut info = DeviceInfo::default();

    if let Err(e) = fill_device_info(output_dir, &mut info) {
        tracing::debug!("Device info extraction stopped early: {}", e);
    }

    info
}

fn fill_device_info(output_dir: &Path, info: &mut DeviceInfo) -> io::Result<()> {
    // The manufacturer is known as soon as one directory exists, even without a codename.
    if let Some(manufacturer_dir) = sorted_subdirs(output_dir)?.into_iter().next() {
        info.manufacturer = dir_name(&manufacturer_dir);
    }

    let Some(device) = locate_device_dir(output_dir)? else {
        return Ok(());
    };
    info.device = device.codename;

    let board_config = device.path.join("BoardConfig.mk");
    if board_config.is_file() {
        let content = std::fs::read_to_string(&board_config)?;
        if let Some(arch) = parse_architecture(&content) {
            info.architecture = arch.to_string();
        }
    }

    if let Some(model) = find_product_model(&device.path)? {
        info.model = model;
    }

    Ok(())
}

pub fn parse_architecture(board_config: &str) -> Option<&'static str> {
    let value = TARGET_ARCH.captures(board_config)?.get(1)?.as_str();
    KNOWN_ARCHITECTURES.iter().copied().find(|arch| *arch == value)
}

fn find_product_model(device_dir: &Path) -> io::Result<Option<String>> {
    let mut makefiles = Vec::new();
    for entry in std::fs::read_dir(device_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "mk") && path.is_file() {
            makefiles.push(path);
        }
    }
    makefiles.sort();

    for makefile in makefiles {
        let content = std::fs::read_to_string(&makefile)?;
        if let Some(caps) = PRODUCT_MODEL.captures(&content) {
            return Ok(Some(caps[1].to_string()));
        }
    }

    Ok(None)
}
