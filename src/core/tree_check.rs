use crate::core::device_info::locate_device_dir;
use crate::domain::model::{FileCategory, TreeEntry, TreeValidation};
use std::path::Path;

pub const REQUIRED_FILES: [&str; 3] = ["BoardConfig.mk", "Android.mk", "AndroidProducts.mk"];

/// Checks a generated tree for the files a recovery build needs.
pub fn validate_device_tree(output_dir: &Path) -> TreeValidation {
    let mut validation = TreeValidation::default();

    match locate_device_dir(output_dir) {
        Ok(Some(device)) => {
            for required in REQUIRED_FILES {
                if !device.path.join(required).exists() {
                    validation
                        .warnings
                        .push(format!("Missing file: {}", required));
                }
            }

            let fstab = device
                .path
                .join("recovery")
                .join("root")
                .join("system")
                .join("etc")
                .join("recovery.fstab");
            if !fstab.exists() && !device.path.join("recovery.fstab").exists() {
                validation
                    .warnings
                    .push("Missing recovery.fstab file".to_string());
            }
        }
        Ok(None) => validation
            .warnings
            .push("No device directory found".to_string()),
        Err(e) => validation.errors.push(format!("Validation error: {}", e)),
    }

    validation.valid = validation.warnings.is_empty() && validation.errors.is_empty();
    validation
}

pub fn categorize(file_name: &str) -> FileCategory {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("mk" | "bp") => FileCategory::BuildScript,
        Some("sh" | "bat") => FileCategory::Script,
        Some("xml" | "json") => FileCategory::Data,
        Some("fstab") => FileCategory::Fstab,
        Some("prop") => FileCategory::Properties,
        _ => FileCategory::Other,
    }
}

/// Depth-first listing of `root`: directories before files, each group in
/// name order. Hidden entries and unreadable directories are skipped.
pub fn list_tree(root: &Path) -> Vec<TreeEntry> {
    let mut entries = Vec::new();
    walk(root, root, 0, &mut entries);
    entries
}

fn walk(root: &Path, dir: &Path, depth: usize, out: &mut Vec<TreeEntry>) {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return;
    };

    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in read_dir.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        match entry.file_type() {
            Ok(ft) if ft.is_dir() => dirs.push((name, entry.path())),
            Ok(_) => files.push((name, entry.path())),
            Err(_) => continue,
        }
    }
    dirs.sort();
    files.sort();

    let relative = |path: &Path| path.strip_prefix(root).unwrap_or(path).to_path_buf();

    for (_, path) in dirs {
        out.push(TreeEntry {
            relative_path: relative(&path),
            depth,
            is_dir: true,
            category: None,
        });
        walk(root, &path, depth + 1, out);
    }

    for (name, path) in files {
        out.push(TreeEntry {
            relative_path: relative(&path),
            depth,
            is_dir: false,
            category: Some(categorize(&name)),
        });
    }
}
