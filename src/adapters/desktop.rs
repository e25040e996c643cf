use std::path::Path;
use std::process::{Command, Stdio};

fn opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    }
}

/// Opens `path` in the platform file manager. Failures only produce a warning.
pub fn open_in_file_manager(path: &Path) {
    let program = opener();
    let spawned = Command::new(program)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    match spawned {
        Ok(_) => tracing::debug!("Opened {} with {}", path.display(), program),
        Err(e) => tracing::warn!("Could not open {} with {}: {}", path.display(), program, e),
    }
}
