use crate::domain::model::ProcessEvent;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Receives progress and log events from the generation worker.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProcessEvent);

    fn progress(&self, fraction: f32, message: &str) {
        self.emit(ProcessEvent::Progress {
            fraction,
            message: message.to_string(),
        });
    }

    fn log(&self, message: &str) {
        self.emit(ProcessEvent::Log {
            message: message.to_string(),
        });
    }
}

/// Something that turns an image into a device tree on disk.
#[async_trait]
pub trait DeviceTreeGenerator: Send + Sync {
    /// Human readable name used in messages.
    fn name(&self) -> &str;

    /// The invocation shown to the user before a run.
    fn command_line(&self, image: &Path, output_dir: &Path) -> String {
        format!("{} {} -o {}", self.name(), image.display(), output_dir.display())
    }

    async fn check_available(&self) -> bool;

    async fn generate(
        &self,
        image: &Path,
        output_dir: &Path,
        work_dir: &Path,
        sink: &dyn EventSink,
    ) -> Result<()>;
}
