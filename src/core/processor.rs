use crate::config::toml_config::GitConfig;
use crate::core::{device_info, git, tree_check};
use crate::domain::model::{GenerationOutcome, GenerationRequest, GitStatus, TreeType};
use crate::domain::ports::{DeviceTreeGenerator, EventSink};
use crate::utils::error::{DtgenError, Result};
use std::path::{Path, PathBuf};

/// Drives one generation: scratch directory, external tool, tree inspection
/// and the optional git/validation steps.
pub struct DeviceTreeProcessor<G: DeviceTreeGenerator> {
    generator: G,
    git: GitConfig,
    install_hint: String,
}

impl<G: DeviceTreeGenerator> DeviceTreeProcessor<G> {
    pub fn new(generator: G, git: GitConfig, install_hint: impl Into<String>) -> Self {
        Self {
            generator,
            git,
            install_hint: install_hint.into(),
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub async fn process_image(
        &self,
        request: &GenerationRequest,
        sink: &dyn EventSink,
    ) -> Result<GenerationOutcome> {
        // Removed on drop, whichever way this function returns.
        let work_dir = tempfile::Builder::new().prefix("dtgen_").tempdir()?;
        tracing::debug!("Work directory: {}", work_dir.path().display());

        sink.log("Initializing device tree generation...");

        match request.tree_type {
            TreeType::Twrp => {}
            other => {
                return Err(DtgenError::UnsupportedTreeType {
                    tree_type: other.to_string(),
                })
            }
        }

        if !self.generator.check_available().await {
            return Err(DtgenError::ToolNotInstalled {
                program: self.generator.name().to_string(),
                hint: self.install_hint.clone(),
            });
        }

        sink.progress(0.3, "Extracting boot image...");
        sink.log("Extracting boot image contents...");

        std::fs::create_dir_all(&request.output_dir)?;
        let image = absolute(&request.image)?;
        let output_dir = absolute(&request.output_dir)?;

        sink.log(&format!(
            "Running: {}",
            self.generator.command_line(&image, &output_dir)
        ));
        sink.progress(0.4, "Analyzing device information...");
        self.generator
            .generate(&image, &output_dir, work_dir.path(), sink)
            .await?;

        sink.progress(0.7, "Generating device tree files...");
        sink.log("Device tree files generated successfully");

        let device_info = device_info::extract_device_info(&output_dir);
        tracing::debug!("Extracted device info: {:?}", device_info);

        let git_status = if request.init_git {
            sink.progress(0.85, "Initializing git repository...");
            sink.log("Initializing git repository...");
            git::initialize_git(&output_dir, &self.git, sink).await
        } else {
            GitStatus::Skipped
        };

        let validation = if request.validate {
            sink.progress(0.9, "Validating device tree...");
            sink.log("Validating generated device tree...");

            let validation = tree_check::validate_device_tree(&output_dir);
            if !validation.valid {
                let issues: Vec<&str> = validation
                    .warnings
                    .iter()
                    .chain(validation.errors.iter())
                    .map(String::as_str)
                    .collect();
                sink.log(&format!(
                    "Warning: Validation issues found: {}",
                    issues.join(", ")
                ));
            }
            Some(validation)
        } else {
            None
        };

        Ok(GenerationOutcome {
            output_path: output_dir,
            device_name: device_info.device.clone(),
            manufacturer: device_info.manufacturer.clone(),
            device_info,
            validation,
            git: git_status,
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ProcessEvent;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ProcessEvent>>,
    }

    impl RecordingSink {
        fn logs(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    ProcessEvent::Log { message } => Some(message.clone()),
                    _ => None,
                })
                .collect()
        }

        fn progress(&self) -> Vec<f32> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    ProcessEvent::Progress { fraction, .. } => Some(*fraction),
                    _ => None,
                })
                .collect()
        }
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: ProcessEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    /// Writes a minimal tree the way twrpdtgen lays it out.
    struct FakeGenerator {
        available: bool,
        fail_with: Option<String>,
        complete: bool,
        work_dir_seen: Mutex<Option<PathBuf>>,
        called: AtomicBool,
    }

    impl FakeGenerator {
        fn working() -> Self {
            Self {
                available: true,
                fail_with: None,
                complete: true,
                work_dir_seen: Mutex::new(None),
                called: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl DeviceTreeGenerator for FakeGenerator {
        fn name(&self) -> &str {
            "fake-dtgen"
        }

        async fn check_available(&self) -> bool {
            self.available
        }

        async fn generate(
            &self,
            _image: &Path,
            output_dir: &Path,
            work_dir: &Path,
            sink: &dyn EventSink,
        ) -> Result<()> {
            self.called.store(true, Ordering::SeqCst);
            *self.work_dir_seen.lock().unwrap() = Some(work_dir.to_path_buf());
            assert!(output_dir.is_absolute());

            if let Some(message) = &self.fail_with {
                return Err(DtgenError::ToolFailed {
                    program: self.name().to_string(),
                    message: message.clone(),
                });
            }

            sink.log("Unpacking image");
            let device = output_dir.join("google").join("redfin");
            std::fs::create_dir_all(&device)?;
            std::fs::write(device.join("BoardConfig.mk"), "TARGET_ARCH := arm64\n")?;
            if self.complete {
                std::fs::write(device.join("Android.mk"), "")?;
                std::fs::write(device.join("AndroidProducts.mk"), "")?;
                std::fs::write(device.join("recovery.fstab"), "")?;
            }
            Ok(())
        }
    }

    fn request(output: &Path) -> GenerationRequest {
        GenerationRequest {
            image: PathBuf::from("boot.img"),
            output_dir: output.to_path_buf(),
            tree_type: TreeType::Twrp,
            init_git: false,
            validate: true,
        }
    }

    fn processor(generator: FakeGenerator) -> DeviceTreeProcessor<FakeGenerator> {
        DeviceTreeProcessor::new(generator, GitConfig::default(), "pip install fake-dtgen")
    }

    #[tokio::test]
    async fn test_successful_generation() {
        let out = TempDir::new().unwrap();
        let processor = processor(FakeGenerator::working());
        let sink = RecordingSink::default();

        let outcome = processor
            .process_image(&request(&out.path().join("tree")), &sink)
            .await
            .unwrap();

        assert_eq!(outcome.device_name, "redfin");
        assert_eq!(outcome.manufacturer, "google");
        assert_eq!(outcome.device_info.architecture, "arm64");
        assert_eq!(outcome.git, GitStatus::Skipped);
        assert!(outcome.validation.unwrap().valid);

        assert_eq!(sink.progress(), vec![0.3, 0.4, 0.7, 0.9]);
        let logs = sink.logs();
        assert_eq!(logs[0], "Initializing device tree generation...");
        assert!(logs.contains(&"Unpacking image".to_string()));
        assert!(logs.contains(&"Device tree files generated successfully".to_string()));
    }

    #[tokio::test]
    async fn test_command_line_logged_before_analysis_step() {
        let out = TempDir::new().unwrap();
        let processor = processor(FakeGenerator::working());
        let sink = RecordingSink::default();

        processor
            .process_image(&request(&out.path().join("tree")), &sink)
            .await
            .unwrap();

        let events = sink.events.lock().unwrap();
        let running = events
            .iter()
            .position(|e| {
                matches!(e, ProcessEvent::Log { message } if message.starts_with("Running: fake-dtgen "))
            })
            .expect("command line is logged");
        let analyzing = events
            .iter()
            .position(|e| {
                matches!(e, ProcessEvent::Progress { fraction, .. } if *fraction == 0.4)
            })
            .unwrap();
        assert_eq!(analyzing, running + 1);
    }

    #[tokio::test]
    async fn test_work_dir_is_removed() {
        let out = TempDir::new().unwrap();
        let processor = processor(FakeGenerator::working());
        let sink = RecordingSink::default();

        processor
            .process_image(&request(out.path()), &sink)
            .await
            .unwrap();

        let seen = processor.generator().work_dir_seen.lock().unwrap().clone().unwrap();
        assert!(seen
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("dtgen_"));
        assert!(!seen.exists());
    }

    #[tokio::test]
    async fn test_validation_warnings_are_logged() {
        let out = TempDir::new().unwrap();
        let processor = processor(FakeGenerator {
            complete: false,
            ..FakeGenerator::working()
        });
        let sink = RecordingSink::default();

        let outcome = processor
            .process_image(&request(out.path()), &sink)
            .await
            .unwrap();

        let validation = outcome.validation.unwrap();
        assert!(!validation.valid);
        assert!(sink.logs().contains(
            &"Warning: Validation issues found: Missing file: Android.mk, Missing file: AndroidProducts.mk, Missing recovery.fstab file"
                .to_string()
        ));
    }

    #[tokio::test]
    async fn test_skip_validation() {
        let out = TempDir::new().unwrap();
        let processor = processor(FakeGenerator::working());
        let sink = RecordingSink::default();

        let mut req = request(out.path());
        req.validate = false;
        let outcome = processor.process_image(&req, &sink).await.unwrap();

        assert!(outcome.validation.is_none());
        assert_eq!(sink.progress(), vec![0.3, 0.4, 0.7]);
    }

    #[tokio::test]
    async fn test_unsupported_tree_type() {
        let out = TempDir::new().unwrap();
        let processor = processor(FakeGenerator::working());
        let sink = RecordingSink::default();

        let mut req = request(out.path());
        req.tree_type = TreeType::LineageOs;
        let err = processor.process_image(&req, &sink).await.unwrap_err();

        assert!(matches!(err, DtgenError::UnsupportedTreeType { .. }));
        assert!(!processor.generator().called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unavailable_generator() {
        let out = TempDir::new().unwrap();
        let processor = processor(FakeGenerator {
            available: false,
            ..FakeGenerator::working()
        });
        let sink = RecordingSink::default();

        let err = processor
            .process_image(&request(out.path()), &sink)
            .await
            .unwrap_err();

        match err {
            DtgenError::ToolNotInstalled { program, hint } => {
                assert_eq!(program, "fake-dtgen");
                assert_eq!(hint, "pip install fake-dtgen");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(sink.progress().is_empty());
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let out = TempDir::new().unwrap();
        let processor = processor(FakeGenerator {
            fail_with: Some("unsupported header version".to_string()),
            ..FakeGenerator::working()
        });
        let sink = RecordingSink::default();

        let err = processor
            .process_image(&request(out.path()), &sink)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "fake-dtgen failed: unsupported header version");
        assert!(!sink.progress().contains(&0.7));
    }
}
