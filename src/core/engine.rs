use crate::adapters::channel::ChannelSink;
use crate::core::processor::DeviceTreeProcessor;
use crate::core::validator::ImageValidator;
use crate::domain::model::{GenerationOutcome, GenerationRequest, ProcessEvent};
use crate::domain::ports::{DeviceTreeGenerator, EventSink};
use crate::utils::error::Result;

/// Runs a generation on a worker future and relays its events, in order, to
/// a caller-supplied handler.
pub struct DtgenEngine<G: DeviceTreeGenerator> {
    validator: ImageValidator,
    processor: DeviceTreeProcessor<G>,
}

impl<G: DeviceTreeGenerator> DtgenEngine<G> {
    pub fn new(processor: DeviceTreeProcessor<G>) -> Self {
        Self {
            validator: ImageValidator::new(),
            processor,
        }
    }

    pub async fn run<F>(&self, request: &GenerationRequest, mut on_event: F) -> Result<GenerationOutcome>
    where
        F: FnMut(ProcessEvent),
    {
        let (sink, mut rx) = ChannelSink::new();

        let worker = async move {
            let result = self.generate(request, &sink).await;
            match &result {
                Ok(_) => sink.progress(1.0, "Device tree generated successfully!"),
                Err(_) => sink.progress(0.0, "Generation failed"),
            }
            // Dropping the last sender ends the drain loop below.
            drop(sink);
            result
        };

        let drain = async {
            while let Some(event) = rx.recv().await {
                on_event(event);
            }
        };

        let (result, ()) = tokio::join!(worker, drain);
        result
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        sink: &ChannelSink,
    ) -> Result<GenerationOutcome> {
        sink.progress(0.1, "Validating image...");
        sink.log("Starting device tree generation...");
        let image = self.validator.validate_image(&request.image)?;
        sink.log(&format!("Input: {}", request.image.display()));
        sink.log(&format!("Output: {}", request.output_dir.display()));
        sink.log(&format!("File type: {}", image.kind));

        sink.progress(0.2, "Extracting boot image...");
        self.processor.process_image(request, sink).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::GitConfig;
    use crate::domain::model::TreeType;
    use crate::utils::error::DtgenError;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct TouchGenerator;

    #[async_trait]
    impl DeviceTreeGenerator for TouchGenerator {
        fn name(&self) -> &str {
            "touch"
        }

        async fn check_available(&self) -> bool {
            true
        }

        async fn generate(
            &self,
            _image: &Path,
            output_dir: &Path,
            _work_dir: &Path,
            sink: &dyn EventSink,
        ) -> Result<()> {
            sink.log("touching tree");
            std::fs::create_dir_all(output_dir.join("nothing").join("phone"))?;
            Ok(())
        }
    }

    fn engine() -> DtgenEngine<TouchGenerator> {
        DtgenEngine::new(DeviceTreeProcessor::new(
            TouchGenerator,
            GitConfig::default(),
            "n/a",
        ))
    }

    fn write_image(dir: &Path) -> PathBuf {
        let image = dir.join("boot.img");
        let mut data = vec![0u8; 2 * 1024 * 1024];
        data[..8].copy_from_slice(b"ANDROID!");
        std::fs::write(&image, data).unwrap();
        image
    }

    #[tokio::test]
    async fn test_run_relays_events_in_order() {
        let dir = TempDir::new().unwrap();
        let request = GenerationRequest {
            image: write_image(dir.path()),
            output_dir: dir.path().join("out"),
            tree_type: TreeType::Twrp,
            init_git: false,
            validate: false,
        };

        let mut events = Vec::new();
        let outcome = engine().run(&request, |e| events.push(e)).await.unwrap();
        assert_eq!(outcome.device_name, "phone");

        let fractions: Vec<f32> = events
            .iter()
            .filter_map(|e| match e {
                ProcessEvent::Progress { fraction, .. } => Some(*fraction),
                _ => None,
            })
            .collect();
        assert_eq!(fractions, vec![0.1, 0.2, 0.3, 0.4, 0.7, 1.0]);
        assert!(events.contains(&ProcessEvent::Log {
            message: "File type: Android Boot Image".to_string()
        }));
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_image() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("tiny.img");
        std::fs::write(&image, b"ANDROID!").unwrap();

        let request = GenerationRequest {
            image,
            output_dir: dir.path().join("out"),
            tree_type: TreeType::Twrp,
            init_git: false,
            validate: false,
        };

        let mut events = Vec::new();
        let err = engine().run(&request, |e| events.push(e)).await.unwrap_err();
        assert!(matches!(err, DtgenError::InvalidImage { .. }));
        assert_eq!(
            events.last(),
            Some(&ProcessEvent::Progress {
                fraction: 0.0,
                message: "Generation failed".to_string()
            })
        );
        assert!(!dir.path().join("out").exists());
    }
}
