use crate::config::toml_config::GeneratorConfig;
use crate::domain::ports::{DeviceTreeGenerator, EventSink};
use crate::utils::error::{DtgenError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Runs an external device tree generator (twrpdtgen by default) as a subprocess.
#[derive(Debug, Clone)]
pub struct ExternalToolGenerator {
    config: GeneratorConfig,
}

/// Reads one line, decoding invalid UTF-8 lossily and trimming surrounding
/// whitespace. `None` at end of stream.
async fn read_lossy_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).trim().to_string()))
}

impl ExternalToolGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args);
        cmd
    }

    fn not_found(&self) -> DtgenError {
        DtgenError::ToolNotFound {
            program: self.name().to_string(),
            hint: self.config.install_hint.clone(),
        }
    }
}

#[async_trait]
impl DeviceTreeGenerator for ExternalToolGenerator {
    fn name(&self) -> &str {
        self.config.display_name()
    }

    fn command_line(&self, image: &Path, output_dir: &Path) -> String {
        let mut parts = vec![self.config.program.clone()];
        parts.extend(self.config.args.iter().cloned());
        parts.push(image.display().to_string());
        parts.push("-o".to_string());
        parts.push(output_dir.display().to_string());
        parts.join(" ")
    }

    async fn check_available(&self) -> bool {
        let mut cmd = self.command();
        cmd.arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.config.probe_timeout(), cmd.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                tracing::debug!("{} probe failed: {}", self.name(), e);
                false
            }
            Err(_) => {
                tracing::debug!(
                    "{} probe timed out after {:?}",
                    self.name(),
                    self.config.probe_timeout()
                );
                false
            }
        }
    }

    async fn generate(
        &self,
        image: &Path,
        output_dir: &Path,
        work_dir: &Path,
        sink: &dyn EventSink,
    ) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg(image)
            .arg("-o")
            .arg(output_dir)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => self.not_found(),
            _ => DtgenError::IoError(e),
        })?;

        let stdout = child.stdout.take().ok_or_else(|| DtgenError::WorkerError {
            message: "generator stdout was not captured".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| DtgenError::WorkerError {
            message: "generator stderr was not captured".to_string(),
        })?;

        // stderr is drained on its own task so a chatty tool cannot block on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut collected = Vec::new();
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            loop {
                match read_lossy_line(&mut reader, &mut buf).await {
                    Ok(Some(line)) if !line.is_empty() => collected.push(line),
                    Ok(Some(_)) => {}
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!("stderr read failed: {}", e);
                        break;
                    }
                }
            }
            collected
        });

        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        while let Some(line) = read_lossy_line(&mut reader, &mut buf).await? {
            if !line.is_empty() {
                sink.log(&line);
            }
        }

        let status = child.wait().await?;
        let stderr_lines = stderr_task.await.map_err(|e| DtgenError::WorkerError {
            message: e.to_string(),
        })?;

        for line in &stderr_lines {
            tracing::debug!("{} stderr: {}", self.name(), line);
        }

        if !status.success() {
            let message = if stderr_lines.is_empty() {
                "Unknown error during generation".to_string()
            } else {
                stderr_lines.join("\n")
            };
            return Err(DtgenError::ToolFailed {
                program: self.name().to_string(),
                message,
            });
        }

        Ok(())
    }
}
