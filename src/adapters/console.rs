use crate::domain::model::ProcessEvent;

/// Renders worker events on the terminal and mirrors log lines into tracing
/// so they end up in the log file.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    quiet: bool,
    last_fraction: f32,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            last_fraction: 0.0,
        }
    }

    pub fn last_fraction(&self) -> f32 {
        self.last_fraction
    }

    pub fn handle(&mut self, event: ProcessEvent) {
        match event {
            ProcessEvent::Progress { fraction, message } => {
                self.last_fraction = fraction;
                tracing::debug!("progress {:.0}%: {}", fraction * 100.0, message);
                if !self.quiet {
                    eprintln!("{}", format_progress(fraction, &message));
                }
            }
            ProcessEvent::Log { message } => {
                tracing::info!("{}", message);
            }
        }
    }
}

pub fn format_progress(fraction: f32, message: &str) -> String {
    const WIDTH: usize = 20;
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (fraction * WIDTH as f32).round() as usize;
    format!(
        "[{}{}] {:>3.0}% {}",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled),
        fraction * 100.0,
        message
    )
}
