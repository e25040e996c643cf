use anyhow::Context;
use clap::Parser;
use dtgen::adapters::console::ConsoleReporter;
use dtgen::adapters::desktop;
use dtgen::config::Command;
use dtgen::core::{device_info, git, tree_check};
use dtgen::domain::model::{GenerationOutcome, GenerationRequest, GitStatus, TreeEntry};
use dtgen::domain::ports::DeviceTreeGenerator;
use dtgen::utils::error::ErrorSeverity;
use dtgen::utils::{logger, validation::Validate};
use dtgen::{
    CliConfig, DeviceTreeProcessor, DtgenEngine, DtgenError, ExternalToolGenerator,
    ImageValidator, Settings,
};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let settings = Settings::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("failed to load settings from {}", path.display()),
        None => "failed to load settings".to_string(),
    })?;

    let verbose = cli.verbose || settings.general.verbose_logging;
    let log_guard = logger::init_cli_logger(verbose, &settings.logging.directory);

    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        drop(log_guard);
        std::process::exit(1);
    }

    match logger::clean_old_logs(&settings.logging.directory, settings.logging.retention_days) {
        Ok(0) => {}
        Ok(n) => tracing::debug!("Removed {} old log file(s)", n),
        Err(e) => tracing::warn!("Error cleaning old logs: {}", e),
    }

    tracing::debug!("CLI config: {:?}", cli);

    let exit_code = match run(&cli, &settings).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            }
        }
    };

    // Flush the file log before exiting.
    drop(log_guard);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}

/// Returns `Ok(false)` when the command ran but the result is a failure
/// (invalid tree, missing tool).
async fn run(cli: &CliConfig, settings: &Settings) -> Result<bool, DtgenError> {
    match &cli.command {
        Command::Check { image, json } => {
            let validated = ImageValidator::new().validate_image(image)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&validated)?);
            } else {
                println!("✅ Valid boot/recovery image");
                println!("  File: {}", validated.path.display());
                println!("  Type: {}", validated.kind);
                println!("  Size: {:.2} MB", validated.size_mb);
            }
            Ok(true)
        }

        Command::Info { image, json } => {
            let info = ImageValidator::new().image_info(image)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("📋 {}", info.filename);
                println!("  Path:      {}", info.filepath.display());
                println!("  Size:      {:.2} MB ({} bytes)", info.size_mb, info.size_bytes);
                println!("  Extension: {}", info.extension);
                println!("  Type:      {}", info.kind);
                if let Some(modified) = info.modified {
                    println!("  Modified:  {}", modified.format("%Y-%m-%d %H:%M:%S"));
                }
            }
            Ok(true)
        }

        Command::Generate {
            image,
            output,
            tree_type,
            no_git,
            no_validate,
            open,
            json,
        } => {
            let request = GenerationRequest {
                image: image.clone(),
                output_dir: output
                    .clone()
                    .unwrap_or_else(|| settings.general.default_output_dir.clone()),
                tree_type: tree_type.unwrap_or(settings.general.tree_type),
                init_git: settings.general.init_git && !no_git,
                validate: settings.general.auto_validate && !no_validate,
            };

            tracing::info!("🚀 Starting device tree generation");
            let generator = ExternalToolGenerator::new(settings.generator.clone());
            let processor = DeviceTreeProcessor::new(
                generator,
                settings.git.clone(),
                settings.generator.install_hint.clone(),
            );
            let engine = DtgenEngine::new(processor);

            let mut reporter = ConsoleReporter::new(*json);
            let outcome = engine.run(&request, |event| reporter.handle(event)).await?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }

            if *open || settings.general.auto_open_output {
                desktop::open_in_file_manager(&outcome.output_path);
            }
            Ok(true)
        }

        Command::Verify { dir, tree, json } => {
            let info = device_info::extract_device_info(dir);
            let validation = tree_check::validate_device_tree(dir);
            let entries = if *tree {
                tree_check::list_tree(dir)
            } else {
                Vec::new()
            };

            if *json {
                let report = serde_json::json!({
                    "path": dir,
                    "device_info": info,
                    "validation": validation,
                    "tree": entries,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("📱 Device: {} / {}", info.manufacturer, info.device);
                println!("  Model:        {}", info.model);
                println!("  Architecture: {}", info.architecture);
                if validation.valid {
                    println!("✅ Device tree looks complete");
                } else {
                    for warning in &validation.warnings {
                        println!("⚠️  {}", warning);
                    }
                    for error in &validation.errors {
                        println!("❌ {}", error);
                    }
                }
                print_tree(dir, &entries);
            }
            Ok(validation.valid)
        }

        Command::Doctor => {
            let generator = ExternalToolGenerator::new(settings.generator.clone());
            let tool_ok = generator.check_available().await;
            let git_ok = git::git_available(&settings.git).await;

            report_check(generator.name(), tool_ok, &settings.generator.install_hint);
            report_check("git", git_ok, "install git from your package manager");
            Ok(tool_ok)
        }
    }
}

fn print_outcome(outcome: &GenerationOutcome) {
    let rule = "=".repeat(60);
    println!("{}", rule);
    println!("SUCCESS: Device tree generated!");
    println!("Location:     {}", outcome.output_path.display());
    println!("Device:       {}", outcome.device_name);
    println!("Manufacturer: {}", outcome.manufacturer);
    println!("Model:        {}", outcome.device_info.model);
    println!("Architecture: {}", outcome.device_info.architecture);
    match &outcome.git {
        GitStatus::Initialized => println!("Git:          initialized"),
        GitStatus::Skipped => println!("Git:          skipped"),
        GitStatus::Failed(reason) => println!("Git:          failed ({})", reason),
    }
    if let Some(validation) = &outcome.validation {
        if validation.valid {
            println!("Validation:   passed");
        } else {
            println!("Validation:   {} issue(s)", validation.warnings.len() + validation.errors.len());
        }
    }
    println!("{}", rule);
}

fn print_tree(root: &Path, entries: &[TreeEntry]) {
    if entries.is_empty() {
        return;
    }
    println!();
    println!("{}", root.display());
    for entry in entries {
        let name = entry
            .relative_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffix = if entry.is_dir { "/" } else { "" };
        println!("{}{}{}", "  ".repeat(entry.depth + 1), name, suffix);
    }
}

fn report_check(name: &str, ok: bool, hint: &str) {
    if ok {
        println!("✅ {} is available", name);
    } else {
        println!("❌ {} is not available ({})", name, hint);
    }
}
