pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::TreeType;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "dtgen")]
#[command(version)]
#[command(about = "Generate Android device trees from boot/recovery images")]
pub struct CliConfig {
    /// Path to a TOML settings file (defaults to ./dtgen.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate a boot/recovery image
    Check {
        image: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Show file details for an image
    Info {
        image: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Generate a device tree from an image
    Generate {
        image: PathBuf,

        /// Output directory (defaults to general.default_output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum)]
        tree_type: Option<TreeType>,

        /// Do not initialize a git repository in the output directory
        #[arg(long)]
        no_git: bool,

        /// Skip validation of the generated tree
        #[arg(long)]
        no_validate: bool,

        /// Open the output directory in the file manager when done
        #[arg(long)]
        open: bool,

        #[arg(long)]
        json: bool,
    },

    /// Inspect and validate an existing device tree
    Verify {
        dir: PathBuf,

        /// Also list the files in the tree
        #[arg(long)]
        tree: bool,

        #[arg(long)]
        json: bool,
    },

    /// Check that the generator tool and git are usable
    Doctor,
}
