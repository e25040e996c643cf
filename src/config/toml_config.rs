use crate::domain::model::TreeType;
use crate::utils::error::{DtgenError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "dtgen.toml";
pub const MAX_RETENTION_DAYS: u64 = 3650;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralConfig,
    pub generator: GeneratorConfig,
    pub git: GitConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub default_output_dir: PathBuf,
    pub tree_type: TreeType,
    pub init_git: bool,
    pub auto_validate: bool,
    pub verbose_logging: bool,
    pub auto_open_output: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output_dir: PathBuf::from("./output"),
            tree_type: TreeType::Twrp,
            init_git: true,
            auto_validate: true,
            verbose_logging: false,
            auto_open_output: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub program: String,
    pub args: Vec<String>,
    pub probe_timeout_seconds: u64,
    pub install_hint: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["-m".to_string(), "twrpdtgen".to_string()],
            probe_timeout_seconds: 5,
            install_hint: "pip install twrpdtgen".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    /// Name shown in messages: the module after `-m` when present, else the program.
    pub fn display_name(&self) -> &str {
        self.args
            .iter()
            .position(|arg| arg == "-m")
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
            .unwrap_or(&self.program)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub commit_message: String,
    pub timeout_seconds: u64,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            commit_message: "Initial device tree generation".to_string(),
            timeout_seconds: 10,
            author_name: None,
            author_email: None,
        }
    }
}

impl GitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub retention_days: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            retention_days: 7,
        }
    }
}

impl Settings {
    /// Reads and parses a TOML settings file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DtgenError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses settings from TOML text after `${VAR}` substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DtgenError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Explicit path first, then `dtgen.toml` in the working directory, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DtgenError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("generator.program", &self.generator.program)?;
        validation::validate_range(
            "generator.probe_timeout_seconds",
            self.generator.probe_timeout_seconds,
            1,
            300,
        )?;
        validation::validate_range("git.timeout_seconds", self.git.timeout_seconds, 1, 600)?;
        validation::validate_non_empty_string("git.commit_message", &self.git.commit_message)?;
        validation::validate_path(
            "general.default_output_dir",
            &self.general.default_output_dir.to_string_lossy(),
        )?;
        validation::validate_path(
            "logging.directory",
            &self.logging.directory.to_string_lossy(),
        )?;
        validation::validate_range(
            "logging.retention_days",
            self.logging.retention_days,
            1,
            MAX_RETENTION_DAYS,
        )?;

        Ok(())
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();

        assert_eq!(settings.general.default_output_dir, PathBuf::from("./output"));
        assert_eq!(settings.general.tree_type, TreeType::Twrp);
        assert!(settings.general.init_git);
        assert!(settings.general.auto_validate);
        assert_eq!(settings.generator.program, "python3");
        assert_eq!(settings.generator.display_name(), "twrpdtgen");
        assert_eq!(settings.git.commit_message, "Initial device tree generation");
        assert_eq!(settings.logging.retention_days, 7);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
[general]
default_output_dir = "/tmp/trees"
init_git = false
tree_type = "lineageos"

[generator]
program = "/opt/dtgen/bin/twrpdtgen"
args = []
"#;

        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert_eq!(settings.general.default_output_dir, PathBuf::from("/tmp/trees"));
        assert!(!settings.general.init_git);
        assert!(settings.general.auto_validate);
        assert_eq!(settings.general.tree_type, TreeType::LineageOs);
        assert_eq!(settings.generator.display_name(), "/opt/dtgen/bin/twrpdtgen");
        assert_eq!(settings.generator.probe_timeout_seconds, 5);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DTGEN_TEST_OUTPUT_ROOT", "/srv/device-trees");

        let toml_content = r#"
[general]
default_output_dir = "${DTGEN_TEST_OUTPUT_ROOT}/out"
"#;

        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert_eq!(
            settings.general.default_output_dir,
            PathBuf::from("/srv/device-trees/out")
        );

        std::env::remove_var("DTGEN_TEST_OUTPUT_ROOT");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[generator]
program = "  "
"#;
        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert!(settings.validate().is_err());

        let toml_content = r#"
[git]
timeout_seconds = 0
"#;
        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert!(settings.validate().is_err());

        let toml_content = r#"
[logging]
retention_days = 0
"#;
        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_retention_days_upper_bound() {
        let settings = Settings::from_toml_str("[logging]\nretention_days = 3650\n").unwrap();
        assert!(settings.validate().is_ok());

        let settings =
            Settings::from_toml_str("[logging]\nretention_days = 300000000000000\n").unwrap();
        match settings.validate().unwrap_err() {
            DtgenError::InvalidConfigValueError { field, .. } => {
                assert_eq!(field, "logging.retention_days")
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Settings::from_toml_str("[general\ninit_git = ").unwrap_err();
        assert!(matches!(err, DtgenError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[git]
commit_message = "Add generated tree"
author_name = "Tree Bot"
author_email = "bot@example.com"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let settings = Settings::load(Some(temp_file.path())).unwrap();
        assert_eq!(settings.git.commit_message, "Add generated tree");
        assert_eq!(settings.git.author_name.as_deref(), Some("Tree Bot"));
    }
}
