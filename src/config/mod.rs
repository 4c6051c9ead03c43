mod file_config;

pub use file_config::{FileConfig, MailConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_FROM_ADDRESS: &str = "planner@localhost";
pub const DEFAULT_SUBJECT_PREFIX: &str = "[Planner]";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub mail: MailSettings,
}

/// How outgoing planner mail is composed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub from_address: String,
    pub subject_prefix: String,
    pub base_url: Option<String>,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
            base_url: None,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let mail_file = file.mail.unwrap_or_default();
        let defaults = MailSettings::default();
        let mail = MailSettings {
            from_address: mail_file.from_address.unwrap_or(defaults.from_address),
            subject_prefix: mail_file.subject_prefix.unwrap_or(defaults.subject_prefix),
            base_url: mail_file
                .base_url
                .map(|url| url.trim_end_matches('/').to_string()),
        };

        Ok(Self { db_dir, mail })
    }

    pub fn planner_db_path(&self) -> PathBuf {
        self.db_dir.join("planner.db")
    }

    pub fn mail_db_path(&self) -> PathBuf {
        self.db_dir.join("mail_outbox.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.mail, MailSettings::default());
        assert_eq!(config.planner_db_path(), temp_dir.path().join("planner.db"));
        assert_eq!(config.mail_db_path(), temp_dir.path().join("mail_outbox.db"));
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/should/be/overridden")),
        };
        let file_config = FileConfig {
            db_dir: Some(temp_dir.path().to_string_lossy().to_string()),
            mail: Some(MailConfig {
                from_address: Some("pm@example.com".to_string()),
                subject_prefix: None,
                base_url: Some("https://tracker.example.com/".to_string()),
            }),
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.mail.from_address, "pm@example.com");
        // Default used when TOML doesn't specify
        assert_eq!(config.mail.subject_prefix, DEFAULT_SUBJECT_PREFIX);
        assert_eq!(
            config.mail.base_url.as_deref(),
            Some("https://tracker.example.com")
        );
    }

    #[test]
    fn test_resolve_missing_db_dir_error() {
        let result = AppConfig::resolve(&CliConfig::default(), None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_dir must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_db_dir_error() {
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/nonexistent/path/that/should/not/exist")),
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_db_dir_not_directory_error() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(temp_file.path().to_path_buf()),
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }
}
