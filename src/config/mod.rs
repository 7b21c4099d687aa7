mod file_config;

pub use file_config::FileConfig;

use crate::pipeline::{IngestOptions, DEFAULT_EXTENSION};
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_PATH: &str = "sparkify.db";
pub const DEFAULT_SONG_DATA: &str = "data/song_data";
pub const DEFAULT_LOG_DATA: &str = "data/log_data";

/// CLI arguments that can be used for config resolution.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: PathBuf,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub extension: String,
    pub continue_on_error: bool,
    pub dry_run: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            song_data: PathBuf::from(DEFAULT_SONG_DATA),
            log_data: PathBuf::from(DEFAULT_LOG_DATA),
            extension: DEFAULT_EXTENSION.to_string(),
            continue_on_error: true,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub ingest: IngestOptions,
    /// Load into memory only, leaving `db_path` untouched.
    pub dry_run: bool,
}

fn validate_data_dir(name: &str, dir: &Path) -> Result<()> {
    if !dir.exists() {
        bail!("{} directory does not exist: {:?}", name, dir);
    }
    if !dir.is_dir() {
        bail!("{} is not a directory: {:?}", name, dir);
    }
    Ok(())
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.db_path.clone());
        let song_data = file
            .song_data
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.song_data.clone());
        let log_data = file
            .log_data
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.log_data.clone());

        validate_data_dir("song_data", &song_data)?;
        validate_data_dir("log_data", &log_data)?;

        let extension = file
            .extension
            .unwrap_or_else(|| cli.extension.clone())
            .trim_start_matches('.')
            .to_string();
        if extension.is_empty() {
            bail!("extension must not be empty");
        }

        let continue_on_error = file.continue_on_error.unwrap_or(cli.continue_on_error);

        Ok(Self {
            db_path,
            song_data,
            log_data,
            ingest: IngestOptions {
                extension,
                continue_on_error,
            },
            dry_run: cli.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct DataDirs {
        root: TempDir,
    }

    impl DataDirs {
        fn new() -> Self {
            let root = TempDir::new().unwrap();
            std::fs::create_dir_all(root.path().join("song_data")).unwrap();
            std::fs::create_dir_all(root.path().join("log_data")).unwrap();
            Self { root }
        }

        fn song_data(&self) -> PathBuf {
            self.root.path().join("song_data")
        }

        fn log_data(&self) -> PathBuf {
            self.root.path().join("log_data")
        }

        fn cli(&self) -> CliConfig {
            CliConfig {
                song_data: self.song_data(),
                log_data: self.log_data(),
                ..Default::default()
            }
        }
    }

    #[test]
    fn test_resolve_cli_only() {
        let dirs = DataDirs::new();
        let config = AppConfig::resolve(&dirs.cli(), None).unwrap();

        assert_eq!(config.db_path, PathBuf::from("sparkify.db"));
        assert_eq!(config.song_data, dirs.song_data());
        assert_eq!(config.log_data, dirs.log_data());
        assert_eq!(config.ingest, IngestOptions::default());
        assert!(!config.dry_run);
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let dirs = DataDirs::new();
        let cli = CliConfig {
            song_data: PathBuf::from("/should/be/overridden"),
            extension: "jsonl".to_string(),
            dry_run: true,
            ..dirs.cli()
        };
        let file_config = FileConfig {
            db_path: Some("/tmp/warehouse.db".to_string()),
            song_data: Some(dirs.song_data().to_string_lossy().to_string()),
            continue_on_error: Some(false),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        // TOML values override CLI
        assert_eq!(config.db_path, PathBuf::from("/tmp/warehouse.db"));
        assert_eq!(config.song_data, dirs.song_data());
        assert!(!config.ingest.continue_on_error);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.log_data, dirs.log_data());
        assert_eq!(config.ingest.extension, "jsonl");
        assert!(config.dry_run);
    }

    #[test]
    fn test_resolve_strips_extension_dot() {
        let dirs = DataDirs::new();
        let file_config = FileConfig {
            extension: Some(".JSON".to_string()),
            ..Default::default()
        };
        let config = AppConfig::resolve(&dirs.cli(), Some(file_config)).unwrap();
        assert_eq!(config.ingest.extension, "JSON");

        let cli = CliConfig {
            extension: ".".to_string(),
            ..dirs.cli()
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_resolve_nonexistent_data_dir_error() {
        let dirs = DataDirs::new();
        let cli = CliConfig {
            log_data: PathBuf::from("/nonexistent/path/that/should/not/exist"),
            ..dirs.cli()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_data_dir_not_directory_error() {
        let dirs = DataDirs::new();
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            song_data: temp_file.path().to_path_buf(),
            ..dirs.cli()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }
}
