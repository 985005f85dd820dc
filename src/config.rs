//! Command-line and environment configuration.

use std::{net::SocketAddr, path::PathBuf};

use anyhow::{bail, Result};
use clap::Parser;

use crate::{models::is_safe_identifier, storage::WORKBOOK_FILE_NAME};

/// Health intake service: validates survey submissions and keeps them as JSON
/// records and rows of a shared workbook.
#[derive(Parser, Debug, Clone)]
#[command(name = "health-intake")]
#[command(about = "Health survey intake and storage service")]
pub struct Config {
    /// Directory holding `<id>.json` records and the workbook
    #[arg(long, env = "HEALTH_INTAKE_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Address to listen on
    #[arg(long, env = "HEALTH_INTAKE_LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// File name of the workbook inside the data directory
    #[arg(long, env = "HEALTH_INTAKE_WORKBOOK", default_value = WORKBOOK_FILE_NAME)]
    pub workbook_name: String,
}

impl Config {
    /// Defaults for a given data directory; used by embedders and tests.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            workbook_name: WORKBOOK_FILE_NAME.to_string(),
        }
    }

    pub fn workbook_path(&self) -> PathBuf {
        self.data_dir.join(&self.workbook_name)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_safe_identifier(&self.workbook_name) {
            bail!(
                "Invalid workbook name {:?}. Must be a plain file name",
                self.workbook_name
            );
        }
        if !self.workbook_name.ends_with(".xlsx") {
            bail!("Invalid workbook name {:?}. Must end in .xlsx", self.workbook_name);
        }
        Ok(())
    }
}

/// Initializes `env_logger` at `Info`, letting `RUST_LOG` override.
pub fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let config = Config::try_parse_from(["health-intake"]).unwrap();
        assert_eq!(config.workbook_name, "health_data.xlsx");
        assert_eq!(config.listen.port(), 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "health-intake",
            "--data-dir",
            "/srv/intake",
            "--listen",
            "0.0.0.0:8080",
            "--workbook-name",
            "survey.xlsx",
        ])
        .unwrap();
        assert_eq!(config.workbook_path(), PathBuf::from("/srv/intake/survey.xlsx"));
        assert_eq!(config.listen.port(), 8080);
    }

    #[test]
    fn workbook_name_must_be_a_plain_xlsx_file() {
        let mut config = Config::with_data_dir("data");
        config.workbook_name = "../escape.xlsx".into();
        assert!(config.validate().is_err());
        config.workbook_name = "sheet.csv".into();
        assert!(config.validate().is_err());
    }
}
