//! Settings, read from a TOML file.
//!
//! ```toml
//! data_dir = "../data"
//! year = 2021
//!
//! [profile]
//! vaccine_filter = "covid"
//! min_count = 25
//! min_percent = 0.0
//! dedupe = { "covid-19 pneumonia" = "covid-19" }
//! ```
use crate::{record::Source, stats::ProfileOptions};
use chrono::{Datelike, Utc};
use qu::ick_use::*;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory containing the `{year}VAERS*.csv` files.
    pub data_dir: PathBuf,
    /// Which year's extract to load.
    pub year: i32,
    pub profile: ProfileOptions,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("."),
            year: Utc::now().year(),
            profile: ProfileOptions::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        fn inner(path: &Path) -> Result<Config> {
            let text = fs::read_to_string(path)?;
            Config::from_toml(&text)
        }
        let path = path.as_ref();
        inner(path).with_context(|| format!("unable to load config from \"{}\"", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid config")
    }

    /// Where the file for `source` is, e.g. `{data_dir}/2021VAERSVAX.csv`.
    pub fn source_path(&self, source: Source) -> PathBuf {
        self.data_dir
            .join(format!("{}{}.csv", self.year, source.file_stem()))
    }
}
