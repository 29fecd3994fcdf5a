use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{BED_SUFFIX, CONTROL_MARK, DEFAULT_HOST};
use crate::error::CmftError;

pub const CONFIG_FILE: &str = "kira-cmft.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub purge: Option<bool>,
    #[serde(default)]
    pub control_mark: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub bed_suffix: Option<String>,
    #[serde(default)]
    pub output: Option<OutputEntry>,
    #[serde(default)]
    pub columns: Option<ColumnEntry>,
    #[serde(default)]
    pub workers: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OutputEntry {
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub cmft: Option<String>,
    #[serde(default)]
    pub manifest: Option<String>,
    #[serde(default)]
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ColumnEntry {
    pub sample: usize,
    pub url: usize,
    pub mark: usize,
}

impl Default for ColumnEntry {
    fn default() -> Self {
        Self {
            sample: 1,
            url: 2,
            mark: 3,
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub purge: Option<bool>,
    pub control_mark: Option<String>,
    pub out_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub purge: bool,
    pub control_mark: String,
    pub host: String,
    pub bed_suffix: String,
    pub out_dir: Utf8PathBuf,
    pub cmft_file: String,
    pub manifest_file: String,
    pub delimiter: u8,
    pub columns: ColumnEntry,
    pub workers: usize,
}

impl ResolvedConfig {
    pub fn cmft_path(&self) -> Utf8PathBuf {
        self.out_dir.join(&self.cmft_file)
    }

    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.out_dir.join(&self.manifest_file)
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            purge: false,
            control_mark: CONTROL_MARK.to_string(),
            host: DEFAULT_HOST.to_string(),
            bed_suffix: BED_SUFFIX.to_string(),
            out_dir: Utf8PathBuf::from("."),
            cmft_file: "cmft.tsv".to_string(),
            manifest_file: "wget.conf".to_string(),
            delimiter: b'\t',
            columns: ColumnEntry::default(),
            workers: 4,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `kira-cmft.json` in the working directory when present,
    /// and applies `overrides` on top. Without any file the defaults are used.
    pub fn resolve(
        path: Option<&str>,
        overrides: &ConfigOverrides,
    ) -> Result<ResolvedConfig, CmftError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| CmftError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content).map_err(|err| CmftError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: &ConfigOverrides,
    ) -> Result<ResolvedConfig, CmftError> {
        let defaults = ResolvedConfig::default();
        let output = config.output.unwrap_or_default();

        let control_mark = overrides
            .control_mark
            .clone()
            .or(config.control_mark)
            .unwrap_or(defaults.control_mark);
        if control_mark.trim().is_empty() {
            return Err(CmftError::InvalidConfig(
                "control_mark must not be empty".to_string(),
            ));
        }

        let delimiter = match output.delimiter {
            Some(value) => parse_delimiter(&value)?,
            None => defaults.delimiter,
        };

        let workers = config.workers.unwrap_or(defaults.workers);
        if workers == 0 {
            return Err(CmftError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }

        let columns = config.columns.unwrap_or(defaults.columns);
        if columns.sample == columns.url
            || columns.sample == columns.mark
            || columns.url == columns.mark
        {
            return Err(CmftError::InvalidConfig(format!(
                "metadata columns must be distinct: sample={}, url={}, mark={}",
                columns.sample, columns.url, columns.mark
            )));
        }

        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(defaults.schema_version),
            purge: overrides.purge.or(config.purge).unwrap_or(defaults.purge),
            control_mark,
            host: config.host.unwrap_or(defaults.host),
            bed_suffix: config.bed_suffix.unwrap_or(defaults.bed_suffix),
            out_dir: overrides
                .out_dir
                .clone()
                .or(output.dir)
                .map(Utf8PathBuf::from)
                .unwrap_or(defaults.out_dir),
            cmft_file: output.cmft.unwrap_or(defaults.cmft_file),
            manifest_file: output.manifest.unwrap_or(defaults.manifest_file),
            delimiter,
            columns,
            workers,
        })
    }
}

fn parse_delimiter(value: &str) -> Result<u8, CmftError> {
    match value {
        "\\t" | "tab" => Ok(b'\t'),
        _ if value.len() == 1 => Ok(value.as_bytes()[0]),
        _ => Err(CmftError::InvalidConfig(format!(
            "delimiter must be a single byte: {value:?}"
        ))),
    }
}
