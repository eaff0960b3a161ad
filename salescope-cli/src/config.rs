use anyhow::{Context, Result};
use salescope_core::{AnalysisOptions, NormalizeOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub report: ReportSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// chrono format of the `Date` column
    pub date_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    /// Rows printed per ranking table
    pub limit: usize,
    /// Print the bundle as JSON instead of the text report
    pub json: bool,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            date_format: NormalizeOptions::default().date_format,
        }
    }
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            limit: 10,
            json: false,
        }
    }
}

impl Config {
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            normalize: NormalizeOptions {
                date_format: self.analysis.date_format.clone(),
            },
        }
    }
}

pub fn salescope_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".salescope"))
}

/// `--config` when given, otherwise `~/.salescope/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(salescope_home()?.join("config.toml")),
    }
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_config(&s).with_context(|| format!("in {}", path.display()))
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    save_config(path, &Config::default())?;
    println!("Wrote {}", path.display());
    Ok(())
}
