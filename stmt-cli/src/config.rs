use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "stmtflag.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub report: ReportSection,
    pub output: OutputSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    /// Submitter identity printed on the report
    pub name: String,
    pub email: String,
    /// Hard cap on report length; overflow rows are summarised in one line
    pub max_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: PathBuf,
    pub chart: bool,
    pub account_csv: String,
    pub transactions_csv: String,
    pub chart_png: String,
    pub report_pdf: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub json: bool,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            name: "Your Name".to_string(),
            email: "you@example.com".to_string(),
            max_pages: 1,
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            chart: true,
            account_csv: "account_info.csv".to_string(),
            transactions_csv: "transactions.csv".to_string(),
            chart_png: "timeline.png".to_string(),
            report_pdf: "report.pdf".to_string(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Explicit path must exist; otherwise `./stmtflag.toml` is used when present.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let p = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !p.exists() {
                return Ok(Config::default());
            }
            p
        }
    };
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the default config unless the file already exists. Returns true if written.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(false);
    }
    save_config(path, &Config::default())?;
    println!("Wrote {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg: Config = toml::from_str("[report]\nname = \"A. Analyst\"\n\n[logging]\njson = true\n").unwrap();
        assert_eq!(cfg.report.name, "A. Analyst");
        assert_eq!(cfg.report.email, "you@example.com");
        assert_eq!(cfg.report.max_pages, 1);
        assert_eq!(cfg.output, OutputSection::default());
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.logging.json);
    }

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        assert!(init_config(&path).unwrap());
        assert!(!init_config(&path).unwrap());
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_bad_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[report\nname=").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }
}
