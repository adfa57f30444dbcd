use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: Scan,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub render: Render,
    #[serde(default)]
    pub ocr: Ocr,
    #[serde(default)]
    pub matching: Matching,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    /// Worker count used when none is given on the command line.
    pub workers: u32,
}
impl Default for Scan {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub work_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            work_dir: ".pagescan-work".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    Jpeg,
    Png,
}

impl RasterFormat {
    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::Jpeg => "jpg",
            RasterFormat::Png => "png",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Render {
    pub pdfinfo_exe: String,
    pub pdftoppm_exe: String,
    pub format: RasterFormat,
}
impl Default for Render {
    fn default() -> Self {
        Self {
            pdfinfo_exe: "pdfinfo".into(),
            pdftoppm_exe: "pdftoppm".into(),
            format: RasterFormat::Jpeg,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ocr {
    pub tesseract_exe: String,
    #[serde(default)]
    pub extra_args: Vec<String>,
}
impl Default for Ocr {
    fn default() -> Self {
        Self {
            tesseract_exe: "tesseract".into(),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matching {
    /// Record every non-overlapping occurrence in a line, not just the first.
    pub all_occurrences: bool,
    pub skip_blank_terms: bool,
}
impl Default for Matching {
    fn default() -> Self {
        Self {
            all_occurrences: false,
            skip_blank_terms: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Output {
    pub pretty: bool,
    /// Where to write the run manifest; empty disables it.
    pub manifest_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "pagescan.log".into(),
        }
    }
}
