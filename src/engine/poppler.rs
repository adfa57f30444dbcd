use super::{process::run_tool, Document, DocumentSource};
use crate::config::{Config, RasterFormat};
use anyhow::{anyhow, bail, Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Document source backed by poppler-utils (`pdfinfo` + `pdftoppm`).
pub struct PopplerSource {
    pdfinfo_exe: String,
    pdftoppm_exe: String,
    format: RasterFormat,
}

impl PopplerSource {
    pub fn new(cfg: &Config) -> Self {
        Self {
            pdfinfo_exe: cfg.render.pdfinfo_exe.clone(),
            pdftoppm_exe: cfg.render.pdftoppm_exe.clone(),
            format: cfg.render.format,
        }
    }
}

impl DocumentSource for PopplerSource {
    type Doc = PopplerDocument;

    fn open(&self, path: &Path) -> Result<PopplerDocument> {
        let out = run_tool(&self.pdfinfo_exe, [path.as_os_str()])
            .with_context(|| format!("pdfinfo {}", path.display()))?;
        let info = String::from_utf8_lossy(&out);
        let page_count = parse_page_count(&info)
            .ok_or_else(|| anyhow!("pdfinfo reported no page count for {}", path.display()))?;

        Ok(PopplerDocument {
            path: path.to_path_buf(),
            page_count,
            pdftoppm_exe: self.pdftoppm_exe.clone(),
            format: self.format,
        })
    }
}

pub struct PopplerDocument {
    path: PathBuf,
    page_count: u32,
    pdftoppm_exe: String,
    format: RasterFormat,
}

impl Document for PopplerDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn render(&self, page: u32, dpi: u32, out: &Path) -> Result<()> {
        if page < 1 || page > self.page_count {
            bail!("page {page} is out of range (1-{})", self.page_count);
        }

        // pdftoppm appends the extension itself.
        let root = out.with_extension("");
        let format_flag = match self.format {
            RasterFormat::Jpeg => "-jpeg",
            RasterFormat::Png => "-png",
        };
        let page_arg = page.to_string();
        let args: Vec<OsString> = vec![
            "-r".into(),
            dpi.to_string().into(),
            "-f".into(),
            page_arg.clone().into(),
            "-l".into(),
            page_arg.into(),
            "-singlefile".into(),
            format_flag.into(),
            "-aa".into(),
            "yes".into(),
            "-aaVector".into(),
            "yes".into(),
            self.path.clone().into(),
            root.into(),
        ];
        run_tool(&self.pdftoppm_exe, &args)?;

        let written = std::fs::metadata(out).map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            bail!("renderer produced no image at {}", out.display());
        }
        Ok(())
    }
}

fn parse_page_count(info: &str) -> Option<u32> {
    info.lines()
        .find_map(|l| l.strip_prefix("Pages:"))
        .and_then(|v| v.trim().parse().ok())
}
