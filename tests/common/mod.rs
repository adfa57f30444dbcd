#![allow(dead_code)]

use anyhow::{bail, Result};
use pagescan::{
    config::Config,
    engine::{BoundingBox, Document, DocumentSource, LineStream, OcrEngine, OcrLine},
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Marker a page's text can carry to make the fake OCR engine fail on it.
pub const OCR_FAIL: &str = "#ocr-fail";

/// In-memory document source. Rendering writes the page's text lines to the
/// raster path so the fake OCR engine can read them back.
#[derive(Default, Clone)]
pub struct FakeSource {
    pub pages: u32,
    pub text: BTreeMap<u32, Vec<String>>,
    /// Pages whose render writes a partial file and then fails.
    pub broken_pages: BTreeSet<u32>,
    pub fail_open: bool,
    /// Name of the worker thread whose own `open` fails; setup still succeeds.
    pub broken_handle_thread: Option<String>,
}

impl FakeSource {
    pub fn new(pages: u32) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn with_text(mut self, page: u32, lines: &[&str]) -> Self {
        self.text
            .insert(page, lines.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn with_broken_page(mut self, page: u32) -> Self {
        self.broken_pages.insert(page);
        self
    }

    pub fn with_broken_handle_for(mut self, thread_name: String) -> Self {
        self.broken_handle_thread = Some(thread_name);
        self
    }
}

pub struct FakeDoc {
    source: FakeSource,
}

impl DocumentSource for FakeSource {
    type Doc = FakeDoc;

    fn open(&self, _path: &Path) -> Result<FakeDoc> {
        if self.fail_open {
            bail!("corrupt xref table");
        }
        if let Some(name) = &self.broken_handle_thread {
            if std::thread::current().name() == Some(name.as_str()) {
                bail!("broken handle");
            }
        }
        Ok(FakeDoc {
            source: self.clone(),
        })
    }
}

impl Document for FakeDoc {
    fn page_count(&self) -> u32 {
        self.source.pages
    }

    fn render(&self, page: u32, dpi: u32, out: &Path) -> Result<()> {
        assert_eq!(dpi, 300);
        if self.source.broken_pages.contains(&page) {
            std::fs::write(out, b"partial")?;
            bail!("renderer reported an invalid image");
        }
        let body = self
            .source
            .text
            .get(&page)
            .map(|l| l.join("\n"))
            .unwrap_or_default();
        std::fs::write(out, body)?;
        Ok(())
    }
}

pub struct FakeOcr;

impl OcrEngine for FakeOcr {
    fn recognize(&self, image: &Path) -> Result<LineStream> {
        let body = std::fs::read_to_string(image)?;
        if body.contains(OCR_FAIL) {
            bail!("tesseract crashed");
        }
        let lines: Vec<OcrLine> = body
            .lines()
            .enumerate()
            .map(|(i, text)| OcrLine {
                text: text.to_string(),
                confidence: 90.0,
                bbox: BoundingBox {
                    x1: 10,
                    y1: 40 * i as i32,
                    x2: 500,
                    y2: 40 * i as i32 + 30,
                },
            })
            .collect();
        Ok(Box::new(lines.into_iter()))
    }
}

pub struct Scratch {
    pub dir: TempDir,
    pub cfg: Config,
    pub document: PathBuf,
}

impl Scratch {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cfg = Config::default();
        cfg.paths.work_dir = dir.path().join("work").display().to_string();
        let document = dir.path().join("scan.pdf");
        std::fs::write(&document, b"%PDF-1.7").expect("write document");
        Self { dir, cfg, document }
    }

    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.cfg.paths.work_dir)
    }

    pub fn write_terms(&self, terms: &[&str]) -> PathBuf {
        let path = self.dir.path().join("terms.txt");
        std::fs::write(&path, terms.join("\n")).expect("write terms");
        path
    }

    /// Files left behind in the work directory.
    pub fn leftovers(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.work_dir()) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}
