use crate::{
    config::RasterFormat,
    engine::{Document, OcrEngine, OcrLine},
    error::{Result, ScanError},
    report::{Match, PageResult},
    util::sha256_hex,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const RENDER_DPI: u32 = 300;

/// Names temporary rasters for one document: `<stem>-<hash>_<page>.<ext>`.
///
/// Page numbers are unique within a run, so workers never share a file.
#[derive(Debug, Clone)]
pub struct RasterNamespace {
    dir: PathBuf,
    prefix: String,
    format: RasterFormat,
}

impl RasterNamespace {
    pub fn for_document(work_dir: &Path, document: &Path, format: RasterFormat) -> Self {
        let stem = document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "page".to_string());
        let hash = sha256_hex(document.display().to_string().as_bytes());
        Self {
            dir: work_dir.to_path_buf(),
            prefix: format!("{stem}-{}", &hash[..12]),
            format,
        }
    }

    pub fn path_for(&self, page: u32) -> PathBuf {
        self.dir
            .join(format!("{}_{page}.{}", self.prefix, self.format.extension()))
    }
}

/// Rendered page image on disk, removed when dropped.
struct TempRaster {
    path: PathBuf,
}

impl TempRaster {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempRaster {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove {}: {e}", self.path.display()),
        }
    }
}

/// Render, OCR and term scan for single pages of one opened document.
pub struct PageProcessor<'a, D: Document, O: OcrEngine> {
    doc: &'a D,
    ocr: &'a O,
    rasters: &'a RasterNamespace,
    all_occurrences: bool,
}

impl<'a, D: Document, O: OcrEngine> PageProcessor<'a, D, O> {
    pub fn new(doc: &'a D, ocr: &'a O, rasters: &'a RasterNamespace, all_occurrences: bool) -> Self {
        Self {
            doc,
            ocr,
            rasters,
            all_occurrences,
        }
    }

    pub fn process(&self, page: u32, terms: &[String]) -> Result<PageResult> {
        let total = self.doc.page_count();
        if page < 1 || page > total {
            return Err(ScanError::Render {
                page,
                reason: format!("page number {page} is out of range (1-{total})"),
            });
        }

        let raster = TempRaster::new(self.rasters.path_for(page));
        self.doc
            .render(page, RENDER_DPI, raster.path())
            .map_err(|e| ScanError::Render {
                page,
                reason: format!("{e:#}"),
            })?;
        if !raster.path().is_file() {
            return Err(ScanError::Render {
                page,
                reason: "renderer reported an invalid image".to_string(),
            });
        }

        info!("processing {} (page number {page})", raster.path().display());

        let lines = self.ocr.recognize(raster.path()).map_err(|e| ScanError::Ocr {
            page,
            reason: format!("{e:#}"),
        })?;

        let mut result = PageResult::empty(page);
        for line in lines {
            scan_line(&line, terms, self.all_occurrences, &mut result);
        }
        debug!("page {page}: {} matches", result.match_count());

        Ok(result)
    }
}

/// Records literal, case-sensitive occurrences of each term in `line`.
///
/// Only the first occurrence per term is recorded unless `all_occurrences`
/// is set, in which case every non-overlapping occurrence is. Empty terms
/// never match.
pub fn scan_line(line: &OcrLine, terms: &[String], all_occurrences: bool, out: &mut PageResult) {
    for term in terms.iter().filter(|t| !t.is_empty()) {
        let offsets: Vec<usize> = if all_occurrences {
            line.text.match_indices(term.as_str()).map(|(i, _)| i).collect()
        } else {
            line.text.find(term.as_str()).into_iter().collect()
        };

        for start_offset in offsets {
            out.record(Match {
                term: term.clone(),
                start_offset,
                confidence: line.confidence,
                bbox: line.bbox,
                line_text: line.text.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BoundingBox;

    fn line(text: &str) -> OcrLine {
        OcrLine {
            text: text.to_string(),
            confidence: 91.5,
            bbox: BoundingBox {
                x1: 10,
                y1: 20,
                x2: 300,
                y2: 60,
            },
        }
    }

    fn terms(t: &[&str]) -> Vec<String> {
        t.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn finds_term_at_byte_offset() {
        let mut page = PageResult::empty(1);
        scan_line(&line("INVOICE-1234 TOTAL"), &terms(&["1234"]), false, &mut page);

        let hits = &page.found_terms["1234"];
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].start_offset, 8);
        assert_eq!(hits[0].confidence, 91.5);
        assert_eq!(hits[0].line_text, "INVOICE-1234 TOTAL");
        assert_eq!(hits[0].bbox.x2, 300);
    }

    #[test]
    fn first_occurrence_only_by_default() {
        let mut page = PageResult::empty(1);
        scan_line(&line("ab ab ab"), &terms(&["ab"]), false, &mut page);
        assert_eq!(page.found_terms["ab"].len(), 1);
        assert_eq!(page.found_terms["ab"][0].start_offset, 0);
    }

    #[test]
    fn all_occurrences_are_non_overlapping() {
        let mut page = PageResult::empty(1);
        scan_line(&line("aaaa"), &terms(&["aa"]), true, &mut page);
        let offsets: Vec<usize> = page.found_terms["aa"].iter().map(|m| m.start_offset).collect();
        assert_eq!(offsets, vec![0, 2]);
    }

    #[test]
    fn matching_is_case_sensitive_and_per_term() {
        let mut page = PageResult::empty(1);
        scan_line(
            &line("Total due: 42 EUR"),
            &terms(&["total", "42", "EUR", ""]),
            false,
            &mut page,
        );
        assert!(!page.found_terms.contains_key("total"));
        assert!(!page.found_terms.contains_key(""));
        assert_eq!(page.found_terms["42"][0].start_offset, 11);
        assert_eq!(page.found_terms["EUR"][0].start_offset, 14);
    }

    #[test]
    fn offsets_are_bytes_not_chars() {
        let mut page = PageResult::empty(1);
        scan_line(&line("Straße 7"), &terms(&["7"]), false, &mut page);
        assert_eq!(page.found_terms["7"][0].start_offset, 8);
    }

    #[test]
    fn raster_names_are_per_page() {
        let ns = RasterNamespace::for_document(
            Path::new("/tmp/work"),
            Path::new("/data/scan.pdf"),
            RasterFormat::Jpeg,
        );
        let p3 = ns.path_for(3);
        let p4 = ns.path_for(4);
        assert_ne!(p3, p4);
        assert!(p3.starts_with("/tmp/work"));
        let name = p3.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("scan-"));
        assert!(name.ends_with("_3.jpg"));
    }
}
