use super::{process::run_tool, BoundingBox, LineStream, OcrEngine, OcrLine};
use crate::config::Config;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;

pub const OCR_LANGUAGE: &str = "eng";

const TSV_LINE_LEVEL: u32 = 4;
const TSV_WORD_LEVEL: u32 = 5;
const TSV_MIN_FIELDS: usize = 11;

/// OCR engine driving the `tesseract` CLI with TSV output.
pub struct TesseractCli {
    exe: String,
    extra_args: Vec<String>,
}

impl TesseractCli {
    pub fn new(cfg: &Config) -> Self {
        Self {
            exe: cfg.ocr.tesseract_exe.clone(),
            extra_args: cfg.ocr.extra_args.clone(),
        }
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &Path) -> Result<LineStream> {
        let mut args: Vec<OsString> = vec![
            image.as_os_str().to_os_string(),
            "stdout".into(),
            "-l".into(),
            OCR_LANGUAGE.into(),
        ];
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push("tsv".into());

        let out = run_tool(&self.exe, &args)
            .with_context(|| format!("tesseract {}", image.display()))?;
        let tsv = String::from_utf8(out).context("tesseract emitted non UTF-8 text")?;
        Ok(Box::new(TsvLines::new(tsv)))
    }
}

/// Folds tesseract TSV word rows into text lines, one row at a time.
pub struct TsvLines {
    tsv: String,
    pos: usize,
    pending: Option<LineBuilder>,
}

impl TsvLines {
    pub fn new(tsv: String) -> Self {
        Self {
            tsv,
            pos: 0,
            pending: None,
        }
    }

    fn next_row(&mut self) -> Option<Row> {
        while self.pos < self.tsv.len() {
            let rest = &self.tsv[self.pos..];
            let (line, advance) = match rest.find('\n') {
                Some(i) => (&rest[..i], i + 1),
                None => (rest, rest.len()),
            };
            self.pos += advance;
            if let Some(row) = Row::parse(line) {
                return Some(row);
            }
        }
        None
    }
}

impl Iterator for TsvLines {
    type Item = OcrLine;

    fn next(&mut self) -> Option<OcrLine> {
        while let Some(row) = self.next_row() {
            let finished = match row.level {
                TSV_LINE_LEVEL => self.pending.replace(LineBuilder::new(row.bbox)),
                TSV_WORD_LEVEL => {
                    if let Some(b) = self.pending.as_mut() {
                        b.push(&row);
                    }
                    None
                }
                _ => self.pending.take(),
            };
            if let Some(line) = finished.and_then(LineBuilder::finish) {
                return Some(line);
            }
        }
        self.pending.take().and_then(LineBuilder::finish)
    }
}

struct Row {
    level: u32,
    bbox: BoundingBox,
    conf: f32,
    text: String,
}

impl Row {
    fn parse(line: &str) -> Option<Row> {
        let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
        if fields.len() < TSV_MIN_FIELDS {
            return None;
        }
        let level = fields[0].parse::<u32>().ok()?;
        let num = |i: usize| fields[i].trim().parse::<i32>().unwrap_or(0);
        let (left, top, width, height) = (num(6), num(7), num(8), num(9));

        Some(Row {
            level,
            bbox: BoundingBox {
                x1: left,
                y1: top,
                x2: left.saturating_add(width),
                y2: top.saturating_add(height),
            },
            conf: fields[10].trim().parse().unwrap_or(-1.0),
            text: fields.get(11).map(|t| t.trim().to_string()).unwrap_or_default(),
        })
    }
}

struct LineBuilder {
    bbox: BoundingBox,
    text: String,
    conf_sum: f32,
    conf_count: u32,
}

impl LineBuilder {
    fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            text: String::new(),
            conf_sum: 0.0,
            conf_count: 0,
        }
    }

    fn push(&mut self, word: &Row) {
        if word.text.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(&word.text);
        if word.conf >= 0.0 {
            self.conf_sum += word.conf;
            self.conf_count += 1;
        }
    }

    fn finish(self) -> Option<OcrLine> {
        if self.text.is_empty() {
            return None;
        }
        let confidence = if self.conf_count == 0 {
            0.0
        } else {
            self.conf_sum / self.conf_count as f32
        };
        Some(OcrLine {
            text: self.text,
            confidence,
            bbox: self.bbox,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn tsv(rows: &[&str]) -> String {
        let mut s = HEADER.to_string();
        for r in rows {
            s.push('\n');
            s.push_str(r);
        }
        s.push('\n');
        s
    }

    #[test]
    fn groups_words_into_lines() {
        let data = tsv(&[
            "1\t1\t0\t0\t0\t0\t0\t0\t2550\t3300\t-1\t",
            "2\t1\t1\t0\t0\t0\t100\t50\t900\t120\t-1\t",
            "3\t1\t1\t1\t0\t0\t100\t50\t900\t120\t-1\t",
            "4\t1\t1\t1\t1\t0\t100\t50\t400\t40\t-1\t",
            "5\t1\t1\t1\t1\t1\t100\t50\t250\t40\t90\tINVOICE-1234",
            "5\t1\t1\t1\t1\t2\t360\t50\t140\t40\t80\tTOTAL",
            "4\t1\t1\t1\t2\t0\t100\t130\t300\t40\t-1\t",
            "5\t1\t1\t1\t2\t1\t100\t130\t300\t40\t70\tDue",
        ]);

        let lines: Vec<OcrLine> = TsvLines::new(data).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "INVOICE-1234 TOTAL");
        assert_eq!(lines[0].confidence, 85.0);
        assert_eq!(
            lines[0].bbox,
            BoundingBox {
                x1: 100,
                y1: 50,
                x2: 500,
                y2: 90
            }
        );
        assert_eq!(lines[1].text, "Due");
        assert_eq!(lines[1].bbox.y1, 130);
    }

    #[test]
    fn skips_lines_without_words() {
        let data = tsv(&[
            "4\t1\t1\t1\t1\t0\t10\t10\t50\t20\t-1\t",
            "5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t-1\t ",
            "4\t1\t1\t1\t2\t0\t10\t40\t50\t20\t-1\t",
            "5\t1\t1\t1\t2\t1\t10\t40\t50\t20\t60\tok",
        ]);

        let lines: Vec<OcrLine> = TsvLines::new(data).collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "ok");
    }

    #[test]
    fn oversized_boxes_saturate() {
        let data = tsv(&[
            "4\t1\t1\t1\t1\t0\t2147483000\t10\t2147483000\t2147483647\t-1\t",
            "5\t1\t1\t1\t1\t1\t2147483000\t10\t2147483000\t2147483647\t50\twide",
        ]);

        let lines: Vec<OcrLine> = TsvLines::new(data).collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].bbox.x2, i32::MAX);
        assert_eq!(lines[0].bbox.y2, i32::MAX);
    }

    #[test]
    fn empty_output_yields_nothing() {
        assert_eq!(TsvLines::new(String::new()).count(), 0);
        assert_eq!(TsvLines::new(tsv(&[])).count(), 0);
    }
}
