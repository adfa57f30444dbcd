use pagescan::config::{Config, RasterFormat};

#[test]
fn parse_example_config() {
    let raw = include_str!("../pagescan.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert!(cfg.scan.workers >= 1);
    assert!(!cfg.paths.work_dir.is_empty());
    assert_eq!(cfg.render.format, RasterFormat::Jpeg);
    assert!(!cfg.matching.all_occurrences);
}

#[test]
fn missing_sections_use_defaults() {
    let cfg: Config = toml::from_str("[render]\npdfinfo_exe = \"pdfinfo\"\npdftoppm_exe = \"pdftoppm\"\nformat = \"png\"\n")
        .expect("parse TOML");
    assert_eq!(cfg.render.format, RasterFormat::Png);
    assert_eq!(cfg.scan.workers, 1);
    assert_eq!(cfg.ocr.tesseract_exe, "tesseract");
    assert!(cfg.matching.skip_blank_terms);
    assert!(cfg.output.manifest_path.is_empty());
}
