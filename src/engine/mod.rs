pub mod poppler;
pub mod process;
pub mod tesseract;
pub mod types;

use anyhow::Result;
use std::path::Path;

pub use types::{BoundingBox, LineStream, OcrLine};

/// Opens documents. Shared by every worker, so it must be `Sync`; the
/// documents it hands out are not.
pub trait DocumentSource: Sync {
    type Doc: Document;

    fn open(&self, path: &Path) -> Result<Self::Doc>;
}

/// An opened document owned by a single worker.
pub trait Document {
    fn page_count(&self) -> u32;

    /// Rasterizes 1-based `page` at `dpi` into `out`.
    fn render(&self, page: u32, dpi: u32, out: &Path) -> Result<()>;
}

pub trait OcrEngine: Sync {
    /// Recognizes `image` at text-line granularity.
    fn recognize(&self, image: &Path) -> Result<LineStream>;
}
