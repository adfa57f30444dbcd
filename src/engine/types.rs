use serde::{Deserialize, Serialize};

/// Pixel-space box of a recognized line, top-left to bottom-right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(rename = "xStart")]
    pub x1: i32,
    #[serde(rename = "xEnd")]
    pub x2: i32,
    #[serde(rename = "yStart")]
    pub y1: i32,
    #[serde(rename = "yEnd")]
    pub y2: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    pub text: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Lazy, single-pass sequence of recognized lines.
pub type LineStream = Box<dyn Iterator<Item = OcrLine> + Send>;
