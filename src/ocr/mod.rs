mod engine;

use anyhow::Result;
use image::DynamicImage;

pub use engine::{list_tesseract_languages, EngineOptions, TesseractEngine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BBoxPx {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// One region of text found by the engine in a single image.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    /// Mean word confidence in `0.0..=1.0`.
    pub conf: f32,
    pub bbox: BBoxPx,
}

impl TextFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            conf: 1.0,
            bbox: BBoxPx {
                x: 0,
                y: 0,
                w: 0,
                h: 0,
            },
        }
    }
}

/// Maps an image to text fragments in detection order.
///
/// An error only concerns the image passed in; callers may keep using the
/// recognizer for other images.
pub trait Recognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextFragment>>;
}
