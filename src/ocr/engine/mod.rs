mod geom;
mod parse;
mod tesseract;

use anyhow::{Context, Result};
use image::DynamicImage;
use std::io::Write;
use tracing::debug;

use crate::ocr::{Recognizer, TextFragment};

pub use tesseract::list_tesseract_languages;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub binary: String,
    pub language: String,
    pub psm: u32,
    /// Forward the engine's own diagnostics to the log.
    pub verbose: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
            psm: 3,
            verbose: false,
        }
    }
}

/// Recognizer backed by the `tesseract` command.
///
/// Construction checks the binary and language once; each `recognize`
/// call stages the image in its own temporary PNG.
#[derive(Debug)]
pub struct TesseractEngine {
    options: EngineOptions,
}

impl TesseractEngine {
    pub fn new(options: EngineOptions) -> Result<Self> {
        let available = list_tesseract_languages(&options.binary)?;
        let language = tesseract::ensure_language(&options.language, &available)?;
        debug!("tesseract ready (language {}, psm {})", language, options.psm);
        Ok(Self {
            options: EngineOptions {
                language,
                ..options
            },
        })
    }
}

impl Recognizer for TesseractEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextFragment>> {
        // removed when `tmp` drops, on every return path
        let mut tmp = tempfile::Builder::new()
            .prefix("receipt-ocr-")
            .suffix(".png")
            .tempfile()
            .with_context(|| "failed to create temp file for OCR")?;
        image
            .write_to(&mut tmp, image::ImageFormat::Png)
            .with_context(|| "failed to write temp image for OCR")?;
        tmp.flush().with_context(|| "failed to flush temp image for OCR")?;

        let tsv = tesseract::run_tesseract_tsv(
            &self.options.binary,
            tmp.path(),
            &self.options.language,
            self.options.psm,
            self.options.verbose,
        )?;
        parse::parse_tsv_fragments(&tsv)
    }
}
