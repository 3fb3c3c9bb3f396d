use anyhow::Context;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub mod error;
pub mod logging;
pub mod ocr;
pub mod report;
pub mod rotation;
pub mod scoring;
pub mod settings;
pub mod validate;

pub use error::{RunError, ValidationError};
pub use ocr::{EngineOptions, Recognizer, TesseractEngine, TextFragment};
pub use report::OutcomeReport;
pub use rotation::Rotation;
pub use scoring::{ScoringConfig, Selection};
pub use settings::Settings;

#[derive(Debug, Clone)]
pub struct Config {
    pub image_path: PathBuf,
    pub settings_path: Option<String>,
    pub verbose: bool,
}

/// Runs one extraction and folds every failure, panics included, into the report.
pub fn run(config: Config) -> OutcomeReport {
    contain_panics(|| run_inner(&config))
}

/// Runs `pipeline`, turning an `Err` or a panic into a failure report.
pub fn contain_panics<F>(pipeline: F) -> OutcomeReport
where
    F: FnOnce() -> Result<String, RunError>,
{
    match panic::catch_unwind(AssertUnwindSafe(pipeline)) {
        Ok(result) => OutcomeReport::from(result),
        Err(payload) => OutcomeReport::failure(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|value| value.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("Unexpected error: {}", detail)
}

fn run_inner(config: &Config) -> Result<String, RunError> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;

    let image = validate::validate_image(&config.image_path, settings.max_dimension)?;
    let engine = TesseractEngine::new(EngineOptions {
        binary: settings.ocr_binary.clone(),
        language: settings.ocr_language.clone(),
        psm: settings.ocr_psm,
        verbose: config.verbose,
    })
    .map_err(RunError::EngineInit)?;

    select_rotation(&image, &engine, &ScoringConfig::from(&settings))
        .map(|selection| selection.text)
}

/// Validates `path`, then recognizes and scores all four rotations with `recognizer`.
pub fn extract_text(
    path: &Path,
    settings: &Settings,
    recognizer: &dyn Recognizer,
) -> Result<String, RunError> {
    let image = validate::validate_image(path, settings.max_dimension)?;
    select_rotation(&image, recognizer, &ScoringConfig::from(settings))
        .map(|selection| selection.text)
}

/// Recognizes each rotation of `image` and keeps the best scoring text.
///
/// A rotation the recognizer fails on is left out. The call only fails when
/// every rotation did.
pub fn select_rotation(
    image: &image::DynamicImage,
    recognizer: &dyn Recognizer,
    config: &ScoringConfig,
) -> Result<Selection, RunError> {
    let mut recognized = Vec::new();
    let mut last_error = None;
    let mut attempts = 0;

    for (rotation, rotated) in rotation::generate_rotations(image) {
        attempts += 1;
        match recognizer
            .recognize(&rotated)
            .with_context(|| format!("rotation {}", rotation))
        {
            Ok(fragments) => {
                debug!("{}: {} fragment(s)", rotation, fragments.len());
                recognized.push((rotation, fragments));
            }
            Err(err) => {
                warn!("skipping {}: {:#}", rotation, err);
                last_error = Some(err);
            }
        }
    }

    if recognized.is_empty() {
        return Err(RunError::NoCandidates {
            attempts,
            last_error: last_error
                .map(|err| format!("{:#}", err))
                .unwrap_or_else(|| "no rotations were attempted".to_string()),
        });
    }

    let selection = scoring::select_best(recognized, config);
    for candidate in &selection.candidates {
        debug!("{} scored {}", candidate.rotation, candidate.score);
    }
    match selection.rotation {
        Some(rotation) => info!("selected {} (score {})", rotation, selection.score),
        None => info!("no rotation produced text"),
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
    use std::cell::RefCell;
    use tempfile::tempdir;

    const MARKER: image::Rgba<u8> = image::Rgba([255, 0, 0, 255]);

    /// Finds which rotation produced `image` from the marker placed top-left
    /// in the 4x2 fixture.
    fn detect_rotation(image: &DynamicImage) -> Rotation {
        let (w, h) = image.dimensions();
        if image.get_pixel(0, 0) == MARKER {
            Rotation::Original
        } else if image.get_pixel(w - 1, 0) == MARKER {
            Rotation::Cw90
        } else if image.get_pixel(w - 1, h - 1) == MARKER {
            Rotation::Flip180
        } else {
            Rotation::Ccw90
        }
    }

    struct ScriptedRecognizer {
        script: Vec<(Rotation, Result<Vec<&'static str>, &'static str>)>,
        calls: RefCell<Vec<Rotation>>,
    }

    impl ScriptedRecognizer {
        fn new(script: Vec<(Rotation, Result<Vec<&'static str>, &'static str>)>) -> Self {
            Self {
                script,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Recognizer for ScriptedRecognizer {
        fn recognize(&self, image: &DynamicImage) -> anyhow::Result<Vec<TextFragment>> {
            let rotation = detect_rotation(image);
            self.calls.borrow_mut().push(rotation);
            let entry = self
                .script
                .iter()
                .find(|(label, _)| *label == rotation)
                .map(|(_, result)| result.clone())
                .unwrap_or(Ok(Vec::new()));
            match entry {
                Ok(texts) => Ok(texts.into_iter().map(TextFragment::new).collect()),
                Err(message) => Err(anyhow!(message)),
            }
        }
    }

    fn fixture() -> DynamicImage {
        let mut img = RgbImage::from_pixel(4, 2, Rgb([255, 255, 255]));
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn upright_receipt_is_selected() {
        let recognizer = ScriptedRecognizer::new(vec![
            (Rotation::Original, Ok(vec!["TOTAL 9.99", "TAX 0.80"])),
            (Rotation::Cw90, Ok(vec!["l1l1 ;;:: oo0O"])),
            (Rotation::Flip180, Ok(vec!["08.0 XAT 99.9 LATOT"])),
            (Rotation::Ccw90, Ok(vec!["~~ '' ,, ..  ``"])),
        ]);
        let selection =
            select_rotation(&fixture(), &recognizer, &ScoringConfig::default()).expect("select");
        assert_eq!(selection.rotation, Some(Rotation::Original));
        assert_eq!(selection.text, "TOTAL 9.99 TAX 0.80");
        assert_eq!(*recognizer.calls.borrow(), Rotation::ALL.to_vec());
    }

    #[test]
    fn sideways_receipt_is_selected() {
        let recognizer = ScriptedRecognizer::new(vec![
            (Rotation::Original, Ok(vec!["a much longer run of garbled noise text"])),
            (Rotation::Ccw90, Ok(vec!["Receipt", "Paid by card"])),
        ]);
        let selection =
            select_rotation(&fixture(), &recognizer, &ScoringConfig::default()).expect("select");
        assert_eq!(selection.rotation, Some(Rotation::Ccw90));
        assert_eq!(selection.text, "Receipt Paid by card");
    }

    #[test]
    fn failed_rotations_are_dropped() {
        let recognizer = ScriptedRecognizer::new(vec![
            (Rotation::Original, Err("engine crashed")),
            (Rotation::Cw90, Ok(vec!["cash"])),
            (Rotation::Flip180, Err("engine crashed")),
            (Rotation::Ccw90, Ok(vec!["ok"])),
        ]);
        let selection =
            select_rotation(&fixture(), &recognizer, &ScoringConfig::default()).expect("select");
        assert_eq!(selection.text, "cash");
        let scored = selection
            .candidates
            .iter()
            .map(|candidate| candidate.rotation)
            .collect::<Vec<_>>();
        assert_eq!(scored, vec![Rotation::Cw90, Rotation::Ccw90]);
    }

    #[test]
    fn all_rotations_failing_is_an_error() {
        let recognizer = ScriptedRecognizer::new(
            Rotation::ALL
                .iter()
                .map(|rotation| (*rotation, Err("no text model")))
                .collect(),
        );
        let err = select_rotation(&fixture(), &recognizer, &ScoringConfig::default()).unwrap_err();
        match &err {
            RunError::NoCandidates { attempts, last_error } => {
                assert_eq!(*attempts, 4);
                assert!(last_error.contains("no text model"));
                assert!(last_error.contains("CCW90"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let report = OutcomeReport::from(Err::<String, _>(err));
        assert!(!report.success);
        assert!(report.error.unwrap_or_default().contains("all 4 rotations"));
    }

    #[test]
    fn blank_image_is_an_empty_success() {
        let recognizer = ScriptedRecognizer::new(Vec::new());
        let selection =
            select_rotation(&fixture(), &recognizer, &ScoringConfig::default()).expect("select");
        assert_eq!(selection.text, "");
        assert_eq!(selection.rotation, None);
    }

    #[test]
    fn extract_text_validates_before_recognizing() {
        let dir = tempdir().expect("tempdir");
        let recognizer = ScriptedRecognizer::new(Vec::new());
        let err = extract_text(
            &dir.path().join("missing.jpg"),
            &Settings::default(),
            &recognizer,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RunError::Validation(ValidationError::NotFound(_))
        ));
        assert!(err.to_string().starts_with("File not found: "));
        assert!(recognizer.calls.borrow().is_empty());
    }

    #[test]
    fn extract_text_reads_image_from_disk() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("receipt.png");
        fixture().save(&path).expect("save image");

        let recognizer = ScriptedRecognizer::new(vec![(
            Rotation::Flip180,
            Ok(vec!["STORE 42", "Subtotal 3.00"]),
        )]);
        let text = extract_text(&path, &Settings::default(), &recognizer).expect("extract");
        assert_eq!(text, "STORE 42 Subtotal 3.00");
    }

    struct ExplodingRecognizer;

    impl Recognizer for ExplodingRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> anyhow::Result<Vec<TextFragment>> {
            panic!("engine state corrupted");
        }
    }

    #[test]
    fn recognizer_panic_becomes_failure_report() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("receipt.png");
        fixture().save(&path).expect("save image");

        let report =
            contain_panics(|| extract_text(&path, &Settings::default(), &ExplodingRecognizer));
        assert_eq!(
            report,
            OutcomeReport::failure("Unexpected error: engine state corrupted")
        );
    }

    #[test]
    fn formatted_panic_message_is_kept() {
        let report = contain_panics(|| panic!("bad buffer {}x{}", 0, 7));
        assert_eq!(report, OutcomeReport::failure("Unexpected error: bad buffer 0x7"));
    }

    #[test]
    fn contained_result_passes_through() {
        assert_eq!(
            contain_panics(|| Ok("TOTAL 1.00".to_string())),
            OutcomeReport::success("TOTAL 1.00")
        );
    }

    #[test]
    fn run_reports_missing_file() {
        let report = run(Config {
            image_path: PathBuf::from("does-not-exist/receipt.png"),
            settings_path: None,
            verbose: false,
        });
        assert_eq!(
            report,
            OutcomeReport::failure("File not found: does-not-exist/receipt.png")
        );
    }

    #[test]
    fn run_reports_bad_settings_file() {
        let dir = tempdir().expect("tempdir");
        let settings = dir.path().join("settings.toml");
        std::fs::write(&settings, "[image\nmax_dimension = ").expect("write settings");
        let report = run(Config {
            image_path: PathBuf::from("receipt.png"),
            settings_path: Some(settings.to_string_lossy().to_string()),
            verbose: false,
        });
        assert!(!report.success);
        assert!(report.error.unwrap_or_default().contains("failed to parse settings"));
    }
}
