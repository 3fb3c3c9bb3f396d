use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use crate::error::ValidationError;

/// Opens `path` as an image and bounds its larger side to `max_dimension`.
pub fn validate_image(path: &Path, max_dimension: u32) -> Result<DynamicImage, ValidationError> {
    let shown = path.display().to_string();
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ValidationError::NotFound(shown));
        }
        Err(source) => {
            return Err(ValidationError::Io {
                path: shown,
                source,
            });
        }
    };
    if !metadata.is_file() {
        return Err(ValidationError::NotFound(shown));
    }
    if metadata.len() == 0 {
        return Err(ValidationError::Empty(shown));
    }

    let image = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|source| ValidationError::Io {
            path: shown.clone(),
            source,
        })?
        .decode()
        .map_err(|err| {
            debug!("decode failed for {}: {}", shown, err);
            ValidationError::Unreadable(shown.clone())
        })?;

    let (width, height) = image.dimensions();
    check_dimensions(width, height)?;

    match bounded_dimensions(width, height, max_dimension) {
        Some((new_width, new_height)) => {
            debug!(
                "downsampling {}x{} to {}x{}",
                width, height, new_width, new_height
            );
            // Triangle widens its support by the scale ratio when shrinking,
            // so each output pixel averages the source area it covers.
            Ok(image.resize_exact(new_width, new_height, FilterType::Triangle))
        }
        None => Ok(image),
    }
}

pub fn check_dimensions(width: u32, height: u32) -> Result<(), ValidationError> {
    if width == 0 || height == 0 {
        return Err(ValidationError::ZeroDimension { width, height });
    }
    Ok(())
}

/// Target size when the larger side exceeds `max_dimension`, otherwise `None`.
pub fn bounded_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    let larger = width.max(height);
    if max_dimension == 0 || larger <= max_dimension {
        return None;
    }
    let scale = max_dimension as f64 / larger as f64;
    let shrink = |value: u32| ((value as f64 * scale).round() as u32).clamp(1, max_dimension);
    if width >= height {
        Some((max_dimension, shrink(height)))
    } else {
        Some((shrink(width), max_dimension))
    }
}
