use image::DynamicImage;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Original,
    Cw90,
    Flip180,
    Ccw90,
}

impl Rotation {
    /// Evaluation order. Earlier entries win score ties.
    pub const ALL: [Rotation; 4] = [
        Rotation::Original,
        Rotation::Cw90,
        Rotation::Flip180,
        Rotation::Ccw90,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Rotation::Original => "ORIGINAL",
            Rotation::Cw90 => "CW90",
            Rotation::Flip180 => "FLIP180",
            Rotation::Ccw90 => "CCW90",
        }
    }

    /// Returns a rotated copy; `image` is left as is.
    pub fn apply(self, image: &DynamicImage) -> DynamicImage {
        match self {
            Rotation::Original => image.clone(),
            Rotation::Cw90 => image.rotate90(),
            Rotation::Flip180 => image.rotate180(),
            Rotation::Ccw90 => image.rotate270(),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn generate_rotations(image: &DynamicImage) -> Vec<(Rotation, DynamicImage)> {
    Rotation::ALL
        .iter()
        .map(|rotation| (*rotation, rotation.apply(image)))
        .collect()
}
