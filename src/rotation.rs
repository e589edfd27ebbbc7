pub mod corners;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

/// Four texture coordinate pairs, one per quad corner.
pub type TexCoords = [f32; 8];

pub const TEX_COORDS_NONE: TexCoords = [
    0.0, 0.0, // bottom left
    1.0, 0.0, // bottom right
    0.0, 1.0, // top left
    1.0, 1.0, // top right
];

pub const TEX_COORDS_90: TexCoords = [
    0.0, 1.0, // top left
    0.0, 0.0, // bottom left
    1.0, 1.0, // top right
    1.0, 0.0, // bottom right
];

pub const TEX_COORDS_180: TexCoords = [
    1.0, 1.0, // top right
    0.0, 1.0, // top left
    1.0, 0.0, // bottom right
    0.0, 0.0, // bottom left
];

pub const TEX_COORDS_270: TexCoords = [
    1.0, 0.0, // bottom right
    1.0, 1.0, // top right
    0.0, 0.0, // bottom left
    0.0, 1.0, // top left
];

pub const TEX_COORDS_FLIP: TexCoords = [
    0.0, 1.0, // top left
    1.0, 1.0, // top right
    0.0, 0.0, // bottom left
    1.0, 0.0, // bottom right
];

pub const TEX_COORDS_FLIP_90: TexCoords = [
    1.0, 1.0, // top right
    1.0, 0.0, // bottom right
    0.0, 1.0, // top left
    0.0, 0.0, // bottom left
];

pub const TEX_COORDS_FLIP_180: TexCoords = [
    1.0, 0.0, // bottom right
    0.0, 0.0, // bottom left
    1.0, 1.0, // top right
    0.0, 1.0, // top left
];

pub const TEX_COORDS_FLIP_270: TexCoords = [
    0.0, 0.0, // bottom left
    0.0, 1.0, // top left
    1.0, 0.0, // bottom right
    1.0, 1.0, // top right
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RotationError {
    #[error("{0} is not a valid rotation code")]
    InvalidCode(i32),
}

/// How a source image is turned before it is sampled into the output.
///
/// Rotations are clockwise. The `Flip*` variants flip the rotated result
/// vertically (upside down).
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    Display,
    IntoStaticStr,
    EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Rotation {
    #[default]
    None,
    Rotate90,
    Rotate180,
    Rotate270,
    Flip,
    FlipRotate90,
    FlipRotate180,
    FlipRotate270,
}

impl Rotation {
    pub const ALL: [Rotation; 8] = [
        Rotation::None,
        Rotation::Rotate90,
        Rotation::Rotate180,
        Rotation::Rotate270,
        Rotation::Flip,
        Rotation::FlipRotate90,
        Rotation::FlipRotate180,
        Rotation::FlipRotate270,
    ];

    pub fn tex_coords(self) -> &'static TexCoords {
        match self {
            Rotation::None => &TEX_COORDS_NONE,
            Rotation::Rotate90 => &TEX_COORDS_90,
            Rotation::Rotate180 => &TEX_COORDS_180,
            Rotation::Rotate270 => &TEX_COORDS_270,
            Rotation::Flip => &TEX_COORDS_FLIP,
            Rotation::FlipRotate90 => &TEX_COORDS_FLIP_90,
            Rotation::FlipRotate180 => &TEX_COORDS_FLIP_180,
            Rotation::FlipRotate270 => &TEX_COORDS_FLIP_270,
        }
    }

    pub fn corners(self) -> [[f32; 2]; 4] {
        bytemuck::cast(*self.tex_coords())
    }

    /// Integer code used by callers that store rotations as plain numbers.
    /// Flipped variants are negative, with `-1` standing in for a flip without rotation.
    pub fn code(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
            Rotation::Flip => -1,
            Rotation::FlipRotate90 => -90,
            Rotation::FlipRotate180 => -180,
            Rotation::FlipRotate270 => -270,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None | Rotation::Flip => 0,
            Rotation::Rotate90 | Rotation::FlipRotate90 => 90,
            Rotation::Rotate180 | Rotation::FlipRotate180 => 180,
            Rotation::Rotate270 | Rotation::FlipRotate270 => 270,
        }
    }

    pub fn is_flipped(self) -> bool {
        matches!(
            self,
            Rotation::Flip
                | Rotation::FlipRotate90
                | Rotation::FlipRotate180
                | Rotation::FlipRotate270
        )
    }

    pub fn swaps_dimensions(self) -> bool {
        self.degrees() % 180 != 0
    }

    pub fn oriented_size(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Turns the output a further quarter turn clockwise.
    pub fn rotate_clockwise(self) -> Self {
        match self {
            Rotation::None => Rotation::Rotate90,
            Rotation::Rotate90 => Rotation::Rotate180,
            Rotation::Rotate180 => Rotation::Rotate270,
            Rotation::Rotate270 => Rotation::None,
            // turning an upside down image clockwise is the same as flipping
            // it after a counter clockwise turn
            Rotation::Flip => Rotation::FlipRotate270,
            Rotation::FlipRotate90 => Rotation::Flip,
            Rotation::FlipRotate180 => Rotation::FlipRotate90,
            Rotation::FlipRotate270 => Rotation::FlipRotate180,
        }
    }

    pub fn rotate_counter_clockwise(self) -> Self {
        self.rotate_clockwise().rotate_clockwise().rotate_clockwise()
    }

    /// Flips the output upside down.
    pub fn flip_vertically(self) -> Self {
        match self {
            Rotation::None => Rotation::Flip,
            Rotation::Rotate90 => Rotation::FlipRotate90,
            Rotation::Rotate180 => Rotation::FlipRotate180,
            Rotation::Rotate270 => Rotation::FlipRotate270,
            Rotation::Flip => Rotation::None,
            Rotation::FlipRotate90 => Rotation::Rotate90,
            Rotation::FlipRotate180 => Rotation::Rotate180,
            Rotation::FlipRotate270 => Rotation::Rotate270,
        }
    }

    /// Mirrors the output left to right.
    pub fn mirror_horizontally(self) -> Self {
        self.rotate_clockwise().rotate_clockwise().flip_vertically()
    }
}

impl TryFrom<i32> for Rotation {
    type Error = RotationError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Rotate90),
            180 => Ok(Rotation::Rotate180),
            270 => Ok(Rotation::Rotate270),
            -1 => Ok(Rotation::Flip),
            -90 => Ok(Rotation::FlipRotate90),
            -180 => Ok(Rotation::FlipRotate180),
            -270 => Ok(Rotation::FlipRotate270),
            _ => Err(RotationError::InvalidCode(code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{imageops, Rgba, RgbaImage};
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn every_rotation_has_eight_unit_values() {
        for rotation in Rotation::iter() {
            let coords = rotation.tex_coords();
            assert_eq!(coords.len(), 8);
            assert!(
                coords.iter().all(|v| *v == 0.0 || *v == 1.0),
                "{rotation} has a value outside the unit square corners"
            );
        }
    }

    #[test]
    fn every_rotation_uses_each_corner_once() {
        for rotation in Rotation::iter() {
            assert!(
                corners::is_corner_permutation(rotation.tex_coords()),
                "{rotation} does not visit every corner exactly once"
            );
        }
    }

    #[test]
    fn tables_match_literal_values() {
        assert_eq!(
            Rotation::None.tex_coords(),
            &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0]
        );
        assert_eq!(
            Rotation::Rotate90.tex_coords(),
            &[0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0]
        );
        assert_eq!(
            Rotation::Rotate180.tex_coords(),
            &[1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(
            Rotation::Rotate270.tex_coords(),
            &[1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(
            Rotation::Flip.tex_coords(),
            &[0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]
        );
        assert_eq!(
            Rotation::FlipRotate90.tex_coords(),
            &[1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
        );
        assert_eq!(
            Rotation::FlipRotate180.tex_coords(),
            &[1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0]
        );
        assert_eq!(
            Rotation::FlipRotate270.tex_coords(),
            &[0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0]
        );
    }

    #[test]
    fn corners_pair_up_tex_coords() {
        assert_eq!(
            Rotation::Rotate90.corners(),
            [[0.0, 1.0], [0.0, 0.0], [1.0, 1.0], [1.0, 0.0]]
        );
    }

    #[test]
    fn all_lists_every_variant_once() {
        let iterated: Vec<Rotation> = Rotation::iter().collect();
        assert_eq!(iterated, Rotation::ALL.to_vec());
    }

    #[test]
    fn codes_round_trip() {
        for rotation in Rotation::iter() {
            assert_eq!(Rotation::try_from(rotation.code()), Ok(rotation));
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert_eq!(Rotation::try_from(45), Err(RotationError::InvalidCode(45)));
        assert_eq!(Rotation::try_from(360), Err(RotationError::InvalidCode(360)));
        assert_eq!(Rotation::try_from(-2), Err(RotationError::InvalidCode(-2)));
    }

    #[test]
    fn parses_kebab_case_names() {
        assert_eq!(Rotation::from_str("none"), Ok(Rotation::None));
        assert_eq!(Rotation::from_str("rotate90"), Ok(Rotation::Rotate90));
        assert_eq!(
            Rotation::from_str("flip-rotate270"),
            Ok(Rotation::FlipRotate270)
        );
        assert!(Rotation::from_str("sideways").is_err());
        assert_eq!(Rotation::FlipRotate180.to_string(), "flip-rotate180");
    }

    #[test]
    fn quarter_turns_swap_dimensions() {
        assert_eq!(Rotation::None.oriented_size(100, 200), (100, 200));
        assert_eq!(Rotation::Rotate90.oriented_size(100, 200), (200, 100));
        assert_eq!(Rotation::Rotate180.oriented_size(100, 200), (100, 200));
        assert_eq!(Rotation::Rotate270.oriented_size(100, 200), (200, 100));
        assert_eq!(Rotation::Flip.oriented_size(100, 200), (100, 200));
        assert_eq!(Rotation::FlipRotate90.oriented_size(100, 200), (200, 100));
        assert_eq!(Rotation::FlipRotate180.oriented_size(100, 200), (100, 200));
        assert_eq!(Rotation::FlipRotate270.oriented_size(100, 200), (200, 100));
    }

    #[test]
    fn flipped_tables_are_upside_down_rotations() {
        for rotation in Rotation::iter().filter(|r| !r.is_flipped()) {
            assert_eq!(
                &corners::flip_output_vertically(rotation.tex_coords()),
                rotation.flip_vertically().tex_coords(),
                "{rotation}"
            );
        }
    }

    #[test]
    fn flipped_tables_mirror_the_source_axis() {
        // upside down output means mirroring whichever source axis ends up vertical
        for rotation in Rotation::iter().filter(|r| !r.is_flipped()) {
            let mirrored = if rotation.swaps_dimensions() {
                corners::flip_horizontally(rotation.tex_coords())
            } else {
                corners::flip_vertically(rotation.tex_coords())
            };
            assert_eq!(&mirrored, rotation.flip_vertically().tex_coords());
        }
    }

    #[test]
    fn rotating_clockwise_matches_corner_permutation() {
        for rotation in Rotation::iter() {
            assert_eq!(
                &corners::rotate_clockwise(rotation.tex_coords()),
                rotation.rotate_clockwise().tex_coords(),
                "{rotation}"
            );
        }
    }

    #[test]
    fn four_quarter_turns_are_identity() {
        for rotation in Rotation::iter() {
            let turned = (0..4).fold(rotation, |r, _| r.rotate_clockwise());
            assert_eq!(turned, rotation);
            assert_eq!(
                rotation.rotate_clockwise().rotate_counter_clockwise(),
                rotation
            );
        }
    }

    #[test]
    fn mirroring_twice_is_identity() {
        for rotation in Rotation::iter() {
            assert_eq!(rotation.mirror_horizontally().mirror_horizontally(), rotation);
            assert_ne!(rotation.mirror_horizontally(), rotation);
        }
        assert_eq!(Rotation::None.mirror_horizontally(), Rotation::FlipRotate180);
    }

    /// Draws `source` the way the renderer does, with the quad corners in strip
    /// order and nearest sampling.
    fn sample_quad(source: &RgbaImage, rotation: Rotation) -> RgbaImage {
        let (width, height) = rotation.oriented_size(source.width(), source.height());
        let [c0, c1, c2, c3] = rotation.corners();

        RgbaImage::from_fn(width, height, |px, py| {
            // the vertex shader mirrors y, so the first strip vertex lands on
            // the top left of the target
            let fx = (px as f32 + 0.5) / width as f32;
            let fy = (py as f32 + 0.5) / height as f32;
            let weights = [
                (1.0 - fx) * (1.0 - fy),
                fx * (1.0 - fy),
                (1.0 - fx) * fy,
                fx * fy,
            ];
            let [u, v] = [0, 1].map(|axis| {
                weights[0] * c0[axis]
                    + weights[1] * c1[axis]
                    + weights[2] * c2[axis]
                    + weights[3] * c3[axis]
            });

            let x = ((u * source.width() as f32) as u32).min(source.width() - 1);
            let y = ((v * source.height() as f32) as u32).min(source.height() - 1);
            *source.get_pixel(x, y)
        })
    }

    #[test]
    fn sampled_quad_matches_image_operations() {
        let source = RgbaImage::from_fn(2, 3, |x, y| {
            Rgba([x as u8 * 200, y as u8 * 100, 50, 255])
        });

        for rotation in Rotation::iter() {
            let rotated = match rotation.degrees() {
                90 => imageops::rotate90(&source),
                180 => imageops::rotate180(&source),
                270 => imageops::rotate270(&source),
                _ => source.clone(),
            };
            let expected = if rotation.is_flipped() {
                imageops::flip_vertical(&rotated)
            } else {
                rotated
            };

            let sampled = sample_quad(&source, rotation);
            assert_eq!(sampled.dimensions(), expected.dimensions(), "{rotation}");
            assert_eq!(sampled.as_raw(), expected.as_raw(), "{rotation}");
        }
    }
}
