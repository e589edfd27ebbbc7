//! Operations on raw texture coordinate arrays.
//!
//! Corner slots are ordered as the quad is drawn: bottom-left, bottom-right,
//! top-left, top-right.

use crate::rotation::TexCoords;

const UNIT_CORNERS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

fn flip(value: f32) -> f32 {
    if value == 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Mirrors every x coordinate, sampling the source right to left.
pub fn flip_horizontally(coords: &TexCoords) -> TexCoords {
    let mut flipped = *coords;
    flipped.iter_mut().step_by(2).for_each(|x| *x = flip(*x));
    flipped
}

/// Mirrors every y coordinate, sampling the source bottom to top.
pub fn flip_vertically(coords: &TexCoords) -> TexCoords {
    let mut flipped = *coords;
    flipped
        .iter_mut()
        .skip(1)
        .step_by(2)
        .for_each(|y| *y = flip(*y));
    flipped
}

fn permute(coords: &TexCoords, order: [usize; 4]) -> TexCoords {
    let pairs: [[f32; 2]; 4] = bytemuck::cast(*coords);
    bytemuck::cast(order.map(|slot| pairs[slot]))
}

/// Moves the sampled corners so the output turns a quarter clockwise.
pub fn rotate_clockwise(coords: &TexCoords) -> TexCoords {
    permute(coords, [2, 0, 3, 1])
}

/// Swaps the top and bottom rows of the output.
pub fn flip_output_vertically(coords: &TexCoords) -> TexCoords {
    permute(coords, [2, 3, 0, 1])
}

pub fn is_corner_permutation(coords: &TexCoords) -> bool {
    let pairs: [[f32; 2]; 4] = bytemuck::cast(*coords);
    UNIT_CORNERS
        .iter()
        .all(|corner| pairs.iter().filter(|pair| *pair == corner).count() == 1)
}
