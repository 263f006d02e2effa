//! Colors on the 0-255 scale.
//!
//! Surface colors, path throughput and pixel sums all live on the same
//! 0-255 scale; blending two colors divides the product back down by 255.

use crate::Vec3;

/// Color type alias (RGB values on the 0-255 scale)
pub type Color = Vec3;

/// No light.
pub const BLACK: Color = Vec3::ZERO;

/// Full throughput; every primary path starts here.
pub const WHITE: Color = Vec3::splat(255.0);

/// Multiply two 0-255 colors together: `a * (b / 255)`.
#[inline]
pub fn color_mult(a: Color, b: Color) -> Color {
    a * (b / 255.0)
}

/// Clamp one channel to [0, 255] and convert to a byte.
#[inline]
pub fn clamp_channel(x: f32) -> u8 {
    // NaN maps to 0 through the saturating cast
    x.clamp(0.0, 255.0) as u8
}

/// Convert a 0-255 color to 8-bit RGB.
pub fn to_rgb8(color: Color) -> [u8; 3] {
    [
        clamp_channel(color.x),
        clamp_channel(color.y),
        clamp_channel(color.z),
    ]
}
