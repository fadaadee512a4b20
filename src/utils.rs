//! Utility functions for turning session data into things Slint can draw.

use cell_annotator::ImageSequence;
use cell_annotator::images::to_grayscale;
use slint::{Rgb8Pixel, SharedPixelBuffer};

/// Render one channel of a cell as a greyscale image.
pub fn cell_image(images: &ImageSequence, index: usize, channel: usize) -> Option<slint::Image> {
    let plane = images.plane(index, channel)?;
    let (height, width) = images.dimensions();
    let grey = to_grayscale(&plane);

    let mut buffer = SharedPixelBuffer::<Rgb8Pixel>::new(width as u32, height as u32);
    for (pixel, v) in buffer.make_mut_slice().iter_mut().zip(grey) {
        *pixel = Rgb8Pixel { r: v, g: v, b: v };
    }
    Some(slint::Image::from_rgb8(buffer))
}

/// Parse a hex color string (e.g., "#ff0000") to a Slint Color
pub fn parse_color(hex: &str) -> Option<slint::Color> {
    let hex = hex.trim_start_matches('#');
    if hex.len() == 6 {
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(slint::Color::from_rgb_u8(r, g, b))
    } else {
        None
    }
}
