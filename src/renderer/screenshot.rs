use image::{ImageBuffer, Rgba, RgbaImage};
use std::path::Path;

/// Read-only view of the composited display surface.
///
/// Rows run bottom to top, matching simulation coordinates.
#[derive(Debug, Clone, Copy)]
pub struct ColorBuffer<'a> {
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [[f32; 4]],
}

impl<'a> ColorBuffer<'a> {
    /// Pixel at simulation coordinates (origin bottom-left)
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Convert to an 8-bit image with the first row at the top
pub fn buffer_to_image(buffer: &ColorBuffer<'_>) -> RgbaImage {
    let mut img_buffer = ImageBuffer::new(buffer.width, buffer.height);

    for (x, y, pixel) in img_buffer.enumerate_pixels_mut() {
        let c = buffer.pixel(x, buffer.height - 1 - y);
        *pixel = Rgba([to_byte(c[0]), to_byte(c[1]), to_byte(c[2]), to_byte(c[3])]);
    }

    img_buffer
}

/// Save the display surface as a PNG file
pub fn save_png(buffer: &ColorBuffer<'_>, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
    let path = path.as_ref();
    buffer_to_image(buffer).save_with_format(path, image::ImageFormat::Png)?;
    log::info!("[Screenshot] Saved {}x{} frame to {}", buffer.width, buffer.height, path.display());
    Ok(())
}
