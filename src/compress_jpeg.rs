use image::DynamicImage;
use mozjpeg::{ColorSpace, Compress};

/// Encode an image as JPEG using MozJPEG.
///
/// # Arguments
/// * `img` - DynamicImage (already resized)
/// * `quality` - JPEG quality (0.0 - 100.0)
///
/// # Returns
/// Compressed JPEG bytes as Vec<u8>
pub fn compress_jpeg(img: &DynamicImage, quality: f32) -> std::io::Result<Vec<u8>> {
    // MozJPEG expects a raw RGB buffer; alpha is dropped
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut comp = Compress::new(ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_quality(quality);
    comp.set_optimize_coding(true);
    comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2)); // 4:2:0
    comp.set_progressive_mode();

    let mut started = comp.start_compress(Vec::new())?;
    started.write_scanlines(rgb.as_raw())?;
    started.finish()
}
