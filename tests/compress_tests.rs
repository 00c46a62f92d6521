mod common;

use common::*;
use condo_compress::codec::{ImageCodec, NativeCodec, Raster};
use condo_compress::compressor::FALLBACK_QUALITY;
use condo_compress::{CompressOptions, ImageCompressor, OutputFormat};

#[test]
fn test_large_photo_meets_default_budget() {
    let file = jpeg_file("IMG_4000x3000.jpg", &gradient(4000, 3000));
    let compressor = ImageCompressor::native();

    let result = compressor.compress(&file, &CompressOptions::default()).unwrap();

    assert!(result.width <= 1920 && result.height <= 1080);
    assert_eq!((result.width, result.height), (1440, 1080));
    assert!(result.compressed_size_bytes <= 102_400);
    assert!(result.compression_ratio > 1.0);
    assert_eq!(result.file.name, "IMG_4000x3000.webp");
    assert_eq!(result.file.media_type, "image/webp");
    assert_eq!(result.compressed_size_bytes, result.file.bytes.len() as u64);
    assert_eq!(result.original_size_bytes, file.bytes.len() as u64);

    let decoded = NativeCodec::new().decode(&result.file.bytes).unwrap();
    assert_eq!(Raster::dimensions(&decoded), (1440, 1080));
}

#[test]
fn test_small_png_single_encode() {
    let file = png_file("thumb.png", &gradient(50, 50));
    let result = ImageCompressor::native()
        .compress(&file, &CompressOptions::default())
        .unwrap();

    assert_eq!((result.width, result.height), (50, 50));
    assert_eq!(result.encode_attempts, 1);
    assert_eq!(result.quality, Some(0.8));
    assert!(!result.downscaled);
    assert!(result.compression_ratio >= 0.0);
    assert_eq!(result.compressed_size_bytes, result.file.bytes.len() as u64);
    assert_eq!(result.file.name, "thumb.webp");
}

#[test]
fn test_dimension_cap_preserves_aspect_ratio() {
    let file = jpeg_file("panorama.jpg", &gradient(2500, 900));
    let result = ImageCompressor::native()
        .compress(&file, &CompressOptions::default())
        .unwrap();

    assert!(result.width <= 1920 && result.height <= 1080);
    let input_aspect = 2500.0 / 900.0;
    let output_aspect = result.width as f64 / result.height as f64;
    assert!(((output_aspect - input_aspect) / input_aspect).abs() < 0.01);
}

#[test]
fn test_unreachable_budget_falls_back_once() {
    let file = jpeg_file("static.jpg", &noise(1000, 1000));
    let options = CompressOptions::default().with_max_size_kb(5);

    let result = ImageCompressor::native().compress(&file, &options).unwrap();

    assert!(result.downscaled);
    // eight scan attempts (0.8 down to 0.1) plus the fallback
    assert_eq!(result.encode_attempts, 9);
    assert_eq!(result.quality, Some(FALLBACK_QUALITY));
    assert!(result.width < 1000 && result.height < 1000);
    assert_eq!(result.width, result.height);
}

#[test]
fn test_jpeg_output_is_renamed() {
    let file = png_file("floorplan.final.png", &gradient(120, 80));
    let options = CompressOptions::default().with_output_format(OutputFormat::Jpeg);
    let result = ImageCompressor::native().compress(&file, &options).unwrap();

    assert_eq!(result.file.name, "floorplan.final.jpg");
    assert!(result.file.bytes.starts_with(&[0xFF, 0xD8, 0xFF]));
}

#[test]
fn test_non_image_pass_through_is_idempotent() {
    let file = pdf_file("lease.pdf");
    let compressor = ImageCompressor::native();
    let options = CompressOptions::default();

    let first = compressor.compress(&file, &options).unwrap();
    let second = compressor.compress(&file, &options).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.file.bytes, file.bytes);
    assert_eq!(first.compressed_size_bytes, first.original_size_bytes);
    assert_eq!(first.compression_ratio, 1.0);
    assert_eq!((first.width, first.height), (0, 0));
}

#[test]
fn test_corrupt_image_reports_decode_error() {
    let err = ImageCompressor::native()
        .compress(&corrupt_png("broken.png"), &CompressOptions::default())
        .unwrap_err();
    assert!(err.is_decode());
}
