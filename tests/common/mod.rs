#![allow(dead_code)]

use condo_compress::codec::{ImageCodec, NativeCodec};
use condo_compress::compress_jpeg::compress_jpeg;
use condo_compress::{OutputFormat, UploadFile};
use image::{DynamicImage, Rgb, RgbImage};

pub fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    }))
}

/// Deterministic pseudo-random pixels; compresses badly on purpose.
pub fn noise(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x9E37_79B9;
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        };
        Rgb([next(), next(), next()])
    }))
}

pub fn jpeg_file(name: &str, img: &DynamicImage) -> UploadFile {
    let bytes = compress_jpeg(img, 95.0).expect("fixture jpeg");
    UploadFile::new(name, "image/jpeg", bytes)
}

pub fn png_file(name: &str, img: &DynamicImage) -> UploadFile {
    let bytes = NativeCodec::new()
        .encode(img, OutputFormat::Png, 1.0)
        .expect("fixture png");
    UploadFile::new(name, "image/png", bytes)
}

pub fn pdf_file(name: &str) -> UploadFile {
    UploadFile::new(name, "application/pdf", b"%PDF-1.7\n%lease agreement\n".to_vec())
}

pub fn corrupt_png(name: &str) -> UploadFile {
    UploadFile::new(name, "image/png", vec![0x89, 0x50, 0x4E, 0x47, 0, 1, 2, 3, 4, 5])
}
