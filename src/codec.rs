use crate::compress_jpeg::compress_jpeg;
use crate::error::CompressError;
use crate::settings::OutputFormat;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::io::Reader as ImageReader;
use image::{DynamicImage, GenericImageView};
use log::debug;
use std::io::Cursor;
use webp::Encoder as WebpEncoder;

/// A decoded bitmap ready to be resized or encoded.
pub trait Raster {
    fn dimensions(&self) -> (u32, u32);
}

impl Raster for DynamicImage {
    fn dimensions(&self) -> (u32, u32) {
        GenericImageView::dimensions(self)
    }
}

/// Decode, resample and encode primitives the compressor is written against.
///
/// `quality` passed to [`ImageCodec::encode`] is in `[0, 1]`; lossless
/// formats may ignore it.
pub trait ImageCodec: Send + Sync {
    type Surface: Raster;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Surface, CompressError>;

    fn resize(&self, surface: &Self::Surface, width: u32, height: u32) -> Self::Surface;

    fn encode(
        &self,
        surface: &Self::Surface,
        format: OutputFormat,
        quality: f32,
    ) -> Result<Vec<u8>, CompressError>;
}

/// Codec backed by `image` for decoding and PNG, `webp` (libwebp) for WebP
/// and MozJPEG for JPEG.
#[derive(Debug, Clone, Copy)]
pub struct NativeCodec {
    filter: FilterType,
}

impl Default for NativeCodec {
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl NativeCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }
}

fn encoder_quality(quality: f32) -> f32 {
    (quality * 100.0).clamp(0.0, 100.0)
}

impl ImageCodec for NativeCodec {
    type Surface = DynamicImage;

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CompressError> {
        let img = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(CompressError::decode)?
            .decode()
            .map_err(CompressError::decode)?;
        debug!("Decoded image: {:?}", GenericImageView::dimensions(&img));
        Ok(img)
    }

    fn resize(&self, surface: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        debug!(
            "Resizing image {:?} -> {}x{}",
            GenericImageView::dimensions(surface),
            width,
            height
        );
        surface.resize_exact(width, height, self.filter)
    }

    fn encode(
        &self,
        surface: &DynamicImage,
        format: OutputFormat,
        quality: f32,
    ) -> Result<Vec<u8>, CompressError> {
        match format {
            OutputFormat::WebP => {
                let rgba = surface.to_rgba8();
                let encoder = WebpEncoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
                let webp_data = encoder.encode(encoder_quality(quality));
                Ok(webp_data.to_vec())
            }
            OutputFormat::Jpeg => {
                compress_jpeg(surface, encoder_quality(quality)).map_err(CompressError::encode)
            }
            OutputFormat::Png => {
                // Lossless: quality has no effect on the output
                let mut output = Cursor::new(Vec::new());
                surface
                    .write_with_encoder(PngEncoder::new_with_quality(
                        &mut output,
                        CompressionType::Best,
                        PngFilterType::Adaptive,
                    ))
                    .map_err(CompressError::encode)?;
                Ok(output.into_inner())
            }
        }
    }
}
