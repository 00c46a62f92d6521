use crate::codec::{ImageCodec, NativeCodec, Raster};
use crate::error::CompressError;
use crate::file::{replace_extension, UploadFile};
use crate::settings::{CompressOptions, OutputFormat};
use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Upper bound on encodes in the quality scan.
pub const MAX_QUALITY_ATTEMPTS: u32 = 10;
pub const QUALITY_STEP: f32 = 0.1;
/// Inclusive: an attempt at this quality ends the scan.
pub const QUALITY_FLOOR: f32 = 0.1;
/// Quality of the single re-encode after the fallback downscale.
pub const FALLBACK_QUALITY: f32 = 0.7;
/// Applied on top of the size-ratio scale to absorb encoder overshoot.
pub const FALLBACK_SAFETY_MARGIN: f64 = 0.9;

const QUALITY_EPSILON: f32 = 1e-6;

/// Outcome of compressing one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionResult {
    pub original_name: String,
    pub file: UploadFile,
    pub original_size_bytes: u64,
    pub compressed_size_bytes: u64,
    /// `original / compressed`; greater than 1 means the output shrank.
    pub compression_ratio: f64,
    pub width: u32,
    pub height: u32,
    /// Quality of the accepted encode, `None` when nothing was encoded.
    pub quality: Option<f32>,
    pub encode_attempts: u32,
    pub downscaled: bool,
}

impl CompressionResult {
    fn pass_through(file: &UploadFile) -> Self {
        Self {
            original_name: file.name.clone(),
            file: file.clone(),
            original_size_bytes: file.size(),
            compressed_size_bytes: file.size(),
            compression_ratio: 1.0,
            width: 0,
            height: 0,
            quality: None,
            encode_attempts: 0,
            downscaled: false,
        }
    }

    pub fn is_pass_through(&self) -> bool {
        self.encode_attempts == 0
    }
}

/// Dimensions that fit `width x height` inside the bounds, keeping the aspect ratio.
///
/// Images already inside the bounds are returned unchanged (never upscaled).
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let ratio = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    (
        scale_dimension(width, ratio).min(max_width),
        scale_dimension(height, ratio).min(max_height),
    )
}

/// Dimensions for the last-resort downscale once the quality scan missed the budget.
pub fn fallback_dimensions(width: u32, height: u32, max_bytes: u64, encoded_bytes: u64) -> (u32, u32) {
    let scale = (max_bytes as f64 / encoded_bytes as f64).sqrt() * FALLBACK_SAFETY_MARGIN;
    (scale_dimension(width, scale), scale_dimension(height, scale))
}

fn scale_dimension(value: u32, ratio: f64) -> u32 {
    ((value as f64 * ratio).round() as u32).max(1)
}

/// Quality used by attempt `attempt` (0-based) of the scan.
pub fn quality_for_attempt(initial: f32, attempt: u32) -> f32 {
    initial - QUALITY_STEP * attempt as f32
}

fn at_quality_floor(quality: f32) -> bool {
    quality <= QUALITY_FLOOR + QUALITY_EPSILON
}

/// Shrinks images to a byte budget by lowering quality, then resolution.
pub struct ImageCompressor<C = NativeCodec> {
    codec: Arc<C>,
}

impl<C> Clone for ImageCompressor<C> {
    fn clone(&self) -> Self {
        Self {
            codec: Arc::clone(&self.codec),
        }
    }
}

impl ImageCompressor<NativeCodec> {
    /// Compressor over the bundled `image`/libwebp/MozJPEG codec.
    pub fn native() -> Self {
        Self::new(NativeCodec::default())
    }
}

impl Default for ImageCompressor<NativeCodec> {
    fn default() -> Self {
        Self::native()
    }
}

impl<C: ImageCodec> ImageCompressor<C> {
    pub fn new(codec: C) -> Self {
        Self {
            codec: Arc::new(codec),
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Compress `file` towards `options.max_size_bytes`.
    ///
    /// Exceeding the budget is not an error: the best effort is returned.
    /// Files whose media type is not `image/*` are passed through untouched,
    /// before `options` are validated.
    pub fn compress(
        &self,
        file: &UploadFile,
        options: &CompressOptions,
    ) -> Result<CompressionResult, CompressError> {
        if !file.is_image() {
            debug!(
                "Passing through non-image file: {} ({})",
                file.name, file.media_type
            );
            return Ok(CompressionResult::pass_through(file));
        }

        options.validate()?;

        let start_time = Instant::now();
        let max_bytes = options.max_size_bytes;
        let format = options.output_format;

        let mut surface = self.codec.decode(&file.bytes)?;
        let (orig_width, orig_height) = surface.dimensions();
        let (width, height) =
            fit_within(orig_width, orig_height, options.max_width, options.max_height);
        if (width, height) != (orig_width, orig_height) {
            surface = self.codec.resize(&surface, width, height);
        }

        let mut attempts = 0;
        let (mut encoded, mut quality) = loop {
            let quality = quality_for_attempt(options.quality, attempts);
            let bytes = self.encode(&surface, format, quality)?;
            attempts += 1;
            debug!(
                "[{}] attempt {}: {}x{} @ {:.2} -> {} bytes",
                file.name,
                attempts,
                width,
                height,
                quality,
                bytes.len()
            );
            if bytes.len() as u64 <= max_bytes
                || at_quality_floor(quality)
                || attempts >= MAX_QUALITY_ATTEMPTS
            {
                break (bytes, quality);
            }
        };

        let mut downscaled = false;
        if encoded.len() as u64 > max_bytes {
            let (cur_width, cur_height) = surface.dimensions();
            let (new_width, new_height) =
                fallback_dimensions(cur_width, cur_height, max_bytes, encoded.len() as u64);
            debug!(
                "[{}] still {} bytes over budget at quality {:.2}, downscaling {}x{} -> {}x{}",
                file.name,
                encoded.len() as u64 - max_bytes,
                quality,
                cur_width,
                cur_height,
                new_width,
                new_height
            );
            surface = self.codec.resize(&surface, new_width, new_height);
            encoded = self.encode(&surface, format, FALLBACK_QUALITY)?;
            quality = FALLBACK_QUALITY;
            attempts += 1;
            downscaled = true;
        }

        let (final_width, final_height) = surface.dimensions();
        let original_size_bytes = file.size();
        let compressed_size_bytes = encoded.len() as u64;
        let compression_ratio = original_size_bytes as f64 / compressed_size_bytes as f64;

        info!(
            "🗜️ {}: {}x{} -> {}x{}, {} -> {} bytes (x{:.2}) in {} encode(s), {:.2?}",
            file.name,
            orig_width,
            orig_height,
            final_width,
            final_height,
            original_size_bytes,
            compressed_size_bytes,
            compression_ratio,
            attempts,
            start_time.elapsed()
        );

        Ok(CompressionResult {
            original_name: file.name.clone(),
            file: UploadFile {
                name: replace_extension(&file.name, format.extension()),
                media_type: format.media_type().to_string(),
                bytes: encoded,
                last_modified: Some(Utc::now()),
            },
            original_size_bytes,
            compressed_size_bytes,
            compression_ratio,
            width: final_width,
            height: final_height,
            quality: Some(quality),
            encode_attempts: attempts,
            downscaled,
        })
    }

    fn encode(
        &self,
        surface: &C::Surface,
        format: OutputFormat,
        quality: f32,
    ) -> Result<Vec<u8>, CompressError> {
        let bytes = self.codec.encode(surface, format, quality.max(0.0))?;
        if bytes.is_empty() {
            return Err(CompressError::encode(format!(
                "{} encoder produced zero bytes at quality {:.2}",
                format, quality
            )));
        }
        Ok(bytes)
    }
}
