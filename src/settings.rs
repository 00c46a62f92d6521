use crate::error::CompressError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MAX_SIZE_KB: u64 = 100;
pub const DEFAULT_MAX_WIDTH: u32 = 1920;
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;
pub const DEFAULT_QUALITY: f32 = 0.8;

/// Encoded format of a compressed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "image/webp")]
    WebP,
    #[serde(rename = "image/jpeg", alias = "image/jpg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
}

impl OutputFormat {
    pub fn media_type(self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.media_type())
    }
}

impl FromStr for OutputFormat {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image/webp" => Ok(OutputFormat::WebP),
            "image/jpeg" | "image/jpg" => Ok(OutputFormat::Jpeg),
            "image/png" => Ok(OutputFormat::Png),
            other => Err(CompressError::invalid_options(format!(
                "Unsupported output type '{}'. Allowed: image/webp, image/jpeg, image/png",
                other
            ))),
        }
    }
}

/// Per-call tunables of [`crate::ImageCompressor::compress`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompressOptions {
    /// Target upper bound for the encoded output.
    pub max_size_bytes: u64,
    pub max_width: u32,
    pub max_height: u32,
    /// Starting encoder quality in (0, 1].
    pub quality: f32,
    pub output_format: OutputFormat,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_KB * 1024,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_QUALITY,
            output_format: OutputFormat::default(),
        }
    }
}

impl CompressOptions {
    pub fn with_max_size_kb(mut self, kb: u64) -> Self {
        self.max_size_bytes = kb.saturating_mul(1024);
        self
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_width = width;
        self.max_height = height;
        self
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn validate(&self) -> Result<(), CompressError> {
        if self.max_size_bytes == 0 {
            return Err(CompressError::invalid_options("max size must be greater than 0"));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(CompressError::invalid_options(
                "max width and max height must be greater than 0",
            ));
        }
        if !self.quality.is_finite() || self.quality <= 0.0 || self.quality > 1.0 {
            return Err(CompressError::invalid_options(format!(
                "quality must be in (0, 1], got {}",
                self.quality
            )));
        }
        Ok(())
    }
}
