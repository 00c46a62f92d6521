use chrono::{DateTime, Utc};
use serde::Serialize;

/// A named blob as selected by the user for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadFile {
    pub name: String,
    pub media_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
            last_modified: None,
        }
    }

    /// Builds a file whose media type is guessed from its name.
    pub fn from_name_guess(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let media_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self::new(name, media_type, bytes)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Only `image/*` media types go through the compressor.
    pub fn is_image(&self) -> bool {
        self.media_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

/// Swaps the last extension of `name` for `extension`.
///
/// `"photo.final.JPG"` becomes `"photo.final.webp"`; a leading dot
/// (`".hidden"`) is part of the stem.
pub fn replace_extension(name: &str, extension: &str) -> String {
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };
    format!("{}.{}", stem, extension)
}
