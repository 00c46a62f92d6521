use crate::batch::BatchOutcome;
use serde::Serialize;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

pub const MANIFEST_NAME: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Ok,
    Error,
}

/// One line of `manifest.json`, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestEntry {
    pub index: usize,
    pub original_name: String,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Returns `name`, or `name (n).ext` for the first free `n`.
fn unique_entry_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    };
    let mut n = 1;
    loop {
        let candidate = format!("{} ({}){}", stem, n, ext);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Zips every compressed file of a batch together with a manifest of all outcomes.
pub fn build_archive(outcomes: &[BatchOutcome]) -> zip::result::ZipResult<Vec<u8>> {
    let mut zip_buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut zip_buffer);
    // payloads are already compressed images
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);

    let mut taken = HashSet::from([MANIFEST_NAME.to_string()]);
    let mut manifest = Vec::with_capacity(outcomes.len());

    for (index, outcome) in outcomes.iter().enumerate() {
        let entry = match outcome {
            Ok(result) => {
                let output_name = unique_entry_name(&result.file.name, &mut taken);
                zip.start_file(output_name.as_str(), options)?;
                zip.write_all(&result.file.bytes)?;
                ManifestEntry {
                    index,
                    original_name: result.original_name.clone(),
                    status: EntryStatus::Ok,
                    output_name: Some(output_name),
                    original_size_bytes: Some(result.original_size_bytes),
                    compressed_size_bytes: Some(result.compressed_size_bytes),
                    compression_ratio: Some(result.compression_ratio),
                    width: Some(result.width),
                    height: Some(result.height),
                    quality: result.quality,
                    error: None,
                }
            }
            Err(failure) => ManifestEntry {
                index,
                original_name: failure.file.name.clone(),
                status: EntryStatus::Error,
                output_name: None,
                original_size_bytes: Some(failure.file.size()),
                compressed_size_bytes: None,
                compression_ratio: None,
                width: None,
                height: None,
                quality: None,
                error: Some(failure.error.to_string()),
            },
        };
        manifest.push(entry);
    }

    let manifest_json = serde_json::to_vec_pretty(&manifest).map_err(std::io::Error::from)?;
    zip.start_file(MANIFEST_NAME, FileOptions::default())?;
    zip.write_all(&manifest_json)?;
    zip.finish()?;
    drop(zip);

    Ok(zip_buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchFailure;
    use crate::error::CompressError;
    use crate::file::UploadFile;
    use crate::{CompressOptions, ImageCompressor};
    use std::io::Read;
    use std::sync::Arc;
    use zip::ZipArchive;

    fn pass_through(name: &str, body: &[u8]) -> BatchOutcome {
        let file = UploadFile::new(name, "text/plain", body.to_vec());
        Ok(ImageCompressor::native()
            .compress(&file, &CompressOptions::default())
            .unwrap())
    }

    fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        archive.by_name(name).unwrap().read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn duplicate_names_get_a_counter() {
        let mut taken = HashSet::new();
        assert_eq!(unique_entry_name("a.webp", &mut taken), "a.webp");
        assert_eq!(unique_entry_name("a.webp", &mut taken), "a (1).webp");
        assert_eq!(unique_entry_name("a.webp", &mut taken), "a (2).webp");
        assert_eq!(unique_entry_name("README", &mut taken), "README");
        assert_eq!(unique_entry_name("README", &mut taken), "README (1)");
    }

    #[test]
    fn archive_holds_outputs_and_manifest() {
        let outcomes = vec![
            pass_through("notes.txt", b"first"),
            Err(BatchFailure {
                file: Arc::new(UploadFile::new("broken.jpg", "image/jpeg", vec![1, 2, 3])),
                error: CompressError::decode("bad header"),
            }),
            pass_through("notes.txt", b"second"),
        ];

        let bytes = build_archive(&outcomes).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);
        assert_eq!(read_entry(&mut archive, "notes.txt"), b"first");
        assert_eq!(read_entry(&mut archive, "notes (1).txt"), b"second");

        let manifest: serde_json::Value =
            serde_json::from_slice(&read_entry(&mut archive, MANIFEST_NAME)).unwrap();
        let entries = manifest.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["status"], "ok");
        assert_eq!(entries[0]["compression_ratio"], 1.0);
        assert_eq!(entries[1]["status"], "error");
        assert_eq!(entries[1]["original_name"], "broken.jpg");
        assert_eq!(entries[1]["error"], "Decode error: bad header");
        assert!(entries[1].get("output_name").is_none());
        assert_eq!(entries[2]["output_name"], "notes (1).txt");
    }
}
