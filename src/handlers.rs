use crate::archive::build_archive;
use crate::batch::BatchCompressor;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::file::UploadFile;
use crate::settings::{CompressOptions, OutputFormat};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use log::{debug, info};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub batch: BatchCompressor,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let batch = BatchCompressor::native()
            .with_workers(config.workers)
            .with_file_timeout(config.file_timeout);
        Self { config, batch }
    }
}

/// Raw option fields of the compress form; absent fields keep their defaults.
#[derive(Debug, Default)]
pub struct CompressForm {
    pub max_size_kb: Option<String>,
    pub max_width: Option<String>,
    pub max_height: Option<String>,
    pub quality: Option<String>,
    pub output_type: Option<String>,
}

fn parse_field<T: std::str::FromStr>(name: &str, value: &Option<String>) -> Result<Option<T>, ApiError> {
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Invalid value for '{}': {}", name, v))),
    }
}

impl CompressForm {
    pub fn into_options(self) -> Result<CompressOptions, ApiError> {
        let mut options = CompressOptions::default();
        if let Some(kb) = parse_field::<u64>("max_size_kb", &self.max_size_kb)? {
            options = options.with_max_size_kb(kb);
        }
        if let Some(width) = parse_field::<u32>("max_width", &self.max_width)? {
            options.max_width = width;
        }
        if let Some(height) = parse_field::<u32>("max_height", &self.max_height)? {
            options.max_height = height;
        }
        if let Some(quality) = parse_field::<f32>("quality", &self.quality)? {
            options.quality = quality;
        }
        if let Some(output_type) = self.output_type.as_deref().filter(|v| !v.trim().is_empty()) {
            options.output_format = output_type.parse::<OutputFormat>()?;
        }
        options.validate()?;
        Ok(options)
    }
}

pub fn files_validation(files: &[UploadFile], config: &AppConfig) -> Result<(), ApiError> {
    if files.is_empty() {
        return Err(ApiError::bad_request("No files uploaded."));
    }

    if files.len() > config.max_files {
        return Err(ApiError::bad_request(format!(
            "Maximum {} files allowed. You uploaded {} files.",
            config.max_files,
            files.len()
        )));
    }

    for file in files {
        if file.bytes.len() > config.max_file_size {
            return Err(too_large(&file.name, config));
        }
    }

    Ok(())
}

fn too_large(filename: &str, config: &AppConfig) -> ApiError {
    ApiError::bad_request(format!(
        "File {} exceeds the {} MB size limit.",
        filename,
        config.max_file_size / 1024 / 1024
    ))
}

/// Upper bound for a single non-file form field.
const MAX_FIELD_BYTES: usize = 1024;

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("Server is running!")
}

pub async fn compress_images(
    mut payload: Multipart,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let config = &state.config;
    let mut files = Vec::new();
    let mut form = CompressForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let content_disposition = field.content_disposition().clone();
        let name = content_disposition.get_name().unwrap_or("").to_string();
        let filename = content_disposition.get_filename().map(str::to_string);
        let content_type = field.content_type().map(|m| m.essence_str().to_string());
        let is_file = name == "file";

        if is_file && files.len() >= config.max_files {
            return Err(ApiError::bad_request(format!(
                "Maximum {} files allowed.",
                config.max_files
            )));
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            data.extend_from_slice(&chunk[..]);

            if is_file && data.len() > config.max_file_size {
                return Err(too_large(filename.as_deref().unwrap_or("unknown"), config));
            }
            if !is_file && data.len() > MAX_FIELD_BYTES {
                return Err(ApiError::bad_request(format!(
                    "Field '{}' exceeds {} bytes.",
                    name, MAX_FIELD_BYTES
                )));
            }
        }

        if is_file {
            let filename = filename.unwrap_or_else(|| "unknown".to_string());
            let file = match content_type {
                Some(media_type) if media_type != "application/octet-stream" => {
                    UploadFile::new(filename, media_type, data)
                }
                _ => UploadFile::from_name_guess(filename, data),
            };
            debug!("Received file '{}' ({}, {} bytes)", file.name, file.media_type, file.size());
            files.push(file);
        } else {
            let text = String::from_utf8(data).unwrap_or_default();
            match name.as_str() {
                "max_size_kb" => form.max_size_kb = Some(text),
                "max_width" => form.max_width = Some(text),
                "max_height" => form.max_height = Some(text),
                "quality" => form.quality = Some(text),
                "output_type" => form.output_type = Some(text),
                _ => {}
            }
        }
    }

    files_validation(&files, config)?;
    let options = form.into_options()?;

    info!("✅ {} file(s) validated and ready to compress", files.len());

    let outcomes = state.batch.compress_many(files, &options).await;
    let zip_data = web::block(move || build_archive(&outcomes))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)?;

    Ok(HttpResponse::Ok()
        .content_type("application/zip")
        .body(zip_data))
}
