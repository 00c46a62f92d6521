use crate::codec::{ImageCodec, NativeCodec};
use crate::compressor::{CompressionResult, ImageCompressor};
use crate::error::CompressError;
use crate::file::UploadFile;
use crate::settings::CompressOptions;
use futures::future::join_all;
use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// A file that could not be compressed, paired with the reason.
#[derive(thiserror::Error, Debug)]
#[error("{}: {}", .file.name, .error)]
pub struct BatchFailure {
    pub file: Arc<UploadFile>,
    #[source]
    pub error: CompressError,
}

pub type BatchOutcome = Result<CompressionResult, BatchFailure>;

/// Compresses many files concurrently, one outcome per input in input order.
pub struct BatchCompressor<C = NativeCodec> {
    compressor: ImageCompressor<C>,
    workers: Option<usize>,
    file_timeout: Option<Duration>,
}

impl<C> Clone for BatchCompressor<C> {
    fn clone(&self) -> Self {
        Self {
            compressor: self.compressor.clone(),
            workers: self.workers,
            file_timeout: self.file_timeout,
        }
    }
}

impl BatchCompressor<NativeCodec> {
    pub fn native() -> Self {
        Self::new(ImageCompressor::native())
    }
}

impl Default for BatchCompressor<NativeCodec> {
    fn default() -> Self {
        Self::native()
    }
}

/// Worker count: at least 2, at most one per physical core, never more than files.
pub fn desired_workers(total_files: usize) -> usize {
    std::cmp::min(total_files, std::cmp::max(2, num_cpus::get_physical())).max(1)
}

impl<C> BatchCompressor<C>
where
    C: ImageCodec + 'static,
{
    pub fn new(compressor: ImageCompressor<C>) -> Self {
        Self {
            compressor,
            workers: None,
            file_timeout: None,
        }
    }

    /// Fixed worker count instead of the core-based default.
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers.filter(|w| *w > 0);
        self
    }

    /// Abandon a file whose compression runs longer than `timeout`.
    ///
    /// The blocking work itself cannot be interrupted; it finishes in the
    /// background and its output is dropped.
    pub fn with_file_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.file_timeout = timeout;
        self
    }

    pub async fn compress_many(
        &self,
        files: Vec<UploadFile>,
        options: &CompressOptions,
    ) -> Vec<BatchOutcome> {
        let total_files = files.len();
        if total_files == 0 {
            return Vec::new();
        }

        let workers = self
            .workers
            .unwrap_or_else(|| desired_workers(total_files))
            .min(total_files);
        let start_total = Instant::now();

        info!("=========================================");
        info!("📂 Total files to compress: {}", total_files);
        for file in &files {
            info!("➡️  File: {} ({}, {} bytes)", file.name, file.media_type, file.size());
        }
        info!("🎯 Output: {}", options.output_format);
        info!("📐 Max dimensions: {}x{}", options.max_width, options.max_height);
        info!("📏 Max size: {} bytes", options.max_size_bytes);
        info!("🛠️ Initial quality: {:.2}", options.quality);
        info!("🔧 Using {} workers", workers);
        info!("=========================================");

        let semaphore = Arc::new(Semaphore::new(workers));
        let options = *options;

        let tasks = files.into_iter().enumerate().map(|(index, file)| {
            let file = Arc::new(file);
            let semaphore = Arc::clone(&semaphore);
            let compressor = self.compressor.clone();
            let timeout = self.file_timeout;

            async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(permit) => {
                        let start_file = Instant::now();
                        let worker_file = Arc::clone(&file);
                        let handle = tokio::task::spawn_blocking(move || {
                            let _permit = permit;
                            compressor.compress(&worker_file, &options)
                        });
                        let joined = match timeout {
                            Some(limit) => match tokio::time::timeout(limit, handle).await {
                                Ok(joined) => joined,
                                Err(_) => {
                                    warn!("⏱️ [{}] '{}' timed out after {:?}", index, file.name, limit);
                                    return Err(BatchFailure {
                                        file,
                                        error: CompressError::Timeout(limit),
                                    });
                                }
                            },
                            None => handle.await,
                        };
                        let result = joined
                            .map_err(|e| CompressError::Worker(e.to_string()))
                            .and_then(|r| r);
                        info!(
                            "⏱️ [{} / {}] Processed '{}' in {:.2?}",
                            index + 1,
                            total_files,
                            file.name,
                            start_file.elapsed()
                        );
                        result
                    }
                    Err(e) => Err(CompressError::Worker(e.to_string())),
                };

                result.map_err(|error| {
                    warn!("❌ [{}] '{}' failed: {}", index, file.name, error);
                    BatchFailure { file, error }
                })
            }
        });

        let outcomes = join_all(tasks).await;

        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        info!(
            "✅ Compressed {} / {} files in {:.2?}",
            total_files - failed,
            total_files,
            start_total.elapsed()
        );

        outcomes
    }
}
