//! Size-budgeted image compression for the upload flow.
//!
//! [`ImageCompressor`] shrinks one image towards a byte budget by lowering
//! encoder quality and, as a last resort, resolution. [`BatchCompressor`]
//! runs it over many files concurrently while keeping input order.

pub mod archive;
pub mod batch;
pub mod codec;
pub mod compress_jpeg;
pub mod compressor;
pub mod config;
pub mod error;
pub mod file;
pub mod handlers;
pub mod routes;
pub mod settings;

pub use batch::{BatchCompressor, BatchFailure, BatchOutcome};
pub use codec::{ImageCodec, NativeCodec, Raster};
pub use compressor::{CompressionResult, ImageCompressor};
pub use config::AppConfig;
pub use error::{ApiError, CompressError};
pub use file::UploadFile;
pub use settings::{CompressOptions, OutputFormat};
