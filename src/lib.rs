#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

pub mod codec;
pub mod decoder;
mod decoding_result;
pub mod dictionary;
pub mod error;
mod ifd;
pub mod metadata;
mod nef;
mod options;
pub mod reader;
mod strip;
mod tag;
pub mod tiff;

pub use decoding_result::{ColorType, DecodedImage};
pub use error::{NefError, NefResult};
pub use ifd::ImageFileDirectory;
pub use nef::Nef;
pub use options::DecodeOptions;
pub use strip::Strips;
pub use tag::Tag;

/// Decode an in-memory NEF file with default options.
pub fn decode(bytes: impl Into<Bytes>) -> NefResult<Nef> {
    decode_with_options(bytes, DecodeOptions::default())
}

/// Decode an in-memory NEF file.
pub fn decode_with_options(bytes: impl Into<Bytes>, options: DecodeOptions) -> NefResult<Nef> {
    let reader: Arc<dyn reader::FileReader> = Arc::new(bytes.into());
    Nef::open(reader, options)
}

/// Read a NEF file from disk and decode it.
pub fn decode_file(path: impl AsRef<Path>) -> NefResult<Nef> {
    decode(std::fs::read(path)?)
}

/// Read a NEF file with `tokio::fs` and decode it.
#[cfg(feature = "tokio")]
pub async fn decode_file_async(path: impl AsRef<Path>) -> NefResult<Nef> {
    decode(tokio::fs::read(path).await?)
}
