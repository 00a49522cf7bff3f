//! API for reading metadata out of a NEF file.
//!
//! ### Reading all metadata
//!
//! [`NefMetadataReader`] walks the chain of root IFDs. For each root it also decodes the EXIF and
//! GPS IFDs the root points at, the Nikon MakerNote embedded in the EXIF tags, and the sub-IFDs
//! listed in the root's `SubIFDs` tag:
//!
//! ```
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use nef_decoder::metadata::NefMetadataReader;
//! use nef_decoder::reader::FileReader;
//!
//! // A big-endian file with one empty IFD at offset 8.
//! let bytes = Bytes::from_static(b"MM\0*\0\0\0\x08\0\0\0\0\0\0");
//! let reader: Arc<dyn FileReader> = Arc::new(bytes);
//!
//! let mut metadata_reader = NefMetadataReader::try_open(reader.as_ref(), Default::default())
//!     .unwrap();
//! let ifds = metadata_reader.read_all_ifds(&reader).unwrap();
//! assert_eq!(ifds.len(), 1);
//! assert_eq!(ifds[0].filename(), "M-00");
//! ```
//!
//! ### Lower level access
//!
//! [`ImageFileDirectoryReader`] reads the tags of a single IFD at a known offset, and
//! [`read_byte_order`] validates a 4-byte TIFF header anywhere in the file.

mod fetch;
pub(crate) mod reader;

pub use reader::{read_byte_order, ImageFileDirectoryReader, NefMetadataReader};
