use std::sync::Arc;

use crate::error::NefResult;
use crate::ifd::ImageFileDirectory;
use crate::metadata::NefMetadataReader;
use crate::options::DecodeOptions;
use crate::reader::{Endianness, FileReader};

/// A decoded NEF file: the root IFDs in chain order, each with its sub-IFDs.
///
/// The forest is built once and never mutated. All directories share the buffer they were read
/// from, so image data can be fetched from any of them later.
#[derive(Debug, Clone)]
pub struct Nef {
    endianness: Endianness,
    files: Vec<ImageFileDirectory>,
}

impl Nef {
    /// Create a new Nef from existing IFDs.
    pub fn new(endianness: Endianness, files: Vec<ImageFileDirectory>) -> Self {
        Self { endianness, files }
    }

    /// Read every root IFD from `reader`.
    pub fn open(reader: Arc<dyn FileReader>, options: DecodeOptions) -> NefResult<Self> {
        let mut metadata_reader = NefMetadataReader::try_open(reader.as_ref(), options)?;
        let files = metadata_reader.read_all_ifds(&reader)?;
        Ok(Self::new(metadata_reader.endianness(), files))
    }

    /// Access the root Image File Directories.
    pub fn files(&self) -> &[ImageFileDirectory] {
        &self.files
    }

    /// Byte order of the file.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Every directory, depth first: each root followed by its sub-IFDs.
    pub fn iter_all(&self) -> impl Iterator<Item = &ImageFileDirectory> {
        self.files
            .iter()
            .flat_map(|root| std::iter::once(root).chain(root.children()))
    }
}
