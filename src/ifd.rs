use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use log::debug;

use crate::decoder::{decode_jpeg, DecoderRegistry};
use crate::error::{NefError, NefResult};
use crate::metadata::reader::find_tag;
use crate::reader::{Endianness, FileReader};
use crate::strip::{fetch_concatenated, strip_count, strip_ranges, Strips};
use crate::tag::Tag;
use crate::tiff::tags::ids;
use crate::tiff::{Family, PhotometricInterpretation};
use crate::DecodedImage;

/// One decoded IFD: a root directory of the file or one of its sub-IFDs.
///
/// Tags are kept per [`Family`], each vector sorted by id as stored on disk. Sub-IFDs share their
/// root's EXIF and MakerNote tags; they carry no GPS tags of their own and have no children.
#[derive(Clone)]
pub struct ImageFileDirectory {
    /// `[root]` for a root directory, `[root, sub]` for a sub-IFD.
    pub(crate) index: Vec<usize>,

    pub(crate) tiff: Vec<Tag>,
    pub(crate) exif: Arc<[Tag]>,
    pub(crate) gps: Vec<Tag>,
    pub(crate) notes: Arc<[Tag]>,

    pub(crate) children: Vec<ImageFileDirectory>,

    pub(crate) reader: Arc<dyn FileReader>,
    pub(crate) endianness: Endianness,
}

impl fmt::Debug for ImageFileDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFileDirectory")
            .field("index", &self.index)
            .field("tiff", &self.tiff)
            .field("exif", &self.exif)
            .field("gps", &self.gps)
            .field("notes", &self.notes)
            .field("children", &self.children)
            .field("endianness", &self.endianness)
            .finish_non_exhaustive()
    }
}

impl ImageFileDirectory {
    /// Every tag of this directory: TIFF, then EXIF, GPS and MakerNote.
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tiff
            .iter()
            .chain(self.exif.iter())
            .chain(self.gps.iter())
            .chain(self.notes.iter())
    }

    /// The tags of one family, sorted by id.
    pub fn tags_for(&self, family: Family) -> &[Tag] {
        match family {
            Family::Tiff => &self.tiff,
            Family::Exif => &self.exif,
            Family::Gps => &self.gps,
            Family::MakerNote => &self.notes,
        }
    }

    /// Look up a tag by id within one family.
    pub fn get_tag(&self, id: u16, family: Family) -> NefResult<&Tag> {
        find_tag(self.tags_for(family), id)
            .ok_or_else(|| NefError::NotFound(format!("{family} tag {id:#06x}")))
    }

    /// Whether the TIFF tags of this directory contain `id`.
    pub fn has(&self, id: u16) -> bool {
        find_tag(&self.tiff, id).is_some()
    }

    /// Position of this directory in the file: `[root]` or `[root, sub]`.
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// `true` for a root directory.
    pub fn is_main_dir(&self) -> bool {
        self.index.len() == 1
    }

    /// `true` for a sub-IFD.
    pub fn is_sub_dir(&self) -> bool {
        self.index.len() > 1
    }

    /// Short name for output files: `M-00` for root 0, `S-00-01` for sub-IFD 1 of root 0.
    pub fn filename(&self) -> String {
        match self.index.as_slice() {
            [root] => format!("M-{root:02}"),
            [root, sub, ..] => format!("S-{root:02}-{sub:02}"),
            [] => String::new(),
        }
    }

    /// Label of this directory: `M-IFD#<root>` or `S-IFD#<sub>`.
    pub fn directory(&self) -> String {
        match self.index.as_slice() {
            [root] => format!("M-IFD#{root}"),
            [_, sub, ..] => format!("S-IFD#{sub}"),
            [] => String::new(),
        }
    }

    /// The sub-IFDs of a root directory.
    pub fn children(&self) -> &[ImageFileDirectory] {
        &self.children
    }

    /// Byte order of the file this directory was read from.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// `true` when the directory embeds a JPEG stream (`0x201` and `0x202`).
    pub fn is_jpeg(&self) -> bool {
        self.has(ids::JPEG_FROM_RAW_START) && self.has(ids::JPEG_FROM_RAW_LENGTH)
    }

    /// `true` when the directory carries striped image data (`0x111`, `0x116` and `0x117`).
    pub fn is_raw(&self) -> bool {
        self.has(ids::STRIP_OFFSETS)
            && self.has(ids::ROWS_PER_STRIP)
            && self.has(ids::STRIP_BYTE_COUNTS)
    }

    fn uint_tag(&self, id: u16) -> NefResult<u32> {
        self.get_tag(id, Family::Tiff)?.uint()
    }

    /// ImageWidth.
    pub fn width(&self) -> NefResult<u32> {
        self.uint_tag(ids::IMAGE_WIDTH)
    }

    /// ImageLength.
    pub fn height(&self) -> NefResult<u32> {
        self.uint_tag(ids::IMAGE_LENGTH)
    }

    /// The raw PhotometricInterpretation code. Codes without a
    /// [`PhotometricInterpretation`] variant are returned as stored.
    pub fn photometric_interpretation(&self) -> NefResult<u16> {
        let code = self.uint_tag(ids::PHOTOMETRIC_INTERPRETATION)?;
        u16::try_from(code).map_err(|_| {
            NefError::DirectoryCorrupt(format!("photometric interpretation {code} out of range"))
        })
    }

    /// Whether [`image_type`][Self::image_type] names a layout this crate recognises.
    ///
    /// Embedded JPEGs and directories without a photometric tag count as supported, as do the
    /// baseline codes 0 to 6. Note that recognised is not the same as decodable:
    /// [`image`][Self::image] only reconstructs codes 0, 1 and 2 by default.
    pub fn is_supported(&self) -> bool {
        self.image_type() != "unsupported"
    }

    /// Coarse classification of the image data: `jpeg`, `raw/gray`, `raw/rgb`, `raw/palette`,
    /// `raw/mask`, `raw/cmyk`, `raw/ycbcr` or `unsupported`.
    pub fn image_type(&self) -> &'static str {
        if self.is_jpeg() || !self.has(ids::PHOTOMETRIC_INTERPRETATION) {
            return "jpeg";
        }
        let Ok(code) = self.photometric_interpretation() else {
            return "unsupported";
        };
        match PhotometricInterpretation::from_u16(code) {
            Some(PhotometricInterpretation::WhiteIsZero | PhotometricInterpretation::BlackIsZero) => {
                "raw/gray"
            }
            Some(PhotometricInterpretation::RGB) => "raw/rgb",
            Some(PhotometricInterpretation::RGBPalette) => "raw/palette",
            Some(PhotometricInterpretation::TransparencyMask) => "raw/mask",
            Some(PhotometricInterpretation::CMYK) => "raw/cmyk",
            Some(PhotometricInterpretation::YCbCr) => "raw/ycbcr",
            _ => "unsupported",
        }
    }

    /// Fetch the embedded JPEG stream verbatim.
    pub fn fetch_jpeg(&self) -> NefResult<Bytes> {
        let start = u64::from(self.uint_tag(ids::JPEG_FROM_RAW_START)?);
        let length = u64::from(self.uint_tag(ids::JPEG_FROM_RAW_LENGTH)?);
        debug!("{}: JPEG of {length} bytes at {start}", self.directory());
        self.reader.get_bytes(start..start + length)
    }

    /// The strips concatenated in index order. Only ImageLength and the three strip tags are
    /// consulted.
    fn strip_data(&self) -> NefResult<Bytes> {
        let height = self.height()?;
        let rows_per_strip = self.uint_tag(ids::ROWS_PER_STRIP)?;
        let count = strip_count(height, rows_per_strip)?;
        let ranges = strip_ranges(
            self.get_tag(ids::STRIP_OFFSETS, Family::Tiff)?,
            self.get_tag(ids::STRIP_BYTE_COUNTS, Family::Tiff)?,
            count,
        )?;
        debug!("{}: {count} strips", self.directory());
        fetch_concatenated(self.reader.as_ref(), ranges)
    }

    /// Fetch and concatenate the image strips, along with the tags needed to decode them.
    pub fn fetch_strips(&self) -> NefResult<Strips> {
        let data = self.strip_data()?;
        let photometric_interpretation = if self.has(ids::PHOTOMETRIC_INTERPRETATION) {
            Some(self.photometric_interpretation()?)
        } else {
            None
        };
        Ok(Strips {
            width: self.width()?,
            height: self.height()?,
            photometric_interpretation,
            data,
        })
    }

    /// The image bytes: the embedded JPEG if there is one, else the concatenated strips.
    pub fn bytes(&self) -> NefResult<Bytes> {
        if self.is_jpeg() {
            self.fetch_jpeg()
        } else if self.is_raw() {
            self.strip_data()
        } else {
            Err(NefError::NoImage)
        }
    }

    /// Decode the image into pixels with the default decoders.
    pub fn image(&self) -> NefResult<DecodedImage> {
        self.image_with(&DecoderRegistry::default())
    }

    /// Decode the image into pixels, looking up strip decoders in `decoder_registry`.
    pub fn image_with(&self, decoder_registry: &DecoderRegistry) -> NefResult<DecodedImage> {
        if self.is_jpeg() {
            decode_jpeg(self.fetch_jpeg()?)
        } else if self.is_raw() {
            self.fetch_strips()?.decode(decoder_registry)
        } else {
            Err(NefError::NoImage)
        }
    }
}
