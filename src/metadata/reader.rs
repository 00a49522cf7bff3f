use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use log::{debug, warn};

use crate::error::{NefError, NefResult};
use crate::metadata::fetch::MetadataCursor;
use crate::options::DecodeOptions;
use crate::reader::{EndianAwareReader, Endianness, FileReader};
use crate::tag::Tag;
use crate::tiff::tags::ids;
use crate::tiff::{Family, Format};
use crate::ImageFileDirectory;

/// Size of one IFD entry: tag (2), type (2), count (4), value (4).
const IFD_ENTRY_BYTE_SIZE: u64 = 12;
/// Size of the entry count that opens every IFD.
const TAG_COUNT_BYTE_SIZE: u64 = 2;
/// A count no writer produces; files carrying it are rejected.
const SENTINEL_COUNT: u32 = u32::MAX;

/// `"Nikon\0"`, followed by a two-byte version, opens the MakerNote payload.
const NIKON_SIGNATURE: &[u8] = b"Nikon\0";
/// The MakerNote's TIFF header starts this many bytes into the payload; its offsets are relative
/// to that header.
const MAKER_NOTE_PREAMBLE: u64 = 10;

/// Detect the byte order of the 4-byte TIFF header at `offset`.
///
/// `II` followed by 42 little endian, or `MM` followed by 42 big endian. Anything else is
/// [`NefError::HeaderInvalid`].
pub fn read_byte_order<F: FileReader + ?Sized>(fetch: &F, offset: u64) -> NefResult<Endianness> {
    let end = offset
        .checked_add(4)
        .ok_or_else(|| NefError::truncated(offset, 4, 0))?;
    let header = fetch.get_bytes(offset..end)?;
    match header.as_ref() {
        [b'I', b'I', 0x2a, 0x00] => Ok(Endianness::LittleEndian),
        [b'M', b'M', 0x00, 0x2a] => Ok(Endianness::BigEndian),
        other => Err(NefError::HeaderInvalid(format!(
            "unexpected magic bytes {other:02x?} at offset {offset}"
        ))),
    }
}

/// Entry point to reading NEF metadata.
///
/// This is a stateful reader that walks the chain of root IFDs. Each root is returned with its
/// EXIF, GPS and MakerNote tags already attached and its sub-IFDs decoded as children.
///
/// ```notest
/// let mut metadata_reader = NefMetadataReader::try_open(&reader, DecodeOptions::default())?;
/// let ifds = metadata_reader.read_all_ifds(&reader)?;
/// ```
pub struct NefMetadataReader {
    endianness: Endianness,
    next_ifd_offset: Option<u64>,
    visited: HashSet<u64>,
    roots_read: usize,
    options: DecodeOptions,
}

impl NefMetadataReader {
    /// Open a new NEF file, validating the magic bytes and reading the endianness and the offset
    /// of the first IFD.
    ///
    /// This does not read any IFD metadata.
    pub fn try_open<F: FileReader + ?Sized>(
        fetch: &F,
        options: DecodeOptions,
    ) -> NefResult<Self> {
        let endianness = read_byte_order(fetch, 0)?;

        // Set offset to 4 since we've already read the header.
        let mut cursor = MetadataCursor::new(fetch, endianness).with_offset(4);
        let first_ifd_location = cursor.read_u32()?;
        debug!("{endianness:?} file, first IFD at {first_ifd_location}");

        Ok(Self {
            endianness,
            next_ifd_offset: non_zero(first_ifd_location),
            visited: HashSet::new(),
            roots_read: 0,
            options,
        })
    }

    /// Returns the endianness of the file.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Returns `true` if there are more root IFDs to read.
    pub fn has_next_ifd(&self) -> bool {
        self.next_ifd_offset.is_some()
    }

    /// The byte offset of the start of the next root IFD.
    ///
    /// This will be `None` if all IFDs have already been read.
    pub fn next_ifd_offset(&self) -> Option<u64> {
        self.next_ifd_offset
    }

    /// Read the next root IFD and everything it points at.
    ///
    /// If there are no more IFDs, or the configured maximum has been reached, returns `None`.
    pub fn read_next_ifd(
        &mut self,
        fetch: &Arc<dyn FileReader>,
    ) -> NefResult<Option<ImageFileDirectory>> {
        let Some(ifd_start) = self.next_ifd_offset else {
            return Ok(None);
        };
        if self.roots_read >= self.options.max_root_directories {
            warn!(
                "stopping after {} root IFDs, next one at {ifd_start} is ignored",
                self.roots_read
            );
            self.next_ifd_offset = None;
            return Ok(None);
        }
        if !self.visited.insert(ifd_start) {
            return Err(NefError::DirectoryCorrupt(format!(
                "root IFD chain loops back to offset {ifd_start}"
            )));
        }

        let ifd_reader =
            ImageFileDirectoryReader::open(fetch.as_ref(), ifd_start, 0, self.endianness)?;
        let tiff = ifd_reader.read(fetch.as_ref(), Family::Tiff)?;
        self.next_ifd_offset = ifd_reader.finish(fetch.as_ref())?;

        let ifd = self.build_root(fetch, self.roots_read, tiff)?;
        self.roots_read += 1;
        Ok(Some(ifd))
    }

    /// Read all root IFDs from the file.
    pub fn read_all_ifds(
        &mut self,
        fetch: &Arc<dyn FileReader>,
    ) -> NefResult<Vec<ImageFileDirectory>> {
        let mut ifds = vec![];
        while let Some(ifd) = self.read_next_ifd(fetch)? {
            ifds.push(ifd);
        }
        Ok(ifds)
    }

    fn build_root(
        &self,
        fetch: &Arc<dyn FileReader>,
        root: usize,
        tiff: Vec<Tag>,
    ) -> NefResult<ImageFileDirectory> {
        let source = fetch.as_ref();
        let exif = read_pointed_ifd(source, &tiff, ids::EXIF_IFD, self.endianness, Family::Exif)?;
        let gps = read_pointed_ifd(source, &tiff, ids::GPS_IFD, self.endianness, Family::Gps)?;
        let notes = if self.options.read_maker_note {
            read_maker_note(source, &exif)?
        } else {
            vec![]
        };

        let exif: Arc<[Tag]> = exif.into();
        let notes: Arc<[Tag]> = notes.into();

        let mut children = vec![];
        if self.options.read_sub_ifds {
            if let Some(sub_ifds) = find_tag(&tiff, ids::SUB_IFDS) {
                for (sub, offset) in pointer_offsets(source, sub_ifds)?.into_iter().enumerate() {
                    debug!("reading sub-IFD {sub} of root {root} at {offset}");
                    let ifd_reader =
                        ImageFileDirectoryReader::open(source, offset, 0, self.endianness)?;
                    children.push(ImageFileDirectory {
                        index: vec![root, sub],
                        tiff: ifd_reader.read(source, Family::Tiff)?,
                        exif: exif.clone(),
                        gps: vec![],
                        notes: notes.clone(),
                        children: vec![],
                        reader: fetch.clone(),
                        endianness: self.endianness,
                    });
                }
            }
        }

        Ok(ImageFileDirectory {
            index: vec![root],
            tiff,
            exif,
            gps,
            notes,
            children,
            reader: fetch.clone(),
            endianness: self.endianness,
        })
    }
}

/// Reads the tags of one IFD.
///
/// IFDs are not necessarily contiguous in the file. Payload offsets are shifted by `rebase`,
/// which is zero everywhere except inside the MakerNote, whose offsets count from its own
/// embedded header.
///
/// Note that you must call [`finish`][ImageFileDirectoryReader::finish] to read the offset of the
/// following IFD.
pub struct ImageFileDirectoryReader {
    endianness: Endianness,
    /// The byte offset of the beginning of this IFD
    ifd_start_offset: u64,
    /// Added to every external payload offset.
    rebase: u64,
    /// The number of tags in this IFD
    tag_count: u64,
}

impl ImageFileDirectoryReader {
    /// Read the entry count of the IFD starting at the given file offset.
    pub fn open<F: FileReader + ?Sized>(
        fetch: &F,
        ifd_start_offset: u64,
        rebase: u64,
        endianness: Endianness,
    ) -> NefResult<Self> {
        let mut cursor = MetadataCursor::new_with_offset(fetch, endianness, ifd_start_offset);
        let tag_count = cursor.read_u16()?.into();
        Ok(Self {
            endianness,
            ifd_start_offset,
            rebase,
            tag_count,
        })
    }

    /// Number of entries in this IFD.
    pub fn tag_count(&self) -> u64 {
        self.tag_count
    }

    /// Manually read the tag with the specified index.
    ///
    /// Panics if the tag index is out of range of the tag count.
    pub fn read_tag<F: FileReader + ?Sized>(
        &self,
        fetch: &F,
        tag_idx: u64,
        family: Family,
    ) -> NefResult<Tag> {
        assert!(tag_idx < self.tag_count);
        let tag_offset =
            self.ifd_start_offset + TAG_COUNT_BYTE_SIZE + (IFD_ENTRY_BYTE_SIZE * tag_idx);
        read_tag(fetch, tag_offset, self.rebase, self.endianness, family)
    }

    /// Read all tags out of this IFD, checking that ids are strictly increasing.
    ///
    /// Keep in mind that you'll still need to call [`finish`][Self::finish] to get the byte offset
    /// of the next IFD.
    pub fn read<F: FileReader + ?Sized>(&self, fetch: &F, family: Family) -> NefResult<Vec<Tag>> {
        debug!(
            "reading {family} IFD at {} with {} entries",
            self.ifd_start_offset, self.tag_count
        );
        let mut tags: Vec<Tag> = Vec::with_capacity(self.tag_count as usize);
        for tag_idx in 0..self.tag_count {
            let tag = self.read_tag(fetch, tag_idx, family)?;
            if let Some(previous) = tags.last() {
                if tag.id <= previous.id {
                    return Err(NefError::DirectoryCorrupt(format!(
                        "{family} IFD at {}: tag {:#06x} follows {:#06x}",
                        self.ifd_start_offset, tag.id, previous.id
                    )));
                }
            }
            tags.push(tag);
        }
        Ok(tags)
    }

    /// Finish this reader, reading the byte offset of the next IFD.
    ///
    /// A zero offset ends the chain, and so does a buffer that ends exactly where the offset
    /// would be.
    pub fn finish<F: FileReader + ?Sized>(self, fetch: &F) -> NefResult<Option<u64>> {
        let next_ifd_byte_offset =
            self.ifd_start_offset + TAG_COUNT_BYTE_SIZE + (IFD_ENTRY_BYTE_SIZE * self.tag_count);
        let mut cursor =
            MetadataCursor::new_with_offset(fetch, self.endianness, next_ifd_byte_offset);
        match cursor.read_u32() {
            Ok(next_ifd_offset) => Ok(non_zero(next_ifd_offset)),
            Err(NefError::Truncated { actual: 0, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Read a single IFD entry at `tag_offset`, fetching its payload when it does not fit inline.
fn read_tag<F: FileReader + ?Sized>(
    fetch: &F,
    tag_offset: u64,
    rebase: u64,
    endianness: Endianness,
    family: Family,
) -> NefResult<Tag> {
    let mut cursor = MetadataCursor::new_with_offset(fetch, endianness, tag_offset);
    let id = cursor.read_u16()?;
    let type_code = cursor.read_u16()?;
    let count = cursor.read_u32()?;
    if count == SENTINEL_COUNT {
        return Err(NefError::DirectoryCorrupt(format!(
            "{family} tag {id:#06x} at offset {tag_offset} has an invalid count"
        )));
    }
    let value_position = cursor.position();
    let value_field = cursor.read(4)?.into_bytes();
    let offset =
        EndianAwareReader::new_at(value_field.clone(), endianness, value_position).read_u32()?;

    // Unknown type codes have no element size and are always kept inline.
    let size = Format::from_u16(type_code)
        .map(|format| format.size() * u64::from(count))
        .unwrap_or(0);

    let raw = if size <= 4 {
        value_field
    } else {
        let start = u64::from(offset)
            .checked_add(rebase)
            .ok_or_else(|| NefError::truncated(u64::from(offset), size, 0))?;
        MetadataCursor::new_with_offset(fetch, endianness, start)
            .read(size)?
            .into_bytes()
    };

    Ok(Tag {
        id,
        type_code,
        count,
        offset,
        raw,
        family,
        endianness,
    })
}

/// Binary search for `id` in a directory's sorted tags.
pub(crate) fn find_tag(tags: &[Tag], id: u16) -> Option<&Tag> {
    tags.binary_search_by_key(&id, |tag| tag.id)
        .ok()
        .map(|idx| &tags[idx])
}

/// The IFD offsets stored in a pointer tag's payload.
///
/// Pointer tags are written as `LONG` or as the `IFD` type, which has no decoder, so offsets are
/// read straight from the payload instead of through the value codec.
fn pointer_offsets<F: FileReader + ?Sized>(fetch: &F, tag: &Tag) -> NefResult<Vec<u64>> {
    let len = u64::from(tag.count) * 4;
    let payload: Bytes = if len <= 4 || tag.raw.len() as u64 >= len {
        tag.raw.clone()
    } else {
        fetch.get_bytes(u64::from(tag.offset)..u64::from(tag.offset) + len)?
    };
    let mut data = EndianAwareReader::new(payload, tag.endianness);
    (0..tag.count)
        .map(|_| data.read_u32().map(u64::from))
        .collect()
}

/// Decode the directory `pointer` refers to, or nothing if the tag is absent.
fn read_pointed_ifd<F: FileReader + ?Sized>(
    fetch: &F,
    tags: &[Tag],
    pointer: u16,
    endianness: Endianness,
    family: Family,
) -> NefResult<Vec<Tag>> {
    let Some(tag) = find_tag(tags, pointer) else {
        return Ok(vec![]);
    };
    let Some(&offset) = pointer_offsets(fetch, tag)?.first() else {
        return Ok(vec![]);
    };
    ImageFileDirectoryReader::open(fetch, offset, 0, endianness)?.read(fetch, family)
}

/// Decode the Nikon MakerNote referenced from the EXIF tags.
///
/// The payload starts with a 10-byte preamble (`"Nikon\0"` and a version), followed by a complete
/// TIFF header with its own byte order. A payload without the signature is not an error; the
/// MakerNote is simply treated as absent.
fn read_maker_note<F: FileReader + ?Sized>(fetch: &F, exif: &[Tag]) -> NefResult<Vec<Tag>> {
    let Some(tag) = find_tag(exif, ids::MAKER_NOTE) else {
        return Ok(vec![]);
    };
    if tag.size() <= MAKER_NOTE_PREAMBLE || !tag.raw.starts_with(NIKON_SIGNATURE) {
        debug!("MakerNote at {} has no Nikon signature, skipping", tag.offset);
        return Ok(vec![]);
    }

    let header = u64::from(tag.offset) + MAKER_NOTE_PREAMBLE;
    let endianness = read_byte_order(fetch, header)?;
    let internal_offset = MetadataCursor::new_with_offset(fetch, endianness, header + 4).read_u32()?;
    debug!("{endianness:?} MakerNote header at {header}, IFD at +{internal_offset}");

    ImageFileDirectoryReader::open(fetch, u64::from(internal_offset) + header, header, endianness)?
        .read(fetch, Family::MakerNote)
}

fn non_zero(offset: u32) -> Option<u64> {
    (offset != 0).then_some(u64::from(offset))
}
