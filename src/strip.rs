use std::ops::Range;

use bytes::{Bytes, BytesMut};

use crate::decoder::DecoderRegistry;
use crate::error::{NefError, NefResult};
use crate::reader::{EndianAwareReader, FileReader};
use crate::tag::Tag;
use crate::tiff::Format;
use crate::DecodedImage;

/// Uncompressed striped image data of one directory.
///
/// A strip is an image-width, rows-per-strip band. The strips are fetched in index order and
/// concatenated; decoding into pixels is separate from fetching.
///
/// This is returned by [`ImageFileDirectory::fetch_strips`][crate::ImageFileDirectory::fetch_strips].
#[derive(Debug, Clone)]
pub struct Strips {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) photometric_interpretation: Option<u16>,
    pub(crate) data: Bytes,
}

impl Strips {
    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The photometric code of the directory, if the tag is present.
    pub fn photometric_interpretation(&self) -> Option<u16> {
        self.photometric_interpretation
    }

    /// The concatenated strip bytes.
    ///
    /// Note that [`Bytes`] is reference-counted, so it is very cheap to clone if needed.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Decode the strips into pixels with the decoder registered for the photometric
    /// interpretation.
    pub fn decode(&self, decoder_registry: &DecoderRegistry) -> NefResult<DecodedImage> {
        let photometric = self.photometric_interpretation.ok_or_else(|| {
            NefError::NotFound("tag 0x0106 (PhotometricInterpretation)".to_string())
        })?;
        decoder_registry
            .get(photometric)?
            .decode_strips(&self.data, self.width, self.height)
    }
}

/// Number of strips: `ceil(image_length / rows_per_strip)`.
pub(crate) fn strip_count(image_length: u32, rows_per_strip: u32) -> NefResult<usize> {
    if rows_per_strip == 0 {
        return Err(NefError::DirectoryCorrupt(
            "RowsPerStrip is zero".to_string(),
        ));
    }
    Ok(image_length.div_ceil(rows_per_strip) as usize)
}

/// Element `idx` of a `SHORT` or `LONG` array tag.
fn array_element(tag: &Tag, idx: usize) -> NefResult<u64> {
    let format = tag.format()?;
    let width = format.size();
    let payload = tag.bytes();
    let start = idx as u64 * width;
    let mut data = EndianAwareReader::new_at(
        payload.slice((start as usize).min(payload.len())..),
        tag.endianness(),
        u64::from(tag.offset()) + start,
    );
    match format {
        Format::Short => data.read_u16().map(u64::from),
        Format::Long => data.read_u32().map(u64::from),
        _ => Err(NefError::UnsupportedType(tag.type_code())),
    }
}

/// Byte ranges of the first `count` strips.
pub(crate) fn strip_ranges(
    offsets: &Tag,
    byte_counts: &Tag,
    count: usize,
) -> NefResult<Vec<Range<u64>>> {
    (0..count)
        .map(|idx| {
            let start = array_element(offsets, idx)?;
            let len = array_element(byte_counts, idx)?;
            Ok(start..start + len)
        })
        .collect()
}

/// Fetch every range and append them in order.
pub(crate) fn fetch_concatenated(
    reader: &dyn FileReader,
    ranges: Vec<Range<u64>>,
) -> NefResult<Bytes> {
    let mut buffers = reader.get_byte_ranges(ranges)?;
    if buffers.len() == 1 {
        return Ok(buffers.remove(0));
    }
    let mut out = BytesMut::with_capacity(buffers.iter().map(Bytes::len).sum());
    for buffer in buffers {
        out.extend_from_slice(&buffer);
    }
    Ok(out.freeze())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reader::Endianness;
    use crate::tiff::Family;

    fn array(id: u16, type_code: u16, count: u32, raw: &[u8]) -> Tag {
        Tag {
            id,
            type_code,
            count,
            offset: 0,
            raw: Bytes::copy_from_slice(raw),
            family: Family::Tiff,
            endianness: Endianness::BigEndian,
        }
    }

    #[test]
    fn test_strip_count() {
        assert_eq!(strip_count(5, 2).unwrap(), 3);
        assert_eq!(strip_count(4, 2).unwrap(), 2);
        assert_eq!(strip_count(1, 64).unwrap(), 1);
        assert!(matches!(
            strip_count(5, 0).unwrap_err(),
            NefError::DirectoryCorrupt(_)
        ));
    }

    #[test]
    #[rustfmt::skip]
    fn test_ranges_from_short_and_long() {
        let offsets = array(0x0111, 4, 3, &[0,0,0,100, 0,0,0,110, 0,0,0,120]);
        let counts = array(0x0117, 3, 3, &[0,10, 0,10, 0,4]);
        assert_eq!(
            strip_ranges(&offsets, &counts, 3).unwrap(),
            vec![100..110, 110..120, 120..124]
        );
    }

    #[test]
    #[rustfmt::skip]
    fn test_short_strip_array() {
        // one inline SHORT: the padding must not be read as a second element
        let offsets = array(0x0111, 3, 1, &[0,8, 0,9]);
        let counts = array(0x0117, 3, 1, &[0,4, 0,4]);
        assert_eq!(strip_ranges(&offsets, &counts, 1).unwrap(), vec![8..12]);
        assert!(matches!(
            strip_ranges(&offsets, &counts, 2).unwrap_err(),
            NefError::Truncated { .. }
        ));
    }

    #[test]
    fn test_rational_strip_array() {
        let offsets = array(0x0111, 5, 1, &[0, 0, 0, 1, 0, 0, 0, 1]);
        let counts = array(0x0117, 3, 1, &[0, 4, 0, 0]);
        assert!(matches!(
            strip_ranges(&offsets, &counts, 1).unwrap_err(),
            NefError::UnsupportedType(5)
        ));
    }

    #[test]
    fn test_concatenation_order() {
        let source = Bytes::from_static(b"0123456789");
        let joined = fetch_concatenated(&source, vec![6..8, 0..3]).unwrap();
        assert_eq!(&joined[..], b"67012");
        assert!(matches!(
            fetch_concatenated(&source, vec![0..2, 8..12]).unwrap_err(),
            NefError::Truncated { .. }
        ));
    }
}
