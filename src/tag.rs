//! A single decoded IFD entry.

use bytes::Bytes;
use chrono::NaiveDateTime;

use crate::codec::{self, Value};
use crate::error::{NefError, NefResult};
use crate::reader::Endianness;
use crate::tiff::tags::ids;
use crate::tiff::{Family, Format};

const DATE_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// One IFD entry together with its payload bytes.
///
/// Tags are immutable once read. The payload is a [`Bytes`] view: for payloads of at most four
/// bytes it is the entry's own value field, otherwise a slice of the file buffer at the (rebased)
/// offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub(crate) id: u16,
    pub(crate) type_code: u16,
    pub(crate) count: u32,
    pub(crate) offset: u32,
    pub(crate) raw: Bytes,
    pub(crate) family: Family,
    pub(crate) endianness: Endianness,
}

impl Tag {
    /// Tag identifier.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Field type, or [`NefError::UnsupportedType`] for a type code outside the twelve TIFF
    /// types.
    pub fn format(&self) -> NefResult<Format> {
        Format::from_u16(self.type_code).ok_or(NefError::UnsupportedType(self.type_code))
    }

    /// The type code exactly as stored in the entry.
    pub fn type_code(&self) -> u16 {
        self.type_code
    }

    /// Number of elements.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The entry's 32-bit value field as stored, before rebasing. For external payloads this is
    /// the payload offset.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Payload size in bytes. Zero for unknown type codes.
    pub fn size(&self) -> u64 {
        Format::from_u16(self.type_code)
            .map(|format| format.size() * u64::from(self.count))
            .unwrap_or(0)
    }

    /// Which directory this tag was read from.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Short origin name of the tag's family.
    pub fn origin(&self) -> &'static str {
        self.family.origin()
    }

    /// Byte order the payload is encoded in.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Raw payload bytes.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Payload bytes limited to [`size`][Self::size]. Inline payloads are padded to four bytes
    /// on disk; this drops the padding.
    pub fn bytes(&self) -> Bytes {
        let len = (self.size() as usize).min(self.raw.len());
        self.raw.slice(..len)
    }

    /// Printable values, one string per element.
    pub fn values(&self) -> NefResult<Vec<String>> {
        codec::values(self)
    }

    /// Every element decoded to a typed [`Value`].
    pub fn decoded(&self) -> NefResult<Vec<Value>> {
        codec::decode_elements(self)
    }

    /// First element as an unsigned integer. Only `BYTE`, `SHORT` and `LONG` fields qualify.
    pub fn uint(&self) -> NefResult<u32> {
        match codec::decode_first(self)? {
            Value::Byte(v) => Ok(v.into()),
            Value::Short(v) => Ok(v.into()),
            Value::Unsigned(v) => Ok(v),
            _ => Err(NefError::UnsupportedType(self.type_code)),
        }
    }

    /// First element as a signed integer. Only `SBYTE`, `SSHORT` and `SLONG` fields qualify.
    pub fn int(&self) -> NefResult<i32> {
        match codec::decode_first(self)? {
            Value::SignedByte(v) => Ok(v.into()),
            Value::SignedShort(v) => Ok(v.into()),
            Value::Signed(v) => Ok(v),
            _ => Err(NefError::UnsupportedType(self.type_code)),
        }
    }

    /// First element as a float. Rationals are divided out.
    pub fn float(&self) -> NefResult<f64> {
        match codec::decode_first(self)? {
            Value::Float(v) => Ok(v.into()),
            Value::Double(v) => Ok(v),
            Value::Rational(n, d) => Ok(f64::from(n) / f64::from(d)),
            Value::SRational(n, d) => Ok(f64::from(n) / f64::from(d)),
            _ => Err(NefError::UnsupportedType(self.type_code)),
        }
    }

    /// Text content of an `ASCII` field, or of an XMP packet or user comment.
    pub fn string(&self) -> NefResult<String> {
        if codec::is_text_packet(self.id) {
            return Ok(codec::trim_text_packet(&self.raw));
        }
        match codec::decode_first(self)? {
            Value::Ascii(text) => Ok(text),
            _ => Err(NefError::UnsupportedType(self.type_code)),
        }
    }

    /// Parse an EXIF `YYYY:MM:DD HH:MM:SS` timestamp. `None` if the tag is not text or does not
    /// match that layout.
    pub fn date_time(&self) -> Option<NaiveDateTime> {
        let text = self.string().ok()?;
        NaiveDateTime::parse_from_str(&text, DATE_TIME_FORMAT).ok()
    }

    /// Whether the tag points at another directory rather than carrying data.
    pub fn is_pointer(&self) -> bool {
        matches!(
            self.id,
            ids::GPS_VERSION_ID | ids::EXIF_IFD | ids::SUB_IFDS | ids::MAKER_NOTE | ids::GPS_IFD
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn tag(id: u16, type_code: u16, count: u32, raw: &[u8]) -> Tag {
        Tag {
            id,
            type_code,
            count,
            offset: 0,
            raw: Bytes::copy_from_slice(raw),
            family: Family::Exif,
            endianness: Endianness::LittleEndian,
        }
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(tag(0x0100, 3, 1, &[0x10, 0x0f, 0, 0]).uint().unwrap(), 3856);
        assert_eq!(tag(0x0100, 4, 1, &[1, 0, 1, 0]).uint().unwrap(), 65537);
        assert_eq!(tag(0x9204, 8, 1, &[0xfd, 0xff, 0, 0]).int().unwrap(), -3);
        assert_eq!(
            tag(0x829d, 5, 1, &[28, 0, 0, 0, 10, 0, 0, 0]).float().unwrap(),
            2.8
        );
    }

    #[test]
    fn test_accessors_reject_wrong_format() {
        let short = tag(0x0100, 3, 1, &[1, 0, 0, 0]);
        assert!(matches!(
            short.int().unwrap_err(),
            NefError::UnsupportedType(3)
        ));
        assert!(matches!(
            short.float().unwrap_err(),
            NefError::UnsupportedType(3)
        ));
        let signed = tag(0x9204, 9, 1, &[1, 0, 0, 0]);
        assert!(matches!(
            signed.uint().unwrap_err(),
            NefError::UnsupportedType(9)
        ));
        let unknown = tag(0x014a, 13, 1, &[8, 0, 0, 0]);
        assert_eq!(unknown.size(), 0);
        assert!(matches!(
            unknown.format().unwrap_err(),
            NefError::UnsupportedType(13)
        ));
    }

    #[test]
    fn test_decoded_elements() {
        let t = tag(0x0117, 3, 2, &[4, 0, 2, 0]);
        assert_eq!(t.decoded().unwrap(), vec![Value::Short(4), Value::Short(2)]);
        let rational = tag(0x829a, 5, 1, &[1, 0, 0, 0, 250, 0, 0, 0]);
        assert_eq!(rational.decoded().unwrap(), vec![Value::Rational(1, 250)]);
        assert!(matches!(
            tag(0x927c, 7, 4, b"0211").decoded().unwrap_err(),
            NefError::UnsupportedType(7)
        ));
    }

    #[test]
    fn test_date_time() {
        let t = tag(0x9003, 2, 20, b"2021:07:04 18:30:05\0");
        let stamp = t.date_time().unwrap();
        assert_eq!((stamp.year(), stamp.month(), stamp.day()), (2021, 7, 4));
        assert_eq!(
            (stamp.hour(), stamp.minute(), stamp.second()),
            (18, 30, 5)
        );
        assert_eq!(tag(0x9003, 2, 5, b"soon\0").date_time(), None);
        assert_eq!(tag(0x9003, 3, 1, &[1, 0, 0, 0]).date_time(), None);
    }

    #[test]
    fn test_bytes_drop_inline_padding() {
        let t = tag(0x0102, 3, 1, &[8, 0, 0, 0]);
        assert_eq!(&t.bytes()[..], &[8u8, 0]);
        assert_eq!(t.raw().len(), 4);
    }

    #[test]
    fn test_pointer_ids() {
        for id in [0x0, 0x8769, 0x014a, 0x927c, 0x8825] {
            assert!(tag(id, 4, 1, &[0; 4]).is_pointer());
        }
        assert!(!tag(0x0111, 4, 1, &[0; 4]).is_pointer());
        assert_eq!(tag(0x0111, 4, 1, &[0; 4]).origin(), "exif");
    }
}
