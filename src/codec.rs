//! Type-directed decoding of tag payloads.
//!
//! Decoding is a closed dispatch over [`Format`]: every one of the twelve field types has exactly
//! one element reader, and adding a type means adding a variant. Directory traversal never calls
//! into this module; it only runs when a caller asks a [`Tag`] for its values.

use std::fmt;

use crate::error::{NefError, NefResult};
use crate::reader::EndianAwareReader;
use crate::tag::Tag;
use crate::tiff::tags::ids;
use crate::tiff::Format;

/// One decoded element of a tag payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Element of a `BYTE` field.
    Byte(u8),
    /// Element of a `SBYTE` field.
    SignedByte(i8),
    /// Element of a `SHORT` field.
    Short(u16),
    /// Element of a `SSHORT` field.
    SignedShort(i16),
    /// Element of a `LONG` field.
    Unsigned(u32),
    /// Element of a `SLONG` field.
    Signed(i32),
    /// Element of a `RATIONAL` field, kept as the literal numerator/denominator pair.
    Rational(u32, u32),
    /// Element of a `SRATIONAL` field.
    SRational(i32, i32),
    /// Element of a `FLOAT` field.
    Float(f32),
    /// Element of a `DOUBLE` field.
    Double(f64),
    /// The whole of an `ASCII` field, trailing NULs and surrounding whitespace removed.
    Ascii(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Byte(v) => write!(f, "{v}"),
            Value::SignedByte(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::SignedShort(v) => write!(f, "{v}"),
            Value::Unsigned(v) => write!(f, "{v}"),
            Value::Signed(v) => write!(f, "{v}"),
            Value::Rational(n, d) => write!(f, "{n}/{d}"),
            Value::SRational(n, d) => write!(f, "{n}/{d}"),
            // widen first so the shortest round-trip form of the f32 bits is printed in full
            Value::Float(v) => write!(f, "{}", f64::from(*v)),
            Value::Double(v) => write!(f, "{v}"),
            Value::Ascii(v) => f.write_str(v),
        }
    }
}

/// Tags whose payload is free text regardless of the declared type.
pub(crate) fn is_text_packet(id: u16) -> bool {
    id == ids::XMP || id == ids::USER_COMMENT
}

pub(crate) fn trim_text_packet(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}

fn decode_ascii(tag: &Tag) -> String {
    let raw = tag.raw();
    let len = (tag.size() as usize).min(raw.len());
    let mut text = &raw[..len];
    while let [rest @ .., 0] = text {
        text = rest;
    }
    String::from_utf8_lossy(text).trim().to_string()
}

/// Read one element of `format` from the reader.
fn read_element(data: &mut EndianAwareReader, format: Format) -> NefResult<Value> {
    Ok(match format {
        Format::Byte => Value::Byte(data.read_u8()?),
        Format::SByte => Value::SignedByte(data.read_i8()?),
        Format::Short => Value::Short(data.read_u16()?),
        Format::SShort => Value::SignedShort(data.read_i16()?),
        Format::Long => Value::Unsigned(data.read_u32()?),
        Format::SLong => Value::Signed(data.read_i32()?),
        Format::Rational => Value::Rational(data.read_u32()?, data.read_u32()?),
        Format::SRational => Value::SRational(data.read_i32()?, data.read_i32()?),
        Format::Float => Value::Float(data.read_f32()?),
        Format::Double => Value::Double(data.read_f64()?),
        Format::Ascii | Format::Undefined => {
            return Err(NefError::UnsupportedType(format.into()))
        }
    })
}

fn element_reader(tag: &Tag) -> EndianAwareReader {
    EndianAwareReader::new_at(tag.raw().clone(), tag.endianness(), u64::from(tag.offset()))
}

/// Decode every element of the tag's payload.
pub fn decode_elements(tag: &Tag) -> NefResult<Vec<Value>> {
    let format = tag.format()?;
    match format {
        Format::Ascii => Ok(vec![Value::Ascii(decode_ascii(tag))]),
        Format::Undefined => Err(NefError::UnsupportedType(tag.type_code())),
        format => {
            let mut data = element_reader(tag);
            let mut v = Vec::with_capacity(tag.count() as usize);
            for _ in 0..tag.count() {
                v.push(read_element(&mut data, format)?);
            }
            Ok(v)
        }
    }
}

/// Decode only the first element of the tag's payload.
pub fn decode_first(tag: &Tag) -> NefResult<Value> {
    let format = tag.format()?;
    match format {
        Format::Ascii => Ok(Value::Ascii(decode_ascii(tag))),
        Format::Undefined => Err(NefError::UnsupportedType(tag.type_code())),
        format => {
            if tag.count() == 0 {
                return Err(NefError::truncated(
                    u64::from(tag.offset()),
                    format.size(),
                    0,
                ));
            }
            read_element(&mut element_reader(tag), format)
        }
    }
}

/// Printable values of a tag, one string per element.
///
/// XMP packets and user comments are returned whole, as a single trimmed string.
pub fn values(tag: &Tag) -> NefResult<Vec<String>> {
    if is_text_packet(tag.id()) {
        return Ok(vec![trim_text_packet(tag.raw())]);
    }
    Ok(decode_elements(tag)?
        .iter()
        .map(ToString::to_string)
        .collect())
}

#[cfg(test)]
mod test {
    use bytes::Bytes;

    use super::*;
    use crate::reader::Endianness;
    use crate::tiff::Family;

    fn tag(id: u16, type_code: u16, count: u32, raw: &[u8], endianness: Endianness) -> Tag {
        Tag {
            id,
            type_code,
            count,
            offset: 0,
            raw: Bytes::copy_from_slice(raw),
            family: Family::Tiff,
            endianness,
        }
    }

    #[test]
    #[rustfmt::skip]
    fn test_values_per_format() {
        use Endianness::*;
        let cases: Vec<(u16, u32, Vec<u8>, Endianness, Vec<&str>)> = vec![
            //  type count raw                                          order         expected
            ( 1, 3, vec![1, 2, 255, 0],                               LittleEndian, vec!["1", "2", "255"]),
            ( 6, 2, vec![0xff, 0x80, 0, 0],                           LittleEndian, vec!["-1", "-128"]),
            ( 3, 2, vec![0x2a, 0, 0xff, 0xff],                        LittleEndian, vec!["42", "65535"]),
            ( 3, 2, vec![0, 0x2a, 0xff, 0xff],                        BigEndian,    vec!["42", "65535"]),
            ( 8, 2, vec![0xfe, 0xff, 0x2a, 0],                        LittleEndian, vec!["-2", "42"]),
            ( 4, 1, vec![0, 0, 1, 0],                                 BigEndian,    vec!["256"]),
            ( 9, 1, vec![0xff, 0xff, 0xff, 0xfe],                     BigEndian,    vec!["-2"]),
            ( 5, 1, vec![1, 0, 0, 0, 3, 0, 0, 0],                     LittleEndian, vec!["1/3"]),
            ( 5, 1, vec![0, 0, 0, 10, 0, 0, 0, 20],                   BigEndian,    vec!["10/20"]),
            (10, 1, vec![0xff, 0xff, 0xff, 0xfd, 0, 0, 0, 6],         BigEndian,    vec!["-3/6"]),
            (11, 1, 1.5f32.to_le_bytes().to_vec(),                    LittleEndian, vec!["1.5"]),
            (11, 1, 0.1f32.to_be_bytes().to_vec(),                    BigEndian,    vec!["0.10000000149011612"]),
            (12, 1, (-2.25f64).to_le_bytes().to_vec(),                LittleEndian, vec!["-2.25"]),
            ( 2, 6, b"NIKON\0".to_vec(),                              BigEndian,    vec!["NIKON"]),
            ( 2, 2, vec![b'A', 0, 0, 0],                              LittleEndian, vec!["A"]),
        ];
        for (type_code, count, raw, order, expected) in cases {
            let t = tag(0x0101, type_code, count, &raw, order);
            assert_eq!(values(&t).unwrap(), expected, "type {type_code} raw {raw:?}");
        }
    }

    #[test]
    fn test_rational_is_never_reduced() {
        let t = tag(
            0x829a,
            5,
            2,
            &[0, 0, 0, 1, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0, 8],
            Endianness::BigEndian,
        );
        assert_eq!(values(&t).unwrap(), vec!["1/3", "4/8"]);
    }

    #[test]
    fn test_text_packets_bypass_type() {
        let xmp = tag(
            ids::XMP,
            1,
            12,
            b"  <x:xmp/>\n\0",
            Endianness::LittleEndian,
        );
        assert_eq!(values(&xmp).unwrap(), vec!["<x:xmp/>"]);

        let comment = tag(
            ids::USER_COMMENT,
            7,
            15,
            b"ASCII\0\0\0hello ",
            Endianness::BigEndian,
        );
        assert_eq!(values(&comment).unwrap(), vec!["ASCII\0\0\0hello"]);
    }

    #[test]
    fn test_undefined_and_unknown_types() {
        let undefined = tag(0xa300, 7, 1, &[3, 0, 0, 0], Endianness::LittleEndian);
        assert!(matches!(
            values(&undefined).unwrap_err(),
            NefError::UnsupportedType(7)
        ));
        let ifd_type = tag(0x014a, 13, 1, &[8, 0, 0, 0], Endianness::LittleEndian);
        assert!(matches!(
            values(&ifd_type).unwrap_err(),
            NefError::UnsupportedType(13)
        ));
    }

    #[test]
    fn test_text_formats_are_not_elements() {
        let ascii = tag(0x010f, 2, 4, b"abc\0", Endianness::BigEndian);
        for format in [Format::Ascii, Format::Undefined] {
            assert!(matches!(
                read_element(&mut element_reader(&ascii), format).unwrap_err(),
                NefError::UnsupportedType(code) if code == u16::from(format)
            ));
        }
    }

    #[test]
    fn test_first_element_only() {
        let t = tag(
            0x0102,
            3,
            3,
            &[0, 12, 0, 14, 0, 16],
            Endianness::BigEndian,
        );
        assert_eq!(decode_first(&t).unwrap(), Value::Short(12));
        let empty = tag(0x0102, 3, 0, &[0, 0, 0, 0], Endianness::BigEndian);
        assert!(matches!(
            decode_first(&empty).unwrap_err(),
            NefError::Truncated { .. }
        ));
    }

    #[test]
    fn test_short_payload_is_truncated() {
        let t = tag(0x0111, 4, 3, &[0, 0, 0, 1, 0, 0, 0, 2], Endianness::BigEndian);
        assert!(matches!(
            values(&t).unwrap_err(),
            NefError::Truncated { .. }
        ));
    }
}
