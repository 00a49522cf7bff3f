//! Tag identifiers, field types and enumerated tag values found in NEF files.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Field type of an IFD entry.
///
/// The discriminant is the on-disk type code. Codes outside this set (for example the `IFD` type
/// 13) still decode structurally but have no value decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum Format {
    /// 8-bit unsigned integer
    Byte = 1,
    /// 8-bit byte that contains a 7-bit ASCII code; the last byte must be zero
    Ascii = 2,
    /// 16-bit unsigned integer
    Short = 3,
    /// 32-bit unsigned integer
    Long = 4,
    /// Fraction stored as two 32-bit unsigned integers
    Rational = 5,
    /// 8-bit signed integer
    SByte = 6,
    /// 8-bit byte that may contain anything, depending on the field
    Undefined = 7,
    /// 16-bit signed integer
    SShort = 8,
    /// 32-bit signed integer
    SLong = 9,
    /// Fraction stored as two 32-bit signed integers
    SRational = 10,
    /// 32-bit IEEE floating point
    Float = 11,
    /// 64-bit IEEE floating point
    Double = 12,
}

impl Format {
    /// Look up a type code. Returns `None` for codes without a decoder.
    pub fn from_u16(code: u16) -> Option<Self> {
        Self::try_from_primitive(code).ok()
    }

    /// Size in bytes of one element of this type.
    pub const fn size(&self) -> u64 {
        match self {
            Format::Byte | Format::Ascii | Format::SByte | Format::Undefined => 1,
            Format::Short | Format::SShort => 2,
            Format::Long | Format::SLong | Format::Float => 4,
            Format::Rational | Format::SRational | Format::Double => 8,
        }
    }

    /// Lower-case type name as used in TIFF documentation.
    pub const fn name(&self) -> &'static str {
        match self {
            Format::Byte => "byte",
            Format::Ascii => "ascii",
            Format::Short => "short",
            Format::Long => "long",
            Format::Rational => "rational",
            Format::SByte => "sbyte",
            Format::Undefined => "undefined",
            Format::SShort => "sshort",
            Format::SLong => "slong",
            Format::SRational => "srational",
            Format::Float => "float",
            Format::Double => "double",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The directory a tag was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    /// Root IFDs and sibling sub-IFDs.
    Tiff,
    /// The EXIF IFD referenced by tag `0x8769`.
    Exif,
    /// The GPS IFD referenced by tag `0x8825`.
    Gps,
    /// The Nikon MakerNote IFD embedded in the EXIF tag `0x927c`.
    MakerNote,
}

impl Family {
    /// Short origin name: `tiff`, `exif`, `gps` or `note`.
    pub const fn origin(&self) -> &'static str {
        match self {
            Family::Tiff => "tiff",
            Family::Exif => "exif",
            Family::Gps => "gps",
            Family::MakerNote => "note",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.origin())
    }
}

/// How raw samples map to color channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum PhotometricInterpretation {
    /// Gray, 0 is white.
    WhiteIsZero = 0,
    /// Gray, 0 is black.
    BlackIsZero = 1,
    /// Chunky RGB.
    RGB = 2,
    /// Indexed through a color map.
    RGBPalette = 3,
    /// Transparency mask.
    TransparencyMask = 4,
    /// Separated CMYK.
    CMYK = 5,
    /// Luma/chroma.
    YCbCr = 6,
    /// CIE L*a*b*.
    CIELab = 8,
    /// Bayer color filter array (TIFF/EP, used by Nikon raw IFDs).
    ColorFilterArray = 32803,
    /// Linear raw (DNG).
    LinearRaw = 34892,
}

impl PhotometricInterpretation {
    /// Look up a photometric code.
    pub fn from_u16(code: u16) -> Option<Self> {
        Self::try_from_primitive(code).ok()
    }
}

/// Tag ids the decoder itself depends on.
///
/// Everything else is carried through untouched; human-readable names live in
/// [`TagDictionary`][crate::dictionary::TagDictionary].
pub mod ids {
    /// GPSVersionID; also the id that marks a bare TIFF pointer.
    pub const GPS_VERSION_ID: u16 = 0x0000;
    /// ImageWidth.
    pub const IMAGE_WIDTH: u16 = 0x0100;
    /// ImageLength.
    pub const IMAGE_LENGTH: u16 = 0x0101;
    /// PhotometricInterpretation.
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 0x0106;
    /// StripOffsets.
    pub const STRIP_OFFSETS: u16 = 0x0111;
    /// RowsPerStrip.
    pub const ROWS_PER_STRIP: u16 = 0x0116;
    /// StripByteCounts.
    pub const STRIP_BYTE_COUNTS: u16 = 0x0117;
    /// SubIFDs: array of sibling IFD offsets (previews, full-size raw).
    pub const SUB_IFDS: u16 = 0x014a;
    /// JPEGInterchangeFormat (JpgFromRawStart).
    pub const JPEG_FROM_RAW_START: u16 = 0x0201;
    /// JPEGInterchangeFormatLength (JpgFromRawLength).
    pub const JPEG_FROM_RAW_LENGTH: u16 = 0x0202;
    /// XMP packet.
    pub const XMP: u16 = 0x02bc;
    /// Pointer to the EXIF IFD.
    pub const EXIF_IFD: u16 = 0x8769;
    /// Pointer to the GPS IFD.
    pub const GPS_IFD: u16 = 0x8825;
    /// UserComment.
    pub const USER_COMMENT: u16 = 0x9286;
    /// MakerNote.
    pub const MAKER_NOTE: u16 = 0x927c;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_table() {
        let sizes: Vec<(u16, u64)> = (1..=12)
            .map(|code| {
                let format = Format::from_u16(code).unwrap();
                (u16::from(format), format.size())
            })
            .collect();
        assert_eq!(
            sizes,
            vec![
                (1, 1),
                (2, 1),
                (3, 2),
                (4, 4),
                (5, 8),
                (6, 1),
                (7, 1),
                (8, 2),
                (9, 4),
                (10, 8),
                (11, 4),
                (12, 8)
            ]
        );
        assert_eq!(Format::from_u16(0), None);
        assert_eq!(Format::from_u16(13), None);
        assert_eq!(Format::SRational.to_string(), "srational");
    }

    #[test]
    fn test_photometric_codes() {
        assert_eq!(
            PhotometricInterpretation::from_u16(32803),
            Some(PhotometricInterpretation::ColorFilterArray)
        );
        assert_eq!(PhotometricInterpretation::from_u16(7), None);
        assert_eq!(u16::from(PhotometricInterpretation::RGB), 2);
    }
}
