//! Human-readable names and value interpreters for tags.
//!
//! The decoder never consults this module. A [`TagDictionary`] maps `(Family, id)` to a
//! [`TagDescriptor`] holding a display name and a transform that renders the tag's values. The
//! [`Default`] dictionary covers the TIFF, EXIF, GPS and Nikon MakerNote tags commonly found in
//! NEF files, and callers can register their own entries on top.
//!
//! ```
//! use nef_decoder::dictionary::{TagDescriptor, TagDictionary};
//! use nef_decoder::tiff::Family;
//!
//! let mut dictionary = TagDictionary::default();
//! assert_eq!(dictionary.name(Family::Tiff, 0x0112), Some("Orientation"));
//! dictionary
//!     .register(Family::MakerNote, 0x00bf, TagDescriptor::new("PixelShift"))
//!     .unwrap();
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::error::{NefError, NefResult};
use crate::tag::Tag;
use crate::tiff::Family;

/// Renders a tag's values for display.
pub type Transform = fn(&Tag) -> NefResult<String>;

/// Name and value interpreter of one tag.
#[derive(Clone, Copy)]
pub struct TagDescriptor {
    /// Display name.
    pub name: &'static str,
    /// Renders the tag's values.
    pub transform: Transform,
}

impl fmt::Debug for TagDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl TagDescriptor {
    /// A descriptor that renders values joined with `", "`.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            transform: join_values,
        }
    }

    /// A descriptor with a custom transform.
    pub const fn with_transform(name: &'static str, transform: Transform) -> Self {
        Self { name, transform }
    }

    /// Apply the transform.
    pub fn render(&self, tag: &Tag) -> NefResult<String> {
        (self.transform)(tag)
    }
}

/// The registry of tag descriptors, keyed by family and id.
#[derive(Debug, Clone)]
pub struct TagDictionary(HashMap<(Family, u16), TagDescriptor>);

impl TagDictionary {
    /// Create a new, empty `TagDictionary`
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Register a descriptor. Fails if `(family, id)` already has one.
    pub fn register(
        &mut self,
        family: Family,
        id: u16,
        descriptor: TagDescriptor,
    ) -> NefResult<()> {
        if let Some(existing) = self.0.get(&(family, id)) {
            return Err(NefError::DuplicateTag(format!(
                "{family} tag {id:#06x} is already registered as {}",
                existing.name
            )));
        }
        self.0.insert((family, id), descriptor);
        Ok(())
    }

    /// Register a descriptor, returning the one it replaces.
    pub fn replace(
        &mut self,
        family: Family,
        id: u16,
        descriptor: TagDescriptor,
    ) -> Option<TagDescriptor> {
        self.0.insert((family, id), descriptor)
    }

    /// Look up the descriptor for `(family, id)`.
    pub fn get(&self, family: Family, id: u16) -> Option<&TagDescriptor> {
        self.0.get(&(family, id))
    }

    /// Look up the descriptor of a decoded tag.
    pub fn describe(&self, tag: &Tag) -> Option<&TagDescriptor> {
        self.get(tag.family(), tag.id())
    }

    /// Display name for `(family, id)`.
    pub fn name(&self, family: Family, id: u16) -> Option<&'static str> {
        self.get(family, id).map(|descriptor| descriptor.name)
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn register_all(&mut self, family: Family, table: &[(u16, TagDescriptor)]) {
        for &(id, descriptor) in table {
            self.0.insert((family, id), descriptor);
        }
    }
}

impl Default for TagDictionary {
    fn default() -> Self {
        let mut dictionary = Self::new();
        dictionary.register_all(Family::Tiff, TIFF_TAGS);
        dictionary.register_all(Family::Exif, EXIF_TAGS);
        dictionary.register_all(Family::Gps, GPS_TAGS);
        dictionary.register_all(Family::MakerNote, MAKER_NOTE_TAGS);
        dictionary
    }
}

/// Values joined with `", "`; empty for a tag without values.
pub fn join_values(tag: &Tag) -> NefResult<String> {
    Ok(tag.values()?.join(", "))
}

fn enumerated(tag: &Tag, names: &[(u32, &str)]) -> NefResult<String> {
    let value = tag.uint()?;
    Ok(names
        .iter()
        .find(|(code, _)| *code == value)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("other ({value})")))
}

fn subfile_type(tag: &Tag) -> NefResult<String> {
    enumerated(
        tag,
        &[(0, "full resolution image"), (1, "reduced resolution image")],
    )
}

fn image_pixels(tag: &Tag) -> NefResult<String> {
    Ok(format!("{}px", tag.uint()?))
}

fn compression(tag: &Tag) -> NefResult<String> {
    enumerated(
        tag,
        &[(1, "uncompressed"), (6, "jpeg"), (34713, "nikon nef compressed")],
    )
}

fn photometric_interpretation(tag: &Tag) -> NefResult<String> {
    enumerated(
        tag,
        &[
            (0, "white"),
            (1, "black"),
            (2, "rgb"),
            (3, "palette"),
            (4, "mask"),
            (5, "cmyk"),
            (6, "ycbcr"),
            (32803, "color array"),
        ],
    )
}

fn orientation(tag: &Tag) -> NefResult<String> {
    enumerated(
        tag,
        &[
            (1, "horizontal"),
            (2, "mirror horizontal"),
            (3, "rotate 180°"),
            (4, "mirror vertical"),
            (5, "mirror horizontal + rotate 270° CW"),
            (6, "rotate 90°"),
            (7, "mirror horizontal + rotate 90° CW"),
            (8, "rotate 270° CW"),
        ],
    )
}

fn planar_configuration(tag: &Tag) -> NefResult<String> {
    enumerated(tag, &[(1, "chunky"), (2, "planar")])
}

fn resolution_unit(tag: &Tag) -> NefResult<String> {
    enumerated(tag, &[(1, "none"), (2, "inch"), (3, "cm")])
}

fn ycbcr_positioning(tag: &Tag) -> NefResult<String> {
    enumerated(tag, &[(1, "centered"), (2, "co-sited")])
}

fn user_comment(tag: &Tag) -> NefResult<String> {
    let text = tag.string()?;
    Ok(text
        .strip_prefix("ASCII")
        .map(|rest| rest.trim_start_matches('\0'))
        .unwrap_or(&text)
        .to_string())
}

fn maker_note(tag: &Tag) -> NefResult<String> {
    let raw = tag.raw();
    if raw.len() < 8 {
        return join_values(tag);
    }
    let maker = String::from_utf8_lossy(&raw[..6]);
    Ok(format!(
        "{} 0x{:02x}{:02x}",
        maker.trim_end_matches('\0'),
        raw[6],
        raw[7]
    ))
}

fn gps_version(tag: &Tag) -> NefResult<String> {
    Ok(tag.values()?.join("."))
}

fn maker_note_version(tag: &Tag) -> NefResult<String> {
    let hex: String = tag.bytes().iter().map(|b| format!("{b:02x}")).collect();
    Ok(format!("0x{hex:0>8}"))
}

fn lens_type(tag: &Tag) -> NefResult<String> {
    let value = tag.uint()?;
    let name = match value.count_ones() {
        0 => "MF",
        1 => "D",
        2 => "G",
        3 => "VR",
        4 => "1",
        5 => "FT-1",
        6 => "E",
        7 => "AF-P",
        _ => return Ok(format!("other ({value})")),
    };
    Ok(name.to_string())
}

fn flash_mode(tag: &Tag) -> NefResult<String> {
    enumerated(
        tag,
        &[
            (0, "Did Not Fire"),
            (1, "Fired, Manual"),
            (3, "Not Ready"),
            (7, "Fired, External"),
            (8, "Fired, Commander Mode"),
            (9, "Fired, TTL Mode"),
        ],
    )
}

fn nef_compression(tag: &Tag) -> NefResult<String> {
    enumerated(
        tag,
        &[
            (1, "lossy (type 1)"),
            (2, "uncompressed"),
            (3, "lossless"),
            (4, "lossy (type 2)"),
            (5, "striped packed 12 bits"),
            (6, "uncompressed (reduced to 12 bit)"),
            (7, "unpacked 12 bits"),
            (8, "small"),
            (9, "packed 12 bits"),
            (10, "packed 14 bits"),
        ],
    )
}

const TIFF_TAGS: &[(u16, TagDescriptor)] = &[
    (0x00fe, TagDescriptor::with_transform("NewSubfileType", subfile_type)),
    (0x0100, TagDescriptor::with_transform("ImageWidth", image_pixels)),
    (0x0101, TagDescriptor::with_transform("ImageLength", image_pixels)),
    (0x0102, TagDescriptor::new("BitsPerSample")),
    (0x0103, TagDescriptor::with_transform("Compression", compression)),
    (
        0x0106,
        TagDescriptor::with_transform("PhotometricInterpretation", photometric_interpretation),
    ),
    (0x010f, TagDescriptor::new("Make")),
    (0x0110, TagDescriptor::new("Model")),
    (0x0111, TagDescriptor::new("StripOffsets")),
    (0x0112, TagDescriptor::with_transform("Orientation", orientation)),
    (0x0115, TagDescriptor::new("SamplesPerPixel")),
    (0x0116, TagDescriptor::new("RowsPerStrip")),
    (0x0117, TagDescriptor::new("StripByteCounts")),
    (0x011a, TagDescriptor::new("XResolution")),
    (0x011b, TagDescriptor::new("YResolution")),
    (
        0x011c,
        TagDescriptor::with_transform("PlanarConfiguration", planar_configuration),
    ),
    (0x0128, TagDescriptor::with_transform("ResolutionUnit", resolution_unit)),
    (0x0131, TagDescriptor::new("Software")),
    (0x0132, TagDescriptor::new("DateTime")),
    (0x013b, TagDescriptor::new("Artist")),
    (0x014a, TagDescriptor::new("SubIFDs")),
    (0x0201, TagDescriptor::new("JpgFromRawStart")),
    (0x0202, TagDescriptor::new("JpgFromRawLength")),
    (0x0213, TagDescriptor::with_transform("YCbCrPositioning", ycbcr_positioning)),
    (0x0214, TagDescriptor::new("ReferenceBlackWhite")),
    (0x02bc, TagDescriptor::new("XMP")),
    (0x828d, TagDescriptor::new("CFARepeatPatternDim")),
    (0x828e, TagDescriptor::new("CFAPattern")),
    (0x8298, TagDescriptor::new("Copyright")),
    (0x8769, TagDescriptor::new("ExifIFD")),
    (0x8825, TagDescriptor::new("GPSIFD")),
    (0x9003, TagDescriptor::new("DateTimeOriginal")),
    (0x9216, TagDescriptor::new("TIFF-EPStandardID")),
    (0x9217, TagDescriptor::new("SensingMethod")),
];

const EXIF_TAGS: &[(u16, TagDescriptor)] = &[
    (0x829a, TagDescriptor::new("ExposureTime")),
    (0x829d, TagDescriptor::new("FNumber")),
    (0x8822, TagDescriptor::new("ExposureProgram")),
    (0x8827, TagDescriptor::new("ISO")),
    (0x8830, TagDescriptor::new("SensitivityType")),
    (0x9003, TagDescriptor::new("DateTimeOriginal")),
    (0x9004, TagDescriptor::new("CreateDate")),
    (0x9204, TagDescriptor::new("ExposureCompensation")),
    (0x9205, TagDescriptor::new("MaxApertureValue")),
    (0x9207, TagDescriptor::new("MeteringMode")),
    (0x9208, TagDescriptor::new("LightSource")),
    (0x9209, TagDescriptor::new("Flash")),
    (0x920a, TagDescriptor::new("FocalLength")),
    (0x927c, TagDescriptor::with_transform("MakerNote", maker_note)),
    (0x9286, TagDescriptor::with_transform("UserComment", user_comment)),
    (0x9290, TagDescriptor::new("SubSecTime")),
    (0x9291, TagDescriptor::new("SubSecTimeOriginal")),
    (0x9292, TagDescriptor::new("SubSecTimeDigitized")),
    (0xa217, TagDescriptor::new("SensingMethod")),
    (0xa300, TagDescriptor::new("FileSource")),
    (0xa301, TagDescriptor::new("SceneType")),
    (0xa302, TagDescriptor::new("CFAPattern")),
    (0xa401, TagDescriptor::new("CustomRendered")),
    (0xa402, TagDescriptor::new("ExposureMode")),
    (0xa403, TagDescriptor::new("WhiteBalance")),
    (0xa404, TagDescriptor::new("DigitalZoomRatio")),
    (0xa405, TagDescriptor::new("FocalLengthIn35mmFormat")),
    (0xa406, TagDescriptor::new("SceneCaptureType")),
    (0xa407, TagDescriptor::new("GainControl")),
    (0xa408, TagDescriptor::new("Contrast")),
    (0xa409, TagDescriptor::new("Saturation")),
    (0xa40a, TagDescriptor::new("Sharpness")),
    (0xa40c, TagDescriptor::new("SubjectDistanceRange")),
];

const GPS_TAGS: &[(u16, TagDescriptor)] = &[(
    0x0000,
    TagDescriptor::with_transform("GPSVersionID", gps_version),
)];

const MAKER_NOTE_TAGS: &[(u16, TagDescriptor)] = &[
    (0x0001, TagDescriptor::with_transform("MakerNoteVersion", maker_note_version)),
    (0x0002, TagDescriptor::new("ISO")),
    (0x0004, TagDescriptor::new("Quality")),
    (0x0005, TagDescriptor::new("WhiteBalance")),
    (0x0007, TagDescriptor::new("FocusMode")),
    (0x0008, TagDescriptor::new("FlashSetting")),
    (0x0009, TagDescriptor::new("FlashType")),
    (0x000b, TagDescriptor::new("WhiteBalanceFineTune")),
    (0x000c, TagDescriptor::new("WB_RBLevels")),
    (0x000d, TagDescriptor::new("ProgramShift")),
    (0x000e, TagDescriptor::new("ExposureDifference")),
    (0x0011, TagDescriptor::new("PreviewIFD")),
    (0x0013, TagDescriptor::new("ISOSetting")),
    (0x0017, TagDescriptor::new("ExternalFlashExposureComp")),
    (0x0018, TagDescriptor::new("FlashExposureBracketValue")),
    (0x0019, TagDescriptor::new("ExposureBracketValue")),
    (0x001b, TagDescriptor::new("CropHiSpeed")),
    (0x001c, TagDescriptor::new("ExposureTuning")),
    (0x001d, TagDescriptor::new("SerialNumber")),
    (0x001e, TagDescriptor::new("ColorSpace")),
    (0x001f, TagDescriptor::new("VRInfo")),
    (0x0022, TagDescriptor::new("ActiveD-Lighting")),
    (0x0023, TagDescriptor::new("PictureControlData")),
    (0x0024, TagDescriptor::new("WorldTime")),
    (0x0025, TagDescriptor::new("ISOInfo")),
    (0x002a, TagDescriptor::new("VignetteControl")),
    (0x002b, TagDescriptor::new("DistortInfo")),
    (0x002c, TagDescriptor::new("UnknownInfo")),
    (0x0032, TagDescriptor::new("UnknownInfo2")),
    (0x0083, TagDescriptor::with_transform("LensType", lens_type)),
    (0x0084, TagDescriptor::new("Lens")),
    (0x0087, TagDescriptor::with_transform("FlashMode", flash_mode)),
    (0x0089, TagDescriptor::new("ShootingMode")),
    (0x008a, TagDescriptor::new("AutoBracketRelease")),
    (0x008b, TagDescriptor::new("LensFStops")),
    (0x008c, TagDescriptor::new("ContrastCurve")),
    (0x0091, TagDescriptor::new("ShotInfo")),
    (0x0093, TagDescriptor::with_transform("NEFCompression", nef_compression)),
    (0x0095, TagDescriptor::new("NoiseReduction")),
    (0x0096, TagDescriptor::new("NEFLinearizationTable")),
    (0x0097, TagDescriptor::new("ColorBalance")),
    (0x0098, TagDescriptor::new("LensData")),
    (0x0099, TagDescriptor::new("RawImageCenter")),
    (0x009e, TagDescriptor::new("RetouchHistory")),
    (0x00a7, TagDescriptor::new("ShutterCount")),
    (0x00a8, TagDescriptor::new("FlashInfo")),
    (0x00b0, TagDescriptor::new("MultiExposure")),
    (0x00b1, TagDescriptor::new("HighISONoiseReduction")),
    (0x00b6, TagDescriptor::new("PowerUpTime")),
    (0x00b7, TagDescriptor::new("AFInfo2")),
    (0x00b8, TagDescriptor::new("FileInfo")),
    (0x00b9, TagDescriptor::new("AFTune")),
    (0x00bb, TagDescriptor::new("RetouchInfo")),
];
