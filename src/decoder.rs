//! Pixel reconstruction for the image data of a directory.

use std::collections::HashMap;
use std::fmt::Debug;
use std::io::Cursor;

use bytes::Bytes;

use crate::error::{NefError, NefResult};
use crate::tiff::PhotometricInterpretation;
use crate::{ColorType, DecodedImage};

/// A registry of decoders.
///
/// This allows end users to register their own decoders, for photometric interpretations the
/// crate leaves unsupported (sensor CFA data, CMYK, ...), or override the default ones.
#[derive(Debug)]
pub struct DecoderRegistry(HashMap<PhotometricInterpretation, Box<dyn Decoder>>);

impl DecoderRegistry {
    /// Create a new decoder registry with no decoders registered
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Look up the decoder for a raw photometric code.
    pub fn get(&self, photometric_interpretation: u16) -> NefResult<&dyn Decoder> {
        PhotometricInterpretation::from_u16(photometric_interpretation)
            .and_then(|key| self.0.get(&key))
            .map(|decoder| decoder.as_ref())
            .ok_or(NefError::UnsupportedFormat(photometric_interpretation))
    }
}

impl AsRef<HashMap<PhotometricInterpretation, Box<dyn Decoder>>> for DecoderRegistry {
    fn as_ref(&self) -> &HashMap<PhotometricInterpretation, Box<dyn Decoder>> {
        &self.0
    }
}

impl AsMut<HashMap<PhotometricInterpretation, Box<dyn Decoder>>> for DecoderRegistry {
    fn as_mut(&mut self) -> &mut HashMap<PhotometricInterpretation, Box<dyn Decoder>> {
        &mut self.0
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        let mut registry = HashMap::with_capacity(3);
        registry.insert(
            PhotometricInterpretation::WhiteIsZero,
            Box::new(GrayDecoder { invert: true }) as _,
        );
        registry.insert(
            PhotometricInterpretation::BlackIsZero,
            Box::new(GrayDecoder { invert: false }) as _,
        );
        registry.insert(PhotometricInterpretation::RGB, Box::new(RGBDecoder) as _);
        Self(registry)
    }
}

/// A trait to turn uncompressed strip data into pixels.
pub trait Decoder: Debug + Send + Sync {
    /// Decode `width * height` pixels from the concatenated strips.
    fn decode_strips(&self, data: &[u8], width: u32, height: u32) -> NefResult<DecodedImage>;
}

/// 8-bit gray samples, optionally inverted.
#[derive(Debug, Clone)]
pub struct GrayDecoder {
    /// `true` when 0 is white.
    pub invert: bool,
}

impl Decoder for GrayDecoder {
    fn decode_strips(&self, data: &[u8], width: u32, height: u32) -> NefResult<DecodedImage> {
        let samples = require(data, width, height, 1)?;
        let data = if self.invert {
            samples.iter().map(|v| 255 - v).collect()
        } else {
            samples.to_vec()
        };
        Ok(DecodedImage {
            width,
            height,
            color_type: ColorType::Gray8,
            data,
        })
    }
}

/// Chunky 8-bit RGB, widened to RGBA with an opaque alpha channel.
#[derive(Debug, Clone)]
pub struct RGBDecoder;

impl Decoder for RGBDecoder {
    fn decode_strips(&self, data: &[u8], width: u32, height: u32) -> NefResult<DecodedImage> {
        let samples = require(data, width, height, 3)?;
        let mut data = Vec::with_capacity(samples.len() / 3 * 4);
        for rgb in samples.chunks_exact(3) {
            data.extend_from_slice(rgb);
            data.push(u8::MAX);
        }
        Ok(DecodedImage {
            width,
            height,
            color_type: ColorType::Rgba8,
            data,
        })
    }
}

/// The first `width * height * channels` bytes of `data`.
fn require(data: &[u8], width: u32, height: u32, channels: u64) -> NefResult<&[u8]> {
    let expected = u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|pixels| pixels.checked_mul(channels))
        .ok_or_else(|| {
            NefError::DirectoryCorrupt(format!(
                "{width}x{height} image with {channels} channels overflows"
            ))
        })?;
    if (data.len() as u64) < expected {
        return Err(NefError::truncated(0, expected, data.len() as u64));
    }
    Ok(&data[..expected as usize])
}

/// Decode a complete embedded JPEG stream.
pub(crate) fn decode_jpeg(data: Bytes) -> NefResult<DecodedImage> {
    let mut decoder = jpeg::Decoder::new(Cursor::new(data));
    let pixels = decoder.decode()?;
    let info = decoder
        .info()
        .ok_or_else(|| jpeg::Error::Format("missing frame header".to_string()))?;
    #[allow(unreachable_patterns)]
    let color_type = match info.pixel_format {
        jpeg::PixelFormat::L8 => ColorType::Gray8,
        jpeg::PixelFormat::L16 => ColorType::Gray16,
        jpeg::PixelFormat::RGB24 => ColorType::Rgb8,
        jpeg::PixelFormat::CMYK32 => ColorType::Cmyk8,
        other => {
            return Err(jpeg::Error::Format(format!("unsupported pixel format {other:?}")).into())
        }
    };
    Ok(DecodedImage {
        width: info.width.into(),
        height: info.height.into(),
        color_type,
        data: pixels,
    })
}
