/// Pixel layout of a [`DecodedImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColorType {
    /// One 8-bit gray sample per pixel.
    Gray8,
    /// One 16-bit big-endian gray sample per pixel.
    Gray16,
    /// Three 8-bit samples per pixel.
    Rgb8,
    /// Four 8-bit samples per pixel, alpha last.
    Rgba8,
    /// Four 8-bit samples per pixel.
    Cmyk8,
}

impl ColorType {
    /// Number of bytes one pixel occupies.
    pub const fn bytes_per_pixel(&self) -> usize {
        match self {
            ColorType::Gray8 => 1,
            ColorType::Gray16 => 2,
            ColorType::Rgb8 => 3,
            ColorType::Rgba8 | ColorType::Cmyk8 => 4,
        }
    }
}

/// Result of a decoding process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) color_type: ColorType,
    pub(crate) data: Vec<u8>,
}

impl DecodedImage {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Layout of [`data`][Self::data].
    pub fn color_type(&self) -> ColorType {
        self.color_type
    }

    /// Row-major pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the pixel buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Bytes of the pixel at column `x`, row `y`; `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.color_type.bytes_per_pixel();
        let start = (y as usize * self.width as usize + x as usize) * bpp;
        self.data.get(start..start + bpp)
    }
}
