/// Options controlling how much of a file is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Upper bound on the number of root IFDs followed along the chain. Further roots are
    /// ignored with a warning.
    pub max_root_directories: usize,
    /// Decode the Nikon MakerNote referenced from the EXIF IFD.
    pub read_maker_note: bool,
    /// Decode the sibling IFDs listed in the `SubIFDs` tag.
    pub read_sub_ifds: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_root_directories: 64,
            read_maker_note: true,
            read_sub_ifds: true,
        }
    }
}
