//! TIFF building blocks shared by the NEF reader.

pub mod tags;

pub use tags::{Family, Format, PhotometricInterpretation};
