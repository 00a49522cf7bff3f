#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Order {
    Little,
    Big,
}

impl Order {
    pub(crate) fn opposite(self) -> Self {
        match self {
            Order::Little => Order::Big,
            Order::Big => Order::Little,
        }
    }
}

/// One IFD entry with its payload already encoded in the writer's byte order.
pub(crate) struct Entry {
    pub id: u16,
    pub type_code: u16,
    pub count: u32,
    pub payload: Vec<u8>,
}

/// Minimal TIFF writer: header, data blobs and IFDs appended in call order.
pub(crate) struct TiffWriter {
    order: Order,
    buf: Vec<u8>,
}

impl TiffWriter {
    pub(crate) fn new(order: Order) -> Self {
        let mut buf = match order {
            Order::Little => b"II*\0".to_vec(),
            Order::Big => b"MM\0*".to_vec(),
        };
        buf.extend_from_slice(&[0; 4]);
        Self { order, buf }
    }

    pub(crate) fn u16(&self, v: u16) -> [u8; 2] {
        match self.order {
            Order::Little => v.to_le_bytes(),
            Order::Big => v.to_be_bytes(),
        }
    }

    pub(crate) fn u32(&self, v: u32) -> [u8; 4] {
        match self.order {
            Order::Little => v.to_le_bytes(),
            Order::Big => v.to_be_bytes(),
        }
    }

    pub(crate) fn byte(&self, id: u16, values: &[u8]) -> Entry {
        Entry {
            id,
            type_code: 1,
            count: values.len() as u32,
            payload: values.to_vec(),
        }
    }

    pub(crate) fn ascii(&self, id: u16, text: &str) -> Entry {
        let mut payload = text.as_bytes().to_vec();
        payload.push(0);
        Entry {
            id,
            type_code: 2,
            count: payload.len() as u32,
            payload,
        }
    }

    pub(crate) fn short(&self, id: u16, values: &[u16]) -> Entry {
        Entry {
            id,
            type_code: 3,
            count: values.len() as u32,
            payload: values.iter().flat_map(|v| self.u16(*v)).collect(),
        }
    }

    pub(crate) fn long(&self, id: u16, values: &[u32]) -> Entry {
        Entry {
            id,
            type_code: 4,
            count: values.len() as u32,
            payload: values.iter().flat_map(|v| self.u32(*v)).collect(),
        }
    }

    pub(crate) fn rational(&self, id: u16, values: &[(u32, u32)]) -> Entry {
        Entry {
            id,
            type_code: 5,
            count: values.len() as u32,
            payload: values
                .iter()
                .flat_map(|(n, d)| self.u32(*n).into_iter().chain(self.u32(*d)))
                .collect(),
        }
    }

    pub(crate) fn undefined(&self, id: u16, data: &[u8]) -> Entry {
        Entry {
            id,
            type_code: 7,
            count: data.len() as u32,
            payload: data.to_vec(),
        }
    }

    /// Append a blob at the next even offset and return that offset.
    pub(crate) fn append(&mut self, data: &[u8]) -> u32 {
        if self.buf.len() % 2 == 1 {
            self.buf.push(0);
        }
        let offset = self.buf.len() as u32;
        self.buf.extend_from_slice(data);
        offset
    }

    /// Write external payloads, then the IFD itself. Entries are written in the given order.
    pub(crate) fn write_ifd(&mut self, entries: &[Entry], next: u32) -> u32 {
        let mut values = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.payload.len() <= 4 {
                let mut inline = [0u8; 4];
                inline[..entry.payload.len()].copy_from_slice(&entry.payload);
                values.push(inline);
            } else {
                let offset = self.append(&entry.payload);
                values.push(self.u32(offset));
            }
        }

        let start = self.append(&[]);
        let count = self.u16(entries.len() as u16);
        self.buf.extend_from_slice(&count);
        for (entry, value) in entries.iter().zip(values) {
            let id = self.u16(entry.id);
            let type_code = self.u16(entry.type_code);
            let entry_count = self.u32(entry.count);
            self.buf.extend_from_slice(&id);
            self.buf.extend_from_slice(&type_code);
            self.buf.extend_from_slice(&entry_count);
            self.buf.extend_from_slice(&value);
        }
        let next = self.u32(next);
        self.buf.extend_from_slice(&next);
        start
    }

    pub(crate) fn set_first_ifd(&mut self, offset: u32) {
        let bytes = self.u32(offset);
        self.buf[4..8].copy_from_slice(&bytes);
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// A file with a single root IFD whose entries come from `build`.
pub(crate) fn single_ifd(order: Order, build: impl FnOnce(&mut TiffWriter) -> Vec<Entry>) -> Vec<u8> {
    let mut w = TiffWriter::new(order);
    let entries = build(&mut w);
    let root = w.write_ifd(&entries, 0);
    w.set_first_ifd(root);
    w.finish()
}

/// A Nikon MakerNote payload: the 10-byte preamble, then a complete TIFF in `order`.
pub(crate) fn maker_note(order: Order) -> Vec<u8> {
    let mut note = TiffWriter::new(order);
    let entries = vec![
        note.undefined(0x0001, b"0211"),
        note.short(0x0002, &[0, 200]),
        note.rational(0x0084, &[(180, 10), (550, 10), (35, 10), (56, 10)]),
    ];
    let ifd = note.write_ifd(&entries, 0);
    note.set_first_ifd(ifd);

    let mut payload = b"Nikon\0\x02\x10\0\0".to_vec();
    payload.extend(note.finish());
    payload
}

/// An 8x8 RGB JPEG.
pub(crate) fn jpeg_blob() -> Vec<u8> {
    let pixels: Vec<u8> = (0..64u8).flat_map(|i| [i * 4, 128, 255 - i * 4]).collect();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 90)
        .encode(&pixels, 8, 8, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Pixel values of the striped gray image in root 0.
pub(crate) const GRAY_PIXELS: [u8; 10] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];

/// A NEF-shaped file with two root IFDs.
///
/// Root 0: 2x5 gray image in three strips stored out of order, EXIF with a Nikon MakerNote in the
/// opposite byte order, GPS, and two sub-IFDs (an embedded JPEG and a 2x1 RGB image).
/// Root 1: 2x2 color filter array image.
pub(crate) fn sample_nef(order: Order, jpeg: &[u8]) -> Vec<u8> {
    let mut w = TiffWriter::new(order);

    let gps_entries = vec![w.byte(0x0000, &[2, 3, 0, 0])];
    let gps = w.write_ifd(&gps_entries, 0);

    let note = maker_note(order.opposite());
    let exif_entries = vec![
        w.rational(0x829a, &[(1, 250)]),
        w.ascii(0x9003, "2021:07:04 18:30:05"),
        w.undefined(0x927c, &note),
        w.undefined(0x9286, b"ASCII\0\0\0Holiday   "),
    ];
    let exif = w.write_ifd(&exif_entries, 0);

    let strip2 = w.append(&GRAY_PIXELS[8..]);
    let strip0 = w.append(&GRAY_PIXELS[..4]);
    let strip1 = w.append(&GRAY_PIXELS[4..8]);

    let jpeg_offset = w.append(jpeg);
    let sub0_entries = vec![
        w.long(0x00fe, &[1]),
        w.long(0x0201, &[jpeg_offset]),
        w.long(0x0202, &[jpeg.len() as u32]),
    ];
    let sub0 = w.write_ifd(&sub0_entries, 0);

    let rgb = w.append(&[10, 20, 30, 40, 50, 60]);
    let sub1_entries = vec![
        w.short(0x0100, &[2]),
        w.short(0x0101, &[1]),
        w.short(0x0106, &[2]),
        w.long(0x0111, &[rgb]),
        w.short(0x0115, &[3]),
        w.short(0x0116, &[1]),
        w.long(0x0117, &[6]),
    ];
    let sub1 = w.write_ifd(&sub1_entries, 0);

    let cfa = w.append(&[1, 2, 3, 4]);
    let root1_entries = vec![
        w.short(0x0100, &[2]),
        w.short(0x0101, &[2]),
        w.short(0x0106, &[32803]),
        w.long(0x0111, &[cfa]),
        w.short(0x0116, &[2]),
        w.short(0x0117, &[4]),
    ];
    let root1 = w.write_ifd(&root1_entries, 0);

    let root0_entries = vec![
        w.long(0x00fe, &[0]),
        w.short(0x0100, &[2]),
        w.short(0x0101, &[5]),
        w.short(0x0103, &[1]),
        w.short(0x0106, &[1]),
        w.ascii(0x010f, "NIKON CORPORATION"),
        w.long(0x0111, &[strip0, strip1, strip2]),
        w.short(0x0116, &[2]),
        w.short(0x0117, &[4, 4, 2]),
        w.long(0x014a, &[sub0, sub1]),
        w.long(0x8769, &[exif]),
        w.long(0x8825, &[gps]),
    ];
    let root0 = w.write_ifd(&root0_entries, root1);
    w.set_first_ifd(root0);
    w.finish()
}
