use crate::types::FrameType;
use byteorder::{ByteOrder, LittleEndian};

/// Clears the confidence bits in the top of each 16-bit field.
pub const TAU_PIXEL_CONFIDENCE_MASK: u16 = 0x3FFF;

/// Distances below this value are measurements, the rest are status codes.
pub const TAU_PIXEL_VALID_LIMIT: u16 = 16000;

pub const TAU_PIXEL_LOW_AMPLITUDE: u16 = 16001;
pub const TAU_PIXEL_ADC_OVERFLOW: u16 = 16002;
pub const TAU_PIXEL_SATURATION: u16 = 16003;
pub const TAU_PIXEL_INTERFERENCE: u16 = 16007;
pub const TAU_PIXEL_EDGE_DETECTED: u16 = 16008;

/// What a pixel's masked distance field means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelClass {
    /// A measured distance in millimeters.
    Valid(u16),
    LowAmplitude,
    AdcOverflow,
    Saturation,
    Interference,
    EdgeDetected,
}

impl PixelClass {
    /// `true` for a measured distance.
    #[inline]
    pub fn is_valid(self) -> bool {
        matches!(self, PixelClass::Valid(_))
    }

    /// Overflowed or saturated pixels are flagged in the saturation mask.
    #[inline]
    pub fn is_saturated(self) -> bool {
        matches!(self, PixelClass::AdcOverflow | PixelClass::Saturation)
    }
}

/// Classifies a masked distance.
///
/// Unnamed status codes are reported as `LowAmplitude`.
#[inline]
pub fn classify(distance: u16) -> PixelClass {
    match distance {
        d if d < TAU_PIXEL_VALID_LIMIT => PixelClass::Valid(d),
        TAU_PIXEL_ADC_OVERFLOW => PixelClass::AdcOverflow,
        TAU_PIXEL_SATURATION => PixelClass::Saturation,
        TAU_PIXEL_INTERFERENCE => PixelClass::Interference,
        TAU_PIXEL_EDGE_DETECTED => PixelClass::EdgeDetected,
        _ => PixelClass::LowAmplitude,
    }
}

/// One pixel record with confidence bits removed from the distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRecord {
    pub distance: u16,
    /// Grayscale or amplitude magnitude, 0 for distance-only records.
    pub intensity: u16,
}

/// Reads record `index` from a raw payload.
///
/// Layouts, little-endian:
/// * `Distance`: `[distance: u16]`
/// * `DistanceGrayscale`: `[grayscale: u8][distance: u16]`
/// * `DistanceAmplitude`: `[distance: u16][amplitude: u16]`
///
/// The caller guarantees `raw` holds at least `index + 1` records.
#[inline]
pub fn parse_pixel(raw: &[u8], index: usize, frame_type: FrameType) -> PixelRecord {
    let offset = index * frame_type.record_size();
    let record = &raw[offset..offset + frame_type.record_size()];
    match frame_type {
        FrameType::Distance => PixelRecord {
            distance: LittleEndian::read_u16(record) & TAU_PIXEL_CONFIDENCE_MASK,
            intensity: 0,
        },
        FrameType::DistanceGrayscale => PixelRecord {
            distance: LittleEndian::read_u16(&record[1..]) & TAU_PIXEL_CONFIDENCE_MASK,
            intensity: record[0] as u16,
        },
        FrameType::DistanceAmplitude => PixelRecord {
            distance: LittleEndian::read_u16(record) & TAU_PIXEL_CONFIDENCE_MASK,
            intensity: LittleEndian::read_u16(&record[2..]),
        },
    }
}
