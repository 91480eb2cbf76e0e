// Response frame layout

/// Start mark at byte 0 of every response frame.
pub const TAU_ANS_START_MARK: u8 = 0xFA;

/// Offset of the response type byte.
pub const TAU_ANS_INDEX_TYPE: usize = 1;

/// Offset of the little-endian `u16` payload length.
pub const TAU_ANS_INDEX_LENGTH: usize = 2;

/// Size of the response header (start mark, type, length).
pub const TAU_ANS_HEADER_SIZE: usize = 4;

/// Size of the trailing checksum.
pub const TAU_ANS_CHECKSUM_SIZE: usize = 4;

/// Header plus checksum: the bytes a response carries on top of its payload.
pub const TAU_ANS_OVERHEAD: usize = TAU_ANS_HEADER_SIZE + TAU_ANS_CHECKSUM_SIZE;

/// Size of the image header that precedes pixel data in acquisition responses.
pub const TAU_IMAGE_HEADER_SIZE: usize = 80;

// Response type codes

pub const TAU_ANS_TYPE_ACK: u8 = 0x00;
pub const TAU_ANS_TYPE_NACK: u8 = 0x01;
pub const TAU_ANS_TYPE_IDENTIFICATION: u8 = 0x02;
pub const TAU_ANS_TYPE_DISTANCE: u8 = 0x03;
pub const TAU_ANS_TYPE_AMPLITUDE: u8 = 0x04;
pub const TAU_ANS_TYPE_DISTANCE_AMPLITUDE: u8 = 0x05;
pub const TAU_ANS_TYPE_GRAYSCALE: u8 = 0x06;
pub const TAU_ANS_TYPE_DCS: u8 = 0x07;
pub const TAU_ANS_TYPE_DCS_DISTANCE_AMPLITUDE: u8 = 0x08;
pub const TAU_ANS_TYPE_INTEGRATION_TIME: u8 = 0x09;
pub const TAU_ANS_TYPE_DISTANCE_GRAYSCALE: u8 = 0x0A;
pub const TAU_ANS_TYPE_LENS_CALIBRATION_DATA: u8 = 0xF7;
pub const TAU_ANS_TYPE_TRACE: u8 = 0xF8;
pub const TAU_ANS_TYPE_PRODUCTION_INFO: u8 = 0xF9;
pub const TAU_ANS_TYPE_CALIBRATION_DATA: u8 = 0xFA;
pub const TAU_ANS_TYPE_REGISTER: u8 = 0xFB;
pub const TAU_ANS_TYPE_TEMPERATURE: u8 = 0xFC;
pub const TAU_ANS_TYPE_CHIP_INFORMATION: u8 = 0xFD;
pub const TAU_ANS_TYPE_FIRMWARE_RELEASE: u8 = 0xFE;
pub const TAU_ANS_TYPE_ERROR: u8 = 0xFF;

/// Decoded response type.
///
/// `Invalid` is not a wire code: it is the sentinel produced when no
/// well-formed response could be reassembled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResponseKind {
    Ack,
    Nack,
    Identification,
    Distance,
    Amplitude,
    DistanceAmplitude,
    Grayscale,
    Dcs,
    DcsDistanceAmplitude,
    IntegrationTime,
    DistanceGrayscale,
    LensCalibrationData,
    Trace,
    ProductionInfo,
    CalibrationData,
    Register,
    Temperature,
    ChipInformation,
    FirmwareRelease,
    DeviceError,
    Unknown(u8),
    Invalid,
}

impl From<u8> for ResponseKind {
    fn from(code: u8) -> ResponseKind {
        match code {
            TAU_ANS_TYPE_ACK => ResponseKind::Ack,
            TAU_ANS_TYPE_NACK => ResponseKind::Nack,
            TAU_ANS_TYPE_IDENTIFICATION => ResponseKind::Identification,
            TAU_ANS_TYPE_DISTANCE => ResponseKind::Distance,
            TAU_ANS_TYPE_AMPLITUDE => ResponseKind::Amplitude,
            TAU_ANS_TYPE_DISTANCE_AMPLITUDE => ResponseKind::DistanceAmplitude,
            TAU_ANS_TYPE_GRAYSCALE => ResponseKind::Grayscale,
            TAU_ANS_TYPE_DCS => ResponseKind::Dcs,
            TAU_ANS_TYPE_DCS_DISTANCE_AMPLITUDE => ResponseKind::DcsDistanceAmplitude,
            TAU_ANS_TYPE_INTEGRATION_TIME => ResponseKind::IntegrationTime,
            TAU_ANS_TYPE_DISTANCE_GRAYSCALE => ResponseKind::DistanceGrayscale,
            TAU_ANS_TYPE_LENS_CALIBRATION_DATA => ResponseKind::LensCalibrationData,
            TAU_ANS_TYPE_TRACE => ResponseKind::Trace,
            TAU_ANS_TYPE_PRODUCTION_INFO => ResponseKind::ProductionInfo,
            TAU_ANS_TYPE_CALIBRATION_DATA => ResponseKind::CalibrationData,
            TAU_ANS_TYPE_REGISTER => ResponseKind::Register,
            TAU_ANS_TYPE_TEMPERATURE => ResponseKind::Temperature,
            TAU_ANS_TYPE_CHIP_INFORMATION => ResponseKind::ChipInformation,
            TAU_ANS_TYPE_FIRMWARE_RELEASE => ResponseKind::FirmwareRelease,
            TAU_ANS_TYPE_ERROR => ResponseKind::DeviceError,
            other => ResponseKind::Unknown(other),
        }
    }
}

// Identification

/// Payload size of the identification response.
pub const TAU_IDENTIFICATION_DATA_SIZE: usize = 4;

/// Mask for the chip type in the (big-endian read) identification word.
pub const TAU_IDENTIFICATION_CHIP_TYPE_MASK: u32 = 0x00FF_FF00;

/// Shift for the chip type in the identification word.
pub const TAU_IDENTIFICATION_CHIP_TYPE_SHIFT: u32 = 8;

/// Mask for the chip version in the identification word.
pub const TAU_IDENTIFICATION_VERSION_MASK: u32 = 0x0000_00FF;

/// Lowest chip type accepted as a supported camera during discovery.
pub const TAU_MIN_SUPPORTED_CHIP_TYPE: u32 = 4;

// Chip information

/// Payload size of the chip information response.
pub const TAU_CHIP_INFORMATION_DATA_SIZE: usize = 4;

/// Payload offset of the little-endian chip id.
pub const TAU_CHIP_INFORMATION_INDEX_CHIP_ID: usize = 0;

/// Payload offset of the little-endian wafer id.
pub const TAU_CHIP_INFORMATION_INDEX_WAFER_ID: usize = 2;

// Firmware release

/// Payload size of the firmware release response.
pub const TAU_FIRMWARE_RELEASE_DATA_SIZE: usize = 4;
