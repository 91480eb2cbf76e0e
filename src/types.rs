use crate::answers::*;
use crate::base::{Error, Result};
use crate::cmds::*;
use crate::internals::*;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Rectangular sub-window of the 160x60 sensor grid, corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Roi {
    pub x_min: u16,
    pub y_min: u16,
    pub x_max: u16,
    pub y_max: u16,
}

impl Roi {
    /// The whole sensor, `(0, 0) - (159, 59)`.
    pub const FULL_FRAME: Roi = Roi {
        x_min: 0,
        y_min: 0,
        x_max: TAU_SENSOR_WIDTH as u16 - 1,
        y_max: TAU_SENSOR_HEIGHT as u16 - 1,
    };

    /// Creates a region of interest, rejecting corners off the sensor or out of order.
    ///
    /// # Arguments
    ///
    /// * `x_min`, `y_min` - Top left corner.
    /// * `x_max`, `y_max` - Bottom right corner, inclusive.
    pub fn new(x_min: u16, y_min: u16, x_max: u16, y_max: u16) -> Result<Roi> {
        if x_min > x_max
            || y_min > y_max
            || x_max >= TAU_SENSOR_WIDTH as u16
            || y_max >= TAU_SENSOR_HEIGHT as u16
        {
            return Err(Error::InvalidRoi {
                x_min,
                y_min,
                x_max,
                y_max,
            });
        }
        Ok(Roi {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    /// Number of columns, corners included.
    #[inline]
    pub fn width(&self) -> usize {
        (self.x_max - self.x_min) as usize + 1
    }

    /// Number of rows, corners included.
    #[inline]
    pub fn height(&self) -> usize {
        (self.y_max - self.y_min) as usize + 1
    }

    /// Number of pixels inside the region.
    #[inline]
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }
}

impl Default for Roi {
    fn default() -> Roi {
        Roi::FULL_FRAME
    }
}

/// High dynamic range mode of the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HdrMode {
    #[default]
    Off,
    /// Halves the per-pixel data density, see `SessionState::expected_payload_size`.
    Spatial,
    Temporal,
}

impl HdrMode {
    /// Wire value sent with `TAU_CMD_SET_HDR`.
    pub fn code(self) -> u8 {
        match self {
            HdrMode::Off => 0,
            HdrMode::Spatial => 1,
            HdrMode::Temporal => 2,
        }
    }
}

/// Illumination modulation frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModulationFrequency {
    Mhz10,
    #[default]
    Mhz20,
}

impl ModulationFrequency {
    /// Value sent with `TAU_CMD_SET_MODULATION_FREQUENCY`.
    pub fn code(self) -> u8 {
        match self {
            ModulationFrequency::Mhz10 => 0,
            ModulationFrequency::Mhz20 => 1,
        }
    }
}

/// Operating mode selecting which illumination beams are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatingMode {
    /// Normal operation with illumination beam A (wide field of view).
    #[default]
    BeamA,
    /// Beam B with all settings made by the user.
    BeamBManual,
    /// Beam B with calibrated ROI, one distance as result.
    BeamBResult,
    /// Beam B with calibrated ROI, one distance plus the pixels as result.
    BeamBResultData,
    /// Beams A and B with calibrated ROI, one distance as result.
    BeamAbResult,
    /// Beams A and B with automatic selection.
    BeamAbAutoResult,
    /// Beams A and B interleaved output.
    BeamAbInterleavedData,
}

impl OperatingMode {
    /// Value sent with `TAU_CMD_SET_MODE`.
    pub fn code(self) -> u8 {
        match self {
            OperatingMode::BeamA => 0,
            OperatingMode::BeamBManual => 1,
            OperatingMode::BeamBResult => 2,
            OperatingMode::BeamBResultData => 3,
            OperatingMode::BeamAbResult => 4,
            OperatingMode::BeamAbAutoResult => 5,
            OperatingMode::BeamAbInterleavedData => 6,
        }
    }
}

/// Pixel layout requested from the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameType {
    /// LE `u16` distance per pixel.
    Distance,
    /// `u8` grayscale followed by LE `u16` distance per pixel.
    #[default]
    DistanceGrayscale,
    /// LE `u16` distance followed by LE `u16` amplitude per pixel.
    DistanceAmplitude,
}

impl FrameType {
    /// Bytes per pixel record.
    pub fn record_size(self) -> usize {
        match self {
            FrameType::Distance => 2,
            FrameType::DistanceGrayscale => 3,
            FrameType::DistanceAmplitude => 4,
        }
    }

    /// Opcode of the acquisition command requesting this layout.
    pub fn opcode(self) -> u8 {
        match self {
            FrameType::Distance => TAU_CMD_GET_DISTANCE,
            FrameType::DistanceGrayscale => TAU_CMD_GET_DISTANCE_GRAYSCALE,
            FrameType::DistanceAmplitude => TAU_CMD_GET_DISTANCE_AMPLITUDE,
        }
    }

    /// Response type the camera answers the acquisition with.
    pub fn response_kind(self) -> ResponseKind {
        match self {
            FrameType::Distance => ResponseKind::Distance,
            FrameType::DistanceGrayscale => ResponseKind::DistanceGrayscale,
            FrameType::DistanceAmplitude => ResponseKind::DistanceAmplitude,
        }
    }

    /// Minimum payload length (image header stripped) of a full frame.
    pub fn full_frame_size(self) -> usize {
        TAU_SENSOR_PIXEL_COUNT * self.record_size()
    }
}

/// How valid pixels are colored in the RGB depth map and the point cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Pseudo-color ramp over the configured distance range.
    #[default]
    Distance,
    /// Gray level taken from the grayscale/amplitude channel.
    Grayscale,
}

/// Outcome of a configuration command.
///
/// The camera reports a rejected or lost setting only through the missing
/// ack, so this must be checked by callers that care.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStatus {
    /// The camera acknowledged the setting.
    Acknowledged,
    /// A well-formed response arrived that was not an ack.
    NotAcknowledged,
    /// No valid response arrived before the deadline.
    NoResponse,
}

impl ConfigStatus {
    /// `true` only when the camera acked the command.
    #[inline]
    pub fn is_acknowledged(self) -> bool {
        self == ConfigStatus::Acknowledged
    }

    /// Turns anything but an ack into `Error::OperationFail`.
    pub fn into_result(self) -> Result<()> {
        match self {
            ConfigStatus::Acknowledged => Ok(()),
            other => Err(Error::OperationFail {
                description: format!("configuration not applied: {:?}", other),
            }),
        }
    }
}

/// An 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Builds a color from its channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    /// A gray with all three channels at `level`.
    #[inline]
    pub const fn gray(level: u8) -> Rgb {
        Rgb::new(level, level, level)
    }
}

/// A point of the unorganized point cloud, in meters, with its color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3d {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Decoded identification word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identification {
    pub chip_type: u32,
    pub version: u32,
}

impl Identification {
    /// Decodes the identification payload, read as one big-endian word.
    pub fn from_payload(data: &[u8]) -> Result<Identification> {
        check_payload_size("identification", data, TAU_IDENTIFICATION_DATA_SIZE)?;
        let word = BigEndian::read_u32(data);
        Ok(Identification {
            chip_type: (word & TAU_IDENTIFICATION_CHIP_TYPE_MASK)
                >> TAU_IDENTIFICATION_CHIP_TYPE_SHIFT,
            version: word & TAU_IDENTIFICATION_VERSION_MASK,
        })
    }

    /// Returns `true` for chip types this driver can talk to.
    #[inline]
    pub fn is_supported(&self) -> bool {
        self.chip_type >= TAU_MIN_SUPPORTED_CHIP_TYPE
    }
}

/// Wafer and chip id of the sensor die.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipInformation {
    pub wafer_id: u16,
    pub chip_id: u16,
}

impl ChipInformation {
    /// Decodes the 4-byte payload: LE chip id, then LE wafer id.
    pub fn from_payload(data: &[u8]) -> Result<ChipInformation> {
        check_payload_size("chip information", data, TAU_CHIP_INFORMATION_DATA_SIZE)?;
        Ok(ChipInformation {
            chip_id: LittleEndian::read_u16(&data[TAU_CHIP_INFORMATION_INDEX_CHIP_ID..]),
            wafer_id: LittleEndian::read_u16(&data[TAU_CHIP_INFORMATION_INDEX_WAFER_ID..]),
        })
    }

    /// Unique id string: two hex digits of wafer id, four of chip id.
    pub fn uid(&self) -> String {
        format!("{:02X}{:04X}", self.wafer_id, self.chip_id)
    }
}

/// Firmware release reported by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareRelease {
    pub major: u16,
    pub minor: u16,
}

impl FirmwareRelease {
    /// Decodes the LE `u32` payload, major version in the high half.
    pub fn from_payload(data: &[u8]) -> Result<FirmwareRelease> {
        check_payload_size("firmware release", data, TAU_FIRMWARE_RELEASE_DATA_SIZE)?;
        let word = LittleEndian::read_u32(data);
        Ok(FirmwareRelease {
            major: (word >> 16) as u16,
            minor: (word & 0xFFFF) as u16,
        })
    }
}

impl fmt::Display for FirmwareRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

fn check_payload_size(what: &str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() != expected {
        return Err(Error::ProtocolError {
            description: format!(
                "invalid data size for {}: expected {}, got {}",
                what,
                expected,
                data.len()
            ),
        });
    }
    Ok(())
}

/// Identity strings of an opened camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraInfo {
    /// `"<chip type>.<version>"`.
    pub model: String,
    /// `"<major>.<minor>"`.
    pub firmware: String,
    pub uid: String,
    pub resolution: String,
    pub port: String,
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "model {}, firmware {}, uid {}, resolution {}, port {}",
            self.model, self.firmware, self.uid, self.resolution, self.port
        )
    }
}

/// One decoded acquisition.
///
/// The per-pixel buffers are full resolution and row-major; `points` only
/// holds pixels that carried a valid distance.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    /// Layout the raw payload was decoded as.
    pub frame_type: FrameType,
    /// Z in meters per pixel, NaN where no valid distance was measured.
    pub depth: Vec<f32>,
    /// Three bytes per pixel in blue, green, red order.
    pub depth_rgb: Vec<u8>,
    /// Grayscale or amplitude magnitude per pixel, 0 for distance-only frames.
    pub grayscale: Vec<u16>,
    /// 255 where the pixel saturated or overflowed the ADC, 0 elsewhere.
    pub saturation_mask: Vec<u8>,
    pub points: Vec<Point3d>,
    /// The payload this frame was decoded from, kept for replay.
    pub raw: Arc<[u8]>,
}

/// Serial session settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub baud_rate: u32,
    /// Wall-clock deadline for each response.
    pub timeout: Duration,
    /// Sleep between polls while no bytes are waiting.
    pub poll_interval: Duration,
    /// Read timeout configured on the port.
    pub port_timeout: Duration,
    /// Check the CRC-32 trailer of responses. Costly on full frames.
    pub verify_response_checksum: bool,
}

impl SessionConfig {
    /// Serial baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> SessionConfig {
        self.baud_rate = baud_rate;
        self
    }

    /// Deadline for each response.
    pub fn with_timeout(mut self, timeout: Duration) -> SessionConfig {
        self.timeout = timeout;
        self
    }

    /// Sleep between polls while a response is incomplete.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> SessionConfig {
        self.poll_interval = poll_interval;
        self
    }

    /// Read timeout of the serial port itself.
    pub fn with_port_timeout(mut self, port_timeout: Duration) -> SessionConfig {
        self.port_timeout = port_timeout;
        self
    }

    /// Whether response checksums are checked.
    pub fn with_response_verification(mut self, verify: bool) -> SessionConfig {
        self.verify_response_checksum = verify;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> SessionConfig {
        SessionConfig {
            baud_rate: TAU_DEFAULT_BAUD_RATE,
            timeout: TAU_DEFAULT_TIMEOUT,
            poll_interval: TAU_DEFAULT_POLL_INTERVAL,
            port_timeout: TAU_DEFAULT_PORT_TIMEOUT,
            verify_response_checksum: false,
        }
    }
}

/// Acquisition parameters applied by `TauCamera::apply_defaults`.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionDefaults {
    pub modulation_frequency: ModulationFrequency,
    pub auto_channel: bool,
    pub channel: u8,
    pub mode: OperatingMode,
    pub hdr: HdrMode,
    pub integration_time_3d_index: u8,
    /// Microseconds.
    pub integration_time_3d: u16,
    /// Microseconds.
    pub integration_time_grayscale: u16,
    pub minimal_amplitude_index: u8,
    pub minimal_amplitude: u16,
    /// Millimeters added to every distance by the camera.
    pub offset: i16,
    pub roi: Roi,
}

impl Default for AcquisitionDefaults {
    fn default() -> AcquisitionDefaults {
        AcquisitionDefaults {
            modulation_frequency: ModulationFrequency::Mhz20,
            auto_channel: false,
            channel: 0,
            mode: OperatingMode::BeamA,
            hdr: HdrMode::Off,
            integration_time_3d_index: 0,
            integration_time_3d: 800,
            integration_time_grayscale: 5000,
            minimal_amplitude_index: 0,
            minimal_amplitude: 60,
            offset: 0,
            roi: Roi::FULL_FRAME,
        }
    }
}

/// Coloring settings owned by one `FrameDecoder`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderConfig {
    pub color_mode: ColorMode,
    /// Near end of the color range in millimeters, mapped to the red end of the ramp.
    pub near: f64,
    /// Far end of the color range in millimeters, mapped to the blue end.
    pub far: f64,
}

impl DecoderConfig {
    /// Sets how valid pixels are colored.
    pub fn with_color_mode(mut self, color_mode: ColorMode) -> DecoderConfig {
        self.color_mode = color_mode;
        self
    }

    /// Sets the color range, rejecting `near >= far`.
    pub fn with_range(mut self, near: f64, far: f64) -> Result<DecoderConfig> {
        validate_range(near, far)?;
        self.near = near;
        self.far = far;
        Ok(self)
    }
}

impl Default for DecoderConfig {
    fn default() -> DecoderConfig {
        DecoderConfig {
            color_mode: ColorMode::Distance,
            near: TAU_DEFAULT_RANGE_NEAR,
            far: TAU_DEFAULT_RANGE_FAR,
        }
    }
}

pub(crate) fn validate_range(near: f64, far: f64) -> Result<()> {
    if !near.is_finite() || !far.is_finite() || near >= far {
        return Err(Error::InvalidRange { near, far });
    }
    Ok(())
}
