use crate::answers::TAU_IMAGE_HEADER_SIZE;
use crate::types::{FrameType, HdrMode, Roi};
use std::time::Duration;

/// Default wall-clock deadline for a response to arrive.
pub const TAU_DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default sleep between transport polls while no bytes are waiting.
pub const TAU_DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Default serial baud rate of the camera.
pub const TAU_DEFAULT_BAUD_RATE: u32 = 4_000_000;

/// Default blocking read timeout configured on the serial port itself.
pub const TAU_DEFAULT_PORT_TIMEOUT: Duration = Duration::from_millis(1);

/// Default near end of the pseudo-color range, in millimeters.
pub const TAU_DEFAULT_RANGE_NEAR: f64 = 1000.0;

/// Default far end of the pseudo-color range, in millimeters.
pub const TAU_DEFAULT_RANGE_FAR: f64 = 4000.0;

/// Sensor width in pixels.
pub const TAU_SENSOR_WIDTH: usize = 160;

/// Sensor height in pixels.
pub const TAU_SENSOR_HEIGHT: usize = 60;

/// Number of pixels in a full frame.
pub const TAU_SENSOR_PIXEL_COUNT: usize = TAU_SENSOR_WIDTH * TAU_SENSOR_HEIGHT;

/// Acquisition state the camera does not echo back.
///
/// Acquisition responses carry no length the host can rely on up front, so
/// the expected size is derived from the active ROI and HDR mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub hdr: HdrMode,
    pub roi: Roi,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState {
            hdr: HdrMode::Off,
            roi: Roi::FULL_FRAME,
        }
    }
}

impl SessionState {
    /// Payload bytes (image header included) an acquisition of `frame_type` returns.
    pub fn expected_payload_size(&self, frame_type: FrameType) -> usize {
        let area = self.roi.area();
        let pixel_bytes = match self.hdr {
            HdrMode::Spatial => area * frame_type.record_size() / 2,
            _ => area * frame_type.record_size(),
        };
        pixel_bytes + TAU_IMAGE_HEADER_SIZE
    }
}
