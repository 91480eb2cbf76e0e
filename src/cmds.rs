//! Command opcodes and frame layout of the camera's host protocol.

// Command frame layout

/// Start mark at byte 0 of every command frame.
pub const TAU_CMD_START_MARK: u8 = 0xF5;

/// Size of a regular command frame, checksum included.
pub const TAU_CMD_FRAME_SIZE: usize = 14;

/// Size of the region-of-interest command frame (four extra `u16` fields of room).
pub const TAU_CMD_ROI_FRAME_SIZE: usize = TAU_CMD_FRAME_SIZE + 4 * 2;

/// Offset of the opcode byte.
pub const TAU_CMD_INDEX_OPCODE: usize = 1;

/// Offset of the first payload byte.
pub const TAU_CMD_INDEX_DATA: usize = 2;

/// Size of the trailing CRC-32.
pub const TAU_CMD_CHECKSUM_SIZE: usize = 4;

// Setup commands

/// Sets the integration time for 3D operation. Payload: index `u8`, time `u16`.
pub const TAU_CMD_SET_INTEGRATION_TIME_3D: u8 = 0x00;

/// Sets the integration time for grayscale. Payload: time `u16`.
pub const TAU_CMD_SET_INTEGRATION_TIME_GRAYSCALE: u8 = 0x01;

/// Sets the region of interest. Payload: x min, y min, x max, y max as `u16`.
pub const TAU_CMD_SET_ROI: u8 = 0x02;

/// Sets the binning.
pub const TAU_CMD_SET_BINNING: u8 = 0x03;

/// Sets the operating mode. Payload: mode `u8`.
pub const TAU_CMD_SET_MODE: u8 = 0x04;

/// Sets the modulation frequency. Payload: frequency code `u8`.
pub const TAU_CMD_SET_MODULATION_FREQUENCY: u8 = 0x05;

/// Sets the DLL step.
pub const TAU_CMD_SET_DLL_STEP: u8 = 0x06;

/// Sets the filter parameters.
pub const TAU_CMD_SET_FILTER: u8 = 0x07;

/// Sets the distance offset. Payload: offset `i16`.
pub const TAU_CMD_SET_OFFSET: u8 = 0x08;

/// Sets the minimal amplitude. Payload: index `u8`, amplitude `u16`.
pub const TAU_CMD_SET_MINIMAL_AMPLITUDE: u8 = 0x09;

/// Sets the DCS filter.
pub const TAU_CMD_SET_DCS_FILTER: u8 = 0x0A;

/// Sets the Gaussian filter.
pub const TAU_CMD_SET_GAUSSIAN_FILTER: u8 = 0x0B;

/// Sets or limits the frame rate.
pub const TAU_CMD_SET_FRAME_RATE: u8 = 0x0C;

/// Sets the HDR mode. Payload: HDR code `u8`.
pub const TAU_CMD_SET_HDR: u8 = 0x0D;

/// Sets the modulation channel. Payload: auto channel flag `u8`, channel `u8`.
pub const TAU_CMD_SET_MODULATION_CHANNEL: u8 = 0x0E;

/// Sets the temporal filter for the single spot.
pub const TAU_CMD_SET_FILTER_SINGLE_SPOT: u8 = 0x0F;

// Acquisition commands

/// Requests distance data.
pub const TAU_CMD_GET_DISTANCE: u8 = 0x20;

/// Requests amplitude data.
pub const TAU_CMD_GET_AMPLITUDE: u8 = 0x21;

/// Requests distance and amplitude data.
pub const TAU_CMD_GET_DISTANCE_AMPLITUDE: u8 = 0x22;

/// Requests distance, amplitude and DCS data at once.
pub const TAU_CMD_GET_DCS_DISTANCE_AMPLITUDE: u8 = 0x23;

/// Requests grayscale data.
pub const TAU_CMD_GET_GRAYSCALE: u8 = 0x24;

/// Requests DCS data.
pub const TAU_CMD_GET_DCS: u8 = 0x25;

/// Enables or disables auto acquisition.
pub const TAU_CMD_SET_AUTO_ACQUISITION: u8 = 0x26;

/// Reads back the 3D integration time.
pub const TAU_CMD_GET_INTEGRATION_TIME_3D: u8 = 0x27;

/// Stops the stream.
pub const TAU_CMD_STOP_STREAM: u8 = 0x28;

/// Requests distance and grayscale data.
pub const TAU_CMD_GET_DISTANCE_GRAYSCALE: u8 = 0x29;

// Query commands

/// Requests the identification word.
pub const TAU_CMD_GET_IDENTIFICATION: u8 = 0x47;

/// Requests the chip information (wafer and chip id).
pub const TAU_CMD_GET_CHIP_INFORMATION: u8 = 0x48;

/// Requests the firmware release.
pub const TAU_CMD_GET_FIRMWARE_RELEASE: u8 = 0x49;

/// Requests the production info.
pub const TAU_CMD_GET_PRODUCTION_INFO: u8 = 0x50;

// Acquisition payload values

/// Single frame acquisition.
pub const TAU_ACQUISITION_SINGLE: u8 = 0;

/// Auto repeat acquisition using the same parameters. Sent with every frame request.
pub const TAU_ACQUISITION_AUTO_REPEAT: u8 = 1;

/// Streaming acquisition.
pub const TAU_ACQUISITION_STREAM: u8 = 3;
