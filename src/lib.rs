//! # Tau ToF Driver
//!
//! `tau_tof` is a driver for Tau serial Time-of-Flight range cameras. It
//! configures the camera over its framed binary protocol, fetches raw
//! acquisitions and decodes them into depth maps, pseudo-colored depth
//! images and 3D point clouds.
//!
//! ```ignore
//! use tau_tof::{FrameDecoder, FrameType, TauCamera};
//!
//! let mut camera = TauCamera::open(None)?;
//! println!("{}", camera.info()?);
//! let decoder = FrameDecoder::default();
//! let frame = camera.read_frame(FrameType::DistanceGrayscale, &decoder)?;
//! println!("{} points", frame.points.len());
//! ```

extern crate byteorder;
extern crate log;

mod answers;
pub mod base;
mod checksum;
pub mod cmds;
pub mod color;
mod frame_builder;
mod internals;
mod parsers;
pub mod pipeline;
mod protocol;
pub mod serial;
pub mod types;
pub mod utils;

pub use crate::answers::ResponseKind;
pub use crate::base::{Channel, Command, Error, Response, Result, Transport};
pub use crate::color::Colorizer;
pub use crate::frame_builder::FrameDecoder;
pub use crate::internals::SessionState;
pub use crate::parsers::pixel_parser::{classify, PixelClass};
pub use crate::pipeline::FramePipeline;
pub use crate::protocol::TauHostProtocol;
pub use crate::types::*;

use crate::answers::*;
use crate::cmds::*;
use crate::serial::PortClaim;
use log::{debug, error, trace, warn};
use serialport::SerialPort;
use std::time::Duration;

/// An open session with a Tau camera.
///
/// Commands and responses carry no ids, so every call sends one command and
/// waits for its answer before returning; `&mut self` keeps them in order.
/// The camera remembers the ROI and HDR mode it was last given, since
/// acquisition sizes depend on them.
///
/// Opening a port claims it for this process until the camera is dropped.
#[derive(Debug)]
pub struct TauCamera<T: ?Sized = dyn SerialPort> {
    channel: Channel<TauHostProtocol, T>,
    session: SessionState,
    timeout: Duration,
    port: String,
    claim: Option<PortClaim>,
}

impl TauCamera {
    /// Opens a camera on a serial port and applies `AcquisitionDefaults`.
    ///
    /// # Arguments
    ///
    /// * `port` - Port to open, e.g. `/dev/ttyACM0`. With `None` every
    ///   available port is probed and the first supported camera is used.
    pub fn open(port: Option<&str>) -> Result<TauCamera> {
        TauCamera::open_with_config(port, &SessionConfig::default())
    }

    /// Opens a camera with custom session settings.
    pub fn open_with_config(port: Option<&str>, config: &SessionConfig) -> Result<TauCamera> {
        let mut camera = match port {
            Some(name) => TauCamera::open_with(name, config, serial::open_port)?,
            None => {
                debug!("Looking for a connected Tau camera");
                TauCamera::discover_with(serial::available_port_names()?, config, serial::open_port)?
            }
        };
        let status = camera.apply_defaults(&AcquisitionDefaults::default())?;
        if !status.is_acknowledged() {
            warn!("Default parameters not fully applied on {}: {:?}", camera.port, status);
        }
        Ok(camera)
    }

    /// Lists the serial ports a supported camera answers on.
    pub fn scan() -> Result<Vec<String>> {
        Ok(TauCamera::scan_with(
            serial::available_port_names()?,
            &SessionConfig::default(),
            serial::open_port,
        ))
    }
}

impl<T: ?Sized> TauCamera<T>
where
    T: Transport,
{
    /// Wraps an already opened transport. The port name is only used for
    /// reporting and is not claimed.
    pub fn with_transport(stream: Box<T>, port: &str, config: &SessionConfig) -> TauCamera<T> {
        trace!("Creating new TauCamera on {}", port);
        let protocol = TauHostProtocol::with_response_verification(config.verify_response_checksum);
        TauCamera {
            channel: Channel::with_poll_interval(protocol, stream, config.poll_interval),
            session: SessionState::default(),
            timeout: config.timeout,
            port: port.to_owned(),
            claim: None,
        }
    }

    /// Claims `port`, opens it with `opener` and wraps the result.
    ///
    /// Fails with `Error::PortBusy` when another camera in this process holds the port.
    pub fn open_with<F>(port: &str, config: &SessionConfig, opener: F) -> Result<TauCamera<T>>
    where
        F: FnOnce(&str, &SessionConfig) -> Result<Box<T>>,
    {
        let claim = PortClaim::acquire(port)?;
        let stream = opener(port, config)?;
        let mut camera = Self::with_transport(stream, port, config);
        camera.claim = Some(claim);
        Ok(camera)
    }

    /// Opens the first candidate port that answers identification with a supported chip.
    ///
    /// Candidates that fail to open, do not answer or report an unsupported
    /// chip are skipped. No defaults are applied.
    pub fn discover_with<I, S, F>(
        candidates: I,
        config: &SessionConfig,
        mut opener: F,
    ) -> Result<TauCamera<T>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&str, &SessionConfig) -> Result<Box<T>>,
    {
        for candidate in candidates {
            let name = candidate.as_ref();
            match Self::probe(name, config, &mut opener) {
                Ok(camera) => {
                    debug!("Tau camera found on {}", name);
                    return Ok(camera);
                }
                Err(e) => debug!("Skipping {}: {}", name, e),
            }
        }
        Err(Error::DeviceNotFound)
    }

    /// Returns the candidate ports with a supported camera attached.
    pub fn scan_with<I, S, F>(candidates: I, config: &SessionConfig, mut opener: F) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&str, &SessionConfig) -> Result<Box<T>>,
    {
        candidates
            .into_iter()
            .filter_map(|candidate| {
                let name = candidate.as_ref();
                match Self::probe(name, config, &mut opener) {
                    Ok(_) => Some(name.to_owned()),
                    Err(e) => {
                        debug!("Skipping {}: {}", name, e);
                        None
                    }
                }
            })
            .collect()
    }

    fn probe<F>(name: &str, config: &SessionConfig, opener: &mut F) -> Result<TauCamera<T>>
    where
        F: FnMut(&str, &SessionConfig) -> Result<Box<T>>,
    {
        let mut camera = Self::open_with(name, config, |port, config| opener(port, config))?;
        let identification = camera.get_identification()?;
        if !identification.is_supported() {
            return Err(Error::ProtocolError {
                description: format!("unsupported chip type {}", identification.chip_type),
            });
        }
        Ok(camera)
    }

    /// Name of the port the camera is attached to.
    #[inline]
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Current ROI and HDR mode.
    #[inline]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Changes the response deadline used by every following call.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    fn configure(&mut self, cmd: Command) -> Result<ConfigStatus> {
        self.configure_then(cmd, |_| {})
    }

    /// Sends `cmd`, applies `on_sent` to the session as soon as the write
    /// succeeds and then waits for the ack.
    fn configure_then<F>(&mut self, cmd: Command, on_sent: F) -> Result<ConfigStatus>
    where
        F: FnOnce(&mut SessionState),
    {
        let opcode = cmd.opcode;
        if let Err(e) = self.channel.write(&cmd) {
            error!("Failed to send command {:02X}: {}", opcode, e);
            return Err(e);
        }
        on_sent(&mut self.session);
        let response = self.channel.read_response(0, self.timeout)?;
        let status = match response.kind {
            ResponseKind::Ack => ConfigStatus::Acknowledged,
            ResponseKind::Invalid => ConfigStatus::NoResponse,
            _ => ConfigStatus::NotAcknowledged,
        };
        if !status.is_acknowledged() {
            warn!(
                "Command {:02X} not acknowledged: {:?} ({:?})",
                opcode, status, response.kind
            );
        }
        Ok(status)
    }

    /// Sets the modulation frequency.
    ///
    /// # Arguments
    ///
    /// * `frequency` - 10 or 20 MHz. Lower frequencies reach further.
    pub fn set_modulation_frequency(&mut self, frequency: ModulationFrequency) -> Result<ConfigStatus> {
        trace!("Setting modulation frequency to {:?}", frequency);
        self.configure(Command::new(TAU_CMD_SET_MODULATION_FREQUENCY).push_u8(frequency.code()))
    }

    /// Selects the modulation channel.
    ///
    /// # Arguments
    ///
    /// * `auto_channel` - Let the camera pick a free channel.
    /// * `channel` - Channel 0 to 10, used when `auto_channel` is off.
    pub fn set_modulation_channel(&mut self, auto_channel: bool, channel: u8) -> Result<ConfigStatus> {
        trace!("Setting modulation channel: auto={}, channel={}", auto_channel, channel);
        self.configure(
            Command::new(TAU_CMD_SET_MODULATION_CHANNEL)
                .push_u8(auto_channel as u8)
                .push_u8(channel),
        )
    }

    /// Selects the operating mode, i.e. which illumination beams are used.
    pub fn set_mode(&mut self, mode: OperatingMode) -> Result<ConfigStatus> {
        trace!("Setting mode to {:?}", mode);
        self.configure(Command::new(TAU_CMD_SET_MODE).push_u8(mode.code()))
    }

    /// Sets the HDR mode. Acquisition sizes follow the new mode once the
    /// command has been sent, acknowledged or not.
    pub fn set_hdr(&mut self, hdr: HdrMode) -> Result<ConfigStatus> {
        trace!("Setting HDR to {:?}", hdr);
        self.configure_then(Command::new(TAU_CMD_SET_HDR).push_u8(hdr.code()), |session| {
            session.hdr = hdr
        })
    }

    /// Sets a 3D integration time.
    ///
    /// # Arguments
    ///
    /// * `index` - Integration time slot.
    /// * `time` - Integration time in microseconds.
    pub fn set_integration_time_3d(&mut self, index: u8, time: u16) -> Result<ConfigStatus> {
        trace!("Setting 3D integration time {} to {} us", index, time);
        self.configure(
            Command::new(TAU_CMD_SET_INTEGRATION_TIME_3D)
                .push_u8(index)
                .push_u16(time),
        )
    }

    /// Sets the grayscale integration time.
    ///
    /// # Arguments
    ///
    /// * `time` - Integration time in microseconds.
    pub fn set_integration_time_grayscale(&mut self, time: u16) -> Result<ConfigStatus> {
        trace!("Setting grayscale integration time to {} us", time);
        self.configure(Command::new(TAU_CMD_SET_INTEGRATION_TIME_GRAYSCALE).push_u16(time))
    }

    /// Sets the amplitude below which pixels are reported as low amplitude.
    pub fn set_minimal_amplitude(&mut self, index: u8, amplitude: u16) -> Result<ConfigStatus> {
        trace!("Setting minimal amplitude {} to {}", index, amplitude);
        self.configure(
            Command::new(TAU_CMD_SET_MINIMAL_AMPLITUDE)
                .push_u8(index)
                .push_u16(amplitude),
        )
    }

    /// Sets the distance offset in millimeters.
    pub fn set_offset(&mut self, offset: i16) -> Result<ConfigStatus> {
        trace!("Setting offset to {} mm", offset);
        self.configure(Command::new(TAU_CMD_SET_OFFSET).push_i16(offset))
    }

    /// Sets the region of interest. Like `set_hdr`, the new ROI is used for
    /// acquisition sizes once the command has been sent.
    pub fn set_roi(&mut self, roi: Roi) -> Result<ConfigStatus> {
        trace!("Setting ROI to {:?}", roi);
        self.configure_then(
            Command::new(TAU_CMD_SET_ROI)
                .push_u16(roi.x_min)
                .push_u16(roi.y_min)
                .push_u16(roi.x_max)
                .push_u16(roi.y_max),
            |session| session.roi = roi,
        )
    }

    /// Sends every parameter of `defaults`.
    ///
    /// All commands are sent even if some are not acknowledged; the first
    /// non-ack status is returned.
    pub fn apply_defaults(&mut self, defaults: &AcquisitionDefaults) -> Result<ConfigStatus> {
        trace!("Applying acquisition defaults: {:?}", defaults);
        let statuses = [
            self.set_modulation_frequency(defaults.modulation_frequency)?,
            self.set_modulation_channel(defaults.auto_channel, defaults.channel)?,
            self.set_mode(defaults.mode)?,
            self.set_hdr(defaults.hdr)?,
            self.set_integration_time_3d(
                defaults.integration_time_3d_index,
                defaults.integration_time_3d,
            )?,
            self.set_integration_time_grayscale(defaults.integration_time_grayscale)?,
            self.set_minimal_amplitude(defaults.minimal_amplitude_index, defaults.minimal_amplitude)?,
            self.set_offset(defaults.offset)?,
            self.set_roi(defaults.roi)?,
        ];
        Ok(statuses
            .into_iter()
            .find(|status| !status.is_acknowledged())
            .unwrap_or(ConfigStatus::Acknowledged))
    }

    fn query(&mut self, opcode: u8, size: usize, expected: ResponseKind) -> Result<Vec<u8>> {
        trace!("Invoking query command: {:02X}", opcode);
        let response = self.channel.invoke(&Command::new(opcode), size, self.timeout)?;
        if !response.is_valid() {
            warn!("Timeout waiting for response to {:02X}", opcode);
            return Err(Error::OperationTimeout);
        }
        if response.kind != expected {
            error!(
                "Unexpected response type for {:02X}: got {:?}, expected {:?}",
                opcode, response.kind, expected
            );
            return Err(Error::ProtocolError {
                description: format!(
                    "unexpected response type: expected {:?}, got {:?}",
                    expected, response.kind
                ),
            });
        }
        Ok(response.data)
    }

    /// Reads the chip type and version.
    pub fn get_identification(&mut self) -> Result<Identification> {
        let data = self.query(
            TAU_CMD_GET_IDENTIFICATION,
            TAU_IDENTIFICATION_DATA_SIZE,
            ResponseKind::Identification,
        )?;
        Identification::from_payload(&data)
    }

    /// Reads the wafer and chip ids that make up the camera uid.
    pub fn get_chip_information(&mut self) -> Result<ChipInformation> {
        let data = self.query(
            TAU_CMD_GET_CHIP_INFORMATION,
            TAU_CHIP_INFORMATION_DATA_SIZE,
            ResponseKind::ChipInformation,
        )?;
        ChipInformation::from_payload(&data)
    }

    /// Reads the firmware version.
    pub fn get_firmware_release(&mut self) -> Result<FirmwareRelease> {
        let data = self.query(
            TAU_CMD_GET_FIRMWARE_RELEASE,
            TAU_FIRMWARE_RELEASE_DATA_SIZE,
            ResponseKind::FirmwareRelease,
        )?;
        FirmwareRelease::from_payload(&data)
    }

    /// Queries identification, firmware and chip information.
    pub fn info(&mut self) -> Result<CameraInfo> {
        let identification = self.get_identification()?;
        let firmware = self.get_firmware_release()?;
        let chip = self.get_chip_information()?;
        Ok(CameraInfo {
            model: format!("{}.{}", identification.chip_type, identification.version),
            firmware: firmware.to_string(),
            uid: chip.uid(),
            resolution: format!("{}x{}", internals::TAU_SENSOR_WIDTH, internals::TAU_SENSOR_HEIGHT),
            port: self.port.clone(),
        })
    }

    /// Acquires one frame and returns its pixel payload, image header stripped.
    ///
    /// A missed acquisition is not an error: when nothing valid arrives in
    /// time the payload is empty, and a late frame may come back truncated.
    /// Both are rejected by `FrameDecoder::decode`.
    pub fn read_frame_raw(&mut self, frame_type: FrameType) -> Result<Vec<u8>> {
        let timeout = self.timeout;
        self.read_frame_raw_with_timeout(frame_type, timeout)
    }

    /// Like `read_frame_raw`, with a specific deadline.
    pub fn read_frame_raw_with_timeout(
        &mut self,
        frame_type: FrameType,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        let size = self.session.expected_payload_size(frame_type);
        trace!(
            "Requesting {:?} frame, expecting {} bytes (session {:?})",
            frame_type,
            size,
            self.session
        );
        let cmd = Command::new(frame_type.opcode()).push_u8(TAU_ACQUISITION_AUTO_REPEAT);
        let response = self.channel.invoke(&cmd, size, timeout)?;

        if !response.is_valid() {
            warn!("No valid {:?} frame received", frame_type);
            self.channel.discard_input()?;
            return Ok(Vec::new());
        }
        if response.kind != frame_type.response_kind() {
            error!(
                "Unexpected response type for {:?} frame: {:?}",
                frame_type, response.kind
            );
            self.channel.discard_input()?;
            return Err(Error::ProtocolError {
                description: format!(
                    "unexpected response type: expected {:?}, got {:?}",
                    frame_type.response_kind(),
                    response.kind
                ),
            });
        }

        let mut data = response.data;
        if data.len() < size {
            // the rest of the frame may still be on its way
            self.channel.discard_input()?;
        }
        if data.len() <= TAU_IMAGE_HEADER_SIZE {
            warn!("Frame of {} bytes has no pixel data", data.len());
            return Ok(Vec::new());
        }
        Ok(data.split_off(TAU_IMAGE_HEADER_SIZE))
    }

    /// Acquires a distance-only frame. See `read_frame_raw`.
    pub fn get_distance(&mut self) -> Result<Vec<u8>> {
        self.read_frame_raw(FrameType::Distance)
    }

    /// Acquires a distance and grayscale frame. See `read_frame_raw`.
    pub fn get_distance_grayscale(&mut self) -> Result<Vec<u8>> {
        self.read_frame_raw(FrameType::DistanceGrayscale)
    }

    /// Acquires a distance and amplitude frame. See `read_frame_raw`.
    pub fn get_distance_amplitude(&mut self) -> Result<Vec<u8>> {
        self.read_frame_raw(FrameType::DistanceAmplitude)
    }

    /// Acquires and decodes one frame.
    ///
    /// Decoding is the slow half; use `FramePipeline` to overlap it with the
    /// next acquisition.
    pub fn read_frame(&mut self, frame_type: FrameType, decoder: &FrameDecoder) -> Result<Frame> {
        let raw = self.read_frame_raw(frame_type)?;
        decoder.decode(raw, frame_type)
    }

    /// Closes the port and releases its claim.
    pub fn close(self) {
        trace!("Closing TauCamera on {}", self.port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::mock::{response_frame, MockTransport};

    fn config() -> SessionConfig {
        SessionConfig::default().with_timeout(Duration::from_millis(20))
    }

    fn camera(mock: &MockTransport) -> TauCamera<MockTransport> {
        TauCamera::with_transport(Box::new(mock.clone()), "mock", &config())
    }

    fn ack() -> Vec<u8> {
        response_frame(TAU_ANS_TYPE_ACK, &[])
    }

    fn mock_opener(
        replies: Vec<Vec<u8>>,
    ) -> impl FnMut(&str, &SessionConfig) -> Result<Box<MockTransport>> {
        move |_, _| {
            let mock = MockTransport::new();
            for reply in &replies {
                mock.push_reply(reply.clone());
            }
            Ok(Box::new(mock))
        }
    }

    #[test]
    fn setter_writes_frame_and_reports_ack() {
        let mock = MockTransport::new();
        mock.push_reply(ack());
        let mut cam = camera(&mock);

        let status = cam.set_integration_time_3d(0, 800).unwrap();
        assert_eq!(status, ConfigStatus::Acknowledged);
        let written = mock.written();
        assert_eq!(written.len(), 14);
        assert_eq!(&written[..5], &[0xF5, 0x00, 0x00, 0x20, 0x03]);
    }

    #[test]
    fn setter_reports_nack_and_silence() {
        let mock = MockTransport::new();
        mock.push_reply(response_frame(TAU_ANS_TYPE_NACK, &[]));
        let mut cam = camera(&mock);
        assert_eq!(
            cam.set_mode(OperatingMode::BeamA).unwrap(),
            ConfigStatus::NotAcknowledged
        );
        assert_eq!(cam.set_offset(-2).unwrap(), ConfigStatus::NoResponse);
        assert_eq!(&mock.written()[14..18], &[0xF5, 0x08, 0xFE, 0xFF]);
    }

    #[test]
    fn roi_and_hdr_drive_acquisition_size() {
        let mock = MockTransport::new();
        mock.push_reply(ack());
        mock.push_reply(ack());
        let mut cam = camera(&mock);

        let roi = Roi::new(0, 0, 79, 29).unwrap();
        assert!(cam.set_roi(roi).unwrap().is_acknowledged());
        let written = mock.written();
        assert_eq!(written.len(), 22);
        assert_eq!(&written[2..10], &[0, 0, 0, 0, 79, 0, 29, 0]);
        assert_eq!(cam.session().roi, roi);

        assert!(cam.set_hdr(HdrMode::Spatial).unwrap().is_acknowledged());
        assert_eq!(
            cam.session().expected_payload_size(FrameType::DistanceGrayscale),
            3 * 2400 / 2 + 80
        );
    }

    #[test]
    fn session_follows_unacknowledged_hdr() {
        let mock = MockTransport::new();
        let mut cam = camera(&mock);
        assert_eq!(cam.set_hdr(HdrMode::Spatial).unwrap(), ConfigStatus::NoResponse);
        assert_eq!(cam.session().hdr, HdrMode::Spatial);
    }

    #[test]
    fn session_follows_settings_sent_before_a_read_failure() {
        let mock = MockTransport::new();
        mock.fail_reads();
        let mut cam = camera(&mock);
        let roi = Roi::new(10, 5, 89, 34).unwrap();

        assert!(matches!(cam.set_hdr(HdrMode::Temporal), Err(Error::IoError(_))));
        assert!(matches!(cam.set_roi(roi), Err(Error::IoError(_))));
        assert_eq!(mock.frames_sent(), 2);
        assert_eq!(cam.session().hdr, HdrMode::Temporal);
        assert_eq!(cam.session().roi, roi);
    }

    #[test]
    fn apply_defaults_sends_every_parameter() {
        let mock = MockTransport::new();
        for _ in 0..9 {
            mock.push_reply(ack());
        }
        let mut cam = camera(&mock);
        let status = cam.apply_defaults(&AcquisitionDefaults::default()).unwrap();
        assert_eq!(status, ConfigStatus::Acknowledged);
        assert_eq!(mock.frames_sent(), 9);
        assert_eq!(mock.written().len(), 8 * 14 + 22);
        assert_eq!(*cam.session(), SessionState::default());
    }

    #[test]
    fn apply_defaults_reports_first_failure() {
        let mock = MockTransport::new();
        mock.push_reply(ack());
        mock.push_reply(response_frame(TAU_ANS_TYPE_NACK, &[]));
        let mut cam = camera(&mock);
        let status = cam.apply_defaults(&AcquisitionDefaults::default()).unwrap();
        assert_eq!(status, ConfigStatus::NotAcknowledged);
        assert_eq!(mock.frames_sent(), 9);
    }

    #[test]
    fn typed_queries() {
        let mock = MockTransport::new();
        mock.push_reply(response_frame(TAU_ANS_TYPE_IDENTIFICATION, &[0, 0, 4, 1]));
        mock.push_reply(response_frame(TAU_ANS_TYPE_FIRMWARE_RELEASE, &[3, 0, 1, 0]));
        mock.push_reply(response_frame(TAU_ANS_TYPE_CHIP_INFORMATION, &[0x21, 0x43, 0x05, 0x00]));
        let mut cam = camera(&mock);

        let info = cam.info().unwrap();
        assert_eq!(info.model, "4.1");
        assert_eq!(info.firmware, "1.3");
        assert_eq!(info.uid, "054321");
        assert_eq!(info.resolution, "160x60");
        assert_eq!(info.port, "mock");
    }

    #[test]
    fn query_errors() {
        let mock = MockTransport::new();
        mock.push_reply(ack());
        let mut cam = camera(&mock);
        assert!(matches!(
            cam.get_firmware_release(),
            Err(Error::ProtocolError { .. })
        ));
        assert!(matches!(
            cam.get_chip_information(),
            Err(Error::OperationTimeout)
        ));
    }

    #[test]
    fn acquisition_strips_image_header() {
        let size = FrameType::DistanceGrayscale.full_frame_size();
        let mut payload = vec![0xEEu8; TAU_IMAGE_HEADER_SIZE];
        payload.extend((0..size).map(|i| (i % 251) as u8));

        let mock = MockTransport::new().with_chunk_size(1024);
        mock.push_reply(response_frame(TAU_ANS_TYPE_DISTANCE_GRAYSCALE, &payload));
        let mut cam = camera(&mock);
        cam.set_timeout(Duration::from_millis(500));

        let raw = cam.get_distance_grayscale().unwrap();
        assert_eq!(raw.len(), size);
        assert_eq!(&raw[..], &payload[TAU_IMAGE_HEADER_SIZE..]);
        assert_eq!(&mock.written()[..3], &[0xF5, TAU_CMD_GET_DISTANCE_GRAYSCALE, 1]);
    }

    #[test]
    fn missed_acquisition_yields_empty_payload() {
        let mock = MockTransport::new();
        let mut cam = camera(&mock);
        assert!(cam.get_distance().unwrap().is_empty());

        let mock = MockTransport::new();
        mock.push_reply(response_frame(TAU_ANS_TYPE_ACK, &[]));
        let mut cam = camera(&mock);
        assert!(matches!(
            cam.get_distance_amplitude(),
            Err(Error::ProtocolError { .. })
        ));
    }

    #[test]
    fn truncated_acquisition_drops_stale_bytes() {
        let mut payload = vec![0u8; 200];
        payload[..2].copy_from_slice(&[1, 2]);
        let mut frame = response_frame(TAU_ANS_TYPE_DISTANCE, &payload);
        frame.truncate(150);

        let mock = MockTransport::new();
        mock.push_reply(frame);
        let mut cam = camera(&mock);
        let raw = cam.read_frame_raw(FrameType::Distance).unwrap();
        assert_eq!(raw.len(), 150 - TAU_ANS_HEADER_SIZE - TAU_IMAGE_HEADER_SIZE);
        assert_eq!(mock.pending_input(), 0);
    }

    #[test]
    fn read_frame_decodes_payload() {
        let mut payload = vec![0u8; TAU_IMAGE_HEADER_SIZE];
        for _ in 0..internals::TAU_SENSOR_PIXEL_COUNT {
            payload.extend_from_slice(&2000u16.to_le_bytes());
        }
        let mock = MockTransport::new();
        mock.push_reply(response_frame(TAU_ANS_TYPE_DISTANCE, &payload));
        let mut cam = camera(&mock);
        cam.set_timeout(Duration::from_millis(500));

        let frame = cam
            .read_frame(FrameType::Distance, &FrameDecoder::default())
            .unwrap();
        assert_eq!(frame.points.len(), internals::TAU_SENSOR_PIXEL_COUNT);
        assert_eq!(frame.raw.len(), FrameType::Distance.full_frame_size());
    }

    #[test]
    fn port_claim_is_exclusive() {
        let first = TauCamera::open_with("/dev/tau-claim-test", &config(), mock_opener(vec![]))
            .unwrap();
        assert!(matches!(
            TauCamera::open_with("/dev/tau-claim-test", &config(), mock_opener(vec![])),
            Err(Error::PortBusy { .. })
        ));
        first.close();
        let again = TauCamera::open_with("/dev/tau-claim-test", &config(), mock_opener(vec![]));
        assert!(again.is_ok());
    }

    #[test]
    fn discovery_skips_failing_and_unsupported_ports() {
        let supported = response_frame(TAU_ANS_TYPE_IDENTIFICATION, &[0, 0, 5, 0]);
        let unsupported = response_frame(TAU_ANS_TYPE_IDENTIFICATION, &[0, 0, 2, 0]);

        let opener = move |port: &str, _: &SessionConfig| -> Result<Box<MockTransport>> {
            let mock = MockTransport::new();
            match port {
                "/dev/tau-disc-broken" => {
                    return Err(Error::PortOpenFailed {
                        port: port.to_owned(),
                        description: "no such device".to_owned(),
                    })
                }
                "/dev/tau-disc-old" => mock.push_reply(unsupported.clone()),
                "/dev/tau-disc-good" => mock.push_reply(supported.clone()),
                _ => {}
            }
            Ok(Box::new(mock))
        };

        let candidates = [
            "/dev/tau-disc-broken",
            "/dev/tau-disc-silent",
            "/dev/tau-disc-old",
            "/dev/tau-disc-good",
        ];
        let camera = TauCamera::discover_with(candidates, &config(), opener.clone()).unwrap();
        assert_eq!(camera.port(), "/dev/tau-disc-good");
        drop(camera);

        assert_eq!(
            TauCamera::scan_with(candidates, &config(), opener.clone()),
            vec!["/dev/tau-disc-good".to_owned()]
        );
        assert!(matches!(
            TauCamera::discover_with(&candidates[..3], &config(), opener),
            Err(Error::DeviceNotFound)
        ));
    }

    #[test]
    fn discovery_passes_over_ports_held_by_open_cameras() {
        let supported = response_frame(TAU_ANS_TYPE_IDENTIFICATION, &[0, 0, 5, 0]);
        let candidates = ["/dev/tau-held-first", "/dev/tau-held-second"];

        let held = TauCamera::open_with(candidates[0], &config(), mock_opener(vec![])).unwrap();

        let camera =
            TauCamera::discover_with(candidates, &config(), mock_opener(vec![supported.clone()]))
                .unwrap();
        assert_eq!(camera.port(), "/dev/tau-held-second");
        drop(camera);

        assert_eq!(
            TauCamera::scan_with(candidates, &config(), mock_opener(vec![supported])),
            vec!["/dev/tau-held-second".to_owned()]
        );
        assert_eq!(held.port(), "/dev/tau-held-first");
    }
}
