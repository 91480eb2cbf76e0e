use crate::base::{Error, Result};
use crate::color::Colorizer;
use crate::internals::*;
use crate::parsers::pixel_parser::*;
use crate::types::{ColorMode, DecoderConfig, Frame, FrameType, Point3d, Rgb};
use log::{trace, warn};
use std::f64::consts::PI;
use std::sync::Arc;

/// Horizontal field of view in degrees.
pub const TAU_FOV_HORIZONTAL_DEG: f64 = 50.0;

/// Vertical field of view in degrees.
pub const TAU_FOV_VERTICAL_DEG: f64 = 18.75;

/// Ray angles of the sensor grid.
#[derive(Debug, Clone, Copy)]
struct Projection {
    theta_h: f64,
    theta_v: f64,
    alpha_h: f64,
    alpha_v: f64,
}

impl Projection {
    fn new() -> Projection {
        let theta_h = TAU_FOV_HORIZONTAL_DEG.to_radians();
        let theta_v = TAU_FOV_VERTICAL_DEG.to_radians();
        Projection {
            theta_h,
            theta_v,
            alpha_h: (PI - theta_h) / 2.0,
            alpha_v: 2.0 * PI - theta_v / 2.0,
        }
    }

    #[inline]
    fn gamma_h(&self, x: usize) -> f64 {
        self.alpha_h + x as f64 * (self.theta_h / TAU_SENSOR_WIDTH as f64)
    }

    #[inline]
    fn gamma_v(&self, y: usize) -> f64 {
        self.alpha_v + y as f64 * (self.theta_v / TAU_SENSOR_HEIGHT as f64)
    }

    /// Projects a distance in millimeters seen by pixel `(x, y)` to meters.
    #[inline]
    fn project(&self, x: usize, y: usize, distance: u16) -> (f64, f64, f64) {
        let gamma_h = self.gamma_h(x);
        let gamma_v = self.gamma_v(y);
        let z = (0.001 * distance as f64 * gamma_h.sin()).abs() * gamma_v.cos().abs();
        (z / gamma_h.tan(), -z * gamma_v.tan(), z)
    }
}

/// Turns raw acquisition payloads into `Frame`s.
///
/// A decoder owns its color settings, so decoders configured differently
/// can run side by side. Decoding only reads `self`.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    config: DecoderConfig,
    colorizer: Colorizer,
    projection: Projection,
}

impl FrameDecoder {
    /// Creates a decoder, failing with `Error::InvalidRange` if the color range is empty.
    pub fn new(config: DecoderConfig) -> Result<FrameDecoder> {
        Ok(FrameDecoder {
            colorizer: Colorizer::with_range(config.near, config.far)?,
            config,
            projection: Projection::new(),
        })
    }

    /// Color settings in use.
    #[inline]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Colorizer built from the current range.
    #[inline]
    pub fn colorizer(&self) -> &Colorizer {
        &self.colorizer
    }

    /// Switches how valid pixels are colored.
    pub fn set_color_mode(&mut self, color_mode: ColorMode) {
        self.config.color_mode = color_mode;
    }

    /// Changes the color range; the previous range stays on error.
    pub fn set_range(&mut self, near: f64, far: f64) -> Result<()> {
        self.colorizer.configure_range(near, far)?;
        self.config.near = near;
        self.config.far = far;
        Ok(())
    }

    fn valid_color(&self, record: &PixelRecord, distance: u16, frame_type: FrameType) -> Rgb {
        match self.config.color_mode {
            ColorMode::Distance => self.colorizer.color_for(distance),
            ColorMode::Grayscale => match frame_type {
                FrameType::Distance => Rgb::gray(self.colorizer.grayscale_for(distance)),
                _ => Rgb::gray(record.intensity.min(u8::MAX as u16) as u8),
            },
        }
    }

    /// Decodes a full-frame payload, image header already stripped.
    ///
    /// Payloads shorter than 9600 records of `frame_type` are rejected with
    /// `Error::MalformedFrame`; trailing bytes beyond that are ignored.
    pub fn decode(&self, raw: impl Into<Arc<[u8]>>, frame_type: FrameType) -> Result<Frame> {
        let raw: Arc<[u8]> = raw.into();
        let expected = frame_type.full_frame_size();
        if raw.len() < expected {
            warn!("Bad frame ignored, bytes length: {}", raw.len());
            return Err(Error::MalformedFrame {
                expected,
                actual: raw.len(),
            });
        }
        trace!(
            "Decoding {:?} frame of {} bytes ({:?})",
            frame_type,
            raw.len(),
            self.config
        );

        let mut depth = Vec::with_capacity(TAU_SENSOR_PIXEL_COUNT);
        let mut depth_rgb = Vec::with_capacity(TAU_SENSOR_PIXEL_COUNT * 3);
        let mut grayscale = Vec::with_capacity(TAU_SENSOR_PIXEL_COUNT);
        let mut saturation_mask = Vec::with_capacity(TAU_SENSOR_PIXEL_COUNT);
        let mut points = Vec::new();

        for index in 0..TAU_SENSOR_PIXEL_COUNT {
            let x = index % TAU_SENSOR_WIDTH;
            let y = index / TAU_SENSOR_WIDTH;
            let record = parse_pixel(&raw, index, frame_type);
            let class = classify(record.distance);

            let color = match class {
                PixelClass::Valid(distance) => {
                    let color = self.valid_color(&record, distance, frame_type);
                    let (px, py, pz) = self.projection.project(x, y, distance);
                    points.push(Point3d {
                        x: px as f32,
                        y: py as f32,
                        z: pz as f32,
                        r: color.r,
                        g: color.g,
                        b: color.b,
                    });
                    depth.push(pz as f32);
                    color
                }
                other => {
                    depth.push(f32::NAN);
                    self.colorizer.color_for_class(other)
                }
            };

            saturation_mask.push(if class.is_saturated() { 255 } else { 0 });
            grayscale.push(record.intensity);
            depth_rgb.extend_from_slice(&[color.b, color.g, color.r]);
        }

        trace!("Decoded frame with {} valid points", points.len());
        Ok(Frame {
            width: TAU_SENSOR_WIDTH,
            height: TAU_SENSOR_HEIGHT,
            frame_type,
            depth,
            depth_rgb,
            grayscale,
            saturation_mask,
            points,
            raw,
        })
    }
}

impl Default for FrameDecoder {
    fn default() -> FrameDecoder {
        FrameDecoder {
            config: DecoderConfig::default(),
            colorizer: Colorizer::new(),
            projection: Projection::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::SATURATION_COLOR;

    fn grayscale_payload(pixels: &[(usize, u8, u16)]) -> Vec<u8> {
        // every other pixel reports low amplitude
        let mut raw = Vec::with_capacity(FrameType::DistanceGrayscale.full_frame_size());
        for _ in 0..TAU_SENSOR_PIXEL_COUNT {
            raw.push(0);
            raw.extend_from_slice(&TAU_PIXEL_LOW_AMPLITUDE.to_le_bytes());
        }
        for &(index, gray, distance) in pixels {
            raw[index * 3] = gray;
            raw[index * 3 + 1..index * 3 + 3].copy_from_slice(&distance.to_le_bytes());
        }
        raw
    }

    fn pixel_index(x: usize, y: usize) -> usize {
        y * TAU_SENSOR_WIDTH + x
    }

    #[test]
    fn short_payload_is_rejected() {
        let decoder = FrameDecoder::default();
        let raw = vec![0u8; 28_799];
        match decoder.decode(raw, FrameType::DistanceGrayscale) {
            Err(Error::MalformedFrame { expected, actual }) => {
                assert_eq!(expected, 28_800);
                assert_eq!(actual, 28_799);
            }
            other => panic!("unexpected result: {:?}", other.map(|f| f.points.len())),
        }
    }

    #[test]
    fn corner_pixel_matches_projection() {
        let decoder = FrameDecoder::default();
        let frame = decoder
            .decode(grayscale_payload(&[(0, 100, 2000)]), FrameType::DistanceGrayscale)
            .unwrap();

        let theta_h = 50f64.to_radians();
        let theta_v = 18.75f64.to_radians();
        let gamma_h = (PI - theta_h) / 2.0;
        let gamma_v = 2.0 * PI - theta_v / 2.0;
        let z = 2000.0 * gamma_h.sin() * gamma_v.cos() / 1000.0;

        assert_eq!(frame.points.len(), 1);
        assert!((frame.depth[0] as f64 - z).abs() < 1e-6);
        assert!((frame.points[0].z as f64 - z).abs() < 1e-6);
        assert!((frame.points[0].x as f64 - z / gamma_h.tan()).abs() < 1e-6);
        assert!((frame.points[0].y as f64 + z * gamma_v.tan()).abs() < 1e-6);

        let expected = decoder.colorizer().color_for(2000);
        assert_eq!(&frame.depth_rgb[..3], &[expected.b, expected.g, expected.r]);
        assert_eq!(
            (frame.points[0].r, frame.points[0].g, frame.points[0].b),
            (expected.r, expected.g, expected.b)
        );
        assert_eq!(frame.grayscale[0], 100);
        assert_eq!(frame.saturation_mask[0], 0);
    }

    #[test]
    fn center_ray_has_no_horizontal_offset() {
        let decoder = FrameDecoder::default();
        let frame = decoder
            .decode(
                grayscale_payload(&[(pixel_index(80, 30), 0, 3000)]),
                FrameType::DistanceGrayscale,
            )
            .unwrap();
        assert_eq!(frame.points.len(), 1);
        assert!(frame.points[0].x.abs() < 1e-4);
        assert!(frame.points[0].y.abs() < 1e-4);
        assert!(frame.points[0].z > 2.9);
    }

    #[test]
    fn horizontal_angle_grows_along_a_row() {
        let projection = Projection::new();
        let mut previous = projection.gamma_h(0);
        for x in 1..TAU_SENSOR_WIDTH {
            let gamma = projection.gamma_h(x);
            assert!(gamma > previous);
            previous = gamma;
        }
        let mut previous = projection.gamma_v(0);
        for y in 1..TAU_SENSOR_HEIGHT {
            let gamma = projection.gamma_v(y);
            assert!(gamma > previous);
            previous = gamma;
        }
    }

    #[test]
    fn saturated_pixel_is_flagged_and_dropped() {
        let decoder = FrameDecoder::default();
        let index = pixel_index(5, 7);
        let frame = decoder
            .decode(
                grayscale_payload(&[(index, 42, TAU_PIXEL_SATURATION | 0xC000)]),
                FrameType::DistanceGrayscale,
            )
            .unwrap();
        assert!(frame.points.is_empty());
        assert!(frame.depth[index].is_nan());
        assert_eq!(frame.saturation_mask[index], 255);
        assert_eq!(frame.grayscale[index], 42);
        assert_eq!(
            &frame.depth_rgb[index * 3..index * 3 + 3],
            &[SATURATION_COLOR.b, SATURATION_COLOR.g, SATURATION_COLOR.r]
        );
    }

    #[test]
    fn every_pixel_fills_the_maps() {
        let decoder = FrameDecoder::default();
        let frame = decoder
            .decode(grayscale_payload(&[]), FrameType::DistanceGrayscale)
            .unwrap();
        assert_eq!(frame.depth.len(), TAU_SENSOR_PIXEL_COUNT);
        assert_eq!(frame.grayscale.len(), TAU_SENSOR_PIXEL_COUNT);
        assert_eq!(frame.depth_rgb.len(), TAU_SENSOR_PIXEL_COUNT * 3);
        assert_eq!(frame.saturation_mask.len(), TAU_SENSOR_PIXEL_COUNT);
        assert!(frame.points.is_empty());
        assert!(frame.depth.iter().all(|d| d.is_nan()));
    }

    #[test]
    fn decoding_is_idempotent() {
        let decoder = FrameDecoder::default();
        let raw: Arc<[u8]> = grayscale_payload(&[(0, 1, 1500), (9599, 200, 3999), (4000, 7, 16002)]).into();
        let a = decoder.decode(raw.clone(), FrameType::DistanceGrayscale).unwrap();
        let b = decoder.decode(raw, FrameType::DistanceGrayscale).unwrap();

        let bits = |d: &[f32]| d.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.depth), bits(&b.depth));
        assert_eq!(a.depth_rgb, b.depth_rgb);
        assert_eq!(a.grayscale, b.grayscale);
        assert_eq!(a.saturation_mask, b.saturation_mask);
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn grayscale_mode_colors_from_intensity() {
        let config = DecoderConfig::default().with_color_mode(ColorMode::Grayscale);
        let decoder = FrameDecoder::new(config).unwrap();
        let frame = decoder
            .decode(grayscale_payload(&[(0, 90, 2000)]), FrameType::DistanceGrayscale)
            .unwrap();
        assert_eq!(&frame.depth_rgb[..3], &[90, 90, 90]);
        assert_eq!((frame.points[0].r, frame.points[0].g, frame.points[0].b), (90, 90, 90));
    }

    #[test]
    fn amplitude_frames_keep_amplitude() {
        let decoder = FrameDecoder::default();
        let mut raw = vec![0u8; FrameType::DistanceAmplitude.full_frame_size()];
        raw[0..2].copy_from_slice(&2500u16.to_le_bytes());
        raw[2..4].copy_from_slice(&1234u16.to_le_bytes());
        let frame = decoder.decode(raw, FrameType::DistanceAmplitude).unwrap();
        assert_eq!(frame.grayscale[0], 1234);
        assert_eq!(frame.frame_type, FrameType::DistanceAmplitude);
        // zero distances are valid measurements
        assert_eq!(frame.points.len(), TAU_SENSOR_PIXEL_COUNT);
    }

    #[test]
    fn distance_frames_in_grayscale_mode_scale_distance() {
        let config = DecoderConfig::default().with_color_mode(ColorMode::Grayscale);
        let decoder = FrameDecoder::new(config).unwrap();
        let mut raw = vec![0u8; FrameType::Distance.full_frame_size()];
        raw[0..2].copy_from_slice(&3500u16.to_le_bytes());
        let frame = decoder.decode(raw, FrameType::Distance).unwrap();
        assert_eq!(&frame.depth_rgb[..3], &[255, 255, 255]);
        assert_eq!(frame.grayscale[0], 0);
    }

    #[test]
    fn independent_decoders_keep_their_own_range() {
        let mut narrow = FrameDecoder::default();
        narrow.set_range(1900.0, 2100.0).unwrap();
        let wide = FrameDecoder::default();
        assert!(narrow.set_range(5.0, 1.0).is_err());
        assert_eq!(narrow.config().near, 1900.0);

        let raw: Arc<[u8]> = grayscale_payload(&[(0, 0, 2050)]).into();
        let a = narrow.decode(raw.clone(), FrameType::DistanceGrayscale).unwrap();
        let b = wide.decode(raw, FrameType::DistanceGrayscale).unwrap();
        assert_ne!(a.depth_rgb[..3], b.depth_rgb[..3]);
    }
}
