//! Pseudo-color lookup for depth maps.

use crate::base::Result;
use crate::internals::{TAU_DEFAULT_RANGE_FAR, TAU_DEFAULT_RANGE_NEAR};
use crate::parsers::pixel_parser::*;
use crate::types::{validate_range, Rgb};
use log::trace;

/// Number of entries in the color ramp.
pub const TAU_COLOR_STEPS: usize = 6000;

// Phase boundaries of the three piecewise-linear channels, over the
// normalized index shifted by a quarter.
const PHASE_SHIFT: f64 = 0.25;

const B0: f64 = -0.375;
const B1: f64 = -0.125;
const B2: f64 = 0.125;
const B3: f64 = 0.375;

const G0: f64 = B1;
const G1: f64 = 0.125;
const G2: f64 = 0.375;
const G3: f64 = 0.75;

const R0: f64 = B2;
const R1: f64 = 0.375;
const R2: f64 = 0.625;
const R3: f64 = 1.125;

/// Color of distances outside the configured range.
pub const OUT_OF_RANGE_COLOR: Rgb = Rgb::new(127, 127, 127);

pub const SATURATION_COLOR: Rgb = Rgb::new(255, 0, 128);
pub const ADC_OVERFLOW_COLOR: Rgb = Rgb::new(169, 14, 255);
pub const INTERFERENCE_COLOR: Rgb = Rgb::new(255, 255, 255);
pub const EDGE_DETECTED_COLOR: Rgb = Rgb::new(0, 0, 0);
pub const LOW_AMPLITUDE_COLOR: Rgb = Rgb::new(0, 0, 0);

fn interpolate(x: f64, x0: f64, y0: f64, x1: f64, y1: f64) -> u8 {
    if x1 == x0 {
        return y0 as u8;
    }
    ((x - x0) * (y1 - y0) / (x1 - x0) + y0) as u8
}

/// Rising ramp on `[x0, x1)`, full on `[x1, x2)`, falling ramp on `[x2, x3)`.
fn channel(i: f64, x0: f64, x1: f64, x2: f64, x3: f64) -> u8 {
    if i >= x0 && i < x1 {
        interpolate(i, x0, 0.0, x1, 255.0)
    } else if i >= x1 && i < x2 {
        255
    } else if i >= x2 && i < x3 {
        interpolate(i, x2, 255.0, x3, 0.0)
    } else {
        0
    }
}

fn build_ramp() -> Vec<Rgb> {
    (0..TAU_COLOR_STEPS)
        .map(|idx| {
            let i = idx as f64 / TAU_COLOR_STEPS as f64 - PHASE_SHIFT;
            Rgb::new(
                channel(i, R0, R1, R2, R3),
                channel(i, G0, G1, G2, G3),
                channel(i, B0, B1, B2, B3),
            )
        })
        .collect()
}

/// Maps distances to pseudo-colors and gray levels.
///
/// The ramp runs from dark blue (index 0) through cyan, green and yellow to
/// red. Near distances land on the red end, far ones on the blue end.
#[derive(Debug, Clone)]
pub struct Colorizer {
    ramp: Vec<Rgb>,
    near: f64,
    far: f64,
    index_factor: f64,
    gray_factor: f64,
}

impl Colorizer {
    /// Builds the ramp with the default 1000..4000 mm range.
    pub fn new() -> Colorizer {
        let mut colorizer = Colorizer {
            ramp: build_ramp(),
            near: TAU_DEFAULT_RANGE_NEAR,
            far: TAU_DEFAULT_RANGE_FAR,
            index_factor: 0.0,
            gray_factor: 0.0,
        };
        colorizer.update_factors();
        colorizer
    }

    /// Builds the ramp for a given range.
    pub fn with_range(near: f64, far: f64) -> Result<Colorizer> {
        let mut colorizer = Colorizer::new();
        colorizer.configure_range(near, far)?;
        Ok(colorizer)
    }

    /// Sets the distance range in millimeters. The ramp itself is not rebuilt.
    pub fn configure_range(&mut self, near: f64, far: f64) -> Result<()> {
        validate_range(near, far)?;
        trace!("Color range set to {}..{} mm", near, far);
        self.near = near;
        self.far = far;
        self.update_factors();
        Ok(())
    }

    fn update_factors(&mut self) {
        let span = self.far - self.near;
        self.index_factor = TAU_COLOR_STEPS as f64 / span;
        self.gray_factor = 255.0 / span;
    }

    /// Current `(near, far)` range in millimeters.
    #[inline]
    pub fn range(&self) -> (f64, f64) {
        (self.near, self.far)
    }

    /// Ramp entry for an in-range distance, `None` outside `[near, far]`.
    pub fn ramp_index(&self, distance: u16) -> Option<usize> {
        let offset = distance as f64 - self.near;
        if offset < 0.0 || distance as f64 > self.far {
            return None;
        }
        let computed = (offset * self.index_factor) as i64 - 1;
        let index = TAU_COLOR_STEPS as i64 - 1 - computed;
        Some(index.clamp(0, TAU_COLOR_STEPS as i64 - 1) as usize)
    }

    /// Color of a raw distance code.
    ///
    /// Sentinel codes get their fixed color whatever the range, 0 maps to
    /// the first ramp entry.
    pub fn color_for(&self, distance: u16) -> Rgb {
        match distance {
            TAU_PIXEL_SATURATION => SATURATION_COLOR,
            TAU_PIXEL_ADC_OVERFLOW => ADC_OVERFLOW_COLOR,
            TAU_PIXEL_INTERFERENCE => INTERFERENCE_COLOR,
            TAU_PIXEL_EDGE_DETECTED => EDGE_DETECTED_COLOR,
            TAU_PIXEL_LOW_AMPLITUDE => LOW_AMPLITUDE_COLOR,
            0 => self.ramp[0],
            d => match self.ramp_index(d) {
                Some(index) => self.ramp[index],
                None => OUT_OF_RANGE_COLOR,
            },
        }
    }

    /// Color of a classified pixel.
    pub fn color_for_class(&self, class: PixelClass) -> Rgb {
        match class {
            PixelClass::Valid(d) => self.color_for(d),
            PixelClass::LowAmplitude => LOW_AMPLITUDE_COLOR,
            PixelClass::AdcOverflow => ADC_OVERFLOW_COLOR,
            PixelClass::Saturation => SATURATION_COLOR,
            PixelClass::Interference => INTERFERENCE_COLOR,
            PixelClass::EdgeDetected => EDGE_DETECTED_COLOR,
        }
    }

    /// Linear gray level of a distance, `d * 255 / (far - near)` clamped to `[0, 255]`.
    pub fn grayscale_for(&self, distance: u16) -> u8 {
        (distance as f64 * self.gray_factor).clamp(0.0, 255.0) as u8
    }
}

impl Default for Colorizer {
    fn default() -> Colorizer {
        Colorizer::new()
    }
}
