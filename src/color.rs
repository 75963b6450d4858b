//! Disk color encoding.
//!
//! A position on the unit disk maps to HSL: the angle picks the hue
//! (rotated a quarter turn, so with y growing downward as on screen the top
//! of the disk is red), the radius is the saturation and lightness is fixed. The same mapping rasterizes the background color
//! wheel and colors individual samples.

use crate::error::ConfigError;
use crate::geometry::constrain_to_unit_disk;
use crate::Point2;
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, TAU};
use tracing::debug;

/// Lightness used throughout unless configured otherwise.
pub const DEFAULT_LIGHTNESS: f64 = 0.55;

/// Squared-radius threshold for disk membership.
pub const DISK_RADIUS_SQ: f64 = 0.999999;

/// Fill used for every in-disk pixel in flat mode (`#C7D9E8`).
pub const FLAT_COLOR: Rgb = Rgb { r: 199, g: 217, b: 232 };

const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Hue in degrees `[0, 360)`, saturation and lightness in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }

    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

fn hue_channel(h: f64, m1: f64, m2: f64) -> f64 {
    let v = if h < 60.0 {
        m1 + (m2 - m1) * h / 60.0
    } else if h < 180.0 {
        m2
    } else if h < 240.0 {
        m1 + (m2 - m1) * (240.0 - h) / 60.0
    } else {
        m1
    };
    v * 255.0
}

fn to_byte(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Standard HSL → RGB conversion, rounded to 8-bit channels.
pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let h = hsl.h.rem_euclid(360.0);
    let s = if hsl.s.is_nan() { 0.0 } else { hsl.s };
    let l = hsl.l;
    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;
    Rgb {
        r: to_byte(hue_channel(if h >= 240.0 { h - 240.0 } else { h + 120.0 }, m1, m2)),
        g: to_byte(hue_channel(h, m1, m2)),
        b: to_byte(hue_channel(if h < 120.0 { h + 240.0 } else { h - 120.0 }, m1, m2)),
    }
}

/// Hue angle in radians for a disk position, in `[0, 2π]`.
fn hue_radians(x: f64, y: f64) -> f64 {
    let mut h = y.atan2(x) + FRAC_PI_2;
    if h < 0.0 {
        h += TAU;
    }
    if h > TAU {
        h -= TAU;
    }
    h
}

/// HSL for a disk position, or `None` outside the unit disk.
///
/// The point is constrained first, so anything beyond the rim lands on it
/// and fails the membership test.
pub fn coord_to_hsl(x: f64, y: f64, lightness: f64) -> Option<Hsl> {
    let (x, y) = constrain_to_unit_disk(x, y);
    if x * x + y * y > DISK_RADIUS_SQ {
        return None;
    }
    Some(Hsl {
        h: hue_radians(x, y).to_degrees().rem_euclid(360.0),
        s: x.hypot(y),
        l: lightness,
    })
}

/// Per-sample colors. Points outside the disk are pulled onto the rim and
/// colored at full saturation instead of being dropped.
pub fn color_points(points: &[Point2], lightness: f64) -> Vec<Rgb> {
    points
        .iter()
        .map(|&[x, y]| {
            let (x, y) = constrain_to_unit_disk(x, y);
            hsl_to_rgb(Hsl {
                h: hue_radians(x, y).to_degrees(),
                s: x.hypot(y),
                l: lightness,
            })
        })
        .collect()
}

/// Placement of the color disk inside a square image of `size` pixels.
///
/// This is the same linear scale the overlay uses to draw samples and
/// anchors, mapping `[-1, 1]` onto `[offset, offset + diameter]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorFieldGeometry {
    pub size: u32,
    pub diameter: f64,
    pub offset: f64,
}

impl ColorFieldGeometry {
    pub fn new(size: u32) -> Self {
        let diameter = (size as f64 * 2.4).round() / 3.1;
        let offset = (size as f64 - diameter) / 2.0;
        ColorFieldGeometry {
            size,
            diameter,
            offset,
        }
    }

    /// Disk coordinate for a pixel coordinate.
    pub fn to_disk(&self, px: f64) -> f64 {
        (px - self.offset) / self.diameter * 2.0 - 1.0
    }

    /// Pixel coordinate for a disk coordinate.
    pub fn to_pixel(&self, v: f64) -> f64 {
        self.offset + (v + 1.0) / 2.0 * self.diameter
    }

    /// Whether pixel index `p` lies in `[offset, offset + diameter)`.
    pub fn in_square(&self, p: u32) -> bool {
        let p = p as f64;
        p >= self.offset && p < self.offset + self.diameter
    }
}

/// RGBA raster of `size × size` pixels, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorField {
    pub geometry: ColorFieldGeometry,
    pub pixels: Vec<[u8; 4]>,
}

impl ColorField {
    pub fn size(&self) -> u32 {
        self.geometry.size
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[(y * self.geometry.size + x) as usize]
    }

    pub fn opaque_count(&self) -> usize {
        self.pixels.iter().filter(|p| p[3] != 0).count()
    }

    /// Flat `RGBARGBA...` bytes, ready for an image encoder or texture upload.
    pub fn as_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }
}

/// Rasterize the color wheel at the default lightness.
pub fn render_color_field(size: u32, flat_mode: bool) -> Result<ColorField, ConfigError> {
    render_color_field_with(size, flat_mode, DEFAULT_LIGHTNESS)
}

/// Rasterize the color wheel.
///
/// Pixels outside the disk's bounding square, or outside the disk itself,
/// stay transparent. In flat mode every in-disk pixel gets [`FLAT_COLOR`];
/// otherwise the hue is floored to whole degrees.
pub fn render_color_field_with(
    size: u32,
    flat_mode: bool,
    lightness: f64,
) -> Result<ColorField, ConfigError> {
    if size == 0 {
        return Err(ConfigError::ZeroSize);
    }
    if !(0.0..=1.0).contains(&lightness) {
        return Err(ConfigError::InvalidLightness(lightness));
    }

    let geometry = ColorFieldGeometry::new(size);
    let mut pixels = vec![TRANSPARENT; (size as usize) * (size as usize)];

    for py in (0..size).filter(|&p| geometry.in_square(p)) {
        let v = geometry.to_disk(py as f64);
        for px in (0..size).filter(|&p| geometry.in_square(p)) {
            let u = geometry.to_disk(px as f64);
            let color = coord_to_hsl(u, v, lightness).map(|hsl| {
                if flat_mode {
                    FLAT_COLOR
                } else {
                    hsl_to_rgb(Hsl {
                        h: hsl.h.floor(),
                        ..hsl
                    })
                }
            });
            if let Some(c) = color {
                pixels[(py * size + px) as usize] = c.to_rgba();
            }
        }
    }

    let field = ColorField { geometry, pixels };
    debug!(size, flat_mode, opaque = field.opaque_count(), "rendered color field");
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hsl_to_rgb_primaries() {
        let red = hsl_to_rgb(Hsl { h: 0.0, s: 1.0, l: 0.5 });
        assert_eq!(red, Rgb { r: 255, g: 0, b: 0 });
        let green = hsl_to_rgb(Hsl { h: 120.0, s: 1.0, l: 0.5 });
        assert_eq!(green, Rgb { r: 0, g: 255, b: 0 });
        let blue = hsl_to_rgb(Hsl { h: 240.0, s: 1.0, l: 0.5 });
        assert_eq!(blue, Rgb { r: 0, g: 0, b: 255 });
        let wrapped = hsl_to_rgb(Hsl { h: 360.0, s: 1.0, l: 0.5 });
        assert_eq!(wrapped, red);
    }

    #[test]
    fn test_zero_saturation_is_gray() {
        for h in [0.0, 77.0, 200.0, 359.0] {
            let c = hsl_to_rgb(Hsl { h, s: 0.0, l: DEFAULT_LIGHTNESS });
            assert_eq!(c, Rgb { r: 140, g: 140, b: 140 });
        }
    }

    #[test]
    fn test_hsl_matches_reference_formula() {
        // l = 0.55 > 0.5: m2 = l + s - l*s
        let c = hsl_to_rgb(Hsl { h: 30.0, s: 0.5, l: 0.55 });
        let m2: f64 = 0.55 + 0.5 - 0.55 * 0.5;
        let m1 = 2.0 * 0.55 - m2;
        assert_eq!(c.r, (m2 * 255.0).round() as u8);
        assert_eq!(c.g, ((m1 + (m2 - m1) * 0.5) * 255.0).round() as u8);
        assert_eq!(c.b, (m1 * 255.0).round() as u8);
    }

    #[test]
    fn test_hsl_low_lightness_branch() {
        // l = 0.3 <= 0.5: m2 = l * (1 + s)
        let c = hsl_to_rgb(Hsl { h: 120.0, s: 0.5, l: 0.3 });
        let m2: f64 = 0.3 * 1.5;
        let m1 = 2.0 * 0.3 - m2;
        assert_eq!(c.g, (m2 * 255.0).round() as u8);
        assert_eq!(c.r, (m1 * 255.0).round() as u8);
        assert_eq!(c.b, (m1 * 255.0).round() as u8);
        // Both branches meet at l = 0.5.
        let mid = hsl_to_rgb(Hsl { h: 0.0, s: 1.0, l: 0.5 });
        assert_eq!(mid, Rgb { r: 255, g: 0, b: 0 });
    }

    #[test]
    fn test_coord_to_hsl_orientation() {
        // +y is hue 180 after the quarter-turn offset, -y (the top on screen) is 0.
        let up = coord_to_hsl(0.0, 0.5, 0.55).unwrap();
        assert!((up.h - 180.0).abs() < 1e-9);
        assert!((up.s - 0.5).abs() < 1e-12);
        let right = coord_to_hsl(0.5, 0.0, 0.55).unwrap();
        assert!((right.h - 90.0).abs() < 1e-9);
        let down = coord_to_hsl(0.0, -0.5, 0.55).unwrap();
        assert!(down.h.abs() < 1e-9);
    }

    #[test]
    fn test_coord_outside_disk() {
        assert!(coord_to_hsl(1.0, 0.0, 0.55).is_none());
        assert!(coord_to_hsl(2.0, 2.0, 0.55).is_none());
        assert!(coord_to_hsl(0.99, 0.0, 0.55).is_some());
    }

    #[test]
    fn test_color_points_rim() {
        let colors = color_points(&[[0.0, 0.0], [3.0, 0.0]], 0.55);
        assert_eq!(colors[0], Rgb { r: 140, g: 140, b: 140 });
        // Pulled onto the rim at full saturation, never transparent.
        let rim = hsl_to_rgb(Hsl { h: 90.0, s: 1.0, l: 0.55 });
        assert_eq!(colors[1], rim);
    }

    #[test]
    fn test_geometry_constants() {
        let g = ColorFieldGeometry::new(10);
        assert!((g.diameter - 24.0 / 3.1).abs() < 1e-12);
        assert!((g.offset - (10.0 - 24.0 / 3.1) / 2.0).abs() < 1e-12);
        assert!((g.to_disk(g.to_pixel(0.25)) - 0.25).abs() < 1e-12);
        assert!(g.to_disk(5.0).abs() < 1e-12);
        assert!(!g.in_square(0));
        assert!(g.in_square(2));
        assert!(!g.in_square(9));
    }

    #[test]
    fn test_center_pixel_is_gray() {
        let field = render_color_field(10, false).unwrap();
        assert_eq!(field.pixel(5, 5), [140, 140, 140, 255]);
        assert_eq!(field.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(field.as_rgba_bytes().len(), 10 * 10 * 4);
    }

    #[test]
    fn test_flat_mode_single_color() {
        let field = render_color_field(64, true).unwrap();
        let opaque: Vec<_> = field.pixels.iter().filter(|p| p[3] != 0).collect();
        assert!(!opaque.is_empty());
        assert!(opaque.iter().all(|p| **p == FLAT_COLOR.to_rgba()));
        let shaded = render_color_field(64, false).unwrap();
        assert_eq!(field.opaque_count(), shaded.opaque_count());
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(render_color_field(0, false), Err(ConfigError::ZeroSize));
        assert_eq!(
            render_color_field_with(8, false, 1.5),
            Err(ConfigError::InvalidLightness(1.5))
        );
    }

    #[test]
    fn test_hex() {
        assert_eq!(FLAT_COLOR.hex(), "#C7D9E8");
    }

    // Opaque pixels form one filled disk inside the bounding square.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_opaque_pixels_form_disk(size in 1u32..=96, flat in any::<bool>()) {
            let field = render_color_field(size, flat).unwrap();
            let g = field.geometry;
            for py in 0..size {
                for px in 0..size {
                    let opaque = field.pixel(px, py)[3] != 0;
                    let (u, v) = (g.to_disk(px as f64), g.to_disk(py as f64));
                    let inside = g.in_square(px) && g.in_square(py) && u * u + v * v <= DISK_RADIUS_SQ;
                    prop_assert_eq!(opaque, inside, "pixel ({}, {})", px, py);
                    if opaque {
                        prop_assert!(u.hypot(v) <= 1.0);
                    }
                }
            }
            // Each opaque row is one contiguous run.
            for py in 0..size {
                let row: Vec<bool> = (0..size).map(|px| field.pixel(px, py)[3] != 0).collect();
                let runs = row.windows(2).filter(|w| !w[0] && w[1]).count()
                    + usize::from(row.first() == Some(&true));
                prop_assert!(runs <= 1);
            }
        }
    }
}
