//! # Coordinate Mapper
//!
//! Device space (tablet units) to raster space (pixels).
//!
//! ```text
//!   device (0..max_x, 0..max_y)          raster (0..width, 0..height)
//!   ┌──────────────────────┐             ┌──────────┐
//!   │            • (x, y)  │   ──map──►  │    •     │
//!   └──────────────────────┘             │ (px, py) │
//!                                        └──────────┘
//! ```
//!
//! The tablet can be mounted in more than one way, so which device axis
//! drives which raster axis (and whether it runs backwards) is an
//! [`Orientation`], not a constant.
//!
//! Results are NOT clamped. A sample beyond the device maxima, or a negative
//! sample, maps outside the raster; the raster lookup turns that into 0.

use serde::Deserialize;

use crate::raster::RasterGeometry;
use crate::wire::PointerSample;

/// Pixel coordinate in raster space. May lie outside the raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelCoord {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
}

impl PixelCoord {
    /// Creates a pixel coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Device-declared coordinate maxima.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeviceExtents {
    /// Largest X the device reports.
    pub max_x: i32,
    /// Largest Y the device reports.
    pub max_y: i32,
}

impl DeviceExtents {
    /// Creates device extents.
    #[inline]
    #[must_use]
    pub const fn new(max_x: i32, max_y: i32) -> Self {
        Self { max_x, max_y }
    }
}

impl Default for DeviceExtents {
    fn default() -> Self {
        Self::new(crate::DEFAULT_DEVICE_MAX_X, crate::DEFAULT_DEVICE_MAX_Y)
    }
}

/// How device axes land on raster axes.
///
/// Inversion is applied to the *raster* axis after any swap:
/// `invert_x` flips columns, `invert_y` flips rows. Fields missing from a
/// config table default to `false`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Orientation {
    /// Device X drives raster rows and device Y drives raster columns.
    pub swap_axes: bool,
    /// Column 0 is at the far end of its device axis.
    pub invert_x: bool,
    /// Row 0 is at the far end of its device axis.
    pub invert_y: bool,
}

impl Orientation {
    /// Device X to columns, device Y to rows, no inversion.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            swap_axes: false,
            invert_x: false,
            invert_y: false,
        }
    }

    /// Tablet mounted a quarter turn to the portrait raster:
    /// columns run against device Y, rows follow device X.
    #[must_use]
    pub const fn rotated() -> Self {
        Self {
            swap_axes: true,
            invert_x: true,
            invert_y: false,
        }
    }
}

/// Maps pointer samples into raster pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    device: DeviceExtents,
    raster_width: u32,
    raster_height: u32,
    orientation: Orientation,
}

impl CoordinateMapper {
    /// Creates a mapper for the given device, raster and mounting.
    #[must_use]
    pub const fn new(device: DeviceExtents, geometry: RasterGeometry, orientation: Orientation) -> Self {
        Self {
            device,
            raster_width: geometry.width(),
            raster_height: geometry.height(),
            orientation,
        }
    }

    /// Returns the configured orientation.
    #[inline]
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Maps a sample to a pixel, or `None` for the pen-lift sentinel.
    ///
    /// Each axis is computed as `floor(value * extent / device_max)` in `f64`:
    /// the product of two 32-bit integers is exact in a double, so there is
    /// neither integer overflow nor truncation before scaling.
    #[must_use]
    pub fn map(&self, sample: PointerSample) -> Option<PixelCoord> {
        if sample.is_lifted() {
            return None;
        }

        let (for_x, max_for_x, for_y, max_for_y) = if self.orientation.swap_axes {
            (sample.y, self.device.max_y, sample.x, self.device.max_x)
        } else {
            (sample.x, self.device.max_x, sample.y, self.device.max_y)
        };

        Some(PixelCoord::new(
            scale_axis(for_x, max_for_x, self.raster_width, self.orientation.invert_x),
            scale_axis(for_y, max_for_y, self.raster_height, self.orientation.invert_y),
        ))
    }
}

#[inline]
#[allow(clippy::cast_possible_truncation)]
fn scale_axis(value: i32, device_max: i32, extent: u32, invert: bool) -> i64 {
    let device_max = f64::from(device_max);
    let numerator = if invert {
        device_max - f64::from(value)
    } else {
        f64::from(value)
    };

    // `as` saturates on overflow and maps NaN to 0; a degenerate device_max
    // is rejected by config validation before a mapper is ever built.
    (numerator * f64::from(extent) / device_max).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(width: u32, height: u32, orientation: Orientation) -> CoordinateMapper {
        CoordinateMapper::new(
            DeviceExtents::new(21600, 13500),
            RasterGeometry::new(width, height),
            orientation,
        )
    }

    #[test]
    fn test_lifted_sentinel() {
        let m = mapper(480, 300, Orientation::identity());
        assert_eq!(m.map(PointerSample::new(0, 0)), None);
        assert_eq!(m.map(PointerSample::new(0, 1)), Some(PixelCoord::new(0, 0)));
    }

    #[test]
    fn test_identity_mapping() {
        let m = mapper(480, 300, Orientation::identity());
        assert_eq!(m.map(PointerSample::new(10800, 6750)), Some(PixelCoord::new(240, 150)));
        assert_eq!(m.map(PointerSample::new(21599, 13499)), Some(PixelCoord::new(479, 299)));
        assert_eq!(m.map(PointerSample::new(21600, 13500)), Some(PixelCoord::new(480, 300)));
    }

    #[test]
    fn test_exact_pixel_boundaries() {
        let m = mapper(480, 300, Orientation::identity());
        // 45 device units per column, 45 per row: every boundary is exact
        for px in 0..480i64 {
            let x = i32::try_from(px * 45).unwrap();
            assert_eq!(m.map(PointerSample::new(x, 1)).unwrap().x, px);
        }
    }

    #[test]
    fn test_rotated_mapping() {
        let m = mapper(300, 480, Orientation::rotated());
        // column = 300 - y * 300 / 13500, row = x * 480 / 21600
        assert_eq!(m.map(PointerSample::new(10800, 6750)), Some(PixelCoord::new(150, 240)));
        assert_eq!(m.map(PointerSample::new(21600, 1)), Some(PixelCoord::new(299, 480)));
        // y = 0 lands one past the last column
        assert_eq!(m.map(PointerSample::new(45, 0)), Some(PixelCoord::new(300, 1)));
    }

    #[test]
    fn test_inverted_rows() {
        let orientation = Orientation {
            invert_y: true,
            ..Orientation::identity()
        };
        let m = mapper(480, 300, orientation);
        assert_eq!(m.map(PointerSample::new(45, 13455)), Some(PixelCoord::new(1, 1)));
    }

    #[test]
    fn test_out_of_range_is_not_clamped() {
        let m = mapper(480, 300, Orientation::identity());
        assert_eq!(m.map(PointerSample::new(-45, 6750)), Some(PixelCoord::new(-1, 150)));
        let far = m.map(PointerSample::new(i32::MAX, i32::MAX)).unwrap();
        assert!(far.x > 480 && far.y > 300);
    }

    #[test]
    fn test_random_samples_match_integer_floor() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let identity = mapper(480, 300, Orientation::identity());
        let rotated = mapper(300, 480, Orientation::rotated());
        let mut rng = StdRng::seed_from_u64(0x5CA1E);

        for _ in 0..20_000 {
            let x: i32 = rng.gen_range(-1_000..23_000);
            let y: i32 = rng.gen_range(-1_000..14_500);
            let sample = PointerSample::new(x, y);
            if sample.is_lifted() {
                continue;
            }
            let (x, y) = (i64::from(x), i64::from(y));

            assert_eq!(
                identity.map(sample),
                Some(PixelCoord::new((x * 480).div_euclid(21600), (y * 300).div_euclid(13500))),
                "identity {sample:?}"
            );
            assert_eq!(
                rotated.map(sample),
                Some(PixelCoord::new(
                    ((13500 - y) * 300).div_euclid(13500),
                    (x * 480).div_euclid(21600)
                )),
                "rotated {sample:?}"
            );
        }
    }
}
