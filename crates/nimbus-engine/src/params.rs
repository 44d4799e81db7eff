//! Per-frame kernel parameters.
//!
//! Everything here is a pure function of a single time input, so a fixed
//! synthetic time always reproduces the same frame arguments.
use crate::error::DispatchError;
use crate::kernel::abi::Slot;

/// Orbit radius of the camera around the origin.
pub const ORBIT_RADIUS: f64 = 2.0;

/// Nanoseconds per unit of orbit angle (before the degree conversion).
const ORBIT_PERIOD_NANOS: f64 = 1e11;

/// Nanoseconds per radian of the shape oscillation.
const SHAPE_PERIOD_NANOS: f64 = 5e9;

const SHAPE_CENTER: f32 = 7.0;
const SHAPE_AMPLITUDE: f32 = 2.0;

/// Base direction rotated by the orbit angle to produce the orientation.
const BASE_X: f64 = -1.0;
const BASE_Z: f64 = 0.0;

/// Kernel arguments 3-5 for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameParameters {
    /// Camera position; orbits the origin in the X-Z plane at height 0.
    pub camera_position: [f32; 3],

    /// Rotated 2-D direction consumed by the kernel as the view azimuth.
    pub orientation: [f32; 2],

    /// Scalar shape parameter in `[5, 9]`.
    pub shape: f32,
}

impl FrameParameters {
    /// Rejects non-finite values before they reach an argument slot.
    pub fn validate(&self) -> Result<(), DispatchError> {
        let check = |slot: Slot, values: &[f32]| {
            if values.iter().all(|v| v.is_finite()) {
                Ok(())
            } else {
                Err(DispatchError::InvalidArgument {
                    slot: slot.index(),
                    reason: format!("{} contains a non-finite value: {values:?}", slot.name()),
                })
            }
        };
        check(Slot::Camera, &self.camera_position)?;
        check(Slot::Orientation, &self.orientation)?;
        check(Slot::Shape, &[self.shape])
    }
}

/// Derives the frame parameters for `time_nanos`.
///
/// The orbit angle is computed as `to_degrees(t / 1e11)` and then passed to
/// `sin`/`cos`, which take radians. The mix is kept as-is so frames match the
/// established camera motion; the effective angular speed is therefore
/// `180/pi` times what the formula suggests.
pub fn derive_parameters(time_nanos: u64) -> FrameParameters {
    let t = time_nanos as f64;

    let angle = (t / ORBIT_PERIOD_NANOS).to_degrees() as f32;
    let (sin, cos) = f64::from(angle).sin_cos();

    let camera_position = [
        (-ORBIT_RADIUS * sin) as f32,
        0.0,
        (-ORBIT_RADIUS * cos) as f32,
    ];

    let orientation = [
        (BASE_X * cos + BASE_Z * sin) as f32,
        (-BASE_X * sin + BASE_Z * cos) as f32,
    ];

    let shape = (t / SHAPE_PERIOD_NANOS).sin() as f32 * SHAPE_AMPLITUDE + SHAPE_CENTER;

    FrameParameters {
        camera_position,
        orientation,
        shape,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_times() -> impl Iterator<Item = u64> {
        let fixed = [
            0,
            1,
            999_999_999,
            5_000_000_000,
            7_853_981_634, // ~ pi/2 * 5e9, shape peak
            100_000_000_000,
            628_318_530_718,
            u64::MAX / 2,
        ];
        fixed.into_iter().chain((0..2_000u64).map(|i| i * 12_345_678_901))
    }

    #[test]
    fn deterministic_for_same_time() {
        for t in sample_times() {
            let a = derive_parameters(t);
            let b = derive_parameters(t);
            assert_eq!(a.camera_position.map(f32::to_bits), b.camera_position.map(f32::to_bits));
            assert_eq!(a.orientation.map(f32::to_bits), b.orientation.map(f32::to_bits));
            assert_eq!(a.shape.to_bits(), b.shape.to_bits());
        }
    }

    #[test]
    fn camera_stays_on_orbit() {
        for t in sample_times() {
            let [x, y, z] = derive_parameters(t).camera_position;
            assert_eq!(y, 0.0);
            let r = (f64::from(x).powi(2) + f64::from(z).powi(2)).sqrt();
            assert_relative_eq!(r, ORBIT_RADIUS, epsilon = 1e-5);
        }
    }

    #[test]
    fn shape_within_bounds() {
        for t in sample_times() {
            let s = derive_parameters(t).shape;
            assert!((5.0..=9.0).contains(&s), "shape {s} at t={t}");
        }
    }

    #[test]
    fn time_zero_values() {
        let p = derive_parameters(0);
        assert_eq!(p.camera_position, [0.0, 0.0, -2.0]);
        assert_eq!(p.orientation, [-1.0, 0.0]);
        assert_eq!(p.shape, 7.0);
    }

    #[test]
    fn angle_is_degrees_fed_to_radian_trig() {
        // t = 1e11 ns -> angle = 57.29578 "degrees", used directly as radians
        let p = derive_parameters(100_000_000_000);
        let angle = f64::from(1f64.to_degrees() as f32);
        assert_relative_eq!(f64::from(p.camera_position[0]), -2.0 * angle.sin(), epsilon = 1e-6);
        assert_relative_eq!(f64::from(p.camera_position[2]), -2.0 * angle.cos(), epsilon = 1e-6);
        assert_relative_eq!(f64::from(p.orientation[0]), -angle.cos(), epsilon = 1e-6);
        assert_relative_eq!(f64::from(p.orientation[1]), angle.sin(), epsilon = 1e-6);
    }

    #[test]
    fn orientation_is_unit_length() {
        for t in sample_times() {
            let [x, z] = derive_parameters(t).orientation;
            let len = (f64::from(x).powi(2) + f64::from(z).powi(2)).sqrt();
            assert_relative_eq!(len, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn validate_rejects_nan() {
        let mut p = derive_parameters(42);
        assert!(p.validate().is_ok());
        p.orientation[1] = f32::NAN;
        match p.validate() {
            Err(DispatchError::InvalidArgument { slot, .. }) => assert_eq!(slot, 4),
            other => panic!("unexpected {other:?}"),
        }
    }
}
