//! Device frame domain entity and the host → device coordinate mapper.
//!
//! The device frame is the rectangle on the host where the mirrored screen is
//! rendered.  Pointer positions arrive in host pixels relative to the page;
//! the device expects positions in its own (post-rotation) pixel space.
//!
//! The mapping is done in three steps:
//!
//! 1. Normalise the host position into `[0, 1] × [0, 1]` relative to the
//!    frame's bounding rectangle, clamping anything outside.
//! 2. Apply the rotation transform for the current device orientation.
//! 3. Scale by the current device resolution.

use serde::{Deserialize, Serialize};

/// Device display rotation, in clockwise quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rotation {
    #[default]
    Deg0 = 0,
    Deg90 = 1,
    Deg180 = 2,
    Deg270 = 3,
}

impl TryFrom<u8> for Rotation {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Rotation::Deg0),
            1 => Ok(Rotation::Deg90),
            2 => Ok(Rotation::Deg180),
            3 => Ok(Rotation::Deg270),
            _ => Err(()),
        }
    }
}

impl Rotation {
    /// All four rotations in clockwise order.
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Returns the rotation angle in degrees.
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Applies this rotation to a normalised `(u, v)` position.
    ///
    /// Both inputs are expected in `[0, 1]`; the output stays in `[0, 1]`.
    pub fn transform(self, u: f64, v: f64) -> (f64, f64) {
        match self {
            Rotation::Deg0 => (u, v),
            Rotation::Deg90 => (v, 1.0 - u),
            Rotation::Deg180 => (1.0 - u, 1.0 - v),
            Rotation::Deg270 => (1.0 - v, u),
        }
    }
}

/// An axis-aligned rectangle in host pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRect {
    /// Left edge (host pixels).
    pub left: f64,
    /// Top edge (host pixels).
    pub top: f64,
    /// Width (host pixels).
    pub width: f64,
    /// Height (host pixels).
    pub height: f64,
}

impl SurfaceRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Returns `true` if the rectangle covers no area (or has a NaN side).
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Cropped device resolution in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceSize {
    pub width: u32,
    pub height: u32,
}

impl DeviceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A position in device pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DevicePoint {
    pub x: f64,
    pub y: f64,
}

/// The on-screen mirror surface as seen by the coordinate mapper.
///
/// `bounds` is `None` while no rendering surface is bound; `resolution` is
/// updated when a configuration record arrives; `rotation` is updated by
/// explicit rotation-change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceFrame {
    pub bounds: Option<SurfaceRect>,
    pub rotation: Rotation,
    pub resolution: DeviceSize,
}

impl DeviceFrame {
    /// Creates an unbound frame with the given device resolution.
    pub fn new(resolution: DeviceSize) -> Self {
        Self {
            bounds: None,
            rotation: Rotation::Deg0,
            resolution,
        }
    }

    /// Returns a copy of this frame bound to `bounds`.
    pub fn with_bounds(mut self, bounds: Option<SurfaceRect>) -> Self {
        self.bounds = bounds;
        self
    }

    /// Maps a host position into device space.  See [`to_device_space`].
    pub fn to_device_space(&self, client_x: f64, client_y: f64) -> DevicePoint {
        to_device_space(client_x, client_y, self)
    }
}

/// Converts host pixel coordinates into device pixel coordinates.
///
/// Never fails: an unbound (or zero-area) frame maps every position to the
/// origin, and positions outside the bounds are clamped onto the frame edge.
///
/// # Examples
///
/// ```rust
/// use mirror_core::domain::frame::{to_device_space, DeviceFrame, DeviceSize, SurfaceRect};
///
/// let frame = DeviceFrame::new(DeviceSize::new(1080, 2340))
///     .with_bounds(Some(SurfaceRect::new(100.0, 50.0, 540.0, 1170.0)));
/// let p = to_device_space(370.0, 635.0, &frame);
/// assert_eq!((p.x, p.y), (540.0, 1170.0));
/// ```
pub fn to_device_space(client_x: f64, client_y: f64, frame: &DeviceFrame) -> DevicePoint {
    let Some(rect) = frame.bounds else {
        return DevicePoint::default();
    };
    if rect.is_degenerate() {
        return DevicePoint::default();
    }

    let u = clamp_unit((client_x - rect.left) / rect.width);
    let v = clamp_unit((client_y - rect.top) / rect.height);
    let (u, v) = frame.rotation.transform(u, v);

    DevicePoint {
        x: u * f64::from(frame.resolution.width),
        y: v * f64::from(frame.resolution.height),
    }
}

/// Clamps to `[0, 1]`, mapping NaN to 0.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn frame(rotation: Rotation) -> DeviceFrame {
        DeviceFrame {
            bounds: Some(SurfaceRect::new(10.0, 20.0, 200.0, 400.0)),
            rotation,
            resolution: DeviceSize::new(1080, 1920),
        }
    }

    fn grid() -> Vec<(f64, f64)> {
        let steps = [0.0, 0.1, 0.25, 0.333, 0.5, 0.75, 0.9, 1.0];
        steps
            .iter()
            .flat_map(|&u| steps.iter().map(move |&v| (u, v)))
            .collect()
    }

    fn assert_close(actual: (f64, f64), expected: (f64, f64)) {
        assert!(
            (actual.0 - expected.0).abs() < EPSILON && (actual.1 - expected.1).abs() < EPSILON,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_rotation_try_from_accepts_wire_codes() {
        assert_eq!(Rotation::try_from(0), Ok(Rotation::Deg0));
        assert_eq!(Rotation::try_from(1), Ok(Rotation::Deg90));
        assert_eq!(Rotation::try_from(2), Ok(Rotation::Deg180));
        assert_eq!(Rotation::try_from(3), Ok(Rotation::Deg270));
        assert!(Rotation::try_from(4).is_err());
    }

    #[test]
    fn test_rotation_transform_table() {
        assert_eq!(Rotation::Deg0.transform(0.25, 0.75), (0.25, 0.75));
        assert_eq!(Rotation::Deg90.transform(0.25, 0.75), (0.75, 0.75));
        assert_eq!(Rotation::Deg180.transform(0.25, 0.75), (0.75, 0.25));
        assert_eq!(Rotation::Deg270.transform(0.25, 0.75), (0.25, 0.25));
    }

    #[test]
    fn test_quarter_turn_applied_four_times_is_identity() {
        for (u, v) in grid() {
            let mut p = (u, v);
            for _ in 0..4 {
                p = Rotation::Deg90.transform(p.0, p.1);
            }
            assert_close(p, (u, v));
        }
    }

    #[test]
    fn test_opposite_rotations_cancel_out() {
        for (u, v) in grid() {
            let (a, b) = Rotation::Deg90.transform(u, v);
            assert_close(Rotation::Deg270.transform(a, b), (u, v));

            let (a, b) = Rotation::Deg180.transform(u, v);
            assert_close(Rotation::Deg180.transform(a, b), (u, v));
        }
    }

    #[test]
    fn test_transform_keeps_unit_square() {
        for rotation in Rotation::ALL {
            for (u, v) in grid() {
                let (a, b) = rotation.transform(u, v);
                assert!((0.0..=1.0).contains(&a), "{rotation:?} moved u out of range");
                assert!((0.0..=1.0).contains(&b), "{rotation:?} moved v out of range");
            }
        }
    }

    #[test]
    fn test_unbound_frame_maps_to_origin() {
        // Arrange
        let frame = DeviceFrame::new(DeviceSize::new(1080, 1920));

        // Act
        let p = to_device_space(500.0, 500.0, &frame);

        // Assert
        assert_eq!(p, DevicePoint { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_zero_area_frame_maps_to_origin() {
        let frame = frame(Rotation::Deg0).with_bounds(Some(SurfaceRect::new(0.0, 0.0, 0.0, 100.0)));
        assert_eq!(to_device_space(5.0, 5.0, &frame), DevicePoint::default());
    }

    #[test]
    fn test_identity_rotation_scales_by_resolution() {
        // centre of the frame maps to the centre of the device
        let p = to_device_space(110.0, 220.0, &frame(Rotation::Deg0));
        assert_eq!((p.x, p.y), (540.0, 960.0));
    }

    #[test]
    fn test_top_left_corner_under_each_rotation() {
        let expected = [
            (Rotation::Deg0, (0.0, 0.0)),
            (Rotation::Deg90, (0.0, 1920.0)),
            (Rotation::Deg180, (1080.0, 1920.0)),
            (Rotation::Deg270, (1080.0, 0.0)),
        ];
        for (rotation, (x, y)) in expected {
            let p = to_device_space(10.0, 20.0, &frame(rotation));
            assert_eq!((p.x, p.y), (x, y), "rotation {rotation:?}");
        }
    }

    #[test]
    fn test_positions_outside_bounds_are_clamped() {
        let outside = [
            (-500.0, -500.0),
            (10_000.0, 10_000.0),
            (-1.0, 250.0),
            (100.0, 421.0),
            (f64::INFINITY, f64::NEG_INFINITY),
        ];
        for rotation in Rotation::ALL {
            let frame = frame(rotation);
            for (x, y) in outside {
                let p = to_device_space(x, y, &frame);
                assert!((0.0..=1080.0).contains(&p.x), "x {} out of range", p.x);
                assert!((0.0..=1920.0).contains(&p.y), "y {} out of range", p.y);
            }
        }
    }

    #[test]
    fn test_nan_position_maps_inside_frame() {
        let p = to_device_space(f64::NAN, f64::NAN, &frame(Rotation::Deg0));
        assert_eq!(p, DevicePoint::default());
    }
}
