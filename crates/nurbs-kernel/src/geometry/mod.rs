//! Input geometry: analytic and free-form surfaces, parametric curves

mod curve;
mod surface;

pub use curve::{Circle2d, Circle3d, Curve2d, Curve3d, Line2d, Line3d};
pub use surface::{
    ConicalSurface, CylindricalSurface, OffsetSurface, Plane, SphericalSurface, Surface,
    SurfaceKind, SurfaceOfExtrusion, SurfaceOfRevolution, ToroidalSurface,
};

use glam::DVec3;
use serde::{Deserialize, Serialize};

const FRAME_TOLERANCE: f64 = 1e-9;

/// Right-handed orthonormal placement of an analytic surface or curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Location
    pub origin: DVec3,
    /// Reference direction (angle 0)
    pub x_dir: DVec3,
    /// Direction at angle pi/2
    pub y_dir: DVec3,
    /// Main axis
    pub z_dir: DVec3,
}

impl Frame {
    /// Build a frame from a main axis and an approximate reference direction.
    ///
    /// `x_hint` is projected onto the plane normal to `z_dir`. Degenerate
    /// inputs yield a frame for which [`Frame::is_valid`] is false.
    pub fn new(origin: DVec3, z_dir: DVec3, x_hint: DVec3) -> Self {
        let z_dir = z_dir.normalize_or_zero();
        let x_dir = (x_hint - z_dir * x_hint.dot(z_dir)).normalize_or_zero();
        let y_dir = z_dir.cross(x_dir);
        Self {
            origin,
            x_dir,
            y_dir,
            z_dir,
        }
    }

    /// World axes at the origin
    pub fn world() -> Self {
        Self::at(DVec3::ZERO)
    }

    /// World-aligned axes at `origin`
    pub fn at(origin: DVec3) -> Self {
        Self {
            origin,
            x_dir: DVec3::X,
            y_dir: DVec3::Y,
            z_dir: DVec3::Z,
        }
    }

    /// Finite, unit length and mutually orthogonal axes
    pub fn is_valid(&self) -> bool {
        let unit = |d: DVec3| d.is_finite() && (d.length() - 1.0).abs() < FRAME_TOLERANCE;
        self.origin.is_finite()
            && unit(self.x_dir)
            && unit(self.y_dir)
            && unit(self.z_dir)
            && self.x_dir.dot(self.y_dir).abs() < FRAME_TOLERANCE
            && self.x_dir.dot(self.z_dir).abs() < FRAME_TOLERANCE
            && self.y_dir.dot(self.z_dir).abs() < FRAME_TOLERANCE
    }

    /// Map local coordinates into world space
    pub fn to_world(&self, local: DVec3) -> DVec3 {
        self.origin + self.x_dir * local.x + self.y_dir * local.y + self.z_dir * local.z
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::world()
    }
}

/// Parametric rectangle of a face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvBounds {
    pub u_min: f64,
    pub u_max: f64,
    pub v_min: f64,
    pub v_max: f64,
}

impl UvBounds {
    pub fn new(u_min: f64, u_max: f64, v_min: f64, v_max: f64) -> Self {
        Self {
            u_min,
            u_max,
            v_min,
            v_max,
        }
    }

    /// True when either range is empty, reversed or not finite
    pub fn is_empty(&self) -> bool {
        let finite = [self.u_min, self.u_max, self.v_min, self.v_max]
            .iter()
            .all(|x| x.is_finite());
        !(finite && self.u_min < self.u_max && self.v_min < self.v_max)
    }

    pub fn u_range(&self) -> (f64, f64) {
        (self.u_min, self.u_max)
    }

    pub fn v_range(&self) -> (f64, f64) {
        (self.v_min, self.v_max)
    }

    /// Split at `u`, returning the lower and upper halves
    pub fn split_u(&self, u: f64) -> (Self, Self) {
        (
            Self::new(self.u_min, u, self.v_min, self.v_max),
            Self::new(u, self.u_max, self.v_min, self.v_max),
        )
    }

    /// Split at `v`, returning the lower and upper halves
    pub fn split_v(&self, v: f64) -> (Self, Self) {
        (
            Self::new(self.u_min, self.u_max, self.v_min, v),
            Self::new(self.u_min, self.u_max, v, self.v_max),
        )
    }
}
