//! Surface definitions and type classification

use std::f64::consts::TAU;
use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::{Curve3d, Frame};
use crate::kernel::{CadError, CadResult};
use crate::nurbs::{BSplineSurface, BezierSurface};

/// `origin + u * x_dir + v * y_dir`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub frame: Frame,
}

impl Plane {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }

    pub fn point(&self, u: f64, v: f64) -> DVec3 {
        self.frame.to_world(DVec3::new(u, v, 0.0))
    }
}

/// `origin + radius * (cos u * x + sin u * y) + v * z`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylindricalSurface {
    pub frame: Frame,
    pub radius: f64,
}

impl CylindricalSurface {
    pub fn new(frame: Frame, radius: f64) -> Self {
        Self { frame, radius }
    }

    pub fn point(&self, u: f64, v: f64) -> DVec3 {
        let (s, c) = u.sin_cos();
        self.frame.to_world(DVec3::new(self.radius * c, self.radius * s, v))
    }
}

/// `origin + (radius + v sin a) * (cos u * x + sin u * y) + v cos a * z`
///
/// `radius` is the reference radius at `v = 0`, `semi_angle` lies in
/// `(-pi/2, pi/2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConicalSurface {
    pub frame: Frame,
    pub radius: f64,
    pub semi_angle: f64,
}

impl ConicalSurface {
    pub fn new(frame: Frame, radius: f64, semi_angle: f64) -> Self {
        Self {
            frame,
            radius,
            semi_angle,
        }
    }

    pub fn point(&self, u: f64, v: f64) -> DVec3 {
        let (s, c) = u.sin_cos();
        let (sa, ca) = self.semi_angle.sin_cos();
        let r = self.radius + v * sa;
        self.frame.to_world(DVec3::new(r * c, r * s, v * ca))
    }
}

/// `origin + radius * (cos v (cos u * x + sin u * y) + sin v * z)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphericalSurface {
    pub frame: Frame,
    pub radius: f64,
}

impl SphericalSurface {
    pub fn new(frame: Frame, radius: f64) -> Self {
        Self { frame, radius }
    }

    pub fn point(&self, u: f64, v: f64) -> DVec3 {
        let (su, cu) = u.sin_cos();
        let (sv, cv) = v.sin_cos();
        let r = self.radius;
        self.frame.to_world(DVec3::new(r * cv * cu, r * cv * su, r * sv))
    }
}

/// `origin + (R + r cos v) * (cos u * x + sin u * y) + r sin v * z`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToroidalSurface {
    pub frame: Frame,
    pub major_radius: f64,
    pub minor_radius: f64,
}

impl ToroidalSurface {
    pub fn new(frame: Frame, major_radius: f64, minor_radius: f64) -> Self {
        Self {
            frame,
            major_radius,
            minor_radius,
        }
    }

    pub fn point(&self, u: f64, v: f64) -> DVec3 {
        let (su, cu) = u.sin_cos();
        let (sv, cv) = v.sin_cos();
        let rho = self.major_radius + self.minor_radius * cv;
        self.frame
            .to_world(DVec3::new(rho * cu, rho * su, self.minor_radius * sv))
    }
}

/// Basis curve rotated about an axis; `u` is the angle, `v` the curve parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceOfRevolution {
    pub basis: Curve3d,
    pub axis_origin: DVec3,
    pub axis_direction: DVec3,
}

impl SurfaceOfRevolution {
    pub fn point(&self, u: f64, v: f64) -> Option<DVec3> {
        let axis = self.axis_direction.try_normalize()?;
        let q = self.basis.point(v)? - self.axis_origin;
        let h = q.dot(axis);
        let radial = q - axis * h;
        let (s, c) = u.sin_cos();
        Some(self.axis_origin + axis * h + radial * c + axis.cross(radial) * s)
    }
}

/// Basis curve swept along a direction; `u` is the curve parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceOfExtrusion {
    pub basis: Curve3d,
    pub direction: DVec3,
}

impl SurfaceOfExtrusion {
    pub fn point(&self, u: f64, v: f64) -> Option<DVec3> {
        let direction = self.direction.try_normalize()?;
        Some(self.basis.point(u)? + direction * v)
    }
}

/// Basis surface displaced along its normal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetSurface {
    pub basis: Box<Surface>,
    pub distance: f64,
}

impl OffsetSurface {
    pub fn new(basis: Surface, distance: f64) -> Self {
        Self {
            basis: Box::new(basis),
            distance,
        }
    }

    /// Exact analytic surface equal to this offset.
    ///
    /// Defined for planar and quadric bases (and nested offsets of them).
    /// A radius that becomes zero or negative is degenerate.
    pub fn to_analytic(&self) -> CadResult<Surface> {
        let d = self.distance;
        if !d.is_finite() {
            return Err(CadError::DegenerateGeometry(format!(
                "offset distance {d} is not finite"
            )));
        }
        let positive = |r: f64, what: &str| {
            if r > 0.0 {
                Ok(r)
            } else {
                Err(CadError::DegenerateGeometry(format!(
                    "offset by {d} gives {what} {r}"
                )))
            }
        };

        let basis = match self.basis.as_ref() {
            Surface::Offset(inner) => inner.to_analytic()?,
            other => other.clone(),
        };

        match basis {
            Surface::Plane(plane) => {
                let mut frame = plane.frame;
                frame.origin += frame.z_dir * d;
                Ok(Surface::Plane(Plane::new(frame)))
            }
            Surface::Cylinder(cyl) => Ok(Surface::Cylinder(CylindricalSurface::new(
                cyl.frame,
                positive(cyl.radius + d, "radius")?,
            ))),
            Surface::Sphere(sphere) => Ok(Surface::Sphere(SphericalSurface::new(
                sphere.frame,
                positive(sphere.radius + d, "radius")?,
            ))),
            Surface::Torus(torus) => Ok(Surface::Torus(ToroidalSurface::new(
                torus.frame,
                torus.major_radius,
                positive(torus.minor_radius + d, "minor radius")?,
            ))),
            Surface::Cone(cone) => {
                let (sa, ca) = cone.semi_angle.sin_cos();
                let radius = cone.radius + d * ca;
                if radius < 0.0 {
                    return Err(CadError::DegenerateGeometry(format!(
                        "offset by {d} gives reference radius {radius}"
                    )));
                }
                let mut frame = cone.frame;
                frame.origin -= frame.z_dir * (d * sa);
                Ok(Surface::Cone(ConicalSurface::new(
                    frame,
                    radius,
                    cone.semi_angle,
                )))
            }
            other => Err(CadError::UnsupportedGeometry(format!(
                "offset of {} surface",
                other.kind()
            ))),
        }
    }
}

/// Input surface of a face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Surface {
    Plane(Plane),
    Cylinder(CylindricalSurface),
    Cone(ConicalSurface),
    Sphere(SphericalSurface),
    Torus(ToroidalSurface),
    Bezier(BezierSurface),
    BSpline(BSplineSurface),
    Revolution(SurfaceOfRevolution),
    Extrusion(SurfaceOfExtrusion),
    Offset(OffsetSurface),
    /// Surface type this model cannot describe
    Other { description: String },
}

impl Surface {
    pub fn kind(&self) -> SurfaceKind {
        match self {
            Surface::Plane(_) => SurfaceKind::Plane,
            Surface::Cylinder(_) => SurfaceKind::Cylinder,
            Surface::Cone(_) => SurfaceKind::Cone,
            Surface::Sphere(_) => SurfaceKind::Sphere,
            Surface::Torus(_) => SurfaceKind::Torus,
            Surface::Bezier(_) => SurfaceKind::Bezier,
            Surface::BSpline(_) => SurfaceKind::BSpline,
            Surface::Revolution(_) => SurfaceKind::Revolution,
            Surface::Extrusion(_) => SurfaceKind::Extrusion,
            Surface::Offset(_) => SurfaceKind::Offset,
            Surface::Other { .. } => SurfaceKind::Other,
        }
    }

    /// Evaluate the surface; `None` if it cannot be evaluated
    pub fn point(&self, u: f64, v: f64) -> Option<DVec3> {
        match self {
            Surface::Plane(s) => Some(s.point(u, v)),
            Surface::Cylinder(s) => Some(s.point(u, v)),
            Surface::Cone(s) => Some(s.point(u, v)),
            Surface::Sphere(s) => Some(s.point(u, v)),
            Surface::Torus(s) => Some(s.point(u, v)),
            Surface::Bezier(s) => s.point(u, v),
            Surface::BSpline(s) => s.point(u, v),
            Surface::Revolution(s) => s.point(u, v),
            Surface::Extrusion(s) => s.point(u, v),
            Surface::Offset(s) => s.to_analytic().ok()?.point(u, v),
            Surface::Other { .. } => None,
        }
    }

    /// Period in U for surfaces closed in U
    pub fn u_period(&self) -> Option<f64> {
        match self {
            Surface::Cylinder(_)
            | Surface::Cone(_)
            | Surface::Sphere(_)
            | Surface::Torus(_)
            | Surface::Revolution(_) => Some(TAU),
            Surface::BSpline(s) if s.u_periodic => s.u_period(),
            Surface::Extrusion(s) => s.basis.period(),
            Surface::Offset(s) => s.basis.u_period(),
            _ => None,
        }
    }

    /// Period in V for surfaces closed in V
    pub fn v_period(&self) -> Option<f64> {
        match self {
            Surface::Torus(_) => Some(TAU),
            Surface::BSpline(s) if s.v_periodic => s.v_period(),
            Surface::Revolution(s) => s.basis.period(),
            Surface::Offset(s) => s.basis.v_period(),
            _ => None,
        }
    }
}

/// Surface type tag, in the fixed order used by reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SurfaceKind {
    Plane,
    Cylinder,
    Cone,
    Sphere,
    Torus,
    Bezier,
    BSpline,
    Revolution,
    Extrusion,
    Offset,
    Other,
}

impl SurfaceKind {
    pub const ALL: [SurfaceKind; 11] = [
        SurfaceKind::Plane,
        SurfaceKind::Cylinder,
        SurfaceKind::Cone,
        SurfaceKind::Sphere,
        SurfaceKind::Torus,
        SurfaceKind::Bezier,
        SurfaceKind::BSpline,
        SurfaceKind::Revolution,
        SurfaceKind::Extrusion,
        SurfaceKind::Offset,
        SurfaceKind::Other,
    ];

    /// Tag printed in statistics and failure messages
    pub fn name(self) -> &'static str {
        match self {
            SurfaceKind::Plane => "GeomAbs_Plane",
            SurfaceKind::Cylinder => "GeomAbs_Cylinder",
            SurfaceKind::Cone => "GeomAbs_Cone",
            SurfaceKind::Sphere => "GeomAbs_Sphere",
            SurfaceKind::Torus => "GeomAbs_Torus",
            SurfaceKind::Bezier => "GeomAbs_BezierSurface",
            SurfaceKind::BSpline => "GeomAbs_BSplineSurface",
            SurfaceKind::Revolution => "GeomAbs_SurfaceOfRevolution",
            SurfaceKind::Extrusion => "GeomAbs_SurfaceOfExtrusion",
            SurfaceKind::Offset => "GeomAbs_OffsetSurface",
            SurfaceKind::Other => "GeomAbs_OtherSurface",
        }
    }

    /// Position in [`SurfaceKind::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
