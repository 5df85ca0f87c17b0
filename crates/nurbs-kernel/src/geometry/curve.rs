//! Parametric curves: 2D trimming curves (pcurves) and 3D basis curves

use std::f64::consts::TAU;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use super::Frame;
use crate::nurbs::{BSplineCurve2d, BSplineCurve3d, BezierCurve2d};

/// `origin + t * direction`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line2d {
    pub origin: DVec2,
    pub direction: DVec2,
}

impl Line2d {
    pub fn new(origin: DVec2, direction: DVec2) -> Self {
        Self { origin, direction }
    }

    pub fn point(&self, t: f64) -> DVec2 {
        self.origin + self.direction * t
    }
}

/// `center + radius * (cos t * x_dir + sin t * y_dir)`
///
/// `y_dir` is explicit so that clockwise circles can be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle2d {
    pub center: DVec2,
    pub x_dir: DVec2,
    pub y_dir: DVec2,
    pub radius: f64,
}

impl Circle2d {
    /// Counter-clockwise circle starting on the +u axis
    pub fn new(center: DVec2, radius: f64) -> Self {
        Self {
            center,
            x_dir: DVec2::X,
            y_dir: DVec2::Y,
            radius,
        }
    }

    pub fn point(&self, t: f64) -> DVec2 {
        self.center + (self.x_dir * t.cos() + self.y_dir * t.sin()) * self.radius
    }
}

/// 2D curve in the parameter space of a surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Curve2d {
    Line(Line2d),
    Circle(Circle2d),
    Bezier(BezierCurve2d),
    BSpline(BSplineCurve2d),
}

impl Curve2d {
    /// Evaluate the curve, `None` when the definition is unusable
    pub fn point(&self, t: f64) -> Option<DVec2> {
        match self {
            Curve2d::Line(line) => Some(line.point(t)),
            Curve2d::Circle(circle) => Some(circle.point(t)),
            Curve2d::Bezier(bezier) => bezier.point(t),
            Curve2d::BSpline(spline) => spline.point(t),
        }
    }

    /// Period of a closed periodic curve
    pub fn period(&self) -> Option<f64> {
        match self {
            Curve2d::Circle(_) => Some(TAU),
            Curve2d::BSpline(spline) if spline.periodic => spline.period(),
            _ => None,
        }
    }

    /// Type name used in log and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Curve2d::Line(_) => "Line",
            Curve2d::Circle(_) => "Circle",
            Curve2d::Bezier(_) => "BezierCurve",
            Curve2d::BSpline(_) => "BSplineCurve",
        }
    }
}

/// 3D line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3d {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Line3d {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self { origin, direction }
    }

    pub fn point(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }
}

/// Circle in the XY plane of `frame`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle3d {
    pub frame: Frame,
    pub radius: f64,
}

impl Circle3d {
    pub fn new(frame: Frame, radius: f64) -> Self {
        Self { frame, radius }
    }

    pub fn point(&self, t: f64) -> DVec3 {
        self.frame.origin + (self.frame.x_dir * t.cos() + self.frame.y_dir * t.sin()) * self.radius
    }
}

/// Basis curve of swept surfaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Curve3d {
    Line(Line3d),
    Circle(Circle3d),
    BSpline(BSplineCurve3d),
}

impl Curve3d {
    pub fn point(&self, t: f64) -> Option<DVec3> {
        match self {
            Curve3d::Line(line) => Some(line.point(t)),
            Curve3d::Circle(circle) => Some(circle.point(t)),
            Curve3d::BSpline(spline) => spline.point(t),
        }
    }

    pub fn period(&self) -> Option<f64> {
        match self {
            Curve3d::Circle(_) => Some(TAU),
            Curve3d::BSpline(spline) if spline.periodic => spline.period(),
            Curve3d::Line(_) | Curve3d::BSpline(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_circle2d_point() {
        let circle = Circle2d::new(DVec2::new(1.0, 1.0), 2.0);
        let p = circle.point(FRAC_PI_2);
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clockwise_circle() {
        let circle = Circle2d {
            center: DVec2::ZERO,
            x_dir: DVec2::X,
            y_dir: DVec2::NEG_Y,
            radius: 1.0,
        };
        assert_relative_eq!(circle.point(FRAC_PI_2).y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_periods() {
        let line = Curve2d::Line(Line2d::new(DVec2::ZERO, DVec2::X));
        assert_eq!(line.period(), None);
        let circle = Curve3d::Circle(Circle3d::new(Frame::world(), 1.0));
        assert_eq!(circle.period(), Some(TAU));
    }
}
