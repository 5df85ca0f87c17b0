//! Analytic CAD kernel backend
//!
//! Converts planes, quadrics, tori and swept surfaces into exact rational
//! B-spline patches restricted to a face's parametric bounds. Circular
//! directions use rational quadratic arcs, straight directions are linear.

use std::f64::consts::FRAC_PI_2;

use glam::{DVec2, DVec3};
use tracing::debug;

use super::traits::{CadError, CadKernel, CadResult, NurbsConverter};
use crate::geometry::{
    ConicalSurface, Curve3d, CylindricalSurface, Frame, Plane, SphericalSurface, Surface,
    SurfaceOfExtrusion, SurfaceOfRevolution, ToroidalSurface, UvBounds,
};
use crate::nurbs::{
    ArcProfile, BSplineSurface, HomogeneousCurve, KnotError, cartesian, compress_knots,
    homogeneous, periodic::segment_periodic,
};
use crate::topology::Face;

/// Exact closed-form conversions, no external dependencies
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticKernel;

impl AnalyticKernel {
    /// Create a new analytic kernel
    pub fn new() -> Self {
        Self
    }
}

impl CadKernel for AnalyticKernel {
    fn name(&self) -> &str {
        "analytic"
    }

    fn is_available(&self) -> bool {
        true
    }
}

impl NurbsConverter for AnalyticKernel {
    fn convert_surface(&self, face: &Face) -> CadResult<Surface> {
        let bounds = &face.uv_bounds;
        let spline = match &face.surface {
            Surface::BSpline(spline) => return Ok(Surface::BSpline(spline.clone())),
            Surface::Bezier(bezier) => return Ok(Surface::BSpline(bezier.to_bspline())),
            Surface::Other { description } => {
                return Err(CadError::UnsupportedGeometry(format!(
                    "no B-spline form for '{description}'"
                )));
            }
            Surface::Offset(offset) => {
                let resolved = offset.to_analytic()?;
                debug!(kind = %resolved.kind(), "Resolved offset surface");
                analytic_to_bspline(&resolved, bounds)?
            }
            other => analytic_to_bspline(other, bounds)?,
        };
        Ok(Surface::BSpline(spline))
    }
}

fn analytic_to_bspline(surface: &Surface, bounds: &UvBounds) -> CadResult<BSplineSurface> {
    if bounds.is_empty() {
        return Err(CadError::DegenerateGeometry(format!(
            "empty parametric bounds {bounds:?}"
        )));
    }
    match surface {
        Surface::Plane(plane) => plane_patch(plane, bounds),
        Surface::Cylinder(cylinder) => cylinder_patch(cylinder, bounds),
        Surface::Cone(cone) => cone_patch(cone, bounds),
        Surface::Sphere(sphere) => sphere_patch(sphere, bounds),
        Surface::Torus(torus) => torus_patch(torus, bounds),
        Surface::Revolution(revolution) => revolution_patch(revolution, bounds),
        Surface::Extrusion(extrusion) => extrusion_patch(extrusion, bounds),
        other => Err(CadError::UnsupportedGeometry(format!(
            "{} is not an analytic surface",
            other.kind()
        ))),
    }
}

fn check_frame(frame: &Frame) -> CadResult<()> {
    if frame.is_valid() {
        Ok(())
    } else {
        Err(CadError::DegenerateGeometry(format!(
            "invalid placement {frame:?}"
        )))
    }
}

fn check_radius(radius: f64, what: &str) -> CadResult<()> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(CadError::DegenerateGeometry(format!("{what} {radius}")))
    }
}

fn knot_error(err: KnotError) -> CadError {
    CadError::OperationFailed(err.to_string())
}

/// Unit circle arc over `[lo, hi]`; Cartesian poles are `(cos, sin, 0)`
fn arc(lo: f64, hi: f64) -> CadResult<HomogeneousCurve> {
    let profile =
        ArcProfile::new(lo, hi).map_err(|e| CadError::DegenerateGeometry(e.to_string()))?;
    Ok(profile.to_curve(DVec2::ZERO, DVec2::X, DVec2::Y, 1.0))
}

/// Degree one profile over `[lo, hi]`; Cartesian poles are `(lo, 0, 0)`, `(hi, 0, 0)`
fn linear(lo: f64, hi: f64) -> HomogeneousCurve {
    HomogeneousCurve {
        degree: 1,
        knots: vec![lo, lo, hi, hi],
        poles: vec![
            homogeneous(DVec3::new(lo, 0.0, 0.0), 1.0),
            homogeneous(DVec3::new(hi, 0.0, 0.0), 1.0),
        ],
    }
}

/// Tensor product of two profiles. `pole` maps the Cartesian profile poles
/// to the surface pole; weights multiply.
fn tensor<F>(u: &HomogeneousCurve, v: &HomogeneousCurve, pole: F) -> BSplineSurface
where
    F: Fn(DVec3, DVec3) -> DVec3,
{
    let nb_u_poles = u.poles.len();
    let nb_v_poles = v.poles.len();
    let mut poles = Vec::with_capacity(nb_u_poles * nb_v_poles);
    let mut weights = Vec::with_capacity(nb_u_poles * nb_v_poles);
    for &hu in &u.poles {
        let (pu, wu) = cartesian(hu);
        for &hv in &v.poles {
            let (pv, wv) = cartesian(hv);
            poles.push(pole(pu, pv));
            weights.push(wu * wv);
        }
    }

    let (u_knots, u_mults) = compress_knots(&u.knots);
    let (v_knots, v_mults) = compress_knots(&v.knots);
    BSplineSurface {
        u_degree: u.degree,
        v_degree: v.degree,
        nb_u_poles,
        nb_v_poles,
        poles,
        weights: Some(weights),
        u_knots,
        u_mults,
        v_knots,
        v_mults,
        u_periodic: false,
        v_periodic: false,
    }
}

fn plane_patch(plane: &Plane, bounds: &UvBounds) -> CadResult<BSplineSurface> {
    check_frame(&plane.frame)?;
    let u = linear(bounds.u_min, bounds.u_max);
    let v = linear(bounds.v_min, bounds.v_max);
    Ok(tensor(&u, &v, |pu, pv| plane.point(pu.x, pv.x)))
}

fn cylinder_patch(cylinder: &CylindricalSurface, bounds: &UvBounds) -> CadResult<BSplineSurface> {
    check_frame(&cylinder.frame)?;
    check_radius(cylinder.radius, "cylinder radius")?;
    let frame = cylinder.frame;
    let r = cylinder.radius;
    let u = arc(bounds.u_min, bounds.u_max)?;
    let v = linear(bounds.v_min, bounds.v_max);
    Ok(tensor(&u, &v, |cs, pv| {
        frame.to_world(DVec3::new(r * cs.x, r * cs.y, pv.x))
    }))
}

fn cone_patch(cone: &ConicalSurface, bounds: &UvBounds) -> CadResult<BSplineSurface> {
    check_frame(&cone.frame)?;
    if !(cone.radius.is_finite() && cone.radius >= 0.0) {
        return Err(CadError::DegenerateGeometry(format!(
            "cone reference radius {}",
            cone.radius
        )));
    }
    if !(cone.semi_angle.is_finite() && cone.semi_angle.abs() < FRAC_PI_2) {
        return Err(CadError::DegenerateGeometry(format!(
            "cone semi-angle {}",
            cone.semi_angle
        )));
    }
    let frame = cone.frame;
    let (sa, ca) = cone.semi_angle.sin_cos();
    let r = cone.radius;
    let u = arc(bounds.u_min, bounds.u_max)?;
    let v = linear(bounds.v_min, bounds.v_max);
    Ok(tensor(&u, &v, |cs, pv| {
        let rho = r + pv.x * sa;
        frame.to_world(DVec3::new(rho * cs.x, rho * cs.y, pv.x * ca))
    }))
}

fn sphere_patch(sphere: &SphericalSurface, bounds: &UvBounds) -> CadResult<BSplineSurface> {
    check_frame(&sphere.frame)?;
    check_radius(sphere.radius, "sphere radius")?;
    let frame = sphere.frame;
    let r = sphere.radius;
    let u = arc(bounds.u_min, bounds.u_max)?;
    let v = arc(bounds.v_min, bounds.v_max)?;
    Ok(tensor(&u, &v, |cs, meridian| {
        frame.to_world(DVec3::new(
            r * meridian.x * cs.x,
            r * meridian.x * cs.y,
            r * meridian.y,
        ))
    }))
}

fn torus_patch(torus: &ToroidalSurface, bounds: &UvBounds) -> CadResult<BSplineSurface> {
    check_frame(&torus.frame)?;
    check_radius(torus.major_radius, "torus major radius")?;
    check_radius(torus.minor_radius, "torus minor radius")?;
    let frame = torus.frame;
    let (big, small) = (torus.major_radius, torus.minor_radius);
    let u = arc(bounds.u_min, bounds.u_max)?;
    let v = arc(bounds.v_min, bounds.v_max)?;
    Ok(tensor(&u, &v, |cs, meridian| {
        let rho = big + small * meridian.x;
        frame.to_world(DVec3::new(rho * cs.x, rho * cs.y, small * meridian.y))
    }))
}

/// Basis curve restricted to `[lo, hi]` as a clamped homogeneous curve
fn basis_segment(curve: &Curve3d, lo: f64, hi: f64) -> CadResult<HomogeneousCurve> {
    match curve {
        Curve3d::Line(line) => {
            if !(line.direction.is_finite() && line.direction.length_squared() > 0.0) {
                return Err(CadError::DegenerateGeometry(format!(
                    "line direction {}",
                    line.direction
                )));
            }
            Ok(HomogeneousCurve {
                degree: 1,
                knots: vec![lo, lo, hi, hi],
                poles: vec![
                    homogeneous(line.point(lo), 1.0),
                    homogeneous(line.point(hi), 1.0),
                ],
            })
        }
        Curve3d::Circle(circle) => {
            check_frame(&circle.frame)?;
            check_radius(circle.radius, "circle radius")?;
            let profile = ArcProfile::new(lo, hi)
                .map_err(|e| CadError::DegenerateGeometry(e.to_string()))?;
            let frame = circle.frame;
            let poles = profile
                .points
                .iter()
                .zip(&profile.weights)
                .map(|(cs, &w)| {
                    let p = frame.to_world(DVec3::new(circle.radius * cs.x, circle.radius * cs.y, 0.0));
                    homogeneous(p, w)
                })
                .collect();
            Ok(HomogeneousCurve {
                degree: ArcProfile::DEGREE,
                knots: profile.flat_knots(),
                poles,
            })
        }
        Curve3d::BSpline(spline) if spline.periodic => segment_periodic(
            spline.degree,
            &spline.knots,
            &spline.mults,
            spline.homogeneous_poles(),
            lo,
            hi,
        )
        .map_err(knot_error),
        Curve3d::BSpline(spline) => spline
            .to_homogeneous()
            .and_then(|curve| curve.restrict(lo, hi))
            .map_err(knot_error),
    }
}

fn revolution_patch(
    revolution: &SurfaceOfRevolution,
    bounds: &UvBounds,
) -> CadResult<BSplineSurface> {
    let origin = revolution.axis_origin;
    let axis = revolution
        .axis_direction
        .try_normalize()
        .ok_or_else(|| CadError::DegenerateGeometry("zero revolution axis".to_string()))?;
    let u = arc(bounds.u_min, bounds.u_max)?;
    let v = basis_segment(&revolution.basis, bounds.v_min, bounds.v_max)?;
    Ok(tensor(&u, &v, |cs, b| {
        let q = b - origin;
        let h = q.dot(axis);
        let radial = q - axis * h;
        origin + axis * h + radial * cs.x + axis.cross(radial) * cs.y
    }))
}

fn extrusion_patch(
    extrusion: &SurfaceOfExtrusion,
    bounds: &UvBounds,
) -> CadResult<BSplineSurface> {
    let direction = extrusion
        .direction
        .try_normalize()
        .ok_or_else(|| CadError::DegenerateGeometry("zero extrusion direction".to_string()))?;
    let u = basis_segment(&extrusion.basis, bounds.u_min, bounds.u_max)?;
    let v = linear(bounds.v_min, bounds.v_max);
    Ok(tensor(&u, &v, |b, pv| b + direction * pv.x))
}
