//! Surface promotion: any face surface to one clamped rational B-spline patch
//!
//! B-spline surfaces are used directly, Bezier patches become single-span
//! B-splines, everything else goes through the kernel's generic conversion.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::geometry::{Surface, SurfaceKind};
use crate::kernel::NurbsConverter;
use crate::nurbs::{
    BSplineSurface, BezierSurface, HomogeneousCurve, HomogeneousGrid, KnotError,
    RationalBSplineSurface, RepairOptions, bezier_knots, compress_knots, repair_knots,
};
use crate::topology::Face;

/// Face-local conversion failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("geometry conversion failed: {0}")]
    GeometryConversionFailure(String),

    #[error("invalid knot structure: {0}")]
    KnotStructureInvalid(#[from] KnotError),

    #[error("conversion produced a {0} instead of a B-spline surface")]
    UnsupportedPostConversionType(SurfaceKind),

    #[error("edge {edge}: {source}")]
    CurveExtraction {
        edge: usize,
        source: Box<ConversionError>,
    },
}

/// How a surface reached B-spline form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromotionPath {
    Direct,
    Bezier,
    Generic,
}

/// Result of promoting one face surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotedSurface {
    /// Kind of the input surface, before any conversion
    pub kind: SurfaceKind,
    pub path: PromotionPath,
    pub surface: RationalBSplineSurface,
}

/// Promote the surface of `face` to a clamped rational B-spline patch.
pub fn promote_face<C>(
    face: &Face,
    converter: &C,
    options: &RepairOptions,
) -> Result<PromotedSurface, ConversionError>
where
    C: NurbsConverter + ?Sized,
{
    let kind = face.surface.kind();
    let (path, surface) = match &face.surface {
        Surface::BSpline(spline) => (PromotionPath::Direct, promote_bspline(spline, options)?),
        Surface::Bezier(bezier) => (PromotionPath::Bezier, promote_bezier(bezier)?),
        _ => {
            let converted = converter
                .convert_surface(face)
                .map_err(|e| ConversionError::GeometryConversionFailure(e.to_string()))?;
            match converted {
                Surface::BSpline(spline) => {
                    (PromotionPath::Generic, promote_bspline(&spline, options)?)
                }
                other => return Err(ConversionError::UnsupportedPostConversionType(other.kind())),
            }
        }
    };

    debug!(
        %kind,
        ?path,
        u_poles = surface.nb_u_poles,
        v_poles = surface.nb_v_poles,
        "Promoted surface"
    );
    Ok(PromotedSurface {
        kind,
        path,
        surface,
    })
}

fn check_values<'a>(
    points: impl IntoIterator<Item = glam::DVec3>,
    weights: impl IntoIterator<Item = &'a f64>,
) -> Result<(), ConversionError> {
    if let Some(p) = points.into_iter().find(|p| !p.is_finite()) {
        return Err(ConversionError::GeometryConversionFailure(format!(
            "non-finite pole {p}"
        )));
    }
    if let Some(w) = weights.into_iter().find(|w| !(w.is_finite() && **w > 0.0)) {
        return Err(ConversionError::GeometryConversionFailure(format!(
            "non-positive weight {w}"
        )));
    }
    Ok(())
}

/// Clamp and repair a B-spline surface in both directions
pub fn promote_bspline(
    spline: &BSplineSurface,
    options: &RepairOptions,
) -> Result<RationalBSplineSurface, ConversionError> {
    spline.check_grid()?;
    check_values(
        spline.poles.iter().copied(),
        spline.weights.iter().flatten(),
    )?;

    let grid = spline.homogeneous_grid();
    let u = DirectionData {
        degree: spline.u_degree,
        knots: &spline.u_knots,
        mults: &spline.u_mults,
        periodic: spline.u_periodic,
    };
    let v = DirectionData {
        degree: spline.v_degree,
        knots: &spline.v_knots,
        mults: &spline.v_mults,
        periodic: spline.v_periodic,
    };

    let (grid, u_knots) = repair_direction(grid, &u, true, options)?;
    let (grid, v_knots) = repair_direction(grid, &v, false, options)?;

    let surface =
        RationalBSplineSurface::from_grid(&grid, spline.u_degree, spline.v_degree, u_knots, v_knots);
    surface.validate()?;
    Ok(surface)
}

struct DirectionData<'a> {
    degree: usize,
    knots: &'a [f64],
    mults: &'a [usize],
    periodic: bool,
}

impl DirectionData<'_> {
    /// Both end knots already reach `degree + 1`
    fn ends_clamped(&self) -> bool {
        let order = self.degree + 1;
        matches!(
            (self.mults.first(), self.mults.last()),
            (Some(&a), Some(&b)) if a >= order && b >= order && self.mults.len() >= 2
        )
    }
}

/// Unperiodize or clamp by insertion where needed, then run knot repair with
/// the direction's own domain as clamp range.
fn repair_direction(
    grid: HomogeneousGrid,
    data: &DirectionData<'_>,
    along_u: bool,
    options: &RepairOptions,
) -> Result<(HomogeneousGrid, Vec<f64>), ConversionError> {
    let (grid, knots, mults) = if data.periodic || !data.ends_clamped() {
        let op = |poles| {
            HomogeneousCurve::from_distinct(data.degree, data.knots, data.mults, poles, data.periodic)?
                .clamped()
        };
        let (grid, flat) = if along_u {
            grid.transform_u(op)?
        } else {
            grid.transform_v(op)?
        };
        let (knots, mults) = compress_knots(&flat);
        (grid, knots, mults)
    } else {
        (grid, data.knots.to_vec(), data.mults.to_vec())
    };

    let nb_poles = if along_u { grid.nu } else { grid.nv };
    let bounds = match (knots.first(), knots.last()) {
        (Some(&lo), Some(&hi)) => (lo, hi),
        _ => {
            return Err(KnotError::LengthMismatch {
                expected: nb_poles + data.degree + 1,
                actual: 0,
            }
            .into());
        }
    };
    let repaired = repair_knots(&knots, &mults, nb_poles, data.degree, bounds, options)?;
    Ok((grid, repaired))
}

/// Single-span B-spline of a Bezier patch; knots split evenly between 0 and 1
pub fn promote_bezier(bezier: &BezierSurface) -> Result<RationalBSplineSurface, ConversionError> {
    let count = bezier.nb_u_poles * bezier.nb_v_poles;
    if bezier.poles.len() != count {
        return Err(KnotError::LengthMismatch {
            expected: count,
            actual: bezier.poles.len(),
        }
        .into());
    }
    let weights = match &bezier.weights {
        Some(w) if w.len() != count => {
            return Err(KnotError::LengthMismatch {
                expected: count,
                actual: w.len(),
            }
            .into());
        }
        Some(w) => w.clone(),
        None => vec![1.0; count],
    };
    check_values(bezier.poles.iter().copied(), weights.iter())?;

    let surface = RationalBSplineSurface {
        u_degree: bezier.u_degree(),
        v_degree: bezier.v_degree(),
        nb_u_poles: bezier.nb_u_poles,
        nb_v_poles: bezier.nb_v_poles,
        poles: bezier.poles.clone(),
        weights,
        u_knots: bezier_knots(bezier.nb_u_poles, 0.0, 1.0),
        v_knots: bezier_knots(bezier.nb_v_poles, 0.0, 1.0),
    };
    surface.validate()?;
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Frame, Plane, ToroidalSurface, UvBounds};
    use crate::kernel::{AnalyticKernel, CadError, CadResult, NullKernel};
    use crate::nurbs::{MultiplicityPolicy, is_clamped};
    use approx::assert_relative_eq;
    use glam::DVec3;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI, TAU};

    /// Returns its input surface unchanged
    struct IdentityConverter;

    impl NurbsConverter for IdentityConverter {
        fn convert_surface(&self, face: &Face) -> CadResult<Surface> {
            Ok(face.surface.clone())
        }
    }

    struct FailingConverter;

    impl NurbsConverter for FailingConverter {
        fn convert_surface(&self, _face: &Face) -> CadResult<Surface> {
            Err(CadError::OperationFailed("solver diverged".to_string()))
        }
    }

    fn unit_square() -> UvBounds {
        UvBounds::new(0.0, 1.0, 0.0, 1.0)
    }

    /// Periodic torus R = 3, r = 1, quadratic quarter arcs in both directions
    fn periodic_torus() -> BSplineSurface {
        let w = FRAC_1_SQRT_2;
        let circle: [(f64, f64, f64); 8] = [
            (1.0, 0.0, 1.0),
            (1.0, 1.0, w),
            (0.0, 1.0, 1.0),
            (-1.0, 1.0, w),
            (-1.0, 0.0, 1.0),
            (-1.0, -1.0, w),
            (0.0, -1.0, 1.0),
            (1.0, -1.0, w),
        ];
        let mut poles = Vec::new();
        let mut weights = Vec::new();
        for &(cu, su, wu) in &circle {
            for &(cv, sv, wv) in &circle {
                let rho = 3.0 + cv;
                poles.push(DVec3::new(rho * cu, rho * su, sv));
                weights.push(wu * wv);
            }
        }
        let knots = vec![0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2, TAU];
        BSplineSurface {
            u_degree: 2,
            v_degree: 2,
            nb_u_poles: 8,
            nb_v_poles: 8,
            poles,
            weights: Some(weights),
            u_knots: knots.clone(),
            u_mults: vec![2; 5],
            v_knots: knots,
            v_mults: vec![2; 5],
            u_periodic: true,
            v_periodic: true,
        }
    }

    fn torus_distance(p: DVec3) -> f64 {
        let rho = p.truncate().length();
        ((rho - 3.0).hypot(p.z) - 1.0).abs()
    }

    #[test]
    fn test_periodic_torus_unperiodized() {
        let face = Face::natural(Surface::BSpline(periodic_torus()), UvBounds::new(0.0, TAU, 0.0, TAU));
        let promoted = promote_face(&face, &NullKernel, &RepairOptions::default()).unwrap();
        let surface = &promoted.surface;

        assert_eq!(promoted.path, PromotionPath::Direct);
        assert_eq!(promoted.kind, SurfaceKind::BSpline);
        assert!(surface.nb_u_poles > 8 && surface.nb_v_poles > 8);
        assert_eq!((surface.nb_u_poles, surface.nb_v_poles), (9, 9));
        assert_eq!(surface.u_knots.len(), 12);
        assert!(is_clamped(&surface.u_knots, 2));
        assert!(is_clamped(&surface.v_knots, 2));
        assert!(surface.validate().is_ok());

        for i in 0..=12 {
            for j in 0..=12 {
                let p = surface.evaluate(TAU * i as f64 / 12.0, TAU * j as f64 / 12.0);
                assert!(torus_distance(p) < 1e-12, "{p} is off the torus");
            }
        }
    }

    #[test]
    fn test_bezier_knots_split_evenly() {
        let bezier = BezierSurface {
            nb_u_poles: 4,
            nb_v_poles: 3,
            poles: (0..12)
                .map(|k| DVec3::new((k / 3) as f64, (k % 3) as f64, 0.0))
                .collect(),
            weights: None,
        };
        let face = Face::natural(Surface::Bezier(bezier), unit_square());
        let promoted = promote_face(&face, &NullKernel, &RepairOptions::default()).unwrap();
        let surface = &promoted.surface;

        assert_eq!(promoted.path, PromotionPath::Bezier);
        assert_eq!((surface.u_degree, surface.v_degree), (3, 2));
        assert_eq!(surface.u_knots, vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(surface.v_knots, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(surface.weights, vec![1.0; 12]);
    }

    #[test]
    fn test_plane_via_generic_conversion() {
        let face = Face::natural(
            Surface::Plane(Plane::new(Frame::world())),
            UvBounds::new(-1.0, 1.0, 2.0, 5.0),
        );
        let promoted = promote_face(&face, &AnalyticKernel::new(), &RepairOptions::default())
            .unwrap();
        assert_eq!(promoted.kind, SurfaceKind::Plane);
        assert_eq!(promoted.path, PromotionPath::Generic);
        assert_eq!(promoted.surface.u_knots, vec![-1.0, -1.0, 1.0, 1.0]);
        assert_eq!(promoted.surface.v_knots, vec![2.0, 2.0, 5.0, 5.0]);
        let p = promoted.surface.evaluate(0.0, 3.0);
        assert_relative_eq!(p.distance(DVec3::new(0.0, 3.0, 0.0)), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_converter_failure() {
        let face = Face::natural(Surface::Plane(Plane::new(Frame::world())), unit_square());
        let err = promote_face(&face, &FailingConverter, &RepairOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ConversionError::GeometryConversionFailure(
                "Operation failed: solver diverged".to_string()
            )
        );
    }

    #[test]
    fn test_unsupported_post_conversion_type() {
        let face = Face::natural(
            Surface::Torus(ToroidalSurface::new(Frame::world(), 3.0, 1.0)),
            unit_square(),
        );
        let err = promote_face(&face, &IdentityConverter, &RepairOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ConversionError::UnsupportedPostConversionType(SurfaceKind::Torus)
        );
    }

    #[test]
    fn test_knot_length_mismatch_reported() {
        let mut spline = periodic_torus();
        spline.u_periodic = false;
        spline.u_mults = vec![3, 2, 2, 2, 3];
        // 8 poles need 11 knots, this expands to 12
        let face = Face::natural(Surface::BSpline(spline), unit_square());
        let err = promote_face(&face, &NullKernel, &RepairOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ConversionError::KnotStructureInvalid(KnotError::LengthMismatch {
                expected: 11,
                actual: 12
            })
        );
    }

    #[test]
    fn test_partially_clamped_direction() {
        // cubic, clamped at the start only
        let poles: Vec<DVec3> = (0..10)
            .map(|k| DVec3::new((k / 2) as f64, (k % 2) as f64, ((k / 2) as f64).sin()))
            .collect();
        let spline = BSplineSurface {
            u_degree: 3,
            v_degree: 1,
            nb_u_poles: 5,
            nb_v_poles: 2,
            poles,
            weights: None,
            u_knots: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            u_mults: vec![4, 1, 1, 1, 1, 1],
            v_knots: vec![0.0, 1.0],
            v_mults: vec![2, 2],
            u_periodic: false,
            v_periodic: false,
        };
        let promoted = promote_bspline(&spline, &RepairOptions::default()).unwrap();
        assert!(is_clamped(&promoted.u_knots, 3));
        assert_eq!(promoted.u_range(), (0.0, 2.0));
        for &u in &[0.0, 0.5, 1.3, 2.0] {
            let expected = spline.point(u, 0.25).unwrap();
            let found = promoted.evaluate(u, 0.25);
            assert_relative_eq!(found.distance(expected), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_clamp_to_order_policy_accepts_excess_end_multiplicity() {
        let spline = BSplineSurface {
            u_degree: 1,
            v_degree: 1,
            nb_u_poles: 2,
            nb_v_poles: 2,
            poles: vec![DVec3::ZERO, DVec3::Y, DVec3::X, DVec3::new(1.0, 1.0, 0.0)],
            weights: None,
            u_knots: vec![0.0, 1.0],
            u_mults: vec![3, 3],
            v_knots: vec![0.0, 1.0],
            v_mults: vec![2, 2],
            u_periodic: false,
            v_periodic: false,
        };
        assert!(promote_bspline(&spline, &RepairOptions::default()).is_err());
        let options = RepairOptions {
            multiplicity_policy: MultiplicityPolicy::ClampToOrder,
        };
        let promoted = promote_bspline(&spline, &options).unwrap();
        assert_eq!(promoted.u_knots, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut spline = periodic_torus();
        if let Some(w) = spline.weights.as_mut() {
            w[5] = -1.0;
        }
        let err = promote_bspline(&spline, &RepairOptions::default()).unwrap_err();
        assert!(matches!(err, ConversionError::GeometryConversionFailure(_)));
    }
}
