//! Trimming curve extraction
//!
//! Every boundary edge of a face becomes a clamped rational B-spline curve in
//! the `(u, v)` space of the face surface, restricted to the edge's range.

use glam::DVec4;
use tracing::trace;

use crate::geometry::{Curve2d, Line2d};
use crate::nurbs::periodic::segment_periodic;
use crate::nurbs::{
    ArcProfile, HomogeneousCurve, RationalBSplineCurve2d, RepairOptions, compress_knots,
    homogeneous, repair_knots,
};
use crate::promote::ConversionError;
use crate::topology::{Edge, Face};

/// Extract one trimming curve per edge, wires in order, edges in order.
///
/// The first failing edge fails the whole face.
pub fn extract_trimming_curves(
    face: &Face,
    options: &RepairOptions,
) -> Result<Vec<RationalBSplineCurve2d>, ConversionError> {
    face.edges()
        .enumerate()
        .map(|(index, edge)| {
            extract_edge_curve(edge, options).map_err(|e| ConversionError::CurveExtraction {
                edge: index,
                source: Box::new(e),
            })
        })
        .collect()
}

/// Trimming curve of a single edge
pub fn extract_edge_curve(
    edge: &Edge,
    options: &RepairOptions,
) -> Result<RationalBSplineCurve2d, ConversionError> {
    let (first, last) = (edge.first, edge.last);
    if !(first.is_finite() && last.is_finite() && first < last) {
        return Err(ConversionError::GeometryConversionFailure(format!(
            "invalid {} edge range [{first}, {last}]",
            edge.curve.type_name()
        )));
    }

    let curve = match &edge.curve {
        Curve2d::Line(line) => line_curve(line, first, last),
        Curve2d::Circle(circle) => ArcProfile::new(first, last)
            .map_err(|e| ConversionError::GeometryConversionFailure(e.to_string()))?
            .to_curve(circle.center, circle.x_dir, circle.y_dir, circle.radius),
        Curve2d::Bezier(bezier) => bezier.to_homogeneous()?.restrict(first, last)?,
        Curve2d::BSpline(spline) if spline.periodic => segment_periodic(
            spline.degree,
            &spline.knots,
            &spline.mults,
            spline.homogeneous_poles(),
            first,
            last,
        )?,
        Curve2d::BSpline(spline) => spline.to_homogeneous()?.restrict(first, last)?,
    };

    if let Some(pole) = curve
        .poles
        .iter()
        .find(|h| !(h.is_finite() && h.w > 0.0))
    {
        return Err(ConversionError::GeometryConversionFailure(format!(
            "invalid homogeneous pole {pole} on {} edge",
            edge.curve.type_name()
        )));
    }

    let (knots, mults) = compress_knots(&curve.knots);
    let knots = repair_knots(
        &knots,
        &mults,
        curve.poles.len(),
        curve.degree,
        (first, last),
        options,
    )?;
    let curve = HomogeneousCurve { knots, ..curve };

    let result = RationalBSplineCurve2d::from_homogeneous(&curve, first, last);
    result.validate()?;
    trace!(
        curve = edge.curve.type_name(),
        degree = result.degree,
        poles = result.poles.len(),
        "Extracted trimming curve"
    );
    Ok(result)
}

fn line_curve(line: &Line2d, first: f64, last: f64) -> HomogeneousCurve {
    let pole = |t: f64| -> DVec4 { homogeneous(line.point(t).extend(0.0), 1.0) };
    HomogeneousCurve {
        degree: 1,
        knots: vec![first, first, last, last],
        poles: vec![pole(first), pole(last)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Circle2d, Plane, Frame, Surface, UvBounds};
    use crate::nurbs::{BSplineCurve2d, BezierCurve2d, KnotError, is_clamped};
    use crate::topology::Wire;
    use approx::assert_relative_eq;
    use glam::DVec2;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI, TAU};

    fn options() -> RepairOptions {
        RepairOptions::default()
    }

    fn face_with(edges: Vec<Edge>) -> Face {
        Face::new(
            Surface::Plane(Plane::new(Frame::world())),
            UvBounds::new(-5.0, 5.0, -5.0, 5.0),
            vec![Wire::new(edges)],
        )
    }

    /// Periodic quadratic unit circle, 8 poles with multiplicity 2 knots
    fn periodic_circle() -> BSplineCurve2d {
        let w = FRAC_1_SQRT_2;
        BSplineCurve2d {
            degree: 2,
            poles: vec![
                DVec2::new(1.0, 0.0),
                DVec2::new(1.0, 1.0),
                DVec2::new(0.0, 1.0),
                DVec2::new(-1.0, 1.0),
                DVec2::new(-1.0, 0.0),
                DVec2::new(-1.0, -1.0),
                DVec2::new(0.0, -1.0),
                DVec2::new(1.0, -1.0),
            ],
            weights: Some(vec![1.0, w, 1.0, w, 1.0, w, 1.0, w]),
            knots: vec![0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2, TAU],
            mults: vec![2; 5],
            periodic: true,
        }
    }

    #[test]
    fn test_natural_boundary_is_four_lines() {
        let face = Face::natural(
            Surface::Plane(Plane::new(Frame::world())),
            UvBounds::new(0.0, 2.0, 0.0, 1.0),
        );
        let curves = extract_trimming_curves(&face, &options()).unwrap();
        assert_eq!(curves.len(), 4);
        for curve in &curves {
            assert_eq!(curve.degree, 1);
            assert_eq!(curve.knots, vec![0.0, 0.0, 1.0, 1.0]);
            assert_eq!(curve.weights, vec![1.0, 1.0]);
        }
        assert_eq!(curves[0].poles, vec![DVec2::new(0.0, 0.0), DVec2::new(2.0, 0.0)]);
    }

    #[test]
    fn test_circle_arc_knots_at_angles() {
        let edge = Edge::new(
            Curve2d::Circle(Circle2d::new(DVec2::new(1.0, 1.0), 0.5)),
            0.25,
            2.0,
        );
        let curve = extract_edge_curve(&edge, &options()).unwrap();
        assert_eq!(curve.degree, 2);
        assert_eq!(curve.range(), (0.25, 2.0));
        assert_eq!(curve.knots.first(), Some(&0.25));
        assert_eq!(curve.knots.last(), Some(&2.0));
        assert!(is_clamped(&curve.knots, 2));
        for &t in &[0.25, 0.9, 1.6, 2.0] {
            let p = curve.evaluate(t);
            assert_relative_eq!(p.distance(DVec2::new(1.0, 1.0)), 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_bezier_sub_range() {
        let bezier = BezierCurve2d {
            poles: vec![DVec2::ZERO, DVec2::new(1.0, 2.0), DVec2::new(2.0, 0.0)],
            weights: None,
        };
        let edge = Edge::new(Curve2d::Bezier(bezier.clone()), 0.2, 0.7);
        let curve = extract_edge_curve(&edge, &options()).unwrap();
        assert_eq!(curve.knots, vec![0.2, 0.2, 0.2, 0.7, 0.7, 0.7]);
        for &t in &[0.2, 0.45, 0.7] {
            let expected = bezier.point(t).unwrap();
            assert_relative_eq!(curve.evaluate(t).distance(expected), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_periodic_bspline_deperiodized() {
        let edge = Edge::new(Curve2d::BSpline(periodic_circle()), 0.0, TAU);
        let curve = extract_edge_curve(&edge, &options()).unwrap();
        assert_eq!(curve.poles.len(), 9);
        assert_eq!(curve.knots.len(), 12);
        assert!(is_clamped(&curve.knots, 2));
        for k in 0..=8 {
            let t = TAU * k as f64 / 8.0;
            assert_relative_eq!(curve.evaluate(t).length(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_periodic_bspline_across_seam() {
        let edge = Edge::new(Curve2d::BSpline(periodic_circle()), -FRAC_PI_2, FRAC_PI_2);
        let curve = extract_edge_curve(&edge, &options()).unwrap();
        assert_eq!(curve.range(), (-FRAC_PI_2, FRAC_PI_2));
        let start = curve.evaluate(-FRAC_PI_2);
        let end = curve.evaluate(FRAC_PI_2);
        assert_relative_eq!(start.distance(DVec2::new(0.0, -1.0)), 0.0, epsilon = 1e-12);
        assert_relative_eq!(end.distance(DVec2::new(0.0, 1.0)), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_open_bspline_segmented() {
        let spline = BSplineCurve2d {
            degree: 2,
            poles: vec![
                DVec2::ZERO,
                DVec2::new(1.0, 1.0),
                DVec2::new(2.0, -1.0),
                DVec2::new(3.0, 0.0),
            ],
            weights: None,
            knots: vec![0.0, 1.0, 2.0],
            mults: vec![3, 1, 3],
            periodic: false,
        };
        let edge = Edge::new(Curve2d::BSpline(spline.clone()), 0.5, 1.5);
        let curve = extract_edge_curve(&edge, &options()).unwrap();
        assert!(is_clamped(&curve.knots, 2));
        assert_eq!(curve.poles.len() + 3, curve.knots.len());
        for &t in &[0.5, 1.0, 1.5] {
            let expected = spline.point(t).unwrap();
            assert_relative_eq!(curve.evaluate(t).distance(expected), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_failing_edge_fails_face_with_index() {
        let good = Edge::segment(DVec2::ZERO, DVec2::X);
        let bad = Edge::new(Curve2d::Line(Line2d::new(DVec2::ZERO, DVec2::Y)), 1.0, 1.0);
        let err = extract_trimming_curves(&face_with(vec![good.clone(), good, bad]), &options())
            .unwrap_err();
        match err {
            ConversionError::CurveExtraction { edge, source } => {
                assert_eq!(edge, 2);
                assert!(matches!(*source, ConversionError::GeometryConversionFailure(_)));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_knot_error_propagates() {
        let spline = BSplineCurve2d {
            degree: 2,
            poles: vec![DVec2::ZERO, DVec2::X, DVec2::Y],
            weights: None,
            knots: vec![0.0, 1.0],
            mults: vec![3, 2],
            periodic: false,
        };
        let edge = Edge::new(Curve2d::BSpline(spline), 0.0, 1.0);
        let err = extract_edge_curve(&edge, &options()).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::KnotStructureInvalid(KnotError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_full_circle_accepted() {
        let edge = Edge::new(Curve2d::Circle(Circle2d::new(DVec2::ZERO, 2.0)), 0.0, TAU);
        let curve = extract_edge_curve(&edge, &options()).unwrap();
        assert_eq!(curve.poles.len(), 9);
        assert_relative_eq!(curve.evaluate(PI).distance(DVec2::new(-2.0, 0.0)), 0.0, epsilon = 1e-12);
    }
}
