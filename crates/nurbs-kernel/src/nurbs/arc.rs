//! Rational quadratic circular arcs
//!
//! An arc from `start` to `end` (radians) is split into spans of at most 90
//! degrees. Each span contributes an end pole on the unit circle and a middle
//! pole at `1 / cos(d/2)` with weight `cos(d/2)`, where `d` is the span angle.
//! Knots sit at the span boundary angles so that the spline parameter agrees
//! with the angle at every knot.

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::{DVec2, DVec4};
use thiserror::Error;

use super::periodic::{HomogeneousCurve, homogeneous};

const SWEEP_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid arc sweep from {start} to {end}")]
pub struct ArcError {
    pub start: f64,
    pub end: f64,
}

/// Unit-circle arc poles as `(cos, sin)` coefficients, with weights and knots
#[derive(Debug, Clone, PartialEq)]
pub struct ArcProfile {
    pub points: Vec<DVec2>,
    pub weights: Vec<f64>,
    pub knots: Vec<f64>,
    pub mults: Vec<usize>,
}

impl ArcProfile {
    pub const DEGREE: usize = 2;

    /// Build the profile of the arc `[start, end]`; the sweep must lie in `(0, 2 pi]`.
    pub fn new(start: f64, end: f64) -> Result<Self, ArcError> {
        let sweep = end - start;
        if !(start.is_finite() && end.is_finite())
            || sweep <= 0.0
            || sweep > TAU + SWEEP_TOLERANCE
        {
            return Err(ArcError { start, end });
        }

        let spans = ((sweep / FRAC_PI_2) - SWEEP_TOLERANCE).ceil().max(1.0) as usize;
        let step = sweep / spans as f64;
        let mid_weight = (step / 2.0).cos();

        let mut points = Vec::with_capacity(2 * spans + 1);
        let mut weights = Vec::with_capacity(2 * spans + 1);
        let mut knots = Vec::with_capacity(spans + 1);
        for i in 0..spans {
            let angle = start + step * i as f64;
            let (s, c) = angle.sin_cos();
            points.push(DVec2::new(c, s));
            weights.push(1.0);

            let (sm, cm) = (angle + step / 2.0).sin_cos();
            points.push(DVec2::new(cm, sm) / mid_weight);
            weights.push(mid_weight);

            knots.push(angle);
        }
        let (s, c) = end.sin_cos();
        points.push(DVec2::new(c, s));
        weights.push(1.0);
        knots.push(end);

        let mut mults = vec![2; spans + 1];
        mults[0] = 3;
        mults[spans] = 3;

        Ok(Self {
            points,
            weights,
            knots,
            mults,
        })
    }

    /// Expanded clamped knot vector
    pub fn flat_knots(&self) -> Vec<f64> {
        super::knot::expand_knots(&self.knots, &self.mults)
    }

    /// Homogeneous 2D curve `center + radius * (c x_dir + s y_dir)`
    pub fn to_curve(
        &self,
        center: DVec2,
        x_dir: DVec2,
        y_dir: DVec2,
        radius: f64,
    ) -> HomogeneousCurve {
        let poles: Vec<DVec4> = self
            .points
            .iter()
            .zip(&self.weights)
            .map(|(cs, &w)| {
                let p = center + (x_dir * cs.x + y_dir * cs.y) * radius;
                homogeneous(p.extend(0.0), w)
            })
            .collect();
        HomogeneousCurve {
            degree: Self::DEGREE,
            knots: self.flat_knots(),
            poles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_span_count() {
        assert_eq!(ArcProfile::new(0.0, FRAC_PI_2).unwrap().points.len(), 3);
        assert_eq!(ArcProfile::new(0.0, PI).unwrap().points.len(), 5);
        assert_eq!(ArcProfile::new(0.0, 1.7).unwrap().points.len(), 5);
        assert_eq!(ArcProfile::new(0.0, TAU).unwrap().points.len(), 9);
    }

    #[test]
    fn test_knots_at_angles() {
        let arc = ArcProfile::new(-1.0, 2.0).unwrap();
        assert_eq!(arc.knots.len(), 3);
        assert_relative_eq!(arc.knots[1], 0.5);
        assert_eq!(arc.mults, vec![3, 2, 3]);
        let flat = arc.flat_knots();
        assert_eq!(flat.len(), arc.points.len() + 3);
    }

    #[test]
    fn test_points_on_circle_and_knots_match_angles() {
        let arc = ArcProfile::new(0.3, 5.0).unwrap();
        let curve = arc.to_curve(DVec2::new(1.0, -2.0), DVec2::X, DVec2::Y, 2.5);
        for i in 0..=50 {
            let t = 0.3 + 4.7 * i as f64 / 50.0;
            let p = curve.point(t).unwrap();
            assert_relative_eq!(
                (p.truncate() - DVec2::new(1.0, -2.0)).length(),
                2.5,
                epsilon = 1e-12
            );
        }
        for &angle in &arc.knots {
            let p = curve.point(angle).unwrap().truncate();
            let expected = DVec2::new(1.0, -2.0) + DVec2::new(angle.cos(), angle.sin()) * 2.5;
            assert_relative_eq!(p.distance(expected), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_invalid_sweeps() {
        assert!(ArcProfile::new(1.0, 1.0).is_err());
        assert!(ArcProfile::new(1.0, 0.0).is_err());
        assert!(ArcProfile::new(0.0, 7.0).is_err());
        assert!(ArcProfile::new(0.0, f64::INFINITY).is_err());
    }
}
