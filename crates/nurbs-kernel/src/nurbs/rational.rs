//! Canonical output geometry: clamped rational B-splines with flat knot vectors

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use super::basis::{basis_funs, find_span};
use super::knot::{KnotError, is_clamped, validate_knot_vector};
use super::periodic::{HomogeneousCurve, HomogeneousGrid, cartesian};

fn check_direction(knots: &[f64], degree: usize, nb_poles: usize) -> Result<(), KnotError> {
    if nb_poles < degree + 1 {
        return Err(KnotError::TooFewPoles {
            poles: nb_poles,
            degree,
            required: degree + 1,
        });
    }
    let expected = nb_poles + degree + 1;
    if knots.len() != expected {
        return Err(KnotError::LengthMismatch {
            expected,
            actual: knots.len(),
        });
    }
    if !validate_knot_vector(knots, degree, nb_poles) {
        let index = knots.windows(2).position(|w| w[0] > w[1]).unwrap_or(0);
        return Err(KnotError::Unsorted { index: index + 1 });
    }
    if !is_clamped(knots, degree) {
        return Err(KnotError::NotClamped { order: degree + 1 });
    }
    Ok(())
}

/// Tensor-product rational B-spline patch, never periodic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationalBSplineSurface {
    pub u_degree: usize,
    pub v_degree: usize,
    pub nb_u_poles: usize,
    pub nb_v_poles: usize,
    /// Row-major, U index major
    pub poles: Vec<DVec3>,
    /// One weight per pole, 1.0 for non-rational sources
    pub weights: Vec<f64>,
    /// Expanded, clamped; `nb_u_poles + u_degree + 1` entries
    pub u_knots: Vec<f64>,
    pub v_knots: Vec<f64>,
}

impl RationalBSplineSurface {
    /// Split a homogeneous grid into Cartesian poles and weights
    pub fn from_grid(
        grid: &HomogeneousGrid,
        u_degree: usize,
        v_degree: usize,
        u_knots: Vec<f64>,
        v_knots: Vec<f64>,
    ) -> Self {
        let (poles, weights) = grid.poles.iter().map(|&h| cartesian(h)).unzip();
        Self {
            u_degree,
            v_degree,
            nb_u_poles: grid.nu,
            nb_v_poles: grid.nv,
            poles,
            weights,
            u_knots,
            v_knots,
        }
    }

    /// Highest U pole index `n`
    pub fn n(&self) -> usize {
        self.nb_u_poles.saturating_sub(1)
    }

    /// Highest V pole index `m`
    pub fn m(&self) -> usize {
        self.nb_v_poles.saturating_sub(1)
    }

    pub fn pole(&self, i: usize, j: usize) -> DVec3 {
        self.poles[i * self.nb_v_poles + j]
    }

    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.weights[i * self.nb_v_poles + j]
    }

    pub fn u_range(&self) -> (f64, f64) {
        (self.u_knots[self.u_degree], self.u_knots[self.nb_u_poles])
    }

    pub fn v_range(&self) -> (f64, f64) {
        (self.v_knots[self.v_degree], self.v_knots[self.nb_v_poles])
    }

    /// Check counts, knot vector lengths, ordering and clamping
    pub fn validate(&self) -> Result<(), KnotError> {
        let count = self.nb_u_poles * self.nb_v_poles;
        for actual in [self.poles.len(), self.weights.len()] {
            if actual != count {
                return Err(KnotError::LengthMismatch {
                    expected: count,
                    actual,
                });
            }
        }
        check_direction(&self.u_knots, self.u_degree, self.nb_u_poles)?;
        check_direction(&self.v_knots, self.v_degree, self.nb_v_poles)
    }

    /// Rational point at `(u, v)`; requires a valid surface
    pub fn evaluate(&self, u: f64, v: f64) -> DVec3 {
        let (p, q) = (self.u_degree, self.v_degree);
        let u_span = find_span(self.n(), p, u, &self.u_knots);
        let v_span = find_span(self.m(), q, v, &self.v_knots);
        let nu = basis_funs(u_span, u, p, &self.u_knots);
        let nv = basis_funs(v_span, v, q, &self.v_knots);

        let mut sum = DVec3::ZERO;
        let mut w_sum = 0.0;
        for (a, bu) in nu.iter().enumerate() {
            let i = u_span - p + a;
            for (b, bv) in nv.iter().enumerate() {
                let j = v_span - q + b;
                let w = bu * bv * self.weight(i, j);
                sum += self.pole(i, j) * w;
                w_sum += w;
            }
        }
        sum / w_sum
    }
}

/// Trimming curve in the `(u, v)` space of its surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationalBSplineCurve2d {
    pub degree: usize,
    pub poles: Vec<DVec2>,
    pub weights: Vec<f64>,
    /// Expanded, clamped; `poles + degree + 1` entries
    pub knots: Vec<f64>,
    /// Parameter range used by the edge
    pub first: f64,
    pub last: f64,
}

impl RationalBSplineCurve2d {
    /// Drop the third coordinate of a planar homogeneous curve
    pub fn from_homogeneous(curve: &HomogeneousCurve, first: f64, last: f64) -> Self {
        let (poles, weights) = curve
            .poles
            .iter()
            .map(|&h| {
                let (p, w) = cartesian(h);
                (p.truncate(), w)
            })
            .unzip();
        Self {
            degree: curve.degree,
            poles,
            weights,
            knots: curve.knots.clone(),
            first,
            last,
        }
    }

    /// Highest pole index `n`
    pub fn n(&self) -> usize {
        self.poles.len().saturating_sub(1)
    }

    pub fn range(&self) -> (f64, f64) {
        (self.first, self.last)
    }

    pub fn validate(&self) -> Result<(), KnotError> {
        if self.weights.len() != self.poles.len() {
            return Err(KnotError::LengthMismatch {
                expected: self.poles.len(),
                actual: self.weights.len(),
            });
        }
        check_direction(&self.knots, self.degree, self.poles.len())
    }

    pub fn evaluate(&self, t: f64) -> DVec2 {
        let p = self.degree;
        let span = find_span(self.n(), p, t, &self.knots);
        let mut sum = DVec2::ZERO;
        let mut w_sum = 0.0;
        for (a, b) in basis_funs(span, t, p, &self.knots).iter().enumerate() {
            let w = b * self.weights[span - p + a];
            sum += self.poles[span - p + a] * w;
            w_sum += w;
        }
        sum / w_sum
    }
}
