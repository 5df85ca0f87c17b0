//! Input B-spline and Bezier geometry
//!
//! B-splines are kept in the raw "distinct knots + multiplicities" form with
//! explicit periodic flags, exactly as a modelling kernel hands them out.
//! Weights are optional; `None` means non-rational.

use glam::{DVec2, DVec3, DVec4};
use serde::{Deserialize, Serialize};

use super::knot::{KnotError, expand_knots};
use super::periodic::{HomogeneousCurve, HomogeneousGrid, homogeneous};

fn weight_at(weights: &Option<Vec<f64>>, index: usize) -> f64 {
    weights
        .as_ref()
        .and_then(|w| w.get(index).copied())
        .unwrap_or(1.0)
}

fn period_of(knots: &[f64]) -> Option<f64> {
    Some(knots.last()? - knots.first()?)
}

/// Tensor-product B-spline surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BSplineSurface {
    pub u_degree: usize,
    pub v_degree: usize,
    pub nb_u_poles: usize,
    pub nb_v_poles: usize,
    /// Row-major, U index major
    pub poles: Vec<DVec3>,
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
    pub u_knots: Vec<f64>,
    pub u_mults: Vec<usize>,
    pub v_knots: Vec<f64>,
    pub v_mults: Vec<usize>,
    #[serde(default)]
    pub u_periodic: bool,
    #[serde(default)]
    pub v_periodic: bool,
}

impl BSplineSurface {
    pub fn pole(&self, i: usize, j: usize) -> DVec3 {
        self.poles[i * self.nb_v_poles + j]
    }

    pub fn weight(&self, i: usize, j: usize) -> f64 {
        weight_at(&self.weights, i * self.nb_v_poles + j)
    }

    pub fn u_period(&self) -> Option<f64> {
        period_of(&self.u_knots)
    }

    pub fn v_period(&self) -> Option<f64> {
        period_of(&self.v_knots)
    }

    /// Pole grid in homogeneous form
    pub fn homogeneous_grid(&self) -> HomogeneousGrid {
        let poles = self
            .poles
            .iter()
            .enumerate()
            .map(|(k, &p)| homogeneous(p, weight_at(&self.weights, k)))
            .collect();
        HomogeneousGrid::new(self.nb_u_poles, self.nb_v_poles, poles)
    }

    /// Check pole and weight counts against the declared grid
    pub fn check_grid(&self) -> Result<(), KnotError> {
        let expected = self.nb_u_poles * self.nb_v_poles;
        if self.poles.len() != expected {
            return Err(KnotError::LengthMismatch {
                expected,
                actual: self.poles.len(),
            });
        }
        match &self.weights {
            Some(w) if w.len() != expected => Err(KnotError::LengthMismatch {
                expected,
                actual: w.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Evaluate by unrolling both directions; `None` for inconsistent data
    pub fn point(&self, u: f64, v: f64) -> Option<DVec3> {
        self.check_grid().ok()?;
        let grid = self.homogeneous_grid();
        let (row_grid, _) = grid
            .transform_u(|column| {
                HomogeneousCurve::from_distinct(
                    self.u_degree,
                    &self.u_knots,
                    &self.u_mults,
                    column,
                    self.u_periodic,
                )
                .map(|c| single_pole_curve(c.evaluate(u)))
            })
            .ok()?;
        let row = HomogeneousCurve::from_distinct(
            self.v_degree,
            &self.v_knots,
            &self.v_mults,
            row_grid.v_curve(0),
            self.v_periodic,
        )
        .ok()?;
        row.point(v)
    }
}

/// Degree zero curve holding one pole; used to collapse a grid direction
fn single_pole_curve(pole: DVec4) -> HomogeneousCurve {
    HomogeneousCurve {
        degree: 0,
        knots: vec![0.0, 1.0],
        poles: vec![pole],
    }
}

/// Bezier patch on `[0, 1] x [0, 1]`; degrees are `poles - 1` per direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BezierSurface {
    pub nb_u_poles: usize,
    pub nb_v_poles: usize,
    /// Row-major, U index major
    pub poles: Vec<DVec3>,
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
}

impl BezierSurface {
    pub fn u_degree(&self) -> usize {
        self.nb_u_poles.saturating_sub(1)
    }

    pub fn v_degree(&self) -> usize {
        self.nb_v_poles.saturating_sub(1)
    }

    pub fn weight(&self, i: usize, j: usize) -> f64 {
        weight_at(&self.weights, i * self.nb_v_poles + j)
    }

    /// Equivalent single-span B-spline surface
    pub fn to_bspline(&self) -> BSplineSurface {
        BSplineSurface {
            u_degree: self.u_degree(),
            v_degree: self.v_degree(),
            nb_u_poles: self.nb_u_poles,
            nb_v_poles: self.nb_v_poles,
            poles: self.poles.clone(),
            weights: self.weights.clone(),
            u_knots: vec![0.0, 1.0],
            u_mults: vec![self.nb_u_poles; 2],
            v_knots: vec![0.0, 1.0],
            v_mults: vec![self.nb_v_poles; 2],
            u_periodic: false,
            v_periodic: false,
        }
    }

    pub fn point(&self, u: f64, v: f64) -> Option<DVec3> {
        if self.nb_u_poles == 0 || self.nb_v_poles == 0 {
            return None;
        }
        self.to_bspline().point(u, v)
    }
}

/// Rational or polynomial Bezier pcurve on `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BezierCurve2d {
    pub poles: Vec<DVec2>,
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
}

impl BezierCurve2d {
    pub fn degree(&self) -> usize {
        self.poles.len().saturating_sub(1)
    }

    pub fn to_homogeneous(&self) -> Result<HomogeneousCurve, KnotError> {
        let n = self.poles.len();
        HomogeneousCurve::new(
            self.degree(),
            expand_knots(&[0.0, 1.0], &[n, n]),
            homogeneous_2d(&self.poles, &self.weights),
        )
    }

    pub fn point(&self, t: f64) -> Option<DVec2> {
        Some(self.to_homogeneous().ok()?.point(t)?.truncate())
    }
}

fn homogeneous_2d(poles: &[DVec2], weights: &Option<Vec<f64>>) -> Vec<DVec4> {
    poles
        .iter()
        .enumerate()
        .map(|(k, p)| homogeneous(p.extend(0.0), weight_at(weights, k)))
        .collect()
}

/// B-spline pcurve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BSplineCurve2d {
    pub degree: usize,
    pub poles: Vec<DVec2>,
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
    pub knots: Vec<f64>,
    pub mults: Vec<usize>,
    #[serde(default)]
    pub periodic: bool,
}

impl BSplineCurve2d {
    pub fn period(&self) -> Option<f64> {
        period_of(&self.knots)
    }

    pub fn homogeneous_poles(&self) -> Vec<DVec4> {
        homogeneous_2d(&self.poles, &self.weights)
    }

    /// Homogeneous curve, unrolled when periodic
    pub fn to_homogeneous(&self) -> Result<HomogeneousCurve, KnotError> {
        check_weights(self.poles.len(), &self.weights)?;
        HomogeneousCurve::from_distinct(
            self.degree,
            &self.knots,
            &self.mults,
            self.homogeneous_poles(),
            self.periodic,
        )
    }

    pub fn point(&self, t: f64) -> Option<DVec2> {
        Some(self.to_homogeneous().ok()?.point(t)?.truncate())
    }
}

/// B-spline basis curve of a swept surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BSplineCurve3d {
    pub degree: usize,
    pub poles: Vec<DVec3>,
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
    pub knots: Vec<f64>,
    pub mults: Vec<usize>,
    #[serde(default)]
    pub periodic: bool,
}

impl BSplineCurve3d {
    pub fn period(&self) -> Option<f64> {
        period_of(&self.knots)
    }

    pub fn homogeneous_poles(&self) -> Vec<DVec4> {
        self.poles
            .iter()
            .enumerate()
            .map(|(k, &p)| homogeneous(p, weight_at(&self.weights, k)))
            .collect()
    }

    pub fn to_homogeneous(&self) -> Result<HomogeneousCurve, KnotError> {
        check_weights(self.poles.len(), &self.weights)?;
        HomogeneousCurve::from_distinct(
            self.degree,
            &self.knots,
            &self.mults,
            self.homogeneous_poles(),
            self.periodic,
        )
    }

    pub fn point(&self, t: f64) -> Option<DVec3> {
        self.to_homogeneous().ok()?.point(t)
    }
}

fn check_weights(poles: usize, weights: &Option<Vec<f64>>) -> Result<(), KnotError> {
    match weights {
        Some(w) if w.len() != poles => Err(KnotError::LengthMismatch {
            expected: poles,
            actual: w.len(),
        }),
        _ => Ok(()),
    }
}
