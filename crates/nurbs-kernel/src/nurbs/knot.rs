//! Knot vector utilities and knot repair
//!
//! B-spline data arrives in "distinct knots + multiplicities" form. Consumers
//! of the `.nurbs` format expect a fully expanded knot vector that is clamped
//! (first and last knot repeated `degree + 1` times) and has exactly
//! `poles + degree + 1` entries. [`repair_knots`] produces that form or fails.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural knot vector errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KnotError {
    #[error("knot vector length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("{knots} distinct knots but {mults} multiplicities")]
    MultiplicityCount { knots: usize, mults: usize },

    #[error("knot vector decreases at index {index}")]
    Unsorted { index: usize },

    #[error("need at least {required} poles for degree {degree}, got {poles}")]
    TooFewPoles {
        poles: usize,
        degree: usize,
        required: usize,
    },

    #[error("parameter {value} outside knot domain [{lo}, {hi}]")]
    OutOfDomain { value: f64, lo: f64, hi: f64 },

    #[error("knot multiplicity {multiplicity} exceeds degree + 1 = {order}")]
    ExcessMultiplicity { multiplicity: usize, order: usize },

    #[error("end knots are not repeated degree + 1 = {order} times")]
    NotClamped { order: usize },
}

/// How multiplicities above `degree + 1` are handled before expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MultiplicityPolicy {
    /// Expand multiplicities as given
    #[default]
    Preserve,
    /// Cap every multiplicity at `degree + 1` before expansion
    ClampToOrder,
}

/// Options for knot repair
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RepairOptions {
    /// Multiplicity handling
    pub multiplicity_policy: MultiplicityPolicy,
}

/// Expand distinct knots into a flat knot sequence.
pub fn expand_knots(knots: &[f64], mults: &[usize]) -> Vec<f64> {
    knots
        .iter()
        .zip(mults)
        .flat_map(|(&k, &m)| std::iter::repeat_n(k, m))
        .collect()
}

/// Compress a flat knot sequence into distinct knots and multiplicities.
///
/// Knots are merged only when bitwise equal.
pub fn compress_knots(flat: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let mut knots: Vec<f64> = Vec::new();
    let mut mults: Vec<usize> = Vec::new();
    for &k in flat {
        match knots.last() {
            Some(&last) if last == k => {
                if let Some(m) = mults.last_mut() {
                    *m += 1;
                }
            }
            _ => {
                knots.push(k);
                mults.push(1);
            }
        }
    }
    (knots, mults)
}

/// Check that a flat knot vector has `n_poles + degree + 1` non-decreasing entries.
pub fn validate_knot_vector(knots: &[f64], degree: usize, n_poles: usize) -> bool {
    knots.len() == n_poles + degree + 1 && knots.windows(2).all(|w| w[0] <= w[1])
}

/// Check that the first and last knot are repeated exactly `degree + 1` times.
pub fn is_clamped(knots: &[f64], degree: usize) -> bool {
    if knots.len() < 2 * (degree + 1) {
        return false;
    }
    let first = knots[0];
    let last = knots[knots.len() - 1];
    let head = knots.iter().take_while(|&&k| k == first).count();
    let tail = knots.iter().rev().take_while(|&&k| k == last).count();
    first < last && head == degree + 1 && tail == degree + 1
}

/// Knot vector of a single-span B-spline equivalent to a Bezier patch.
///
/// The first half of the `2 * n_poles` entries is `lo`, the second half `hi`.
pub fn bezier_knots(n_poles: usize, lo: f64, hi: f64) -> Vec<f64> {
    let len = 2 * n_poles;
    (0..len).map(|i| if i < len / 2 { lo } else { hi }).collect()
}

/// Expand and clamp a raw knot sequence.
///
/// `nb_poles` is the pole count `n + 1`; the result has exactly
/// `nb_poles + degree + 1` entries whose first and last `degree + 1` values
/// are overwritten with `bounds.0` and `bounds.1`.
pub fn repair_knots(
    knots: &[f64],
    mults: &[usize],
    nb_poles: usize,
    degree: usize,
    bounds: (f64, f64),
    options: &RepairOptions,
) -> Result<Vec<f64>, KnotError> {
    if knots.len() != mults.len() {
        return Err(KnotError::MultiplicityCount {
            knots: knots.len(),
            mults: mults.len(),
        });
    }

    let mults: Vec<usize> = match options.multiplicity_policy {
        MultiplicityPolicy::Preserve => mults.to_vec(),
        MultiplicityPolicy::ClampToOrder => mults.iter().map(|&m| m.min(degree + 1)).collect(),
    };

    let flat = expand_knots(knots, &mults);
    repair_flat_knots(flat, nb_poles, degree, bounds)
}

/// Clamp an already expanded knot sequence.
pub fn repair_flat_knots(
    mut flat: Vec<f64>,
    nb_poles: usize,
    degree: usize,
    bounds: (f64, f64),
) -> Result<Vec<f64>, KnotError> {
    if nb_poles < degree + 1 {
        return Err(KnotError::TooFewPoles {
            poles: nb_poles,
            degree,
            required: degree + 1,
        });
    }

    let expected = nb_poles + degree + 1;
    if flat.len() != expected {
        return Err(KnotError::LengthMismatch {
            expected,
            actual: flat.len(),
        });
    }

    let (lo, hi) = bounds;
    let len = flat.len();
    for k in &mut flat[..=degree] {
        *k = lo;
    }
    for k in &mut flat[len - degree - 1..] {
        *k = hi;
    }

    if let Some(index) = flat.windows(2).position(|w| w[0] > w[1]) {
        return Err(KnotError::Unsorted { index: index + 1 });
    }

    Ok(flat)
}
