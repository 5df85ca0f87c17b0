//! Homogeneous B-spline curves: knot insertion, unperiodizing and segmentation
//!
//! Poles are stored in homogeneous form `(w x, w y, w z, w)` so that every
//! operation here is exact for rational curves. 2D curves use `z = 0`.

use glam::{DVec3, DVec4};

use super::basis::{basis_funs, find_span};
use super::knot::{KnotError, expand_knots, is_clamped};

const DOMAIN_TOLERANCE: f64 = 1e-9;

/// Homogeneous pole from a Cartesian point and a weight
pub fn homogeneous(point: DVec3, weight: f64) -> DVec4 {
    (point * weight).extend(weight)
}

/// Cartesian point and weight of a homogeneous pole
pub fn cartesian(pole: DVec4) -> (DVec3, f64) {
    (pole.truncate() / pole.w, pole.w)
}

/// Non-periodic B-spline curve with a flat knot vector
#[derive(Debug, Clone, PartialEq)]
pub struct HomogeneousCurve {
    pub degree: usize,
    pub knots: Vec<f64>,
    pub poles: Vec<DVec4>,
}

impl HomogeneousCurve {
    /// Check the structural invariant `knots = poles + degree + 1`.
    pub fn new(degree: usize, knots: Vec<f64>, poles: Vec<DVec4>) -> Result<Self, KnotError> {
        if poles.len() < degree + 1 {
            return Err(KnotError::TooFewPoles {
                poles: poles.len(),
                degree,
                required: degree + 1,
            });
        }
        let expected = poles.len() + degree + 1;
        if knots.len() != expected {
            return Err(KnotError::LengthMismatch {
                expected,
                actual: knots.len(),
            });
        }
        if let Some(index) = knots.windows(2).position(|w| w[0] > w[1]) {
            return Err(KnotError::Unsorted { index: index + 1 });
        }
        Ok(Self {
            degree,
            knots,
            poles,
        })
    }

    /// Build from distinct knots and multiplicities, unrolling periodic data.
    pub fn from_distinct(
        degree: usize,
        knots: &[f64],
        mults: &[usize],
        poles: Vec<DVec4>,
        periodic: bool,
    ) -> Result<Self, KnotError> {
        if periodic {
            return Self::unperiodize(degree, knots, mults, poles);
        }
        if knots.len() != mults.len() {
            return Err(KnotError::MultiplicityCount {
                knots: knots.len(),
                mults: mults.len(),
            });
        }
        Self::new(degree, expand_knots(knots, mults), poles)
    }

    /// Unroll a periodic curve into an equivalent unclamped curve.
    ///
    /// Distinct knots `k_0..=k_m` with multiplicities `m_i` describe one
    /// period `T = k_m - k_0` carrying `N = m_0 + .. + m_(m-1)` poles. With
    /// `f` the expanded first period and `t(j) = f[j mod N] + floor(j / N) T`,
    /// the result has knots `t(j - s)` for `j = 0..=N + 2p`, `s = p + 1 - m_0`,
    /// and poles `P[i mod N]` for `i = 0..N + p`. Its domain is exactly one
    /// period starting at `t(p - s)`.
    pub fn unperiodize(
        degree: usize,
        knots: &[f64],
        mults: &[usize],
        poles: Vec<DVec4>,
    ) -> Result<Self, KnotError> {
        if knots.len() != mults.len() {
            return Err(KnotError::MultiplicityCount {
                knots: knots.len(),
                mults: mults.len(),
            });
        }
        if knots.len() < 2 {
            return Err(KnotError::LengthMismatch {
                expected: 2,
                actual: knots.len(),
            });
        }
        if let Some(index) = knots.windows(2).position(|w| w[0] >= w[1]) {
            return Err(KnotError::Unsorted { index: index + 1 });
        }

        let m = knots.len() - 1;
        let first_period = expand_knots(&knots[..m], &mults[..m]);
        let n = first_period.len();
        if poles.len() != n || n == 0 {
            return Err(KnotError::LengthMismatch {
                expected: n,
                actual: poles.len(),
            });
        }
        if mults[0] > degree + 1 {
            return Err(KnotError::ExcessMultiplicity {
                multiplicity: mults[0],
                order: degree + 1,
            });
        }

        let period = knots[m] - knots[0];
        let shift = (degree + 1 - mults[0]) as isize;
        let n_signed = n as isize;
        let unrolled = |j: isize| {
            first_period[j.rem_euclid(n_signed) as usize] + j.div_euclid(n_signed) as f64 * period
        };

        let flat = (0..=(n + 2 * degree) as isize)
            .map(|j| unrolled(j - shift))
            .collect();
        let unrolled_poles = (0..n + degree).map(|i| poles[i % n]).collect();

        Self::new(degree, flat, unrolled_poles)
    }

    /// Parametric domain `[knots[p], knots[n + 1]]`
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[self.degree], self.knots[self.poles.len()])
    }

    /// Number of knots exactly equal to `u`
    pub fn multiplicity(&self, u: f64) -> usize {
        self.knots.iter().filter(|&&k| k == u).count()
    }

    pub fn is_clamped(&self) -> bool {
        is_clamped(&self.knots, self.degree)
    }

    /// Insert `u` once (The NURBS Book, A5.1). The curve shape is unchanged.
    pub fn insert_knot(&mut self, u: f64) -> Result<(), KnotError> {
        let p = self.degree;
        let (lo, hi) = self.domain();
        if !(lo <= u && u <= hi) {
            return Err(KnotError::OutOfDomain { value: u, lo, hi });
        }

        let s = self.multiplicity(u);
        if s > p {
            return Err(KnotError::ExcessMultiplicity {
                multiplicity: s + 1,
                order: p + 1,
            });
        }

        let k = self
            .knots
            .iter()
            .rposition(|&t| t <= u)
            .ok_or(KnotError::OutOfDomain { value: u, lo, hi })?;

        let n = self.poles.len() - 1;
        let mut poles = Vec::with_capacity(n + 2);
        for i in 0..=n + 1 {
            let q = if i + p <= k {
                self.poles[i]
            } else if i + s <= k {
                let denom = self.knots[i + p] - self.knots[i];
                let alpha = if denom == 0.0 {
                    0.0
                } else {
                    (u - self.knots[i]) / denom
                };
                self.poles[i - 1] * (1.0 - alpha) + self.poles[i] * alpha
            } else {
                self.poles[i - 1]
            };
            poles.push(q);
        }

        self.knots.insert(k + 1, u);
        self.poles = poles;
        Ok(())
    }

    /// Restrict the curve to `[a, b]` and clamp both ends.
    ///
    /// Each end is inserted until it reaches multiplicity `p` (at least 1),
    /// then the poles and knots outside the range are dropped.
    pub fn segment(&self, a: f64, b: f64) -> Result<Self, KnotError> {
        let (lo, hi) = self.domain();
        for value in [a, b] {
            if !(lo <= value && value <= hi) {
                return Err(KnotError::OutOfDomain { value, lo, hi });
            }
        }
        if a >= b {
            return Err(KnotError::Unsorted { index: 1 });
        }

        let p = self.degree;
        let target = p.max(1);
        let mut curve = self.clone();
        for value in [a, b] {
            while curve.multiplicity(value) < target {
                curve.insert_knot(value)?;
            }
        }

        let out_of_domain = |value| KnotError::OutOfDomain { value, lo, hi };
        let k = curve
            .knots
            .iter()
            .rposition(|&t| t == a)
            .ok_or(out_of_domain(a))?;
        let kb = curve
            .knots
            .iter()
            .position(|&t| t == b)
            .ok_or(out_of_domain(b))?;

        let mut knots = Vec::with_capacity(kb - k + 2 * p + 1);
        knots.extend(std::iter::repeat_n(a, p + 1));
        knots.extend_from_slice(&curve.knots[k + 1..kb]);
        knots.extend(std::iter::repeat_n(b, p + 1));
        let poles = curve.poles[k - p..kb].to_vec();

        Self::new(p, knots, poles)
    }

    /// Clamp both ends of the domain without changing the geometry
    pub fn clamped(&self) -> Result<Self, KnotError> {
        if self.is_clamped() {
            return Ok(self.clone());
        }
        let (a, b) = self.domain();
        self.segment(a, b)
    }

    /// Clamped piece over `[first, last]`. Ends within a small tolerance of
    /// the domain bounds snap onto them.
    pub fn restrict(&self, first: f64, last: f64) -> Result<Self, KnotError> {
        let (lo, hi) = self.domain();
        let tol = DOMAIN_TOLERANCE * (1.0 + (hi - lo).abs());
        let a = if (first - lo).abs() <= tol { lo } else { first };
        let b = if (last - hi).abs() <= tol { hi } else { last };
        if a == lo && b == hi {
            self.clamped()
        } else {
            self.segment(a, b)
        }
    }

    /// Homogeneous point at `u`
    pub fn evaluate(&self, u: f64) -> DVec4 {
        let p = self.degree;
        let n = self.poles.len() - 1;
        let span = find_span(n, p, u, &self.knots);
        basis_funs(span, u, p, &self.knots)
            .iter()
            .enumerate()
            .fold(DVec4::ZERO, |acc, (r, &b)| acc + self.poles[span - p + r] * b)
    }

    /// Cartesian point at `u`, `None` when the weight vanishes
    pub fn point(&self, u: f64) -> Option<DVec3> {
        let h = self.evaluate(u);
        (h.w != 0.0).then(|| h.truncate() / h.w)
    }
}

/// Clamped piece `[first, last]` of a periodic curve given in distinct form.
///
/// The window may start in any period and may straddle the seam; it must not
/// be longer than one period. The curve is unrolled over one or two periods,
/// cut, and its knots shifted back by whole periods.
pub fn segment_periodic(
    degree: usize,
    knots: &[f64],
    mults: &[usize],
    poles: Vec<DVec4>,
    first: f64,
    last: f64,
) -> Result<HomogeneousCurve, KnotError> {
    let base = HomogeneousCurve::unperiodize(degree, knots, mults, poles.clone())?;
    let (lo, hi) = base.domain();
    let period = hi - lo;
    let tol = DOMAIN_TOLERANCE * (1.0 + period.abs());
    if !(first < last) || last - first > period + tol {
        return Err(KnotError::OutOfDomain {
            value: last,
            lo: first,
            hi: first + period,
        });
    }

    let mut shift = ((first - lo) / period).floor() * period;
    if (first - shift - hi).abs() <= tol {
        // window starting on the seam of the next period
        shift += period;
    }
    let (a, b) = (first - shift, last - shift);

    let unrolled = if b <= hi + tol {
        base
    } else {
        let m = knots.len() - 1;
        let doubled_knots: Vec<f64> = knots[..m]
            .iter()
            .copied()
            .chain(knots.iter().map(|k| k + period))
            .collect();
        let doubled_mults: Vec<usize> = mults[..m]
            .iter()
            .chain(mults.iter())
            .copied()
            .collect();
        let doubled_poles = poles.iter().chain(poles.iter()).copied().collect();
        HomogeneousCurve::unperiodize(degree, &doubled_knots, &doubled_mults, doubled_poles)?
    };

    let mut piece = unrolled.restrict(a.max(lo), b)?;
    if shift != 0.0 {
        for k in &mut piece.knots {
            *k += shift;
        }
    }
    Ok(piece)
}

/// Homogeneous pole grid of a tensor-product surface, `nu * nv` row-major
#[derive(Debug, Clone, PartialEq)]
pub struct HomogeneousGrid {
    pub nu: usize,
    pub nv: usize,
    pub poles: Vec<DVec4>,
}

impl HomogeneousGrid {
    pub fn new(nu: usize, nv: usize, poles: Vec<DVec4>) -> Self {
        Self { nu, nv, poles }
    }

    pub fn pole(&self, i: usize, j: usize) -> DVec4 {
        self.poles[i * self.nv + j]
    }

    /// Poles along U at column `j`
    pub fn u_curve(&self, j: usize) -> Vec<DVec4> {
        (0..self.nu).map(|i| self.pole(i, j)).collect()
    }

    /// Poles along V at row `i`
    pub fn v_curve(&self, i: usize) -> Vec<DVec4> {
        self.poles[i * self.nv..(i + 1) * self.nv].to_vec()
    }

    /// Apply a curve operation to every U curve. Returns the new grid and the
    /// knot vector shared by all transformed curves.
    pub fn transform_u<F>(&self, mut op: F) -> Result<(Self, Vec<f64>), KnotError>
    where
        F: FnMut(Vec<DVec4>) -> Result<HomogeneousCurve, KnotError>,
    {
        let curves = (0..self.nv)
            .map(|j| op(self.u_curve(j)))
            .collect::<Result<Vec<_>, _>>()?;
        let knots = curves.first().map(|c| c.knots.clone()).unwrap_or_default();
        let nu = curves.first().map_or(0, |c| c.poles.len());

        let mut poles = vec![DVec4::ZERO; nu * self.nv];
        for (j, curve) in curves.iter().enumerate() {
            for (i, pole) in curve.poles.iter().enumerate() {
                poles[i * self.nv + j] = *pole;
            }
        }
        Ok((Self::new(nu, self.nv, poles), knots))
    }

    /// Apply a curve operation to every V curve
    pub fn transform_v<F>(&self, mut op: F) -> Result<(Self, Vec<f64>), KnotError>
    where
        F: FnMut(Vec<DVec4>) -> Result<HomogeneousCurve, KnotError>,
    {
        let curves = (0..self.nu)
            .map(|i| op(self.v_curve(i)))
            .collect::<Result<Vec<_>, _>>()?;
        let knots = curves.first().map(|c| c.knots.clone()).unwrap_or_default();
        let nv = curves.first().map_or(0, |c| c.poles.len());
        let poles = curves.into_iter().flat_map(|c| c.poles).collect();
        Ok((Self::new(self.nu, nv, poles), knots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::DVec2;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI, TAU};

    fn h2(x: f64, y: f64, w: f64) -> DVec4 {
        homogeneous(DVec2::new(x, y).extend(0.0), w)
    }

    fn cubic() -> HomogeneousCurve {
        HomogeneousCurve::new(
            3,
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0, 3.0],
            vec![
                h2(0.0, 0.0, 1.0),
                h2(1.0, 2.0, 1.0),
                h2(2.0, -1.0, 2.0),
                h2(3.0, 3.0, 1.0),
                h2(4.0, 0.0, 0.5),
                h2(5.0, 1.0, 1.0),
            ],
        )
        .unwrap()
    }

    /// Quadratic periodic unit circle: quarter arcs, knots at angle values
    fn periodic_circle() -> HomogeneousCurve {
        let w = FRAC_1_SQRT_2;
        let poles = vec![
            h2(1.0, 0.0, 1.0),
            h2(1.0, 1.0, w),
            h2(0.0, 1.0, 1.0),
            h2(-1.0, 1.0, w),
            h2(-1.0, 0.0, 1.0),
            h2(-1.0, -1.0, w),
            h2(0.0, -1.0, 1.0),
            h2(1.0, -1.0, w),
        ];
        let knots = [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2, TAU];
        HomogeneousCurve::unperiodize(2, &knots, &[2, 2, 2, 2, 2], poles).unwrap()
    }

    fn assert_same_points(a: &HomogeneousCurve, b: &HomogeneousCurve, lo: f64, hi: f64) {
        for i in 0..=40 {
            let u = lo + (hi - lo) * i as f64 / 40.0;
            let pa = a.point(u).unwrap();
            let pb = b.point(u).unwrap();
            assert_relative_eq!(pa.distance(pb), 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_insert_preserves_shape() {
        let curve = cubic();
        let mut refined = curve.clone();
        refined.insert_knot(0.3).unwrap();
        refined.insert_knot(2.0).unwrap();
        refined.insert_knot(2.0).unwrap();
        assert_eq!(refined.poles.len(), curve.poles.len() + 3);
        assert_eq!(refined.multiplicity(2.0), 3);
        assert_same_points(&curve, &refined, 0.0, 3.0);
    }

    #[test]
    fn test_insert_rejects_full_multiplicity() {
        let mut curve = cubic();
        assert!(matches!(
            curve.insert_knot(0.0),
            Err(KnotError::ExcessMultiplicity { .. })
        ));
        assert!(matches!(
            curve.insert_knot(3.5),
            Err(KnotError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn test_segment_sub_range() {
        let curve = cubic();
        let part = curve.segment(0.5, 2.25).unwrap();
        assert!(part.is_clamped());
        assert_eq!(part.domain(), (0.5, 2.25));
        assert_eq!(part.knots.len(), part.poles.len() + 4);
        assert_same_points(&curve, &part, 0.5, 2.25);
    }

    #[test]
    fn test_segment_at_existing_knots() {
        let curve = cubic();
        let part = curve.segment(1.0, 2.0).unwrap();
        assert_eq!(part.poles.len(), 4);
        assert_same_points(&curve, &part, 1.0, 2.0);
    }

    #[test]
    fn test_unperiodize_circle() {
        let unrolled = periodic_circle();
        assert_eq!(unrolled.poles.len(), 10);
        assert_eq!(unrolled.domain(), (0.0, TAU));

        let clamped = unrolled.clamped().unwrap();
        assert_eq!(clamped.poles.len(), 9);
        assert_eq!(clamped.knots.len(), 12);
        assert!(clamped.is_clamped());

        let start = clamped.point(0.0).unwrap();
        assert_relative_eq!(start.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(start.y, 0.0, epsilon = 1e-12);
        for i in 0..=64 {
            let u = TAU * i as f64 / 64.0;
            assert_relative_eq!(clamped.point(u).unwrap().length(), 1.0, epsilon = 1e-12);
        }
        assert_same_points(&unrolled, &clamped, 0.0, TAU);
    }

    #[test]
    fn test_unperiodize_uniform_cubic_is_closed() {
        let poles = vec![
            h2(0.0, 0.0, 1.0),
            h2(2.0, 0.0, 1.0),
            h2(3.0, 2.0, 1.0),
            h2(1.0, 3.0, 1.0),
            h2(-1.0, 1.0, 1.0),
        ];
        let knots = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let unrolled = HomogeneousCurve::unperiodize(3, &knots, &[1; 6], poles).unwrap();
        assert_eq!(unrolled.domain(), (0.0, 5.0));

        let clamped = unrolled.clamped().unwrap();
        assert_eq!(clamped.poles.len(), 8);
        let a = clamped.point(0.0).unwrap();
        let b = clamped.point(5.0).unwrap();
        assert_relative_eq!(a.distance(b), 0.0, epsilon = 1e-12);
        assert_same_points(&unrolled, &clamped, 0.0, 5.0);
    }

    #[test]
    fn test_segment_periodic_across_seam() {
        let w = FRAC_1_SQRT_2;
        let poles = vec![
            h2(1.0, 0.0, 1.0),
            h2(1.0, 1.0, w),
            h2(0.0, 1.0, 1.0),
            h2(-1.0, 1.0, w),
            h2(-1.0, 0.0, 1.0),
            h2(-1.0, -1.0, w),
            h2(0.0, -1.0, 1.0),
            h2(1.0, -1.0, w),
        ];
        let knots = [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2, TAU];
        let piece =
            segment_periodic(2, &knots, &[2; 5], poles, -FRAC_PI_2, FRAC_PI_2).unwrap();

        assert!(piece.is_clamped());
        assert_eq!(piece.poles.len(), 5);
        assert_relative_eq!(piece.domain().0, -FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(piece.domain().1, FRAC_PI_2, epsilon = 1e-12);
        for (t, x, y) in [(-FRAC_PI_2, 0.0, -1.0), (0.0, 1.0, 0.0), (FRAC_PI_2, 0.0, 1.0)] {
            let p = piece.point(t).unwrap();
            assert_relative_eq!(p.x, x, epsilon = 1e-9);
            assert_relative_eq!(p.y, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_segment_periodic_rejects_long_window() {
        let poles = vec![h2(0.0, 0.0, 1.0); 4];
        let err = segment_periodic(1, &[0.0, 1.0, 2.0, 3.0, 4.0], &[1; 5], poles, 0.0, 5.0)
            .unwrap_err();
        assert!(matches!(err, KnotError::OutOfDomain { .. }));
    }

    #[test]
    fn test_restrict_snaps_to_domain() {
        let curve = cubic();
        let piece = curve.restrict(-1e-12, 3.0 + 1e-12).unwrap();
        assert_eq!(piece.domain(), (0.0, 3.0));
        assert_eq!(piece.poles.len(), curve.poles.len());
    }

    #[test]
    fn test_unperiodize_pole_count_mismatch() {
        let poles = vec![h2(0.0, 0.0, 1.0); 3];
        let err =
            HomogeneousCurve::unperiodize(2, &[0.0, 1.0, 2.0], &[2, 2, 2], poles).unwrap_err();
        assert_eq!(
            err,
            KnotError::LengthMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_grid_transform_u() {
        // 2 x 3 grid, linear in U
        let poles = (0..6)
            .map(|k| homogeneous(DVec3::new((k / 3) as f64, (k % 3) as f64, 0.0), 1.0))
            .collect();
        let grid = HomogeneousGrid::new(2, 3, poles);
        let (refined, knots) = grid
            .transform_u(|column| {
                let mut curve = HomogeneousCurve::new(1, vec![0.0, 0.0, 1.0, 1.0], column)?;
                curve.insert_knot(0.5)?;
                Ok(curve)
            })
            .unwrap();
        assert_eq!(knots, vec![0.0, 0.0, 0.5, 1.0, 1.0]);
        assert_eq!(refined.nu, 3);
        assert_relative_eq!(refined.pole(1, 2).x, 0.5);
        assert_relative_eq!(refined.pole(1, 2).y, 2.0);
    }
}
