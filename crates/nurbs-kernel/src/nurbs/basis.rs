//! Cox-de Boor basis evaluation (The NURBS Book, A2.1 and A2.2).

/// Find the knot span index such that `knots[span] <= u < knots[span + 1]`.
///
/// `n` is the index of the last pole, `p` the degree. Parameters outside the
/// domain `[knots[p], knots[n + 1]]` are clamped to the first/last span.
pub fn find_span(n: usize, p: usize, u: f64, knots: &[f64]) -> usize {
    if u >= knots[n + 1] {
        // last non-empty span
        let mut span = n;
        while span > p && knots[span] >= knots[n + 1] {
            span -= 1;
        }
        return span;
    }
    if u <= knots[p] {
        let mut span = p;
        while span < n && knots[span + 1] <= knots[p] {
            span += 1;
        }
        return span;
    }

    let mut lo = p;
    let mut hi = n + 1;
    let mut mid = (lo + hi) / 2;

    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            hi = mid;
        } else {
            lo = mid;
        }
        mid = (lo + hi) / 2;
    }

    mid
}

/// Evaluate the `p + 1` non-zero basis functions `N[span-p] ..= N[span]` at `u`.
pub fn basis_funs(span: usize, u: f64, p: usize, knots: &[f64]) -> Vec<f64> {
    let mut n = vec![0.0; p + 1];
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];

    n[0] = 1.0;

    for j in 1..=p {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;

        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let temp = if denom == 0.0 { 0.0 } else { n[r] / denom };
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }

    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cubic_knots() -> Vec<f64> {
        vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0, 3.0]
    }

    #[test]
    fn test_find_span_interior() {
        let knots = cubic_knots();
        assert_eq!(find_span(5, 3, 0.5, &knots), 3);
        assert_eq!(find_span(5, 3, 1.0, &knots), 4);
        assert_eq!(find_span(5, 3, 2.5, &knots), 5);
    }

    #[test]
    fn test_find_span_domain_ends() {
        let knots = cubic_knots();
        assert_eq!(find_span(5, 3, 0.0, &knots), 3);
        assert_eq!(find_span(5, 3, 3.0, &knots), 5);
        assert_eq!(find_span(5, 3, 7.0, &knots), 5);
    }

    #[test]
    fn test_partition_of_unity() {
        let knots = cubic_knots();
        for i in 0..=30 {
            let u = i as f64 * 0.1;
            let span = find_span(5, 3, u, &knots);
            let sum: f64 = basis_funs(span, u, 3, &knots).iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_degree_zero() {
        let knots = vec![0.0, 1.0, 2.0];
        let span = find_span(1, 0, 1.5, &knots);
        assert_eq!(span, 1);
        assert_eq!(basis_funs(span, 1.5, 0, &knots), vec![1.0]);
    }
}
