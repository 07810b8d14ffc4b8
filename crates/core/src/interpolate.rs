//! Cubic-spline interpolation over tabulated reference data.
//!
//! The blast reference curve is surveyed at 22 distances; a natural cubic
//! spline through those knots gives the smooth forward and inverse curves the
//! explosion models evaluate. The second-derivative system is solved densely
//! through `nalgebra`; at 20 unknowns the cost is irrelevant and the solver
//! reports singularity instead of quietly diverging.

use nalgebra::{DMatrix, DVector};

use crate::error::{HazardError, Result};

/// Natural cubic spline through strictly increasing knots.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
    second_derivatives: Vec<f64>,
}

impl CubicSpline {
    /// Fit a natural spline (zero curvature at both ends) through
    /// `(knots, values)`.
    ///
    /// # Errors
    /// Returns a validation error when fewer than three points are given,
    /// the lengths differ, or the knots are not strictly increasing; a
    /// computation error when the tridiagonal system is singular.
    pub fn fit(knots: &[f64], values: &[f64]) -> Result<Self> {
        let n = knots.len();
        if n < 3 || values.len() != n {
            return Err(HazardError::invalid(
                "spline data",
                "needs at least three equal-length knot/value points",
            ));
        }
        for pair in knots.windows(2) {
            if pair[1] <= pair[0] {
                return Err(HazardError::invalid(
                    "spline knots",
                    "must be strictly increasing",
                ));
            }
        }

        // Interior second derivatives; the natural boundary pins both ends to 0.
        let unknowns = n - 2;
        let mut matrix = DMatrix::<f64>::zeros(unknowns, unknowns);
        let mut rhs = DVector::<f64>::zeros(unknowns);
        for i in 1..n - 1 {
            let h_prev = knots[i] - knots[i - 1];
            let h_next = knots[i + 1] - knots[i];
            let row = i - 1;
            if row > 0 {
                matrix[(row, row - 1)] = h_prev;
            }
            matrix[(row, row)] = 2.0 * (h_prev + h_next);
            if row + 1 < unknowns {
                matrix[(row, row + 1)] = h_next;
            }
            rhs[row] = 6.0
                * ((values[i + 1] - values[i]) / h_next - (values[i] - values[i - 1]) / h_prev);
        }

        let interior = matrix
            .lu()
            .solve(&rhs)
            .ok_or_else(|| HazardError::computation("singular system while fitting cubic spline"))?;

        let mut second_derivatives = vec![0.0; n];
        for (i, value) in interior.iter().enumerate() {
            second_derivatives[i + 1] = *value;
        }

        Ok(Self {
            knots: knots.to_vec(),
            values: values.to_vec(),
            second_derivatives,
        })
    }

    /// Evaluate the spline at `x`.
    ///
    /// Outside the knot span the nearest boundary segment's polynomial is
    /// extended; callers clamp to their physical domain before evaluating.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.knots.len();
        let segment = match self.knots.binary_search_by(|knot| knot.total_cmp(&x)) {
            Ok(i) => i.min(n - 2),
            Err(0) => 0,
            Err(i) => (i - 1).min(n - 2),
        };

        let x0 = self.knots[segment];
        let x1 = self.knots[segment + 1];
        let h = x1 - x0;
        let t0 = (x1 - x) / h;
        let t1 = (x - x0) / h;
        let m0 = self.second_derivatives[segment];
        let m1 = self.second_derivatives[segment + 1];

        t0 * self.values[segment]
            + t1 * self.values[segment + 1]
            + ((t0.powi(3) - t0) * m0 + (t1.powi(3) - t1) * m1) * h * h / 6.0
    }
}

/// Evenly spaced samples over `[start, end]`, inclusive of both ends.
pub(crate) fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / ((count - 1) as f64);
            (0..count).map(|i| start + step * (i as f64)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn interpolates_knots_exactly() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [1.0, 2.7, 0.5, -1.0, 0.0];
        let spline = CubicSpline::fit(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_relative_eq!(spline.eval(*x), *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn reproduces_a_straight_line() {
        let xs = [0.0, 1.0, 2.0, 5.0];
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x - 1.0).collect();
        let spline = CubicSpline::fit(&xs, &ys).unwrap();
        assert_relative_eq!(spline.eval(0.5), 0.5, epsilon = 1e-9);
        assert_relative_eq!(spline.eval(3.7), 10.1, epsilon = 1e-9);
    }

    #[test]
    fn rejects_unsorted_or_short_input() {
        assert!(CubicSpline::fit(&[0.0, 1.0], &[1.0, 2.0]).is_err());
        assert!(CubicSpline::fit(&[0.0, 2.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
        assert!(CubicSpline::fit(&[0.0, 0.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn linspace_includes_both_endpoints() {
        let samples = linspace(0.0, 540.0, 55);
        assert_eq!(samples.len(), 55);
        assert_relative_eq!(samples[0], 0.0);
        assert_relative_eq!(samples[54], 540.0);
        assert_relative_eq!(samples[1], 10.0, epsilon = 1e-9);
    }

    #[test]
    fn linspace_degenerate_counts() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.5, 9.0, 1), vec![2.5]);
    }
}
