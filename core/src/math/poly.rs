use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::prelude::{ToolError, ToolResult};

const SCHUR_ITERATIONS_PER_ROOT: usize = 100;

/// Polynomial helpers. Coefficients run from the highest power down, so
/// `[1.0, -3.0, 2.0]` is `x^2 - 3x + 2`.
pub struct PolyHelper;

impl PolyHelper {
    /// All complex roots of the polynomial, as eigenvalues of its companion
    /// matrix.
    ///
    /// Leading zero coefficients are ignored and trailing zero coefficients
    /// become roots at the origin. A constant or all-zero polynomial has no
    /// roots. Complex roots come out as exact conjugate pairs.
    pub fn roots(coeffs: &[f64]) -> ToolResult<Vec<Complex64>> {
        if coeffs.iter().any(|c| !c.is_finite()) {
            return Err(ToolError::Numerical(
                "polynomial has non-finite coefficients".into(),
            ));
        }

        let (first, last) = match (
            coeffs.iter().position(|&c| c != 0.0),
            coeffs.iter().rposition(|&c| c != 0.0),
        ) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(Vec::new()),
        };

        let trailing = coeffs.len() - 1 - last;
        let mut roots = companion_eigenvalues(&coeffs[first..=last])?;
        roots.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(trailing));
        Ok(roots)
    }

    /// Monic polynomial with the given roots.
    pub fn from_roots(roots: &[Complex64]) -> Vec<Complex64> {
        let mut coeffs = vec![Complex64::new(1.0, 0.0)];
        for &root in roots {
            let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
            for (i, &c) in coeffs.iter().enumerate() {
                next[i] += c;
                next[i + 1] -= c * root;
            }
            coeffs = next;
        }
        coeffs
    }

    pub fn multiply(lhs: &[f64], rhs: &[f64]) -> Vec<f64> {
        if lhs.is_empty() || rhs.is_empty() {
            return Vec::new();
        }
        let mut product = vec![0.0; lhs.len() + rhs.len() - 1];
        for (i, &l) in lhs.iter().enumerate() {
            for (j, &r) in rhs.iter().enumerate() {
                product[i + j] += l * r;
            }
        }
        product
    }
}

/// Companion matrix of a polynomial with nonzero first and last
/// coefficients: the negated monic coefficients on the first row, ones on
/// the subdiagonal.
fn companion(coeffs: &[f64]) -> DMatrix<f64> {
    let n = coeffs.len() - 1;
    let lead = coeffs[0];
    DMatrix::from_fn(n, n, |row, col| {
        if row == 0 {
            -coeffs[col + 1] / lead
        } else if row == col + 1 {
            1.0
        } else {
            0.0
        }
    })
}

fn companion_eigenvalues(coeffs: &[f64]) -> ToolResult<Vec<Complex64>> {
    let n = coeffs.len() - 1;
    match n {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![Complex64::new(-coeffs[1] / coeffs[0], 0.0)]),
        _ => {}
    }

    let schur = companion(coeffs)
        .try_schur(f64::EPSILON, SCHUR_ITERATIONS_PER_ROOT * n)
        .ok_or_else(|| {
            ToolError::Numerical(format!("eigenvalues of degree {} polynomial did not converge", n))
        })?;
    Ok(schur.complex_eigenvalues().iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(coeffs: &[Complex64], x: Complex64) -> Complex64 {
        coeffs
            .iter()
            .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * x + c)
    }

    fn sorted_by_re(mut roots: Vec<Complex64>) -> Vec<Complex64> {
        roots.sort_by(|a, b| a.re.total_cmp(&b.re).then(a.im.total_cmp(&b.im)));
        roots
    }

    #[test]
    fn roots_of_real_quadratic() {
        let roots = sorted_by_re(PolyHelper::roots(&[1.0, -3.0, 2.0]).unwrap());
        assert!((roots[0] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
        assert!((roots[1] - Complex64::new(2.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn roots_of_conjugate_pair_are_exact_conjugates() {
        let roots = sorted_by_re(PolyHelper::roots(&[2.0, 0.0, 2.0]).unwrap());
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0], roots[1].conj());
        assert!(roots[0].re.abs() < 1e-12);
        assert!((roots[0].im.abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn trailing_zeros_become_origin_roots() {
        let roots = PolyHelper::roots(&[0.0, 1.0, -0.5, 0.0, 0.0]).unwrap();
        assert_eq!(roots.len(), 3);
        assert_eq!(roots.iter().filter(|r| r.norm() == 0.0).count(), 2);
        assert!(roots
            .iter()
            .any(|r| (r - Complex64::new(0.5, 0.0)).norm() < 1e-12));
    }

    #[test]
    fn constant_has_no_roots() {
        assert!(PolyHelper::roots(&[3.0]).unwrap().is_empty());
        assert!(PolyHelper::roots(&[0.0, 0.0]).unwrap().is_empty());
    }

    #[test]
    fn rejects_nan() {
        assert!(PolyHelper::roots(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn from_roots_rebuilds_sixth_order() {
        // (1 + x)^6 has a six-fold root, the hardest case for a lowpass numerator.
        let coeffs = [1.0, 6.0, 15.0, 20.0, 15.0, 6.0, 1.0];
        let roots = PolyHelper::roots(&coeffs).unwrap();
        assert_eq!(roots.len(), 6);
        let rebuilt = PolyHelper::from_roots(&roots);
        for (c, r) in coeffs.iter().zip(&rebuilt) {
            assert!((c - r.re).abs() < 1e-6, "{c} vs {r}");
            assert!(r.im.abs() < 1e-6);
        }
    }

    #[test]
    fn roots_satisfy_polynomial() {
        let coeffs = [1.0, -2.2, 2.3, -1.2, 0.3];
        let complex: Vec<Complex64> = coeffs.iter().map(|&c| Complex64::new(c, 0.0)).collect();
        for root in PolyHelper::roots(&coeffs).unwrap() {
            assert!(eval(&complex, root).norm() < 1e-9);
        }
    }

    #[test]
    fn companion_has_monic_first_row() {
        let m = companion(&[2.0, -4.0, 6.0, 8.0]);
        assert_eq!(m.shape(), (3, 3));
        assert_eq!(m.row(0).iter().copied().collect::<Vec<_>>(), vec![2.0, -3.0, -4.0]);
        assert_eq!(m[(1, 0)], 1.0);
        assert_eq!(m[(2, 1)], 1.0);
        assert_eq!(m[(2, 0)], 0.0);
    }

    #[test]
    fn eighth_order_denominator_rebuilds_in_conjugate_pairs() {
        let mut coeffs = vec![1.0];
        for angle in [0.2_f64, 0.5, 0.9, 1.4] {
            let section = [1.0, -2.0 * 0.9 * angle.cos(), 0.81];
            coeffs = PolyHelper::multiply(&coeffs, &section);
        }
        let roots = PolyHelper::roots(&coeffs).unwrap();
        assert_eq!(roots.len(), 8);
        for root in &roots {
            assert!((root.norm() - 0.9).abs() < 1e-9);
            assert!(roots.contains(&root.conj()));
        }
        let rebuilt = PolyHelper::from_roots(&roots);
        for (c, r) in coeffs.iter().zip(&rebuilt) {
            assert!((c - r.re).abs() < 1e-10, "{c} vs {r}");
        }
    }

    #[test]
    fn multiply_convolves() {
        assert_eq!(
            PolyHelper::multiply(&[1.0, 1.0], &[1.0, -1.0]),
            vec![1.0, 0.0, -1.0]
        );
    }
}
