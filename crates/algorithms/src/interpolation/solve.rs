//! Dense linear solver shared by kriging and thin-plate splines

use mangrove_core::{Error, Result};

/// Pivots smaller than this fraction of the largest matrix entry are treated
/// as zero.
const RELATIVE_PIVOT_TOL: f64 = 1e-12;

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
///
/// `mat` is `n × n` row-major and is overwritten along with `rhs`. Fails with
/// [`Error::SingularMatrix`] rather than returning a non-finite solution.
pub(crate) fn gauss_solve(n: usize, mat: &mut [f64], rhs: &mut [f64], what: &str) -> Result<Vec<f64>> {
    debug_assert_eq!(mat.len(), n * n);
    debug_assert_eq!(rhs.len(), n);

    let scale = mat.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return Err(Error::SingularMatrix(format!("{what}: system matrix is zero or non-finite")));
    }
    let tol = scale * RELATIVE_PIVOT_TOL;

    for col in 0..n {
        let mut max_val = mat[col * n + col].abs();
        let mut max_row = col;
        for row in (col + 1)..n {
            let val = mat[row * n + col].abs();
            if val > max_val {
                max_val = val;
                max_row = row;
            }
        }

        if max_val <= tol {
            return Err(Error::SingularMatrix(format!(
                "{what}: pivot {max_val:e} in column {col} (duplicate or collinear samples?)"
            )));
        }

        if max_row != col {
            for j in 0..n {
                mat.swap(col * n + j, max_row * n + j);
            }
            rhs.swap(col, max_row);
        }

        let pivot = mat[col * n + col];
        for row in (col + 1)..n {
            let factor = mat[row * n + col] / pivot;
            if factor == 0.0 {
                continue;
            }
            mat[row * n + col] = 0.0;
            for j in (col + 1)..n {
                mat[row * n + j] -= factor * mat[col * n + j];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0_f64; n];
    for col in (0..n).rev() {
        let mut sum = rhs[col];
        for j in (col + 1)..n {
            sum -= mat[col * n + j] * x[j];
        }
        x[col] = sum / mat[col * n + col];
    }

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(Error::SingularMatrix(format!("{what}: solution is not finite")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_2x2() {
        // 2x + y = 5, x + 3y = 10  ->  x = 1, y = 3
        let mut mat = vec![2.0, 1.0, 1.0, 3.0];
        let mut rhs = vec![5.0, 10.0];
        let x = gauss_solve(2, &mut mat, &mut rhs, "test").unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_needs_pivoting() {
        let mut mat = vec![0.0, 1.0, 1.0, 0.0];
        let mut rhs = vec![7.0, 1.0];
        let x = gauss_solve(2, &mut mat, &mut rhs, "test").unwrap();
        assert_eq!(x, vec![1.0, 7.0]);
    }

    #[test]
    fn test_singular_detected() {
        let mut mat = vec![1.0, 2.0, 2.0, 4.0];
        let mut rhs = vec![1.0, 2.0];
        assert!(matches!(
            gauss_solve(2, &mut mat, &mut rhs, "test"),
            Err(Error::SingularMatrix(_))
        ));
    }
}
