//! Dense least-squares helpers for the additive model.

use crate::error::{ForecastError, Result};

/// Solves the penalised normal equations `(XᵀX + diag(penalty)) β = Xᵀy`
/// by Gaussian elimination with partial pivoting.
///
/// `x` is row-major with one row per observation. `penalty` has one entry per
/// column.
///
/// # Errors
/// * `ModelFit` if the system is singular or the solution is not finite.
pub fn ridge_solve(x: &[Vec<f64>], y: &[f64], penalty: &[f64]) -> Result<Vec<f64>> {
    let p = penalty.len();
    if x.len() != y.len() || x.iter().any(|row| row.len() != p) {
        return Err(ForecastError::ModelFit(format!(
            "design matrix shape mismatch: {} rows, {} targets, {} columns",
            x.len(),
            y.len(),
            p
        )));
    }

    let mut a = vec![vec![0.0; p]; p];
    let mut b = vec![0.0; p];
    for (row, &yi) in x.iter().zip(y) {
        for i in 0..p {
            let xi = row[i];
            b[i] += xi * yi;
            for j in 0..p {
                a[i][j] += xi * row[j];
            }
        }
    }
    for (d, lambda) in penalty.iter().enumerate() {
        a[d][d] += lambda;
    }

    for i in 0..p {
        let pivot_row = (i..p)
            .max_by(|&r, &s| a[r][i].abs().total_cmp(&a[s][i].abs()))
            .unwrap_or(i);
        if pivot_row != i {
            a.swap(i, pivot_row);
            b.swap(i, pivot_row);
        }
        let pivot = a[i][i];
        if !pivot.is_finite() || pivot.abs() < 1e-12 {
            return Err(ForecastError::ModelFit(format!(
                "singular normal equations at column {}",
                i
            )));
        }
        let inv = 1.0 / pivot;
        for j in i..p {
            a[i][j] *= inv;
        }
        b[i] *= inv;
        for r in 0..p {
            if r == i {
                continue;
            }
            let factor = a[r][i];
            if factor == 0.0 {
                continue;
            }
            for j in i..p {
                a[r][j] -= factor * a[i][j];
            }
            b[r] -= factor * b[i];
        }
    }

    if b.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::ModelFit(
            "non-finite coefficients after solve".to_string(),
        ));
    }
    Ok(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_recovers_exact_line() {
        let x: Vec<Vec<f64>> = (0..5).map(|i| vec![1.0, i as f64]).collect();
        let y: Vec<f64> = (0..5).map(|i| 2.0 + 3.0 * i as f64).collect();
        let beta = ridge_solve(&x, &y, &[1e-10, 1e-10]).unwrap();
        assert_relative_eq!(beta[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(beta[1], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_penalty_shrinks_coefficient() {
        let x: Vec<Vec<f64>> = (0..4).map(|i| vec![i as f64]).collect();
        let y = vec![0.0, 1.0, 2.0, 3.0];
        let free = ridge_solve(&x, &y, &[0.0]).unwrap();
        let shrunk = ridge_solve(&x, &y, &[100.0]).unwrap();
        assert!(shrunk[0].abs() < free[0].abs());
    }

    #[test]
    fn test_singular_system_is_fit_error() {
        let x = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        let err = ridge_solve(&x, &[1.0, 2.0], &[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, ForecastError::ModelFit(_)));
    }

    #[test]
    fn test_shape_mismatch_is_fit_error() {
        let x = vec![vec![1.0, 2.0]];
        assert!(ridge_solve(&x, &[1.0], &[0.0]).is_err());
    }
}
