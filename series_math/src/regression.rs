//! Ordinary least squares for small dense designs
//!
//! Solves the normal equations `XᵀX β = Xᵀy` with Gauss-Jordan elimination
//! and partial pivoting. The inverse of `XᵀX` is kept so callers can derive
//! coefficient standard errors for interval estimation.

use crate::{MathError, Result};

/// Ordinary least squares solver
#[derive(Debug, Clone)]
pub struct LeastSquares {
    tolerance: f64,
}

/// Fitted least squares solution
#[derive(Debug, Clone)]
pub struct LeastSquaresFit {
    coefficients: Vec<f64>,
    inverse_gram: Vec<Vec<f64>>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    rss: f64,
    degrees_of_freedom: usize,
}

impl Default for LeastSquares {
    fn default() -> Self {
        Self { tolerance: 1e-10 }
    }
}

impl LeastSquares {
    /// Create a solver with the default pivot tolerance
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit `targets ≈ design · β`, one design row per observation
    pub fn fit(&self, design: &[Vec<f64>], targets: &[f64]) -> Result<LeastSquaresFit> {
        let n = design.len();
        if n != targets.len() {
            return Err(MathError::InvalidInput(format!(
                "Design has {} rows but {} targets were given",
                n,
                targets.len()
            )));
        }

        let p = design.first().map(Vec::len).unwrap_or(0);
        if p == 0 {
            return Err(MathError::InvalidInput(
                "Design must have at least one column".to_string(),
            ));
        }
        if design.iter().any(|row| row.len() != p) {
            return Err(MathError::InvalidInput(
                "Design rows have inconsistent lengths".to_string(),
            ));
        }
        if n <= p {
            return Err(MathError::InsufficientData(format!(
                "Need more than {} observations for {} coefficients, have {}",
                p, p, n
            )));
        }
        if design.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Design and targets must be finite".to_string(),
            ));
        }

        let mut gram = vec![vec![0.0; p]; p];
        let mut moment = vec![0.0; p];
        for (row, &y) in design.iter().zip(targets) {
            for i in 0..p {
                moment[i] += row[i] * y;
                for j in i..p {
                    gram[i][j] += row[i] * row[j];
                }
            }
        }
        for i in 0..p {
            for j in 0..i {
                gram[i][j] = gram[j][i];
            }
        }

        let inverse_gram = self.invert(gram)?;
        let coefficients: Vec<f64> = inverse_gram
            .iter()
            .map(|row| row.iter().zip(&moment).map(|(a, b)| a * b).sum())
            .collect();

        let fitted: Vec<f64> = design
            .iter()
            .map(|row| dot(row, &coefficients))
            .collect();
        let residuals: Vec<f64> = targets
            .iter()
            .zip(&fitted)
            .map(|(y, f)| y - f)
            .collect();
        let rss = residuals.iter().map(|r| r * r).sum();

        Ok(LeastSquaresFit {
            coefficients,
            inverse_gram,
            fitted,
            residuals,
            rss,
            degrees_of_freedom: n - p,
        })
    }

    /// Gauss-Jordan inversion with partial pivoting
    fn invert(&self, mut matrix: Vec<Vec<f64>>) -> Result<Vec<Vec<f64>>> {
        let p = matrix.len();
        let scale = matrix
            .iter()
            .enumerate()
            .map(|(i, row)| row[i].abs())
            .fold(1.0_f64, f64::max);
        let threshold = self.tolerance * scale;

        let mut inverse: Vec<Vec<f64>> = (0..p)
            .map(|i| (0..p).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();

        for col in 0..p {
            let pivot_row = (col..p)
                .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
                .unwrap_or(col);
            if matrix[pivot_row][col].abs() < threshold {
                return Err(MathError::Singular(format!(
                    "Column {} is linearly dependent on the others",
                    col
                )));
            }
            matrix.swap(col, pivot_row);
            inverse.swap(col, pivot_row);

            let pivot = matrix[col][col];
            for j in 0..p {
                matrix[col][j] /= pivot;
                inverse[col][j] /= pivot;
            }

            for row in 0..p {
                if row == col {
                    continue;
                }
                let factor = matrix[row][col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..p {
                    matrix[row][j] -= factor * matrix[col][j];
                    inverse[row][j] -= factor * inverse[col][j];
                }
            }
        }

        Ok(inverse)
    }
}

impl LeastSquaresFit {
    /// Estimated coefficients, in design column order
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// In-sample fitted values
    pub fn fitted(&self) -> &[f64] {
        &self.fitted
    }

    /// In-sample residuals (`target - fitted`)
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Residual sum of squares
    pub fn residual_sum_of_squares(&self) -> f64 {
        self.rss
    }

    /// Observations minus coefficients
    pub fn degrees_of_freedom(&self) -> usize {
        self.degrees_of_freedom
    }

    /// Unbiased residual standard deviation, `sqrt(rss / (n - p))`
    pub fn residual_std_error(&self) -> f64 {
        (self.rss / self.degrees_of_freedom as f64).sqrt()
    }

    /// Standard error of one coefficient given a residual standard deviation
    pub fn coefficient_std_error(&self, index: usize, sigma: f64) -> Option<f64> {
        self.inverse_gram
            .get(index)
            .and_then(|row| row.get(index))
            .map(|v| sigma * v.max(0.0).sqrt())
    }

    /// Evaluate the fitted linear form on a new design row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(MathError::InvalidInput(format!(
                "Expected {} regressors, got {}",
                self.coefficients.len(),
                row.len()
            )));
        }

        Ok(dot(row, &self.coefficients))
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line_design(n: usize) -> Vec<Vec<f64>> {
        (0..n).map(|i| vec![1.0, i as f64]).collect()
    }

    #[test]
    fn test_exact_line_recovered() {
        let design = line_design(6);
        let targets: Vec<f64> = (0..6).map(|i| 3.0 + 2.0 * i as f64).collect();

        let fit = LeastSquares::new().fit(&design, &targets).unwrap();

        assert_relative_eq!(fit.coefficients()[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(fit.coefficients()[1], 2.0, epsilon = 1e-9);
        assert!(fit.residual_sum_of_squares() < 1e-12);
        assert_eq!(fit.degrees_of_freedom(), 4);
    }

    #[test]
    fn test_noisy_line_residuals_sum_to_zero() {
        let design = line_design(5);
        let targets = vec![1.0, 3.5, 4.5, 7.5, 8.5];

        let fit = LeastSquares::new().fit(&design, &targets).unwrap();

        let sum: f64 = fit.residuals().iter().sum();
        assert_relative_eq!(sum, 0.0, epsilon = 1e-9);
        assert!(fit.residual_std_error() > 0.0);
        assert!(fit.coefficient_std_error(1, fit.residual_std_error()).unwrap() > 0.0);
    }

    #[test]
    fn test_collinear_columns_are_singular() {
        let design: Vec<Vec<f64>> = (0..5)
            .map(|i| vec![1.0, i as f64, 2.0 * i as f64])
            .collect();
        let targets = vec![1.0, 2.0, 3.0, 4.0, 5.0];

        let result = LeastSquares::new().fit(&design, &targets);
        assert!(matches!(result, Err(MathError::Singular(_))));
    }

    #[test]
    fn test_requires_more_rows_than_columns() {
        let design = line_design(2);
        let result = LeastSquares::new().fit(&design, &[1.0, 2.0]);
        assert!(matches!(result, Err(MathError::InsufficientData(_))));
    }

    #[test]
    fn test_rejects_non_finite() {
        let design = line_design(4);
        let result = LeastSquares::new().fit(&design, &[1.0, f64::NAN, 2.0, 3.0]);
        assert!(matches!(result, Err(MathError::InvalidInput(_))));
    }

    #[test]
    fn test_predict_row_length_checked() {
        let fit = LeastSquares::new()
            .fit(&line_design(4), &[1.0, 2.0, 3.0, 4.0])
            .unwrap();

        assert_relative_eq!(fit.predict_row(&[1.0, 10.0]).unwrap(), 11.0, epsilon = 1e-9);
        assert!(fit.predict_row(&[1.0]).is_err());
    }
}
