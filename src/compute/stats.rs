//! Statistical primitives used by validation and convergence analysis.
//!
//! Degenerate inputs follow one rule everywhere: fewer than three points or a
//! zero-variance series yields r = 0 and p = 1.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Pearson correlation with its two-tailed p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

impl Correlation {
    /// The "no evidence" result.
    pub fn none(n: usize) -> Self {
        Self {
            r: 0.0,
            p_value: 1.0,
            n,
        }
    }

    #[inline]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (ddof = 0); 0 for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Median; 0 for an empty slice. NaNs sort last.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Pearson correlation coefficient and two-tailed p-value.
///
/// Slices of different length are truncated to the shorter one.
pub fn pearson(x: &[f64], y: &[f64]) -> Correlation {
    let n = x.len().min(y.len());
    if n < 3 {
        return Correlation::none(n);
    }
    let (x, y) = (&x[..n], &y[..n]);
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Correlation::none(n);
    }

    let mx = mean(x);
    let my = mean(y);
    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if is_degenerate(sxx, mx, n) || is_degenerate(syy, my, n) {
        return Correlation::none(n);
    }

    let r = (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0);
    Correlation {
        r,
        p_value: correlation_p_value(r, n),
        n,
    }
}

/// Zero variance up to rounding of the mean.
fn is_degenerate(sum_sq: f64, mean: f64, n: usize) -> bool {
    let scale = mean.abs().max(1.0);
    (sum_sq / n as f64).sqrt() <= 1e-12 * scale
}

/// Two-tailed p-value of a correlation under the t distribution with n-2 df.
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 3 || !r.is_finite() {
        return 1.0;
    }
    let r2 = r * r;
    if r2 >= 1.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = (r2 * df / (1.0 - r2)).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * dist.sf(t)).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_median_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
        assert!((median(&values) - 4.5).abs() < 1e-12);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(min(&values), 2.0);
        assert_eq!(max(&values), 9.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
    }

    #[test]
    fn test_perfect_correlation() {
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
        let c = pearson(&x, &y);
        assert!((c.r - 1.0).abs() < 1e-12);
        assert!(c.p_value < 1e-10);

        let neg: Vec<f64> = x.iter().map(|v| -v).collect();
        assert!((pearson(&x, &neg).r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(pearson(&[1.0, 2.0], &[2.0, 4.0]), Correlation::none(2));
        let flat = pearson(&[0.1, 0.1, 0.1, 0.1], &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(flat.r, 0.0);
        assert_eq!(flat.p_value, 1.0);
    }

    #[test]
    fn test_p_value_matches_reference() {
        // r = 0.5, n = 12: t = 1.8257 on 10 df, two-tailed p ≈ 0.0978.
        let p = correlation_p_value(0.5, 12);
        assert!((p - 0.0978).abs() < 1e-3, "p = {p}");

        // r = 0.3, n = 50: p ≈ 0.0343.
        let p = correlation_p_value(0.3, 50);
        assert!((p - 0.0343).abs() < 1e-3, "p = {p}");

        // r = 0.9, n = 5: t = 3.576 on 3 df, p ≈ 0.0374.
        let p = correlation_p_value(0.9, 5);
        assert!((p - 0.0374).abs() < 1e-3, "p = {p}");
        assert_eq!(correlation_p_value(0.0, 30), 1.0);
    }

    #[test]
    fn test_uncorrelated_p_value_is_large() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [2.0, 1.0, 2.0, 1.0, 2.0, 1.0];
        let c = pearson(&x, &y);
        assert!(c.r.abs() < 0.5);
        assert!(c.p_value > 0.3);
    }
}
