//! Logistic regression by Newton-Raphson maximum likelihood.

use ndarray::{Array1, Array2, Axis};

use crate::error::ModelError;
use crate::formula::Design;

pub const MAX_ITERATIONS: usize = 35;
pub const TOLERANCE: f64 = 1e-8;
/// Two-sided 95% normal quantile.
pub const Z_95: f64 = 1.959_963_984_540_054;

#[derive(Debug, Clone)]
pub struct LogitFit {
    pub names: Vec<String>,
    pub params: Array1<f64>,
    pub std_err: Array1<f64>,
    pub z: Array1<f64>,
    pub p_values: Array1<f64>,
    /// `(low, high)` per coefficient
    pub conf_int: Vec<(f64, f64)>,
    pub llf: f64,
    /// Log-likelihood of the intercept-only model
    pub llnull: f64,
    pub nobs: usize,
    pub iterations: usize,
    pub converged: bool,
}

impl LogitFit {
    /// McFadden's pseudo R².
    pub fn pseudo_r2(&self) -> f64 {
        1.0 - self.llf / self.llnull
    }

    pub fn df_model(&self) -> usize {
        self.params.len().saturating_sub(1)
    }
}

fn sigmoid(eta: f64) -> f64 {
    if eta >= 0.0 {
        1.0 / (1.0 + (-eta).exp())
    } else {
        let e = eta.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^x)` without overflow.
fn softplus(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

fn log_likelihood(x: &Array2<f64>, y: &Array1<f64>, beta: &Array1<f64>) -> f64 {
    x.dot(beta)
        .iter()
        .zip(y)
        .map(|(eta, y)| y * eta - softplus(*eta))
        .sum()
}

/// `X' diag(w) X`
fn weighted_gram(x: &Array2<f64>, w: &Array1<f64>) -> Array2<f64> {
    let xw = x * &w.view().insert_axis(Axis(1));
    x.t().dot(&xw)
}

/// Lower Cholesky factor; `None` unless `a` is numerically positive definite.
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if !sum.is_finite() || sum <= 1e-12 * a[[i, i]].abs().max(1.0) {
                    return None;
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Solve `L L' x = b`.
fn cholesky_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let s: f64 = (0..i).map(|k| l[[i, k]] * z[k]).sum();
        z[i] = (b[i] - s) / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let s: f64 = (i + 1..n).map(|k| l[[k, i]] * x[k]).sum();
        x[i] = (z[i] - s) / l[[i, i]];
    }
    x
}

fn inverse(a: &Array2<f64>) -> Option<Array2<f64>> {
    let l = cholesky(a)?;
    let n = a.nrows();
    let mut inv = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut e = Array1::<f64>::zeros(n);
        e[j] = 1.0;
        inv.column_mut(j).assign(&cholesky_solve(&l, &e));
    }
    Some(inv)
}

/// Complementary error function, fractional error below 1.2e-7.
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98 + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let r = t * poly.exp();
    if x >= 0.0 { r } else { 2.0 - r }
}

/// Two-sided normal p-value of a z statistic.
pub fn two_sided_p(z: f64) -> f64 {
    erfc(z.abs() / std::f64::consts::SQRT_2)
}

/// Log-likelihood of the constant-probability model.
fn null_log_likelihood(y: &Array1<f64>) -> f64 {
    let n = y.len() as f64;
    let ones = y.sum();
    let p = ones / n;
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    ones * p.ln() + (n - ones) * (1.0 - p).ln()
}

/// Fit `y ~ x` by Newton-Raphson from zero.
///
/// Stops when every parameter moves less than [`TOLERANCE`]; after
/// [`MAX_ITERATIONS`] the fit is returned with `converged == false`.
pub fn fit_logit(design: &Design) -> Result<LogitFit, ModelError> {
    let (x, y) = (&design.x, &design.y);
    let k = x.ncols();
    let mut beta = Array1::<f64>::zeros(k);
    let mut converged = false;
    let mut iterations = 0;

    while iterations < MAX_ITERATIONS {
        iterations += 1;
        let p = x.dot(&beta).mapv(sigmoid);
        let gradient = x.t().dot(&(y - &p));
        let hessian = weighted_gram(x, &p.mapv(|p| p * (1.0 - p)));
        let l = cholesky(&hessian).ok_or(ModelError::Singular)?;
        let step = cholesky_solve(&l, &gradient);
        beta += &step;
        if step.iter().all(|s| s.abs() < TOLERANCE) {
            converged = true;
            break;
        }
    }
    if !converged {
        log::warn!("logit did not converge in {MAX_ITERATIONS} iterations");
    }

    let p = x.dot(&beta).mapv(sigmoid);
    let cov = inverse(&weighted_gram(x, &p.mapv(|p| p * (1.0 - p)))).ok_or(ModelError::Singular)?;
    let std_err = cov.diag().mapv(f64::sqrt);
    let z = &beta / &std_err;
    let p_values = z.mapv(two_sided_p);
    let conf_int = beta
        .iter()
        .zip(&std_err)
        .map(|(b, se)| (b - Z_95 * se, b + Z_95 * se))
        .collect();

    let llf = log_likelihood(x, y, &beta);
    let llnull = null_log_likelihood(y);
    log::debug!("logit: {iterations} iterations, llf {llf:.4}, llnull {llnull:.4}");

    Ok(LogitFit {
        names: design.names.clone(),
        params: beta,
        std_err,
        z,
        p_values,
        conf_int,
        llf,
        llnull,
        nobs: design.nobs(),
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    /// 10 observations with x = 0 (3 successes), 10 with x = 1 (7 successes).
    fn two_groups() -> Design {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for (group, successes) in [(0.0, 3), (1.0, 7)] {
            for i in 0..10 {
                xs.extend([1.0, group]);
                ys.push(if i < successes { 1.0 } else { 0.0 });
            }
        }
        Design {
            response: "y".into(),
            names: vec!["Intercept".into(), "x".into()],
            x: Array2::from_shape_vec((20, 2), xs).unwrap(),
            y: Array1::from(ys),
            dropped: 0,
        }
    }

    #[test]
    fn matches_closed_form() {
        let fit = fit_logit(&two_groups()).unwrap();
        assert!(fit.converged);
        let logit = |p: f64| (p / (1.0 - p)).ln();
        assert!(close(fit.params[0], logit(0.3), 1e-9));
        assert!(close(fit.params[1], logit(0.7) - logit(0.3), 1e-9));

        // Var = 1 / (n p (1 - p)) per group
        let v: f64 = 1.0 / (10.0 * 0.3 * 0.7);
        assert!(close(fit.std_err[0], v.sqrt(), 1e-9));
        assert!(close(fit.std_err[1], (2.0 * v).sqrt(), 1e-9));

        let llf = 20.0 * (0.3 * 0.3f64.ln() + 0.7 * 0.7f64.ln());
        assert!(close(fit.llf, llf, 1e-9));
        assert!(close(fit.llnull, 20.0 * 0.5f64.ln(), 1e-9));
        assert!(fit.pseudo_r2() > 0.0 && fit.pseudo_r2() < 1.0);
        assert_eq!(fit.df_model(), 1);

        let (low, high) = fit.conf_int[1];
        assert!(close(high - low, 2.0 * Z_95 * fit.std_err[1], 1e-12));
    }

    #[test]
    fn normal_tail() {
        assert!(close(erfc(0.0), 1.0, 1e-7));
        assert!(close(two_sided_p(Z_95), 0.05, 1e-6));
        assert!(close(two_sided_p(0.0), 1.0, 1e-7));
        assert!(close(erfc(-1.0), 2.0 - erfc(1.0), 1e-12));
    }

    #[test]
    fn collinear_design_is_singular() {
        let mut design = two_groups();
        let x = design.x.column(1).to_owned();
        design.x = ndarray::concatenate(Axis(1), &[design.x.view(), x.view().insert_axis(Axis(1))]).unwrap();
        design.names.push("x_copy".into());
        assert!(matches!(fit_logit(&design), Err(ModelError::Singular)));
    }

    #[test]
    fn cholesky_inverse() {
        let a = Array2::from_shape_vec((2, 2), vec![4.0, 2.0, 2.0, 3.0]).unwrap();
        let inv = inverse(&a).unwrap();
        let eye = a.dot(&inv);
        assert!(close(eye[[0, 0]], 1.0, 1e-12));
        assert!(close(eye[[0, 1]], 0.0, 1e-12));
        assert!(close(eye[[1, 1]], 1.0, 1e-12));
    }
}
