use log::trace;
use nalgebra::{DMatrix, DVector};

use super::{check_points, chi_square, collect_points, FitError, FitResult, Point};
use crate::{histogram::Hist1D, traits::Model};

const MAX_ITER: usize = 500;
const MAX_LAMBDA: f64 = 1e12;
const REL_TOLERANCE: f64 = 1e-10;

/// Gaussian `amplitude * exp(-(x - mean)^2 / (2 sigma^2))`
///
/// Parameters are ordered as (amplitude, mean, sigma).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Gaussian;

impl Gaussian {
    fn gradient(x: f64, par: &[f64]) -> [f64; 3] {
        let (amplitude, mean, sigma) = (par[0], par[1], par[2]);
        let d = (x - mean) / sigma;
        let e = (-0.5 * d * d).exp();
        [e, amplitude * e * d / sigma, amplitude * e * d * d / sigma]
    }
}

impl Model for Gaussian {
    fn npar(&self) -> usize {
        3
    }

    fn eval(&self, x: f64, par: &[f64]) -> f64 {
        let d = (x - par[1]) / par[2];
        par[0] * (-0.5 * d * d).exp()
    }
}

/// Fit a Gaussian to `hist` in `range` with the Levenberg-Marquardt method
///
/// Start values are derived from the maximum, mean and standard
/// deviation of the samples. The returned sigma is non-negative.
pub fn fit_gaussian(hist: &Hist1D, range: (f64, f64)) -> Result<FitResult, FitError> {
    let points = collect_points(hist, range, |_| true);
    check_points(&points, range, Gaussian.npar())?;
    let mut par = start_values(&points, hist)?;
    let mut chi2 = chi_square(&Gaussian, &par, &points);

    let mut lambda = 1e-3;
    let mut converged = false;
    for iter in 0..MAX_ITER {
        let (hessian, grad) = normal_equations(&points, &par);
        let mut improved = false;
        while lambda < MAX_LAMBDA {
            let mut damped = hessian.clone();
            for i in 0..3 {
                damped[(i, i)] += lambda * hessian[(i, i)].max(f64::MIN_POSITIVE);
            }
            let Some(step) = damped.lu().solve(&grad) else {
                lambda *= 10.;
                continue;
            };
            let trial: Vec<_> = par.iter().zip(step.iter()).map(|(p, s)| p + s).collect();
            let trial_chi2 = chi_square(&Gaussian, &trial, &points);
            if trial_chi2.is_finite() && trial_chi2 <= chi2 && trial[2] != 0. {
                let change = chi2 - trial_chi2;
                par = trial;
                chi2 = trial_chi2;
                lambda = (lambda / 10.).max(1e-12);
                improved = true;
                if change <= REL_TOLERANCE * chi2 + f64::MIN_POSITIVE {
                    converged = true;
                }
                break;
            }
            lambda *= 10.;
        }
        trace!("Gaussian fit iteration {iter}: chi2 = {chi2}, par = {par:?}");
        if !improved {
            // no downhill step left: we are at the minimum up to rounding
            converged = true;
        }
        if converged {
            break;
        }
    }
    if par.iter().any(|p| !p.is_finite()) {
        return Err(FitError::NonFinite);
    }
    par[2] = par[2].abs();

    let (hessian, _) = normal_equations(&points, &par);
    let err = hessian
        .try_inverse()
        .map(|cov| (0..3).map(|i| cov[(i, i)].max(0.).sqrt()).collect());
    Ok(FitResult {
        par,
        err,
        chi2,
        ndf: points.len() - Gaussian.npar(),
        converged,
    })
}

fn start_values(points: &[Point], hist: &Hist1D) -> Result<Vec<f64>, FitError> {
    let sum: f64 = points.iter().map(|p| p.y).sum();
    let amplitude = points.iter().map(|p| p.y).fold(f64::MIN, f64::max);
    if sum <= 0. || amplitude <= 0. {
        return Err(FitError::NonFinite);
    }
    let mean = points.iter().map(|p| p.y * p.x).sum::<f64>() / sum;
    let var = points
        .iter()
        .map(|p| p.y * (p.x - mean).powi(2))
        .sum::<f64>()
        / sum;
    let sigma = if var > 0. {
        var.sqrt()
    } else {
        hist.axis().width(0)
    };
    Ok(vec![amplitude, mean, sigma])
}

/// J^T J and J^T r for the weighted residuals r
fn normal_equations(points: &[Point], par: &[f64]) -> (DMatrix<f64>, DVector<f64>) {
    let mut hessian = DMatrix::zeros(3, 3);
    let mut grad = DVector::zeros(3);
    for p in points {
        let w = 1. / (p.err * p.err);
        let r = p.y - Gaussian.eval(p.x, par);
        let g = Gaussian::gradient(p.x, par);
        for i in 0..3 {
            grad[i] += w * g[i] * r;
            for j in 0..3 {
                hessian[(i, j)] += w * g[i] * g[j];
            }
        }
    }
    (hessian, grad)
}
