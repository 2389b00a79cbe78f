//! Binned least-squares fits
//!
//! Fits follow the usual chi-square convention for histograms: each
//! bin whose centre lies inside the fit range is a sample at the bin
//! centre, weighted with the inverse bin variance. Bins without
//! variance (in particular empty bins) are skipped.
mod gaussian;
mod polynomial;

pub use gaussian::{fit_gaussian, Gaussian};
pub use polynomial::{fit_polynomial, Polynomial};

use thiserror::Error;

use crate::{histogram::Hist1D, traits::Model};

/// A single fit sample
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub err: f64,
}

/// Collect the fit samples of `hist` in `range`
///
/// Samples for which `accept` returns false are rejected.
pub fn collect_points<F>(hist: &Hist1D, range: (f64, f64), accept: F) -> Vec<Point>
where
    F: Fn(f64) -> bool,
{
    let axis = hist.axis();
    (0..hist.nbins())
        .filter_map(|bin| {
            let x = axis.centre(bin);
            let err = hist.error(bin);
            if x < range.0 || x > range.1 || err <= 0. || !accept(x) {
                None
            } else {
                Some(Point {
                    x,
                    y: hist.content(bin),
                    err,
                })
            }
        })
        .collect()
}

/// Chi square of `model` with parameters `par` w.r.t. `points`
pub fn chi_square<M: Model>(model: &M, par: &[f64], points: &[Point]) -> f64 {
    points
        .iter()
        .map(|p| {
            let r = (p.y - model.eval(p.x, par)) / p.err;
            r * r
        })
        .sum()
}

/// Outcome of a fit
#[derive(Clone, Debug, PartialEq)]
pub struct FitResult {
    /// Best-fit parameters
    pub par: Vec<f64>,
    /// Parameter uncertainties, if the covariance could be computed
    pub err: Option<Vec<f64>>,
    pub chi2: f64,
    /// Degrees of freedom: number of samples minus free parameters
    pub ndf: usize,
    pub converged: bool,
}

impl FitResult {
    /// Chi square per degree of freedom
    ///
    /// `None` if there are no degrees of freedom.
    pub fn reduced_chi2(&self) -> Option<f64> {
        if self.ndf == 0 {
            None
        } else {
            Some(self.chi2 / self.ndf as f64)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("No samples in fit range [{0}, {1}]")]
    NoData(f64, f64),
    #[error("{points} samples are not enough to determine {npar} parameters")]
    TooFewPoints { points: usize, npar: usize },
    #[error("Failed to solve least-squares system: {0}")]
    Singular(String),
    #[error("Fit result is not finite")]
    NonFinite,
}

fn check_points(points: &[Point], range: (f64, f64), npar: usize) -> Result<(), FitError> {
    if points.is_empty() {
        return Err(FitError::NoData(range.0, range.1));
    }
    if points.len() < npar {
        return Err(FitError::TooFewPoints {
            points: points.len(),
            npar,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::Axis;

    #[test]
    fn points() {
        let mut h = Hist1D::new("h", "", Axis::uniform(5, 0., 5.).unwrap());
        for bin in 0..5 {
            h.set_content(bin, bin as f64);
            h.set_error(bin, (bin as f64).sqrt());
        }
        let pts = collect_points(&h, (0.5, 3.5), |x| x != 2.5);
        // bin 0 has no error, bin 2 is rejected
        let xs: Vec<_> = pts.iter().map(|p| p.x).collect();
        assert_eq!(xs, [1.5, 3.5]);
    }

    #[test]
    fn reduced_chi2() {
        let res = FitResult {
            par: vec![],
            err: None,
            chi2: 6.,
            ndf: 0,
            converged: true,
        };
        assert_eq!(res.reduced_chi2(), None);
        let res = FitResult { ndf: 3, ..res };
        assert_eq!(res.reduced_chi2(), Some(2.));
    }
}
