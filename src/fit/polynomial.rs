use log::trace;
use nalgebra::{DMatrix, DVector};

use super::{check_points, chi_square, collect_points, FitError, FitResult};
use crate::{histogram::Hist1D, traits::Model};

// relative singular value cutoff for the least-squares solution
const SVD_EPS: f64 = 1e-14;

/// Polynomial `c[0] + c[1] x + c[2] x^2 + ...`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polynomial {
    coeff: Vec<f64>,
}

impl Polynomial {
    pub fn new(coeff: Vec<f64>) -> Self {
        Self { coeff }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coeff
    }

    /// Degree, counting trailing zero coefficients
    pub fn degree(&self) -> usize {
        self.coeff.len().saturating_sub(1)
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.coeff.iter().rev().fold(0., |acc, c| acc * x + c)
    }

    /// Definite integral from `a` to `b`
    pub fn integral(&self, a: f64, b: f64) -> f64 {
        let antiderivative = |x: f64| {
            self.coeff
                .iter()
                .enumerate()
                .rev()
                .fold(0., |acc, (i, c)| acc * x + c / (i + 1) as f64)
                * x
        };
        antiderivative(b) - antiderivative(a)
    }
}

impl Model for Polynomial {
    fn npar(&self) -> usize {
        self.coeff.len()
    }

    fn eval(&self, x: f64, par: &[f64]) -> f64 {
        par.iter().rev().fold(0., |acc, c| acc * x + c)
    }
}

/// Fit a polynomial of the given degree to `hist` in `range`
///
/// Samples at positions where `accept` returns false do not
/// contribute. The returned coefficients refer to powers of `x`.
pub fn fit_polynomial<F>(
    hist: &Hist1D,
    range: (f64, f64),
    degree: usize,
    accept: F,
) -> Result<(Polynomial, FitResult), FitError>
where
    F: Fn(f64) -> bool,
{
    let npar = degree + 1;
    let points = collect_points(hist, range, accept);
    check_points(&points, range, npar)?;

    // work in a shifted and scaled variable for numerical stability
    let centre = 0.5 * (range.0 + range.1);
    let scale = match 0.5 * (range.1 - range.0) {
        s if s > 0. => s,
        _ => 1.,
    };
    let design = DMatrix::from_fn(points.len(), npar, |i, j| {
        let t = (points[i].x - centre) / scale;
        t.powi(j as i32) / points[i].err
    });
    let rhs = DVector::from_iterator(points.len(), points.iter().map(|p| p.y / p.err));
    let svd = design.clone().svd(true, true);
    let scaled_coeff = svd
        .solve(&rhs, SVD_EPS)
        .map_err(|err| FitError::Singular(err.to_owned()))?;

    let transform = unscale_transform(npar, centre, scale);
    let coeff = &transform * &scaled_coeff;
    if coeff.iter().any(|c| !c.is_finite()) {
        return Err(FitError::NonFinite);
    }
    let err = (design.transpose() * &design).try_inverse().map(|cov| {
        let cov = &transform * cov * transform.transpose();
        (0..npar).map(|i| cov[(i, i)].max(0.).sqrt()).collect()
    });

    let poly = Polynomial::new(coeff.iter().copied().collect());
    let chi2 = chi_square(&poly, poly.coefficients(), &points);
    let ndf = points.len() - npar;
    trace!("pol{degree} fit: {} samples, chi2 = {chi2}, ndf = {ndf}", points.len());
    let res = FitResult {
        par: poly.coefficients().to_vec(),
        err,
        chi2,
        ndf,
        converged: true,
    };
    Ok((poly, res))
}

/// Matrix mapping coefficients in `t = (x - centre) / scale` onto
/// coefficients in `x`
fn unscale_transform(npar: usize, centre: f64, scale: f64) -> DMatrix<f64> {
    let mut transform = DMatrix::zeros(npar, npar);
    for k in 0..npar {
        let norm = scale.powi(-(k as i32));
        let mut binom = 1.;
        for i in 0..=k {
            // binom = C(k, i)
            transform[(i, k)] = norm * binom * (-centre).powi((k - i) as i32);
            binom = binom * (k - i) as f64 / (i + 1) as f64;
        }
    }
    transform
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::Axis;
    use approx::assert_abs_diff_eq;

    fn hist_from<F: Fn(f64) -> f64>(f: F) -> Hist1D {
        let mut h = Hist1D::new("h", "", Axis::uniform(50, 2.5, 3.5).unwrap());
        for bin in 0..h.nbins() {
            let x = h.axis().centre(bin);
            h.set_content(bin, f(x));
            h.set_error(bin, 1.);
        }
        h
    }

    #[test]
    fn evaluate_and_integrate() {
        let p = Polynomial::new(vec![1., -2., 3.]);
        assert_eq!(p.degree(), 2);
        assert_abs_diff_eq!(p.eval(2.), 1. - 4. + 12., epsilon = 1e-12);
        // x - x^2 + x^3 from 1 to 2
        assert_abs_diff_eq!(p.integral(1., 2.), (2. - 4. + 8.) - (1. - 1. + 1.), epsilon = 1e-12);
        assert_abs_diff_eq!(p.integral(2., 1.), -p.integral(1., 2.), epsilon = 1e-12);
        assert_eq!(Polynomial::default().eval(3.), 0.);
    }

    #[test]
    fn exact_quadratic() {
        let h = hist_from(|x| 100. + 20. * x - 3. * x * x);
        let (poly, res) = fit_polynomial(&h, (2.5, 3.5), 2, |_| true).unwrap();
        let c = poly.coefficients();
        assert_abs_diff_eq!(c[0], 100., epsilon = 1e-6);
        assert_abs_diff_eq!(c[1], 20., epsilon = 1e-6);
        assert_abs_diff_eq!(c[2], -3., epsilon = 1e-6);
        assert!(res.chi2 < 1e-12);
        assert_eq!(res.ndf, 47);
        assert!(res.err.is_some());
    }

    #[test]
    fn rejected_region_ignored() {
        // a spike that would spoil the fit if it were included
        let h = hist_from(|x| if (2.9..3.1).contains(&x) { 1e4 } else { 50. + x });
        let (poly, res) = fit_polynomial(&h, (2.5, 3.5), 1, |x| !(2.9 < x && x < 3.1)).unwrap();
        assert_abs_diff_eq!(poly.coefficients()[0], 50., epsilon = 1e-6);
        assert_abs_diff_eq!(poly.coefficients()[1], 1., epsilon = 1e-6);
        assert!(res.chi2 < 1e-12);
        assert_eq!(res.ndf, 40 - 2);
    }

    #[test]
    fn not_enough_points() {
        let h = hist_from(|x| x);
        assert_eq!(
            fit_polynomial(&h, (2.5, 2.545), 2, |_| true),
            Err(FitError::TooFewPoints { points: 2, npar: 3 })
        );
        assert_eq!(
            fit_polynomial(&h, (5., 6.), 2, |_| true),
            Err(FitError::NoData(5., 6.))
        );
    }
}
