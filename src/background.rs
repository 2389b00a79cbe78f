use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::{
    fit::{fit_polynomial, FitError, FitResult, Polynomial},
    histogram::Hist1D,
};

/// Mass interval around the resonance that is excluded from background fits
#[derive(Deserialize, Serialize)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SignalWindow {
    pub lo: f64,
    pub hi: f64,
}

impl SignalWindow {
    /// Window `mass ± nsigma * sigma`
    pub fn around(mass: f64, sigma: f64, nsigma: f64) -> Self {
        let half_width = nsigma * sigma.abs();
        Self {
            lo: mass - half_width,
            hi: mass + half_width,
        }
    }

    /// Whether `x` lies strictly inside the window
    pub fn contains(&self, x: f64) -> bool {
        self.lo < x && x < self.hi
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }
}

/// Settings for the background description with a polynomial of adaptive degree
///
/// The fit starts with a polynomial of degree `start_degree`. As long
/// as chi^2/ndf exceeds `max_reduced_chi2`, the degree is increased by
/// one, up to `max_degree`.
#[derive(Deserialize, Serialize)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BkgFitter {
    pub start_degree: usize,
    pub max_degree: usize,
    pub max_reduced_chi2: f64,
}

pub const DEFAULT_START_DEGREE: usize = 2;
pub const DEFAULT_MAX_DEGREE: usize = 4;
pub const DEFAULT_MAX_REDUCED_CHI2: f64 = 3.;

impl Default for BkgFitter {
    fn default() -> Self {
        Self {
            start_degree: DEFAULT_START_DEGREE,
            max_degree: DEFAULT_MAX_DEGREE,
            max_reduced_chi2: DEFAULT_MAX_REDUCED_CHI2,
        }
    }
}

/// One step of the degree escalation
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FitStep {
    pub degree: usize,
    pub chi2: f64,
    pub ndf: usize,
}

/// Final background description
#[derive(Clone, Debug, PartialEq)]
pub struct AdaptiveFit {
    pub polynomial: Polynomial,
    pub result: FitResult,
    /// All fits in the order they were performed
    pub steps: Vec<FitStep>,
}

impl AdaptiveFit {
    pub fn degree(&self) -> usize {
        self.polynomial.degree()
    }
}

impl BkgFitter {
    /// Fit the sidebands of `hist` in `range`, i.e. everything outside `window`
    pub fn fit(
        &self,
        hist: &Hist1D,
        range: (f64, f64),
        window: SignalWindow,
    ) -> Result<AdaptiveFit, FitError> {
        let sideband = move |x: f64| !window.contains(x);
        let mut degree = self.start_degree.min(self.max_degree);
        let mut steps = Vec::with_capacity(self.max_degree - degree + 1);
        loop {
            let (polynomial, result) = fit_polynomial(hist, range, degree, sideband)?;
            steps.push(FitStep {
                degree,
                chi2: result.chi2,
                ndf: result.ndf,
            });
            let escalate = match result.reduced_chi2() {
                Some(chi2) => {
                    trace!("pol{degree}: chi2/ndf = {chi2}");
                    chi2 > self.max_reduced_chi2
                }
                None => {
                    warn!(
                        "No degrees of freedom left for pol{degree} background fit, keeping it"
                    );
                    false
                }
            };
            if !escalate || degree >= self.max_degree {
                debug!(
                    "Background described by pol{degree} with chi2/ndf = {}/{}",
                    result.chi2, result.ndf
                );
                return Ok(AdaptiveFit {
                    polynomial,
                    result,
                    steps,
                });
            }
            degree += 1;
        }
    }
}

/// Expected background candidates per event inside the signal window
///
/// The polynomial describes counts per mass bin of width `bin_width`.
/// A negative integral, which can occur when the sidebands force a
/// negative lobe below the peak, is clamped to zero.
pub fn background_per_event(
    polynomial: &Polynomial,
    window: SignalWindow,
    bin_width: f64,
    nevents: f64,
) -> f64 {
    let count = polynomial.integral(window.lo, window.hi) / bin_width;
    if count < 0. {
        warn!(
            "Negative background estimate {count} in window [{}, {}], setting to zero",
            window.lo, window.hi
        );
        return 0.;
    }
    count / nevents
}
