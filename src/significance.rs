use log::{debug, info};
use thiserror::Error;

use crate::{
    archive::Archive,
    histogram::{Hist1D, HistogramError},
};

pub const SIGNIFICANCE_PER_EVENT_NAME: &str = "hSignificancePerEvent";
pub const SIGNIFICANCE_NAME: &str = "hSignificance";
pub const SIGNAL_NAME: &str = "hSignal";
pub const SIG_OVER_BKG_NAME: &str = "hSigOverBkg";

/// Expected signal significance per pT bin
#[derive(Clone, Debug, PartialEq)]
pub struct Significance {
    /// S/sqrt(S+B) for a single event
    pub per_event: Hist1D,
    /// Significance for the full sample
    pub significance: Hist1D,
    /// Expected number of signal candidates
    pub signal: Hist1D,
    pub sig_over_bkg: Hist1D,
}

impl Significance {
    pub fn into_archive(self) -> Archive {
        [self.per_event, self.significance, self.signal, self.sig_over_bkg]
            .into_iter()
            .map(|h| (h.name.clone(), h.into()))
            .collect()
    }
}

/// Expected signal yield per event
///
/// `dn_dpt` is a differential yield, e.g. a prediction sampled with
/// [crate::table::sample]. Each bin is multiplied by its width, by
/// `scale` and by the corresponding bin of `raa`, if given.
#[derive(Copy, Clone, Debug)]
pub struct SignalYield<'a> {
    pub dn_dpt: &'a Hist1D,
    /// Nuclear modification factor on the binning of `dn_dpt`
    pub raa: Option<&'a Hist1D>,
    /// Constant factor, e.g. branching ratio times rapidity range
    pub scale: f64,
}

impl<'a> SignalYield<'a> {
    pub fn new(dn_dpt: &'a Hist1D) -> Self {
        Self {
            dn_dpt,
            raa: None,
            scale: 1.,
        }
    }

    /// Signal yield per event in each bin of `dn_dpt`
    pub fn per_bin(&self) -> Result<Hist1D, SignificanceError> {
        if let Some(raa) = self.raa {
            if !raa.axis().same_binning(self.dn_dpt.axis()) {
                return Err(SignificanceError::Raa(HistogramError::BinningMismatch {
                    lhs: self.dn_dpt.name.clone(),
                    rhs: raa.name.clone(),
                }));
            }
        }
        let mut res = self.dn_dpt.clone();
        res.name = "hYield".to_owned();
        for bin in 0..res.nbins() {
            let raa = self.raa.map(|raa| raa.content(bin)).unwrap_or(1.);
            let factor = res.axis().width(bin) * self.scale * raa;
            res.set_content(bin, res.content(bin) * factor);
            res.set_error(bin, 0.);
        }
        Ok(res)
    }
}

/// Significance from efficiency, background and the expected signal yield
///
/// The yield per event is merged onto the binning of `efficiency`. The
/// signal per event is then the product of efficiency and yield. Bins
/// without background get a vanishing significance.
pub fn significance(
    efficiency: &Hist1D,
    bkg_per_event: &Hist1D,
    signal_yield: SignalYield<'_>,
    nevents: f64,
) -> Result<Significance, SignificanceError> {
    if !efficiency.axis().same_binning(bkg_per_event.axis()) {
        return Err(SignificanceError::Binning(HistogramError::BinningMismatch {
            lhs: efficiency.name.clone(),
            rhs: bkg_per_event.name.clone(),
        }));
    }
    if !(nevents > 0.) {
        return Err(SignificanceError::NoEvents(nevents));
    }
    let edges = efficiency.axis().edges();
    let yields = signal_yield
        .per_bin()?
        .rebinned("hYield", edges)
        .map_err(SignificanceError::Yield)?;

    let template = Hist1D::new("", "", efficiency.axis().clone());
    let named = |name: &str, title: &str| {
        let mut h = template.clone();
        h.name = name.to_owned();
        h.title = format!(";p_{{T}} (GeV/c);{title}");
        h
    };
    let mut res = Significance {
        per_event: named(SIGNIFICANCE_PER_EVENT_NAME, "Significance per event"),
        significance: named(SIGNIFICANCE_NAME, "Significance (3#sigma)"),
        signal: named(SIGNAL_NAME, "Signal"),
        sig_over_bkg: named(SIG_OVER_BKG_NAME, "S/B"),
    };
    let sqrt_n = nevents.sqrt();
    for bin in 0..efficiency.nbins() {
        let signal = efficiency.content(bin) * yields.content(bin);
        let bkg = bkg_per_event.content(bin);
        let (per_event, sig_over_bkg) = if bkg > 0. {
            (signal / (signal + bkg).sqrt(), signal / bkg)
        } else {
            (0., 0.)
        };
        debug!("pT bin {}: S = {signal}, B = {bkg}, S/sqrt(S+B) = {per_event}", bin + 1);
        res.per_event.set_content(bin, per_event);
        res.significance.set_content(bin, per_event * sqrt_n);
        res.signal.set_content(bin, signal * nevents);
        if per_event != 0. {
            res.signal.set_error(bin, 1. / per_event);
        }
        res.sig_over_bkg.set_content(bin, sig_over_bkg);
    }
    info!("Computed significance for {nevents} events");
    Ok(res)
}

#[derive(Debug, Error)]
pub enum SignificanceError {
    #[error("Efficiency and background: {0}")]
    Binning(HistogramError),
    #[error("Cannot merge signal yield onto efficiency binning: {0}")]
    Yield(HistogramError),
    #[error("Nuclear modification factor: {0}")]
    Raa(HistogramError),
    #[error("Invalid number of events: {0}")]
    NoEvents(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn hist(name: &str, edges: &[f64], contents: &[f64]) -> Hist1D {
        let mut h = Hist1D::with_edges(name, "", edges.to_vec()).unwrap();
        for (bin, c) in contents.iter().enumerate() {
            h.set_content(bin, *c);
        }
        h
    }

    #[test]
    fn per_bin() {
        let edges = [0., 2., 4., 6.];
        let eff = hist("eff", &edges, &[0.5, 0.2, 0.1]);
        let bkg = hist("bkg", &edges, &[3e-4, 0., 1e-4]);
        // yield on a finer binning
        let yields = hist(
            "yield",
            &[0., 1., 2., 3., 4., 5., 6.],
            &[1e-4, 1e-4, 5e-5, 5e-5, 1e-5, 1e-5],
        );
        let signal_yield = SignalYield {
            scale: 10.,
            ..SignalYield::new(&yields)
        };
        let res = significance(&eff, &bkg, signal_yield, 1e8).unwrap();

        // S = 0.5 * 2e-3 = 1e-3, B = 3e-4
        let s: f64 = 1e-3;
        let b: f64 = 3e-4;
        assert_abs_diff_eq!(res.per_event.content(0), s / (s + b).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(
            res.significance.content(0),
            s / (s + b).sqrt() * 1e4,
            epsilon = 1e-8
        );
        assert_abs_diff_eq!(res.signal.content(0), s * 1e8, epsilon = 1e-6);
        assert_abs_diff_eq!(res.signal.error(0), (s + b).sqrt() / s, epsilon = 1e-9);
        assert_abs_diff_eq!(res.sig_over_bkg.content(0), s / b, epsilon = 1e-12);

        // no background
        assert_eq!(res.per_event.content(1), 0.);
        assert_eq!(res.sig_over_bkg.content(1), 0.);
        assert_eq!(res.signal.error(1), 0.);
        assert_abs_diff_eq!(res.signal.content(1), 0.2 * 1e-3 * 1e8, epsilon = 1e-6);

        let archive = res.into_archive();
        assert_eq!(archive.len(), 4);
        assert!(archive.h1(SIG_OVER_BKG_NAME).is_ok());
    }

    #[test]
    fn mismatched_inputs() {
        let eff = hist("eff", &[0., 1., 2.], &[0.5, 0.5]);
        let bkg = hist("bkg", &[0., 1.5, 2.], &[1., 1.]);
        let yields = hist("yield", &[0., 2.], &[1.]);
        assert!(matches!(
            significance(&eff, &bkg, SignalYield::new(&yields), 1.),
            Err(SignificanceError::Binning(_))
        ));
        assert!(matches!(
            significance(&eff, &eff, SignalYield::new(&yields), 1.),
            Err(SignificanceError::Yield(HistogramError::IncompatibleEdge(_)))
        ));
        assert!(matches!(
            significance(&eff, &eff, SignalYield::new(&eff), 0.),
            Err(SignificanceError::NoEvents(_))
        ));
        let with_raa = SignalYield {
            raa: Some(&bkg),
            ..SignalYield::new(&eff)
        };
        assert!(matches!(
            significance(&eff, &eff, with_raa, 1.),
            Err(SignificanceError::Raa(_))
        ));
    }

    #[test]
    fn differential_yield() {
        let eff = hist("eff", &[0., 2., 4.], &[1., 1.]);
        let bkg = hist("bkg", &[0., 2., 4.], &[1., 1.]);
        let coarse = hist("dndpt", &[0., 1., 2., 3., 4.], &[1.; 4]);
        let fine_edges: Vec<_> = (0..=8).map(|i| 0.5 * i as f64).collect();
        let fine = hist("dndpt", &fine_edges, &[1.; 8]);

        // flat dN/dpT = 1 gives a yield of 2 in each 2 GeV bin
        for dn_dpt in [&coarse, &fine] {
            let res = significance(&eff, &bkg, SignalYield::new(dn_dpt), 1.).unwrap();
            assert_abs_diff_eq!(res.signal.content(0), 2., epsilon = 1e-12);
            assert_abs_diff_eq!(res.signal.content(1), 2., epsilon = 1e-12);
        }

        let raa = hist("raa", &fine_edges, &[0.5, 0.5, 0.5, 0.5, 0.25, 0.25, 0.25, 0.25]);
        let suppressed = SignalYield {
            dn_dpt: &fine,
            raa: Some(&raa),
            scale: 4.,
        };
        let res = significance(&eff, &bkg, suppressed, 1.).unwrap();
        assert_abs_diff_eq!(res.signal.content(0), 4., epsilon = 1e-12);
        assert_abs_diff_eq!(res.signal.content(1), 2., epsilon = 1e-12);
    }
}
