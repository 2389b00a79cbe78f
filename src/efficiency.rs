use log::warn;

use crate::histogram::{Hist1D, HistogramError};

pub const EFFICIENCY_NAME: &str = "hEfficiency";
pub const EFFICIENCY_TITLE: &str = ";p_{T} (GeV/c);Reconstruction Efficiency";

/// Reconstruction efficiency per pT bin
///
/// Both spectra are merged onto `pt_edges` before taking the ratio
/// reconstructed / generated. Bins without generated entries are
/// set to zero.
pub fn efficiency(
    generated: &Hist1D,
    reconstructed: &Hist1D,
    pt_edges: &[f64],
) -> Result<Hist1D, HistogramError> {
    let gen = generated.rebinned("gp", pt_edges)?;
    let mut eff = reconstructed.rebinned(EFFICIENCY_NAME, pt_edges)?;
    eff.divide(&gen)?;
    eff.title = EFFICIENCY_TITLE.to_owned();
    for bin in anomalous_bins(&eff) {
        warn!(
            "Efficiency {} in pT bin [{}, {}] is outside [0, 1]",
            eff.content(bin),
            eff.axis().low_edge(bin),
            eff.axis().high_edge(bin)
        );
    }
    Ok(eff)
}

/// Bins with an efficiency outside the physical range [0, 1]
///
/// These indicate inconsistent input spectra, e.g. more reconstructed
/// than generated candidates.
pub fn anomalous_bins(eff: &Hist1D) -> Vec<usize> {
    (0..eff.nbins())
        .filter(|&bin| !(0. ..=1.).contains(&eff.content(bin)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::Axis;
    use approx::assert_abs_diff_eq;

    fn spectrum(name: &str, counts: &[f64]) -> Hist1D {
        let mut h = Hist1D::new(name, "", Axis::uniform(counts.len(), 0., counts.len() as f64).unwrap());
        for (bin, &c) in counts.iter().enumerate() {
            h.set_content(bin, c);
            h.set_error(bin, c.sqrt());
        }
        h
    }

    #[test]
    fn ratio() {
        let gen = spectrum("gen", &[100., 100., 50., 50., 0., 0.]);
        let rec = spectrum("rec", &[10., 30., 20., 20., 0., 0.]);
        let eff = efficiency(&gen, &rec, &[0., 2., 4., 6.]).unwrap();
        assert_eq!(eff.name, EFFICIENCY_NAME);
        assert_eq!(eff.nbins(), 3);
        assert_abs_diff_eq!(eff.content(0), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(eff.content(1), 0.4, epsilon = 1e-12);
        // 40/100 with Poisson errors on both
        let expected_var = (40. * 100. * 100. + 100. * 40. * 40.) / 1e8;
        assert_abs_diff_eq!(eff.variance(1), expected_var, epsilon = 1e-12);
        // no generated candidates
        assert_eq!(eff.content(2), 0.);
        assert_eq!(eff.error(2), 0.);
        assert!(anomalous_bins(&eff).is_empty());
    }

    #[test]
    fn flag_anomalies() {
        let gen = spectrum("gen", &[10., 10.]);
        let rec = spectrum("rec", &[5., 12.]);
        let eff = efficiency(&gen, &rec, &[0., 1., 2.]).unwrap();
        assert_eq!(anomalous_bins(&eff), [1]);
    }

    #[test]
    fn incompatible_binning() {
        let gen = spectrum("gen", &[10., 10.]);
        let rec = spectrum("rec", &[5., 5.]);
        assert_eq!(
            efficiency(&gen, &rec, &[0., 0.5, 2.]),
            Err(HistogramError::IncompatibleEdge(0.5))
        );
    }
}
