use std::f64::consts::PI;

use derive_builder::Builder;
use log::{debug, info};
use rand::SeedableRng;
use rand_distr::{Binomial, Distribution, Poisson};
use rand_xoshiro::Xoshiro256Plus;
use thiserror::Error;

use crate::{
    archive::{path_in, Archive},
    channel::Channel,
    histogram::{Axis, Hist1D, Hist2D, HistogramError},
    pipeline::{EVENT_COUNT_PATH, PT_GEN_HIST, PT_REC_HIST},
};

/// Settings for synthetic signal and background archives
///
/// In each pT bin, the signal sample holds a pure Gaussian peak at the
/// resonance mass and the background sample a flat mass distribution.
#[derive(Builder, Clone, Debug, PartialEq)]
pub struct ToyConfig {
    channel: Channel,
    #[builder(default = "vec![0., 2., 4., 6., 8., 10.]")]
    pt_edges: Vec<f64>,
    /// Number of bins in the channel's mass window
    #[builder(default = "95")]
    mass_bins: usize,
    /// Width of the signal peak in GeV
    #[builder(default = "0.02")]
    sigma: f64,
    /// Signal candidates per pT bin
    #[builder(default = "1e4")]
    signal_yield: f64,
    /// Background candidates per mass bin and pT bin
    #[builder(default = "100.")]
    bkg_level: f64,
    /// Reconstruction efficiency, either one value per pT bin or a
    /// single value for all bins
    #[builder(default = "vec![0.5]")]
    efficiency: Vec<f64>,
    /// Number of generated candidates per pT bin
    #[builder(default = "1e5")]
    generated: f64,
    /// Number of pT spectrum bins per analysis pT bin
    #[builder(default = "4")]
    fine_bins: usize,
    /// Number of background events
    #[builder(default = "1e6")]
    nevents: f64,
    /// Draw Poisson and binomial fluctuations instead of expected values
    #[builder(default)]
    fluctuate: bool,
    #[builder(default)]
    seed: u64,
}

/// Synthetic inputs in the layout read by [crate::pipeline::Inputs::load]
#[derive(Clone, Debug, PartialEq)]
pub struct Toy {
    pub signal: Archive,
    pub background: Archive,
}

enum Sampler {
    Expected,
    Fluctuated(Xoshiro256Plus),
}

impl Sampler {
    fn count(&mut self, mean: f64) -> f64 {
        match self {
            Sampler::Expected => mean,
            Sampler::Fluctuated(rng) => match Poisson::new(mean) {
                Ok(distr) => distr.sample(rng),
                Err(_) => 0.,
            },
        }
    }

    fn accepted(&mut self, n: f64, p: f64) -> f64 {
        match self {
            Sampler::Expected => n * p,
            Sampler::Fluctuated(rng) => match Binomial::new(n as u64, p) {
                Ok(distr) => distr.sample(rng) as f64,
                Err(_) => 0.,
            },
        }
    }
}

impl ToyConfig {
    /// Efficiency in the pT bin with index `bin`
    pub fn efficiency(&self, bin: usize) -> f64 {
        if self.efficiency.len() == 1 {
            self.efficiency[0]
        } else {
            self.efficiency[bin]
        }
    }

    /// Expected background per event in a window of the given width
    pub fn expected_bkg_per_event(&self, window_width: f64) -> f64 {
        let (lo, hi) = self.channel.mass_window();
        let bin_width = (hi - lo) / self.mass_bins as f64;
        self.bkg_level * window_width / bin_width / self.nevents
    }

    fn check(&self) -> Result<Axis, ToyError> {
        use ToyError::*;
        let pt_axis = Axis::new(self.pt_edges.clone())?;
        let npt = pt_axis.nbins();
        if self.efficiency.len() != 1 && self.efficiency.len() != npt {
            return Err(EfficiencyCount {
                found: self.efficiency.len(),
                expected: npt,
            });
        }
        if let Some(eff) = self.efficiency.iter().find(|e| !(0. ..=1.).contains(*e)) {
            return Err(InvalidEfficiency(*eff));
        }
        for (name, val) in [
            ("sigma", self.sigma),
            ("number of events", self.nevents),
        ] {
            if !(val > 0.) {
                return Err(NotPositive(name, val));
            }
        }
        for (name, val) in [
            ("signal yield", self.signal_yield),
            ("background level", self.bkg_level),
            ("generated candidates", self.generated),
        ] {
            if !(val >= 0.) {
                return Err(NotPositive(name, val));
            }
        }
        if self.fine_bins == 0 {
            return Err(NotPositive("pT spectrum bins", 0.));
        }
        Ok(pt_axis)
    }

    /// Generate signal and background archives
    pub fn generate(&self) -> Result<Toy, ToyError> {
        let pt_axis = self.check()?;
        let (lo, hi) = self.channel.mass_window();
        let mass_axis = Axis::uniform(self.mass_bins, lo, hi)?;
        let mass = self.channel.resonance_mass();
        let mut sampler = if self.fluctuate {
            Sampler::Fluctuated(Xoshiro256Plus::seed_from_u64(self.seed))
        } else {
            Sampler::Expected
        };
        info!(
            "Generating {} inputs for channel {} with {} pT bins",
            if self.fluctuate { "fluctuated" } else { "expected" },
            self.channel,
            pt_axis.nbins()
        );

        let mut sig = Hist2D::new(
            self.channel.signal_hist(),
            ";m (GeV/c^{2});p_{T} (GeV/c)",
            mass_axis.clone(),
            pt_axis.clone(),
        );
        let mut bkg = Hist2D::new(
            self.channel.background_hist(),
            ";m (GeV/c^{2});p_{T} (GeV/c)",
            mass_axis.clone(),
            pt_axis.clone(),
        );
        let norm = 1. / (self.sigma * (2. * PI).sqrt());
        for ptbin in 0..pt_axis.nbins() {
            for mbin in 0..mass_axis.nbins() {
                let d = (mass_axis.centre(mbin) - mass) / self.sigma;
                let expected =
                    self.signal_yield * mass_axis.width(mbin) * norm * (-0.5 * d * d).exp();
                let n = sampler.count(expected);
                sig.set_cell(mbin, ptbin, n, n.sqrt());
                let n = sampler.count(self.bkg_level);
                bkg.set_cell(mbin, ptbin, n, n.sqrt());
            }
        }

        let fine_edges: Vec<f64> = (0..pt_axis.nbins())
            .flat_map(|bin| {
                let (lo, width) = (pt_axis.low_edge(bin), pt_axis.width(bin));
                let nfine = self.fine_bins;
                (0..nfine).map(move |i| lo + i as f64 * width / nfine as f64)
            })
            .chain(std::iter::once(pt_axis.max()))
            .collect();
        let mut pt_gen = Hist1D::with_edges(PT_GEN_HIST, ";p_{T} (GeV/c)", fine_edges.clone())?;
        let mut pt_rec = Hist1D::with_edges(PT_REC_HIST, ";p_{T} (GeV/c)", fine_edges)?;
        for bin in 0..pt_gen.nbins() {
            let eff = self.efficiency(bin / self.fine_bins);
            let gen = sampler.count(self.generated / self.fine_bins as f64);
            let rec = sampler.accepted(gen, eff);
            pt_gen.set_content(bin, gen);
            pt_gen.set_error(bin, gen.sqrt());
            pt_rec.set_content(bin, rec);
            pt_rec.set_error(bin, rec.sqrt());
        }

        let mut count = Hist1D::new("eventCount", "", Axis::uniform(1, 0., 1.)?);
        count.set_content(0, self.nevents);
        count.set_error(0, self.nevents.sqrt());

        let sig_dir = self.channel.signal_dir();
        let mut signal = Archive::new();
        signal.insert(path_in(&sig_dir, self.channel.signal_hist()), sig);
        signal.insert(path_in(&sig_dir, PT_GEN_HIST), pt_gen);
        signal.insert(path_in(&sig_dir, PT_REC_HIST), pt_rec);

        let mut background = Archive::new();
        background.insert(
            path_in(&self.channel.background_dir(), self.channel.background_hist()),
            bkg,
        );
        background.insert(EVENT_COUNT_PATH, count);
        debug!(
            "Generated {} signal and {} background objects",
            signal.len(),
            background.len()
        );
        Ok(Toy { signal, background })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToyError {
    #[error("Invalid binning: {0}")]
    Binning(#[from] HistogramError),
    #[error("Got {found} efficiencies for {expected} pT bins")]
    EfficiencyCount { found: usize, expected: usize },
    #[error("Efficiency {0} is outside [0, 1]")]
    InvalidEfficiency(f64),
    #[error("Invalid {0}: {1}")]
    NotPositive(&'static str, f64),
}
