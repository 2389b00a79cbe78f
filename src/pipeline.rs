use log::{debug, info};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::{
    archive::{path_in, Archive, ArchiveError},
    background::{background_per_event, AdaptiveFit, BkgFitter, SignalWindow},
    channel::Channel,
    efficiency::efficiency,
    fit::{fit_gaussian, FitError, FitResult},
    histogram::{Hist1D, Hist2D, HistogramError},
    progress_bar::{Progress, ProgressBar},
};

/// Default upper limit on the number of pT bins
pub const MAX_PT_BINS: usize = 1000;
/// Archive path of the event counter in the background sample
pub const EVENT_COUNT_PATH: &str = "qa-global-observables/eventCount";
/// Generated pT spectrum in the signal directory
pub const PT_GEN_HIST: &str = "hPtGen";
/// Reconstructed pT spectrum in the signal directory
pub const PT_REC_HIST: &str = "hPtRecSig";

pub const BKG_PER_EVENT_NAME: &str = "hBkgPerEvent";
pub const BKG_PER_EVENT_TITLE: &str = ";p_{T} (GeV/c);Bkg/nEvents";

/// Histograms the pipeline needs from the signal and background archives
#[derive(Clone, Debug, PartialEq)]
pub struct Inputs {
    pub mass_vs_pt_sig: Hist2D,
    pub mass_vs_pt_bkg: Hist2D,
    pub pt_gen: Hist1D,
    pub pt_rec: Hist1D,
    nevents: f64,
}

impl Inputs {
    /// Look up all inputs for `channel`
    pub fn load(
        channel: Channel,
        signal: &Archive,
        background: &Archive,
    ) -> Result<Self, PipelineError> {
        let sig_dir = channel.signal_dir();
        let bkg_dir = channel.background_dir();

        let mass_vs_pt_sig = signal.h2(&path_in(&sig_dir, channel.signal_hist()))?.clone();
        let mass_vs_pt_bkg = background
            .h2(&path_in(&bkg_dir, channel.background_hist()))?
            .clone();

        let nevents = background.h1(EVENT_COUNT_PATH)?.content(0);
        if !(nevents > 0.) {
            return Err(PipelineError::NoEvents(nevents));
        }
        info!("Background sample: {nevents} events");

        let pt_gen = signal.h1(&path_in(&sig_dir, PT_GEN_HIST))?.clone();
        let pt_rec = signal.h1(&path_in(&sig_dir, PT_REC_HIST))?.clone();
        Ok(Self {
            mass_vs_pt_sig,
            mass_vs_pt_bkg,
            pt_gen,
            pt_rec,
            nevents,
        })
    }

    /// Number of events in the background sample, always positive
    pub fn nevents(&self) -> f64 {
        self.nevents
    }
}

/// Results for a single pT bin
#[derive(Clone, Debug, PartialEq)]
pub struct BinReport {
    pub pt_range: (f64, f64),
    /// Gaussian fit to the signal peak: (amplitude, mean, sigma)
    pub signal: FitResult,
    pub window: SignalWindow,
    pub background: AdaptiveFit,
    pub bkg_per_event: f64,
}

/// Everything produced by a pipeline run
#[derive(Clone, Debug, PartialEq)]
pub struct Output {
    pub pt_edges: Vec<f64>,
    pub efficiency: Hist1D,
    /// Background candidates per event in the signal window.
    ///
    /// Bin errors are zero: the values are point estimates from the
    /// sideband fits.
    pub bkg_per_event: Hist1D,
    pub bins: Vec<BinReport>,
}

/// Background per event and efficiency extraction for one channel
#[derive(Copy, Clone, Debug, PartialEq, TypedBuilder)]
pub struct Pipeline {
    channel: Channel,
    #[builder(default)]
    fitter: BkgFitter,
    /// Half width of the signal window in units of the fitted peak width
    #[builder(default = 3.)]
    nsigma: f64,
    /// Half width of the signal fit range in units of the peak RMS
    #[builder(default = 5.)]
    fit_range_nrms: f64,
    #[builder(default = MAX_PT_BINS)]
    max_pt_bins: usize,
}

impl Pipeline {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Common pT bin edges of signal and background
    pub fn pt_edges(&self, inputs: &Inputs) -> Result<Vec<f64>, PipelineError> {
        use PipelineError::*;
        let sig = inputs.mass_vs_pt_sig.y_axis();
        let bkg = inputs.mass_vs_pt_bkg.y_axis();
        if sig.nbins() != bkg.nbins() {
            return Err(PtBinCountMismatch {
                signal: sig.nbins(),
                background: bkg.nbins(),
            });
        }
        if !sig.same_binning(bkg) {
            return Err(PtEdgeMismatch);
        }
        if sig.nbins() > self.max_pt_bins {
            return Err(TooManyPtBins {
                found: sig.nbins(),
                max: self.max_pt_bins,
            });
        }
        Ok(sig.edges().to_vec())
    }

    /// Run the complete extraction
    pub fn run(&self, inputs: &Inputs) -> Result<Output, PipelineError> {
        let pt_edges = self.pt_edges(inputs)?;
        let npt = pt_edges.len() - 1;
        info!("Fitting {npt} pT bins for channel {}", self.channel);

        let efficiency = efficiency(&inputs.pt_gen, &inputs.pt_rec, &pt_edges)
            .map_err(PipelineError::Efficiency)?;

        let progress = ProgressBar::new(npt as u64, "pT bins fitted:");
        let fit = |bin| {
            let res = self.fit_bin(inputs, bin);
            progress.inc(1);
            res
        };
        #[cfg(feature = "parallel")]
        let bins: Result<Vec<_>, _> = (0..npt).into_par_iter().map(fit).collect();
        #[cfg(not(feature = "parallel"))]
        let bins: Result<Vec<_>, _> = (0..npt).map(fit).collect();
        progress.finish();
        let bins = bins?;

        let mut bkg_per_event =
            Hist1D::with_edges(BKG_PER_EVENT_NAME, BKG_PER_EVENT_TITLE, pt_edges.clone())?;
        for (bin, report) in bins.iter().enumerate() {
            bkg_per_event.set_content(bin, report.bkg_per_event);
            bkg_per_event.set_error(bin, 0.);
        }
        Ok(Output {
            pt_edges,
            efficiency,
            bkg_per_event,
            bins,
        })
    }

    /// Signal and background fits in the pT bin with index `bin`
    pub fn fit_bin(&self, inputs: &Inputs, bin: usize) -> Result<BinReport, PipelineError> {
        let pt_bin = bin + 1;
        let pt_axis = inputs.mass_vs_pt_sig.y_axis();
        let pt_range = (pt_axis.low_edge(bin), pt_axis.high_edge(bin));
        let mass_window = self.channel.mass_window();
        let mass = self.channel.resonance_mass();

        let sig = inputs
            .mass_vs_pt_sig
            .projection_x(format!("hMassSig_PtBin_{pt_bin}"), bin);
        let bkg = inputs
            .mass_vs_pt_bkg
            .projection_x(format!("hMassBkg_PtBin_{pt_bin}"), bin);
        let bin_width = bkg.axis().width(0);
        let sig = sig.restricted(mass_window.0, mass_window.1)?;
        let bkg = bkg.restricted(mass_window.0, mass_window.1)?;

        let rms = sig.rms();
        let fit_range = (
            mass - self.fit_range_nrms * rms,
            mass + self.fit_range_nrms * rms,
        );
        let signal = fit_gaussian(&sig, fit_range).map_err(|source| {
            PipelineError::SignalFit {
                pt_bin,
                pt_range,
                source,
            }
        })?;
        let window = SignalWindow::around(mass, signal.par[2], self.nsigma);
        debug!(
            "{} < pT < {}: sigma = {}, signal window [{}, {}]",
            pt_range.0, pt_range.1, signal.par[2], window.lo, window.hi
        );

        let background = self.fitter.fit(&bkg, mass_window, window).map_err(|source| {
            PipelineError::BackgroundFit {
                pt_bin,
                pt_range,
                source,
            }
        })?;
        let bkg_per_event =
            background_per_event(&background.polynomial, window, bin_width, inputs.nevents);
        debug!(
            "{} < pT < {}: pol{} background, {bkg_per_event} per event",
            pt_range.0,
            pt_range.1,
            background.degree()
        );
        Ok(BinReport {
            pt_range,
            signal,
            window,
            background,
            bkg_per_event,
        })
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to access input: {0}")]
    Input(#[from] ArchiveError),
    #[error("Signal and background histograms have different numbers of pT bins: {signal} vs. {background}")]
    PtBinCountMismatch { signal: usize, background: usize },
    #[error("Signal and background histograms have different pT bin edges")]
    PtEdgeMismatch,
    #[error("Found {found} pT bins, but at most {max} are supported")]
    TooManyPtBins { found: usize, max: usize },
    #[error("Invalid number of background events in `qa-global-observables/eventCount`: {0}")]
    NoEvents(f64),
    #[error("Failed to compute efficiency: {0}")]
    Efficiency(HistogramError),
    #[error("Histogram error: {0}")]
    Histogram(#[from] HistogramError),
    #[error("Signal fit failed in pT bin {pt_bin} ({} < pT < {}): {source}", .pt_range.0, .pt_range.1)]
    SignalFit {
        pt_bin: usize,
        pt_range: (f64, f64),
        source: FitError,
    },
    #[error("Background fit failed in pT bin {pt_bin} ({} < pT < {}): {source}", .pt_range.0, .pt_range.1)]
    BackgroundFit {
        pt_bin: usize,
        pt_range: (f64, f64),
        source: FitError,
    },
}
