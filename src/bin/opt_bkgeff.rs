use std::path::PathBuf;

use crate::opt_common::*;

use bkgeff::background::{
    BkgFitter, DEFAULT_MAX_DEGREE, DEFAULT_MAX_REDUCED_CHI2, DEFAULT_START_DEGREE,
};
use bkgeff::channel::Channel;
use bkgeff::compression::Compression;
use bkgeff::pipeline::MAX_PT_BINS;

use anyhow::{bail, Result};
use clap::Parser;

#[derive(Debug, Copy, Clone, Parser)]
pub(crate) struct FitOpt {
    /// Maximum chi^2/ndf accepted before the background polynomial
    /// degree is increased.
    #[clap(long, default_value_t = DEFAULT_MAX_REDUCED_CHI2)]
    pub(crate) max_chi2: f64,

    /// Initial degree of the background polynomial.
    #[clap(long, default_value_t = DEFAULT_START_DEGREE)]
    pub(crate) start_degree: usize,

    /// Maximum degree of the background polynomial.
    #[clap(long, default_value_t = DEFAULT_MAX_DEGREE)]
    pub(crate) max_degree: usize,

    /// Half width of the signal window in units of the fitted peak width.
    #[clap(long, default_value_t = 3.)]
    pub(crate) nsigma: f64,

    /// Half width of the signal fit range in units of the peak RMS.
    #[clap(long, default_value_t = 5.)]
    pub(crate) fit_range: f64,

    /// Maximum number of pT bins.
    #[clap(long, default_value_t = MAX_PT_BINS)]
    pub(crate) max_pt_bins: usize,
}

impl From<FitOpt> for BkgFitter {
    fn from(opt: FitOpt) -> Self {
        Self {
            start_degree: opt.start_degree,
            max_degree: opt.max_degree,
            max_reduced_chi2: opt.max_chi2,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(about, author, version)]
pub(crate) struct Opt {
    /// Decay channel.
    ///
    /// One of 'jpsi-to-ee', 'jpsi-to-mumu', 'x-to-pipiee', 'x-to-pipimumu'.
    #[clap(short, long)]
    pub(crate) channel: Channel,

    /// Histogram archive from the signal Monte Carlo sample.
    #[clap(long, value_parser)]
    pub(crate) signal: PathBuf,

    /// Histogram archive from the background sample.
    #[clap(long, value_parser)]
    pub(crate) background: PathBuf,

    /// Output directory.
    #[clap(long, short, value_parser, default_value = ".")]
    pub(crate) outdir: PathBuf,

    #[clap(flatten)]
    pub(crate) fit: FitOpt,

    #[clap(long, value_parser = parse_compr,
                help = "Compress output files.
Possible settings are 'bzip2', 'gzip', 'zstd', 'lz4'.
Compression levels can be set with algorithm_level e.g. 'zstd_5'.
Maximum levels are 'gzip_9', 'zstd_19', 'lz4_16'.")]
    pub(crate) compression: Option<Compression>,

    #[clap(flatten)]
    pub(crate) log: LogOpt,

    #[clap(
        short,
        long,
        default_value_t,
        help = "Number of threads.

If set to 0, a default number of threads is chosen.
The default can be set with the `RAYON_NUM_THREADS` environment
variable."
    )]
    pub(crate) threads: usize,
}

impl Opt {
    pub(crate) fn validate(self) -> Result<Self> {
        let fit = &self.fit;
        if fit.start_degree > fit.max_degree {
            bail!(
                "Initial polynomial degree {} exceeds maximum degree {}",
                fit.start_degree,
                fit.max_degree
            );
        }
        for (name, val) in [
            ("--max-chi2", fit.max_chi2),
            ("--nsigma", fit.nsigma),
            ("--fit-range", fit.fit_range),
        ] {
            if !(val > 0.) {
                bail!("{name} has to be positive, got {val}");
            }
        }
        Ok(self)
    }
}
