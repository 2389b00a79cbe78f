use std::path::PathBuf;

use crate::opt_common::*;

use bkgeff::channel::Channel;
use bkgeff::compression::Compression;

use clap::Parser;

#[derive(Debug, Parser)]
#[clap(about = "Generate synthetic signal and background archives", author, version)]
pub(crate) struct Opt {
    /// Decay channel.
    ///
    /// One of 'jpsi-to-ee', 'jpsi-to-mumu', 'x-to-pipiee', 'x-to-pipimumu'.
    #[clap(short, long)]
    pub(crate) channel: Channel,

    /// Comma-separated pT bin edges in GeV.
    #[clap(long, value_delimiter = ',', default_value = "0,2,4,6,8,10")]
    pub(crate) pt_edges: Vec<f64>,

    /// Number of bins in the invariant mass window.
    #[clap(long, default_value_t = 95)]
    pub(crate) mass_bins: usize,

    /// Width of the signal peak in GeV.
    #[clap(long, default_value_t = 0.02)]
    pub(crate) sigma: f64,

    /// Signal candidates per pT bin.
    #[clap(long, default_value_t = 1e4)]
    pub(crate) signal_yield: f64,

    /// Background candidates per mass bin and pT bin.
    #[clap(long, default_value_t = 100.)]
    pub(crate) bkg_level: f64,

    /// Comma-separated reconstruction efficiencies.
    ///
    /// Either one value per pT bin or a single value for all bins.
    #[clap(long, value_delimiter = ',', default_value = "0.5")]
    pub(crate) efficiency: Vec<f64>,

    /// Generated candidates per pT bin.
    #[clap(long, default_value_t = 1e5)]
    pub(crate) generated: f64,

    /// Number of pT spectrum bins per analysis pT bin.
    #[clap(long, default_value_t = 4)]
    pub(crate) fine_bins: usize,

    /// Number of background events.
    #[clap(short, long, default_value_t = 1e6)]
    pub(crate) nevents: f64,

    /// Draw random fluctuations instead of writing expected values.
    #[clap(long)]
    pub(crate) fluctuate: bool,

    /// Random number generator seed.
    #[clap(long, default_value_t = 0)]
    pub(crate) seed: u64,

    /// Output directory.
    #[clap(long, short, value_parser, default_value = ".")]
    pub(crate) outdir: PathBuf,

    #[clap(long, value_parser = parse_compr,
                help = "Compress output files.
Possible settings are 'bzip2', 'gzip', 'zstd', 'lz4'.
Compression levels can be set with algorithm_level e.g. 'zstd_5'.
Maximum levels are 'gzip_9', 'zstd_19', 'lz4_16'.")]
    pub(crate) compression: Option<Compression>,

    #[clap(flatten)]
    pub(crate) log: LogOpt,
}
