use std::path::PathBuf;

use crate::opt_common::*;

use bkgeff::compression::Compression;
use bkgeff::efficiency::EFFICIENCY_NAME;
use bkgeff::pipeline::BKG_PER_EVENT_NAME;

use clap::Parser;

#[derive(Debug, Parser)]
#[clap(about = "Estimate the signal significance per pT bin", author, version)]
pub(crate) struct Opt {
    /// Archive with the reconstruction efficiency.
    #[clap(long, value_parser)]
    pub(crate) efficiency: PathBuf,

    /// Path of the efficiency histogram inside its archive.
    #[clap(long, default_value = EFFICIENCY_NAME)]
    pub(crate) efficiency_hist: String,

    /// Archive with the background per event.
    #[clap(long, value_parser)]
    pub(crate) background: PathBuf,

    /// Path of the background histogram inside its archive.
    #[clap(long, default_value = BKG_PER_EVENT_NAME)]
    pub(crate) background_hist: String,

    /// Archive with the differential signal yield dN/dpT per event.
    #[clap(long = "yield", value_parser)]
    pub(crate) yield_file: PathBuf,

    /// Path of the dN/dpT histogram inside its archive.
    #[clap(long)]
    pub(crate) yield_hist: String,

    /// Factor applied to the signal yield, e.g. branching ratio times
    /// rapidity range.
    #[clap(long, default_value_t = 1.)]
    pub(crate) yield_scale: f64,

    /// Archive with the nuclear modification factor.
    ///
    /// The histogram has to have the same binning as dN/dpT.
    #[clap(long, value_parser, requires = "raa_hist")]
    pub(crate) raa: Option<PathBuf>,

    /// Path of the nuclear modification factor inside its archive.
    #[clap(long, requires = "raa")]
    pub(crate) raa_hist: Option<String>,

    /// Number of events in the full sample.
    #[clap(short, long)]
    pub(crate) nevents: f64,

    /// Output file.
    #[clap(long, short, value_parser)]
    pub(crate) outfile: PathBuf,

    #[clap(long, value_parser = parse_compr,
                help = "Compress output file.
Possible settings are 'bzip2', 'gzip', 'zstd', 'lz4'.
Compression levels can be set with algorithm_level e.g. 'zstd_5'.
Maximum levels are 'gzip_9', 'zstd_19', 'lz4_16'.")]
    pub(crate) compression: Option<Compression>,

    #[clap(flatten)]
    pub(crate) log: LogOpt,
}
