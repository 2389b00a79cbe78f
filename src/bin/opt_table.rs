use std::path::PathBuf;

use crate::opt_common::*;

use bkgeff::compression::Compression;
use bkgeff::table::Column;

use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Subcommand)]
pub(crate) enum Conversion {
    /// Central values and errors from lower and upper limits.
    ///
    /// Row i of the table fills bin i.
    Band {
        /// Column with the lower limit, by name or index counting from zero.
        #[clap(long, default_value_t = Column::Index(1))]
        lo_col: Column,
        /// Column with the upper limit, by name or index counting from zero.
        #[clap(long, default_value_t = Column::Index(2))]
        hi_col: Column,
    },
    /// Linear interpolation of a curve at the bin centres.
    ///
    /// A normalised copy with suffix '_norm' is written as well.
    Curve {
        /// Column with the x values, by name or index counting from zero.
        ///
        /// Names refer to the header in the first line of the table,
        /// e.g. 'pt' for a CSV file starting with 'pt,cross'.
        #[clap(long, default_value_t = Column::Index(0))]
        x_col: Column,
        /// Column with the y values, by name or index counting from zero.
        #[clap(long, default_value_t = Column::Index(1))]
        y_col: Column,
        /// Multiply the interpolated values by 2πx.
        #[clap(long)]
        two_pi_x: bool,
    },
}

#[derive(Debug, Parser)]
#[clap(about = "Convert theory tables into histograms", author, version)]
pub(crate) struct Opt {
    /// Name of the output histogram.
    #[clap(long)]
    pub(crate) name: String,

    /// Title of the output histogram.
    #[clap(long, default_value = "")]
    pub(crate) title: String,

    /// Number of bins.
    #[clap(long)]
    pub(crate) nbins: usize,

    /// Lower edge of the first bin.
    #[clap(long)]
    pub(crate) min: f64,

    /// Upper edge of the last bin.
    #[clap(long)]
    pub(crate) max: f64,

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

    /// Input table.
    #[clap(name = "INFILE", value_parser)]
    pub(crate) infile: PathBuf,

    #[clap(subcommand)]
    pub(crate) conversion: Conversion,
}
