mod opt_common;
mod opt_table;

use crate::opt_common::{expanded_args, log_version};
use crate::opt_table::{Conversion, Opt};

use anyhow::{Context, Result};
use bkgeff::{
    archive::Archive,
    histogram::Axis,
    table::{band, read_table, sample, Curve},
};
use clap::Parser;
use log::{debug, info};

fn main() -> Result<()> {
    let opt = Opt::parse_from(expanded_args()?);
    opt.log.init();
    log_version("bkgeff-table");
    debug!("settings: {:#?}", opt);

    let table = read_table(&opt.infile)?;
    if let Some(header) = &table.header {
        debug!("Table columns: {}", header.join(", "));
    }
    let axis = Axis::uniform(opt.nbins, opt.min, opt.max).context("Invalid binning")?;
    let mut archive = Archive::new();
    match opt.conversion {
        Conversion::Band { lo_col, hi_col } => {
            let cols = (table.index(&lo_col)?, table.index(&hi_col)?);
            let hist = band(&opt.name, &opt.title, axis, &table.rows, cols)?;
            archive.insert(opt.name.clone(), hist);
        }
        Conversion::Curve {
            x_col,
            y_col,
            two_pi_x,
        } => {
            let cols = (table.index(&x_col)?, table.index(&y_col)?);
            let curve = Curve::from_rows(&table.rows, cols)?;
            let sampled = sample(&opt.name, &opt.title, axis, &curve, two_pi_x)?;
            archive.insert(sampled.normalised.name.clone(), sampled.normalised);
            archive.insert(opt.name.clone(), sampled.hist);
        }
    }
    archive
        .write_to(&opt.outfile, opt.compression)
        .with_context(|| format!("Failed to write {:?}", opt.outfile))?;
    info!("Written {} histograms to {:?}", archive.len(), opt.outfile);
    Ok(())
}
