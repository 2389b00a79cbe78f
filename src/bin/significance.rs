mod opt_common;
mod opt_significance;

use std::path::Path;

use crate::opt_common::{expanded_args, log_version};
use crate::opt_significance::Opt;

use anyhow::{Context, Result};
use bkgeff::{
    archive::Archive,
    histogram::Hist1D,
    significance::{significance, SignalYield},
};
use clap::Parser;
use log::{debug, info};

fn load(file: &Path, path: &str) -> Result<Hist1D> {
    let archive = Archive::read_from(file)
        .with_context(|| format!("Failed to read archive {file:?}"))?;
    let hist = archive
        .h1(path)
        .with_context(|| format!("Failed to access histogram in {file:?}"))?;
    Ok(hist.clone())
}

fn main() -> Result<()> {
    let opt = Opt::parse_from(expanded_args()?);
    opt.log.init();
    log_version("bkgeff-significance");
    debug!("settings: {:#?}", opt);

    let efficiency = load(&opt.efficiency, &opt.efficiency_hist)?;
    let bkg_per_event = load(&opt.background, &opt.background_hist)?;
    let dn_dpt = load(&opt.yield_file, &opt.yield_hist)?;
    let raa = match (&opt.raa, &opt.raa_hist) {
        (Some(file), Some(path)) => Some(load(file, path)?),
        _ => None,
    };
    let signal_yield = SignalYield {
        dn_dpt: &dn_dpt,
        raa: raa.as_ref(),
        scale: opt.yield_scale,
    };

    let res = significance(&efficiency, &bkg_per_event, signal_yield, opt.nevents)?;
    for bin in 0..res.significance.nbins() {
        let axis = res.significance.axis();
        info!(
            "{} < pT < {}: significance {:.3}, S/B {:.3e}",
            axis.low_edge(bin),
            axis.high_edge(bin),
            res.significance.content(bin),
            res.sig_over_bkg.content(bin)
        );
    }
    res.into_archive()
        .write_to(&opt.outfile, opt.compression)
        .with_context(|| format!("Failed to write {:?}", opt.outfile))?;
    info!("done");
    Ok(())
}
