mod opt_bkgeff;
mod opt_common;

use crate::opt_bkgeff::Opt;
use crate::opt_common::{expanded_args, log_version};

use anyhow::{Context, Result};
use bkgeff::prelude::*;
use clap::Parser;
use itertools::Itertools;
use log::{debug, info};

fn main() -> Result<()> {
    let opt = Opt::parse_from(expanded_args()?).validate()?;
    opt.log.init();

    #[cfg(feature = "parallel")]
    rayon::ThreadPoolBuilder::new()
        .num_threads(opt.threads)
        .build_global()?;

    log_version("bkgeff");
    debug!("settings: {:#?}", opt);

    let signal = Archive::read_from(&opt.signal)
        .with_context(|| format!("Failed to read signal archive {:?}", opt.signal))?;
    let background = Archive::read_from(&opt.background).with_context(|| {
        format!("Failed to read background archive {:?}", opt.background)
    })?;
    let inputs = Inputs::load(opt.channel, &signal, &background)?;

    let pipeline = Pipeline::builder()
        .channel(opt.channel)
        .fitter(opt.fit.into())
        .nsigma(opt.fit.nsigma)
        .fit_range_nrms(opt.fit.fit_range)
        .max_pt_bins(opt.fit.max_pt_bins)
        .build();
    let output = pipeline.run(&inputs)?;

    for report in &output.bins {
        let (lo, hi) = report.pt_range;
        let degrees = report.background.steps.iter().map(|s| s.degree).join(" -> ");
        info!(
            "{lo} < pT < {hi}: sigma = {:.4}, background pol {degrees}, {:.4e} per event",
            report.signal.par[2], report.bkg_per_event
        );
    }

    std::fs::create_dir_all(&opt.outdir)
        .with_context(|| format!("Failed to create output directory {:?}", opt.outdir))?;
    let writer = ResultWriter::builder()
        .outdir(opt.outdir)
        .compression(opt.compression)
        .build();
    let files = writer.write(opt.channel, &output)?;
    info!(
        "Written results to {:?} and {:?}",
        files.efficiency, files.bkg_per_event
    );
    info!("done");
    Ok(())
}
