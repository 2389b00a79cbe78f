mod opt_common;
mod opt_toy;

use crate::opt_common::{expanded_args, log_version};
use crate::opt_toy::Opt;

use anyhow::{Context, Result};
use bkgeff::{toy::ToyConfigBuilder, writer::output_name};
use clap::Parser;
use log::{debug, info};

fn main() -> Result<()> {
    let opt = Opt::parse_from(expanded_args()?);
    opt.log.init();
    log_version("bkgeff-toy");
    debug!("settings: {:#?}", opt);

    let toy = ToyConfigBuilder::default()
        .channel(opt.channel)
        .pt_edges(opt.pt_edges)
        .mass_bins(opt.mass_bins)
        .sigma(opt.sigma)
        .signal_yield(opt.signal_yield)
        .bkg_level(opt.bkg_level)
        .efficiency(opt.efficiency)
        .generated(opt.generated)
        .fine_bins(opt.fine_bins)
        .nevents(opt.nevents)
        .fluctuate(opt.fluctuate)
        .seed(opt.seed)
        .build()?
        .generate()?;

    std::fs::create_dir_all(&opt.outdir)
        .with_context(|| format!("Failed to create output directory {:?}", opt.outdir))?;
    let label = opt.channel.label();
    for (stem, archive) in [("signal", &toy.signal), ("background", &toy.background)] {
        let path = opt.outdir.join(output_name(stem, label, opt.compression));
        archive
            .write_to(&path, opt.compression)
            .with_context(|| format!("Failed to write {path:?}"))?;
        info!("Written {stem} archive to {path:?}");
    }
    Ok(())
}
