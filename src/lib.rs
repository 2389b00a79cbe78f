//! `bkgeff` extracts the reconstruction efficiency and the combinatorial
//! background per event for quarkonium and exotic charmonium candidates
//! from binned invariant-mass spectra.
//!
//! For each transverse-momentum bin, the signal peak is described by a
//! Gaussian and the background sidebands by a polynomial whose degree
//! is increased until the fit quality is acceptable. The background
//! under the peak is the integral of that polynomial over a window of
//! a few peak widths around the resonance mass.
//!
//! # How to use
//!
//! ```no_run
//! use bkgeff::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let signal = Archive::read_from("signal.yaml")?;
//! let background = Archive::read_from("background.yaml.zst")?;
//! let inputs = Inputs::load(Channel::JpsiToEE, &signal, &background)?;
//! let output = Pipeline::builder()
//!     .channel(Channel::JpsiToEE)
//!     .build()
//!     .run(&inputs)?;
//! ResultWriter::builder()
//!     .outdir("results")
//!     .build()
//!     .write(Channel::JpsiToEE, &output)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Most relevant modules
//!
//! - [prelude] exports a list of the most relevant classes and objects
//! - [pipeline] runs the full extraction
//! - [archive] reads and writes histogram collections
//! - [background] for the adaptive background description
//! - [toy] generates synthetic inputs
//! - [tracklet] selects muon identifier tracklets from acceptance tables

/// Histogram collections on disk
pub mod archive;
/// Adaptive background fits
pub mod background;
/// Decay channels
pub mod channel;
/// Output compression
pub mod compression;
/// Reconstruction efficiency
pub mod efficiency;
pub mod fit;
/// Binned histograms
pub mod histogram;
pub mod pipeline;
/// Most important exports
pub mod prelude;
/// Progress bar
pub mod progress_bar;
/// Signal significance estimate
pub mod significance;
pub mod table;
/// Synthetic inputs
pub mod toy;
pub mod tracklet;
/// Common traits
pub mod traits;
/// Result output
pub mod writer;

mod parsing;

use lazy_static::lazy_static;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
lazy_static! {
    pub static ref VERSION_MAJOR: u32 =
        env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap();
    pub static ref VERSION_MINOR: u32 =
        env!("CARGO_PKG_VERSION_MINOR").parse().unwrap();
    pub static ref VERSION_PATCH: u32 =
        env!("CARGO_PKG_VERSION_PATCH").parse().unwrap();
}
pub const GIT_REV: Option<&str> = option_env!("VERGEN_GIT_SHA");
pub const GIT_BRANCH: Option<&str> = option_env!("VERGEN_GIT_BRANCH");

pub const FEATURES: [&str; NFEATURES] = [
    #[cfg(feature = "parallel")]
    "parallel",
];

const NFEATURES: usize = {
    #[allow(unused_mut)]
    let mut nfeatures = 0;
    #[cfg(feature = "parallel")]
    { nfeatures += 1; }
    nfeatures
};
