//! Acceptance of tracklets in the muon identifier
//!
//! A tracklet consists of hits in the two identifier layers. Whether
//! it is compatible with a muon is looked up in acceptance tables
//! binned in the pseudorapidity difference Δη and the azimuthal
//! difference Δφ between the two hits, the pseudorapidity η and the
//! momentum p of the muon, in this order.
use std::{f64::consts::PI, path::Path};

use log::{debug, info};
use nalgebra::Vector3;
use thiserror::Error;

use crate::{
    archive::{Archive, ArchiveError},
    histogram::{HistogramError, SparseHist},
};

pub const ACCEPTANCE_MU_MINUS: &str = "trackletAcceptanceMuMinus";
pub const ACCEPTANCE_MU_PLUS: &str = "trackletAcceptanceMuPlus";
pub const ACCEPTANCE_ALL: &str = "trackletAcceptanceAllMuons";

/// Maximum (η, φ) distance between the inner track and the first hit
pub const MATCHING_CONE: f64 = 0.2;
/// Maximum |Δη| and |Δφ| of [in_delta_window]
pub const DELTA_WINDOW: f64 = 0.06;

const ACCEPTANCE_DIMS: usize = 4;
const AXIS_ETA: usize = 2;
const AXIS_MOMENTUM: usize = 3;

/// Pseudorapidity of the direction of `v`
///
/// Vectors along the beam axis get a pseudorapidity of ±10¹⁰.
pub fn eta(v: &Vector3<f64>) -> f64 {
    let rho = v.xy().norm();
    if rho > 0. {
        (v.z / rho).asinh()
    } else if v.z == 0. {
        0.
    } else {
        v.z.signum() * 1e10
    }
}

/// Azimuthal angle of `v` in [-π, π]
pub fn phi(v: &Vector3<f64>) -> f64 {
    v.y.atan2(v.x)
}

/// Azimuthal angle of `a` relative to `b`, in [-π, π)
pub fn delta_phi(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (phi(a) - phi(b) + PI).rem_euclid(2. * PI) - PI
}

/// Fixed window in the unwrapped differences of η and φ between the hits
pub fn in_delta_window(hit1: &Vector3<f64>, hit2: &Vector3<f64>) -> bool {
    let dphi = phi(hit1) - phi(hit2);
    let deta = eta(hit1) - eta(hit2);
    dphi.abs() <= DELTA_WINDOW && deta.abs() <= DELTA_WINDOW
}

/// Charge hypothesis of the muon
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Charge {
    Minus,
    Plus,
    /// Either sign
    #[default]
    Any,
}

impl From<i32> for Charge {
    fn from(charge: i32) -> Self {
        match charge.signum() {
            1 => Charge::Plus,
            -1 => Charge::Minus,
            _ => Charge::Any,
        }
    }
}

/// Tracklet selection based on acceptance tables
#[derive(Clone, Debug, PartialEq)]
pub struct TrackletSelector {
    mu_minus: SparseHist,
    mu_plus: SparseHist,
    all: SparseHist,
    /// (Δη, Δφ, η)
    acceptance_3d: SparseHist,
    /// (Δη, Δφ)
    acceptance_2d: SparseHist,
    eta_max: f64,
    mom_min: f64,
    mom_max: f64,
}

impl TrackletSelector {
    /// Set up from the acceptance tables for both charges
    ///
    /// The tables for negative and positive muons are stored under
    /// [ACCEPTANCE_MU_MINUS] and [ACCEPTANCE_MU_PLUS].
    pub fn from_archive(archive: &Archive) -> Result<Self, TrackletError> {
        let mu_minus = acceptance(archive, ACCEPTANCE_MU_MINUS)?;
        let mu_plus = acceptance(archive, ACCEPTANCE_MU_PLUS)?;
        let mut all = mu_minus.clone();
        all.name = ACCEPTANCE_ALL.to_owned();
        all.add(&mu_plus)?;

        let acceptance_3d = all.projection("trackletAcceptance3D", &[0, 1, AXIS_ETA])?;
        let acceptance_2d = all.projection("trackletAcceptance2D", &[0, 1])?;
        let eta_max = all.axis(AXIS_ETA).max();
        let momentum = all.axis(AXIS_MOMENTUM);
        let (mom_min, mom_max) = (momentum.min(), momentum.max());
        debug!(
            "Tracklet acceptance: |eta| <= {eta_max}, {mom_min} <= p <= {mom_max}, {} filled cells",
            all.filled_cells()
        );
        Ok(Self {
            mu_minus,
            mu_plus,
            all,
            acceptance_3d,
            acceptance_2d,
            eta_max,
            mom_min,
            mom_max,
        })
    }

    /// Set up from an archive file
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, TrackletError> {
        let path = path.as_ref();
        let selector = Self::from_archive(&Archive::read_from(path)?)?;
        info!("Set up tracklet selector from {path:?}");
        Ok(selector)
    }

    pub fn eta_max(&self) -> f64 {
        self.eta_max
    }

    /// Selection using only the two hits
    pub fn select(&self, hit1: &Vector3<f64>, hit2: &Vector3<f64>) -> bool {
        let (deta, dphi) = differences(hit1, hit2);
        self.acceptance_2d.content_at(&[deta, dphi]) > 0.
    }

    /// Selection using the two hits and the pseudorapidity of the first hit
    pub fn select_with_eta(&self, hit1: &Vector3<f64>, hit2: &Vector3<f64>) -> bool {
        let eta = eta(hit1);
        if eta.abs() > self.eta_max {
            return false;
        }
        let (deta, dphi) = differences(hit1, hit2);
        self.acceptance_3d.content_at(&[deta, dphi, eta]) > 0.
    }

    /// Selection using the two hits and the momentum of the inner track
    ///
    /// Momenta outside the table range are moved to its first or last bin.
    pub fn select_with_track(
        &self,
        hit1: &Vector3<f64>,
        hit2: &Vector3<f64>,
        track: &Vector3<f64>,
        charge: Charge,
    ) -> bool {
        let eta = eta(track);
        if eta.abs() > self.eta_max {
            return false;
        }
        let table = match charge {
            Charge::Minus => &self.mu_minus,
            Charge::Plus => &self.mu_plus,
            Charge::Any => &self.all,
        };
        let momentum = table.axis(AXIS_MOMENTUM);
        let mom = track.norm().clamp(self.mom_min, self.mom_max);
        let mom = if mom >= self.mom_max {
            momentum.centre(momentum.nbins() - 1)
        } else {
            mom
        };
        let (deta, dphi) = differences(hit1, hit2);
        table.content_at(&[deta, dphi, eta, mom]) > 0.
    }

    /// Like [TrackletSelector::select_with_track], requiring in addition
    /// that the inner track crosses its first layer at `track_hit` within
    /// [MATCHING_CONE] of the first tracklet hit
    pub fn select_matched(
        &self,
        hit1: &Vector3<f64>,
        hit2: &Vector3<f64>,
        track: &Vector3<f64>,
        track_hit: &Vector3<f64>,
        charge: Charge,
    ) -> bool {
        let (deta, dphi) = differences(track_hit, hit1);
        if deta.hypot(dphi) > MATCHING_CONE {
            return false;
        }
        self.select_with_track(hit1, hit2, track, charge)
    }
}

fn differences(a: &Vector3<f64>, b: &Vector3<f64>) -> (f64, f64) {
    (eta(a) - eta(b), delta_phi(a, b))
}

fn acceptance(archive: &Archive, path: &str) -> Result<SparseHist, TrackletError> {
    let table = archive.sparse(path)?;
    if table.ndim() != ACCEPTANCE_DIMS {
        return Err(TrackletError::Dimension {
            path: path.to_owned(),
            found: table.ndim(),
        });
    }
    Ok(table.clone())
}

#[derive(Debug, Error)]
pub enum TrackletError {
    #[error("Failed to access acceptance table: {0}")]
    Archive(#[from] ArchiveError),
    #[error("Acceptance table `{path}` has {found} dimensions, expected 4")]
    Dimension { path: String, found: usize },
    #[error("Inconsistent acceptance tables: {0}")]
    Histogram(#[from] HistogramError),
}
