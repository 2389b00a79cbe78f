use strum::{Display, EnumIter, EnumString};

/// J/ψ mass in GeV
pub const JPSI_MASS: f64 = 3.0969;
/// χc1(3872) mass in GeV
pub const X3872_MASS: f64 = 3.872;

/// Decay channels with their histogram naming conventions
#[derive(
    Copy, Clone, Debug, Display, EnumIter, EnumString, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Channel {
    #[strum(serialize = "jpsi-to-ee")]
    JpsiToEE,
    #[strum(serialize = "jpsi-to-mumu")]
    JpsiToMuMu,
    #[strum(serialize = "x-to-pipiee")]
    XToPiPiEE,
    #[strum(serialize = "x-to-pipimumu")]
    XToPiPiMuMu,
}

impl Channel {
    /// Short label used in directory and output file names
    pub fn label(&self) -> &'static str {
        match self {
            Channel::JpsiToEE => "jpsi",
            Channel::JpsiToMuMu => "jpsiToMuMu",
            Channel::XToPiPiEE => "x",
            Channel::XToPiPiMuMu => "xToPiPiMuMu",
        }
    }

    /// Directory holding the histograms in the signal Monte Carlo archive
    pub fn signal_dir(&self) -> String {
        format!("hf-task-{}-mc", self.label())
    }

    /// Directory holding the histograms in the background archive
    pub fn background_dir(&self) -> String {
        format!("hf-task-{}", self.label())
    }

    /// Name of the signal mass-vs-pT histogram
    pub fn signal_hist(&self) -> &'static str {
        match self {
            Channel::JpsiToEE => "hmassSig",
            _ => "hMassRecSig",
        }
    }

    /// Name of the background mass-vs-pT histogram
    pub fn background_hist(&self) -> &'static str {
        match self {
            Channel::JpsiToEE => "hmass",
            Channel::XToPiPiEE => "hMass",
            Channel::JpsiToMuMu | Channel::XToPiPiMuMu => "hMassRecBkg",
        }
    }

    /// Invariant mass window in GeV
    pub fn mass_window(&self) -> (f64, f64) {
        match self {
            Channel::JpsiToEE | Channel::JpsiToMuMu => (2.60, 3.55),
            Channel::XToPiPiEE | Channel::XToPiPiMuMu => (3.60, 4.10),
        }
    }

    /// Nominal mass of the resonance in GeV
    pub fn resonance_mass(&self) -> f64 {
        match self {
            Channel::JpsiToEE | Channel::JpsiToMuMu => JPSI_MASS,
            Channel::XToPiPiEE | Channel::XToPiPiMuMu => X3872_MASS,
        }
    }
}
