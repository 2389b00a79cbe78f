use std::path::{Path, PathBuf};

use log::info;
use typed_builder::TypedBuilder;

use crate::{
    archive::{Archive, ArchiveError},
    channel::Channel,
    compression::Compression,
    histogram::Hist1D,
    pipeline::Output,
};

pub const EFFICIENCY_STEM: &str = "efficiency";
pub const BKG_PER_EVENT_STEM: &str = "bkgPerEvents";

/// File name `<stem>_<label>.yaml`, with a suffix for the compression
pub fn output_name(stem: &str, label: &str, compression: Option<Compression>) -> String {
    match compression {
        Some(c) => format!("{stem}_{label}.yaml.{}", c.extension()),
        None => format!("{stem}_{label}.yaml"),
    }
}

/// Paths of the written result archives
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFiles {
    pub efficiency: PathBuf,
    pub bkg_per_event: PathBuf,
}

/// Writes pipeline results into an output directory
#[derive(Clone, Debug, TypedBuilder)]
pub struct ResultWriter {
    #[builder(default, setter(into))]
    outdir: PathBuf,
    #[builder(default)]
    compression: Option<Compression>,
}

impl ResultWriter {
    /// Write one archive for the efficiency and one for the background per event
    pub fn write(&self, channel: Channel, output: &Output) -> Result<OutputFiles, ArchiveError> {
        let label = channel.label();
        let efficiency = self.outdir.join(output_name(EFFICIENCY_STEM, label, self.compression));
        self.write_single(&efficiency, &output.efficiency)?;
        let bkg_per_event = self
            .outdir
            .join(output_name(BKG_PER_EVENT_STEM, label, self.compression));
        self.write_single(&bkg_per_event, &output.bkg_per_event)?;
        Ok(OutputFiles {
            efficiency,
            bkg_per_event,
        })
    }

    /// Write an archive containing only `hist`, stored under its name
    pub fn write_single(&self, path: &Path, hist: &Hist1D) -> Result<(), ArchiveError> {
        let mut archive = Archive::new();
        archive.insert(hist.name.clone(), hist.clone());
        archive.write_to(path, self.compression)?;
        info!("Written {} to {path:?}", hist.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(output_name("efficiency", "jpsi", None), "efficiency_jpsi.yaml");
        assert_eq!(
            output_name("bkgPerEvents", "x", Some(Compression::Zstd(3))),
            "bkgPerEvents_x.yaml.zst"
        );
    }

    #[test]
    fn single_object() {
        let dir = tempfile::tempdir().unwrap();
        let mut hist = Hist1D::with_edges("hBkgPerEvent", "", vec![0., 1., 5.]).unwrap();
        hist.set_content(1, 0.25);
        let writer = ResultWriter::builder()
            .outdir(dir.path())
            .compression(Some(Compression::Gzip(6)))
            .build();
        let path = dir.path().join("out.yaml.gz");
        writer.write_single(&path, &hist).unwrap();

        let archive = Archive::read_from(&path).unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.h1("hBkgPerEvent").unwrap(), &hist);
    }

    #[test]
    fn missing_outdir() {
        let dir = tempfile::tempdir().unwrap();
        let hist = Hist1D::with_edges("h", "", vec![0., 1.]).unwrap();
        let writer = ResultWriter::builder().build();
        let path = dir.path().join("no").join("such").join("dir.yaml");
        assert!(matches!(
            writer.write_single(&path, &hist),
            Err(ArchiveError::Create(..))
        ));
    }
}
