use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use audec::auto_decompress;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    compression::{compress_writer, Compression},
    histogram::{Hist1D, Hist2D, HistogramError, SparseHist},
};

/// An object stored in a histogram archive
#[derive(Deserialize, Serialize)]
#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    H1(Hist1D),
    H2(Hist2D),
    Sparse(SparseHist),
}

impl Object {
    fn kind(&self) -> &'static str {
        match self {
            Object::H1(_) => "1D histogram",
            Object::H2(_) => "2D histogram",
            Object::Sparse(_) => "sparse histogram",
        }
    }

    fn validate(&self) -> Result<(), HistogramError> {
        match self {
            Object::H1(h) => h.validate(),
            Object::H2(h) => h.validate(),
            Object::Sparse(h) => h.validate(),
        }
    }
}

impl From<Hist1D> for Object {
    fn from(h: Hist1D) -> Self {
        Self::H1(h)
    }
}

impl From<Hist2D> for Object {
    fn from(h: Hist2D) -> Self {
        Self::H2(h)
    }
}

impl From<SparseHist> for Object {
    fn from(h: SparseHist) -> Self {
        Self::Sparse(h)
    }
}

/// A collection of histograms addressed by slash-separated paths
///
/// On disk, an archive is a (potentially compressed) YAML document.
#[derive(Deserialize, Serialize)]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Archive {
    objects: BTreeMap<String, Object>,
}

/// Join a directory and an object name to an archive path
pub fn path_in(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_owned()
    } else {
        format!("{dir}/{name}")
    }
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object, replacing any previous object at the same path
    pub fn insert(&mut self, path: impl Into<String>, obj: impl Into<Object>) {
        self.objects.insert(path.into(), obj.into());
    }

    pub fn get(&self, path: &str) -> Option<&Object> {
        self.objects.get(path)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over all paths and objects in lexicographic path order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Object)> {
        self.objects.iter()
    }

    /// The one-dimensional histogram at `path`
    pub fn h1(&self, path: &str) -> Result<&Hist1D, ArchiveError> {
        match self.get(path) {
            Some(Object::H1(h)) => Ok(h),
            Some(obj) => Err(ArchiveError::WrongKind {
                path: path.to_owned(),
                expected: "1D histogram",
                found: obj.kind(),
            }),
            None => Err(ArchiveError::Missing(path.to_owned())),
        }
    }

    /// The two-dimensional histogram at `path`
    pub fn h2(&self, path: &str) -> Result<&Hist2D, ArchiveError> {
        match self.get(path) {
            Some(Object::H2(h)) => Ok(h),
            Some(obj) => Err(ArchiveError::WrongKind {
                path: path.to_owned(),
                expected: "2D histogram",
                found: obj.kind(),
            }),
            None => Err(ArchiveError::Missing(path.to_owned())),
        }
    }

    /// The sparse histogram at `path`
    pub fn sparse(&self, path: &str) -> Result<&SparseHist, ArchiveError> {
        match self.get(path) {
            Some(Object::Sparse(h)) => Ok(h),
            Some(obj) => Err(ArchiveError::WrongKind {
                path: path.to_owned(),
                expected: "sparse histogram",
                found: obj.kind(),
            }),
            None => Err(ArchiveError::Missing(path.to_owned())),
        }
    }

    /// Read an archive, detecting compression automatically
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        debug!("Reading histogram archive {path:?}");
        let file = File::open(path)
            .map_err(|err| ArchiveError::Open(path.to_owned(), err))?;
        let reader = auto_decompress(BufReader::new(file));
        let archive: Archive = serde_yaml::from_reader(reader)
            .map_err(|err| ArchiveError::Parse(path.to_owned(), err))?;
        for (name, obj) in &archive.objects {
            obj.validate().map_err(|err| ArchiveError::Invalid {
                path: name.clone(),
                source: err,
            })?;
        }
        debug!("Found {} objects in {path:?}", archive.len());
        Ok(archive)
    }

    /// Write the archive, overwriting any existing file
    pub fn write_to<P: AsRef<Path>>(
        &self,
        path: P,
        compression: Option<Compression>,
    ) -> Result<(), ArchiveError> {
        let path = path.as_ref();
        debug!("Writing {} objects to {path:?}", self.len());
        let file = File::create(path)
            .map_err(|err| ArchiveError::Create(path.to_owned(), err))?;
        let mut writer = compress_writer(BufWriter::new(file), compression)
            .map_err(|err| ArchiveError::Create(path.to_owned(), err))?;
        serde_yaml::to_writer(&mut writer, self)
            .map_err(|err| ArchiveError::Serialise(path.to_owned(), err))?;
        let write_failed =
            |err: std::io::Error| ArchiveError::WriteFailed(path.to_owned(), err);
        writer
            .finish()
            .map_err(write_failed)?
            .into_inner()
            .map_err(|err| write_failed(err.into_error()))?;
        Ok(())
    }
}

impl FromIterator<(String, Object)> for Archive {
    fn from_iter<T: IntoIterator<Item = (String, Object)>>(iter: T) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to open {0:?}: {1}")]
    Open(PathBuf, std::io::Error),
    #[error("Failed to parse {0:?}: {1}")]
    Parse(PathBuf, serde_yaml::Error),
    #[error("Invalid object `{path}`: {source}")]
    Invalid {
        path: String,
        source: HistogramError,
    },
    #[error("Failed to create {0:?}: {1}")]
    Create(PathBuf, std::io::Error),
    #[error("Failed to serialise archive to {0:?}: {1}")]
    Serialise(PathBuf, serde_yaml::Error),
    #[error("Failed to write to {0:?}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("No object `{0}` in archive")]
    Missing(String),
    #[error("Object `{path}` is a {found}, expected a {expected}")]
    WrongKind {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::Axis;

    fn log_init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn sample() -> Archive {
        let mut h1 = Hist1D::with_edges("hEff", "efficiency", vec![0., 0.3, 1.7, 10.])
            .unwrap();
        h1.set_content(0, 0.1);
        h1.set_error(0, 0.01);
        h1.set_content(2, 1. / 3.);
        let mut h2 = Hist2D::new(
            "hmass",
            "",
            Axis::uniform(3, 2.6, 3.55).unwrap(),
            Axis::uniform(2, 0., 10.).unwrap(),
        );
        h2.fill_weighted(3., 7., 0.7);
        let mut archive = Archive::new();
        archive.insert("eff/hEff", h1);
        archive.insert(path_in("dir", "hmass"), h2);
        let mut acc = SparseHist::new(
            "acc",
            "",
            vec![
                Axis::uniform(2, -0.1, 0.1).unwrap(),
                Axis::uniform(3, 0., 3.).unwrap(),
            ],
        );
        acc.fill_weighted(&[0.05, 2.5], 1.);
        archive.insert("acc", acc);
        archive
    }

    #[test]
    fn lookup() {
        let archive = sample();
        assert!(archive.h1("eff/hEff").is_ok());
        assert!(archive.h2("dir/hmass").is_ok());
        assert_eq!(archive.sparse("acc").unwrap().filled_cells(), 1);
        assert!(matches!(
            archive.sparse("eff/hEff"),
            Err(ArchiveError::WrongKind { .. })
        ));
        assert!(matches!(
            archive.h1("dir/hmass"),
            Err(ArchiveError::WrongKind { .. })
        ));
        assert!(matches!(
            archive.h2("nothing"),
            Err(ArchiveError::Missing(_))
        ));
    }

    #[test]
    fn round_trip() {
        log_init();
        let dir = tempfile::tempdir().unwrap();
        let archive = sample();
        for compression in [None, Some(Compression::Gzip(6)), Some(Compression::Zstd(0))] {
            let path = dir.path().join("archive.yaml");
            archive.write_to(&path, compression).unwrap();
            let read = Archive::read_from(&path).unwrap();
            assert_eq!(read, archive);
        }
    }

    #[test]
    fn reject_inconsistent() {
        log_init();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(
            &path,
            "objects:\n  h: !H1\n    name: h\n    axis: [0.0, 1.0]\n    contents: [1.0, 2.0]\n    sumw2: [1.0]\n",
        )
        .unwrap();
        assert!(matches!(
            Archive::read_from(&path),
            Err(ArchiveError::Invalid { .. })
        ));

        std::fs::write(
            &path,
            "objects:\n  h: !H1\n    name: h\n    axis: [1.0, 0.0]\n    contents: [1.0]\n    sumw2: [1.0]\n",
        )
        .unwrap();
        assert!(matches!(
            Archive::read_from(&path),
            Err(ArchiveError::Parse(..))
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn full_device() {
        log_init();
        let archive = sample();
        for compression in [
            None,
            Some(Compression::Bzip2),
            Some(Compression::Gzip(6)),
            Some(Compression::Lz4(0)),
            Some(Compression::Zstd(0)),
        ] {
            assert!(matches!(
                archive.write_to("/dev/full", compression),
                Err(ArchiveError::WriteFailed(..))
            ));
        }
    }

    #[test]
    fn unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/archive.yaml");
        assert!(matches!(
            sample().write_to(path, None),
            Err(ArchiveError::Create(..))
        ));
    }
}
