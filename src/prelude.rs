pub use crate::{
    archive::{Archive, ArchiveError},
    background::{BkgFitter, SignalWindow},
    channel::Channel,
    compression::Compression,
    histogram::{Axis, Hist1D, Hist2D, SparseHist},
    pipeline::{Inputs, Output, Pipeline, PipelineError},
    tracklet::TrackletSelector,
    writer::ResultWriter,
};
