use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// relative tolerance when comparing bin edges
const EDGE_TOLERANCE: f64 = 1e-9;

/// A binned axis defined by its bin edges
///
/// Bin `i` covers the half-open interval `[edges[i], edges[i + 1])`.
/// Values outside the axis range are not assigned to any bin.
#[derive(Deserialize, Serialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    edges: Vec<f64>,
}

impl Axis {
    /// Construct an axis from strictly increasing bin edges
    pub fn new(edges: Vec<f64>) -> Result<Self, HistogramError> {
        use HistogramError::*;
        if edges.len() < 2 {
            return Err(TooFewEdges(edges.len()));
        }
        if let Some(bad) = edges.iter().position(|e| !e.is_finite()) {
            return Err(NonFiniteEdge(bad));
        }
        if let Some(pos) = edges.windows(2).position(|e| e[0] >= e[1]) {
            return Err(UnorderedEdges(pos + 1));
        }
        Ok(Self { edges })
    }

    /// Axis with `nbins` bins of equal width between `min` and `max`
    pub fn uniform(nbins: usize, min: f64, max: f64) -> Result<Self, HistogramError> {
        let width = (max - min) / nbins as f64;
        let edges = (0..=nbins).map(|i| min + i as f64 * width).collect();
        Self::new(edges)
    }

    pub fn nbins(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn min(&self) -> f64 {
        self.edges[0]
    }

    pub fn max(&self) -> f64 {
        self.edges[self.nbins()]
    }

    pub fn low_edge(&self, bin: usize) -> f64 {
        self.edges[bin]
    }

    pub fn high_edge(&self, bin: usize) -> f64 {
        self.edges[bin + 1]
    }

    pub fn width(&self, bin: usize) -> f64 {
        self.edges[bin + 1] - self.edges[bin]
    }

    pub fn centre(&self, bin: usize) -> f64 {
        0.5 * (self.edges[bin] + self.edges[bin + 1])
    }

    /// Index of the bin containing `x`
    ///
    /// Returns `None` for underflow and overflow.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        let idx = self.edges.partition_point(|e| *e <= x);
        if idx == 0 || idx > self.nbins() {
            None
        } else {
            Some(idx - 1)
        }
    }

    /// Whether both axes have the same edges up to rounding
    pub fn same_binning(&self, other: &Axis) -> bool {
        self.nbins() == other.nbins()
            && self
                .edges
                .iter()
                .zip(other.edges.iter())
                .all(|(a, b)| edges_match(*a, *b))
    }

    /// Index of the edge that coincides with `x`
    fn edge_index(&self, x: f64) -> Option<usize> {
        let idx = self.edges.partition_point(|e| *e < x);
        [idx.checked_sub(1), Some(idx)]
            .into_iter()
            .flatten()
            .filter(|&i| i < self.edges.len())
            .find(|&i| edges_match(self.edges[i], x))
    }
}

fn edges_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= EDGE_TOLERANCE * a.abs().max(b.abs()).max(1.)
}

impl TryFrom<Vec<f64>> for Axis {
    type Error = HistogramError;

    fn try_from(edges: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(edges)
    }
}

impl From<Axis> for Vec<f64> {
    fn from(axis: Axis) -> Self {
        axis.edges
    }
}

/// One-dimensional histogram with per-bin variance
///
/// `sumw2` holds the sum of squared weights, so the statistical
/// error of a bin is its square root.
#[derive(Deserialize, Serialize)]
#[derive(Clone, Debug, PartialEq)]
pub struct Hist1D {
    pub name: String,
    #[serde(default)]
    pub title: String,
    axis: Axis,
    contents: Vec<f64>,
    sumw2: Vec<f64>,
    #[serde(default)]
    entries: f64,
}

impl Hist1D {
    /// Empty histogram over the given axis
    pub fn new(name: impl Into<String>, title: impl Into<String>, axis: Axis) -> Self {
        let nbins = axis.nbins();
        Self {
            name: name.into(),
            title: title.into(),
            axis,
            contents: vec![0.; nbins],
            sumw2: vec![0.; nbins],
            entries: 0.,
        }
    }

    /// Empty histogram with the given bin edges
    pub fn with_edges(
        name: impl Into<String>,
        title: impl Into<String>,
        edges: Vec<f64>,
    ) -> Result<Self, HistogramError> {
        Ok(Self::new(name, title, Axis::new(edges)?))
    }

    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    pub fn nbins(&self) -> usize {
        self.axis.nbins()
    }

    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    pub fn content(&self, bin: usize) -> f64 {
        self.contents[bin]
    }

    pub fn variance(&self, bin: usize) -> f64 {
        self.sumw2[bin]
    }

    pub fn error(&self, bin: usize) -> f64 {
        self.sumw2[bin].sqrt()
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    pub fn set_content(&mut self, bin: usize, content: f64) {
        self.contents[bin] = content;
    }

    pub fn set_error(&mut self, bin: usize, error: f64) {
        self.sumw2[bin] = error * error;
    }

    /// Add a unit-weight entry at `x`
    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.)
    }

    /// Add an entry with weight `w` at `x`
    ///
    /// Entries outside the axis range are counted but not stored.
    pub fn fill_weighted(&mut self, x: f64, w: f64) {
        self.entries += 1.;
        if let Some(bin) = self.axis.find_bin(x) {
            self.contents[bin] += w;
            self.sumw2[bin] += w * w;
        }
    }

    /// Sum of all bin contents
    pub fn integral(&self) -> f64 {
        self.contents.iter().sum()
    }

    /// Copy restricted to the bins whose centre lies in `[min, max]`
    pub fn restricted(&self, min: f64, max: f64) -> Result<Self, HistogramError> {
        let bins: Vec<_> = (0..self.nbins())
            .filter(|&i| (min..=max).contains(&self.axis.centre(i)))
            .collect();
        let (Some(&first), Some(&last)) = (bins.first(), bins.last()) else {
            return Err(HistogramError::EmptyRange(min, max));
        };
        let axis = Axis::new(self.axis.edges[first..=last + 1].to_vec())?;
        Ok(Self {
            name: self.name.clone(),
            title: self.title.clone(),
            axis,
            contents: self.contents[first..=last].to_vec(),
            sumw2: self.sumw2[first..=last].to_vec(),
            entries: self.contents[first..=last].iter().sum(),
        })
    }

    /// Mean of the bin centres weighted with the bin contents
    pub fn mean(&self) -> f64 {
        let sum = self.integral();
        if sum == 0. {
            return 0.;
        }
        self.contents
            .iter()
            .enumerate()
            .map(|(i, c)| c * self.axis.centre(i))
            .sum::<f64>()
            / sum
    }

    /// Standard deviation of the bin centres weighted with the bin contents
    pub fn rms(&self) -> f64 {
        let sum = self.integral();
        if sum == 0. {
            return 0.;
        }
        let mean = self.mean();
        let var = self
            .contents
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let d = self.axis.centre(i) - mean;
                c * d * d
            })
            .sum::<f64>()
            / sum;
        var.max(0.).sqrt()
    }

    /// Merge bins onto new bin edges
    ///
    /// Every new edge has to coincide with an existing edge. Bins
    /// outside the new range are dropped.
    pub fn rebinned(
        &self,
        name: impl Into<String>,
        edges: &[f64],
    ) -> Result<Self, HistogramError> {
        let axis = Axis::new(edges.to_vec())?;
        let idx: Result<Vec<_>, _> = edges
            .iter()
            .map(|&e| {
                self.axis
                    .edge_index(e)
                    .ok_or(HistogramError::IncompatibleEdge(e))
            })
            .collect();
        let idx = idx?;
        let mut res = Self::new(name, self.title.clone(), axis);
        for (new_bin, range) in idx.windows(2).enumerate() {
            res.contents[new_bin] = self.contents[range[0]..range[1]].iter().sum();
            res.sumw2[new_bin] = self.sumw2[range[0]..range[1]].iter().sum();
        }
        res.entries = self.entries;
        Ok(res)
    }

    /// Divide bin-wise by `denominator`, propagating uncorrelated errors
    ///
    /// Bins with a vanishing denominator are set to zero with zero error.
    pub fn divide(&mut self, denominator: &Hist1D) -> Result<(), HistogramError> {
        if !self.axis.same_binning(&denominator.axis) {
            return Err(HistogramError::BinningMismatch {
                lhs: self.name.clone(),
                rhs: denominator.name.clone(),
            });
        }
        for bin in 0..self.nbins() {
            let (num, den) = (self.contents[bin], denominator.contents[bin]);
            if den == 0. {
                self.contents[bin] = 0.;
                self.sumw2[bin] = 0.;
                continue;
            }
            let den2 = den * den;
            self.sumw2[bin] = (self.sumw2[bin] * den2
                + denominator.sumw2[bin] * num * num)
                / (den2 * den2);
            self.contents[bin] = num / den;
        }
        Ok(())
    }

    /// Multiply all contents by `factor`
    pub fn scale(&mut self, factor: f64) {
        for (c, w2) in self.contents.iter_mut().zip(self.sumw2.iter_mut()) {
            *c *= factor;
            *w2 *= factor * factor;
        }
    }

    /// Check that the bin storage matches the axis
    pub fn validate(&self) -> Result<(), HistogramError> {
        let nbins = self.nbins();
        for len in [self.contents.len(), self.sumw2.len()] {
            if len != nbins {
                return Err(HistogramError::StorageMismatch {
                    name: self.name.clone(),
                    expected: nbins,
                    found: len,
                });
            }
        }
        Ok(())
    }
}

/// Two-dimensional histogram with per-cell variance
///
/// Cells are stored with the x index running fastest.
#[derive(Deserialize, Serialize)]
#[derive(Clone, Debug, PartialEq)]
pub struct Hist2D {
    pub name: String,
    #[serde(default)]
    pub title: String,
    x: Axis,
    y: Axis,
    contents: Vec<f64>,
    sumw2: Vec<f64>,
    #[serde(default)]
    entries: f64,
}

impl Hist2D {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        x: Axis,
        y: Axis,
    ) -> Self {
        let ncells = x.nbins() * y.nbins();
        Self {
            name: name.into(),
            title: title.into(),
            x,
            y,
            contents: vec![0.; ncells],
            sumw2: vec![0.; ncells],
            entries: 0.,
        }
    }

    pub fn x_axis(&self) -> &Axis {
        &self.x
    }

    pub fn y_axis(&self) -> &Axis {
        &self.y
    }

    fn idx(&self, xbin: usize, ybin: usize) -> usize {
        ybin * self.x.nbins() + xbin
    }

    pub fn content(&self, xbin: usize, ybin: usize) -> f64 {
        self.contents[self.idx(xbin, ybin)]
    }

    pub fn error(&self, xbin: usize, ybin: usize) -> f64 {
        self.sumw2[self.idx(xbin, ybin)].sqrt()
    }

    pub fn entries(&self) -> f64 {
        self.entries
    }

    /// Set the content and error of a single cell
    pub fn set_cell(&mut self, xbin: usize, ybin: usize, content: f64, error: f64) {
        let idx = self.idx(xbin, ybin);
        self.contents[idx] = content;
        self.sumw2[idx] = error * error;
    }

    pub fn fill(&mut self, x: f64, y: f64) {
        self.fill_weighted(x, y, 1.)
    }

    pub fn fill_weighted(&mut self, x: f64, y: f64, w: f64) {
        self.entries += 1.;
        if let (Some(xbin), Some(ybin)) = (self.x.find_bin(x), self.y.find_bin(y)) {
            let idx = self.idx(xbin, ybin);
            self.contents[idx] += w;
            self.sumw2[idx] += w * w;
        }
    }

    /// Project the row `ybin` onto the x axis, keeping the cell errors
    pub fn projection_x(&self, name: impl Into<String>, ybin: usize) -> Hist1D {
        let nx = self.x.nbins();
        let start = self.idx(0, ybin);
        let contents = self.contents[start..start + nx].to_vec();
        let entries = contents.iter().sum();
        Hist1D {
            name: name.into(),
            title: self.title.clone(),
            axis: self.x.clone(),
            contents,
            sumw2: self.sumw2[start..start + nx].to_vec(),
            entries,
        }
    }

    pub fn validate(&self) -> Result<(), HistogramError> {
        let ncells = self.x.nbins() * self.y.nbins();
        for len in [self.contents.len(), self.sumw2.len()] {
            if len != ncells {
                return Err(HistogramError::StorageMismatch {
                    name: self.name.clone(),
                    expected: ncells,
                    found: len,
                });
            }
        }
        Ok(())
    }
}

/// Histogram in any number of dimensions, storing only non-empty cells
///
/// Cell indices are computed with the first axis running fastest.
#[derive(Deserialize, Serialize)]
#[derive(Clone, Debug, PartialEq)]
pub struct SparseHist {
    pub name: String,
    #[serde(default)]
    pub title: String,
    axes: Vec<Axis>,
    #[serde(default)]
    contents: BTreeMap<usize, f64>,
}

impl SparseHist {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        axes: Vec<Axis>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            axes,
            contents: BTreeMap::new(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn axis(&self, dim: usize) -> &Axis {
        &self.axes[dim]
    }

    fn ncells(&self) -> usize {
        self.axes.iter().map(|a| a.nbins()).product()
    }

    /// Index of the cell with the given bin along each axis
    pub fn cell(&self, bins: &[usize]) -> usize {
        debug_assert_eq!(bins.len(), self.ndim());
        bins.iter()
            .zip(&self.axes)
            .rev()
            .fold(0, |idx, (bin, axis)| idx * axis.nbins() + bin)
    }

    /// Bin along each axis for the cell with index `cell`
    pub fn bins(&self, mut cell: usize) -> Vec<usize> {
        self.axes
            .iter()
            .map(|axis| {
                let bin = cell % axis.nbins();
                cell /= axis.nbins();
                bin
            })
            .collect()
    }

    /// Index of the cell containing the point `x`
    ///
    /// Returns `None` if `x` lies outside the range of any axis.
    pub fn find_cell(&self, x: &[f64]) -> Option<usize> {
        if x.len() != self.ndim() {
            return None;
        }
        let bins: Option<Vec<_>> = self
            .axes
            .iter()
            .zip(x)
            .map(|(axis, x)| axis.find_bin(*x))
            .collect();
        Some(self.cell(&bins?))
    }

    pub fn content(&self, cell: usize) -> f64 {
        self.contents.get(&cell).copied().unwrap_or_default()
    }

    /// Content of the cell containing `x`, zero outside the axis ranges
    pub fn content_at(&self, x: &[f64]) -> f64 {
        self.find_cell(x).map(|cell| self.content(cell)).unwrap_or_default()
    }

    pub fn set_content(&mut self, cell: usize, content: f64) {
        if content == 0. {
            self.contents.remove(&cell);
        } else {
            self.contents.insert(cell, content);
        }
    }

    /// Add `w` to the cell containing `x`
    pub fn fill_weighted(&mut self, x: &[f64], w: f64) {
        if let Some(cell) = self.find_cell(x) {
            let content = self.content(cell) + w;
            self.set_content(cell, content);
        }
    }

    /// Number of non-empty cells
    pub fn filled_cells(&self) -> usize {
        self.contents.len()
    }

    /// Add the contents of a histogram with the same axes
    pub fn add(&mut self, other: &SparseHist) -> Result<(), HistogramError> {
        let same_axes = self.ndim() == other.ndim()
            && self
                .axes
                .iter()
                .zip(&other.axes)
                .all(|(a, b)| a.same_binning(b));
        if !same_axes {
            return Err(HistogramError::BinningMismatch {
                lhs: self.name.clone(),
                rhs: other.name.clone(),
            });
        }
        for (&cell, &content) in &other.contents {
            let sum = self.content(cell) + content;
            self.set_content(cell, sum);
        }
        Ok(())
    }

    /// Sum over all axes not listed in `dims`
    ///
    /// The axes of the projection are the axes `dims` in the given order.
    pub fn projection(
        &self,
        name: impl Into<String>,
        dims: &[usize],
    ) -> Result<SparseHist, HistogramError> {
        let invalid = dims.is_empty()
            || dims.iter().any(|&d| d >= self.ndim())
            || dims.iter().enumerate().any(|(i, d)| dims[..i].contains(d));
        if invalid {
            return Err(HistogramError::InvalidProjection {
                ndim: self.ndim(),
                dims: dims.to_vec(),
            });
        }
        let axes = dims.iter().map(|&d| self.axes[d].clone()).collect();
        let mut res = SparseHist::new(name, self.title.clone(), axes);
        for (&cell, &content) in &self.contents {
            let bins = self.bins(cell);
            let projected: Vec<_> = dims.iter().map(|&d| bins[d]).collect();
            let cell = res.cell(&projected);
            let sum = res.content(cell) + content;
            res.set_content(cell, sum);
        }
        Ok(res)
    }

    pub fn validate(&self) -> Result<(), HistogramError> {
        let ncells = self.ncells();
        if let Some((&cell, _)) = self.contents.iter().next_back() {
            if self.axes.is_empty() || cell >= ncells {
                return Err(HistogramError::CellOutOfRange {
                    name: self.name.clone(),
                    cell,
                    ncells,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistogramError {
    #[error("Need at least two bin edges, got {0}")]
    TooFewEdges(usize),
    #[error("Bin edge {0} is not finite")]
    NonFiniteEdge(usize),
    #[error("Bin edge {0} is not larger than its predecessor")]
    UnorderedEdges(usize),
    #[error("No bins with centre in range [{0}, {1}]")]
    EmptyRange(f64, f64),
    #[error("New bin edge {0} does not coincide with an existing edge")]
    IncompatibleEdge(f64),
    #[error("Histograms `{lhs}` and `{rhs}` have different binning")]
    BinningMismatch { lhs: String, rhs: String },
    #[error("Cannot project {ndim}-dimensional histogram onto axes {dims:?}")]
    InvalidProjection { ndim: usize, dims: Vec<usize> },
    #[error("Histogram `{name}` has content in cell {cell}, but only {ncells} cells")]
    CellOutOfRange {
        name: String,
        cell: usize,
        ncells: usize,
    },
    #[error("Histogram `{name}` has {found} stored bins, but its axes define {expected}")]
    StorageMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn axis_construction() {
        assert_eq!(Axis::new(vec![0.]), Err(HistogramError::TooFewEdges(1)));
        assert_eq!(
            Axis::new(vec![0., 1., 1.]),
            Err(HistogramError::UnorderedEdges(2))
        );
        let axis = Axis::uniform(4, 0., 2.).unwrap();
        assert_eq!(axis.nbins(), 4);
        assert_eq!(axis.edges(), &[0., 0.5, 1., 1.5, 2.]);
        assert_eq!(axis.find_bin(-0.1), None);
        assert_eq!(axis.find_bin(0.), Some(0));
        assert_eq!(axis.find_bin(0.75), Some(1));
        assert_eq!(axis.find_bin(1.999), Some(3));
        assert_eq!(axis.find_bin(2.), None);
    }

    #[test]
    fn fill_and_moments() {
        let mut h = Hist1D::new("h", "", Axis::uniform(10, 0., 10.).unwrap());
        h.fill(4.5);
        h.fill_weighted(5.5, 2.);
        h.fill(20.);
        assert_eq!(h.entries(), 3.);
        assert_eq!(h.integral(), 3.);
        assert_eq!(h.variance(5), 4.);
        assert_abs_diff_eq!(h.mean(), (4.5 + 2. * 5.5) / 3., epsilon = 1e-12);
        let var = (1. * (4.5f64 - h.mean()).powi(2) + 2. * (5.5f64 - h.mean()).powi(2)) / 3.;
        assert_abs_diff_eq!(h.rms(), var.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn restrict() {
        let mut h = Hist1D::new("h", "", Axis::uniform(10, 0., 1.).unwrap());
        for i in 0..10 {
            h.set_content(i, i as f64);
        }
        let r = h.restricted(0.2, 0.55).unwrap();
        assert_eq!(r.nbins(), 3);
        assert_eq!(r.contents(), &[2., 3., 4.]);
        assert_abs_diff_eq!(r.axis().min(), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(r.axis().max(), 0.5, epsilon = 1e-12);
        assert!(h.restricted(2., 3.).is_err());
    }

    #[test]
    fn rebin() {
        let mut h = Hist1D::new("h", "", Axis::uniform(10, 0., 10.).unwrap());
        for i in 0..10 {
            h.fill_weighted(i as f64 + 0.5, 1. + i as f64);
        }
        let r = h.rebinned("r", &[2., 5., 10.]).unwrap();
        assert_eq!(r.nbins(), 2);
        assert_eq!(r.contents(), &[3. + 4. + 5., 6. + 7. + 8. + 9. + 10.]);
        assert_eq!(r.variance(0), 9. + 16. + 25.);
        assert_eq!(
            h.rebinned("r", &[0., 2.5]),
            Err(HistogramError::IncompatibleEdge(2.5))
        );
    }

    #[test]
    fn divide_with_errors() {
        let axis = Axis::uniform(3, 0., 3.).unwrap();
        let mut num = Hist1D::new("num", "", axis.clone());
        let mut den = Hist1D::new("den", "", axis);
        num.set_content(0, 2.);
        num.set_error(0, 1.);
        den.set_content(0, 4.);
        den.set_error(0, 2.);
        num.set_content(1, 3.);
        num.set_error(1, 1.);
        num.divide(&den).unwrap();

        assert_abs_diff_eq!(num.content(0), 0.5, epsilon = 1e-12);
        // (1 * 16 + 4 * 4) / 256
        assert_abs_diff_eq!(num.variance(0), 32. / 256., epsilon = 1e-12);
        // zero denominator
        assert_eq!(num.content(1), 0.);
        assert_eq!(num.error(1), 0.);
        assert_eq!(num.content(2), 0.);
    }

    #[test]
    fn divide_rejects_mismatch() {
        let mut a = Hist1D::new("a", "", Axis::uniform(3, 0., 3.).unwrap());
        let b = Hist1D::new("b", "", Axis::uniform(3, 0., 4.).unwrap());
        assert!(matches!(
            a.divide(&b),
            Err(HistogramError::BinningMismatch { .. })
        ));
    }

    #[test]
    fn projection() {
        let mut h = Hist2D::new(
            "h",
            "",
            Axis::uniform(4, 0., 4.).unwrap(),
            Axis::new(vec![0., 1., 3.]).unwrap(),
        );
        h.fill(0.5, 0.5);
        h.fill_weighted(2.5, 2., 3.);
        h.fill(2.5, 2.5);
        let p0 = h.projection_x("p0", 0);
        assert_eq!(p0.contents(), &[1., 0., 0., 0.]);
        let p1 = h.projection_x("p1", 1);
        assert_eq!(p1.contents(), &[0., 0., 4., 0.]);
        assert_abs_diff_eq!(p1.error(2), 10f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn sparse() {
        let axes = vec![
            Axis::uniform(4, -0.2, 0.2).unwrap(),
            Axis::uniform(2, 0., 2.).unwrap(),
            Axis::new(vec![1., 3., 5.]).unwrap(),
        ];
        let mut h = SparseHist::new("h", "", axes.clone());
        assert_eq!(h.ndim(), 3);
        let cell = h.cell(&[3, 1, 1]);
        assert_eq!(cell, 3 + 4 * (1 + 2 * 1));
        assert_eq!(h.bins(cell), [3, 1, 1]);
        assert_eq!(h.find_cell(&[0.15, 1.5, 4.]), Some(cell));
        assert_eq!(h.find_cell(&[0.15, 1.5, 5.]), None);
        assert_eq!(h.find_cell(&[0.15, 1.5]), None);

        h.fill_weighted(&[0.15, 1.5, 4.], 1.);
        h.fill_weighted(&[0.15, 1.5, 2.], 2.);
        h.fill_weighted(&[-0.15, 0.5, 2.], 1.);
        h.fill_weighted(&[1., 0.5, 2.], 1.);
        assert_eq!(h.filled_cells(), 3);
        assert_eq!(h.content(cell), 1.);
        assert_eq!(h.content_at(&[0.15, 1.5, 2.]), 2.);
        assert_eq!(h.content_at(&[0.05, 1.5, 2.]), 0.);

        let mut sum = SparseHist::new("sum", "", axes);
        sum.add(&h).unwrap();
        sum.add(&h).unwrap();
        assert_eq!(sum.content(cell), 2.);

        let p = h.projection("p", &[1, 0]).unwrap();
        assert_eq!(p.axis(0), h.axis(1));
        assert_eq!(p.filled_cells(), 2);
        assert_eq!(p.content_at(&[1.5, 0.15]), 3.);
        assert_eq!(p.content_at(&[0.5, -0.15]), 1.);

        assert!(matches!(
            h.projection("p", &[0, 0]),
            Err(HistogramError::InvalidProjection { .. })
        ));
        assert!(matches!(
            h.projection("p", &[3]),
            Err(HistogramError::InvalidProjection { .. })
        ));
        assert!(matches!(
            sum.add(&p),
            Err(HistogramError::BinningMismatch { .. })
        ));
    }
}
