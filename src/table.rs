//! Conversion of theory prediction tables into histograms
//!
//! Tables are plain text files with one row of whitespace- or
//! comma-separated numbers per line. Blank lines and everything after
//! a `#` are ignored. The first line may name the columns, as in CSV
//! files.
use std::{
    convert::Infallible,
    f64::consts::PI,
    fmt::{self, Display},
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
    str::FromStr,
};

use audec::auto_decompress;
use log::debug;
use thiserror::Error;

use crate::{
    histogram::{Axis, Hist1D},
    parsing::{header, row, strip_comment},
};

/// A parsed table row together with its line number (starting at 1)
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub line: usize,
    pub values: Vec<f64>,
}

/// A table column, given by its index (counting from zero) or its name
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Column {
    Index(usize),
    Name(String),
}

impl FromStr for Column {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse() {
            Ok(idx) => Column::Index(idx),
            Err(_) => Column::Name(s.to_owned()),
        })
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Index(idx) => write!(f, "{idx}"),
            Column::Name(name) => write!(f, "{name}"),
        }
    }
}

/// A parsed table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    /// Column names from the first line, if present
    pub header: Option<Vec<String>>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Index of the given column
    pub fn index(&self, column: &Column) -> Result<usize, TableError> {
        let name = match column {
            Column::Index(idx) => return Ok(*idx),
            Column::Name(name) => name,
        };
        let Some(header) = &self.header else {
            return Err(TableError::NoHeader(name.clone()));
        };
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::UnknownColumn(name.clone()))
    }
}

fn column_names(content: &str) -> Option<Vec<String>> {
    let (_, names) = header(content).ok()?;
    if names.iter().any(|name| name.parse::<f64>().is_ok()) {
        return None;
    }
    Some(names.into_iter().map(|name| name.to_owned()).collect())
}

/// Parse a table
pub fn parse_table(text: &str) -> Result<Table, TableError> {
    let mut table = Table::default();
    let mut first = true;
    for (idx, line) in text.lines().enumerate() {
        let content = strip_comment(line);
        if content.trim().is_empty() {
            continue;
        }
        let is_first = std::mem::replace(&mut first, false);
        let values = match row(content) {
            Ok((_, values)) => values,
            Err(_) => match column_names(content) {
                Some(names) if is_first => {
                    table.header = Some(names);
                    continue;
                }
                _ => {
                    return Err(TableError::Syntax {
                        line: idx + 1,
                        content: line.to_owned(),
                    })
                }
            },
        };
        table.rows.push(Row {
            line: idx + 1,
            values,
        });
    }
    Ok(table)
}

/// Read and parse a table file, which may be compressed
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table, TableError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| TableError::Io(path.to_owned(), err))?;
    let mut text = String::new();
    auto_decompress(BufReader::new(file))
        .read_to_string(&mut text)
        .map_err(|err| TableError::Io(path.to_owned(), err))?;
    let table = parse_table(&text)?;
    debug!("Read {} rows from {path:?}", table.rows.len());
    Ok(table)
}

fn column(row: &Row, col: usize) -> Result<f64, TableError> {
    row.values
        .get(col)
        .copied()
        .ok_or(TableError::MissingColumn {
            line: row.line,
            column: col + 1,
            found: row.values.len(),
        })
}

/// Central values and uncertainties from a table of lower and upper limits
///
/// Row `i` fills bin `i`, with the lower limit in column `lo_col` and the
/// upper limit in column `hi_col` (both counted from zero). The bin
/// content is the midpoint and the error the half width of the band.
/// Bins without a row stay empty.
pub fn band(
    name: &str,
    title: &str,
    axis: Axis,
    rows: &[Row],
    (lo_col, hi_col): (usize, usize),
) -> Result<Hist1D, TableError> {
    let mut hist = Hist1D::new(name, title, axis);
    if rows.len() > hist.nbins() {
        return Err(TableError::TooManyRows {
            rows: rows.len(),
            bins: hist.nbins(),
        });
    }
    for (bin, row) in rows.iter().enumerate() {
        let (lo, hi) = (column(row, lo_col)?, column(row, hi_col)?);
        hist.set_content(bin, 0.5 * (hi + lo));
        hist.set_error(bin, 0.5 * (hi - lo).abs());
    }
    Ok(hist)
}

/// Piecewise linear curve through a set of points
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    points: Vec<(f64, f64)>,
}

impl Curve {
    /// Construct from at least two points with distinct x values
    pub fn new(mut points: Vec<(f64, f64)>) -> Result<Self, TableError> {
        if points.len() < 2 {
            return Err(TableError::TooFewPoints(points.len()));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(dup) = points.windows(2).find(|p| p[0].0 == p[1].0) {
            return Err(TableError::DuplicateX(dup[0].0));
        }
        Ok(Self { points })
    }

    /// Curve through the points in columns `x_col` and `y_col`
    pub fn from_rows(rows: &[Row], (x_col, y_col): (usize, usize)) -> Result<Self, TableError> {
        let points: Result<Vec<_>, _> = rows
            .iter()
            .map(|row| Ok((column(row, x_col)?, column(row, y_col)?)))
            .collect();
        Self::new(points?)
    }

    /// Linear interpolation, extrapolating with the outermost segments
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.points.len();
        let idx = self
            .points
            .partition_point(|p| p.0 <= x)
            .clamp(1, n - 1);
        let (x0, y0) = self.points[idx - 1];
        let (x1, y1) = self.points[idx];
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

/// A curve sampled at the bin centres
#[derive(Clone, Debug, PartialEq)]
pub struct SampledCurve {
    pub hist: Hist1D,
    /// `hist` divided by its integral
    pub normalised: Hist1D,
}

/// Sample `curve` at the bin centres of `axis`
///
/// With `times_two_pi_x` the values are multiplied by 2πx, converting
/// an invariant yield into dN/dx.
pub fn sample(
    name: &str,
    title: &str,
    axis: Axis,
    curve: &Curve,
    times_two_pi_x: bool,
) -> Result<SampledCurve, TableError> {
    let mut hist = Hist1D::new(name, title, axis);
    for bin in 0..hist.nbins() {
        let x = hist.axis().centre(bin);
        let mut y = curve.eval(x);
        if times_two_pi_x {
            y *= 2. * PI * x;
        }
        hist.set_content(bin, y);
    }
    let norm: f64 = (0..hist.nbins())
        .map(|bin| hist.axis().width(bin) * hist.content(bin))
        .sum();
    if norm == 0. || !norm.is_finite() {
        return Err(TableError::Normalisation(norm));
    }
    debug!("Integral of sampled curve: {norm}");
    let mut normalised = hist.clone();
    normalised.name = format!("{name}_norm");
    normalised.scale(1. / norm);
    Ok(SampledCurve { hist, normalised })
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read {0:?}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("Line {line} is not a row of numbers: `{content}`")]
    Syntax { line: usize, content: String },
    #[error("Cannot select column `{0}`: table has no header")]
    NoHeader(String),
    #[error("No column named `{0}` in table header")]
    UnknownColumn(String),
    #[error("Line {line} has {found} columns, need column {column}")]
    MissingColumn {
        line: usize,
        column: usize,
        found: usize,
    },
    #[error("{rows} table rows do not fit into {bins} bins")]
    TooManyRows { rows: usize, bins: usize },
    #[error("Need at least two points for interpolation, got {0}")]
    TooFewPoints(usize),
    #[error("Multiple points at x = {0}")]
    DuplicateX(f64),
    #[error("Cannot normalise curve with integral {0}")]
    Normalisation(f64),
}
