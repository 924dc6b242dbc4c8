//! Scalar trees: candidate-cell lookup by contour value.
//!
//! A scalar tree narrows the cells visited for one contour value to those
//! whose scalar span may contain it. Extraction trusts the tree to be
//! complete; a cell missing from every batch is never visited.

use std::borrow::Cow;
use std::fmt;

use rayon::prelude::*;
use tracing::debug;

use crate::array::{Component, DataArray, with_array_data};
use crate::cell::{CellShape, MAX_CELL_VERTICES};
use crate::error::{ContourError, ContourResult};
use crate::types::UnstructuredMesh;

/// Candidate cells for one contour value, split into fixed-size batches.
#[derive(Debug, Clone)]
pub struct CellBatches<'a> {
    cells: Cow<'a, [usize]>,
    batch_size: usize,
}

impl<'a> CellBatches<'a> {
    /// Group `cells` into batches of `batch_size` (at least 1).
    pub fn new(cells: impl Into<Cow<'a, [usize]>>, batch_size: usize) -> Self {
        Self {
            cells: cells.into(),
            batch_size: batch_size.max(1),
        }
    }

    #[inline]
    pub fn number_of_batches(&self) -> usize {
        self.cells.len().div_ceil(self.batch_size)
    }

    /// Cell ids of batch `index`; empty when out of range.
    #[inline]
    pub fn batch(&self, index: usize) -> &[usize] {
        let start = (index * self.batch_size).min(self.cells.len());
        let end = (start + self.batch_size).min(self.cells.len());
        &self.cells[start..end]
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Acceleration structure answering "which cells may contain this value".
pub trait ScalarTree: Send + Sync + fmt::Debug {
    /// Index the per-point `scalars` over the cells of `mesh`.
    fn build(&mut self, mesh: &UnstructuredMesh, scalars: &DataArray) -> ContourResult<()>;

    /// Candidate cells for `value`. Must include every cell whose scalar
    /// span contains `value`.
    fn cell_batches(&self, value: f64) -> CellBatches<'_>;

    /// An unbuilt tree with the same configuration.
    fn new_instance(&self) -> Box<dyn ScalarTree>;
}

/// Span-space scalar tree.
///
/// Each cell is a point (min, max) in span space. The scalar range is cut
/// into `resolution` bins on both axes and cells are bucketed by their bin
/// pair. For a value in bin `v`, candidates live in buckets with min-bin
/// `<= v` and max-bin `>= v`; they are then filtered by exact span and
/// returned in ascending cell order.
#[derive(Debug, Clone)]
pub struct SpanSpace {
    resolution: Option<usize>,
    batch_size: usize,
    range: (f64, f64),
    bins: usize,
    bucket_offsets: Vec<usize>,
    bucket_cells: Vec<usize>,
    spans: Vec<(f64, f64)>,
}

impl Default for SpanSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl SpanSpace {
    /// Cells per batch handed to one work item.
    pub const DEFAULT_BATCH_SIZE: usize = 256;

    /// Create a tree that picks its resolution from the cell count.
    pub fn new() -> Self {
        Self {
            resolution: None,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            range: (0.0, 0.0),
            bins: 0,
            bucket_offsets: Vec::new(),
            bucket_cells: Vec::new(),
            spans: Vec::new(),
        }
    }

    /// Use a fixed number of bins per axis.
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = Some(resolution.max(1));
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Bins per axis of the last build.
    #[inline]
    pub fn bins(&self) -> usize {
        self.bins
    }

    fn auto_resolution(cell_count: usize) -> usize {
        ((cell_count as f64 / 5.0).sqrt() as usize).clamp(1, 512)
    }

    #[inline]
    fn bin(&self, value: f64) -> usize {
        let (lo, hi) = self.range;
        let width = hi - lo;
        if width <= 0.0 {
            return 0;
        }
        let t = ((value - lo) / width * self.bins as f64) as usize;
        t.min(self.bins - 1)
    }
}

/// Per-cell scalar span of the supported cells; `None` for skipped cells.
fn cell_spans<S: Component>(mesh: &UnstructuredMesh, scalars: &[S]) -> Vec<Option<(f64, f64)>> {
    let cells = mesh.cells();
    let types = mesh.cell_types();
    (0..mesh.cell_count())
        .into_par_iter()
        .map(|cell_id| {
            let ids = cells.cell(cell_id);
            let shape = CellShape::from_cell_type(types[cell_id]);
            if shape == CellShape::Unsupported
                || ids.len() != shape.vertex_count()
                || ids.len() > MAX_CELL_VERTICES
            {
                return None;
            }
            let mut lo = f64::INFINITY;
            let mut hi = f64::NEG_INFINITY;
            for &id in ids {
                let s = scalars[id].to_f64();
                if s.is_nan() {
                    continue;
                }
                lo = lo.min(s);
                hi = hi.max(s);
            }
            (lo <= hi).then_some((lo, hi))
        })
        .collect()
}

impl ScalarTree for SpanSpace {
    fn build(&mut self, mesh: &UnstructuredMesh, scalars: &DataArray) -> ContourResult<()> {
        if scalars.components() != 1 || scalars.tuple_count() != mesh.point_count() {
            return Err(ContourError::scalar_tree(format!(
                "array '{}' must hold one value per point ({} points)",
                scalars.name(),
                mesh.point_count()
            )));
        }

        let spans = with_array_data!(scalars.data(), values => cell_spans(mesh, values));
        let range = spans
            .iter()
            .flatten()
            .fold(None, |acc: Option<(f64, f64)>, &(lo, hi)| match acc {
                None => Some((lo, hi)),
                Some((a, b)) => Some((a.min(lo), b.max(hi))),
            })
            .unwrap_or((0.0, 0.0));

        self.range = range;
        self.bins = self
            .resolution
            .unwrap_or_else(|| Self::auto_resolution(mesh.cell_count()));

        // Counting sort of cells by bucket keeps ascending cell order within
        // each bucket.
        let bucket_count = self.bins * self.bins;
        let keys: Vec<Option<usize>> = spans
            .iter()
            .map(|span| span.map(|(lo, hi)| self.bin(lo) * self.bins + self.bin(hi)))
            .collect();
        let mut offsets = vec![0usize; bucket_count + 1];
        for key in keys.iter().flatten() {
            offsets[key + 1] += 1;
        }
        for i in 0..bucket_count {
            offsets[i + 1] += offsets[i];
        }
        let mut cursor = offsets.clone();
        let mut bucket_cells = vec![0usize; offsets[bucket_count]];
        for (cell_id, key) in keys.iter().enumerate() {
            if let Some(key) = key {
                bucket_cells[cursor[*key]] = cell_id;
                cursor[*key] += 1;
            }
        }

        self.spans = spans
            .into_iter()
            .map(|span| span.unwrap_or((f64::NAN, f64::NAN)))
            .collect();
        self.bucket_offsets = offsets;
        self.bucket_cells = bucket_cells;

        debug!(
            target: "mesh_contour::scalar_tree",
            cells = self.bucket_cells.len(),
            bins = self.bins,
            min = range.0,
            max = range.1,
            "Built span space"
        );
        Ok(())
    }

    fn cell_batches(&self, value: f64) -> CellBatches<'_> {
        let (lo, hi) = self.range;
        if self.bins == 0 || value.is_nan() || value <= lo || value > hi {
            // A cell needs a vertex below the value and one at or above it.
            return CellBatches::new(Vec::new(), self.batch_size);
        }

        let v = self.bin(value);
        let mut cells: Vec<usize> = (0..=v)
            .flat_map(|min_bin| {
                let first = self.bucket_offsets[min_bin * self.bins + v];
                let last = self.bucket_offsets[min_bin * self.bins + self.bins];
                self.bucket_cells[first..last].iter().copied()
            })
            .filter(|&cell_id| {
                let (lo, hi) = self.spans[cell_id];
                lo < value && hi >= value
            })
            .collect();
        cells.par_sort_unstable();

        CellBatches::new(cells, self.batch_size)
    }

    fn new_instance(&self) -> Box<dyn ScalarTree> {
        let mut tree = SpanSpace::new().with_batch_size(self.batch_size);
        tree.resolution = self.resolution;
        Box::new(tree)
    }
}
