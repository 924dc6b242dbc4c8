//! Per-value triangle extraction.
//!
//! Both extractors share one per-cell kernel: build the sign mask, look up
//! the case, and report each crossed edge as `(point a, point b, fraction)`.
//! They differ in what a crossing becomes:
//!
//! - [`fast`]: an interpolated point, three per triangle, never shared
//! - [`merge`]: an [`EdgeRecord`] that is later deduplicated by edge

pub(crate) mod fast;
pub(crate) mod merge;
mod parallel;

use std::ops::Range;

pub use merge::{EdgeRecord, MergeId};
pub(crate) use parallel::MapPhase;

use crate::array::{Component, DataArray};
use crate::cell::{CellCursor, MAX_CELL_VERTICES, ShapeDescriptor, sign_mask};
use crate::scalar_tree::CellBatches;

/// Cells per work block on a full scan.
///
/// Abort requests are checked between blocks, so this bounds the work done
/// after an abort.
pub(crate) const CELL_BLOCK: usize = 1024;

/// Fraction along the edge `s0 -> s1` where the field equals `value`.
///
/// An edge with equal end values yields 0 instead of dividing by zero.
#[inline]
pub fn edge_fraction(value: f64, s0: f64, s1: f64) -> f32 {
    let delta = s1 - s0;
    if delta == 0.0 {
        0.0
    } else {
        ((value - s0) / delta) as f32
    }
}

/// Point scalars borrowed with their concrete element type.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ScalarField<'a> {
    U32(&'a [u32]),
    I32(&'a [i32]),
    F32(&'a [f32]),
    F64(&'a [f64]),
}

impl<'a> ScalarField<'a> {
    /// Borrow a contourable array; `None` for other element types.
    pub fn from_array(array: &'a DataArray) -> Option<Self> {
        if let Some(values) = array.as_slice::<u32>() {
            Some(ScalarField::U32(values))
        } else if let Some(values) = array.as_slice::<i32>() {
            Some(ScalarField::I32(values))
        } else if let Some(values) = array.as_slice::<f32>() {
            Some(ScalarField::F32(values))
        } else {
            array.as_slice::<f64>().map(ScalarField::F64)
        }
    }
}

/// Evaluate an expression against the typed slice inside a [`ScalarField`].
macro_rules! with_scalar_field {
    ($field:expr, $values:ident => $body:expr) => {
        match $field {
            $crate::extract::ScalarField::U32($values) => $body,
            $crate::extract::ScalarField::I32($values) => $body,
            $crate::extract::ScalarField::F32($values) => $body,
            $crate::extract::ScalarField::F64($values) => $body,
        }
    };
}
pub(crate) use with_scalar_field;

/// Where the cells of one contour value come from.
pub(crate) enum CellSource<'a> {
    /// Every cell of the mesh, in storage order.
    All(usize),
    /// Candidate batches from a scalar tree.
    Batches(CellBatches<'a>),
}

impl CellSource<'_> {
    /// Number of independent work units (cells or batches).
    pub fn work_units(&self) -> usize {
        match self {
            CellSource::All(cells) => *cells,
            CellSource::Batches(batches) => batches.number_of_batches(),
        }
    }

    /// Work units per block handed to one worker at a time.
    pub fn grain(&self) -> usize {
        match self {
            CellSource::All(_) => CELL_BLOCK,
            CellSource::Batches(_) => 1,
        }
    }
}

/// Read-only inputs of one extraction, copied into every worker.
#[derive(Clone, Copy)]
pub(crate) struct ExtractInput<'a, P, S> {
    pub cursor: CellCursor<'a>,
    pub points: &'a [P],
    pub scalars: &'a [S],
    pub value: f64,
}

impl<'a, P: Component, S: Component> ExtractInput<'a, P, S> {
    /// Visit the cells of work units `units` in order.
    ///
    /// Full scans walk the cursor sequentially; batches jump to each
    /// candidate cell.
    pub fn visit(
        &self,
        source: &CellSource<'_>,
        units: Range<usize>,
        mut f: impl FnMut(usize, &'a [usize], &ShapeDescriptor),
    ) {
        let mut cursor = self.cursor;
        match source {
            CellSource::All(_) => {
                if units.is_empty() {
                    return;
                }
                let mut ids = cursor.initialize(units.start);
                for cell_id in units.clone() {
                    f(cell_id, ids, &cursor.descriptor());
                    if cell_id + 1 == units.end {
                        break;
                    }
                    match cursor.advance() {
                        Some(next) => ids = next,
                        None => break,
                    }
                }
            }
            CellSource::Batches(batches) => {
                for batch in units {
                    for &cell_id in batches.batch(batch) {
                        let ids = cursor.cell_at(cell_id);
                        f(cell_id, ids, &cursor.descriptor());
                    }
                }
            }
        }
    }

    /// Report every crossed edge of one cell as `(a, b, fraction)`, with
    /// `a -> b` in case-table orientation. Crossings come in triangle order.
    #[inline]
    pub fn crossings(
        &self,
        ids: &[usize],
        descriptor: &ShapeDescriptor,
        mut emit: impl FnMut(usize, usize, f32),
    ) {
        let n = descriptor.vertex_count();
        if n == 0 || ids.len() < n {
            return;
        }

        let mut s = [0.0f64; MAX_CELL_VERTICES];
        for (slot, &id) in s.iter_mut().zip(&ids[..n]) {
            *slot = self.scalars[id].to_f64();
        }
        let mask = sign_mask(&s[..n], self.value);

        for &[v0, v1] in descriptor.case(mask) {
            let (v0, v1) = (v0 as usize, v1 as usize);
            emit(ids[v0], ids[v1], edge_fraction(self.value, s[v0], s[v1]));
        }
    }

    /// Position at `fraction` along the segment between two input points.
    #[inline]
    pub fn interpolate<O: Component>(&self, a: usize, b: usize, fraction: f32) -> [O; 3] {
        let t = fraction as f64;
        std::array::from_fn(|c| {
            let x0 = self.points[3 * a + c].to_f64();
            let x1 = self.points[3 * b + c].to_f64();
            O::from_f64(x0 + t * (x1 - x0))
        })
    }
}

/// Split `dest` into consecutive chunks sized like `sources`.
pub(crate) fn split_like<'d, T, U>(mut dest: &'d mut [T], sources: &[Vec<U>]) -> Vec<&'d mut [T]> {
    let mut chunks = Vec::with_capacity(sources.len());
    for source in sources {
        let (head, tail) = std::mem::take(&mut dest).split_at_mut(source.len());
        chunks.push(head);
        dest = tail;
    }
    chunks
}
