//! Edge-merge extraction.
//!
//! Each crossing is recorded as an [`EdgeRecord`] keyed by the mesh edge it
//! lies on. After the map phase the records are sorted by `(low, high,
//! slot)`; every run of equal edges becomes one output point and every
//! triangle slot in the run is pointed at it. Ids are stored with the
//! narrowest [`MergeId`] that can hold them, which halves the sort traffic
//! on meshes below four billion points and cells.

use std::fmt;

use rayon::prelude::*;

use super::{CellSource, ExtractInput, MapPhase, split_like};
use crate::array::Component;
use crate::attributes::AttributeTransfer;
use crate::extract::fast::ValueOutput;
use crate::tracing_ext::log_phase;

/// Integer type used for ids inside edge records.
pub trait MergeId: Copy + Ord + Default + Send + Sync + fmt::Debug + 'static {
    /// Largest id representable.
    const LIMIT: u64;

    fn from_usize(value: usize) -> Self;
    fn index(self) -> usize;

    /// Whether every id below `count` fits.
    #[inline]
    fn fits(count: usize) -> bool {
        (count as u64) < Self::LIMIT
    }
}

impl MergeId for u32 {
    const LIMIT: u64 = u32::MAX as u64;

    #[inline]
    fn from_usize(value: usize) -> Self {
        value as u32
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

impl MergeId for u64 {
    const LIMIT: u64 = u64::MAX;

    #[inline]
    fn from_usize(value: usize) -> Self {
        value as u64
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// One crossing of a mesh edge.
///
/// `fraction` is measured from `low` towards `high`, whatever direction the
/// case table walked the edge in, so records of the same edge from
/// different cells carry the same fraction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeRecord<I> {
    pub low: I,
    pub high: I,
    pub fraction: f32,
    /// Position in the value's triangle stream: triangle `slot / 3`,
    /// corner `slot % 3`.
    pub slot: I,
    /// Cell that produced the crossing.
    pub cell: I,
}

impl<I: MergeId> EdgeRecord<I> {
    /// Canonicalize the crossing `a -> b` at fraction `t` from `a`.
    #[inline]
    pub fn new(a: usize, b: usize, t: f32, cell: usize) -> Self {
        let (low, high, fraction) = if a <= b { (a, b, t) } else { (b, a, 1.0 - t) };
        Self {
            low: I::from_usize(low),
            high: I::from_usize(high),
            fraction,
            slot: I::default(),
            cell: I::from_usize(cell),
        }
    }

    #[inline]
    pub fn edge(&self) -> (I, I) {
        (self.low, self.high)
    }
}

/// Contour one value with shared points, appending to `points` and
/// `triangles` and feeding the attribute transfer.
pub(crate) fn contour<P, S, O, I>(
    input: ExtractInput<'_, P, S>,
    source: &CellSource<'_>,
    phase: &MapPhase<'_>,
    points: &mut Vec<[O; 3]>,
    triangles: &mut Vec<[usize; 3]>,
    attributes: &mut AttributeTransfer<'_>,
) -> ValueOutput
where
    P: Component,
    S: Component,
    O: Component,
    I: MergeId,
{
    let map = {
        let _phase = log_phase("merge_map");
        phase.run(
            source.work_units(),
            source.grain(),
            Vec::<EdgeRecord<I>>::new,
            |local, units| {
                input.visit(source, units, |cell_id, ids, descriptor| {
                    input.crossings(ids, descriptor, |a, b, t| {
                        local.push(EdgeRecord::new(a, b, t, cell_id));
                    });
                });
            },
        )
    };

    let threads = map.threads;
    let total: usize = map.locals.iter().map(Vec::len).sum();
    if total == 0 {
        return ValueOutput {
            threads,
            ..Default::default()
        };
    }

    // Concatenate in work order and stamp each record with its slot.
    let mut records = vec![EdgeRecord::<I>::default(); total];
    {
        let _phase = log_phase("merge_gather");
        let mut offsets = Vec::with_capacity(map.locals.len());
        let mut offset = 0;
        for local in &map.locals {
            offsets.push(offset);
            offset += local.len();
        }
        split_like(&mut records, &map.locals)
            .into_par_iter()
            .zip(map.locals.par_iter().zip(offsets.par_iter()))
            .for_each(|(dest, (local, &offset))| {
                for (i, (d, s)) in dest.iter_mut().zip(local).enumerate() {
                    *d = EdgeRecord {
                        slot: I::from_usize(offset + i),
                        ..*s
                    };
                }
            });
    }
    drop(map);

    let triangle_count = total / 3;
    let triangle_cells: Option<Vec<usize>> = attributes.needs_cell_map().then(|| {
        records
            .par_chunks(3)
            .map(|triangle| triangle[0].cell.index())
            .collect()
    });

    {
        let _phase = log_phase("merge_sort");
        records.par_sort_unstable_by_key(|r| (r.low, r.high, r.slot));
    }

    // First record of every run of equal edges.
    let groups: Vec<usize> = (0..total)
        .into_par_iter()
        .filter(|&i| i == 0 || records[i].edge() != records[i - 1].edge())
        .collect();

    let first_point = points.len();
    let first_triangle = triangles.len();

    {
        let _phase = log_phase("merge_rewrite");
        triangles.resize(first_triangle + triangle_count, [0; 3]);
        let slots = &mut triangles[first_triangle..];
        for (g, &start) in groups.iter().enumerate() {
            let end = groups.get(g + 1).copied().unwrap_or(total);
            let point = first_point + g;
            for record in &records[start..end] {
                let slot = record.slot.index();
                slots[slot / 3][slot % 3] = point;
            }
        }
    }

    {
        let _phase = log_phase("merge_points");
        points.resize(first_point + groups.len(), [O::ZERO; 3]);
        points[first_point..]
            .par_iter_mut()
            .zip(groups.par_iter())
            .for_each(|(point, &start)| {
                let r = &records[start];
                *point = input.interpolate(r.low.index(), r.high.index(), r.fraction);
            });
    }

    {
        let _phase = log_phase("merge_attributes");
        attributes.interpolate_points(&records, &groups);
        if let Some(cells) = &triangle_cells {
            attributes.copy_cells(cells);
        }
    }

    ValueOutput {
        points: groups.len(),
        triangles: triangle_count,
        threads,
    }
}
