//! Duplicate-point extraction.
//!
//! Every crossing becomes its own output point, so triangle `k` of a value
//! is simply points `3k..3k+3`. No sort, no lookup, no attribute support.

use rayon::prelude::*;

use super::{CellSource, ExtractInput, MapPhase, split_like};
use crate::array::Component;
use crate::tracing_ext::log_phase;

/// Counts produced by one value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ValueOutput {
    pub points: usize,
    pub triangles: usize,
    pub threads: usize,
}

/// Contour one value, appending to `points` and `triangles`.
pub(crate) fn contour<P, S, O>(
    input: ExtractInput<'_, P, S>,
    source: &CellSource<'_>,
    phase: &MapPhase<'_>,
    points: &mut Vec<[O; 3]>,
    triangles: &mut Vec<[usize; 3]>,
) -> ValueOutput
where
    P: Component,
    S: Component,
    O: Component,
{
    let map = {
        let _phase = log_phase("fast_map");
        phase.run(
            source.work_units(),
            source.grain(),
            Vec::<[O; 3]>::new,
            |local, units| {
                input.visit(source, units, |_, ids, descriptor| {
                    input.crossings(ids, descriptor, |a, b, t| {
                        local.push(input.interpolate(a, b, t));
                    });
                });
            },
        )
    };

    let total: usize = map.locals.iter().map(Vec::len).sum();
    let first_point = points.len();
    let first_triangle = triangles.len();

    {
        let _phase = log_phase("fast_copy");
        points.resize(first_point + total, [O::ZERO; 3]);
        split_like(&mut points[first_point..], &map.locals)
            .into_par_iter()
            .zip(map.locals.par_iter())
            .for_each(|(dest, local)| dest.copy_from_slice(local));

        let count = total / 3;
        triangles.resize(first_triangle + count, [0; 3]);
        triangles[first_triangle..]
            .par_iter_mut()
            .enumerate()
            .for_each(|(k, triangle)| {
                let p = first_point + 3 * k;
                *triangle = [p, p + 1, p + 2];
            });
    }

    ValueOutput {
        points: total,
        triangles: total / 3,
        threads: map.threads,
    }
}
