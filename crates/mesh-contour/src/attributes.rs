//! Point and cell attribute transfer onto the contour output.

use rayon::prelude::*;
use tracing::warn;

use crate::array::{ArrayData, AttributeSet, Component, DataArray, with_array_data};
use crate::extract::{EdgeRecord, MergeId};
use crate::params::ContourParams;
use crate::types::UnstructuredMesh;

/// An input array and the output array it fills.
struct ArrayPair<'a> {
    input: &'a DataArray,
    output: DataArray,
}

impl<'a> ArrayPair<'a> {
    fn new(input: &'a DataArray) -> Self {
        Self {
            input,
            output: DataArray::new(
                input.name(),
                input.components(),
                ArrayData::with_capacity(input.scalar_type(), 0),
            ),
        }
    }
}

/// Evaluate `$body` with the input and output buffers of a pair. Outputs
/// are created with the input's type, so other combinations never occur.
macro_rules! with_pair {
    ($pair:expr, |$input:ident, $output:ident| $body:expr) => {
        match ($pair.input.data(), $pair.output.data_mut()) {
            (ArrayData::U8($input), ArrayData::U8($output)) => $body,
            (ArrayData::I32($input), ArrayData::I32($output)) => $body,
            (ArrayData::U32($input), ArrayData::U32($output)) => $body,
            (ArrayData::I64($input), ArrayData::I64($output)) => $body,
            (ArrayData::F32($input), ArrayData::F32($output)) => $body,
            (ArrayData::F64($input), ArrayData::F64($output)) => $body,
            _ => {}
        }
    };
}

/// Accumulates output attributes across contour values.
///
/// Point arrays are interpolated along the same edge and fraction as the
/// merged point; cell arrays are copied once per triangle from the cell
/// that produced it. The contoured scalar array never takes part in
/// interpolation; with `compute_scalars` it is filled with the contour
/// value instead.
pub(crate) struct AttributeTransfer<'a> {
    points: Vec<ArrayPair<'a>>,
    cells: Vec<ArrayPair<'a>>,
    scalars: Option<DataArray>,
    skipped: Vec<String>,
}

impl<'a> AttributeTransfer<'a> {
    pub fn new(mesh: &'a UnstructuredMesh, scalars: &DataArray, params: &ContourParams) -> Self {
        let mut transfer = Self {
            points: Vec::new(),
            cells: Vec::new(),
            scalars: params.compute_scalars.then(|| {
                DataArray::new(
                    scalars.name(),
                    1,
                    ArrayData::with_capacity(scalars.scalar_type(), 0),
                )
            }),
            skipped: Vec::new(),
        };

        if !params.interpolate_attributes {
            return transfer;
        }

        for array in mesh.point_data().iter() {
            if array.name() == scalars.name() {
                continue;
            }
            if transfer.accepts(array, mesh.point_count(), "point") {
                transfer.points.push(ArrayPair::new(array));
            }
        }
        for array in mesh.cell_data().iter() {
            if transfer.accepts(array, mesh.cell_count(), "cell") {
                transfer.cells.push(ArrayPair::new(array));
            }
        }
        transfer
    }

    fn accepts(&mut self, array: &DataArray, expected: usize, kind: &str) -> bool {
        if array.components() > 0
            && array.len() % array.components() == 0
            && array.tuple_count() == expected
        {
            return true;
        }
        warn!(
            target: "mesh_contour::attributes",
            array = array.name(),
            kind,
            tuples = array.tuple_count(),
            components = array.components(),
            expected,
            "Skipping attribute array with mismatched size"
        );
        self.skipped.push(array.name().to_string());
        false
    }

    /// Whether cell arrays need the triangle-to-cell map.
    #[inline]
    pub fn needs_cell_map(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Append one interpolated tuple per merged point. `groups` holds the
    /// index of the first record of each point in `records`.
    pub fn interpolate_points<I: MergeId>(&mut self, records: &[EdgeRecord<I>], groups: &[usize]) {
        for pair in &mut self.points {
            let components = pair.input.components();
            with_pair!(pair, |input, output| interpolate_tuples(
                input, output, components, records, groups
            ));
        }
    }

    /// Append one tuple per triangle from its source cell.
    pub fn copy_cells(&mut self, triangle_cells: &[usize]) {
        for pair in &mut self.cells {
            let components = pair.input.components();
            with_pair!(pair, |input, output| copy_tuples(
                input,
                output,
                components,
                triangle_cells
            ));
        }
    }

    /// Append `count` copies of the contour value to the scalar output.
    pub fn fill_scalars(&mut self, count: usize, value: f64) {
        if let Some(scalars) = &mut self.scalars {
            with_array_data!(scalars.data_mut(), values => fill(values, count, value));
        }
    }

    /// Consume the transfer into output point and cell data.
    pub fn finish(self) -> (AttributeSet, AttributeSet, Vec<String>) {
        let mut point_data: AttributeSet = self.points.into_iter().map(|p| p.output).collect();
        let cell_data: AttributeSet = self.cells.into_iter().map(|p| p.output).collect();
        if let Some(scalars) = self.scalars {
            let name = scalars.name().to_string();
            point_data.add(scalars);
            point_data.set_active_scalars(&name);
        }
        (point_data, cell_data, self.skipped)
    }
}

fn interpolate_tuples<T: Component, I: MergeId>(
    input: &[T],
    output: &mut Vec<T>,
    components: usize,
    records: &[EdgeRecord<I>],
    groups: &[usize],
) {
    let start = output.len();
    output.resize(start + groups.len() * components, T::ZERO);
    output[start..]
        .par_chunks_mut(components)
        .zip(groups.par_iter())
        .for_each(|(tuple, &first)| {
            let record = &records[first];
            let a = record.low.index() * components;
            let b = record.high.index() * components;
            let t = record.fraction as f64;
            for (c, out) in tuple.iter_mut().enumerate() {
                let x0 = input[a + c].to_f64();
                let x1 = input[b + c].to_f64();
                *out = T::from_f64(x0 + t * (x1 - x0));
            }
        });
}

fn copy_tuples<T: Component>(input: &[T], output: &mut Vec<T>, components: usize, sources: &[usize]) {
    let start = output.len();
    output.resize(start + sources.len() * components, T::ZERO);
    output[start..]
        .par_chunks_mut(components)
        .zip(sources.par_iter())
        .for_each(|(tuple, &source)| {
            let from = source * components;
            tuple.copy_from_slice(&input[from..from + components]);
        });
}

fn fill<T: Component>(values: &mut Vec<T>, count: usize, value: f64) {
    values.resize(values.len() + count, T::from_f64(value));
}
