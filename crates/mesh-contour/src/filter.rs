//! The contour filter: validation, dispatch and the per-value loop.

use std::fmt;

use hashbrown::HashMap;
use nalgebra::Point3;
use tracing::debug;

use crate::array::{ArrayData, AttributeSet, Component, DataArray, ScalarType};
use crate::attributes::AttributeTransfer;
use crate::cell::{CellCursor, CellShape, MAX_CELL_EDGES};
use crate::contour_values::ContourValues;
use crate::error::{ContourError, ContourResult};
use crate::extract::{
    CellSource, ExtractInput, MapPhase, MergeId, ScalarField, fast, merge, with_scalar_field,
};
use crate::normals::{NORMALS_NAME, point_normals};
use crate::params::{ContourParams, OutputPrecision};
use crate::progress::{AbortHandle, ProgressCallback, ProgressTracker};
use crate::scalar_tree::{ScalarTree, SpanSpace};
use crate::tracing_ext::{OperationTimer, log_contour_stats, log_value_result};
use crate::types::{MeshId, UnstructuredMesh};

/// Name of the output point coordinate array.
pub const POINTS_NAME: &str = "Points";

/// Where the filter is in its current (or last) execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
    #[default]
    Idle,
    /// Validating input and preparing acceleration structures.
    Classifying,
    /// Extracting the value at `value_index`.
    Contouring { value_index: usize },
    Done,
}

/// Output ranges produced by one contour value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub value: f64,
    pub first_point: usize,
    pub point_count: usize,
    pub first_triangle: usize,
    pub triangle_count: usize,
}

/// Statistics from one extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourStats {
    /// Largest number of worker threads that took part in one value.
    pub threads_used: usize,
    /// Whether 64-bit ids were needed for merging.
    pub large_ids: bool,
    /// Whether the edge-merge extractor ran.
    pub merged: bool,
    /// Whether candidate cells came from a scalar tree.
    pub used_scalar_tree: bool,
    /// Whether the run stopped early on an abort request.
    pub cancelled: bool,
    /// One entry per processed value, in value order.
    pub value_ranges: Vec<ValueRange>,
    /// Attribute arrays left out because their size did not match the mesh.
    pub skipped_arrays: Vec<String>,
}

/// Triangle surface produced by the filter.
#[derive(Debug, Clone)]
pub struct ContourOutput {
    /// Point coordinates, 3 components of f32 or f64.
    pub points: DataArray,
    /// Triangles as point id triples.
    pub triangles: Vec<[usize; 3]>,
    pub point_data: AttributeSet,
    /// One tuple per triangle.
    pub cell_data: AttributeSet,
    pub stats: ContourStats,
}

impl ContourOutput {
    fn empty(precision: ScalarType) -> Self {
        Self {
            points: DataArray::new(POINTS_NAME, 3, ArrayData::with_capacity(precision, 0)),
            triangles: Vec::new(),
            point_data: AttributeSet::new(),
            cell_data: AttributeSet::new(),
            stats: ContourStats::default(),
        }
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.points.tuple_count()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Position of output point `index`.
    pub fn point(&self, index: usize) -> Option<Point3<f64>> {
        Some(Point3::new(
            self.points.value(index, 0)?,
            self.points.value(index, 1)?,
            self.points.value(index, 2)?,
        ))
    }

    /// The generated normals, if requested.
    pub fn normals(&self) -> Option<&DataArray> {
        self.point_data.get(NORMALS_NAME)
    }
}

type TreeCache = HashMap<(MeshId, String), Box<dyn ScalarTree>>;

/// Reusable isosurface extractor.
///
/// Holds parameters, contour values, the scalar-tree cache and the abort
/// handle across calls. Use [`ContourBuilder`](crate::ContourBuilder) for
/// one-shot extraction.
///
/// # Example
///
/// ```
/// use mesh_contour::{ContourFilter, ContourParams, DataArray, grid};
///
/// let mut mesh = grid::hexahedral_grid([4, 4, 4], 0.25);
/// let field: Vec<f64> = (0..mesh.point_count())
///     .map(|i| mesh.point(i).unwrap().coords.norm())
///     .collect();
/// mesh.set_scalars(DataArray::scalars("distance", field));
///
/// let mut filter = ContourFilter::new(ContourParams::merged()).with_values(vec![0.5]);
/// let output = filter.execute(&mesh).unwrap();
/// assert!(output.triangle_count() > 0);
/// ```
pub struct ContourFilter {
    params: ContourParams,
    values: ContourValues,
    scalar_tree: Option<Box<dyn ScalarTree>>,
    tree_cache: TreeCache,
    abort: AbortHandle,
    progress_callback: Option<ProgressCallback>,
    state: ExecutionState,
}

impl fmt::Debug for ContourFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContourFilter")
            .field("params", &self.params)
            .field("values", &self.values)
            .field("scalar_tree", &self.scalar_tree)
            .field("cached_trees", &self.tree_cache.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Default for ContourFilter {
    fn default() -> Self {
        Self::new(ContourParams::default())
    }
}

impl ContourFilter {
    pub fn new(params: ContourParams) -> Self {
        Self {
            params,
            values: ContourValues::new(),
            scalar_tree: None,
            tree_cache: HashMap::new(),
            abort: AbortHandle::new(),
            progress_callback: None,
            state: ExecutionState::Idle,
        }
    }

    /// Replace the contour values.
    pub fn with_values(mut self, values: impl Into<ContourValues>) -> Self {
        self.values = values.into();
        self
    }

    #[inline]
    pub fn values(&self) -> &ContourValues {
        &self.values
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut ContourValues {
        &mut self.values
    }

    #[inline]
    pub fn params(&self) -> &ContourParams {
        &self.params
    }

    #[inline]
    pub fn params_mut(&mut self) -> &mut ContourParams {
        &mut self.params
    }

    /// Use `prototype` instead of [`SpanSpace`] for scalar trees. Cached
    /// trees built from the previous prototype are dropped.
    pub fn set_scalar_tree(&mut self, prototype: Box<dyn ScalarTree>) {
        self.scalar_tree = Some(prototype);
        self.tree_cache.clear();
    }

    /// Drop every cached scalar tree.
    pub fn clear_scalar_tree_cache(&mut self) {
        self.tree_cache.clear();
    }

    /// Number of scalar trees currently cached.
    #[inline]
    pub fn cached_tree_count(&self) -> usize {
        self.tree_cache.len()
    }

    /// Handle for cancelling a running extraction from another thread.
    ///
    /// The flag stays set until [`AbortHandle::reset`] is called, so later
    /// calls return immediately with `stats.cancelled` set.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Share an existing abort handle.
    pub fn set_abort_handle(&mut self, handle: AbortHandle) {
        self.abort = handle;
    }

    /// Invoke `callback` after every contour value; returning `false`
    /// cancels the run.
    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress_callback = Some(callback);
    }

    #[inline]
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Extract the isosurfaces of every contour value from `mesh`.
    ///
    /// # Errors
    ///
    /// Fails before any value is processed when the scalars are missing,
    /// misshapen or of an unsupported type, when the point precision is not
    /// f32 or f64, or when the worker pool or scalar tree cannot be built.
    pub fn execute(&mut self, mesh: &UnstructuredMesh) -> ContourResult<ContourOutput> {
        self.params.validate()?;
        let _timer = OperationTimer::with_context("contour", mesh.cell_count(), mesh.point_count());

        self.state = ExecutionState::Classifying;
        let threads = if self.params.sequential {
            Some(1)
        } else {
            self.params.num_threads
        };
        let result = match threads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
                pool.install(|| self.execute_on_pool(mesh))
            }
            None => self.execute_on_pool(mesh),
        };

        match &result {
            Ok(output) => {
                self.state = ExecutionState::Done;
                log_contour_stats(output);
            }
            Err(_) => self.state = ExecutionState::Idle,
        }
        result
    }

    fn execute_on_pool(&mut self, mesh: &UnstructuredMesh) -> ContourResult<ContourOutput> {
        let scalars = resolve_scalars(mesh, self.params.scalar_array.as_deref())?;
        let field = ScalarField::from_array(scalars).ok_or_else(|| {
            ContourError::UnsupportedScalarType {
                name: scalars.name().to_string(),
                found: scalars.scalar_type(),
            }
        })?;

        let input_precision = mesh.points().scalar_type();
        if !matches!(input_precision, ScalarType::F32 | ScalarType::F64) {
            return Err(ContourError::UnsupportedPointPrecision {
                found: input_precision,
            });
        }
        let output_precision = match self.params.output_precision {
            OutputPrecision::MatchInput => input_precision,
            OutputPrecision::Single => ScalarType::F32,
            OutputPrecision::Double => ScalarType::F64,
        };

        if self.values.is_empty() || mesh.cell_count() == 0 {
            debug!(
                target: "mesh_contour::filter",
                values = self.values.len(),
                cells = mesh.cell_count(),
                "Nothing to contour"
            );
            return Ok(ContourOutput::empty(output_precision));
        }

        match (mesh.points().data(), output_precision) {
            (ArrayData::F32(points), ScalarType::F32) => self.run::<f32, f32>(mesh, points, field, scalars),
            (ArrayData::F32(points), _) => self.run::<f32, f64>(mesh, points, field, scalars),
            (ArrayData::F64(points), ScalarType::F32) => self.run::<f64, f32>(mesh, points, field, scalars),
            (ArrayData::F64(points), _) => self.run::<f64, f64>(mesh, points, field, scalars),
            _ => Err(ContourError::UnsupportedPointPrecision {
                found: input_precision,
            }),
        }
    }

    fn run<P: Component, O: Component>(
        &mut self,
        mesh: &UnstructuredMesh,
        points: &[P],
        field: ScalarField<'_>,
        scalars: &DataArray,
    ) -> ContourResult<ContourOutput> {
        with_scalar_field!(field, values => self.contour::<P, _, O>(mesh, points, values, scalars))
    }

    fn contour<P: Component, S: Component, O: Component>(
        &mut self,
        mesh: &UnstructuredMesh,
        points: &[P],
        scalar_values: &[S],
        scalars: &DataArray,
    ) -> ContourResult<ContourOutput> {
        let tree = if self.params.use_scalar_tree {
            prepare_tree(&mut self.tree_cache, self.scalar_tree.as_deref(), mesh, scalars)?
        } else {
            None
        };

        let merged = self.params.needs_merging();
        // Record slots run up to three per triangle of a value.
        let max_slots = mesh.cell_count().saturating_mul(3 * MAX_CELL_EDGES);
        let large_ids = !u32::fits(mesh.point_count()) || !u32::fits(max_slots);
        let mut stats = ContourStats {
            merged,
            large_ids,
            used_scalar_tree: tree.is_some(),
            ..Default::default()
        };

        let values = self.values.values();
        let tracker = ProgressTracker::new(values.len() as u64, self.abort.clone());
        let phase = MapPhase::new(self.abort.flag());
        let cursor = CellCursor::new(mesh);
        let mut attributes = AttributeTransfer::new(mesh, scalars, &self.params);
        let mut out_points: Vec<[O; 3]> = Vec::new();
        let mut triangles: Vec<[usize; 3]> = Vec::new();

        for (index, &value) in values.iter().enumerate() {
            if self.abort.is_aborted() {
                stats.cancelled = true;
                break;
            }
            self.state = ExecutionState::Contouring { value_index: index };

            let source = match tree {
                Some(tree) => CellSource::Batches(tree.cell_batches(value)),
                None => CellSource::All(mesh.cell_count()),
            };
            let input = ExtractInput {
                cursor,
                points,
                scalars: scalar_values,
                value,
            };
            let first_point = out_points.len();
            let first_triangle = triangles.len();

            let output = match (merged, large_ids) {
                (false, _) => fast::contour(input, &source, &phase, &mut out_points, &mut triangles),
                (true, false) => merge::contour::<P, S, O, u32>(
                    input,
                    &source,
                    &phase,
                    &mut out_points,
                    &mut triangles,
                    &mut attributes,
                ),
                (true, true) => merge::contour::<P, S, O, u64>(
                    input,
                    &source,
                    &phase,
                    &mut out_points,
                    &mut triangles,
                    &mut attributes,
                ),
            };
            attributes.fill_scalars(output.points, value);

            stats.threads_used = stats.threads_used.max(output.threads);
            stats.value_ranges.push(ValueRange {
                value,
                first_point,
                point_count: output.points,
                first_triangle,
                triangle_count: output.triangles,
            });
            log_value_result(index, value, output.points, output.triangles);

            tracker.increment();
            let message = format!("contour value {} of {}", index + 1, values.len());
            if !tracker.maybe_callback(self.progress_callback.as_ref(), message) {
                stats.cancelled = true;
                break;
            }
        }

        let (mut point_data, cell_data, skipped) = attributes.finish();
        stats.skipped_arrays = skipped;

        if self.params.compute_normals {
            let normals = if large_ids || !u32::fits(triangles.len()) {
                point_normals::<O, u64>(&out_points, &triangles)
            } else {
                point_normals::<O, u32>(&out_points, &triangles)
            };
            point_data.add(normals);
        }

        Ok(ContourOutput {
            points: DataArray::vectors(POINTS_NAME, out_points),
            triangles,
            point_data,
            cell_data,
            stats,
        })
    }
}

/// The scalar array named `name`, or the active scalars.
fn resolve_scalars<'m>(mesh: &'m UnstructuredMesh, name: Option<&str>) -> ContourResult<&'m DataArray> {
    let scalars = match name {
        Some(name) => mesh.point_data().get(name),
        None => mesh.point_data().active_scalars(),
    }
    .ok_or_else(|| ContourError::missing_scalars(name))?;

    if scalars.components() != 1 || scalars.tuple_count() != mesh.point_count() {
        return Err(ContourError::ScalarShapeMismatch {
            name: scalars.name().to_string(),
            tuples: scalars.tuple_count(),
            components: scalars.components(),
            expected: mesh.point_count(),
        });
    }
    Ok(scalars)
}

/// Build or fetch the cached tree for `(mesh, scalars)`.
///
/// Returns `None` when every point has the same value; no cell can be
/// crossed then and the full scan exits immediately.
fn prepare_tree<'c>(
    cache: &'c mut TreeCache,
    prototype: Option<&dyn ScalarTree>,
    mesh: &UnstructuredMesh,
    scalars: &DataArray,
) -> ContourResult<Option<&'c dyn ScalarTree>> {
    match scalars.range() {
        Some((lo, hi)) if hi > lo => {}
        _ => return Ok(None),
    }

    let key = (mesh.id(), scalars.name().to_string());
    if !cache.contains_key(&key) {
        let mut tree = match prototype {
            Some(prototype) => prototype.new_instance(),
            None => Box::new(SpanSpace::new()),
        };
        tree.build(mesh, scalars)?;
        cache.insert(key.clone(), tree);
    } else {
        debug!(
            target: "mesh_contour::scalar_tree",
            mesh = mesh.id().get(),
            scalars = scalars.name(),
            "Reusing cached scalar tree"
        );
    }
    Ok(cache.get(&key).map(|tree| tree.as_ref()))
}

/// Whether every cell of `mesh` is a supported linear solid and the scalar
/// array (named, or the active scalars) has a contourable type.
///
/// A missing scalar array does not make the mesh unprocessable.
pub fn can_fully_process(mesh: &UnstructuredMesh, scalar_array: Option<&str>) -> bool {
    let cells_supported = mesh
        .cells()
        .iter()
        .zip(mesh.cell_types())
        .all(|(ids, &cell_type)| {
            cell_type.is_linear_solid()
                && ids.len() == CellShape::from_cell_type(cell_type).vertex_count()
        });
    let scalars = match scalar_array {
        Some(name) => mesh.point_data().get(name),
        None => mesh.point_data().active_scalars(),
    };
    cells_supported && scalars.is_none_or(|s| s.scalar_type().is_contour_scalar())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ContourErrorCode;
    use crate::grid::{hexahedral_grid, single_cell};
    use crate::types::CellType;

    fn tetra(scalars: Vec<f64>) -> UnstructuredMesh {
        let mut mesh = single_cell(CellType::Tetra).unwrap();
        mesh.set_scalars(DataArray::scalars("s", scalars));
        mesh
    }

    fn ramp(cells: usize) -> UnstructuredMesh {
        let mut mesh = hexahedral_grid([cells; 3], 1.0);
        let field: Vec<f64> = (0..mesh.point_count())
            .map(|i| {
                let p = mesh.point(i).unwrap();
                p.x + 0.5 * p.y + 0.25 * p.z
            })
            .collect();
        mesh.set_scalars(DataArray::scalars("ramp", field));
        mesh
    }

    #[test]
    fn test_tetra_cases() {
        let mut filter = ContourFilter::default().with_values(vec![1.0]);
        assert!(filter.execute(&tetra(vec![0.0; 4])).unwrap().is_empty());

        let output = filter.execute(&tetra(vec![2.0, 2.0, 0.0, 0.0])).unwrap();
        assert_eq!(output.triangle_count(), 2);
        assert_eq!(output.point_count(), 6);
        assert_eq!(filter.state(), ExecutionState::Done);
        assert!(!output.stats.merged);
    }

    #[test]
    fn test_missing_scalars() {
        let mesh = single_cell(CellType::Hexahedron).unwrap();
        let mut filter = ContourFilter::default().with_values(vec![0.5]);
        let err = filter.execute(&mesh).unwrap_err();
        assert_eq!(err.code(), ContourErrorCode::MissingScalars);
        assert_eq!(filter.state(), ExecutionState::Idle);

        filter.params_mut().scalar_array = Some("nope".into());
        let err = filter.execute(&tetra(vec![0.0; 4])).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_scalar_validation() {
        let mut mesh = single_cell(CellType::Tetra).unwrap();
        let mut filter = ContourFilter::default().with_values(vec![0.5]);

        mesh.set_scalars(DataArray::scalars("s", vec![0.0f64; 3]));
        let err = filter.execute(&mesh).unwrap_err();
        assert_eq!(err.code(), ContourErrorCode::ScalarShapeMismatch);

        mesh.set_scalars(DataArray::scalars("s", vec![0u8; 4]));
        let err = filter.execute(&mesh).unwrap_err();
        assert_eq!(err.code(), ContourErrorCode::UnsupportedScalarType);

        mesh.set_scalars(DataArray::scalars("s", vec![0i32, 2, 0, 0]));
        assert_eq!(filter.execute(&mesh).unwrap().triangle_count(), 1);
    }

    #[test]
    fn test_unsupported_point_precision() {
        let points = DataArray::vectors("Points", vec![[0i32; 3]; 4]);
        let cells = crate::types::CellArray::from_cells(vec![vec![0usize, 1, 2, 3]]);
        let mut mesh = UnstructuredMesh::new(points, cells, vec![CellType::Tetra]).unwrap();
        mesh.set_scalars(DataArray::scalars("s", vec![0.0f32; 4]));

        let err = ContourFilter::default()
            .with_values(vec![0.5])
            .execute(&mesh)
            .unwrap_err();
        assert_eq!(err.code(), ContourErrorCode::UnsupportedPointPrecision);
    }

    #[test]
    fn test_empty_inputs() {
        let mesh = tetra(vec![0.0, 1.0, 2.0, 3.0]);
        let output = ContourFilter::default().execute(&mesh).unwrap();
        assert!(output.is_empty());
        assert_eq!(output.points.scalar_type(), ScalarType::F64);

        let mut empty = UnstructuredMesh::empty();
        empty.set_scalars(DataArray::scalars("s", Vec::<f32>::new()));
        let output = ContourFilter::default()
            .with_values(vec![1.0])
            .execute(&empty)
            .unwrap();
        assert!(output.is_empty());
        assert_eq!(output.points.scalar_type(), ScalarType::F32);
    }

    #[test]
    fn test_output_precision() {
        let mesh = ramp(2);
        let mut filter = ContourFilter::new(ContourParams {
            output_precision: OutputPrecision::Single,
            ..Default::default()
        })
        .with_values(vec![1.3]);
        let output = filter.execute(&mesh).unwrap();
        assert_eq!(output.points.scalar_type(), ScalarType::F32);
        assert!(output.point_count() > 0);
    }

    #[test]
    fn test_value_ranges_partition_output() {
        let mesh = ramp(4);
        let mut filter = ContourFilter::new(ContourParams::merged()).with_values(vec![1.1, 2.7, 4.4]);
        let output = filter.execute(&mesh).unwrap();

        let ranges = &output.stats.value_ranges;
        assert_eq!(ranges.len(), 3);
        let mut next_point = 0;
        let mut next_triangle = 0;
        for range in ranges {
            assert_eq!(range.first_point, next_point);
            assert_eq!(range.first_triangle, next_triangle);
            assert!(range.triangle_count > 0);
            next_point += range.point_count;
            next_triangle += range.triangle_count;
        }
        assert_eq!(next_point, output.point_count());
        assert_eq!(next_triangle, output.triangle_count());
    }

    #[test]
    fn test_abort_before_execute() {
        let mesh = ramp(3);
        let mut filter = ContourFilter::default().with_values(vec![1.0, 2.0]);
        filter.abort_handle().abort();

        let output = filter.execute(&mesh).unwrap();
        assert!(output.stats.cancelled);
        assert!(output.is_empty());

        filter.abort_handle().reset();
        let output = filter.execute(&mesh).unwrap();
        assert!(!output.stats.cancelled);
        assert_eq!(output.stats.value_ranges.len(), 2);
    }

    #[test]
    fn test_callback_cancels_after_first_value() {
        let mesh = ramp(3);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let mut filter = ContourFilter::new(ContourParams::merged()).with_values(vec![1.0, 2.0, 3.0]);
        filter.set_progress_callback(Box::new(move |progress| {
            seen.fetch_add(1, Ordering::SeqCst);
            progress.current < 1
        }));
        let output = filter.execute(&mesh).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(output.stats.cancelled);
        assert_eq!(output.stats.value_ranges.len(), 1);
        assert!(output.triangles.iter().flatten().all(|&p| p < output.point_count()));
        assert!(!filter.abort_handle().is_aborted());
    }

    #[test]
    fn test_callback_cancel_does_not_outlive_the_call() {
        let mesh = ramp(4);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let mut filter = ContourFilter::new(ContourParams::merged()).with_values(vec![1.5, 2.5]);
        filter.set_progress_callback(Box::new(move |progress| {
            seen.fetch_add(1, Ordering::SeqCst);
            progress.current < 1
        }));

        let first = filter.execute(&mesh).unwrap();
        assert!(first.stats.cancelled);
        assert_eq!(first.stats.value_ranges.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let second = filter.execute(&mesh).unwrap();
        assert!(second.stats.cancelled);
        assert!(second.triangle_count() > 0);
        assert_eq!(second.triangles, first.triangles);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_tree_cache() {
        let mut mesh = ramp(3);
        let mut filter = ContourFilter::new(ContourParams {
            use_scalar_tree: true,
            ..Default::default()
        })
        .with_values(vec![1.5]);

        let first = filter.execute(&mesh).unwrap();
        assert!(first.stats.used_scalar_tree);
        assert_eq!(filter.cached_tree_count(), 1);

        filter.execute(&mesh).unwrap();
        assert_eq!(filter.cached_tree_count(), 1);

        // Mutation changes the mesh id.
        mesh.add_point_array(DataArray::scalars("extra", vec![0u8; mesh.point_count()]));
        filter.execute(&mesh).unwrap();
        assert_eq!(filter.cached_tree_count(), 2);

        filter.clear_scalar_tree_cache();
        assert_eq!(filter.cached_tree_count(), 0);
    }

    #[test]
    fn test_constant_field_skips_tree() {
        let mut mesh = hexahedral_grid([2, 2, 2], 1.0);
        mesh.set_scalars(DataArray::scalars("c", vec![1.0f32; mesh.point_count()]));
        let mut filter = ContourFilter::new(ContourParams {
            use_scalar_tree: true,
            ..Default::default()
        })
        .with_values(vec![1.0]);
        let output = filter.execute(&mesh).unwrap();
        assert!(!output.stats.used_scalar_tree);
        assert!(output.is_empty());
        assert_eq!(filter.cached_tree_count(), 0);
    }

    #[test]
    fn test_sequential_uses_one_thread() {
        let mesh = ramp(6);
        let mut filter = ContourFilter::new(ContourParams {
            sequential: true,
            ..ContourParams::merged()
        })
        .with_values(vec![3.0]);
        let output = filter.execute(&mesh).unwrap();
        assert_eq!(output.stats.threads_used, 1);
    }

    #[test]
    fn test_can_fully_process() {
        let mesh = tetra(vec![0.0; 4]);
        assert!(can_fully_process(&mesh, None));
        assert!(can_fully_process(&mesh, Some("missing")));

        let mut bytes = single_cell(CellType::Pyramid).unwrap();
        bytes.set_scalars(DataArray::scalars("b", vec![0u8; 5]));
        assert!(!can_fully_process(&bytes, None));

        let points = DataArray::vectors("Points", vec![[0.0f32; 3]; 3]);
        let cells = crate::types::CellArray::from_cells(vec![vec![0usize, 1, 2]]);
        let triangle = UnstructuredMesh::new(points, cells, vec![CellType::Triangle]).unwrap();
        assert!(!can_fully_process(&triangle, None));

        // A linear solid type with the wrong number of points.
        let points = DataArray::vectors("Points", vec![[0.0f32; 3]; 5]);
        let cells = crate::types::CellArray::from_cells(vec![vec![0usize, 1, 2, 3, 4]]);
        let short = UnstructuredMesh::new(points, cells, vec![CellType::Tetra]).unwrap();
        assert!(!can_fully_process(&short, None));
    }
}
