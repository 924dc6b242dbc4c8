//! Fluent builder API for one-shot contour extraction.
//!
//! # Example
//!
//! ```
//! use mesh_contour::{ContourBuilder, DataArray, grid};
//!
//! let mut mesh = grid::tetrahedral_grid([8, 8, 8], 0.125);
//! let field: Vec<f32> = (0..mesh.point_count())
//!     .map(|i| {
//!         let p = mesh.point(i).unwrap();
//!         ((p.x - 0.5).powi(2) + (p.y - 0.5).powi(2) + (p.z - 0.5).powi(2)).sqrt() as f32
//!     })
//!     .collect();
//! mesh.set_scalars(DataArray::scalars("distance", field));
//!
//! let output = ContourBuilder::new(&mesh)
//!     .generate_values(3, (0.1, 0.4))  // three nested spheres
//!     .merge_points(true)
//!     .compute_normals(true)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(output.stats.value_ranges.len(), 3);
//! assert!(output.normals().is_some());
//! ```

use crate::contour_values::ContourValues;
use crate::error::ContourResult;
use crate::filter::{ContourFilter, ContourOutput};
use crate::params::{ContourParams, OutputPrecision};
use crate::progress::{AbortHandle, ProgressCallback};
use crate::scalar_tree::ScalarTree;
use crate::types::UnstructuredMesh;

/// Fluent builder for contour extraction.
///
/// Collects values and parameters, then runs a fresh [`ContourFilter`].
/// Keep a filter instead when extracting repeatedly from the same mesh, so
/// scalar trees are reused.
///
/// # Example
///
/// ```
/// use mesh_contour::{ContourBuilder, DataArray, OutputPrecision, grid};
///
/// let mut mesh = grid::hexahedral_grid([3, 3, 3], 1.0);
/// let heights: Vec<f64> = (0..mesh.point_count())
///     .map(|i| mesh.point(i).unwrap().z)
///     .collect();
/// mesh.add_point_array(DataArray::scalars("height", heights));
///
/// let output = ContourBuilder::new(&mesh)
///     .scalar_array("height")
///     .values([0.5, 1.5])
///     .output_precision(OutputPrecision::Single)
///     .build()
///     .unwrap();
///
/// // Two flat layers of 9 quads each, two triangles per quad.
/// assert_eq!(output.triangle_count(), 36);
/// ```
pub struct ContourBuilder<'a> {
    mesh: &'a UnstructuredMesh,
    values: ContourValues,
    generate: Option<(usize, (f64, f64))>,
    params: ContourParams,
    scalar_tree: Option<Box<dyn ScalarTree>>,
    abort: Option<AbortHandle>,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> ContourBuilder<'a> {
    /// Create a builder for `mesh` with no values and default parameters.
    pub fn new(mesh: &'a UnstructuredMesh) -> Self {
        Self {
            mesh,
            values: ContourValues::new(),
            generate: None,
            params: ContourParams::default(),
            scalar_tree: None,
            abort: None,
            progress_callback: None,
        }
    }

    // =========================================================================
    // Contour Values
    // =========================================================================

    /// Add one contour value.
    pub fn value(mut self, value: f64) -> Self {
        self.values.push(value);
        self
    }

    /// Add several contour values, in order.
    pub fn values(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        for value in values {
            self.values.push(value);
        }
        self
    }

    /// Replace the values with `count` evenly spaced values over `range`.
    ///
    /// Invalid counts or ranges are reported by [`build`](Self::build).
    pub fn generate_values(mut self, count: usize, range: (f64, f64)) -> Self {
        self.generate = Some((count, range));
        self
    }

    // =========================================================================
    // Output Configuration
    // =========================================================================

    /// Share points between triangles crossing the same mesh edge.
    pub fn merge_points(mut self, enable: bool) -> Self {
        self.params.merge_points = enable;
        self
    }

    /// Interpolate point arrays and copy cell arrays to the output.
    pub fn interpolate_attributes(mut self, enable: bool) -> Self {
        self.params.interpolate_attributes = enable;
        self
    }

    /// Generate unit point normals. Implies merging.
    pub fn compute_normals(mut self, enable: bool) -> Self {
        self.params.compute_normals = enable;
        self
    }

    /// Carry the scalar array onto the output, filled with contour values.
    pub fn compute_scalars(mut self, enable: bool) -> Self {
        self.params.compute_scalars = enable;
        self
    }

    /// Set the precision of output coordinates.
    pub fn output_precision(mut self, precision: OutputPrecision) -> Self {
        self.params.output_precision = precision;
        self
    }

    /// Contour the named point array instead of the active scalars.
    pub fn scalar_array(mut self, name: impl Into<String>) -> Self {
        self.params.scalar_array = Some(name.into());
        self
    }

    /// Replace all parameters at once.
    pub fn params(mut self, params: ContourParams) -> Self {
        self.params = params;
        self
    }

    // =========================================================================
    // Execution Configuration
    // =========================================================================

    /// Visit only candidate cells from the default scalar tree.
    pub fn use_scalar_tree(mut self, enable: bool) -> Self {
        self.params.use_scalar_tree = enable;
        self
    }

    /// Visit only candidate cells from a tree built like `prototype`.
    pub fn scalar_tree(mut self, prototype: Box<dyn ScalarTree>) -> Self {
        self.params.use_scalar_tree = true;
        self.scalar_tree = Some(prototype);
        self
    }

    /// Run on the calling thread only.
    pub fn sequential(mut self, enable: bool) -> Self {
        self.params.sequential = enable;
        self
    }

    /// Run on a dedicated pool of `threads` workers.
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.params.num_threads = Some(threads);
        self
    }

    // =========================================================================
    // Progress Reporting
    // =========================================================================

    /// Set a progress callback, invoked after every contour value.
    ///
    /// Return `false` from the callback to cancel the remaining values.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_contour::{ContourBuilder, DataArray, ProgressCallback, grid};
    ///
    /// let mut mesh = grid::hexahedral_grid([2, 2, 2], 1.0);
    /// mesh.set_scalars(DataArray::scalars("s", vec![0.0f64; mesh.point_count()]));
    ///
    /// let callback: ProgressCallback = Box::new(|progress| {
    ///     println!("{}%: {}", progress.percent(), progress.message);
    ///     true // continue
    /// });
    ///
    /// let output = ContourBuilder::new(&mesh)
    ///     .values([0.5, 1.5])
    ///     .with_progress(callback)
    ///     .build()
    ///     .unwrap();
    /// assert!(output.is_empty());
    /// ```
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Share `handle` with the filter so another thread can cancel the run.
    pub fn with_abort_handle(mut self, handle: AbortHandle) -> Self {
        self.abort = Some(handle);
        self
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Run the extraction.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Generated values were requested with a zero count or a non-finite range
    /// - The parameters are inconsistent
    /// - The scalars are missing, misshapen or of an unsupported type
    /// - The points are neither f32 nor f64
    /// - The worker pool or scalar tree cannot be built
    pub fn build(mut self) -> ContourResult<ContourOutput> {
        if let Some((count, range)) = self.generate {
            self.values.generate_values(count, range)?;
        }

        let mut filter = ContourFilter::new(self.params).with_values(self.values);
        if let Some(abort) = self.abort {
            filter.set_abort_handle(abort);
        }
        if let Some(prototype) = self.scalar_tree {
            filter.set_scalar_tree(prototype);
        }
        if let Some(callback) = self.progress_callback {
            filter.set_progress_callback(callback);
        }
        filter.execute(self.mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::DataArray;
    use crate::error::ContourErrorCode;
    use crate::grid::hexahedral_grid;
    use crate::scalar_tree::SpanSpace;

    fn sloped() -> UnstructuredMesh {
        let mut mesh = hexahedral_grid([3, 3, 3], 1.0);
        let field: Vec<f64> = (0..mesh.point_count())
            .map(|i| {
                let p = mesh.point(i).unwrap();
                p.x + 0.3 * p.y
            })
            .collect();
        mesh.set_scalars(DataArray::scalars("slope", field));
        mesh
    }

    #[test]
    fn test_builder_defaults() {
        let mesh = sloped();
        let output = ContourBuilder::new(&mesh).value(1.2).build().unwrap();
        assert!(!output.stats.merged);
        assert_eq!(output.point_count(), 3 * output.triangle_count());
    }

    #[test]
    fn test_builder_generated_values() {
        let mesh = sloped();
        let output = ContourBuilder::new(&mesh)
            .value(100.0)
            .generate_values(4, (0.5, 2.5))
            .merge_points(true)
            .build()
            .unwrap();
        let values: Vec<f64> = output.stats.value_ranges.iter().map(|r| r.value).collect();
        assert_eq!(values.len(), 4);
        assert_eq!(values[0], 0.5);
        assert_eq!(values[3], 2.5);
    }

    #[test]
    fn test_builder_rejects_zero_count() {
        let mesh = sloped();
        let err = ContourBuilder::new(&mesh)
            .generate_values(0, (0.0, 1.0))
            .build()
            .unwrap_err();
        assert_eq!(err.code(), ContourErrorCode::InvalidParams);

        let err = ContourBuilder::new(&mesh).value(1.0).num_threads(0).build().unwrap_err();
        assert_eq!(err.code(), ContourErrorCode::InvalidParams);
    }

    #[test]
    fn test_builder_custom_tree() {
        let mesh = sloped();
        let output = ContourBuilder::new(&mesh)
            .values([1.0, 2.0])
            .scalar_tree(Box::new(SpanSpace::new().with_resolution(3).with_batch_size(2)))
            .build()
            .unwrap();
        assert!(output.stats.used_scalar_tree);
        assert!(output.triangle_count() > 0);
    }

    #[test]
    fn test_builder_shared_abort() {
        let mesh = sloped();
        let abort = AbortHandle::new();
        abort.abort();
        let output = ContourBuilder::new(&mesh)
            .value(1.0)
            .with_abort_handle(abort.clone())
            .build()
            .unwrap();
        assert!(output.stats.cancelled);
        assert!(abort.is_aborted());
    }
}
