//! Parallel isosurface extraction from unstructured meshes.
//!
//! This crate extracts triangle surfaces where a per-point scalar field
//! equals one or more contour values, over meshes of linear 3D cells
//! (tetrahedra, hexahedra, wedges, pyramids and voxels).
//!
//! # Features
//!
//! - **Table-driven extraction**: Per-shape case tables derived from face
//!   walks, consistent across shared faces
//! - **Two extractors**: A fast path with duplicate points, and an edge-merge
//!   path with shared points, attribute interpolation and normals
//! - **Deterministic parallelism**: rayon map phases whose output does not
//!   depend on the number of threads
//! - **Scalar trees**: Optional span-space acceleration for repeated values
//! - **Cancellation**: Abort handles and progress callbacks between values
//!
//! # Orientation
//!
//! Triangles are wound so their right-hand normal points out of the region
//! where the field is `>= value`, i.e. towards decreasing values.
//!
//! # Quick Start
//!
//! ```
//! use mesh_contour::{ContourBuilder, DataArray, grid};
//!
//! let mut mesh = grid::hexahedral_grid([2, 2, 2], 1.0);
//! let mut field = vec![0.0f64; mesh.point_count()];
//! field[13] = 1.0; // centre point
//! mesh.set_scalars(DataArray::scalars("s", field));
//!
//! let output = ContourBuilder::new(&mesh)
//!     .value(0.5)
//!     .merge_points(true)
//!     .build()
//!     .unwrap();
//!
//! // A closed octahedron around the centre.
//! assert_eq!(output.point_count(), 6);
//! assert_eq!(output.triangle_count(), 8);
//! ```
//!
//! # Reusing a Filter
//!
//! [`ContourFilter`] keeps scalar trees between calls, keyed by mesh and
//! array, which pays off when contouring the same mesh many times:
//!
//! ```
//! use mesh_contour::{ContourFilter, ContourParams, DataArray, grid};
//!
//! let mut mesh = grid::voxel_grid([10, 10, 10], 0.1);
//! let field: Vec<f32> = (0..mesh.point_count())
//!     .map(|i| mesh.point(i).unwrap().x as f32)
//!     .collect();
//! mesh.set_scalars(DataArray::scalars("x", field));
//!
//! let mut filter = ContourFilter::new(ContourParams {
//!     use_scalar_tree: true,
//!     ..ContourParams::merged()
//! });
//! for step in 1..5 {
//!     filter.values_mut().set_value(0, step as f64 * 0.2 + 0.05);
//!     let output = filter.execute(&mesh).unwrap();
//!     assert_eq!(output.triangle_count(), 200);
//! }
//! assert_eq!(filter.cached_tree_count(), 1);
//! ```

mod attributes;
mod builder;
mod contour_values;
mod error;
mod filter;
mod normals;
mod params;

pub mod array;
pub mod cell;
pub mod extract;
pub mod grid;
pub mod progress;
pub mod scalar_tree;
pub mod tracing_ext;
pub mod types;

pub use error::{ContourError, ContourErrorCode, ContourResult, RecoverySuggestion};

// Builder API (recommended for one-shot use)
pub use builder::ContourBuilder;

// Filter and output
pub use filter::{
    ContourFilter, ContourOutput, ContourStats, ExecutionState, POINTS_NAME, ValueRange,
    can_fully_process,
};

// Configuration
pub use contour_values::ContourValues;
pub use params::{ContourParams, OutputPrecision};

// Mesh and data model
pub use array::{ArrayData, AttributeSet, Component, DataArray, ScalarType};
pub use types::{CellArray, CellType, MeshId, UnstructuredMesh};

// Cell topology
pub use cell::{CellCursor, CellShape, ShapeDescriptor, sign_mask};

// Extraction building blocks
pub use extract::{EdgeRecord, MergeId, edge_fraction};
pub use normals::{NORMALS_NAME, PointLinks, triangle_normal};

// Acceleration and progress
pub use progress::{AbortHandle, Progress, ProgressCallback, ProgressTracker};
pub use scalar_tree::{CellBatches, ScalarTree, SpanSpace};
