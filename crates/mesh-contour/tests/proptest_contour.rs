//! Property-based tests for contour extraction.
//!
//! These tests use proptest to generate random scalar fields over small
//! grids and verify invariants of the extracted surfaces.
//!
//! Run with: cargo test -p mesh-contour -- proptest

use hashbrown::HashMap;
use mesh_contour::{ContourFilter, ContourOutput, ContourParams, DataArray, UnstructuredMesh, grid};
use proptest::prelude::*;

// =============================================================================
// Strategies for generating random inputs
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum GridKind {
    Hexahedral,
    Tetrahedral,
    Voxel,
}

fn arb_grid_kind() -> impl Strategy<Value = GridKind> {
    prop_oneof![
        Just(GridKind::Hexahedral),
        Just(GridKind::Tetrahedral),
        Just(GridKind::Voxel),
    ]
}

/// A small grid with a random per-point field in `[-1, 1]`.
fn arb_mesh() -> impl Strategy<Value = UnstructuredMesh> {
    (arb_grid_kind(), prop::array::uniform3(1usize..=4)).prop_flat_map(|(kind, cells)| {
        let mesh = match kind {
            GridKind::Hexahedral => grid::hexahedral_grid(cells, 1.0),
            GridKind::Tetrahedral => grid::tetrahedral_grid(cells, 1.0),
            GridKind::Voxel => grid::voxel_grid(cells, 1.0),
        };
        let n = mesh.point_count();
        prop::collection::vec(-1.0..1.0f64, n).prop_map(move |field| {
            let mut mesh = mesh.clone();
            mesh.set_scalars(DataArray::scalars("field", field));
            mesh
        })
    })
}

fn arb_values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.9..0.9f64, 1..4)
}

fn run(mesh: &UnstructuredMesh, params: ContourParams, values: &[f64]) -> ContourOutput {
    ContourFilter::new(params)
        .with_values(values.to_vec())
        .execute(mesh)
        .unwrap()
}

// =============================================================================
// Extraction invariants
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fast_and_merged_have_equal_triangle_counts(mesh in arb_mesh(), values in arb_values()) {
        let fast = run(&mesh, ContourParams::fast(), &values);
        let merged = run(&mesh, ContourParams::merged(), &values);

        prop_assert_eq!(fast.triangle_count(), merged.triangle_count());
        prop_assert_eq!(fast.point_count(), 3 * fast.triangle_count());
        prop_assert!(merged.point_count() <= fast.point_count());
    }

    #[test]
    fn connectivity_is_valid(mesh in arb_mesh(), values in arb_values()) {
        for params in [ContourParams::fast(), ContourParams::merged()] {
            let output = run(&mesh, params, &values);
            for t in &output.triangles {
                for &p in t {
                    prop_assert!(p < output.point_count());
                }
            }
        }
    }

    #[test]
    fn value_ranges_partition_output(mesh in arb_mesh(), values in arb_values()) {
        let output = run(&mesh, ContourParams::merged(), &values);
        prop_assert_eq!(output.stats.value_ranges.len(), values.len());

        let mut next_point = 0;
        let mut next_triangle = 0;
        for (range, &value) in output.stats.value_ranges.iter().zip(&values) {
            prop_assert_eq!(range.value, value);
            prop_assert_eq!(range.first_point, next_point);
            prop_assert_eq!(range.first_triangle, next_triangle);
            next_point += range.point_count;
            next_triangle += range.triangle_count;

            // Triangles of a value only use that value's points.
            let triangles = &output.triangles[range.first_triangle..next_triangle];
            for t in triangles {
                for &p in t {
                    prop_assert!(p >= range.first_point && p < next_point);
                }
            }
        }
        prop_assert_eq!(next_point, output.point_count());
    }

    #[test]
    fn merged_surface_edges_are_shared_at_most_twice(mesh in arb_mesh(), value in -0.9..0.9f64) {
        let output = run(&mesh, ContourParams::merged(), &[value]);
        let mut uses: HashMap<(usize, usize), usize> = HashMap::new();
        for t in &output.triangles {
            for k in 0..3 {
                *uses.entry((t[k], t[(k + 1) % 3])).or_insert(0) += 1;
            }
        }
        // Consistent orientation: no directed edge is used twice.
        for (edge, count) in uses {
            prop_assert_eq!(count, 1, "directed edge {:?}", edge);
        }
    }

    #[test]
    fn points_lie_inside_mesh_bounds(mesh in arb_mesh(), values in arb_values()) {
        let (lo, hi) = mesh.bounds().unwrap();
        let output = run(&mesh, ContourParams::merged(), &values);
        for i in 0..output.point_count() {
            let p = output.point(i).unwrap();
            for axis in 0..3 {
                prop_assert!(p[axis] >= lo[axis] - 1e-9 && p[axis] <= hi[axis] + 1e-9);
            }
        }
    }

    #[test]
    fn scalar_tree_matches_full_scan(mesh in arb_mesh(), values in arb_values()) {
        let scan = run(&mesh, ContourParams::merged(), &values);
        let tree = run(
            &mesh,
            ContourParams { use_scalar_tree: true, ..ContourParams::merged() },
            &values,
        );
        prop_assert_eq!(scan.points, tree.points);
        prop_assert_eq!(scan.triangles, tree.triangles);
    }
}
