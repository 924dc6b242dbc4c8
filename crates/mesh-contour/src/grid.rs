//! Structured mesh generators.
//!
//! Builds unstructured meshes over a regular lattice of points, useful for
//! sampling analytic fields, benchmarks and tests. All generators produce
//! positively oriented cells with double precision points.

use crate::types::{CellArray, CellType, UnstructuredMesh};

/// Lattice of `(cells + 1)` points per axis.
fn lattice_points(cells: [usize; 3], spacing: f64) -> Vec<[f64; 3]> {
    let [nx, ny, nz] = cells;
    let mut points = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                points.push([i as f64 * spacing, j as f64 * spacing, k as f64 * spacing]);
            }
        }
    }
    points
}

/// Ids of the eight lattice points around cell `(i, j, k)`, indexed by
/// corner bits `x | y << 1 | z << 2`.
fn cube_corners(cells: [usize; 3], i: usize, j: usize, k: usize) -> [usize; 8] {
    let sx = cells[0] + 1;
    let sy = cells[1] + 1;
    let id = |di: usize, dj: usize, dk: usize| (i + di) + sx * ((j + dj) + sy * (k + dk));
    std::array::from_fn(|bits| id(bits & 1, (bits >> 1) & 1, (bits >> 2) & 1))
}

fn build_grid(
    cells: [usize; 3],
    spacing: f64,
    cell_type: CellType,
    emit: impl Fn(&[usize; 8], &mut Vec<Vec<usize>>),
) -> UnstructuredMesh {
    let [nx, ny, nz] = cells;
    let mut cell_list = Vec::new();
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                emit(&cube_corners(cells, i, j, k), &mut cell_list);
            }
        }
    }
    let types = vec![cell_type; cell_list.len()];
    mesh_from_parts(lattice_points(cells, spacing), cell_list, types)
}

fn mesh_from_parts(
    points: Vec<[f64; 3]>,
    cells: Vec<Vec<usize>>,
    types: Vec<CellType>,
) -> UnstructuredMesh {
    // Generated ids are in range by construction.
    match UnstructuredMesh::from_points(points, CellArray::from_cells(cells), types) {
        Ok(mesh) => mesh,
        Err(_) => UnstructuredMesh::empty(),
    }
}

/// A grid of `cells[0] x cells[1] x cells[2]` hexahedra.
pub fn hexahedral_grid(cells: [usize; 3], spacing: f64) -> UnstructuredMesh {
    build_grid(cells, spacing, CellType::Hexahedron, |c, out| {
        out.push(vec![c[0], c[1], c[3], c[2], c[4], c[5], c[7], c[6]]);
    })
}

/// A grid of voxels; same geometry as [`hexahedral_grid`].
pub fn voxel_grid(cells: [usize; 3], spacing: f64) -> UnstructuredMesh {
    build_grid(cells, spacing, CellType::Voxel, |c, out| {
        out.push(c.to_vec());
    })
}

/// A grid with every cube split into six tetrahedra along its main
/// diagonal. Neighbouring cubes share faces exactly.
pub fn tetrahedral_grid(cells: [usize; 3], spacing: f64) -> UnstructuredMesh {
    const AXIS_ORDERS: [[usize; 3]; 6] = [
        [1, 2, 4],
        [1, 4, 2],
        [2, 1, 4],
        [2, 4, 1],
        [4, 1, 2],
        [4, 2, 1],
    ];
    build_grid(cells, spacing, CellType::Tetra, |c, out| {
        for [a, b, _] in AXIS_ORDERS {
            let mut tet = [c[0], c[a], c[a | b], c[7]];
            // Odd axis permutations are left-handed.
            if !is_even_permutation(a, b) {
                tet.swap(1, 2);
            }
            out.push(tet.to_vec());
        }
    })
}

fn is_even_permutation(first: usize, second: usize) -> bool {
    matches!((first, second), (1, 2) | (2, 4) | (4, 1))
}

/// One reference cell of a linear solid type, spanning the unit cube.
///
/// Returns `None` for types without a reference geometry.
pub fn single_cell(cell_type: CellType) -> Option<UnstructuredMesh> {
    let points: Vec<[f64; 3]> = match cell_type {
        CellType::Tetra => vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
        CellType::Hexahedron => vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ],
        CellType::Voxel => vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
            [1.0, 1.0, 1.0],
        ],
        // Base triangle wound clockwise seen from the top so that every
        // face loop is counter-clockwise from outside.
        CellType::Wedge => vec![
            [0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
            [1.0, 0.0, 1.0],
        ],
        CellType::Pyramid => vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.5, 0.5, 1.0],
        ],
        _ => return None,
    };
    let ids: Vec<usize> = (0..points.len()).collect();
    Some(mesh_from_parts(points, vec![ids], vec![cell_type]))
}
