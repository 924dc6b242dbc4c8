//! Cell shapes, topology tables and cell traversal.
//!
//! - [`CellShape`]: the closed set of shapes contouring understands
//! - [`ShapeDescriptor`]: edges and case table of one shape
//! - [`CellCursor`]: sequential and random-access traversal of a mesh

mod cursor;
mod tables;

pub use cursor::CellCursor;
pub use tables::{CaseRegistry, MAX_CELL_EDGES, MAX_CELL_VERTICES, ShapeDescriptor, registry};

use crate::types::CellType;

/// Linear solid shapes with case tables, plus a catch-all for the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellShape {
    Tetra,
    Hexahedron,
    Wedge,
    Pyramid,
    Voxel,
    /// Any cell without a case table. Never produces output.
    Unsupported,
}

impl CellShape {
    /// Every shape, in registry order.
    pub const ALL: [CellShape; 6] = [
        CellShape::Tetra,
        CellShape::Hexahedron,
        CellShape::Wedge,
        CellShape::Pyramid,
        CellShape::Voxel,
        CellShape::Unsupported,
    ];

    /// Shape for a cell type tag.
    #[inline]
    pub fn from_cell_type(cell_type: CellType) -> Self {
        match cell_type {
            CellType::Tetra => CellShape::Tetra,
            CellType::Hexahedron => CellShape::Hexahedron,
            CellType::Wedge => CellShape::Wedge,
            CellType::Pyramid => CellShape::Pyramid,
            CellType::Voxel => CellShape::Voxel,
            _ => CellShape::Unsupported,
        }
    }

    #[inline]
    pub const fn vertex_count(self) -> usize {
        match self {
            CellShape::Tetra => 4,
            CellShape::Hexahedron | CellShape::Voxel => 8,
            CellShape::Wedge => 6,
            CellShape::Pyramid => 5,
            CellShape::Unsupported => 0,
        }
    }

    /// Ordered edge list as local vertex pairs.
    pub fn edges(self) -> &'static [[u8; 2]] {
        match self {
            CellShape::Tetra => &tables::TETRA_EDGES,
            CellShape::Hexahedron => &tables::HEX_EDGES,
            CellShape::Wedge => &tables::WEDGE_EDGES,
            CellShape::Pyramid => &tables::PYRAMID_EDGES,
            CellShape::Voxel => &tables::VOXEL_EDGES,
            CellShape::Unsupported => &[],
        }
    }

    /// Faces as vertex loops, counter-clockwise seen from outside.
    pub fn faces(self) -> &'static [&'static [u8]] {
        match self {
            CellShape::Tetra => &tables::TETRA_FACES,
            CellShape::Hexahedron => &tables::HEX_FACES,
            CellShape::Wedge => &tables::WEDGE_FACES,
            CellShape::Pyramid => &tables::PYRAMID_FACES,
            CellShape::Voxel => &tables::VOXEL_FACES,
            CellShape::Unsupported => &[],
        }
    }

    /// Registry descriptor of this shape.
    #[inline]
    pub fn descriptor(self) -> ShapeDescriptor {
        registry().descriptor(self)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            CellShape::Tetra => 0,
            CellShape::Hexahedron => 1,
            CellShape::Wedge => 2,
            CellShape::Pyramid => 3,
            CellShape::Voxel => 4,
            CellShape::Unsupported => 5,
        }
    }
}

/// Sign mask of a cell: bit `i` set when `scalars[i] >= value`.
#[inline]
pub fn sign_mask(scalars: &[f64], value: f64) -> u16 {
    scalars
        .iter()
        .enumerate()
        .fold(0u16, |mask, (i, &s)| if s >= value { mask | (1 << i) } else { mask })
}
