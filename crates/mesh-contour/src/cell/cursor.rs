//! Cell traversal with cached shape dispatch.

use super::{CellShape, ShapeDescriptor};
use crate::types::{CellArray, CellType, UnstructuredMesh};

/// A lightweight iterator over the cells of one mesh.
///
/// Each worker copies the cursor and walks its own cell range. The cursor
/// keeps the descriptor of the shape it last visited and only consults the
/// registry when the shape changes. A cell whose point count does not match
/// its declared shape is reported as [`CellShape::Unsupported`].
#[derive(Debug, Clone, Copy)]
pub struct CellCursor<'a> {
    cells: &'a CellArray,
    types: &'a [CellType],
    position: Option<usize>,
    active: ShapeDescriptor,
}

impl<'a> CellCursor<'a> {
    /// Create a cursor positioned before the first cell.
    pub fn new(mesh: &'a UnstructuredMesh) -> Self {
        Self {
            cells: mesh.cells(),
            types: mesh.cell_types(),
            position: None,
            active: CellShape::Unsupported.descriptor(),
        }
    }

    /// Number of cells the cursor can visit.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Id of the current cell, or `None` before the first visit.
    #[inline]
    pub fn cell_id(&self) -> Option<usize> {
        self.position
    }

    /// Descriptor of the current cell's shape.
    #[inline]
    pub fn descriptor(&self) -> ShapeDescriptor {
        self.active
    }

    /// Position the cursor at `cell_id` and return its point ids.
    ///
    /// # Panics
    ///
    /// Panics if `cell_id` is out of range.
    #[inline]
    pub fn initialize(&mut self, cell_id: usize) -> &'a [usize] {
        self.visit(cell_id)
    }

    /// Move to the next cell in storage order. A fresh cursor starts at
    /// cell 0.
    ///
    /// Returns `None` once the last cell has been passed.
    #[inline]
    pub fn advance(&mut self) -> Option<&'a [usize]> {
        let next = self.position.map_or(0, |current| current + 1);
        if next < self.cells.len() {
            Some(self.visit(next))
        } else {
            None
        }
    }

    /// Jump to an arbitrary cell.
    ///
    /// Yields the same ids and descriptor as reaching `cell_id` sequentially.
    #[inline]
    pub fn cell_at(&mut self, cell_id: usize) -> &'a [usize] {
        self.visit(cell_id)
    }

    #[inline]
    fn visit(&mut self, cell_id: usize) -> &'a [usize] {
        self.position = Some(cell_id);
        let ids = self.cells.cell(cell_id);

        let mut shape = CellShape::from_cell_type(self.types[cell_id]);
        if ids.len() != shape.vertex_count() {
            shape = CellShape::Unsupported;
        }
        if shape != self.active.shape() {
            self.active = shape.descriptor();
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::DataArray;

    fn mixed_mesh() -> UnstructuredMesh {
        let points = DataArray::vectors("Points", vec![[0.0f64; 3]; 10]);
        let cells = CellArray::from_cells(vec![
            vec![0usize, 1, 2, 3],
            vec![0, 1, 2, 3, 4, 5, 6, 7],
            vec![0, 1, 2, 3],
            vec![0, 1, 2],
            vec![1, 2, 3, 4, 5, 6],
            vec![0, 1, 2, 3, 4],
        ]);
        let types = vec![
            CellType::Tetra,
            CellType::Hexahedron,
            CellType::Tetra,
            CellType::Triangle,
            CellType::Wedge,
            CellType::Tetra,
        ];
        UnstructuredMesh::new(points, cells, types).unwrap()
    }

    #[test]
    fn test_sequential_traversal() {
        let mesh = mixed_mesh();
        let mut cursor = CellCursor::new(&mesh);

        let mut shapes = vec![];
        let ids = cursor.initialize(0);
        assert_eq!(ids, &[0, 1, 2, 3]);
        shapes.push(cursor.descriptor().shape());
        while cursor.advance().is_some() {
            shapes.push(cursor.descriptor().shape());
        }

        assert_eq!(
            shapes,
            vec![
                CellShape::Tetra,
                CellShape::Hexahedron,
                CellShape::Tetra,
                CellShape::Unsupported,
                CellShape::Wedge,
                // Five points declared as a tetra.
                CellShape::Unsupported,
            ]
        );
        assert_eq!(cursor.cell_id(), Some(5));
    }

    #[test]
    fn test_random_access_matches_sequential() {
        let mesh = mixed_mesh();
        let mut sequential = CellCursor::new(&mesh);
        let mut random = CellCursor::new(&mesh);

        let mut ids = sequential.initialize(0);
        for cell_id in 0..mesh.cell_count() {
            let mirrored = mesh.cell_count() - 1 - cell_id;
            random.cell_at(mirrored);

            let random_ids = random.cell_at(cell_id);
            assert_eq!(random_ids, ids);
            assert_eq!(random.descriptor().shape(), sequential.descriptor().shape());

            if let Some(next) = sequential.advance() {
                ids = next;
            }
        }
    }

    #[test]
    fn test_copies_are_independent() {
        let mesh = mixed_mesh();
        let mut a = CellCursor::new(&mesh);
        a.initialize(1);
        let mut b = a;
        b.cell_at(4);
        assert_eq!(a.cell_id(), Some(1));
        assert_eq!(a.descriptor().shape(), CellShape::Hexahedron);
        assert_eq!(b.descriptor().shape(), CellShape::Wedge);
    }

    #[test]
    fn test_advance_from_fresh_cursor_starts_at_first_cell() {
        let mesh = mixed_mesh();
        let mut cursor = CellCursor::new(&mesh);
        assert_eq!(cursor.cell_id(), None);

        assert_eq!(cursor.advance(), Some(&[0usize, 1, 2, 3][..]));
        assert_eq!(cursor.cell_id(), Some(0));
        assert_eq!(cursor.descriptor().shape(), CellShape::Tetra);

        let mut visited = 1;
        while cursor.advance().is_some() {
            visited += 1;
        }
        assert_eq!(visited, mesh.cell_count());
    }
}
