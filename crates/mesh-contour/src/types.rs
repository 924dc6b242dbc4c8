//! Unstructured mesh types.

use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::Point3;

use crate::array::{AttributeSet, DataArray};
use crate::error::{ContourError, ContourResult};

/// Cell type tags, numbered like the common VTK cell types.
///
/// Only the linear solids (tetra, voxel, hexahedron, wedge, pyramid) produce
/// contour output; every other tag is accepted in a mesh and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellType {
    Empty = 0,
    Vertex = 1,
    Line = 3,
    Triangle = 5,
    Polygon = 7,
    Pixel = 8,
    Quad = 9,
    Tetra = 10,
    Voxel = 11,
    Hexahedron = 12,
    Wedge = 13,
    Pyramid = 14,
    PentagonalPrism = 15,
    HexagonalPrism = 16,
    QuadraticTetra = 24,
    QuadraticHexahedron = 25,
    Polyhedron = 42,
}

impl CellType {
    /// Numeric tag of this cell type.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse a numeric tag.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => CellType::Empty,
            1 => CellType::Vertex,
            3 => CellType::Line,
            5 => CellType::Triangle,
            7 => CellType::Polygon,
            8 => CellType::Pixel,
            9 => CellType::Quad,
            10 => CellType::Tetra,
            11 => CellType::Voxel,
            12 => CellType::Hexahedron,
            13 => CellType::Wedge,
            14 => CellType::Pyramid,
            15 => CellType::PentagonalPrism,
            16 => CellType::HexagonalPrism,
            24 => CellType::QuadraticTetra,
            25 => CellType::QuadraticHexahedron,
            42 => CellType::Polyhedron,
            _ => return None,
        })
    }

    /// Whether contouring handles this type.
    #[inline]
    pub fn is_linear_solid(self) -> bool {
        matches!(
            self,
            CellType::Tetra
                | CellType::Voxel
                | CellType::Hexahedron
                | CellType::Wedge
                | CellType::Pyramid
        )
    }
}

/// Cell connectivity in offsets + flat id form.
///
/// `offsets` always has `len() + 1` entries starting at zero; cell `i` owns
/// `connectivity[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellArray {
    offsets: Vec<usize>,
    connectivity: Vec<usize>,
}

impl Default for CellArray {
    fn default() -> Self {
        Self::new()
    }
}

impl CellArray {
    /// Create an empty cell array.
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            connectivity: Vec::new(),
        }
    }

    /// Build from explicit offsets and connectivity.
    pub fn from_raw(offsets: Vec<usize>, connectivity: Vec<usize>) -> ContourResult<Self> {
        if offsets.first() != Some(&0) {
            return Err(ContourError::invalid_mesh("cell offsets must start at 0"));
        }
        if offsets.windows(2).any(|w| w[1] < w[0]) {
            return Err(ContourError::invalid_mesh("cell offsets must not decrease"));
        }
        if offsets.last() != Some(&connectivity.len()) {
            return Err(ContourError::invalid_mesh(format!(
                "last cell offset {:?} does not match connectivity length {}",
                offsets.last(),
                connectivity.len()
            )));
        }
        Ok(Self {
            offsets,
            connectivity,
        })
    }

    /// Build from a sequence of per-cell point id lists.
    pub fn from_cells<I, C>(cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[usize]>,
    {
        let mut array = Self::new();
        for cell in cells {
            array.push(cell.as_ref());
        }
        array
    }

    /// Append one cell.
    pub fn push(&mut self, point_ids: &[usize]) {
        self.connectivity.extend_from_slice(point_ids);
        self.offsets.push(self.connectivity.len());
    }

    /// Point ids of cell `cell_id`.
    ///
    /// # Panics
    ///
    /// Panics if `cell_id >= self.len()`.
    #[inline]
    pub fn cell(&self, cell_id: usize) -> &[usize] {
        &self.connectivity[self.offsets[cell_id]..self.offsets[cell_id + 1]]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    #[inline]
    pub fn connectivity(&self) -> &[usize] {
        &self.connectivity
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.offsets
            .windows(2)
            .map(move |w| &self.connectivity[w[0]..w[1]])
    }
}

/// Process-unique identity of a mesh's contents.
///
/// A fresh id is drawn on construction and on every mutable access, so two
/// observations with the same id saw the same points, cells and arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        MeshId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// An unstructured mesh of cells over a shared point set.
#[derive(Debug, Clone)]
pub struct UnstructuredMesh {
    id: MeshId,
    points: DataArray,
    cells: CellArray,
    cell_types: Vec<CellType>,
    point_data: AttributeSet,
    cell_data: AttributeSet,
}

impl UnstructuredMesh {
    /// Create a mesh from a three-component point array, cells and cell types.
    ///
    /// The point array may hold any element type; contouring later rejects
    /// non-floating-point coordinates.
    pub fn new(
        points: DataArray,
        cells: CellArray,
        cell_types: Vec<CellType>,
    ) -> ContourResult<Self> {
        if points.components() != 3 {
            return Err(ContourError::invalid_mesh(format!(
                "points must have 3 components, found {}",
                points.components()
            )));
        }
        if cell_types.len() != cells.len() {
            return Err(ContourError::invalid_mesh(format!(
                "{} cell types for {} cells",
                cell_types.len(),
                cells.len()
            )));
        }
        let point_count = points.tuple_count();
        if let Some(&bad) = cells.connectivity().iter().find(|&&id| id >= point_count) {
            return Err(ContourError::invalid_mesh(format!(
                "connectivity references point {} but mesh has {} points",
                bad, point_count
            )));
        }

        Ok(Self {
            id: MeshId::next(),
            points,
            cells,
            cell_types,
            point_data: AttributeSet::new(),
            cell_data: AttributeSet::new(),
        })
    }

    /// Create a mesh with double precision points.
    pub fn from_points(
        points: Vec<[f64; 3]>,
        cells: CellArray,
        cell_types: Vec<CellType>,
    ) -> ContourResult<Self> {
        Self::new(DataArray::vectors("Points", points), cells, cell_types)
    }

    /// Create an empty mesh with f32 points.
    pub fn empty() -> Self {
        Self {
            id: MeshId::next(),
            points: DataArray::new("Points", 3, Vec::<f32>::new()),
            cells: CellArray::new(),
            cell_types: Vec::new(),
            point_data: AttributeSet::new(),
            cell_data: AttributeSet::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> MeshId {
        self.id
    }

    #[inline]
    pub fn points(&self) -> &DataArray {
        &self.points
    }

    #[inline]
    pub fn cells(&self) -> &CellArray {
        &self.cells
    }

    #[inline]
    pub fn cell_types(&self) -> &[CellType] {
        &self.cell_types
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.points.tuple_count()
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether the mesh has no points or no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.point_count() == 0 || self.cell_count() == 0
    }

    #[inline]
    pub fn point_data(&self) -> &AttributeSet {
        &self.point_data
    }

    #[inline]
    pub fn cell_data(&self) -> &AttributeSet {
        &self.cell_data
    }

    /// Mutable point attributes. Refreshes the mesh id.
    pub fn point_data_mut(&mut self) -> &mut AttributeSet {
        self.id = MeshId::next();
        &mut self.point_data
    }

    /// Mutable cell attributes. Refreshes the mesh id.
    pub fn cell_data_mut(&mut self) -> &mut AttributeSet {
        self.id = MeshId::next();
        &mut self.cell_data
    }

    /// Add a point array.
    pub fn add_point_array(&mut self, array: DataArray) {
        self.point_data_mut().add(array);
    }

    /// Add a cell array.
    pub fn add_cell_array(&mut self, array: DataArray) {
        self.cell_data_mut().add(array);
    }

    /// Add a point array and mark it as the active scalars.
    pub fn set_scalars(&mut self, array: DataArray) {
        let name = array.name().to_string();
        let data = self.point_data_mut();
        data.add(array);
        data.set_active_scalars(&name);
    }

    /// Position of point `index`.
    #[inline]
    pub fn point(&self, index: usize) -> Option<Point3<f64>> {
        Some(Point3::new(
            self.points.value(index, 0)?,
            self.points.value(index, 1)?,
            self.points.value(index, 2)?,
        ))
    }

    /// Axis-aligned bounds of all points.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut iter = (0..self.point_count()).filter_map(|i| self.point(i));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| {
            (lo.inf(&p), hi.sup(&p))
        }))
    }
}
