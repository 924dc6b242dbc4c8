//! Canonical cell topology and marching case tables.
//!
//! Vertex numbering, edges and outward-oriented faces follow the VTK linear
//! cell conventions. Case tables are generated once, on first use, by
//! walking each face loop of a cell and chaining the iso-segments found on
//! its faces into closed polygons.

use std::sync::OnceLock;

use tracing::debug;

use super::CellShape;

pub(crate) const TETRA_EDGES: [[u8; 2]; 6] = [[0, 1], [1, 2], [2, 0], [0, 3], [1, 3], [2, 3]];
pub(crate) const TETRA_FACES: [&[u8]; 4] = [&[0, 1, 3], &[1, 2, 3], &[2, 0, 3], &[0, 2, 1]];

pub(crate) const HEX_EDGES: [[u8; 2]; 12] = [
    [0, 1],
    [1, 2],
    [3, 2],
    [0, 3],
    [4, 5],
    [5, 6],
    [7, 6],
    [4, 7],
    [0, 4],
    [1, 5],
    [3, 7],
    [2, 6],
];
pub(crate) const HEX_FACES: [&[u8]; 6] = [
    &[0, 4, 7, 3],
    &[1, 2, 6, 5],
    &[0, 1, 5, 4],
    &[3, 7, 6, 2],
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
];

pub(crate) const WEDGE_EDGES: [[u8; 2]; 9] = [
    [0, 1],
    [1, 2],
    [2, 0],
    [3, 4],
    [4, 5],
    [5, 3],
    [0, 3],
    [1, 4],
    [2, 5],
];
pub(crate) const WEDGE_FACES: [&[u8]; 5] = [
    &[0, 1, 2],
    &[3, 5, 4],
    &[0, 3, 4, 1],
    &[1, 4, 5, 2],
    &[2, 5, 3, 0],
];

pub(crate) const PYRAMID_EDGES: [[u8; 2]; 8] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [0, 4],
    [1, 4],
    [2, 4],
    [3, 4],
];
pub(crate) const PYRAMID_FACES: [&[u8]; 5] = [
    &[0, 3, 2, 1],
    &[0, 1, 4],
    &[1, 2, 4],
    &[2, 3, 4],
    &[3, 0, 4],
];

pub(crate) const VOXEL_EDGES: [[u8; 2]; 12] = [
    [0, 1],
    [1, 3],
    [2, 3],
    [0, 2],
    [4, 5],
    [5, 7],
    [6, 7],
    [4, 6],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

pub(crate) const VOXEL_FACES: [&[u8]; 6] = [
    &[0, 4, 6, 2],
    &[1, 3, 7, 5],
    &[0, 1, 5, 4],
    &[2, 6, 7, 3],
    &[0, 2, 3, 1],
    &[4, 5, 7, 6],
];

/// Voxel vertex matching each hexahedron vertex.
///
/// Voxels order their corners lexicographically (x fastest) while
/// hexahedra walk each quad face around; the two differ in corners 2/3 and
/// 6/7 only.
pub(crate) const HEX_TO_VOXEL: [u8; 8] = [0, 1, 3, 2, 4, 5, 7, 6];

/// Upper bound on cell vertex count for supported shapes.
pub const MAX_CELL_VERTICES: usize = 8;

/// Upper bound on cell edge count. A cell never emits more triangles than
/// it has crossed edges.
pub const MAX_CELL_EDGES: usize = 12;

/// Location of one case inside the shared entry arena.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CaseSpan {
    offset: u32,
    len: u16,
}

/// All case tables of all shapes, packed into one arena.
#[derive(Debug)]
pub struct CaseRegistry {
    entries: Vec<[u8; 2]>,
    spans: Vec<CaseSpan>,
    /// Index into `spans` of each shape's mask 0, in `CellShape::ALL` order.
    first_case: [usize; CellShape::ALL.len()],
}

/// Immutable per-shape view into the registry.
///
/// Cheap to copy; a cursor holds the descriptor of the shape it is on.
#[derive(Debug, Clone, Copy)]
pub struct ShapeDescriptor {
    shape: CellShape,
    edges: &'static [[u8; 2]],
    spans: &'static [CaseSpan],
    entries: &'static [[u8; 2]],
}

impl ShapeDescriptor {
    #[inline]
    pub fn shape(&self) -> CellShape {
        self.shape
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.shape.vertex_count()
    }

    #[inline]
    pub fn edges(&self) -> &'static [[u8; 2]] {
        self.edges
    }

    /// Number of sign configurations (`2^vertex_count`).
    #[inline]
    pub fn case_count(&self) -> usize {
        self.spans.len()
    }

    /// Crossed edges for a sign mask, three per output triangle.
    ///
    /// Bit `i` of `mask` is set when local vertex `i` is at or above the
    /// contour value. An empty slice means the cell is not crossed.
    #[inline]
    pub fn case(&self, mask: u16) -> &'static [[u8; 2]] {
        match self.spans.get(mask as usize) {
            Some(span) => {
                let start = span.offset as usize;
                &self.entries[start..start + span.len as usize]
            }
            None => &[],
        }
    }

    /// Number of triangles emitted for a sign mask.
    #[inline]
    pub fn triangle_count(&self, mask: u16) -> usize {
        self.case(mask).len() / 3
    }
}

impl CaseRegistry {
    /// Descriptor for one shape.
    pub fn descriptor(&'static self, shape: CellShape) -> ShapeDescriptor {
        let index = shape.index();
        let first = self.first_case[index];
        let count = if shape == CellShape::Unsupported {
            1
        } else {
            1usize << shape.vertex_count()
        };
        ShapeDescriptor {
            shape,
            edges: shape.edges(),
            spans: &self.spans[first..first + count],
            entries: &self.entries,
        }
    }

    fn build() -> Self {
        let mut registry = CaseRegistry {
            entries: Vec::new(),
            spans: Vec::new(),
            first_case: [0; CellShape::ALL.len()],
        };

        for shape in CellShape::ALL {
            registry.first_case[shape.index()] = registry.spans.len();
            match shape {
                CellShape::Unsupported => registry.push_case(&[]),
                CellShape::Voxel => {
                    for mask in 0..(1u16 << 8) {
                        let case = voxel_case(mask);
                        registry.push_case(&case);
                    }
                }
                _ => {
                    let faces = shape.faces();
                    for mask in 0..(1u16 << shape.vertex_count()) {
                        let case = triangulate_case(shape.edges(), faces, mask);
                        registry.push_case(&case);
                    }
                }
            }
        }

        debug!(
            target: "mesh_contour::tables",
            entries = registry.entries.len(),
            cases = registry.spans.len(),
            "Built contour case tables"
        );
        registry
    }

    fn push_case(&mut self, case: &[[u8; 2]]) {
        self.spans.push(CaseSpan {
            offset: self.entries.len() as u32,
            len: case.len() as u16,
        });
        self.entries.extend_from_slice(case);
    }
}

/// The process-wide case registry, built on first use.
pub fn registry() -> &'static CaseRegistry {
    static REGISTRY: OnceLock<CaseRegistry> = OnceLock::new();
    REGISTRY.get_or_init(CaseRegistry::build)
}

/// Return the canonical edge of `edges` joining `a` and `b`.
fn canonical_edge(edges: &[[u8; 2]], a: u8, b: u8) -> Option<[u8; 2]> {
    edges
        .iter()
        .copied()
        .find(|&[e0, e1]| (e0 == a && e1 == b) || (e0 == b && e1 == a))
}

/// Triangulate one sign configuration of a polyhedral cell.
///
/// On each outward face loop, a transition from below to above is an entry
/// and the reverse an exit. Every entry is joined to the next exit along the
/// loop, which cuts the above-corners off on faces with four crossings; the
/// neighbouring cell walks the shared face in the opposite direction and
/// makes the same cut. Segments are then chained into closed polygons and
/// fanned. With this orientation the triangle normals point away from the
/// region at or above the contour value.
fn triangulate_case(edges: &[[u8; 2]], faces: &[&[u8]], mask: u16) -> Vec<[u8; 2]> {
    let above = |v: u8| mask & (1 << v) != 0;

    let mut segments: Vec<([u8; 2], [u8; 2])> = Vec::new();
    for face in faces {
        let n = face.len();
        let mut crossings: Vec<([u8; 2], bool)> = Vec::with_capacity(4);
        for i in 0..n {
            let (a, b) = (face[i], face[(i + 1) % n]);
            if above(a) != above(b) {
                if let Some(edge) = canonical_edge(edges, a, b) {
                    crossings.push((edge, above(b)));
                }
            }
        }
        for (i, &(edge, entering)) in crossings.iter().enumerate() {
            if entering {
                let (exit, _) = crossings[(i + 1) % crossings.len()];
                segments.push((edge, exit));
            }
        }
    }
    segments.sort_unstable();

    let mut used = vec![false; segments.len()];
    let mut triangles = Vec::new();
    for start in 0..segments.len() {
        if used[start] {
            continue;
        }

        let mut polygon = Vec::new();
        let mut current = start;
        loop {
            used[current] = true;
            polygon.push(segments[current].0);
            let target = segments[current].1;
            match segments.binary_search_by(|s| s.0.cmp(&target)) {
                Ok(next) if !used[next] => current = next,
                _ => break,
            }
        }

        for i in 1..polygon.len().saturating_sub(1) {
            triangles.extend_from_slice(&[polygon[0], polygon[i], polygon[i + 1]]);
        }
    }
    triangles
}

/// Voxel case derived from the hexahedron case of the permuted mask.
fn voxel_case(voxel_mask: u16) -> Vec<[u8; 2]> {
    let mut hex_mask = 0u16;
    for (hex_vertex, &voxel_vertex) in HEX_TO_VOXEL.iter().enumerate() {
        if voxel_mask & (1 << voxel_vertex) != 0 {
            hex_mask |= 1 << hex_vertex;
        }
    }

    triangulate_case(&HEX_EDGES, &HEX_FACES, hex_mask)
        .into_iter()
        .filter_map(|[a, b]| {
            canonical_edge(
                &VOXEL_EDGES,
                HEX_TO_VOXEL[a as usize],
                HEX_TO_VOXEL[b as usize],
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;

    const SOLIDS: [CellShape; 5] = [
        CellShape::Tetra,
        CellShape::Hexahedron,
        CellShape::Wedge,
        CellShape::Pyramid,
        CellShape::Voxel,
    ];

    fn crossed(edge: [u8; 2], mask: u16) -> bool {
        let a = mask & (1 << edge[0]) != 0;
        let b = mask & (1 << edge[1]) != 0;
        a != b
    }

    #[test]
    fn test_case_counts() {
        let reg = registry();
        assert_eq!(reg.descriptor(CellShape::Tetra).case_count(), 16);
        assert_eq!(reg.descriptor(CellShape::Hexahedron).case_count(), 256);
        assert_eq!(reg.descriptor(CellShape::Wedge).case_count(), 64);
        assert_eq!(reg.descriptor(CellShape::Pyramid).case_count(), 32);
        assert_eq!(reg.descriptor(CellShape::Voxel).case_count(), 256);
        assert_eq!(reg.descriptor(CellShape::Unsupported).case_count(), 1);
        assert!(reg.descriptor(CellShape::Unsupported).case(0).is_empty());
    }

    #[test]
    fn test_cases_cover_exactly_the_crossed_edges() {
        let reg = registry();
        for shape in SOLIDS {
            let desc = reg.descriptor(shape);
            for mask in 0..desc.case_count() as u16 {
                let case = desc.case(mask);
                assert_eq!(case.len() % 3, 0, "{:?} mask {}", shape, mask);
                for edge in case {
                    assert!(desc.edges().contains(edge));
                    assert!(crossed(*edge, mask), "{:?} mask {}", shape, mask);
                }
                for &edge in desc.edges() {
                    if crossed(edge, mask) {
                        assert!(case.contains(&edge), "{:?} mask {} misses {:?}", shape, mask, edge);
                    }
                }
            }
        }
    }

    #[test]
    fn test_full_and_empty_masks_produce_nothing() {
        let reg = registry();
        for shape in SOLIDS {
            let desc = reg.descriptor(shape);
            let full = (desc.case_count() - 1) as u16;
            assert!(desc.case(0).is_empty());
            assert!(desc.case(full).is_empty());
        }
    }

    /// A quad face whose diagonal corners share a sign.
    fn has_ambiguous_face(shape: CellShape, mask: u16) -> bool {
        let above = |v: u8| mask & (1 << v) != 0;
        shape.faces().iter().any(|face| {
            face.len() == 4
                && above(face[0]) == above(face[2])
                && above(face[1]) == above(face[3])
                && above(face[0]) != above(face[1])
        })
    }

    #[test]
    fn test_complementary_masks_cross_the_same_edges() {
        let reg = registry();
        for shape in SOLIDS {
            let desc = reg.descriptor(shape);
            let full = (desc.case_count() - 1) as u16;
            for mask in 0..=full {
                let mut edges: Vec<[u8; 2]> = desc.case(mask).to_vec();
                let mut complement: Vec<[u8; 2]> = desc.case(full ^ mask).to_vec();
                edges.sort_unstable();
                edges.dedup();
                complement.sort_unstable();
                complement.dedup();
                assert_eq!(edges, complement, "{:?} mask {}", shape, mask);
            }
        }
    }

    #[test]
    fn test_unambiguous_complements_have_equal_triangle_counts() {
        let reg = registry();
        for shape in SOLIDS {
            let desc = reg.descriptor(shape);
            let full = (desc.case_count() - 1) as u16;
            for mask in 0..=full {
                if has_ambiguous_face(shape, mask) {
                    continue;
                }
                assert_eq!(
                    desc.triangle_count(mask),
                    desc.triangle_count(full ^ mask),
                    "{:?} mask {}",
                    shape,
                    mask
                );
            }
        }
    }

    #[test]
    fn test_ambiguous_faces_separate_the_above_corners() {
        let desc = registry().descriptor(CellShape::Hexahedron);
        // Corners 0 and 2 above: two separate corner triangles.
        assert!(has_ambiguous_face(CellShape::Hexahedron, 0b0000_0101));
        assert_eq!(desc.triangle_count(0b0000_0101), 2);
        // The complement joins the six crossings into one hexagon.
        assert_eq!(desc.triangle_count(0b1111_1010), 4);
    }

    #[test]
    fn test_tetra_cases() {
        let desc = registry().descriptor(CellShape::Tetra);
        // One corner above: a single triangle over its three edges.
        assert_eq!(desc.triangle_count(0b0001), 1);
        // Two corners above: a quad split in two.
        assert_eq!(desc.triangle_count(0b0011), 2);
        let mut edges: Vec<[u8; 2]> = desc.case(0b0011).to_vec();
        edges.sort_unstable();
        edges.dedup();
        assert_eq!(edges, vec![[0, 3], [1, 2], [1, 3], [2, 0]]);
    }

    #[test]
    fn test_wedge_and_pyramid_corner_cases() {
        let wedge = registry().descriptor(CellShape::Wedge);
        for v in 0..6 {
            assert_eq!(wedge.triangle_count(1 << v), 1);
        }

        let pyramid = registry().descriptor(CellShape::Pyramid);
        for v in 0..4 {
            assert_eq!(pyramid.triangle_count(1 << v), 1);
        }
        // The apex touches four edges.
        assert_eq!(pyramid.triangle_count(1 << 4), 2);
    }

    #[test]
    fn test_hex_ambiguous_face_separates_corners() {
        let hex = registry().descriptor(CellShape::Hexahedron);
        // Corners 0 and 2 share the bottom face diagonally.
        assert_eq!(hex.triangle_count((1 << 0) | (1 << 2)), 2);
        // Corners 0 and 6 are opposite.
        assert_eq!(hex.triangle_count((1 << 0) | (1 << 6)), 2);
    }

    #[test]
    fn test_voxel_cases_match_direct_triangulation() {
        let voxel = registry().descriptor(CellShape::Voxel);
        for mask in 0..256u16 {
            let direct = triangulate_case(&VOXEL_EDGES, &VOXEL_FACES, mask);
            assert_eq!(voxel.case(mask).len(), direct.len(), "mask {}", mask);
        }
    }

    #[test]
    fn test_case_surfaces_are_closed_inside_the_cell() {
        // Every triangle edge either lies on a cell face (joins two crossed
        // edges of one face) or is shared by exactly two triangles.
        let reg = registry();
        for shape in SOLIDS {
            let desc = reg.descriptor(shape);
            let faces = shape.faces();
            let on_face = |a: [u8; 2], b: [u8; 2]| {
                faces
                    .iter()
                    .any(|f| a.iter().chain(b.iter()).all(|v| f.contains(v)))
            };

            for mask in 0..desc.case_count() as u16 {
                let case = desc.case(mask);
                let mut shared: HashMap<([u8; 2], [u8; 2]), usize> = HashMap::new();
                for tri in case.chunks(3) {
                    for i in 0..3 {
                        let (a, b) = (tri[i], tri[(i + 1) % 3]);
                        let key = if a < b { (a, b) } else { (b, a) };
                        *shared.entry(key).or_default() += 1;
                    }
                }
                for ((a, b), count) in shared {
                    assert!(
                        count == 2 || (count == 1 && on_face(a, b)),
                        "{:?} mask {}: edge {:?}-{:?} used {} times",
                        shape,
                        mask,
                        a,
                        b,
                        count
                    );
                }
            }
        }
    }
}
