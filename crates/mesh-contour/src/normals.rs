//! Point normals for merged contour output.

use nalgebra::Vector3;
use rayon::prelude::*;

use crate::array::{Component, DataArray};
use crate::extract::MergeId;

/// Name of the generated normals array.
pub const NORMALS_NAME: &str = "Normals";

/// Incident triangles of every point, stored compactly.
#[derive(Debug, Clone)]
pub struct PointLinks<I> {
    offsets: Vec<usize>,
    links: Vec<I>,
}

impl<I: MergeId> PointLinks<I> {
    /// Build links for `point_count` points from triangle connectivity.
    pub fn build(point_count: usize, triangles: &[[usize; 3]]) -> Self {
        let mut offsets = vec![0usize; point_count + 1];
        for triangle in triangles {
            for &p in triangle {
                offsets[p + 1] += 1;
            }
        }
        for i in 0..point_count {
            offsets[i + 1] += offsets[i];
        }

        let mut cursor = offsets.clone();
        let mut links = vec![I::default(); offsets[point_count]];
        for (t, triangle) in triangles.iter().enumerate() {
            for &p in triangle {
                links[cursor[p]] = I::from_usize(t);
                cursor[p] += 1;
            }
        }
        Self { offsets, links }
    }

    /// Triangles using `point`, in ascending order.
    #[inline]
    pub fn triangles_of(&self, point: usize) -> &[I] {
        &self.links[self.offsets[point]..self.offsets[point + 1]]
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.offsets.len() - 1
    }
}

#[inline]
fn position<O: Component>(p: &[O; 3]) -> Vector3<f64> {
    Vector3::new(p[0].to_f64(), p[1].to_f64(), p[2].to_f64())
}

/// Unit right-hand normal of a triangle; zero when degenerate.
pub fn triangle_normal<O: Component>(points: &[[O; 3]], triangle: &[usize; 3]) -> Vector3<f64> {
    let a = position(&points[triangle[0]]);
    let b = position(&points[triangle[1]]);
    let c = position(&points[triangle[2]]);
    (b - a)
        .cross(&(c - a))
        .try_normalize(0.0)
        .unwrap_or_else(Vector3::zeros)
}

/// Average the unit normals of the triangles around each point.
///
/// Points without a well-defined normal (isolated, or surrounded only by
/// degenerate triangles) get a zero vector.
pub(crate) fn point_normals<O: Component, I: MergeId>(
    points: &[[O; 3]],
    triangles: &[[usize; 3]],
) -> DataArray {
    let face_normals: Vec<Vector3<f64>> = triangles
        .par_iter()
        .map(|triangle| triangle_normal(points, triangle))
        .collect();
    let links = PointLinks::<I>::build(points.len(), triangles);

    let normals: Vec<[f32; 3]> = (0..points.len())
        .into_par_iter()
        .map(|p| {
            let sum = links
                .triangles_of(p)
                .iter()
                .fold(Vector3::zeros(), |acc, t| acc + face_normals[t.index()]);
            let n = sum.try_normalize(0.0).unwrap_or_else(Vector3::zeros);
            [n.x as f32, n.y as f32, n.z as f32]
        })
        .collect();

    DataArray::vectors(NORMALS_NAME, normals)
}
