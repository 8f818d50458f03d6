//! Polygonal geometry carried by procedural objects.
use glam::{Mat4, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Vertex positions plus polygon faces indexing into them.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    vertices: Vec<Vec3>,
    faces: Vec<Vec<u32>>,
}

impl Geometry {
    /// Builds a geometry, checking every face index and face size.
    pub fn new(vertices: Vec<Vec3>, faces: Vec<Vec<u32>>) -> Result<Self> {
        for (i, face) in faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(Error::InvalidArgument {
                    argument: "faces".into(),
                    message: format!("face {} has {} vertices, need at least 3", i, face.len()),
                });
            }
            if let Some(bad) = face.iter().find(|&&v| v as usize >= vertices.len()) {
                return Err(Error::InvalidArgument {
                    argument: "faces".into(),
                    message: format!(
                        "face {} references vertex {} but only {} exist",
                        i,
                        bad,
                        vertices.len()
                    ),
                });
            }
        }
        Ok(Self { vertices, faces })
    }

    /// A single quad centered at the origin, spanning `width` along `x_axis`
    /// and `height` along `y_axis`.
    pub fn rect(width: f32, height: f32, x_axis: Vec3, y_axis: Vec3) -> Self {
        let hx = x_axis.normalize_or_zero() * (0.5 * width);
        let hy = y_axis.normalize_or_zero() * (0.5 * height);
        Self {
            vertices: vec![-hx - hy, hx - hy, hx + hy, -hx + hy],
            faces: vec![vec![0, 1, 2, 3]],
        }
    }

    /// An axis-aligned box centered at the origin with outward-facing quads.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        let vertices = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        let faces = vec![
            vec![0, 3, 2, 1], // bottom
            vec![4, 5, 6, 7], // top
            vec![0, 1, 5, 4], // front
            vec![1, 2, 6, 5], // right
            vec![2, 3, 7, 6], // back
            vec![3, 0, 4, 7], // left
        ];
        Self { vertices, faces }
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Vec<u32>] {
        &self.faces
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Applies an affine transform to every vertex.
    pub fn transform(&mut self, matrix: &Mat4) {
        for v in &mut self.vertices {
            *v = matrix.transform_point3(*v);
        }
    }

    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let mut out = self.clone();
        out.transform(matrix);
        out
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` when empty.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v))),
        )
    }

    pub fn center(&self) -> Option<Vec3> {
        self.bounds().map(|(lo, hi)| (lo + hi) * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn rect_is_one_centered_quad() {
        let g = Geometry::rect(2.0, 1.0, Vec3::X, Vec3::Y);
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.face_count(), 1);
        let (lo, hi) = g.bounds().expect("non-empty");
        assert!(approx(lo, Vec3::new(-1.0, -0.5, 0.0)));
        assert!(approx(hi, Vec3::new(1.0, 0.5, 0.0)));
    }

    #[test]
    fn cuboid_has_eight_vertices_and_six_faces() {
        let g = Geometry::cuboid(Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(g.vertex_count(), 8);
        assert_eq!(g.face_count(), 6);
        assert!(approx(g.center().expect("non-empty"), Vec3::ZERO));
        let (lo, hi) = g.bounds().expect("non-empty");
        assert!(approx(hi - lo, Vec3::new(2.0, 4.0, 6.0)));
    }

    #[test]
    fn transform_moves_vertices() {
        let mut g = Geometry::rect(1.0, 1.0, Vec3::X, Vec3::Y);
        g.transform(&Mat4::from_translation(Vec3::new(0.0, 0.0, 3.0)));
        assert!(g.vertices().iter().all(|v| (v.z - 3.0).abs() < 1e-6));
    }

    #[test]
    fn new_rejects_out_of_range_indices() {
        let err = Geometry::new(vec![Vec3::ZERO; 3], vec![vec![0, 1, 3]]).expect_err("index 3");
        assert!(matches!(err, Error::InvalidArgument { .. }));
        let err = Geometry::new(vec![Vec3::ZERO; 3], vec![vec![0, 1]]).expect_err("degenerate");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn empty_geometry_has_no_bounds() {
        assert!(Geometry::default().bounds().is_none());
    }
}
