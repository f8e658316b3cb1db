use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::error::{StampError, StampResult};

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

pub fn mesh_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self { min: first, max: first }, |b, p| Self {
            min: b.min.min(p),
            max: b.max.max(p),
        }))
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

/// A parsed mesh ready for display. Triangles are expanded to flat-shaded
/// vertices; `translation` positions the object in the scene.
pub struct MeshObject {
    pub name: String,
    pub vertices: Vec<MeshVertex>,
    pub bounds: Aabb,
    pub translation: Vec3,
}

impl MeshObject {
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn world_bounds(&self) -> Aabb {
        self.bounds.translated(self.translation)
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
    }
}

/// Parses OBJ text into a single displayable object. Every group in the
/// file is merged.
pub fn parse_obj(text: &str) -> StampResult<MeshObject> {
    let mut reader = text.as_bytes();
    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, _) = tobj::load_obj_buf(&mut reader, &load_options, |_: &Path| {
        Err(tobj::LoadError::GenericFailure)
    })?;

    let name = models
        .first()
        .map(|m| m.name.clone())
        .unwrap_or_default();

    let mut vertices = Vec::new();
    for model in &models {
        let positions = &model.mesh.positions;
        let position = |i: u32| -> StampResult<Vec3> {
            let at = i as usize * 3;
            positions
                .get(at..at + 3)
                .map(Vec3::from_slice)
                .ok_or(StampError::MeshParse(tobj::LoadError::FaceVertexOutOfBounds))
        };

        for tri in model.mesh.indices.chunks_exact(3) {
            let a = position(tri[0])?;
            let b = position(tri[1])?;
            let c = position(tri[2])?;
            let normal = (b - a).cross(c - a).normalize_or_zero().to_array();

            vertices.extend([a, b, c].map(|p| MeshVertex {
                position: p.to_array(),
                normal,
            }));
        }
    }

    let bounds = Aabb::from_points(vertices.iter().map(|v| Vec3::from_array(v.position)))
        .ok_or(StampError::EmptyMesh)?;

    Ok(MeshObject {
        name,
        vertices,
        bounds,
        translation: Vec3::ZERO,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const QUAD: &str = "g stamp\n\
        v 10 20 4\n\
        v 14 20 4\n\
        v 14 26 5\n\
        v 10 26 0\n\
        f 1 2 3\n\
        f 3 4 1\n";

    #[test]
    fn parses_triangles_and_bounds() {
        let mesh = parse_obj(QUAD).unwrap();

        assert_eq!(mesh.name, "stamp");
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.bounds.min, Vec3::new(10.0, 20.0, 0.0));
        assert_eq!(mesh.bounds.max, Vec3::new(14.0, 26.0, 5.0));
        assert_eq!(mesh.bounds.center(), Vec3::new(12.0, 23.0, 2.5));
    }

    #[test]
    fn flat_normals_are_unit_length() {
        let mesh = parse_obj(QUAD).unwrap();
        for v in &mesh.vertices {
            assert_relative_eq!(Vec3::from_array(v.normal).length(), 1.0, epsilon = 1e-5);
        }
        // First triangle lies in the z=4..5 slope, facing mostly +z.
        assert!(mesh.vertices[0].normal[2] > 0.0);
    }

    #[test]
    fn quads_are_triangulated() {
        let mesh = parse_obj("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn mesh_without_faces_is_rejected() {
        assert!(matches!(
            parse_obj("g stamp\nv 0 0 0\n"),
            Err(StampError::EmptyMesh)
        ));
        assert!(parse_obj("").is_err());
    }

    #[test]
    fn world_bounds_follow_translation() {
        let mut mesh = parse_obj(QUAD).unwrap();
        mesh.translation = Vec3::new(-12.0, -23.0, 0.0);
        let bounds = mesh.world_bounds();
        assert_eq!(bounds.center(), Vec3::new(0.0, 0.0, 2.5));
        assert_eq!(bounds.size(), mesh.bounds.size());
    }
}
