use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A single active mask pixel lifted into voxel space.
///
/// Coordinates are voxel indices stored as floats; they are truncated toward
/// zero when rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// RGB in [0, 1]
    pub color: [f32; 3],
}

impl LabeledPoint {
    pub fn new(x: f32, y: f32, z: f32, color: [f32; 3]) -> Self {
        Self { x, y, z, color }
    }

    /// Truncated voxel coordinates, or `None` for negative or non-finite input
    pub fn voxel(&self) -> Option<[usize; 3]> {
        let mut out = [0usize; 3];
        for (slot, value) in out.iter_mut().zip([self.x, self.y, self.z]) {
            if !value.is_finite() || value < 0.0 {
                return None;
            }
            *slot = value.trunc() as usize;
        }
        Some(out)
    }
}

/// Vertex record handed to the renderer: position, normal, color.
///
/// `#[repr(C)]` so the buffer can be uploaded as-is with a 36 byte stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl MeshVertex {
    /// New vertex with a zero normal; normals are filled in by `Mesh::calculate_normals`
    pub fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self {
            position,
            normal: [0.0; 3],
            color,
        }
    }

    pub fn from_vec3(position: Vec3, color: Vec3) -> Self {
        Self::new(position.to_array(), color.to_array())
    }
}

/// Axis-aligned bounds of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    pub fn center(&self) -> [f32; 3] {
        (Vec3::from(self.min).lerp(Vec3::from(self.max), 0.5)).to_array()
    }
}

/// Triangle list: every three consecutive indices form one triangle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Append one unwelded triangle
    pub fn push_triangle(&mut self, a: MeshVertex, b: MeshVertex, c: MeshVertex) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[a, b, c]);
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    /// Recompute per-vertex normals from the triangle list.
    ///
    /// Every triangle adds its unit face normal to each of its three vertices,
    /// unweighted by area. Degenerate triangles contribute nothing, and a vertex
    /// with no contribution keeps a zero normal.
    pub fn calculate_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for chunk in self.indices.chunks_exact(3) {
            let i0 = chunk[0] as usize;
            let i1 = chunk[1] as usize;
            let i2 = chunk[2] as usize;

            let v0 = Vec3::from(self.vertices[i0].position);
            let v1 = Vec3::from(self.vertices[i1].position);
            let v2 = Vec3::from(self.vertices[i2].position);

            let edge1 = v1 - v0;
            let edge2 = v2 - v0;
            let normal = edge1.cross(edge2).normalize_or_zero();

            normals[i0] += normal;
            normals[i1] += normal;
            normals[i2] += normal;
        }

        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = normal.normalize_or_zero().to_array();
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.vertices.first()?;
        let mut min = Vec3::from(first.position);
        let mut max = min;
        for vertex in &self.vertices[1..] {
            let p = Vec3::from(vertex.position);
            min = min.min(p);
            max = max.max(p);
        }
        Some(Bounds {
            min: min.to_array(),
            max: max.to_array(),
        })
    }

    /// Vertex buffer as raw bytes, ready for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer as raw bytes (native-endian u32)
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
