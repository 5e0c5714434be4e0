use crate::mesh::tables::{EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};
use crate::mesh::types::{Mesh, MeshVertex};
use crate::mesh::voxel_grid::Volume;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Below this distance two scalar values are treated as equal
pub const INTERPOLATION_EPSILON: f32 = 1e-5;

/// How cube corner indices map to voxel offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerOrder {
    /// Corner `i` sits at `(i & 1, (i >> 1) & 1, (i >> 2) & 1)`
    #[default]
    Binary,
    /// Corners 0..3 wind around the lower face, 4..7 above them; the layout
    /// the lookup tables were built for, giving crack-free surfaces
    Cyclic,
}

const BINARY_OFFSETS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

const CYCLIC_OFFSETS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

impl CornerOrder {
    /// `[dx, dy, dz]` of each cube corner
    pub fn offsets(self) -> &'static [[usize; 3]; 8] {
        match self {
            CornerOrder::Binary => &BINARY_OFFSETS,
            CornerOrder::Cyclic => &CYCLIC_OFFSETS,
        }
    }
}

/// One cube corner: where it is, what color it carries, its scalar value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerSample {
    pub position: Vec3,
    pub color: Vec3,
    pub value: f32,
}

/// Extract a colored triangle mesh from the volume with Marching Cubes.
///
/// A corner is inside when its value is strictly greater than `iso_level`.
/// Cubes are visited z-outer, y-middle, x-inner; each triangle gets three
/// fresh vertices (no welding between cubes) with zero normals.
pub fn marching_cubes(volume: &Volume, iso_level: f32, corner_order: CornerOrder) -> Mesh {
    let dims = volume.dims();
    let density = volume.density();
    let colors = volume.colors();
    let offsets = corner_order.offsets();
    let mut mesh = Mesh::default();

    // Every cube reaches one voxel further on each axis
    if dims.width < 2 || dims.height < 2 || dims.depth < 2 {
        return mesh;
    }

    for z in 0..dims.depth - 1 {
        for y in 0..dims.height - 1 {
            for x in 0..dims.width - 1 {
                let corners = offsets.map(|[dx, dy, dz]| {
                    let (cx, cy, cz) = (x + dx, y + dy, z + dz);
                    CornerSample {
                        position: Vec3::new(cx as f32, cy as f32, cz as f32),
                        color: colors.get(cx, cy, cz),
                        value: density.get(cx, cy, cz),
                    }
                });

                march_cube(&corners, iso_level, &mut mesh);
            }
        }
    }

    mesh
}

/// 8-bit inside/outside pattern: bit `i` set iff corner `i` exceeds the iso level
pub fn cube_configuration(corners: &[CornerSample; 8], iso_level: f32) -> usize {
    corners
        .iter()
        .enumerate()
        .filter(|(_, corner)| corner.value > iso_level)
        .fold(0, |config, (i, _)| config | (1 << i))
}

fn march_cube(corners: &[CornerSample; 8], iso_level: f32, mesh: &mut Mesh) {
    let config = cube_configuration(corners, iso_level);
    let edges = EDGE_TABLE[config];
    if edges == 0 {
        return;
    }

    let mut crossings = [(Vec3::ZERO, Vec3::ZERO); 12];
    for (edge, &[a, b]) in EDGE_CORNERS.iter().enumerate() {
        if edges & (1 << edge) != 0 {
            crossings[edge] = interpolate_edge(iso_level, corners[a], corners[b]);
        }
    }

    let vertex = |edge: i8| {
        let (position, color) = crossings[edge as usize];
        MeshVertex::from_vec3(position, color)
    };

    for triangle in TRI_TABLE[config]
        .chunks_exact(3)
        .take_while(|triangle| triangle[0] != -1)
    {
        mesh.push_triangle(vertex(triangle[0]), vertex(triangle[1]), vertex(triangle[2]));
    }
}

/// Position and color where the surface crosses the edge `a -> b`.
///
/// Snaps to an endpoint whose value equals the iso level, falls back to `a`
/// when the endpoint values are equal, and otherwise interpolates linearly
/// with the same parameter for position and color.
pub fn interpolate_edge(iso_level: f32, a: CornerSample, b: CornerSample) -> (Vec3, Vec3) {
    if (iso_level - a.value).abs() < INTERPOLATION_EPSILON {
        return (a.position, a.color);
    }
    if (iso_level - b.value).abs() < INTERPOLATION_EPSILON {
        return (b.position, b.color);
    }
    if (a.value - b.value).abs() < INTERPOLATION_EPSILON {
        return (a.position, a.color);
    }

    let mu = (iso_level - a.value) / (b.value - a.value);
    (
        a.position + mu * (b.position - a.position),
        a.color + mu * (b.color - a.color),
    )
}
