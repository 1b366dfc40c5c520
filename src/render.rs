//! CPU scene renderer.
//!
//! Produces a linear-light image of the current model. The image is sized in
//! sub-pixels (`SUBPIXELS_X` by `SUBPIXELS_Y` per character cell) so that
//! sub-pixels are square on a terminal whose cells are twice as tall as wide.

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};
use tracing::trace;

use crate::camera::PerspectiveCamera;
use crate::constants::BACKGROUND_COLOR;
use crate::error::RenderError;
use crate::graphics::{draw_triangle, RasterBuffer};
use crate::lighting::LightingManager;
use crate::math::{edge_function, hex_to_linear};
use crate::scene::{Model, Primitive};
use crate::vertex::Vertex;

/// Largest raster the renderer will allocate.
pub const MAX_RASTER_PIXELS: usize = 4096 * 4096;

pub struct SceneRenderer {
    buffer: RasterBuffer,
    background: Vec3,
    triangles_drawn: usize,
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl SceneRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            buffer: RasterBuffer::new(width, height),
            background: hex_to_linear(BACKGROUND_COLOR),
            triangles_drawn: 0,
        }
    }

    pub fn set_size(&mut self, width: usize, height: usize) -> Result<(), RenderError> {
        if width.saturating_mul(height) > MAX_RASTER_PIXELS {
            return Err(RenderError::TargetTooLarge(width, height));
        }
        self.buffer.resize(width, height);
        Ok(())
    }

    pub fn buffer(&self) -> &RasterBuffer {
        &self.buffer
    }

    /// Width over height of the raster, for the camera projection.
    pub fn aspect(&self) -> f32 {
        if self.buffer.height() == 0 {
            1.0
        } else {
            self.buffer.width() as f32 / self.buffer.height() as f32
        }
    }

    pub fn triangles_drawn(&self) -> usize {
        self.triangles_drawn
    }

    pub fn render(
        &mut self,
        model: Option<&Model>,
        camera: &PerspectiveCamera,
        lighting: &LightingManager,
    ) -> Result<(), RenderError> {
        self.buffer.clear(self.background);
        self.triangles_drawn = 0;

        let Some(model) = model else {
            return Ok(());
        };

        let world = model.world_matrices();
        if let Some(index) = world.iter().position(|m| !m.is_finite()) {
            return Err(RenderError::NonFiniteTransform(index));
        }

        let view_projection = camera.projection_matrix() * camera.view_matrix();
        let size = Vec2::new(self.buffer.width() as f32, self.buffer.height() as f32);
        let asset = &model.asset;

        for (node_index, node) in asset.nodes.iter().enumerate() {
            let Some(mesh) = node.mesh.and_then(|m| asset.meshes.get(m)) else {
                continue;
            };

            let joint_matrices: Option<Vec<Mat4>> = node
                .skin
                .and_then(|s| asset.skins.get(s))
                .map(|skin| {
                    skin.joints
                        .iter()
                        .zip(&skin.inverse_bind_matrices)
                        .map(|(&joint, ibm)| {
                            world.get(joint).copied().unwrap_or(Mat4::IDENTITY) * *ibm
                        })
                        .collect()
                });

            for primitive in &mesh.primitives {
                let (positions, normals) = match (&joint_matrices, primitive.is_skinned()) {
                    (Some(joints), true) => skin_primitive(primitive, joints),
                    _ => transform_primitive(primitive, world[node_index]),
                };

                let vertices: Vec<Option<Vertex>> = positions
                    .iter()
                    .zip(&normals)
                    .map(|(&p, &n)| project(p, n, view_projection, size, camera.near))
                    .collect();

                let material = &primitive.material;
                for tri in primitive.indices.chunks_exact(3) {
                    let fetch = |i: u32| vertices.get(i as usize).copied().flatten();
                    let (Some(v0), Some(mut v1), Some(mut v2)) =
                        (fetch(tri[0]), fetch(tri[1]), fetch(tri[2]))
                    else {
                        continue;
                    };

                    let area = edge_function(v0.screen_position, v1.screen_position, v2.screen_position);
                    let mut v0 = v0;
                    if area <= 0.0 {
                        if !material.double_sided {
                            continue;
                        }
                        std::mem::swap(&mut v1, &mut v2);
                        for v in [&mut v0, &mut v1, &mut v2] {
                            v.normal = -v.normal;
                        }
                    }

                    draw_triangle(&v0, &v1, &v2, &mut self.buffer, |position, normal| {
                        lighting.shade(position, normal, material)
                    });
                    self.triangles_drawn += 1;
                }
            }
        }

        trace!("Rendered {} triangles", self.triangles_drawn);
        Ok(())
    }
}

fn transform_primitive(primitive: &Primitive, world: Mat4) -> (Vec<Vec3>, Vec<Vec3>) {
    let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
    let positions = primitive
        .positions
        .iter()
        .map(|&p| world.transform_point3(p))
        .collect();
    let normals = primitive
        .normals
        .iter()
        .map(|&n| (normal_matrix * n).normalize_or_zero())
        .collect();
    (positions, normals)
}

/// Linear blend skinning: each vertex is moved by the weighted sum of its
/// joints' `world * inverse_bind` matrices.
fn skin_primitive(primitive: &Primitive, joint_matrices: &[Mat4]) -> (Vec<Vec3>, Vec<Vec3>) {
    let (Some(joints), Some(weights)) = (&primitive.joints, &primitive.weights) else {
        return (primitive.positions.clone(), primitive.normals.clone());
    };

    let mut positions = Vec::with_capacity(primitive.positions.len());
    let mut normals = Vec::with_capacity(primitive.positions.len());
    for (i, (&p, &n)) in primitive.positions.iter().zip(&primitive.normals).enumerate() {
        let joint = joints.get(i).copied().unwrap_or_default();
        let weight = weights.get(i).copied().unwrap_or(Vec4::X);

        let mut skin = Mat4::ZERO;
        for k in 0..4 {
            if weight[k] != 0.0 {
                let m = joint_matrices
                    .get(joint[k] as usize)
                    .copied()
                    .unwrap_or(Mat4::IDENTITY);
                skin += m * weight[k];
            }
        }
        if skin == Mat4::ZERO {
            skin = Mat4::IDENTITY;
        }

        positions.push(skin.transform_point3(p));
        normals.push(skin.transform_vector3(n).normalize_or_zero());
    }
    (positions, normals)
}

/// Projects a world-space vertex to raster coordinates. Returns `None` for
/// vertices in front of the near plane.
fn project(
    position: Vec3,
    normal: Vec3,
    view_projection: Mat4,
    size: Vec2,
    near: f32,
) -> Option<Vertex> {
    let clip = view_projection * position.extend(1.0);
    if !(clip.w >= near) {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    Some(Vertex {
        position,
        screen_position: Vec2::new((ndc.x + 1.0) * 0.5 * size.x, (1.0 - ndc.y) * 0.5 * size.y),
        depth: ndc.z,
        normal,
    })
}
