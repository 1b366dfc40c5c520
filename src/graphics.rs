use glam::{Vec2, Vec3};

use crate::math::edge_function;
use crate::vertex::Vertex;

/// Linear-light color buffer with a depth buffer of the same size.
#[derive(Debug, Clone)]
pub struct RasterBuffer {
    width: usize,
    height: usize,
    color: Vec<Vec3>,
    depth: Vec<f32>,
}

impl RasterBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            color: vec![Vec3::ZERO; width * height],
            depth: vec![f32::INFINITY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Resizes and clears. Keeps the allocation when the size is unchanged.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            *self = Self::new(width, height);
        }
    }

    pub fn clear(&mut self, background: Vec3) {
        self.color.fill(background);
        self.depth.fill(f32::INFINITY);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Vec3 {
        self.color[y * self.width + x]
    }

    pub fn pixels(&self) -> &[Vec3] {
        &self.color
    }
}

/// Draws a triangle with per-pixel lighting.
///
/// `shade` receives the interpolated world position and unit normal of each
/// covered pixel and returns its linear color. Triangles with non-positive
/// screen area (back faces) are skipped.
pub fn draw_triangle<F>(v0: &Vertex, v1: &Vertex, v2: &Vertex, target: &mut RasterBuffer, shade: F)
where
    F: Fn(Vec3, Vec3) -> Vec3,
{
    if target.width == 0 || target.height == 0 {
        return;
    }

    // Precompute area of the triangle
    let area = edge_function(v0.screen_position, v1.screen_position, v2.screen_position);
    if !(area > 0.0) {
        return;
    }

    // Compute bounding box of the triangle
    let min = v0.screen_position.min(v1.screen_position).min(v2.screen_position).floor();
    let max = v0.screen_position.max(v1.screen_position).max(v2.screen_position).ceil();
    if max.x < 0.0 || max.y < 0.0 || min.x >= target.width as f32 || min.y >= target.height as f32 {
        return;
    }
    let min_x = min.x.max(0.0) as usize;
    let min_y = min.y.max(0.0) as usize;
    let max_x = (max.x as usize).min(target.width - 1);
    let max_y = (max.y as usize).min(target.height - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);

            let w0 = edge_function(v1.screen_position, v2.screen_position, p);
            let w1 = edge_function(v2.screen_position, v0.screen_position, p);
            let w2 = edge_function(v0.screen_position, v1.screen_position, p);

            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            // Normalize barycentric coordinates
            let w0 = w0 / area;
            let w1 = w1 / area;
            let w2 = w2 / area;

            // Depth test
            let depth = v0.depth * w0 + v1.depth * w1 + v2.depth * w2;
            let offset = y * target.width + x;
            if depth >= target.depth[offset] {
                continue;
            }
            target.depth[offset] = depth;

            let position = v0.position * w0 + v1.position * w1 + v2.position * w2;
            let normal = (v0.normal * w0 + v1.normal * w1 + v2.normal * w2).normalize_or_zero();

            target.color[offset] = shade(position, normal);
        }
    }
}
