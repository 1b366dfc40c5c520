use glam::{Vec2, Vec3};

/// Vertex structure with world position, screen position, depth, and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Vec3,
    pub screen_position: Vec2,
    /// Distance in front of the camera, used for the depth test
    pub depth: f32,
    pub normal: Vec3,
}
