//! In-memory scene graph for a loaded model.
//!
//! A [`ModelAsset`] is what the loader produces; a [`Model`] is an asset that
//! has been scaled, centered, and given a mutable pose for animation.

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::animation::AnimationClip;

/// Local translation / rotation / scale of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// How a surface responds to light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Standard,
    Physical,
    Lambert,
    /// Unlit; ignores the light rig.
    Basic,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub kind: MaterialKind,
    /// Linear RGB; `None` only for `Other` materials that carry no color.
    pub color: Option<Vec3>,
    pub opacity: Option<f32>,
    pub transparent: bool,
    pub metalness: f32,
    pub roughness: f32,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            kind: MaterialKind::Standard,
            color: Some(Vec3::ONE),
            opacity: Some(1.0),
            transparent: false,
            metalness: 1.0,
            roughness: 1.0,
            double_sided: false,
        }
    }
}

impl Material {
    pub fn base_color(&self) -> Vec3 {
        self.color.unwrap_or(Vec3::ONE)
    }
}

/// A triangle list with optional skinning attributes.
#[derive(Debug, Clone, Default)]
pub struct Primitive {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub joints: Option<Vec<[u16; 4]>>,
    pub weights: Option<Vec<Vec4>>,
    pub material: Material,
}

impl Primitive {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_skinned(&self) -> bool {
        self.joints.is_some() && self.weights.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, Default)]
pub struct Skin {
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Vec<Mat4>,
}

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub name: Option<String>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub rest: Transform,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }
}

/// A parsed model before placement in the scene.
#[derive(Debug, Clone, Default)]
pub struct ModelAsset {
    pub nodes: Vec<Node>,
    pub roots: Vec<usize>,
    pub meshes: Vec<Mesh>,
    pub skins: Vec<Skin>,
    pub animations: Vec<AnimationClip>,
}

impl ModelAsset {
    pub fn triangle_count(&self) -> usize {
        self.meshes
            .iter()
            .flat_map(|m| m.primitives.iter())
            .map(Primitive::triangle_count)
            .sum()
    }

    pub fn rest_pose(&self) -> Vec<Transform> {
        self.nodes.iter().map(|n| n.rest).collect()
    }

    /// Finds a node reachable twice from the roots, i.e. one with two
    /// parents or on a cycle.
    pub fn find_repeated_node(&self) -> Option<usize> {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = self.roots.clone();
        while let Some(index) = stack.pop() {
            let seen = visited.get_mut(index)?;
            if *seen {
                return Some(index);
            }
            *seen = true;
            stack.extend(self.nodes[index].children.iter().copied());
        }
        None
    }

    /// World matrices for every node given local transforms and a root matrix.
    /// Each node is visited at most once.
    pub fn world_matrices(&self, pose: &[Transform], root: Mat4) -> Vec<Mat4> {
        let mut world = vec![Mat4::IDENTITY; self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(usize, Mat4)> = self.roots.iter().rev().map(|&r| (r, root)).collect();
        while let Some((index, parent)) = stack.pop() {
            match visited.get_mut(index) {
                Some(seen) if !*seen => *seen = true,
                _ => continue,
            }
            let local = pose.get(index).copied().unwrap_or(self.nodes[index].rest);
            let matrix = parent * local.matrix();
            world[index] = matrix;
            for &child in self.nodes[index].children.iter().rev() {
                stack.push((child, matrix));
            }
        }
        world
    }

    /// Bounding box of every mesh vertex in the rest pose.
    pub fn bounds(&self, root: Mat4) -> Bounds {
        let world = self.world_matrices(&self.rest_pose(), root);
        let mut bounds = Bounds::EMPTY;
        for (index, node) in self.nodes.iter().enumerate() {
            let Some(mesh) = node.mesh.and_then(|m| self.meshes.get(m)) else {
                continue;
            };
            for primitive in &mesh.primitives {
                for &p in &primitive.positions {
                    bounds.expand(world[index].transform_point3(p));
                }
            }
        }
        bounds
    }

    /// Unit cube with one mesh node and no animations, used as a placeholder
    /// when no model can be loaded.
    pub fn cube() -> Self {
        // Define cube vertices
        let corners = [
            Vec3::new(-1.0, -1.0, -1.0), // 0
            Vec3::new(1.0, -1.0, -1.0),  // 1
            Vec3::new(1.0, 1.0, -1.0),   // 2
            Vec3::new(-1.0, 1.0, -1.0),  // 3
            Vec3::new(-1.0, -1.0, 1.0),  // 4
            Vec3::new(1.0, -1.0, 1.0),   // 5
            Vec3::new(1.0, 1.0, 1.0),    // 6
            Vec3::new(-1.0, 1.0, 1.0),   // 7
        ];

        // Define cube faces (counter-clockwise seen from outside)
        let faces = [
            (0, 3, 2, 1),
            (4, 5, 6, 7),
            (0, 4, 7, 3),
            (1, 2, 6, 5),
            (0, 1, 5, 4),
            (3, 7, 6, 2),
        ];

        let mut primitive = Primitive::default();
        for &(a, b, c, d) in &faces {
            let normal = crate::math::calculate_normal(corners[a], corners[b], corners[c]);
            let base = primitive.positions.len() as u32;
            for &i in &[a, b, c, d] {
                primitive.positions.push(corners[i]);
                primitive.normals.push(normal);
            }
            primitive
                .indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            nodes: vec![Node {
                name: Some("cube".to_string()),
                mesh: Some(0),
                ..Node::default()
            }],
            roots: vec![0],
            meshes: vec![Mesh {
                name: Some("cube".to_string()),
                primitives: vec![primitive],
            }],
            skins: Vec::new(),
            animations: Vec::new(),
        }
    }
}

/// A processed model placed in the scene.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub asset: ModelAsset,
    /// Root placement computed when the model was processed.
    pub root: Transform,
    pub original_position: Vec3,
    /// Current local transforms, written by the animation mixer.
    pub pose: Vec<Transform>,
}

impl Model {
    pub fn new(name: impl Into<String>, asset: ModelAsset) -> Self {
        let pose = asset.rest_pose();
        Self {
            name: name.into(),
            asset,
            root: Transform::IDENTITY,
            original_position: Vec3::ZERO,
            pose,
        }
    }

    pub fn world_matrices(&self) -> Vec<Mat4> {
        self.asset.world_matrices(&self.pose, self.root.matrix())
    }

    /// Puts every node back in its rest transform.
    pub fn reset_pose(&mut self) {
        for (transform, node) in self.pose.iter_mut().zip(&self.asset.nodes) {
            *transform = node.rest;
        }
    }

    pub fn materials_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.asset
            .meshes
            .iter_mut()
            .flat_map(|m| m.primitives.iter_mut())
            .map(|p| &mut p.material)
    }
}
