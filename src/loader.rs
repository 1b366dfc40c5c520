//! glTF 2.0 (`.gltf` / `.glb`) to [`ModelAsset`] conversion.

use std::fs;
use std::path::Path;

use glam::{Mat4, Quat, Vec3, Vec4};
use gltf::animation::util::ReadOutputs;
use gltf::animation::Interpolation as GltfInterpolation;
use gltf::mesh::Mode;
use gltf::Gltf;
use tracing::{debug, warn};

use crate::animation::{AnimationClip, Interpolation, Track, TrackValues};
use crate::error::ModelError;
use crate::math::calculate_normal;
use crate::scene::{Material, MaterialKind, Mesh, ModelAsset, Node, Primitive, Skin, Transform};

/// Reads and converts the model at `path`. External buffers resolve
/// relative to the file's directory.
pub fn load_path(path: &Path) -> Result<ModelAsset, ModelError> {
    let bytes = fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_bytes(&bytes, path.parent())
}

/// Converts glTF JSON or GLB bytes. Images are never decoded.
pub fn load_bytes(bytes: &[u8], base_dir: Option<&Path>) -> Result<ModelAsset, ModelError> {
    let Gltf { document, blob } = Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, base_dir, blob)?;
    let get_buffer = |buffer: gltf::Buffer| buffers.get(buffer.index()).map(|d| &d.0[..]);

    let mut asset = ModelAsset {
        nodes: document.nodes().map(convert_node).collect(),
        ..ModelAsset::default()
    };

    for node in document.nodes() {
        for child in node.children() {
            if let Some(n) = asset.nodes.get_mut(child.index()) {
                if n.parent.replace(node.index()).is_some() {
                    return Err(ModelError::InvalidHierarchy(child.index()));
                }
            }
        }
    }

    asset.roots = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().map(|n| n.index()).collect(),
        None => (0..asset.nodes.len())
            .filter(|&i| asset.nodes[i].parent.is_none())
            .collect(),
    };
    if let Some(index) = asset.find_repeated_node() {
        return Err(ModelError::InvalidHierarchy(index));
    }

    for mesh in document.meshes() {
        let mut primitives = Vec::new();
        for prim in mesh.primitives() {
            if prim.mode() != Mode::Triangles {
                warn!(
                    "Skipping {:?} primitive in mesh {}",
                    prim.mode(),
                    mesh.index()
                );
                continue;
            }
            let reader = prim.reader(get_buffer);
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<Vec3> = positions.map(Vec3::from).collect();
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            let mut primitive = Primitive {
                normals: reader
                    .read_normals()
                    .map(|n| n.map(Vec3::from).collect())
                    .unwrap_or_default(),
                joints: reader
                    .read_joints(0)
                    .map(|j| j.into_u16().collect()),
                weights: reader
                    .read_weights(0)
                    .map(|w| w.into_f32().map(Vec4::from).collect()),
                material: convert_material(&prim.material()),
                positions,
                indices,
            };
            if primitive.normals.len() != primitive.positions.len() {
                primitive = with_flat_normals(primitive);
            }
            primitive.indices.truncate(primitive.indices.len() / 3 * 3);
            primitives.push(primitive);
        }
        asset.meshes.push(Mesh {
            name: mesh.name().map(str::to_string),
            primitives,
        });
    }

    for skin in document.skins() {
        let joints: Vec<usize> = skin.joints().map(|j| j.index()).collect();
        let mut inverse_bind_matrices: Vec<Mat4> = skin
            .reader(get_buffer)
            .read_inverse_bind_matrices()
            .map(|m| m.map(|cols| Mat4::from_cols_array_2d(&cols)).collect())
            .unwrap_or_default();
        inverse_bind_matrices.resize(joints.len(), Mat4::IDENTITY);
        asset.skins.push(Skin {
            joints,
            inverse_bind_matrices,
        });
    }

    for (index, animation) in document.animations().enumerate() {
        let mut tracks = Vec::new();
        for channel in animation.channels() {
            let reader = channel.reader(get_buffer);
            let (Some(inputs), Some(outputs)) = (reader.read_inputs(), reader.read_outputs())
            else {
                continue;
            };
            let values = match outputs {
                ReadOutputs::Translations(v) => TrackValues::Translation(v.map(Vec3::from).collect()),
                ReadOutputs::Rotations(r) => {
                    TrackValues::Rotation(r.into_f32().map(Quat::from_array).collect())
                }
                ReadOutputs::Scales(v) => TrackValues::Scale(v.map(Vec3::from).collect()),
                ReadOutputs::MorphTargetWeights(_) => {
                    debug!("Ignoring morph target channel in animation {}", index);
                    continue;
                }
            };
            tracks.push(Track {
                node: channel.target().node().index(),
                interpolation: match channel.sampler().interpolation() {
                    GltfInterpolation::Linear => Interpolation::Linear,
                    GltfInterpolation::Step => Interpolation::Step,
                    GltfInterpolation::CubicSpline => Interpolation::CubicSpline,
                },
                times: inputs.collect(),
                values,
            });
        }
        let name = animation
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("animation_{index}"));
        asset.animations.push(AnimationClip::new(name, tracks));
    }

    if asset.triangle_count() == 0 {
        return Err(ModelError::Empty);
    }

    debug!(
        "Converted glTF: {} nodes, {} meshes, {} skins, {} animations, {} triangles",
        asset.nodes.len(),
        asset.meshes.len(),
        asset.skins.len(),
        asset.animations.len(),
        asset.triangle_count()
    );
    Ok(asset)
}

fn convert_node(node: gltf::Node) -> Node {
    let (translation, rotation, scale) = node.transform().decomposed();
    Node {
        name: node.name().map(str::to_string),
        parent: None,
        children: node.children().map(|c| c.index()).collect(),
        rest: Transform {
            translation: Vec3::from(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from(scale),
        },
        mesh: node.mesh().map(|m| m.index()),
        skin: node.skin().map(|s| s.index()),
    }
}

fn convert_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();
    Material {
        kind: if material.unlit() {
            MaterialKind::Basic
        } else {
            MaterialKind::Standard
        },
        color: Some(Vec3::new(r, g, b)),
        opacity: Some(a),
        transparent: material.alpha_mode() == gltf::material::AlphaMode::Blend,
        metalness: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        double_sided: material.double_sided(),
    }
}

/// Unshares vertices so every triangle carries its own face normal.
fn with_flat_normals(primitive: Primitive) -> Primitive {
    let Primitive {
        positions,
        indices,
        joints,
        weights,
        material,
        ..
    } = primitive;

    let mut out = Primitive {
        material,
        joints: joints.as_ref().map(|_| Vec::new()),
        weights: weights.as_ref().map(|_| Vec::new()),
        ..Primitive::default()
    };

    for tri in indices.chunks_exact(3) {
        let idx = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(&a), Some(&b), Some(&c)) =
            (positions.get(idx[0]), positions.get(idx[1]), positions.get(idx[2]))
        else {
            continue;
        };
        let normal = calculate_normal(a, b, c);
        for (&i, p) in idx.iter().zip([a, b, c]) {
            out.indices.push(out.positions.len() as u32);
            out.positions.push(p);
            out.normals.push(normal);
            if let (Some(src), Some(dst)) = (joints.as_ref(), out.joints.as_mut()) {
                dst.push(src.get(i).copied().unwrap_or_default());
            }
            if let (Some(src), Some(dst)) = (weights.as_ref(), out.weights.as_mut()) {
                dst.push(src.get(i).copied().unwrap_or(Vec4::X));
            }
        }
    }
    out
}
