//! Asset loading: the binary glTF scene and the goblet texture.
//!
//! The scene file and the texture are fetched independently (filesystem on
//! native, HTTP on the web) and joined; the glTF node tree is decomposed
//! into the retained [`Node`](crate::data_structures::node::Node) hierarchy
//! while mesh geometry is uploaded to GPU buffers. The loader preserves
//! child order, which the assembler's structural contract depends on.

use std::io::{BufReader, Cursor};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::Instance,
    light::{LightConfig, LightKind},
    material::Material,
    mesh::{Mesh, ModelVertex},
    node::{Node, NodeKind},
};

pub mod texture;

pub use texture::{load_binary, load_texture};

/// The fixed assets of the session.
pub const SCENE_FILE: &str = "coffee-scene.glb";
pub const TEXTURE_FILE: &str = "coffee-texture.png";

const GOBLET_ROUGHNESS: f32 = 0.5;
const COUVERT_ROUGHNESS: f32 = 0.3;
const COUVERT_COLOR: [f32; 3] = [0x15 as f32 / 255.0; 3];

/// Everything the assembler and renderer need after a completed load.
pub struct LoadedScene {
    pub root: Node,
    pub meshes: Vec<Mesh>,
    pub goblet_material: Arc<Material>,
    pub couvert_material: Arc<Material>,
}

/// Loads the scene file and the goblet texture concurrently and builds the
/// node hierarchy. Fires once; a failed load is logged by the caller and
/// not retried.
pub async fn load_scene(
    scene_file: &str,
    texture_file: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<LoadedScene> {
    let (scene_bytes, goblet_map) = futures::try_join!(
        load_binary(scene_file),
        load_texture(texture_file, device, queue)
    )?;

    let goblet_material = Arc::new(Material::textured("goblet", goblet_map, GOBLET_ROUGHNESS));
    let couvert_material = Arc::new(Material::solid(
        "couvert",
        COUVERT_COLOR,
        COUVERT_ROUGHNESS,
    ));

    let gltf_reader = BufReader::new(Cursor::new(scene_bytes));
    let gltf = gltf::Gltf::from_reader(gltf_reader)
        .with_context(|| format!("parsing {scene_file}"))?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.into());
                };
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(uri).await?;
                buffer_data.push(bin);
            }
        }
    }

    // Upload geometry, one Mesh per glTF mesh so nodes can share it by index.
    let meshes = gltf
        .meshes()
        .map(|mesh| load_mesh(&mesh, &buffer_data, device))
        .collect::<Vec<_>>();

    // Build the node tree. A single scene root is used as-is, several roots
    // get wrapped, preserving their order.
    let scene = gltf.scenes().next().context("asset contains no scene")?;
    let mut roots = scene
        .nodes()
        .map(|node| to_node(&node))
        .collect::<Vec<_>>();
    let root = if roots.len() == 1 {
        roots.remove(0)
    } else {
        let mut root = Node::group("scene");
        root.children = roots;
        root
    };

    Ok(LoadedScene {
        root,
        meshes,
        goblet_material,
        couvert_material,
    })
}

fn to_node(node: &gltf::scene::Node) -> Node {
    let kind = if let Some(mesh) = node.mesh() {
        NodeKind::Mesh(mesh.index())
    } else if let Some(light) = node.light() {
        NodeKind::Light(light_config(&light))
    } else {
        NodeKind::Group
    };

    let mut out = Node::new(node.name().unwrap_or("unnamed"), kind);
    let (position, rotation, scale) = node.transform().decomposed();
    out.transform = Instance {
        position: position.into(),
        rotation: rotation.into(),
        scale: scale.into(),
    };
    out.children = node.children().map(|child| to_node(&child)).collect();
    out
}

fn light_config(light: &gltf::khr_lights_punctual::Light) -> LightConfig {
    let mut config = match light.kind() {
        gltf::khr_lights_punctual::Kind::Directional => LightConfig::directional(),
        _ => LightConfig::spot(),
    };
    config.color = light.color();
    config
}

fn load_mesh(mesh: &gltf::Mesh, buf: &Vec<Vec<u8>>, device: &wgpu::Device) -> Mesh {
    let name = mesh.name().unwrap_or("unnamed_mesh").to_string();
    let mut vertices: Vec<ModelVertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| Some(&buf[buffer.index()]));
        let base = vertices.len() as u32;

        if let Some(positions) = reader.read_positions() {
            positions.for_each(|position| {
                vertices.push(ModelVertex {
                    position,
                    tex_coords: Default::default(),
                    normal: Default::default(),
                })
            });
        }
        if let Some(normals) = reader.read_normals() {
            for (idx, normal) in normals.enumerate() {
                vertices[base as usize + idx].normal = normal;
            }
        }
        if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
            for (idx, tex_coord) in tex_coords.enumerate() {
                vertices[base as usize + idx].tex_coords = tex_coord;
            }
        }
        if let Some(raw_indices) = reader.read_indices() {
            indices.extend(raw_indices.into_u32().map(|idx| base + idx));
        }
    }

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Vertex Buffer", name)),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Index Buffer", name)),
        contents: bytemuck::cast_slice(&indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    Mesh {
        name,
        vertex_buffer,
        index_buffer,
        num_elements: indices.len() as u32,
    }
}
