//! Batching of the static scene into instanced GPU draws.
//!
//! After assembly the hierarchy is walked once and every drawable node is
//! grouped by (mesh, material, shadow flags): the repeated goblets collapse
//! into a single instanced draw, the couverts into another. The scene never
//! changes afterwards, so batches and the light rig are built exactly once
//! and the render loop only replays them.

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::{
    assembler::Scene,
    data_structures::{
        instance::Instance,
        light::{LightConfig, LightsUniform, MAX_LIGHTS},
        material::{Material, MaterialUniform},
        mesh::Mesh,
        node::{Node, NodeKind, ShadowFlags},
        texture::{ShadowMaps, Texture},
    },
};

/// A planned instanced draw: one mesh, one shared material, N transforms.
pub struct BatchPlan {
    pub mesh: usize,
    pub material: Arc<Material>,
    pub shadow: ShadowFlags,
    pub instances: Vec<Instance>,
}

/// Walks the assembled hierarchy and groups drawable nodes into batches.
///
/// Nodes with the same mesh index and the same material reference share a
/// batch, so the instance count per batch counts the material's users.
/// Drawable nodes without a material are skipped with a warning.
pub fn plan_batches(root: &Node) -> Vec<BatchPlan> {
    let mut plans: Vec<BatchPlan> = Vec::new();
    root.visit(&mut |node, world| {
        let NodeKind::Mesh(mesh) = node.kind else {
            return;
        };
        let Some(material) = &node.material else {
            log::warn!("mesh node {} has no material and will not be drawn", node.name);
            return;
        };
        let existing = plans.iter_mut().find(|plan| {
            plan.mesh == mesh
                && Arc::ptr_eq(&plan.material, material)
                && plan.shadow == node.shadow
        });
        match existing {
            Some(plan) => plan.instances.push(world.clone()),
            None => plans.push(BatchPlan {
                mesh,
                material: Arc::clone(material),
                shadow: node.shadow,
                instances: vec![world.clone()],
            }),
        }
    });
    plans
}

/// Collects every light node together with its world transform, in tree
/// order (the key light first, then its fills).
pub fn collect_lights(root: &Node) -> Vec<(LightConfig, Instance)> {
    let mut lights = Vec::new();
    root.visit(&mut |node, world| {
        if let NodeKind::Light(config) = &node.kind {
            lights.push((config.clone(), world.clone()));
        }
    });
    lights
}

/// One instanced draw ready for the GPU.
pub struct DrawBatch {
    pub mesh: usize,
    pub bind_group: wgpu::BindGroup,
    pub instance_buffer: wgpu::Buffer,
    pub amount: u32,
    pub cast_shadow: bool,
}

/// One light's shadow render target and its pass uniform.
pub struct ShadowPass {
    pub bind_group: wgpu::BindGroup,
}

/// The lighting environment on the GPU.
pub struct LightRig {
    pub uniform: LightsUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub shadow_maps: ShadowMaps,
    /// Index-aligned with the light slots; `None` for non-casting slots.
    pub shadow_passes: Vec<Option<ShadowPass>>,
}

/// The render-ready scene: uploaded meshes, draw batches and lights.
pub struct GpuScene {
    pub meshes: Vec<Mesh>,
    pub batches: Vec<DrawBatch>,
    pub lights: LightRig,
}

impl GpuScene {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        meshes: Vec<Mesh>,
        material_layout: &wgpu::BindGroupLayout,
        lights_layout: &wgpu::BindGroupLayout,
        shadow_pass_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let fallback = Texture::create_solid([255, 255, 255, 255], device, queue);
        let fallback_sampler = crate::data_structures::texture::create_default_sampler(device);

        let batches = plan_batches(&scene.root)
            .into_iter()
            .map(|plan| {
                let raws = plan
                    .instances
                    .iter()
                    .map(Instance::to_raw)
                    .collect::<Vec<_>>();
                let instance_buffer =
                    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Instance Buffer"),
                        contents: bytemuck::cast_slice(&raws),
                        usage: wgpu::BufferUsages::VERTEX,
                    });

                let uniform = MaterialUniform::new(&plan.material, plan.shadow.receive);
                let material_buffer =
                    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Material Buffer"),
                        contents: bytemuck::cast_slice(&[uniform]),
                        usage: wgpu::BufferUsages::UNIFORM,
                    });
                let map = plan.material.map.as_ref();
                let view = map.map_or(&fallback.view, |map| &map.view);
                let sampler = map
                    .and_then(|map| map.sampler.as_ref())
                    .unwrap_or(&fallback_sampler);
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: material_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(sampler),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: material_buffer.as_entire_binding(),
                        },
                    ],
                    label: Some(&format!("{} material bind group", plan.material.name)),
                });

                DrawBatch {
                    mesh: plan.mesh,
                    bind_group,
                    instance_buffer,
                    amount: plan.instances.len() as u32,
                    cast_shadow: plan.shadow.cast,
                }
            })
            .collect();

        let lights = Self::build_lights(
            device,
            scene,
            lights_layout,
            shadow_pass_layout,
        );

        Self {
            meshes,
            batches,
            lights,
        }
    }

    fn build_lights(
        device: &wgpu::Device,
        scene: &Scene,
        lights_layout: &wgpu::BindGroupLayout,
        shadow_pass_layout: &wgpu::BindGroupLayout,
    ) -> LightRig {
        let collected = collect_lights(&scene.root);
        let uniform = LightsUniform::new(&collected, &scene.hemisphere);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lights Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shadow_maps = Texture::create_shadow_maps(device, MAX_LIGHTS as u32);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: lights_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow_maps.array_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&shadow_maps.sampler),
                },
            ],
            label: Some("lights bind group"),
        });

        let shadow_passes = collected
            .iter()
            .take(MAX_LIGHTS)
            .map(|(config, world)| {
                if !config.cast_shadow {
                    return None;
                }
                let view_proj: [[f32; 4]; 4] = config.shadow_view_proj(world).into();
                let pass_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Shadow Pass Buffer"),
                    contents: bytemuck::cast_slice(&view_proj),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: shadow_pass_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: pass_buffer.as_entire_binding(),
                    }],
                    label: Some("shadow pass bind group"),
                });
                Some(ShadowPass { bind_group })
            })
            .collect();

        LightRig {
            uniform,
            buffer,
            bind_group,
            shadow_maps,
            shadow_passes,
        }
    }

    /// Renders every shadow-casting light's depth map.
    pub fn encode_shadow_passes(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::RenderPipeline,
    ) {
        for (layer, pass) in self.lights.shadow_passes.iter().enumerate() {
            let Some(pass) = pass else {
                continue;
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.lights.shadow_maps.layer_views[layer],
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &pass.bind_group, &[]);
            for batch in self.batches.iter().filter(|batch| batch.cast_shadow) {
                self.draw_batch(&mut render_pass, batch);
            }
        }
    }

    /// Replays every batch into the main pass. The pipeline and the camera
    /// bind group are expected to be set by the caller.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, camera_bind_group: &wgpu::BindGroup) {
        render_pass.set_bind_group(1, camera_bind_group, &[]);
        render_pass.set_bind_group(2, &self.lights.bind_group, &[]);
        for batch in &self.batches {
            render_pass.set_bind_group(0, &batch.bind_group, &[]);
            self.draw_batch(render_pass, batch);
        }
    }

    fn draw_batch(&self, render_pass: &mut wgpu::RenderPass<'_>, batch: &DrawBatch) {
        if batch.amount == 0 {
            log::warn!("you attempted to render a batch with zero instances");
            return;
        }
        let mesh = &self.meshes[batch.mesh];
        render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, batch.instance_buffer.slice(..));
        render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..mesh.num_elements, 0, 0..batch.amount);
    }
}
