//! The scene render step: ray-cast bodies, then particle sprites, into one target.

use glam::Mat4;
use log::debug;

use crate::assets::TextureProvider;
use crate::camera::Camera;
use crate::gpu::GpuContext;
use crate::lights::LightRig;
use crate::render::render_target::DepthTarget;
use crate::render::shaders;
use crate::scene::{Scene, SceneIndex, SceneSet};
use crate::texture::Texture;

/// Sprite size in pixels per unit of [`Particle::size`](crate::scene::Particle).
const PIXELS_PER_SIZE: f32 = 2.0;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct BodyUniforms {
    view_proj: [[f32; 4]; 4],
    group: [[f32; 4]; 4],
    inv_group: [[f32; 4]; 4],
    frame: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    camera_forward: [f32; 4],
    camera_right: [f32; 4],
    camera_up: [f32; 4],
    resolution: [f32; 4],
    params_a: [f32; 4],
    params_b: [f32; 4],
    highlight: [f32; 4],
    light_levels: [f32; 4],
    sun_dir: [f32; 4],
    blue_pos: [f32; 4],
    purple_pos: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ParticleUniforms {
    view_proj: [[f32; 4]; 4],
    resolution: [f32; 4],
}

/// Per-particle instance data: position and size, colour and twinkle phase.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ParticleInstance {
    position_size: [f32; 4],
    color_phase: [f32; 4],
}

impl ParticleInstance {
    const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<ParticleInstance>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x4,
            },
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

/// GPU resources owned by one scene.
struct SceneSlot {
    body_uniforms: wgpu::Buffer,
    body_bind_group: wgpu::BindGroup,
    particle_uniforms: wgpu::Buffer,
    particle_bind_group: wgpu::BindGroup,
    instances: wgpu::Buffer,
    capacity: usize,
    count: u32,
    visible: bool,
    staging: Vec<ParticleInstance>,
    _texture: Texture,
}

pub struct ScenePass {
    body_pipeline: wgpu::RenderPipeline,
    particle_pipeline: wgpu::RenderPipeline,
    slots: Vec<SceneSlot>,
    depth: DepthTarget,
}

impl ScenePass {
    /// Build pipelines and per-scene resources. Surface textures are loaded
    /// through `textures`, which substitutes placeholders for missing files.
    pub fn new(gpu: &GpuContext, scenes: &SceneSet, textures: &mut TextureProvider) -> Self {
        let device = &gpu.device;

        let body_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Body Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let particle_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let body_pipeline = create_pipeline(
            gpu,
            "Scene Body",
            shaders::SCENE_BODY,
            &body_layout,
            &[],
            wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING,
            true,
        );

        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };
        let particle_pipeline = create_pipeline(
            gpu,
            "Particles",
            shaders::PARTICLES,
            &particle_layout,
            &[ParticleInstance::LAYOUT],
            additive,
            false,
        );

        let slots = scenes
            .iter()
            .map(|scene| {
                let texture = match scene.surface_texture() {
                    Some(name) => Texture::from_image(gpu, &textures.load_named(name), name),
                    None => Texture::white(gpu),
                };
                SceneSlot::new(gpu, scene, &body_layout, &particle_layout, texture)
            })
            .collect();

        Self {
            body_pipeline,
            particle_pipeline,
            slots,
            depth: DepthTarget::new(gpu),
        }
    }

    /// Upload this frame's uniforms and particle positions for every visible scene.
    pub fn prepare(&mut self, gpu: &GpuContext, scenes: &SceneSet, camera: &Camera, lights: &LightRig, now: f32) {
        self.depth.ensure_size(gpu);
        let aspect = gpu.aspect();
        let view_proj = camera.view_projection(aspect);
        let resolution = [gpu.width() as f32, gpu.height() as f32];

        for (slot, scene) in self.slots.iter_mut().zip(scenes.iter()) {
            slot.visible = scene.group().visible;
            if !slot.visible {
                continue;
            }
            let group = scene.group().matrix();
            let frame = scene.content_frame();

            let body = body_uniforms(scene, camera, lights, view_proj, group, frame, aspect, resolution, now);
            gpu.queue
                .write_buffer(&slot.body_uniforms, 0, bytemuck::cast_slice(&[body]));

            let particles = ParticleUniforms {
                view_proj: (view_proj * group * frame).to_cols_array_2d(),
                resolution: [resolution[0], resolution[1], now, PIXELS_PER_SIZE],
            };
            gpu.queue
                .write_buffer(&slot.particle_uniforms, 0, bytemuck::cast_slice(&[particles]));

            slot.upload_particles(gpu, scene);
        }
    }

    /// Record the scene render into `target`.
    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let visible = || self.slots.iter().filter(|s| s.visible);

        render_pass.set_pipeline(&self.body_pipeline);
        for slot in visible() {
            render_pass.set_bind_group(0, &slot.body_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        render_pass.set_pipeline(&self.particle_pipeline);
        for slot in visible().filter(|s| s.count > 0) {
            render_pass.set_bind_group(0, &slot.particle_bind_group, &[]);
            render_pass.set_vertex_buffer(0, slot.instances.slice(..));
            render_pass.draw(0..6, 0..slot.count);
        }
    }
}

impl SceneSlot {
    fn new(
        gpu: &GpuContext,
        scene: &dyn Scene,
        body_layout: &wgpu::BindGroupLayout,
        particle_layout: &wgpu::BindGroupLayout,
        texture: Texture,
    ) -> Self {
        let label = scene.index().display_name();
        let body_uniforms = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<BodyUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let body_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: body_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: body_uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        let particle_uniforms = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<ParticleUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let particle_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: particle_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: particle_uniforms.as_entire_binding(),
            }],
        });

        let capacity = total_particles(scene).max(1).next_power_of_two();
        Self {
            body_uniforms,
            body_bind_group,
            particle_uniforms,
            particle_bind_group,
            instances: create_instance_buffer(gpu, label, capacity),
            capacity,
            count: 0,
            visible: false,
            staging: Vec::with_capacity(capacity),
            _texture: texture,
        }
    }

    fn upload_particles(&mut self, gpu: &GpuContext, scene: &dyn Scene) {
        self.staging.clear();
        for system in scene.particle_systems() {
            self.staging.extend(system.particles().iter().map(|p| ParticleInstance {
                position_size: [p.position.x, p.position.y, p.position.z, p.size],
                color_phase: [p.color[0], p.color[1], p.color[2], p.phase],
            }));
        }

        if self.staging.len() > self.capacity {
            self.capacity = self.staging.len().next_power_of_two();
            debug!(
                target: "stellar::render",
                "{}: growing particle buffer to {}",
                scene.index(),
                self.capacity
            );
            self.instances = create_instance_buffer(gpu, scene.index().display_name(), self.capacity);
        }

        self.count = self.staging.len() as u32;
        if !self.staging.is_empty() {
            gpu.queue
                .write_buffer(&self.instances, 0, bytemuck::cast_slice(&self.staging));
        }
    }
}

fn total_particles(scene: &dyn Scene) -> usize {
    scene.particle_systems().iter().map(|s| s.count()).sum()
}

fn create_instance_buffer(gpu: &GpuContext, label: &str, capacity: usize) -> wgpu::Buffer {
    gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (capacity * std::mem::size_of::<ParticleInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

#[allow(clippy::too_many_arguments)]
fn body_uniforms(
    scene: &dyn Scene,
    camera: &Camera,
    lights: &LightRig,
    view_proj: Mat4,
    group: Mat4,
    frame: Mat4,
    aspect: f32,
    resolution: [f32; 2],
    now: f32,
) -> BodyUniforms {
    let shading = scene.shading();
    let theme = match scene.index() {
        SceneIndex::Earth => 0.0,
        SceneIndex::Uranus => 1.0,
        SceneIndex::Galaxy => 2.0,
        SceneIndex::BlackHole => 3.0,
    };
    let p = shading.params;
    let forward = camera.forward();
    let right = camera.right();
    let up = camera.orthogonal_up();
    let position = camera.position;

    BodyUniforms {
        view_proj: view_proj.to_cols_array_2d(),
        group: group.to_cols_array_2d(),
        inv_group: group.inverse().to_cols_array_2d(),
        frame: frame.to_cols_array_2d(),
        camera_pos: [position.x, position.y, position.z, (camera.fov * 0.5).tan()],
        camera_forward: [forward.x, forward.y, forward.z, aspect],
        camera_right: [right.x, right.y, right.z, now],
        camera_up: [up.x, up.y, up.z, theme],
        resolution: [resolution[0], resolution[1], 0.0, 0.0],
        params_a: [p[0], p[1], p[2], p[3]],
        params_b: [p[4], p[5], p[6], p[7]],
        highlight: shading.highlight,
        light_levels: lights.levels.to_array(),
        sun_dir: lights.sun_direction.extend(0.0).to_array(),
        blue_pos: lights.blue_position.extend(1.0).to_array(),
        purple_pos: lights.purple_position.extend(1.0).to_array(),
    }
}

fn create_pipeline(
    gpu: &GpuContext,
    label: &str,
    source: &str,
    layout: &wgpu::BindGroupLayout,
    buffers: &[wgpu::VertexBufferLayout<'_>],
    blend: wgpu::BlendState,
    depth_write: bool,
) -> wgpu::RenderPipeline {
    let device = &gpu.device;
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs"),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs"),
            targets: &[Some(wgpu::ColorTargetState {
                format: gpu.config.format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthTarget::FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_blocks_match_the_shader_layout() {
        assert_eq!(std::mem::size_of::<BodyUniforms>(), 4 * 64 + 12 * 16);
        assert_eq!(std::mem::size_of::<ParticleUniforms>(), 80);
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 32);
    }
}
