//! Render pipelines, one per mesh role.
//!
//! All four passes share one camera bind group (group 0) and one per-node
//! uniform layout (group 1, model matrix + a params vector the transition
//! machine animates). Texture bind groups sit at group 2 where a role has
//! maps. The planet pass alpha-blends against the star backdrop; clouds and
//! atmosphere are additive and never write depth.

pub mod atmosphere;
pub mod clouds;
pub mod marker;
pub mod planet;
pub mod stars;

use crate::{resources::texture::Texture, scene::SphereVertex};

/// Additive blending in the style of the cloud/atmosphere shells.
pub const ADDITIVE_BLENDING: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Layout of the per-node uniform (group 1).
pub fn node_uniform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("node_uniform_layout"),
    })
}

/// Layout for `count` texture+sampler pairs (group 2).
pub fn texture_pairs_layout(device: &wgpu::Device, count: u32, label: &str) -> wgpu::BindGroupLayout {
    let mut entries = Vec::new();
    for i in 0..count {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: i * 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: i * 2 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some(label),
    })
}

/// Bind `count` texture+sampler pairs against a matching layout.
pub fn bind_texture_pairs(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    textures: &[&Texture],
    label: &str,
) -> wgpu::BindGroup {
    let mut entries = Vec::new();
    for (i, texture) in textures.iter().enumerate() {
        entries.push(wgpu::BindGroupEntry {
            binding: (i * 2) as u32,
            resource: wgpu::BindingResource::TextureView(&texture.view),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: (i * 2 + 1) as u32,
            resource: wgpu::BindingResource::Sampler(&texture.sampler),
        });
    }
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &entries,
        label: Some(label),
    })
}

/// Everything `mk_render_pipeline` needs beyond the shader itself.
pub struct PipelineOptions {
    pub blend: Option<wgpu::BlendState>,
    pub depth_write: bool,
    pub cull_mode: Option<wgpu::Face>,
    pub sample_count: u32,
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    options: PipelineOptions,
    shader: wgpu::ShaderModuleDescriptor,
    label: &str,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[SphereVertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: options.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: options.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: options.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: options.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

/// The full pipeline set for one scene.
#[derive(Debug)]
pub struct Pipelines {
    pub planet: wgpu::RenderPipeline,
    pub clouds: wgpu::RenderPipeline,
    pub atmosphere: wgpu::RenderPipeline,
    pub stars: wgpu::RenderPipeline,
    pub marker: wgpu::RenderPipeline,
    pub planet_texture_layout: wgpu::BindGroupLayout,
    pub single_texture_layout: wgpu::BindGroupLayout,
    pub node_layout: wgpu::BindGroupLayout,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_layout: &wgpu::BindGroupLayout,
        sample_count: u32,
    ) -> Self {
        let node_layout = node_uniform_layout(device);
        // Day-or-night map, normal map, specular map.
        let planet_texture_layout = texture_pairs_layout(device, 3, "planet_texture_layout");
        let single_texture_layout = texture_pairs_layout(device, 1, "single_texture_layout");

        let planet = planet::mk_planet_pipeline(
            device,
            config,
            camera_layout,
            &node_layout,
            &planet_texture_layout,
            sample_count,
        );
        let clouds = clouds::mk_cloud_pipeline(
            device,
            config,
            camera_layout,
            &node_layout,
            &single_texture_layout,
            sample_count,
        );
        let atmosphere = atmosphere::mk_atmosphere_pipeline(
            device,
            config,
            camera_layout,
            &node_layout,
            sample_count,
        );
        let stars = stars::mk_star_pipeline(
            device,
            config,
            camera_layout,
            &node_layout,
            &single_texture_layout,
            sample_count,
        );
        let marker =
            marker::mk_marker_pipeline(device, config, camera_layout, &node_layout, sample_count);

        Self {
            planet,
            clouds,
            atmosphere,
            stars,
            marker,
            planet_texture_layout,
            single_texture_layout,
            node_layout,
        }
    }
}
