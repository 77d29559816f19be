use crate::pipelines::{ADDITIVE_BLENDING, PipelineOptions, mk_render_pipeline};

pub fn mk_atmosphere_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_layout: &wgpu::BindGroupLayout,
    node_layout: &wgpu::BindGroupLayout,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Atmosphere Pipeline Layout"),
        bind_group_layouts: &[camera_layout, node_layout],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Atmosphere Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("atmosphere.wgsl").into()),
    };

    // Back faces only: the glow shell renders behind/around the planet body.
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        PipelineOptions {
            blend: Some(ADDITIVE_BLENDING),
            depth_write: false,
            cull_mode: Some(wgpu::Face::Front),
            sample_count,
        },
        shader,
        "Atmosphere Pipeline",
    )
}
