use crate::pipelines::{PipelineOptions, mk_render_pipeline};

pub fn mk_star_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_layout: &wgpu::BindGroupLayout,
    node_layout: &wgpu::BindGroupLayout,
    texture_layout: &wgpu::BindGroupLayout,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Star Pipeline Layout"),
        bind_group_layouts: &[camera_layout, node_layout, texture_layout],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Star Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("stars.wgsl").into()),
    };

    // The camera sits inside the backdrop sphere, so only front faces are
    // culled; the pass runs first and never writes depth.
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        PipelineOptions {
            blend: None,
            depth_write: false,
            cull_mode: Some(wgpu::Face::Front),
            sample_count,
        },
        shader,
        "Star Pipeline",
    )
}
