use crate::pipelines::{PipelineOptions, mk_render_pipeline};

pub fn mk_marker_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_layout: &wgpu::BindGroupLayout,
    node_layout: &wgpu::BindGroupLayout,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Marker Pipeline Layout"),
        bind_group_layouts: &[camera_layout, node_layout],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Marker Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("marker.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        &layout,
        config.format,
        PipelineOptions {
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            depth_write: true,
            cull_mode: Some(wgpu::Face::Back),
            sample_count,
        },
        shader,
        "Marker Pipeline",
    )
}
