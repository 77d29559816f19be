use crate::pipelines::{ADDITIVE_BLENDING, PipelineOptions, mk_render_pipeline};

pub fn mk_cloud_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_layout: &wgpu::BindGroupLayout,
    node_layout: &wgpu::BindGroupLayout,
    texture_layout: &wgpu::BindGroupLayout,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Cloud Pipeline Layout"),
        bind_group_layouts: &[camera_layout, node_layout, texture_layout],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Cloud Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("clouds.wgsl").into()),
    };

    // Both faces render so the far cloud shell shimmers through the rim.
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        PipelineOptions {
            blend: Some(ADDITIVE_BLENDING),
            depth_write: false,
            cull_mode: None,
            sample_count,
        },
        shader,
        "Cloud Pipeline",
    )
}
