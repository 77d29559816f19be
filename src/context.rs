//! GPU plumbing: surface, device, pipelines and the per-frame render pass.

use std::sync::Arc;

use anyhow::Context as _;
use cgmath::{Point3, Vector3};
use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, Projection},
    globe::GlobeState,
    pipelines::Pipelines,
    resources::texture::Texture,
    scene::{QualityTier, SceneGraph},
};

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub quality: QualityTier,
    pub pipelines: Pipelines,
    depth_texture: Texture,
    msaa_target: Option<Texture>,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();
        // The reduced tier is decided once, at creation, from the initial
        // viewport width. Resizes later on do not re-tier the scene.
        let quality = QualityTier::from_viewport_width(size.width);

        log::info!("wgpu setup, {quality:?} tier");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL does not support all of wgpu's features, so the web
                // build runs against the downlevel limits.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("device request failed")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders assume an srgb surface; fall back to whatever the
        // platform offers if none is available.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera = Camera::new((0.0, 0.2, 3.5));
        let projection =
            Projection::new(config.width, config.height, cgmath::Deg(45.0), 0.1, 2000.0);
        let camera = CameraResources::new(&device, camera, &projection);

        let sample_count = quality.msaa_samples();
        let depth_texture = Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            sample_count,
            "depth_texture",
        );
        let msaa_target = (sample_count > 1)
            .then(|| Texture::create_msaa_target(&device, &config, sample_count));

        let pipelines = Pipelines::new(&device, &config, &camera.bind_group_layout, sample_count);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            quality,
            pipelines,
            depth_texture,
            msaa_target,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.projection.resize(width, height);

        let sample_count = self.quality.msaa_samples();
        self.depth_texture = Texture::create_depth_texture(
            &self.device,
            [width, height],
            sample_count,
            "depth_texture",
        );
        if self.msaa_target.is_some() {
            self.msaa_target = Some(Texture::create_msaa_target(
                &self.device,
                &self.config,
                sample_count,
            ));
        }
    }

    /// Upload the frame's state and draw the scene.
    pub fn render(
        &mut self,
        scene: &SceneGraph,
        globe: &GlobeState,
    ) -> Result<(), wgpu::SurfaceError> {
        self.camera.camera.position = Point3::from(<Vector3<f32> as Into<[f32; 3]>>::into(globe.visual.camera_position));
        self.camera.upload(&self.queue, &self.projection);
        scene.write_uniforms(&self.queue, globe);

        let output = self.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            // With MSAA on, draw into the multisampled target and resolve
            // into the surface; otherwise draw into the surface directly.
            let (view, resolve_target) = match &self.msaa_target {
                Some(msaa) => (&msaa.view, Some(&surface_view)),
                None => (&surface_view, None),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            scene.render(
                &mut render_pass,
                &self.pipelines,
                &self.camera.bind_group,
                globe.visual.active_map,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// World ray under a pointer position, for planet hit tests.
    pub fn pointer_ray(&self, pointer: (f32, f32)) -> crate::camera::Ray {
        self.camera.camera.cast_ray_from_pointer(
            pointer,
            self.config.width as f32,
            self.config.height as f32,
            &self.projection,
        )
    }
}
