//! Scene construction and per-frame uniform upload.
//!
//! [`SceneGraph::new`] is pure construction: given the settled texture set and
//! a quality tier it builds every mesh, buffer and bind group exactly once.
//! The 23.5° axial tilt lives inside the rotation composition in
//! [`crate::globe::GlobeState`] and is never re-applied per frame; only spin
//! and drag are dynamic. The day and night maps get one bind group each so
//! the texture swap is a plain bind-group choice at draw time.

use cgmath::{Matrix4, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    geo::lat_lng_to_vector3,
    globe::GlobeState,
    pipelines::{Pipelines, bind_texture_pairs},
    resources::{TextureSet, texture::Texture},
    transition::PlanetMap,
};

pub const PLANET_RADIUS: f32 = 1.0;
pub const CLOUD_RADIUS: f32 = 1.01;
pub const ATMOSPHERE_RADIUS: f32 = 1.1;
pub const STAR_RADIUS: f32 = 90.0;
const MARKER_RADIUS: f32 = 0.02;
/// Markers float just above the cloud shell.
const MARKER_ALTITUDE: f32 = 1.02;

/// Device-capability hint. Below this viewport width the scene drops to the
/// reduced tier: coarser tessellation, no MSAA, planet and atmosphere scaled
/// down so the composition stays centered on a narrow screen.
const REDUCED_WIDTH_THRESHOLD: u32 = 768;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QualityTier {
    Full,
    Reduced,
}

impl QualityTier {
    pub fn from_viewport_width(width: u32) -> Self {
        if width < REDUCED_WIDTH_THRESHOLD {
            QualityTier::Reduced
        } else {
            QualityTier::Full
        }
    }

    /// Segment count for the planet and cloud spheres.
    pub fn segments(self) -> u32 {
        match self {
            QualityTier::Full => 128,
            QualityTier::Reduced => 64,
        }
    }

    pub fn msaa_samples(self) -> u32 {
        match self {
            QualityTier::Full => 4,
            QualityTier::Reduced => 1,
        }
    }

    /// Uniform scale applied to the planet and atmosphere groups.
    pub fn world_scale(self) -> f32 {
        match self {
            QualityTier::Full => 1.0,
            QualityTier::Reduced => 0.7,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
}

impl SphereVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 4] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x3, 3 => Float32x3];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SphereVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Build a UV sphere with `segments` longitudinal slices and half as many
/// rings. Winding is counter-clockwise seen from outside.
pub fn generate_sphere(radius: f32, segments: u32) -> (Vec<SphereVertex>, Vec<u32>) {
    let rings = (segments / 2).max(3);
    let segments = segments.max(3);

    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let phi = v * std::f32::consts::PI;
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let theta = u * std::f32::consts::TAU;

            let normal = Vector3::new(
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            );
            // Derivative of the position along u, the texture's x direction.
            let tangent = Vector3::new(-theta.sin(), 0.0, theta.cos());

            vertices.push(SphereVertex {
                position: (normal * radius).into(),
                tex_coords: [u, v],
                normal: normal.into(),
                tangent: tangent.into(),
            });
        }
    }

    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * (segments + 1) + seg;
            let b = a + segments + 1;
            indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }

    (vertices, indices)
}

/// Model matrix and animated parameters, as laid out for the shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeUniform {
    model: [[f32; 4]; 4],
    params: [f32; 4],
}

impl NodeUniform {
    fn new(model: Matrix4<f32>, opacity: f32) -> Self {
        Self {
            model: model.into(),
            params: [opacity, 0.0, 0.0, 0.0],
        }
    }
}

/// One renderable mesh with its per-node uniform.
#[derive(Debug)]
pub struct SceneNode {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl SceneNode {
    fn new(
        device: &wgpu::Device,
        pipelines: &Pipelines,
        radius: f32,
        segments: u32,
        label: &str,
    ) -> Self {
        let (vertices, indices) = generate_sphere(radius, segments);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Node Uniform")),
            contents: bytemuck::cast_slice(&[NodeUniform::new(Matrix4::from_scale(1.0), 1.0)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &pipelines.node_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some(&format!("{label} node_bind_group")),
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            uniform_buffer,
            bind_group,
        }
    }

    fn upload(&self, queue: &wgpu::Queue, model: Matrix4<f32>, opacity: f32) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[NodeUniform::new(model, opacity)]),
        );
    }

    fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_bind_group(1, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// An optional point of interest pinned to the planet surface.
#[derive(Clone, Copy, Debug)]
pub struct MarkerConfig {
    pub lat: f32,
    pub lng: f32,
}

/// The static scene: all nodes, their texture bind groups and the quality
/// tier they were built for. Exactly one per engine instance, torn down
/// wholesale on destroy.
#[derive(Debug)]
pub struct SceneGraph {
    pub quality: QualityTier,
    planet: SceneNode,
    planet_day: wgpu::BindGroup,
    planet_night: wgpu::BindGroup,
    clouds: SceneNode,
    clouds_texture: wgpu::BindGroup,
    atmosphere: SceneNode,
    stars: SceneNode,
    stars_texture: wgpu::BindGroup,
    marker: Option<(SceneNode, Vector3<f32>)>,
}

impl SceneGraph {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipelines: &Pipelines,
        textures: &TextureSet,
        quality: QualityTier,
        marker: Option<MarkerConfig>,
    ) -> Self {
        let segments = quality.segments();

        let day = Texture::from_loaded(device, queue, &textures.day, true, "day map");
        let night = Texture::from_loaded(device, queue, &textures.night, true, "night map");
        let normal = Texture::from_loaded(device, queue, &textures.normal, false, "normal map");
        let specular =
            Texture::from_loaded(device, queue, &textures.specular, false, "specular map");
        let clouds_map = Texture::from_loaded(device, queue, &textures.clouds, true, "cloud map");
        let stars_map = Texture::from_loaded(device, queue, &textures.stars, true, "star map");

        let planet_day = bind_texture_pairs(
            device,
            &pipelines.planet_texture_layout,
            &[&day, &normal, &specular],
            "planet_day_bind_group",
        );
        let planet_night = bind_texture_pairs(
            device,
            &pipelines.planet_texture_layout,
            &[&night, &normal, &specular],
            "planet_night_bind_group",
        );
        let clouds_texture = bind_texture_pairs(
            device,
            &pipelines.single_texture_layout,
            &[&clouds_map],
            "clouds_bind_group",
        );
        let stars_texture = bind_texture_pairs(
            device,
            &pipelines.single_texture_layout,
            &[&stars_map],
            "stars_bind_group",
        );

        let planet = SceneNode::new(device, pipelines, PLANET_RADIUS, segments, "Planet");
        let clouds = SceneNode::new(device, pipelines, CLOUD_RADIUS, segments, "Clouds");
        let atmosphere = SceneNode::new(
            device,
            pipelines,
            ATMOSPHERE_RADIUS,
            segments / 2,
            "Atmosphere",
        );
        let stars = SceneNode::new(device, pipelines, STAR_RADIUS, 64, "Stars");

        let marker = marker.map(|config| {
            let node = SceneNode::new(device, pipelines, MARKER_RADIUS, 16, "Marker");
            let position = lat_lng_to_vector3(config.lat, config.lng, MARKER_ALTITUDE);
            (node, position)
        });

        Self {
            quality,
            planet,
            planet_day,
            planet_night,
            clouds,
            clouds_texture,
            atmosphere,
            stars,
            stars_texture,
            marker,
        }
    }

    /// Push the current animation state into every node uniform.
    pub fn write_uniforms(&self, queue: &wgpu::Queue, globe: &GlobeState) {
        let scale = Matrix4::from_scale(self.quality.world_scale());
        let visual = &globe.visual;

        self.planet.upload(
            queue,
            Matrix4::from(globe.planet_rotation()) * scale,
            visual.planet_opacity,
        );
        self.clouds.upload(
            queue,
            Matrix4::from(globe.cloud_rotation()) * scale,
            visual.cloud_opacity,
        );
        self.atmosphere.upload(queue, scale, visual.glow_opacity);
        self.stars
            .upload(queue, Matrix4::from(globe.star_rotation()), 1.0);

        if let Some((node, position)) = &self.marker {
            let model = Matrix4::from(globe.planet_rotation())
                * scale
                * Matrix4::from_translation(*position)
                * Matrix4::from_scale(globe.pulse_scale());
            node.upload(queue, model, visual.planet_opacity);
        }
    }

    /// Issue all draw calls, backdrop first, additive shells last.
    pub fn render(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        pipelines: &Pipelines,
        camera_bind_group: &wgpu::BindGroup,
        active_map: PlanetMap,
    ) {
        render_pass.set_bind_group(0, camera_bind_group, &[]);

        render_pass.set_pipeline(&pipelines.stars);
        render_pass.set_bind_group(2, &self.stars_texture, &[]);
        self.stars.draw(render_pass);

        render_pass.set_pipeline(&pipelines.planet);
        let planet_textures = match active_map {
            PlanetMap::Day => &self.planet_day,
            PlanetMap::Night => &self.planet_night,
        };
        render_pass.set_bind_group(2, planet_textures, &[]);
        self.planet.draw(render_pass);

        if let Some((node, _)) = &self.marker {
            render_pass.set_pipeline(&pipelines.marker);
            node.draw(render_pass);
        }

        render_pass.set_pipeline(&pipelines.clouds);
        render_pass.set_bind_group(2, &self.clouds_texture, &[]);
        self.clouds.draw(render_pass);

        render_pass.set_pipeline(&pipelines.atmosphere);
        self.atmosphere.draw(render_pass);
    }

    /// Effective pick radius of the planet for pointer hit tests.
    pub fn planet_pick_radius(&self) -> f32 {
        PLANET_RADIUS * self.quality.world_scale()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;

    use super::*;

    #[test]
    fn quality_tier_follows_viewport_width() {
        assert_eq!(QualityTier::from_viewport_width(320), QualityTier::Reduced);
        assert_eq!(QualityTier::from_viewport_width(767), QualityTier::Reduced);
        assert_eq!(QualityTier::from_viewport_width(768), QualityTier::Full);
        assert_eq!(QualityTier::from_viewport_width(1920), QualityTier::Full);
    }

    #[test]
    fn reduced_tier_halves_tessellation_and_scales_down() {
        assert_eq!(QualityTier::Full.segments(), 128);
        assert_eq!(QualityTier::Reduced.segments(), 64);
        assert_eq!(QualityTier::Reduced.world_scale(), 0.7);
        assert_eq!(QualityTier::Reduced.msaa_samples(), 1);
        assert_eq!(QualityTier::Full.msaa_samples(), 4);
    }

    #[test]
    fn sphere_vertices_lie_on_the_sphere() {
        let (vertices, _) = generate_sphere(2.5, 16);
        for vertex in &vertices {
            let p = Vector3::from(vertex.position);
            assert!((p.magnitude() - 2.5).abs() < 1e-4);
            let n = Vector3::from(vertex.normal);
            assert!((n.magnitude() - 1.0).abs() < 1e-5);
            // Tangent is unit length and orthogonal to the normal.
            let t = Vector3::from(vertex.tangent);
            assert!((t.magnitude() - 1.0).abs() < 1e-5);
            assert!(n.dot(t).abs() < 1e-4);
        }
    }

    #[test]
    fn sphere_indices_stay_in_bounds_and_triangulate_fully() {
        let segments = 12u32;
        let (vertices, indices) = generate_sphere(1.0, segments);
        assert_eq!(indices.len() % 3, 0);
        let rings = segments / 2;
        assert_eq!(indices.len() as u32, rings * segments * 6);
        for index in indices {
            assert!((index as usize) < vertices.len());
        }
    }

    #[test]
    fn sphere_texture_coords_span_the_full_map() {
        let (vertices, _) = generate_sphere(1.0, 8);
        let us: Vec<f32> = vertices.iter().map(|v| v.tex_coords[0]).collect();
        let vs: Vec<f32> = vertices.iter().map(|v| v.tex_coords[1]).collect();
        assert!(us.iter().any(|u| *u == 0.0) && us.iter().any(|u| *u == 1.0));
        assert!(vs.iter().any(|v| *v == 0.0) && vs.iter().any(|v| *v == 1.0));
    }

    #[test]
    fn degenerate_segment_counts_are_clamped() {
        let (vertices, indices) = generate_sphere(1.0, 1);
        assert!(!vertices.is_empty());
        assert!(!indices.is_empty());
    }
}
