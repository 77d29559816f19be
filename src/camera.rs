//! Camera, projection and pointer ray casting.
//!
//! The camera always looks at the planet's center; route transitions only
//! move its position. Ray casting converts a pointer position into a world
//! ray for hit-testing the planet sphere.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3, Vector4};
use wgpu::util::DeviceExt;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P) -> Self {
        Self {
            position: position.into(),
            target: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::unit_y(),
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    /// Cast a world-space ray from a pointer position in surface pixels.
    pub fn cast_ray_from_pointer(
        &self,
        pointer: (f32, f32),
        width: f32,
        height: f32,
        projection: &Projection,
    ) -> Ray {
        let ndc_x = 2.0 * pointer.0 / width - 1.0;
        let ndc_y = 1.0 - 2.0 * pointer.1 / height;

        let view_proj = projection.matrix() * self.view_matrix();
        let inverse = view_proj
            .invert()
            .unwrap_or_else(Matrix4::identity);

        let near = inverse * Vector4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far = inverse * Vector4::new(ndc_x, ndc_y, 1.0, 1.0);
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;

        Ray {
            origin: Point3::from_vec(near),
            direction: (far - near).normalize(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy: impl Into<Rad<f32>>, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// A world-space ray for pointer hit-testing.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Nearest intersection with a sphere of `radius` centered at the origin.
    pub fn intersect_sphere(&self, radius: f32) -> Option<Point3<f32>> {
        let oc = self.origin.to_vec();
        let b = oc.dot(self.direction);
        let c = oc.dot(oc) - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let t = -b - discriminant.sqrt();
        // The sphere may surround the camera (star backdrop); take the far
        // hit then, but never one behind the ray.
        let t = if t >= 0.0 { t } else { -b + discriminant.sqrt() };
        (t >= 0.0).then(|| self.origin + self.direction * t)
    }
}

/// Camera data as laid out for the shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    view_pos: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            view_pos: [0.0; 4],
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_proj = (projection.matrix() * camera.view_matrix()).into();
        self.view_pos = camera.position.to_homogeneous().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera GPU resources bundled the way the render pass consumes them.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: Camera, projection: &Projection) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout =
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
                label: Some("camera_bind_group_layout"),
            });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Refresh the uniform from the camera and push it to the GPU.
    pub fn upload(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Deg;

    use super::*;

    fn home_camera() -> (Camera, Projection) {
        (
            Camera::new((0.0, 0.2, 3.5)),
            Projection::new(1280, 720, Deg(45.0), 0.1, 2000.0),
        )
    }

    #[test]
    fn center_ray_hits_the_planet() {
        let (camera, projection) = home_camera();
        let ray = camera.cast_ray_from_pointer((640.0, 360.0), 1280.0, 720.0, &projection);
        let hit = ray.intersect_sphere(1.0).expect("should hit");
        assert!((hit.to_vec().magnitude() - 1.0).abs() < 1e-3);
        // The hit is on the camera-facing side.
        assert!(hit.z > 0.0);
    }

    #[test]
    fn corner_ray_misses_the_planet() {
        let (camera, projection) = home_camera();
        let ray = camera.cast_ray_from_pointer((5.0, 5.0), 1280.0, 720.0, &projection);
        assert!(ray.intersect_sphere(1.0).is_none());
    }

    #[test]
    fn ray_from_inside_hits_the_backdrop_sphere() {
        let (camera, projection) = home_camera();
        let ray = camera.cast_ray_from_pointer((640.0, 360.0), 1280.0, 720.0, &projection);
        assert!(ray.intersect_sphere(90.0).is_some());
    }

    #[test]
    fn projection_resize_updates_aspect() {
        let (_, mut projection) = home_camera();
        projection.resize(500, 1000);
        assert!((projection.aspect - 0.5).abs() < 1e-6);
    }
}
