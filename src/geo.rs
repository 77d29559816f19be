//! Geographic coordinate helpers for placing markers on the planet surface.

use cgmath::Vector3;

/// Convert a latitude/longitude pair (degrees) to a position on a sphere of
/// the given radius, in the planet's un-spun model space.
pub fn lat_lng_to_vector3(lat: f32, lng: f32, radius: f32) -> Vector3<f32> {
    let phi = (90.0 - lat).to_radians();
    let theta = (lng + 180.0).to_radians();

    Vector3::new(
        -radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;

    use super::*;

    #[test]
    fn poles_map_to_the_y_axis() {
        let north = lat_lng_to_vector3(90.0, 0.0, 1.0);
        assert!(north.x.abs() < 1e-6 && north.z.abs() < 1e-6);
        assert!((north.y - 1.0).abs() < 1e-6);

        let south = lat_lng_to_vector3(-90.0, 45.0, 2.0);
        assert!((south.y + 2.0).abs() < 1e-6);
    }

    #[test]
    fn result_always_lies_on_the_sphere() {
        for (lat, lng) in [(0.0, 0.0), (48.1, 11.6), (-33.9, 151.2), (51.5, -0.1)] {
            let p = lat_lng_to_vector3(lat, lng, 1.01);
            assert!((p.magnitude() - 1.01).abs() < 1e-5, "({lat}, {lng})");
        }
    }
}
