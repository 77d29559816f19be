//! Route-driven visual transitions.
//!
//! Every navigation event from the host maps to one of a small closed set of
//! route categories, and each category to a target visual configuration:
//! camera pose, planet/cloud opacities, atmosphere glow, active texture and
//! auto-spin. [`TransitionStateMachine::transition_to`] cancels every in-flight
//! tween on those properties and starts a fresh set toward the new target, so
//! at most one tween per property is ever alive and rapid navigation can never
//! leave two writers fighting over the same value.

use cgmath::Vector3;

use crate::animation::{Easing, Tween};

/// Which full-sphere map the planet material samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanetMap {
    Day,
    Night,
}

/// The closed set of navigation states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteCategory {
    Home,
    About,
    Work,
    Social,
}

impl RouteCategory {
    /// Categorize a normalized route by substring, first match wins.
    /// Anything unrecognized falls back to `Home`.
    pub fn from_route(route: &str) -> Self {
        if route.contains("about") {
            RouteCategory::About
        } else if route.contains("work") {
            RouteCategory::Work
        } else if route.contains("social") {
            RouteCategory::Social
        } else {
            RouteCategory::Home
        }
    }
}

/// Target visual configuration for one route category.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouteVisualConfig {
    pub camera_target: Vector3<f32>,
    pub fade_target: f32,
    pub cloud_opacity_target: f32,
    pub glow_target: f32,
    pub spin_enabled: bool,
    pub pointer_enabled: bool,
    pub active_map: PlanetMap,
    pub duration: f32,
}

/// Cloud cover while the planet body is visible.
const CLOUD_BASE_OPACITY: f32 = 0.8;
/// Glow uniform value every transition settles on.
const GLOW_SETTLED: f32 = 0.06;

impl RouteVisualConfig {
    /// Derive the target configuration for a route category.
    ///
    /// Cloud opacity is never an independent input: it is 0 whenever the
    /// planet fades out entirely and `CLOUD_BASE_OPACITY` otherwise, so clouds
    /// can never hang visible in front of a transparent planet.
    pub fn for_category(category: RouteCategory) -> Self {
        let mut config = Self {
            camera_target: Vector3::new(0.0, 0.2, 3.5),
            fade_target: 1.0,
            cloud_opacity_target: CLOUD_BASE_OPACITY,
            glow_target: GLOW_SETTLED,
            spin_enabled: true,
            pointer_enabled: true,
            active_map: PlanetMap::Day,
            duration: 1.5,
        };
        match category {
            RouteCategory::Home => {}
            RouteCategory::About => {
                // Zoom in while the planet fades out entirely.
                config.camera_target.z = 0.8;
                config.fade_target = 0.0;
                config.spin_enabled = false;
                config.duration = 1.2;
            }
            RouteCategory::Work => {
                // Night side, decorative only: the pointer passes through.
                config.active_map = PlanetMap::Night;
                config.pointer_enabled = false;
            }
            RouteCategory::Social => {
                config.camera_target.y = 1.4;
            }
        }
        config.cloud_opacity_target = if config.fade_target == 0.0 {
            0.0
        } else {
            CLOUD_BASE_OPACITY
        };
        config
    }
}

/// The continuously animated visual properties shared between the transition
/// machine and the frame step.
#[derive(Clone, Copy, Debug)]
pub struct VisualState {
    pub camera_position: Vector3<f32>,
    pub planet_opacity: f32,
    pub cloud_opacity: f32,
    pub glow_opacity: f32,
    pub spin_enabled: bool,
    pub pointer_enabled: bool,
    pub active_map: PlanetMap,
}

impl Default for VisualState {
    fn default() -> Self {
        Self {
            camera_position: Vector3::new(0.0, 0.2, 3.5),
            planet_opacity: 1.0,
            cloud_opacity: CLOUD_BASE_OPACITY,
            glow_opacity: 0.1,
            spin_enabled: true,
            pointer_enabled: true,
            active_map: PlanetMap::Day,
        }
    }
}

/// Maps route identifiers to visual configurations and drives the
/// interruptible tween set toward them.
#[derive(Debug, Default)]
pub struct TransitionStateMachine {
    active_route: Option<String>,
    camera: Option<Tween<Vector3<f32>>>,
    planet_opacity: Option<Tween<f32>>,
    cloud_opacity: Option<Tween<f32>>,
    glow_opacity: Option<Tween<f32>>,
}

impl TransitionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strip any query-string suffix before matching.
    fn normalize(route: &str) -> &str {
        route.split('?').next().unwrap_or(route)
    }

    pub fn active_route(&self) -> Option<&str> {
        self.active_route.as_deref()
    }

    /// Number of tweens currently alive across all animated properties.
    pub fn active_tween_count(&self) -> usize {
        [
            self.camera.is_some(),
            self.planet_opacity.is_some(),
            self.cloud_opacity.is_some(),
            self.glow_opacity.is_some(),
        ]
        .iter()
        .filter(|live| **live)
        .count()
    }

    /// Retarget the visuals for `route`, starting at frame-clock time `now`.
    ///
    /// Requesting the currently active route is a no-op, guarding against
    /// redundant navigation events. Otherwise every in-flight tween is
    /// replaced, the texture swap and spin/pointer flags apply instantly, and
    /// one fresh tween per property runs toward the new configuration.
    pub fn transition_to(&mut self, route: &str, now: f32, visual: &mut VisualState) {
        let normalized = Self::normalize(route);
        if self.active_route.as_deref() == Some(normalized) {
            return;
        }

        let config = RouteVisualConfig::for_category(RouteCategory::from_route(normalized));

        // Swapping the map is instantaneous: cross-fading two full-sphere
        // textures buys nothing once opacity itself is animating.
        visual.active_map = config.active_map;
        visual.spin_enabled = config.spin_enabled;
        visual.pointer_enabled = config.pointer_enabled;

        let easing = Easing::InOutCubic;
        self.camera = Some(Tween::new(
            visual.camera_position,
            config.camera_target,
            now,
            config.duration,
            easing,
        ));
        self.planet_opacity = Some(Tween::new(
            visual.planet_opacity,
            config.fade_target,
            now,
            config.duration,
            easing,
        ));
        self.cloud_opacity = Some(Tween::new(
            visual.cloud_opacity,
            config.cloud_opacity_target,
            now,
            config.duration,
            easing,
        ));
        self.glow_opacity = Some(Tween::new(
            visual.glow_opacity,
            config.glow_target,
            now,
            config.duration,
            easing,
        ));

        self.active_route = Some(normalized.to_string());
        log::debug!("transitioning to '{normalized}' over {}s", config.duration);
    }

    /// Advance every live tween to `now`, writing results into `visual` and
    /// dropping tweens that have run to completion.
    pub fn step(&mut self, now: f32, visual: &mut VisualState) {
        if let Some(tween) = &self.camera {
            visual.camera_position = tween.sample(now);
            if tween.finished(now) {
                self.camera = None;
            }
        }
        if let Some(tween) = &self.planet_opacity {
            visual.planet_opacity = tween.sample(now);
            if tween.finished(now) {
                self.planet_opacity = None;
            }
        }
        if let Some(tween) = &self.cloud_opacity {
            visual.cloud_opacity = tween.sample(now);
            if tween.finished(now) {
                self.cloud_opacity = None;
            }
        }
        if let Some(tween) = &self.glow_opacity {
            visual.glow_opacity = tween.sample(now);
            if tween.finished(now) {
                self.glow_opacity = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn about_routes_fade_out_planet_and_clouds() {
        for route in ["/about", "/about?tab=cv", "pages/about/index"] {
            let normalized = TransitionStateMachine::normalize(route);
            let config =
                RouteVisualConfig::for_category(RouteCategory::from_route(normalized));
            assert_eq!(config.fade_target, 0.0, "route {route}");
            assert_eq!(config.cloud_opacity_target, 0.0, "route {route}");
            assert!(!config.spin_enabled);
            assert_eq!(config.duration, 1.2);
        }
    }

    #[test]
    fn unknown_routes_fall_back_to_home() {
        let config = RouteVisualConfig::for_category(RouteCategory::from_route("/timeline"));
        assert_eq!(config, RouteVisualConfig::for_category(RouteCategory::Home));
    }

    #[test]
    fn work_switches_to_night_map_and_releases_pointer() {
        let config = RouteVisualConfig::for_category(RouteCategory::Work);
        assert_eq!(config.active_map, PlanetMap::Night);
        assert!(!config.pointer_enabled);
        assert_eq!(config.fade_target, 1.0);
        assert_eq!(config.cloud_opacity_target, 0.8);
    }

    #[test]
    fn social_raises_the_camera() {
        let config = RouteVisualConfig::for_category(RouteCategory::Social);
        assert_eq!(config.camera_target, Vector3::new(0.0, 1.4, 3.5));
        assert!(config.spin_enabled);
    }

    #[test]
    fn query_suffix_is_stripped_before_matching() {
        let mut machine = TransitionStateMachine::new();
        let mut visual = VisualState::default();
        machine.transition_to("/work?project=3", 0.0, &mut visual);
        assert_eq!(machine.active_route(), Some("/work"));
        assert_eq!(visual.active_map, PlanetMap::Night);
    }

    #[test]
    fn repeated_route_starts_zero_new_tweens() {
        let mut machine = TransitionStateMachine::new();
        let mut visual = VisualState::default();
        machine.transition_to("/about", 0.0, &mut visual);
        // Run the first set to completion.
        machine.step(2.0, &mut visual);
        assert_eq!(machine.active_tween_count(), 0);
        machine.transition_to("/about?utm=x", 3.0, &mut visual);
        assert_eq!(machine.active_tween_count(), 0);
    }

    #[test]
    fn rapid_retargeting_leaves_one_tween_per_property() {
        let mut machine = TransitionStateMachine::new();
        let mut visual = VisualState::default();
        machine.transition_to("/home", 0.0, &mut visual);
        machine.transition_to("/work", 0.0, &mut visual);
        machine.transition_to("/about", 0.0, &mut visual);
        assert_eq!(machine.active_tween_count(), 4);

        // Only the final (about) targets remain in play.
        machine.step(5.0, &mut visual);
        assert_eq!(visual.planet_opacity, 0.0);
        assert_eq!(visual.cloud_opacity, 0.0);
        assert!((visual.camera_position.z - 0.8).abs() < 1e-6);
        assert_eq!(machine.active_tween_count(), 0);
    }

    #[test]
    fn map_swap_is_instantaneous() {
        let mut machine = TransitionStateMachine::new();
        let mut visual = VisualState::default();
        machine.transition_to("/work", 0.0, &mut visual);
        // Before any step the map has already flipped.
        assert_eq!(visual.active_map, PlanetMap::Night);
        assert_eq!(visual.planet_opacity, 1.0);
    }

    #[test]
    fn tweens_interpolate_between_current_and_target() {
        let mut machine = TransitionStateMachine::new();
        let mut visual = VisualState::default();
        machine.transition_to("/about", 0.0, &mut visual);
        machine.step(0.6, &mut visual);
        assert!(visual.planet_opacity > 0.0 && visual.planet_opacity < 1.0);
        machine.step(1.2, &mut visual);
        assert_eq!(visual.planet_opacity, 0.0);
    }

    #[test]
    fn glow_settles_to_its_resting_value() {
        let mut machine = TransitionStateMachine::new();
        let mut visual = VisualState::default();
        assert!((visual.glow_opacity - 0.1).abs() < 1e-6);
        machine.transition_to("/home/welcome", 0.0, &mut visual);
        machine.step(2.0, &mut visual);
        assert!((visual.glow_opacity - 0.06).abs() < 1e-6);
    }
}
