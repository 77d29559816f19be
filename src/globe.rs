//! Per-frame choreography of the globe, independent of the GPU.
//!
//! [`GlobeState`] owns every continuously animated quantity: the transition
//! tween set, the drag rotation model, the spin and star-drift angles and the
//! audio-reactive pulse. The engine advances it once per frame and then copies
//! the results into uniforms; tests advance it with synthetic clocks.

use cgmath::{Deg, Euler, Quaternion, Rad, Rotation3};

use crate::{
    animation::exp_approach,
    interaction::InteractionController,
    transition::{TransitionStateMachine, VisualState},
};

/// Planet yaw in rad/s while auto-spin is on.
const PLANET_SPIN_RATE: f32 = 0.05;
/// Cloud yaw in rad/s while auto-spin is on.
const CLOUD_SPIN_RATE: f32 = 0.07;
/// Clouds keep creeping even in static states, so the globe never looks frozen.
const CLOUD_IDLE_RATE: f32 = 0.02;
/// Star backdrop drift in rad/s (yaw, pitch).
const STAR_DRIFT_RATE: (f32, f32) = (0.0009, 0.0003);
/// Fixed axial tilt, applied once to the tilt group and never per frame.
pub const AXIAL_TILT_DEG: f32 = 23.5;
/// Starting planet yaw, chosen so the day side faces the camera on load.
const INITIAL_PLANET_YAW: f32 = 3.0;
/// How strongly the marker pulses at full audio intensity.
const PULSE_GAIN: f32 = 0.3;
/// Fraction of the pulse offset left after one second of smoothing.
const PULSE_REMAINDER: f32 = 0.1;

/// All animated state of the planet scene.
#[derive(Debug)]
pub struct GlobeState {
    pub visual: VisualState,
    pub transitions: TransitionStateMachine,
    pub interaction: InteractionController,
    pub planet_spin: f32,
    pub cloud_spin: f32,
    pub star_drift: (f32, f32),
    audio_pulse: f32,
}

impl Default for GlobeState {
    fn default() -> Self {
        Self {
            visual: VisualState::default(),
            transitions: TransitionStateMachine::new(),
            interaction: InteractionController::new(),
            planet_spin: INITIAL_PLANET_YAW,
            cloud_spin: 0.0,
            star_drift: (0.0, 0.0),
            audio_pulse: 0.0,
        }
    }
}

impl GlobeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// One animation step: `now` is the engine's frame clock in seconds,
    /// `dt` the elapsed time since the previous frame (zero while hidden),
    /// `audio_intensity` the collaborator's normalized 0–1 signal level.
    pub fn advance(&mut self, now: f32, dt: f32, audio_intensity: f32) {
        self.transitions.step(now, &mut self.visual);

        if self.visual.spin_enabled {
            self.planet_spin += PLANET_SPIN_RATE * dt;
            self.cloud_spin += CLOUD_SPIN_RATE * dt;
        } else {
            self.cloud_spin += CLOUD_IDLE_RATE * dt;
        }
        self.star_drift.0 += STAR_DRIFT_RATE.0 * dt;
        self.star_drift.1 += STAR_DRIFT_RATE.1 * dt;

        self.interaction.step(now, dt);

        self.audio_pulse = exp_approach(
            self.audio_pulse,
            audio_intensity.clamp(0.0, 1.0),
            PULSE_REMAINDER,
            dt,
        );
    }

    /// Marker scale factor for the current audio pulse.
    pub fn pulse_scale(&self) -> f32 {
        1.0 + PULSE_GAIN * self.audio_pulse
    }

    /// Static tilt rotation, shared by everything riding the tilt group.
    pub fn tilt_rotation() -> Quaternion<f32> {
        Quaternion::from_angle_z(Deg(AXIAL_TILT_DEG))
    }

    /// User-driven rotation offset: smoothed pitch around X, yaw around Y.
    /// Composed with (not conflated with) the static tilt and the spin.
    pub fn drag_rotation(&self) -> Quaternion<f32> {
        let current = self.interaction.drag.current_rotation;
        Quaternion::from(Euler::new(Rad(current.x), Rad(current.y), Rad(0.0)))
    }

    /// Full planet rotation: tilt, then drag offset, then continuous spin.
    pub fn planet_rotation(&self) -> Quaternion<f32> {
        Self::tilt_rotation() * self.drag_rotation() * Quaternion::from_angle_y(Rad(self.planet_spin))
    }

    /// Clouds share tilt and drag but advance on their own spin angle.
    pub fn cloud_rotation(&self) -> Quaternion<f32> {
        Self::tilt_rotation() * self.drag_rotation() * Quaternion::from_angle_y(Rad(self.cloud_spin))
    }

    /// Star backdrop drift, decorative parallax only.
    pub fn star_rotation(&self) -> Quaternion<f32> {
        Quaternion::from_angle_y(Rad(self.star_drift.0))
            * Quaternion::from_angle_x(Rad(self.star_drift.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn advance_seconds(globe: &mut GlobeState, start: f32, seconds: f32, intensity: f32) -> f32 {
        let mut now = start;
        let frames = (seconds / DT).round() as u32;
        for _ in 0..frames {
            now += DT;
            globe.advance(now, DT, intensity);
        }
        now
    }

    #[test]
    fn spin_advances_only_while_enabled() {
        let mut globe = GlobeState::new();
        let start = globe.planet_spin;
        let now = advance_seconds(&mut globe, 0.0, 2.0, 0.0);
        assert!((globe.planet_spin - start - 0.05 * 2.0).abs() < 1e-3);

        globe.transitions.transition_to("/about", now, &mut globe.visual);
        let frozen = globe.planet_spin;
        let clouds_before = globe.cloud_spin;
        advance_seconds(&mut globe, now, 2.0, 0.0);
        assert_eq!(globe.planet_spin, frozen);
        // Clouds keep creeping at the idle rate.
        assert!((globe.cloud_spin - clouds_before - 0.02 * 2.0).abs() < 1e-3);
    }

    #[test]
    fn hidden_page_contributes_no_motion() {
        let mut globe = GlobeState::new();
        let spin = globe.planet_spin;
        // dt = 0 models frames skipped while the page is hidden.
        globe.advance(5.0, 0.0, 0.0);
        assert_eq!(globe.planet_spin, spin);
        assert_eq!(globe.star_drift, (0.0, 0.0));
    }

    #[test]
    fn star_drift_is_independent_of_spin_state() {
        let mut globe = GlobeState::new();
        let now = advance_seconds(&mut globe, 0.0, 1.0, 0.0);
        let after_spin = globe.star_drift;
        globe.transitions.transition_to("/about", now, &mut globe.visual);
        advance_seconds(&mut globe, now, 1.0, 0.0);
        assert!(globe.star_drift.0 > after_spin.0);
        assert!(globe.star_drift.1 > after_spin.1);
    }

    #[test]
    fn audio_pulse_tracks_intensity_and_decays_to_silence() {
        let mut globe = GlobeState::new();
        assert_eq!(globe.pulse_scale(), 1.0);
        let now = advance_seconds(&mut globe, 0.0, 3.0, 1.0);
        assert!(globe.pulse_scale() > 1.25);
        advance_seconds(&mut globe, now, 5.0, 0.0);
        assert!(globe.pulse_scale() < 1.01);
    }

    #[test]
    fn night_texture_failure_path_still_transitions() {
        // Scene construction never depends on individual texture success, so
        // the work transition must behave identically with a placeholder map.
        let mut globe = GlobeState::new();
        globe.transitions.transition_to("/work", 0.0, &mut globe.visual);
        advance_seconds(&mut globe, 0.0, 2.0, 0.0);
        assert_eq!(globe.visual.planet_opacity, 1.0);
    }

    #[test]
    fn tilt_is_constant_across_frames() {
        let mut globe = GlobeState::new();
        let tilt = GlobeState::tilt_rotation();
        advance_seconds(&mut globe, 0.0, 1.0, 0.0);
        assert_eq!(GlobeState::tilt_rotation(), tilt);
    }
}
