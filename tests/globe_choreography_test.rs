//! End-to-end choreography scenarios driven through the public API, using a
//! synthetic frame clock instead of a GPU surface.

use cgmath::{InnerSpace, Vector2, Vector3};
use terraview::{
    GlobeState, PlanetMap,
    interaction::PITCH_LIMIT,
    transition::VisualState,
};

const DT: f32 = 1.0 / 60.0;

/// Advance the globe frame by frame, returning the clock after `seconds`.
fn run_frames(globe: &mut GlobeState, start: f32, seconds: f32) -> f32 {
    let mut now = start;
    let frames = (seconds / DT).round() as u32;
    for _ in 0..frames {
        now += DT;
        globe.advance(now, DT, 0.0);
    }
    now
}

#[test]
fn rapid_navigation_settles_on_the_last_route() {
    let mut globe = GlobeState::new();
    globe.transitions.transition_to("/home", 0.0, &mut globe.visual);
    let now = run_frames(&mut globe, 0.0, 0.2);
    globe.transitions.transition_to("/work", now, &mut globe.visual);
    let now = run_frames(&mut globe, now, 0.1);
    globe.transitions.transition_to("/about", now, &mut globe.visual);
    run_frames(&mut globe, now, 3.0);

    assert_eq!(globe.transitions.active_route(), Some("/about"));
    assert_eq!(globe.visual.planet_opacity, 0.0);
    assert_eq!(globe.visual.cloud_opacity, 0.0);
    assert!((globe.visual.camera_position.z - 0.8).abs() < 1e-5);
    assert!(!globe.visual.spin_enabled);
    // The work route's map swap happened instantly and was then superseded.
    assert_eq!(globe.visual.active_map, PlanetMap::Day);
}

#[test]
fn drag_release_returns_the_planet_to_rest() {
    let mut globe = GlobeState::new();
    let started = globe.interaction.pointer_down(
        Vector2::new(400.0, 300.0),
        &globe.visual,
        true,
        false,
    );
    assert!(started);

    let mut now = 0.0;
    for frame in 1..=30 {
        now = frame as f32 * DT;
        globe.interaction.pointer_move(
            Vector2::new(400.0 + frame as f32 * 8.0, 300.0 + frame as f32 * 4.0),
            &globe.visual,
            true,
        );
        globe.advance(now, DT, 0.0);
    }
    let dragged = globe.interaction.drag.current_rotation;
    assert!(dragged.magnitude() > 0.05);

    globe.interaction.pointer_up(now);
    run_frames(&mut globe, now, 5.0);
    assert!(globe.interaction.drag.current_rotation.magnitude() < 1e-2);
    assert!(globe.interaction.drag.target_rotation.magnitude() < 1e-4);
}

#[test]
fn pitch_never_exceeds_its_clamp_under_extreme_input() {
    let mut globe = GlobeState::new();
    globe.interaction.pointer_down(
        Vector2::new(0.0, 0.0),
        &globe.visual,
        true,
        false,
    );
    // Two hundred thousand pixels of downward drag.
    for i in 0..200 {
        globe.interaction.pointer_move(
            Vector2::new(0.0, (i + 1) as f32 * 1000.0),
            &globe.visual,
            true,
        );
    }
    run_frames(&mut globe, 0.0, 3.0);
    assert!(globe.interaction.drag.current_rotation.x <= PITCH_LIMIT + 1e-4);
}

#[test]
fn work_route_rejects_new_grabs() {
    let mut globe = GlobeState::new();
    globe.transitions.transition_to("/work/projects", 0.0, &mut globe.visual);
    assert!(!globe.visual.pointer_enabled);
    let started = globe.interaction.pointer_down(
        Vector2::new(400.0, 300.0),
        &globe.visual,
        true,
        false,
    );
    assert!(!started);
}

#[test]
fn faded_planet_rejects_new_grabs() {
    let mut globe = GlobeState::new();
    globe.transitions.transition_to("/about", 0.0, &mut globe.visual);
    run_frames(&mut globe, 0.0, 2.0);
    assert!(globe.visual.planet_opacity < 0.1);
    assert!(!globe.interaction.pointer_down(
        Vector2::new(400.0, 300.0),
        &globe.visual,
        true,
        false,
    ));
}

#[test]
fn occlusion_freezes_the_clock_without_corrupting_tweens() {
    let mut globe = GlobeState::new();
    globe.transitions.transition_to("/social", 0.0, &mut globe.visual);
    let now = run_frames(&mut globe, 0.0, 0.5);
    let mid = globe.visual.camera_position;

    // Occluded frames pass a zero dt and the same clock.
    for _ in 0..300 {
        globe.advance(now, 0.0, 0.0);
    }
    assert_eq!(globe.visual.camera_position, mid);

    // Resuming finishes the transition on the same clock timeline.
    run_frames(&mut globe, now, 2.0);
    assert!((globe.visual.camera_position.y - 1.4).abs() < 1e-5);
}

#[test]
fn returning_home_restores_the_default_composition() {
    let mut globe = GlobeState::new();
    globe.transitions.transition_to("/about", 0.0, &mut globe.visual);
    let now = run_frames(&mut globe, 0.0, 2.0);
    globe.transitions.transition_to("/", now, &mut globe.visual);
    run_frames(&mut globe, now, 3.0);

    let home = VisualState::default();
    assert_eq!(globe.visual.planet_opacity, home.planet_opacity);
    assert_eq!(globe.visual.cloud_opacity, home.cloud_opacity);
    let delta = globe.visual.camera_position - Vector3::new(0.0, 0.2, 3.5);
    assert!(delta.magnitude() < 1e-5);
    assert!(globe.visual.spin_enabled);
    assert!(globe.visual.pointer_enabled);
}
