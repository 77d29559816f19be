//! Pointer interaction with the planet.
//!
//! A drag writes `target_rotation`; the frame step smooths `current_rotation`
//! toward it. Nothing else ever touches `current_rotation`, so interaction,
//! the settle tween and the render path can never disagree about who owns the
//! displayed orientation. Releasing the pointer starts a tween that eases
//! `target_rotation` back to the canonical orientation instead of leaving the
//! planet wherever the user dropped it.

use cgmath::Vector2;

use crate::{
    animation::{Easing, Tween, exp_approach},
    transition::VisualState,
};

/// Radians of rotation per pixel of pointer travel.
const DRAG_SENSITIVITY: f32 = 0.005;
/// Pitch stays inside ±π/2.5 so a drag can never flip over the poles.
pub const PITCH_LIMIT: f32 = std::f32::consts::PI / 2.5;
/// Seconds for the ease-out back to the rest orientation.
const SETTLE_DURATION: f32 = 1.0;
/// Fraction of the rotation offset still left after one second of smoothing.
const SMOOTHING_REMAINDER: f32 = 0.05;
/// Below this planet opacity the globe is treated as invisible and undraggable.
const VISIBILITY_THRESHOLD: f32 = 0.1;

/// What the cursor over the surface should look like.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorAffordance {
    Default,
    Grab,
    Grabbing,
}

/// Live drag bookkeeping. `(x, y)` of rotations is `(pitch, yaw)`.
#[derive(Clone, Copy, Debug)]
pub struct DragState {
    pub active: bool,
    pub last_pointer: Vector2<f32>,
    pub target_rotation: Vector2<f32>,
    pub current_rotation: Vector2<f32>,
}

impl Default for DragState {
    fn default() -> Self {
        Self {
            active: false,
            last_pointer: Vector2::new(0.0, 0.0),
            target_rotation: Vector2::new(0.0, 0.0),
            current_rotation: Vector2::new(0.0, 0.0),
        }
    }
}

/// Owns drag state and the settle tween; fed by the engine's event handling.
#[derive(Debug, Default)]
pub struct InteractionController {
    pub drag: DragState,
    settle: Option<Tween<Vector2<f32>>>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a pointer press at this moment may begin a drag.
    ///
    /// Refused while the route has released the pointer (Work), while the
    /// planet has faded below visibility, when the press landed on host UI
    /// layered over the surface, or when the ray misses the planet.
    pub fn can_grab(&self, visual: &VisualState, hit_planet: bool, over_ui: bool) -> bool {
        visual.pointer_enabled
            && visual.planet_opacity >= VISIBILITY_THRESHOLD
            && !over_ui
            && hit_planet
    }

    /// Begin a drag at pointer position `pos` (surface pixels).
    ///
    /// Returns true when the drag actually started. A running settle tween is
    /// cancelled so it cannot keep writing `target_rotation` underneath the
    /// user's hand.
    pub fn pointer_down(
        &mut self,
        pos: Vector2<f32>,
        visual: &VisualState,
        hit_planet: bool,
        over_ui: bool,
    ) -> bool {
        if !self.can_grab(visual, hit_planet, over_ui) {
            return false;
        }
        self.settle = None;
        self.drag.active = true;
        self.drag.last_pointer = pos;
        true
    }

    /// Pointer movement while dragging accumulates into `target_rotation`.
    /// Movement while not dragging only reports the hover affordance.
    pub fn pointer_move(
        &mut self,
        pos: Vector2<f32>,
        visual: &VisualState,
        hit_planet: bool,
    ) -> CursorAffordance {
        if self.drag.active {
            let delta = pos - self.drag.last_pointer;
            self.drag.last_pointer = pos;
            self.accumulate(delta.x, delta.y);
            CursorAffordance::Grabbing
        } else if self.can_grab(visual, hit_planet, false) {
            CursorAffordance::Grab
        } else {
            CursorAffordance::Default
        }
    }

    /// End the drag and ease `target_rotation` back to the origin.
    pub fn pointer_up(&mut self, now: f32) {
        if !self.drag.active {
            return;
        }
        self.drag.active = false;
        self.settle = Some(Tween::new(
            self.drag.target_rotation,
            Vector2::new(0.0, 0.0),
            now,
            SETTLE_DURATION,
            Easing::OutCubic,
        ));
    }

    /// Host-driven rotation nudge, sharing the drag accumulation and clamp.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.accumulate(dx, dy);
    }

    fn accumulate(&mut self, dx: f32, dy: f32) {
        self.drag.target_rotation.y += dx * DRAG_SENSITIVITY;
        self.drag.target_rotation.x =
            (self.drag.target_rotation.x + dy * DRAG_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn settling(&self) -> bool {
        self.settle.is_some()
    }

    /// Per-frame advance: run the settle tween if one is live, then smooth
    /// `current_rotation` toward `target_rotation`.
    pub fn step(&mut self, now: f32, dt: f32) {
        if let Some(tween) = &self.settle {
            self.drag.target_rotation = tween.sample(now);
            if tween.finished(now) {
                self.settle = None;
            }
        }
        self.drag.current_rotation.x = exp_approach(
            self.drag.current_rotation.x,
            self.drag.target_rotation.x,
            SMOOTHING_REMAINDER,
            dt,
        );
        self.drag.current_rotation.y = exp_approach(
            self.drag.current_rotation.y,
            self.drag.target_rotation.y,
            SMOOTHING_REMAINDER,
            dt,
        );
    }
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;

    use super::*;

    fn start_drag(controller: &mut InteractionController, visual: &VisualState) {
        assert!(controller.pointer_down(Vector2::new(100.0, 100.0), visual, true, false));
    }

    #[test]
    fn pitch_never_exceeds_the_clamp() {
        let visual = VisualState::default();
        let mut controller = InteractionController::new();
        start_drag(&mut controller, &visual);
        let mut pos = Vector2::new(100.0, 100.0);
        for _ in 0..10_000 {
            pos.y += 37.0;
            controller.pointer_move(pos, &visual, true);
        }
        assert!(controller.drag.target_rotation.x <= PITCH_LIMIT + 1e-6);
        for _ in 0..20_000 {
            pos.y -= 53.0;
            controller.pointer_move(pos, &visual, true);
        }
        assert!(controller.drag.target_rotation.x >= -PITCH_LIMIT - 1e-6);
    }

    #[test]
    fn faded_planet_is_not_draggable() {
        let mut visual = VisualState::default();
        visual.planet_opacity = 0.05;
        let mut controller = InteractionController::new();
        assert!(!controller.pointer_down(Vector2::new(0.0, 0.0), &visual, true, false));
        assert!(!controller.drag.active);
    }

    #[test]
    fn pointer_released_route_is_not_draggable() {
        let mut visual = VisualState::default();
        visual.pointer_enabled = false;
        let mut controller = InteractionController::new();
        assert!(!controller.pointer_down(Vector2::new(0.0, 0.0), &visual, true, false));
    }

    #[test]
    fn press_on_overlaid_ui_never_starts_a_drag() {
        let visual = VisualState::default();
        let mut controller = InteractionController::new();
        // Planet directly behind the button: the hit test succeeds but the
        // press still belongs to the UI.
        assert!(!controller.pointer_down(Vector2::new(0.0, 0.0), &visual, true, true));
        assert!(!controller.drag.active);
    }

    #[test]
    fn miss_does_not_start_a_drag_but_hover_reports_affordance() {
        let visual = VisualState::default();
        let mut controller = InteractionController::new();
        assert!(!controller.pointer_down(Vector2::new(0.0, 0.0), &visual, false, false));
        assert_eq!(
            controller.pointer_move(Vector2::new(1.0, 1.0), &visual, true),
            CursorAffordance::Grab
        );
        assert_eq!(
            controller.pointer_move(Vector2::new(2.0, 2.0), &visual, false),
            CursorAffordance::Default
        );
        assert_eq!(controller.drag.target_rotation, Vector2::new(0.0, 0.0));
    }

    #[test]
    fn release_settles_target_back_to_origin() {
        let visual = VisualState::default();
        let mut controller = InteractionController::new();
        start_drag(&mut controller, &visual);
        controller.pointer_move(Vector2::new(180.0, 160.0), &visual, true);
        controller.pointer_up(0.0);
        assert!(controller.settling());

        let dt = 1.0 / 60.0;
        let mut now = 0.0;
        let mut previous = controller.drag.target_rotation.magnitude();
        for _ in 0..120 {
            now += dt;
            controller.step(now, dt);
            let magnitude = controller.drag.target_rotation.magnitude();
            assert!(magnitude <= previous + 1e-6);
            previous = magnitude;
        }
        assert!(controller.drag.target_rotation.magnitude() < 1e-4);
        assert!(!controller.settling());
    }

    #[test]
    fn smoothing_converges_at_equal_wall_clock_speed_for_any_frame_rate() {
        let run = |fps: u32| {
            let visual = VisualState::default();
            let mut controller = InteractionController::new();
            start_drag(&mut controller, &visual);
            controller.pointer_move(Vector2::new(300.0, 200.0), &visual, true);
            controller.pointer_up(0.0);
            let dt = 1.0 / fps as f32;
            let mut now = 0.0;
            let mut frames = 0u32;
            // Converged: current within epsilon of target and target at rest.
            while frames < fps * 30 {
                now += dt;
                controller.step(now, dt);
                frames += 1;
                let gap = (controller.drag.current_rotation
                    - controller.drag.target_rotation)
                    .magnitude();
                if gap < 1e-3 && controller.drag.target_rotation.magnitude() < 1e-3 {
                    break;
                }
            }
            frames as f32 * dt
        };
        let slow = run(30);
        let fast = run(120);
        assert!((slow - fast).abs() < 0.25, "30fps {slow}s vs 120fps {fast}s");
    }

    #[test]
    fn grab_cancels_a_running_settle() {
        let visual = VisualState::default();
        let mut controller = InteractionController::new();
        start_drag(&mut controller, &visual);
        controller.pointer_move(Vector2::new(150.0, 150.0), &visual, true);
        controller.pointer_up(0.0);
        assert!(controller.settling());
        start_drag(&mut controller, &visual);
        assert!(!controller.settling());
    }

    #[test]
    fn programmatic_rotate_shares_the_drag_clamp() {
        let mut controller = InteractionController::new();
        controller.rotate(40.0, 1e6);
        assert!(controller.drag.target_rotation.x <= PITCH_LIMIT + 1e-6);
        assert!((controller.drag.target_rotation.y - 40.0 * 0.005).abs() < 1e-6);
    }
}
