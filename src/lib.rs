//! terraview
//!
//! An interactive 3D planet visualization for native and WASM embedding. The
//! crate renders a textured, tilted, slowly spinning planet with cloud,
//! atmosphere and star layers, and choreographs it against host navigation:
//! each route retargets camera position, layer opacities and the active
//! surface map through interruptible tweens. Pointer dragging rotates the
//! planet with clamped pitch and eases back to rest on release.
//!
//! High-level modules
//! - `animation`: tweens, easing curves and framerate-independent smoothing
//! - `audio`: the optional audio-intensity collaborator
//! - `camera`: camera, projection and pointer ray casting
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `engine`: the facade, event loop and host control surface
//! - `geo`: latitude/longitude to sphere-surface conversion
//! - `globe`: GPU-free per-frame choreography of all animated state
//! - `interaction`: pointer drag, clamping, settle and smoothing
//! - `pipelines`: one render pipeline per mesh role, plus their shaders
//! - `resources`: texture fetching, decoding and placeholder fallback
//! - `scene`: sphere meshes, scene graph and per-node uniforms
//! - `transition`: route categorization and the transition state machine
//!

pub mod animation;
pub mod audio;
pub mod camera;
pub mod context;
pub mod engine;
pub mod geo;
pub mod globe;
pub mod interaction;
pub mod pipelines;
pub mod resources;
pub mod scene;
pub mod transition;

// Re-exports commonly used types for convenience in downstream code.
pub use engine::{EngineConfig, EngineHandle, run};
pub use globe::GlobeState;
pub use scene::{MarkerConfig, QualityTier};
pub use transition::{PlanetMap, RouteCategory};
