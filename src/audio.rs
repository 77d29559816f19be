//! Optional audio-reactive collaborator.
//!
//! The engine samples one number per frame: the current average signal
//! intensity, normalized to 0–1. How the host produces it (frequency
//! analysis, a manual toggle) is none of the engine's business; without a
//! binding everything degrades to a constant zero.

/// A source of normalized audio intensity, sampled once per frame.
pub trait AudioReactive {
    /// Current average signal intensity in [0, 1].
    fn intensity(&self) -> f32;
}

/// The default binding: permanently silent.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silence;

impl AudioReactive for Silence {
    fn intensity(&self) -> f32 {
        0.0
    }
}
