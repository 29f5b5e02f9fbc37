//! The pass chain as data: what runs this frame, in what order, into which target.

use crate::tween::Pulse;

/// Every stage the post-processing chain knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    Render,
    Bloom,
    AntiAlias,
    FilmGrain,
    ChromaticAberration,
    LensDistortion,
    /// Transient full-screen colour overlay.
    Overlay,
    /// Transient radial blur.
    RadialBlur,
}

impl PassKind {
    /// The standard chain in its fixed execution order.
    pub const STANDARD: [PassKind; 6] = [
        PassKind::Render,
        PassKind::Bloom,
        PassKind::AntiAlias,
        PassKind::FilmGrain,
        PassKind::ChromaticAberration,
        PassKind::LensDistortion,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PassKind::Render => "Scene Render",
            PassKind::Bloom => "Bloom",
            PassKind::AntiAlias => "Anti-alias",
            PassKind::FilmGrain => "Film Grain",
            PassKind::ChromaticAberration => "Chromatic Aberration",
            PassKind::LensDistortion => "Lens Distortion",
            PassKind::Overlay => "Transition Overlay",
            PassKind::RadialBlur => "Radial Blur",
        }
    }
}

/// Where a pass writes its output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassTarget {
    /// An off-screen buffer read by the next pass.
    Intermediate,
    /// The visible framebuffer. Only ever the last pass of a frame.
    Screen,
}

/// One pass of one frame, with the uniforms it should run with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassStep {
    pub kind: PassKind,
    /// Pass-specific parameters, laid out the way the pass shader expects.
    pub params: [f32; 8],
    pub target: PassTarget,
}

/// Executes a frame plan. Implemented by the GPU chain and by test recorders.
pub trait ChainRenderer {
    fn draw(&mut self, step: &PassStep);
}

/// A pass appended for the duration of a transition.
///
/// Its strength follows `envelope`; once the envelope has ended the pass is
/// removed from the chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransientPass {
    pub kind: PassKind,
    pub envelope: Pulse,
    pub color: [f32; 3],
}

impl TransientPass {
    pub fn overlay(color: [f32; 3], envelope: Pulse) -> Self {
        Self {
            kind: PassKind::Overlay,
            envelope,
            color,
        }
    }

    pub fn radial_blur(envelope: Pulse) -> Self {
        Self {
            kind: PassKind::RadialBlur,
            envelope,
            color: [0.0; 3],
        }
    }

    pub fn is_finished(&self, now: f32) -> bool {
        self.envelope.is_finished(now)
    }

    pub fn params(&self, now: f32) -> [f32; 8] {
        let strength = self.envelope.value_at(now);
        match self.kind {
            PassKind::RadialBlur => [strength, 0.5, 0.5, 12.0, 0.0, 0.0, 0.0, 0.0],
            _ => [self.color[0], self.color[1], self.color[2], strength, 0.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Records every step it is asked to draw.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingRenderer {
    pub steps: Vec<PassStep>,
}

#[cfg(test)]
impl RecordingRenderer {
    pub fn kinds(&self) -> Vec<PassKind> {
        self.steps.iter().map(|s| s.kind).collect()
    }
}

#[cfg(test)]
impl ChainRenderer for RecordingRenderer {
    fn draw(&mut self, step: &PassStep) {
        self.steps.push(*step);
    }
}
