//! Screen-space post-processing.
//!
//! [`PostPipeline`] owns the logical state of the chain: per-scene presets,
//! transition boosts, effect units and transient overlay passes. It produces
//! a frame plan, a list of [`PassStep`]s, which a [`ChainRenderer`] executes.
//! The GPU implementation lives in [`crate::render`].

mod chain;
mod effect_unit;
mod pipeline;
mod presets;

pub use chain::{ChainRenderer, PassKind, PassStep, PassTarget, TransientPass};
pub use effect_unit::{EffectKind, EffectUnit};
pub use pipeline::{FilmState, PostPipeline};
pub use presets::{
    BloomSettings, BoostProfile, EffectSetting, FilmSettings, OverlayProfile, ScenePreset,
};
