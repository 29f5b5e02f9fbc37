//! # Stellar
//!
//! **An interactive tour through four scenes of space: Earth, Uranus, a spiral
//! galaxy and a black hole.**
//!
//! Each scene is a themed set of bodies and particle fields. Moving between
//! them is a choreographed transition: the camera flies a waypoint path, the
//! outgoing scene slides away while the incoming one arrives, the light rig
//! and the post-processing chain sweep to the destination's look, and a
//! short boost of bloom, chromatic aberration and lens distortion punctuates
//! the move.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> Result<(), stellar::RunError> {
//!     stellar::run(stellar::TourConfig::new().title("Night Sky").auto_advance(true))
//! }
//! ```
//!
//! ## Layout
//!
//! - [`tween`]: time-driven tweens, pulses and timers. Everything animated is
//!   a pure function of the frame clock.
//! - [`scene`]: the four scenes and the contract they share.
//! - [`transition`]: the orchestrator that owns camera, lights and pipeline
//!   while a transition runs.
//! - [`post`]: the post-processing chain as data.
//! - [`render`]: the wgpu side, which draws what the rest of the crate describes.
//! - [`state`]: [`ApplicationState`], the single owner of everything above.
//!
//! Only [`render`], [`gpu`], [`texture`] and [`app`] touch the GPU or the
//! window; the rest is driven by simulated time in tests.

pub mod app;
pub mod assets;
pub mod audio;
pub mod camera;
pub mod config;
pub mod gpu;
pub mod input;
pub mod label;
pub mod lights;
pub mod post;
pub mod quality;
pub mod render;
pub mod scene;
pub mod state;
pub mod texture;
pub mod transition;
pub mod tween;

pub use app::{RunError, run};
pub use assets::{AssetError, ImageData, TextureProvider};
pub use audio::{AudioCue, CueSpec, LogAudio};
pub use camera::{Camera, CameraPath};
pub use config::TourConfig;
pub use gpu::{GpuContext, GpuError};
pub use input::{Command, Input};
pub use label::SceneLabel;
pub use lights::{LightLevels, LightRig};
pub use post::{PassKind, PostPipeline};
pub use quality::{QualityAdapter, QualityTier};
pub use scene::{Scene, SceneIndex, SceneSet};
pub use state::ApplicationState;
pub use transition::{TransitionCharacter, TransitionOrchestrator, TransitionStart, TransitionState};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
