//! The GPU side of the pass chain.
//!
//! [`Renderer`] owns every wgpu resource the tour draws with. Each frame it
//! uploads scene state, then executes the pipeline's frame plan through a
//! [`GpuChain`]: the scene render step writes the first target, every later
//! step samples the previous output, and the last step writes the swapchain.
//!
//! ```text
//! Render ──▶ Bloom ──▶ AA ──▶ Film ──▶ CA ──▶ LD ──▶ [Overlay] ──▶ [Radial blur] ──▶ Screen
//!    │         │        │
//!    ▼         ▼        ▼
//! Target A ◀──▶ Target B   (ping-pong)
//! ```

mod fullscreen;
mod render_target;
mod scene_pass;
mod shaders;

pub use fullscreen::{Composite, FullscreenPass, PassUniforms};
pub use render_target::{DepthTarget, RenderTarget};
pub use scene_pass::ScenePass;

use std::collections::HashMap;

use log::debug;

use crate::assets::TextureProvider;
use crate::gpu::GpuContext;
use crate::post::{ChainRenderer, EffectKind, PassKind, PassStep, PassTarget, PostPipeline};
use crate::scene::SceneIndex;
use crate::state::ApplicationState;

const TARGET_LABELS: [&str; 2] = ["Chain Target A", "Chain Target B"];
/// Share of the frame height covered by the caption band.
const CAPTION_HEIGHT: f32 = 0.12;

/// Owns the GPU resources of the pass chain.
pub struct Renderer {
    targets: [RenderTarget; 2],
    scene_pass: ScenePass,
    passes: HashMap<PassKind, FullscreenPass>,
    caption: FullscreenPass,
}

impl Renderer {
    pub fn new(gpu: &GpuContext, state: &ApplicationState, textures: &mut TextureProvider) -> Self {
        let screen_passes = [
            (PassKind::Bloom, shaders::BLOOM),
            (PassKind::AntiAlias, shaders::ANTI_ALIAS),
            (PassKind::FilmGrain, shaders::FILM_GRAIN),
            (PassKind::ChromaticAberration, shaders::CHROMATIC_ABERRATION),
            (PassKind::LensDistortion, shaders::LENS_DISTORTION),
            (PassKind::Overlay, shaders::OVERLAY),
            (PassKind::RadialBlur, shaders::RADIAL_BLUR),
        ];
        let passes = screen_passes
            .into_iter()
            .map(|(kind, source)| {
                (kind, FullscreenPass::new(gpu, kind.label(), source, Composite::Replace))
            })
            .collect();

        Self {
            targets: TARGET_LABELS.map(|label| RenderTarget::new(gpu, label)),
            scene_pass: ScenePass::new(gpu, &state.scenes, textures),
            passes,
            caption: FullscreenPass::new(gpu, "Caption", shaders::CAPTION, Composite::Over),
        }
    }

    /// Draw one frame of `state` and present it.
    pub fn render(&mut self, gpu: &GpuContext, state: &ApplicationState) -> Result<(), wgpu::SurfaceError> {
        let now = state.now();
        self.release_disposed(&state.pipeline);
        for (target, label) in self.targets.iter_mut().zip(TARGET_LABELS) {
            target.ensure_size(gpu, label);
        }
        self.scene_pass
            .prepare(gpu, &state.scenes, &state.camera, &state.lights, now);

        let output = gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut chain = GpuChain {
                gpu,
                encoder: &mut encoder,
                screen: &view,
                targets: &self.targets,
                scene_pass: &self.scene_pass,
                passes: &self.passes,
                time: now,
                source: None,
                next: 0,
            };
            state.pipeline.render(&mut chain);
        }

        let opacity = state.label.opacity(now);
        if opacity > 0.0 {
            let tint = caption_tint(state.active());
            self.caption.render(
                gpu,
                &mut encoder,
                &view,
                &self.targets[0].view,
                now,
                [opacity, CAPTION_HEIGHT, 0.0, 0.0, tint[0], tint[1], tint[2], 0.0],
            );
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Drop the GPU resources of effect units the pipeline has disposed.
    fn release_disposed(&mut self, pipeline: &PostPipeline) {
        for unit in [pipeline.chromatic(), pipeline.lens()] {
            if unit.is_disposed() && self.passes.remove(&unit.kind().pass_kind()).is_some() {
                debug!(target: "stellar::render", "released {} pass", unit.kind().name());
            }
        }
    }
}

fn caption_tint(scene: SceneIndex) -> [f32; 3] {
    match scene {
        SceneIndex::Earth => [0.05, 0.1, 0.2],
        SceneIndex::Uranus => [0.05, 0.15, 0.18],
        SceneIndex::Galaxy => [0.12, 0.06, 0.2],
        SceneIndex::BlackHole => [0.0, 0.0, 0.0],
    }
}

/// Executes one frame plan against the GPU.
///
/// Intermediate steps alternate between the two targets; a step that
/// targets the screen writes the swapchain view.
pub struct GpuChain<'a> {
    gpu: &'a GpuContext,
    encoder: &'a mut wgpu::CommandEncoder,
    screen: &'a wgpu::TextureView,
    targets: &'a [RenderTarget; 2],
    scene_pass: &'a ScenePass,
    passes: &'a HashMap<PassKind, FullscreenPass>,
    time: f32,
    /// Target holding the latest intermediate output.
    source: Option<usize>,
    next: usize,
}

impl ChainRenderer for GpuChain<'_> {
    fn draw(&mut self, step: &PassStep) {
        let output = match step.target {
            PassTarget::Screen => self.screen,
            PassTarget::Intermediate => &self.targets[self.next].view,
        };

        match step.kind {
            PassKind::Render => self.scene_pass.draw(self.encoder, output),
            kind => {
                let Some(pass) = self.passes.get(&kind) else {
                    debug!(target: "stellar::render", "no resources for {}, skipping", kind.label());
                    return;
                };
                let Some(source) = self.source else {
                    debug!(target: "stellar::render", "{} has no input, skipping", kind.label());
                    return;
                };
                pass.render(
                    self.gpu,
                    self.encoder,
                    output,
                    &self.targets[source].view,
                    self.time,
                    step.params,
                );
            }
        }

        if step.target == PassTarget::Intermediate {
            self.source = Some(self.next);
            self.next = 1 - self.next;
        }
    }
}

impl EffectKind {
    /// The chain pass an effect unit drives.
    pub fn pass_kind(self) -> PassKind {
        match self {
            EffectKind::ChromaticAberration => PassKind::ChromaticAberration,
            EffectKind::LensDistortion => PassKind::LensDistortion,
        }
    }
}
