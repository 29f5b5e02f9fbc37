use glam::Vec3;
use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{RejectReason, TransitionCharacter, TransitionStart, TransitionState};
use crate::audio::AudioCue;
use crate::camera::{Camera, CameraPath};
use crate::label::SceneLabel;
use crate::lights::{LightLevels, LightRig};
use crate::post::PostPipeline;
use crate::scene::{SceneIndex, TransformGroup};
use crate::tween::{Easing, Tween};

/// Timing and distances of a transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionConfig {
    /// Nominal length of a transition in seconds. The terminal flip happens
    /// on the first update at or after this budget.
    pub duration: f32,
    /// How far along z the groups travel. Raised to the combined scene
    /// bounds when those reach further.
    pub depth_offset: f32,
    /// Rotation perturbation of the outgoing group and initial rotation of the
    /// incoming one, in radians.
    pub rotation_offset: f32,
    /// Share of the duration the light rig takes to settle.
    pub light_fraction: f32,
    /// Peak camera displacement of the black-hole shake.
    pub shake_amplitude: f32,
    pub shake_duration: f32,
    /// Fade-in time of the scene label.
    pub label_fade: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration: 3.0,
            depth_offset: 20.0,
            rotation_offset: 0.6,
            light_fraction: 0.7,
            shake_amplitude: 0.25,
            shake_duration: 1.0,
            label_fade: 0.8,
        }
    }
}

/// Everything a transition drives, borrowed for one call.
///
/// The groups are optional so a caller that cannot resolve a scene still gets
/// a clean rejection instead of a panic.
pub struct TransitionTargets<'a> {
    pub from_group: Option<&'a mut TransformGroup>,
    pub to_group: Option<&'a mut TransformGroup>,
    pub camera: &'a mut Camera,
    pub lights: &'a mut LightRig,
    pub pipeline: &'a mut PostPipeline,
    pub label: &'a mut SceneLabel,
    pub audio: &'a mut dyn AudioCue,
    /// Combined bounding reach of both scenes; groups travel at least this far.
    pub clearance: f32,
}

/// Result of advancing the orchestrator by one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransitionUpdate {
    Idle,
    Running { progress: f32 },
    Completed { from: SceneIndex, to: SceneIndex },
}

#[derive(Clone, Copy, Debug)]
struct Shake {
    start: f32,
    duration: f32,
    amplitude: f32,
}

impl Shake {
    /// Decaying random offset; zero outside the shake window.
    fn offset(&self, now: f32, rng: &mut StdRng) -> Vec3 {
        let age = now - self.start;
        if age < 0.0 || age >= self.duration {
            return Vec3::ZERO;
        }
        let falloff = 1.0 - age / self.duration;
        let jitter = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        jitter * self.amplitude * falloff * falloff
    }
}

type OnComplete = Box<dyn FnOnce(SceneIndex)>;

struct ActiveTransition {
    from: SceneIndex,
    to: SceneIndex,
    start: f32,
    duration: f32,
    from_position: Tween<Vec3>,
    from_rotation: Tween<Vec3>,
    to_position: Tween<Vec3>,
    to_rotation: Tween<Vec3>,
    camera_start: Vec3,
    camera_path: CameraPath,
    lights: [Tween<f32>; 4],
    shake: Option<Shake>,
    on_complete: Option<OnComplete>,
}

impl ActiveTransition {
    fn end(&self) -> f32 {
        self.start + self.duration
    }
}

/// Runs the animated hand-off between two scenes.
///
/// All sub-animations start together and are evaluated from the same clock;
/// none of them gates completion. Completion is a fixed budget: the first
/// [`TransitionOrchestrator::update`] at or after `start + duration` snaps
/// every animated value to its end state, hides the outgoing group, flips the
/// active scene and clears the transition flag.
pub struct TransitionOrchestrator {
    config: TransitionConfig,
    rng: StdRng,
    active: Option<ActiveTransition>,
}

impl TransitionOrchestrator {
    pub fn new(config: TransitionConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            active: None,
        }
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// `(from, to)` of the transition in flight.
    pub fn endpoints(&self) -> Option<(SceneIndex, SceneIndex)> {
        self.active.as_ref().map(|a| (a.from, a.to))
    }

    /// Start a transition from `from` to `to` at time `now`.
    ///
    /// Dropped silently when one is already in flight. Rejected, before
    /// anything is mutated, when the endpoints are the same scene or either
    /// group is missing or not finite.
    pub fn begin_transition(
        &mut self,
        state: &mut TransitionState,
        from: SceneIndex,
        to: SceneIndex,
        now: f32,
        targets: TransitionTargets<'_>,
        on_complete: Option<OnComplete>,
    ) -> TransitionStart {
        if state.transitioning || self.active.is_some() {
            debug!(target: "stellar::transition", "{from} -> {to} dropped, transition in flight");
            return TransitionStart::Busy;
        }

        let TransitionTargets {
            from_group,
            to_group,
            camera,
            lights,
            pipeline,
            label,
            audio,
            clearance,
        } = targets;

        let checked = if from == to {
            Err(RejectReason::SameScene(to))
        } else {
            check_group(from, from_group).and_then(|f| check_group(to, to_group).map(|t| (f, t)))
        };
        let (from_group, to_group) = match checked {
            Ok(groups) => groups,
            Err(reason) => {
                error!(target: "stellar::transition", "{from} -> {to} rejected: {reason}");
                return TransitionStart::Rejected(reason);
            }
        };

        state.transitioning = true;

        let duration = self.config.duration;
        let forward = from.is_forward_to(to);
        // Forward: outgoing recedes into -z, incoming arrives from +z.
        let sign = if forward { -1.0 } else { 1.0 };
        let depth = Vec3::Z * self.config.depth_offset.max(clearance);
        let tilt = self.config.rotation_offset;

        from_group.visible = true;
        to_group.visible = true;

        let from_position = Tween::new(from_group.position, from_group.position + depth * sign, now, duration)
            .easing(Easing::EaseIn);
        let from_rotation = Tween::new(
            from_group.rotation,
            from_group.rotation + Vec3::new(tilt * 0.5, tilt * sign, 0.0),
            now,
            duration,
        );

        to_group.position = -depth * sign;
        to_group.rotation = Vec3::new(0.0, -tilt * sign, 0.0);
        let to_position = Tween::new(to_group.position, Vec3::ZERO, now, duration).easing(Easing::EaseOut);
        let to_rotation = Tween::new(to_group.rotation, Vec3::ZERO, now, duration);

        label.show(to.display_name(), now, self.config.label_fade);

        let character = TransitionCharacter::classify(from, to);
        let camera_path = CameraPath::for_scene(to);
        let shake = (character == TransitionCharacter::EnterBlackHole).then(|| Shake {
            start: now + camera_path.first_leg_end(duration),
            duration: self.config.shake_duration,
            amplitude: self.config.shake_amplitude,
        });

        let light_tweens = lights.fade_to(
            LightLevels::for_scene(to),
            now,
            duration * self.config.light_fraction,
        );

        pipeline.update(now);
        pipeline.apply_scene_preset(to, duration);
        pipeline.boost_for_transition(from, to, duration);
        pipeline.add_overlay(character, duration);

        audio.play_transition_cue(from, to);

        info!(
            target: "stellar::transition",
            "{from} -> {to} ({character:?}, {duration:.1}s)"
        );

        self.active = Some(ActiveTransition {
            from,
            to,
            start: now,
            duration,
            from_position,
            from_rotation,
            to_position,
            to_rotation,
            camera_start: camera.position,
            camera_path,
            lights: light_tweens,
            shake,
            on_complete,
        });

        TransitionStart::Started
    }

    /// Advance the running transition to `now`.
    pub fn update(
        &mut self,
        state: &mut TransitionState,
        now: f32,
        targets: TransitionTargets<'_>,
    ) -> TransitionUpdate {
        let Some(active) = self.active.as_ref() else {
            return TransitionUpdate::Idle;
        };

        let TransitionTargets {
            mut from_group,
            mut to_group,
            camera,
            lights,
            pipeline,
            audio,
            ..
        } = targets;

        if now >= active.end() {
            let Some(mut done) = self.active.take() else {
                return TransitionUpdate::Idle;
            };
            let end = done.end();

            if let Some(group) = from_group.as_deref_mut() {
                group.position = done.from_position.value_at(end);
                group.rotation = done.from_rotation.value_at(end);
            }
            if let Some(group) = to_group.as_deref_mut() {
                group.position = Vec3::ZERO;
                group.rotation = Vec3::ZERO;
                group.visible = true;
            }
            if let Some(destination) = done.camera_path.destination() {
                camera.position = destination;
            }
            lights.apply(&done.lights, end);

            if let Some(group) = from_group {
                group.visible = false;
            }
            state.active = done.to;
            state.transitioning = false;
            if let Some(callback) = done.on_complete.take() {
                callback(done.to);
            }
            pipeline.clear_transients();
            audio.stop_all();
            audio.play_ambient(done.to);

            info!(target: "stellar::transition", "now showing {}", done.to);
            return TransitionUpdate::Completed {
                from: done.from,
                to: done.to,
            };
        }

        if let Some(group) = from_group {
            group.position = active.from_position.value_at(now);
            group.rotation = active.from_rotation.value_at(now);
        }
        if let Some(group) = to_group {
            group.position = active.to_position.value_at(now);
            group.rotation = active.to_rotation.value_at(now);
        }

        let elapsed = now - active.start;
        let shake = active
            .shake
            .map(|s| s.offset(now, &mut self.rng))
            .unwrap_or(Vec3::ZERO);
        camera.position = active
            .camera_path
            .position_at(active.camera_start, elapsed, active.duration)
            + shake;
        camera.target = Vec3::ZERO;

        lights.apply(&active.lights, now);

        TransitionUpdate::Running {
            progress: (elapsed / active.duration).clamp(0.0, 1.0),
        }
    }
}

fn check_group(
    scene: SceneIndex,
    group: Option<&mut TransformGroup>,
) -> Result<&mut TransformGroup, RejectReason> {
    match group {
        None => Err(RejectReason::MissingGroup(scene)),
        Some(group) if !group.is_valid() => Err(RejectReason::InvalidGroup(scene)),
        Some(group) => Ok(group),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::LogAudio;
    use crate::quality::QualityTier;
    use crate::scene::SceneSet;
    use approx::assert_abs_diff_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Rig {
        scenes: SceneSet,
        camera: Camera,
        lights: LightRig,
        pipeline: PostPipeline,
        label: SceneLabel,
        audio: LogAudio,
        state: TransitionState,
        orchestrator: TransitionOrchestrator,
    }

    impl Rig {
        fn new() -> Self {
            let mut scenes = SceneSet::new(1);
            scenes.show_only(SceneIndex::Earth);
            Self {
                scenes,
                camera: Camera::default(),
                lights: LightRig::for_scene(SceneIndex::Earth),
                pipeline: PostPipeline::new(SceneIndex::Earth, 800, 600, QualityTier::High),
                label: SceneLabel::new(),
                audio: LogAudio::new(),
                state: TransitionState::new(SceneIndex::Earth),
                orchestrator: TransitionOrchestrator::new(TransitionConfig::default(), 9),
            }
        }

        fn begin(&mut self, to: SceneIndex, now: f32) -> TransitionStart {
            let from = self.state.active();
            let clearance = self.scenes.clearance(from, to);
            let (from_group, to_group) = match self.scenes.groups_mut(from, to) {
                Some((a, b)) => (Some(a), Some(b)),
                None => (None, None),
            };
            self.orchestrator.begin_transition(
                &mut self.state,
                from,
                to,
                now,
                TransitionTargets {
                    from_group,
                    to_group,
                    camera: &mut self.camera,
                    lights: &mut self.lights,
                    pipeline: &mut self.pipeline,
                    label: &mut self.label,
                    audio: &mut self.audio,
                    clearance,
                },
                None,
            )
        }

        fn tick(&mut self, from: SceneIndex, to: SceneIndex, now: f32) -> TransitionUpdate {
            self.pipeline.update(now);
            let clearance = self.scenes.clearance(from, to);
            let (from_group, to_group) = match self.scenes.groups_mut(from, to) {
                Some((a, b)) => (Some(a), Some(b)),
                None => (None, None),
            };
            self.orchestrator.update(
                &mut self.state,
                now,
                TransitionTargets {
                    from_group,
                    to_group,
                    camera: &mut self.camera,
                    lights: &mut self.lights,
                    pipeline: &mut self.pipeline,
                    label: &mut self.label,
                    audio: &mut self.audio,
                    clearance,
                },
            )
        }
    }

    #[test]
    fn earth_to_black_hole_end_to_end() {
        let mut rig = Rig::new();
        assert_eq!(rig.begin(SceneIndex::BlackHole, 0.0), TransitionStart::Started);
        assert!(rig.state.is_transitioning());
        assert!(rig.scenes.get(SceneIndex::Earth).group().visible);
        assert!(rig.scenes.get(SceneIndex::BlackHole).group().visible);
        assert_eq!(rig.label.text(), "Black Hole");

        let mut peak = 0.0_f32;
        let mut now = 0.0;
        while now < 0.9 {
            rig.tick(SceneIndex::Earth, SceneIndex::BlackHole, now);
            peak = peak.max(rig.pipeline.bloom().strength);
            now += 1.0 / 60.0;
        }
        assert!(peak > 1.5);
        assert!(rig.state.is_transitioning());

        let done = rig.tick(SceneIndex::Earth, SceneIndex::BlackHole, 3.0);
        assert_eq!(
            done,
            TransitionUpdate::Completed {
                from: SceneIndex::Earth,
                to: SceneIndex::BlackHole
            }
        );
        assert_eq!(rig.pipeline.bloom().strength, 0.9);
        assert_eq!(rig.state.active(), SceneIndex::BlackHole);
        assert!(!rig.state.is_transitioning());
        assert!(!rig.scenes.get(SceneIndex::Earth).group().visible);
        assert!(rig.scenes.get(SceneIndex::BlackHole).group().visible);
        assert_eq!(rig.camera.position, Vec3::new(0.0, 0.4, 8.0));
        assert_eq!(rig.lights.levels, LightLevels::for_scene(SceneIndex::BlackHole));
        assert!(rig.pipeline.transients().is_empty());
    }

    #[test]
    fn second_request_during_transition_is_dropped() {
        let mut rig = Rig::new();
        assert!(rig.begin(SceneIndex::Uranus, 0.0).is_started());
        rig.tick(SceneIndex::Earth, SceneIndex::Uranus, 0.5);

        let galaxy_before = *rig.scenes.get(SceneIndex::Galaxy).group();
        assert_eq!(rig.begin(SceneIndex::Galaxy, 0.6), TransitionStart::Busy);
        assert_eq!(*rig.scenes.get(SceneIndex::Galaxy).group(), galaxy_before);
        assert_eq!(rig.audio.history().len(), 1);

        rig.tick(SceneIndex::Earth, SceneIndex::Uranus, 3.0);
        assert_eq!(rig.state.active(), SceneIndex::Uranus);
        assert!(!rig.scenes.get(SceneIndex::Galaxy).group().visible);
    }

    #[test]
    fn outgoing_group_direction_follows_scene_order() {
        let mut rig = Rig::new();
        rig.begin(SceneIndex::Galaxy, 0.0);
        rig.tick(SceneIndex::Earth, SceneIndex::Galaxy, 1.5);
        assert!(rig.scenes.get(SceneIndex::Earth).group().position.z < 0.0);
        assert!(rig.scenes.get(SceneIndex::Galaxy).group().position.z > 0.0);
        rig.tick(SceneIndex::Earth, SceneIndex::Galaxy, 3.0);
        assert_eq!(rig.scenes.get(SceneIndex::Galaxy).group().position, Vec3::ZERO);

        rig.begin(SceneIndex::Uranus, 4.0);
        rig.tick(SceneIndex::Galaxy, SceneIndex::Uranus, 7.0);
        let outgoing = rig.scenes.get(SceneIndex::Galaxy).group().position.z;
        assert!(outgoing > 0.0, "backward transition should push +z, got {outgoing}");
    }

    #[test]
    fn lights_settle_before_the_transition_ends() {
        let mut rig = Rig::new();
        let config = *rig.orchestrator.config();
        let target = LightLevels::for_scene(SceneIndex::BlackHole);
        rig.begin(SceneIndex::BlackHole, 0.0);

        rig.tick(SceneIndex::Earth, SceneIndex::BlackHole, config.duration * 0.5);
        assert_ne!(rig.lights.levels, target);

        let settled = config.duration * config.light_fraction;
        let update = rig.tick(SceneIndex::Earth, SceneIndex::BlackHole, settled);
        assert!(matches!(update, TransitionUpdate::Running { .. }));
        assert!(rig.state.is_transitioning());
        assert_eq!(rig.lights.levels, target);
    }

    #[test]
    fn short_depth_offset_is_raised_to_scene_clearance() {
        let mut rig = Rig::new();
        rig.orchestrator = TransitionOrchestrator::new(
            TransitionConfig {
                depth_offset: 1.0,
                ..TransitionConfig::default()
            },
            9,
        );
        let clearance = rig.scenes.clearance(SceneIndex::Earth, SceneIndex::Galaxy);
        assert!(clearance > 1.0);

        rig.begin(SceneIndex::Galaxy, 0.0);
        let incoming = rig.scenes.get(SceneIndex::Galaxy).group().position;
        assert_abs_diff_eq!(incoming.z, clearance, epsilon = 1e-5);

        rig.tick(SceneIndex::Earth, SceneIndex::Galaxy, 3.0);
        let outgoing = rig.scenes.get(SceneIndex::Earth).group().position;
        assert_abs_diff_eq!(outgoing.z, -clearance, epsilon = 1e-5);
    }

    #[test]
    fn same_scene_is_rejected_without_side_effects() {
        let mut rig = Rig::new();
        let result = rig.begin(SceneIndex::Earth, 0.0);
        assert_eq!(
            result,
            TransitionStart::Rejected(RejectReason::SameScene(SceneIndex::Earth))
        );
        assert!(!rig.state.is_transitioning());
        assert!(rig.audio.history().is_empty());
        assert!(rig.pipeline.transients().is_empty());
        assert_eq!(rig.label.text(), "");
    }

    #[test]
    fn invalid_group_is_rejected_atomically() {
        let mut rig = Rig::new();
        rig.scenes.get_mut(SceneIndex::Uranus).group_mut().position.x = f32::INFINITY;
        let result = rig.begin(SceneIndex::Uranus, 0.0);
        assert_eq!(
            result,
            TransitionStart::Rejected(RejectReason::InvalidGroup(SceneIndex::Uranus))
        );
        assert!(!rig.state.is_transitioning());
        assert!(!rig.scenes.get(SceneIndex::Uranus).group().visible);
        assert_eq!(rig.camera, Camera::default());
        assert!(!rig.orchestrator.is_running());
    }

    #[test]
    fn missing_group_is_rejected() {
        let mut rig = Rig::new();
        let result = rig.orchestrator.begin_transition(
            &mut rig.state,
            SceneIndex::Earth,
            SceneIndex::Uranus,
            0.0,
            TransitionTargets {
                from_group: None,
                to_group: None,
                camera: &mut rig.camera,
                lights: &mut rig.lights,
                pipeline: &mut rig.pipeline,
                label: &mut rig.label,
                audio: &mut rig.audio,
                clearance: 0.0,
            },
            None,
        );
        assert_eq!(
            result,
            TransitionStart::Rejected(RejectReason::MissingGroup(SceneIndex::Earth))
        );
        assert!(!rig.state.is_transitioning());
    }

    #[test]
    fn on_complete_runs_once_after_the_flip() {
        let mut rig = Rig::new();
        let seen = Rc::new(Cell::new(None::<SceneIndex>));
        let sink = seen.clone();
        let (a, b) = rig
            .scenes
            .groups_mut(SceneIndex::Earth, SceneIndex::Galaxy)
            .expect("groups");
        rig.orchestrator.begin_transition(
            &mut rig.state,
            SceneIndex::Earth,
            SceneIndex::Galaxy,
            0.0,
            TransitionTargets {
                from_group: Some(a),
                to_group: Some(b),
                camera: &mut rig.camera,
                lights: &mut rig.lights,
                pipeline: &mut rig.pipeline,
                label: &mut rig.label,
                audio: &mut rig.audio,
                clearance: 0.0,
            },
            Some(Box::new(move |to: SceneIndex| sink.set(Some(to)))),
        );

        rig.tick(SceneIndex::Earth, SceneIndex::Galaxy, 2.9);
        assert_eq!(seen.get(), None);
        rig.tick(SceneIndex::Earth, SceneIndex::Galaxy, 3.2);
        assert_eq!(seen.get(), Some(SceneIndex::Galaxy));
        assert_eq!(
            rig.tick(SceneIndex::Earth, SceneIndex::Galaxy, 3.3),
            TransitionUpdate::Idle
        );
    }

    #[test]
    fn black_hole_entry_shakes_after_first_leg_only() {
        let mut rig = Rig::new();
        rig.begin(SceneIndex::BlackHole, 0.0);
        let path = CameraPath::for_scene(SceneIndex::BlackHole);
        let start = Camera::default().position;

        rig.tick(SceneIndex::Earth, SceneIndex::BlackHole, 0.5);
        assert_eq!(rig.camera.position, path.position_at(start, 0.5, 3.0));

        rig.tick(SceneIndex::Earth, SceneIndex::BlackHole, 1.2);
        let jitter = rig.camera.position - path.position_at(start, 1.2, 3.0);
        assert!(jitter.length() > 0.0);
        assert!(jitter.length() <= 0.25 * 3f32.sqrt());

        rig.tick(SceneIndex::Earth, SceneIndex::BlackHole, 2.5);
        assert_eq!(rig.camera.position, path.position_at(start, 2.5, 3.0));
    }

    #[test]
    fn completion_stops_transition_audio() {
        let mut rig = Rig::new();
        rig.begin(SceneIndex::Uranus, 0.0);
        assert_eq!(rig.audio.playing().len(), 1);
        rig.tick(SceneIndex::Earth, SceneIndex::Uranus, 3.0);
        let playing = rig.audio.playing();
        assert_eq!(playing.len(), 1);
        assert_eq!(playing[0], crate::audio::CueSpec::for_ambient(SceneIndex::Uranus));
    }
}
