//! Transition and ambient sound cues.
//!
//! Audio is fire-and-forget: the orchestrator asks for a cue and moves on.
//! [`CueSpec`] describes and synthesises a cue; an [`AudioCue`] sink decides
//! what to do with it.

use std::f32::consts::TAU;

use log::debug;

use crate::scene::SceneIndex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

impl Waveform {
    /// One sample of the waveform at `phase` in [0, 1).
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// A synthesised tone with a linear attack and an exponential decay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CueSpec {
    pub frequency: f32,
    pub waveform: Waveform,
    pub duration: f32,
    pub attack: f32,
    /// Exponential decay rate after the attack, per second.
    pub decay: f32,
    pub gain: f32,
}

impl CueSpec {
    /// The whoosh played when arriving at `to`. Timbre depends on the destination only.
    pub fn for_transition(_from: SceneIndex, to: SceneIndex) -> Self {
        let (frequency, waveform) = match to {
            SceneIndex::Earth => (220.0, Waveform::Sine),
            SceneIndex::Uranus => (330.0, Waveform::Triangle),
            SceneIndex::Galaxy => (440.0, Waveform::Sawtooth),
            SceneIndex::BlackHole => (55.0, Waveform::Square),
        };
        Self {
            frequency,
            waveform,
            duration: 1.2,
            attack: 0.05,
            decay: 3.0,
            gain: 0.3,
        }
    }

    /// A quiet drone an octave below the scene's transition cue.
    pub fn for_ambient(scene: SceneIndex) -> Self {
        let cue = Self::for_transition(scene, scene);
        Self {
            frequency: cue.frequency * 0.5,
            duration: 4.0,
            attack: 1.0,
            decay: 0.5,
            gain: 0.1,
            ..cue
        }
    }

    /// Mono PCM samples at `sample_rate`.
    pub fn render(&self, sample_rate: u32) -> Vec<f32> {
        let rate = sample_rate.max(1) as f32;
        let len = (self.duration * rate) as usize;
        (0..len)
            .map(|i| {
                let t = i as f32 / rate;
                let phase = (self.frequency * t).fract();
                let envelope = if t < self.attack {
                    t / self.attack
                } else {
                    (-(t - self.attack) * self.decay).exp()
                };
                self.waveform.sample(phase) * envelope * self.gain
            })
            .collect()
    }
}

/// Something that can play cues. Calls never block.
pub trait AudioCue {
    fn play_transition_cue(&mut self, from: SceneIndex, to: SceneIndex);

    fn play_ambient(&mut self, scene: SceneIndex);

    /// Stop and release everything that is playing.
    fn stop_all(&mut self);
}

/// Number of recent cues [`LogAudio`] remembers.
pub const HISTORY_LIMIT: usize = 64;

/// A sink that logs cues and keeps track of what would be playing.
#[derive(Debug, Default)]
pub struct LogAudio {
    playing: Vec<CueSpec>,
    history: Vec<CueSpec>,
}

impl LogAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playing(&self) -> &[CueSpec] {
        &self.playing
    }

    /// The most recent cues, oldest first, at most [`HISTORY_LIMIT`].
    pub fn history(&self) -> &[CueSpec] {
        &self.history
    }

    fn start(&mut self, cue: CueSpec) {
        debug!(
            target: "stellar::audio",
            "cue {:?} {:.0} Hz for {:.1}s",
            cue.waveform, cue.frequency, cue.duration
        );
        self.playing.push(cue);
        if self.history.len() == HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push(cue);
    }
}

impl AudioCue for LogAudio {
    fn play_transition_cue(&mut self, from: SceneIndex, to: SceneIndex) {
        self.start(CueSpec::for_transition(from, to));
    }

    fn play_ambient(&mut self, scene: SceneIndex) {
        self.start(CueSpec::for_ambient(scene));
    }

    fn stop_all(&mut self) {
        self.playing.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timbre_follows_destination() {
        let a = CueSpec::for_transition(SceneIndex::Earth, SceneIndex::BlackHole);
        let b = CueSpec::for_transition(SceneIndex::Galaxy, SceneIndex::BlackHole);
        assert_eq!(a, b);
        assert_eq!(a.waveform, Waveform::Square);
        assert_eq!(a.frequency, 55.0);
    }

    #[test]
    fn rendered_cue_starts_silent_and_stays_bounded() {
        let cue = CueSpec::for_transition(SceneIndex::Earth, SceneIndex::Galaxy);
        let samples = cue.render(8000);
        assert_eq!(samples.len(), 9600);
        assert_eq!(samples[0], 0.0);
        assert!(samples.iter().all(|s| s.abs() <= cue.gain + 1e-6));
        let tail = samples[samples.len() - 1].abs();
        assert!(tail < 0.01);
    }

    #[test]
    fn stop_all_clears_playing_but_keeps_history() {
        let mut audio = LogAudio::new();
        audio.play_ambient(SceneIndex::Uranus);
        audio.play_transition_cue(SceneIndex::Uranus, SceneIndex::Galaxy);
        assert_eq!(audio.playing().len(), 2);
        audio.stop_all();
        assert!(audio.playing().is_empty());
        assert_eq!(audio.history().len(), 2);
    }

    #[test]
    fn history_keeps_only_recent_cues() {
        let mut audio = LogAudio::new();
        for _ in 0..HISTORY_LIMIT {
            audio.play_ambient(SceneIndex::Earth);
        }
        audio.play_ambient(SceneIndex::Galaxy);
        audio.stop_all();

        let history = audio.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[HISTORY_LIMIT - 1], CueSpec::for_ambient(SceneIndex::Galaxy));
        assert_eq!(history[0], CueSpec::for_ambient(SceneIndex::Earth));
    }
}
