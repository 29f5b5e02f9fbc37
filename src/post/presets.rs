//! Fixed per-scene look tables and per-transition boost profiles.

use crate::scene::SceneIndex;
use crate::transition::TransitionCharacter;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloomSettings {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilmSettings {
    pub noise: f32,
    pub scanline: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectSetting {
    pub intensity: f32,
    pub enabled: bool,
}

/// The steady-state post-processing look of one scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScenePreset {
    pub bloom: BloomSettings,
    pub film: FilmSettings,
    pub chromatic: EffectSetting,
    pub lens: EffectSetting,
}

impl ScenePreset {
    #[allow(clippy::too_many_arguments)]
    const fn new(
        strength: f32,
        radius: f32,
        threshold: f32,
        noise: f32,
        scanline: f32,
        chromatic: f32,
        chromatic_on: bool,
        lens: f32,
        lens_on: bool,
    ) -> Self {
        Self {
            bloom: BloomSettings {
                strength,
                radius,
                threshold,
            },
            film: FilmSettings { noise, scanline },
            chromatic: EffectSetting {
                intensity: chromatic,
                enabled: chromatic_on,
            },
            lens: EffectSetting {
                intensity: lens,
                enabled: lens_on,
            },
        }
    }

    pub const fn for_scene(scene: SceneIndex) -> Self {
        match scene {
            SceneIndex::Earth => Self::new(0.3, 0.4, 0.85, 0.15, 0.05, 0.002, true, 0.0, false),
            SceneIndex::Uranus => Self::new(0.5, 0.5, 0.8, 0.2, 0.05, 0.003, true, 0.02, true),
            SceneIndex::Galaxy => Self::new(1.2, 0.7, 0.6, 0.25, 0.08, 0.005, true, 0.05, true),
            SceneIndex::BlackHole => Self::new(0.9, 0.6, 0.5, 0.35, 0.12, 0.01, true, 0.15, true),
        }
    }
}

/// Span of the entering-black-hole noise spike, as a fraction of the transition.
pub const NOISE_SPIKE_SPAN: f32 = 0.15;
/// Where the exit flash peaks, as a fraction of the transition.
pub const FLASH_PEAK_AT: f32 = 0.1;

/// Additive overshoot applied while a transition runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoostProfile {
    pub bloom: f32,
    pub chromatic: f32,
    pub lens: f32,
    /// Fraction of the duration at which the overshoot peaks.
    pub peak_at: f32,
    /// Film-noise spike over the first [`NOISE_SPIKE_SPAN`] of the transition.
    pub noise_spike: Option<f32>,
    /// Brightness flash and scanline boost peaking at [`FLASH_PEAK_AT`].
    pub flash: Option<(f32, f32)>,
}

impl BoostProfile {
    pub const fn for_character(character: TransitionCharacter) -> Self {
        match character {
            TransitionCharacter::Standard => Self {
                bloom: 0.8,
                chromatic: 0.03,
                lens: 0.1,
                peak_at: 0.3,
                noise_spike: None,
                flash: None,
            },
            TransitionCharacter::EnterGalaxy => Self {
                bloom: 1.0,
                chromatic: 0.04,
                lens: 0.15,
                peak_at: 0.25,
                noise_spike: None,
                flash: None,
            },
            TransitionCharacter::EnterBlackHole => Self {
                bloom: 1.6,
                chromatic: 0.08,
                lens: 0.35,
                peak_at: 0.2,
                noise_spike: Some(0.6),
                flash: None,
            },
            TransitionCharacter::ExitBlackHole => Self {
                bloom: 1.0,
                chromatic: 0.05,
                lens: 0.2,
                peak_at: 0.25,
                noise_spike: None,
                flash: Some((0.8, 0.5)),
            },
        }
    }
}

/// Full-screen overlay that masks the hand-off.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayProfile {
    /// Fraction of the duration spent fading in; the rest fades out.
    pub fade_in: f32,
    pub peak_alpha: f32,
    pub color: [f32; 3],
    /// Peak strength of an extra radial-blur pass, if the character has one.
    pub radial_blur: Option<f32>,
}

impl OverlayProfile {
    pub const fn for_character(character: TransitionCharacter) -> Self {
        match character {
            TransitionCharacter::Standard => Self {
                fade_in: 0.15,
                peak_alpha: 0.35,
                color: [0.02, 0.05, 0.2],
                radial_blur: None,
            },
            TransitionCharacter::EnterGalaxy => Self {
                fade_in: 0.15,
                peak_alpha: 0.4,
                color: [0.35, 0.15, 0.55],
                radial_blur: None,
            },
            TransitionCharacter::EnterBlackHole => Self {
                fade_in: 0.1,
                peak_alpha: 0.7,
                color: [0.0, 0.0, 0.0],
                radial_blur: Some(0.5),
            },
            TransitionCharacter::ExitBlackHole => Self {
                fade_in: 0.08,
                peak_alpha: 0.8,
                color: [1.0, 1.0, 1.0],
                radial_blur: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_sit_inside_effect_ranges() {
        for scene in SceneIndex::ALL {
            let preset = ScenePreset::for_scene(scene);
            assert!((0.0..=0.1).contains(&preset.chromatic.intensity));
            assert!((0.0..=0.5).contains(&preset.lens.intensity));
        }
    }

    #[test]
    fn black_hole_boost_peaks_earliest() {
        let enter = BoostProfile::for_character(TransitionCharacter::EnterBlackHole);
        for other in [
            TransitionCharacter::Standard,
            TransitionCharacter::EnterGalaxy,
            TransitionCharacter::ExitBlackHole,
        ] {
            let profile = BoostProfile::for_character(other);
            assert!(enter.peak_at < profile.peak_at);
            assert!(enter.chromatic > profile.chromatic);
            assert!(enter.lens > profile.lens);
        }
    }

    #[test]
    fn overlays_fade_in_fast_and_out_slow() {
        for character in TransitionCharacter::ALL {
            let overlay = OverlayProfile::for_character(character);
            assert!(overlay.fade_in < 0.5);
        }
    }
}
