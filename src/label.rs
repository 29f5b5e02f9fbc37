//! The on-screen scene name.

use crate::tween::{Easing, Tween};

/// Text naming the current scene, with a fade.
///
/// The label is shown in the window title; its opacity drives the fade of
/// the caption band the renderer blends over the frame.
#[derive(Clone, Debug)]
pub struct SceneLabel {
    text: String,
    opacity: Tween<f32>,
}

impl Default for SceneLabel {
    fn default() -> Self {
        Self {
            text: String::new(),
            opacity: Tween::settled(0.0),
        }
    }
}

impl SceneLabel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the text and fade it in from transparent.
    pub fn show(&mut self, text: impl Into<String>, now: f32, fade: f32) {
        self.text = text.into();
        self.opacity = Tween::new(0.0, 1.0, now, fade).easing(Easing::EaseOut);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn opacity(&self, now: f32) -> f32 {
        self.opacity.value_at(now)
    }

    /// `"<prefix> - <label>"`, or just the prefix while the label is empty.
    pub fn window_title(&self, prefix: &str) -> String {
        if self.text.is_empty() {
            prefix.to_string()
        } else {
            format!("{prefix} - {}", self.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_fades_in() {
        let mut label = SceneLabel::new();
        label.show("Black Hole", 2.0, 0.5);
        assert_eq!(label.opacity(2.0), 0.0);
        assert!(label.opacity(2.25) > 0.5);
        assert_eq!(label.opacity(2.5), 1.0);
        assert_eq!(label.window_title("Stellar"), "Stellar - Black Hole");
    }
}
