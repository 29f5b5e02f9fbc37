//! Maps raw window events onto tour commands.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::scene::SceneIndex;

/// Minimum horizontal travel, in pixels, for a touch to count as a swipe.
pub const SWIPE_THRESHOLD: f32 = 80.0;

/// Something the user asked the tour to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Jump(SceneIndex),
    Next,
    Previous,
    ToggleAutoAdvance,
    ResetScene,
    /// Left click at a window position.
    Pick(Vec2),
    Exit,
}

/// Tracks the cursor and in-flight touches, and turns events into [`Command`]s.
#[derive(Debug, Default)]
pub struct Input {
    cursor: Vec2,
    swipe: SwipeTracker,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a window event.
    ///
    /// The outer `Option` is `Some` for any user input at all, even input
    /// that maps to no command, so the caller can restart its idle timer.
    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<Option<Command>> {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return Some(None);
                }
                match event.physical_key {
                    PhysicalKey::Code(key) => Some(command_for_key(key)),
                    PhysicalKey::Unidentified(_) => Some(None),
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => Some(Some(Command::Pick(self.cursor))),
            WindowEvent::MouseInput { .. } => Some(None),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                Some(None)
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                Some(command_for_scroll(dy))
            }
            WindowEvent::Touch(touch) => Some(self.handle_touch(touch)),
            _ => None,
        }
    }

    fn handle_touch(&mut self, touch: &Touch) -> Option<Command> {
        let at = Vec2::new(touch.location.x as f32, touch.location.y as f32);
        match touch.phase {
            TouchPhase::Started => {
                self.swipe.begin(touch.id, at);
                None
            }
            TouchPhase::Ended => self.swipe.end(touch.id, at),
            TouchPhase::Cancelled => {
                self.swipe.cancel();
                None
            }
            TouchPhase::Moved => None,
        }
    }
}

/// Key bindings.
pub fn command_for_key(key: KeyCode) -> Option<Command> {
    match key {
        KeyCode::Digit1 => Some(Command::Jump(SceneIndex::Earth)),
        KeyCode::Digit2 => Some(Command::Jump(SceneIndex::Uranus)),
        KeyCode::Digit3 => Some(Command::Jump(SceneIndex::Galaxy)),
        KeyCode::Digit4 => Some(Command::Jump(SceneIndex::BlackHole)),
        KeyCode::ArrowRight | KeyCode::Space => Some(Command::Next),
        KeyCode::ArrowLeft => Some(Command::Previous),
        KeyCode::KeyA => Some(Command::ToggleAutoAdvance),
        KeyCode::KeyR => Some(Command::ResetScene),
        KeyCode::Escape => Some(Command::Exit),
        _ => None,
    }
}

/// Wheel down advances, wheel up goes back. `dy` is positive for wheel up.
pub fn command_for_scroll(dy: f32) -> Option<Command> {
    if dy < 0.0 {
        Some(Command::Next)
    } else if dy > 0.0 {
        Some(Command::Previous)
    } else {
        None
    }
}

/// Follows one touch from start to end and classifies it as a swipe.
#[derive(Debug, Default)]
pub struct SwipeTracker {
    start: Option<(u64, Vec2)>,
}

impl SwipeTracker {
    pub fn begin(&mut self, id: u64, at: Vec2) {
        // Only the first finger counts.
        if self.start.is_none() {
            self.start = Some((id, at));
        }
    }

    /// A leftward swipe advances, a rightward one goes back.
    pub fn end(&mut self, id: u64, at: Vec2) -> Option<Command> {
        let (start_id, start) = self.start?;
        if start_id != id {
            return None;
        }
        self.start = None;

        let travel = at - start;
        if travel.x.abs() <= SWIPE_THRESHOLD || travel.x.abs() < travel.y.abs() {
            return None;
        }
        if travel.x < 0.0 {
            Some(Command::Next)
        } else {
            Some(Command::Previous)
        }
    }

    pub fn cancel(&mut self) {
        self.start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_jump_to_scenes() {
        assert_eq!(command_for_key(KeyCode::Digit1), Some(Command::Jump(SceneIndex::Earth)));
        assert_eq!(
            command_for_key(KeyCode::Digit4),
            Some(Command::Jump(SceneIndex::BlackHole))
        );
        assert_eq!(command_for_key(KeyCode::Digit5), None);
    }

    #[test]
    fn arrows_and_space_navigate() {
        assert_eq!(command_for_key(KeyCode::ArrowRight), Some(Command::Next));
        assert_eq!(command_for_key(KeyCode::Space), Some(Command::Next));
        assert_eq!(command_for_key(KeyCode::ArrowLeft), Some(Command::Previous));
        assert_eq!(command_for_key(KeyCode::KeyA), Some(Command::ToggleAutoAdvance));
        assert_eq!(command_for_key(KeyCode::KeyR), Some(Command::ResetScene));
        assert_eq!(command_for_key(KeyCode::Escape), Some(Command::Exit));
    }

    #[test]
    fn wheel_direction() {
        assert_eq!(command_for_scroll(-1.0), Some(Command::Next));
        assert_eq!(command_for_scroll(2.0), Some(Command::Previous));
        assert_eq!(command_for_scroll(0.0), None);
    }

    #[test]
    fn long_horizontal_swipe_navigates() {
        let mut swipe = SwipeTracker::default();
        swipe.begin(1, Vec2::new(400.0, 300.0));
        assert_eq!(swipe.end(1, Vec2::new(250.0, 310.0)), Some(Command::Next));

        swipe.begin(2, Vec2::new(100.0, 300.0));
        assert_eq!(swipe.end(2, Vec2::new(200.0, 290.0)), Some(Command::Previous));
    }

    #[test]
    fn short_or_vertical_swipes_are_ignored() {
        let mut swipe = SwipeTracker::default();
        swipe.begin(1, Vec2::new(400.0, 300.0));
        assert_eq!(swipe.end(1, Vec2::new(330.0, 300.0)), None);

        swipe.begin(1, Vec2::new(400.0, 100.0));
        assert_eq!(swipe.end(1, Vec2::new(300.0, 400.0)), None);
    }

    #[test]
    fn second_finger_does_not_steal_the_swipe() {
        let mut swipe = SwipeTracker::default();
        swipe.begin(1, Vec2::new(400.0, 300.0));
        swipe.begin(2, Vec2::new(0.0, 0.0));
        assert_eq!(swipe.end(2, Vec2::new(300.0, 0.0)), None);
        assert_eq!(swipe.end(1, Vec2::new(200.0, 300.0)), Some(Command::Next));
    }

    #[test]
    fn cancelled_touch_forgets_its_start() {
        let mut swipe = SwipeTracker::default();
        swipe.begin(1, Vec2::new(400.0, 300.0));
        swipe.cancel();
        assert_eq!(swipe.end(1, Vec2::new(100.0, 300.0)), None);
    }
}
