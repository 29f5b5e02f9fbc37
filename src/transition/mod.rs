//! Scene-to-scene transitions.
//!
//! A transition is the only time anything other than the render loop writes
//! to the camera, the light rig and the post-processing pipeline.
//! [`TransitionState`] holds the flag that keeps transitions from overlapping
//! and the pointer to the active scene; [`TransitionOrchestrator`] runs one
//! transition at a time against borrowed targets.

mod orchestrator;

pub use orchestrator::{
    TransitionConfig, TransitionOrchestrator, TransitionTargets, TransitionUpdate,
};

use crate::scene::SceneIndex;

/// Which scene is showing and whether a transition currently owns the shared resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionState {
    pub(crate) transitioning: bool,
    pub(crate) active: SceneIndex,
}

impl TransitionState {
    pub fn new(active: SceneIndex) -> Self {
        Self {
            transitioning: false,
            active,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub fn active(&self) -> SceneIndex {
        self.active
    }
}

/// The treatment a transition gets, chosen from its endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionCharacter {
    Standard,
    EnterGalaxy,
    EnterBlackHole,
    ExitBlackHole,
}

impl TransitionCharacter {
    pub const ALL: [TransitionCharacter; 4] = [
        TransitionCharacter::Standard,
        TransitionCharacter::EnterGalaxy,
        TransitionCharacter::EnterBlackHole,
        TransitionCharacter::ExitBlackHole,
    ];

    /// Entering the black hole wins over leaving it, which wins over entering the galaxy.
    pub fn classify(from: SceneIndex, to: SceneIndex) -> Self {
        if to == SceneIndex::BlackHole {
            TransitionCharacter::EnterBlackHole
        } else if from == SceneIndex::BlackHole {
            TransitionCharacter::ExitBlackHole
        } else if to == SceneIndex::Galaxy {
            TransitionCharacter::EnterGalaxy
        } else {
            TransitionCharacter::Standard
        }
    }
}

/// Why a transition request was turned down without touching anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    SameScene(SceneIndex),
    MissingGroup(SceneIndex),
    InvalidGroup(SceneIndex),
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::SameScene(scene) => write!(f, "already at {scene}"),
            RejectReason::MissingGroup(scene) => write!(f, "no transform group for {scene}"),
            RejectReason::InvalidGroup(scene) => write!(f, "transform group of {scene} is not finite"),
        }
    }
}

/// Outcome of a transition request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionStart {
    Started,
    /// Another transition is in flight; the request was dropped.
    Busy,
    Rejected(RejectReason),
}

impl TransitionStart {
    pub fn is_started(self) -> bool {
        self == TransitionStart::Started
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_priorities() {
        use SceneIndex::*;
        use TransitionCharacter::*;

        assert_eq!(TransitionCharacter::classify(Earth, BlackHole), EnterBlackHole);
        assert_eq!(TransitionCharacter::classify(BlackHole, Galaxy), ExitBlackHole);
        assert_eq!(TransitionCharacter::classify(Uranus, Galaxy), EnterGalaxy);
        assert_eq!(TransitionCharacter::classify(Galaxy, Uranus), Standard);
        assert_eq!(TransitionCharacter::classify(BlackHole, Earth), ExitBlackHole);
    }
}
