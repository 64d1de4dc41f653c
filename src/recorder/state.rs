use serde::{Deserialize, Serialize};

/// Lifecycle of one recorder wrapper
///
/// `idle → acquiring → active → stopping → finished`. A recorder stopped or
/// failed during acquisition goes `acquiring → stopping`; nothing reaches
/// `finished` without passing through `stopping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    Idle,
    Acquiring,
    Active,
    Stopping,
    Finished,
}

impl Default for RecorderState {
    fn default() -> Self {
        Self::Idle
    }
}

impl RecorderState {
    pub fn can_transition_to(self, next: RecorderState) -> bool {
        use RecorderState::*;

        matches!(
            (self, next),
            (Idle, Acquiring)
                | (Acquiring, Active)
                | (Acquiring, Stopping)
                | (Active, Stopping)
                | (Stopping, Finished)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == RecorderState::Finished
    }
}
