use crate::renderer::error::RenderError;

/// Where the renderer is in its `init` -> `quit` sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Running,
    Stopped,
    /// Everything was destroyed by `quit`. Terminal.
    Released,
}

impl LifecycleState {
    pub fn is_running(self) -> bool {
        self == LifecycleState::Running
    }

    pub fn ensure_can_init(self) -> Result<(), RenderError> {
        match self {
            LifecycleState::Uninitialized => Ok(()),
            LifecycleState::Released => Err(RenderError::AlreadyReleased),
            state => Err(RenderError::InvalidState { operation: "init", state }),
        }
    }

    /// Returns whether the frame-level operation should actually do work.
    ///
    /// A stopped renderer skips quietly so the iteration that observed the
    /// exit request can finish.
    pub fn ensure_can_drive(self, operation: &'static str) -> Result<bool, RenderError> {
        match self {
            LifecycleState::Running => Ok(true),
            LifecycleState::Stopped => Ok(false),
            state => Err(RenderError::InvalidState { operation, state }),
        }
    }

    pub fn ensure_can_quit(self) -> Result<(), RenderError> {
        match self {
            LifecycleState::Running | LifecycleState::Stopped => Ok(()),
            LifecycleState::Released => Err(RenderError::AlreadyReleased),
            state => Err(RenderError::InvalidState { operation: "quit", state }),
        }
    }
}
