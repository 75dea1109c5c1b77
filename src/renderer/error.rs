use thiserror::Error;
use crate::renderer::lifecycle::LifecycleState;

/// Failures the renderer reports with a type of their own.
///
/// They travel inside a `color_eyre::Report` like every other error, so callers
/// that care about a specific case can `downcast_ref::<RenderError>()`.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Window creation failed: {0}")]
    WindowCreation(String),

    #[error("Event loop exited before the window was created")]
    EventLoopExited,

    #[error("No physical device exposes a queue family with graphics and present support")]
    NoSuitableDevice,

    #[error("Surface reports no formats")]
    NoSurfaceFormat,

    #[error("Surface image usage {supported:?} lacks {required:?}")]
    UnsupportedImageUsage {
        required: ash::vk::ImageUsageFlags,
        supported: ash::vk::ImageUsageFlags,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(&'static str),

    #[error("`{operation}` is not allowed while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },

    #[error("Renderer resources were already released")]
    AlreadyReleased,

    #[error("Timed out waiting for a presentable image")]
    AcquireTimeout,

    #[error("Swapchain is out of date")]
    SwapchainOutOfDate,
}
