//! Minimal Vulkan bootstrap: open a window, pick a GPU, build a swapchain, and
//! drive a present loop with caller-supplied drawing.

pub mod platform;
pub mod renderer;

pub use renderer::Renderer;
pub use renderer::config::ContextConfig;
pub use renderer::error::RenderError;
pub use renderer::frame_ctx::{ClearColor, Frame};
pub use renderer::lifecycle::LifecycleState;
