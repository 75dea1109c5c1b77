//! "Internals" are the Vulkan objects the context owns but never exposes to draw code.

pub mod command_pool;
pub mod swapchain;
pub mod sync;
