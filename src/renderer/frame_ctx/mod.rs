mod frame;

pub use frame::{ClearColor, Frame};

use ash::vk;
use color_eyre::Result;
use crate::renderer::error::RenderError;

/// Blocking timeout for the second acquire attempt, after the non-blocking one came back empty
pub const ACQUIRE_RETRY_TIMEOUT_NS: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquiredImage {
    Ready { index: u32, suboptimal: bool },
    /// `NOT_READY` or `TIMEOUT`; the acquire semaphore was not signaled.
    NotReady,
}

/// GPU operations the per-frame protocol is made of.
///
/// Responsibilities:
/// - Own the swapchain, the command pool, and the two frame semaphores
/// - Wait on / signal the semaphores in `submit` and `present`
pub trait FrameBackend {
    fn acquire_next_image(&mut self, timeout_ns: u64) -> Result<AcquiredImage>;
    fn allocate_command_buffer(&mut self) -> Result<vk::CommandBuffer>;
    fn free_command_buffer(&mut self, command_buffer: vk::CommandBuffer);

    fn begin_commands(&self, command_buffer: vk::CommandBuffer) -> Result<()>;
    fn end_commands(&self, command_buffer: vk::CommandBuffer) -> Result<()>;
    fn transition_image(
        &self,
        command_buffer: vk::CommandBuffer,
        image_index: u32,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
    );
    fn clear_image(&self, command_buffer: vk::CommandBuffer, image_index: u32, color: ClearColor);

    fn submit(&self, command_buffer: vk::CommandBuffer) -> Result<()>;
    fn present(&self, image_index: u32) -> Result<()>;
    fn wait_idle(&self) -> Result<()>;

    fn image(&self, image_index: u32) -> vk::Image;
    fn image_view(&self, image_index: u32) -> vk::ImageView;
    fn extent(&self) -> vk::Extent2D;
}

/// Runs one full frame: acquire, record `draw`, submit, present, then wait
/// for the device to go idle and free the frame's command buffer.
///
/// The command buffer is freed even when recording, submission, or
/// presentation failed. Returns the index of the presented image.
pub fn drive_frame<B, F>(backend: &mut B, draw: F) -> Result<u32>
where
    B: FrameBackend,
    F: FnOnce(&mut Frame<'_, B>),
{
    let image_index = acquire_image(backend)?;
    let command_buffer = backend.allocate_command_buffer()?;

    let submitted = record_and_submit(backend, command_buffer, image_index, draw);

    // Nothing is in flight after this, so the buffer can go
    let idle = backend.wait_idle();
    backend.free_command_buffer(command_buffer);

    submitted?;
    idle?;
    Ok(image_index)
}

fn acquire_image<B: FrameBackend>(backend: &mut B) -> Result<u32> {
    for timeout_ns in [0, ACQUIRE_RETRY_TIMEOUT_NS] {
        match backend.acquire_next_image(timeout_ns)? {
            AcquiredImage::Ready { index, suboptimal } => {
                if suboptimal {
                    log::debug!("Swapchain is suboptimal for the surface");
                }
                return Ok(index);
            }
            AcquiredImage::NotReady => {
                log::debug!("No presentable image within {} ns", timeout_ns);
            }
        }
    }

    Err(RenderError::AcquireTimeout.into())
}

fn record_and_submit<B, F>(
    backend: &B,
    command_buffer: vk::CommandBuffer,
    image_index: u32,
    draw: F,
) -> Result<()>
where
    B: FrameBackend,
    F: FnOnce(&mut Frame<'_, B>),
{
    backend.begin_commands(command_buffer)?;

    let mut frame = Frame::new(backend, command_buffer, image_index);
    draw(&mut frame);
    frame.finish();

    backend.end_commands(command_buffer)?;
    backend.submit(command_buffer)?;
    backend.present(image_index)
}
