use ash::vk;
use crate::renderer::core::context::RenderContext;
use crate::renderer::frame_ctx::FrameBackend;

/// RGBA clear value in the swapchain's color space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl From<[f32; 4]> for ClearColor {
    fn from([r, g, b, a]: [f32; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl From<ClearColor> for vk::ClearColorValue {
    fn from(color: ClearColor) -> Self {
        vk::ClearColorValue {
            float32: [color.r, color.g, color.b, color.a],
        }
    }
}

/// Recording scope handed to the draw callback.
///
/// Lives only while the frame's command buffer is recording, which is what
/// makes `clear_screen` unreachable outside a draw callback. The swapchain
/// image layout is tracked so the image always reaches `PRESENT_SRC_KHR`
/// before submission, whatever the callback recorded.
pub struct Frame<'a, B = RenderContext> {
    backend: &'a B,
    command_buffer: vk::CommandBuffer,
    image_index: u32,
    layout: vk::ImageLayout,
}

impl<'a, B: FrameBackend> Frame<'a, B> {
    pub(crate) fn new(
        backend: &'a B,
        command_buffer: vk::CommandBuffer,
        image_index: u32,
    ) -> Self {
        Self {
            backend,
            command_buffer,
            image_index,
            layout: vk::ImageLayout::UNDEFINED,
        }
    }

    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    pub fn image(&self) -> vk::Image {
        self.backend.image(self.image_index)
    }

    pub fn image_view(&self) -> vk::ImageView {
        self.backend.image_view(self.image_index)
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.backend.extent()
    }

    pub fn layout(&self) -> vk::ImageLayout {
        self.layout
    }

    /// Clears the whole swapchain image of this frame.
    pub fn clear_screen(&mut self, color: ClearColor) {
        self.transition_to(vk::ImageLayout::TRANSFER_DST_OPTIMAL);
        self.backend.clear_image(self.command_buffer, self.image_index, color);
    }

    /// Records a layout transition for the swapchain image. Draw code that
    /// records its own commands uses this to keep the tracked layout accurate.
    pub fn transition_to(&mut self, layout: vk::ImageLayout) {
        if self.layout == layout {
            return;
        }
        self.backend.transition_image(self.command_buffer, self.image_index, self.layout, layout);
        self.layout = layout;
    }

    pub(crate) fn finish(mut self) {
        self.transition_to(vk::ImageLayout::PRESENT_SRC_KHR);
    }
}

impl Frame<'_, RenderContext> {
    /// Logical device, for recording commands beyond the built-in ones
    pub fn device(&self) -> &ash::Device {
        &self.backend.device.logical
    }
}
