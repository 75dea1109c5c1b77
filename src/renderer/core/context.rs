use std::sync::Arc;
use ash::vk;
use color_eyre::Result;
use winit::window::Window;
use crate::platform::Platform;
use crate::renderer::config::ContextConfig;
use crate::renderer::core::device::{choose_physical_device, RenderDevice, SurfaceAdapters};
use crate::renderer::core::instance::RenderInstance;
use crate::renderer::core::surface::RenderSurface;
use crate::renderer::error::RenderError;
use crate::renderer::frame_ctx::{AcquiredImage, ClearColor, FrameBackend};
use crate::renderer::internals::command_pool::CommandPool;
use crate::renderer::internals::swapchain::Swapchain;
use crate::renderer::internals::sync::FrameSync;
use crate::renderer::vk::util;

/// Contains every Vulkan object the renderer owns, plus the window they present to.
///
/// Fields are dropped in declaration order, which is the reverse of creation
/// order: children always go before the object they were created from.
pub struct RenderContext {
    pub sync: FrameSync,
    pub command_pool: CommandPool,
    pub swapchain: Swapchain,
    pub device: RenderDevice,
    pub surface: RenderSurface,
    pub window: Arc<Window>,
    pub instance: RenderInstance,

    pub image_index: u32,
}

impl RenderContext {
    pub fn new(
        config: &ContextConfig,
        platform: &mut Platform,
    ) -> Result<Self> {
        // Declared ahead of the window so an early return drops the window first
        let instance: RenderInstance;

        let window = platform.create_window(
            config.window_width,
            config.window_height,
            &config.application_name,
        )?;

        instance = RenderInstance::new(config, &platform.required_extensions()?)?;

        let surface = RenderSurface::new(&instance, platform, &window)?;

        let (physical_device, graphics_queue_family) = choose_physical_device(&SurfaceAdapters {
            instance: &instance.instance,
            surface: &surface,
        })?;

        let device = RenderDevice::new(&instance, physical_device, graphics_queue_family)?;

        let swapchain = Swapchain::new(&surface, window.inner_size(), &instance, &device)?;

        let command_pool = CommandPool::new(device.logical.clone(), &device.graphics_queue.family)?;

        let sync = FrameSync::new(device.logical.clone())?;

        Ok(Self {
            sync,
            command_pool,
            swapchain,
            device,
            surface,
            window,
            instance,
            image_index: 0,
        })
    }

    pub fn graphics_queue_family_index(&self) -> u32 {
        self.device.graphics_queue.family.index
    }
}

impl Drop for RenderContext {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            log::error!("Failed to wait for device idle before teardown: {}", e);
        }
    }
}

impl FrameBackend for RenderContext {
    fn acquire_next_image(&mut self, timeout_ns: u64) -> Result<AcquiredImage> {
        let result = unsafe {
            self.swapchain.swapchain_loader.acquire_next_image(
                self.swapchain.swapchain,
                timeout_ns,
                self.sync.image_acquired,
                vk::Fence::null(),
            )
        };

        match result {
            Ok((index, suboptimal)) => {
                self.image_index = index;
                Ok(AcquiredImage::Ready { index, suboptimal })
            }
            Err(vk::Result::NOT_READY) | Err(vk::Result::TIMEOUT) => Ok(AcquiredImage::NotReady),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(RenderError::SwapchainOutOfDate.into()),
            Err(e) => Err(e.into()),
        }
    }

    fn allocate_command_buffer(&mut self) -> Result<vk::CommandBuffer> {
        self.command_pool.allocate()
    }

    fn free_command_buffer(&mut self, command_buffer: vk::CommandBuffer) {
        self.command_pool.free(command_buffer);
    }

    fn begin_commands(&self, command_buffer: vk::CommandBuffer) -> Result<()> {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            self.device.logical.begin_command_buffer(command_buffer, &begin_info)?;
        }
        Ok(())
    }

    fn end_commands(&self, command_buffer: vk::CommandBuffer) -> Result<()> {
        unsafe {
            self.device.logical.end_command_buffer(command_buffer)?;
        }
        Ok(())
    }

    fn transition_image(
        &self,
        command_buffer: vk::CommandBuffer,
        image_index: u32,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
    ) {
        util::transition_image_layout(
            command_buffer,
            self.image(image_index),
            old_layout,
            new_layout,
            &self.device.logical,
        );
    }

    fn clear_image(&self, command_buffer: vk::CommandBuffer, image_index: u32, color: ClearColor) {
        util::clear_color_image(
            command_buffer,
            self.image(image_index),
            color.into(),
            &self.device.logical,
        );
    }

    fn submit(&self, command_buffer: vk::CommandBuffer) -> Result<()> {
        let wait_semaphores = [self.sync.image_acquired];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [self.sync.render_finished];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device.logical.queue_submit(
                self.device.graphics_queue.handle,
                &[submit_info],
                vk::Fence::null(),
            )?;
        }
        Ok(())
    }

    fn present(&self, image_index: u32) -> Result<()> {
        let wait_semaphores = [self.sync.render_finished];
        let swapchains = [self.swapchain.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = unsafe {
            self.swapchain.swapchain_loader.queue_present(
                self.device.graphics_queue.handle,
                &present_info,
            )
        };

        match result {
            Ok(suboptimal) => {
                if suboptimal {
                    log::debug!("Presented to a suboptimal swapchain");
                }
                Ok(())
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Err(RenderError::SwapchainOutOfDate.into()),
            Err(e) => Err(e.into()),
        }
    }

    fn wait_idle(&self) -> Result<()> {
        self.device.wait_idle()
    }

    fn image(&self, image_index: u32) -> vk::Image {
        self.swapchain.swapchain_images[image_index as usize]
    }

    fn image_view(&self, image_index: u32) -> vk::ImageView {
        self.swapchain.swapchain_image_views[image_index as usize]
    }

    fn extent(&self) -> vk::Extent2D {
        self.swapchain.swapchain_image_extent
    }
}
