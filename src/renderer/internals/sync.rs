use std::sync::Arc;
use ash::vk;
use color_eyre::Result;

/// The two binary semaphores of the single frame in flight
pub struct FrameSync {
    // Signals when the swapchain image has been acquired.
    pub image_acquired: vk::Semaphore,

    // Signals when the submitted rendering commands have finished.
    pub render_finished: vk::Semaphore,

    device: Arc<ash::Device>,
}

impl FrameSync {
    pub fn new(device: Arc<ash::Device>) -> Result<Self> {
        let image_acquired = unsafe {
            device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None)?
        };
        let render_finished = match unsafe {
            device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
        } {
            Ok(semaphore) => semaphore,
            Err(e) => {
                unsafe { device.destroy_semaphore(image_acquired, None) };
                return Err(e.into());
            }
        };
        log::info!("Created frame semaphores");

        Ok(Self {
            image_acquired,
            render_finished,
            device,
        })
    }
}

impl Drop for FrameSync {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.render_finished, None);
            self.device.destroy_semaphore(self.image_acquired, None);
        }
        log::debug!("Destroyed frame semaphores");
    }
}
