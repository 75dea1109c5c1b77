use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::OptionExt;
use color_eyre::Result;
use crate::renderer::core::queue::QueueFamily;

/// Command pool of the graphics queue family. Hands out short-lived primary
/// command buffers and remembers which ones are still outstanding.
pub struct CommandPool {
    pub command_pool: vk::CommandPool,
    allocated_command_buffers: Vec<vk::CommandBuffer>,
    device: Arc<ash::Device>,
}

impl CommandPool {
    pub fn new(
        device: Arc<ash::Device>,
        queue_family: &QueueFamily,
    ) -> Result<Self> {
        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family.index)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT);
        let command_pool = unsafe {
            device.create_command_pool(&pool_info, None)?
        };
        log::info!("Created command pool for queue family {}", queue_family.index);

        Ok(Self {
            command_pool,
            allocated_command_buffers: Vec::new(),
            device,
        })
    }

    pub fn allocate(&mut self) -> Result<vk::CommandBuffer> {
        let command_buffer_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.command_pool)
            .command_buffer_count(1)
            .level(vk::CommandBufferLevel::PRIMARY);
        let command_buffer = unsafe {
            self.device.allocate_command_buffers(&command_buffer_info)?
        }
            .into_iter()
            .next()
            .ok_or_eyre("Driver returned no command buffer")?;

        self.allocated_command_buffers.push(command_buffer);
        Ok(command_buffer)
    }

    pub fn free(&mut self, command_buffer: vk::CommandBuffer) {
        let Some(index) = self.allocated_command_buffers
            .iter()
            .position(|&cb| cb == command_buffer)
        else {
            log::warn!("Tried to free a command buffer this pool does not own: {:?}", command_buffer);
            return;
        };

        unsafe {
            self.device.free_command_buffers(self.command_pool, &[command_buffer]);
        }
        let _ = self.allocated_command_buffers.swap_remove(index);
    }

    pub fn outstanding(&self) -> usize {
        self.allocated_command_buffers.len()
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            if !self.allocated_command_buffers.is_empty() {
                log::warn!(
                    "Freeing {} command buffers still outstanding at teardown",
                    self.allocated_command_buffers.len(),
                );
                self.device.free_command_buffers(self.command_pool, &self.allocated_command_buffers);
                self.allocated_command_buffers.clear();
            }
            self.device.destroy_command_pool(self.command_pool, None);
        }
        log::debug!("Destroyed command pool");
    }
}
