use std::ffi::c_char;
use std::sync::Arc;
use ash::vk;
use color_eyre::Result;
use crate::renderer::core::instance::RenderInstance;
use crate::renderer::core::queue::{Queue, QueueFamily};
use crate::renderer::core::surface::RenderSurface;
use crate::renderer::error::RenderError;

/// What device selection needs to know about the GPUs of an instance
pub trait AdapterSource {
    fn physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>>;
    fn queue_families(&self, device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties>;
    fn supports_present(&self, device: vk::PhysicalDevice, queue_family_index: u32) -> Result<bool>;
    fn device_name(&self, device: vk::PhysicalDevice) -> String;
}

/// Adapters of a live instance, judged against one surface
pub struct SurfaceAdapters<'a> {
    pub instance: &'a ash::Instance,
    pub surface: &'a RenderSurface,
}

impl AdapterSource for SurfaceAdapters<'_> {
    fn physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>> {
        Ok(unsafe { self.instance.enumerate_physical_devices()? })
    }

    fn queue_families(&self, device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        unsafe { self.instance.get_physical_device_queue_family_properties(device) }
    }

    fn supports_present(&self, device: vk::PhysicalDevice, queue_family_index: u32) -> Result<bool> {
        self.surface.supports_present(device, queue_family_index)
    }

    fn device_name(&self, device: vk::PhysicalDevice) -> String {
        let props = unsafe { self.instance.get_physical_device_properties(device) };
        props
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| String::from("<unnamed>"))
    }
}

/// Picks the first device, in enumeration order, with a queue family that can
/// both draw and present. No ranking between device types.
pub fn choose_physical_device(
    adapters: &impl AdapterSource,
) -> Result<(vk::PhysicalDevice, QueueFamily)> {
    for device in adapters.physical_devices()? {
        let families = adapters.queue_families(device);

        for (index, properties) in families.iter().enumerate() {
            let index = index as u32;
            if !properties.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                continue;
            }
            if adapters.supports_present(device, index)? {
                log::info!(
                    "Selected physical device (`{}`), queue family {}",
                    adapters.device_name(device),
                    index,
                );
                return Ok((device, QueueFamily::new(index, *properties, true)));
            }
        }

        log::warn!(
            "Skipping physical device (`{}`): no queue family with graphics and present support",
            adapters.device_name(device),
        );
    }

    Err(RenderError::NoSuitableDevice.into())
}

/// Logical device with its single graphics/present queue
pub struct RenderDevice {
    pub logical: Arc<ash::Device>,
    pub physical: vk::PhysicalDevice,
    pub graphics_queue: Queue,
}

impl RenderDevice {
    pub fn new(
        ins: &RenderInstance,
        physical_device: vk::PhysicalDevice,
        graphics_queue_family: QueueFamily,
    ) -> Result<Self> {
        let queue_priorities = [1.0];
        let queue_create_infos = [
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_queue_family.index)
                .queue_priorities(&queue_priorities),
        ];

        let enabled_extension_names = Self::get_required_device_extensions()
            .iter()
            .map(|ext| ext.as_ptr())
            .collect::<Vec<*const c_char>>();
        let enabled_features = vk::PhysicalDeviceFeatures::default();

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&enabled_extension_names)
            .enabled_features(&enabled_features);

        let device = unsafe {
            ins.instance.create_device(physical_device, &device_create_info, None)?
        };

        let graphics_queue = unsafe {
            let queue = device.get_device_queue(graphics_queue_family.index, 0);
            Queue::new(graphics_queue_family, queue)
        };
        log::info!("Created logical device");

        Ok(Self {
            logical: Arc::new(device),
            physical: physical_device,
            graphics_queue,
        })
    }

    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.logical.device_wait_idle()?;
        }
        Ok(())
    }

    fn get_required_device_extensions() -> Vec<&'static std::ffi::CStr> {
        vec![
            ash::khr::swapchain::NAME,

            #[cfg(target_os = "macos")]
            ash::khr::portability_subset::NAME,
        ]
    }
}

impl Drop for RenderDevice {
    fn drop(&mut self) {
        unsafe {
            self.logical.destroy_device(None);
        }
        log::debug!("Destroyed logical device");
    }
}
