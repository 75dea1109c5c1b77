use ash::vk;
use color_eyre::Result;
use winit::window::Window;
use crate::platform::Platform;
use crate::renderer::core::instance::RenderInstance;

/// Presentation surface bound to the window. Destroyed before the window and the instance.
pub struct RenderSurface {
    pub surface: vk::SurfaceKHR,
    pub surface_loader: ash::khr::surface::Instance,
}

impl RenderSurface {
    pub fn new(
        ins: &RenderInstance,
        platform: &Platform,
        window: &Window,
    ) -> Result<Self> {
        let surface = platform.create_surface(&ins.entry, &ins.instance, window)?;
        let surface_loader = ash::khr::surface::Instance::new(&ins.entry, &ins.instance);
        log::info!("Created window surface");

        Ok(Self {
            surface,
            surface_loader,
        })
    }

    pub fn supports_present(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> Result<bool> {
        Ok(unsafe {
            self.surface_loader.get_physical_device_surface_support(
                physical_device,
                queue_family_index,
                self.surface,
            )?
        })
    }

    pub fn capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<vk::SurfaceCapabilitiesKHR> {
        Ok(unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)?
        })
    }

    pub fn formats(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::SurfaceFormatKHR>> {
        Ok(unsafe {
            self.surface_loader
                .get_physical_device_surface_formats(physical_device, self.surface)?
        })
    }

    pub fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::PresentModeKHR>> {
        Ok(unsafe {
            self.surface_loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)?
        })
    }
}

impl Drop for RenderSurface {
    fn drop(&mut self) {
        unsafe {
            self.surface_loader.destroy_surface(self.surface, None);
        }
        log::debug!("Destroyed window surface");
    }
}
