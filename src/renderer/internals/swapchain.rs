use std::sync::Arc;
use ash::vk;
use color_eyre::Result;
use winit::dpi::PhysicalSize;
use crate::renderer::core::device::RenderDevice;
use crate::renderer::core::instance::RenderInstance;
use crate::renderer::core::surface::RenderSurface;
use crate::renderer::error::RenderError;
use crate::renderer::vk::util::COLOR_SUBRESOURCE_RANGE;

pub struct Swapchain {
    pub swapchain: vk::SwapchainKHR,
    pub swapchain_loader: ash::khr::swapchain::Device,
    pub swapchain_present_mode: vk::PresentModeKHR,
    pub swapchain_images: Vec<vk::Image>,
    pub swapchain_image_views: Vec<vk::ImageView>,
    pub swapchain_image_extent: vk::Extent2D,
    pub swapchain_image_usage: vk::ImageUsageFlags,
    pub surface_format: vk::SurfaceFormatKHR,

    device: Arc<ash::Device>,
}

impl Swapchain {
    pub fn new(
        surface: &RenderSurface,
        window_size: PhysicalSize<u32>,
        ins: &RenderInstance,
        dev: &RenderDevice,
    ) -> Result<Self> {
        let surface_capabilities = surface.capabilities(dev.physical)?;
        let surface_format = choose_surface_format(&surface.formats(dev.physical)?)?;
        let present_mode = choose_present_mode(&surface.present_modes(dev.physical)?);

        let image_extent = choose_image_extent(&surface_capabilities, window_size);
        let min_image_count = choose_image_count(&surface_capabilities);
        let composite_alpha = choose_composite_alpha(surface_capabilities.supported_composite_alpha);
        let image_usage = choose_image_usage(surface_capabilities.supported_usage_flags)?;

        let swapchain_loader = ash::khr::swapchain::Device::new(
            &ins.instance,
            &dev.logical,
        );
        let swapchain_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface.surface)
            .min_image_count(min_image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(image_extent)
            .image_usage(image_usage)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(surface_capabilities.current_transform)
            .composite_alpha(composite_alpha)
            .present_mode(present_mode)
            .clipped(true)
            .image_array_layers(1);

        let swapchain = unsafe {
            swapchain_loader.create_swapchain(&swapchain_info, None)?
        };

        let mut sc = Self {
            swapchain,
            swapchain_loader,
            swapchain_present_mode: present_mode,
            swapchain_images: Vec::new(),
            swapchain_image_views: Vec::new(),
            swapchain_image_extent: image_extent,
            swapchain_image_usage: image_usage,
            surface_format,
            device: dev.logical.clone(),
        };
        sc.create_swapchain_images()?;

        log::info!(
            "Created swapchain: {} images, {:?}, {:?}, {}x{}",
            sc.swapchain_images.len(),
            surface_format.format,
            present_mode,
            image_extent.width,
            image_extent.height,
        );

        Ok(sc)
    }

    pub fn image_count(&self) -> usize {
        self.swapchain_images.len()
    }

    fn create_swapchain_images(&mut self) -> Result<()> {
        self.swapchain_images = unsafe {
            self.swapchain_loader.get_swapchain_images(self.swapchain)?
        };

        // Views are pushed one by one so Drop releases the ones already created
        for image in &self.swapchain_images {
            let view_info = vk::ImageViewCreateInfo::default()
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(self.surface_format.format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::R,
                    g: vk::ComponentSwizzle::G,
                    b: vk::ComponentSwizzle::B,
                    a: vk::ComponentSwizzle::A,
                })
                .subresource_range(COLOR_SUBRESOURCE_RANGE)
                .image(*image);
            let view = unsafe {
                self.device.create_image_view(&view_info, None)?
            };
            self.swapchain_image_views.push(view);
        }

        Ok(())
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for view in self.swapchain_image_views.drain(..) {
                self.device.destroy_image_view(view, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
        log::debug!("Destroyed swapchain");
    }
}

/// 8-bit BGRA sRGB when offered. Otherwise the first offered format.
pub fn choose_surface_format(
    formats: &[vk::SurfaceFormatKHR],
) -> Result<vk::SurfaceFormatKHR, RenderError> {
    if let Some(format) = formats
        .iter()
        .find(|format| format.format == vk::Format::B8G8R8A8_SRGB)
    {
        return Ok(*format);
    }

    let fallback = formats.first().ok_or(RenderError::NoSurfaceFormat)?;
    log::warn!(
        "B8G8R8A8_SRGB not offered by the surface, falling back to {:?}",
        fallback.format,
    );
    Ok(*fallback)
}

/// Mailbox when offered anywhere in the list, FIFO otherwise (always available).
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    present_modes
        .iter()
        .copied()
        .find(|mode| *mode == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// One more than the minimum, clamped when the surface has a maximum (0 means none).
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let min = capabilities.min_image_count;
    let max = capabilities.max_image_count;
    if max > 0 && min + 1 > max {
        max
    } else {
        min + 1
    }
}

pub fn choose_image_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    window_size: PhysicalSize<u32>,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    // The surface lets the swapchain decide
    vk::Extent2D {
        width: window_size.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: window_size.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// Color attachment plus transfer destination, which `clear_screen` needs.
/// Transfer source is added when offered so frames can be read back.
pub fn choose_image_usage(
    supported: vk::ImageUsageFlags,
) -> Result<vk::ImageUsageFlags, RenderError> {
    let required = vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST;
    if !supported.contains(required) {
        return Err(RenderError::UnsupportedImageUsage {
            required,
            supported,
        });
    }

    Ok(required | (supported & vk::ImageUsageFlags::TRANSFER_SRC))
}

pub fn choose_composite_alpha(supported: vk::CompositeAlphaFlagsKHR) -> vk::CompositeAlphaFlagsKHR {
    [
        vk::CompositeAlphaFlagsKHR::OPAQUE,
        vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::INHERIT,
    ]
        .into_iter()
        .find(|alpha| supported.contains(*alpha))
        .unwrap_or(vk::CompositeAlphaFlagsKHR::OPAQUE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: vk::Format) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    fn capabilities(min: u32, max: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min,
            max_image_count: max,
            current_extent: vk::Extent2D { width: 320, height: 240 },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
            ..Default::default()
        }
    }

    #[test]
    fn mailbox_beats_fifo_listed_first() {
        let modes = [
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::IMMEDIATE,
            vk::PresentModeKHR::MAILBOX,
        ];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn fifo_without_mailbox() {
        let modes = [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
        assert_eq!(choose_present_mode(&[]), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn bgra_srgb_is_selected_wherever_it_is() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM),
            format(vk::Format::B8G8R8A8_UNORM),
            format(vk::Format::B8G8R8A8_SRGB),
        ];
        assert_eq!(choose_surface_format(&formats).unwrap().format, vk::Format::B8G8R8A8_SRGB);

        let formats = [
            format(vk::Format::B8G8R8A8_SRGB),
            format(vk::Format::R8G8B8A8_UNORM),
        ];
        assert_eq!(choose_surface_format(&formats).unwrap().format, vk::Format::B8G8R8A8_SRGB);
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM),
            format(vk::Format::B8G8R8A8_UNORM),
        ];
        assert_eq!(choose_surface_format(&formats).unwrap().format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn no_formats_is_an_error() {
        assert!(matches!(choose_surface_format(&[]), Err(RenderError::NoSurfaceFormat)));
    }

    #[test]
    fn image_count_is_min_plus_one() {
        assert_eq!(choose_image_count(&capabilities(2, 8)), 3);
    }

    #[test]
    fn image_count_is_clamped_to_max() {
        assert_eq!(choose_image_count(&capabilities(3, 3)), 3);
    }

    #[test]
    fn image_count_unbounded_when_max_is_zero() {
        assert_eq!(choose_image_count(&capabilities(4, 0)), 5);
    }

    #[test]
    fn extent_follows_surface() {
        let extent = choose_image_extent(&capabilities(2, 0), PhysicalSize::new(800, 600));
        assert_eq!((extent.width, extent.height), (320, 240));
    }

    #[test]
    fn undefined_extent_uses_clamped_window_size() {
        let mut caps = capabilities(2, 0);
        caps.current_extent = vk::Extent2D { width: u32::MAX, height: u32::MAX };
        caps.max_image_extent = vk::Extent2D { width: 1024, height: 512 };

        let extent = choose_image_extent(&caps, PhysicalSize::new(2000, 300));
        assert_eq!((extent.width, extent.height), (1024, 300));
    }

    #[test]
    fn image_usage_requires_transfer_dst() {
        let supported = vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED;
        assert!(matches!(
            choose_image_usage(supported),
            Err(RenderError::UnsupportedImageUsage { supported: s, .. }) if s == supported
        ));
    }

    #[test]
    fn image_usage_adds_transfer_src_only_when_offered() {
        let base = vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST;
        assert_eq!(choose_image_usage(base | vk::ImageUsageFlags::STORAGE).unwrap(), base);
        assert_eq!(
            choose_image_usage(base | vk::ImageUsageFlags::TRANSFER_SRC).unwrap(),
            base | vk::ImageUsageFlags::TRANSFER_SRC,
        );
    }

    #[test]
    fn composite_alpha_prefers_opaque() {
        let supported = vk::CompositeAlphaFlagsKHR::INHERIT | vk::CompositeAlphaFlagsKHR::OPAQUE;
        assert_eq!(choose_composite_alpha(supported), vk::CompositeAlphaFlagsKHR::OPAQUE);
        assert_eq!(
            choose_composite_alpha(vk::CompositeAlphaFlagsKHR::INHERIT),
            vk::CompositeAlphaFlagsKHR::INHERIT,
        );
    }
}
