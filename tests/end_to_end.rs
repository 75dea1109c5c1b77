//! Needs a display and a Vulkan driver. Runs on the main thread without the
//! test harness: `cargo test --test end_to_end -- --ignored`.

mod common;

use ash::vk;
use origami::{ClearColor, ContextConfig, Frame, LifecycleState, RenderError, Renderer};

fn main() {
    if !common::ignored_requested() {
        println!("end_to_end: ignored, requires a display and a Vulkan driver");
        return;
    }

    let _ = env_logger::builder().is_test(true).try_init();
    init_render_red_then_quit();
    println!("end_to_end: ok");
}

fn init_render_red_then_quit() {
    let config = ContextConfig::new("T", 320, 240).with_validation(false);
    let mut renderer = Renderer::new();
    renderer.init(&config).unwrap();
    assert!(renderer.is_running());

    let (device, readback, format) = {
        let context = renderer.context().unwrap();
        assert!(context.swapchain.image_count() >= 1);
        assert_eq!(context.swapchain.swapchain_images.len(), context.swapchain.swapchain_image_views.len());
        assert_eq!(context.command_pool.outstanding(), 0);

        let device = context.device.logical.clone();
        let readback = context.swapchain.swapchain_image_usage
            .contains(vk::ImageUsageFlags::TRANSFER_SRC)
            .then(|| {
                let memory_properties = unsafe {
                    context.instance.instance.get_physical_device_memory_properties(context.device.physical)
                };
                ReadbackBuffer::new(&device, &memory_properties, context.swapchain.swapchain_image_extent)
            });
        (device, readback, context.swapchain.surface_format.format)
    };

    let mut cleared_layout = vk::ImageLayout::UNDEFINED;
    renderer.render(|frame| {
        frame.clear_screen(ClearColor::RED);
        cleared_layout = frame.layout();
        if let Some(readback) = &readback {
            readback.record_copy(frame);
        }
    }).unwrap();

    assert_eq!(cleared_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
    assert_eq!(renderer.context().unwrap().command_pool.outstanding(), 0);

    match readback {
        Some(readback) => {
            let texels = readback.read(&device);
            let red = red_texel(format);
            assert!(!texels.is_empty());
            for (i, texel) in texels.chunks_exact(4).enumerate() {
                assert_eq!(texel, red, "texel {i} is not red");
            }
            readback.destroy(&device);
        }
        None => println!("end_to_end: swapchain images are not transfer sources, pixels not checked"),
    }
    drop(device);

    renderer.quit().unwrap();
    assert_eq!(renderer.state(), LifecycleState::Released);
    assert!(renderer.context().is_none());

    let err = renderer.quit().unwrap_err();
    assert!(matches!(err.downcast_ref::<RenderError>(), Some(RenderError::AlreadyReleased)));
}

/// Byte order of opaque red in the swapchain formats surfaces hand out.
fn red_texel(format: vk::Format) -> [u8; 4] {
    match format {
        vk::Format::B8G8R8A8_SRGB | vk::Format::B8G8R8A8_UNORM => [0, 0, 255, 255],
        vk::Format::R8G8B8A8_SRGB | vk::Format::R8G8B8A8_UNORM => [255, 0, 0, 255],
        other => panic!("no texel layout for {other:?}"),
    }
}

/// Host-visible buffer the frame's swapchain image is copied into.
struct ReadbackBuffer {
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
    extent: vk::Extent2D,
}

impl ReadbackBuffer {
    fn new(
        device: &ash::Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        extent: vk::Extent2D,
    ) -> Self {
        let size = u64::from(extent.width) * u64::from(extent.height) * 4;
        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(vk::BufferUsageFlags::TRANSFER_DST)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let buffer = unsafe { device.create_buffer(&buffer_info, None) }.unwrap();

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let wanted = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        let memory_type_index = (0..memory_properties.memory_type_count)
            .find(|&i| {
                requirements.memory_type_bits & (1 << i) != 0
                    && memory_properties.memory_types[i as usize].property_flags.contains(wanted)
            })
            .expect("no host visible memory type");

        let allocate_info = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);
        let memory = unsafe { device.allocate_memory(&allocate_info, None) }.unwrap();
        unsafe { device.bind_buffer_memory(buffer, memory, 0) }.unwrap();

        Self {
            buffer,
            memory,
            size,
            extent,
        }
    }

    fn record_copy(&self, frame: &mut Frame<'_>) {
        assert_eq!(frame.extent(), self.extent);
        frame.transition_to(vk::ImageLayout::TRANSFER_SRC_OPTIMAL);

        let region = vk::BufferImageCopy::default()
            .image_subresource(
                vk::ImageSubresourceLayers::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .layer_count(1),
            )
            .image_extent(vk::Extent3D {
                width: self.extent.width,
                height: self.extent.height,
                depth: 1,
            });
        let host_barrier = vk::MemoryBarrier::default()
            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .dst_access_mask(vk::AccessFlags::HOST_READ);

        let device = frame.device();
        unsafe {
            device.cmd_copy_image_to_buffer(
                frame.command_buffer(),
                frame.image(),
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                self.buffer,
                &[region],
            );
            device.cmd_pipeline_barrier(
                frame.command_buffer(),
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::HOST,
                vk::DependencyFlags::empty(),
                &[host_barrier],
                &[],
                &[],
            );
        }
    }

    /// Only valid once the frame has completed, which `render` waits for.
    fn read(&self, device: &ash::Device) -> Vec<u8> {
        unsafe {
            let ptr = device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())
                .unwrap();
            let texels = std::slice::from_raw_parts(ptr as *const u8, self.size as usize).to_vec();
            device.unmap_memory(self.memory);
            texels
        }
    }

    fn destroy(self, device: &ash::Device) {
        unsafe {
            device.destroy_buffer(self.buffer, None);
            device.free_memory(self.memory, None);
        }
    }
}
