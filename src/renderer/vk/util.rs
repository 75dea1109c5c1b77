use ash::vk;

/// Single mip, single layer color range. Presentable images never have more.
pub const COLOR_SUBRESOURCE_RANGE: vk::ImageSubresourceRange = vk::ImageSubresourceRange {
    aspect_mask: vk::ImageAspectFlags::COLOR,
    base_mip_level: 0,
    level_count: 1,
    base_array_layer: 0,
    layer_count: 1,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierMasks {
    pub src_stage: vk::PipelineStageFlags,
    pub src_access: vk::AccessFlags,
    pub dst_stage: vk::PipelineStageFlags,
    pub dst_access: vk::AccessFlags,
}

/// Stage and access masks for the layout changes a presentable image goes through.
///
/// Leaving `UNDEFINED` starts at `COLOR_ATTACHMENT_OUTPUT`, the stage the
/// acquire semaphore is waited on, so the barrier chains after the acquire.
pub fn layout_transition_masks(
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) -> BarrierMasks {
    let (src_stage, src_access) = match old_layout {
        vk::ImageLayout::UNDEFINED | vk::ImageLayout::PRESENT_SRC_KHR => (
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags::empty(),
        ),
        vk::ImageLayout::TRANSFER_DST_OPTIMAL => (
            vk::PipelineStageFlags::TRANSFER,
            vk::AccessFlags::TRANSFER_WRITE,
        ),
        // Reads leave nothing to make available
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL => (
            vk::PipelineStageFlags::TRANSFER,
            vk::AccessFlags::empty(),
        ),
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => (
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        ),
        _ => (
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::AccessFlags::MEMORY_WRITE,
        ),
    };

    let (dst_stage, dst_access) = match new_layout {
        vk::ImageLayout::TRANSFER_DST_OPTIMAL => (
            vk::PipelineStageFlags::TRANSFER,
            vk::AccessFlags::TRANSFER_WRITE,
        ),
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL => (
            vk::PipelineStageFlags::TRANSFER,
            vk::AccessFlags::TRANSFER_READ,
        ),
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => (
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        ),
        // Presentation is ordered by the submit semaphore, not the barrier
        vk::ImageLayout::PRESENT_SRC_KHR => (
            vk::PipelineStageFlags::BOTTOM_OF_PIPE,
            vk::AccessFlags::empty(),
        ),
        _ => (
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE,
        ),
    };

    BarrierMasks {
        src_stage,
        src_access,
        dst_stage,
        dst_access,
    }
}

pub fn transition_image_layout(
    cmd: vk::CommandBuffer,
    image: vk::Image,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
    device: &ash::Device,
) {
    if old_layout == new_layout {
        return;
    }

    let masks = layout_transition_masks(old_layout, new_layout);
    let image_barrier = vk::ImageMemoryBarrier::default()
        .src_access_mask(masks.src_access)
        .dst_access_mask(masks.dst_access)
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(COLOR_SUBRESOURCE_RANGE);

    unsafe {
        device.cmd_pipeline_barrier(
            cmd,
            masks.src_stage,
            masks.dst_stage,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[image_barrier],
        );
    }
}

pub fn clear_color_image(
    cmd: vk::CommandBuffer,
    image: vk::Image,
    color: vk::ClearColorValue,
    device: &ash::Device,
) {
    unsafe {
        device.cmd_clear_color_image(
            cmd,
            image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &color,
            &[COLOR_SUBRESOURCE_RANGE],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_to_transfer_chains_on_acquire_stage() {
        let masks = layout_transition_masks(
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );
        assert_eq!(masks.src_stage, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);
        assert_eq!(masks.src_access, vk::AccessFlags::empty());
        assert_eq!(masks.dst_stage, vk::PipelineStageFlags::TRANSFER);
        assert_eq!(masks.dst_access, vk::AccessFlags::TRANSFER_WRITE);
    }

    #[test]
    fn transfer_to_present_waits_for_clear() {
        let masks = layout_transition_masks(
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::PRESENT_SRC_KHR,
        );
        assert_eq!(masks.src_stage, vk::PipelineStageFlags::TRANSFER);
        assert_eq!(masks.src_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(masks.dst_stage, vk::PipelineStageFlags::BOTTOM_OF_PIPE);
        assert_eq!(masks.dst_access, vk::AccessFlags::empty());
    }

    #[test]
    fn clear_then_read_back_orders_write_before_read() {
        let masks = layout_transition_masks(
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        );
        assert_eq!(masks.src_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(masks.dst_stage, vk::PipelineStageFlags::TRANSFER);
        assert_eq!(masks.dst_access, vk::AccessFlags::TRANSFER_READ);

        let masks = layout_transition_masks(
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            vk::ImageLayout::PRESENT_SRC_KHR,
        );
        assert_eq!(masks.src_stage, vk::PipelineStageFlags::TRANSFER);
        assert_eq!(masks.src_access, vk::AccessFlags::empty());
    }

    #[test]
    fn undefined_to_present_has_no_access() {
        let masks = layout_transition_masks(
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::PRESENT_SRC_KHR,
        );
        assert_eq!(masks.src_access, vk::AccessFlags::empty());
        assert_eq!(masks.dst_access, vk::AccessFlags::empty());
    }
}
