use ash::vk;

use crate::{vk_enum, vk_flags};

vk_enum! {
    #[derive(Default)]
    pub enum ImageLayout: vk::ImageLayout {
        /// Contents are undefined. As a requested layout it means "don't care".
        #[default]
        Undefined = UNDEFINED,
        General = GENERAL,
        ColorAttachmentOptimal = COLOR_ATTACHMENT_OPTIMAL,
        DepthStencilAttachmentOptimal = DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        DepthStencilReadOnlyOptimal = DEPTH_STENCIL_READ_ONLY_OPTIMAL,
        DepthAttachmentOptimal = DEPTH_ATTACHMENT_OPTIMAL,
        DepthReadOnlyOptimal = DEPTH_READ_ONLY_OPTIMAL,
        ShaderReadOnlyOptimal = SHADER_READ_ONLY_OPTIMAL,
        TransferSrcOptimal = TRANSFER_SRC_OPTIMAL,
        TransferDstOptimal = TRANSFER_DST_OPTIMAL,
        Preinitialized = PREINITIALIZED,
        PresentSrcKhr = PRESENT_SRC_KHR,
    }
}

impl ImageLayout {
    /// Returns `true` if this is [`ImageLayout::Undefined`].
    #[inline]
    pub const fn is_undefined(self) -> bool {
        matches!(self, Self::Undefined)
    }
}

vk_flags! {
    pub struct AccessFlags2: vk::AccessFlags2 {
        NONE,
        INDIRECT_COMMAND_READ,
        INDEX_READ,
        VERTEX_ATTRIBUTE_READ,
        UNIFORM_READ,
        INPUT_ATTACHMENT_READ,
        SHADER_READ,
        SHADER_WRITE,
        SHADER_SAMPLED_READ,
        SHADER_STORAGE_READ,
        SHADER_STORAGE_WRITE,
        COLOR_ATTACHMENT_READ,
        COLOR_ATTACHMENT_WRITE,
        DEPTH_STENCIL_ATTACHMENT_READ,
        DEPTH_STENCIL_ATTACHMENT_WRITE,
        TRANSFER_READ,
        TRANSFER_WRITE,
        HOST_READ,
        HOST_WRITE,
        MEMORY_READ,
        MEMORY_WRITE,
    }
}

vk_flags! {
    pub struct PipelineStageFlags2: vk::PipelineStageFlags2 {
        NONE,
        TOP_OF_PIPE,
        DRAW_INDIRECT,
        VERTEX_INPUT,
        VERTEX_SHADER,
        TESSELLATION_CONTROL_SHADER,
        TESSELLATION_EVALUATION_SHADER,
        GEOMETRY_SHADER,
        FRAGMENT_SHADER,
        EARLY_FRAGMENT_TESTS,
        LATE_FRAGMENT_TESTS,
        COLOR_ATTACHMENT_OUTPUT,
        COMPUTE_SHADER,
        ALL_COMMANDS,
        ALL_GRAPHICS,
        TRANSFER,
        BOTTOM_OF_PIPE,
        HOST,
    }
}

vk_flags! {
    pub struct ImageAspectFlags: vk::ImageAspectFlags {
        COLOR,
        DEPTH,
        STENCIL,
        METADATA,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSubresourceRange {
    pub aspect_mask: ImageAspectFlags,
    pub base_mip_level: u32,
    pub level_count: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

impl ImageSubresourceRange {
    pub fn new(
        aspect_mask: ImageAspectFlags,
        base_mip_level: u32,
        level_count: u32,
        base_array_layer: u32,
        layer_count: u32,
    ) -> Self {
        Self {
            aspect_mask,
            base_mip_level,
            level_count,
            base_array_layer,
            layer_count,
        }
    }

    pub fn to_vk(self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: self.aspect_mask.to_vk(),
            base_mip_level: self.base_mip_level,
            level_count: self.level_count,
            base_array_layer: self.base_array_layer,
            layer_count: self.layer_count,
        }
    }
}

/// A barrier on a range of a buffer.
///
/// `B` is whatever the recorder uses to identify buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferMemoryBarrier2<B> {
    pub buffer: B,
    pub src_stage_mask: PipelineStageFlags2,
    pub src_access_mask: AccessFlags2,
    pub dst_stage_mask: PipelineStageFlags2,
    pub dst_access_mask: AccessFlags2,
    pub offset: u64,
    pub size: u64,
}

impl BufferMemoryBarrier2<vk::Buffer> {
    pub fn to_vk(self) -> vk::BufferMemoryBarrier2<'static> {
        vk::BufferMemoryBarrier2::default()
            .buffer(self.buffer)
            .src_stage_mask(self.src_stage_mask.to_vk())
            .src_access_mask(self.src_access_mask.to_vk())
            .dst_stage_mask(self.dst_stage_mask.to_vk())
            .dst_access_mask(self.dst_access_mask.to_vk())
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .offset(self.offset)
            .size(self.size)
    }
}

/// A barrier on a subresource range of an image, optionally changing its layout.
///
/// `I` is whatever the recorder uses to identify images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMemoryBarrier2<I> {
    pub image: I,
    pub subresource_range: ImageSubresourceRange,
    pub src_stage_mask: PipelineStageFlags2,
    pub src_access_mask: AccessFlags2,
    pub dst_stage_mask: PipelineStageFlags2,
    pub dst_access_mask: AccessFlags2,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
}

impl<I> ImageMemoryBarrier2<I> {
    /// Returns `true` if the barrier changes the image layout.
    #[inline]
    pub fn is_layout_transition(&self) -> bool {
        self.old_layout != self.new_layout
    }
}

impl ImageMemoryBarrier2<vk::Image> {
    pub fn to_vk(self) -> vk::ImageMemoryBarrier2<'static> {
        vk::ImageMemoryBarrier2::default()
            .image(self.image)
            .subresource_range(self.subresource_range.to_vk())
            .src_stage_mask(self.src_stage_mask.to_vk())
            .src_access_mask(self.src_access_mask.to_vk())
            .dst_stage_mask(self.dst_stage_mask.to_vk())
            .dst_access_mask(self.dst_access_mask.to_vk())
            .old_layout(self.old_layout.to_vk())
            .new_layout(self.new_layout.to_vk())
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
    }
}
