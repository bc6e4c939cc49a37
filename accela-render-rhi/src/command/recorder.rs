use ash::vk;
use smallvec::SmallVec;

use crate::{
    DebugWrapper,
    command::{BufferMemoryBarrier2, ImageMemoryBarrier2},
};

/// Something that accepts synchronization commands for a command stream.
///
/// The render state tracker only ever talks to this trait, so it can be driven
/// by a real Vulkan command buffer or by a recording double in tests.
pub trait CommandRecorder {
    /// How the recorder identifies images.
    type Image: Copy;
    /// How the recorder identifies buffers.
    type Buffer: Copy;

    /// Records a single pipeline barrier covering all of the given barriers.
    fn pipeline_barrier(
        &mut self,
        image_barriers: &[ImageMemoryBarrier2<Self::Image>],
        buffer_barriers: &[BufferMemoryBarrier2<Self::Buffer>],
    );

    /// Records a pipeline barrier for a single image.
    fn image_barrier(&mut self, barrier: ImageMemoryBarrier2<Self::Image>) {
        self.pipeline_barrier(&[barrier], &[]);
    }

    /// Records a pipeline barrier for a single buffer range.
    fn buffer_barrier(&mut self, barrier: BufferMemoryBarrier2<Self::Buffer>) {
        self.pipeline_barrier(&[], &[barrier]);
    }
}

impl<R> CommandRecorder for &mut R
where
    R: CommandRecorder + ?Sized,
{
    type Image = R::Image;
    type Buffer = R::Buffer;

    fn pipeline_barrier(
        &mut self,
        image_barriers: &[ImageMemoryBarrier2<Self::Image>],
        buffer_barriers: &[BufferMemoryBarrier2<Self::Buffer>],
    ) {
        (**self).pipeline_barrier(image_barriers, buffer_barriers);
    }
}

/// Records synchronization commands into a Vulkan command buffer.
///
/// The command buffer must be in the recording state for as long as this
/// recorder is used. Requires Vulkan 1.3 (or `VK_KHR_synchronization2`).
pub struct VulkanCommandRecorder<'a> {
    device: &'a ash::Device,
    command_buffer: DebugWrapper<vk::CommandBuffer>,
}

impl<'a> VulkanCommandRecorder<'a> {
    pub fn new(device: &'a ash::Device, command_buffer: vk::CommandBuffer) -> Self {
        Self {
            device,
            command_buffer: DebugWrapper(command_buffer),
        }
    }
}

impl std::fmt::Debug for VulkanCommandRecorder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VulkanCommandRecorder")
            .field("command_buffer", &self.command_buffer)
            .finish()
    }
}

impl CommandRecorder for VulkanCommandRecorder<'_> {
    type Image = vk::Image;
    type Buffer = vk::Buffer;

    fn pipeline_barrier(
        &mut self,
        image_barriers: &[ImageMemoryBarrier2<vk::Image>],
        buffer_barriers: &[BufferMemoryBarrier2<vk::Buffer>],
    ) {
        if image_barriers.is_empty() && buffer_barriers.is_empty() {
            return;
        }

        let image_barriers_vk: SmallVec<[vk::ImageMemoryBarrier2; 4]> =
            image_barriers.iter().map(|b| b.to_vk()).collect();
        let buffer_barriers_vk: SmallVec<[vk::BufferMemoryBarrier2; 4]> =
            buffer_barriers.iter().map(|b| b.to_vk()).collect();

        let dependency_info = vk::DependencyInfo::default()
            .image_memory_barriers(&image_barriers_vk)
            .buffer_memory_barriers(&buffer_barriers_vk);

        unsafe {
            self.device
                .cmd_pipeline_barrier2(*self.command_buffer, &dependency_info);
        }
    }
}
