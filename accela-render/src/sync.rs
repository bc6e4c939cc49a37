//! Synchronization vocabulary used to describe how render work touches resources.

use accela_render_rhi::command::{
    AccessFlags2, BufferMemoryBarrier2, CommandRecorder, ImageAspectFlags, ImageLayout, ImageMemoryBarrier2,
    ImageSubresourceRange, PipelineStageFlags2,
};

/// A pipeline stage and the memory access performed at it.
///
/// Describes either the latest point at which earlier work used a resource, or
/// the earliest point at which new work will.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BarrierPoint {
    pub stage: PipelineStageFlags2,
    pub access: AccessFlags2,
}

impl BarrierPoint {
    pub const fn new(stage: PipelineStageFlags2, access: AccessFlags2) -> Self {
        Self { stage, access }
    }

    /// The top of the pipe, with no memory access.
    pub const fn top_of_pipe() -> Self {
        Self::new(PipelineStageFlags2::TOP_OF_PIPE, AccessFlags2::NONE)
    }
}

/// A range of array layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layers {
    pub start_layer: u32,
    pub num_layers: u32,
}

impl Layers {
    pub const fn new(start_layer: u32, num_layers: u32) -> Self {
        Self { start_layer, num_layers }
    }

    pub const fn single(layer: u32) -> Self {
        Self::new(layer, 1)
    }
}

/// A range of mip levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Levels {
    pub base_level: u32,
    pub level_count: u32,
}

impl Levels {
    pub const fn new(base_level: u32, level_count: u32) -> Self {
        Self { base_level, level_count }
    }

    pub const fn single(level: u32) -> Self {
        Self::new(level, 1)
    }
}

/// The old and new layout of an image across a barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageTransition {
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
}

impl ImageTransition {
    pub const fn new(old_layout: ImageLayout, new_layout: ImageLayout) -> Self {
        Self { old_layout, new_layout }
    }
}

/// How a render operation will access an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageAccess {
    /// The layout the image must be in when the work starts.
    ///
    /// [`ImageLayout::Undefined`] means the work doesn't care.
    pub required_initial_layout: ImageLayout,
    /// The layout the image is in once the work is done.
    pub final_layout: ImageLayout,
    /// The first point at which the work touches the image.
    pub earliest_usage: BarrierPoint,
    /// The last point at which the work touches the image.
    pub latest_usage: BarrierPoint,
    pub layers: Layers,
    pub levels: Levels,
    pub aspect: ImageAspectFlags,
}

impl ImageAccess {
    pub const fn new(
        required_initial_layout: ImageLayout,
        final_layout: ImageLayout,
        earliest_usage: BarrierPoint,
        latest_usage: BarrierPoint,
        layers: Layers,
        levels: Levels,
        aspect: ImageAspectFlags,
    ) -> Self {
        Self {
            required_initial_layout,
            final_layout,
            earliest_usage,
            latest_usage,
            layers,
            levels,
            aspect,
        }
    }

    /// An access which only needs execution and memory synchronization.
    ///
    /// Both layouts are [`ImageLayout::Undefined`].
    pub const fn synchronization(
        earliest_usage: BarrierPoint,
        latest_usage: BarrierPoint,
        layers: Layers,
        levels: Levels,
        aspect: ImageAspectFlags,
    ) -> Self {
        Self::new(
            ImageLayout::Undefined,
            ImageLayout::Undefined,
            earliest_usage,
            latest_usage,
            layers,
            levels,
            aspect,
        )
    }

    pub fn subresource_range(&self) -> ImageSubresourceRange {
        subresource_range(self.layers, self.levels, self.aspect)
    }
}

fn subresource_range(layers: Layers, levels: Levels, aspect: ImageAspectFlags) -> ImageSubresourceRange {
    ImageSubresourceRange::new(
        aspect,
        levels.base_level,
        levels.level_count,
        layers.start_layer,
        layers.num_layers,
    )
}

/// A barrier on a byte range of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferMemoryBarrier<B> {
    pub buffer: B,
    pub offset: u64,
    pub byte_size: u64,
    pub source_access: AccessFlags2,
    pub dest_access: AccessFlags2,
}

/// Records a barrier between `source` and `dest` on a subresource range of
/// `image`, transitioning its layout as described by `transition`.
#[allow(clippy::too_many_arguments)]
pub fn insert_image_barrier<R>(
    recorder: &mut R,
    image: R::Image,
    layers: Layers,
    levels: Levels,
    aspect: ImageAspectFlags,
    source: BarrierPoint,
    dest: BarrierPoint,
    transition: ImageTransition,
) where
    R: CommandRecorder + ?Sized,
{
    recorder.image_barrier(ImageMemoryBarrier2 {
        image,
        subresource_range: subresource_range(layers, levels, aspect),
        src_stage_mask: source.stage,
        src_access_mask: source.access,
        dst_stage_mask: dest.stage,
        dst_access_mask: dest.access,
        old_layout: transition.old_layout,
        new_layout: transition.new_layout,
    });
}

/// Records a barrier on a byte range of a buffer.
pub fn insert_buffer_barrier<R>(
    recorder: &mut R,
    source_stage: PipelineStageFlags2,
    dest_stage: PipelineStageFlags2,
    barrier: BufferMemoryBarrier<R::Buffer>,
) where
    R: CommandRecorder + ?Sized,
{
    recorder.buffer_barrier(BufferMemoryBarrier2 {
        buffer: barrier.buffer,
        src_stage_mask: source_stage,
        src_access_mask: barrier.source_access,
        dst_stage_mask: dest_stage,
        dst_access_mask: barrier.dest_access,
        offset: barrier.offset,
        size: barrier.byte_size,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::RecordingRecorder;

    #[test]
    fn test_image_barrier_covers_declared_subresources() {
        let mut recorder = RecordingRecorder::default();

        insert_image_barrier(
            &mut recorder,
            3,
            Layers::new(2, 4),
            Levels::new(1, 3),
            ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL,
            BarrierPoint::new(PipelineStageFlags2::LATE_FRAGMENT_TESTS, AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE),
            BarrierPoint::new(PipelineStageFlags2::FRAGMENT_SHADER, AccessFlags2::SHADER_READ),
            ImageTransition::new(ImageLayout::DepthStencilAttachmentOptimal, ImageLayout::DepthStencilReadOnlyOptimal),
        );

        let [barrier] = recorder.image_barriers[..] else {
            panic!("expected exactly one barrier");
        };
        assert_eq!(barrier.image, 3);
        assert_eq!(
            barrier.subresource_range,
            ImageSubresourceRange::new(ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL, 1, 3, 2, 4)
        );
        assert_eq!(barrier.src_stage_mask, PipelineStageFlags2::LATE_FRAGMENT_TESTS);
        assert_eq!(barrier.dst_access_mask, AccessFlags2::SHADER_READ);
        assert_eq!(barrier.old_layout, ImageLayout::DepthStencilAttachmentOptimal);
        assert_eq!(barrier.new_layout, ImageLayout::DepthStencilReadOnlyOptimal);
    }

    #[test]
    fn test_buffer_barrier_scopes() {
        let mut recorder = RecordingRecorder::default();

        insert_buffer_barrier(
            &mut recorder,
            PipelineStageFlags2::TRANSFER,
            PipelineStageFlags2::VERTEX_INPUT,
            BufferMemoryBarrier {
                buffer: 11,
                offset: 64,
                byte_size: 512,
                source_access: AccessFlags2::TRANSFER_WRITE,
                dest_access: AccessFlags2::VERTEX_ATTRIBUTE_READ,
            },
        );

        assert!(recorder.image_barriers.is_empty());
        let [barrier] = recorder.buffer_barriers[..] else {
            panic!("expected exactly one barrier");
        };
        assert_eq!(barrier.buffer, 11);
        assert_eq!(barrier.offset, 64);
        assert_eq!(barrier.size, 512);
        assert_eq!(barrier.src_stage_mask, PipelineStageFlags2::TRANSFER);
        assert_eq!(barrier.dst_stage_mask, PipelineStageFlags2::VERTEX_INPUT);
        assert_eq!(barrier.src_access_mask, AccessFlags2::TRANSFER_WRITE);
    }

    #[test]
    fn test_synchronization_access_has_no_layout_requirement() {
        let access = ImageAccess::synchronization(
            BarrierPoint::new(PipelineStageFlags2::COMPUTE_SHADER, AccessFlags2::SHADER_READ),
            BarrierPoint::new(PipelineStageFlags2::COMPUTE_SHADER, AccessFlags2::SHADER_WRITE),
            Layers::single(0),
            Levels::single(0),
            ImageAspectFlags::COLOR,
        );

        assert_eq!(access.required_initial_layout, ImageLayout::Undefined);
        assert_eq!(access.final_layout, ImageLayout::Undefined);
        assert_eq!(access.subresource_range(), ImageSubresourceRange::new(ImageAspectFlags::COLOR, 0, 1, 0, 1));
    }

    #[test]
    fn test_top_of_pipe_has_no_access() {
        let point = BarrierPoint::top_of_pipe();
        assert_eq!(point.stage, PipelineStageFlags2::TOP_OF_PIPE);
        assert_eq!(point.access, AccessFlags2::NONE);
    }
}
