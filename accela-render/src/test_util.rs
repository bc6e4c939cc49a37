use accela_render_rhi::command::{BufferMemoryBarrier2, CommandRecorder, ImageMemoryBarrier2};

/// Records every barrier it's asked to emit. Images and buffers are plain ids.
#[derive(Debug, Default)]
pub struct RecordingRecorder {
    pub image_barriers: Vec<ImageMemoryBarrier2<u32>>,
    pub buffer_barriers: Vec<BufferMemoryBarrier2<u32>>,
    pub pipeline_barrier_calls: usize,
}

impl CommandRecorder for RecordingRecorder {
    type Image = u32;
    type Buffer = u32;

    fn pipeline_barrier(
        &mut self,
        image_barriers: &[ImageMemoryBarrier2<u32>],
        buffer_barriers: &[BufferMemoryBarrier2<u32>],
    ) {
        self.pipeline_barrier_calls += 1;
        self.image_barriers.extend_from_slice(image_barriers);
        self.buffer_barriers.extend_from_slice(buffer_barriers);
    }
}
