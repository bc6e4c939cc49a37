use std::{collections::HashMap, fmt::Debug, hash::Hash};

use accela_common::Metrics;
use accela_render_rhi::command::{CommandRecorder, ImageLayout};

use crate::{
    metrics,
    operation::RenderOperation,
    sync::{BarrierPoint, ImageAccess, ImageTransition, insert_image_barrier},
};

/// The synchronization state of a single tracked image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageState {
    current_layout: ImageLayout,
    current_access: Option<ImageAccess>,
}

impl ImageState {
    /// The layout the image is in once all prepared work has executed.
    pub fn current_layout(&self) -> ImageLayout {
        self.current_layout
    }

    /// The most recent access prepared for the image, if any.
    pub fn current_access(&self) -> Option<&ImageAccess> {
        self.current_access.as_ref()
    }
}

/// Tracks how prepared render work leaves images, and records the pipeline
/// barriers needed before new work touches them.
///
/// Every render operation must be reported through
/// [`RenderState::prepare_operation`] before its commands are recorded, in
/// submission order. Images are identified by `K` and are tracked lazily: an
/// image seen for the first time starts in [`ImageLayout::Undefined`] with no
/// prior access.
///
/// A render state belongs to the thread recording the command stream; it never
/// owns or outlives the images it tracks.
#[derive(Debug)]
pub struct RenderState<K> {
    images: HashMap<K, ImageState>,
    barrier_count: u64,
}

impl<K> Default for RenderState<K> {
    fn default() -> Self {
        Self {
            images: HashMap::new(),
            barrier_count: 0,
        }
    }
}

impl<K> RenderState<K>
where
    K: Copy + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a render operation as about to be recorded into `recorder`.
    ///
    /// Records at most one barrier per image access of the operation, then
    /// updates the tracked state of every image it touches.
    pub fn prepare_operation<R>(&mut self, recorder: &mut R, render_operation: &RenderOperation<K>)
    where
        R: CommandRecorder<Image = K> + ?Sized,
    {
        for (image, access) in render_operation.image_accesses() {
            let state = self.images.entry(*image).or_default();

            if prepare_image_access(recorder, *image, access, state) {
                self.barrier_count += 1;
            }
        }
    }

    /// Returns the tracked state of `image`, if it has been seen.
    pub fn image_state(&self, image: &K) -> Option<&ImageState> {
        self.images.get(image)
    }

    /// Stops tracking `image`. A later access starts again from
    /// [`ImageLayout::Undefined`].
    pub fn forget_image(&mut self, image: &K) -> bool {
        self.images.remove(image).is_some()
    }

    pub fn tracked_image_count(&self) -> usize {
        self.images.len()
    }

    /// The number of barriers recorded since creation or the last
    /// [`RenderState::destroy`].
    pub fn barrier_count(&self) -> u64 {
        self.barrier_count
    }

    /// Publishes the tracker's counters.
    pub fn publish_metrics(&self, metrics: &dyn Metrics) {
        metrics.set_counter_value(metrics::RENDERER_RENDER_STATE_IMAGES_COUNT, self.images.len() as u64);
        metrics.set_counter_value(metrics::RENDERER_RENDER_STATE_BARRIERS_COUNT, self.barrier_count);
    }

    /// Forgets all tracked state.
    pub fn destroy(&mut self) {
        self.images.clear();
        self.barrier_count = 0;
    }
}

/// Returns `true` if a barrier was recorded.
fn prepare_image_access<R>(recorder: &mut R, image: R::Image, access: &ImageAccess, state: &mut ImageState) -> bool
where
    R: CommandRecorder + ?Sized,
    R::Image: Debug,
{
    let needs_layout_transition =
        state.current_layout != access.required_initial_layout && !access.required_initial_layout.is_undefined();

    let needs_synchronization = state.current_access.is_some();

    // First use of the image by work that doesn't care about its layout.
    if !needs_layout_transition && !needs_synchronization {
        apply_access(state, access, state.current_layout);
        return false;
    }

    let current_usage = state
        .current_access
        .map(|previous| previous.latest_usage)
        .unwrap_or_else(BarrierPoint::top_of_pipe);

    // Work which doesn't require a layout only needs an execution/memory
    // dependency; the image stays in the layout it's in.
    let new_layout = if access.required_initial_layout.is_undefined() {
        state.current_layout
    } else {
        access.required_initial_layout
    };

    log::trace!(
        "image {:?}: barrier {:?} -> {:?}, layout {:?} -> {:?}",
        image,
        current_usage,
        access.earliest_usage,
        state.current_layout,
        new_layout,
    );

    insert_image_barrier(
        recorder,
        image,
        access.layers,
        access.levels,
        access.aspect,
        current_usage,
        access.earliest_usage,
        ImageTransition::new(state.current_layout, new_layout),
    );

    apply_access(state, access, new_layout);
    true
}

/// `layout_before` is the layout the image is in when the work starts.
///
/// Deliberately departs from "the tracked layout becomes `final_layout`" when
/// `final_layout` is [`ImageLayout::Undefined`]: such an access declares no
/// final layout and leaves the image in `layout_before`. Images can't be
/// transitioned into `UNDEFINED`, and tracking it would make the next access
/// requiring a layout transition out of `UNDEFINED`, discarding the contents.
fn apply_access(state: &mut ImageState, access: &ImageAccess, layout_before: ImageLayout) {
    state.current_layout = if access.final_layout.is_undefined() {
        layout_before
    } else {
        access.final_layout
    };
    state.current_access = Some(*access);
}
