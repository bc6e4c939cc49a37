//! Names under which the renderer publishes its metrics.

pub const RENDERER_RENDER_STATE_IMAGES_COUNT: &str = "Renderer_RenderState_Images_Count";
pub const RENDERER_RENDER_STATE_BARRIERS_COUNT: &str = "Renderer_RenderState_Barriers_Count";
