//! Tracks the layout and last access of images across render work, and records
//! the pipeline barriers needed between them.

pub mod metrics;
pub mod operation;
pub mod state;
pub mod sync;

#[cfg(test)]
mod test_util;

pub use operation::RenderOperation;
pub use state::{ImageState, RenderState};
pub use sync::*;
