mod message;
mod pool;

pub use message::*;
pub use pool::*;
