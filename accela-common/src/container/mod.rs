mod concurrent_queue;

pub use concurrent_queue::ConcurrentQueue;
