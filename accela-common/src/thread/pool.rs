use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
    time::Duration,
};

use thiserror::Error;

use crate::{container::ConcurrentQueue, thread::MessagePtr};

/// Handles messages which were posted without their own handler.
pub type MessageHandler = Box<dyn Fn(MessagePtr) + Send + Sync>;

/// Handles a single posted message.
pub type OneShotHandler = Box<dyn FnOnce(MessagePtr) + Send>;

/// Invoked by a worker which hasn't received a message within the idle timeout.
pub type IdleHandler = Box<dyn Fn() + Send + Sync>;

/// The default time a worker waits for a message before going idle.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum ThreadPoolError {
    #[error("Failed to spawn thread pool worker {identifier}: {source}")]
    Spawn {
        identifier: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration of a [`MessageDrivenThreadPool`].
#[derive(Debug, Clone)]
pub struct ThreadPoolCreateInfo {
    /// Tag used to name the pool's threads.
    pub tag: String,
    /// The number of worker threads.
    pub pool_size: usize,
    /// How long a worker waits for a message before invoking the idle handler.
    ///
    /// Only used when an idle handler is provided; otherwise workers block
    /// until a message arrives.
    pub idle_timeout: Duration,
}

impl Default for ThreadPoolCreateInfo {
    fn default() -> Self {
        Self {
            tag: String::from("Pool"),
            pool_size: 1,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl ThreadPoolCreateInfo {
    pub fn new(tag: impl Into<String>, pool_size: usize) -> Self {
        Self {
            tag: tag.into(),
            pool_size,
            ..Default::default()
        }
    }
}

struct EnqueuedMessage {
    message: MessagePtr,
    handler: Option<OneShotHandler>,
}

/// State shared between the pool and its workers.
struct PoolShared {
    queue: ConcurrentQueue<EnqueuedMessage>,
    run: AtomicBool,
    msg_handler: Option<MessageHandler>,
    idle_handler: Option<IdleHandler>,
    idle_timeout: Duration,
}

/// A fixed-size pool of threads which process posted messages.
///
/// Every message is handled by exactly one worker: with its own handler when
/// one was given to [`MessageDrivenThreadPool::post_message`], otherwise with
/// the pool-wide handler, otherwise it is dropped. Messages leave the queue in
/// FIFO order, but with more than one worker nothing orders their completion.
///
/// Dropping the pool stops and joins every worker. Messages still queued at
/// that point are dropped unhandled.
pub struct MessageDrivenThreadPool {
    tag: String,
    shared: Arc<PoolShared>,
    workers: Vec<(String, JoinHandle<()>)>,
}

static_assertions::assert_impl_all!(MessageDrivenThreadPool: Send, Sync);

impl MessageDrivenThreadPool {
    /// Spawns the pool's worker threads.
    pub fn new(
        create_info: ThreadPoolCreateInfo,
        msg_handler: Option<MessageHandler>,
        idle_handler: Option<IdleHandler>,
    ) -> Result<Self, ThreadPoolError> {
        let ThreadPoolCreateInfo {
            tag,
            pool_size,
            idle_timeout,
        } = create_info;

        let shared = Arc::new(PoolShared {
            queue: ConcurrentQueue::new(),
            run: AtomicBool::new(true),
            msg_handler,
            idle_handler,
            idle_timeout,
        });

        let mut pool = Self {
            tag,
            shared,
            workers: Vec::with_capacity(pool_size),
        };

        for index in 0..pool_size {
            let identifier = pool.thread_identifier(index);
            let shared = Arc::clone(&pool.shared);
            let worker_identifier = identifier.clone();

            let spawned = std::thread::Builder::new()
                .name(identifier.clone())
                .spawn(move || worker_loop(&shared, &worker_identifier));

            match spawned {
                Ok(handle) => pool.workers.push((identifier, handle)),
                // Dropping the pool shuts down the workers spawned so far.
                Err(source) => return Err(ThreadPoolError::Spawn { identifier, source }),
            }
        }

        log::info!("Started thread pool '{}' with {} worker(s)", pool.tag, pool_size);

        Ok(pool)
    }

    /// Posts a message to be handled by the next available worker.
    ///
    /// `handler` overrides the pool-wide message handler for this message.
    /// Never blocks beyond briefly acquiring the queue lock.
    pub fn post_message(&self, message: MessagePtr, handler: Option<OneShotHandler>) {
        self.shared.queue.push(EnqueuedMessage { message, handler });
    }

    /// Posts a message with its own handler.
    pub fn post_message_with<F>(&self, message: MessagePtr, handler: F)
    where
        F: FnOnce(MessagePtr) + Send + 'static,
    {
        self.post_message(message, Some(Box::new(handler)));
    }

    /// The tag the pool was created with.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The number of worker threads.
    pub fn pool_size(&self) -> usize {
        self.workers.len()
    }

    /// The number of messages waiting for a worker.
    pub fn pending_messages(&self) -> usize {
        self.shared.queue.len()
    }

    fn thread_identifier(&self, index: usize) -> String {
        format!("MTP{}-{}", index, self.tag)
    }
}

impl Drop for MessageDrivenThreadPool {
    fn drop(&mut self) {
        self.shared.run.store(false, Ordering::Release);

        // Wake every worker so it observes the cleared run flag, including
        // those waiting without a timeout.
        for (identifier, _) in &self.workers {
            self.shared.queue.unblock_popper(identifier);
        }

        for (identifier, handle) in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("Thread pool worker {identifier} terminated by a panicking handler");
            }
        }

        let dropped = self.shared.queue.len();
        if dropped > 0 {
            log::debug!("Thread pool '{}' dropped {} unhandled message(s)", self.tag, dropped);
        }

        log::info!("Stopped thread pool '{}'", self.tag);
    }
}

fn worker_loop(shared: &PoolShared, identifier: &str) {
    log::debug!("Worker {identifier} started");

    let max_wait = shared.idle_handler.as_ref().map(|_| shared.idle_timeout);

    while shared.run.load(Ordering::Acquire) {
        let popped = shared.queue.blocking_pop(identifier, max_wait);

        // Shutdown wins over a message that was popped concurrently.
        if !shared.run.load(Ordering::Acquire) {
            break;
        }

        match popped {
            Some(EnqueuedMessage {
                message,
                handler: Some(handler),
            }) => handler(message),
            Some(EnqueuedMessage { message, handler: None }) => {
                if let Some(msg_handler) = &shared.msg_handler {
                    msg_handler(message);
                }
            }
            None => {
                if let Some(idle_handler) = &shared.idle_handler {
                    idle_handler();
                }
            }
        }
    }

    log::debug!("Worker {identifier} exiting");
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Instant,
    };

    use crossbeam::channel::{Receiver, unbounded};

    use super::*;
    use crate::thread::{BoolResultMessage, Message, ResultError};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[derive(Debug)]
    struct NumberMessage(usize);

    impl Message for NumberMessage {
        fn type_identifier(&self) -> &str {
            "NumberMessage"
        }
    }

    fn number(message: &MessagePtr) -> usize {
        message.downcast_ref::<NumberMessage>().map(|m| m.0).unwrap_or(usize::MAX)
    }

    fn recv_all(rx: &Receiver<usize>, count: usize) -> Vec<usize> {
        (0..count)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).expect("message was not handled"))
            .collect()
    }

    #[test]
    fn test_single_worker_preserves_post_order() {
        init_logger();
        let (tx, rx) = unbounded();

        let pool = MessageDrivenThreadPool::new(
            ThreadPoolCreateInfo::new("Fifo", 1),
            Some(Box::new(move |message| {
                let _ = tx.send(number(&message));
            })),
            None,
        )
        .unwrap();

        for n in 0..100 {
            pool.post_message(Arc::new(NumberMessage(n)), None);
        }

        assert_eq!(recv_all(&rx, 100), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_per_message_handler_overrides_pool_handler() {
        init_logger();
        let (tx, rx) = unbounded();
        let pool_handled = Arc::new(AtomicUsize::new(0));

        let pool = {
            let pool_handled = Arc::clone(&pool_handled);
            MessageDrivenThreadPool::new(
                ThreadPoolCreateInfo::new("Override", 2),
                Some(Box::new(move |_| {
                    pool_handled.fetch_add(1, Ordering::SeqCst);
                })),
                None,
            )
            .unwrap()
        };

        pool.post_message_with(Arc::new(NumberMessage(42)), move |message| {
            let _ = tx.send(number(&message));
        });

        assert_eq!(recv_all(&rx, 1), vec![42]);
        drop(pool);
        assert_eq!(pool_handled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_messages_without_any_handler_are_dropped() {
        init_logger();
        let (tx, rx) = unbounded();

        let pool = MessageDrivenThreadPool::new(ThreadPoolCreateInfo::new("NoHandler", 1), None, None).unwrap();

        pool.post_message(Arc::new(NumberMessage(1)), None);
        pool.post_message_with(Arc::new(NumberMessage(2)), move |message| {
            let _ = tx.send(number(&message));
        });

        // The unhandled message didn't stall the worker.
        assert_eq!(recv_all(&rx, 1), vec![2]);
    }

    #[test]
    fn test_every_message_is_handled_once_across_workers() {
        init_logger();
        let (tx, rx) = unbounded();

        let pool = MessageDrivenThreadPool::new(
            ThreadPoolCreateInfo::new("Many", 4),
            Some(Box::new(move |message| {
                let _ = tx.send(number(&message));
            })),
            None,
        )
        .unwrap();
        assert_eq!(pool.pool_size(), 4);
        assert_eq!(pool.tag(), "Many");

        for n in 0..200 {
            pool.post_message(Arc::new(NumberMessage(n)), None);
        }

        let mut handled = recv_all(&rx, 200);
        handled.sort_unstable();
        assert_eq!(handled, (0..200).collect::<Vec<_>>());
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_drop_joins_blocked_workers_promptly() {
        init_logger();
        let pool = MessageDrivenThreadPool::new(ThreadPoolCreateInfo::new("Blocked", 8), None, None).unwrap();

        // Let every worker reach its indefinite wait.
        std::thread::sleep(Duration::from_millis(50));

        let start = Instant::now();
        drop(pool);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_drop_discards_queued_messages() {
        init_logger();
        let (started_tx, started_rx) = unbounded();
        let (release_tx, release_rx) = unbounded::<()>();

        let pool = MessageDrivenThreadPool::new(ThreadPoolCreateInfo::new("Discard", 1), None, None).unwrap();

        pool.post_message_with(Arc::new(NumberMessage(0)), move |_| {
            let _ = started_tx.send(());
            let _ = release_rx.recv();
        });

        let pending = Arc::new(BoolResultMessage::new("Pending"));
        let future = pending.create_future().unwrap();
        pool.post_message_with(pending, |message| {
            if let Some(message) = message.downcast_ref::<BoolResultMessage>() {
                let _ = message.set_result(true);
            }
        });

        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(pool.pending_messages(), 1);

        // Release the busy worker only once shutdown has begun.
        let releaser = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            let _ = release_tx.send(());
        });

        drop(pool);
        releaser.join().unwrap();

        assert_eq!(future.wait(), Err(ResultError::Abandoned));
    }

    #[test]
    fn test_idle_handler_fires_before_any_message() {
        init_logger();
        let events = Arc::new(Mutex::new(Vec::new()));

        let pool = {
            let idle_events = Arc::clone(&events);
            let message_events = Arc::clone(&events);
            MessageDrivenThreadPool::new(
                ThreadPoolCreateInfo::new("Idle", 1),
                Some(Box::new(move |_| message_events.lock().unwrap().push("message"))),
                Some(Box::new(move || idle_events.lock().unwrap().push("idle"))),
            )
            .unwrap()
        };

        std::thread::sleep(DEFAULT_IDLE_TIMEOUT * 3);
        pool.post_message(Arc::new(NumberMessage(0)), None);
        std::thread::sleep(DEFAULT_IDLE_TIMEOUT);
        drop(pool);

        let events = events.lock().unwrap();
        assert_eq!(events.first(), Some(&"idle"));
        assert_eq!(events.iter().filter(|e| **e == "message").count(), 1);
    }

    #[test]
    fn test_custom_idle_timeout() {
        init_logger();
        let idle_calls = Arc::new(AtomicUsize::new(0));

        let pool = {
            let idle_calls = Arc::clone(&idle_calls);
            MessageDrivenThreadPool::new(
                ThreadPoolCreateInfo {
                    tag: "FastIdle".into(),
                    pool_size: 1,
                    idle_timeout: Duration::from_millis(5),
                },
                None,
                Some(Box::new(move || {
                    idle_calls.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap()
        };

        std::thread::sleep(Duration::from_millis(100));
        drop(pool);

        assert!(idle_calls.load(Ordering::SeqCst) >= 3);
    }

    #[test]
    fn test_result_message_round_trip() {
        init_logger();
        let pool = MessageDrivenThreadPool::new(
            ThreadPoolCreateInfo::new("Results", 2),
            Some(Box::new(|message| {
                if let Some(message) = message.downcast_ref::<BoolResultMessage>() {
                    let _ = message.set_result(message.type_identifier() == "Succeed");
                }
            })),
            None,
        )
        .unwrap();

        let succeed = Arc::new(BoolResultMessage::new("Succeed"));
        let fail = Arc::new(BoolResultMessage::new("Fail"));
        let succeed_future = succeed.create_future().unwrap();
        let fail_future = fail.create_future().unwrap();

        pool.post_message(succeed, None);
        pool.post_message(fail, None);

        assert_eq!(succeed_future.wait_timeout(Duration::from_secs(5)), Ok(true));
        assert_eq!(fail_future.wait_timeout(Duration::from_secs(5)), Ok(false));
    }

    #[test]
    fn test_panicking_handler_does_not_block_shutdown() {
        init_logger();
        let (tx, rx) = unbounded();

        let pool = MessageDrivenThreadPool::new(ThreadPoolCreateInfo::new("Panics", 2), None, None).unwrap();

        pool.post_message_with(Arc::new(NumberMessage(0)), |_| panic!("handler failure"));
        pool.post_message_with(Arc::new(NumberMessage(1)), move |message| {
            let _ = tx.send(number(&message));
        });

        // The surviving worker keeps handling messages.
        assert_eq!(recv_all(&rx, 1), vec![1]);
        drop(pool);
    }
}
