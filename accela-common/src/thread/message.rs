use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use downcast_rs::{DowncastSync, impl_downcast};
use thiserror::Error;

/// A unit of work posted to a [`MessageDrivenThreadPool`].
///
/// Handlers receive messages as `Arc<dyn Message>` and recover the concrete
/// type with [`Message::downcast_arc`] or [`Message::downcast_ref`].
///
/// [`MessageDrivenThreadPool`]: crate::thread::MessageDrivenThreadPool
pub trait Message: DowncastSync {
    /// A string identifying the kind of message, used for dispatch and logging.
    fn type_identifier(&self) -> &str;
}

impl_downcast!(sync Message);

/// A shared, type-erased message.
pub type MessagePtr = Arc<dyn Message>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultError {
    #[error("The message was dropped without a result being set.")]
    Abandoned,
    #[error("Timed out waiting for the message result.")]
    Timeout,
    #[error("The future of this message was already taken.")]
    FutureAlreadyTaken,
    #[error("The result of this message was already set.")]
    ResultAlreadySet,
}

/// A message which returns a result to the poster through a [`MessageFuture`].
///
/// The poster calls [`ResultMessage::create_future`] before posting; the
/// handler calls [`ResultMessage::set_result`] once the work is done. If the
/// message is dropped without a result, for example because the pool shut
/// down before handling it, the future resolves to [`ResultError::Abandoned`].
pub struct ResultMessage<T> {
    type_identifier: String,
    promise: Mutex<Option<Sender<T>>>,
    future: Mutex<Option<Receiver<T>>>,
}

/// A [`ResultMessage`] reporting success or failure.
pub type BoolResultMessage = ResultMessage<bool>;

impl<T> ResultMessage<T>
where
    T: Send + 'static,
{
    pub fn new(type_identifier: impl Into<String>) -> Self {
        let (promise, future) = crossbeam::channel::bounded(1);

        Self {
            type_identifier: type_identifier.into(),
            promise: Mutex::new(Some(promise)),
            future: Mutex::new(Some(future)),
        }
    }

    /// Takes the future which will receive the result of this message.
    ///
    /// Can only succeed once per message.
    pub fn create_future(&self) -> Result<MessageFuture<T>, ResultError> {
        self.future
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .map(|receiver| MessageFuture { receiver })
            .ok_or(ResultError::FutureAlreadyTaken)
    }

    /// Completes the message with `result`.
    ///
    /// A result nobody waits for anymore is silently discarded.
    pub fn set_result(&self, result: T) -> Result<(), ResultError> {
        let promise = self
            .promise
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ResultError::ResultAlreadySet)?;

        if promise.send(result).is_err() {
            log::trace!("result of message '{}' discarded, future was dropped", self.type_identifier);
        }

        Ok(())
    }
}

impl<T> Message for ResultMessage<T>
where
    T: Send + 'static,
{
    fn type_identifier(&self) -> &str {
        &self.type_identifier
    }
}

impl<T> std::fmt::Debug for ResultMessage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultMessage")
            .field("type_identifier", &self.type_identifier)
            .finish_non_exhaustive()
    }
}

/// The receiving half of a [`ResultMessage`].
#[derive(Debug)]
pub struct MessageFuture<T> {
    receiver: Receiver<T>,
}

impl<T> MessageFuture<T> {
    /// Blocks until the result is available.
    pub fn wait(self) -> Result<T, ResultError> {
        self.receiver.recv().map_err(|_| ResultError::Abandoned)
    }

    /// Blocks until the result is available or `timeout` expires.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<T, ResultError> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => ResultError::Timeout,
            RecvTimeoutError::Disconnected => ResultError::Abandoned,
        })
    }

    /// Returns the result if it is already available.
    pub fn try_get(&self) -> Result<Option<T>, ResultError> {
        match self.receiver.try_recv() {
            Ok(result) => Ok(Some(result)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ResultError::Abandoned),
        }
    }
}
