use std::{
    cmp::Ordering,
    collections::{HashSet, VecDeque},
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

struct QueueState<T> {
    /// The items waiting to be popped.
    data: VecDeque<T>,
    /// Identifiers of poppers whose blocking wait was cancelled.
    unblocked: HashSet<String>,
}

/// A FIFO queue which can be pushed to and popped from by any number of threads.
///
/// Consumers can block in [`ConcurrentQueue::blocking_pop`] until an item
/// arrives. Each blocking consumer registers an identifier, which another
/// thread can use to cancel that consumer's wait through
/// [`ConcurrentQueue::unblock_popper`].
pub struct ConcurrentQueue<T> {
    state: Mutex<QueueState<T>>,
    data_pushed: Condvar,
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ConcurrentQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                data: VecDeque::new(),
                unblocked: HashSet::new(),
            }),
            data_pushed: Condvar::new(),
        }
    }

    // The only caller code run under the lock is the `sort_by` comparator. If it
    // panics the lock is poisoned, but the data is still a permutation of the
    // queued items, so the poison is ignored.
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pushes a new item to the back of the queue and wakes one waiting popper.
    pub fn push(&self, item: T) {
        self.lock().data.push_back(item);

        // Notify after the lock is released so the woken thread doesn't
        // immediately block on it.
        self.data_pushed.notify_one();
    }

    /// Whether the queue is empty at the time of calling.
    pub fn is_empty(&self) -> bool {
        self.lock().data.is_empty()
    }

    /// The number of queued items at the time of calling.
    pub fn len(&self) -> usize {
        self.lock().data.len()
    }

    /// Sorts the queued items with the given comparator.
    ///
    /// The sort is stable.
    pub fn sort_by(&self, compare: impl FnMut(&T, &T) -> Ordering) {
        self.lock().data.make_contiguous().sort_by(compare);
    }

    /// Returns a copy of the item at the front of the queue, if any.
    pub fn try_peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.lock().data.front().cloned()
    }

    /// Pops the front item if one is available, without waiting.
    pub fn try_pop(&self) -> Option<T> {
        self.lock().data.pop_front()
    }

    /// Blocks until an item can be popped, the optional timeout expires, or the
    /// wait is cancelled by [`ConcurrentQueue::unblock_popper`] with the same
    /// `identifier`.
    ///
    /// An item that is already queued is returned immediately. Returns `None`
    /// on timeout or cancellation. A cancellation is consumed by the wait it
    /// interrupts, so later calls with the same identifier block again.
    pub fn blocking_pop(&self, identifier: &str, timeout: Option<Duration>) -> Option<T> {
        let mut state = self.lock();

        if let Some(item) = state.data.pop_front() {
            return Some(item);
        }

        let keep_waiting =
            |state: &mut QueueState<T>| !state.unblocked.contains(identifier) && state.data.is_empty();

        let timed_out = match timeout {
            Some(timeout) => {
                let (guard, result) = self
                    .data_pushed
                    .wait_timeout_while(state, timeout, keep_waiting)
                    .unwrap_or_else(PoisonError::into_inner);
                state = guard;
                result.timed_out()
            }
            None => {
                state = self
                    .data_pushed
                    .wait_while(state, keep_waiting)
                    .unwrap_or_else(PoisonError::into_inner);
                false
            }
        };

        if state.unblocked.remove(identifier) {
            return None;
        }

        if timed_out {
            return None;
        }

        state.data.pop_front()
    }

    /// Cancels the current (or next) blocking wait of the popper registered
    /// under `identifier`.
    pub fn unblock_popper(&self, identifier: &str) {
        self.lock().unblocked.insert(identifier.to_owned());

        self.data_pushed.notify_all();
    }
}
