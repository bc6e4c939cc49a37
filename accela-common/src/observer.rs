use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identifies a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Observers<E> {
    next_id: u64,
    entries: Vec<(ObserverId, Callback<E>)>,
}

/// An ordered list of callbacks notified of events of type `E`.
///
/// Observers are notified in registration order. Each notification works on
/// a snapshot of the list, so callbacks may register or unregister observers
/// (of this same list) without affecting the notification in progress.
pub struct ObserverList<E> {
    observers: Mutex<Observers<E>>,
}

impl<E> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ObserverList<E> {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Observers {
                next_id: 0,
                entries: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Observers<E>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> ObserverId {
        let mut observers = self.lock();
        let id = ObserverId(observers.next_id);
        observers.next_id += 1;
        observers.entries.push((id, Arc::new(callback)));
        id
    }

    /// Returns `false` if no observer with that id was registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut observers = self.lock();
        let before = observers.entries.len();
        observers.entries.retain(|(entry_id, _)| *entry_id != id);
        observers.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Callback<E>> = self.lock().entries.iter().map(|(_, cb)| Arc::clone(cb)).collect();

        for callback in snapshot {
            callback(event);
        }
    }
}
