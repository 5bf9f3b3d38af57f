use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(0);

/// Handle returned by a listener registration; pass it back to unsubscribe.
/// Unique across every listener list in the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Synchronous listener list. Listeners run in registration order, on the
/// caller's stack, at the moment of the transition they observe.
pub struct Listeners<T> {
    entries: Vec<(u64, Box<dyn FnMut(&T)>)>,
}

impl<T> Listeners<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&T) + 'static) -> Subscription {
        let id = NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed);
        self.entries.push((id, Box::new(listener)));
        Subscription(id)
    }

    /// Returns false when the subscription was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(id, _)| *id != subscription.0);
        self.entries.len() != before
    }

    pub fn emit(&mut self, value: &T) {
        for (_, listener) in self.entries.iter_mut() {
            listener(value);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}
