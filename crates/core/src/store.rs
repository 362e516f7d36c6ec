//! State container with synchronous change notification
//!
//! The simulation owns one `Store<GameState>`; every mutating operation
//! edits the state in place and finishes with `publish`, which fires all
//! subscribers synchronously. Subscribers read the committed snapshot -
//! nothing outside the simulation mutates it.

/// Listener invoked on every commit
pub type Listener<T> = Box<dyn FnMut(&T)>;

/// Handle returned by [`Store::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Store<T> {
    state: T,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
    next_id: u64,
}

impl<T> Store<T> {
    pub fn new(state: T) -> Self {
        Self {
            state,
            listeners: Vec::new(),
            next_id: 1,
        }
    }

    pub fn state(&self) -> &T {
        &self.state
    }

    /// Mutable access for the owning simulation. Callers must `publish`
    /// after the mutation is complete.
    pub fn state_mut(&mut self) -> &mut T {
        &mut self.state
    }

    /// Notify all subscribers of the current state
    pub fn publish(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }

    /// Register a listener. It is invoked immediately with the current
    /// state, then on every commit.
    pub fn subscribe(&mut self, mut listener: Listener<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        listener(&self.state);
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
