use std::collections::VecDeque;

/// Bounded window of the most recent samples, newest first.
///
/// Fixed-capacity buffer that evicts the oldest entry once full. Used by
/// accumulators that pair each new sample with a bounded number of
/// predecessors (e.g. lagged cross-moments).
///
/// # Examples
/// ```
/// use sampleflow::window::LagWindow;
///
/// let mut window = LagWindow::new(3);
/// window.push(1.0);
/// window.push(2.0);
/// window.push(3.0);
///
/// assert_eq!(window.len(), 3);
/// assert!(window.is_full());
///
/// // Pushing another value evicts the oldest
/// window.push(4.0);
/// assert_eq!(window.to_vec(), vec![4.0, 3.0, 2.0]);
/// ```
#[derive(Debug, Clone)]
pub struct LagWindow<T> {
    data: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> LagWindow<T> {
    /// Creates a new window holding at most `capacity` entries
    ///
    /// # Panics
    /// Panics if capacity is 0
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LagWindow capacity must be greater than 0");
        LagWindow {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Adds a value at the front, dropping the back entry if the bound is exceeded.
    pub fn push(&mut self, value: T) {
        self.data.push_front(value);
        if self.data.len() > self.capacity {
            self.data.pop_back();
        }
    }

    /// Entry `steps_back` positions behind the newest one (0 is the newest).
    pub fn get(&self, steps_back: usize) -> Option<&T> {
        self.data.get(steps_back)
    }

    /// Iterates from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// Copies the contents, newest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
