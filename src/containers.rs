//! Growable containers with explicit capacity management.
//!
//! `Vec` would do the job, but the growth and compaction points here are
//! part of the observable contract (tests pin them down), so both
//! containers manage their capacity by hand.

/// Capacity a container jumps to on its first growth.
pub const MIN_CAPACITY: usize = 8;

/// LIFO stack with amortized-doubling growth.
///
/// Growth is explicit: empty to [`MIN_CAPACITY`], then doubling, via
/// `reserve_exact` so the thresholds are observable.
#[derive(Debug)]
pub struct Stack<T> {
    items: Vec<T>,
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            items: Vec::with_capacity(cap),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.items.capacity() {
            let grown = match self.items.capacity() {
                0 => MIN_CAPACITY,
                cap => cap * 2,
            };
            self.items.reserve_exact(grown - self.items.len());
        }
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Removes and yields every item from `mark` to the top, bottom-up.
    /// Used to drain a nested scope pushed after `mark = len()`.
    pub fn drain_from(&mut self, mark: usize) -> std::vec::Drain<'_, T> {
        self.items.drain(mark..)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// FIFO queue over a flat buffer with a read cursor.
///
/// `pop_front` advances the cursor instead of shifting; once the cursor
/// passes the midpoint of the buffer the live items are compacted back
/// to the left, so consumed slots are reclaimed without per-pop moves.
#[derive(Debug)]
pub struct Queue<T> {
    items: Vec<Option<T>>,
    head: usize,
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            head: 0,
        }
    }

    pub fn push_back(&mut self, item: T) {
        if self.items.len() == self.items.capacity() {
            let grown = match self.items.capacity() {
                0 => MIN_CAPACITY,
                cap => cap * 2,
            };
            self.items.reserve_exact(grown - self.items.len());
        }
        self.items.push(Some(item));
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.head == self.items.len() {
            return None;
        }
        let item = self.items[self.head].take();
        self.head += 1;
        if self.head > self.items.len() / 2 {
            self.compact();
        }
        item
    }

    pub fn front(&self) -> Option<&T> {
        self.items.get(self.head).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.items.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items[self.head..]
            .iter()
            .map(|slot| slot.as_ref().expect("live queue slot"))
    }

    fn compact(&mut self) {
        self.items.drain(..self.head);
        self.head = 0;
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}
