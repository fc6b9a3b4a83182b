use std::{fmt::Debug, hash::Hash};

/// A trait to be implemented by any "index-like" types
pub trait Index: Copy + 'static + Eq + PartialEq + Debug + Hash {
    fn new(idx: usize) -> Self;

    fn index(self) -> usize;

    #[inline]
    fn increment_by(&mut self, amount: usize) {
        *self = self.plus(amount);
    }

    #[inline]
    #[must_use = "Use `increment_by` if you wanted to update the index in-place"]
    fn plus(self, amount: usize) -> Self {
        Self::new(self.index() + amount)
    }
}

macro_rules! simple_index {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(
            Debug,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Clone,
            Copy,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        $vis struct $name(u32);

        impl $crate::index::Index for $name {
            fn new(idx: usize) -> Self {
                Self(idx as _)
            }

            fn index(self) -> usize {
                self.0 as _
            }
        }
    };
}

pub(crate) use simple_index;

/// Hands out fresh indices of one kind. Never reuses an index it already gave
/// out, so ids stay unique for the lifetime of the counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter<I: Index> {
    next: I,
}

impl<I: Index> Counter<I> {
    pub fn new() -> Self {
        Self { next: I::new(0) }
    }

    pub fn next(&mut self) -> I {
        let prev = self.next;
        self.next.increment_by(1);
        prev
    }

    /// The index that the next call to [`Counter::next`] will return.
    pub fn peek(&self) -> I {
        self.next
    }
}

impl<I: Index> Default for Counter<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    simple_index! {
        struct TestId;
    }

    #[test]
    fn counter_never_repeats() {
        let mut counter = Counter::<TestId>::new();

        let first = counter.next();
        let second = counter.next();

        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(counter.peek().index(), 2);
    }

    #[test]
    fn plus_does_not_mutate() {
        let id = TestId::new(4);

        assert_eq!(id.plus(3).index(), 7);
        assert_eq!(id.index(), 4);
    }
}
