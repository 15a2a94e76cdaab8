//! Ownership of the click listeners a document installs.
//!
//! Every listener is kept next to the element it is attached to, so that
//! clearing part of the page also drops the listeners of what was removed.

/// Listeners keyed by the element they listen on.
pub(crate) struct ListenerRegistry<E, L> {
    entries: Vec<(E, L)>,
}

impl<E, L> Default for ListenerRegistry<E, L> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E, L> ListenerRegistry<E, L> {
    pub(crate) fn insert(&mut self, element: E, listener: L) {
        self.entries.push((element, listener));
    }

    /// Remove and return the listeners of every element matching `released`.
    ///
    /// The caller drops them outside of any borrow of the registry.
    pub(crate) fn release_where(&mut self, mut released: impl FnMut(&E) -> bool) -> Vec<L> {
        let (gone, kept) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|(element, _)| released(element));
        self.entries = kept;
        gone.into_iter().map(|(_, listener)| listener).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn should_release_only_matching_elements() {
        let mut registry = ListenerRegistry::default();
        registry.insert("link-1", 1);
        registry.insert("button", 2);
        registry.insert("link-2", 3);

        let released = registry.release_where(|element| element.starts_with("link"));

        assert_eq!(released, vec![1, 3]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn should_drop_listeners_once_released_batch_is_dropped() {
        let token = Rc::new(());
        let mut registry = ListenerRegistry::default();
        for n in 0..10 {
            registry.insert(n, Rc::clone(&token));
        }

        drop(registry.release_where(|_| true));

        assert_eq!(Rc::strong_count(&token), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn should_stay_bounded_across_repeated_rerenders() {
        let mut registry = ListenerRegistry::default();
        for round in 0..100 {
            drop(registry.release_where(|&(r, _): &(i32, i32)| r < round));
            for link in 0..5 {
                registry.insert((round, link), ());
            }
        }
        assert_eq!(registry.len(), 5);
    }
}
