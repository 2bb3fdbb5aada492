//! Keyed accumulators for group-by aggregations.

use std::cmp::Ordering;

use hashbrown::HashMap;

/// An insertion-ordered collection of accumulators keyed by a grouping value.
///
/// Groups are stored in the order their key was first seen, so a stable sort of the finished
/// groups breaks ties by encounter order.
#[derive(Debug)]
pub struct Groups<A> {
    /// Position of each key in `entries`.
    index: HashMap<String, usize>,
    entries: Vec<(String, A)>,
}

impl<A> Groups<A> {
    /// Return an empty collection.
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Return the accumulator for `key`, creating it with `init` if the key is new.
    pub fn get_or_insert_with<F>(&mut self, key: &str, init: F) -> &mut A
    where
        F: FnOnce() -> A,
    {
        let position = match self.index.get(key) {
            Some(&position) => position,
            None => {
                let position = self.entries.len();
                self.index.insert(key.to_string(), position);
                self.entries.push((key.to_string(), init()));
                position
            }
        };
        &mut self.entries[position].1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the collection, returning the groups in a stable order defined by `compare`.
    pub fn into_sorted_by<F>(self, mut compare: F) -> Vec<(String, A)>
    where
        F: FnMut(&(String, A), &(String, A)) -> Ordering,
    {
        let mut entries = self.entries;
        entries.sort_by(|a, b| compare(a, b));
        entries
    }
}

impl<A: Default> Groups<A> {
    /// Return the accumulator for `key`, creating a default one if the key is new.
    pub fn get_or_default(&mut self, key: &str) -> &mut A {
        self.get_or_insert_with(key, A::default)
    }
}

impl<A> Default for Groups<A> {
    fn default() -> Self {
        Self::new()
    }
}
