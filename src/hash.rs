//! Hashed multiset: a value-to-multiplicity map plus a running element
//! total, for when ordering is not worth a tree.

use core::fmt;
use core::hash::Hash;
use core::iter::FusedIterator;
use std::collections::hash_map;
use std::collections::HashMap;

use crate::bag::{Bag, ZeroAmount};

/// Unordered multiset with O(1) expected lookups and mutations.
///
/// Iteration order is arbitrary, like the underlying [`HashMap`]. Both
/// sizes are tracked incrementally: [`len`](Bag::len) never walks the
/// table.
///
/// # Example
///
/// ```
/// use satchel::{Bag, HashBag};
///
/// let mut bag = HashBag::new();
/// bag.insert("red");
/// bag.insert_n("blue", 2).unwrap();
///
/// assert_eq!(bag.len(), 3);
/// assert_eq!(bag.num_values(), 2);
/// assert_eq!(bag.count(&"blue"), 2);
///
/// assert!(bag.remove(&"red"));
/// assert!(!bag.contains(&"red"));
/// ```
#[derive(Clone)]
pub struct HashBag<V> {
    map: HashMap<V, usize>,
    total: usize,
}

impl<V> HashBag<V> {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            total: 0,
        }
    }

    /// Creates an empty bag with room for `capacity` distinct values
    /// before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            total: 0,
        }
    }
}

impl<V: Eq + Hash> HashBag<V> {
    /// Amount is already validated positive.
    fn add(&mut self, value: V, amount: usize) -> usize {
        let slot = self.map.entry(value).or_insert(0);
        let prior = *slot;
        *slot += amount;
        self.total += amount;
        prior
    }
}

impl<V: Eq + Hash> Bag<V> for HashBag<V> {
    type Iter<'a> = Iter<'a, V>
    where
        Self: 'a,
        V: 'a;

    #[inline]
    fn len(&self) -> usize {
        self.total
    }

    #[inline]
    fn num_values(&self) -> usize {
        self.map.len()
    }

    fn count(&self, value: &V) -> usize {
        self.map.get(value).copied().unwrap_or(0)
    }

    fn insert_n(&mut self, value: V, amount: usize) -> Result<usize, ZeroAmount<V>> {
        if amount == 0 {
            return Err(ZeroAmount(value));
        }
        Ok(self.add(value, amount))
    }

    fn remove_n(&mut self, value: &V, amount: usize) -> Result<bool, ZeroAmount> {
        if amount == 0 {
            return Err(ZeroAmount(()));
        }
        match self.map.get_mut(value) {
            Some(count) if *count > amount => {
                *count -= amount;
                self.total -= amount;
                Ok(true)
            }
            Some(count) if *count == amount => {
                self.map.remove(value);
                self.total -= amount;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn clear(&mut self) {
        self.map.clear();
        self.total = 0;
    }

    fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&V, usize) -> bool,
    {
        let mut dropped = 0;
        self.map.retain(|value, count| {
            if f(value, *count) {
                true
            } else {
                dropped += *count;
                false
            }
        });
        self.total -= dropped;
    }

    fn iter(&self) -> Iter<'_, V> {
        Iter {
            inner: self.map.iter(),
        }
    }
}

impl<V> Default for HashBag<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for HashBag<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.map.iter().map(|(value, count)| (value, *count)))
            .finish()
    }
}

impl<V: Eq + Hash> PartialEq for HashBag<V> {
    fn eq(&self, other: &Self) -> bool {
        self.total == other.total
            && self.map.len() == other.map.len()
            && self
                .map
                .iter()
                .all(|(value, count)| other.map.get(value) == Some(count))
    }
}

impl<V: Eq + Hash> Eq for HashBag<V> {}

impl<V: Eq + Hash> Extend<V> for HashBag<V> {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        for value in iter {
            self.add(value, 1);
        }
    }
}

/// Pairs with a zero count are ignored: zero multiplicity means absent.
impl<V: Eq + Hash> Extend<(V, usize)> for HashBag<V> {
    fn extend<I: IntoIterator<Item = (V, usize)>>(&mut self, iter: I) {
        for (value, amount) in iter {
            if amount > 0 {
                self.add(value, amount);
            }
        }
    }
}

impl<V: Eq + Hash> FromIterator<V> for HashBag<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut bag = Self::new();
        bag.extend(iter);
        bag
    }
}

impl<V: Eq + Hash> FromIterator<(V, usize)> for HashBag<V> {
    fn from_iter<I: IntoIterator<Item = (V, usize)>>(iter: I) -> Self {
        let mut bag = Self::new();
        bag.extend(iter);
        bag
    }
}

impl<'a, V: Eq + Hash> IntoIterator for &'a HashBag<V> {
    type Item = (&'a V, usize);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

/// Iterator over a [`HashBag`]'s entries, in arbitrary order.
pub struct Iter<'a, V> {
    inner: hash_map::Iter<'a, V, usize>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a V, usize);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(value, count)| (value, *count))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
impl<V> FusedIterator for Iter<'_, V> {}
