//! The bag (multiset) contract shared by every backing.
//!
//! A bag stores values together with a multiplicity (occurrence count).
//! Backings differ in how they index values (hashing, value order, value
//! order plus insertion order, or a mapped view of another bag), but all of
//! them expose the same operations through [`Bag`], so callers pick a
//! strategy at construction time and program against one interface.

use core::fmt;

/// Error returned when an operation is given a zero amount.
///
/// Amounts passed to [`Bag::insert_n`] and [`Bag::remove_n`] must be
/// strictly positive; zero is rejected before any mutation. On insertion the
/// error carries the value that was not inserted, so the caller keeps
/// ownership:
///
/// ```
/// use satchel::{Bag, HashBag, ZeroAmount};
///
/// let mut bag = HashBag::new();
/// let err = bag.insert_n("x", 0).unwrap_err();
/// assert_eq!(err, ZeroAmount("x"));
/// assert_eq!(err.into_inner(), "x");
/// assert!(bag.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroAmount<T = ()>(pub T);

impl<T> ZeroAmount<T> {
    /// Returns the value that could not be inserted.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for ZeroAmount<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "amount must be positive")
    }
}

impl<T: fmt::Debug> std::error::Error for ZeroAmount<T> {}

/// A multiset of values, each held with a strictly positive multiplicity.
///
/// # Contract
///
/// Implementations must guarantee:
/// - **No zero entries**: a value with multiplicity 0 is absent from
///   storage; [`count`](Bag::count) returns 0 for it.
/// - **Incremental totals**: [`len`](Bag::len) (elements, counting
///   duplicates) and [`num_values`](Bag::num_values) (distinct values) are
///   O(1) bookkeeping, never recomputed by traversal.
/// - **All-or-nothing mutation**: a call that reports failure or an error
///   leaves the bag exactly as it was. Bulk operations apply per entry;
///   each per-entry step is itself all-or-nothing.
///
/// Iteration order is backing-specific: arbitrary for [`HashBag`],
/// ascending value order for [`TreeBag`], first-insertion order for
/// [`LinkedBag`].
///
/// [`HashBag`]: crate::HashBag
/// [`TreeBag`]: crate::TreeBag
/// [`LinkedBag`]: crate::LinkedBag
pub trait Bag<V> {
    /// Iterator over `(value, multiplicity)` entries.
    type Iter<'a>: Iterator<Item = (&'a V, usize)>
    where
        Self: 'a,
        V: 'a;

    /// Returns the number of elements, counting duplicates.
    fn len(&self) -> usize;

    /// Returns the number of distinct values.
    fn num_values(&self) -> usize;

    /// Returns the multiplicity of `value`, or 0 if it is absent.
    fn count(&self, value: &V) -> usize;

    /// Inserts `amount` occurrences of `value`.
    ///
    /// Creates the entry if the value was absent, otherwise increments its
    /// multiplicity in place. Returns the prior multiplicity (0 for a new
    /// value). A zero `amount` returns [`ZeroAmount`] carrying `value` back
    /// and mutates nothing.
    fn insert_n(&mut self, value: V, amount: usize) -> Result<usize, ZeroAmount<V>>;

    /// Removes `amount` occurrences of `value`.
    ///
    /// Returns `Ok(true)` after decrementing, deleting the entry entirely
    /// when its multiplicity reaches 0. If fewer than `amount` occurrences
    /// are present the whole call is rejected without any partial decrement
    /// and `Ok(false)` is returned. A zero `amount` is an error and mutates
    /// nothing.
    fn remove_n(&mut self, value: &V, amount: usize) -> Result<bool, ZeroAmount>;

    /// Drops all entries.
    fn clear(&mut self);

    /// Keeps exactly the entries for which the predicate returns `true`.
    ///
    /// The predicate sees each distinct value with its multiplicity; a
    /// rejected entry is removed entirely. Presence-based retention against
    /// another bag is `bag.retain(|v, _| other.contains(v))`.
    fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&V, usize) -> bool;

    /// Iterates over distinct values and their multiplicities.
    ///
    /// The iterator is lazy and restartable; the bag cannot be mutated
    /// while it is live.
    fn iter(&self) -> Self::Iter<'_>;

    /// Returns `true` if the bag holds no elements.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if at least one occurrence of `value` is present.
    #[inline]
    fn contains(&self, value: &V) -> bool {
        self.count(value) > 0
    }

    /// Inserts one occurrence of `value`; returns the prior multiplicity.
    #[inline]
    fn insert(&mut self, value: V) -> usize {
        self.insert_n(value, 1).unwrap_or(0)
    }

    /// Removes one occurrence of `value`.
    ///
    /// Returns `false` without mutating if the value is absent.
    #[inline]
    fn remove(&mut self, value: &V) -> bool {
        self.remove_n(value, 1).unwrap_or(false)
    }

    /// Inserts one occurrence of every item in `values`.
    fn insert_each<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
    {
        for value in values {
            self.insert(value);
        }
    }

    /// Inserts `(value, amount)` entries in order.
    ///
    /// A zero amount aborts at the offending entry with its value handed
    /// back; entries already applied remain (bulk operations are per
    /// entry).
    fn insert_counts<I>(&mut self, entries: I) -> Result<(), ZeroAmount<V>>
    where
        I: IntoIterator<Item = (V, usize)>,
    {
        for (value, amount) in entries {
            self.insert_n(value, amount)?;
        }
        Ok(())
    }

    /// Removes one occurrence per item; absent items are ignored.
    ///
    /// Returns the number of occurrences removed.
    fn remove_each<'a, I>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = &'a V>,
        V: 'a,
    {
        let mut removed = 0;
        for value in values {
            if self.remove(value) {
                removed += 1;
            }
        }
        removed
    }

    /// Removes `(value, amount)` entries independently per value.
    ///
    /// Each entry is all-or-nothing: a value with fewer than `amount`
    /// occurrences is left untouched and not counted. Returns the number of
    /// entries fully removed. A zero amount aborts at the offending entry;
    /// entries already applied remain.
    fn remove_counts<'a, I>(&mut self, entries: I) -> Result<usize, ZeroAmount>
    where
        I: IntoIterator<Item = (&'a V, usize)>,
        V: 'a,
    {
        let mut removed = 0;
        for (value, amount) in entries {
            if self.remove_n(value, amount)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
