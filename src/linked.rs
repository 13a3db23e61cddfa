//! Insertion-ordered multiset: the red-black engine plus an intrusive
//! doubly-linked thread through its nodes.
//!
//! The thread records *first arrival*: a value is appended to the tail the
//! moment its multiplicity goes from zero to positive and holds that
//! position while the multiplicity stays positive. Bumping the counter,
//! partial removals, and rebalancing rotations never move a value; only
//! dropping to zero unlinks it, and a later re-insertion re-enters at the
//! tail like any newcomer.
//!
//! The thread lives in the nodes' extension payload, so it survives tree
//! restructuring untouched: rotations rewire parent/child links only, and
//! full removal relocates the in-order successor without changing its
//! handle.

use core::fmt;
use core::iter::FusedIterator;

use crate::bag::{Bag, ZeroAmount};
use crate::tree::{TreeCore, NIL};

/// Thread links carried in each node's extension slot.
#[derive(Clone, Copy)]
pub(crate) struct Links {
    prev: usize,
    next: usize,
}

impl Default for Links {
    fn default() -> Self {
        Self {
            prev: NIL,
            next: NIL,
        }
    }
}

/// Multiset that iterates in first-insertion order.
///
/// Sorted-bag lookups and mutations cost the same O(log n) as
/// [`TreeBag`](crate::TreeBag); the extra thread makes arrival-order
/// iteration O(1) per step and costs two words per distinct value.
///
/// # Example
///
/// ```
/// use satchel::{Bag, LinkedBag};
///
/// let mut bag = LinkedBag::new();
/// bag.insert("b");
/// bag.insert("a");
/// bag.insert("b"); // "b" keeps its original position
///
/// let order: Vec<_> = bag.iter().map(|(v, n)| (*v, n)).collect();
/// assert_eq!(order, vec![("b", 2), ("a", 1)]);
///
/// let sorted: Vec<_> = bag.iter_sorted().map(|(v, n)| (*v, n)).collect();
/// assert_eq!(sorted, vec![("a", 1), ("b", 2)]);
/// ```
#[derive(Clone)]
pub struct LinkedBag<V> {
    core: TreeCore<V, Links>,
    head: usize,
    tail: usize,
}

impl<V> LinkedBag<V> {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self {
            core: TreeCore::new(),
            head: NIL,
            tail: NIL,
        }
    }

    /// Returns the earliest-arriving value still present and its
    /// multiplicity.
    pub fn oldest(&self) -> Option<(&V, usize)> {
        if self.head == NIL {
            None
        } else {
            Some(self.core.entry(self.head))
        }
    }

    /// Returns the latest-arriving value and its multiplicity.
    pub fn newest(&self) -> Option<(&V, usize)> {
        if self.tail == NIL {
            None
        } else {
            Some(self.core.entry(self.tail))
        }
    }

    /// Iterates entries in ascending value order instead of insertion
    /// order.
    pub fn iter_sorted(&self) -> SortedIter<'_, V> {
        SortedIter {
            core: &self.core,
            cur: self.core.first(),
            remaining: self.core.num_values(),
        }
    }

    fn entries(&self) -> Iter<'_, V> {
        Iter {
            core: &self.core,
            cur: self.head,
            remaining: self.core.num_values(),
        }
    }

    fn link_tail(&mut self, handle: usize) {
        let tail = self.tail;
        let links = self.core.ext_mut(handle);
        links.prev = tail;
        links.next = NIL;
        if tail == NIL {
            self.head = handle;
        } else {
            self.core.ext_mut(tail).next = handle;
        }
        self.tail = handle;
    }

    fn unlink(&mut self, handle: usize) {
        let Links { prev, next } = *self.core.ext(handle);
        if prev == NIL {
            self.head = next;
        } else {
            self.core.ext_mut(prev).next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.core.ext_mut(next).prev = prev;
        }
    }
}

impl<V: Ord> LinkedBag<V> {
    /// Amount is already validated positive.
    fn add(&mut self, value: V, amount: usize) -> usize {
        let (handle, prior) = self.core.insert(value, amount);
        if prior == 0 {
            self.link_tail(handle);
        }
        prior
    }
}

impl<V: Ord> Bag<V> for LinkedBag<V> {
    type Iter<'a> = Iter<'a, V>
    where
        Self: 'a,
        V: 'a;

    #[inline]
    fn len(&self) -> usize {
        self.core.len()
    }

    #[inline]
    fn num_values(&self) -> usize {
        self.core.num_values()
    }

    fn count(&self, value: &V) -> usize {
        let handle = self.core.find(value);
        if handle == NIL {
            0
        } else {
            self.core.count(handle)
        }
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
        let handle = self.core.find(value);
        if handle == NIL {
            return Ok(false);
        }
        let count = self.core.count(handle);
        if count < amount {
            return Ok(false);
        }
        if amount < count {
            self.core.decrement(handle, amount);
        } else {
            // Unlink first; the node's slot dies with remove_node.
            self.unlink(handle);
            self.core.remove_node(handle);
        }
        Ok(true)
    }

    fn clear(&mut self) {
        self.core.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&V, usize) -> bool,
    {
        // Entries are offered in insertion order, matching iteration.
        let mut victims = Vec::new();
        let mut handle = self.head;
        while handle != NIL {
            let (value, count) = self.core.entry(handle);
            if !f(value, count) {
                victims.push(handle);
            }
            handle = self.core.ext(handle).next;
        }
        for handle in victims {
            self.unlink(handle);
            self.core.remove_node(handle);
        }
    }

    fn iter(&self) -> Iter<'_, V> {
        self.entries()
    }
}

impl<V> Default for LinkedBag<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for LinkedBag<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

/// Content equality: arrival order does not participate.
impl<V: PartialEq> PartialEq for LinkedBag<V> {
    fn eq(&self, other: &Self) -> bool {
        self.core.len() == other.core.len()
            && self.core.num_values() == other.core.num_values()
            && self.iter_sorted().eq(other.iter_sorted())
    }
}

impl<V: Eq> Eq for LinkedBag<V> {}

impl<V: Ord> Extend<V> for LinkedBag<V> {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        for value in iter {
            self.add(value, 1);
        }
    }
}

/// Pairs with a zero count are ignored: zero multiplicity means absent.
impl<V: Ord> Extend<(V, usize)> for LinkedBag<V> {
    fn extend<I: IntoIterator<Item = (V, usize)>>(&mut self, iter: I) {
        for (value, amount) in iter {
            if amount > 0 {
                self.add(value, amount);
            }
        }
    }
}

impl<V: Ord> FromIterator<V> for LinkedBag<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut bag = Self::new();
        bag.extend(iter);
        bag
    }
}

impl<V: Ord> FromIterator<(V, usize)> for LinkedBag<V> {
    fn from_iter<I: IntoIterator<Item = (V, usize)>>(iter: I) -> Self {
        let mut bag = Self::new();
        bag.extend(iter);
        bag
    }
}

impl<'a, V> IntoIterator for &'a LinkedBag<V> {
    type Item = (&'a V, usize);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.entries()
    }
}

/// Insertion-ordered iterator over a [`LinkedBag`]'s entries.
pub struct Iter<'a, V> {
    core: &'a TreeCore<V, Links>,
    cur: usize,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a V, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == NIL {
            return None;
        }
        let entry = self.core.entry(self.cur);
        self.cur = self.core.ext(self.cur).next;
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
impl<V> FusedIterator for Iter<'_, V> {}

/// Value-ordered iterator over a [`LinkedBag`]'s entries.
pub struct SortedIter<'a, V> {
    core: &'a TreeCore<V, Links>,
    cur: usize,
    remaining: usize,
}

impl<'a, V> Iterator for SortedIter<'a, V> {
    type Item = (&'a V, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == NIL {
            return None;
        }
        let entry = self.core.entry(self.cur);
        self.cur = self.core.next(self.cur);
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for SortedIter<'_, V> {}
impl<V> FusedIterator for SortedIter<'_, V> {}

#[cfg(test)]
impl<V: Ord> LinkedBag<V> {
    /// Checks the tree invariants plus the thread: prev/next symmetry,
    /// head/tail endpoints, and full coverage of the live nodes.
    fn validate(&self) {
        self.core.validate();
        let mut errors: Vec<String> = Vec::new();
        let mut walked = 0usize;
        let mut prev = NIL;
        let mut cur = self.head;
        while cur != NIL {
            let links = self.core.ext(cur);
            if links.prev != prev {
                errors.push(format!("bad prev link at handle {cur}"));
            }
            walked += 1;
            if walked > self.core.num_values() {
                errors.push("thread longer than node count".into());
                break;
            }
            prev = cur;
            cur = links.next;
        }
        if self.tail != prev {
            errors.push("tail does not end the thread".into());
        }
        if walked != self.core.num_values() {
            errors.push(format!(
                "thread length {} != node count {}",
                walked,
                self.core.num_values()
            ));
        }
        assert!(
            errors.is_empty(),
            "thread invariant violations:\n{}",
            errors.join("\n")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn order_of(bag: &LinkedBag<i32>) -> Vec<(i32, usize)> {
        bag.iter().map(|(v, n)| (*v, n)).collect()
    }

    #[test]
    fn empty_bag() {
        let bag: LinkedBag<i32> = LinkedBag::new();
        assert!(bag.is_empty());
        assert_eq!(bag.iter().next(), None);
        assert_eq!(bag.iter_sorted().next(), None);
        assert_eq!(bag.oldest(), None);
        assert_eq!(bag.newest(), None);
        bag.validate();
    }

    #[test]
    fn iterates_in_insertion_order() {
        let mut bag = LinkedBag::new();
        bag.insert_each([30, 10, 20]);
        assert_eq!(order_of(&bag), vec![(30, 1), (10, 1), (20, 1)]);

        let sorted: Vec<_> = bag.iter_sorted().map(|(v, n)| (*v, n)).collect();
        assert_eq!(sorted, vec![(10, 1), (20, 1), (30, 1)]);
        bag.validate();
    }

    #[test]
    fn duplicate_keeps_original_position() {
        let mut bag = LinkedBag::new();
        bag.insert_each([5, 8, 5, 9, 5]);
        assert_eq!(order_of(&bag), vec![(5, 3), (8, 1), (9, 1)]);
        assert_eq!(bag.len(), 5);
        bag.validate();
    }

    #[test]
    fn partial_removal_keeps_position() {
        let mut bag = LinkedBag::new();
        bag.insert_n(1, 3).unwrap();
        bag.insert(2);

        bag.remove_n(&1, 2).unwrap();
        assert_eq!(order_of(&bag), vec![(1, 1), (2, 1)]);
        bag.validate();
    }

    #[test]
    fn reinsertion_moves_to_tail() {
        let mut bag = LinkedBag::new();
        bag.insert_each([1, 2, 3]);

        assert!(bag.remove(&1));
        assert_eq!(order_of(&bag), vec![(2, 1), (3, 1)]);

        bag.insert(1); // Gone and back: arrives as a newcomer
        assert_eq!(order_of(&bag), vec![(2, 1), (3, 1), (1, 1)]);
        bag.validate();
    }

    #[test]
    fn removing_interior_value_relinks_neighbors() {
        let mut bag = LinkedBag::new();
        bag.insert_each([1, 2, 3]);
        bag.remove(&2);
        assert_eq!(order_of(&bag), vec![(1, 1), (3, 1)]);
        assert_eq!(bag.oldest(), Some((&1, 1)));
        assert_eq!(bag.newest(), Some((&3, 1)));
        bag.validate();
    }

    #[test]
    fn removing_head_and_tail_updates_endpoints() {
        let mut bag = LinkedBag::new();
        bag.insert_each([4, 5, 6]);

        bag.remove(&4);
        assert_eq!(bag.oldest(), Some((&5, 1)));
        bag.remove(&6);
        assert_eq!(bag.newest(), Some((&5, 1)));
        assert_eq!(order_of(&bag), vec![(5, 1)]);
        bag.validate();

        bag.remove(&5);
        assert_eq!(bag.oldest(), None);
        assert_eq!(bag.newest(), None);
        bag.validate();
    }

    #[test]
    fn order_survives_tree_restructuring() {
        // Removing a value whose node has two children relocates its
        // in-order successor inside the tree; the thread must not notice.
        let mut bag = LinkedBag::new();
        bag.insert_each([50, 30, 70, 20, 40, 60, 80]);

        assert!(bag.remove(&50));
        assert_eq!(
            order_of(&bag),
            vec![(30, 1), (70, 1), (20, 1), (40, 1), (60, 1), (80, 1)]
        );
        bag.validate();

        assert!(bag.remove(&30));
        assert_eq!(
            order_of(&bag),
            vec![(70, 1), (20, 1), (40, 1), (60, 1), (80, 1)]
        );
        bag.validate();
    }

    #[test]
    fn zero_amounts_error_without_mutating() {
        let mut bag = LinkedBag::new();
        assert_eq!(bag.insert_n(1, 0), Err(ZeroAmount(1)));
        assert_eq!(bag.remove_n(&1, 0), Err(ZeroAmount(())));
        assert!(bag.is_empty());
        bag.validate();
    }

    #[test]
    fn insufficient_removal_is_rejected_whole() {
        let mut bag = LinkedBag::new();
        bag.insert_n(7, 2).unwrap();
        assert_eq!(bag.remove_n(&7, 3), Ok(false));
        assert_eq!(bag.count(&7), 2);
        bag.validate();
    }

    #[test]
    fn clear_resets_the_thread() {
        let mut bag = LinkedBag::new();
        bag.insert_each([1, 2, 3]);
        bag.clear();
        assert!(bag.is_empty());
        assert_eq!(bag.oldest(), None);
        bag.validate();

        bag.insert(9);
        assert_eq!(order_of(&bag), vec![(9, 1)]);
    }

    #[test]
    fn retain_preserves_survivor_order() {
        let mut bag = LinkedBag::new();
        bag.insert_each([9, 4, 7, 2, 5]);
        bag.retain(|v, _| v % 2 != 0);
        assert_eq!(order_of(&bag), vec![(9, 1), (7, 1), (5, 1)]);
        bag.validate();
    }

    #[test]
    fn equality_ignores_arrival_order() {
        let a: LinkedBag<i32> = [1, 2, 2, 3].into_iter().collect();
        let b: LinkedBag<i32> = [3, 2, 1, 2].into_iter().collect();
        let c: LinkedBag<i32> = [3, 2, 1].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn debug_renders_in_insertion_order() {
        let mut bag = LinkedBag::new();
        bag.insert(9);
        bag.insert_n(1, 2).unwrap();
        assert_eq!(format!("{bag:?}"), "{9: 1, 1: 2}");
    }

    #[test]
    fn seeded_churn_keeps_thread_and_tree_consistent() {
        let mut rng = SmallRng::seed_from_u64(777);
        let mut bag = LinkedBag::new();
        // Arrival-ordered model, linear scans are fine at this size.
        let mut model: Vec<(u8, usize)> = Vec::new();

        for _ in 0..4000 {
            let value: u8 = rng.gen_range(0..48);
            if rng.gen_bool(0.55) {
                let amount = rng.gen_range(1..4);
                bag.insert_n(value, amount).unwrap();
                match model.iter_mut().find(|(v, _)| *v == value) {
                    Some(entry) => entry.1 += amount,
                    None => model.push((value, amount)),
                }
            } else {
                let amount = rng.gen_range(1..4);
                let removed = bag.remove_n(&value, amount).unwrap();
                let pos = model.iter().position(|(v, _)| *v == value);
                match pos {
                    Some(pos) if model[pos].1 >= amount => {
                        assert!(removed);
                        if model[pos].1 == amount {
                            model.remove(pos);
                        } else {
                            model[pos].1 -= amount;
                        }
                    }
                    _ => assert!(!removed),
                }
            }
        }

        bag.validate();
        let entries: Vec<_> = bag.iter().map(|(v, n)| (*v, n)).collect();
        assert_eq!(entries, model);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i16, usize),
        Remove(i16, usize),
        Clear,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (any::<i16>(), 1..4usize).prop_map(|(v, n)| Op::Insert(v % 24, n)),
            3 => (any::<i16>(), 1..4usize).prop_map(|(v, n)| Op::Remove(v % 24, n)),
            1 => Just(Op::Clear),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn matches_arrival_order_model(ops in prop::collection::vec(op_strategy(), 0..250)) {
            let mut bag = LinkedBag::new();
            let mut model: Vec<(i16, usize)> = Vec::new();

            for op in ops {
                match op {
                    Op::Insert(v, n) => {
                        let prior = bag.insert_n(v, n).unwrap();
                        match model.iter_mut().find(|(mv, _)| *mv == v) {
                            Some(entry) => {
                                prop_assert_eq!(prior, entry.1);
                                entry.1 += n;
                            }
                            None => {
                                prop_assert_eq!(prior, 0);
                                model.push((v, n));
                            }
                        }
                    }
                    Op::Remove(v, n) => {
                        let removed = bag.remove_n(&v, n).unwrap();
                        let pos = model.iter().position(|(mv, _)| *mv == v);
                        match pos {
                            Some(pos) if model[pos].1 >= n => {
                                prop_assert!(removed);
                                if model[pos].1 == n {
                                    model.remove(pos);
                                } else {
                                    model[pos].1 -= n;
                                }
                            }
                            _ => prop_assert!(!removed),
                        }
                    }
                    Op::Clear => {
                        bag.clear();
                        model.clear();
                    }
                }
                bag.validate();
                prop_assert_eq!(bag.num_values(), model.len());
                prop_assert_eq!(bag.len(), model.iter().map(|(_, n)| n).sum::<usize>());
            }

            let entries: Vec<_> = bag.iter().map(|(v, n)| (*v, n)).collect();
            prop_assert_eq!(entries, model.clone());

            let sorted: Vec<_> = bag.iter_sorted().map(|(v, n)| (*v, n)).collect();
            let mut expected = model;
            expected.sort_unstable();
            prop_assert_eq!(sorted, expected);
        }
    }
}
