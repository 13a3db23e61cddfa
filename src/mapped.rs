//! Value adapter: presents a bag of keys as a bag of values.
//!
//! The adapter owns a backing bag of keys `K` plus two closures. `inject`
//! builds the key for a borrowed value, which is how queries probe the
//! backing bag without taking ownership. `project` goes the other way,
//! borrowing the value back out of a stored key, which is how iteration
//! and `retain` present entries. The backing bag supplies the semantics
//! (ordering, hashing, arrival order) for the *keys*; the adapter only
//! translates at the boundary.

use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::bag::{Bag, ZeroAmount};

/// Bag of values stored and organized as derived keys.
///
/// `inject` must be injective over the values in use: two values that map
/// to equal keys are the same entry as far as the backing bag can tell.
/// Since `project` borrows the value out of the key, the key type embeds
/// the value (or is the value under a different comparison).
///
/// The usual shape is a newtype that reorders or regroups values without
/// changing what callers see.
///
/// # Example
///
/// ```
/// use core::cmp::Reverse;
/// use satchel::{Bag, MappedBag, TreeBag};
///
/// // A sorted bag that iterates in descending order.
/// let mut bag = MappedBag::new(
///     TreeBag::new(),
///     |v: &i32| Reverse(*v),
///     |k: &Reverse<i32>| &k.0,
/// );
/// bag.insert_each([1, 3, 2, 3]);
///
/// let order: Vec<_> = bag.iter().map(|(v, n)| (*v, n)).collect();
/// assert_eq!(order, vec![(3, 2), (2, 1), (1, 1)]);
/// ```
pub struct MappedBag<K, B, I, P> {
    inner: B,
    inject: I,
    project: P,
    _marker: PhantomData<K>,
}

impl<K, B, I, P> MappedBag<K, B, I, P> {
    /// Wraps `inner`, translating values with the closure pair.
    ///
    /// The bounds check closure arguments against the borrowing signatures
    /// [`Bag`] requires right at the construction site, which is what lets
    /// inline closures infer them.
    pub fn new<V>(inner: B, inject: I, project: P) -> Self
    where
        I: Fn(&V) -> K,
        P: for<'r> Fn(&'r K) -> &'r V,
    {
        Self {
            inner,
            inject,
            project,
            _marker: PhantomData,
        }
    }

    /// Borrows the backing bag of keys.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Consumes the adapter, returning the backing bag of keys.
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<V, K, B, I, P> Bag<V> for MappedBag<K, B, I, P>
where
    B: Bag<K>,
    I: Fn(&V) -> K,
    P: for<'r> Fn(&'r K) -> &'r V,
{
    type Iter<'a> = Iter<'a, B::Iter<'a>, P>
    where
        Self: 'a,
        V: 'a;

    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    fn num_values(&self) -> usize {
        self.inner.num_values()
    }

    fn count(&self, value: &V) -> usize {
        self.inner.count(&(self.inject)(value))
    }

    fn insert_n(&mut self, value: V, amount: usize) -> Result<usize, ZeroAmount<V>> {
        let key = (self.inject)(&value);
        // On rejection the untranslated value goes back to the caller.
        self.inner
            .insert_n(key, amount)
            .map_err(|_| ZeroAmount(value))
    }

    fn remove_n(&mut self, value: &V, amount: usize) -> Result<bool, ZeroAmount> {
        self.inner.remove_n(&(self.inject)(value), amount)
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&V, usize) -> bool,
    {
        let project = &self.project;
        self.inner.retain(|key, count| f(project(key), count));
    }

    fn iter(&self) -> Iter<'_, B::Iter<'_>, P> {
        Iter {
            inner: self.inner.iter(),
            project: &self.project,
        }
    }
}

impl<K, B: fmt::Debug, I, P> fmt::Debug for MappedBag<K, B, I, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedBag")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<K, B: Clone, I: Clone, P: Clone> Clone for MappedBag<K, B, I, P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            inject: self.inject.clone(),
            project: self.project.clone(),
            _marker: PhantomData,
        }
    }
}

/// Iterator over a [`MappedBag`], projecting each stored key back to its
/// value. Order comes from the backing bag.
pub struct Iter<'a, It, P> {
    inner: It,
    project: &'a P,
}

impl<'a, K, V, It, P> Iterator for Iter<'a, It, P>
where
    K: 'a,
    V: 'a,
    It: Iterator<Item = (&'a K, usize)>,
    P: Fn(&'a K) -> &'a V,
{
    type Item = (&'a V, usize);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(key, count)| ((self.project)(key), count))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V, It, P> ExactSizeIterator for Iter<'a, It, P>
where
    K: 'a,
    V: 'a,
    It: ExactSizeIterator<Item = (&'a K, usize)>,
    P: Fn(&'a K) -> &'a V,
{
}

impl<'a, K, V, It, P> FusedIterator for Iter<'a, It, P>
where
    K: 'a,
    V: 'a,
    It: FusedIterator<Item = (&'a K, usize)>,
    P: Fn(&'a K) -> &'a V,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashBag;
    use crate::linked::LinkedBag;
    use crate::tree::TreeBag;
    use core::cmp::Reverse;

    fn descending() -> MappedBag<
        Reverse<i32>,
        TreeBag<Reverse<i32>>,
        impl Fn(&i32) -> Reverse<i32>,
        impl for<'r> Fn(&'r Reverse<i32>) -> &'r i32,
    > {
        MappedBag::new(
            TreeBag::new(),
            |v: &i32| Reverse(*v),
            |k: &Reverse<i32>| &k.0,
        )
    }

    fn spread<V, B: Bag<V>>(bag: &B) -> (usize, usize) {
        (bag.num_values(), bag.iter().map(|(_, n)| n).sum())
    }

    #[test]
    fn generic_bag_code_accepts_the_adapter() {
        // Inline closures, no helper annotations: construction alone must
        // leave the adapter usable behind a plain `Bag<V>` bound.
        let mut bag = MappedBag::new(
            TreeBag::new(),
            |v: &i32| Reverse(*v),
            |k: &Reverse<i32>| &k.0,
        );
        bag.insert_counts([(4, 2), (9, 1)]).unwrap();
        assert_eq!(spread(&bag), (2, 3));
    }

    #[test]
    fn orders_by_the_injected_key() {
        let mut bag = descending();
        bag.insert_each([5, 1, 3]);
        let order: Vec<_> = bag.iter().map(|(v, _)| *v).collect();
        assert_eq!(order, vec![5, 3, 1]);
    }

    #[test]
    fn queries_probe_without_owning() {
        let mut bag = descending();
        bag.insert_n(7, 2).unwrap();

        assert_eq!(bag.count(&7), 2);
        assert!(bag.contains(&7));
        assert!(!bag.contains(&8));
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.num_values(), 1);

        assert_eq!(bag.remove_n(&7, 1), Ok(true));
        assert_eq!(bag.count(&7), 1);
        assert_eq!(bag.remove_n(&7, 5), Ok(false));
    }

    #[test]
    fn zero_amount_returns_the_original_value() {
        let mut bag = MappedBag::new(
            TreeBag::new(),
            |v: &String| Reverse(v.clone()),
            |k: &Reverse<String>| &k.0,
        );
        let err = bag.insert_n(String::from("kept"), 0).unwrap_err();
        assert_eq!(err.into_inner(), "kept");
        assert_eq!(bag.remove_n(&String::from("kept"), 0), Err(ZeroAmount(())));
        assert!(bag.is_empty());
    }

    #[test]
    fn arrival_order_passes_through_a_linked_backing() {
        let mut bag = MappedBag::new(
            LinkedBag::new(),
            |v: &i32| Reverse(*v),
            |k: &Reverse<i32>| &k.0,
        );
        bag.insert_each([9, 2, 9, 5]);
        let order: Vec<_> = bag.iter().map(|(v, n)| (*v, n)).collect();
        assert_eq!(order, vec![(9, 2), (2, 1), (5, 1)]);
    }

    #[test]
    fn hashed_backing_counts_through_the_adapter() {
        let mut bag = MappedBag::new(
            HashBag::new(),
            |v: &i32| Reverse(*v),
            |k: &Reverse<i32>| &k.0,
        );
        bag.insert_counts([(4, 2), (6, 1)]).unwrap();
        assert_eq!(bag.count(&4), 2);
        assert_eq!(bag.remove_each([&4, &6, &8]), 2);
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn grouping_key_can_reorder_without_losing_originals() {
        // Case-insensitive grouping: the key carries the folded form first
        // and the original second, so case variants sort adjacently while
        // staying distinct entries.
        let mut bag = MappedBag::new(
            TreeBag::new(),
            |v: &String| (v.to_lowercase(), v.clone()),
            |k: &(String, String)| &k.1,
        );
        bag.insert_each(["Beta", "alpha", "ALPHA", "beta"].map(String::from));

        let order: Vec<_> = bag.iter().map(|(v, _)| v.as_str()).collect();
        assert_eq!(order, vec!["ALPHA", "alpha", "Beta", "beta"]);
        assert_eq!(bag.num_values(), 4);
        assert!(bag.contains(&String::from("ALPHA")));
        assert!(!bag.contains(&String::from("Alpha")));
    }

    #[test]
    fn retain_sees_projected_values() {
        let mut bag = descending();
        bag.insert_counts([(1, 1), (2, 2), (3, 3)]).unwrap();
        bag.retain(|v, n| *v != 2 && n > 0);
        let order: Vec<_> = bag.iter().map(|(v, n)| (*v, n)).collect();
        assert_eq!(order, vec![(3, 3), (1, 1)]);
    }

    #[test]
    fn into_inner_exposes_the_keys() {
        let mut bag = descending();
        bag.insert(4);
        let keys = bag.into_inner();
        assert_eq!(keys.count(&Reverse(4)), 1);
    }

    #[test]
    fn clear_empties_the_backing() {
        let mut bag = descending();
        bag.insert_each([1, 2]);
        bag.clear();
        assert!(bag.is_empty());
        assert_eq!(bag.iter().next(), None);
    }
}
