//! Ordered multiset storage: a multiplicity-augmented red-black tree.
//!
//! The engine keeps every node in a [`slab::Slab`] arena and wires the
//! tree with plain `usize` handles instead of pointers. Handles are
//! stable: a value keeps its handle from first insertion until its
//! multiplicity reaches zero, across any number of rotations. Each node
//! carries an extension payload `X` the tree machinery never touches,
//! which is how the insertion-order thread in [`LinkedBag`] rides along
//! for free.
//!
//! [`TreeBag`] is the plain sorted bag over this engine (`X = ()`).
//!
//! [`LinkedBag`]: crate::LinkedBag

use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;

use slab::Slab;

use crate::bag::{Bag, ZeroAmount};

/// Null handle. Slab keys are dense and start at zero, so the all-ones
/// pattern can never address a live node.
pub(crate) const NIL: usize = usize::MAX;

#[derive(Clone)]
struct Node<V, X> {
    value: V,
    count: usize,
    parent: usize,
    left: usize,
    right: usize,
    red: bool,
    ext: X,
}

/// Red-black tree over an arena, one node per distinct value.
///
/// The tree orders nodes by `V: Ord` and keeps a multiplicity counter per
/// node plus a running element total; both are plain bookkeeping, never
/// recomputed by traversal. Callers are expected to validate amounts before
/// calling in (zero amounts are a wrapper concern).
#[derive(Clone)]
pub(crate) struct TreeCore<V, X = ()> {
    arena: Slab<Node<V, X>>,
    root: usize,
    total: usize,
}

impl<V, X> TreeCore<V, X> {
    pub(crate) fn new() -> Self {
        Self {
            arena: Slab::new(),
            root: NIL,
            total: 0,
        }
    }

    /// Number of elements, counting duplicates.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.total
    }

    /// Number of distinct values, i.e. live nodes.
    #[inline]
    pub(crate) fn num_values(&self) -> usize {
        self.arena.len()
    }

    pub(crate) fn clear(&mut self) {
        self.arena.clear();
        self.root = NIL;
        self.total = 0;
    }

    #[inline]
    pub(crate) fn count(&self, handle: usize) -> usize {
        self.arena[handle].count
    }

    #[inline]
    pub(crate) fn entry(&self, handle: usize) -> (&V, usize) {
        let node = &self.arena[handle];
        (&node.value, node.count)
    }

    #[inline]
    pub(crate) fn ext(&self, handle: usize) -> &X {
        &self.arena[handle].ext
    }

    #[inline]
    pub(crate) fn ext_mut(&mut self, handle: usize) -> &mut X {
        &mut self.arena[handle].ext
    }

    /// Handle of the minimum value, or `NIL` when empty.
    pub(crate) fn first(&self) -> usize {
        if self.root == NIL {
            NIL
        } else {
            self.min_of(self.root)
        }
    }

    /// Handle of the maximum value, or `NIL` when empty.
    pub(crate) fn last(&self) -> usize {
        let mut cur = self.root;
        if cur == NIL {
            return NIL;
        }
        while self.arena[cur].right != NIL {
            cur = self.arena[cur].right;
        }
        cur
    }

    /// In-order successor, or `NIL` past the maximum.
    pub(crate) fn next(&self, handle: usize) -> usize {
        let right = self.arena[handle].right;
        if right != NIL {
            return self.min_of(right);
        }
        let mut cur = handle;
        let mut parent = self.arena[cur].parent;
        while parent != NIL && cur == self.arena[parent].right {
            cur = parent;
            parent = self.arena[parent].parent;
        }
        parent
    }

    /// Decrements a node's multiplicity in place. The caller must leave the
    /// count strictly positive; dropping to zero goes through
    /// [`remove_node`](Self::remove_node) instead.
    pub(crate) fn decrement(&mut self, handle: usize, amount: usize) {
        debug_assert!(amount < self.arena[handle].count);
        self.arena[handle].count -= amount;
        self.total -= amount;
    }

    /// Removes a node outright, returning its value and multiplicity.
    ///
    /// When the node has two children its in-order successor is relocated
    /// into the vacated position. The successor keeps its own handle, so
    /// handles held elsewhere (the insertion-order thread) stay valid with
    /// no repair.
    pub(crate) fn remove_node(&mut self, z: usize) -> (V, usize) {
        self.total -= self.arena[z].count;

        // y is the node physically unlinked from its tree position; x
        // (possibly NIL) takes its place, hanging under x_parent.
        let y_was_black;
        let x;
        let x_parent;

        if self.arena[z].left == NIL {
            y_was_black = !self.arena[z].red;
            x = self.arena[z].right;
            x_parent = self.arena[z].parent;
            self.transplant(z, x);
        } else if self.arena[z].right == NIL {
            y_was_black = !self.arena[z].red;
            x = self.arena[z].left;
            x_parent = self.arena[z].parent;
            self.transplant(z, x);
        } else {
            let y = self.min_of(self.arena[z].right);
            y_was_black = !self.arena[y].red;
            x = self.arena[y].right;
            if self.arena[y].parent == z {
                x_parent = y;
            } else {
                x_parent = self.arena[y].parent;
                self.transplant(y, x);
                let z_right = self.arena[z].right;
                self.arena[y].right = z_right;
                self.arena[z_right].parent = y;
            }
            self.transplant(z, y);
            let z_left = self.arena[z].left;
            self.arena[y].left = z_left;
            self.arena[z_left].parent = y;
            self.arena[y].red = self.arena[z].red;
        }

        if y_was_black {
            self.remove_fixup(x, x_parent);
        }

        let node = self.arena.remove(z);
        (node.value, node.count)
    }

    fn min_of(&self, mut handle: usize) -> usize {
        while self.arena[handle].left != NIL {
            handle = self.arena[handle].left;
        }
        handle
    }

    #[inline]
    fn is_red(&self, handle: usize) -> bool {
        handle != NIL && self.arena[handle].red
    }

    fn rotate_left(&mut self, x: usize) {
        let y = self.arena[x].right;
        let y_left = self.arena[y].left;
        self.arena[x].right = y_left;
        if y_left != NIL {
            self.arena[y_left].parent = x;
        }
        let x_parent = self.arena[x].parent;
        self.arena[y].parent = x_parent;
        if x_parent == NIL {
            self.root = y;
        } else if self.arena[x_parent].left == x {
            self.arena[x_parent].left = y;
        } else {
            self.arena[x_parent].right = y;
        }
        self.arena[y].left = x;
        self.arena[x].parent = y;
    }

    fn rotate_right(&mut self, x: usize) {
        let y = self.arena[x].left;
        let y_right = self.arena[y].right;
        self.arena[x].left = y_right;
        if y_right != NIL {
            self.arena[y_right].parent = x;
        }
        let x_parent = self.arena[x].parent;
        self.arena[y].parent = x_parent;
        if x_parent == NIL {
            self.root = y;
        } else if self.arena[x_parent].right == x {
            self.arena[x_parent].right = y;
        } else {
            self.arena[x_parent].left = y;
        }
        self.arena[y].right = x;
        self.arena[x].parent = y;
    }

    /// Replaces the subtree rooted at `u` with the one rooted at `v`
    /// (`v` may be `NIL`). Only the downward link and `v`'s parent are
    /// rewired; `u`'s own fields are left alone.
    fn transplant(&mut self, u: usize, v: usize) {
        let parent = self.arena[u].parent;
        if parent == NIL {
            self.root = v;
        } else if self.arena[parent].left == u {
            self.arena[parent].left = v;
        } else {
            self.arena[parent].right = v;
        }
        if v != NIL {
            self.arena[v].parent = parent;
        }
    }

    fn insert_fixup(&mut self, mut z: usize) {
        loop {
            let parent = self.arena[z].parent;
            if !self.is_red(parent) {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let grand = self.arena[parent].parent;
            if parent == self.arena[grand].left {
                let uncle = self.arena[grand].right;
                if self.is_red(uncle) {
                    self.arena[parent].red = false;
                    self.arena[uncle].red = false;
                    self.arena[grand].red = true;
                    z = grand;
                } else {
                    if z == self.arena[parent].right {
                        z = parent;
                        self.rotate_left(z);
                    }
                    let parent = self.arena[z].parent;
                    let grand = self.arena[parent].parent;
                    self.arena[parent].red = false;
                    self.arena[grand].red = true;
                    self.rotate_right(grand);
                }
            } else {
                let uncle = self.arena[grand].left;
                if self.is_red(uncle) {
                    self.arena[parent].red = false;
                    self.arena[uncle].red = false;
                    self.arena[grand].red = true;
                    z = grand;
                } else {
                    if z == self.arena[parent].left {
                        z = parent;
                        self.rotate_right(z);
                    }
                    let parent = self.arena[z].parent;
                    let grand = self.arena[parent].parent;
                    self.arena[parent].red = false;
                    self.arena[grand].red = true;
                    self.rotate_left(grand);
                }
            }
        }
        let root = self.root;
        self.arena[root].red = false;
    }

    /// Restores the black-height invariant after removing a black node.
    /// `x` is the doubly-black position (possibly `NIL`), `x_parent` its
    /// parent, tracked explicitly because `NIL` carries no links.
    fn remove_fixup(&mut self, mut x: usize, mut x_parent: usize) {
        while x != self.root && !self.is_red(x) {
            if x == self.arena[x_parent].left {
                let mut w = self.arena[x_parent].right;
                if self.is_red(w) {
                    self.arena[w].red = false;
                    self.arena[x_parent].red = true;
                    self.rotate_left(x_parent);
                    w = self.arena[x_parent].right;
                }
                let w_left = self.arena[w].left;
                let w_right = self.arena[w].right;
                if !self.is_red(w_left) && !self.is_red(w_right) {
                    self.arena[w].red = true;
                    x = x_parent;
                    x_parent = self.arena[x].parent;
                } else {
                    if !self.is_red(w_right) {
                        self.arena[w_left].red = false;
                        self.arena[w].red = true;
                        self.rotate_right(w);
                        w = self.arena[x_parent].right;
                    }
                    self.arena[w].red = self.arena[x_parent].red;
                    self.arena[x_parent].red = false;
                    let w_right = self.arena[w].right;
                    self.arena[w_right].red = false;
                    self.rotate_left(x_parent);
                    x = self.root;
                }
            } else {
                let mut w = self.arena[x_parent].left;
                if self.is_red(w) {
                    self.arena[w].red = false;
                    self.arena[x_parent].red = true;
                    self.rotate_right(x_parent);
                    w = self.arena[x_parent].left;
                }
                let w_left = self.arena[w].left;
                let w_right = self.arena[w].right;
                if !self.is_red(w_left) && !self.is_red(w_right) {
                    self.arena[w].red = true;
                    x = x_parent;
                    x_parent = self.arena[x].parent;
                } else {
                    if !self.is_red(w_left) {
                        self.arena[w_right].red = false;
                        self.arena[w].red = true;
                        self.rotate_left(w);
                        w = self.arena[x_parent].left;
                    }
                    self.arena[w].red = self.arena[x_parent].red;
                    self.arena[x_parent].red = false;
                    let w_left = self.arena[w].left;
                    self.arena[w_left].red = false;
                    self.rotate_right(x_parent);
                    x = self.root;
                }
            }
        }
        if x != NIL {
            self.arena[x].red = false;
        }
    }
}

impl<V: Ord, X> TreeCore<V, X> {
    /// Handle of the node holding `value`, or `NIL`.
    pub(crate) fn find(&self, value: &V) -> usize {
        let mut cur = self.root;
        while cur != NIL {
            match value.cmp(&self.arena[cur].value) {
                Ordering::Less => cur = self.arena[cur].left,
                Ordering::Greater => cur = self.arena[cur].right,
                Ordering::Equal => return cur,
            }
        }
        NIL
    }
}

impl<V: Ord, X: Default> TreeCore<V, X> {
    /// Adds `amount` occurrences of `value`, bumping the counter in place
    /// when the value is already present (no structural change) and
    /// otherwise inserting a red node and rebalancing.
    ///
    /// Returns the node's handle and the prior multiplicity (0 if new).
    pub(crate) fn insert(&mut self, value: V, amount: usize) -> (usize, usize) {
        debug_assert!(amount > 0);
        let mut parent = NIL;
        let mut cur = self.root;
        let mut went_left = false;
        while cur != NIL {
            parent = cur;
            match value.cmp(&self.arena[cur].value) {
                Ordering::Less => {
                    went_left = true;
                    cur = self.arena[cur].left;
                }
                Ordering::Greater => {
                    went_left = false;
                    cur = self.arena[cur].right;
                }
                Ordering::Equal => {
                    let prior = self.arena[cur].count;
                    self.arena[cur].count += amount;
                    self.total += amount;
                    return (cur, prior);
                }
            }
        }

        let handle = self.arena.insert(Node {
            value,
            count: amount,
            parent,
            left: NIL,
            right: NIL,
            red: true,
            ext: X::default(),
        });
        if parent == NIL {
            self.root = handle;
        } else if went_left {
            self.arena[parent].left = handle;
        } else {
            self.arena[parent].right = handle;
        }
        self.total += amount;
        self.insert_fixup(handle);
        (handle, 0)
    }
}

#[cfg(test)]
impl<V: Ord, X> TreeCore<V, X> {
    /// Walks the whole tree and panics with every violated structural
    /// invariant: coloring, black heights, ordering, parent links, counts,
    /// and the incremental totals. Test helper.
    pub(crate) fn validate(&self) {
        let mut errors: Vec<String> = Vec::new();
        if self.root == NIL {
            if self.arena.len() != 0 {
                errors.push(format!("no root but {} live nodes", self.arena.len()));
            }
            if self.total != 0 {
                errors.push(format!("no root but total {}", self.total));
            }
        } else {
            if self.arena[self.root].parent != NIL {
                errors.push("root has a parent".into());
            }
            if self.arena[self.root].red {
                errors.push("root is red".into());
            }
            let mut walked = 0usize;
            let mut total = 0usize;
            self.validate_node(self.root, None, None, &mut walked, &mut total, &mut errors);
            if walked != self.arena.len() {
                errors.push(format!(
                    "reachable nodes {} != live nodes {}",
                    walked,
                    self.arena.len()
                ));
            }
            if total != self.total {
                errors.push(format!("summed counts {} != total {}", total, self.total));
            }
        }
        assert!(
            errors.is_empty(),
            "tree invariant violations:\n{}",
            errors.join("\n")
        );
    }

    /// Returns the subtree's black height (NIL leaves count as 1).
    fn validate_node(
        &self,
        handle: usize,
        lower: Option<&V>,
        upper: Option<&V>,
        walked: &mut usize,
        total: &mut usize,
        errors: &mut Vec<String>,
    ) -> usize {
        let node = &self.arena[handle];
        *walked += 1;
        *total += node.count;
        if node.count == 0 {
            errors.push(format!("node {handle} has zero count"));
        }
        if let Some(lo) = lower {
            if node.value <= *lo {
                errors.push(format!("order violation at node {handle}"));
            }
        }
        if let Some(hi) = upper {
            if node.value >= *hi {
                errors.push(format!("order violation at node {handle}"));
            }
        }
        if node.red && (self.is_red(node.left) || self.is_red(node.right)) {
            errors.push(format!("red node {handle} has a red child"));
        }
        let bh_left = if node.left == NIL {
            1
        } else {
            if self.arena[node.left].parent != handle {
                errors.push(format!("bad parent link below node {handle}"));
            }
            self.validate_node(node.left, lower, Some(&node.value), walked, total, errors)
        };
        let bh_right = if node.right == NIL {
            1
        } else {
            if self.arena[node.right].parent != handle {
                errors.push(format!("bad parent link below node {handle}"));
            }
            self.validate_node(node.right, Some(&node.value), upper, walked, total, errors)
        };
        if bh_left != bh_right {
            errors.push(format!(
                "black height mismatch at node {handle}: {bh_left} vs {bh_right}"
            ));
        }
        bh_left + usize::from(!node.red)
    }
}

// =============================================================================
// TreeBag - sorted multiset over the engine
// =============================================================================

/// Sorted multiset: values ordered by `Ord`, one tree node per distinct
/// value with a multiplicity counter.
///
/// Queries and single-value mutations are O(log n) in the number of
/// distinct values; bumping an existing value's multiplicity never
/// restructures the tree. Iteration yields entries in ascending value
/// order.
///
/// # Example
///
/// ```
/// use satchel::{Bag, TreeBag};
///
/// let mut bag = TreeBag::new();
/// bag.insert("pear");
/// bag.insert_n("apple", 3).unwrap();
///
/// assert_eq!(bag.len(), 4);
/// assert_eq!(bag.num_values(), 2);
/// assert_eq!(bag.count(&"apple"), 3);
///
/// let entries: Vec<_> = bag.iter().collect();
/// assert_eq!(entries, vec![(&"apple", 3), (&"pear", 1)]);
/// ```
#[derive(Clone)]
pub struct TreeBag<V> {
    core: TreeCore<V>,
}

impl<V> TreeBag<V> {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self {
            core: TreeCore::new(),
        }
    }

    /// Returns the minimum value and its multiplicity.
    pub fn first(&self) -> Option<(&V, usize)> {
        let handle = self.core.first();
        if handle == NIL {
            None
        } else {
            Some(self.core.entry(handle))
        }
    }

    /// Returns the maximum value and its multiplicity.
    pub fn last(&self) -> Option<(&V, usize)> {
        let handle = self.core.last();
        if handle == NIL {
            None
        } else {
            Some(self.core.entry(handle))
        }
    }

    fn entries(&self) -> Iter<'_, V> {
        Iter {
            core: &self.core,
            cur: self.core.first(),
            remaining: self.core.num_values(),
        }
    }
}

impl<V: Ord> Bag<V> for TreeBag<V> {
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
        let (_, prior) = self.core.insert(value, amount);
        Ok(prior)
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
            self.core.remove_node(handle);
        }
        Ok(true)
    }

    fn clear(&mut self) {
        self.core.clear();
    }

    fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&V, usize) -> bool,
    {
        let mut victims = Vec::new();
        let mut handle = self.core.first();
        while handle != NIL {
            let (value, count) = self.core.entry(handle);
            if !f(value, count) {
                victims.push(handle);
            }
            handle = self.core.next(handle);
        }
        // Handles stay valid across removals; only the victims' slots die.
        for handle in victims {
            self.core.remove_node(handle);
        }
    }

    fn iter(&self) -> Iter<'_, V> {
        self.entries()
    }
}

impl<V> Default for TreeBag<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for TreeBag<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

impl<V: PartialEq> PartialEq for TreeBag<V> {
    fn eq(&self, other: &Self) -> bool {
        self.core.len() == other.core.len()
            && self.core.num_values() == other.core.num_values()
            && self.entries().eq(other.entries())
    }
}

impl<V: Eq> Eq for TreeBag<V> {}

impl<V: Ord> Extend<V> for TreeBag<V> {
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        for value in iter {
            self.core.insert(value, 1);
        }
    }
}

/// Pairs with a zero count are ignored: zero multiplicity means absent.
impl<V: Ord> Extend<(V, usize)> for TreeBag<V> {
    fn extend<I: IntoIterator<Item = (V, usize)>>(&mut self, iter: I) {
        for (value, amount) in iter {
            if amount > 0 {
                self.core.insert(value, amount);
            }
        }
    }
}

impl<V: Ord> FromIterator<V> for TreeBag<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut bag = Self::new();
        bag.extend(iter);
        bag
    }
}

impl<V: Ord> FromIterator<(V, usize)> for TreeBag<V> {
    fn from_iter<I: IntoIterator<Item = (V, usize)>>(iter: I) -> Self {
        let mut bag = Self::new();
        bag.extend(iter);
        bag
    }
}

impl<'a, V> IntoIterator for &'a TreeBag<V> {
    type Item = (&'a V, usize);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.entries()
    }
}

/// Value-ordered iterator over a [`TreeBag`]'s entries.
pub struct Iter<'a, V> {
    core: &'a TreeCore<V>,
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
        self.cur = self.core.next(self.cur);
        self.remaining -= 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
impl<V> FusedIterator for Iter<'_, V> {}
