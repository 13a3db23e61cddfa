//! Multiset (bag) containers with interchangeable backings.
//!
//! A bag stores values with multiplicities. This crate keeps one entry per
//! distinct value and counts duplicates, so a million copies of the same
//! value cost one node, and swapping the backing changes iteration order
//! and lookup cost without touching call sites.
//!
//! # Design Philosophy
//!
//! The representation is counts, not repeated elements:
//!
//! ```text
//! logical multiset:  {a, a, a, b}
//! representation:    a -> 3, b -> 1     one entry per distinct value
//! sizes:             len() = 4          counting duplicates
//!                    num_values() = 2   distinct values
//! ```
//!
//! Every backing implements the same [`Bag`] trait on top of that model:
//!
//! ```text
//! HashBag<V>            - hash table, O(1) expected, arbitrary order
//! TreeBag<V>            - red-black tree, O(log n), sorted iteration
//! LinkedBag<V>          - tree + intrusive thread, insertion-order iteration
//! MappedBag<K, B, I, P> - presents a bag of keys K as a bag of values V
//! ```
//!
//! Benefits:
//! - **Duplicates are cheap**: Re-inserting a present value bumps a counter;
//!   no rebalancing, no rehashing, no new allocation
//! - **Both sizes are O(1)**: Element and distinct-value counts are tracked
//!   incrementally, never recomputed by walking
//! - **All-or-nothing mutations**: A removal that cannot be satisfied in
//!   full leaves the bag untouched and says so
//! - **Zero amounts are rejected**: `insert_n(v, 0)` is an error that hands
//!   `v` back instead of a silent no-op
//!
//! # Quick Start
//!
//! ```
//! use satchel::{Bag, HashBag};
//!
//! let mut bag = HashBag::new();
//! bag.insert("red");
//! bag.insert_n("blue", 2).unwrap();
//!
//! assert_eq!(bag.len(), 3);
//! assert_eq!(bag.num_values(), 2);
//! assert_eq!(bag.count(&"blue"), 2);
//!
//! // Removing more than is present is refused outright.
//! assert_eq!(bag.remove_n(&"blue", 5), Ok(false));
//! assert_eq!(bag.count(&"blue"), 2);
//! ```
//!
//! # Insertion Order
//!
//! [`LinkedBag`] threads an intrusive doubly-linked list through the tree
//! nodes. A value takes its position on first insertion and keeps it while
//! its multiplicity stays positive; only dropping to zero and re-inserting
//! moves it to the back.
//!
//! ```
//! use satchel::{Bag, LinkedBag};
//!
//! let mut bag = LinkedBag::new();
//! bag.insert_each(["b", "a", "b"]);
//!
//! let order: Vec<_> = bag.iter().map(|(v, n)| (*v, n)).collect();
//! assert_eq!(order, vec![("b", 2), ("a", 1)]);
//! ```
//!
//! # Choosing a Backing
//!
//! | Bag | Lookup | Iteration | Requires |
//! |-----|--------|-----------|----------|
//! | [`HashBag`] | O(1) expected | Arbitrary order | `V: Eq + Hash` |
//! | [`TreeBag`] | O(log n) | Ascending values | `V: Ord` |
//! | [`LinkedBag`] | O(log n) | First-insertion order | `V: Ord` |
//! | [`MappedBag`] | As backing | As backing, projected | Closure pair |
//!
//! n is the number of *distinct* values throughout.
//!
//! # Selection
//!
//! [`select`] finds order statistics of plain sequences in worst-case
//! linear time with the deterministic median-of-medians pivot, either into
//! scratch or in place:
//!
//! ```
//! use satchel::select::kth_smallest;
//!
//! // Ranks index the sorted sequence, duplicates and all.
//! assert_eq!(kth_smallest(&[5, 3, 3, 8, 1], 2), Ok(3));
//! ```

#![warn(missing_docs)]

pub mod bag;
pub mod hash;
pub mod linked;
pub mod mapped;
pub mod select;
pub mod tree;

pub use bag::{Bag, ZeroAmount};
pub use hash::HashBag;
pub use linked::LinkedBag;
pub use mapped::MappedBag;
pub use select::{
    kth_smallest, kth_smallest_by, kth_smallest_in_place, kth_smallest_in_place_by, OutOfRange,
};
pub use tree::TreeBag;
