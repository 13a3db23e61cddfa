//! Deterministic order statistics over plain sequences.
//!
//! Classic median-of-medians selection: worst-case O(n) comparisons with
//! no randomness, so adversarial inputs cannot degrade it. The pivot for
//! each partitioning round is the median of the five-element group
//! medians. The descent through ever-smaller windows runs as a loop; only
//! the pivot hunt recurses, on a window a fifth the size, so the stack
//! stays logarithmic.
//!
//! Two entry points per flavor: borrowing ([`kth_smallest`]) copies into
//! scratch and hands back an owned answer, in-place
//! ([`kth_smallest_in_place`]) rearranges the caller's slice and avoids
//! the copy. The `_by` variants take a comparator instead of `Ord`.

use core::cmp::Ordering;
use core::fmt;

/// Error returned when the requested rank does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    /// The requested zero-based rank.
    pub index: usize,
    /// Length of the sequence searched.
    pub len: usize,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "selection index {} out of range for sequence of length {}",
            self.index, self.len
        )
    }
}

impl std::error::Error for OutOfRange {}

const GROUP: usize = 5;

/// Returns the `k`-th smallest element (zero-based) without touching the
/// input.
///
/// Duplicates count separately: `k` indexes the fully sorted sequence.
/// Costs a scratch copy of the input; use [`kth_smallest_in_place`] to
/// trade mutation for the allocation.
///
/// # Example
///
/// ```
/// use satchel::select::kth_smallest;
///
/// let data = [5, 3, 3, 8, 1];
/// assert_eq!(kth_smallest(&data, 0), Ok(1));
/// assert_eq!(kth_smallest(&data, 2), Ok(3));
/// assert_eq!(kth_smallest(&data, 4), Ok(8));
/// assert!(kth_smallest(&data, 5).is_err());
/// ```
pub fn kth_smallest<T: Ord + Clone>(data: &[T], k: usize) -> Result<T, OutOfRange> {
    kth_smallest_by(data, k, T::cmp)
}

/// [`kth_smallest`] under a caller-supplied total order.
pub fn kth_smallest_by<T: Clone, F>(data: &[T], k: usize, mut compare: F) -> Result<T, OutOfRange>
where
    F: FnMut(&T, &T) -> Ordering,
{
    if k >= data.len() {
        return Err(OutOfRange {
            index: k,
            len: data.len(),
        });
    }
    let mut scratch = data.to_vec();
    let len = scratch.len();
    select_window(&mut scratch, 0, len, k, &mut compare);
    Ok(scratch.swap_remove(k))
}

/// Finds the `k`-th smallest element by rearranging the slice.
///
/// On success `data[k]` is the answer (a reference to it is returned),
/// every element before index `k` compares less than or equal to it, and
/// every element after compares greater than or equal. The slice is left
/// in that partitioned state.
pub fn kth_smallest_in_place<T: Ord>(data: &mut [T], k: usize) -> Result<&mut T, OutOfRange> {
    kth_smallest_in_place_by(data, k, T::cmp)
}

/// [`kth_smallest_in_place`] under a caller-supplied total order.
pub fn kth_smallest_in_place_by<T, F>(
    data: &mut [T],
    k: usize,
    mut compare: F,
) -> Result<&mut T, OutOfRange>
where
    F: FnMut(&T, &T) -> Ordering,
{
    if k >= data.len() {
        return Err(OutOfRange {
            index: k,
            len: data.len(),
        });
    }
    let len = data.len();
    select_window(data, 0, len, k, &mut compare);
    Ok(&mut data[k])
}

/// Shrinks the window `[low, high)` around rank `k` until `data[k]` holds
/// the answer, with everything left of the window at or below it and
/// everything right at or above.
fn select_window<T, F>(data: &mut [T], mut low: usize, mut high: usize, k: usize, compare: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    debug_assert!(low <= k && k < high && high <= data.len());
    loop {
        if high - low <= GROUP {
            data[low..high].sort_unstable_by(&mut *compare);
            return;
        }

        // Sort each group of five and gather the group medians at the
        // front of the window. Gather slots only ever overwrite already
        // processed groups.
        let mut medians_end = low;
        let mut group = low;
        while group < high {
            let end = (group + GROUP).min(high);
            data[group..end].sort_unstable_by(&mut *compare);
            let median = group + (end - group - 1) / 2;
            data.swap(medians_end, median);
            medians_end += 1;
            group = end;
        }

        // The pivot is the median of those medians, found with the same
        // machinery on the gathered prefix.
        let pivot_k = low + (medians_end - low - 1) / 2;
        select_window(data, low, medians_end, pivot_k, compare);

        // Three-way partition: strictly-less block, pivot-equal block,
        // strictly-greater block. Equal elements must group with the
        // pivot or duplicate-heavy inputs stop shrinking.
        data.swap(pivot_k, high - 1);
        let mut lt = low;
        for i in low..high - 1 {
            if compare(&data[i], &data[high - 1]) == Ordering::Less {
                data.swap(i, lt);
                lt += 1;
            }
        }
        data.swap(high - 1, lt);
        let mut gt = lt + 1;
        for i in lt + 1..high {
            if compare(&data[i], &data[lt]) == Ordering::Equal {
                data.swap(i, gt);
                gt += 1;
            }
        }

        if k < lt {
            high = lt;
        } else if k < gt {
            // data[k] sits in the pivot-equal block.
            return;
        } else {
            low = gt;
        }
    }
}
