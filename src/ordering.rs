//! Linear reordering for admin drag-and-drop gestures.
//!
//! A move gesture is translated into a new linear order by removing the
//! dragged element first and reinserting it at the (possibly shifted) target
//! position. A two-element swap is not equivalent: it only happens to produce
//! the right order when source and target are adjacent, so the splice form
//! below is the only reorder algorithm in this crate.

use crate::error::StorageError;

/// Move the element at `source_index` to `target_index`, preserving the
/// relative order of every other element.
///
/// Pure and side-effect-free; the input slice is never modified. Out-of-range
/// indices are a usage error and fail with [`StorageError::InvalidIndex`].
pub fn move_item<T: Clone>(
    sequence: &[T],
    source_index: usize,
    target_index: usize,
) -> Result<Vec<T>, StorageError> {
    let len = sequence.len();

    if source_index >= len {
        return Err(StorageError::InvalidIndex {
            index: source_index,
            len,
        });
    }
    if target_index >= len {
        return Err(StorageError::InvalidIndex {
            index: target_index,
            len,
        });
    }

    let mut items = sequence.to_vec();
    let moved = items.remove(source_index);
    items.insert(target_index, moved);

    Ok(items)
}
