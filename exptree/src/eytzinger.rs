//! Bidirectional conversion between sorted-linear position and Eytzinger
//! position.
//!
//! Index 0 is the root; `left(e) = 2e+1`, `right(e) = 2e+2`. Node `e` is part
//! of the tree iff `e < len`, which is what produces an incomplete bottom
//! layer when `len` isn't of the form `2^k - 1`. Both directions are defined
//! as the inverse of the same inorder walk over that (possibly incomplete)
//! implicit binary tree, which is what makes the round-trip law hold for
//! every `len`.

/// Index of the left child of Eytzinger position `e`.
#[inline]
pub fn left(e: usize) -> usize {
    2 * e + 1
}

/// Index of the right child of Eytzinger position `e`.
#[inline]
pub fn right(e: usize) -> usize {
    2 * e + 2
}

/// Index of the parent of Eytzinger position `e`.
///
/// # Panics
/// Panics if `e == 0` (the root has no parent).
#[inline]
pub fn parent(e: usize) -> usize {
    assert!(e > 0, "root has no parent");
    (e - 1) / 2
}

/// Maps a sorted-order position `i` to its Eytzinger position, for an array
/// of `len` elements.
///
/// # Panics
/// Panics if `i >= len` (programmer-error assertion, per spec).
pub fn from_linear(i: usize, len: usize) -> usize {
    assert!(i < len, "linear index {i} out of range for len {len}");
    let mut next_linear = 0usize;
    walk(0, len, &mut next_linear, |e, linear| {
        if linear == i {
            Some(e)
        } else {
            None
        }
    })
    .expect("linear index not found in Eytzinger walk")
}

/// Maps an Eytzinger position `e` back to its sorted-order position, for an
/// array of `len` elements.
///
/// # Panics
/// Panics if `e >= len`.
pub fn to_linear(e: usize, len: usize) -> usize {
    assert!(e < len, "eytzinger index {e} out of range for len {len}");
    let mut next_linear = 0usize;
    let mut found_linear = None;
    walk(0, len, &mut next_linear, |node, linear| {
        if node == e {
            found_linear = Some(linear);
        }
        None::<()>
    });
    found_linear.expect("eytzinger index not found in walk")
}

/// Eytzinger index of every sorted position `0..len`, in sorted order —
/// i.e. `result[i] == from_linear(i, len)` for every `i`, computed with a
/// single inorder walk rather than `len` independent ones.
///
/// `from_linear`/`to_linear` each re-walk from the root on every call, which
/// is the right shape for the one-off lookups `Tree::get`/`put` make during
/// descent, but callers that need the whole mapping at once (building a
/// node's Eytzinger key array from its natural-order children) should use
/// this instead of looping `from_linear` — looping would cost `O(len^2)`.
pub(crate) fn linear_to_eytzinger_order(len: usize) -> Vec<usize> {
    let mut result = vec![0usize; len];
    let mut next_linear = 0usize;
    walk(0, len, &mut next_linear, |e, linear| -> Option<()> {
        result[linear] = e;
        None
    });
    result
}

/// Inorder walk of the implicit binary tree over `[0, len)`, visiting nodes
/// in ascending sorted order and handing each `(eytzinger_index, linear_rank)`
/// pair to `visit`. Stops early and returns the first `Some` that `visit`
/// produces.
fn walk<T>(
    e: usize,
    len: usize,
    next_linear: &mut usize,
    mut visit: impl FnMut(usize, usize) -> Option<T>,
) -> Option<T> {
    walk_inner(e, len, next_linear, &mut visit)
}

fn walk_inner<T>(
    e: usize,
    len: usize,
    next_linear: &mut usize,
    visit: &mut impl FnMut(usize, usize) -> Option<T>,
) -> Option<T> {
    if e >= len {
        return None;
    }
    if let Some(found) = walk_inner(left(e), len, next_linear, visit) {
        return Some(found);
    }
    let linear = *next_linear;
    *next_linear += 1;
    if let Some(found) = visit(e, linear) {
        return Some(found);
    }
    walk_inner(right(e), len, next_linear, visit)
}
