//! Node storage and the per-node operations that implement copy-on-write
//! splitting: `dupe`, `dupe_insert_or_split_leaf`,
//! `dupe_insert_or_split_internal`, `min`, and the read accessors for the
//! leaf-entry / key / child arrays a node may hold.

use std::cell::RefCell;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::alloc::Storage;
use crate::error::Error;
use crate::eytzinger;

/// One allocation of `len` contiguous `T`s, backed by the tree's shared
/// [`Storage`]. Returns its block to the size-class cache on drop, dropping
/// every live element first.
pub(crate) struct RawArray<T> {
    ptr: NonNull<T>,
    len: usize,
    storage: Rc<RefCell<Storage>>,
}

impl<T> RawArray<T> {
    /// Allocates a fresh block of `len` elements and fills it by calling `f`
    /// for each index in order.
    fn from_fn(
        storage: Rc<RefCell<Storage>>,
        len: usize,
        mut f: impl FnMut(usize) -> T,
    ) -> Result<Self, Error> {
        let ptr = storage.borrow_mut().allocate::<T>(len)?;
        for i in 0..len {
            let value = f(i);
            // SAFETY: slot `i` lies within the `len`-element block just
            // allocated, and has not been written yet.
            unsafe { ptr.as_ptr().add(i).write(value) };
        }
        Ok(Self { ptr, len, storage })
    }

    fn as_slice(&self) -> &[T] {
        // SAFETY: every slot in `[0, len)` was initialized by `from_fn` and
        // is never aliased mutably while a shared borrow is outstanding.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: every slot in `[0, len)` was initialized by `from_fn`;
        // `&mut self` guarantees no other borrow of this block is live.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    fn len(&self) -> usize {
        self.len
    }
}

impl<T> Drop for RawArray<T> {
    fn drop(&mut self) {
        for i in 0..self.len {
            // SAFETY: slot `i` was initialized by `from_fn` and has not been
            // dropped before; each slot is dropped exactly once here.
            unsafe { std::ptr::drop_in_place(self.ptr.as_ptr().add(i)) };
        }
        self.storage.borrow_mut().free(self.ptr, self.len);
    }
}

/// A leaf entry, laid out as one field so a leaf's tail is a single
/// homogeneous array (the "equivalent shape" the design notes call out).
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub(crate) struct LeafSlot<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}

pub(crate) enum NodeBody<K, V> {
    Leaf(RawArray<LeafSlot<K, V>>),
    Internal {
        /// Eytzinger order.
        keys: RawArray<K>,
        /// Natural (sorted-by-min) order.
        children: RawArray<Rc<Node<K, V>>>,
    },
}

pub(crate) struct Node<K, V> {
    body: NodeBody<K, V>,
    storage: Rc<RefCell<Storage>>,
}

fn leaf_entry_size<K, V>() -> usize {
    std::mem::size_of::<LeafSlot<K, V>>()
}

fn internal_entry_size<K, V>() -> usize {
    std::mem::size_of::<K>() + std::mem::size_of::<Rc<Node<K, V>>>()
}

/// Approximate size of the allocation backing one `Rc::new(Node { .. })`
/// header: the `Rc` strong/weak counters plus the `Node<K, V>` struct itself
/// (its `NodeBody` discriminant and the `storage` handle). The header is
/// deliberately allocated through the ordinary global allocator rather than
/// through [`crate::alloc::Storage`] — see DESIGN.md — so this size is never
/// drawn from nor returned to the arena/cache; it exists purely so
/// `node_size`/`Tree::bytes_used` still *model* that weight instead of
/// silently losing it, per `node_size(kind, len) = header_size + len *
/// entry_size(kind)`.
fn header_size<K, V>() -> usize {
    2 * std::mem::size_of::<usize>() + std::mem::size_of::<Node<K, V>>()
}

impl<K: Copy + Ord, V: Copy> Node<K, V> {
    pub(crate) fn new_leaf(storage: Rc<RefCell<Storage>>, entry: (K, V)) -> Result<Rc<Self>, Error> {
        let arr = RawArray::from_fn(storage.clone(), 1, |_| LeafSlot {
            key: entry.0,
            value: entry.1,
        })?;
        Ok(Rc::new(Self {
            body: NodeBody::Leaf(arr),
            storage,
        }))
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.body, NodeBody::Leaf(_))
    }

    pub(crate) fn len(&self) -> usize {
        match &self.body {
            NodeBody::Leaf(entries) => entries.len(),
            NodeBody::Internal { children, .. } => children.len(),
        }
    }

    /// Logical byte footprint of this node (not its descendants):
    /// `header_size + len * entry_size(kind)`, matching §3's `node_size`
    /// formula. The tail term is computed with the same per-entry formula
    /// used when the tail was allocated, so that `bytes_used` (traversal
    /// sum) and `Storage::bytes_in_cache` (real cache sums) stay consistent
    /// with each other; the header term accounts for the `Rc` allocation
    /// backing this node even though that allocation isn't arena/cache
    /// managed (see `header_size` and DESIGN.md).
    pub(crate) fn node_size(&self) -> usize {
        let tail = match &self.body {
            NodeBody::Leaf(entries) => entries.len() * leaf_entry_size::<K, V>(),
            NodeBody::Internal { children, .. } => {
                children.len() * internal_entry_size::<K, V>()
            }
        };
        header_size::<K, V>() + tail
    }

    pub(crate) fn leaf_entries(&self) -> &[LeafSlot<K, V>] {
        match &self.body {
            NodeBody::Leaf(entries) => entries.as_slice(),
            NodeBody::Internal { .. } => panic!("leaf_entries() called on internal node"),
        }
    }

    pub(crate) fn leaf_entries_mut(&mut self) -> &mut [LeafSlot<K, V>] {
        match &mut self.body {
            NodeBody::Leaf(entries) => entries.as_mut_slice(),
            NodeBody::Internal { .. } => panic!("leaf_entries_mut() called on internal node"),
        }
    }

    pub(crate) fn internal_keys(&self) -> &[K] {
        match &self.body {
            NodeBody::Internal { keys, .. } => keys.as_slice(),
            NodeBody::Leaf(_) => panic!("internal_keys() called on leaf node"),
        }
    }

    pub(crate) fn internal_children(&self) -> &[Rc<Node<K, V>>] {
        match &self.body {
            NodeBody::Internal { children, .. } => children.as_slice(),
            NodeBody::Leaf(_) => panic!("internal_children() called on leaf node"),
        }
    }

    /// Least key in the subtree rooted at this node.
    pub(crate) fn min(&self) -> K {
        match &self.body {
            NodeBody::Leaf(entries) => entries.as_slice()[0].key,
            NodeBody::Internal { keys, .. } => {
                let len = keys.len();
                keys.as_slice()[eytzinger::from_linear(0, len)]
            }
        }
    }

    /// Binary search of this leaf's entries for `key`. `Ok(idx)` on an exact
    /// match, `Err(idx)` for the smallest index whose key is `>= key`.
    pub(crate) fn leaf_search(&self, key: &K) -> Result<usize, usize> {
        self.leaf_entries().binary_search_by(|slot| slot.key.cmp(key))
    }

    /// Allocates a new node of the same shape and copies the tail verbatim.
    pub(crate) fn dupe(&self) -> Result<Rc<Self>, Error> {
        let body = match &self.body {
            NodeBody::Leaf(entries) => {
                let old = entries.as_slice();
                NodeBody::Leaf(RawArray::from_fn(self.storage.clone(), old.len(), |i| old[i])?)
            }
            NodeBody::Internal { keys, children } => {
                let old_keys = keys.as_slice();
                let old_children = children.as_slice();
                let new_keys =
                    RawArray::from_fn(self.storage.clone(), old_keys.len(), |i| old_keys[i])?;
                let new_children = RawArray::from_fn(self.storage.clone(), old_children.len(), |i| {
                    old_children[i].clone()
                })?;
                NodeBody::Internal {
                    keys: new_keys,
                    children: new_children,
                }
            }
        };
        Ok(Rc::new(Self {
            body,
            storage: self.storage.clone(),
        }))
    }

    /// Duplicates this leaf with `new_entry` inserted at `idx`, splitting
    /// into two one-entry leaves if the leaf was already at its two-entry
    /// capacity.
    ///
    /// Spec text describes the split product as "two nodes of length 1 and
    /// 1", which cannot hold the three entries a full-leaf insert produces;
    /// invariant 1 (`1 <= leaf.len <= 2`) settles it as a `{1, 2}` split
    /// instead, with the lone entry on the left (mirroring this codebase's
    /// own right-biased split preference for sequential workloads). See
    /// DESIGN.md.
    pub(crate) fn dupe_insert_or_split_leaf(
        &self,
        idx: usize,
        new_entry: (K, V),
    ) -> Result<Vec<Rc<Self>>, Error> {
        let old = self.leaf_entries();
        let mut combined: Vec<LeafSlot<K, V>> = Vec::with_capacity(old.len() + 1);
        combined.extend_from_slice(&old[..idx]);
        combined.push(LeafSlot {
            key: new_entry.0,
            value: new_entry.1,
        });
        combined.extend_from_slice(&old[idx..]);

        if combined.len() <= 2 {
            let arr = RawArray::from_fn(self.storage.clone(), combined.len(), |i| combined[i])?;
            Ok(vec![Rc::new(Self {
                body: NodeBody::Leaf(arr),
                storage: self.storage.clone(),
            })])
        } else {
            let left = RawArray::from_fn(self.storage.clone(), 1, |_| combined[0])?;
            let right_len = combined.len() - 1;
            let right = RawArray::from_fn(self.storage.clone(), right_len, |i| combined[1 + i])?;
            Ok(vec![
                Rc::new(Self {
                    body: NodeBody::Leaf(left),
                    storage: self.storage.clone(),
                }),
                Rc::new(Self {
                    body: NodeBody::Leaf(right),
                    storage: self.storage.clone(),
                }),
            ])
        }
    }

    /// Splices `new_children` (length 1 or 2) into this internal node's
    /// natural-order child sequence in place of the child at `idx`, then
    /// recomputes the Eytzinger key array for each produced node.
    ///
    /// `height` is this node's own height; produced nodes replace it at the
    /// same height, so each must still satisfy `len <= capacity(height)`.
    ///
    /// The spec's literal split-size formula here (`2^(height-1)` and
    /// `new_len + 1 - 2^(height-1)`) sums to `new_len + 1`, one more entry
    /// than actually exist — the same "known off-by-one regression" class
    /// S3/S4 are written to catch. This implementation instead splits the
    /// combined sequence at its midpoint, which conserves the entry count
    /// and keeps both halves within `capacity(height)`. See DESIGN.md.
    pub(crate) fn dupe_insert_or_split_internal(
        &self,
        height: u32,
        idx: usize,
        new_children: Vec<Rc<Self>>,
    ) -> Result<Vec<Rc<Self>>, Error> {
        debug_assert!(matches!(new_children.len(), 1 | 2));
        let old_children = self.internal_children();
        let mut combined: Vec<Rc<Self>> = Vec::with_capacity(old_children.len() + 1);
        combined.extend_from_slice(&old_children[..idx]);
        combined.extend(new_children);
        combined.extend_from_slice(&old_children[idx + 1..]);

        let capacity = capacity_for_height(height);
        if combined.len() < capacity {
            Ok(vec![Self::from_children(self.storage.clone(), combined)?])
        } else {
            let left_len = combined.len() / 2;
            let mut iter = combined.into_iter();
            let left_children: Vec<_> = (&mut iter).take(left_len).collect();
            let right_children: Vec<_> = iter.collect();
            Ok(vec![
                Self::from_children(self.storage.clone(), left_children)?,
                Self::from_children(self.storage.clone(), right_children)?,
            ])
        }
    }

    /// Builds a fresh internal node from a natural-order child sequence,
    /// recomputing the Eytzinger key array from each child's `min()`:
    /// `keys[from_linear(j, n)] = children[j].min()`.
    pub(crate) fn from_children(storage: Rc<RefCell<Storage>>, children: Vec<Rc<Self>>) -> Result<Rc<Self>, Error> {
        let len = children.len();
        let linear_to_e = eytzinger::linear_to_eytzinger_order(len);
        let mut eytzinger_keys: Vec<Option<K>> = vec![None; len];
        for (j, child) in children.iter().enumerate() {
            eytzinger_keys[linear_to_e[j]] = Some(child.min());
        }
        let children_arr = RawArray::from_fn(storage.clone(), len, |i| children[i].clone())?;
        let keys_arr = RawArray::from_fn(storage.clone(), len, |e| {
            eytzinger_keys[e].expect("every eytzinger slot filled for a dense node")
        })?;
        Ok(Rc::new(Self {
            body: NodeBody::Internal {
                keys: keys_arr,
                children: children_arr,
            },
            storage,
        }))
    }
}

/// `capacity(h) = 2^h`, for a node at height `h` (leaves are height 1).
pub(crate) fn capacity_for_height(height: u32) -> usize {
    1usize << height
}
