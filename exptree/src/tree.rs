//! The tree engine: root handle, path descent, and copy-on-write propagation
//! of inserts up the descent path.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use crate::alloc::Storage;
use crate::error::Error;
use crate::eytzinger;
use crate::node::Node;

/// An in-memory, copy-on-write ordered index from `K` to `V`.
///
/// Single-owner: no operation may be invoked concurrently on the same
/// instance (see the crate's concurrency notes). Dropping a `Tree` releases
/// every node it still owns, cached or live, back to the global allocator —
/// ordinary field-drop order does the work, no explicit teardown routine is
/// needed.
pub struct Tree<K, V> {
    root: Option<(Rc<Node<K, V>>, u32)>,
    storage: Rc<RefCell<Storage>>,
}

impl<K: Ord + Copy, V: Copy> Default for Tree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Copy, V: Copy> Tree<K, V> {
    /// An empty tree.
    pub fn new() -> Self {
        Self {
            root: None,
            storage: Rc::new(RefCell::new(Storage::new())),
        }
    }

    /// Side-effect-free point lookup.
    pub fn get(&self, k: &K) -> Option<V> {
        let (root, _height) = self.root.as_ref()?;
        let mut node = root.clone();
        loop {
            if node.is_leaf() {
                return match node.leaf_search(k) {
                    Ok(idx) => Some(node.leaf_entries()[idx].value),
                    Err(_) => None,
                };
            }
            let child_idx = internal_descend_child_index(&node, k);
            let child = node.internal_children()[child_idx].clone();
            node = child;
        }
    }

    /// Inserts or replaces `k -> v`. Returns `Ok(true)` iff `k` was already
    /// present (value replaced). Fails only with [`Error::OutOfMemory`] or
    /// [`Error::InvalidLayout`], leaving the tree completely unchanged.
    pub fn put(&mut self, k: K, v: V) -> Result<bool, Error> {
        let Some((root, root_height)) = self.root.clone() else {
            let leaf = Node::new_leaf(self.storage.clone(), (k, v))?;
            self.root = Some((leaf, 1));
            return Ok(false);
        };

        // Descend, recording each internal ancestor and the natural-order
        // child index chosen at it, root-first.
        let mut path: Vec<(Rc<Node<K, V>>, u32, usize)> = Vec::new();
        let mut node = root;
        let mut height = root_height;
        while !node.is_leaf() {
            let child_idx = internal_descend_child_index(&node, &k);
            let child = node.internal_children()[child_idx].clone();
            path.push((node, height, child_idx));
            node = child;
            height -= 1;
        }
        let leaf = node;

        let search = leaf.leaf_search(&k);
        let replaced = search.is_ok();
        let leaf_idx = match search {
            Ok(idx) => idx,
            Err(idx) => idx,
        };

        let mut new_nodes = if replaced {
            // §4.4 step 2, literally: dupe() the leaf, then overwrite the
            // entry at idx. The dupe is still uniquely owned by this `Rc`
            // (nothing else can have cloned it yet), so `Rc::get_mut` is
            // always `Some` here.
            let mut duped = leaf.dupe()?;
            Rc::get_mut(&mut duped)
                .expect("freshly duped leaf has no other owners yet")
                .leaf_entries_mut()[leaf_idx]
                .value = v;
            vec![duped]
        } else {
            leaf.dupe_insert_or_split_leaf(leaf_idx, (k, v))?
        };

        // Propagate up the path, nearest parent first.
        for (ancestor, ancestor_height, child_idx) in path.into_iter().rev() {
            new_nodes = ancestor.dupe_insert_or_split_internal(ancestor_height, child_idx, new_nodes)?;
        }

        let (new_root, new_height) = match new_nodes.len() {
            1 => {
                let only = new_nodes.into_iter().next().expect("length checked above");
                (only, root_height)
            }
            2 => {
                let new_internal = Node::from_children(self.storage.clone(), new_nodes)?;
                (new_internal, root_height + 1)
            }
            n => unreachable!("dupe_insert_or_split_* must return 1 or 2 nodes, got {n}"),
        };

        // Single assignment: readers see either the full pre-image or the
        // full post-image, never an intermediate state. The old path's Rcs
        // drop here, returning any node not shared with the new tree to the
        // size-class cache.
        self.root = Some((new_root, new_height));
        Ok(replaced)
    }

    /// Sum of the byte footprint of every node reachable from the root,
    /// computed by traversal (never by tracking deltas, per spec).
    pub fn bytes_used(&self) -> usize {
        fn walk<K: Ord + Copy, V: Copy>(node: &Node<K, V>) -> usize {
            let mut total = node.node_size();
            if !node.is_leaf() {
                for child in node.internal_children() {
                    total += walk(child);
                }
            }
            total
        }
        self.root.as_ref().map(|(root, _)| walk(root)).unwrap_or(0)
    }

    /// Sum over size classes of blocks sitting in the free list, not
    /// currently reachable from the root.
    pub fn bytes_in_cache(&self) -> usize {
        self.storage.borrow().bytes_in_cache()
    }
}

/// Implements the descent rule in §4.4 step 3: walk the Eytzinger key array
/// from index 0 until the next step would run past `len`, then resolve the
/// stopping index to a natural-order child index — the greatest `i` with
/// `child[i].min() <= k`, or `0` if `k` is less than every key.
fn internal_descend_child_index<K: Ord + Copy, V: Copy>(node: &Node<K, V>, k: &K) -> usize {
    let len = node.len();
    let keys = node.internal_keys();
    let mut e = 0usize;
    loop {
        match keys[e].cmp(k) {
            Ordering::Equal => break,
            Ordering::Greater => {
                let next = eytzinger::left(e);
                if next >= len {
                    break;
                }
                e = next;
            }
            Ordering::Less => {
                let next = eytzinger::right(e);
                if next >= len {
                    break;
                }
                e = next;
            }
        }
    }
    let linear = eytzinger::to_linear(e, len);
    if keys[e] <= *k {
        linear
    } else {
        linear.saturating_sub(1)
    }
}
