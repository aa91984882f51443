//! Flattening of the structure tree's parent tree.
//!
//! The parent tree is a number tree: either a `Nums` array of alternating
//! integer keys and values, or `Kids` pointing at sub-trees that carry their
//! own `Nums`. The flattened form maps each key to its (unresolved) value.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Object};

use crate::backend::LopdfBackend;

const MAX_TREE_DEPTH: usize = 32;

#[derive(Debug, Clone, Default)]
pub struct NumbersTree<'a> {
    entries: BTreeMap<i64, &'a Object>,
}

impl<'a> NumbersTree<'a> {
    /// Flatten the `ParentTree` of a structure tree root.
    ///
    /// A missing parent tree gives an empty mapping.
    pub fn from_struct_root(backend: &'a LopdfBackend, struct_root: &'a Dictionary) -> Self {
        match backend.get_dict(struct_root, b"ParentTree") {
            Some(parent_tree) => Self::flatten(backend, parent_tree),
            None => Self::default(),
        }
    }

    /// Flatten any number tree node.
    pub fn flatten(backend: &'a LopdfBackend, node: &'a Dictionary) -> Self {
        let mut tree = Self::default();
        tree.collect(backend, node, 0);
        log::debug!("numbers tree has {} entries", tree.entries.len());
        tree
    }

    fn collect(&mut self, backend: &'a LopdfBackend, node: &'a Dictionary, depth: usize) {
        if depth > MAX_TREE_DEPTH {
            log::warn!("number tree nested deeper than {MAX_TREE_DEPTH} levels, ignoring the rest");
            return;
        }

        if let Some(nums) = backend.get_array(node, b"Nums") {
            for pair in nums.chunks_exact(2) {
                match backend.resolve(&pair[0]).and_then(|k| k.as_i64().ok()) {
                    Some(key) => {
                        self.entries.insert(key, &pair[1]);
                    }
                    None => log::debug!("skipping non-integer number tree key {:?}", pair[0]),
                }
            }
            return;
        }

        for kid in backend.get_array(node, b"Kids").unwrap_or_default() {
            if let Some(kid) = backend.resolve_dict(kid) {
                self.collect(backend, kid, depth + 1);
            }
        }
    }

    pub fn get(&self, key: i64) -> Option<&'a Object> {
        self.entries.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &'a Object> + '_ {
        self.entries.values().copied()
    }
}
