//! Traversal of the structure tree.
//!
//! Nodes come in three shapes: a scalar (marked-content id, name, ...)
//! which is a leaf, a single element, or an array of elements. Every element
//! is handed to an [`ElementVisitor`] at most once per walk; the visited set
//! also cuts reference cycles. Kids of array items may be integers, which
//! are looked up in the parent tree before being walked.

use std::collections::HashSet;

use lopdf::Object;
use pdfwam_core::awam::AwamKindError;

use super::{ElemKey, RoleMap, StructElement, StructKind};
use crate::backend::LopdfBackend;
use crate::numbers::NumbersTree;

/// Receives every structure element reached by a walk.
pub trait ElementVisitor<'a> {
    fn visit(&mut self, element: &StructElement<'a>) -> Result<(), AwamKindError>;
}

enum Node<'a> {
    Scalar,
    Single(StructElement<'a>),
    Array(&'a [Object]),
}

pub struct StructureWalker<'a, 't> {
    backend: &'a LopdfBackend,
    numbers: &'t NumbersTree<'a>,
    roles: &'t RoleMap,
    visited: HashSet<ElemKey>,
    max_depth: usize,
    depth: usize,
}

impl<'a, 't> StructureWalker<'a, 't> {
    pub fn new(
        backend: &'a LopdfBackend,
        numbers: &'t NumbersTree<'a>,
        roles: &'t RoleMap,
        max_depth: usize,
    ) -> Self {
        Self {
            backend,
            numbers,
            roles,
            visited: HashSet::new(),
            max_depth,
            depth: 0,
        }
    }

    /// Number of distinct elements visited so far.
    pub fn visited(&self) -> usize {
        self.visited.len()
    }

    /// Walk `node` and everything below it.
    pub fn search<V: ElementVisitor<'a>>(
        &mut self,
        node: &'a Object,
        visitor: &mut V,
    ) -> Result<(), AwamKindError> {
        match self.classify(node) {
            Node::Scalar => Ok(()),
            Node::Single(element) => {
                if !self.dispatch(&element, visitor)? {
                    return Ok(());
                }
                match element.dict.get(b"K") {
                    Ok(kids) => self.descend(visitor, |walker, visitor| walker.search(kids, visitor)),
                    Err(_) => Ok(()),
                }
            }
            Node::Array(items) => {
                for item in items {
                    let Some(element) = self.element(item) else {
                        continue;
                    };
                    if !self.dispatch(&element, visitor)? {
                        continue;
                    }
                    if let Ok(kids) = element.dict.get(b"K") {
                        self.descend(visitor, |walker, visitor| walker.search_kids(kids, visitor))?;
                    }
                }
                Ok(())
            }
        }
    }

    fn search_kids<V: ElementVisitor<'a>>(
        &mut self,
        kids: &'a Object,
        visitor: &mut V,
    ) -> Result<(), AwamKindError> {
        let kids = match self.backend.resolve(kids) {
            Some(Object::Array(items)) => items.as_slice(),
            _ => std::slice::from_ref(kids),
        };

        for kid in kids {
            match self.backend.resolve(kid) {
                Some(Object::Integer(key)) => {
                    if let Some(value) = self.numbers.get(*key) {
                        self.search(value, visitor)?;
                    }
                }
                Some(Object::Array(entries)) => {
                    for entry in entries {
                        self.search(entry, visitor)?;
                    }
                }
                Some(Object::Dictionary(_)) => self.search(kid, visitor)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn descend<V, F>(&mut self, visitor: &mut V, walk: F) -> Result<(), AwamKindError>
    where
        F: FnOnce(&mut Self, &mut V) -> Result<(), AwamKindError>,
    {
        if self.depth >= self.max_depth {
            log::warn!(
                "structure tree deeper than {} levels, not descending further",
                self.max_depth
            );
            return Ok(());
        }
        self.depth += 1;
        let result = walk(self, visitor);
        self.depth -= 1;
        result
    }

    fn classify(&self, node: &'a Object) -> Node<'a> {
        match self.backend.resolve(node) {
            Some(Object::Array(items)) => Node::Array(items),
            Some(Object::Dictionary(_)) => match self.element(node) {
                Some(element) => Node::Single(element),
                None => Node::Scalar,
            },
            _ => Node::Scalar,
        }
    }

    fn element(&self, obj: &'a Object) -> Option<StructElement<'a>> {
        let dict = match self.backend.resolve(obj)? {
            Object::Dictionary(dict) => dict,
            _ => return None,
        };
        let tag = self.backend.get_name(dict, b"S");
        let kind = match tag.as_deref() {
            Some(tag) => self.roles.resolve(tag),
            None => StructKind::Other,
        };

        Some(StructElement {
            key: ElemKey::of(obj, dict),
            dict,
            tag,
            kind,
        })
    }

    /// Hand `element` to the visitor unless it was already seen.
    fn dispatch<V: ElementVisitor<'a>>(
        &mut self,
        element: &StructElement<'a>,
        visitor: &mut V,
    ) -> Result<bool, AwamKindError> {
        if !self.visited.insert(element.key) {
            log::trace!("already visited {:?}", element.key);
            return Ok(false);
        }
        visitor.visit(element)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use lopdf::{dictionary, Dictionary};

    use super::*;
    use crate::fixtures::{int, refs, DocBuilder};

    #[derive(Default)]
    struct Recorder {
        tags: Vec<String>,
    }

    impl<'a> ElementVisitor<'a> for Recorder {
        fn visit(&mut self, element: &StructElement<'a>) -> Result<(), AwamKindError> {
            self.tags
                .push(element.tag.clone().unwrap_or_else(|| "-".into()));
            Ok(())
        }
    }

    fn walk(backend: &LopdfBackend, root_kids: &Object, max_depth: usize) -> Vec<String> {
        let struct_root = backend
            .catalog()
            .and_then(|c| backend.get_dict(c, b"StructTreeRoot"));
        let empty = Dictionary::new();
        let numbers = NumbersTree::from_struct_root(backend, struct_root.unwrap_or(&empty));
        let roles = RoleMap::default();
        let mut walker = StructureWalker::new(backend, &numbers, &roles, max_depth);
        let mut recorder = Recorder::default();
        walker.search(root_kids, &mut recorder).unwrap();
        recorder.tags
    }

    #[test]
    fn walks_single_and_array_nodes_depth_first() {
        let mut builder = DocBuilder::new();
        let td = builder.add(dictionary! { "S" => "TD", "K" => int(0) });
        let tr = builder.add(dictionary! { "S" => "TR", "K" => refs(&[td]) });
        let table = builder.add(dictionary! { "S" => "Table", "K" => Object::Reference(tr) });
        let para = builder.add(dictionary! { "S" => "P" });
        let doc = builder.add(dictionary! { "S" => "Document", "K" => refs(&[table, para]) });
        let backend = builder.build();

        let tags = walk(&backend, &Object::Reference(doc), 64);
        assert_eq!(tags, vec!["Document", "Table", "TR", "TD", "P"]);
    }

    #[test]
    fn scalar_root_is_a_leaf() {
        let backend = DocBuilder::new().build();
        assert!(walk(&backend, &int(3), 64).is_empty());
        assert!(walk(&backend, &Object::Null, 64).is_empty());
    }

    #[test]
    fn cycles_are_visited_once() {
        let mut builder = DocBuilder::new();
        let a = builder.reserve();
        let b = builder.add(dictionary! { "S" => "Div", "K" => refs(&[a]) });
        builder.set(a, dictionary! { "S" => "Sect", "K" => refs(&[b]) });
        let backend = builder.build();

        let tags = walk(&backend, &Object::Reference(a), 64);
        assert_eq!(tags, vec!["Sect", "Div"]);
    }

    #[test]
    fn integer_kids_of_array_items_use_parent_tree() {
        let mut builder = DocBuilder::new();
        let span = builder.add(dictionary! { "S" => "Span" });
        let para = builder.add(dictionary! { "S" => "P", "K" => vec![int(7)] });
        builder.catalog(
            "StructTreeRoot",
            dictionary! {
                "ParentTree" => dictionary! { "Nums" => vec![int(7), refs(&[span])] },
            },
        );
        let backend = builder.build();

        let tags = walk(&backend, &refs(&[para]), 64);
        assert_eq!(tags, vec!["P", "Span"]);
    }

    #[test]
    fn integer_kid_of_single_node_is_a_leaf() {
        let mut builder = DocBuilder::new();
        let span = builder.add(dictionary! { "S" => "Span" });
        let para = builder.add(dictionary! { "S" => "P", "K" => int(7) });
        builder.catalog(
            "StructTreeRoot",
            dictionary! {
                "ParentTree" => dictionary! { "Nums" => vec![int(7), refs(&[span])] },
            },
        );
        let backend = builder.build();

        let tags = walk(&backend, &Object::Reference(para), 64);
        assert_eq!(tags, vec!["P"]);
    }

    #[test]
    fn nested_kid_arrays_are_flattened() {
        let mut builder = DocBuilder::new();
        let first = builder.add(dictionary! { "S" => "L" });
        let second = builder.add(dictionary! { "S" => "LI" });
        let list = builder.add(dictionary! {
            "S" => "Sect",
            "K" => vec![refs(&[first, second])],
        });
        let backend = builder.build();

        let tags = walk(&backend, &refs(&[list]), 64);
        assert_eq!(tags, vec!["Sect", "L", "LI"]);
    }

    #[test]
    fn elements_without_type_are_visited() {
        let mut builder = DocBuilder::new();
        let mcr = builder.add(dictionary! { "Type" => "MCR", "MCID" => int(0) });
        let para = builder.add(dictionary! { "S" => "P", "K" => refs(&[mcr]) });
        let backend = builder.build();

        let tags = walk(&backend, &Object::Reference(para), 64);
        assert_eq!(tags, vec!["P", "-"]);
    }

    #[test]
    fn depth_bound_stops_descent() {
        let mut builder = DocBuilder::new();
        let leaf = builder.add(dictionary! { "S" => "Span" });
        let mid = builder.add(dictionary! { "S" => "P", "K" => Object::Reference(leaf) });
        let top = builder.add(dictionary! { "S" => "Div", "K" => Object::Reference(mid) });
        let backend = builder.build();

        assert_eq!(walk(&backend, &Object::Reference(top), 1), vec!["Div", "P"]);
        assert_eq!(
            walk(&backend, &Object::Reference(top), 8),
            vec!["Div", "P", "Span"]
        );
    }
}
