//! Logical structure tree: element identity, kinds, and role mapping.

use std::collections::HashMap;

use lopdf::{Dictionary, Object};
use pdfwam_core::headings::heading_level;
use pdfwam_core::table::TableTag;

use crate::backend::{LopdfBackend, ObjectId};

pub mod handler;
pub mod walker;

pub use handler::{AwamHandler, HandlerOptions, LinkAnnotation};
pub use walker::{ElementVisitor, StructureWalker};

/// Role-map chains longer than this are left unresolved.
const MAX_ROLE_CHAIN: usize = 8;

/// Identity of a structure element.
///
/// Indirect objects are identified by object id. Direct dictionaries are
/// identified by their address inside the loaded document, which is stable
/// for as long as the document is borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElemKey {
    Indirect(ObjectId),
    Direct(usize),
}

impl ElemKey {
    /// Identity of `dict`, reached through `obj`.
    pub fn of(obj: &Object, dict: &Dictionary) -> Self {
        match obj {
            Object::Reference(id) => ElemKey::Indirect(*id),
            _ => ElemKey::Direct(dict as *const Dictionary as usize),
        }
    }

    pub fn from_id(id: Option<ObjectId>, dict: &Dictionary) -> Self {
        match id {
            Some(id) => ElemKey::Indirect(id),
            None => ElemKey::Direct(dict as *const Dictionary as usize),
        }
    }
}

/// Structure types the audit acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructKind {
    Document,
    Link,
    Form,
    Figure,
    Table(TableTag),
    Heading(u8),
    Other,
}

impl StructKind {
    /// Kind of a standard structure type, `None` for anything else.
    pub fn from_standard(tag: &str) -> Option<Self> {
        let kind = match tag {
            "Document" => StructKind::Document,
            "Link" => StructKind::Link,
            "Form" => StructKind::Form,
            "Figure" => StructKind::Figure,
            other => {
                if let Some(table) = TableTag::from_name(other) {
                    StructKind::Table(table)
                } else {
                    StructKind::Heading(heading_level(other)?)
                }
            }
        };
        Some(kind)
    }
}

/// The structure tree's `RoleMap`: custom type name to its standard type.
#[derive(Debug, Clone, Default)]
pub struct RoleMap {
    roles: HashMap<String, String>,
}

impl RoleMap {
    pub fn from_struct_root(backend: &LopdfBackend, struct_root: &Dictionary) -> Self {
        let Some(map) = backend.get_dict(struct_root, b"RoleMap") else {
            return Self::default();
        };

        let roles = map
            .iter()
            .filter_map(|(custom, target)| match backend.resolve(target)? {
                Object::Name(standard) => Some((
                    String::from_utf8_lossy(custom).into_owned(),
                    String::from_utf8_lossy(standard).into_owned(),
                )),
                _ => None,
            })
            .collect();

        Self { roles }
    }

    pub fn from_pairs<'p>(pairs: impl IntoIterator<Item = (&'p str, &'p str)>) -> Self {
        Self {
            roles: pairs
                .into_iter()
                .map(|(custom, standard)| (custom.to_string(), standard.to_string()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Resolve a structure type through the role map.
    ///
    /// Standard types are never remapped. Custom types follow the mapping
    /// chain until a standard type is reached.
    pub fn resolve(&self, tag: &str) -> StructKind {
        let mut current = tag;
        for _ in 0..MAX_ROLE_CHAIN {
            if let Some(kind) = StructKind::from_standard(current) {
                return kind;
            }
            match self.roles.get(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        StructKind::Other
    }
}

/// A structure element borrowed from the document.
#[derive(Debug, Clone)]
pub struct StructElement<'a> {
    pub key: ElemKey,
    pub dict: &'a Dictionary,
    /// Raw structure type (`S`).
    pub tag: Option<String>,
    /// Kind after role mapping.
    pub kind: StructKind,
}
